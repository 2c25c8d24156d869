use pretty_assertions::assert_eq;

use crate::errors::errors::SemanticError;

use super::library::{Library, SymbolKind, TypeMode};

#[test]
fn core_types_are_registered_by_name() {
    let library = Library::new();
    let core = *library.core();

    assert_eq!(library.find_global("Void"), Some(core.void));
    assert_eq!(library.find_global("Integer"), Some(core.integer));
    assert_eq!(library.find_global("Byte*"), Some(core.byte_pointer));
    assert_eq!(library.type_name(core.boolean), "Boolean");
}

#[test]
fn pointer_types_are_interned() {
    let mut library = Library::new();
    let integer = library.core().integer;

    let first = library.get_pointer_type(integer);
    let second = library.get_pointer_type(integer);
    assert_eq!(first, second);
    assert_eq!(library.type_name(first), "Integer*");

    let double = library.get_pointer_type(first);
    assert_eq!(library.type_name(double), "Integer**");
    assert_eq!(library.get_pointer_type(first), double);
}

#[test]
fn function_types_are_interned_by_full_signature() {
    let mut library = Library::new();
    let (integer, float, void) = {
        let core = library.core();
        (core.integer, core.float, core.void)
    };

    let a = library.get_function_type(&[integer, float], void);
    let b = library.get_function_type(&[integer, float], void);
    assert_eq!(a, b);
    assert_eq!(library.type_name(a), "function(Integer, Float) : Void");

    // Same parameters, different return: a distinct type.
    let c = library.get_function_type(&[integer, float], integer);
    assert_ne!(a, c);

    let nullary = library.get_function_type(&[], integer);
    assert_eq!(library.type_name(nullary), "function() : Integer");
}

#[test]
fn duplicate_global_names_are_rejected() {
    let mut library = Library::new();

    library.create_type("Player", true).unwrap();
    assert_eq!(
        library.create_type("Player", true),
        Err(SemanticError::DuplicateName("Player".into()))
    );
    // Any global kind collides with an existing global name.
    assert_eq!(
        library.create_variable("Player", true),
        Err(SemanticError::DuplicateName("Player".into()))
    );
    assert_eq!(
        library.create_function("Integer", true),
        Err(SemanticError::DuplicateName("Integer".into()))
    );
}

#[test]
fn non_global_symbols_do_not_touch_the_namespace() {
    let mut library = Library::new();

    let a = library.create_variable("x", false).unwrap();
    let b = library.create_variable("x", false).unwrap();
    assert_ne!(a, b);
    assert_eq!(library.find_global("x"), None);

    let label = library.create_label("again").unwrap();
    assert!(matches!(library.symbol(label).kind, SymbolKind::Label));
}

#[test]
fn interned_types_carry_their_structure() {
    let mut library = Library::new();
    let byte = library.core().byte;

    let pointer = library.get_pointer_type(byte);
    let data = library.type_data(pointer).unwrap();
    assert_eq!(data.mode, TypeMode::Pointer);
    assert_eq!(data.pointee, Some(byte));

    let integer = library.core().integer;
    let signature = library.get_function_type(&[byte], integer);
    let data = library.type_data(signature).unwrap();
    assert_eq!(data.mode, TypeMode::Function);
    assert_eq!(data.parameter_types, vec![byte]);
    assert_eq!(data.return_type, Some(integer));
}
