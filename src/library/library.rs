use indexmap::IndexMap;
use tracing::trace;

use crate::errors::errors::SemanticError;

/// Handle into the library's symbol arena.
///
/// Handles stay valid for the lifetime of the library no matter how many
/// symbols are added after them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

/// A symbol that is known to be a type. Same representation, separate name
/// so signatures read correctly.
pub type TypeId = SymbolId;

/// How a type's `TypeData` is to be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeMode {
    /// A named class (the built-in scalars are degenerate classes).
    Class,
    /// A pointer; `pointee` is set.
    Pointer,
    /// A function signature; `parameter_types` and `return_type` are set.
    Function,
}

/// The type-specific payload of a `SymbolKind::Type` symbol.
#[derive(Debug, Clone)]
pub struct TypeData {
    pub mode: TypeMode,
    /// Class members, in declaration order.
    pub members: Vec<SymbolId>,
    pub members_by_name: IndexMap<String, SymbolId>,
    pub pointee: Option<TypeId>,
    pub parameter_types: Vec<TypeId>,
    pub return_type: Option<TypeId>,
}

impl TypeData {
    fn with_mode(mode: TypeMode) -> Self {
        TypeData {
            mode,
            members: Vec::new(),
            members_by_name: IndexMap::new(),
            pointee: None,
            parameter_types: Vec::new(),
            return_type: None,
        }
    }
}

/// The function-specific payload of a `SymbolKind::Function` symbol.
#[derive(Debug, Clone, Default)]
pub struct FunctionData {
    /// Local variables (parameters included), in declaration order.
    pub locals: Vec<SymbolId>,
    /// Labels are function-scoped, not block-scoped.
    pub labels_by_name: IndexMap<String, SymbolId>,
}

#[derive(Debug, Clone)]
pub enum SymbolKind {
    Variable { is_parameter: bool },
    Function(FunctionData),
    Label,
    Type(TypeData),
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// For variables: the declared type. For functions: the signature type.
    pub value_type: Option<TypeId>,
    /// Set for class members.
    pub parent_type: Option<TypeId>,
    /// Set for locals, parameters, and labels.
    pub parent_function: Option<SymbolId>,
}

/// The built-in types every program starts with.
///
/// These are ordinary arena entries, built once per library and passed
/// around explicitly. `byte_pointer` is the interned `Byte*`, the type of
/// string literals.
#[derive(Debug, Clone, Copy)]
pub struct CoreTypes {
    pub void: TypeId,
    pub null: TypeId,
    pub integer: TypeId,
    pub float: TypeId,
    pub boolean: TypeId,
    pub byte: TypeId,
    pub byte_pointer: TypeId,
}

/// Owner of every declared entity in a program.
#[derive(Debug)]
pub struct Library {
    symbols: Vec<Symbol>,
    /// The global namespace, in declaration order. Derived (pointer and
    /// signature) types land here too, keyed by their canonical names.
    globals: IndexMap<String, SymbolId>,
    core: CoreTypes,
}

impl Library {
    pub fn new() -> Self {
        let mut library = Library {
            symbols: Vec::new(),
            globals: IndexMap::new(),
            core: CoreTypes {
                void: SymbolId(0),
                null: SymbolId(0),
                integer: SymbolId(0),
                float: SymbolId(0),
                boolean: SymbolId(0),
                byte: SymbolId(0),
                byte_pointer: SymbolId(0),
            },
        };

        // Core names are distinct and the arena is empty, so none of these
        // can collide.
        library.core.void = library.insert_class_type("Void");
        library.core.null = library.insert_class_type("Null");
        library.core.integer = library.insert_class_type("Integer");
        library.core.float = library.insert_class_type("Float");
        library.core.boolean = library.insert_class_type("Boolean");
        library.core.byte = library.insert_class_type("Byte");
        library.core.byte_pointer = library.get_pointer_type(library.core.byte);
        library
    }

    pub fn core(&self) -> &CoreTypes {
        &self.core
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0 as usize]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0 as usize]
    }

    /// The type payload of `id`, if `id` names a type at all.
    pub fn type_data(&self, id: TypeId) -> Option<&TypeData> {
        match &self.symbol(id).kind {
            SymbolKind::Type(data) => Some(data),
            _ => None,
        }
    }

    pub fn type_data_mut(&mut self, id: TypeId) -> Option<&mut TypeData> {
        match &mut self.symbol_mut(id).kind {
            SymbolKind::Type(data) => Some(data),
            _ => None,
        }
    }

    /// The display name of a type, for diagnostics.
    pub fn type_name(&self, id: TypeId) -> &str {
        &self.symbol(id).name
    }

    pub fn find_global(&self, name: &str) -> Option<SymbolId> {
        self.globals.get(name).copied()
    }

    /// The global namespace in declaration order.
    pub fn globals(&self) -> impl Iterator<Item = (&str, SymbolId)> {
        self.globals.iter().map(|(name, id)| (name.as_str(), *id))
    }

    /// Declare a new Class-mode type. Members start empty and are attached
    /// during declaration registration.
    pub fn create_type(&mut self, name: &str, is_global: bool) -> Result<TypeId, SemanticError> {
        self.insert(
            Symbol {
                name: name.to_string(),
                kind: SymbolKind::Type(TypeData::with_mode(TypeMode::Class)),
                value_type: None,
                parent_type: None,
                parent_function: None,
            },
            is_global,
        )
    }

    pub fn create_variable(
        &mut self,
        name: &str,
        is_global: bool,
    ) -> Result<SymbolId, SemanticError> {
        self.insert(
            Symbol {
                name: name.to_string(),
                kind: SymbolKind::Variable {
                    is_parameter: false,
                },
                value_type: None,
                parent_type: None,
                parent_function: None,
            },
            is_global,
        )
    }

    pub fn create_function(
        &mut self,
        name: &str,
        is_global: bool,
    ) -> Result<SymbolId, SemanticError> {
        self.insert(
            Symbol {
                name: name.to_string(),
                kind: SymbolKind::Function(FunctionData::default()),
                value_type: None,
                parent_type: None,
                parent_function: None,
            },
            is_global,
        )
    }

    pub fn create_label(&mut self, name: &str) -> Result<SymbolId, SemanticError> {
        self.insert(
            Symbol {
                name: name.to_string(),
                kind: SymbolKind::Label,
                value_type: None,
                parent_type: None,
                parent_function: None,
            },
            false,
        )
    }

    /// The pointer type to `pointee`, interned by canonical name.
    ///
    /// Asking twice for the same pointee returns the same handle.
    pub fn get_pointer_type(&mut self, pointee: TypeId) -> TypeId {
        let name = format!("{}*", self.symbol(pointee).name);
        if let Some(existing) = self.globals.get(&name) {
            return *existing;
        }

        trace!(name = %name, "interning pointer type");
        let mut data = TypeData::with_mode(TypeMode::Pointer);
        data.pointee = Some(pointee);
        self.insert_interned(name, data)
    }

    /// The function-signature type for `parameter_types` returning
    /// `return_type`, interned by canonical name.
    pub fn get_function_type(
        &mut self,
        parameter_types: &[TypeId],
        return_type: TypeId,
    ) -> TypeId {
        let mut name = String::from("function(");
        for (index, parameter) in parameter_types.iter().enumerate() {
            if index > 0 {
                name.push_str(", ");
            }
            name.push_str(&self.symbol(*parameter).name);
        }
        name.push_str(") : ");
        name.push_str(&self.symbol(return_type).name);

        if let Some(existing) = self.globals.get(&name) {
            return *existing;
        }

        trace!(name = %name, "interning function type");
        let mut data = TypeData::with_mode(TypeMode::Function);
        data.parameter_types = parameter_types.to_vec();
        data.return_type = Some(return_type);
        self.insert_interned(name, data)
    }

    fn insert(&mut self, symbol: Symbol, is_global: bool) -> Result<SymbolId, SemanticError> {
        if is_global && self.globals.contains_key(&symbol.name) {
            return Err(SemanticError::DuplicateName(symbol.name));
        }

        let id = SymbolId(self.symbols.len() as u32);
        if is_global {
            self.globals.insert(symbol.name.clone(), id);
        }
        self.symbols.push(symbol);
        Ok(id)
    }

    /// Core types and interned derived types skip the duplicate check; their
    /// canonical names are checked by the caller.
    fn insert_class_type(&mut self, name: &str) -> TypeId {
        self.insert_interned(name.to_string(), TypeData::with_mode(TypeMode::Class))
    }

    fn insert_interned(&mut self, name: String, data: TypeData) -> TypeId {
        let id = SymbolId(self.symbols.len() as u32);
        self.globals.insert(name.clone(), id);
        self.symbols.push(Symbol {
            name,
            kind: SymbolKind::Type(data),
            value_type: None,
            parent_type: None,
            parent_function: None,
        });
        id
    }
}

impl Default for Library {
    fn default() -> Self {
        Library::new()
    }
}
