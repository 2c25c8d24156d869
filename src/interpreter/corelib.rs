//! The built-in functions every program can call.
//!
//! `PrintInteger`, `PrintFloat`, and `PrintString` write their argument and
//! a newline to the host sink; `PrintCharacter` writes the bare character so
//! output can be assembled a byte at a time. `Sin` demonstrates binding a
//! host computation.

use std::rc::Rc;

use crate::errors::errors::{RuntimeError, SemanticError};
use crate::library::library::{Library, TypeId};

use super::interpreter::Bindings;
use super::value::{Pointer, Value, ValueData};

/// Register the core functions in `library` and bind their host
/// implementations in `bindings`.
pub fn install(library: &mut Library, bindings: &mut Bindings) -> Result<(), SemanticError> {
    let core = *library.core();

    let register = |library: &mut Library,
                        bindings: &mut Bindings,
                        name: &str,
                        parameters: &[TypeId],
                        return_type: TypeId,
                        callback: super::interpreter::NativeCallback|
     -> Result<(), SemanticError> {
        let function = library.create_function(name, true)?;
        let signature = library.get_function_type(parameters, return_type);
        library.symbol_mut(function).value_type = Some(signature);
        bindings.bind(function, callback);
        Ok(())
    };

    let void = move || Value::new(core.void, ValueData::Void);

    register(
        library,
        bindings,
        "PrintInteger",
        &[core.integer],
        core.void,
        Rc::new(move |out, arguments| {
            let value = integer_argument("PrintInteger", arguments)?;
            writeln!(out, "{value}")?;
            Ok(void())
        }),
    )?;

    register(
        library,
        bindings,
        "PrintFloat",
        &[core.float],
        core.void,
        Rc::new(move |out, arguments| {
            let value = float_argument("PrintFloat", arguments)?;
            writeln!(out, "{value}")?;
            Ok(void())
        }),
    )?;

    register(
        library,
        bindings,
        "PrintString",
        &[core.byte_pointer],
        core.void,
        Rc::new(move |out, arguments| {
            let argument = single_argument("PrintString", arguments)?;
            let text = read_string(argument)?;
            out.write_all(&text)?;
            writeln!(out)?;
            Ok(void())
        }),
    )?;

    register(
        library,
        bindings,
        "PrintCharacter",
        &[core.byte],
        core.void,
        Rc::new(move |out, arguments| {
            let argument = single_argument("PrintCharacter", arguments)?;
            match argument.data {
                ValueData::Byte(byte) => out.write_all(&[byte])?,
                _ => return Err(bad_argument("PrintCharacter")),
            }
            Ok(void())
        }),
    )?;

    register(
        library,
        bindings,
        "Sin",
        &[core.float],
        core.float,
        Rc::new(move |_out, arguments| {
            let value = float_argument("Sin", arguments)?;
            Ok(Value::new(core.float, ValueData::Float(value.sin())))
        }),
    )?;

    Ok(())
}

fn single_argument<'v>(name: &str, arguments: &'v [Value]) -> Result<&'v Value, RuntimeError> {
    match arguments {
        [argument] => Ok(argument),
        _ => Err(RuntimeError::MalformedNativeCall {
            name: name.to_string(),
            expected: 1,
            got: arguments.len(),
        }),
    }
}

fn integer_argument(name: &str, arguments: &[Value]) -> Result<i32, RuntimeError> {
    single_argument(name, arguments)?
        .as_integer()
        .ok_or_else(|| bad_argument(name))
}

fn float_argument(name: &str, arguments: &[Value]) -> Result<f32, RuntimeError> {
    single_argument(name, arguments)?
        .as_float()
        .ok_or_else(|| bad_argument(name))
}

fn bad_argument(name: &str) -> RuntimeError {
    RuntimeError::Unsupported(format!("`{name}` called with an unexpected argument"))
}

/// Read the bytes a string pointer refers to, up to (not including) the
/// first NUL or the end of the buffer.
fn read_string(argument: &Value) -> Result<Vec<u8>, RuntimeError> {
    match argument.as_pointer() {
        Some(Pointer::Null) => Err(RuntimeError::NullDereference),
        Some(Pointer::Bytes { buffer, offset }) => {
            let tail = buffer.get(*offset..).unwrap_or_default();
            let length = tail.iter().position(|&byte| byte == 0).unwrap_or(tail.len());
            Ok(tail[..length].to_vec())
        }
        Some(Pointer::Cell(cell)) => match &cell.borrow().data {
            // A pointer to a single byte variable prints as one character.
            ValueData::Byte(byte) if *byte != 0 => Ok(vec![*byte]),
            ValueData::Byte(_) => Ok(Vec::new()),
            _ => Err(RuntimeError::Unsupported(
                "printing through a non-byte pointer".into(),
            )),
        },
        None => Err(RuntimeError::Unsupported("printing a non-pointer".into())),
    }
}
