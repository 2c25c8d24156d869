//! Work done once before evaluation starts: decode every literal's lexeme
//! into a ready value and collect the function bodies for dispatch.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::ast::nodes::{
    BlockNode, ExpressionKind, ExpressionNode, FunctionNode, GlobalNode, IfNode, LiteralNode,
    MemberNode, ScopeNode, StatementNode, VariableNode,
};
use crate::ast::tokens::TokenKind;
use crate::errors::errors::RuntimeError;
use crate::library::library::{Library, SymbolId};

use super::value::{Pointer, Value, ValueData};

/// Decode every literal in the tree. Requires a fully analyzed tree; the
/// decoded value's type comes from the analyzer's annotation.
pub fn decode_literals(block: &mut BlockNode, library: &Library) -> Result<(), RuntimeError> {
    for global in &mut block.globals {
        match global {
            GlobalNode::Class(class) => {
                for member in &mut class.members {
                    match member {
                        MemberNode::Variable(variable) => decode_in_variable(variable, library)?,
                        MemberNode::Function(function) => decode_in_function(function, library)?,
                    }
                }
            }
            GlobalNode::Variable(variable) => decode_in_variable(variable, library)?,
            GlobalNode::Function(function) => decode_in_function(function, library)?,
        }
    }
    Ok(())
}

/// Collect every function body keyed by its declared symbol.
pub fn collect_functions(block: &BlockNode) -> Result<FxHashMap<SymbolId, &FunctionNode>, RuntimeError> {
    let mut functions = FxHashMap::default();
    for global in &block.globals {
        match global {
            GlobalNode::Function(function) => insert_function(&mut functions, function)?,
            GlobalNode::Class(class) => {
                for member in &class.members {
                    if let MemberNode::Function(function) = member {
                        insert_function(&mut functions, function)?;
                    }
                }
            }
            GlobalNode::Variable(_) => {}
        }
    }
    Ok(functions)
}

fn insert_function<'tree>(
    functions: &mut FxHashMap<SymbolId, &'tree FunctionNode>,
    function: &'tree FunctionNode,
) -> Result<(), RuntimeError> {
    let symbol = function.symbol.ok_or_else(|| {
        RuntimeError::NotAnalyzed(format!("function `{}` has no symbol", function.name.text))
    })?;
    functions.insert(symbol, function);
    Ok(())
}

fn decode_in_variable(variable: &mut VariableNode, library: &Library) -> Result<(), RuntimeError> {
    match &mut variable.initial_value {
        Some(value) => decode_in_expression(value, library),
        None => Ok(()),
    }
}

fn decode_in_function(function: &mut FunctionNode, library: &Library) -> Result<(), RuntimeError> {
    decode_in_scope(&mut function.body, library)
}

fn decode_in_scope(scope: &mut ScopeNode, library: &Library) -> Result<(), RuntimeError> {
    for statement in &mut scope.statements {
        decode_in_statement(statement, library)?;
    }
    Ok(())
}

fn decode_in_statement(statement: &mut StatementNode, library: &Library) -> Result<(), RuntimeError> {
    match statement {
        StatementNode::Variable(variable) => decode_in_variable(variable, library),
        StatementNode::Scope(scope) => decode_in_scope(scope, library),
        StatementNode::Return(node) => match &mut node.value {
            Some(value) => decode_in_expression(value, library),
            None => Ok(()),
        },
        StatementNode::If(node) => decode_in_if(node, library),
        StatementNode::While(node) => {
            decode_in_expression(&mut node.condition, library)?;
            decode_in_scope(&mut node.scope, library)
        }
        StatementNode::For(node) => {
            if let Some(variable) = &mut node.initial_variable {
                decode_in_variable(variable, library)?;
            }
            for expression in [&mut node.initial_expression, &mut node.condition, &mut node.iterator]
                .into_iter()
                .flatten()
            {
                decode_in_expression(expression, library)?;
            }
            decode_in_scope(&mut node.scope, library)
        }
        StatementNode::Expression(expression) => decode_in_expression(expression, library),
        StatementNode::Label(_)
        | StatementNode::Goto(_)
        | StatementNode::Break
        | StatementNode::Continue => Ok(()),
    }
}

fn decode_in_if(node: &mut IfNode, library: &Library) -> Result<(), RuntimeError> {
    if let Some(condition) = &mut node.condition {
        decode_in_expression(condition, library)?;
    }
    decode_in_scope(&mut node.scope, library)?;
    match &mut node.else_node {
        Some(else_node) => decode_in_if(else_node, library),
        None => Ok(()),
    }
}

fn decode_in_expression(
    expression: &mut ExpressionNode,
    library: &Library,
) -> Result<(), RuntimeError> {
    let resolved_type = expression.resolved_type;
    match &mut expression.kind {
        ExpressionKind::Literal(literal) => {
            let type_id = resolved_type.ok_or_else(|| {
                RuntimeError::NotAnalyzed(format!("literal `{}` has no type", literal.token.text))
            })?;
            decode_literal(literal, type_id)
        }
        ExpressionKind::NameReference(_) => Ok(()),
        ExpressionKind::BinaryOperator(node) => {
            decode_in_expression(&mut node.left, library)?;
            decode_in_expression(&mut node.right, library)
        }
        ExpressionKind::UnaryOperator(node) => decode_in_expression(&mut node.operand, library),
        ExpressionKind::MemberAccess(node) => decode_in_expression(&mut node.left, library),
        ExpressionKind::Call(node) => {
            decode_in_expression(&mut node.callee, library)?;
            for argument in &mut node.arguments {
                decode_in_expression(argument, library)?;
            }
            Ok(())
        }
        ExpressionKind::Cast(node) => decode_in_expression(&mut node.operand, library),
        ExpressionKind::Index(node) => {
            decode_in_expression(&mut node.left, library)?;
            decode_in_expression(&mut node.index, library)
        }
    }
}

fn decode_literal(
    literal: &mut LiteralNode,
    type_id: crate::library::library::TypeId,
) -> Result<(), RuntimeError> {
    let text = literal.token.text.as_str();
    let data = match literal.token.kind {
        TokenKind::IntegerLiteral => ValueData::Integer(
            text.parse::<i32>()
                .map_err(|_| RuntimeError::MalformedLiteral(text.to_string()))?,
        ),
        TokenKind::FloatLiteral => ValueData::Float(
            text.trim_end_matches('f')
                .parse::<f32>()
                .map_err(|_| RuntimeError::MalformedLiteral(text.to_string()))?,
        ),
        TokenKind::StringLiteral => {
            let mut bytes = decode_escapes(strip_quotes(text, '"'))?;
            // String buffers are NUL terminated so prints have a length.
            bytes.push(0);
            ValueData::Pointer(Pointer::Bytes {
                buffer: Rc::new(bytes),
                offset: 0,
            })
        }
        TokenKind::CharacterLiteral => {
            let bytes = decode_escapes(strip_quotes(text, '\''))?;
            match bytes.as_slice() {
                [byte] => ValueData::Byte(*byte),
                _ => return Err(RuntimeError::MalformedLiteral(text.to_string())),
            }
        }
        TokenKind::True => ValueData::Boolean(true),
        TokenKind::False => ValueData::Boolean(false),
        TokenKind::Null => ValueData::Pointer(Pointer::Null),
        _ => return Err(RuntimeError::MalformedLiteral(text.to_string())),
    };
    literal.value = Some(Value::new(type_id, data));
    Ok(())
}

/// Literal lexemes may arrive with or without their surrounding quotes.
fn strip_quotes(text: &str, quote: char) -> &str {
    text.strip_prefix(quote)
        .and_then(|text| text.strip_suffix(quote))
        .unwrap_or(text)
}

fn decode_escapes(text: &str) -> Result<Vec<u8>, RuntimeError> {
    let mut bytes = Vec::with_capacity(text.len());
    let mut characters = text.chars();
    while let Some(character) = characters.next() {
        if character != '\\' {
            let mut encoded = [0u8; 4];
            bytes.extend_from_slice(character.encode_utf8(&mut encoded).as_bytes());
            continue;
        }
        let escaped = characters
            .next()
            .ok_or_else(|| RuntimeError::MalformedLiteral(text.to_string()))?;
        bytes.push(match escaped {
            'n' => b'\n',
            'r' => b'\r',
            't' => b'\t',
            '0' => 0,
            '\\' => b'\\',
            '\'' => b'\'',
            '"' => b'"',
            _ => return Err(RuntimeError::MalformedLiteral(text.to_string())),
        });
    }
    Ok(bytes)
}
