//! Passes A through C: everything that can be decided before looking inside
//! expressions.

use crate::ast::nodes::{
    BlockNode, ClassNode, ExpressionKind, ExpressionNode, FunctionNode, GlobalNode, IfNode,
    MemberNode, ScopeNode, StatementNode, TypeReferenceKind, TypeReferenceNode, VariableNode,
};
use crate::errors::errors::SemanticError;
use crate::library::library::{Library, SymbolId, SymbolKind, TypeId};

/// Pass A: declare a Class-mode type for every class in the program.
/// Members are attached later, so classes can reference each other freely.
pub fn declare_class_types(
    block: &mut BlockNode,
    library: &mut Library,
) -> Result<(), SemanticError> {
    for global in &mut block.globals {
        if let GlobalNode::Class(class) = global {
            let id = library.create_type(&class.name.text, true)?;
            class.symbol = Some(id);
        }
    }
    Ok(())
}

/// Pass B: resolve every type reference in the tree, creating pointer and
/// signature types on demand, and compute each function's signature type.
pub fn resolve_type_references(
    block: &mut BlockNode,
    library: &mut Library,
) -> Result<(), SemanticError> {
    for global in &mut block.globals {
        match global {
            GlobalNode::Class(class) => {
                for member in &mut class.members {
                    match member {
                        MemberNode::Variable(variable) => {
                            resolve_variable_types(variable, library)?;
                        }
                        MemberNode::Function(function) => {
                            resolve_function_types(function, library)?;
                        }
                    }
                }
            }
            GlobalNode::Variable(variable) => resolve_variable_types(variable, library)?,
            GlobalNode::Function(function) => resolve_function_types(function, library)?,
        }
    }
    Ok(())
}

fn resolve_variable_types(
    variable: &mut VariableNode,
    library: &mut Library,
) -> Result<(), SemanticError> {
    resolve_type_reference(&mut variable.type_reference, library)?;
    if let Some(value) = &mut variable.initial_value {
        resolve_types_in_expression(value, library)?;
    }
    Ok(())
}

fn resolve_function_types(
    function: &mut FunctionNode,
    library: &mut Library,
) -> Result<(), SemanticError> {
    let mut parameter_types = Vec::with_capacity(function.parameters.len());
    for parameter in &mut function.parameters {
        parameter_types.push(resolve_type_reference(&mut parameter.type_reference, library)?);
    }

    // A missing return annotation means Void.
    let return_type = match &mut function.return_type {
        Some(reference) => resolve_type_reference(reference, library)?,
        None => library.core().void,
    };

    function.signature_type = Some(library.get_function_type(&parameter_types, return_type));
    resolve_types_in_scope(&mut function.body, library)
}

/// Resolve one written type reference to a concrete type handle.
pub fn resolve_type_reference(
    reference: &mut TypeReferenceNode,
    library: &mut Library,
) -> Result<TypeId, SemanticError> {
    let id = match &mut reference.kind {
        TypeReferenceKind::Named(token) => {
            let id = library
                .find_global(&token.text)
                .ok_or_else(|| SemanticError::SymbolNotFound(token.text.clone()))?;
            // A global that is not a type cannot be named in type position.
            if library.type_data(id).is_none() {
                return Err(SemanticError::SymbolNotFound(token.text.clone()));
            }
            id
        }
        TypeReferenceKind::PointerTo(pointee) => {
            let pointee = resolve_type_reference(pointee, library)?;
            library.get_pointer_type(pointee)
        }
        TypeReferenceKind::FunctionSignature {
            parameters,
            return_type,
        } => {
            let mut parameter_types = Vec::with_capacity(parameters.len());
            for parameter in parameters {
                parameter_types.push(resolve_type_reference(parameter, library)?);
            }
            let return_type = match return_type {
                Some(reference) => resolve_type_reference(reference, library)?,
                None => library.core().void,
            };
            library.get_function_type(&parameter_types, return_type)
        }
    };
    reference.symbol = Some(id);
    Ok(id)
}

fn resolve_types_in_scope(scope: &mut ScopeNode, library: &mut Library) -> Result<(), SemanticError> {
    for statement in &mut scope.statements {
        resolve_types_in_statement(statement, library)?;
    }
    Ok(())
}

fn resolve_types_in_statement(
    statement: &mut StatementNode,
    library: &mut Library,
) -> Result<(), SemanticError> {
    match statement {
        StatementNode::Variable(variable) => resolve_variable_types(variable, library),
        StatementNode::Scope(scope) => resolve_types_in_scope(scope, library),
        StatementNode::Return(node) => match &mut node.value {
            Some(value) => resolve_types_in_expression(value, library),
            None => Ok(()),
        },
        StatementNode::If(node) => resolve_types_in_if(node, library),
        StatementNode::While(node) => {
            resolve_types_in_expression(&mut node.condition, library)?;
            resolve_types_in_scope(&mut node.scope, library)
        }
        StatementNode::For(node) => {
            if let Some(variable) = &mut node.initial_variable {
                resolve_variable_types(variable, library)?;
            }
            for expression in [&mut node.initial_expression, &mut node.condition, &mut node.iterator]
                .into_iter()
                .flatten()
            {
                resolve_types_in_expression(expression, library)?;
            }
            resolve_types_in_scope(&mut node.scope, library)
        }
        StatementNode::Expression(expression) => resolve_types_in_expression(expression, library),
        StatementNode::Label(_)
        | StatementNode::Goto(_)
        | StatementNode::Break
        | StatementNode::Continue => Ok(()),
    }
}

fn resolve_types_in_if(node: &mut IfNode, library: &mut Library) -> Result<(), SemanticError> {
    if let Some(condition) = &mut node.condition {
        resolve_types_in_expression(condition, library)?;
    }
    resolve_types_in_scope(&mut node.scope, library)?;
    match &mut node.else_node {
        Some(else_node) => resolve_types_in_if(else_node, library),
        None => Ok(()),
    }
}

/// Cast targets are the one place type references hide inside expressions.
fn resolve_types_in_expression(
    expression: &mut ExpressionNode,
    library: &mut Library,
) -> Result<(), SemanticError> {
    match &mut expression.kind {
        ExpressionKind::Cast(node) => {
            resolve_type_reference(&mut node.type_reference, library)?;
            resolve_types_in_expression(&mut node.operand, library)
        }
        ExpressionKind::BinaryOperator(node) => {
            resolve_types_in_expression(&mut node.left, library)?;
            resolve_types_in_expression(&mut node.right, library)
        }
        ExpressionKind::UnaryOperator(node) => resolve_types_in_expression(&mut node.operand, library),
        ExpressionKind::MemberAccess(node) => resolve_types_in_expression(&mut node.left, library),
        ExpressionKind::Call(node) => {
            resolve_types_in_expression(&mut node.callee, library)?;
            for argument in &mut node.arguments {
                resolve_types_in_expression(argument, library)?;
            }
            Ok(())
        }
        ExpressionKind::Index(node) => {
            resolve_types_in_expression(&mut node.left, library)?;
            resolve_types_in_expression(&mut node.index, library)
        }
        ExpressionKind::Literal(_) | ExpressionKind::NameReference(_) => Ok(()),
    }
}

/// Pass C: create the Variable, Function, and Label symbols and attach each
/// to its owner (the global namespace, the enclosing class, or the enclosing
/// function) purely from lexical position.
pub fn register_declarations(
    block: &mut BlockNode,
    library: &mut Library,
) -> Result<(), SemanticError> {
    for global in &mut block.globals {
        match global {
            GlobalNode::Class(class) => register_class_members(class, library)?,
            GlobalNode::Variable(variable) => {
                let id = library.create_variable(&variable.name.text, true)?;
                library.symbol_mut(id).value_type = variable.type_reference.symbol;
                variable.symbol = Some(id);
            }
            GlobalNode::Function(function) => {
                let id = library.create_function(&function.name.text, true)?;
                library.symbol_mut(id).value_type = function.signature_type;
                function.symbol = Some(id);
                register_function_internals(function, id, library)?;
            }
        }
    }
    Ok(())
}

fn register_class_members(class: &mut ClassNode, library: &mut Library) -> Result<(), SemanticError> {
    let class_id = match class.symbol {
        Some(id) => id,
        None => return Err(SemanticError::SymbolNotFound(class.name.text.clone())),
    };

    for member in &mut class.members {
        let (name, member_id) = match member {
            MemberNode::Variable(variable) => {
                let id = library.create_variable(&variable.name.text, false)?;
                library.symbol_mut(id).value_type = variable.type_reference.symbol;
                variable.symbol = Some(id);
                (variable.name.text.clone(), id)
            }
            MemberNode::Function(function) => {
                let id = library.create_function(&function.name.text, false)?;
                library.symbol_mut(id).value_type = function.signature_type;
                function.symbol = Some(id);
                register_function_internals(function, id, library)?;
                (function.name.text.clone(), id)
            }
        };

        library.symbol_mut(member_id).parent_type = Some(class_id);
        let data = match library.type_data_mut(class_id) {
            Some(data) => data,
            None => return Err(SemanticError::SymbolNotFound(class.name.text.clone())),
        };
        if data.members_by_name.contains_key(&name) {
            return Err(SemanticError::DuplicateName(name));
        }
        data.members.push(member_id);
        data.members_by_name.insert(name, member_id);
    }
    Ok(())
}

/// Register a function's parameters, locals, and labels, attaching them all
/// to the function symbol.
fn register_function_internals(
    function: &mut FunctionNode,
    function_id: SymbolId,
    library: &mut Library,
) -> Result<(), SemanticError> {
    for parameter in &mut function.parameters {
        let id = library.create_variable(&parameter.name.text, false)?;
        let symbol = library.symbol_mut(id);
        symbol.kind = SymbolKind::Variable { is_parameter: true };
        symbol.value_type = parameter.type_reference.symbol;
        symbol.parent_function = Some(function_id);
        parameter.symbol = Some(id);
        attach_local(library, function_id, id)?;
    }
    register_scope_declarations(&mut function.body, function_id, library)
}

fn register_scope_declarations(
    scope: &mut ScopeNode,
    function_id: SymbolId,
    library: &mut Library,
) -> Result<(), SemanticError> {
    for statement in &mut scope.statements {
        register_statement_declarations(statement, function_id, library)?;
    }
    Ok(())
}

fn register_statement_declarations(
    statement: &mut StatementNode,
    function_id: SymbolId,
    library: &mut Library,
) -> Result<(), SemanticError> {
    match statement {
        StatementNode::Variable(variable) => {
            let id = library.create_variable(&variable.name.text, false)?;
            let symbol = library.symbol_mut(id);
            symbol.value_type = variable.type_reference.symbol;
            symbol.parent_function = Some(function_id);
            variable.symbol = Some(id);
            attach_local(library, function_id, id)
        }
        StatementNode::Scope(scope) => register_scope_declarations(scope, function_id, library),
        StatementNode::Label(label) => {
            let id = library.create_label(&label.name.text)?;
            library.symbol_mut(id).parent_function = Some(function_id);
            label.symbol = Some(id);

            let name = label.name.text.clone();
            let data = function_data_mut(library, function_id)?;
            // Labels share one namespace across the whole function body.
            if data.labels_by_name.contains_key(&name) {
                return Err(SemanticError::DuplicateName(name));
            }
            data.labels_by_name.insert(name, id);
            Ok(())
        }
        StatementNode::If(node) => register_if_declarations(node, function_id, library),
        StatementNode::While(node) => register_scope_declarations(&mut node.scope, function_id, library),
        StatementNode::For(node) => {
            if let Some(variable) = &mut node.initial_variable {
                let id = library.create_variable(&variable.name.text, false)?;
                let symbol = library.symbol_mut(id);
                symbol.value_type = variable.type_reference.symbol;
                symbol.parent_function = Some(function_id);
                variable.symbol = Some(id);
                attach_local(library, function_id, id)?;
            }
            register_scope_declarations(&mut node.scope, function_id, library)
        }
        StatementNode::Goto(_)
        | StatementNode::Return(_)
        | StatementNode::Break
        | StatementNode::Continue
        | StatementNode::Expression(_) => Ok(()),
    }
}

fn register_if_declarations(
    node: &mut IfNode,
    function_id: SymbolId,
    library: &mut Library,
) -> Result<(), SemanticError> {
    register_scope_declarations(&mut node.scope, function_id, library)?;
    match &mut node.else_node {
        Some(else_node) => register_if_declarations(else_node, function_id, library),
        None => Ok(()),
    }
}

fn attach_local(
    library: &mut Library,
    function_id: SymbolId,
    local: SymbolId,
) -> Result<(), SemanticError> {
    function_data_mut(library, function_id)?.locals.push(local);
    Ok(())
}

fn function_data_mut<'a>(
    library: &'a mut Library,
    function_id: SymbolId,
) -> Result<&'a mut crate::library::library::FunctionData, SemanticError> {
    let name = library.symbol(function_id).name.clone();
    match &mut library.symbol_mut(function_id).kind {
        SymbolKind::Function(data) => Ok(data),
        _ => Err(SemanticError::SymbolNotFound(name)),
    }
}
