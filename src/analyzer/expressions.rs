//! Pass D: name resolution and type checking of every expression and
//! statement, with the scope stack tracking lexical position.

use tracing::trace;

use crate::ast::nodes::{
    BlockNode, ExpressionKind, ExpressionNode, FunctionNode, GlobalNode, IfNode, MemberNode,
    ScopeNode, StatementNode, VariableNode,
};
use crate::ast::tokens::TokenKind;
use crate::errors::errors::SemanticError;
use crate::library::library::{Library, SymbolId, SymbolKind, TypeId, TypeMode};

use super::analyzer::ScopeStack;

pub fn resolve(block: &mut BlockNode, library: &mut Library) -> Result<(), SemanticError> {
    let mut resolver = Resolver {
        library,
        scopes: ScopeStack::default(),
        current_function: None,
        in_loop: false,
    };

    for global in &mut block.globals {
        match global {
            GlobalNode::Class(class) => {
                for member in &mut class.members {
                    match member {
                        MemberNode::Variable(variable) => {
                            resolver.resolve_initializer(variable)?;
                        }
                        MemberNode::Function(function) => resolver.resolve_function(function)?,
                    }
                }
            }
            GlobalNode::Variable(variable) => resolver.resolve_initializer(variable)?,
            GlobalNode::Function(function) => resolver.resolve_function(function)?,
        }
    }
    Ok(())
}

struct Resolver<'lib> {
    library: &'lib mut Library,
    scopes: ScopeStack,
    current_function: Option<SymbolId>,
    in_loop: bool,
}

impl Resolver<'_> {
    fn resolve_function(&mut self, function: &mut FunctionNode) -> Result<(), SemanticError> {
        let id = function
            .symbol
            .ok_or_else(|| SemanticError::SymbolNotFound(function.name.text.clone()))?;
        trace!(name = %function.name.text, "resolving function body");

        let enclosing = self.current_function.replace(id);
        let was_in_loop = std::mem::replace(&mut self.in_loop, false);

        // Parameters live in a scope of their own; body locals may shadow
        // them.
        self.scopes.push();
        for parameter in &function.parameters {
            if let Some(symbol) = parameter.symbol {
                self.scopes.declare(&parameter.name.text, symbol)?;
            }
        }
        let result = self.resolve_scope(&mut function.body);
        self.scopes.pop();

        self.in_loop = was_in_loop;
        self.current_function = enclosing;
        result
    }

    fn resolve_scope(&mut self, scope: &mut ScopeNode) -> Result<(), SemanticError> {
        self.scopes.push();
        let result = scope
            .statements
            .iter_mut()
            .try_for_each(|statement| self.resolve_statement(statement));
        self.scopes.pop();
        result
    }

    fn resolve_statement(&mut self, statement: &mut StatementNode) -> Result<(), SemanticError> {
        match statement {
            StatementNode::Variable(variable) => {
                self.resolve_initializer(variable)?;
                self.declare_local(variable)
            }
            StatementNode::Scope(scope) => self.resolve_scope(scope),
            StatementNode::Label(_) => Ok(()),
            StatementNode::Goto(node) => {
                let function = self
                    .current_function
                    .ok_or_else(|| SemanticError::LabelNotFound(node.name.text.clone()))?;
                let label = match &self.library.symbol(function).kind {
                    SymbolKind::Function(data) => data.labels_by_name.get(&node.name.text).copied(),
                    _ => None,
                };
                node.resolved_label =
                    Some(label.ok_or_else(|| SemanticError::LabelNotFound(node.name.text.clone()))?);
                Ok(())
            }
            StatementNode::Return(node) => self.resolve_return(node),
            StatementNode::Break => {
                if self.in_loop {
                    Ok(())
                } else {
                    Err(SemanticError::BreakContinueOutsideLoop("break".into()))
                }
            }
            StatementNode::Continue => {
                if self.in_loop {
                    Ok(())
                } else {
                    Err(SemanticError::BreakContinueOutsideLoop("continue".into()))
                }
            }
            StatementNode::If(node) => self.resolve_if(node),
            StatementNode::While(node) => {
                self.check_condition(&mut node.condition)?;
                self.resolve_loop_body(&mut node.scope)
            }
            StatementNode::For(node) => {
                // The header gets its own scope so the induction variable is
                // visible to the condition, iterator, and body.
                self.scopes.push();
                let result = (|| {
                    if let Some(variable) = &mut node.initial_variable {
                        self.resolve_initializer(variable)?;
                        self.declare_local(variable)?;
                    }
                    if let Some(expression) = &mut node.initial_expression {
                        self.resolve_expression(expression)?;
                    }
                    if let Some(condition) = &mut node.condition {
                        self.check_condition(condition)?;
                    }
                    if let Some(iterator) = &mut node.iterator {
                        self.resolve_expression(iterator)?;
                    }
                    self.resolve_loop_body(&mut node.scope)
                })();
                self.scopes.pop();
                result
            }
            StatementNode::Expression(expression) => {
                self.resolve_expression(expression).map(|_| ())
            }
        }
    }

    /// The loop flag is saved and restored, not just set, so statements
    /// after an inner loop are still recognized as inside the outer one.
    fn resolve_loop_body(&mut self, scope: &mut ScopeNode) -> Result<(), SemanticError> {
        let was_in_loop = std::mem::replace(&mut self.in_loop, true);
        let result = self.resolve_scope(scope);
        self.in_loop = was_in_loop;
        result
    }

    fn resolve_if(&mut self, node: &mut IfNode) -> Result<(), SemanticError> {
        if let Some(condition) = &mut node.condition {
            self.check_condition(condition)?;
        }
        self.resolve_scope(&mut node.scope)?;
        match &mut node.else_node {
            Some(else_node) => self.resolve_if(else_node),
            None => Ok(()),
        }
    }

    /// Initializer expressions are resolved but their type is not checked
    /// against the declaration.
    fn resolve_initializer(&mut self, variable: &mut VariableNode) -> Result<(), SemanticError> {
        if let Some(value) = &mut variable.initial_value {
            self.resolve_expression(value)?;
        }
        Ok(())
    }

    fn declare_local(&mut self, variable: &VariableNode) -> Result<(), SemanticError> {
        let symbol = variable
            .symbol
            .ok_or_else(|| SemanticError::SymbolNotFound(variable.name.text.clone()))?;
        self.scopes.declare(&variable.name.text, symbol)
    }

    fn resolve_return(
        &mut self,
        node: &mut crate::ast::nodes::ReturnNode,
    ) -> Result<(), SemanticError> {
        let expected = self
            .current_function
            .and_then(|id| self.library.symbol(id).value_type)
            .and_then(|signature| self.library.type_data(signature))
            .and_then(|data| data.return_type)
            .unwrap_or(self.library.core().void);

        let found = match &mut node.value {
            Some(value) => self.resolve_expression(value)?,
            None => self.library.core().void,
        };
        if found != expected {
            return Err(SemanticError::TypeMismatch {
                expected: self.name_of(expected),
                found: self.name_of(found),
            });
        }
        Ok(())
    }

    fn check_condition(&mut self, condition: &mut ExpressionNode) -> Result<(), SemanticError> {
        let ty = self.resolve_expression(condition)?;
        if self.is_truthy_type(ty) {
            Ok(())
        } else {
            Err(SemanticError::ConditionExpectedBooleanOrPointer(
                self.name_of(ty),
            ))
        }
    }

    fn resolve_expression(
        &mut self,
        expression: &mut ExpressionNode,
    ) -> Result<TypeId, SemanticError> {
        let ty = match &mut expression.kind {
            ExpressionKind::Literal(literal) => {
                let core = *self.library.core();
                match literal.token.kind {
                    TokenKind::IntegerLiteral => core.integer,
                    TokenKind::FloatLiteral => core.float,
                    TokenKind::StringLiteral => core.byte_pointer,
                    TokenKind::CharacterLiteral => core.byte,
                    TokenKind::True | TokenKind::False => core.boolean,
                    TokenKind::Null => self.library.get_pointer_type(core.null),
                    _ => unreachable!("only literal token kinds reach literal nodes"),
                }
            }
            ExpressionKind::NameReference(node) => {
                let symbol = self
                    .scopes
                    .lookup(&node.name.text)
                    .or_else(|| self.library.find_global(&node.name.text))
                    .ok_or_else(|| SemanticError::SymbolNotFound(node.name.text.clone()))?;
                node.symbol = Some(symbol);
                self.library
                    .symbol(symbol)
                    .value_type
                    .ok_or_else(|| SemanticError::SymbolNotFound(node.name.text.clone()))?
            }
            ExpressionKind::BinaryOperator(node) => {
                let operator = node.operator.kind;
                let left = self.resolve_expression(&mut node.left)?;
                let right = self.resolve_expression(&mut node.right)?;
                self.binary_result(operator, left, right)?
            }
            ExpressionKind::UnaryOperator(node) => {
                let operator = node.operator.kind;
                let operand = self.resolve_expression(&mut node.operand)?;
                self.unary_result(operator, operand)?
            }
            ExpressionKind::MemberAccess(node) => {
                let left = self.resolve_expression(&mut node.left)?;
                let owner = match node.operator.kind {
                    TokenKind::Dot => (self.mode(left) == Some(TypeMode::Class)).then_some(left),
                    TokenKind::Arrow => self.pointee(left),
                    _ => None,
                };
                let member = owner.and_then(|owner| {
                    self.library
                        .type_data(owner)
                        .and_then(|data| data.members_by_name.get(&node.name.text).copied())
                });
                let member = member.ok_or_else(|| SemanticError::InvalidMemberAccess {
                    type_name: self.name_of(left),
                    member: node.name.text.clone(),
                })?;
                node.resolved_member = Some(member);
                self.library.symbol(member).value_type.ok_or_else(|| {
                    SemanticError::InvalidMemberAccess {
                        type_name: self.name_of(left),
                        member: node.name.text.clone(),
                    }
                })?
            }
            ExpressionKind::Call(node) => {
                let callee = self.resolve_expression(&mut node.callee)?;
                let (parameters, return_type) = match self.library.type_data(callee) {
                    Some(data) if data.mode == TypeMode::Function => {
                        (data.parameter_types.clone(), data.return_type)
                    }
                    _ => {
                        return Err(SemanticError::InvalidCall(format!(
                            "value of type `{}` is not a function",
                            self.name_of(callee)
                        )))
                    }
                };
                if node.arguments.len() != parameters.len() {
                    return Err(SemanticError::InvalidCall(format!(
                        "expected {} arguments, found {}",
                        parameters.len(),
                        node.arguments.len()
                    )));
                }
                for (argument, expected) in node.arguments.iter_mut().zip(parameters) {
                    let found = self.resolve_expression(argument)?;
                    if found != expected {
                        return Err(SemanticError::InvalidCall(format!(
                            "expected argument of type `{}`, found `{}`",
                            self.name_of(expected),
                            self.name_of(found)
                        )));
                    }
                }
                return_type.unwrap_or(self.library.core().void)
            }
            ExpressionKind::Cast(node) => {
                let from = self.resolve_expression(&mut node.operand)?;
                let to = node
                    .type_reference
                    .symbol
                    .ok_or_else(|| SemanticError::SymbolNotFound("cast target".into()))?;
                if !self.cast_allowed(from, to) {
                    return Err(SemanticError::InvalidCast {
                        from: self.name_of(from),
                        to: self.name_of(to),
                    });
                }
                to
            }
            ExpressionKind::Index(node) => {
                let left = self.resolve_expression(&mut node.left)?;
                // The index expression is resolved but its type is not
                // constrained.
                self.resolve_expression(&mut node.index)?;
                self.pointee(left)
                    .ok_or_else(|| SemanticError::InvalidIndexer(self.name_of(left)))?
            }
        };
        expression.resolved_type = Some(ty);
        Ok(ty)
    }

    fn binary_result(
        &mut self,
        operator: TokenKind,
        left: TypeId,
        right: TypeId,
    ) -> Result<TypeId, SemanticError> {
        let core = *self.library.core();
        let same_numeric = left == right && self.is_numeric(left);

        let result = match operator {
            TokenKind::Plus => {
                if same_numeric {
                    Some(left)
                } else if left == core.integer && self.is_pointer(right) {
                    Some(right)
                } else if self.is_pointer(left) && right == core.integer {
                    Some(left)
                } else {
                    None
                }
            }
            TokenKind::Minus => {
                if same_numeric {
                    Some(left)
                } else if left == core.integer && self.is_pointer(right) {
                    Some(right)
                } else if self.is_pointer(left) && right == core.integer {
                    Some(left)
                } else if self.is_pointer(left) && left == right {
                    // Pointer difference is an element count.
                    Some(core.integer)
                } else {
                    None
                }
            }
            TokenKind::Asterisk | TokenKind::Divide | TokenKind::Modulo => {
                same_numeric.then_some(left)
            }
            TokenKind::Equality
            | TokenKind::Inequality
            | TokenKind::LessThan
            | TokenKind::LessThanOrEqualTo
            | TokenKind::GreaterThan
            | TokenKind::GreaterThanOrEqualTo => Some(core.boolean),
            TokenKind::LogicalAnd | TokenKind::LogicalOr => {
                (self.is_truthy_type(left) && self.is_truthy_type(right)).then_some(core.boolean)
            }
            TokenKind::Assignment => {
                (left == right && self.mode(left) != Some(TypeMode::Function)).then_some(right)
            }
            TokenKind::AssignmentPlus
            | TokenKind::AssignmentMinus
            | TokenKind::AssignmentMultiply
            | TokenKind::AssignmentDivide
            | TokenKind::AssignmentModulo => same_numeric.then_some(left),
            _ => None,
        };

        result.ok_or_else(|| SemanticError::InvalidBinaryOperator {
            operator: operator.lexeme().unwrap_or("?").to_string(),
            left: self.name_of(left),
            right: self.name_of(right),
        })
    }

    fn unary_result(
        &mut self,
        operator: TokenKind,
        operand: TypeId,
    ) -> Result<TypeId, SemanticError> {
        let core = *self.library.core();
        let result = match operator {
            TokenKind::Asterisk => self.pointee(operand),
            TokenKind::Plus | TokenKind::Minus => self.is_numeric(operand).then_some(operand),
            TokenKind::Increment | TokenKind::Decrement => {
                (self.is_numeric(operand) || self.is_pointer(operand)).then_some(operand)
            }
            TokenKind::Not => {
                (operand == core.byte || self.is_pointer(operand)).then_some(core.boolean)
            }
            TokenKind::LogicalNot => (operand == core.boolean
                || operand == core.integer
                || self.is_pointer(operand))
            .then_some(core.boolean),
            TokenKind::Ampersand => Some(self.library.get_pointer_type(operand)),
            _ => None,
        };

        result.ok_or_else(|| SemanticError::InvalidUnaryOperator {
            operator: operator.lexeme().unwrap_or("?").to_string(),
            operand: self.name_of(operand),
        })
    }

    fn cast_allowed(&self, from: TypeId, to: TypeId) -> bool {
        let core = self.library.core();
        let scalar = |ty: TypeId| {
            ty == core.integer || ty == core.float || ty == core.boolean || ty == core.byte
        };

        (scalar(from) && scalar(to))
            || (self.is_pointer(from) && self.is_pointer(to))
            || (from == core.integer && self.is_pointer(to))
            || (self.is_pointer(from) && to == core.integer)
            || (self.is_pointer(from) && to == core.boolean)
    }

    fn mode(&self, ty: TypeId) -> Option<TypeMode> {
        self.library.type_data(ty).map(|data| data.mode)
    }

    fn pointee(&self, ty: TypeId) -> Option<TypeId> {
        self.library
            .type_data(ty)
            .filter(|data| data.mode == TypeMode::Pointer)
            .and_then(|data| data.pointee)
    }

    fn is_pointer(&self, ty: TypeId) -> bool {
        self.mode(ty) == Some(TypeMode::Pointer)
    }

    fn is_numeric(&self, ty: TypeId) -> bool {
        let core = self.library.core();
        ty == core.integer || ty == core.float || ty == core.byte
    }

    fn is_truthy_type(&self, ty: TypeId) -> bool {
        ty == self.library.core().boolean || self.is_pointer(ty)
    }

    fn name_of(&self, ty: TypeId) -> String {
        self.library.type_name(ty).to_string()
    }
}
