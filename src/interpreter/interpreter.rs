use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::ast::nodes::{
    BlockNode, ExpressionKind, ExpressionNode, ForNode, FunctionNode, IfNode, ScopeNode,
    StatementNode,
};
use crate::ast::tokens::TokenKind;
use crate::errors::errors::RuntimeError;
use crate::library::library::{Library, SymbolId, SymbolKind, TypeId, TypeMode};

use super::frames::{ActivationFrame, GlobalFrame};
use super::prepass;
use super::value::{Cell, Pointer, Value, ValueData};

/// A host function: receives the output sink and the evaluated arguments.
pub type NativeCallback = Rc<dyn Fn(&mut dyn Write, &[Value]) -> Result<Value, RuntimeError>>;

/// The table of native bindings, keyed by function symbol. A bound symbol
/// is dispatched to the host instead of to a tree body.
#[derive(Clone, Default)]
pub struct Bindings {
    callbacks: FxHashMap<SymbolId, NativeCallback>,
}

impl Bindings {
    pub fn bind(&mut self, function: SymbolId, callback: NativeCallback) {
        self.callbacks.insert(function, callback);
    }

    fn get(&self, function: SymbolId) -> Option<NativeCallback> {
        self.callbacks.get(&function).cloned()
    }
}

/// How a statement finished: straight through, or carrying a control
/// transfer that enclosing statements must honor.
#[derive(Debug)]
enum Flow {
    Normal,
    Return(Value),
    Break,
    Continue,
}

/// Iterations and calls both count against the step budget.
pub const DEFAULT_STEP_LIMIT: u64 = 50_000_000;

/// The evaluation engine. Walks an analyzed tree; every expression yields
/// one value and every fault is an explicit error result.
pub struct Interpreter<'a> {
    library: &'a Library,
    functions: FxHashMap<SymbolId, &'a FunctionNode>,
    bindings: Bindings,
    globals: GlobalFrame,
    stack: Vec<ActivationFrame>,
    out: &'a mut dyn Write,
    step_limit: u64,
    steps: u64,
}

impl<'a> Interpreter<'a> {
    /// Prepare `block` for execution. The tree must have been analyzed
    /// against `library`; literals are decoded here.
    pub fn new(
        block: &'a mut BlockNode,
        library: &'a Library,
        bindings: Bindings,
        out: &'a mut dyn Write,
    ) -> Result<Self, RuntimeError> {
        prepass::decode_literals(block, library)?;
        let block: &'a BlockNode = block;
        let functions = prepass::collect_functions(block)?;
        Ok(Interpreter {
            library,
            functions,
            bindings,
            globals: GlobalFrame::default(),
            stack: Vec::new(),
            out,
            step_limit: DEFAULT_STEP_LIMIT,
            steps: 0,
        })
    }

    pub fn with_step_limit(mut self, limit: u64) -> Self {
        self.step_limit = limit;
        self
    }

    /// Look up the entry point by name, check its shape (no parameters,
    /// Integer return), and run it.
    pub fn run_entry(&mut self, name: &str) -> Result<Value, RuntimeError> {
        let symbol = self
            .library
            .find_global(name)
            .ok_or_else(|| RuntimeError::InvalidEntryPoint(format!("no global named `{name}`")))?;

        let signature = self
            .library
            .symbol(symbol)
            .value_type
            .and_then(|ty| self.library.type_data(ty))
            .filter(|data| data.mode == TypeMode::Function)
            .ok_or_else(|| RuntimeError::InvalidEntryPoint(format!("`{name}` is not a function")))?;
        if !signature.parameter_types.is_empty() {
            return Err(RuntimeError::InvalidEntryPoint(format!(
                "`{name}` must take no parameters"
            )));
        }
        if signature.return_type != Some(self.library.core().integer) {
            return Err(RuntimeError::InvalidEntryPoint(format!(
                "`{name}` must return Integer"
            )));
        }

        debug!(name, "running entry point");
        self.call_symbol(symbol, Vec::new())
    }

    fn call_symbol(
        &mut self,
        function: SymbolId,
        arguments: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        self.charge_step()?;
        trace!(name = %self.library.symbol(function).name, "call");

        if let Some(callback) = self.bindings.get(function) {
            return callback(&mut *self.out, &arguments);
        }

        let node = match self.functions.get(&function) {
            Some(&node) => node,
            None => {
                return Err(RuntimeError::UnboundFunction(
                    self.library.symbol(function).name.clone(),
                ))
            }
        };

        // The frame is popped on every path out, error paths included.
        self.stack.push(ActivationFrame::new(function));
        let result = self.run_function_body(node, arguments);
        if let Some(frame) = self.stack.pop() {
            trace!(name = %self.library.symbol(frame.function).name, "return");
        }
        result
    }

    fn run_function_body(
        &mut self,
        node: &'a FunctionNode,
        arguments: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        for (parameter, argument) in node.parameters.iter().zip(arguments) {
            let symbol = parameter.symbol.ok_or_else(|| {
                RuntimeError::NotAnalyzed(format!(
                    "parameter `{}` has no symbol",
                    parameter.name.text
                ))
            })?;
            self.frame_mut()?.bind(symbol, argument);
        }

        match self.exec_scope(&node.body)? {
            Flow::Return(value) => Ok(value),
            // Falling off the end yields the return type's default.
            Flow::Normal => {
                let return_type = self.return_type_of(node)?;
                Ok(self.default_value(return_type))
            }
            Flow::Break | Flow::Continue => Err(RuntimeError::Unsupported(
                "loop control escaped a function body".into(),
            )),
        }
    }

    fn exec_scope(&mut self, scope: &'a ScopeNode) -> Result<Flow, RuntimeError> {
        self.frame_mut()?.push_scope();
        let result = self.exec_statements(&scope.statements);
        if let Ok(frame) = self.frame_mut() {
            frame.pop_scope();
        }
        result
    }

    fn exec_statements(&mut self, statements: &'a [StatementNode]) -> Result<Flow, RuntimeError> {
        for statement in statements {
            match self.exec_statement(statement)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_statement(&mut self, statement: &'a StatementNode) -> Result<Flow, RuntimeError> {
        match statement {
            StatementNode::Variable(variable) => {
                let symbol = variable.symbol.ok_or_else(|| {
                    RuntimeError::NotAnalyzed(format!(
                        "variable `{}` has no symbol",
                        variable.name.text
                    ))
                })?;
                let value = match &variable.initial_value {
                    Some(expression) => self.eval(expression)?,
                    None => {
                        let ty = variable.type_reference.symbol.ok_or_else(|| {
                            RuntimeError::NotAnalyzed(format!(
                                "variable `{}` has no type",
                                variable.name.text
                            ))
                        })?;
                        self.default_value(ty)
                    }
                };
                self.frame_mut()?.bind(symbol, value);
                Ok(Flow::Normal)
            }
            StatementNode::Scope(scope) => self.exec_scope(scope),
            StatementNode::Label(_) => Ok(Flow::Normal),
            StatementNode::Goto(_) => Err(RuntimeError::Unsupported("goto".into())),
            StatementNode::Return(node) => {
                let value = match &node.value {
                    Some(expression) => self.eval(expression)?,
                    None => Value::new(self.library.core().void, ValueData::Void),
                };
                Ok(Flow::Return(value))
            }
            StatementNode::Break => Ok(Flow::Break),
            StatementNode::Continue => Ok(Flow::Continue),
            StatementNode::If(node) => self.exec_if(node),
            StatementNode::While(node) => {
                loop {
                    self.charge_step()?;
                    if !self.eval(&node.condition)?.truthy()? {
                        break;
                    }
                    match self.exec_scope(&node.scope)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
                Ok(Flow::Normal)
            }
            StatementNode::For(node) => {
                // Header scope for the induction variable.
                self.frame_mut()?.push_scope();
                let result = self.exec_for(node);
                if let Ok(frame) = self.frame_mut() {
                    frame.pop_scope();
                }
                result
            }
            StatementNode::Expression(expression) => {
                self.eval(expression)?;
                Ok(Flow::Normal)
            }
        }
    }

    fn exec_if(&mut self, node: &'a IfNode) -> Result<Flow, RuntimeError> {
        let taken = match &node.condition {
            Some(condition) => self.eval(condition)?.truthy()?,
            // A bare else.
            None => true,
        };
        if taken {
            self.exec_scope(&node.scope)
        } else if let Some(else_node) = &node.else_node {
            self.exec_if(else_node)
        } else {
            Ok(Flow::Normal)
        }
    }

    fn exec_for(&mut self, node: &'a ForNode) -> Result<Flow, RuntimeError> {
        if let Some(variable) = &node.initial_variable {
            let symbol = variable.symbol.ok_or_else(|| {
                RuntimeError::NotAnalyzed(format!("variable `{}` has no symbol", variable.name.text))
            })?;
            let value = match &variable.initial_value {
                Some(expression) => self.eval(expression)?,
                None => {
                    let ty = variable.type_reference.symbol.ok_or_else(|| {
                        RuntimeError::NotAnalyzed(format!(
                            "variable `{}` has no type",
                            variable.name.text
                        ))
                    })?;
                    self.default_value(ty)
                }
            };
            self.frame_mut()?.bind(symbol, value);
        }
        if let Some(expression) = &node.initial_expression {
            self.eval(expression)?;
        }

        loop {
            self.charge_step()?;
            if let Some(condition) = &node.condition {
                if !self.eval(condition)?.truthy()? {
                    break;
                }
            }
            match self.exec_scope(&node.scope)? {
                Flow::Break => break,
                Flow::Return(value) => return Ok(Flow::Return(value)),
                Flow::Normal | Flow::Continue => {}
            }
            if let Some(iterator) = &node.iterator {
                self.eval(iterator)?;
            }
        }
        Ok(Flow::Normal)
    }

    fn eval(&mut self, expression: &'a ExpressionNode) -> Result<Value, RuntimeError> {
        match &expression.kind {
            ExpressionKind::Literal(literal) => literal.value.clone().ok_or_else(|| {
                RuntimeError::NotAnalyzed(format!("literal `{}` was not decoded", literal.token.text))
            }),
            ExpressionKind::NameReference(node) => {
                let symbol = node.symbol.ok_or_else(|| {
                    RuntimeError::NotAnalyzed(format!("name `{}` was not resolved", node.name.text))
                })?;
                self.read_symbol(symbol)
            }
            ExpressionKind::BinaryOperator(node) => {
                let result_type = self.result_type(expression)?;
                match node.operator.kind {
                    TokenKind::Assignment => {
                        let target = self.eval(&node.left)?;
                        let value = self.eval(&node.right)?;
                        self.store(target, value)
                    }
                    TokenKind::AssignmentPlus
                    | TokenKind::AssignmentMinus
                    | TokenKind::AssignmentMultiply
                    | TokenKind::AssignmentDivide
                    | TokenKind::AssignmentModulo => {
                        let target = self.eval(&node.left)?;
                        let value = self.eval(&node.right)?;
                        let operator = match node.operator.kind {
                            TokenKind::AssignmentPlus => TokenKind::Plus,
                            TokenKind::AssignmentMinus => TokenKind::Minus,
                            TokenKind::AssignmentMultiply => TokenKind::Asterisk,
                            TokenKind::AssignmentDivide => TokenKind::Divide,
                            _ => TokenKind::Modulo,
                        };
                        let combined = self.arithmetic(operator, &target, &value, result_type)?;
                        self.store(target, combined)
                    }
                    TokenKind::LogicalAnd => {
                        let result = self.eval(&node.left)?.truthy()?
                            && self.eval(&node.right)?.truthy()?;
                        Ok(self.boolean(result))
                    }
                    TokenKind::LogicalOr => {
                        let result = self.eval(&node.left)?.truthy()?
                            || self.eval(&node.right)?.truthy()?;
                        Ok(self.boolean(result))
                    }
                    TokenKind::Equality
                    | TokenKind::Inequality
                    | TokenKind::LessThan
                    | TokenKind::LessThanOrEqualTo
                    | TokenKind::GreaterThan
                    | TokenKind::GreaterThanOrEqualTo => {
                        let left = self.eval(&node.left)?;
                        let right = self.eval(&node.right)?;
                        self.compare(node.operator.kind, &left, &right)
                    }
                    _ => {
                        let left = self.eval(&node.left)?;
                        let right = self.eval(&node.right)?;
                        self.arithmetic(node.operator.kind, &left, &right, result_type)
                    }
                }
            }
            ExpressionKind::UnaryOperator(node) => {
                let result_type = self.result_type(expression)?;
                self.eval_unary(node.operator.kind, &node.operand, result_type)
            }
            ExpressionKind::MemberAccess(_) => Err(RuntimeError::Unsupported(
                "member access on a class value".into(),
            )),
            ExpressionKind::Call(node) => {
                // Arguments first, left to right, then the callee.
                let mut arguments = Vec::with_capacity(node.arguments.len());
                for argument in &node.arguments {
                    arguments.push(self.eval(argument)?);
                }
                let callee = self.eval(&node.callee)?;
                match callee.data {
                    ValueData::Function(function) => self.call_symbol(function, arguments),
                    _ => Err(RuntimeError::NotCallable(
                        self.library.type_name(callee.type_id).to_string(),
                    )),
                }
            }
            ExpressionKind::Cast(node) => {
                let to = self.result_type(expression)?;
                let operand = self.eval(&node.operand)?;
                self.cast(operand, to)
            }
            ExpressionKind::Index(node) => {
                let result_type = self.result_type(expression)?;
                let left = self.eval(&node.left)?;
                let index = self.eval(&node.index)?;
                let offset = index
                    .as_integer()
                    .ok_or_else(|| RuntimeError::Unsupported("non-integer index".into()))?;
                match left.as_pointer() {
                    Some(Pointer::Null) => Err(RuntimeError::NullDereference),
                    Some(Pointer::Bytes { buffer, offset: base }) => {
                        let position = *base as i64 + offset as i64;
                        let byte = (position >= 0)
                            .then(|| buffer.get(position as usize).copied())
                            .flatten()
                            .ok_or_else(|| {
                                RuntimeError::InvalidPointerArithmetic(
                                    "index outside the buffer".into(),
                                )
                            })?;
                        Ok(Value::new(result_type, ValueData::Byte(byte)))
                    }
                    Some(Pointer::Cell(cell)) => {
                        if offset == 0 {
                            Ok(read_cell(cell))
                        } else {
                            Err(RuntimeError::InvalidPointerArithmetic(
                                "indexing a variable pointer".into(),
                            ))
                        }
                    }
                    None => Err(RuntimeError::Unsupported("indexing a non-pointer".into())),
                }
            }
        }
    }

    fn eval_unary(
        &mut self,
        operator: TokenKind,
        operand: &'a ExpressionNode,
        result_type: TypeId,
    ) -> Result<Value, RuntimeError> {
        let value = self.eval(operand)?;
        match operator {
            TokenKind::Plus => Ok(value.detached()),
            TokenKind::Minus => {
                let data = match value.data {
                    ValueData::Integer(a) => ValueData::Integer(a.wrapping_neg()),
                    ValueData::Float(a) => ValueData::Float(-a),
                    ValueData::Byte(a) => ValueData::Byte(a.wrapping_neg()),
                    _ => return Err(RuntimeError::Unsupported("negating a non-number".into())),
                };
                Ok(Value::new(result_type, data))
            }
            TokenKind::Not => {
                let result = match &value.data {
                    ValueData::Byte(byte) => *byte == 0,
                    ValueData::Pointer(pointer) => pointer.is_null(),
                    _ => return Err(RuntimeError::Unsupported("`~` on an unexpected value".into())),
                };
                Ok(self.boolean(result))
            }
            TokenKind::LogicalNot => {
                let result = match &value.data {
                    ValueData::Boolean(flag) => !flag,
                    ValueData::Integer(int) => *int == 0,
                    ValueData::Pointer(pointer) => pointer.is_null(),
                    _ => return Err(RuntimeError::Unsupported("`!` on an unexpected value".into())),
                };
                Ok(self.boolean(result))
            }
            TokenKind::Asterisk => match value.as_pointer() {
                Some(Pointer::Null) => Err(RuntimeError::NullDereference),
                Some(Pointer::Cell(cell)) => Ok(read_cell(cell)),
                Some(Pointer::Bytes { buffer, offset }) => {
                    let byte = buffer.get(*offset).copied().ok_or_else(|| {
                        RuntimeError::InvalidPointerArithmetic("read past the end of a buffer".into())
                    })?;
                    Ok(Value::new(result_type, ValueData::Byte(byte)))
                }
                None => Err(RuntimeError::Unsupported("dereferencing a non-pointer".into())),
            },
            TokenKind::Ampersand => {
                // Taking the address of a temporary materializes it.
                let cell = match value.origin {
                    Some(ref cell) => Rc::clone(cell),
                    None => Rc::new(RefCell::new(value.detached())),
                };
                Ok(Value::new(result_type, ValueData::Pointer(Pointer::Cell(cell))))
            }
            TokenKind::Increment | TokenKind::Decrement => {
                let delta: i32 = if operator == TokenKind::Increment { 1 } else { -1 };
                let cell = value.origin.clone().ok_or(RuntimeError::NotAssignable)?;
                let data = match &value.data {
                    ValueData::Integer(a) => ValueData::Integer(a.wrapping_add(delta)),
                    ValueData::Float(a) => ValueData::Float(a + delta as f32),
                    ValueData::Byte(a) => ValueData::Byte(a.wrapping_add(delta as u8)),
                    ValueData::Pointer(pointer) => {
                        ValueData::Pointer(offset_pointer(pointer, delta as i64)?)
                    }
                    _ => {
                        return Err(RuntimeError::Unsupported(
                            "stepping an unexpected value".into(),
                        ))
                    }
                };
                let updated = Value::new(value.type_id, data);
                *cell.borrow_mut() = updated.detached();
                Ok(updated.with_origin(cell))
            }
            _ => Err(RuntimeError::Unsupported(format!(
                "unary operator `{}`",
                operator.lexeme().unwrap_or("?")
            ))),
        }
    }

    /// Write `value` through the storage cell `target` was read from.
    fn store(&mut self, target: Value, value: Value) -> Result<Value, RuntimeError> {
        let cell = target.origin.ok_or(RuntimeError::NotAssignable)?;
        *cell.borrow_mut() = value.detached();
        Ok(value.with_origin(cell))
    }

    fn arithmetic(
        &self,
        operator: TokenKind,
        left: &Value,
        right: &Value,
        result_type: TypeId,
    ) -> Result<Value, RuntimeError> {
        let data = match (&left.data, &right.data) {
            (ValueData::Integer(a), ValueData::Integer(b)) => {
                let (a, b) = (*a, *b);
                ValueData::Integer(match operator {
                    TokenKind::Plus => a.wrapping_add(b),
                    TokenKind::Minus => a.wrapping_sub(b),
                    TokenKind::Asterisk => a.wrapping_mul(b),
                    TokenKind::Divide => {
                        if b == 0 {
                            return Err(RuntimeError::DivisionByZero);
                        }
                        a.wrapping_div(b)
                    }
                    TokenKind::Modulo => {
                        if b == 0 {
                            return Err(RuntimeError::DivisionByZero);
                        }
                        a.wrapping_rem(b)
                    }
                    _ => {
                        return Err(RuntimeError::Unsupported(
                            "unexpected integer operator".into(),
                        ))
                    }
                })
            }
            (ValueData::Byte(a), ValueData::Byte(b)) => {
                let (a, b) = (*a, *b);
                ValueData::Byte(match operator {
                    TokenKind::Plus => a.wrapping_add(b),
                    TokenKind::Minus => a.wrapping_sub(b),
                    TokenKind::Asterisk => a.wrapping_mul(b),
                    TokenKind::Divide => {
                        if b == 0 {
                            return Err(RuntimeError::DivisionByZero);
                        }
                        a / b
                    }
                    TokenKind::Modulo => {
                        if b == 0 {
                            return Err(RuntimeError::DivisionByZero);
                        }
                        a % b
                    }
                    _ => {
                        return Err(RuntimeError::Unsupported("unexpected byte operator".into()))
                    }
                })
            }
            (ValueData::Float(a), ValueData::Float(b)) => {
                let (a, b) = (*a, *b);
                ValueData::Float(match operator {
                    TokenKind::Plus => a + b,
                    TokenKind::Minus => a - b,
                    TokenKind::Asterisk => a * b,
                    TokenKind::Divide => a / b,
                    TokenKind::Modulo => a % b,
                    _ => {
                        return Err(RuntimeError::Unsupported("unexpected float operator".into()))
                    }
                })
            }
            (ValueData::Pointer(pointer), ValueData::Integer(delta)) => {
                let delta = *delta as i64;
                match operator {
                    TokenKind::Plus => ValueData::Pointer(offset_pointer(pointer, delta)?),
                    TokenKind::Minus => ValueData::Pointer(offset_pointer(pointer, -delta)?),
                    _ => {
                        return Err(RuntimeError::InvalidPointerArithmetic(
                            "unexpected pointer operator".into(),
                        ))
                    }
                }
            }
            (ValueData::Integer(delta), ValueData::Pointer(pointer)) => match operator {
                TokenKind::Plus => ValueData::Pointer(offset_pointer(pointer, *delta as i64)?),
                _ => {
                    return Err(RuntimeError::InvalidPointerArithmetic(
                        "integer minus pointer".into(),
                    ))
                }
            },
            (ValueData::Pointer(a), ValueData::Pointer(b)) if operator == TokenKind::Minus => {
                ValueData::Integer(pointer_difference(a, b)?)
            }
            _ => {
                return Err(RuntimeError::Unsupported(
                    "arithmetic on mismatched values".into(),
                ))
            }
        };
        Ok(Value::new(result_type, data))
    }

    fn compare(
        &self,
        operator: TokenKind,
        left: &Value,
        right: &Value,
    ) -> Result<Value, RuntimeError> {
        use std::cmp::Ordering;

        let result = match operator {
            TokenKind::Equality => values_equal(left, right)?,
            TokenKind::Inequality => !values_equal(left, right)?,
            _ => {
                let ordering = order_values(left, right)?;
                match operator {
                    TokenKind::LessThan => ordering == Ordering::Less,
                    TokenKind::LessThanOrEqualTo => ordering != Ordering::Greater,
                    TokenKind::GreaterThan => ordering == Ordering::Greater,
                    TokenKind::GreaterThanOrEqualTo => ordering != Ordering::Less,
                    _ => {
                        return Err(RuntimeError::Unsupported(
                            "unexpected comparison operator".into(),
                        ))
                    }
                }
            }
        };
        Ok(self.boolean(result))
    }

    fn cast(&self, operand: Value, to: TypeId) -> Result<Value, RuntimeError> {
        let core = self.library.core();
        let data = if to == core.integer {
            ValueData::Integer(match &operand.data {
                ValueData::Integer(a) => *a,
                ValueData::Float(a) => *a as i32,
                ValueData::Byte(a) => *a as i32,
                ValueData::Boolean(a) => *a as i32,
                ValueData::Pointer(Pointer::Null) => 0,
                ValueData::Pointer(Pointer::Bytes { offset, .. }) => *offset as i32,
                _ => return Err(RuntimeError::Unsupported("cast to Integer".into())),
            })
        } else if to == core.float {
            ValueData::Float(match &operand.data {
                ValueData::Integer(a) => *a as f32,
                ValueData::Float(a) => *a,
                ValueData::Byte(a) => *a as f32,
                ValueData::Boolean(a) => *a as i32 as f32,
                _ => return Err(RuntimeError::Unsupported("cast to Float".into())),
            })
        } else if to == core.byte {
            ValueData::Byte(match &operand.data {
                ValueData::Integer(a) => *a as u8,
                ValueData::Float(a) => *a as u8,
                ValueData::Byte(a) => *a,
                ValueData::Boolean(a) => *a as u8,
                _ => return Err(RuntimeError::Unsupported("cast to Byte".into())),
            })
        } else if to == core.boolean {
            ValueData::Boolean(match &operand.data {
                ValueData::Integer(a) => *a != 0,
                ValueData::Float(a) => *a != 0.0,
                ValueData::Byte(a) => *a != 0,
                ValueData::Boolean(a) => *a,
                ValueData::Pointer(pointer) => !pointer.is_null(),
                _ => return Err(RuntimeError::Unsupported("cast to Boolean".into())),
            })
        } else if self.mode_of(to) == Some(TypeMode::Pointer) {
            match operand.data {
                // A pointer keeps its referent under the new type.
                ValueData::Pointer(pointer) => ValueData::Pointer(pointer),
                ValueData::Integer(0) => ValueData::Pointer(Pointer::Null),
                ValueData::Integer(_) => {
                    return Err(RuntimeError::Unsupported(
                        "non-zero integer to pointer cast".into(),
                    ))
                }
                _ => return Err(RuntimeError::Unsupported("cast to a pointer type".into())),
            }
        } else {
            return Err(RuntimeError::Unsupported(format!(
                "cast to `{}`",
                self.library.type_name(to)
            )));
        };
        Ok(Value::new(to, data))
    }

    /// Read a symbol's value: frame scopes first, then globals, then
    /// function symbols as first-class values, then lazy global creation.
    fn read_symbol(&mut self, symbol: SymbolId) -> Result<Value, RuntimeError> {
        if let Some(frame) = self.stack.last() {
            if let Some(cell) = frame.lookup(symbol) {
                return Ok(read_cell(&cell));
            }
        }
        if let Some(cell) = self.globals.lookup(symbol) {
            return Ok(read_cell(&cell));
        }

        let record = self.library.symbol(symbol);
        let value_type = record.value_type.ok_or_else(|| {
            RuntimeError::NotAnalyzed(format!("symbol `{}` has no type", record.name))
        })?;
        match record.kind {
            SymbolKind::Function(_) => Ok(Value::new(value_type, ValueData::Function(symbol))),
            SymbolKind::Variable { .. } => {
                // First touch of a global: materialize it with its default.
                let value = self.default_value(value_type);
                let cell = self.globals.bind(symbol, value);
                Ok(read_cell(&cell))
            }
            _ => Err(RuntimeError::Unsupported(format!(
                "`{}` cannot be read as a value",
                record.name
            ))),
        }
    }

    fn default_value(&self, ty: TypeId) -> Value {
        let core = self.library.core();
        let data = if ty == core.integer {
            ValueData::Integer(0)
        } else if ty == core.float {
            ValueData::Float(0.0)
        } else if ty == core.boolean {
            ValueData::Boolean(false)
        } else if ty == core.byte {
            ValueData::Byte(0)
        } else if self.mode_of(ty) == Some(TypeMode::Pointer) {
            ValueData::Pointer(Pointer::Null)
        } else {
            ValueData::Void
        };
        Value::new(ty, data)
    }

    fn return_type_of(&self, node: &FunctionNode) -> Result<TypeId, RuntimeError> {
        let signature = node.signature_type.ok_or_else(|| {
            RuntimeError::NotAnalyzed(format!("function `{}` has no signature", node.name.text))
        })?;
        Ok(self
            .library
            .type_data(signature)
            .and_then(|data| data.return_type)
            .unwrap_or(self.library.core().void))
    }

    fn result_type(&self, expression: &ExpressionNode) -> Result<TypeId, RuntimeError> {
        expression
            .resolved_type
            .ok_or_else(|| RuntimeError::NotAnalyzed("expression has no type".into()))
    }

    fn mode_of(&self, ty: TypeId) -> Option<TypeMode> {
        self.library.type_data(ty).map(|data| data.mode)
    }

    fn boolean(&self, value: bool) -> Value {
        Value::new(self.library.core().boolean, ValueData::Boolean(value))
    }

    fn frame_mut(&mut self) -> Result<&mut ActivationFrame, RuntimeError> {
        self.stack
            .last_mut()
            .ok_or_else(|| RuntimeError::NotAnalyzed("no active call frame".into()))
    }

    fn charge_step(&mut self) -> Result<(), RuntimeError> {
        self.steps += 1;
        if self.steps > self.step_limit {
            Err(RuntimeError::StepLimitExceeded(self.step_limit))
        } else {
            Ok(())
        }
    }
}

fn read_cell(cell: &Cell) -> Value {
    cell.borrow().clone().with_origin(Rc::clone(cell))
}

fn offset_pointer(pointer: &Pointer, delta: i64) -> Result<Pointer, RuntimeError> {
    match pointer {
        Pointer::Null => Err(RuntimeError::InvalidPointerArithmetic(
            "arithmetic on a null pointer".into(),
        )),
        Pointer::Cell(_) => Err(RuntimeError::InvalidPointerArithmetic(
            "arithmetic on a variable pointer".into(),
        )),
        Pointer::Bytes { buffer, offset } => {
            let position = *offset as i64 + delta;
            // One past the end is a valid resting position.
            if position < 0 || position > buffer.len() as i64 {
                return Err(RuntimeError::InvalidPointerArithmetic(
                    "pointer moved outside its buffer".into(),
                ));
            }
            Ok(Pointer::Bytes {
                buffer: Rc::clone(buffer),
                offset: position as usize,
            })
        }
    }
}

fn pointer_difference(a: &Pointer, b: &Pointer) -> Result<i32, RuntimeError> {
    match (a, b) {
        (Pointer::Null, Pointer::Null) => Ok(0),
        (
            Pointer::Bytes { buffer: left, offset: a },
            Pointer::Bytes { buffer: right, offset: b },
        ) if Rc::ptr_eq(left, right) => Ok(*a as i32 - *b as i32),
        _ => Err(RuntimeError::InvalidPointerArithmetic(
            "difference of unrelated pointers".into(),
        )),
    }
}

fn pointers_equal(a: &Pointer, b: &Pointer) -> bool {
    match (a, b) {
        (Pointer::Null, Pointer::Null) => true,
        (
            Pointer::Bytes { buffer: left, offset: a },
            Pointer::Bytes { buffer: right, offset: b },
        ) => Rc::ptr_eq(left, right) && a == b,
        (Pointer::Cell(left), Pointer::Cell(right)) => Rc::ptr_eq(left, right),
        _ => false,
    }
}

fn values_equal(left: &Value, right: &Value) -> Result<bool, RuntimeError> {
    match (&left.data, &right.data) {
        (ValueData::Integer(a), ValueData::Integer(b)) => Ok(a == b),
        (ValueData::Float(a), ValueData::Float(b)) => Ok(a == b),
        (ValueData::Boolean(a), ValueData::Boolean(b)) => Ok(a == b),
        (ValueData::Byte(a), ValueData::Byte(b)) => Ok(a == b),
        (ValueData::Function(a), ValueData::Function(b)) => Ok(a == b),
        (ValueData::Pointer(a), ValueData::Pointer(b)) => Ok(pointers_equal(a, b)),
        (ValueData::Void, ValueData::Void) => Ok(true),
        _ => Err(RuntimeError::Unsupported(
            "equality of unrelated values".into(),
        )),
    }
}

fn order_values(left: &Value, right: &Value) -> Result<std::cmp::Ordering, RuntimeError> {
    match (&left.data, &right.data) {
        (ValueData::Integer(a), ValueData::Integer(b)) => Ok(a.cmp(b)),
        (ValueData::Byte(a), ValueData::Byte(b)) => Ok(a.cmp(b)),
        (ValueData::Float(a), ValueData::Float(b)) => a
            .partial_cmp(b)
            .ok_or_else(|| RuntimeError::Unsupported("ordering on NaN".into())),
        (
            ValueData::Pointer(Pointer::Bytes { buffer: left, offset: a }),
            ValueData::Pointer(Pointer::Bytes { buffer: right, offset: b }),
        ) if Rc::ptr_eq(left, right) => Ok(a.cmp(b)),
        _ => Err(RuntimeError::Unsupported(
            "ordering on unrelated values".into(),
        )),
    }
}
