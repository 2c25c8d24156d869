//! Syntax tree node definitions.
//!
//! The tree is handed to us fully built by the external parser. Every node
//! kind is a variant of a closed enum rather than a trait object, so the
//! analyzer and the evaluation engine can match on node kinds directly.
//!
//! Nodes carry annotation slots (`symbol`, `resolved_type`, ...) that start
//! out empty and are filled in by the semantic analyzer and the interpreter
//! pre-pass. The constructors here exist so callers (and tests) can build
//! trees without a parser.

use crate::interpreter::value::Value;
use crate::library::library::{SymbolId, TypeId};

use super::tokens::{Token, TokenKind};

/// The root of a program: an ordered list of top-level declarations.
#[derive(Debug, Clone, Default)]
pub struct BlockNode {
    pub globals: Vec<GlobalNode>,
}

impl BlockNode {
    pub fn new(globals: Vec<GlobalNode>) -> Self {
        BlockNode { globals }
    }
}

#[derive(Debug, Clone)]
pub enum GlobalNode {
    Class(ClassNode),
    Variable(VariableNode),
    Function(FunctionNode),
}

#[derive(Debug, Clone)]
pub struct ClassNode {
    pub name: Token,
    pub members: Vec<MemberNode>,

    /// Filled in by the analyzer: the Class-mode type this node declares.
    pub symbol: Option<TypeId>,
}

impl ClassNode {
    pub fn new(name: impl Into<String>, members: Vec<MemberNode>) -> Self {
        ClassNode {
            name: Token::identifier(name),
            members,
            symbol: None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum MemberNode {
    Variable(VariableNode),
    Function(FunctionNode),
}

/// A variable declaration: global, class member, local, or parameter.
#[derive(Debug, Clone)]
pub struct VariableNode {
    pub name: Token,
    pub is_parameter: bool,
    pub type_reference: TypeReferenceNode,
    pub initial_value: Option<ExpressionNode>,

    /// Filled in by the analyzer.
    pub symbol: Option<SymbolId>,
}

impl VariableNode {
    pub fn new(name: impl Into<String>, type_reference: TypeReferenceNode) -> Self {
        VariableNode {
            name: Token::identifier(name),
            is_parameter: false,
            type_reference,
            initial_value: None,
            symbol: None,
        }
    }

    pub fn parameter(name: impl Into<String>, type_reference: TypeReferenceNode) -> Self {
        VariableNode {
            is_parameter: true,
            ..VariableNode::new(name, type_reference)
        }
    }

    pub fn with_initializer(mut self, value: ExpressionNode) -> Self {
        self.initial_value = Some(value);
        self
    }
}

#[derive(Debug, Clone)]
pub struct FunctionNode {
    pub name: Token,
    pub parameters: Vec<VariableNode>,
    pub return_type: Option<TypeReferenceNode>,
    pub body: ScopeNode,

    /// Filled in by the analyzer: the interned signature type, then the
    /// Function symbol declared by this node.
    pub signature_type: Option<TypeId>,
    pub symbol: Option<SymbolId>,
}

impl FunctionNode {
    pub fn new(
        name: impl Into<String>,
        parameters: Vec<VariableNode>,
        return_type: Option<TypeReferenceNode>,
        body: ScopeNode,
    ) -> Self {
        FunctionNode {
            name: Token::identifier(name),
            parameters,
            return_type,
            body,
            signature_type: None,
            symbol: None,
        }
    }
}

/// A type annotation as written in the source.
#[derive(Debug, Clone)]
pub struct TypeReferenceNode {
    pub kind: TypeReferenceKind,

    /// Filled in by the analyzer: the concrete type this reference names.
    pub symbol: Option<TypeId>,
}

#[derive(Debug, Clone)]
pub enum TypeReferenceKind {
    Named(Token),
    PointerTo(Box<TypeReferenceNode>),
    FunctionSignature {
        parameters: Vec<TypeReferenceNode>,
        return_type: Option<Box<TypeReferenceNode>>,
    },
}

impl TypeReferenceNode {
    pub fn named(name: impl Into<String>) -> Self {
        TypeReferenceNode {
            kind: TypeReferenceKind::Named(Token::identifier(name)),
            symbol: None,
        }
    }

    pub fn pointer_to(pointee: TypeReferenceNode) -> Self {
        TypeReferenceNode {
            kind: TypeReferenceKind::PointerTo(Box::new(pointee)),
            symbol: None,
        }
    }

    pub fn signature(
        parameters: Vec<TypeReferenceNode>,
        return_type: Option<TypeReferenceNode>,
    ) -> Self {
        TypeReferenceNode {
            kind: TypeReferenceKind::FunctionSignature {
                parameters,
                return_type: return_type.map(Box::new),
            },
            symbol: None,
        }
    }
}

/// A braced statement list. Pushes a block scope during analysis and
/// evaluation.
#[derive(Debug, Clone, Default)]
pub struct ScopeNode {
    pub statements: Vec<StatementNode>,
}

impl ScopeNode {
    pub fn new(statements: Vec<StatementNode>) -> Self {
        ScopeNode { statements }
    }
}

#[derive(Debug, Clone)]
pub enum StatementNode {
    Variable(VariableNode),
    Scope(ScopeNode),
    Label(LabelNode),
    Goto(GotoNode),
    Return(ReturnNode),
    Break,
    Continue,
    If(IfNode),
    While(WhileNode),
    For(Box<ForNode>),
    Expression(ExpressionNode),
}

#[derive(Debug, Clone)]
pub struct LabelNode {
    pub name: Token,
    pub symbol: Option<SymbolId>,
}

impl LabelNode {
    pub fn new(name: impl Into<String>) -> Self {
        LabelNode {
            name: Token::identifier(name),
            symbol: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GotoNode {
    pub name: Token,

    /// Filled in by the analyzer: the label within the same function.
    pub resolved_label: Option<SymbolId>,
}

impl GotoNode {
    pub fn new(name: impl Into<String>) -> Self {
        GotoNode {
            name: Token::identifier(name),
            resolved_label: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReturnNode {
    pub value: Option<ExpressionNode>,
}

/// An if statement. The else chain is represented as a nested `IfNode`
/// whose condition is `None` for a plain else.
#[derive(Debug, Clone)]
pub struct IfNode {
    pub condition: Option<ExpressionNode>,
    pub scope: ScopeNode,
    pub else_node: Option<Box<IfNode>>,
}

#[derive(Debug, Clone)]
pub struct WhileNode {
    pub condition: ExpressionNode,
    pub scope: ScopeNode,
}

#[derive(Debug, Clone)]
pub struct ForNode {
    pub initial_variable: Option<VariableNode>,
    pub initial_expression: Option<ExpressionNode>,
    pub condition: Option<ExpressionNode>,
    pub iterator: Option<ExpressionNode>,
    pub scope: ScopeNode,
}

/// The shared envelope for every expression form: the kind payload plus the
/// type computed for it by the analyzer.
#[derive(Debug, Clone)]
pub struct ExpressionNode {
    pub kind: ExpressionKind,
    pub resolved_type: Option<TypeId>,
}

#[derive(Debug, Clone)]
pub enum ExpressionKind {
    Literal(LiteralNode),
    NameReference(NameReferenceNode),
    BinaryOperator(Box<BinaryOperatorNode>),
    UnaryOperator(Box<UnaryOperatorNode>),
    MemberAccess(Box<MemberAccessNode>),
    Call(Box<CallNode>),
    Cast(Box<CastNode>),
    Index(Box<IndexNode>),
}

impl ExpressionNode {
    fn wrap(kind: ExpressionKind) -> Self {
        ExpressionNode {
            kind,
            resolved_type: None,
        }
    }

    pub fn literal(token: Token) -> Self {
        ExpressionNode::wrap(ExpressionKind::Literal(LiteralNode { token, value: None }))
    }

    pub fn integer(value: i32) -> Self {
        ExpressionNode::literal(Token::new(TokenKind::IntegerLiteral, value.to_string()))
    }

    pub fn boolean(value: bool) -> Self {
        let kind = if value { TokenKind::True } else { TokenKind::False };
        ExpressionNode::literal(Token::of(kind))
    }

    pub fn name(name: impl Into<String>) -> Self {
        ExpressionNode::wrap(ExpressionKind::NameReference(NameReferenceNode {
            name: Token::identifier(name),
            symbol: None,
        }))
    }

    pub fn binary(operator: TokenKind, left: ExpressionNode, right: ExpressionNode) -> Self {
        ExpressionNode::wrap(ExpressionKind::BinaryOperator(Box::new(
            BinaryOperatorNode {
                operator: Token::of(operator),
                left,
                right,
            },
        )))
    }

    pub fn unary(operator: TokenKind, operand: ExpressionNode) -> Self {
        ExpressionNode::wrap(ExpressionKind::UnaryOperator(Box::new(UnaryOperatorNode {
            operator: Token::of(operator),
            operand,
        })))
    }

    pub fn member(left: ExpressionNode, operator: TokenKind, name: impl Into<String>) -> Self {
        ExpressionNode::wrap(ExpressionKind::MemberAccess(Box::new(MemberAccessNode {
            operator: Token::of(operator),
            left,
            name: Token::identifier(name),
            resolved_member: None,
        })))
    }

    pub fn call(callee: ExpressionNode, arguments: Vec<ExpressionNode>) -> Self {
        ExpressionNode::wrap(ExpressionKind::Call(Box::new(CallNode {
            callee,
            arguments,
        })))
    }

    pub fn cast(operand: ExpressionNode, type_reference: TypeReferenceNode) -> Self {
        ExpressionNode::wrap(ExpressionKind::Cast(Box::new(CastNode {
            operand,
            type_reference,
        })))
    }

    pub fn index(left: ExpressionNode, index: ExpressionNode) -> Self {
        ExpressionNode::wrap(ExpressionKind::Index(Box::new(IndexNode { left, index })))
    }
}

#[derive(Debug, Clone)]
pub struct LiteralNode {
    pub token: Token,

    /// Pre-parsed runtime value, filled in by the interpreter pre-pass.
    pub value: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct NameReferenceNode {
    pub name: Token,

    /// Filled in by the analyzer.
    pub symbol: Option<SymbolId>,
}

#[derive(Debug, Clone)]
pub struct BinaryOperatorNode {
    pub operator: Token,
    pub left: ExpressionNode,
    pub right: ExpressionNode,
}

#[derive(Debug, Clone)]
pub struct UnaryOperatorNode {
    pub operator: Token,
    pub operand: ExpressionNode,
}

#[derive(Debug, Clone)]
pub struct MemberAccessNode {
    pub left: ExpressionNode,
    pub operator: Token,
    pub name: Token,

    /// Filled in by the analyzer: the member symbol on the left type.
    pub resolved_member: Option<SymbolId>,
}

#[derive(Debug, Clone)]
pub struct CallNode {
    pub callee: ExpressionNode,
    pub arguments: Vec<ExpressionNode>,
}

#[derive(Debug, Clone)]
pub struct CastNode {
    pub operand: ExpressionNode,
    pub type_reference: TypeReferenceNode,
}

#[derive(Debug, Clone)]
pub struct IndexNode {
    pub left: ExpressionNode,
    pub index: ExpressionNode,
}
