//! Token definitions shared with the external scanner.
//!
//! The scanner and parser live outside this crate; the syntax tree they hand
//! over still carries the lexeme for every leaf, so the closed set of token
//! kinds must match the scanner's exactly.

/// The closed enumeration of lexeme kinds produced by the scanner.
///
/// Several kinds (`Whitespace`, the comment kinds, `Invalid`) never appear in
/// a well-formed tree but are kept so the numbering stays in sync with the
/// scanner's table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Invalid,
    Whitespace,
    SingleLineComment,
    MultiLineComment,
    Identifier,

    // Literals
    IntegerLiteral,
    FloatLiteral,
    StringLiteral,
    CharacterLiteral,
    True,
    False,
    Null,

    // Keywords
    Class,
    Var,
    Function,
    If,
    Else,
    While,
    For,
    Break,
    Continue,
    Return,
    Label,
    Goto,
    As,
    Enum,

    // Operators
    Plus,
    Minus,
    Asterisk,
    Divide,
    Modulo,
    Assignment,
    AssignmentPlus,
    AssignmentMinus,
    AssignmentMultiply,
    AssignmentDivide,
    AssignmentModulo,
    Equality,
    Inequality,
    LessThan,
    LessThanOrEqualTo,
    GreaterThan,
    GreaterThanOrEqualTo,
    LogicalAnd,
    LogicalOr,
    LogicalNot,
    Not,
    Increment,
    Decrement,
    Ampersand,
    Dot,
    Arrow,

    // Structure
    OpenParentheses,
    CloseParentheses,
    OpenCurley,
    CloseCurley,
    OpenBracket,
    CloseBracket,
    Comma,
    Colon,
    Semicolon,
}

impl TokenKind {
    /// The fixed spelling of this kind, for kinds that have one.
    /// Identifiers and literals carry their spelling in the token text.
    pub fn lexeme(self) -> Option<&'static str> {
        let text = match self {
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Null => "null",
            TokenKind::Class => "class",
            TokenKind::Var => "var",
            TokenKind::Function => "function",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::While => "while",
            TokenKind::For => "for",
            TokenKind::Break => "break",
            TokenKind::Continue => "continue",
            TokenKind::Return => "return",
            TokenKind::Label => "label",
            TokenKind::Goto => "goto",
            TokenKind::As => "as",
            TokenKind::Enum => "enum",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Asterisk => "*",
            TokenKind::Divide => "/",
            TokenKind::Modulo => "%",
            TokenKind::Assignment => "=",
            TokenKind::AssignmentPlus => "+=",
            TokenKind::AssignmentMinus => "-=",
            TokenKind::AssignmentMultiply => "*=",
            TokenKind::AssignmentDivide => "/=",
            TokenKind::AssignmentModulo => "%=",
            TokenKind::Equality => "==",
            TokenKind::Inequality => "!=",
            TokenKind::LessThan => "<",
            TokenKind::LessThanOrEqualTo => "<=",
            TokenKind::GreaterThan => ">",
            TokenKind::GreaterThanOrEqualTo => ">=",
            TokenKind::LogicalAnd => "&&",
            TokenKind::LogicalOr => "||",
            TokenKind::LogicalNot => "!",
            TokenKind::Not => "~",
            TokenKind::Increment => "++",
            TokenKind::Decrement => "--",
            TokenKind::Ampersand => "&",
            TokenKind::Dot => ".",
            TokenKind::Arrow => "->",
            TokenKind::OpenParentheses => "(",
            TokenKind::CloseParentheses => ")",
            TokenKind::OpenCurley => "{",
            TokenKind::CloseCurley => "}",
            TokenKind::OpenBracket => "[",
            TokenKind::CloseBracket => "]",
            TokenKind::Comma => ",",
            TokenKind::Colon => ":",
            TokenKind::Semicolon => ";",
            _ => return None,
        };
        Some(text)
    }
}

/// A single lexeme: the kind tag plus the text it was scanned from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Token {
            kind,
            text: text.into(),
        }
    }

    /// A token whose text is the kind's fixed spelling.
    pub fn of(kind: TokenKind) -> Self {
        Token {
            kind,
            text: kind.lexeme().unwrap_or_default().to_string(),
        }
    }

    pub fn identifier(text: impl Into<String>) -> Self {
        Token::new(TokenKind::Identifier, text)
    }
}
