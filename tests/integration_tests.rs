//! End-to-end scenarios: build a tree, analyze it, and execute it.

use interpreter::analyzer::analyze;
use interpreter::ast::nodes::{
    BlockNode, ClassNode, ExpressionNode, FunctionNode, GlobalNode, IfNode, MemberNode, ReturnNode,
    ScopeNode, StatementNode, TypeReferenceNode, VariableNode, WhileNode,
};
use interpreter::ast::tokens::{Token, TokenKind};
use interpreter::errors::errors::{RuntimeError, SemanticError};
use interpreter::interpreter::{corelib, Bindings, Interpreter};
use interpreter::library::library::Library;

fn run_program(globals: Vec<GlobalNode>) -> Result<(i32, String), RuntimeError> {
    let mut library = Library::new();
    let mut bindings = Bindings::default();
    corelib::install(&mut library, &mut bindings).unwrap();

    let mut block = BlockNode::new(globals);
    analyze(&mut block, &mut library).unwrap();

    let mut out = Vec::new();
    let value = Interpreter::new(&mut block, &library, bindings, &mut out)?.run_entry("Main")?;
    Ok((
        value.as_integer().unwrap(),
        String::from_utf8(out).unwrap(),
    ))
}

fn integer_type() -> TypeReferenceNode {
    TypeReferenceNode::named("Integer")
}

fn main_returning(statements: Vec<StatementNode>) -> GlobalNode {
    GlobalNode::Function(FunctionNode::new(
        "Main",
        Vec::new(),
        Some(integer_type()),
        ScopeNode::new(statements),
    ))
}

fn declare(name: &str, reference: TypeReferenceNode, value: ExpressionNode) -> StatementNode {
    StatementNode::Variable(VariableNode::new(name, reference).with_initializer(value))
}

fn assign(name: &str, value: ExpressionNode) -> StatementNode {
    StatementNode::Expression(ExpressionNode::binary(
        TokenKind::Assignment,
        ExpressionNode::name(name),
        value,
    ))
}

fn return_value(value: ExpressionNode) -> StatementNode {
    StatementNode::Return(ReturnNode { value: Some(value) })
}

fn print_string(text: &str) -> StatementNode {
    StatementNode::Expression(ExpressionNode::call(
        ExpressionNode::name("PrintString"),
        vec![ExpressionNode::literal(Token::new(
            TokenKind::StringLiteral,
            format!("\"{text}\""),
        ))],
    ))
}

#[test]
fn duplicate_class_members_are_rejected() {
    let mut block = BlockNode::new(vec![GlobalNode::Class(ClassNode::new(
        "Player",
        vec![
            MemberNode::Variable(VariableNode::new("Health", integer_type())),
            MemberNode::Variable(VariableNode::new("Health", integer_type())),
        ],
    ))]);
    let mut library = Library::new();
    assert_eq!(
        analyze(&mut block, &mut library),
        Err(SemanticError::DuplicateName("Health".into()))
    );
}

#[test]
fn a_constant_return_makes_it_back_to_the_host() {
    let (value, output) =
        run_program(vec![main_returning(vec![return_value(ExpressionNode::integer(5))])]).unwrap();
    assert_eq!(value, 5);
    assert_eq!(output, "");
}

#[test]
fn iterative_fibonacci_of_23() {
    // function Fib(n: Integer): Integer {
    //     var a = 0; var b = 1; var i = 0;
    //     while (i < n) { var t = a + b; a = b; b = t; i = i + 1; }
    //     return a;
    // }
    let body = vec![
        declare("a", integer_type(), ExpressionNode::integer(0)),
        declare("b", integer_type(), ExpressionNode::integer(1)),
        declare("i", integer_type(), ExpressionNode::integer(0)),
        StatementNode::While(WhileNode {
            condition: ExpressionNode::binary(
                TokenKind::LessThan,
                ExpressionNode::name("i"),
                ExpressionNode::name("n"),
            ),
            scope: ScopeNode::new(vec![
                declare(
                    "t",
                    integer_type(),
                    ExpressionNode::binary(
                        TokenKind::Plus,
                        ExpressionNode::name("a"),
                        ExpressionNode::name("b"),
                    ),
                ),
                assign("a", ExpressionNode::name("b")),
                assign("b", ExpressionNode::name("t")),
                assign(
                    "i",
                    ExpressionNode::binary(
                        TokenKind::Plus,
                        ExpressionNode::name("i"),
                        ExpressionNode::integer(1),
                    ),
                ),
            ]),
        }),
        return_value(ExpressionNode::name("a")),
    ];
    let fib = GlobalNode::Function(FunctionNode::new(
        "Fib",
        vec![VariableNode::parameter("n", integer_type())],
        Some(integer_type()),
        ScopeNode::new(body),
    ));
    let main = main_returning(vec![return_value(ExpressionNode::call(
        ExpressionNode::name("Fib"),
        vec![ExpressionNode::integer(23)],
    ))]);

    let (value, _) = run_program(vec![fib, main]).unwrap();
    assert_eq!(value, 28657);
}

#[test]
fn loop_counter_assignments_accumulate() {
    // var total = 0; var i = 1;
    // while (i <= 5) { total = total + i; i = i + 1; }
    // return total;
    let statements = vec![
        declare("total", integer_type(), ExpressionNode::integer(0)),
        declare("i", integer_type(), ExpressionNode::integer(1)),
        StatementNode::While(WhileNode {
            condition: ExpressionNode::binary(
                TokenKind::LessThanOrEqualTo,
                ExpressionNode::name("i"),
                ExpressionNode::integer(5),
            ),
            scope: ScopeNode::new(vec![
                assign(
                    "total",
                    ExpressionNode::binary(
                        TokenKind::Plus,
                        ExpressionNode::name("total"),
                        ExpressionNode::name("i"),
                    ),
                ),
                assign(
                    "i",
                    ExpressionNode::binary(
                        TokenKind::Plus,
                        ExpressionNode::name("i"),
                        ExpressionNode::integer(1),
                    ),
                ),
            ]),
        }),
        return_value(ExpressionNode::name("total")),
    ];
    let (value, _) = run_program(vec![main_returning(statements)]).unwrap();
    assert_eq!(value, 15);
}

#[test]
fn short_circuit_guards_a_null_dereference() {
    // var p: Integer*;
    // if (p != null && *p == 0) { PrintString("set"); } else { PrintString("unset"); }
    let null = ExpressionNode::literal(Token::of(TokenKind::Null));
    let guard = ExpressionNode::binary(
        TokenKind::LogicalAnd,
        ExpressionNode::binary(TokenKind::Inequality, ExpressionNode::name("p"), null),
        ExpressionNode::binary(
            TokenKind::Equality,
            ExpressionNode::unary(TokenKind::Asterisk, ExpressionNode::name("p")),
            ExpressionNode::integer(0),
        ),
    );
    let statements = vec![
        StatementNode::Variable(VariableNode::new(
            "p",
            TypeReferenceNode::pointer_to(integer_type()),
        )),
        StatementNode::If(IfNode {
            condition: Some(guard),
            scope: ScopeNode::new(vec![print_string("set")]),
            else_node: Some(Box::new(IfNode {
                condition: None,
                scope: ScopeNode::new(vec![print_string("unset")]),
                else_node: None,
            })),
        }),
        return_value(ExpressionNode::integer(0)),
    ];

    let (value, output) = run_program(vec![main_returning(statements)]).unwrap();
    assert_eq!(value, 0);
    assert_eq!(output, "unset\n");
}

#[test]
fn printing_mixes_strings_and_integers() {
    let statements = vec![
        print_string("answer:"),
        StatementNode::Expression(ExpressionNode::call(
            ExpressionNode::name("PrintInteger"),
            vec![ExpressionNode::integer(42)],
        )),
        return_value(ExpressionNode::integer(0)),
    ];
    let (_, output) = run_program(vec![main_returning(statements)]).unwrap();
    assert_eq!(output, "answer:\n42\n");
}

#[test]
fn missing_entry_point_is_reported() {
    let mut library = Library::new();
    let mut block = BlockNode::new(vec![main_returning(vec![return_value(
        ExpressionNode::integer(0),
    )])]);
    analyze(&mut block, &mut library).unwrap();

    let mut out = Vec::new();
    let result = Interpreter::new(&mut block, &library, Bindings::default(), &mut out)
        .and_then(|mut interpreter| interpreter.run_entry("Start"));
    assert!(matches!(result, Err(RuntimeError::InvalidEntryPoint(_))));
}
