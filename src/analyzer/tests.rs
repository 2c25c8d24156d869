use pretty_assertions::assert_eq;

use crate::ast::nodes::{
    BlockNode, ClassNode, ExpressionNode, FunctionNode, GlobalNode, GotoNode, IfNode, LabelNode,
    MemberNode, ReturnNode, ScopeNode, StatementNode, TypeReferenceNode, VariableNode, WhileNode,
};
use crate::ast::tokens::TokenKind;
use crate::errors::errors::SemanticError;
use crate::library::library::Library;

use super::analyze;

fn function(name: &str, return_type: &str, statements: Vec<StatementNode>) -> GlobalNode {
    GlobalNode::Function(FunctionNode::new(
        name,
        Vec::new(),
        Some(TypeReferenceNode::named(return_type)),
        ScopeNode::new(statements),
    ))
}

fn analyzed(mut block: BlockNode) -> (BlockNode, Library) {
    let mut library = Library::new();
    analyze(&mut block, &mut library).unwrap();
    (block, library)
}

#[test]
fn classes_declare_types_and_members() {
    let block = BlockNode::new(vec![GlobalNode::Class(ClassNode::new(
        "Player",
        vec![
            MemberNode::Variable(VariableNode::new("Health", TypeReferenceNode::named("Integer"))),
            MemberNode::Variable(VariableNode::new(
                "Next",
                TypeReferenceNode::pointer_to(TypeReferenceNode::named("Player")),
            )),
        ],
    ))]);

    let (block, library) = analyzed(block);
    let class = library.find_global("Player").unwrap();
    let data = library.type_data(class).unwrap();
    assert_eq!(data.members.len(), 2);
    assert!(data.members_by_name.contains_key("Health"));
    assert!(library.find_global("Player*").is_some());

    // The node was annotated in place.
    match &block.globals[0] {
        GlobalNode::Class(node) => assert_eq!(node.symbol, Some(class)),
        _ => unreachable!(),
    }
}

#[test]
fn duplicate_class_member_is_rejected() {
    let mut block = BlockNode::new(vec![GlobalNode::Class(ClassNode::new(
        "Player",
        vec![
            MemberNode::Variable(VariableNode::new("Health", TypeReferenceNode::named("Integer"))),
            MemberNode::Variable(VariableNode::new("Health", TypeReferenceNode::named("Float"))),
        ],
    ))]);

    let mut library = Library::new();
    assert_eq!(
        analyze(&mut block, &mut library),
        Err(SemanticError::DuplicateName("Health".into()))
    );
}

#[test]
fn duplicate_globals_are_rejected() {
    let mut block = BlockNode::new(vec![
        GlobalNode::Class(ClassNode::new("Thing", vec![])),
        GlobalNode::Class(ClassNode::new("Thing", vec![])),
    ]);
    let mut library = Library::new();
    assert_eq!(
        analyze(&mut block, &mut library),
        Err(SemanticError::DuplicateName("Thing".into()))
    );
}

#[test]
fn undeclared_type_reference_is_rejected() {
    let mut block = BlockNode::new(vec![GlobalNode::Variable(VariableNode::new(
        "x",
        TypeReferenceNode::named("Widget"),
    ))]);
    let mut library = Library::new();
    assert_eq!(
        analyze(&mut block, &mut library),
        Err(SemanticError::SymbolNotFound("Widget".into()))
    );
}

#[test]
fn function_signatures_default_to_void_return() {
    let block = BlockNode::new(vec![GlobalNode::Function(FunctionNode::new(
        "Tick",
        vec![VariableNode::parameter("dt", TypeReferenceNode::named("Float"))],
        None,
        ScopeNode::default(),
    ))]);

    let (block, library) = analyzed(block);
    match &block.globals[0] {
        GlobalNode::Function(node) => {
            let signature = node.signature_type.unwrap();
            assert_eq!(library.type_name(signature), "function(Float) : Void");
        }
        _ => unreachable!(),
    }
}

#[test]
fn integer_arithmetic_is_integer_and_comparison_is_boolean() {
    let sum = ExpressionNode::binary(
        TokenKind::Plus,
        ExpressionNode::integer(1),
        ExpressionNode::integer(2),
    );
    let comparison = ExpressionNode::binary(
        TokenKind::LessThan,
        ExpressionNode::integer(1),
        ExpressionNode::integer(2),
    );
    let block = BlockNode::new(vec![function(
        "Main",
        "Integer",
        vec![
            StatementNode::Expression(sum),
            StatementNode::Expression(comparison),
            StatementNode::Return(ReturnNode {
                value: Some(ExpressionNode::integer(0)),
            }),
        ],
    )]);

    let (block, library) = analyzed(block);
    let core = *library.core();
    match &block.globals[0] {
        GlobalNode::Function(node) => {
            let types: Vec<_> = node.body.statements[..2]
                .iter()
                .map(|statement| match statement {
                    StatementNode::Expression(expression) => expression.resolved_type.unwrap(),
                    _ => unreachable!(),
                })
                .collect();
            assert_eq!(types, vec![core.integer, core.boolean]);
        }
        _ => unreachable!(),
    }
}

#[test]
fn mixed_arithmetic_is_rejected() {
    let mut block = BlockNode::new(vec![function(
        "Main",
        "Void",
        vec![StatementNode::Expression(ExpressionNode::binary(
            TokenKind::Plus,
            ExpressionNode::integer(1),
            ExpressionNode::boolean(true),
        ))],
    )]);
    let mut library = Library::new();
    assert!(matches!(
        analyze(&mut block, &mut library),
        Err(SemanticError::InvalidBinaryOperator { .. })
    ));
}

#[test]
fn return_type_must_match_exactly() {
    let mut block = BlockNode::new(vec![function(
        "Main",
        "Integer",
        vec![StatementNode::Return(ReturnNode {
            value: Some(ExpressionNode::boolean(true)),
        })],
    )]);
    let mut library = Library::new();
    assert_eq!(
        analyze(&mut block, &mut library),
        Err(SemanticError::TypeMismatch {
            expected: "Integer".into(),
            found: "Boolean".into(),
        })
    );
}

#[test]
fn goto_resolves_within_the_function_only() {
    let block = BlockNode::new(vec![function(
        "Main",
        "Void",
        vec![
            StatementNode::Label(LabelNode::new("again")),
            StatementNode::Goto(GotoNode::new("again")),
        ],
    )]);
    analyzed(block);

    // The same label in a different function is out of reach.
    let mut block = BlockNode::new(vec![
        function("Other", "Void", vec![StatementNode::Label(LabelNode::new("again"))]),
        function("Main", "Void", vec![StatementNode::Goto(GotoNode::new("again"))]),
    ]);
    let mut library = Library::new();
    assert_eq!(
        analyze(&mut block, &mut library),
        Err(SemanticError::LabelNotFound("again".into()))
    );
}

#[test]
fn break_outside_a_loop_is_rejected() {
    let mut block = BlockNode::new(vec![function("Main", "Void", vec![StatementNode::Break])]);
    let mut library = Library::new();
    assert_eq!(
        analyze(&mut block, &mut library),
        Err(SemanticError::BreakContinueOutsideLoop("break".into()))
    );
}

#[test]
fn break_after_an_inner_loop_is_still_inside_the_outer_loop() {
    let inner = StatementNode::While(WhileNode {
        condition: ExpressionNode::boolean(false),
        scope: ScopeNode::default(),
    });
    let outer = StatementNode::While(WhileNode {
        condition: ExpressionNode::boolean(true),
        scope: ScopeNode::new(vec![inner, StatementNode::Break]),
    });
    analyzed(BlockNode::new(vec![function("Main", "Void", vec![outer])]));
}

#[test]
fn conditions_must_be_boolean_or_pointer() {
    let mut block = BlockNode::new(vec![function(
        "Main",
        "Void",
        vec![StatementNode::If(IfNode {
            condition: Some(ExpressionNode::integer(1)),
            scope: ScopeNode::default(),
            else_node: None,
        })],
    )]);
    let mut library = Library::new();
    assert_eq!(
        analyze(&mut block, &mut library),
        Err(SemanticError::ConditionExpectedBooleanOrPointer("Integer".into()))
    );
}

#[test]
fn pointer_to_pointer_casts_are_always_accepted() {
    let null_to_byte = ExpressionNode::cast(
        ExpressionNode::literal(crate::ast::tokens::Token::of(TokenKind::Null)),
        TypeReferenceNode::pointer_to(TypeReferenceNode::named("Byte")),
    );
    let block = BlockNode::new(vec![function(
        "Main",
        "Void",
        vec![StatementNode::Expression(null_to_byte)],
    )]);

    let (block, library) = analyzed(block);
    match &block.globals[0] {
        GlobalNode::Function(node) => match &node.body.statements[0] {
            StatementNode::Expression(expression) => {
                assert_eq!(expression.resolved_type, Some(library.core().byte_pointer));
            }
            _ => unreachable!(),
        },
        _ => unreachable!(),
    }
}

#[test]
fn cast_between_unrelated_classes_is_rejected() {
    let mut block = BlockNode::new(vec![
        GlobalNode::Class(ClassNode::new("Thing", vec![])),
        function(
            "Main",
            "Void",
            vec![StatementNode::Expression(ExpressionNode::cast(
                ExpressionNode::integer(1),
                TypeReferenceNode::named("Thing"),
            ))],
        ),
    ]);
    let mut library = Library::new();
    assert!(matches!(
        analyze(&mut block, &mut library),
        Err(SemanticError::InvalidCast { .. })
    ));
}

#[test]
fn calls_check_arity_and_argument_types() {
    let callee = || {
        GlobalNode::Function(FunctionNode::new(
            "Square",
            vec![VariableNode::parameter("x", TypeReferenceNode::named("Integer"))],
            Some(TypeReferenceNode::named("Integer")),
            ScopeNode::new(vec![StatementNode::Return(ReturnNode {
                value: Some(ExpressionNode::binary(
                    TokenKind::Asterisk,
                    ExpressionNode::name("x"),
                    ExpressionNode::name("x"),
                )),
            })]),
        ))
    };

    let mut block = BlockNode::new(vec![
        callee(),
        function(
            "Main",
            "Void",
            vec![StatementNode::Expression(ExpressionNode::call(
                ExpressionNode::name("Square"),
                vec![],
            ))],
        ),
    ]);
    let mut library = Library::new();
    assert!(matches!(
        analyze(&mut block, &mut library),
        Err(SemanticError::InvalidCall(_))
    ));

    let mut block = BlockNode::new(vec![
        callee(),
        function(
            "Main",
            "Void",
            vec![StatementNode::Expression(ExpressionNode::call(
                ExpressionNode::name("Square"),
                vec![ExpressionNode::boolean(true)],
            ))],
        ),
    ]);
    let mut library = Library::new();
    assert!(matches!(
        analyze(&mut block, &mut library),
        Err(SemanticError::InvalidCall(_))
    ));
}

#[test]
fn byte_arithmetic_and_negation_are_byte_typed() {
    let character = |text: &str| {
        ExpressionNode::literal(crate::ast::tokens::Token::new(
            TokenKind::CharacterLiteral,
            text,
        ))
    };
    let sum = ExpressionNode::binary(TokenKind::Plus, character("'a'"), character("'b'"));
    let negated = ExpressionNode::unary(TokenKind::Minus, character("'a'"));
    let block = BlockNode::new(vec![function(
        "Main",
        "Void",
        vec![StatementNode::Expression(sum), StatementNode::Expression(negated)],
    )]);

    let (block, library) = analyzed(block);
    let byte = library.core().byte;
    match &block.globals[0] {
        GlobalNode::Function(node) => {
            for statement in &node.body.statements {
                match statement {
                    StatementNode::Expression(expression) => {
                        assert_eq!(expression.resolved_type, Some(byte));
                    }
                    _ => unreachable!(),
                }
            }
        }
        _ => unreachable!(),
    }
}

#[test]
fn member_access_requires_the_right_operator() {
    let class = GlobalNode::Class(ClassNode::new(
        "Player",
        vec![MemberNode::Variable(VariableNode::new(
            "Health",
            TypeReferenceNode::named("Integer"),
        ))],
    ));
    let member_through_value = function(
        "Main",
        "Void",
        vec![
            StatementNode::Variable(VariableNode::new("p", TypeReferenceNode::named("Player"))),
            StatementNode::Expression(ExpressionNode::member(
                ExpressionNode::name("p"),
                TokenKind::Dot,
                "Health",
            )),
        ],
    );
    analyzed(BlockNode::new(vec![class, member_through_value]));

    // Arrow on a non-pointer is invalid.
    let class = GlobalNode::Class(ClassNode::new(
        "Player",
        vec![MemberNode::Variable(VariableNode::new(
            "Health",
            TypeReferenceNode::named("Integer"),
        ))],
    ));
    let mut block = BlockNode::new(vec![
        class,
        function(
            "Main",
            "Void",
            vec![
                StatementNode::Variable(VariableNode::new("p", TypeReferenceNode::named("Player"))),
                StatementNode::Expression(ExpressionNode::member(
                    ExpressionNode::name("p"),
                    TokenKind::Arrow,
                    "Health",
                )),
            ],
        ),
    ]);
    let mut library = Library::new();
    assert!(matches!(
        analyze(&mut block, &mut library),
        Err(SemanticError::InvalidMemberAccess { .. })
    ));
}

#[test]
fn indexing_requires_a_pointer() {
    let mut block = BlockNode::new(vec![function(
        "Main",
        "Void",
        vec![StatementNode::Expression(ExpressionNode::index(
            ExpressionNode::integer(3),
            ExpressionNode::integer(0),
        ))],
    )]);
    let mut library = Library::new();
    assert_eq!(
        analyze(&mut block, &mut library),
        Err(SemanticError::InvalidIndexer("Integer".into()))
    );
}

#[test]
fn address_of_yields_a_pointer_and_deref_undoes_it() {
    let deref_of_address = ExpressionNode::unary(
        TokenKind::Asterisk,
        ExpressionNode::unary(TokenKind::Ampersand, ExpressionNode::name("x")),
    );
    let block = BlockNode::new(vec![function(
        "Main",
        "Void",
        vec![
            StatementNode::Variable(VariableNode::new("x", TypeReferenceNode::named("Integer"))),
            StatementNode::Expression(deref_of_address),
        ],
    )]);

    let (block, library) = analyzed(block);
    match &block.globals[0] {
        GlobalNode::Function(node) => match &node.body.statements[1] {
            StatementNode::Expression(expression) => {
                assert_eq!(expression.resolved_type, Some(library.core().integer));
            }
            _ => unreachable!(),
        },
        _ => unreachable!(),
    }
}

#[test]
fn assignment_to_a_function_typed_name_is_rejected() {
    let mut block = BlockNode::new(vec![
        function("Helper", "Void", vec![]),
        function(
            "Main",
            "Void",
            vec![StatementNode::Expression(ExpressionNode::binary(
                TokenKind::Assignment,
                ExpressionNode::name("Helper"),
                ExpressionNode::name("Helper"),
            ))],
        ),
    ]);
    let mut library = Library::new();
    assert!(matches!(
        analyze(&mut block, &mut library),
        Err(SemanticError::InvalidBinaryOperator { .. })
    ));
}
