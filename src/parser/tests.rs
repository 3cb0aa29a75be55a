//! Parser tests.

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::config::Config;
    use crate::error::{CompileError, ParserError};
    use crate::lexer::Scanner;
    use crate::parser::Parser;
    use crate::types::{ScopeLevel, Type};

    fn parse(source: &str) -> Result<Program, Vec<CompileError>> {
        let tokens = Scanner::new(source).scan_tokens().unwrap();
        Parser::new(tokens, &Config::default()).parse()
    }

    fn parse_ok(source: &str) -> Program {
        match parse(source) {
            Ok(program) => program,
            Err(errors) => panic!("unexpected errors: {:?}", errors),
        }
    }

    fn messages(source: &str) -> Vec<String> {
        parse(source)
            .unwrap_err()
            .iter()
            .map(|e| e.to_string())
            .collect()
    }

    /// Parse `expr` as the right-hand side of an assignment to an Integer.
    fn parse_expr(expr: &str) -> Expr {
        let source = format!(
            "var x : Integer; var b : Boolean; begin x := {}; end.",
            expr
        );
        let program = parse_ok(&source);
        match program.statements.into_iter().next().unwrap().kind {
            StmtKind::Assignment { expr, .. } => expr,
            other => panic!("Expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_program() {
        let program = parse_ok("begin end.");
        assert!(program.statements.is_empty());
        assert!(program.initial_decls.is_empty());
        assert!(program.subprograms.is_empty());
    }

    #[test]
    fn test_const_and_var_decls() {
        let program = parse_ok("const N := 3; var x, y : Integer; var c : Char; begin end.");
        assert_eq!(program.initial_decls.len(), 4);

        let n = program.decl(program.initial_decls[0]);
        assert_eq!(n.name, "N");
        assert_eq!(
            n.kind,
            DeclKind::Const {
                literal: Literal::Integer("3".to_string())
            }
        );
        assert_eq!(n.ty, Type::Integer);

        let y = program.decl(program.initial_decls[2]);
        assert_eq!(y.name, "y");
        assert_eq!(y.ty, Type::Integer);
        assert_eq!(y.scope_level, ScopeLevel::Program);
        assert_eq!(program.decl(program.initial_decls[3]).ty, Type::Char);
    }

    #[test]
    fn test_array_type_decl() {
        let program = parse_ok("const N := 5; type A = array[N] of Char; var a : A; begin end.");
        let a = program.decl(program.initial_decls[2]);
        assert!(a.ty.is_array());
        assert_eq!(a.ty.name(), "A");
        assert_eq!(a.ty.size(), 10);
        assert_eq!(a.ty.element_type(), Some(&Type::Char));
    }

    #[test]
    fn test_precedence() {
        // 1 + 2 * 3 should parse as 1 + (2 * 3)
        let expr = parse_expr("1 + 2 * 3");
        match expr.kind {
            ExprKind::Binary {
                operator: BinaryOp::Add,
                right,
                ..
            } => match right.kind {
                ExprKind::Binary {
                    operator: BinaryOp::Multiply,
                    ..
                } => {}
                _ => panic!("Expected multiply on right"),
            },
            _ => panic!("Expected add at top"),
        }
    }

    #[test]
    fn test_unary_sign_applies_to_first_term() {
        // -2 * 3 - 1 should parse as ((-(2 * 3)) - 1)
        let expr = parse_expr("-2 * 3 - 1");
        match expr.kind {
            ExprKind::Binary {
                operator: BinaryOp::Subtract,
                left,
                ..
            } => match left.kind {
                ExprKind::Unary {
                    operator: UnaryOp::Negate,
                    operand,
                } => assert!(matches!(
                    operand.kind,
                    ExprKind::Binary {
                        operator: BinaryOp::Multiply,
                        ..
                    }
                )),
                other => panic!("Expected negation, got {:?}", other),
            },
            other => panic!("Expected subtraction, got {:?}", other),
        }
    }

    #[test]
    fn test_named_constant_becomes_literal() {
        let source = "const N := 7; var x : Integer; begin x := N; end.";
        let program = parse_ok(source);
        match &program.statements[0].kind {
            StmtKind::Assignment { expr, .. } => {
                assert_eq!(
                    expr.kind,
                    ExprKind::ConstValue {
                        literal: Literal::Integer("7".to_string()),
                        decl: Some(program.initial_decls[0]),
                    }
                );
            }
            other => panic!("Expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_not_equal_spellings() {
        for op in ["!=", "<>"] {
            let expr = parse_expr(&format!("b {} true", op));
            assert!(matches!(
                expr.kind,
                ExprKind::Binary {
                    operator: BinaryOp::NotEqual,
                    ..
                }
            ));
        }
    }

    #[test]
    fn test_logical_operators_left_associative() {
        let expr = parse_expr("b and b or b");
        match expr.kind {
            ExprKind::Binary {
                operator: BinaryOp::Or,
                left,
                ..
            } => assert!(matches!(
                left.kind,
                ExprKind::Binary {
                    operator: BinaryOp::And,
                    ..
                }
            )),
            other => panic!("Expected or, got {:?}", other),
        }
    }

    #[test]
    fn test_indexed_variable() {
        let source = "type A = array[3] of Integer; var a : A; begin a[1] := 2; end.";
        let program = parse_ok(source);
        match &program.statements[0].kind {
            StmtKind::Assignment { variable, .. } => {
                assert_eq!(variable.index_exprs.len(), 1);
                assert_eq!(program.decl(variable.decl).name, "a");
            }
            other => panic!("Expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_control_flow_statements() {
        let source = r#"
            var x : Integer;
            begin
                if x = 0 then
                    write 1;
                elsif x = 1 then
                    write 2;
                else
                    writeln;
                end if;
                while x < 10 loop
                    x := x + 1;
                    exit when x = 5;
                end loop;
                loop
                    exit;
                end loop;
                read x;
                writeln "x = ", x;
            end.
        "#;
        let program = parse_ok(source);
        assert_eq!(program.statements.len(), 5);

        match &program.statements[0].kind {
            StmtKind::If {
                elsif_parts,
                else_stmts,
                ..
            } => {
                assert_eq!(elsif_parts.len(), 1);
                assert_eq!(else_stmts.len(), 1);
            }
            other => panic!("Expected if, got {:?}", other),
        }
        match &program.statements[1].kind {
            StmtKind::Loop { while_expr, body } => {
                assert!(while_expr.is_some());
                assert_eq!(body.len(), 2);
            }
            other => panic!("Expected loop, got {:?}", other),
        }
        match &program.statements[4].kind {
            StmtKind::Writeln(exprs) => assert_eq!(exprs.len(), 2),
            other => panic!("Expected writeln, got {:?}", other),
        }
    }

    #[test]
    fn test_subprograms() {
        let source = r#"
            var total : Integer;

            procedure add(var t : Integer, n : Integer) is
            begin
                t := t + n;
            end add;

            function twice(n : Integer) return Integer is
                var r : Integer;
            begin
                r := n * 2;
                return r;
            end twice;

            begin
                add(total, twice(3));
            end.
        "#;
        let program = parse_ok(source);
        assert_eq!(program.subprograms.len(), 2);

        let add = &program.subprograms[0];
        assert_eq!(add.kind, SubprogramKind::Procedure);
        assert_eq!(add.params.len(), 2);
        assert!(program.decl(add.params[0]).is_var_param());
        assert!(!program.decl(add.params[1]).is_var_param());
        assert_eq!(
            program.decl(add.params[1]).scope_level,
            ScopeLevel::Subprogram
        );

        let twice = &program.subprograms[1];
        assert!(twice.is_function());
        assert_eq!(program.decl(twice.decl).ty, Type::Integer);
        assert_eq!(twice.initial_decls.len(), 1);
        match &twice.statements[1].kind {
            StmtKind::Return { subprogram, expr } => {
                assert_eq!(*subprogram, Some(SubprogramId(1)));
                assert!(expr.is_some());
            }
            other => panic!("Expected return, got {:?}", other),
        }

        match &program.statements[0].kind {
            StmtKind::ProcedureCall {
                subprogram, args, ..
            } => {
                assert_eq!(*subprogram, SubprogramId(0));
                assert!(matches!(args[1].kind, ExprKind::FunctionCall { .. }));
                assert_eq!(args[1].ty, Type::Integer);
            }
            other => panic!("Expected procedure call, got {:?}", other),
        }
    }

    #[test]
    fn test_local_shadows_global() {
        let source = r#"
            var x : Integer;
            procedure p is
                var x : Char;
            begin
                x := 'a';
            end p;
            begin
                x := 1;
            end.
        "#;
        let program = parse_ok(source);
        let global = program.initial_decls[0];

        let local = match &program.subprograms[0].statements[0].kind {
            StmtKind::Assignment { variable, .. } => variable.decl,
            other => panic!("Expected assignment, got {:?}", other),
        };
        let main = match &program.statements[0].kind {
            StmtKind::Assignment { variable, .. } => variable.decl,
            other => panic!("Expected assignment, got {:?}", other),
        };

        assert_ne!(local, global);
        assert_eq!(main, global);
        assert_eq!(program.decl(local).ty, Type::Char);
        assert_eq!(program.decl(global).ty, Type::Integer);
    }

    #[test]
    fn test_recursive_function_resolves_itself() {
        let source = r#"
            function fact(n : Integer) return Integer is
            begin
                if n <= 1 then return 1; end if;
                return n * fact(n - 1);
            end fact;
            begin
                write fact(5);
            end.
        "#;
        let program = parse_ok(source);
        assert_eq!(program.subprograms.len(), 1);
    }

    #[test]
    fn test_undeclared_identifier() {
        let errors = messages("begin y := 1; end.");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Identifier \"y\" has not been declared"));
    }

    #[test]
    fn test_duplicate_identifier() {
        let errors = messages("var x : Integer; var x : Char; begin end.");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("already defined in the current scope"));
    }

    #[test]
    fn test_expected_token_message() {
        let errors = parse("var x : Integer; begin x = 1; end.").unwrap_err();
        match &errors[0] {
            CompileError::Parser(ParserError::UnexpectedToken {
                expected, found, ..
            }) => {
                assert_eq!(expected, ":=");
                assert_eq!(found, "=");
            }
            other => panic!("Expected unexpected token error, got {:?}", other),
        }
    }

    #[test]
    fn test_exit_outside_loop() {
        let errors = messages("begin exit; end.");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Exit statement is not nested within a loop."));
    }

    #[test]
    fn test_mismatched_subprogram_name() {
        let errors = messages("procedure p is begin end q; begin end.");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Procedure name mismatch."));
    }

    #[test]
    fn test_not_a_type_name() {
        let errors = messages("const N := 1; var x : N; begin end.");
        assert!(errors[0].contains("is not a valid type name"));
    }

    #[test]
    fn test_recovery_reports_multiple_errors() {
        let source = r#"
            var x : Integer;
            begin
                x := ;
                y := 2;
                x := 3;
            end.
        "#;
        let errors = messages(source);
        assert_eq!(errors.len(), 2);
        assert!(errors[1].contains("\"y\""));
    }

    #[test]
    fn test_error_limit_stops_parsing() {
        let mut source = String::from("begin\n");
        for _ in 0..40 {
            source.push_str("    undefined := 1;\n");
        }
        source.push_str("end.");

        let tokens = Scanner::new(&source).scan_tokens().unwrap();
        let config = Config {
            max_errors: 5,
            ..Config::default()
        };
        let errors = Parser::new(tokens, &config).parse().unwrap_err();
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn test_trailing_tokens_after_program() {
        let errors = messages("begin end. x");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("End-of-File"));
    }
}
