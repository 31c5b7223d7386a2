use blue::{
    ast::{Expression, Statement},
    interpreter::parser::parse,
};

fn display(source: &str) -> String {
    parse(source, "test").unwrap_or_else(|e| panic!("{source:?} failed to parse: {e:?}"))
                         .to_string()
}

fn single_expression(source: &str) -> Expression {
    let mut program = parse(source, "test").unwrap_or_else(|e| panic!("{source:?} failed to parse: {e:?}"));
    assert_eq!(program.statements.len(), 1, "{source:?}");
    match program.statements.remove(0) {
        Statement::Expression { expression, .. } => expression,
        other => panic!("expected an expression statement, got {other}"),
    }
}

#[test]
fn operator_precedence() {
    assert_eq!(display("1 + 2 * 3"), "(1 + (2 * 3))");
    assert_eq!(display("-2 ** 2"), "((-2) ** 2)");
    assert_eq!(display("2 ** 3 ** 2"), "(2 ** (3 ** 2))");
    assert_eq!(display("a or b and not c"), "(a or (b and (not c)))");
    assert_eq!(display("1 < 2 == true"), "((1 < 2) == true)");
    assert_eq!(display("x in xs and y notin ys"), "((x in xs) and (y notin ys))");
}

#[test]
fn postfix_forms() {
    assert_eq!(display("a.b[0](1, k = 2)"), "((a[\"b\"])[0])(1, k = 2)");
    assert_eq!(display("xs[1..<3]"), "(xs[(1 ..< 3)])");
}

#[test]
fn statements_end_at_line_breaks() {
    let program = parse("val a = 1\n-1\nprint(a)\n[1]", "test").unwrap();
    assert_eq!(program.statements.len(), 4);
    let program = parse("val a = 1 +\n 2", "test").unwrap();
    assert_eq!(program.statements.len(), 1);
}

#[test]
fn braces_in_expression_position() {
    assert!(matches!(single_expression("({})"), Expression::Map { .. }));
    assert!(matches!(single_expression("({a: 1, b: 2})"), Expression::Struct { .. }));
    assert!(matches!(single_expression("({\"a\": 1})"), Expression::Map { .. }));
    assert!(matches!(single_expression("({1, 2})"), Expression::Set { .. }));
    assert!(matches!(single_expression("({x * 2 for x in xs})"), Expression::SetComp { .. }));
    assert!(matches!(single_expression("({k: v for k, v in m})"), Expression::MapComp { .. }));
}

#[test]
fn comprehensions_keep_their_clause() {
    assert_eq!(display("[x * x for x in xs if x > 1]"), "[(x * x) for x in xs if (x > 1)]");
}

#[test]
fn control_flow_forms() {
    assert_eq!(display("if a { 1 } else { 2 }"), "if a { 1 } else { 2 }");
    assert_eq!(display("for k, v in m { continue }"), "for k, v in m { continue }");
    assert_eq!(display("match x { 1, 2 => { \"low\" } _ => { \"high\" } }"),
               "match x { 1, 2 => { \"low\" } _ => { \"high\" } }");
    assert_eq!(display("try { f() } catch (e) { e } finally { g() }"),
               "try { f() } catch (e) { e } finally { g() }");
}

#[test]
fn display_output_reparses_to_the_same_display() {
    let sources = ["fun fib(n) { if n < 2 { return n }; return fib(n - 1) + fib(n - 2) }",
                   "var make = fun(x) { fun() { x } }",
                   "val s = \"a\\tb #{x + 1}\"",
                   "var m = {\"b\": 1, \"a\": 2}; m[\"c\"] = 3; m",
                   "x //= 2; y **= 3; import a.b.c",
                   "val r = r/\\d+/; `echo hi`"];
    for source in sources {
        let once = display(source);
        let twice = display(&once);
        assert_eq!(once, twice, "{source:?}");
    }
}

#[test]
fn errors_are_collected_with_positions() {
    let errors = parse("val = 1\nvar x = )\nval ok = 2", "test").unwrap_err();
    assert!(errors.len() >= 2, "{errors:?}");
    assert_eq!(errors[0].line(), 1);
    assert!(errors.iter().any(|e| e.line() == 2));
    for error in &errors {
        assert!(error.line() >= 1 && error.column() >= 1);
        assert!(error.to_string().starts_with("ParserError: "));
    }
}

#[test]
fn invalid_assignment_targets_are_rejected() {
    assert!(parse("1 = 2", "test").is_err());
    assert!(parse("f() = 2", "test").is_err());
}

#[test]
fn lex_errors_surface_as_parse_errors() {
    let errors = parse("val s = \"open", "test").unwrap_err();
    assert!(errors[0].to_string().contains("LexError"), "{errors:?}");
}

#[test]
fn lone_question_mark_and_ellipsis_do_not_parse() {
    assert!(parse("?", "test").is_err());
    assert!(parse("...", "test").is_err());
}
