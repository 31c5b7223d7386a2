use std::fs;

use blue::{
    error::{Error, ErrorKind},
    get_result,
    interpreter::value::core::Value,
};
use walkdir::WalkDir;

#[test]
fn book_examples_work() {
    let mut count = 0;

    for entry in
        WalkDir::new("book/src").into_iter()
                                .filter_map(Result::ok)
                                .filter(|e| e.path().extension().is_some_and(|ext| ext == "md"))
    {
        let path = entry.path();
        let content =
            fs::read_to_string(path).unwrap_or_else(|e| panic!("Failed to read {path:?}: {e}"));

        for (i, code) in extract_blue_blocks(&content).into_iter().enumerate() {
            count += 1;
            if let Err(e) = get_result(&code) {
                panic!("Example {} in {:?} failed:\n{}\nError: {}", i + 1, path, code, e);
            }
        }
    }

    assert!(count > 0, "No blue examples found in book/src");
}

fn extract_blue_blocks(content: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut inside = false;
    let mut buf = String::new();

    for line in content.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```blue") {
            inside = true;
            buf.clear();
            continue;
        }
        if inside && trimmed.starts_with("```") {
            inside = false;
            blocks.push(buf.clone());
            continue;
        }
        if inside {
            buf.push_str(line);
            buf.push('\n');
        }
    }

    blocks
}

fn value_of(src: &str) -> Value {
    get_result(src).unwrap_or_else(|e| panic!("Script failed: {e}\n{src}"))
}

fn assert_success(src: &str) {
    if let Err(e) = get_result(src) {
        panic!("Script failed: {e}\n{src}");
    }
}

fn assert_failure(src: &str, kind: ErrorKind) {
    match get_result(src) {
        Err(Error::Runtime(e)) => assert_eq!(e.kind, kind, "{src}: {e}"),
        Err(e) => panic!("Script did not parse: {e}\n{src}"),
        Ok(v) => panic!("Script succeeded with {v} but was expected to fail\n{src}"),
    }
}

#[test]
fn recursive_fibonacci() {
    let v = value_of("fun fib(n) { if n < 2 { return n; }; return fib(n-1) + fib(n-2); }\nfib(10)");
    assert!(matches!(v, Value::Integer(55)));
}

#[test]
fn closures_capture_their_environment() {
    let v = value_of("var make = fun(x) { fun() { x } };\nvar f = make(99); f()");
    assert!(matches!(v, Value::Integer(99)));
}

#[test]
fn integers_promote_to_big_integers() {
    let v = value_of("var a = 2; var i = 0; for i < 100 { a = a * 2; i = i + 1 }; a");
    assert!(matches!(v, Value::BigInteger(_)));
    assert_eq!(v.inspect(), "2535301200456458802993406410752");
}

#[test]
fn maps_keep_insertion_order() {
    let v = value_of("var m = {\"b\": 1, \"a\": 2}; m[\"c\"] = 3; m");
    assert_eq!(v.inspect(), "{b: 1, a: 2, c: 3}");
}

#[test]
fn immutable_bindings_reject_assignment() {
    match get_result("val x = 1; x = 2") {
        Err(Error::Runtime(e)) => {
            assert_eq!(e.kind, ErrorKind::Name);
            assert!(e.message.contains("immutable"), "{e}");
        },
        other => panic!("expected a NameError, got {other:?}"),
    }
}

#[test]
fn process_round_trip() {
    let v = value_of("var p = spawn(fun() { var msg = recv(self()); send(msg.from, {value: msg.value + 1}) });\nsend(p, {from: self(), value: 41}); recv(self()).value");
    assert!(matches!(v, Value::Integer(42)));
}

#[test]
fn assignment_and_basic_arithmetic() {
    assert_success("var x = 1 + 2\nassert(x == 3)");
    assert_success("var x = 7 * 9\nassert(x == 63)");
    assert_success("var x = 10 / 3\nassert(x == 3)");
    assert_success("assert(-7 // 2 == -4)");
    assert_success("assert(-7 % 3 == 2)");
    assert_success("assert(2 ** 10 == 1024)");
    assert_success("assert(type(2 ** -1) == \"FLOAT\")");
    assert_success("var x = 5; x += 2; x *= 3; assert(x == 21)");
}

#[test]
fn division_by_zero() {
    assert_failure("1 / 0", ErrorKind::Arithmetic);
    assert_failure("1 % 0", ErrorKind::Arithmetic);
    assert_success("assert(1.0 / 0.0 > 1.0e300)");
}

#[test]
fn bitwise_operators_are_unsigned() {
    assert!(matches!(value_of("5 & 3"), Value::UInteger(1)));
    assert!(matches!(value_of("0u6 ^ 3"), Value::UInteger(5)));
    assert_success("assert(1 << 3 == 8); assert(256 >> 4 == 16)");
    assert_failure("-5 & 3", ErrorKind::Arithmetic);
    assert_failure("1 << -1", ErrorKind::Arithmetic);
}

#[test]
fn mixed_numbers_compare_by_value() {
    assert_success("assert(1 == 1.0)");
    assert_success("assert(0u3 == 3)");
    assert_success("assert(1 < 1.5)");
    assert_success("assert(\"1\" != 1)");
    assert_failure("1 < \"2\"", ErrorKind::Type);
}

#[test]
fn logic_returns_the_deciding_operand() {
    assert_success("assert((null or 5) == 5)");
    assert_success("assert((null and 5) == null)");
    assert_success("assert((0 and 5) == 5)");
    assert_success("assert(not [])");
    assert_success("assert(!null)");
}

#[test]
fn strings() {
    assert_success("val s = \"abc\"; assert(s[0] == \"a\"); assert(s[-1] == \"c\")");
    assert_success("assert(\"ab\" * 3 == \"ababab\")");
    assert_success("assert(\"b\" in \"abc\")");
    assert_success("val n = 2; assert(\"n = #{n + 1}\" == \"n = 3\")");
    assert_success("assert(len(\"\"\"#{raw}\"\"\") == 6)");
    assert_success("assert(len(\"héllo\") == 5)");
}

#[test]
fn interpolation_uses_the_printable_form() {
    assert_success("val xs = [1, \"a\"]; assert(\"#{xs}\" == \"[1, a]\")");
}

#[test]
fn interpolated_expressions_may_contain_strings() {
    assert_success(r##"val m = {"a": 1}; assert("#{m["a"]}" == "1")"##);
    assert_success(r##"assert("#{["x", 1]}" == "[x, 1]")"##);
    assert_success(r##"assert("#{len({"a": 1})}" == "1")"##);
    assert_success(r##"assert('#{"q"}' == "q")"##);
}

#[test]
fn lists() {
    assert_success("var xs = [1, 2, 3]; assert(xs[-1] == 3); assert(len(xs) == 3)");
    assert_success("var xs = [1, 2]; push(xs, 3); assert(xs == [1, 2, 3])");
    assert_success("assert([1, 2] + [3] == [1, 2, 3])");
    assert_success("assert([0] * 3 == [0, 0, 0])");
    assert_success("assert([1, 2, 3, 4][1..2] == [2, 3])");
    assert_success("assert([1, 2, 3, 4][1..<3] == [2, 3])");
    assert_failure("[1, 2, 3][3]", ErrorKind::Range);
}

#[test]
fn maps_and_structs() {
    assert_success("val p = {x: 1, y: 2}; assert(p.x + p[\"y\"] == 3)");
    assert_success("val m = {1: \"one\"}; assert(m[1] == \"one\"); assert(m[2] == null)");
    assert_success("assert(\"a\" in {\"a\": 1})");
    assert_success("val m = {\"a\": 1} + {\"b\": 2, \"a\": 3}; assert(m == {\"a\": 3, \"b\": 2})");
    assert_failure("var m = {}; m[print] = 1", ErrorKind::Type);
}

#[test]
fn sets() {
    assert_success("val s = {1, 2, 2, 3}; assert(len(s) == 3)");
    assert_success("assert({1, 2} <= {1, 2, 3})");
    assert_success("assert({1, 2} | {3} == {1, 2, 3})");
    assert_success("assert({1, 2, 3} & {2, 3, 4} == {2, 3})");
    assert_success("assert(len(set()) == 0)");
}

#[test]
fn comprehensions() {
    assert_success("assert([x * x for x in [1, 2, 3]] == [1, 4, 9])");
    assert_success("assert([x for x in [1, 2, 3, 4] if x % 2 == 0] == [2, 4])");
    assert_success("assert([i for i, x in [\"a\", \"b\"]] == [0, 1])");
    assert_success("assert({x % 2 for x in [1, 2, 3]} == {0, 1})");
    assert_success("assert({k: v * 10 for k, v in {\"a\": 1}} == {\"a\": 10})");
    assert_success("assert([x for x in []] == [])");
}

#[test]
fn in_on_empty_collections_is_false() {
    assert_success("assert(not (1 in []))");
    assert_success("assert(not (1 in {}))");
    assert_success("assert(not (1 in set()))");
}

#[test]
fn control_flow() {
    assert_success("val x = if 1 > 2 { \"a\" } else if 2 > 1 { \"b\" } else { \"c\" }; assert(x == \"b\")");
    assert_success("var n = 0; for x in 1..10 { if x == 5 { break }; n += x }; assert(n == 10)");
    assert_success("var n = 0; for x in [1, 2, 3] { if x == 2 { continue }; n += x }; assert(n == 4)");
    assert_success("val r = match 3 { 1, 2 => { \"low\" } _ => { \"high\" } }; assert(r == \"high\")");
    assert_success("val x = 7; val r = match { x < 5 => { \"small\" } x < 10 => { \"medium\" } }; assert(r == \"medium\")");
    assert_success("var x = \"outer\"; for x in [1, 2] { }; assert(x == \"outer\")");
}

#[test]
fn stray_control_flow_is_an_error() {
    assert_failure("break", ErrorKind::ControlFlow);
    assert_failure("return 1", ErrorKind::ControlFlow);
}

#[test]
fn functions_and_arguments() {
    assert_success("fun add(a, b = 10) { a + b }; assert(add(1) == 11); assert(add(1, b = 2) == 3)");
    assert_failure("fun f(a) { a }; f()", ErrorKind::Arity);
    assert_failure("fun f(a) { a }; f(1, 2)", ErrorKind::Arity);
    assert_failure("fun f(a, b = 1) { a }; f(1, a = 2)", ErrorKind::Type);
    assert_failure("fun f(a) { a }; f(1, c = 2)", ErrorKind::Type);
    assert_success("fun counter() { var n = 0; fun() { n += 1; n } }; val c = counter(); c(); assert(c() == 2)");
}

#[test]
fn unknown_names() {
    assert_failure("x + 1", ErrorKind::Name);
    assert_failure("y += 1", ErrorKind::Name);
}

#[test]
fn assigning_an_unknown_name_binds_it_in_the_current_scope() {
    assert_success("y = 1; assert(y == 1)");
    assert_success("fun f() { z = 5; z }; assert(f() == 5); assert(try { z } catch (e) { e.kind } == \"NameError\")");
}

#[test]
fn shadowing_bindings_are_not_frozen_by_outer_vals() {
    assert!(matches!(value_of("val n = 1; fun f(n) { n = n + 1; n }; f(5)"), Value::Integer(6)));
    assert!(matches!(value_of("val x = 1; fun g() { var x = 2; x = 3; x }; g()"), Value::Integer(3)));
    assert!(matches!(value_of("val xs = [1]; fun h(xs) { push(xs, 2); xs }; len(h([0]))"), Value::Integer(2)));
    assert_success("val x = 1; fun g() { var x = 2; x }; g(); assert(x == 1)");
    assert_failure("val x = 1; fun g() { x = 2 }; g()", ErrorKind::Name);
    assert_failure("val xs = [1]; fun h() { push(xs, 2) }; h()", ErrorKind::Name);
}

#[test]
fn try_catch_finally() {
    assert_success("val m = try { 1 / 0 } catch (e) { e.message }; assert(m == \"division by zero\")");
    assert_success("val k = try { error(\"boom\") } catch (e) { e.kind }; assert(k == \"HostError\")");
    assert_success("var log = []; try { 1 } finally { push(log, \"done\") }; assert(log == [\"done\"])");
    assert_failure("try { 1 / 0 } finally { 2 }", ErrorKind::Arithmetic);
}

#[test]
fn eval_expressions() {
    assert_success("assert(eval(\"1 + 2\") == 3)");
    assert_success("val s = \"text\"; assert(eval(\"\\\"\" + s + \"\\\"\") == s)");
    assert_failure("eval(\"1 +\")", ErrorKind::Parser);
}

#[test]
fn numeric_conversions() {
    assert_success("assert(int(\"ff\", 16) == 255)");
    assert_success("assert(int(3.9) == 3)");
    assert_success("assert(float(\"1.5\") == 1.5)");
    assert_success("assert(str(12) == \"12\")");
    assert_success("assert(type(bigint(5)) == \"INTEGER\")");
    assert_failure("int(\"nope\")", ErrorKind::Type);
}

#[test]
fn assert_reports_its_message() {
    match get_result("assert(1 == 2, \"math is broken\")") {
        Err(Error::Runtime(e)) => {
            assert_eq!(e.kind, ErrorKind::Host);
            assert_eq!(e.message, "assertion failed: math is broken");
        },
        other => panic!("expected a HostError, got {other:?}"),
    }
}

#[test]
fn parse_errors_are_reported_together() {
    match get_result("val = 1\nvar = 2") {
        Err(Error::Parse(errors)) => assert_eq!(errors.len(), 2),
        other => panic!("expected parse errors, got {other:?}"),
    }
}
