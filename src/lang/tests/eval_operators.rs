use super::*;

#[test]
fn test_basic_arithmetic() {
    let cases = hashmap! {
        "1+2" => "3",
        "3-2" => "1",
        "2 * 3 + 1" => "7",
        "2 * (3 + 1)" => "8",
        "-5 + 2" => "-3",
        "--4" => "4",
        "10 - 2 * 3 - 1" => "3",
    };
    for (source, expected) in cases {
        Tester::new_single_source_expect_ok(source, source)
            .assert_result("@i32", expected);
    }
}

#[test]
fn test_float_arithmetic() {
    Tester::new_single_source_expect_ok("multiply", "1.5 * 2.0")
        .assert_result("@f64", "3.0");
    Tester::new_single_source_expect_ok("subtract", "0.5 - 2.0")
        .assert_result("@f64", "-1.5");
    Tester::new_single_source_expect_ok("negate", "-(2.25)")
        .assert_result("@f64", "-2.25");
}

#[test]
fn test_integer_wrapping() {
    Tester::new_single_source_expect_ok("overflow", "2147483647 + 1")
        .assert_result("@i32", "-2147483648");
    Tester::new_single_source_expect_ok("underflow", "-2147483647 - 2")
        .assert_result("@i32", "2147483647");
    Tester::new_single_source_expect_ok("multiply", "65536 * 65536")
        .assert_result("@i32", "0");
}

#[test]
fn test_literal_dot_rule() {
    // A number is a float exactly when its text contains a dot
    Tester::new_single_source_expect_ok("integer", "8")
        .assert_ops(&[OpCode::LoadI, OpCode::End])
        .assert_result("@i32", "8");
    Tester::new_single_source_expect_ok("float", "8.0")
        .assert_result("@f64", "8.0");
    Tester::new_single_source_expect_ok("fraction", "8.25")
        .assert_result("@f64", "8.25");
    Tester::new_single_source_expect_ok("large float", "100000000000000000000.0")
        .assert_result("@f64", "100000000000000000000.0");

    // A dot that is not followed by a digit is a pipe
    Tester::new_single_source_expect_ok("pipe after integer", "8.abs")
        .assert_result("@i32", "8");
    Tester::new_single_source_expect_ok("pipe after float", "8.5.abs")
        .assert_result("@f64", "8.5");
}

#[test]
fn test_result_bytes() {
    Tester::new_single_source_expect_ok("bytes", "40 + 2")
        .for_result(|v| {
            v.assert_bytes(&42i32.to_ne_bytes());
            assert_eq!(v.value().as_i32(), Some(42));
        });
}

#[test]
fn test_arithmetic_type_mismatch() {
    Tester::new_single_source_expect_err("mixed", "1 + 2.0")
        .assert_kind(ErrorKind::TypeMismatch)
        .assert_msg_has("@i32 and @f64")
        .assert_position(1, 3);
    Tester::new_single_source_expect_err("tuple operand", "(1, 2) * 2")
        .assert_kind(ErrorKind::TypeMismatch);
    Tester::new_single_source_expect_err("negated tuple", "-(1, 2)")
        .assert_kind(ErrorKind::TypeMismatch)
        .assert_msg_has("cannot negate");
    Tester::new_single_source_expect_err("function operand", "pow + 1")
        .assert_kind(ErrorKind::TypeMismatch);
}

#[test]
fn test_integer_literal_range() {
    Tester::new_single_source_expect_err("too large", "2147483648")
        .assert_kind(ErrorKind::Syntax)
        .assert_msg_has("does not fit");
}
