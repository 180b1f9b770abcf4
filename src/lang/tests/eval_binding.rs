use super::*;

#[test]
fn test_assignment() {
    Tester::new_single_source_expect_ok("assign", "a := 5")
        .assert_ops(&[OpCode::Nop, OpCode::LoadI, OpCode::Copy, OpCode::End])
        .assert_frame_size(4)
        .assert_listing_has("COPY       @i32 frame=0")
        .assert_result("@i32", "5");
    Tester::new_single_source_expect_ok("use", "a := 5; a + 1")
        .assert_listing_has("LOAD       @i32 frame=0")
        .assert_result("@i32", "6");
    Tester::new_single_source_expect_ok("chained", "a := b := 3; a + b")
        .assert_frame_size(8)
        .assert_result("@i32", "6");
    Tester::new_single_source_expect_ok("tuple value", "p := (1, 2.5); p._2 * 2.0")
        .assert_frame_size(12)
        .assert_result("@f64", "5.0");
}

#[test]
fn test_sequences() {
    Tester::new_single_source_expect_ok("discarded", "1; 2.0; 3")
        .assert_result("@i32", "3");
    Tester::new_single_source_expect_ok("discarded tuple", "(1, 2); 7")
        .assert_result("@i32", "7");
    Tester::new_single_source_expect_ok("multi line", "x := 2;\ny := x * 10;\nx + y")
        .assert_result("@i32", "22");
}

#[test]
fn test_block_scopes() {
    Tester::new_single_source_expect_ok("block value", "{x := 4; x * x}")
        .assert_result("@i32", "16");
    Tester::new_single_source_expect_ok("shadow with other type", "a := 1; {a := 2.0; a}")
        .assert_result("@f64", "2.0");
    Tester::new_single_source_expect_ok("shadow with same type", "a := 1; {a := 2; a}; a")
        .assert_result("@i32", "1");
    Tester::new_single_source_expect_ok("outer visible", "a := 3; {b := a * 2; b + a}")
        .assert_result("@i32", "9");
    Tester::new_single_source_expect_ok("shadow native", "{pow := 2; pow}")
        .assert_result("@i32", "2");
    Tester::new_single_source_expect_ok("shadow constant", "{pi := 3.0; pi}")
        .assert_result("@f64", "3.0");

    Tester::new_single_source_expect_err("left behind", "{x := 4}; x")
        .assert_kind(ErrorKind::UndefinedId)
        .assert_msg_has("'x' is not defined")
        .assert_position(1, 11);
}

#[test]
fn test_frame_reuse() {
    // Sibling scopes share frame bytes, the frame is the high-water mark
    Tester::new_single_source_expect_ok("high water", "a := 1; {b := 2.0; b}; c := 3")
        .assert_frame_size(12)
        .assert_result("@i32", "3");
    Tester::new_single_source_expect_ok("siblings", "{a := 1.0; a}; {b := 2; b}")
        .assert_frame_size(8)
        .assert_result("@i32", "2");
    Tester::new_single_source_expect_ok("nested", "{a := 1; {b := 2; {c := 3; a + b + c}}}")
        .assert_frame_size(12)
        .assert_result("@i32", "6");
}

#[test]
fn test_overload_by_type() {
    // Both bindings live side by side, plain uses pick the first
    Tester::new_single_source_expect_ok("first wins", "a := 1; a := 2.0; a")
        .assert_result("@i32", "1");
    Tester::new_single_source_expect_err("first is used in arithmetic", "a := 1; a := 2.0; a * 1.5")
        .assert_kind(ErrorKind::TypeMismatch);
}

#[test]
fn test_duplicate_binding() {
    Tester::new_single_source_expect_err("same type", "a := 1; a := 2")
        .assert_kind(ErrorKind::DuplicateBinding)
        .assert_msg_has("'a' is already bound with type @i32")
        .assert_position(1, 9);
    Tester::new_single_source_expect_err("library constant", "pi := 3.0")
        .assert_kind(ErrorKind::DuplicateBinding);
    Tester::new_single_source_expect_err("in block", "{t := (1, 2); t := 3, 4}")
        .assert_kind(ErrorKind::DuplicateBinding);
}

#[test]
fn test_invalid_assignment_target() {
    Tester::new_single_source_expect_err("number", "1 := 2")
        .assert_kind(ErrorKind::UndefinedId)
        .assert_msg_has("must be a name");
    Tester::new_single_source_expect_err("tuple", "(a, b) := 2")
        .assert_kind(ErrorKind::UndefinedId);
    Tester::new_single_source_expect_err("undefined value", "a := b")
        .assert_kind(ErrorKind::UndefinedId)
        .assert_msg_has("'b' is not defined");
}
