use super::*;
use crate::lang::library::{read_i32, write_i32, Library};
use crate::lang::tokens::{Arity, Token, TokenKind};
use crate::lang::Program;
use crate::logging::{DummyLogger, VecLogger};

fn analyze_tokens(tokens: Vec<Token>) -> Error {
    match Program::from_tokens(&tokens, Library::standard(), &mut DummyLogger) {
        Ok(program) => panic!("expected analysis to fail, got:\n{}", program),
        Err(err) => err,
    }
}

fn op(kind: TokenKind, arity: Arity) -> Token {
    Token::operator(kind, arity)
}

#[test]
fn test_error_display() {
    let err = Tester::new_single_source_expect_err("undefined", "a := 1;\nb + a")
        .assert_kind(ErrorKind::UndefinedId)
        .assert_position(2, 1)
        .error()
        .to_string();
    assert!(err.starts_with("undefined identifier\n"));
    assert!(err.contains("ERROR: 'b' is not defined"));
    assert!(err.contains(" +- at 2:1"));
    assert!(err.contains(" | b + a\n | ^\n"));
}

#[test]
fn test_error_with_info() {
    let err = Tester::new_single_source_expect_err("bracket", "x := [1,\n  2)")
        .assert_kind(ErrorKind::Syntax)
        .assert_position(2, 4)
        .error()
        .to_string();
    assert!(err.contains("expected ']', found ')'"));
    assert!(err.contains(" INFO: to close the bracket opened here"));
    assert!(err.contains(" +- at 1:6"));
    assert!(err.contains(" | x := [1,\n |      ^\n"));
}

#[test]
fn test_error_kind_names() {
    assert_eq!(ErrorKind::UndefinedId.to_string(), "undefined identifier");
    assert_eq!(ErrorKind::CallingNonFunction.to_string(), "calling a non-function");
    assert_eq!(ErrorKind::InternalError.to_string(), "internal error");
    assert!(Error::internal("broken").is_internal());
    assert!(!Error::new(ErrorKind::TypeMismatch, "mismatch").is_internal());
}

#[test]
fn test_malformed_token_streams() {
    let err = analyze_tokens(vec![op(TokenKind::Plus, Arity::Binary), op(TokenKind::End, Arity::LeftUnary)]);
    assert!(err.is_internal());
    assert!(err.message().contains("operator without enough operands"));

    let err = analyze_tokens(vec![Token::number("1")]);
    assert!(err.is_internal());
    assert!(err.message().contains("missing its end token"));

    let err = analyze_tokens(vec![Token::number("1"), Token::number("2"), op(TokenKind::End, Arity::LeftUnary)]);
    assert!(err.is_internal());
    assert!(err.message().contains("left over"));

    let err = analyze_tokens(vec![Token::number("1"), op(TokenKind::Call, Arity::LeftUnary), op(TokenKind::End, Arity::LeftUnary)]);
    assert!(err.is_internal());
    assert!(err.message().contains("not piped"));

    let err = analyze_tokens(vec![op(TokenKind::BlockBegin, Arity::Nullary), Token::number("1"), op(TokenKind::End, Arity::LeftUnary)]);
    assert!(err.is_internal());
    assert!(err.message().contains("unbalanced"));

    let err = analyze_tokens(vec![Token::number("1"), op(TokenKind::BlockEnd, Arity::LeftUnary), op(TokenKind::End, Arity::LeftUnary)]);
    assert!(err.is_internal());
    assert!(err.message().contains("root scope"));

    let err = analyze_tokens(vec![Token::number("1"), op(TokenKind::End, Arity::LeftUnary), Token::number("2")]);
    assert!(err.is_internal());
    assert!(err.message().contains("after the end"));

    let err = analyze_tokens(vec![Token::number("1"), op(TokenKind::Plus, Arity::Nullary), op(TokenKind::End, Arity::LeftUnary)]);
    assert!(err.is_internal());

    let err = analyze_tokens(vec![
        Token::number("1"), Token::number("2"), op(TokenKind::Member, Arity::Binary), op(TokenKind::End, Arity::LeftUnary),
    ]);
    assert!(err.is_internal());
    assert!(err.message().contains("member name"));
}

#[test]
fn test_handwritten_token_stream() {
    // Same stream the parser produces for `max (2, 5)`
    let tokens = vec![
        Token::name("max"),
        Token::number("2"),
        Token::number("5"),
        op(TokenKind::Comma, Arity::Binary),
        op(TokenKind::Group, Arity::LeftUnary),
        op(TokenKind::Call, Arity::Binary),
        op(TokenKind::End, Arity::LeftUnary),
    ];
    let program = Program::from_tokens(&tokens, Library::standard(), &mut DummyLogger).unwrap();
    assert_eq!(program.run().unwrap().as_i32(), Some(5));
}

#[test]
fn test_running_against_wrong_library() {
    let tester = Tester::new_single_source_expect_ok("native", "abs (-1)");
    let empty = Library::new();
    let err = tester.program().run_with(&empty, &mut DummyLogger).unwrap_err();
    assert!(err.is_internal());
    assert!(err.message().contains("unknown native handle"));

    // Constants live in the program's literal pool and need no library
    let program = Tester::new_single_source_expect_ok("constant", "pi * 2.0").program().clone();
    assert!(program.run_with(&empty, &mut DummyLogger).is_ok());
}

fn identity(arg: &[u8], result: &mut [u8]) {
    write_i32(result, 0, read_i32(arg, 0));
}

#[test]
fn test_running_against_library_with_other_natives() {
    // native#0 is `id` here but `pow` in the standard library
    let i32_type = Type::from(TypeAtom::I32);
    let mut custom = Library::new();
    custom.register_native("id", &i32_type, &i32_type, identity).unwrap();

    let tester = Tester::new("identity")
        .with_library(&custom)
        .with_source("id 3")
        .compile()
        .expect_ok()
        .assert_listing_has("native#0")
        .assert_result("@i32", "3");

    let err = tester.program().run_with(Library::standard(), &mut DummyLogger).unwrap_err();
    assert!(err.is_internal());
    assert!(err.message().contains("native 'pow' of type @fn((@i32,@i32)->@i32) called as @fn(@i32->@i32)"));

    // And the other way round
    let err = Tester::new_single_source_expect_ok("pow", "pow (2, 3)")
        .program()
        .run_with(&custom, &mut DummyLogger)
        .unwrap_err();
    assert!(err.is_internal());
}

#[test]
fn test_compiling_against_empty_library() {
    let empty = Library::new();
    Tester::new("no natives")
        .with_library(&empty)
        .with_source("abs 1")
        .compile()
        .expect_err()
        .assert_kind(ErrorKind::UndefinedId);
    Tester::new("no natives needed")
        .with_library(&empty)
        .with_source("a := 2; a * a")
        .compile()
        .expect_ok()
        .assert_result("@i32", "4");
}

#[cfg(not(feature = "no_logging"))]
#[test]
fn test_trace_logging() {
    let mut logger = VecLogger::new("trace");
    let program = Program::compile_with("2 |> pow 3", Library::standard(), &mut logger).unwrap();
    program.run_with(Library::standard(), &mut logger).unwrap();

    let log = logger.contents();
    assert!(log.contains("trace at "));
    assert!(log.contains("emit    0000 LOADI      @i32 imm=2"));
    assert!(log.contains("place   0000 +8"));
    assert!(log.contains("place   0001 -12"));
    assert!(log.contains("resolve 0001 LOADI"));
    assert!(log.contains("exec 0004 END -> @i32 = 8"));

    let mut dumped = Vec::new();
    logger.dump_log(&mut dumped);
    assert_eq!(String::from_utf8(dumped).unwrap(), log);
}

#[cfg(feature = "no_logging")]
#[test]
fn test_trace_logging_disabled() {
    let mut logger = VecLogger::new("trace");
    let program = Program::compile_with("2 |> pow 3", Library::standard(), &mut logger).unwrap();
    program.run_with(Library::standard(), &mut logger).unwrap();
    assert!(logger.contents().is_empty());
}
