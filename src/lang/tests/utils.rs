use crate::common::*;
use crate::lang::{
    instr::OpCode,
    library::Library,
    eval::Value,
    Program,
};
use crate::logging::DummyLogger;

//------------------------------------------------------------------------------
// Interface for compiling
//------------------------------------------------------------------------------

pub(crate) struct Tester<'a> {
    test_name: String,
    source: String,
    library: &'a Library,
}

impl Tester<'static> {
    /// Constructs a new tester compiling against the standard library.
    pub(crate) fn new<S: ToString>(test_name: S) -> Self {
        Self {
            test_name: test_name.to_string(),
            source: String::new(),
            library: Library::standard(),
        }
    }

    /// Utility for quick tests that expect compilation to succeed.
    pub(crate) fn new_single_source_expect_ok<T: ToString, S: ToString>(test_name: T, source: S) -> ProgramOkTester<'static> {
        Self::new(test_name)
            .with_source(source)
            .compile()
            .expect_ok()
    }

    /// Utility for quick tests that expect compilation to fail.
    pub(crate) fn new_single_source_expect_err<T: ToString, S: ToString>(test_name: T, source: S) -> ErrorTester {
        Self::new(test_name)
            .with_source(source)
            .compile()
            .expect_err()
    }
}

impl<'a> Tester<'a> {
    pub(crate) fn with_source<S: ToString>(mut self, source: S) -> Self {
        self.source = source.to_string();
        self
    }

    pub(crate) fn with_library<'b>(self, library: &'b Library) -> Tester<'b> {
        Tester { test_name: self.test_name, source: self.source, library }
    }

    pub(crate) fn compile(self) -> ProgramTesterResult<'a> {
        match Program::compile_with(&self.source, self.library, &mut DummyLogger) {
            Ok(program) => ProgramTesterResult::Ok(ProgramOkTester {
                test_name: self.test_name,
                program,
                library: self.library,
            }),
            Err(error) => ProgramTesterResult::Err(ErrorTester { test_name: self.test_name, error }),
        }
    }
}

pub(crate) enum ProgramTesterResult<'a> {
    Ok(ProgramOkTester<'a>),
    Err(ErrorTester),
}

impl<'a> ProgramTesterResult<'a> {
    pub(crate) fn expect_ok(self) -> ProgramOkTester<'a> {
        match self {
            ProgramTesterResult::Ok(v) => v,
            ProgramTesterResult::Err(err) => {
                println!("DEBUG: Full error:\n{}", &err.error);
                panic!(
                    "[{}] Expected compilation to succeed, but it failed with {}",
                    err.test_name, err.assert_postfix()
                );
            }
        }
    }

    pub(crate) fn expect_err(self) -> ErrorTester {
        match self {
            ProgramTesterResult::Ok(ok) => {
                println!("DEBUG: Program:\n{}", &ok.program);
                panic!("[{}] Expected compilation to fail, but it succeeded", ok.test_name);
            },
            ProgramTesterResult::Err(err) => err,
        }
    }
}

//------------------------------------------------------------------------------
// Interface for successful compilation
//------------------------------------------------------------------------------

pub(crate) struct ProgramOkTester<'a> {
    test_name: String,
    program: Program,
    library: &'a Library,
}

impl<'a> ProgramOkTester<'a> {
    pub(crate) fn program(&self) -> &Program {
        &self.program
    }

    pub(crate) fn assert_ops(self, expected: &[OpCode]) -> Self {
        let ops: Vec<OpCode> = self.program.instructions().iter().map(|i| i.op).collect();
        assert_eq!(
            ops, expected,
            "[{}] Expected ops {:?}, got {:?}{}", self.test_name, expected, ops, self.assert_postfix()
        );
        self
    }

    pub(crate) fn assert_placements(self, expected: &[i32]) -> Self {
        let placements: Vec<i32> = self.program.instructions().iter().map(|i| i.placement).collect();
        assert_eq!(
            placements, expected,
            "[{}] Expected placements {:?}, got {:?}{}", self.test_name, expected, placements, self.assert_postfix()
        );
        self
    }

    pub(crate) fn assert_frame_size(self, expected: u32) -> Self {
        assert_eq!(
            self.program.frame_size(), expected,
            "[{}] Expected a frame of {} bytes{}", self.test_name, expected, self.assert_postfix()
        );
        self
    }

    pub(crate) fn assert_listing_has(self, text: &str) -> Self {
        let listing = self.program.to_string();
        assert!(
            listing.contains(text),
            "[{}] Expected the listing to contain '{}'{}", self.test_name, text, self.assert_postfix()
        );
        self
    }

    /// Runs the program, which must succeed, and hands the result to `f`.
    pub(crate) fn for_result<F: FnOnce(ValueTester)>(self, f: F) -> Self {
        let value = self.run();
        f(ValueTester { test_name: &self.test_name, value: &value });
        self
    }

    /// Runs the program and checks the rendered type and value.
    pub(crate) fn assert_result(self, ty: &str, value: &str) -> Self {
        self.for_result(|v| {
            v.assert_type(ty).assert_render(value);
        })
    }

    pub(crate) fn run(&self) -> Value {
        match self.program.run_with(self.library, &mut DummyLogger) {
            Ok(value) => value,
            Err(error) => {
                println!("DEBUG: Full error:\n{}", &error);
                panic!("[{}] Expected execution to succeed, but it failed{}", self.test_name, self.assert_postfix());
            },
        }
    }

    pub(crate) fn run_expect_err(&self) -> ErrorTester {
        match self.program.run_with(self.library, &mut DummyLogger) {
            Ok(value) => panic!("[{}] Expected execution to fail, but got {}", self.test_name, value),
            Err(error) => ErrorTester { test_name: self.test_name.clone(), error },
        }
    }

    fn assert_postfix(&self) -> String {
        format!("\nProgram:\n{}", self.program)
    }
}

pub(crate) struct ValueTester<'a> {
    test_name: &'a str,
    value: &'a Value,
}

impl<'a> ValueTester<'a> {
    pub(crate) fn value(&self) -> &Value {
        self.value
    }

    pub(crate) fn assert_type(&self, expected: &str) -> &Self {
        let ty = self.value.ty().to_string();
        assert_eq!(
            ty, expected,
            "[{}] Expected result type {}, got {}", self.test_name, expected, ty
        );
        self
    }

    pub(crate) fn assert_render(&self, expected: &str) -> &Self {
        let rendered = self.value.render();
        assert_eq!(
            rendered, expected,
            "[{}] Expected result {}, got {}", self.test_name, expected, rendered
        );
        self
    }

    pub(crate) fn assert_bytes(&self, expected: &[u8]) -> &Self {
        assert_eq!(
            self.value.bytes(), expected,
            "[{}] Expected result bytes {:?}, got {:?}",
            self.test_name, DenseDebugHex(expected), DenseDebugHex(self.value.bytes())
        );
        self
    }
}

//------------------------------------------------------------------------------
// Interface for failed compilation or execution
//------------------------------------------------------------------------------

pub(crate) struct ErrorTester {
    test_name: String,
    error: Error,
}

impl ErrorTester {
    pub(crate) fn error(&self) -> &Error {
        &self.error
    }

    pub(crate) fn assert_kind(self, expected: ErrorKind) -> Self {
        assert_eq!(
            self.error.kind(), expected,
            "[{}] Expected error kind '{}', got '{}'{}",
            self.test_name, expected, self.error.kind(), self.assert_postfix()
        );
        self
    }

    pub(crate) fn assert_msg_has(self, text: &str) -> Self {
        assert!(
            self.error.message().contains(text),
            "[{}] Expected error message to contain '{}'{}", self.test_name, text, self.assert_postfix()
        );
        self
    }

    pub(crate) fn assert_position(self, line: usize, column: usize) -> Self {
        let position = self.error.position().map(|p| (p.line(), p.column()));
        assert_eq!(
            position, Some((line, column)),
            "[{}] Expected error at {}:{}{}", self.test_name, line, column, self.assert_postfix()
        );
        self
    }

    pub(crate) fn assert_internal(self) -> Self {
        assert!(self.error.is_internal(), "[{}] Expected an internal error{}", self.test_name, self.assert_postfix());
        self
    }

    fn assert_postfix(&self) -> String {
        format!("\nError:\n{}", self.error)
    }
}
