mod analyzer;
mod arena;
pub mod bytecode;
pub mod error;
pub mod eval;
pub mod instr;
mod lexer;
pub mod library;
pub mod literals;
mod parser;
pub mod scope;
pub mod source;
pub mod tokens;
pub mod types;

#[cfg(test)]
mod tests;

use std::fmt;
use std::io::Read;

use crate::common::*;
use crate::logging::DummyLogger;

use analyzer::Analyzer;
use bytecode::BytecodeError;
use eval::{Executor, Value};
use instr::Instruction;
use library::Library;
use literals::LiteralPool;
use parser::Parser;
use source::InputSource;
use tokens::Token;

/// Lexes and parses `source` into the postfix token stream.
pub fn tokenize<S: AsRef<[u8]>>(source: S) -> Result<Vec<Token>, Error> {
    let mut source = InputSource::new(source);
    let lexemes = lexer::lex(&mut source).map_err(|e| e.with_source(&source))?;
    Parser::new(lexemes).parse().map_err(|e| e.with_source(&source))
}

/// Compiles and runs `source` against the standard library.
pub fn evaluate<S: AsRef<[u8]>>(source: S) -> Result<Value, Error> {
    Program::compile(source)?.run()
}

/// An analyzed program, ready to be executed any number of times.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    instructions: Vec<Instruction>,
    literals: LiteralPool,
    frame_size: u32,
}

impl Program {
    pub fn compile<S: AsRef<[u8]>>(source: S) -> Result<Self, Error> {
        Self::compile_with(source, Library::standard(), &mut DummyLogger)
    }

    pub fn compile_with<S: AsRef<[u8]>>(source: S, library: &Library, logger: &mut dyn Logger) -> Result<Self, Error> {
        let input = InputSource::new(source);
        let tokens = tokenize(&input.input)?;
        log!(logger, "compiling {} tokens", tokens.len());
        Self::from_tokens(&tokens, library, logger).map_err(|e| e.with_source(&input))
    }

    /// Analyzes an already parsed token stream.
    pub fn from_tokens(tokens: &[Token], library: &Library, logger: &mut dyn Logger) -> Result<Self, Error> {
        let analysis = Analyzer::new(library, logger)?.analyze(tokens)?;
        Ok(Self {
            instructions: analysis.instructions,
            literals: analysis.literals,
            frame_size: analysis.frame_size,
        })
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn literals(&self) -> &LiteralPool {
        &self.literals
    }

    pub fn frame_size(&self) -> u32 {
        self.frame_size
    }

    pub fn run(&self) -> Result<Value, Error> {
        self.run_with(Library::standard(), &mut DummyLogger)
    }

    /// Executes the program. `library` must be the library the program was
    /// compiled against.
    pub fn run_with(&self, library: &Library, logger: &mut dyn Logger) -> Result<Value, Error> {
        Executor::new(&self.instructions, &self.literals, self.frame_size, library, logger).execute()
    }

    pub fn write_bytecode(&self, w: &mut dyn Write) -> Result<(), BytecodeError> {
        bytecode::write_header(w, bytecode::now())?;
        let body = bytecode::Body {
            literals: self.literals.clone(),
            frame_size: self.frame_size,
            instructions: self.instructions.clone(),
        };
        bytecode::write_body(w, &body)
    }

    pub fn read_bytecode(r: &mut dyn Read) -> Result<Self, BytecodeError> {
        bytecode::read_header(r)?;
        let body = bytecode::read_body(r)?;
        Ok(Self {
            instructions: body.instructions,
            literals: body.literals,
            frame_size: body.frame_size,
        })
    }
}

impl fmt::Display for Program {
    /// Disassembly listing, one instruction per line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; frame {} bytes, literals {} bytes", self.frame_size, self.literals.len())?;
        for (idx, instr) in self.instructions.iter().enumerate() {
            writeln!(f, "{:04}  {}", idx, instr)?;
        }
        Ok(())
    }
}
