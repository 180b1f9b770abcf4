/**
 * lang/tests
 *
 * Tests running programs through the complete pipeline: lexing, parsing,
 * analysis and evaluation. Tests of individual building blocks live next to
 * the code they test.
 */

mod utils;
mod eval_operators;
mod eval_binding;
mod errors;

pub(crate) use utils::Tester; // the testing harness
pub(crate) use crate::lang::instr::OpCode;
pub(crate) use crate::common::*;
