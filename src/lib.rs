#[macro_use]
mod macros;

mod common;
pub mod lang;
pub mod logging;

pub use common::POINTER_WIDTH;
pub use lang::{
    error::{Error, ErrorKind},
    eval::Value,
    evaluate,
    library::{Library, NativeFn, NativeId},
    tokenize,
    types::{Type, TypeAtom},
    Program,
};
