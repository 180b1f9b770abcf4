///////////////////// PRELUDE /////////////////////

pub(crate) use crate::lang::{
    error::{Error, ErrorKind},
    types::{Type, TypeAtom},
};
pub(crate) use crate::logging::Logger;

pub(crate) use core::fmt::{Debug, Formatter};
pub(crate) use maplit::hashmap;
pub(crate) use std::{
    collections::HashMap,
    io::Write,
};

/// Byte width of a function handle on the evaluation stack.
pub const POINTER_WIDTH: u32 = std::mem::size_of::<u64>() as u32;

/// Prints bytes as one dense hex string, used in the evaluator trace.
pub(crate) struct DenseDebugHex<'a>(pub &'a [u8]);

impl Debug for DenseDebugHex<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        for b in self.0 {
            write!(f, "{:02X?}", b)?;
        }
        Ok(())
    }
}
