use std::fmt;

use serde::{Deserialize, Serialize};

use crate::common::*;
use super::library::NativeId;
use super::source::InputPosition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpCode {
    // Name awaiting resolution, never executed
    Unresolved,
    Nop,
    LoadI,
    LoadL,
    Load,
    Copy,
    Add,
    Sub,
    Mul,
    Neg,
    Tuple,
    Member,
    Seq,
    Call,
    End,
}

impl OpCode {
    fn mnemonic(&self) -> &'static str {
        use OpCode::*;
        match self {
            Unresolved => "UNRESOLVED",
            Nop => "NOP",
            LoadI => "LOADI",
            LoadL => "LOADL",
            Load => "LOAD",
            Copy => "COPY",
            Add => "ADD",
            Sub => "SUB",
            Mul => "MUL",
            Neg => "NEG",
            Tuple => "TUPLE",
            Member => "MEMBER",
            Seq => "SEQ",
            Call => "CALL",
            End => "END",
        }
    }
}

/// Numeric value embedded in a `LOADI`. The instruction's result type picks
/// the width it is written with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Immediate {
    Int(i64),
    UInt(u64),
    Float(f64),
}

macro_rules! encode_as {
    ($value:expr, $ty:ty) => {
        match $value {
            Immediate::Int(v) => (v as $ty).to_ne_bytes().to_vec(),
            Immediate::UInt(v) => (v as $ty).to_ne_bytes().to_vec(),
            Immediate::Float(v) => (v as $ty).to_ne_bytes().to_vec(),
        }
    };
}

impl Immediate {
    /// Byte representation as a value of the primitive `atom`.
    pub fn encode(&self, atom: TypeAtom) -> Result<Vec<u8>, Error> {
        use TypeAtom::*;
        let value = *self;
        let bytes = match atom {
            I8 => encode_as!(value, i8),
            I16 => encode_as!(value, i16),
            I32 => encode_as!(value, i32),
            I64 => encode_as!(value, i64),
            ISize => encode_as!(value, isize),
            U8 => encode_as!(value, u8),
            U16 => encode_as!(value, u16),
            U32 => encode_as!(value, u32),
            U64 => encode_as!(value, u64),
            USize => encode_as!(value, usize),
            F32 => encode_as!(value, f32),
            F64 => encode_as!(value, f64),
            _ => return Err(Error::internal(format!("cannot encode an immediate as {:?}", atom))),
        };
        Ok(bytes)
    }
}

impl fmt::Display for Immediate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Immediate::Int(v) => write!(f, "{}", v),
            Immediate::UInt(v) => write!(f, "{}u", v),
            Immediate::Float(v) => write!(f, "{:?}", v),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    None,
    Immediate(Immediate),
    // Literal pool offset
    Literal(u32),
    // Frame offset
    Stack(u32),
    Native(NativeId),
    // Name of an unresolved placeholder
    Identifier(String),
    // Byte offset of a tuple member
    Member(u32),
}

/// One instruction of a program. `placement` moves where the result is
/// written relative to the top of the stack (see `Store::reserve`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub op: OpCode,
    pub result: Type,
    pub operands: Vec<Type>,
    pub payload: Payload,
    pub placement: i32,
    pub position: InputPosition,
}

impl Instruction {
    pub fn new(op: OpCode, result: Type, operands: Vec<Type>, payload: Payload, position: InputPosition) -> Self {
        debug_assert!(operands.len() <= 2);
        Self { op, result, operands, payload, placement: 0, position }
    }

    pub fn placeholder(name: &str, position: InputPosition) -> Self {
        Self::new(OpCode::Unresolved, Type::undecided(), Vec::new(), Payload::Identifier(name.to_string()), position)
    }

    pub fn identifier(&self) -> Option<&str> {
        match &self.payload {
            Payload::Identifier(name) => Some(name),
            _ => None,
        }
    }

    pub fn operand_size(&self, idx: usize) -> Result<u32, Error> {
        match self.operands.get(idx) {
            Some(ty) => Ok(ty.size()),
            None => Err(Error::internal(format!("{} is missing operand {}", self.op.mnemonic(), idx))),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<10} {}", self.op.mnemonic(), self.result)?;
        match &self.payload {
            Payload::None => {},
            Payload::Immediate(value) => write!(f, " imm={}", value)?,
            Payload::Literal(offset) => write!(f, " lit={}", offset)?,
            Payload::Stack(offset) => write!(f, " frame={}", offset)?,
            Payload::Native(id) => write!(f, " {}", id)?,
            Payload::Identifier(name) => write!(f, " '{}'", name)?,
            Payload::Member(offset) => write!(f, " member={}", offset)?,
        }
        if !self.operands.is_empty() {
            f.write_str(" <-")?;
            for operand in &self.operands {
                write!(f, " {}", operand)?;
            }
        }
        if self.placement != 0 {
            write!(f, " @{:+}", self.placement)?;
        }
        Ok(())
    }
}
