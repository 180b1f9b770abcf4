/// bytecode.rs
///
/// Binary form of an analyzed program:
///
/// ```text
/// magic "FLBC" | version (u16, little endian) | timestamp (u64, little
/// endian, seconds since the unix epoch) | bincode(body)
/// ```
///
/// The body holds the literal pool, the frame size and the instructions.
/// Native handles refer to the library the program was compiled against.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use super::instr::Instruction;
use super::literals::LiteralPool;

pub const MAGIC: [u8; 4] = *b"FLBC";
pub const VERSION: u16 = 1;

#[derive(Debug, derive_more::Display, derive_more::From)]
pub enum BytecodeError {
    #[display(fmt = "i/o error: {}", _0)]
    Io(std::io::Error),
    #[display(fmt = "malformed bytecode body: {}", _0)]
    Encoding(bincode::Error),
    #[from(ignore)]
    #[display(fmt = "not a bytecode file (magic {:?})", _0)]
    BadMagic([u8; 4]),
    #[from(ignore)]
    #[display(fmt = "unsupported bytecode version {} (expected {})", _0, VERSION)]
    UnsupportedVersion(u16),
    #[from(ignore)]
    #[display(fmt = "malformed bytecode: {}", _0)]
    Malformed(String),
}

impl std::error::Error for BytecodeError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u16,
    pub timestamp: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Body {
    pub literals: LiteralPool,
    pub frame_size: u32,
    pub instructions: Vec<Instruction>,
}

pub(crate) fn write_header(w: &mut dyn Write, timestamp: u64) -> Result<(), BytecodeError> {
    w.write_all(&MAGIC)?;
    w.write_all(&VERSION.to_le_bytes())?;
    w.write_all(&timestamp.to_le_bytes())?;
    Ok(())
}

pub fn read_header(r: &mut dyn Read) -> Result<Header, BytecodeError> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(BytecodeError::BadMagic(magic));
    }

    let mut version = [0u8; 2];
    r.read_exact(&mut version)?;
    let version = u16::from_le_bytes(version);
    if version != VERSION {
        return Err(BytecodeError::UnsupportedVersion(version));
    }

    let mut timestamp = [0u8; 8];
    r.read_exact(&mut timestamp)?;
    Ok(Header { version, timestamp: u64::from_le_bytes(timestamp) })
}

pub(crate) fn write_body(w: &mut dyn Write, body: &Body) -> Result<(), BytecodeError> {
    bincode::serialize_into(w, body)?;
    Ok(())
}

pub(crate) fn read_body(r: &mut dyn Read) -> Result<Body, BytecodeError> {
    let body: Body = bincode::deserialize_from(r)?;
    for (idx, instr) in body.instructions.iter().enumerate() {
        let malformed = std::iter::once(&instr.result)
            .chain(instr.operands.iter())
            .find(|ty| !ty.is_well_formed());
        if let Some(ty) = malformed {
            return Err(BytecodeError::Malformed(format!(
                "instruction {} has malformed type {:?}", idx, ty.atoms()
            )));
        }
    }
    Ok(body)
}

pub(crate) fn now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|dur| dur.as_secs())
        .unwrap_or(0)
}
