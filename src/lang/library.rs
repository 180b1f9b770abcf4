/// library.rs
///
/// Native functions and named constants available to every program. A
/// native function works directly on the byte representation of its
/// argument and result: it receives the packed argument bytes and writes
/// exactly `size_of(return type)` bytes into the result buffer.

use std::fmt;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::common::*;

pub type NativeFn = fn(&[u8], &mut [u8]);

/// Handle of a native function within the library it was registered in.
/// On the evaluation stack it occupies `POINTER_WIDTH` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NativeId(pub(crate) u32);

impl NativeId {
    pub fn to_bytes(self) -> [u8; 8] {
        (self.0 as u64).to_ne_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let mut buffer = [0u8; 8];
        if bytes.len() != buffer.len() {
            return None;
        }
        buffer.copy_from_slice(bytes);
        let raw = u64::from_ne_bytes(buffer);
        if raw > u32::max_value() as u64 {
            return None;
        }
        Some(NativeId(raw as u32))
    }
}

impl fmt::Display for NativeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "native#{}", self.0)
    }
}

#[derive(Clone)]
pub struct Native {
    pub name: String,
    pub ty: Type,
    pub func: NativeFn,
}

impl Debug for Native {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("Native").field("name", &self.name).field("ty", &self.ty).finish()
    }
}

#[derive(Debug, Clone)]
pub struct Constant {
    pub name: String,
    pub ty: Type,
    pub bytes: Vec<u8>,
}

/// Read-only after construction, so a single library can be shared between
/// any number of concurrently compiled and executed programs.
#[derive(Debug, Clone, Default)]
pub struct Library {
    natives: Vec<Native>,
    constants: Vec<Constant>,
}

lazy_static! {
    static ref STANDARD: Library = Library::build_standard();
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide standard library.
    pub fn standard() -> &'static Library {
        &STANDARD
    }

    pub fn register_native(&mut self, name: &str, ret: &Type, arg: &Type, func: NativeFn) -> Result<NativeId, Error> {
        let ty = Type::func(ret, arg);
        if self.natives.iter().any(|n| n.name == name && n.ty == ty) {
            return Err(Error::new(
                ErrorKind::DuplicateBinding,
                format!("native '{}' of type {} is already registered", name, ty),
            ));
        }
        Ok(self.push_native(name, ty, func))
    }

    pub fn register_constant(&mut self, name: &str, ty: &Type, bytes: &[u8]) -> Result<(), Error> {
        if bytes.len() != ty.size() as usize {
            return Err(Error::internal(format!(
                "constant '{}' of type {} needs {} bytes, got {}", name, ty, ty.size(), bytes.len()
            )));
        }
        if self.constants.iter().any(|c| c.name == name && c.ty == *ty) {
            return Err(Error::new(
                ErrorKind::DuplicateBinding,
                format!("constant '{}' of type {} is already registered", name, ty),
            ));
        }
        self.constants.push(Constant { name: name.to_string(), ty: ty.clone(), bytes: bytes.to_vec() });
        Ok(())
    }

    pub fn native(&self, id: NativeId) -> Option<&Native> {
        self.natives.get(id.0 as usize)
    }

    pub fn natives(&self) -> impl Iterator<Item = (NativeId, &Native)> {
        self.natives.iter().enumerate().map(|(idx, native)| (NativeId(idx as u32), native))
    }

    pub fn constants(&self) -> &[Constant] {
        &self.constants
    }

    fn push_native(&mut self, name: &str, ty: Type, func: NativeFn) -> NativeId {
        let id = NativeId(self.natives.len() as u32);
        self.natives.push(Native { name: name.to_string(), ty, func });
        id
    }

    fn build_standard() -> Self {
        let i32_type = Type::from(TypeAtom::I32);
        let f64_type = Type::from(TypeAtom::F64);
        let i32_pair = Type::tuple(&[i32_type.clone(), i32_type.clone()]);
        let f64_pair = Type::tuple(&[f64_type.clone(), f64_type.clone()]);

        let mut library = Self::new();
        let mut add = |name: &str, ret: &Type, arg: &Type, func: NativeFn| {
            library.push_native(name, Type::func(ret, arg), func);
        };
        add("pow", &i32_type, &i32_pair, pow_i32);
        add("pow", &f64_type, &f64_pair, pow_f64);
        add("min", &i32_type, &i32_pair, min_i32);
        add("min", &f64_type, &f64_pair, min_f64);
        add("max", &i32_type, &i32_pair, max_i32);
        add("max", &f64_type, &f64_pair, max_f64);
        add("abs", &i32_type, &i32_type, abs_i32);
        add("abs", &f64_type, &f64_type, abs_f64);
        add("sqrt", &f64_type, &f64_type, sqrt_f64);
        add("float", &f64_type, &i32_type, float_i32);
        add("int", &i32_type, &f64_type, int_f64);
        add("swap", &i32_pair, &i32_pair, swap_i32);

        library.constants.push(Constant {
            name: "pi".to_string(), ty: f64_type.clone(), bytes: std::f64::consts::PI.to_ne_bytes().to_vec(),
        });
        library.constants.push(Constant {
            name: "e".to_string(), ty: f64_type, bytes: std::f64::consts::E.to_ne_bytes().to_vec(),
        });
        library
    }
}

//------------------------------------------------------------------------------
// Byte access for native implementations
//------------------------------------------------------------------------------

macro_rules! impl_native_access {
    ($read:ident, $write:ident, $ty:ty) => {
        pub fn $read(bytes: &[u8], at: usize) -> $ty {
            const WIDTH: usize = std::mem::size_of::<$ty>();
            let mut buffer = [0u8; WIDTH];
            buffer.copy_from_slice(&bytes[at..at + WIDTH]);
            <$ty>::from_ne_bytes(buffer)
        }

        pub fn $write(bytes: &mut [u8], at: usize, value: $ty) {
            const WIDTH: usize = std::mem::size_of::<$ty>();
            bytes[at..at + WIDTH].copy_from_slice(&value.to_ne_bytes());
        }
    };
}

impl_native_access!(read_i32, write_i32, i32);
impl_native_access!(read_f64, write_f64, f64);

fn pow_i32(arg: &[u8], result: &mut [u8]) {
    let (base, exp) = (read_i32(arg, 0), read_i32(arg, 4));
    let value = if exp >= 0 {
        base.wrapping_pow(exp as u32)
    } else {
        // Truncated reciprocal
        match base {
            1 => 1,
            -1 => if exp % 2 == 0 { 1 } else { -1 },
            _ => 0,
        }
    };
    write_i32(result, 0, value);
}

fn pow_f64(arg: &[u8], result: &mut [u8]) {
    write_f64(result, 0, read_f64(arg, 0).powf(read_f64(arg, 8)));
}

fn min_i32(arg: &[u8], result: &mut [u8]) {
    write_i32(result, 0, read_i32(arg, 0).min(read_i32(arg, 4)));
}

fn min_f64(arg: &[u8], result: &mut [u8]) {
    write_f64(result, 0, read_f64(arg, 0).min(read_f64(arg, 8)));
}

fn max_i32(arg: &[u8], result: &mut [u8]) {
    write_i32(result, 0, read_i32(arg, 0).max(read_i32(arg, 4)));
}

fn max_f64(arg: &[u8], result: &mut [u8]) {
    write_f64(result, 0, read_f64(arg, 0).max(read_f64(arg, 8)));
}

fn abs_i32(arg: &[u8], result: &mut [u8]) {
    write_i32(result, 0, read_i32(arg, 0).wrapping_abs());
}

fn abs_f64(arg: &[u8], result: &mut [u8]) {
    write_f64(result, 0, read_f64(arg, 0).abs());
}

fn sqrt_f64(arg: &[u8], result: &mut [u8]) {
    write_f64(result, 0, read_f64(arg, 0).sqrt());
}

fn float_i32(arg: &[u8], result: &mut [u8]) {
    write_f64(result, 0, read_i32(arg, 0) as f64);
}

fn int_f64(arg: &[u8], result: &mut [u8]) {
    // Saturating, NaN becomes zero
    write_i32(result, 0, read_f64(arg, 0) as i32);
}

fn swap_i32(arg: &[u8], result: &mut [u8]) {
    let (first, second) = (read_i32(arg, 0), read_i32(arg, 4));
    write_i32(result, 0, second);
    write_i32(result, 4, first);
}
