use std::convert::TryInto;
use std::fmt;

use crate::common::*;
use crate::lang::instr::OpCode;
use crate::lang::library::NativeId;
use crate::lang::types::subtree_end;

/// Result of running a program: its type and its native-endian bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    ty: Type,
    bytes: Vec<u8>,
}

macro_rules! impl_value_unpack_as {
    ($func_name:ident, $atom:path, $return_type:ty) => {
        impl Value {
            /// Reads the value if it is a single primitive of that type.
            pub fn $func_name(&self) -> Option<$return_type> {
                if self.ty.atoms() != [$atom] {
                    return None;
                }
                let bytes = self.bytes.as_slice().try_into().ok()?;
                Some(<$return_type>::from_ne_bytes(bytes))
            }
        }
    };
}

impl_value_unpack_as!(as_i8,    TypeAtom::I8,    i8);
impl_value_unpack_as!(as_i16,   TypeAtom::I16,   i16);
impl_value_unpack_as!(as_i32,   TypeAtom::I32,   i32);
impl_value_unpack_as!(as_i64,   TypeAtom::I64,   i64);
impl_value_unpack_as!(as_isize, TypeAtom::ISize, isize);
impl_value_unpack_as!(as_u8,    TypeAtom::U8,    u8);
impl_value_unpack_as!(as_u16,   TypeAtom::U16,   u16);
impl_value_unpack_as!(as_u32,   TypeAtom::U32,   u32);
impl_value_unpack_as!(as_u64,   TypeAtom::U64,   u64);
impl_value_unpack_as!(as_usize, TypeAtom::USize, usize);
impl_value_unpack_as!(as_f32,   TypeAtom::F32,   f32);
impl_value_unpack_as!(as_f64,   TypeAtom::F64,   f64);

impl Value {
    pub(crate) fn new(ty: Type, bytes: Vec<u8>) -> Self {
        debug_assert_eq!(ty.size() as usize, bytes.len());
        Self { ty, bytes }
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Canonical text of the value. Integers print without a decimal point,
    /// floats always with one. Tuples print as `(a,b)` and arrays as `[a,b]`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        render_at(self.ty.atoms(), 0, &self.bytes, &mut out);
        out
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

macro_rules! read_as {
    ($bytes:expr, $ty:ty) => {{
        const WIDTH: usize = std::mem::size_of::<$ty>();
        let mut buffer = [0u8; WIDTH];
        buffer.copy_from_slice(&$bytes[..WIDTH]);
        <$ty>::from_ne_bytes(buffer)
    }};
}

fn render_float(text: String, is_finite: bool, out: &mut String) {
    out.push_str(&text);
    if is_finite && !text.contains('.') {
        out.push_str(".0");
    }
}

/// Renders the sub-type at `idx` reading from `bytes`. Returns the index
/// following the sub-type and the number of bytes consumed.
fn render_at(atoms: &[TypeAtom], idx: usize, bytes: &[u8], out: &mut String) -> (usize, usize) {
    use TypeAtom::*;
    let size = size_of_subtree(atoms, idx);
    let bytes = &bytes[..size];

    match atoms[idx] {
        Tuple => {
            out.push('(');
            let (mut cur, mut offset) = (idx + 1, 0);
            while atoms[cur] != End {
                if cur != idx + 1 {
                    out.push(',');
                }
                let (next, used) = render_at(atoms, cur, &bytes[offset..], out);
                cur = next;
                offset += used;
            }
            out.push(')');
            (cur + 1, size)
        },
        Array => {
            out.push('[');
            let element_end = subtree_end(atoms, idx + 1);
            let count = match atoms[element_end] {
                Count(count) => count as usize,
                _ => 0,
            };
            let element_size = size_of_subtree(atoms, idx + 1);
            for element in 0..count {
                if element != 0 {
                    out.push(',');
                }
                render_at(atoms, idx + 1, &bytes[element * element_size..], out);
            }
            out.push(']');
            (element_end + 1, size)
        },
        Func => {
            match NativeId::from_bytes(bytes) {
                Some(id) => out.push_str(&id.to_string()),
                None => out.push_str("@fn"),
            }
            (subtree_end(atoms, idx), size)
        },
        atom => {
            match atom {
                I8 => out.push_str(&read_as!(bytes, i8).to_string()),
                I16 => out.push_str(&read_as!(bytes, i16).to_string()),
                I32 => out.push_str(&read_as!(bytes, i32).to_string()),
                I64 => out.push_str(&read_as!(bytes, i64).to_string()),
                ISize => out.push_str(&read_as!(bytes, isize).to_string()),
                U8 => out.push_str(&read_as!(bytes, u8).to_string()),
                U16 => out.push_str(&read_as!(bytes, u16).to_string()),
                U32 => out.push_str(&read_as!(bytes, u32).to_string()),
                U64 => out.push_str(&read_as!(bytes, u64).to_string()),
                USize => out.push_str(&read_as!(bytes, usize).to_string()),
                F32 => {
                    let value = read_as!(bytes, f32);
                    render_float(value.to_string(), value.is_finite(), out);
                },
                F64 => {
                    let value = read_as!(bytes, f64);
                    render_float(value.to_string(), value.is_finite(), out);
                },
                Str => {
                    let (offset, len) = (read_as!(bytes, u32), read_as!(&bytes[4..], u32));
                    out.push_str(&format!("@str({},{})", offset, len));
                },
                _ => out.push('?'),
            }
            (idx + 1, size)
        },
    }
}

fn size_of_subtree(atoms: &[TypeAtom], idx: usize) -> usize {
    crate::lang::types::size_of(&atoms[idx..subtree_end(atoms, idx)]) as usize
}

//------------------------------------------------------------------------------
// Arithmetic on raw bytes
//------------------------------------------------------------------------------

macro_rules! apply_int_op {
    ($op:expr, $ty:ty, $lhs:expr, $rhs:expr) => {{
        let (lhs, rhs) = (read_as!($lhs, $ty), read_as!($rhs, $ty));
        let result = match $op {
            OpCode::Add => lhs.wrapping_add(rhs),
            OpCode::Sub => lhs.wrapping_sub(rhs),
            OpCode::Mul => lhs.wrapping_mul(rhs),
            op => return Err(Error::internal(format!("{:?} is not a binary arithmetic op", op))),
        };
        result.to_ne_bytes().to_vec()
    }};
}

macro_rules! apply_float_op {
    ($op:expr, $ty:ty, $lhs:expr, $rhs:expr) => {{
        let (lhs, rhs) = (read_as!($lhs, $ty), read_as!($rhs, $ty));
        let result = match $op {
            OpCode::Add => lhs + rhs,
            OpCode::Sub => lhs - rhs,
            OpCode::Mul => lhs * rhs,
            op => return Err(Error::internal(format!("{:?} is not a binary arithmetic op", op))),
        };
        result.to_ne_bytes().to_vec()
    }};
}

/// Applies `ADD`, `SUB` or `MUL` to two operands of the primitive `atom`.
/// Integers wrap around.
pub(crate) fn apply_binary_operator(op: OpCode, atom: TypeAtom, lhs: &[u8], rhs: &[u8]) -> Result<Vec<u8>, Error> {
    use TypeAtom::*;
    let result = match atom {
        I8 => apply_int_op!(op, i8, lhs, rhs),
        I16 => apply_int_op!(op, i16, lhs, rhs),
        I32 => apply_int_op!(op, i32, lhs, rhs),
        I64 => apply_int_op!(op, i64, lhs, rhs),
        ISize => apply_int_op!(op, isize, lhs, rhs),
        U8 => apply_int_op!(op, u8, lhs, rhs),
        U16 => apply_int_op!(op, u16, lhs, rhs),
        U32 => apply_int_op!(op, u32, lhs, rhs),
        U64 => apply_int_op!(op, u64, lhs, rhs),
        USize => apply_int_op!(op, usize, lhs, rhs),
        F32 => apply_float_op!(op, f32, lhs, rhs),
        F64 => apply_float_op!(op, f64, lhs, rhs),
        _ => return Err(Error::internal(format!("arithmetic on non-numeric {:?}", atom))),
    };
    Ok(result)
}

pub(crate) fn apply_negate(atom: TypeAtom, value: &[u8]) -> Result<Vec<u8>, Error> {
    use TypeAtom::*;
    let result = match atom {
        I8 => read_as!(value, i8).wrapping_neg().to_ne_bytes().to_vec(),
        I16 => read_as!(value, i16).wrapping_neg().to_ne_bytes().to_vec(),
        I32 => read_as!(value, i32).wrapping_neg().to_ne_bytes().to_vec(),
        I64 => read_as!(value, i64).wrapping_neg().to_ne_bytes().to_vec(),
        ISize => read_as!(value, isize).wrapping_neg().to_ne_bytes().to_vec(),
        U8 => read_as!(value, u8).wrapping_neg().to_ne_bytes().to_vec(),
        U16 => read_as!(value, u16).wrapping_neg().to_ne_bytes().to_vec(),
        U32 => read_as!(value, u32).wrapping_neg().to_ne_bytes().to_vec(),
        U64 => read_as!(value, u64).wrapping_neg().to_ne_bytes().to_vec(),
        USize => read_as!(value, usize).wrapping_neg().to_ne_bytes().to_vec(),
        F32 => (-read_as!(value, f32)).to_ne_bytes().to_vec(),
        F64 => (-read_as!(value, f64)).to_ne_bytes().to_vec(),
        _ => return Err(Error::internal(format!("negating non-numeric {:?}", atom))),
    };
    Ok(result)
}
