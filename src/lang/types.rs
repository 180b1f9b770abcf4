/// types.rs
///
/// A type is a depth-first serialized tree of `TypeAtom`s. Composite atoms
/// open a region: tuples and functions are closed by a matching `End`, arrays
/// by their trailing element count. Everything that needs structure (sizes,
/// sub-types, matching, display) walks the flat sequence with a small
/// recursive-descent reader.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::common::POINTER_WIDTH;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeAtom {
    // Wildcard used in lookup patterns, never the type of a value
    Undecided,
    // Primitives
    I8,
    I16,
    I32,
    I64,
    ISize,
    U8,
    U16,
    U32,
    U64,
    USize,
    F32,
    F64,
    Str,
    // Structural markers
    Tuple,
    Array,
    Func,
    End,
    // Element count terminating an array
    Count(u32),
}

impl TypeAtom {
    pub fn is_integer(&self) -> bool {
        self.is_signed_integer() || self.is_unsigned_integer()
    }

    pub fn is_signed_integer(&self) -> bool {
        use TypeAtom::*;
        match self {
            I8 | I16 | I32 | I64 | ISize => true,
            _ => false,
        }
    }

    pub fn is_unsigned_integer(&self) -> bool {
        use TypeAtom::*;
        match self {
            U8 | U16 | U32 | U64 | USize => true,
            _ => false,
        }
    }

    pub fn is_float(&self) -> bool {
        match self {
            TypeAtom::F32 | TypeAtom::F64 => true,
            _ => false,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    fn is_primitive(&self) -> bool {
        use TypeAtom::*;
        match self {
            Tuple | Array | Func | End | Count(_) => false,
            _ => true,
        }
    }

    /// Byte width of a primitive atom. The string handle is a literal pool
    /// offset followed by a byte length.
    fn primitive_size(&self) -> u32 {
        use TypeAtom::*;
        match self {
            Undecided => 0,
            I8 | U8 => 1,
            I16 | U16 => 2,
            I32 | U32 | F32 => 4,
            I64 | U64 | F64 => 8,
            ISize | USize => std::mem::size_of::<usize>() as u32,
            Str => 8,
            Tuple | Array | Func | End | Count(_) => {
                unreachable!("primitive size of structural atom {:?}", self)
            }
        }
    }

    fn token(&self) -> &'static str {
        use TypeAtom::*;
        match self {
            Undecided => "@?",
            I8 => "@i8",
            I16 => "@i16",
            I32 => "@i32",
            I64 => "@i64",
            ISize => "@isize",
            U8 => "@u8",
            U16 => "@u16",
            U32 => "@u32",
            U64 => "@u64",
            USize => "@usize",
            F32 => "@f32",
            F64 => "@f64",
            Str => "@str",
            Tuple | Array | Func | End | Count(_) => {
                unreachable!("token of structural atom {:?}", self)
            }
        }
    }
}

/// Name, sub-type index and byte offset of one tuple element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub index: usize,
    pub offset: u32,
}

/// A value type. Equality and hashing only look at the atoms: the member
/// table is derived bookkeeping and `closed` only steers `build_tuple`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Type {
    atoms: Vec<TypeAtom>,
    members: Vec<Member>,
    closed: bool,
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        self.atoms == other.atoms
    }
}
impl Eq for Type {}
impl std::hash::Hash for Type {
    fn hash<H: std::hash::Hasher>(&self, h: &mut H) {
        self.atoms.hash(h);
    }
}

impl From<TypeAtom> for Type {
    fn from(atom: TypeAtom) -> Self {
        debug_assert!(atom.is_primitive(), "{:?} is not a primitive", atom);
        Self { atoms: vec![atom], members: Vec::new(), closed: true }
    }
}

impl Type {
    /// Builds a type from a well-formed atom sequence. Tuples get their
    /// member table indexed and are considered closed.
    pub fn from_atoms(atoms: Vec<TypeAtom>) -> Self {
        debug_assert!(!atoms.is_empty());
        debug_assert_eq!(subtree_end(&atoms, 0), atoms.len(), "malformed type {:?}", atoms);
        let members = if atoms[0] == TypeAtom::Tuple { index_members(&atoms) } else { Vec::new() };
        Self { atoms, members, closed: true }
    }

    pub fn undecided() -> Self {
        Self::from(TypeAtom::Undecided)
    }

    /// A closed tuple of the given element types.
    pub fn tuple(elements: &[Type]) -> Self {
        debug_assert!(!elements.is_empty());
        let mut atoms = vec![TypeAtom::Tuple];
        for element in elements {
            atoms.extend_from_slice(&element.atoms);
        }
        atoms.push(TypeAtom::End);
        Self::from_atoms(atoms)
    }

    pub fn array(element: &Type, count: u32) -> Self {
        let mut atoms = Vec::with_capacity(element.atoms.len() + 2);
        atoms.push(TypeAtom::Array);
        atoms.extend_from_slice(&element.atoms);
        atoms.push(TypeAtom::Count(count));
        Self::from_atoms(atoms)
    }

    pub fn func(ret: &Type, arg: &Type) -> Self {
        let mut atoms = Vec::with_capacity(ret.atoms.len() + arg.atoms.len() + 2);
        atoms.push(TypeAtom::Func);
        atoms.extend_from_slice(&ret.atoms);
        atoms.extend_from_slice(&arg.atoms);
        atoms.push(TypeAtom::End);
        Self::from_atoms(atoms)
    }

    /// Checks a type that did not come out of the constructors, such as one
    /// read from bytecode. Only well-formed types may be sized or displayed.
    pub fn is_well_formed(&self) -> bool {
        if checked_end(&self.atoms, 0) != Some(self.atoms.len()) {
            return false;
        }
        if self.is_tuple() {
            self.members == index_members(&self.atoms)
        } else {
            self.members.is_empty()
        }
    }

    /// Skips every check, so tests can build what a corrupt stream holds.
    #[cfg(test)]
    pub(crate) fn unchecked(atoms: Vec<TypeAtom>) -> Self {
        Self { atoms, members: Vec::new(), closed: true }
    }

    pub fn atoms(&self) -> &[TypeAtom] {
        &self.atoms
    }

    pub fn first_atom(&self) -> TypeAtom {
        self.atoms[0]
    }

    pub fn size(&self) -> u32 {
        size_of(&self.atoms)
    }

    /// Natural alignment: the widest primitive contained in the type.
    pub fn alignment(&self) -> u32 {
        self.atoms.iter().fold(1, |align, atom| match atom {
            TypeAtom::Func => align.max(POINTER_WIDTH),
            TypeAtom::Str => align.max(4),
            TypeAtom::Undecided | TypeAtom::Tuple | TypeAtom::Array |
            TypeAtom::End | TypeAtom::Count(_) => align,
            atom => align.max(atom.primitive_size()),
        })
    }

    pub fn is_tuple(&self) -> bool {
        self.first_atom() == TypeAtom::Tuple
    }

    pub fn is_func(&self) -> bool {
        self.first_atom() == TypeAtom::Func
    }

    /// A single numeric primitive, the only kind arithmetic accepts.
    pub fn is_numeric(&self) -> bool {
        self.atoms.len() == 1 && self.atoms[0].is_numeric()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Marks a tuple as complete, so that a following `build_tuple` nests it
    /// instead of extending it.
    pub fn close(mut self) -> Self {
        self.closed = true;
        self
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.name == name)
    }

    /// Element types of a tuple, in order.
    pub fn tuple_elements(&self) -> Vec<Type> {
        self.members.iter().map(|m| inner_type(&self.atoms, m.index)).collect()
    }

    pub fn func_return(&self) -> Option<Type> {
        if !self.is_func() {
            return None;
        }
        Some(inner_type(&self.atoms, 1))
    }

    pub fn func_argument(&self) -> Option<Type> {
        if !self.is_func() {
            return None;
        }
        Some(inner_type(&self.atoms, subtree_end(&self.atoms, 1)))
    }

    /// Checks whether `self`, used as a pattern, matches `candidate`.
    pub fn matches(&self, candidate: &Type) -> bool {
        matches(&self.atoms, &candidate.atoms)
    }

    pub fn tree(&self) -> TypeTree {
        build_tree(&self.atoms, 0).0
    }
}

/// Returns the exclusive end index of the sub-type starting at `idx`.
pub fn subtree_end(atoms: &[TypeAtom], idx: usize) -> usize {
    match atoms[idx] {
        TypeAtom::Tuple | TypeAtom::Func => {
            let mut cur = idx + 1;
            while atoms[cur] != TypeAtom::End {
                cur = subtree_end(atoms, cur);
            }
            cur + 1
        },
        TypeAtom::Array => {
            let end = subtree_end(atoms, idx + 1);
            debug_assert!(matches!(atoms[end], TypeAtom::Count(_)), "array without element count");
            end + 1
        },
        _ => idx + 1,
    }
}

/// Fallible `subtree_end` for atoms of unknown origin. Returns `None` when
/// the sub-type at `idx` is truncated or misplaces a terminator.
fn checked_end(atoms: &[TypeAtom], idx: usize) -> Option<usize> {
    match atoms.get(idx)? {
        TypeAtom::Tuple => {
            let mut cur = idx + 1;
            while *atoms.get(cur)? != TypeAtom::End {
                cur = checked_end(atoms, cur)?;
            }
            Some(cur + 1)
        },
        TypeAtom::Func => {
            let arg = checked_end(atoms, idx + 1)?;
            let end = checked_end(atoms, arg)?;
            if *atoms.get(end)? == TypeAtom::End { Some(end + 1) } else { None }
        },
        TypeAtom::Array => {
            let end = checked_end(atoms, idx + 1)?;
            match atoms.get(end)? {
                TypeAtom::Count(_) => Some(end + 1),
                _ => None,
            }
        },
        TypeAtom::End | TypeAtom::Count(_) => None,
        _ => Some(idx + 1),
    }
}

/// Extracts the nested type starting at `index`, including its terminator.
pub fn inner_type(atoms: &[TypeAtom], index: usize) -> Type {
    Type::from_atoms(atoms[index..subtree_end(atoms, index)].to_vec())
}

pub fn size_of(atoms: &[TypeAtom]) -> u32 {
    size_at(atoms, 0).0
}

fn size_at(atoms: &[TypeAtom], idx: usize) -> (u32, usize) {
    match atoms[idx] {
        TypeAtom::Tuple => {
            let mut cur = idx + 1;
            let mut total = 0;
            while atoms[cur] != TypeAtom::End {
                let (size, end) = size_at(atoms, cur);
                total += size;
                cur = end;
            }
            (total, cur + 1)
        },
        TypeAtom::Func => (POINTER_WIDTH, subtree_end(atoms, idx)),
        TypeAtom::Array => {
            let (element, end) = size_at(atoms, idx + 1);
            match atoms[end] {
                TypeAtom::Count(count) => (element * count, end + 1),
                _ => unreachable!("array without element count"),
            }
        },
        atom => (atom.primitive_size(), idx + 1),
    }
}

pub fn matches(pattern: &[TypeAtom], candidate: &[TypeAtom]) -> bool {
    if pattern.is_empty() || candidate.is_empty() {
        return pattern.is_empty() && candidate.is_empty();
    }
    match_at(pattern, 0, candidate, 0) == Some((pattern.len(), candidate.len()))
}

/// Matches the sub-type at `p` against the one at `c`. Returns the end
/// indices of both on success. `Undecided` swallows a complete candidate
/// sub-type.
fn match_at(pattern: &[TypeAtom], p: usize, candidate: &[TypeAtom], c: usize) -> Option<(usize, usize)> {
    if pattern[p] == TypeAtom::Undecided {
        return Some((p + 1, subtree_end(candidate, c)));
    }
    if pattern[p] != candidate[c] {
        return None;
    }

    match pattern[p] {
        TypeAtom::Tuple | TypeAtom::Func => {
            let (mut p, mut c) = (p + 1, c + 1);
            loop {
                match (pattern[p], candidate[c]) {
                    (TypeAtom::End, TypeAtom::End) => return Some((p + 1, c + 1)),
                    (TypeAtom::End, _) | (_, TypeAtom::End) => return None,
                    _ => {
                        let (next_p, next_c) = match_at(pattern, p, candidate, c)?;
                        p = next_p;
                        c = next_c;
                    },
                }
            }
        },
        TypeAtom::Array => {
            let (p, c) = match_at(pattern, p + 1, candidate, c + 1)?;
            if pattern[p] == candidate[c] { Some((p + 1, c + 1)) } else { None }
        },
        _ => Some((p + 1, c + 1)),
    }
}

fn index_members(atoms: &[TypeAtom]) -> Vec<Member> {
    let mut members = Vec::new();
    let mut cur = 1;
    let mut offset = 0;
    while atoms[cur] != TypeAtom::End {
        let end = subtree_end(atoms, cur);
        members.push(Member { name: format!("_{}", members.len() + 1), index: cur, offset });
        offset += size_of(&atoms[cur..end]);
        cur = end;
    }
    members
}

/// Concatenates two values into a tuple. An open tuple on the left is
/// extended, anything else on the left becomes the first element of a new
/// tuple. The right operand is always appended as a single element.
pub fn build_tuple(left: &Type, right: &Type) -> Type {
    let (mut atoms, mut members) = if left.is_tuple() && !left.closed {
        let mut atoms = left.atoms.clone();
        atoms.pop();
        (atoms, left.members.clone())
    } else {
        let mut atoms = Vec::with_capacity(left.atoms.len() + right.atoms.len() + 2);
        atoms.push(TypeAtom::Tuple);
        atoms.extend_from_slice(&left.atoms);
        (atoms, vec![Member { name: "_1".to_string(), index: 1, offset: 0 }])
    };

    members.push(Member {
        name: format!("_{}", members.len() + 1),
        index: atoms.len(),
        offset: left.size(),
    });
    atoms.extend_from_slice(&right.atoms);
    atoms.push(TypeAtom::End);

    Type { atoms, members, closed: false }
}

//------------------------------------------------------------------------------
// Tree view
//------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeTree {
    Primitive(TypeAtom),
    Tuple(Vec<TypeTree>),
    Array(Box<TypeTree>, u32),
    Func { ret: Box<TypeTree>, arg: Box<TypeTree> },
}

fn build_tree(atoms: &[TypeAtom], idx: usize) -> (TypeTree, usize) {
    match atoms[idx] {
        TypeAtom::Tuple => {
            let mut elements = Vec::new();
            let mut cur = idx + 1;
            while atoms[cur] != TypeAtom::End {
                let (element, end) = build_tree(atoms, cur);
                elements.push(element);
                cur = end;
            }
            (TypeTree::Tuple(elements), cur + 1)
        },
        TypeAtom::Func => {
            let (ret, arg_idx) = build_tree(atoms, idx + 1);
            let (arg, end_idx) = build_tree(atoms, arg_idx);
            debug_assert_eq!(atoms[end_idx], TypeAtom::End);
            (TypeTree::Func { ret: Box::new(ret), arg: Box::new(arg) }, end_idx + 1)
        },
        TypeAtom::Array => {
            let (element, end) = build_tree(atoms, idx + 1);
            match atoms[end] {
                TypeAtom::Count(count) => (TypeTree::Array(Box::new(element), count), end + 1),
                _ => unreachable!("array without element count"),
            }
        },
        atom => (TypeTree::Primitive(atom), idx + 1),
    }
}

//------------------------------------------------------------------------------
// Display
//------------------------------------------------------------------------------

fn write_type(f: &mut fmt::Formatter<'_>, atoms: &[TypeAtom], idx: usize) -> Result<usize, fmt::Error> {
    match atoms[idx] {
        TypeAtom::Tuple => {
            f.write_str("(")?;
            let mut cur = idx + 1;
            while atoms[cur] != TypeAtom::End {
                if cur != idx + 1 {
                    f.write_str(",")?;
                }
                cur = write_type(f, atoms, cur)?;
            }
            f.write_str(")")?;
            Ok(cur + 1)
        },
        TypeAtom::Array => {
            f.write_str("@array(")?;
            let end = write_type(f, atoms, idx + 1)?;
            match atoms[end] {
                TypeAtom::Count(count) => write!(f, ",{})", count)?,
                _ => unreachable!("array without element count"),
            }
            Ok(end + 1)
        },
        TypeAtom::Func => {
            let arg_idx = subtree_end(atoms, idx + 1);
            f.write_str("@fn(")?;
            let end = write_type(f, atoms, arg_idx)?;
            f.write_str("->")?;
            write_type(f, atoms, idx + 1)?;
            f.write_str(")")?;
            Ok(end + 1)
        },
        atom => {
            f.write_str(atom.token())?;
            Ok(idx + 1)
        },
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_type(f, &self.atoms, 0).map(|_| ())
    }
}
