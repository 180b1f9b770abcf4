/// scope.rs
///
/// Lexical scopes of a program under analysis. Every block opens a child
/// scope; names resolve against the innermost scope first and then walk up
/// the parent links. A name may be bound several times in one scope as long
/// as the types differ, which is how overloaded natives are represented.

use crate::common::*;
use super::arena::{Arena, Id};
use super::instr::Immediate;
use super::library::{Library, NativeId};
use super::literals::{FrameAllocator, LiteralPool};
use super::source::InputPosition;

pub type ScopeId = Id<Scope>;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Immediate(Immediate),
    Pool(u32),
    Native(NativeId),
}

/// Where the value bound to a name lives.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueRef {
    Literal { ty: Type, literal: Literal },
    Stack { ty: Type, offset: u32 },
}

impl ValueRef {
    pub fn ty(&self) -> &Type {
        match self {
            ValueRef::Literal { ty, .. } => ty,
            ValueRef::Stack { ty, .. } => ty,
        }
    }
}

#[derive(Debug)]
pub struct Scope {
    pub this: ScopeId,
    pub parent: Option<ScopeId>,
    bindings: HashMap<String, Vec<ValueRef>>,
    frame: FrameAllocator,
}

impl Scope {
    pub fn bindings(&self, name: &str) -> &[ValueRef] {
        self.bindings.get(name).map_or(&[], |b| b.as_slice())
    }
}

#[derive(Debug)]
pub struct ScopeChain {
    scopes: Arena<Scope>,
    current: ScopeId,
    frame_size: u32,
}

impl ScopeChain {
    /// A chain consisting of an empty root scope.
    pub fn new() -> Self {
        let mut scopes = Arena::new();
        let current = scopes.alloc_with_id(|this| Scope {
            this,
            parent: None,
            bindings: HashMap::new(),
            frame: FrameAllocator::default(),
        });
        Self { scopes, current, frame_size: 0 }
    }

    /// A chain whose root scope holds everything the library provides.
    /// Constants are copied into the literal pool.
    pub fn with_library(library: &Library, literals: &mut LiteralPool) -> Result<Self, Error> {
        let mut chain = Self::new();
        let position = InputPosition::default();
        for (id, native) in library.natives() {
            chain.declare(&native.name, ValueRef::Literal {
                ty: native.ty.clone(),
                literal: Literal::Native(id),
            }, position)?;
        }
        for constant in library.constants() {
            let offset = literals.push_typed(&constant.ty, &constant.bytes)?;
            chain.declare(&constant.name, ValueRef::Literal {
                ty: constant.ty.clone(),
                literal: Literal::Pool(offset),
            }, position)?;
        }
        Ok(chain)
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Binds `name` in the current scope. Fails if the scope already binds
    /// the name with an identical type.
    pub fn declare(&mut self, name: &str, value: ValueRef, position: InputPosition) -> Result<(), Error> {
        let scope = &mut self.scopes[self.current];
        let overloads = scope.bindings.entry(name.to_string()).or_insert_with(Vec::new);
        if let Some(existing) = overloads.iter().find(|v| v.ty() == value.ty()) {
            return Err(Error::new_at(
                ErrorKind::DuplicateBinding, position,
                format!("'{}' is already bound with type {} in this scope", name, existing.ty()),
            ));
        }
        overloads.push(value);
        Ok(())
    }

    /// First binding of `name`, searching outwards from the current scope.
    pub fn lookup(&self, name: &str) -> Option<&ValueRef> {
        let mut scope_id = Some(self.current);
        while let Some(id) = scope_id {
            let scope = &self.scopes[id];
            if let Some(value) = scope.bindings(name).first() {
                return Some(value);
            }
            scope_id = scope.parent;
        }
        None
    }

    /// First binding of `name` whose type is matched by `pattern`. Inner
    /// scopes are searched completely before their parents.
    pub fn lookup_matching(&self, name: &str, pattern: &Type) -> Option<&ValueRef> {
        let mut scope_id = Some(self.current);
        while let Some(id) = scope_id {
            let scope = &self.scopes[id];
            if let Some(value) = scope.bindings(name).iter().find(|v| pattern.matches(v.ty())) {
                return Some(value);
            }
            scope_id = scope.parent;
        }
        None
    }

    pub fn enter(&mut self) -> ScopeId {
        let parent = self.current;
        let start = self.scopes[parent].frame.offset();
        self.current = self.scopes.alloc_with_id(|this| Scope {
            this,
            parent: Some(parent),
            bindings: HashMap::new(),
            frame: FrameAllocator::starting_at(start),
        });
        self.current
    }

    /// Drops the current scope and returns to its parent.
    pub fn leave(&mut self) -> Result<(), Error> {
        let parent = match self.scopes[self.current].parent {
            Some(parent) => parent,
            None => return Err(Error::internal("leaving the root scope")),
        };
        match self.scopes.pop() {
            Some((_, scope)) if scope.this == self.current => {},
            _ => return Err(Error::internal("scopes left out of order")),
        }
        self.current = parent;
        Ok(())
    }

    /// Reserves `size` bytes of frame storage in the current scope.
    pub fn allocate(&mut self, size: u32) -> u32 {
        let frame = &mut self.scopes[self.current].frame;
        let offset = frame.allocate(size);
        self.frame_size = self.frame_size.max(frame.offset());
        offset
    }

    /// Largest number of frame bytes in use at any point so far.
    pub fn frame_size(&self) -> u32 {
        self.frame_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack(atom: TypeAtom, offset: u32) -> ValueRef {
        ValueRef::Stack { ty: Type::from(atom), offset }
    }

    #[test]
    fn test_shadowing_and_parent_lookup() {
        let pos = InputPosition::default();
        let mut chain = ScopeChain::new();
        chain.declare("a", stack(TypeAtom::I32, 0), pos).unwrap();
        chain.declare("b", stack(TypeAtom::I32, 4), pos).unwrap();

        chain.enter();
        chain.declare("a", stack(TypeAtom::F64, 8), pos).unwrap();
        assert_eq!(chain.lookup("a"), Some(&stack(TypeAtom::F64, 8)));
        assert_eq!(chain.lookup("b"), Some(&stack(TypeAtom::I32, 4)));
        assert_eq!(chain.lookup("c"), None);

        chain.leave().unwrap();
        assert_eq!(chain.lookup("a"), Some(&stack(TypeAtom::I32, 0)));
        assert!(chain.leave().unwrap_err().is_internal());
    }

    #[test]
    fn test_duplicate_binding() {
        let pos = InputPosition::default();
        let mut chain = ScopeChain::new();
        chain.declare("a", stack(TypeAtom::I32, 0), pos).unwrap();
        let err = chain.declare("a", stack(TypeAtom::I32, 4), pos).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateBinding);

        // Another type is an overload, a nested scope may shadow
        chain.declare("a", stack(TypeAtom::F32, 4), pos).unwrap();
        chain.enter();
        chain.declare("a", stack(TypeAtom::I32, 8), pos).unwrap();
    }

    #[test]
    fn test_lookup_matching() {
        let pos = InputPosition::default();
        let i32_type = Type::from(TypeAtom::I32);
        let f64_type = Type::from(TypeAtom::F64);
        let func = |ret: &Type, arg: &Type| ValueRef::Stack { ty: Type::func(ret, arg), offset: 0 };

        let mut chain = ScopeChain::new();
        chain.declare("f", func(&i32_type, &i32_type), pos).unwrap();
        chain.declare("f", func(&f64_type, &f64_type), pos).unwrap();
        chain.enter();
        chain.declare("f", func(&i32_type, &f64_type), pos).unwrap();

        let wants_f64 = Type::func(&Type::undecided(), &f64_type);
        let wants_i32 = Type::func(&Type::undecided(), &i32_type);
        let wants_u8 = Type::func(&Type::undecided(), &Type::from(TypeAtom::U8));

        // The inner scope wins when it has a match
        assert_eq!(chain.lookup_matching("f", &wants_f64), Some(&func(&i32_type, &f64_type)));
        assert_eq!(chain.lookup_matching("f", &wants_i32), Some(&func(&i32_type, &i32_type)));
        assert_eq!(chain.lookup_matching("f", &wants_u8), None);
    }

    #[test]
    fn test_frame_high_water_mark() {
        let mut chain = ScopeChain::new();
        assert_eq!(chain.allocate(4), 0);

        chain.enter();
        assert_eq!(chain.allocate(8), 4);
        chain.leave().unwrap();

        chain.enter();
        assert_eq!(chain.allocate(2), 4);
        chain.leave().unwrap();

        assert_eq!(chain.allocate(4), 4);
        assert_eq!(chain.frame_size(), 12);
    }

    #[test]
    fn test_root_scope_from_library() {
        let mut literals = LiteralPool::new();
        let chain = ScopeChain::with_library(Library::standard(), &mut literals).unwrap();
        match chain.lookup("pi") {
            Some(ValueRef::Literal { ty, literal: Literal::Pool(offset) }) => {
                assert_eq!(ty.to_string(), "@f64");
                assert_eq!(literals.read(*offset, 8), Some(&std::f64::consts::PI.to_ne_bytes()[..]));
            },
            other => panic!("unexpected binding for pi: {:?}", other),
        }
        let pattern = Type::func(&Type::undecided(), &Type::from(TypeAtom::F64));
        match chain.lookup_matching("sqrt", &pattern) {
            Some(ValueRef::Literal { literal: Literal::Native(_), .. }) => {},
            other => panic!("unexpected binding for sqrt: {:?}", other),
        }
    }
}
