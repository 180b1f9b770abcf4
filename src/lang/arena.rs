use core::hash::Hash;
use core::marker::PhantomData;

/// Index into an `Arena<T>`. Copyable regardless of `T`.
#[derive(Debug)]
pub struct Id<T> {
    index: u32,
    _phantom: PhantomData<T>,
}
impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for Id<T> {}
impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index.eq(&other.index)
    }
}
impl<T> Eq for Id<T> {}
impl<T> Hash for Id<T> {
    fn hash<H: std::hash::Hasher>(&self, h: &mut H) {
        self.index.hash(h);
    }
}

/// Growable storage handing out stable ids. Elements are only ever removed
/// from the back, so outstanding ids to other elements stay valid.
#[derive(Debug)]
pub struct Arena<T> {
    store: Vec<T>,
}
impl<T> Arena<T> {
    pub fn new() -> Self {
        Self { store: vec![] }
    }
    pub fn alloc_with_id(&mut self, f: impl FnOnce(Id<T>) -> T) -> Id<T> {
        let id = Id {
            index: self.store.len() as u32,
            _phantom: Default::default(),
        };
        self.store.push(f(id));
        id
    }
    /// Removes the most recently allocated element.
    pub fn pop(&mut self) -> Option<(Id<T>, T)> {
        let value = self.store.pop()?;
        let id = Id { index: self.store.len() as u32, _phantom: Default::default() };
        Some((id, value))
    }
    pub fn len(&self) -> usize {
        self.store.len()
    }
}
impl<T> core::ops::Index<Id<T>> for Arena<T> {
    type Output = T;
    fn index(&self, id: Id<T>) -> &Self::Output {
        self.store.index(id.index as usize)
    }
}
impl<T> core::ops::IndexMut<Id<T>> for Arena<T> {
    fn index_mut(&mut self, id: Id<T>) -> &mut Self::Output {
        self.store.index_mut(id.index as usize)
    }
}
