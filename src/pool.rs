//! Fixed-capacity resource pools
//!
//! - `BoundedPool<T>`: append-only arena with typed index handles
//! - `IdPool<T>`: pre-allocated ids handed out in order, never recycled
//! - `TextureRegistry<Id>`: named textures backed by both of the above

use std::fmt;
use std::marker::PhantomData;

use log::{debug, error};

use crate::error::GleshError;

/// Index handle into a `BoundedPool<T>`
pub struct Handle<T> {
    index: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    fn new(index: usize) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

// Manual impls: derive would require T: Clone/Eq
impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Handle<T> {}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.index)
    }
}

/// Append-only pool with a hard capacity.
///
/// Storage is reserved up front and never grows past `capacity`, so handles
/// stay valid until `clear()`.
#[derive(Debug)]
pub struct BoundedPool<T> {
    items: Vec<T>,
    capacity: usize,
    label: &'static str,
}

impl<T> BoundedPool<T> {
    /// `label` names the pool in error messages ("objects", "textures")
    pub fn new(label: &'static str, capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
            label,
        }
    }

    pub fn push(&mut self, item: T) -> Result<Handle<T>, GleshError> {
        if self.items.len() >= self.capacity {
            error!("Maximum number of {} reached ({})", self.label, self.capacity);
            return Err(GleshError::PoolFull {
                pool: self.label,
                capacity: self.capacity,
            });
        }
        self.items.push(item);
        Ok(Handle::new(self.items.len() - 1))
    }

    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.items.get(handle.index)
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.items.get_mut(handle.index)
    }

    /// First handle whose item satisfies `pred`
    pub fn position<P>(&self, mut pred: P) -> Option<Handle<T>>
    where
        P: FnMut(&T) -> bool,
    {
        self.items.iter().position(|item| pred(item)).map(Handle::new)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every item, most recent first
    pub fn clear(&mut self) {
        while self.items.pop().is_some() {}
    }
}

/// Pre-allocated ids consumed front to back.
#[derive(Debug)]
pub struct IdPool<T> {
    ids: Vec<T>,
    next: usize,
}

impl<T> Default for IdPool<T> {
    fn default() -> Self {
        Self {
            ids: Vec::new(),
            next: 0,
        }
    }
}

impl<T: Copy> IdPool<T> {
    pub fn new(ids: Vec<T>) -> Self {
        Self { ids, next: 0 }
    }

    /// Next unused id, or `None` once the pool is exhausted
    pub fn next_id(&mut self) -> Option<T> {
        let id = self.ids.get(self.next).copied()?;
        self.next += 1;
        Some(id)
    }

    /// Every id in the pool, used or not (for release)
    pub fn all(&self) -> &[T] {
        &self.ids
    }

    pub fn remaining(&self) -> usize {
        self.ids.len() - self.next
    }

    /// Forget every id; the caller releases them first
    pub fn reset(&mut self) {
        self.ids.clear();
        self.next = 0;
    }
}

/// Pooled texture description
#[derive(Debug, Clone, PartialEq)]
pub struct Texture<Id> {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub id: Id,
}

/// Named textures with first-match substring lookup.
///
/// A pooled texture matches a request when its name contains the requested
/// name. An empty request therefore matches the first texture. Callers keep
/// their names unambiguous.
#[derive(Debug)]
pub struct TextureRegistry<Id> {
    textures: BoundedPool<Texture<Id>>,
    ids: IdPool<Id>,
}

impl<Id: Copy> TextureRegistry<Id> {
    pub fn new(capacity: usize, ids: Vec<Id>) -> Self {
        Self {
            textures: BoundedPool::new("textures", capacity),
            ids: IdPool::new(ids),
        }
    }

    pub fn find(&self, name: &str) -> Option<Handle<Texture<Id>>> {
        self.textures.position(|tex| tex.name.contains(name))
    }

    pub fn get(&self, handle: Handle<Texture<Id>>) -> Option<&Texture<Id>> {
        self.textures.get(handle)
    }

    /// Return the texture called `name`, creating it when absent.
    ///
    /// `upload` receives the freshly drawn id and runs only for new names.
    pub fn get_or_create<F>(
        &mut self,
        name: &str,
        width: u32,
        height: u32,
        upload: F,
    ) -> Result<Handle<Texture<Id>>, GleshError>
    where
        F: FnOnce(Id) -> Result<(), GleshError>,
    {
        if let Some(handle) = self.find(name) {
            debug!("Texture '{}' already exists, reusing", name);
            return Ok(handle);
        }

        if self.textures.is_full() {
            error!(
                "Maximum number of textures reached ({})",
                self.textures.capacity()
            );
            return Err(GleshError::PoolFull {
                pool: "textures",
                capacity: self.textures.capacity(),
            });
        }

        let id = self.ids.next_id().ok_or(GleshError::TextureIdsExhausted)?;
        upload(id)?;

        self.textures.push(Texture {
            name: name.to_string(),
            width,
            height,
            id,
        })
    }

    /// Next id from the pool without creating a texture entry
    pub fn take_id(&mut self) -> Option<Id> {
        self.ids.next_id()
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Texture<Id>> {
        self.textures.iter()
    }

    /// Ids to release on teardown (every pre-allocated id)
    pub fn all_ids(&self) -> &[Id] {
        self.ids.all()
    }

    /// Forget all textures and ids
    pub fn clear(&mut self) {
        self.textures.clear();
        self.ids.reset();
    }
}
