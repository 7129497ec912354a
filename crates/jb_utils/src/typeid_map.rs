use core::any::TypeId;
use core::fmt::Debug;
use core::hash::{BuildHasher, Hasher};

use hashbrown::HashMap;
use hashbrown::hash_map::Entry;

// -----------------------------------------------------------------------------
// TypeIdHasher

/// `TypeId` is already a high quality hash, so it is passed through as is.
#[derive(Copy, Clone, Default, Debug)]
struct TypeIdHasher {
    hash: u64,
}

impl Hasher for TypeIdHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.hash
    }

    fn write(&mut self, bytes: &[u8]) {
        for byte in bytes.iter().rev() {
            self.hash = self.hash.rotate_left(8).wrapping_add(*byte as u64);
        }
    }

    #[inline]
    fn write_u64(&mut self, i: u64) {
        self.hash = i;
    }
}

#[derive(Copy, Clone, Default, Debug)]
struct TypeIdState;

impl BuildHasher for TypeIdState {
    type Hasher = TypeIdHasher;

    #[inline(always)]
    fn build_hasher(&self) -> Self::Hasher {
        TypeIdHasher { hash: 0 }
    }
}

// -----------------------------------------------------------------------------
// TypeIdMap

/// A map container with [`TypeId`] as the fixed key type.
///
/// Used wherever the binding engine indexes metadata by Rust type:
/// converter tables and cached class models.
///
/// # Examples
///
/// ```
/// use jb_utils::TypeIdMap;
///
/// let mut map = TypeIdMap::new();
/// map.insert_type::<String>("text");
/// assert_eq!(map.get_type::<String>(), Some(&"text"));
/// assert!(map.get_type::<i32>().is_none());
/// ```
pub struct TypeIdMap<V>(HashMap<TypeId, V, TypeIdState>);

impl<V> TypeIdMap<V> {
    /// Creates an empty `TypeIdMap`.
    #[inline]
    pub const fn new() -> Self {
        Self(HashMap::with_hasher(TypeIdState))
    }

    /// Creates an empty `TypeIdMap` with the specified capacity.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self(HashMap::with_capacity_and_hasher(capacity, TypeIdState))
    }

    /// Attempts to insert a value, calling `f` only if the key is absent.
    ///
    /// Returns `true` if the value was inserted.
    #[inline]
    pub fn try_insert(&mut self, type_id: TypeId, f: impl FnOnce() -> V) -> bool {
        match self.0.entry(type_id) {
            Entry::Vacant(entry) => {
                entry.insert(f());
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// Returns a reference to the value corresponding to the key.
    #[inline]
    pub fn get(&self, type_id: &TypeId) -> Option<&V> {
        self.0.get(type_id)
    }

    /// Returns a reference to the value corresponding to the type.
    #[inline(always)]
    pub fn get_type<T: ?Sized + 'static>(&self) -> Option<&V> {
        self.get(&TypeId::of::<T>())
    }

    /// Inserts a key-value pair, returning the replaced value if any.
    #[inline]
    pub fn insert(&mut self, type_id: TypeId, v: V) -> Option<V> {
        self.0.insert(type_id, v)
    }

    /// Inserts a value for the type, returning the replaced value if any.
    #[inline(always)]
    pub fn insert_type<T: ?Sized + 'static>(&mut self, v: V) -> Option<V> {
        self.insert(TypeId::of::<T>(), v)
    }

    /// Removes a key from the map.
    #[inline]
    pub fn remove(&mut self, type_id: &TypeId) -> Option<V> {
        self.0.remove(type_id)
    }

    /// Returns `true` if the map contains a value for the key.
    #[inline]
    pub fn contains(&self, type_id: &TypeId) -> bool {
        self.0.contains_key(type_id)
    }

    /// Returns `true` if the map contains a value for the type.
    #[inline(always)]
    pub fn contains_type<T: ?Sized + 'static>(&self) -> bool {
        self.contains(&TypeId::of::<T>())
    }

    /// Returns the number of elements in the map.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the map contains no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Clears the map, keeping the allocated memory.
    #[inline]
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// An iterator visiting all values in arbitrary order.
    #[inline]
    pub fn values(&self) -> impl ExactSizeIterator<Item = &V> {
        self.0.values()
    }
}

// -----------------------------------------------------------------------------
// Traits

impl<V> Default for TypeIdMap<V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> Clone for TypeIdMap<V> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<V: Debug> Debug for TypeIdMap<V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        Debug::fmt(&self.0, f)
    }
}
