use core::any::{Any, TypeId};
use core::fmt;
use core::hash::{Hash, Hasher};

// -----------------------------------------------------------------------------
// Type

/// The identity of a Rust type: its [`TypeId`] plus a readable path.
///
/// Equality and hashing only consider the [`TypeId`].
#[derive(Clone, Copy)]
pub struct Type {
    id: TypeId,
    path: &'static str,
}

impl Type {
    /// Creates the [`Type`] of `T`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use core::any::TypeId;
    /// # use jb_bind::info::Type;
    /// let ty = Type::of::<Vec<String>>();
    /// assert_eq!(ty.id(), TypeId::of::<Vec<String>>());
    /// assert_eq!(ty.name(), "Vec<String>");
    /// ```
    #[inline]
    pub fn of<T: ?Sized + Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            path: core::any::type_name::<T>(),
        }
    }

    #[inline(always)]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    /// The full path as reported by [`core::any::type_name`].
    #[inline(always)]
    pub const fn path(&self) -> &'static str {
        self.path
    }

    /// The path with every module prefix stripped, generics kept.
    pub fn name(&self) -> String {
        let mut out = String::with_capacity(self.path.len());
        let mut segment = String::new();
        for c in self.path.chars() {
            match c {
                ':' => segment.clear(),
                '<' | '>' | ',' | ' ' | '[' | ']' | ';' | '(' | ')' | '&' => {
                    out.push_str(&segment);
                    segment.clear();
                    out.push(c);
                }
                _ => segment.push(c),
            }
        }
        out.push_str(&segment);
        out
    }

    /// Returns `true` if this is the type `T`.
    #[inline]
    pub fn is<T: ?Sized + Any>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for Type {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Type {}

impl Hash for Type {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path)
    }
}
