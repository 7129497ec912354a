//! Versioning and write-filter policy.

use core::any::Any;
use core::fmt;
use std::sync::Arc;

/// Mapper version meaning "unversioned": every property is included.
pub const UNVERSIONED: i32 = -1;

// -----------------------------------------------------------------------------
// VersionRange

/// Inclusive version bounds of a property, unbounded by default.
///
/// # Examples
///
/// ```
/// use jb_bind::policy::VersionRange;
///
/// let range = VersionRange::default().with_min(2);
/// assert!(!range.contains(1));
/// assert!(range.contains(2));
/// assert!(range.contains(3));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VersionRange {
    min: Option<i32>,
    max: Option<i32>,
}

impl VersionRange {
    #[inline]
    pub const fn new(min: Option<i32>, max: Option<i32>) -> Self {
        Self { min, max }
    }

    #[inline]
    pub const fn with_min(mut self, min: i32) -> Self {
        self.min = Some(min);
        self
    }

    #[inline]
    pub const fn with_max(mut self, max: i32) -> Self {
        self.max = Some(max);
        self
    }

    #[inline]
    pub const fn min(&self) -> Option<i32> {
        self.min
    }

    #[inline]
    pub const fn max(&self) -> Option<i32> {
        self.max
    }

    #[inline]
    pub const fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    pub const fn contains(&self, version: i32) -> bool {
        if let Some(min) = self.min
            && version < min
        {
            return false;
        }
        if let Some(max) = self.max
            && version > max
        {
            return false;
        }
        true
    }

    /// The bounds satisfied by both ranges.
    pub fn intersect(self, other: Self) -> Self {
        let min = match (self.min, other.min) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        let max = match (self.max, other.max) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        Self { min, max }
    }
}

// -----------------------------------------------------------------------------
// WriteFilter

/// Predicate deciding, on write, whether a property value is emitted.
///
/// Receives the wire name and the current value; returns `true` to include.
#[derive(Clone)]
pub struct WriteFilter(Arc<dyn Fn(&str, &dyn Any) -> bool + Send + Sync>);

impl WriteFilter {
    pub fn new<F>(filter: F) -> Self
    where
        F: Fn(&str, &dyn Any) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(filter))
    }

    #[inline]
    pub fn allows(&self, name: &str, value: &dyn Any) -> bool {
        (self.0)(name, value)
    }
}

impl fmt::Debug for WriteFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WriteFilter(..)")
    }
}

// -----------------------------------------------------------------------------
// InclusionPolicy

/// The version and filter gates of one mapper.
#[derive(Debug, Clone, Default)]
pub struct InclusionPolicy {
    version: Option<i32>,
    filter: Option<WriteFilter>,
}

impl InclusionPolicy {
    /// Negative versions are normalized to unversioned.
    pub fn new(version: i32, filter: Option<WriteFilter>) -> Self {
        Self {
            version: (version >= 0).then_some(version),
            filter,
        }
    }

    /// The configured version, or `None` when unversioned.
    #[inline]
    pub fn version(&self) -> Option<i32> {
        self.version
    }

    /// Applies symmetrically on read and write.
    #[inline]
    pub fn version_allows(&self, range: &VersionRange) -> bool {
        match self.version {
            None => true,
            Some(version) => range.contains(version),
        }
    }

    /// Write side only.
    #[inline]
    pub fn filter_allows(&self, name: &str, value: &dyn Any) -> bool {
        match &self.filter {
            None => true,
            Some(filter) => filter.allows(name, value),
        }
    }
}
