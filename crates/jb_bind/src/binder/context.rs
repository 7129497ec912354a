use core::fmt;

use crate::BindError;
use crate::policy::InclusionPolicy;

// -----------------------------------------------------------------------------
// Segment

enum Segment {
    Key(String),
    Index(usize),
}

// -----------------------------------------------------------------------------
// BindingContext

/// Transient state of one read or write call.
///
/// Tracks the location being processed so errors can report it as a JSON
/// pointer. Never shared across calls.
pub(crate) struct BindingContext<'a> {
    path: Vec<Segment>,
    policy: &'a InclusionPolicy,
}

impl<'a> BindingContext<'a> {
    #[inline]
    pub const fn new(policy: &'a InclusionPolicy) -> Self {
        Self {
            path: Vec::new(),
            policy,
        }
    }

    #[inline]
    pub fn policy(&self) -> &'a InclusionPolicy {
        self.policy
    }

    #[inline]
    pub fn push_key(&mut self, key: &str) {
        self.path.push(Segment::Key(key.to_owned()));
    }

    #[inline]
    pub fn push_index(&mut self, index: usize) {
        self.path.push(Segment::Index(index));
    }

    #[inline]
    pub fn pop(&mut self) {
        self.path.pop();
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// The current location as an RFC 6901 JSON pointer.
    pub fn pointer(&self) -> String {
        self.to_string()
    }

    /// Records the current location on `error`.
    #[inline]
    pub fn locate(&self, error: BindError) -> BindError {
        match error.path() {
            Some("") => error.at(&self.pointer()),
            _ => error,
        }
    }
}

impl fmt::Display for BindingContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.path {
            f.write_str("/")?;
            match segment {
                Segment::Index(index) => write!(f, "{index}")?,
                Segment::Key(key) => {
                    for c in key.chars() {
                        match c {
                            '~' => f.write_str("~0")?,
                            '/' => f.write_str("~1")?,
                            c => fmt::Write::write_char(f, c)?,
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
