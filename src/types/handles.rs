//! Opaque handles into a map arena

use ::core::fmt;
use ::core::sync::atomic::{AtomicUsize, Ordering};

/// Handle naming one block (robot, landmark) of a [`crate::map::SlamMap`].
///
/// Handles are never reused within a map, so a handle to a removed block stays invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub(crate) usize);

impl ObjectId {
    /// Returns the raw index of this handle.
    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity of one map instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MapId(usize);

static NEXT_MAP_ID: AtomicUsize = AtomicUsize::new(0);

impl MapId {
    pub(crate) fn next() -> Self {
        MapId(NEXT_MAP_ID.fetch_add(1, Ordering::Relaxed))
    }
}
