//! Model identity.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Unique identifier for a model within one world.
///
/// Ids are allocated by the owning world and are never reused for its
/// lifetime. They are **world-scoped**: two worlds may both contain a model
/// with id 0, and tests rely on creating independent worlds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ModelId(pub u32);

impl ModelId {
    /// Create a model id from a raw value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw id value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for ModelId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Model({})", self.0)
    }
}
