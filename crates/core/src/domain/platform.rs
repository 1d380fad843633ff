// Platform Domain Model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque CPU architecture class (e.g. "amd64", "arm64")
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Processor(String);

impl Processor {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Processor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Partition key for worker capacity and job competition.
///
/// `processor: None` means architecture independent. It sorts before every
/// concrete processor, so grouping by platform is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Platform {
    pub processor: Option<Processor>,
    pub virtualized: bool,
}

impl Platform {
    pub fn new(processor: Option<Processor>, virtualized: bool) -> Self {
        Self {
            processor,
            virtualized,
        }
    }

    /// Architecture-independent platform for the given virtualization
    pub fn independent(virtualized: bool) -> Self {
        Self {
            processor: None,
            virtualized,
        }
    }

    pub fn is_independent(&self) -> bool {
        self.processor.is_none()
    }

    /// Two platforms compete for the same workers iff virtualization matches
    /// and either side is processor independent or both processors are equal.
    pub fn competes_with(&self, other: &Platform) -> bool {
        if self.virtualized != other.virtualized {
            return false;
        }
        match (&self.processor, &other.processor) {
            (None, _) | (_, None) => true,
            (Some(a), Some(b)) => a == b,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let processor = self.processor.as_ref().map_or("any", |p| p.as_str());
        let mode = if self.virtualized { "virt" } else { "native" };
        write!(f, "{}/{}", processor, mode)
    }
}
