//! Network alteration mode of an application.
//!
//! Blocking, shaping and netem manipulation all rewrite the same traffic
//! path, so only one of them may be active at a time. Repeating the active
//! one is allowed.

use std::fmt;

use crate::domain::error::FaultError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetworkMode {
    #[default]
    None,
    Blocked,
    Shaped,
    Manipulated,
}

impl NetworkMode {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::None => "unaltered",
            Self::Blocked => "blocked",
            Self::Shaped => "shaped",
            Self::Manipulated => "manipulated",
        }
    }

    fn action(self) -> &'static str {
        match self {
            Self::None => "undo network changes",
            Self::Blocked => "block traffic",
            Self::Shaped => "shape the network",
            Self::Manipulated => "manipulate the network",
        }
    }

    /// Check that `requested` may start from the current mode.
    ///
    /// # Errors
    ///
    /// Returns `FaultError::ModeConflict` when a different alteration is active.
    pub fn check(self, requested: NetworkMode) -> Result<(), FaultError> {
        if self == Self::None || requested == Self::None || self == requested {
            return Ok(());
        }
        Err(FaultError::ModeConflict {
            active: self.label(),
            requested: requested.action(),
        })
    }
}

impl fmt::Display for NetworkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
