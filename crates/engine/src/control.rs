//! Pause / resume of autonomous control.

use serde::Serialize;

/// Operator-controlled run flag.  Starts running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ControlState {
    pub paused: bool,
}

impl ControlState {
    pub fn toggled(self) -> Self {
        Self {
            paused: !self.paused,
        }
    }

    /// Autopilot indicator: lit while running.
    pub fn is_autonomous(&self) -> bool {
        !self.paused
    }

    /// Water purge is offered only while the tower is paused for cleaning.
    pub fn purge_available(&self) -> bool {
        self.paused
    }

    pub fn label(&self) -> &'static str {
        if self.paused {
            "paused"
        } else {
            "autopilot"
        }
    }
}
