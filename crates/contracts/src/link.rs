//! LinkState - connectivity collaborator state
//!
//! The packet callback and publish timer are armed only once the link
//! reports `Connected`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl LinkState {
    #[inline]
    pub fn is_connected(self) -> bool {
        matches!(self, LinkState::Connected)
    }
}
