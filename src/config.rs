use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ai::DEFAULT_THINK_DELAY;
use crate::persistence::FileRepository;

const DEFAULT_SAVE_FILE: &str = "Game";

/// Settings for a [`GameSession`](crate::session::GameSession).
///
/// Every field is optional in JSON; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
    /// How long a computer player "thinks" before answering.
    pub think_delay_ms: u64,
    /// Where the game is saved between runs.
    pub save_path: PathBuf,
}

impl SessionConfig {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn think_delay(&self) -> Duration {
        Duration::from_millis(self.think_delay_ms)
    }

    pub fn repository(&self) -> FileRepository {
        FileRepository::new(&self.save_path)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            think_delay_ms: u64::try_from(DEFAULT_THINK_DELAY.as_millis()).unwrap_or(u64::MAX),
            save_path: PathBuf::from(DEFAULT_SAVE_FILE),
        }
    }
}
