use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{GameError, GameResult};

/// Durable local key-value slot holding the player identity.
pub trait IdentityStore: Send + Sync {
    fn load(&self) -> GameResult<Option<String>>;
    fn save(&self, player_id: &str) -> GameResult<()>;
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct SavedIdentity {
    #[serde(rename = "playerId")]
    player_id: Option<String>,
}

/// JSON file with a single well-known `playerId` key
#[derive(Debug, Clone)]
pub struct FileIdentityStore {
    path: PathBuf,
}

impl FileIdentityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl IdentityStore for FileIdentityStore {
    fn load(&self) -> GameResult<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)
            .map_err(|e| GameError::Identity(format!("failed to read {}: {e}", self.path.display())))?;
        if contents.trim().is_empty() {
            return Ok(None);
        }
        let saved: SavedIdentity = serde_json::from_str(&contents)
            .map_err(|e| GameError::Identity(format!("failed to parse {}: {e}", self.path.display())))?;
        Ok(saved.player_id.filter(|id| !id.trim().is_empty()))
    }

    fn save(&self, player_id: &str) -> GameResult<()> {
        let saved = SavedIdentity { player_id: Some(player_id.to_string()) };
        let json = serde_json::to_string_pretty(&saved)
            .map_err(|e| GameError::Identity(format!("failed to serialize identity: {e}")))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| GameError::Identity(format!("failed to create {}: {e}", parent.display())))?;
        }
        std::fs::write(&self.path, json)
            .map_err(|e| GameError::Identity(format!("failed to write {}: {e}", self.path.display())))?;
        tracing::info!(path = %self.path.display(), player_id, "player identity saved");
        Ok(())
    }
}
