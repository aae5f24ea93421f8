use std::path::{Path, PathBuf};

use log::debug;
use sled::IVec;

use crate::entity::errors::EntityError;
use crate::entity::record::{PlayerRecord, PLAYER_SCHEMA_VERSION};

const TREE_PLAYERS: &str = "ranvale_players";
const PLAYER_PREFIX: &str = "players:";

/// Helper builder so tests can easily create throwaway stores with custom paths.
pub struct PlayerStoreBuilder {
    path: PathBuf,
    flush_on_write: bool,
}

impl PlayerStoreBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            flush_on_write: true,
        }
    }

    /// Skip the fsync after every write (bulk imports, tests).
    pub fn without_flush(mut self) -> Self {
        self.flush_on_write = false;
        self
    }

    pub fn open(self) -> Result<PlayerStore, EntityError> {
        PlayerStore::open_with_options(self.path, self.flush_on_write)
    }
}

/// Sled-backed persistence for player records.
pub struct PlayerStore {
    _db: sled::Db,
    players: sled::Tree,
    flush_on_write: bool,
}

impl PlayerStore {
    /// Open (or create) the player store rooted at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, EntityError> {
        Self::open_with_options(path, true)
    }

    fn open_with_options<P: AsRef<Path>>(path: P, flush_on_write: bool) -> Result<Self, EntityError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::open(path_ref)?;
        let players = db.open_tree(TREE_PLAYERS)?;
        Ok(Self {
            _db: db,
            players,
            flush_on_write,
        })
    }

    fn player_key(name: &str) -> Vec<u8> {
        format!("{}{}", PLAYER_PREFIX, name.to_ascii_lowercase()).into_bytes()
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, EntityError> {
        Ok(bincode::serialize(value)?)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(bytes: IVec) -> Result<T, EntityError> {
        Ok(bincode::deserialize::<T>(&bytes)?)
    }

    /// Insert or update a player record.
    pub fn put_player(&self, mut player: PlayerRecord) -> Result<(), EntityError> {
        player.schema_version = PLAYER_SCHEMA_VERSION;
        player.touch();
        let key = Self::player_key(&player.name);
        let bytes = Self::serialize(&player)?;
        self.players.insert(key, bytes)?;
        if self.flush_on_write {
            self.players.flush()?;
        }
        debug!("stored player {}", player.name);
        Ok(())
    }

    /// Fetch a player record by name (case-insensitive).
    pub fn get_player(&self, name: &str) -> Result<PlayerRecord, EntityError> {
        let key = Self::player_key(name);
        let Some(bytes) = self.players.get(&key)? else {
            return Err(EntityError::NotFound(format!("player: {}", name)));
        };
        let record: PlayerRecord = Self::deserialize(bytes)?;
        if record.schema_version != PLAYER_SCHEMA_VERSION {
            return Err(EntityError::SchemaMismatch {
                entity: "player",
                expected: PLAYER_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        Ok(record)
    }

    pub fn player_exists(&self, name: &str) -> Result<bool, EntityError> {
        Ok(self.players.contains_key(Self::player_key(name))?)
    }

    /// List all stored player keys (lower-cased names).
    pub fn list_player_ids(&self) -> Result<Vec<String>, EntityError> {
        let mut ids = Vec::new();
        for entry in self.players.scan_prefix(PLAYER_PREFIX.as_bytes()) {
            let (key, _) = entry?;
            let text = String::from_utf8_lossy(&key);
            if let Some(name) = text.strip_prefix(PLAYER_PREFIX) {
                ids.push(name.to_string());
            }
        }
        Ok(ids)
    }

    /// Remove a player record. Returns whether one existed.
    pub fn delete_player(&self, name: &str) -> Result<bool, EntityError> {
        let removed = self.players.remove(Self::player_key(name))?;
        if self.flush_on_write {
            self.players.flush()?;
        }
        Ok(removed.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(name: &str) -> PlayerRecord {
        PlayerRecord {
            name: name.to_string(),
            account_name: format!("{}-acct", name),
            ..PlayerRecord::default()
        }
    }

    #[test]
    fn put_then_get_is_case_insensitive() {
        let dir = TempDir::new().expect("tempdir");
        let store = PlayerStoreBuilder::new(dir.path()).open().expect("store");
        store.put_player(record("Morgan")).expect("put");

        let loaded = store.get_player("morgan").expect("get");
        assert_eq!(loaded.account_name, "Morgan-acct");
        assert_eq!(loaded.schema_version, PLAYER_SCHEMA_VERSION);
        assert!(loaded.updated_at.is_some());
    }

    #[test]
    fn missing_player_is_not_found() {
        let dir = TempDir::new().expect("tempdir");
        let store = PlayerStoreBuilder::new(dir.path()).open().expect("store");
        let err = store.get_player("nobody").unwrap_err();
        assert!(matches!(err, EntityError::NotFound(_)));
    }

    #[test]
    fn list_and_delete() {
        let dir = TempDir::new().expect("tempdir");
        let store = PlayerStoreBuilder::new(dir.path())
            .without_flush()
            .open()
            .expect("store");
        store.put_player(record("Ash")).expect("put");
        store.put_player(record("Bram")).expect("put");

        let mut ids = store.list_player_ids().expect("list");
        ids.sort();
        assert_eq!(ids, vec!["ash".to_string(), "bram".to_string()]);

        assert!(store.delete_player("ASH").expect("delete"));
        assert!(!store.player_exists("ash").expect("exists"));
        assert!(!store.delete_player("ash").expect("delete"));
    }
}
