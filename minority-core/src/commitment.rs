use crate::constants::COMMITMENT_KEY_PREFIX;
use crate::crypto::{generate_salt, CryptoError, VoteHashes};
use chrono::{SecondsFormat, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

// Client-side record of the salt behind an on-chain commit. Only one commitment per game is
// kept; storing again replaces the old salt, which strands any earlier unrevealed commit.

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("commitment store io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode commitment: {0}")]
    Encode(#[from] serde_json::Error),
}

/// String key/value persistence, the same model as browser local storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

#[derive(Default, Debug, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// All keys in one JSON object on disk. Writes go through a sibling temp file and a rename.
/// A file that no longer parses reads as empty and is replaced on the next write.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => return Err(self.io_error(source)),
        };
        if text.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        match serde_json::from_str(&text) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!(
                    "ignoring unreadable commitment store {}: {}",
                    self.path.display(),
                    e
                );
                Ok(BTreeMap::new())
            }
        }
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        let data = serde_json::to_vec_pretty(entries)?;
        let mut tmp = NamedTempFile::new_in(parent).map_err(|e| self.io_error(e))?;
        tmp.write_all(&data).map_err(|e| self.io_error(e))?;
        tmp.persist(&self.path).map_err(|e| self.io_error(e.error))?;
        Ok(())
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value);
        self.save(&entries)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VotingCommitment {
    pub salt: String,
    pub hashes: VoteHashes,
    pub timestamp: String,
    pub game_id: String,
}

impl VotingCommitment {
    pub fn generate(game_id: &str) -> Result<Self, CryptoError> {
        Self::with_salt(game_id, generate_salt()?)
    }

    pub fn with_salt(game_id: &str, salt: String) -> Result<Self, CryptoError> {
        let hashes = VoteHashes::compute(&salt)?;
        Ok(Self {
            salt,
            hashes,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            game_id: game_id.to_string(),
        })
    }

    pub fn hash_for(&self, vote: bool) -> &str {
        self.hashes.for_vote(vote)
    }
}

pub fn commitment_key(game_id: &str) -> String {
    format!("{}{}", COMMITMENT_KEY_PREFIX, game_id)
}

pub struct CommitmentStore<S: KeyValueStore> {
    backend: S,
}

impl<S: KeyValueStore> CommitmentStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn store(&mut self, game_id: &str, data: &VotingCommitment) -> Result<(), StoreError> {
        let key = commitment_key(game_id);
        if self.backend.get(&key)?.is_some() {
            warn!(
                "replacing unrevealed commitment for game {}; the previous salt is lost",
                game_id
            );
        }
        let value = serde_json::to_string(data)?;
        self.backend.set(&key, value)?;
        debug!("stored commitment for game {}", game_id);
        Ok(())
    }

    /// `Ok(None)` when nothing usable is stored, including records that no longer parse.
    pub fn retrieve(&self, game_id: &str) -> Result<Option<VotingCommitment>, StoreError> {
        let key = commitment_key(game_id);
        let Some(raw) = self.backend.get(&key)? else {
            debug!("no commitment stored for game {}", game_id);
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(commitment) => Ok(Some(commitment)),
            Err(e) => {
                warn!("ignoring malformed commitment for game {}: {}", game_id, e);
                Ok(None)
            }
        }
    }

    pub fn clear(&mut self, game_id: &str) -> Result<(), StoreError> {
        self.backend.remove(&commitment_key(game_id))?;
        debug!("cleared commitment for game {}", game_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::verify_commitment;
    use tempfile::tempdir;

    #[test]
    fn store_then_retrieve_round_trips() {
        let mut store = CommitmentStore::new(MemoryStore::new());
        let data = VotingCommitment::generate("7").unwrap();
        store.store("7", &data).unwrap();
        assert_eq!(store.retrieve("7").unwrap(), Some(data));
    }

    #[test]
    fn clear_removes_commitment() {
        let mut store = CommitmentStore::new(MemoryStore::new());
        let data = VotingCommitment::generate("7").unwrap();
        store.store("7", &data).unwrap();
        store.clear("7").unwrap();
        assert_eq!(store.retrieve("7").unwrap(), None);
        store.clear("7").unwrap();
    }

    #[test]
    fn missing_game_is_not_found() {
        let store = CommitmentStore::new(MemoryStore::new());
        assert_eq!(store.retrieve("404").unwrap(), None);
    }

    #[test]
    fn recommit_overwrites_previous_salt() {
        let mut store = CommitmentStore::new(MemoryStore::new());
        let first = VotingCommitment::generate("3").unwrap();
        let second = VotingCommitment::generate("3").unwrap();
        store.store("3", &first).unwrap();
        store.store("3", &second).unwrap();
        let kept = store.retrieve("3").unwrap().unwrap();
        assert_eq!(kept.salt, second.salt);
        assert_ne!(kept.salt, first.salt);
    }

    #[test]
    fn commitments_are_scoped_per_game() {
        let mut store = CommitmentStore::new(MemoryStore::new());
        let a = VotingCommitment::generate("1").unwrap();
        let b = VotingCommitment::generate("2").unwrap();
        store.store("1", &a).unwrap();
        store.store("2", &b).unwrap();
        store.clear("1").unwrap();
        assert_eq!(store.retrieve("1").unwrap(), None);
        assert_eq!(store.retrieve("2").unwrap(), Some(b));
    }

    #[test]
    fn malformed_record_reads_as_not_found() {
        let mut backend = MemoryStore::new();
        backend
            .set(&commitment_key("5"), "{not json".to_string())
            .unwrap();
        let store = CommitmentStore::new(backend);
        assert_eq!(store.retrieve("5").unwrap(), None);
    }

    #[test]
    fn persisted_shape_matches_client_format() {
        let salt = "ab".repeat(32);
        let data = VotingCommitment::with_salt("9", salt.clone()).unwrap();
        let mut store = CommitmentStore::new(MemoryStore::new());
        store.store("9", &data).unwrap();
        let raw = store.backend().get("voting_commitment_9").unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["salt"], salt);
        assert_eq!(value["gameId"], "9");
        assert!(value["timestamp"].as_str().unwrap().ends_with('Z'));
        assert_eq!(value["hashes"]["voteTrue"], data.hashes.vote_true);
        assert_eq!(value["hashes"]["voteFalse"], data.hashes.vote_false);
    }

    #[test]
    fn generated_hashes_verify() {
        let data = VotingCommitment::generate("11").unwrap();
        assert!(verify_commitment(true, &data.salt, data.hash_for(true)).unwrap());
        assert!(verify_commitment(false, &data.salt, data.hash_for(false)).unwrap());
        assert!(!verify_commitment(true, &data.salt, data.hash_for(false)).unwrap());
    }

    #[test]
    fn file_store_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("commitments.json");
        let data = VotingCommitment::generate("21").unwrap();
        {
            let mut store = CommitmentStore::new(FileStore::open(&path));
            assert_eq!(store.backend().path(), path.as_path());
            assert_eq!(store.retrieve("21").unwrap(), None);
            store.store("21", &data).unwrap();
        }
        let mut reopened = CommitmentStore::new(FileStore::open(&path));
        assert_eq!(reopened.retrieve("21").unwrap(), Some(data));
        reopened.clear("21").unwrap();
        assert_eq!(
            CommitmentStore::new(FileStore::open(&path)).retrieve("21").unwrap(),
            None
        );
        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("commitments.json")]);
    }

    #[test]
    fn unreadable_store_file_recovers_on_recommit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("commitments.json");
        fs::write(&path, r#"{"voting_commitment_1": "x""#).unwrap();
        let mut store = CommitmentStore::new(FileStore::open(&path));
        assert_eq!(store.retrieve("1").unwrap(), None);

        let data = VotingCommitment::generate("1").unwrap();
        store.store("1", &data).unwrap();
        assert_eq!(store.retrieve("1").unwrap(), Some(data.clone()));
        let reopened = CommitmentStore::new(FileStore::open(&path));
        assert_eq!(reopened.retrieve("1").unwrap(), Some(data));
    }
}
