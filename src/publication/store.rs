//! Durable storage for provider-side subscription requests.
//!
//! Survives a graceful process restart (see the grounding ledger for why
//! crash-mid-write durability is out of scope): the whole file is
//! rewritten on every mutation via write-tempfile-then-rename, so a reader
//! never observes a partial file.

use crate::message::SubscriptionRequest;
use crate::participant::ParticipantId;
use crate::subscription::SubscriptionId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// The persisted fields of a [`super::SubscriptionEntry`] needed to
/// reconstruct it as a `Pending` entry after a restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedEntry {
    /// The subscription request as last refreshed.
    pub request: SubscriptionRequest,
    /// The consumer that will receive publications.
    pub proxy_participant_id: ParticipantId,
    /// The provider this subscription targets.
    pub provider_participant_id: ParticipantId,
    /// When this entry was first created, in epoch milliseconds.
    pub created_at_ms: u64,
}

/// Reads and atomically rewrites the subscription-request store file.
///
/// The encoding (a JSON object keyed by subscription id) is an
/// implementation choice; the only contract is that it round-trips
/// [`PersistedEntry`].
pub struct SubscriptionStore {
    path: PathBuf,
}

impl SubscriptionStore {
    /// Open (without reading) the store at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load all persisted entries, or an empty map if the file does not
    /// exist yet.
    pub fn load(&self) -> io::Result<HashMap<SubscriptionId, PersistedEntry>> {
        match fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e),
        }
    }

    /// Rewrite the store to exactly contain `entries`, atomically.
    pub fn save(&self, entries: &HashMap<SubscriptionId, PersistedEntry>) -> io::Result<()> {
        let serialized = serde_json::to_vec_pretty(entries)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let tmp_path = tmp_path_for(&self.path);
        fs::write(&tmp_path, serialized)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}
