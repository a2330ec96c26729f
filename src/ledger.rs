// src/ledger.rs
//! Persistent set of offer ids that were already delivered.
//!
//! Identity only: an offer whose id is known is never re-announced, even if
//! its price or title changed upstream.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::store::write_json_atomic;

pub const DEFAULT_LEDGER_PATH: &str = "sent_offers.json";

#[derive(Debug, Clone)]
pub struct DedupLedger {
    path: PathBuf,
    ids: BTreeSet<String>,
}

impl DedupLedger {
    /// Never fails: a missing or unreadable file is an empty ledger.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let ids = match fs::read_to_string(&path) {
            Ok(s) => match serde_json::from_str::<Vec<String>>(&s) {
                Ok(list) => list.into_iter().filter(|id| !id.is_empty()).collect(),
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "ledger corrupt, starting empty"
                    );
                    BTreeSet::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeSet::new(),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "ledger unreadable, starting empty"
                );
                BTreeSet::new()
            }
        };
        tracing::debug!(path = %path.display(), known = ids.len(), "ledger loaded");
        Self { path, ids }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Add `added` and persist the union. The in-memory set is updated even
    /// when the write fails.
    pub fn commit<I, S>(&mut self, added: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids
            .extend(added.into_iter().map(Into::into).filter(|id: &String| !id.is_empty()));
        write_json_atomic(&self.path, &self.ids)
    }
}
