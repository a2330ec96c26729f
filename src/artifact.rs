// src/artifact.rs
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::store::write_json_atomic;
use crate::types::Offer;

pub const DEFAULT_ARTIFACT_PATH: &str = "last_run_offers.json";

/// Offers delivered during one run, in delivery order. Overwritten each run.
#[derive(Debug, Default)]
pub struct RunArtifact {
    delivered: Vec<Offer>,
}

impl RunArtifact {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, offer: Offer) {
        self.delivered.push(offer);
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.delivered.iter().map(|o| o.id.as_str())
    }

    pub fn write(&self, path: &Path) -> Result<PathBuf> {
        write_json_atomic(path, &self.delivered)?;
        Ok(path.to_path_buf())
    }
}
