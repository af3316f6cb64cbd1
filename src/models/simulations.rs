// The catalog container: an ordered map of SXS ID to metadata

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::models::metadata::Metadata;
use crate::models::table::SimulationsTable;
use crate::utils::error::Result;

/// The catalog of SXS simulations
///
/// Maps SXS IDs (or, for unpublished local simulations, directory keys) to
/// their [`Metadata`], sorted by key. Provenance fields record where the
/// catalog came from; they are not part of the on-disk JSON shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Simulations {
    #[serde(flatten)]
    pub simulations: BTreeMap<String, Metadata>,
    /// Release tag the catalog was loaded from, once resolved
    #[serde(skip)]
    pub tag: Option<String>,
    /// Publication timestamp of that release, when the tag came from the
    /// latest-release lookup
    #[serde(skip)]
    pub published_at: Option<String>,
    /// File the catalog was read from
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Simulations {
    pub fn new(simulations: BTreeMap<String, Metadata>) -> Self {
        Simulations {
            simulations,
            ..Default::default()
        }
    }

    /// Parse the on-disk `simulations.json` shape: one JSON object mapping
    /// IDs to metadata objects
    pub fn from_json_str(content: &str) -> Result<Self> {
        let simulations: BTreeMap<String, Metadata> = serde_json::from_str(content)?;
        Ok(Simulations::new(simulations))
    }

    pub fn get(&self, key: &str) -> Option<&Metadata> {
        self.simulations.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.simulations.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.simulations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.simulations.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.simulations.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Metadata)> {
        self.simulations.iter()
    }

    /// Overlay locally scanned simulations on the published catalog
    ///
    /// Local metadata replaces the published entry wholesale, except that
    /// the published `DOI_versions` is kept: the annex has no knowledge of
    /// what has already been published.
    pub fn merge_local(&mut self, local: &BTreeMap<String, Metadata>) {
        for (key, metadata) in local {
            let doi_versions = self
                .simulations
                .get(key)
                .and_then(|published| published.get("DOI_versions").cloned());
            let mut merged = metadata.clone();
            if let Some(doi_versions) = doi_versions {
                merged.insert("DOI_versions", doi_versions);
            }
            self.simulations.insert(key.clone(), merged);
        }
    }

    /// Project the catalog into a flat, NaN-tolerant table
    pub fn to_table(&self) -> SimulationsTable {
        SimulationsTable::from_simulations(self)
    }
}
