use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::services::embedding_service::EmbeddingProvider;
use crate::utils::error::ProviderError;
use crate::utils::similarity::cosine_similarity;

use super::record::Vehicle;
use super::{CatalogError, LoadError};

struct IndexEntry {
    vehicle: Vehicle,
    embedding: Vec<f32>,
}

/// One scored query result. The vehicle is an owned copy; the catalog
/// itself never hands out references into its entries.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub vehicle: Vehicle,
    pub similarity: f32,
}

/// Immutable similarity index over the inventory feed.
///
/// Built once at startup: every record is parsed and embedded before the
/// index is handed out, so a ready index never contains an entry without a
/// vector. Queries are a full linear scan, which is fine at the catalog
/// sizes this serves (hundreds to low thousands of records).
pub struct CatalogIndex {
    provider: Arc<dyn EmbeddingProvider>,
    entries: Vec<IndexEntry>,
}

impl std::fmt::Debug for CatalogIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogIndex")
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}

impl CatalogIndex {
    /// Load the CSV inventory feed at `path` and embed every record.
    pub async fn load(
        path: impl AsRef<Path>,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self, CatalogError> {
        let file = std::fs::File::open(path).map_err(LoadError::Io)?;
        Self::from_reader(file, provider).await
    }

    /// Build the index from any CSV reader. Header row is skipped; rows are
    /// embedded in feed order, fail-fast: any unreadable row or provider
    /// failure abandons the whole build.
    pub async fn from_reader<R: Read>(
        reader: R,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self, CatalogError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let mut entries = Vec::new();
        for (row, record) in csv_reader.records().enumerate() {
            let record = record.map_err(LoadError::Malformed)?;
            let vehicle = Vehicle::from_record(row, &record)?;

            let embedding = provider.embed(&vehicle.embedding_text()).await?;
            debug!(
                stock_id = %vehicle.stock_id,
                dimension = embedding.len(),
                "embedded catalog record"
            );
            entries.push(IndexEntry { vehicle, embedding });
        }

        info!(vehicles = entries.len(), "catalog index ready");
        Ok(Self { provider, entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Top-`top_k` entries by cosine similarity to `query`, best first.
    ///
    /// Equal scores keep feed order (stable sort), so repeated queries over
    /// an unchanged catalog return identical sequences. `top_k == 0` and an
    /// empty catalog both short-circuit to an empty result without touching
    /// the provider.
    pub async fn search(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchHit>, ProviderError> {
        if top_k == 0 || self.entries.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.provider.embed(query).await?;

        let mut hits: Vec<SearchHit> = self
            .entries
            .iter()
            .map(|entry| SearchHit {
                vehicle: entry.vehicle.clone(),
                similarity: cosine_similarity(&query_embedding, &entry.embedding),
            })
            .collect();

        hits.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        hits.truncate(top_k);
        Ok(hits)
    }
}
