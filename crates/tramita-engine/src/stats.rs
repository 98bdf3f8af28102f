//! Read-only statistics rollup over the vector store.

use std::sync::Arc;

use tracing::info;

use tramita_core::Result;
use tramita_domain::{Statistics, VectorStore};

pub struct StatisticsService {
    index: Arc<dyn VectorStore>,
}

impl StatisticsService {
    pub fn new(index: Arc<dyn VectorStore>) -> Self {
        Self { index }
    }

    /// Aggregate counts plus per-category and per-type distributions.
    /// Store errors surface unchanged.
    pub async fn get_statistics(&self) -> Result<Statistics> {
        info!("Retrieving system statistics...");
        let stats = self.index.statistics().await?;
        info!(
            "Statistics retrieved: {} documents, {} chunks",
            stats.total_documents, stats.total_chunks
        );
        Ok(stats)
    }
}
