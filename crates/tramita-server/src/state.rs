//! Shared application state.

use std::sync::Arc;

use tramita_core::TramitaConfig;
use tramita_domain::{ChatProvider, EmbeddingProvider, VectorStore};
use tramita_engine::{FeedbackService, QueryEngine, SessionManager, StatisticsService};
use tramita_store::SqliteStore;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: TramitaConfig,
    pub engine: QueryEngine,
    pub sessions: Arc<SessionManager>,
    pub stats: StatisticsService,
    pub feedback: FeedbackService,
    pub index: Arc<dyn VectorStore>,
}

impl AppState {
    /// Composition root: wire the concrete store and providers into the
    /// engine and the aggregators.
    pub fn new(
        config: TramitaConfig,
        store: Arc<SqliteStore>,
        embeddings: Arc<dyn EmbeddingProvider>,
        chat: Arc<dyn ChatProvider>,
    ) -> Self {
        let sessions = Arc::new(SessionManager::new(store.clone()));

        let engine = QueryEngine::with_settings(
            embeddings,
            store.clone(),
            chat,
            sessions.clone(),
            config.similarity_threshold,
            config.top_k,
            config.max_history_messages,
        );

        let stats = StatisticsService::new(store.clone());
        let feedback = FeedbackService::new(store.clone());

        Self {
            config,
            engine,
            sessions,
            stats,
            feedback,
            index: store,
        }
    }
}
