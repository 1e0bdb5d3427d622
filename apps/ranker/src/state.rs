use crate::ranking::RankingEngine;
use crate::store::RankingStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Stateless engine; collaborators are wired at startup from `Config`.
    pub engine: RankingEngine,
    pub store: RankingStore,
}
