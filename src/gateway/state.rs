use std::sync::Arc;

use crate::config::SysPubMapping;
use crate::retrieval::RetrievalBackend;
use crate::scenario::Orchestrator;

#[derive(Clone)]
pub struct AppState<B: RetrievalBackend + Clone + Send + Sync + 'static> {
    pub orchestrator: Arc<Orchestrator>,

    /// Resolves a scenario when the request carries no `sys_id`.
    pub mapping: Arc<SysPubMapping>,

    /// Probed by `/ready`.
    pub backend: B,
}

impl<B> AppState<B>
where
    B: RetrievalBackend + Clone + Send + Sync + 'static,
{
    pub fn new(orchestrator: Arc<Orchestrator>, mapping: Arc<SysPubMapping>, backend: B) -> Self {
        Self {
            orchestrator,
            mapping,
            backend,
        }
    }
}
