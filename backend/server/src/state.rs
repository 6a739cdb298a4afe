use std::{sync::Arc, time::Instant};

use upstream::{ApiClient, ProfileSource, UpstreamSource};

use super::{aggregator::Aggregator, config::Config, error::AppError, maintenance::MaintenanceStore};

pub struct AppState {
    pub config: Config,
    pub source: Arc<dyn ProfileSource>,
    pub aggregator: Arc<Aggregator>,
    pub maintenance: MaintenanceStore,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Config) -> Result<Arc<Self>, AppError> {
        let client = ApiClient::new(config.request_timeout)?;
        let source = UpstreamSource::new(client, config.endpoints())?;

        Ok(Self::with_source(config, Arc::new(source)))
    }

    pub fn with_source(config: Config, source: Arc<dyn ProfileSource>) -> Arc<Self> {
        let aggregator = Arc::new(Aggregator::new(Arc::clone(&source)));

        Arc::new(Self {
            config,
            source,
            aggregator,
            maintenance: MaintenanceStore::default(),
            started_at: Instant::now(),
        })
    }
}
