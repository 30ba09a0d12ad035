use std::sync::Arc;
use chrono::Utc;

use crate::{
    config::SchedulingConfig,
    domain::EventStatistics,
    error::Result,
    repository::StatisticsRepository,
};

/// Administrative rollups, recomputed on every call.
pub struct StatisticsService {
    repo: Arc<dyn StatisticsRepository>,
    config: SchedulingConfig,
}

impl StatisticsService {
    pub fn new(repo: Arc<dyn StatisticsRepository>, config: SchedulingConfig) -> Self {
        Self { repo, config }
    }

    pub async fn get_statistics(&self) -> Result<EventStatistics> {
        self.repo.compute(Utc::now().date_naive(), &self.config).await
    }
}
