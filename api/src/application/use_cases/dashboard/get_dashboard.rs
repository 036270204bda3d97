use serde::Serialize;

use crate::application::ports::dashboard_repository::{
    DashboardRepository, EntityCount, IndicatorProgressRow,
};

pub const LAGGING_LIMIT: i64 = 10;

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub counts: Vec<EntityCount>,
    pub lagging: Vec<IndicatorProgressRow>,
    pub average_progress: Option<f64>,
}

pub struct GetDashboard<'a, R: DashboardRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: DashboardRepository + ?Sized> GetDashboard<'a, R> {
    pub async fn execute(&self) -> anyhow::Result<Dashboard> {
        let counts = self.repo.active_counts().await?;
        let lagging = self.repo.lagging_indicators(LAGGING_LIMIT).await?;
        let average_progress = self.repo.average_progress().await?;
        Ok(Dashboard {
            counts,
            lagging,
            average_progress,
        })
    }
}
