use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct EntityCount {
    pub label: String,
    pub path: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndicatorProgressRow {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub product_name: String,
    pub unit: String,
    pub baseline: f64,
    pub target: f64,
    pub current_value: f64,
    /// 0..=100, see [`crate::domain::planning::progress_percent`].
    pub progress: f64,
}

#[async_trait]
pub trait DashboardRepository: Send + Sync {
    async fn active_counts(&self) -> anyhow::Result<Vec<EntityCount>>;
    /// Active indicators with the lowest progress first, ties by code.
    async fn lagging_indicators(&self, limit: i64) -> anyhow::Result<Vec<IndicatorProgressRow>>;
    /// Mean progress of all active indicators, `None` when there are none.
    async fn average_progress(&self) -> anyhow::Result<Option<f64>>;
}
