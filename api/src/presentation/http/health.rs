use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use sqlx::PgPool;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResp {
    pub status: &'static str,
    pub database: bool,
    pub version: &'static str,
}

impl HealthResp {
    pub fn from_probe(database: bool) -> Self {
        Self {
            status: if database { "ok" } else { "degraded" },
            database,
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses((status = 200, body = HealthResp))
)]
pub async fn health(State(pool): State<PgPool>) -> Json<HealthResp> {
    let db_ok = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&pool)
        .await
        .is_ok();
    if !db_ok {
        tracing::warn!("health_database_unreachable");
    }
    Json(HealthResp::from_probe(db_ok))
}

pub fn routes(pool: PgPool) -> Router {
    Router::new().route("/health", get(health)).with_state(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_follows_database_probe() {
        assert_eq!(HealthResp::from_probe(true).status, "ok");
        let degraded = HealthResp::from_probe(false);
        assert_eq!(degraded.status, "degraded");
        assert!(!degraded.database);
    }
}
