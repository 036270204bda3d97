use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::MatchedPath;
use dotenvy::dotenv;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use portal::application::use_cases::users::ensure_admin::EnsureAdmin;
use portal::bootstrap::app_context::{AppContext, AppServices, RecordRepositories};
use portal::bootstrap::config::Config;
use portal::infrastructure::db::repositories::{
    dashboard_repository_sqlx::SqlxDashboardRepository,
    department_repository_sqlx::SqlxDepartmentRepository,
    departmental_plan_repository_sqlx::SqlxDepartmentalPlanRepository,
    evidence_repository_sqlx::SqlxEvidenceRepository,
    indicator_repository_sqlx::SqlxIndicatorRepository, mayor_repository_sqlx::SqlxMayorRepository,
    mayoralty_repository_sqlx::SqlxMayoraltyRepository,
    municipal_plan_repository_sqlx::SqlxMunicipalPlanRepository,
    municipality_repository_sqlx::SqlxMunicipalityRepository,
    national_plan_repository_sqlx::SqlxNationalPlanRepository,
    product_repository_sqlx::SqlxProductRepository, program_repository_sqlx::SqlxProgramRepository,
    responsible_repository_sqlx::SqlxResponsibleRepository, sdg_repository_sqlx::SqlxSdgRepository,
    secretariat_repository_sqlx::SqlxSecretariatRepository,
    subsecretariat_repository_sqlx::SqlxSubsecretariatRepository,
    user_repository_sqlx::SqlxUserRepository,
};
use portal::infrastructure::storage::FsEvidenceStore;
use portal::presentation::http::{self, views};

#[derive(OpenApi)]
#[openapi(
    paths(
        portal::presentation::http::health::health,
        portal::presentation::http::lookups::lookup,
    ),
    components(schemas(
        portal::presentation::http::health::HealthResp,
        portal::domain::paging::SelectOption,
    )),
    tags(
        (name = "Health", description = "System health checks"),
        (name = "Lookups", description = "Select options for cascading form fields")
    )
)]
struct ApiDoc;

fn record_repositories(pool: &sqlx::PgPool) -> RecordRepositories {
    RecordRepositories {
        departments: Arc::new(SqlxDepartmentRepository::new(pool.clone())),
        municipalities: Arc::new(SqlxMunicipalityRepository::new(pool.clone())),
        mayoralties: Arc::new(SqlxMayoraltyRepository::new(pool.clone())),
        mayors: Arc::new(SqlxMayorRepository::new(pool.clone())),
        sdgs: Arc::new(SqlxSdgRepository::new(pool.clone())),
        national_plans: Arc::new(SqlxNationalPlanRepository::new(pool.clone())),
        departmental_plans: Arc::new(SqlxDepartmentalPlanRepository::new(pool.clone())),
        municipal_plans: Arc::new(SqlxMunicipalPlanRepository::new(pool.clone())),
        programs: Arc::new(SqlxProgramRepository::new(pool.clone())),
        products: Arc::new(SqlxProductRepository::new(pool.clone())),
        indicators: Arc::new(SqlxIndicatorRepository::new(pool.clone())),
        secretariats: Arc::new(SqlxSecretariatRepository::new(pool.clone())),
        subsecretariats: Arc::new(SqlxSubsecretariatRepository::new(pool.clone())),
        responsibles: Arc::new(SqlxResponsibleRepository::new(pool.clone())),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = ?e, "ctrl_c_handler_failed");
        }
    };
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = ?e, "sigterm_handler_failed");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown_requested");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("portal=debug,tower_http=info,axum=info,sqlx=warn")
        }))
        .init();

    let cfg = Config::from_env()?;
    info!(
        port = cfg.port,
        uploads_dir = %cfg.uploads_dir,
        upload_max_bytes = cfg.upload_max_bytes,
        templates_dir = %cfg.templates_dir,
        page_size = cfg.page_size,
        is_production = cfg.is_production,
        "Starting municipal management portal"
    );

    // Database
    let pool =
        portal::infrastructure::db::connect_pool(&cfg.database_url, cfg.db_max_connections).await?;
    portal::infrastructure::db::migrate(&pool).await?;

    // Ensure uploads dir exists
    tokio::fs::create_dir_all(&cfg.uploads_dir).await?;

    let user_repo = Arc::new(SqlxUserRepository::new(pool.clone()));
    if let Some(seed) = &cfg.admin {
        let created = EnsureAdmin {
            repo: user_repo.as_ref(),
        }
        .execute(&seed.email, &seed.name, &seed.password)
        .await?;
        if let Some(admin) = created {
            info!(user_id = %admin.id, email = %admin.email, "bootstrap_admin_created");
        }
    }

    let services = AppServices::new(
        record_repositories(&pool),
        user_repo,
        Arc::new(SqlxEvidenceRepository::new(pool.clone())),
        Arc::new(FsEvidenceStore::new(&cfg.uploads_dir)),
        Arc::new(SqlxDashboardRepository::new(pool.clone())),
    );
    let templates = views::load_templates(&cfg.templates_dir)?;
    let ctx = AppContext::new(cfg.clone(), services, templates);

    let app = Router::new()
        .nest("/api", http::health::routes(pool.clone()))
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", ApiDoc::openapi()))
        .merge(http::router(ctx))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &axum::http::Request<_>| {
                let method = req.method().clone();
                let uri = req.uri().clone();
                let matched = req
                    .extensions()
                    .get::<MatchedPath>()
                    .map(|p| p.as_str().to_string())
                    .unwrap_or_default();
                tracing::info_span!("http", %method, %uri, matched_path = %matched)
            }),
        );

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    info!(%addr, "HTTP listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
