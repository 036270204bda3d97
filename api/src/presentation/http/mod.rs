pub mod auth;
pub mod dashboard;
pub mod error;
pub mod evidence;
pub mod forms;
pub mod health;
pub mod lookups;
pub mod organization;
pub mod planning;
pub mod resource;
pub mod territory;
pub mod users;
pub mod views;

use axum::{Router, middleware};
use tower_http::services::ServeDir;

use crate::bootstrap::app_context::AppContext;
use organization::{Responsibles, Secretariats, Subsecretariats};
use planning::{
    DepartmentalPlans, Indicators, MunicipalPlans, NationalPlans, Products, Programs, Sdgs,
};
use resource::Resource;
use territory::{Departments, Mayoralties, Mayors, Municipalities};

fn nest_resource<R: Resource>(router: Router, ctx: &AppContext) -> Router {
    router.nest(R::PATH, resource::routes::<R>(ctx.clone()))
}

async fn not_found() -> error::PageError {
    error::PageError::NotFound
}

/// Every page and the session-protected JSON endpoints. Health and API docs
/// are mounted by the binary.
pub fn router(ctx: AppContext) -> Router {
    let mut app = Router::new()
        .merge(dashboard::routes(ctx.clone()))
        .merge(auth::routes(ctx.clone()))
        .merge(evidence::routes(ctx.clone()))
        .nest("/users", users::routes(ctx.clone()))
        .nest("/api", lookups::routes(ctx.clone()));

    app = nest_resource::<Departments>(app, &ctx);
    app = nest_resource::<Municipalities>(app, &ctx);
    app = nest_resource::<Mayoralties>(app, &ctx);
    app = nest_resource::<Mayors>(app, &ctx);
    app = nest_resource::<Sdgs>(app, &ctx);
    app = nest_resource::<NationalPlans>(app, &ctx);
    app = nest_resource::<DepartmentalPlans>(app, &ctx);
    app = nest_resource::<MunicipalPlans>(app, &ctx);
    app = nest_resource::<Programs>(app, &ctx);
    app = nest_resource::<Products>(app, &ctx);
    app = nest_resource::<Indicators>(app, &ctx);
    app = nest_resource::<Secretariats>(app, &ctx);
    app = nest_resource::<Subsecretariats>(app, &ctx);
    app = nest_resource::<Responsibles>(app, &ctx);

    app.nest_service("/static", ServeDir::new(&ctx.cfg.static_dir))
        .fallback(not_found)
        .layer(middleware::map_response_with_state(
            ctx,
            error::render_error_pages,
        ))
}
