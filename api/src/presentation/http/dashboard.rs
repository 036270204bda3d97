use axum::{
    Router,
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
};

use crate::application::use_cases::dashboard::get_dashboard::GetDashboard;
use crate::bootstrap::app_context::AppContext;
use crate::presentation::http::auth::CurrentUser;
use crate::presentation::http::error::PageError;
use crate::presentation::http::resource::NoticeQuery;
use crate::presentation::http::views;

pub fn routes(ctx: AppContext) -> Router {
    Router::new().route("/", get(dashboard)).with_state(ctx)
}

pub async fn dashboard(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    Query(q): Query<NoticeQuery>,
) -> Result<Response, PageError> {
    let repo = ctx.dashboard_repo();
    let data = GetDashboard {
        repo: repo.as_ref(),
    }
    .execute()
    .await?;
    let mut context = views::page_context(&user);
    context.insert("dashboard", &data);
    context.insert("notice", &views::notice_message(q.notice.as_deref()));
    Ok(views::render(&ctx, "dashboard.html", &context)?.into_response())
}
