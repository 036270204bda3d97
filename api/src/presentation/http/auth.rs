use axum::{
    Form, Router,
    extract::{FromRequestParts, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header, request::Parts},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::access;
use crate::application::errors::ServiceError;
use crate::application::use_cases::auth::change_password::{
    ChangePassword, ChangePasswordRequest,
};
use crate::application::use_cases::auth::login::{Login, LoginRequest};
use crate::bootstrap::app_context::AppContext;
use crate::bootstrap::config::Config;
use crate::domain::users::{Role, User};
use crate::presentation::http::error::PageError;
use crate::presentation::http::views;

pub const SESSION_COOKIE: &str = "portal_session";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

pub fn routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/login", get(login_form).post(login))
        .route("/logout", axum::routing::post(logout))
        .route("/account/password", get(password_form).post(change_password))
        .with_state(ctx)
}

/// Signed-in, active user resolved from the session cookie.
pub struct CurrentUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AppContext> for CurrentUser {
    type Rejection = PageError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let next = parts
            .uri
            .path_and_query()
            .map(|p| p.as_str().to_string())
            .unwrap_or_else(|| "/".into());
        let unauthenticated = || PageError::Unauthenticated { next: next.clone() };

        let token = parts
            .headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|h| get_cookie(h, SESSION_COOKIE))
            .ok_or_else(unauthenticated)?;
        let user_id = decode_session(&ctx.cfg, &token).ok_or_else(unauthenticated)?;
        let row = ctx
            .user_repo()
            .find_by_id(user_id)
            .await?
            .ok_or_else(unauthenticated)?;
        if !row.user.is_active {
            return Err(unauthenticated());
        }
        Ok(CurrentUser(row.user))
    }
}

pub fn require(user: &User, role: Role) -> Result<(), PageError> {
    access::require_role(user, role).map_err(|_| {
        tracing::warn!(user_id = %user.id, role = %user.role, required = %role, "access_denied");
        PageError::Forbidden
    })
}

pub fn issue_session(cfg: &Config, user_id: Uuid) -> anyhow::Result<String> {
    let now = chrono::Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        exp: now + cfg.session_expires_secs.max(0) as usize,
    };
    let token = jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(cfg.session_secret.as_bytes()),
    )?;
    Ok(token)
}

pub fn decode_session(cfg: &Config, token: &str) -> Option<Uuid> {
    let data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(cfg.session_secret.as_bytes()),
        &Validation::default(),
    )
    .ok()?;
    Uuid::parse_str(&data.claims.sub).ok()
}

pub fn get_cookie(header: &str, name: &str) -> Option<String> {
    for part in header.split(';') {
        let kv = part.trim();
        if let Some((k, v)) = kv.split_once('=') {
            if k.trim() == name {
                return Some(v.trim().to_string());
            }
        }
    }
    None
}

pub fn build_session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut s = format!("{}={}; HttpOnly", SESSION_COOKIE, token);
    if secure {
        s.push_str("; Secure");
    }
    s.push_str(&format!("; Path=/; Max-Age={}; SameSite=Lax", max_age_secs.max(0)));
    s
}

/// Only local absolute paths are followed after login.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(n)
            if n.starts_with('/')
                && !n.starts_with("//")
                && !n.contains('\\')
                && !n.chars().any(char::is_control) =>
        {
            n
        }
        _ => "/",
    }
}

fn with_cookie(mut resp: Response, cookie: &str) -> Response {
    if let Ok(v) = HeaderValue::from_str(cookie) {
        resp.headers_mut().insert(header::SET_COOKIE, v);
    }
    resp
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

fn login_context(email: &str, next: &str, error: Option<&str>) -> tera::Context {
    let mut context = tera::Context::new();
    context.insert("user", &None::<()>);
    context.insert("email", email);
    context.insert("next", next);
    context.insert("error", &error);
    context
}

pub async fn login_form(
    State(ctx): State<AppContext>,
    user: Option<CurrentUser>,
    Query(q): Query<LoginQuery>,
) -> Result<Response, PageError> {
    let next = safe_next(q.next.as_deref());
    if user.is_some() {
        return Ok(Redirect::to(next).into_response());
    }
    Ok(views::render(&ctx, "login.html", &login_context("", next, None))?.into_response())
}

pub async fn login(
    State(ctx): State<AppContext>,
    Form(form): Form<LoginForm>,
) -> Result<Response, PageError> {
    let next = safe_next(form.next.as_deref()).to_string();
    let repo = ctx.user_repo();
    let uc = Login {
        repo: repo.as_ref(),
    };
    let req = LoginRequest {
        email: form.email.clone(),
        password: form.password,
    };
    let Some(user) = uc.execute(&req).await? else {
        tracing::info!(email = %form.email.trim(), "login_failed");
        let context = login_context(&form.email, &next, Some("Invalid email or password"));
        return views::render_with_status(&ctx, StatusCode::UNAUTHORIZED, "login.html", &context);
    };
    let token = issue_session(&ctx.cfg, user.id)?;
    let cookie = build_session_cookie(&token, ctx.cfg.session_expires_secs, ctx.cfg.secure_cookies());
    tracing::info!(user_id = %user.id, role = %user.role, "user_login");
    Ok(with_cookie(Redirect::to(&next).into_response(), &cookie))
}

pub async fn logout(State(ctx): State<AppContext>, headers: HeaderMap) -> Response {
    let had_session = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| get_cookie(h, SESSION_COOKIE))
        .and_then(|t| decode_session(&ctx.cfg, &t));
    if let Some(user_id) = had_session {
        tracing::info!(user_id = %user_id, "user_logout");
    }
    let cookie = build_session_cookie("", 0, ctx.cfg.secure_cookies());
    with_cookie(Redirect::to("/login").into_response(), &cookie)
}

#[derive(Debug, Deserialize)]
pub struct PasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

pub async fn password_form(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
) -> Result<Response, PageError> {
    let mut context = views::page_context(&user);
    context.insert("errors", &crate::domain::validation::FieldErrors::new());
    Ok(views::render(&ctx, "account/password.html", &context)?.into_response())
}

pub async fn change_password(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<PasswordForm>,
) -> Result<Response, PageError> {
    let repo = ctx.user_repo();
    let uc = ChangePassword {
        repo: repo.as_ref(),
    };
    let req = ChangePasswordRequest {
        current_password: form.current_password,
        new_password: form.new_password,
        confirm_password: form.confirm_password,
    };
    match uc.execute(user.id, &req).await {
        Ok(()) => Ok(Redirect::to("/?notice=password_changed").into_response()),
        Err(ServiceError::Validation(errors)) => {
            let mut context = views::page_context(&user);
            context.insert("errors", &errors);
            views::render_with_status(
                &ctx,
                StatusCode::UNPROCESSABLE_ENTITY,
                "account/password.html",
                &context,
            )
        }
        Err(e) => Err(e.into()),
    }
}
