use axum::{
    Form, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::application::errors::ServiceError;
use crate::application::use_cases::users::create_user::CreateUser;
use crate::application::use_cases::users::list_users::ListUsers;
use crate::application::use_cases::users::reset_password::ResetPassword;
use crate::application::use_cases::users::update_user::UpdateUser;
use crate::bootstrap::app_context::AppContext;
use crate::domain::paging::{ListFilter, PageRequest};
use crate::domain::users::{NewUser, Role, User, UserUpdate};
use crate::domain::validation::FieldErrors;
use crate::presentation::http::auth::{CurrentUser, require};
use crate::presentation::http::error::PageError;
use crate::presentation::http::resource::parse_id;
use crate::presentation::http::views;

pub fn routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/new", get(new_user_form))
        .route("/:id", post(update_user))
        .route("/:id/edit", get(edit_user_form))
        .route("/:id/password", post(reset_password))
        .with_state(ctx)
}

#[derive(Debug, Serialize)]
struct RoleOption {
    value: &'static str,
    label: &'static str,
}

fn role_options() -> Vec<RoleOption> {
    Role::ALL
        .iter()
        .map(|r| RoleOption {
            value: r.as_str(),
            label: r.label(),
        })
        .collect()
}

#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub page: Option<String>,
    pub q: Option<String>,
    pub notice: Option<String>,
}

pub async fn list_users(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    Query(q): Query<UserListQuery>,
) -> Result<Response, PageError> {
    require(&user, Role::Admin)?;
    let filter = ListFilter {
        page: PageRequest::new(
            q.page.as_deref().and_then(|p| p.trim().parse().ok()),
            Some(ctx.cfg.page_size),
        ),
        search: q.q.clone(),
        parent_id: None,
        include_inactive: true,
    };
    let repo = ctx.user_repo();
    let page = ListUsers {
        repo: repo.as_ref(),
    }
    .execute(&filter)
    .await?;

    let mut context = views::page_context(&user);
    context.insert("users", &page.items);
    context.insert("page", &page.page);
    context.insert("total", &page.total);
    context.insert("total_pages", &page.total_pages());
    context.insert("has_previous", &page.has_previous());
    context.insert("has_next", &page.has_next());
    context.insert("q", filter.search_term().unwrap_or(""));
    context.insert("notice", &views::notice_message(q.notice.as_deref()));
    Ok(views::render(&ctx, "users/list.html", &context)?.into_response())
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct NewUserForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default, skip_serializing)]
    pub password: String,
}

fn render_new_user(
    ctx: &AppContext,
    user: &User,
    form: &NewUserForm,
    errors: &FieldErrors,
    status: StatusCode,
) -> Result<Response, PageError> {
    let mut context = views::page_context(user);
    context.insert("form", form);
    context.insert("errors", errors);
    context.insert("roles", &role_options());
    views::render_with_status(ctx, status, "users/new.html", &context)
}

pub async fn new_user_form(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
) -> Result<Response, PageError> {
    require(&user, Role::Admin)?;
    let form = NewUserForm {
        role: Role::Viewer.as_str().into(),
        ..NewUserForm::default()
    };
    render_new_user(&ctx, &user, &form, &FieldErrors::new(), StatusCode::OK)
}

pub async fn create_user(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<NewUserForm>,
) -> Result<Response, PageError> {
    require(&user, Role::Admin)?;
    let Ok(role) = form.role.parse::<Role>() else {
        let errors = FieldErrors::single("role", "Select a role");
        return render_new_user(&ctx, &user, &form, &errors, StatusCode::UNPROCESSABLE_ENTITY);
    };
    let req = NewUser {
        email: form.email.clone(),
        name: form.name.clone(),
        role,
        password: form.password.clone(),
    };
    let repo = ctx.user_repo();
    match (CreateUser {
        repo: repo.as_ref(),
    })
    .execute(&req)
    .await
    {
        Ok(_) => Ok(Redirect::to("/users?notice=created").into_response()),
        Err(ServiceError::Validation(errors)) => {
            render_new_user(&ctx, &user, &form, &errors, StatusCode::UNPROCESSABLE_ENTITY)
        }
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug, Deserialize)]
pub struct EditUserForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub is_active: Option<String>,
}

fn render_edit_user(
    ctx: &AppContext,
    actor: &User,
    target: &User,
    errors: &FieldErrors,
    notice: Option<&'static str>,
    status: StatusCode,
) -> Result<Response, PageError> {
    let mut context = views::page_context(actor);
    context.insert("notice", &notice);
    context.insert("target", target);
    context.insert("errors", errors);
    context.insert("roles", &role_options());
    context.insert("is_self", &(actor.id == target.id));
    views::render_with_status(ctx, status, "users/edit.html", &context)
}

async fn load_user(ctx: &AppContext, raw_id: &str) -> Result<User, PageError> {
    let id = parse_id(raw_id)?;
    ctx.user_repo()
        .find_by_id(id)
        .await?
        .map(|row| row.user)
        .ok_or(PageError::NotFound)
}

pub async fn edit_user_form(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Query(q): Query<UserListQuery>,
) -> Result<Response, PageError> {
    require(&user, Role::Admin)?;
    let target = load_user(&ctx, &id).await?;
    let notice = views::notice_message(q.notice.as_deref());
    render_edit_user(&ctx, &user, &target, &FieldErrors::new(), notice, StatusCode::OK)
}

pub async fn update_user(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<EditUserForm>,
) -> Result<Response, PageError> {
    require(&user, Role::Admin)?;
    let mut target = load_user(&ctx, &id).await?;
    let role = form.role.parse::<Role>().unwrap_or(target.role);
    let req = UserUpdate {
        name: form.name.clone(),
        role,
        is_active: form.is_active.is_some(),
    };
    let repo = ctx.user_repo();
    match (UpdateUser {
        repo: repo.as_ref(),
    })
    .execute(user.id, target.id, &req)
    .await
    {
        Ok(updated) => {
            Ok(Redirect::to(&format!("/users/{}/edit?notice=updated", updated.id)).into_response())
        }
        Err(ServiceError::Validation(errors)) => {
            target.name = req.name;
            render_edit_user(&ctx, &user, &target, &errors, None, StatusCode::UNPROCESSABLE_ENTITY)
        }
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordForm {
    #[serde(default)]
    pub password: String,
}

pub async fn reset_password(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<ResetPasswordForm>,
) -> Result<Response, PageError> {
    require(&user, Role::Admin)?;
    let target = load_user(&ctx, &id).await?;
    let repo = ctx.user_repo();
    match (ResetPassword {
        repo: repo.as_ref(),
    })
    .execute(target.id, &form.password)
    .await
    {
        Ok(()) => Ok(
            Redirect::to(&format!("/users/{}/edit?notice=password_reset", target.id))
                .into_response(),
        ),
        Err(ServiceError::Validation(errors)) => {
            render_edit_user(&ctx, &user, &target, &errors, None, StatusCode::UNPROCESSABLE_ENTITY)
        }
        Err(e) => Err(e.into()),
    }
}
