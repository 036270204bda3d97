use std::sync::Arc;

use axum::{
    Form, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::access;
use crate::application::errors::ServiceError;
use crate::application::ports::record_repository::RecordRepository;
use crate::application::use_cases::records::get_record::GetRecord;
use crate::application::use_cases::records::list_records::ListRecords;
use crate::application::use_cases::records::save_record::SaveRecord;
use crate::application::use_cases::records::set_record_active::SetRecordActive;
use crate::bootstrap::app_context::AppContext;
use crate::domain::paging::{ListFilter, PageRequest};
use crate::domain::users::{Role, User};
use crate::domain::validation::{FieldErrors, Validate};
use crate::presentation::http::auth::{CurrentUser, require};
use crate::presentation::http::error::PageError;
use crate::presentation::http::forms::{FieldSpec, FormData, field_views};
use crate::presentation::http::lookups::{self, LookupKind};
use crate::presentation::http::views;

pub type Repo<R> =
    dyn RecordRepository<Record = <R as Resource>::Record, Input = <R as Resource>::Input>;

/// Filter a listing by its parent record through `?parent=<id>`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ParentFilter {
    pub field: &'static str,
    pub label: &'static str,
    #[serde(skip)]
    pub lookup: LookupKind,
}

/// Link from a record page to the filtered listing of its children.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ChildLink {
    pub label: &'static str,
    pub path: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Detail {
    pub label: &'static str,
    pub value: String,
    pub link: Option<String>,
}

impl Detail {
    pub fn text(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
            link: None,
        }
    }

    pub fn opt(label: &'static str, value: Option<&str>) -> Self {
        Self::text(label, value.unwrap_or("-"))
    }

    pub fn link(label: &'static str, value: impl Into<String>, path: &str, id: Uuid) -> Self {
        Self {
            label,
            value: value.into(),
            link: Some(format!("{}/{}", path, id)),
        }
    }

    pub fn opt_link(label: &'static str, value: Option<&str>, path: &str, id: Option<Uuid>) -> Self {
        match (value, id) {
            (Some(v), Some(id)) => Self::link(label, v, path, id),
            _ => Self::text(label, "-"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RowView {
    pub id: Uuid,
    pub cells: Vec<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize)]
struct ResourceMeta {
    path: &'static str,
    title: &'static str,
    singular: &'static str,
    can_edit: bool,
    parent: Option<ParentFilter>,
    columns: &'static [&'static str],
}

/// One catalog entity exposed as a set of server-rendered pages.
#[async_trait::async_trait]
pub trait Resource: Send + Sync + 'static {
    type Record: Serialize + Send + Sync + 'static;
    type Input: Validate + for<'r> From<&'r Self::Record> + Send + Sync + 'static;

    const PATH: &'static str;
    const TITLE: &'static str;
    const SINGULAR: &'static str;
    const EDIT_ROLE: Role;
    const PARENT: Option<ParentFilter> = None;
    const COLUMNS: &'static [&'static str];
    const FIELDS: &'static [FieldSpec];
    const CHILDREN: &'static [ChildLink] = &[];

    fn repo(ctx: &AppContext) -> Arc<Repo<Self>>;
    fn id(record: &Self::Record) -> Uuid;
    fn title(record: &Self::Record) -> String;
    fn is_active(record: &Self::Record) -> bool;
    fn row(record: &Self::Record) -> Vec<String>;
    fn details(record: &Self::Record) -> Vec<Detail>;
    fn form_values(record: &Self::Record) -> FormData;

    /// Conversion problems are returned next to a best-effort input.
    fn parse(form: &FormData) -> (Self::Input, FieldErrors);

    /// Extra sections for the record page.
    async fn decorate(
        _ctx: &AppContext,
        _record: &Self::Record,
        _user: &User,
        _context: &mut tera::Context,
    ) -> Result<(), PageError> {
        Ok(())
    }
}

pub fn routes<R: Resource>(ctx: AppContext) -> Router {
    Router::new()
        .route("/", get(list::<R>).post(create::<R>))
        .route("/new", get(new_form::<R>))
        .route("/:id", get(show::<R>).post(update::<R>))
        .route("/:id/edit", get(edit_form::<R>))
        .route("/:id/deactivate", post(deactivate::<R>))
        .route("/:id/activate", post(activate::<R>))
        .with_state(ctx)
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub q: Option<String>,
    pub parent: Option<String>,
    pub inactive: Option<String>,
    pub notice: Option<String>,
}

impl ListQuery {
    fn parent_id(&self) -> Option<Uuid> {
        self.parent
            .as_deref()
            .and_then(|p| Uuid::parse_str(p.trim()).ok())
    }

    fn include_inactive(&self) -> bool {
        matches!(self.inactive.as_deref(), Some("1" | "on" | "true"))
    }

    fn page(&self) -> Option<i64> {
        self.page.as_deref().and_then(|p| p.trim().parse().ok())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct NoticeQuery {
    pub notice: Option<String>,
    pub parent: Option<String>,
}

pub fn parse_id(raw: &str) -> Result<Uuid, PageError> {
    Uuid::parse_str(raw).map_err(|_| PageError::NotFound)
}

fn meta<R: Resource>(user: &User) -> ResourceMeta {
    ResourceMeta {
        path: R::PATH,
        title: R::TITLE,
        singular: R::SINGULAR,
        can_edit: access::can(user, R::EDIT_ROLE),
        parent: R::PARENT,
        columns: R::COLUMNS,
    }
}

pub async fn list<R: Resource>(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    Query(q): Query<ListQuery>,
) -> Result<Response, PageError> {
    let filter = ListFilter {
        page: PageRequest::new(q.page(), Some(ctx.cfg.page_size)),
        search: q.q.clone(),
        parent_id: R::PARENT.and(q.parent_id()),
        include_inactive: q.include_inactive(),
    };
    let repo = R::repo(&ctx);
    let page = ListRecords {
        repo: repo.as_ref(),
    }
    .execute(&filter)
    .await?;

    let rows: Vec<RowView> = page
        .items
        .iter()
        .map(|r| RowView {
            id: R::id(r),
            cells: R::row(r),
            is_active: R::is_active(r),
        })
        .collect();

    let mut context = views::page_context(&user);
    context.insert("resource", &meta::<R>(&user));
    context.insert("rows", &rows);
    context.insert("page", &page.page);
    context.insert("total", &page.total);
    context.insert("total_pages", &page.total_pages());
    context.insert("has_previous", &page.has_previous());
    context.insert("has_next", &page.has_next());
    context.insert("q", filter.search_term().unwrap_or(""));
    context.insert("inactive", &filter.include_inactive);
    context.insert(
        "parent_id",
        &filter.parent_id.map(|id| id.to_string()).unwrap_or_default(),
    );
    if let Some(parent) = R::PARENT {
        let options = lookups::options(&ctx, parent.lookup, None).await?;
        context.insert("parent_options", &options);
    }
    context.insert("notice", &views::notice_message(q.notice.as_deref()));
    Ok(views::render(&ctx, "records/list.html", &context)?.into_response())
}

async fn render_form<R: Resource>(
    ctx: &AppContext,
    user: &User,
    data: &FormData,
    errors: &FieldErrors,
    record_id: Option<Uuid>,
    status: StatusCode,
) -> Result<Response, PageError> {
    let fields = field_views(ctx, R::FIELDS, data, errors).await?;
    let (action, cancel) = match record_id {
        Some(id) => (
            format!("{}/{}", R::PATH, id),
            format!("{}/{}", R::PATH, id),
        ),
        None => (R::PATH.to_string(), R::PATH.to_string()),
    };
    let mut context = views::page_context(user);
    context.insert("resource", &meta::<R>(user));
    context.insert("fields", &fields);
    context.insert("action", &action);
    context.insert("cancel", &cancel);
    context.insert("editing", &record_id.is_some());
    context.insert("has_errors", &!errors.is_empty());
    views::render_with_status(ctx, status, "records/form.html", &context)
}

pub async fn new_form<R: Resource>(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    Query(q): Query<NoticeQuery>,
) -> Result<Response, PageError> {
    require(&user, R::EDIT_ROLE)?;
    let mut data = FormData::default();
    if let (Some(parent), Some(raw)) = (R::PARENT, q.parent.as_deref()) {
        if let Ok(id) = Uuid::parse_str(raw.trim()) {
            data.set(parent.field, id.to_string());
        }
    }
    render_form::<R>(&ctx, &user, &data, &FieldErrors::new(), None, StatusCode::OK).await
}

/// Parses the body, then runs validation so every problem is reported at once.
fn parse_input<R: Resource>(data: &FormData) -> Result<R::Input, FieldErrors> {
    let (input, mut errors) = R::parse(data);
    if errors.is_empty() {
        return Ok(input);
    }
    errors.merge(input.validate());
    Err(errors)
}

pub async fn create<R: Resource>(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, PageError> {
    require(&user, R::EDIT_ROLE)?;
    let data = FormData::new(pairs);
    let input = match parse_input::<R>(&data) {
        Ok(input) => input,
        Err(errors) => {
            return render_form::<R>(&ctx, &user, &data, &errors, None, StatusCode::UNPROCESSABLE_ENTITY)
                .await;
        }
    };
    let repo = R::repo(&ctx);
    match (SaveRecord {
        repo: repo.as_ref(),
    })
    .create(&input)
    .await
    {
        Ok(record) => {
            let id = R::id(&record);
            tracing::info!(entity = R::SINGULAR, record_id = %id, user_id = %user.id, "record_created");
            Ok(Redirect::to(&format!("{}/{}?notice=created", R::PATH, id)).into_response())
        }
        Err(ServiceError::Validation(errors)) => {
            render_form::<R>(&ctx, &user, &data, &errors, None, StatusCode::UNPROCESSABLE_ENTITY)
                .await
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn show<R: Resource>(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Query(q): Query<NoticeQuery>,
) -> Result<Response, PageError> {
    let id = parse_id(&id)?;
    let repo = R::repo(&ctx);
    let record = GetRecord {
        repo: repo.as_ref(),
    }
    .execute(id)
    .await?;

    let mut context = views::page_context(&user);
    context.insert("resource", &meta::<R>(&user));
    context.insert("record_id", &id);
    context.insert("record_title", &R::title(&record));
    context.insert("record_active", &R::is_active(&record));
    context.insert("details", &R::details(&record));
    context.insert("children", R::CHILDREN);
    context.insert("notice", &views::notice_message(q.notice.as_deref()));
    R::decorate(&ctx, &record, &user, &mut context).await?;
    Ok(views::render(&ctx, "records/show.html", &context)?.into_response())
}

pub async fn edit_form<R: Resource>(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, PageError> {
    require(&user, R::EDIT_ROLE)?;
    let id = parse_id(&id)?;
    let repo = R::repo(&ctx);
    let record = GetRecord {
        repo: repo.as_ref(),
    }
    .execute(id)
    .await?;
    let data = R::form_values(&record);
    render_form::<R>(&ctx, &user, &data, &FieldErrors::new(), Some(id), StatusCode::OK).await
}

pub async fn update<R: Resource>(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, PageError> {
    require(&user, R::EDIT_ROLE)?;
    let id = parse_id(&id)?;
    let data = FormData::new(pairs);
    let input = match parse_input::<R>(&data) {
        Ok(input) => input,
        Err(errors) => {
            return render_form::<R>(&ctx, &user, &data, &errors, Some(id), StatusCode::UNPROCESSABLE_ENTITY)
                .await;
        }
    };
    let repo = R::repo(&ctx);
    match (SaveRecord {
        repo: repo.as_ref(),
    })
    .update(id, &input)
    .await
    {
        Ok(_) => {
            tracing::info!(entity = R::SINGULAR, record_id = %id, user_id = %user.id, "record_updated");
            Ok(Redirect::to(&format!("{}/{}?notice=updated", R::PATH, id)).into_response())
        }
        Err(ServiceError::Validation(errors)) => {
            render_form::<R>(&ctx, &user, &data, &errors, Some(id), StatusCode::UNPROCESSABLE_ENTITY)
                .await
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn deactivate<R: Resource>(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, PageError> {
    require(&user, R::EDIT_ROLE)?;
    let id = parse_id(&id)?;
    let repo = R::repo(&ctx);
    match (SetRecordActive {
        repo: repo.as_ref(),
    })
    .deactivate(id)
    .await
    {
        Ok(()) => {
            tracing::info!(entity = R::SINGULAR, record_id = %id, user_id = %user.id, "record_deactivated");
            Ok(Redirect::to(&format!("{}/{}?notice=deactivated", R::PATH, id)).into_response())
        }
        Err(ServiceError::InUse { dependents }) => {
            tracing::info!(entity = R::SINGULAR, record_id = %id, dependents, "record_in_use");
            Ok(Redirect::to(&format!("{}/{}?notice=in_use", R::PATH, id)).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn activate<R: Resource>(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, PageError> {
    require(&user, R::EDIT_ROLE)?;
    let id = parse_id(&id)?;
    let repo = R::repo(&ctx);
    match (SetRecordActive {
        repo: repo.as_ref(),
    })
    .activate(id)
    .await
    {
        Ok(()) => {
            tracing::info!(entity = R::SINGULAR, record_id = %id, user_id = %user.id, "record_activated");
            Ok(Redirect::to(&format!("{}/{}?notice=activated", R::PATH, id)).into_response())
        }
        Err(ServiceError::Validation(errors)) => {
            tracing::info!(entity = R::SINGULAR, record_id = %id, "record_activation_blocked");
            Err(PageError::BadRequest(format!(
                "The record cannot be activated: {}",
                errors
            )))
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_query_is_lenient() {
        let q = ListQuery {
            page: Some("abc".into()),
            parent: Some("".into()),
            inactive: Some("on".into()),
            ..ListQuery::default()
        };
        assert_eq!(q.page(), None);
        assert_eq!(q.parent_id(), None);
        assert!(q.include_inactive());

        let id = Uuid::new_v4();
        let q = ListQuery {
            page: Some(" 3 ".into()),
            parent: Some(id.to_string()),
            ..ListQuery::default()
        };
        assert_eq!(q.page(), Some(3));
        assert_eq!(q.parent_id(), Some(id));
        assert!(!q.include_inactive());
    }

    #[test]
    fn malformed_ids_are_not_found() {
        assert!(matches!(parse_id("42"), Err(PageError::NotFound)));
        assert!(parse_id(&Uuid::new_v4().to_string()).is_ok());
    }

    #[test]
    fn optional_links_fall_back_to_dash() {
        let d = Detail::opt_link("Secretariat", None, "/secretariats", Some(Uuid::nil()));
        assert_eq!(d.value, "-");
        assert!(d.link.is_none());
        let id = Uuid::new_v4();
        let d = Detail::opt_link("Secretariat", Some("Hacienda"), "/secretariats", Some(id));
        assert_eq!(d.link, Some(format!("/secretariats/{}", id)));
    }
}
