use std::str::FromStr;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::bootstrap::app_context::AppContext;
use crate::domain::paging::SelectOption;
use crate::presentation::http::auth::CurrentUser;

/// Option sources for `<select>` inputs and the lookup endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    Departments,
    Municipalities,
    Mayoralties,
    Sdgs,
    NationalPlans,
    DepartmentalPlans,
    MunicipalPlans,
    Programs,
    Products,
    Secretariats,
    Subsecretariats,
    Responsibles,
}

impl LookupKind {
    pub const ALL: [LookupKind; 12] = [
        LookupKind::Departments,
        LookupKind::Municipalities,
        LookupKind::Mayoralties,
        LookupKind::Sdgs,
        LookupKind::NationalPlans,
        LookupKind::DepartmentalPlans,
        LookupKind::MunicipalPlans,
        LookupKind::Programs,
        LookupKind::Products,
        LookupKind::Secretariats,
        LookupKind::Subsecretariats,
        LookupKind::Responsibles,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LookupKind::Departments => "departments",
            LookupKind::Municipalities => "municipalities",
            LookupKind::Mayoralties => "mayoralties",
            LookupKind::Sdgs => "sdgs",
            LookupKind::NationalPlans => "national-plans",
            LookupKind::DepartmentalPlans => "departmental-plans",
            LookupKind::MunicipalPlans => "municipal-plans",
            LookupKind::Programs => "programs",
            LookupKind::Products => "products",
            LookupKind::Secretariats => "secretariats",
            LookupKind::Subsecretariats => "subsecretariats",
            LookupKind::Responsibles => "responsibles",
        }
    }
}

impl FromStr for LookupKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LookupKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown lookup: {}", s))
    }
}

pub async fn options(
    ctx: &AppContext,
    kind: LookupKind,
    parent: Option<Uuid>,
) -> anyhow::Result<Vec<SelectOption>> {
    let r = ctx.records();
    match kind {
        LookupKind::Departments => r.departments.options(parent).await,
        LookupKind::Municipalities => r.municipalities.options(parent).await,
        LookupKind::Mayoralties => r.mayoralties.options(parent).await,
        LookupKind::Sdgs => r.sdgs.options(parent).await,
        LookupKind::NationalPlans => r.national_plans.options(parent).await,
        LookupKind::DepartmentalPlans => r.departmental_plans.options(parent).await,
        LookupKind::MunicipalPlans => r.municipal_plans.options(parent).await,
        LookupKind::Programs => r.programs.options(parent).await,
        LookupKind::Products => r.products.options(parent).await,
        LookupKind::Secretariats => r.secretariats.options(parent).await,
        LookupKind::Subsecretariats => r.subsecretariats.options(parent).await,
        LookupKind::Responsibles => r.responsibles.options(parent).await,
    }
}

pub fn routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/lookups/:kind", get(lookup))
        .with_state(ctx)
}

#[derive(Debug, Default, Deserialize)]
pub struct LookupQuery {
    pub parent: Option<Uuid>,
}

#[utoipa::path(
    get,
    path = "/api/lookups/{kind}",
    tag = "Lookups",
    params(
        ("kind" = String, Path, description = "Entity collection, e.g. municipalities"),
        ("parent" = Option<Uuid>, Query, description = "Restrict to children of this record")
    ),
    responses(
        (status = 200, body = [SelectOption]),
        (status = 401, description = "No valid session"),
        (status = 404, description = "Unknown lookup")
    )
)]
pub async fn lookup(
    State(ctx): State<AppContext>,
    user: Option<CurrentUser>,
    Path(kind): Path<String>,
    Query(q): Query<LookupQuery>,
) -> Result<Json<Vec<SelectOption>>, StatusCode> {
    if user.is_none() {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let kind = kind.parse::<LookupKind>().map_err(|_| StatusCode::NOT_FOUND)?;
    let items = options(&ctx, kind, q.parent).await.map_err(|e| {
        tracing::error!(error = ?e, lookup = kind.as_str(), "lookup_failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(items))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_parse_from_their_slug() {
        for kind in LookupKind::ALL {
            assert_eq!(kind.as_str().parse::<LookupKind>().unwrap(), kind);
        }
        assert!("users".parse::<LookupKind>().is_err());
    }
}
