use axum::extract::State;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};

use crate::application::errors::ServiceError;
use crate::bootstrap::app_context::AppContext;

/// Failure of a page handler. Validation errors never reach this type; the
/// handler re-renders its form instead.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("authentication required")]
    Unauthenticated { next: String },
    #[error("forbidden")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Attached to error responses and turned into HTML by [`render_error_pages`].
#[derive(Debug, Clone)]
pub struct ErrorPage {
    pub title: &'static str,
    pub message: String,
}

impl From<ServiceError> for PageError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound => PageError::NotFound,
            ServiceError::Forbidden(_) => PageError::Forbidden,
            ServiceError::InUse { dependents } => PageError::BadRequest(format!(
                "The record is still referenced by {} active record(s)",
                dependents
            )),
            ServiceError::Validation(errors) => PageError::BadRequest(errors.to_string()),
            ServiceError::Internal(e) => PageError::Internal(e),
        }
    }
}

impl PageError {
    fn page(&self) -> (StatusCode, ErrorPage) {
        match self {
            PageError::Unauthenticated { .. } => (
                StatusCode::UNAUTHORIZED,
                ErrorPage {
                    title: "Sign in required",
                    message: "Please sign in to continue.".into(),
                },
            ),
            PageError::Forbidden => (
                StatusCode::FORBIDDEN,
                ErrorPage {
                    title: "Access denied",
                    message: "Your role does not allow this action.".into(),
                },
            ),
            PageError::NotFound => (
                StatusCode::NOT_FOUND,
                ErrorPage {
                    title: "Not found",
                    message: "The page or record you requested does not exist.".into(),
                },
            ),
            PageError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorPage {
                    title: "Invalid request",
                    message: msg.clone(),
                },
            ),
            PageError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorPage {
                    title: "Something went wrong",
                    message: "The request could not be completed. Please try again.".into(),
                },
            ),
        }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        if let PageError::Unauthenticated { next } = &self {
            let location = format!("/login?next={}", urlencoding::encode(next));
            let mut resp = StatusCode::SEE_OTHER.into_response();
            if let Ok(v) = HeaderValue::from_str(&location) {
                resp.headers_mut().insert(header::LOCATION, v);
            }
            return resp;
        }
        if let PageError::Internal(err) = &self {
            tracing::error!(error = ?err, "request_failed");
        }
        let (status, page) = self.page();
        let mut resp = (status, page.message.clone()).into_response();
        resp.extensions_mut().insert(page);
        resp
    }
}

/// Replaces plain-text error bodies with the rendered error template.
pub async fn render_error_pages(State(ctx): State<AppContext>, response: Response) -> Response {
    let Some(page) = response.extensions().get::<ErrorPage>().cloned() else {
        return response;
    };
    let status = response.status();
    let mut context = tera::Context::new();
    context.insert("user", &None::<()>);
    context.insert("status", &status.as_u16());
    context.insert("title", page.title);
    context.insert("message", &page.message);
    match ctx.templates.render("error.html", &context) {
        Ok(body) => (status, Html(body)).into_response(),
        Err(err) => {
            tracing::error!(error = ?err, "error_template_failed");
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::validation::FieldErrors;

    #[test]
    fn unauthenticated_redirects_to_login_with_next() {
        let resp = PageError::Unauthenticated {
            next: "/municipalities?q=san jose".into(),
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            resp.headers().get(header::LOCATION).unwrap(),
            "/login?next=%2Fmunicipalities%3Fq%3Dsan%20jose"
        );
    }

    #[test]
    fn service_errors_map_to_statuses() {
        let cases = [
            (ServiceError::NotFound, StatusCode::NOT_FOUND),
            (ServiceError::Forbidden("role"), StatusCode::FORBIDDEN),
            (ServiceError::InUse { dependents: 2 }, StatusCode::BAD_REQUEST),
            (
                ServiceError::Validation(FieldErrors::single("name", "required")),
                StatusCode::BAD_REQUEST,
            ),
            (
                ServiceError::Internal(anyhow::anyhow!("db down")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            let resp = PageError::from(err).into_response();
            assert_eq!(resp.status(), status);
            assert!(resp.extensions().get::<ErrorPage>().is_some());
        }
    }
}
