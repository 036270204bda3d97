use std::collections::HashMap;

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde::Serialize;
use tera::{Tera, Value};

use crate::application::access;
use crate::bootstrap::app_context::AppContext;
use crate::domain::evidence::human_size;
use crate::domain::users::{Role, User};
use crate::presentation::http::error::PageError;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct NavLink {
    pub label: &'static str,
    pub path: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct NavGroup {
    pub title: &'static str,
    pub links: &'static [NavLink],
}

pub const NAV: &[NavGroup] = &[
    NavGroup {
        title: "Territory",
        links: &[
            NavLink { label: "Departments", path: "/departments" },
            NavLink { label: "Municipalities", path: "/municipalities" },
            NavLink { label: "Mayoralties", path: "/mayoralties" },
            NavLink { label: "Mayors", path: "/mayors" },
        ],
    },
    NavGroup {
        title: "Planning",
        links: &[
            NavLink { label: "National plans", path: "/national-plans" },
            NavLink { label: "Departmental plans", path: "/departmental-plans" },
            NavLink { label: "Municipal plans", path: "/municipal-plans" },
            NavLink { label: "Programs", path: "/programs" },
            NavLink { label: "Products", path: "/products" },
            NavLink { label: "Indicators", path: "/indicators" },
            NavLink { label: "SDGs", path: "/sdgs" },
        ],
    },
    NavGroup {
        title: "Organization",
        links: &[
            NavLink { label: "Secretariats", path: "/secretariats" },
            NavLink { label: "Subsecretariats", path: "/subsecretariats" },
            NavLink { label: "Responsibles", path: "/responsibles" },
        ],
    },
];

pub fn load_templates(dir: &str) -> anyhow::Result<Tera> {
    let pattern = format!("{}/**/*.html", dir.trim_end_matches('/'));
    let mut tera = Tera::new(&pattern)?;
    tera.autoescape_on(vec![".html"]);
    tera.register_filter("human_size", human_size_filter);
    tera.register_filter("percent", percent_filter);
    Ok(tera)
}

fn human_size_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    let bytes = value
        .as_i64()
        .ok_or_else(|| tera::Error::msg("human_size expects an integer"))?;
    Ok(Value::String(human_size(bytes)))
}

fn percent_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    let pct = value
        .as_f64()
        .ok_or_else(|| tera::Error::msg("percent expects a number"))?;
    Ok(Value::String(format!("{:.1}%", pct)))
}

/// Context shared by every page rendered behind the login.
pub fn page_context(user: &User) -> tera::Context {
    let mut context = tera::Context::new();
    context.insert("user", user);
    context.insert("can_plan", &access::can(user, Role::Planner));
    context.insert("is_admin", &access::can(user, Role::Admin));
    context.insert("nav", NAV);
    context
}

pub fn render(ctx: &AppContext, name: &str, context: &tera::Context) -> Result<Html<String>, PageError> {
    ctx.templates
        .render(name, context)
        .map(Html)
        .map_err(|e| PageError::Internal(anyhow::anyhow!("render {}: {:?}", name, e)))
}

pub fn render_with_status(
    ctx: &AppContext,
    status: StatusCode,
    name: &str,
    context: &tera::Context,
) -> Result<Response, PageError> {
    Ok((status, render(ctx, name, context)?).into_response())
}

/// Flash message selected by the `notice` query parameter after a redirect.
pub fn notice_message(code: Option<&str>) -> Option<&'static str> {
    match code? {
        "created" => Some("Record created."),
        "updated" => Some("Changes saved."),
        "deactivated" => Some("Record deactivated."),
        "activated" => Some("Record activated."),
        "in_use" => Some("The record cannot be deactivated while active records depend on it."),
        "uploaded" => Some("Evidence uploaded."),
        "password_changed" => Some("Your password has been changed."),
        "password_reset" => Some("Password reset."),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_format_values() {
        let empty = HashMap::new();
        assert_eq!(
            human_size_filter(&Value::from(2048), &empty).unwrap(),
            Value::String("2.0 KB".into())
        );
        assert_eq!(
            percent_filter(&Value::from(37.26), &empty).unwrap(),
            Value::String("37.3%".into())
        );
        assert!(percent_filter(&Value::from("x"), &empty).is_err());
    }

    #[test]
    fn unknown_notices_are_ignored() {
        assert_eq!(notice_message(Some("created")), Some("Record created."));
        assert_eq!(notice_message(Some("<script>")), None);
        assert_eq!(notice_message(None), None);
    }

    #[test]
    fn every_nav_path_is_rooted() {
        for group in NAV {
            for link in group.links {
                assert!(link.path.starts_with('/'));
            }
        }
    }
}
