use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::bootstrap::app_context::AppContext;
use crate::domain::validation::FieldErrors;
use crate::presentation::http::lookups::{self, LookupKind};

/// Urlencoded form body kept as ordered pairs so repeated keys survive.
#[derive(Debug, Clone, Default)]
pub struct FormData {
    pairs: Vec<(String, String)>,
}

impl FormData {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.pairs.retain(|(k, _)| k != name);
        self.pairs.push((name.to_string(), value.into()));
    }

    pub fn push(&mut self, name: &str, value: impl Into<String>) {
        self.pairs.push((name.to_string(), value.into()));
    }

    pub fn get(&self, name: &str) -> &str {
        self.pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .unwrap_or("")
    }

    pub fn all(&self, name: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.trim().is_empty())
            .collect()
    }
}

/// Typed reads over [`FormData`]; conversion failures become field errors.
pub struct FormParser<'a> {
    data: &'a FormData,
    errors: FieldErrors,
}

impl<'a> FormParser<'a> {
    pub fn new(data: &'a FormData) -> Self {
        Self {
            data,
            errors: FieldErrors::new(),
        }
    }

    pub fn text(&self, name: &str) -> String {
        self.data.get(name).trim().to_string()
    }

    pub fn opt_text(&self, name: &str) -> Option<String> {
        let v = self.data.get(name).trim();
        (!v.is_empty()).then(|| v.to_string())
    }

    pub fn uuid(&mut self, name: &str) -> Uuid {
        match self.opt_uuid(name) {
            Some(id) => id,
            None => {
                self.errors.add(name, "Select an option");
                Uuid::nil()
            }
        }
    }

    pub fn opt_uuid(&mut self, name: &str) -> Option<Uuid> {
        let raw = self.data.get(name).trim();
        if raw.is_empty() {
            return None;
        }
        match Uuid::parse_str(raw) {
            Ok(id) => Some(id),
            Err(_) => {
                self.errors.add(name, "Select a valid option");
                None
            }
        }
    }

    pub fn uuids(&mut self, name: &str) -> Vec<Uuid> {
        let mut ids = Vec::new();
        for raw in self.data.all(name) {
            match Uuid::parse_str(raw.trim()) {
                Ok(id) if !ids.contains(&id) => ids.push(id),
                Ok(_) => {}
                Err(_) => self.errors.add(name, "Select valid options"),
            }
        }
        ids
    }

    pub fn number<T: FromStr + Default>(&mut self, name: &str) -> T {
        let raw = self.data.get(name).trim();
        if raw.is_empty() {
            self.errors.add(name, "This field is required");
            return T::default();
        }
        match raw.parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                self.errors.add(name, "Enter a valid number");
                T::default()
            }
        }
    }

    /// Accepts a decimal comma as well as a point.
    pub fn decimal(&mut self, name: &str) -> f64 {
        let raw = self.data.get(name).trim().replace(',', ".");
        if raw.is_empty() {
            self.errors.add(name, "This field is required");
            return 0.0;
        }
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => v,
            _ => {
                self.errors.add(name, "Enter a valid number");
                0.0
            }
        }
    }

    pub fn date(&mut self, name: &str) -> NaiveDate {
        let raw = self.data.get(name).trim();
        match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(d) => d,
            Err(_) => {
                let msg = if raw.is_empty() {
                    "This field is required"
                } else {
                    "Enter a date as YYYY-MM-DD"
                };
                self.errors.add(name, msg);
                NaiveDate::default()
            }
        }
    }

    pub fn finish(self) -> FieldErrors {
        self.errors
    }
}

#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    Text,
    Email,
    Tel,
    TextArea,
    Integer,
    Decimal,
    Date,
    Select {
        lookup: LookupKind,
        parent: Option<&'static str>,
    },
    MultiSelect {
        lookup: LookupKind,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    pub const fn required(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OptionView {
    pub id: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormFieldView {
    pub name: &'static str,
    pub label: &'static str,
    pub input_type: &'static str,
    pub required: bool,
    pub value: String,
    pub options: Vec<OptionView>,
    pub lookup: Option<&'static str>,
    pub parent: Option<&'static str>,
    pub error: Option<String>,
}

/// Builds template-ready fields, loading select options for the current values.
pub async fn field_views(
    ctx: &AppContext,
    specs: &[FieldSpec],
    data: &FormData,
    errors: &FieldErrors,
) -> anyhow::Result<Vec<FormFieldView>> {
    let mut views = Vec::with_capacity(specs.len());
    for spec in specs {
        let mut view = FormFieldView {
            name: spec.name,
            label: spec.label,
            input_type: "text",
            required: spec.required,
            value: data.get(spec.name).to_string(),
            options: Vec::new(),
            lookup: None,
            parent: None,
            error: errors.get(spec.name).map(str::to_string),
        };
        match spec.kind {
            FieldKind::Text => {}
            FieldKind::Email => view.input_type = "email",
            FieldKind::Tel => view.input_type = "tel",
            FieldKind::TextArea => view.input_type = "textarea",
            FieldKind::Integer => view.input_type = "integer",
            FieldKind::Decimal => view.input_type = "decimal",
            FieldKind::Date => view.input_type = "date",
            FieldKind::Select { lookup, parent } => {
                view.input_type = "select";
                view.lookup = Some(lookup.as_str());
                view.parent = parent;
                let options = match parent {
                    Some(p) => match Uuid::parse_str(data.get(p).trim()) {
                        Ok(pid) => lookups::options(ctx, lookup, Some(pid)).await?,
                        Err(_) => Vec::new(),
                    },
                    None => lookups::options(ctx, lookup, None).await?,
                };
                let current = data.get(spec.name).trim();
                view.options = options
                    .into_iter()
                    .map(|o| OptionView {
                        selected: o.id.to_string() == current,
                        id: o.id.to_string(),
                        label: o.label,
                    })
                    .collect();
            }
            FieldKind::MultiSelect { lookup } => {
                view.input_type = "multiselect";
                view.lookup = Some(lookup.as_str());
                let chosen = data.all(spec.name);
                view.options = lookups::options(ctx, lookup, None)
                    .await?
                    .into_iter()
                    .map(|o| {
                        let id = o.id.to_string();
                        OptionView {
                            selected: chosen.contains(&id.as_str()),
                            id,
                            label: o.label,
                        }
                    })
                    .collect();
            }
        }
        views.push(view);
    }
    Ok(views)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(pairs: &[(&str, &str)]) -> FormData {
        FormData::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn text_is_trimmed_and_blank_optional_is_none() {
        let form = data(&[("name", "  Cali  "), ("email", "   ")]);
        let parser = FormParser::new(&form);
        assert_eq!(parser.text("name"), "Cali");
        assert_eq!(parser.opt_text("email"), None);
        assert_eq!(parser.opt_text("missing"), None);
    }

    #[test]
    fn bad_ids_and_numbers_become_field_errors() {
        let form = data(&[
            ("department_id", "not-a-uuid"),
            ("start_year", "twenty"),
            ("baseline", "12,5"),
            ("term_start", "2024/01/01"),
        ]);
        let mut parser = FormParser::new(&form);
        assert_eq!(parser.uuid("department_id"), Uuid::nil());
        assert_eq!(parser.number::<i32>("start_year"), 0);
        assert_eq!(parser.decimal("baseline"), 12.5);
        parser.date("term_start");
        let errors = parser.finish();
        assert!(errors.contains("department_id"));
        assert!(errors.contains("start_year"));
        assert!(!errors.contains("baseline"));
        assert_eq!(errors.get("term_start"), Some("Enter a date as YYYY-MM-DD"));
    }

    #[test]
    fn repeated_keys_collect_distinct_ids() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let form = FormData::new(vec![
            ("sdg_ids".into(), a.to_string()),
            ("sdg_ids".into(), b.to_string()),
            ("sdg_ids".into(), a.to_string()),
            ("sdg_ids".into(), "".into()),
        ]);
        let mut parser = FormParser::new(&form);
        assert_eq!(parser.uuids("sdg_ids"), vec![a, b]);
        assert!(parser.finish().is_empty());
    }

    #[test]
    fn set_replaces_existing_value() {
        let mut form = data(&[("parent", "x")]);
        form.set("parent", "y");
        assert_eq!(form.get("parent"), "y");
        assert_eq!(form.all("parent"), vec!["y"]);
    }
}
