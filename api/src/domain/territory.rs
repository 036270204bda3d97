use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::validation::{FieldErrors, NAME_MAX, Validate};

static DEPARTMENT_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{2}$").expect("valid regex"));
static MUNICIPALITY_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{5}$").expect("valid regex"));
static NIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{6,12}(-[0-9])?$").expect("valid regex"));
static DOCUMENT_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{5,15}$").expect("valid regex"));

#[derive(Debug, Clone, Serialize)]
pub struct Department {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DepartmentInput {
    pub code: String,
    pub name: String,
}

impl Validate for DepartmentInput {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if !DEPARTMENT_CODE_RE.is_match(self.code.trim()) {
            errors.add("code", "Department code must be exactly 2 digits");
        }
        errors.require_text("name", &self.name, NAME_MAX);
        errors
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Municipality {
    pub id: Uuid,
    pub department_id: Uuid,
    pub department_name: String,
    pub code: String,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MunicipalityInput {
    pub department_id: Uuid,
    pub code: String,
    pub name: String,
}

impl Validate for MunicipalityInput {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if !MUNICIPALITY_CODE_RE.is_match(self.code.trim()) {
            errors.add("code", "Municipality code must be exactly 5 digits");
        }
        errors.require_text("name", &self.name, NAME_MAX);
        errors
    }
}

impl MunicipalityInput {
    /// DANE municipality codes extend the code of their department.
    pub fn code_prefix_error(&self, department_code: &str) -> Option<String> {
        if self.code.trim().starts_with(department_code) {
            None
        } else {
            Some(format!(
                "Code must start with the department code {}",
                department_code
            ))
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Mayoralty {
    pub id: Uuid,
    pub municipality_id: Uuid,
    pub municipality_name: String,
    pub department_name: String,
    pub name: String,
    pub nit: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MayoraltyInput {
    pub municipality_id: Uuid,
    pub name: String,
    pub nit: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl Validate for MayoraltyInput {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require_text("name", &self.name, NAME_MAX);
        if !NIT_RE.is_match(self.nit.trim()) {
            errors.add("nit", "NIT must be 6-12 digits with an optional check digit");
        }
        errors.optional_text("address", self.address.as_deref(), NAME_MAX);
        errors.optional_phone("phone", self.phone.as_deref());
        errors.optional_email("email", self.email.as_deref());
        errors
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Mayor {
    pub id: Uuid,
    pub mayoralty_id: Uuid,
    pub mayoralty_name: String,
    pub full_name: String,
    pub document_number: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub term_start: NaiveDate,
    pub term_end: NaiveDate,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Mayor {
    pub fn in_office(&self, today: NaiveDate) -> bool {
        self.is_active && self.term_start <= today && today <= self.term_end
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MayorInput {
    pub mayoralty_id: Uuid,
    pub full_name: String,
    pub document_number: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub term_start: NaiveDate,
    pub term_end: NaiveDate,
}

impl Validate for MayorInput {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require_text("full_name", &self.full_name, NAME_MAX);
        if !DOCUMENT_NUMBER_RE.is_match(self.document_number.trim()) {
            errors.add("document_number", "Document number must be 5-15 digits");
        }
        errors.optional_email("email", self.email.as_deref());
        errors.optional_phone("phone", self.phone.as_deref());
        if self.term_start >= self.term_end {
            errors.add("term_end", "Term end must be after term start");
        }
        errors
    }
}

impl From<&Department> for DepartmentInput {
    fn from(d: &Department) -> Self {
        Self {
            code: d.code.clone(),
            name: d.name.clone(),
        }
    }
}

impl From<&Municipality> for MunicipalityInput {
    fn from(m: &Municipality) -> Self {
        Self {
            department_id: m.department_id,
            code: m.code.clone(),
            name: m.name.clone(),
        }
    }
}

impl From<&Mayoralty> for MayoraltyInput {
    fn from(a: &Mayoralty) -> Self {
        Self {
            municipality_id: a.municipality_id,
            name: a.name.clone(),
            nit: a.nit.clone(),
            address: a.address.clone(),
            phone: a.phone.clone(),
            email: a.email.clone(),
        }
    }
}

impl From<&Mayor> for MayorInput {
    fn from(m: &Mayor) -> Self {
        Self {
            mayoralty_id: m.mayoralty_id,
            full_name: m.full_name.clone(),
            document_number: m.document_number.clone(),
            email: m.email.clone(),
            phone: m.phone.clone(),
            term_start: m.term_start,
            term_end: m.term_end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn department_code_is_two_digits() {
        let ok = DepartmentInput {
            code: "05".into(),
            name: "Antioquia".into(),
        };
        assert!(ok.validate().is_empty());

        let bad = DepartmentInput {
            code: "5A".into(),
            name: "".into(),
        };
        let errors = bad.validate();
        assert!(errors.contains("code"));
        assert!(errors.contains("name"));
    }

    #[test]
    fn municipality_code_is_five_digits() {
        let input = MunicipalityInput {
            department_id: Uuid::new_v4(),
            code: "0500".into(),
            name: "Medellín".into(),
        };
        assert!(input.validate().contains("code"));
    }

    #[test]
    fn mayoralty_nit_accepts_check_digit() {
        let mut input = MayoraltyInput {
            municipality_id: Uuid::new_v4(),
            name: "Alcaldía de Medellín".into(),
            nit: "890905211-1".into(),
            address: None,
            phone: Some("604 385 5555".into()),
            email: Some("contacto@medellin.gov.co".into()),
        };
        assert!(input.validate().is_empty());
        input.nit = "89-09".into();
        assert!(input.validate().contains("nit"));
    }

    #[test]
    fn mayor_term_must_be_ordered() {
        let input = MayorInput {
            mayoralty_id: Uuid::new_v4(),
            full_name: "Ana Pérez".into(),
            document_number: "43123456".into(),
            email: None,
            phone: None,
            term_start: date(2024, 1, 1),
            term_end: date(2024, 1, 1),
        };
        assert_eq!(
            input.validate().get("term_end"),
            Some("Term end must be after term start")
        );
    }

    #[test]
    fn mayor_in_office_respects_term_and_flag() {
        let mut mayor = Mayor {
            id: Uuid::new_v4(),
            mayoralty_id: Uuid::new_v4(),
            mayoralty_name: "Alcaldía".into(),
            full_name: "Ana Pérez".into(),
            document_number: "43123456".into(),
            email: None,
            phone: None,
            term_start: date(2024, 1, 1),
            term_end: date(2027, 12, 31),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(mayor.in_office(date(2025, 6, 1)));
        assert!(!mayor.in_office(date(2028, 1, 1)));
        mayor.is_active = false;
        assert!(!mayor.in_office(date(2025, 6, 1)));
    }

    #[test]
    fn codes_accept_only_ascii_digits() {
        let arabic_indic = DepartmentInput {
            code: "\u{0660}\u{0665}".into(),
            name: "Antioquia".into(),
        };
        assert!(arabic_indic.validate().contains("code"));

        let fullwidth = MunicipalityInput {
            department_id: Uuid::new_v4(),
            code: "０５００１".into(),
            name: "Medellín".into(),
        };
        assert!(fullwidth.validate().contains("code"));

        let mayoralty = MayoraltyInput {
            municipality_id: Uuid::new_v4(),
            name: "Alcaldía de Medellín".into(),
            nit: "८९०९०५२११-१".into(),
            address: None,
            phone: None,
            email: None,
        };
        assert!(mayoralty.validate().contains("nit"));

        let mayor = MayorInput {
            mayoralty_id: Uuid::new_v4(),
            full_name: "Ana Pérez".into(),
            document_number: "\u{0664}\u{0663}\u{0661}\u{0662}\u{0663}\u{0664}".into(),
            email: None,
            phone: None,
            term_start: date(2024, 1, 1),
            term_end: date(2027, 12, 31),
        };
        assert!(mayor.validate().contains("document_number"));
    }

    #[test]
    fn municipality_code_extends_department_code() {
        let input = MunicipalityInput {
            department_id: Uuid::new_v4(),
            code: "05001".into(),
            name: "Medellín".into(),
        };
        assert_eq!(input.code_prefix_error("05"), None);
        assert_eq!(
            input.code_prefix_error("76").as_deref(),
            Some("Code must start with the department code 76")
        );
    }
}
