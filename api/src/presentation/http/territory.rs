use std::sync::Arc;

use uuid::Uuid;

use crate::bootstrap::app_context::AppContext;
use crate::domain::territory::{
    Department, DepartmentInput, Mayor, MayorInput, Mayoralty, MayoraltyInput, Municipality,
    MunicipalityInput,
};
use crate::domain::users::Role;
use crate::domain::validation::FieldErrors;
use crate::presentation::http::forms::{FieldKind, FieldSpec, FormData, FormParser};
use crate::presentation::http::lookups::LookupKind;
use crate::presentation::http::resource::{ChildLink, Detail, ParentFilter, Repo, Resource};

pub struct Departments;

impl Resource for Departments {
    type Record = Department;
    type Input = DepartmentInput;

    const PATH: &'static str = "/departments";
    const TITLE: &'static str = "Departments";
    const SINGULAR: &'static str = "Department";
    const EDIT_ROLE: Role = Role::Admin;
    const COLUMNS: &'static [&'static str] = &["Code", "Name"];
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("code", "DANE code", FieldKind::Text),
        FieldSpec::required("name", "Name", FieldKind::Text),
    ];
    const CHILDREN: &'static [ChildLink] = &[
        ChildLink { label: "Municipalities", path: "/municipalities" },
        ChildLink { label: "Departmental plans", path: "/departmental-plans" },
    ];

    fn repo(ctx: &AppContext) -> Arc<Repo<Self>> {
        ctx.records().departments.clone()
    }

    fn id(r: &Department) -> Uuid {
        r.id
    }

    fn title(r: &Department) -> String {
        r.name.clone()
    }

    fn is_active(r: &Department) -> bool {
        r.is_active
    }

    fn row(r: &Department) -> Vec<String> {
        vec![r.code.clone(), r.name.clone()]
    }

    fn details(r: &Department) -> Vec<Detail> {
        vec![Detail::text("DANE code", &r.code), Detail::text("Name", &r.name)]
    }

    fn form_values(r: &Department) -> FormData {
        let mut data = FormData::default();
        data.set("code", &r.code);
        data.set("name", &r.name);
        data
    }

    fn parse(form: &FormData) -> (DepartmentInput, FieldErrors) {
        let p = FormParser::new(form);
        let input = DepartmentInput {
            code: p.text("code"),
            name: p.text("name"),
        };
        (input, p.finish())
    }
}

pub struct Municipalities;

impl Resource for Municipalities {
    type Record = Municipality;
    type Input = MunicipalityInput;

    const PATH: &'static str = "/municipalities";
    const TITLE: &'static str = "Municipalities";
    const SINGULAR: &'static str = "Municipality";
    const EDIT_ROLE: Role = Role::Admin;
    const PARENT: Option<ParentFilter> = Some(ParentFilter {
        field: "department_id",
        label: "Department",
        lookup: LookupKind::Departments,
    });
    const COLUMNS: &'static [&'static str] = &["Code", "Name", "Department"];
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required(
            "department_id",
            "Department",
            FieldKind::Select { lookup: LookupKind::Departments, parent: None },
        ),
        FieldSpec::required("code", "DANE code", FieldKind::Text),
        FieldSpec::required("name", "Name", FieldKind::Text),
    ];
    const CHILDREN: &'static [ChildLink] =
        &[ChildLink { label: "Mayoralties", path: "/mayoralties" }];

    fn repo(ctx: &AppContext) -> Arc<Repo<Self>> {
        ctx.records().municipalities.clone()
    }

    fn id(r: &Municipality) -> Uuid {
        r.id
    }

    fn title(r: &Municipality) -> String {
        r.name.clone()
    }

    fn is_active(r: &Municipality) -> bool {
        r.is_active
    }

    fn row(r: &Municipality) -> Vec<String> {
        vec![r.code.clone(), r.name.clone(), r.department_name.clone()]
    }

    fn details(r: &Municipality) -> Vec<Detail> {
        vec![
            Detail::text("DANE code", &r.code),
            Detail::text("Name", &r.name),
            Detail::link("Department", &r.department_name, Departments::PATH, r.department_id),
        ]
    }

    fn form_values(r: &Municipality) -> FormData {
        let mut data = FormData::default();
        data.set("department_id", r.department_id.to_string());
        data.set("code", &r.code);
        data.set("name", &r.name);
        data
    }

    fn parse(form: &FormData) -> (MunicipalityInput, FieldErrors) {
        let mut p = FormParser::new(form);
        let input = MunicipalityInput {
            department_id: p.uuid("department_id"),
            code: p.text("code"),
            name: p.text("name"),
        };
        (input, p.finish())
    }
}

pub struct Mayoralties;

impl Resource for Mayoralties {
    type Record = Mayoralty;
    type Input = MayoraltyInput;

    const PATH: &'static str = "/mayoralties";
    const TITLE: &'static str = "Mayoralties";
    const SINGULAR: &'static str = "Mayoralty";
    const EDIT_ROLE: Role = Role::Admin;
    const PARENT: Option<ParentFilter> = Some(ParentFilter {
        field: "municipality_id",
        label: "Municipality",
        lookup: LookupKind::Municipalities,
    });
    const COLUMNS: &'static [&'static str] = &["Name", "NIT", "Municipality", "Department"];
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required(
            "municipality_id",
            "Municipality",
            FieldKind::Select { lookup: LookupKind::Municipalities, parent: None },
        ),
        FieldSpec::required("name", "Name", FieldKind::Text),
        FieldSpec::required("nit", "NIT", FieldKind::Text),
        FieldSpec::optional("address", "Address", FieldKind::Text),
        FieldSpec::optional("phone", "Phone", FieldKind::Tel),
        FieldSpec::optional("email", "Email", FieldKind::Email),
    ];
    const CHILDREN: &'static [ChildLink] = &[
        ChildLink { label: "Mayors", path: "/mayors" },
        ChildLink { label: "Secretariats", path: "/secretariats" },
        ChildLink { label: "Municipal plans", path: "/municipal-plans" },
    ];

    fn repo(ctx: &AppContext) -> Arc<Repo<Self>> {
        ctx.records().mayoralties.clone()
    }

    fn id(r: &Mayoralty) -> Uuid {
        r.id
    }

    fn title(r: &Mayoralty) -> String {
        r.name.clone()
    }

    fn is_active(r: &Mayoralty) -> bool {
        r.is_active
    }

    fn row(r: &Mayoralty) -> Vec<String> {
        vec![
            r.name.clone(),
            r.nit.clone(),
            r.municipality_name.clone(),
            r.department_name.clone(),
        ]
    }

    fn details(r: &Mayoralty) -> Vec<Detail> {
        vec![
            Detail::text("Name", &r.name),
            Detail::text("NIT", &r.nit),
            Detail::link(
                "Municipality",
                &r.municipality_name,
                Municipalities::PATH,
                r.municipality_id,
            ),
            Detail::text("Department", &r.department_name),
            Detail::opt("Address", r.address.as_deref()),
            Detail::opt("Phone", r.phone.as_deref()),
            Detail::opt("Email", r.email.as_deref()),
        ]
    }

    fn form_values(r: &Mayoralty) -> FormData {
        let mut data = FormData::default();
        data.set("municipality_id", r.municipality_id.to_string());
        data.set("name", &r.name);
        data.set("nit", &r.nit);
        data.set("address", r.address.clone().unwrap_or_default());
        data.set("phone", r.phone.clone().unwrap_or_default());
        data.set("email", r.email.clone().unwrap_or_default());
        data
    }

    fn parse(form: &FormData) -> (MayoraltyInput, FieldErrors) {
        let mut p = FormParser::new(form);
        let input = MayoraltyInput {
            municipality_id: p.uuid("municipality_id"),
            name: p.text("name"),
            nit: p.text("nit"),
            address: p.opt_text("address"),
            phone: p.opt_text("phone"),
            email: p.opt_text("email"),
        };
        (input, p.finish())
    }
}

pub struct Mayors;

impl Resource for Mayors {
    type Record = Mayor;
    type Input = MayorInput;

    const PATH: &'static str = "/mayors";
    const TITLE: &'static str = "Mayors";
    const SINGULAR: &'static str = "Mayor";
    const EDIT_ROLE: Role = Role::Admin;
    const PARENT: Option<ParentFilter> = Some(ParentFilter {
        field: "mayoralty_id",
        label: "Mayoralty",
        lookup: LookupKind::Mayoralties,
    });
    const COLUMNS: &'static [&'static str] = &["Name", "Document", "Mayoralty", "Term"];
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required(
            "mayoralty_id",
            "Mayoralty",
            FieldKind::Select { lookup: LookupKind::Mayoralties, parent: None },
        ),
        FieldSpec::required("full_name", "Full name", FieldKind::Text),
        FieldSpec::required("document_number", "Document number", FieldKind::Text),
        FieldSpec::optional("email", "Email", FieldKind::Email),
        FieldSpec::optional("phone", "Phone", FieldKind::Tel),
        FieldSpec::required("term_start", "Term start", FieldKind::Date),
        FieldSpec::required("term_end", "Term end", FieldKind::Date),
    ];

    fn repo(ctx: &AppContext) -> Arc<Repo<Self>> {
        ctx.records().mayors.clone()
    }

    fn id(r: &Mayor) -> Uuid {
        r.id
    }

    fn title(r: &Mayor) -> String {
        r.full_name.clone()
    }

    fn is_active(r: &Mayor) -> bool {
        r.is_active
    }

    fn row(r: &Mayor) -> Vec<String> {
        vec![
            r.full_name.clone(),
            r.document_number.clone(),
            r.mayoralty_name.clone(),
            format!("{} to {}", r.term_start, r.term_end),
        ]
    }

    fn details(r: &Mayor) -> Vec<Detail> {
        let today = chrono::Local::now().date_naive();
        vec![
            Detail::text("Full name", &r.full_name),
            Detail::text("Document number", &r.document_number),
            Detail::link("Mayoralty", &r.mayoralty_name, Mayoralties::PATH, r.mayoralty_id),
            Detail::opt("Email", r.email.as_deref()),
            Detail::opt("Phone", r.phone.as_deref()),
            Detail::text("Term start", r.term_start.to_string()),
            Detail::text("Term end", r.term_end.to_string()),
            Detail::text("In office", if r.in_office(today) { "Yes" } else { "No" }),
        ]
    }

    fn form_values(r: &Mayor) -> FormData {
        let mut data = FormData::default();
        data.set("mayoralty_id", r.mayoralty_id.to_string());
        data.set("full_name", &r.full_name);
        data.set("document_number", &r.document_number);
        data.set("email", r.email.clone().unwrap_or_default());
        data.set("phone", r.phone.clone().unwrap_or_default());
        data.set("term_start", r.term_start.to_string());
        data.set("term_end", r.term_end.to_string());
        data
    }

    fn parse(form: &FormData) -> (MayorInput, FieldErrors) {
        let mut p = FormParser::new(form);
        let input = MayorInput {
            mayoralty_id: p.uuid("mayoralty_id"),
            full_name: p.text("full_name"),
            document_number: p.text("document_number"),
            email: p.opt_text("email"),
            phone: p.opt_text("phone"),
            term_start: p.date("term_start"),
            term_end: p.date("term_end"),
        };
        (input, p.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> FormData {
        FormData::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn municipality_form_requires_department() {
        let (input, errors) = Municipalities::parse(&form(&[("code", "05001"), ("name", "Medellín")]));
        assert_eq!(input.code, "05001");
        assert!(errors.contains("department_id"));
    }

    #[test]
    fn mayor_form_parses_dates() {
        let mayoralty = Uuid::new_v4().to_string();
        let (input, errors) = Mayors::parse(&form(&[
            ("mayoralty_id", mayoralty.as_str()),
            ("full_name", " Ana Pérez "),
            ("document_number", "43123456"),
            ("term_start", "2024-01-01"),
            ("term_end", "2027-12-31"),
            ("email", ""),
        ]));
        assert!(errors.is_empty(), "{errors}");
        assert_eq!(input.full_name, "Ana Pérez");
        assert_eq!(input.email, None);
        assert_eq!(input.term_end.to_string(), "2027-12-31");
    }

    #[test]
    fn edit_values_round_trip_through_parse() {
        let now = chrono::Utc::now();
        let record = Mayoralty {
            id: Uuid::new_v4(),
            municipality_id: Uuid::new_v4(),
            municipality_name: "Medellín".into(),
            department_name: "Antioquia".into(),
            name: "Alcaldía de Medellín".into(),
            nit: "890905211-1".into(),
            address: None,
            phone: Some("604 385 5555".into()),
            email: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let (input, errors) = Mayoralties::parse(&Mayoralties::form_values(&record));
        assert!(errors.is_empty());
        assert_eq!(input.municipality_id, record.municipality_id);
        assert_eq!(input.phone, record.phone);
        assert_eq!(input.address, None);
    }
}
