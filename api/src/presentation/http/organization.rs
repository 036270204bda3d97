use std::sync::Arc;

use uuid::Uuid;

use crate::bootstrap::app_context::AppContext;
use crate::domain::organization::{
    Responsible, ResponsibleInput, Secretariat, SecretariatInput, Subsecretariat,
    SubsecretariatInput,
};
use crate::domain::users::Role;
use crate::domain::validation::FieldErrors;
use crate::presentation::http::forms::{FieldKind, FieldSpec, FormData, FormParser};
use crate::presentation::http::lookups::LookupKind;
use crate::presentation::http::resource::{ChildLink, Detail, ParentFilter, Repo, Resource};
use crate::presentation::http::territory::Mayoralties;

pub struct Secretariats;

impl Resource for Secretariats {
    type Record = Secretariat;
    type Input = SecretariatInput;

    const PATH: &'static str = "/secretariats";
    const TITLE: &'static str = "Secretariats";
    const SINGULAR: &'static str = "Secretariat";
    const EDIT_ROLE: Role = Role::Planner;
    const PARENT: Option<ParentFilter> = Some(ParentFilter {
        field: "mayoralty_id",
        label: "Mayoralty",
        lookup: LookupKind::Mayoralties,
    });
    const COLUMNS: &'static [&'static str] = &["Name", "Mayoralty", "Email", "Phone"];
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required(
            "mayoralty_id",
            "Mayoralty",
            FieldKind::Select { lookup: LookupKind::Mayoralties, parent: None },
        ),
        FieldSpec::required("name", "Name", FieldKind::Text),
        FieldSpec::optional("email", "Email", FieldKind::Email),
        FieldSpec::optional("phone", "Phone", FieldKind::Tel),
    ];
    const CHILDREN: &'static [ChildLink] = &[
        ChildLink { label: "Subsecretariats", path: "/subsecretariats" },
        ChildLink { label: "Responsibles", path: "/responsibles" },
    ];

    fn repo(ctx: &AppContext) -> Arc<Repo<Self>> {
        ctx.records().secretariats.clone()
    }

    fn id(r: &Secretariat) -> Uuid {
        r.id
    }

    fn title(r: &Secretariat) -> String {
        r.name.clone()
    }

    fn is_active(r: &Secretariat) -> bool {
        r.is_active
    }

    fn row(r: &Secretariat) -> Vec<String> {
        vec![
            r.name.clone(),
            r.mayoralty_name.clone(),
            r.email.clone().unwrap_or_else(|| "-".into()),
            r.phone.clone().unwrap_or_else(|| "-".into()),
        ]
    }

    fn details(r: &Secretariat) -> Vec<Detail> {
        vec![
            Detail::text("Name", &r.name),
            Detail::link("Mayoralty", &r.mayoralty_name, Mayoralties::PATH, r.mayoralty_id),
            Detail::opt("Email", r.email.as_deref()),
            Detail::opt("Phone", r.phone.as_deref()),
        ]
    }

    fn form_values(r: &Secretariat) -> FormData {
        let mut data = FormData::default();
        data.set("mayoralty_id", r.mayoralty_id.to_string());
        data.set("name", &r.name);
        data.set("email", r.email.clone().unwrap_or_default());
        data.set("phone", r.phone.clone().unwrap_or_default());
        data
    }

    fn parse(form: &FormData) -> (SecretariatInput, FieldErrors) {
        let mut p = FormParser::new(form);
        let input = SecretariatInput {
            mayoralty_id: p.uuid("mayoralty_id"),
            name: p.text("name"),
            email: p.opt_text("email"),
            phone: p.opt_text("phone"),
        };
        (input, p.finish())
    }
}

pub struct Subsecretariats;

impl Resource for Subsecretariats {
    type Record = Subsecretariat;
    type Input = SubsecretariatInput;

    const PATH: &'static str = "/subsecretariats";
    const TITLE: &'static str = "Subsecretariats";
    const SINGULAR: &'static str = "Subsecretariat";
    const EDIT_ROLE: Role = Role::Planner;
    const PARENT: Option<ParentFilter> = Some(ParentFilter {
        field: "secretariat_id",
        label: "Secretariat",
        lookup: LookupKind::Secretariats,
    });
    const COLUMNS: &'static [&'static str] = &["Name", "Secretariat"];
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required(
            "secretariat_id",
            "Secretariat",
            FieldKind::Select { lookup: LookupKind::Secretariats, parent: None },
        ),
        FieldSpec::required("name", "Name", FieldKind::Text),
    ];
    const CHILDREN: &'static [ChildLink] =
        &[ChildLink { label: "Responsibles", path: "/responsibles" }];

    fn repo(ctx: &AppContext) -> Arc<Repo<Self>> {
        ctx.records().subsecretariats.clone()
    }

    fn id(r: &Subsecretariat) -> Uuid {
        r.id
    }

    fn title(r: &Subsecretariat) -> String {
        r.name.clone()
    }

    fn is_active(r: &Subsecretariat) -> bool {
        r.is_active
    }

    fn row(r: &Subsecretariat) -> Vec<String> {
        vec![r.name.clone(), r.secretariat_name.clone()]
    }

    fn details(r: &Subsecretariat) -> Vec<Detail> {
        vec![
            Detail::text("Name", &r.name),
            Detail::link(
                "Secretariat",
                &r.secretariat_name,
                Secretariats::PATH,
                r.secretariat_id,
            ),
        ]
    }

    fn form_values(r: &Subsecretariat) -> FormData {
        let mut data = FormData::default();
        data.set("secretariat_id", r.secretariat_id.to_string());
        data.set("name", &r.name);
        data
    }

    fn parse(form: &FormData) -> (SubsecretariatInput, FieldErrors) {
        let mut p = FormParser::new(form);
        let input = SubsecretariatInput {
            secretariat_id: p.uuid("secretariat_id"),
            name: p.text("name"),
        };
        (input, p.finish())
    }
}

pub struct Responsibles;

impl Resource for Responsibles {
    type Record = Responsible;
    type Input = ResponsibleInput;

    const PATH: &'static str = "/responsibles";
    const TITLE: &'static str = "Responsible parties";
    const SINGULAR: &'static str = "Responsible";
    const EDIT_ROLE: Role = Role::Planner;
    const PARENT: Option<ParentFilter> = Some(ParentFilter {
        field: "secretariat_id",
        label: "Secretariat",
        lookup: LookupKind::Secretariats,
    });
    const COLUMNS: &'static [&'static str] =
        &["Name", "Position", "Secretariat", "Subsecretariat", "Email"];
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required(
            "secretariat_id",
            "Secretariat",
            FieldKind::Select { lookup: LookupKind::Secretariats, parent: None },
        ),
        FieldSpec::optional(
            "subsecretariat_id",
            "Subsecretariat",
            FieldKind::Select {
                lookup: LookupKind::Subsecretariats,
                parent: Some("secretariat_id"),
            },
        ),
        FieldSpec::required("full_name", "Full name", FieldKind::Text),
        FieldSpec::required("position", "Position", FieldKind::Text),
        FieldSpec::optional("email", "Email", FieldKind::Email),
        FieldSpec::optional("phone", "Phone", FieldKind::Tel),
    ];
    const CHILDREN: &'static [ChildLink] = &[ChildLink { label: "Products", path: "/products" }];

    fn repo(ctx: &AppContext) -> Arc<Repo<Self>> {
        ctx.records().responsibles.clone()
    }

    fn id(r: &Responsible) -> Uuid {
        r.id
    }

    fn title(r: &Responsible) -> String {
        r.full_name.clone()
    }

    fn is_active(r: &Responsible) -> bool {
        r.is_active
    }

    fn row(r: &Responsible) -> Vec<String> {
        vec![
            r.full_name.clone(),
            r.position.clone(),
            r.secretariat_name.clone(),
            r.subsecretariat_name.clone().unwrap_or_else(|| "-".into()),
            r.email.clone().unwrap_or_else(|| "-".into()),
        ]
    }

    fn details(r: &Responsible) -> Vec<Detail> {
        vec![
            Detail::text("Full name", &r.full_name),
            Detail::text("Position", &r.position),
            Detail::link(
                "Secretariat",
                &r.secretariat_name,
                Secretariats::PATH,
                r.secretariat_id,
            ),
            Detail::opt_link(
                "Subsecretariat",
                r.subsecretariat_name.as_deref(),
                Subsecretariats::PATH,
                r.subsecretariat_id,
            ),
            Detail::opt("Email", r.email.as_deref()),
            Detail::opt("Phone", r.phone.as_deref()),
        ]
    }

    fn form_values(r: &Responsible) -> FormData {
        let mut data = FormData::default();
        data.set("secretariat_id", r.secretariat_id.to_string());
        data.set(
            "subsecretariat_id",
            r.subsecretariat_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
        );
        data.set("full_name", &r.full_name);
        data.set("position", &r.position);
        data.set("email", r.email.clone().unwrap_or_default());
        data.set("phone", r.phone.clone().unwrap_or_default());
        data
    }

    fn parse(form: &FormData) -> (ResponsibleInput, FieldErrors) {
        let mut p = FormParser::new(form);
        let input = ResponsibleInput {
            secretariat_id: p.uuid("secretariat_id"),
            subsecretariat_id: p.opt_uuid("subsecretariat_id"),
            full_name: p.text("full_name"),
            position: p.text("position"),
            email: p.opt_text("email"),
            phone: p.opt_text("phone"),
        };
        (input, p.finish())
    }
}
