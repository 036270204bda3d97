use std::sync::Arc;

use uuid::Uuid;

use crate::application::access;
use crate::application::use_cases::evidence::list_evidence::ListEvidence;
use crate::bootstrap::app_context::AppContext;
use crate::domain::evidence::{ALLOWED_EXTENSIONS, human_size};
use crate::domain::planning::{
    DepartmentalPlan, DepartmentalPlanInput, Indicator, IndicatorInput, MunicipalPlan,
    MunicipalPlanInput, NationalPlan, NationalPlanInput, Product, ProductInput, Program,
    ProgramInput, Sdg, SdgInput,
};
use crate::domain::users::{Role, User};
use crate::domain::validation::FieldErrors;
use crate::presentation::http::error::PageError;
use crate::presentation::http::forms::{FieldKind, FieldSpec, FormData, FormParser};
use crate::presentation::http::lookups::LookupKind;
use crate::presentation::http::organization::{Responsibles, Secretariats};
use crate::presentation::http::resource::{ChildLink, Detail, ParentFilter, Repo, Resource};
use crate::presentation::http::territory::{Departments, Mayoralties};

fn period(start: i32, end: i32) -> String {
    format!("{}-{}", start, end)
}

fn plan_values(name: &str, start: i32, end: i32, description: Option<&str>) -> FormData {
    let mut data = FormData::default();
    data.set("name", name);
    data.set("start_year", start.to_string());
    data.set("end_year", end.to_string());
    data.set("description", description.unwrap_or_default());
    data
}

pub struct Sdgs;

impl Resource for Sdgs {
    type Record = Sdg;
    type Input = SdgInput;

    const PATH: &'static str = "/sdgs";
    const TITLE: &'static str = "Sustainable Development Goals";
    const SINGULAR: &'static str = "SDG";
    const EDIT_ROLE: Role = Role::Admin;
    const COLUMNS: &'static [&'static str] = &["Number", "Name"];
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("number", "Number", FieldKind::Integer),
        FieldSpec::required("name", "Name", FieldKind::Text),
        FieldSpec::optional("description", "Description", FieldKind::TextArea),
    ];

    fn repo(ctx: &AppContext) -> Arc<Repo<Self>> {
        ctx.records().sdgs.clone()
    }

    fn id(r: &Sdg) -> Uuid {
        r.id
    }

    fn title(r: &Sdg) -> String {
        format!("{}. {}", r.number, r.name)
    }

    fn is_active(r: &Sdg) -> bool {
        r.is_active
    }

    fn row(r: &Sdg) -> Vec<String> {
        vec![r.number.to_string(), r.name.clone()]
    }

    fn details(r: &Sdg) -> Vec<Detail> {
        vec![
            Detail::text("Number", r.number.to_string()),
            Detail::text("Name", &r.name),
            Detail::opt("Description", r.description.as_deref()),
        ]
    }

    fn form_values(r: &Sdg) -> FormData {
        let mut data = FormData::default();
        data.set("number", r.number.to_string());
        data.set("name", &r.name);
        data.set("description", r.description.clone().unwrap_or_default());
        data
    }

    fn parse(form: &FormData) -> (SdgInput, FieldErrors) {
        let mut p = FormParser::new(form);
        let input = SdgInput {
            number: p.number::<i16>("number"),
            name: p.text("name"),
            description: p.opt_text("description"),
        };
        (input, p.finish())
    }
}

pub struct NationalPlans;

impl Resource for NationalPlans {
    type Record = NationalPlan;
    type Input = NationalPlanInput;

    const PATH: &'static str = "/national-plans";
    const TITLE: &'static str = "National development plans";
    const SINGULAR: &'static str = "National plan";
    const EDIT_ROLE: Role = Role::Planner;
    const COLUMNS: &'static [&'static str] = &["Name", "Period"];
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("name", "Name", FieldKind::Text),
        FieldSpec::required("start_year", "Start year", FieldKind::Integer),
        FieldSpec::required("end_year", "End year", FieldKind::Integer),
        FieldSpec::optional("description", "Description", FieldKind::TextArea),
    ];
    const CHILDREN: &'static [ChildLink] = &[ChildLink {
        label: "Departmental plans",
        path: "/departmental-plans",
    }];

    fn repo(ctx: &AppContext) -> Arc<Repo<Self>> {
        ctx.records().national_plans.clone()
    }

    fn id(r: &NationalPlan) -> Uuid {
        r.id
    }

    fn title(r: &NationalPlan) -> String {
        r.name.clone()
    }

    fn is_active(r: &NationalPlan) -> bool {
        r.is_active
    }

    fn row(r: &NationalPlan) -> Vec<String> {
        vec![r.name.clone(), period(r.start_year, r.end_year)]
    }

    fn details(r: &NationalPlan) -> Vec<Detail> {
        vec![
            Detail::text("Name", &r.name),
            Detail::text("Period", period(r.start_year, r.end_year)),
            Detail::opt("Description", r.description.as_deref()),
        ]
    }

    fn form_values(r: &NationalPlan) -> FormData {
        plan_values(&r.name, r.start_year, r.end_year, r.description.as_deref())
    }

    fn parse(form: &FormData) -> (NationalPlanInput, FieldErrors) {
        let mut p = FormParser::new(form);
        let input = NationalPlanInput {
            name: p.text("name"),
            start_year: p.number::<i32>("start_year"),
            end_year: p.number::<i32>("end_year"),
            description: p.opt_text("description"),
        };
        (input, p.finish())
    }
}

pub struct DepartmentalPlans;

impl Resource for DepartmentalPlans {
    type Record = DepartmentalPlan;
    type Input = DepartmentalPlanInput;

    const PATH: &'static str = "/departmental-plans";
    const TITLE: &'static str = "Departmental development plans";
    const SINGULAR: &'static str = "Departmental plan";
    const EDIT_ROLE: Role = Role::Planner;
    const PARENT: Option<ParentFilter> = Some(ParentFilter {
        field: "department_id",
        label: "Department",
        lookup: LookupKind::Departments,
    });
    const COLUMNS: &'static [&'static str] = &["Name", "Department", "Period", "National plan"];
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required(
            "department_id",
            "Department",
            FieldKind::Select { lookup: LookupKind::Departments, parent: None },
        ),
        FieldSpec::optional(
            "national_plan_id",
            "Aligned national plan",
            FieldKind::Select { lookup: LookupKind::NationalPlans, parent: None },
        ),
        FieldSpec::required("name", "Name", FieldKind::Text),
        FieldSpec::required("start_year", "Start year", FieldKind::Integer),
        FieldSpec::required("end_year", "End year", FieldKind::Integer),
        FieldSpec::optional("description", "Description", FieldKind::TextArea),
    ];
    const CHILDREN: &'static [ChildLink] = &[ChildLink {
        label: "Municipal plans",
        path: "/municipal-plans",
    }];

    fn repo(ctx: &AppContext) -> Arc<Repo<Self>> {
        ctx.records().departmental_plans.clone()
    }

    fn id(r: &DepartmentalPlan) -> Uuid {
        r.id
    }

    fn title(r: &DepartmentalPlan) -> String {
        r.name.clone()
    }

    fn is_active(r: &DepartmentalPlan) -> bool {
        r.is_active
    }

    fn row(r: &DepartmentalPlan) -> Vec<String> {
        vec![
            r.name.clone(),
            r.department_name.clone(),
            period(r.start_year, r.end_year),
            r.national_plan_name.clone().unwrap_or_else(|| "-".into()),
        ]
    }

    fn details(r: &DepartmentalPlan) -> Vec<Detail> {
        vec![
            Detail::text("Name", &r.name),
            Detail::link("Department", &r.department_name, Departments::PATH, r.department_id),
            Detail::opt_link(
                "National plan",
                r.national_plan_name.as_deref(),
                NationalPlans::PATH,
                r.national_plan_id,
            ),
            Detail::text("Period", period(r.start_year, r.end_year)),
            Detail::opt("Description", r.description.as_deref()),
        ]
    }

    fn form_values(r: &DepartmentalPlan) -> FormData {
        let mut data = plan_values(&r.name, r.start_year, r.end_year, r.description.as_deref());
        data.set("department_id", r.department_id.to_string());
        data.set(
            "national_plan_id",
            r.national_plan_id.map(|id| id.to_string()).unwrap_or_default(),
        );
        data
    }

    fn parse(form: &FormData) -> (DepartmentalPlanInput, FieldErrors) {
        let mut p = FormParser::new(form);
        let input = DepartmentalPlanInput {
            department_id: p.uuid("department_id"),
            national_plan_id: p.opt_uuid("national_plan_id"),
            name: p.text("name"),
            start_year: p.number::<i32>("start_year"),
            end_year: p.number::<i32>("end_year"),
            description: p.opt_text("description"),
        };
        (input, p.finish())
    }
}

pub struct MunicipalPlans;

impl Resource for MunicipalPlans {
    type Record = MunicipalPlan;
    type Input = MunicipalPlanInput;

    const PATH: &'static str = "/municipal-plans";
    const TITLE: &'static str = "Municipal development plans";
    const SINGULAR: &'static str = "Municipal plan";
    const EDIT_ROLE: Role = Role::Planner;
    const PARENT: Option<ParentFilter> = Some(ParentFilter {
        field: "mayoralty_id",
        label: "Mayoralty",
        lookup: LookupKind::Mayoralties,
    });
    const COLUMNS: &'static [&'static str] = &["Name", "Mayoralty", "Period", "Departmental plan"];
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required(
            "mayoralty_id",
            "Mayoralty",
            FieldKind::Select { lookup: LookupKind::Mayoralties, parent: None },
        ),
        FieldSpec::optional(
            "departmental_plan_id",
            "Aligned departmental plan",
            FieldKind::Select { lookup: LookupKind::DepartmentalPlans, parent: None },
        ),
        FieldSpec::required("name", "Name", FieldKind::Text),
        FieldSpec::required("start_year", "Start year", FieldKind::Integer),
        FieldSpec::required("end_year", "End year", FieldKind::Integer),
        FieldSpec::optional("description", "Description", FieldKind::TextArea),
    ];
    const CHILDREN: &'static [ChildLink] = &[ChildLink { label: "Programs", path: "/programs" }];

    fn repo(ctx: &AppContext) -> Arc<Repo<Self>> {
        ctx.records().municipal_plans.clone()
    }

    fn id(r: &MunicipalPlan) -> Uuid {
        r.id
    }

    fn title(r: &MunicipalPlan) -> String {
        r.name.clone()
    }

    fn is_active(r: &MunicipalPlan) -> bool {
        r.is_active
    }

    fn row(r: &MunicipalPlan) -> Vec<String> {
        vec![
            r.name.clone(),
            r.mayoralty_name.clone(),
            period(r.start_year, r.end_year),
            r.departmental_plan_name.clone().unwrap_or_else(|| "-".into()),
        ]
    }

    fn details(r: &MunicipalPlan) -> Vec<Detail> {
        vec![
            Detail::text("Name", &r.name),
            Detail::link("Mayoralty", &r.mayoralty_name, Mayoralties::PATH, r.mayoralty_id),
            Detail::opt_link(
                "Departmental plan",
                r.departmental_plan_name.as_deref(),
                DepartmentalPlans::PATH,
                r.departmental_plan_id,
            ),
            Detail::text("Period", period(r.start_year, r.end_year)),
            Detail::opt("Description", r.description.as_deref()),
        ]
    }

    fn form_values(r: &MunicipalPlan) -> FormData {
        let mut data = plan_values(&r.name, r.start_year, r.end_year, r.description.as_deref());
        data.set("mayoralty_id", r.mayoralty_id.to_string());
        data.set(
            "departmental_plan_id",
            r.departmental_plan_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
        );
        data
    }

    fn parse(form: &FormData) -> (MunicipalPlanInput, FieldErrors) {
        let mut p = FormParser::new(form);
        let input = MunicipalPlanInput {
            mayoralty_id: p.uuid("mayoralty_id"),
            departmental_plan_id: p.opt_uuid("departmental_plan_id"),
            name: p.text("name"),
            start_year: p.number::<i32>("start_year"),
            end_year: p.number::<i32>("end_year"),
            description: p.opt_text("description"),
        };
        (input, p.finish())
    }
}

pub struct Programs;

impl Resource for Programs {
    type Record = Program;
    type Input = ProgramInput;

    const PATH: &'static str = "/programs";
    const TITLE: &'static str = "Programs";
    const SINGULAR: &'static str = "Program";
    const EDIT_ROLE: Role = Role::Planner;
    const PARENT: Option<ParentFilter> = Some(ParentFilter {
        field: "municipal_plan_id",
        label: "Municipal plan",
        lookup: LookupKind::MunicipalPlans,
    });
    const COLUMNS: &'static [&'static str] = &["Code", "Name", "Municipal plan", "Secretariat"];
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required(
            "municipal_plan_id",
            "Municipal plan",
            FieldKind::Select { lookup: LookupKind::MunicipalPlans, parent: None },
        ),
        FieldSpec::optional(
            "secretariat_id",
            "Lead secretariat",
            FieldKind::Select { lookup: LookupKind::Secretariats, parent: None },
        ),
        FieldSpec::required("code", "Code", FieldKind::Text),
        FieldSpec::required("name", "Name", FieldKind::Text),
        FieldSpec::optional("description", "Description", FieldKind::TextArea),
    ];
    const CHILDREN: &'static [ChildLink] = &[ChildLink { label: "Products", path: "/products" }];

    fn repo(ctx: &AppContext) -> Arc<Repo<Self>> {
        ctx.records().programs.clone()
    }

    fn id(r: &Program) -> Uuid {
        r.id
    }

    fn title(r: &Program) -> String {
        format!("{} - {}", r.code, r.name)
    }

    fn is_active(r: &Program) -> bool {
        r.is_active
    }

    fn row(r: &Program) -> Vec<String> {
        vec![
            r.code.clone(),
            r.name.clone(),
            r.municipal_plan_name.clone(),
            r.secretariat_name.clone().unwrap_or_else(|| "-".into()),
        ]
    }

    fn details(r: &Program) -> Vec<Detail> {
        vec![
            Detail::text("Code", &r.code),
            Detail::text("Name", &r.name),
            Detail::link(
                "Municipal plan",
                &r.municipal_plan_name,
                MunicipalPlans::PATH,
                r.municipal_plan_id,
            ),
            Detail::opt_link(
                "Lead secretariat",
                r.secretariat_name.as_deref(),
                Secretariats::PATH,
                r.secretariat_id,
            ),
            Detail::opt("Description", r.description.as_deref()),
        ]
    }

    fn form_values(r: &Program) -> FormData {
        let mut data = FormData::default();
        data.set("municipal_plan_id", r.municipal_plan_id.to_string());
        data.set(
            "secretariat_id",
            r.secretariat_id.map(|id| id.to_string()).unwrap_or_default(),
        );
        data.set("code", &r.code);
        data.set("name", &r.name);
        data.set("description", r.description.clone().unwrap_or_default());
        data
    }

    fn parse(form: &FormData) -> (ProgramInput, FieldErrors) {
        let mut p = FormParser::new(form);
        let input = ProgramInput {
            municipal_plan_id: p.uuid("municipal_plan_id"),
            secretariat_id: p.opt_uuid("secretariat_id"),
            code: p.text("code"),
            name: p.text("name"),
            description: p.opt_text("description"),
        };
        (input, p.finish())
    }
}

pub struct Products;

impl Resource for Products {
    type Record = Product;
    type Input = ProductInput;

    const PATH: &'static str = "/products";
    const TITLE: &'static str = "Products";
    const SINGULAR: &'static str = "Product";
    const EDIT_ROLE: Role = Role::Planner;
    const PARENT: Option<ParentFilter> = Some(ParentFilter {
        field: "program_id",
        label: "Program",
        lookup: LookupKind::Programs,
    });
    const COLUMNS: &'static [&'static str] = &["Code", "Name", "Program", "Responsible", "SDGs"];
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required(
            "program_id",
            "Program",
            FieldKind::Select { lookup: LookupKind::Programs, parent: None },
        ),
        FieldSpec::optional(
            "responsible_id",
            "Responsible",
            FieldKind::Select { lookup: LookupKind::Responsibles, parent: None },
        ),
        FieldSpec::required("code", "Code", FieldKind::Text),
        FieldSpec::required("name", "Name", FieldKind::Text),
        FieldSpec::optional("description", "Description", FieldKind::TextArea),
        FieldSpec::optional(
            "sdg_ids",
            "Sustainable Development Goals",
            FieldKind::MultiSelect { lookup: LookupKind::Sdgs },
        ),
    ];
    const CHILDREN: &'static [ChildLink] =
        &[ChildLink { label: "Indicators", path: "/indicators" }];

    fn repo(ctx: &AppContext) -> Arc<Repo<Self>> {
        ctx.records().products.clone()
    }

    fn id(r: &Product) -> Uuid {
        r.id
    }

    fn title(r: &Product) -> String {
        format!("{} - {}", r.code, r.name)
    }

    fn is_active(r: &Product) -> bool {
        r.is_active
    }

    fn row(r: &Product) -> Vec<String> {
        let sdgs = r
            .sdgs
            .iter()
            .map(|s| s.number.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        vec![
            r.code.clone(),
            r.name.clone(),
            r.program_name.clone(),
            r.responsible_name.clone().unwrap_or_else(|| "-".into()),
            if sdgs.is_empty() { "-".into() } else { sdgs },
        ]
    }

    fn details(r: &Product) -> Vec<Detail> {
        let mut details = vec![
            Detail::text("Code", &r.code),
            Detail::text("Name", &r.name),
            Detail::link("Program", &r.program_name, Programs::PATH, r.program_id),
            Detail::opt_link(
                "Responsible",
                r.responsible_name.as_deref(),
                Responsibles::PATH,
                r.responsible_id,
            ),
            Detail::opt("Description", r.description.as_deref()),
        ];
        if r.sdgs.is_empty() {
            details.push(Detail::text("SDGs", "-"));
        }
        for sdg in &r.sdgs {
            details.push(Detail::link(
                "SDG",
                format!("{}. {}", sdg.number, sdg.name),
                Sdgs::PATH,
                sdg.id,
            ));
        }
        details
    }

    fn form_values(r: &Product) -> FormData {
        let mut data = FormData::default();
        data.set("program_id", r.program_id.to_string());
        data.set(
            "responsible_id",
            r.responsible_id.map(|id| id.to_string()).unwrap_or_default(),
        );
        data.set("code", &r.code);
        data.set("name", &r.name);
        data.set("description", r.description.clone().unwrap_or_default());
        for sdg in &r.sdgs {
            data.push("sdg_ids", sdg.id.to_string());
        }
        data
    }

    fn parse(form: &FormData) -> (ProductInput, FieldErrors) {
        let mut p = FormParser::new(form);
        let input = ProductInput {
            program_id: p.uuid("program_id"),
            responsible_id: p.opt_uuid("responsible_id"),
            code: p.text("code"),
            name: p.text("name"),
            description: p.opt_text("description"),
            sdg_ids: p.uuids("sdg_ids"),
        };
        (input, p.finish())
    }
}

pub struct Indicators;

#[async_trait::async_trait]
impl Resource for Indicators {
    type Record = Indicator;
    type Input = IndicatorInput;

    const PATH: &'static str = "/indicators";
    const TITLE: &'static str = "Indicators";
    const SINGULAR: &'static str = "Indicator";
    const EDIT_ROLE: Role = Role::Planner;
    const PARENT: Option<ParentFilter> = Some(ParentFilter {
        field: "product_id",
        label: "Product",
        lookup: LookupKind::Products,
    });
    const COLUMNS: &'static [&'static str] =
        &["Code", "Name", "Product", "Unit", "Target", "Current", "Progress"];
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required(
            "product_id",
            "Product",
            FieldKind::Select { lookup: LookupKind::Products, parent: None },
        ),
        FieldSpec::required("code", "Code", FieldKind::Text),
        FieldSpec::required("name", "Name", FieldKind::Text),
        FieldSpec::required("unit", "Unit of measure", FieldKind::Text),
        FieldSpec::required("baseline", "Baseline", FieldKind::Decimal),
        FieldSpec::required("target", "Target", FieldKind::Decimal),
        FieldSpec::required("current_value", "Current value", FieldKind::Decimal),
    ];

    fn repo(ctx: &AppContext) -> Arc<Repo<Self>> {
        ctx.records().indicators.clone()
    }

    fn id(r: &Indicator) -> Uuid {
        r.id
    }

    fn title(r: &Indicator) -> String {
        format!("{} - {}", r.code, r.name)
    }

    fn is_active(r: &Indicator) -> bool {
        r.is_active
    }

    fn row(r: &Indicator) -> Vec<String> {
        vec![
            r.code.clone(),
            r.name.clone(),
            r.product_name.clone(),
            r.unit.clone(),
            r.target.to_string(),
            r.current_value.to_string(),
            format!("{:.1}%", r.progress_percent()),
        ]
    }

    fn details(r: &Indicator) -> Vec<Detail> {
        vec![
            Detail::text("Code", &r.code),
            Detail::text("Name", &r.name),
            Detail::link("Product", &r.product_name, Products::PATH, r.product_id),
            Detail::text("Unit of measure", &r.unit),
            Detail::text("Baseline", r.baseline.to_string()),
            Detail::text("Target", r.target.to_string()),
            Detail::text("Current value", r.current_value.to_string()),
            Detail::text("Progress", format!("{:.1}%", r.progress_percent())),
        ]
    }

    fn form_values(r: &Indicator) -> FormData {
        let mut data = FormData::default();
        data.set("product_id", r.product_id.to_string());
        data.set("code", &r.code);
        data.set("name", &r.name);
        data.set("unit", &r.unit);
        data.set("baseline", r.baseline.to_string());
        data.set("target", r.target.to_string());
        data.set("current_value", r.current_value.to_string());
        data
    }

    fn parse(form: &FormData) -> (IndicatorInput, FieldErrors) {
        let mut p = FormParser::new(form);
        let input = IndicatorInput {
            product_id: p.uuid("product_id"),
            code: p.text("code"),
            name: p.text("name"),
            unit: p.text("unit"),
            baseline: p.decimal("baseline"),
            target: p.decimal("target"),
            current_value: p.decimal("current_value"),
        };
        (input, p.finish())
    }

    /// Evidence list and upload form.
    async fn decorate(
        ctx: &AppContext,
        record: &Indicator,
        user: &User,
        context: &mut tera::Context,
    ) -> Result<(), PageError> {
        let is_admin = access::can(user, Role::Admin);
        let repo = ctx.evidence_repo();
        let evidence = ListEvidence {
            evidence: repo.as_ref(),
        }
        .execute(record.id, is_admin)
        .await?;
        context.insert("progress", &record.progress_percent());
        context.insert("evidence", &evidence);
        context.insert(
            "can_upload",
            &(record.is_active && access::can(user, Role::Planner)),
        );
        context.insert("upload_limit", &human_size(ctx.cfg.upload_max_bytes as i64));
        context.insert("allowed_extensions", &ALLOWED_EXTENSIONS.join(", "));
        Ok(())
    }
}
