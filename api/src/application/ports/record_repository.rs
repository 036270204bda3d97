use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::organization::{
    Responsible, ResponsibleInput, Secretariat, SecretariatInput, Subsecretariat,
    SubsecretariatInput,
};
use crate::domain::paging::{ListFilter, Page, SelectOption};
use crate::domain::planning::{
    DepartmentalPlan, DepartmentalPlanInput, Indicator, IndicatorInput, MunicipalPlan,
    MunicipalPlanInput, NationalPlan, NationalPlanInput, Product, ProductInput, Program,
    ProgramInput, Sdg, SdgInput,
};
use crate::domain::territory::{
    Department, DepartmentInput, Mayor, MayorInput, Mayoralty, MayoraltyInput, Municipality,
    MunicipalityInput,
};
use crate::domain::validation::FieldErrors;

/// Persistence for a soft-deletable catalog entity.
#[async_trait]
pub trait RecordRepository: Send + Sync {
    type Record: Send + Sync;
    type Input: Send + Sync;

    async fn list(&self, filter: &ListFilter) -> anyhow::Result<Page<Self::Record>>;

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Self::Record>>;

    async fn insert(&self, input: &Self::Input) -> anyhow::Result<Self::Record>;

    // None when the id does not exist
    async fn update(&self, id: Uuid, input: &Self::Input)
    -> anyhow::Result<Option<Self::Record>>;

    async fn set_active(&self, id: Uuid, active: bool) -> anyhow::Result<bool>;

    /// Referential and uniqueness problems for `input`, ignoring the row `except`.
    async fn conflicts(
        &self,
        input: &Self::Input,
        except: Option<Uuid>,
    ) -> anyhow::Result<FieldErrors>;

    /// Number of active rows that reference `id`.
    async fn active_dependents(&self, id: Uuid) -> anyhow::Result<i64>;

    /// Active rows for a `<select>`, optionally restricted to one parent.
    async fn options(&self, parent_id: Option<Uuid>) -> anyhow::Result<Vec<SelectOption>>;
}

pub type DepartmentRepository = dyn RecordRepository<Record = Department, Input = DepartmentInput>;
pub type MunicipalityRepository =
    dyn RecordRepository<Record = Municipality, Input = MunicipalityInput>;
pub type MayoraltyRepository = dyn RecordRepository<Record = Mayoralty, Input = MayoraltyInput>;
pub type MayorRepository = dyn RecordRepository<Record = Mayor, Input = MayorInput>;
pub type SdgRepository = dyn RecordRepository<Record = Sdg, Input = SdgInput>;
pub type NationalPlanRepository =
    dyn RecordRepository<Record = NationalPlan, Input = NationalPlanInput>;
pub type DepartmentalPlanRepository =
    dyn RecordRepository<Record = DepartmentalPlan, Input = DepartmentalPlanInput>;
pub type MunicipalPlanRepository =
    dyn RecordRepository<Record = MunicipalPlan, Input = MunicipalPlanInput>;
pub type ProgramRepository = dyn RecordRepository<Record = Program, Input = ProgramInput>;
pub type ProductRepository = dyn RecordRepository<Record = Product, Input = ProductInput>;
pub type IndicatorRepository = dyn RecordRepository<Record = Indicator, Input = IndicatorInput>;
pub type SecretariatRepository =
    dyn RecordRepository<Record = Secretariat, Input = SecretariatInput>;
pub type SubsecretariatRepository =
    dyn RecordRepository<Record = Subsecretariat, Input = SubsecretariatInput>;
pub type ResponsibleRepository =
    dyn RecordRepository<Record = Responsible, Input = ResponsibleInput>;
