use std::sync::Arc;

use tera::Tera;

use crate::application::ports::dashboard_repository::DashboardRepository;
use crate::application::ports::evidence_repository::EvidenceRepository;
use crate::application::ports::evidence_store::EvidenceStore;
use crate::application::ports::record_repository::{
    DepartmentRepository, DepartmentalPlanRepository, IndicatorRepository, MayorRepository,
    MayoraltyRepository, MunicipalPlanRepository, MunicipalityRepository,
    NationalPlanRepository, ProductRepository, ProgramRepository, ResponsibleRepository,
    SdgRepository, SecretariatRepository, SubsecretariatRepository,
};
use crate::application::ports::user_repository::UserRepository;
use crate::bootstrap::config::Config;

#[derive(Clone)]
pub struct AppContext {
    pub cfg: Config,
    pub templates: Arc<Tera>,
    services: Arc<AppServices>,
}

/// One repository per catalog entity.
#[derive(Clone)]
pub struct RecordRepositories {
    pub departments: Arc<DepartmentRepository>,
    pub municipalities: Arc<MunicipalityRepository>,
    pub mayoralties: Arc<MayoraltyRepository>,
    pub mayors: Arc<MayorRepository>,
    pub sdgs: Arc<SdgRepository>,
    pub national_plans: Arc<NationalPlanRepository>,
    pub departmental_plans: Arc<DepartmentalPlanRepository>,
    pub municipal_plans: Arc<MunicipalPlanRepository>,
    pub programs: Arc<ProgramRepository>,
    pub products: Arc<ProductRepository>,
    pub indicators: Arc<IndicatorRepository>,
    pub secretariats: Arc<SecretariatRepository>,
    pub subsecretariats: Arc<SubsecretariatRepository>,
    pub responsibles: Arc<ResponsibleRepository>,
}

#[derive(Clone)]
pub struct AppServices {
    records: RecordRepositories,
    user_repo: Arc<dyn UserRepository>,
    evidence_repo: Arc<dyn EvidenceRepository>,
    evidence_store: Arc<dyn EvidenceStore>,
    dashboard_repo: Arc<dyn DashboardRepository>,
}

impl AppServices {
    pub fn new(
        records: RecordRepositories,
        user_repo: Arc<dyn UserRepository>,
        evidence_repo: Arc<dyn EvidenceRepository>,
        evidence_store: Arc<dyn EvidenceStore>,
        dashboard_repo: Arc<dyn DashboardRepository>,
    ) -> Self {
        Self {
            records,
            user_repo,
            evidence_repo,
            evidence_store,
            dashboard_repo,
        }
    }
}

impl AppContext {
    pub fn new(cfg: Config, services: AppServices, templates: Tera) -> Self {
        Self {
            cfg,
            templates: Arc::new(templates),
            services: Arc::new(services),
        }
    }

    pub fn records(&self) -> &RecordRepositories {
        &self.services.records
    }

    pub fn user_repo(&self) -> Arc<dyn UserRepository> {
        self.services.user_repo.clone()
    }

    pub fn evidence_repo(&self) -> Arc<dyn EvidenceRepository> {
        self.services.evidence_repo.clone()
    }

    pub fn evidence_store(&self) -> Arc<dyn EvidenceStore> {
        self.services.evidence_store.clone()
    }

    pub fn dashboard_repo(&self) -> Arc<dyn DashboardRepository> {
        self.services.dashboard_repo.clone()
    }
}
