pub mod dashboard_repository;
pub mod evidence_repository;
pub mod evidence_store;
pub mod record_repository;
pub mod user_repository;
