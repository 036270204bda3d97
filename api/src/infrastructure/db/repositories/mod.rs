pub mod dashboard_repository_sqlx;
pub mod department_repository_sqlx;
pub mod departmental_plan_repository_sqlx;
pub mod evidence_repository_sqlx;
pub mod indicator_repository_sqlx;
pub mod mayor_repository_sqlx;
pub mod mayoralty_repository_sqlx;
pub mod municipal_plan_repository_sqlx;
pub mod municipality_repository_sqlx;
pub mod national_plan_repository_sqlx;
pub mod product_repository_sqlx;
pub mod program_repository_sqlx;
pub mod responsible_repository_sqlx;
pub mod sdg_repository_sqlx;
pub mod secretariat_repository_sqlx;
pub mod subsecretariat_repository_sqlx;
pub mod user_repository_sqlx;
