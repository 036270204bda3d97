use std::marker::PhantomData;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use tower::ServiceExt;
use uuid::Uuid;

use portal::application::ports::dashboard_repository::{
    DashboardRepository, EntityCount, IndicatorProgressRow,
};
use portal::application::ports::evidence_repository::EvidenceRepository;
use portal::application::ports::evidence_store::{EvidenceStore, StoredFile};
use portal::application::ports::record_repository::RecordRepository;
use portal::application::ports::user_repository::{UserRepository, UserRow};
use portal::application::services::passwords::hash_password;
use portal::bootstrap::app_context::{AppContext, AppServices, RecordRepositories};
use portal::bootstrap::config::Config;
use portal::domain::evidence::{Evidence, NewEvidence};
use portal::domain::paging::{ListFilter, Page, SelectOption};
use portal::domain::users::{Role, User};
use portal::domain::validation::FieldErrors;
use portal::presentation::http::{self, auth, views};

struct EmptyRepo<R, I>(PhantomData<fn() -> (R, I)>);

fn empty<R, I>() -> Arc<dyn RecordRepository<Record = R, Input = I>>
where
    R: Send + Sync + 'static,
    I: Send + Sync + 'static,
{
    Arc::new(EmptyRepo::<R, I>(PhantomData))
}

#[async_trait]
impl<R: Send + Sync + 'static, I: Send + Sync + 'static> RecordRepository for EmptyRepo<R, I> {
    type Record = R;
    type Input = I;

    async fn list(&self, filter: &ListFilter) -> anyhow::Result<Page<R>> {
        Ok(Page::new(Vec::new(), filter.page, 0))
    }
    async fn find(&self, _id: Uuid) -> anyhow::Result<Option<R>> {
        Ok(None)
    }
    async fn insert(&self, _input: &I) -> anyhow::Result<R> {
        anyhow::bail!("read-only test repository")
    }
    async fn update(&self, _id: Uuid, _input: &I) -> anyhow::Result<Option<R>> {
        Ok(None)
    }
    async fn set_active(&self, _id: Uuid, _active: bool) -> anyhow::Result<bool> {
        Ok(false)
    }
    async fn conflicts(&self, _input: &I, _except: Option<Uuid>) -> anyhow::Result<FieldErrors> {
        Ok(FieldErrors::new())
    }
    async fn active_dependents(&self, _id: Uuid) -> anyhow::Result<i64> {
        Ok(0)
    }
    async fn options(&self, _parent_id: Option<Uuid>) -> anyhow::Result<Vec<SelectOption>> {
        Ok(Vec::new())
    }
}

#[derive(Default)]
struct Users(Mutex<Vec<UserRow>>);

impl Users {
    fn seed(&self, email: &str, password: &str, role: Role) -> User {
        let user = User {
            id: Uuid::new_v4(),
            email: email.into(),
            name: "Test User".into(),
            role,
            is_active: true,
            last_login_at: None,
            created_at: chrono::Utc::now(),
        };
        let row = UserRow {
            user: user.clone(),
            password_hash: hash_password(password).unwrap(),
        };
        self.0.lock().unwrap().push(row);
        user
    }
}

#[async_trait]
impl UserRepository for Users {
    async fn create_user(
        &self,
        _email: &str,
        _name: &str,
        _role: Role,
        _password_hash: &str,
    ) -> anyhow::Result<User> {
        anyhow::bail!("not used")
    }
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserRow>> {
        Ok(self
            .0
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.user.email == email)
            .cloned())
    }
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<UserRow>> {
        Ok(self
            .0
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.user.id == id)
            .cloned())
    }
    async fn list(&self, filter: &ListFilter) -> anyhow::Result<Page<User>> {
        let users: Vec<User> = self.0.lock().unwrap().iter().map(|r| r.user.clone()).collect();
        let total = users.len() as i64;
        Ok(Page::new(users, filter.page, total))
    }
    async fn update_user(
        &self,
        _id: Uuid,
        _name: &str,
        _role: Role,
        _is_active: bool,
    ) -> anyhow::Result<Option<User>> {
        Ok(None)
    }
    async fn set_password(&self, _id: Uuid, _password_hash: &str) -> anyhow::Result<bool> {
        Ok(false)
    }
    async fn touch_login(&self, _id: Uuid) -> anyhow::Result<()> {
        Ok(())
    }
    async fn email_taken(&self, _email: &str, _except: Option<Uuid>) -> anyhow::Result<bool> {
        Ok(false)
    }
    async fn count_users(&self) -> anyhow::Result<i64> {
        Ok(self.0.lock().unwrap().len() as i64)
    }
}

struct NoEvidence;

#[async_trait]
impl EvidenceRepository for NoEvidence {
    async fn list_for_indicator(
        &self,
        _indicator_id: Uuid,
        _include_inactive: bool,
    ) -> anyhow::Result<Vec<Evidence>> {
        Ok(Vec::new())
    }
    async fn find(&self, _id: Uuid) -> anyhow::Result<Option<Evidence>> {
        Ok(None)
    }
    async fn insert(&self, _evidence: &NewEvidence) -> anyhow::Result<Evidence> {
        anyhow::bail!("not used")
    }
    async fn set_active(&self, _id: Uuid, _active: bool) -> anyhow::Result<bool> {
        Ok(false)
    }
}

#[async_trait]
impl EvidenceStore for NoEvidence {
    async fn store(
        &self,
        _indicator_id: Uuid,
        _original_filename: &str,
        _bytes: &[u8],
    ) -> anyhow::Result<StoredFile> {
        anyhow::bail!("not used")
    }
    async fn read(&self, _relative_path: &str) -> anyhow::Result<Vec<u8>> {
        anyhow::bail!("not used")
    }
    async fn remove(&self, _relative_path: &str) -> anyhow::Result<()> {
        anyhow::bail!("not used")
    }
}

struct Counts;

#[async_trait]
impl DashboardRepository for Counts {
    async fn active_counts(&self) -> anyhow::Result<Vec<EntityCount>> {
        Ok(vec![EntityCount {
            label: "Departments".into(),
            path: "/departments".into(),
            count: 0,
        }])
    }
    async fn lagging_indicators(&self, _limit: i64) -> anyhow::Result<Vec<IndicatorProgressRow>> {
        Ok(Vec::new())
    }
    async fn average_progress(&self) -> anyhow::Result<Option<f64>> {
        Ok(None)
    }
}

struct TestApp {
    app: axum::Router,
    cfg: Config,
    users: Arc<Users>,
}

fn test_app() -> TestApp {
    let mut cfg = Config::from_lookup(|_| None).unwrap();
    cfg.templates_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/templates").into();
    cfg.static_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/static").into();

    let records = RecordRepositories {
        departments: empty(),
        municipalities: empty(),
        mayoralties: empty(),
        mayors: empty(),
        sdgs: empty(),
        national_plans: empty(),
        departmental_plans: empty(),
        municipal_plans: empty(),
        programs: empty(),
        products: empty(),
        indicators: empty(),
        secretariats: empty(),
        subsecretariats: empty(),
        responsibles: empty(),
    };
    let users = Arc::new(Users::default());
    let services = AppServices::new(
        records,
        users.clone(),
        Arc::new(NoEvidence),
        Arc::new(NoEvidence),
        Arc::new(Counts),
    );
    let templates = views::load_templates(&cfg.templates_dir).unwrap();
    let ctx = AppContext::new(cfg.clone(), services, templates);
    TestApp {
        app: http::router(ctx),
        cfg,
        users,
    }
}

fn session_cookie(cfg: &Config, user: &User) -> String {
    let token = auth::issue_session(cfg, user.id).unwrap();
    format!("{}={}", auth::SESSION_COOKIE, token)
}

async fn body_text(resp: Response) -> String {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(resp: &Response) -> &str {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

#[tokio::test]
async fn anonymous_page_request_redirects_to_login() {
    let t = test_app();
    let resp = t
        .app
        .oneshot(
            Request::get("/municipalities?page=2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login?next=%2Fmunicipalities%3Fpage%3D2");
}

#[tokio::test]
async fn login_form_renders_without_session() {
    let t = test_app();
    let resp = t
        .app
        .oneshot(Request::get("/login").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("name=\"password\""));
}

#[tokio::test]
async fn valid_login_sets_session_cookie_and_follows_next() {
    let t = test_app();
    t.users
        .seed("ana@example.gov.co", "s3cret-pass", Role::Planner);
    let resp = t
        .app
        .oneshot(
            Request::post("/login")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(
                    "email=ana%40example.gov.co&password=s3cret-pass&next=%2Fprograms",
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/programs");
    let cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(cookie.starts_with("portal_session="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
}

#[tokio::test]
async fn login_with_control_characters_in_next_goes_home() {
    let t = test_app();
    t.users
        .seed("ana@example.gov.co", "s3cret-pass", Role::Planner);
    let resp = t
        .app
        .oneshot(
            Request::post("/login")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(
                    "email=ana%40example.gov.co&password=s3cret-pass&next=%2Fprograms%0Ax",
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");
    assert!(resp.headers().get(header::SET_COOKIE).is_some());
}

#[tokio::test]
async fn wrong_password_is_rejected_with_generic_message() {
    let t = test_app();
    t.users
        .seed("ana@example.gov.co", "s3cret-pass", Role::Planner);
    let resp = t
        .app
        .oneshot(
            Request::post("/login")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("email=ana%40example.gov.co&password=nope"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().get(header::SET_COOKIE).is_none());
    assert!(body_text(resp).await.contains("Invalid email or password"));
}

#[tokio::test]
async fn signed_in_user_can_list_records() {
    let t = test_app();
    let viewer = t.users.seed("vera@example.gov.co", "s3cret-pass", Role::Viewer);
    let resp = t
        .app
        .oneshot(
            Request::get("/departments")
                .header(header::COOKIE, session_cookie(&t.cfg, &viewer))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_text(resp).await;
    assert!(html.contains("Departments"));
    assert!(html.contains("No records found."));
}

#[tokio::test]
async fn dashboard_renders_counts() {
    let t = test_app();
    let viewer = t.users.seed("vera@example.gov.co", "s3cret-pass", Role::Viewer);
    let resp = t
        .app
        .oneshot(
            Request::get("/")
                .header(header::COOKIE, session_cookie(&t.cfg, &viewer))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("No active indicators yet."));
}

#[tokio::test]
async fn viewer_cannot_create_records() {
    let t = test_app();
    let viewer = t.users.seed("vera@example.gov.co", "s3cret-pass", Role::Viewer);
    let resp = t
        .app
        .oneshot(
            Request::post("/departments")
                .header(header::COOKIE, session_cookie(&t.cfg, &viewer))
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("code=05&name=Antioquia"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(body_text(resp).await.contains("Access denied"));
}

#[tokio::test]
async fn users_admin_is_restricted_to_admins() {
    let t = test_app();
    let planner = t.users.seed("pablo@example.gov.co", "s3cret-pass", Role::Planner);
    let admin = t.users.seed("root@example.gov.co", "s3cret-pass", Role::Admin);

    let denied = t
        .app
        .clone()
        .oneshot(
            Request::get("/users")
                .header(header::COOKIE, session_cookie(&t.cfg, &planner))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);

    let allowed = t
        .app
        .oneshot(
            Request::get("/users")
                .header(header::COOKIE, session_cookie(&t.cfg, &admin))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(allowed.status(), StatusCode::OK);
    assert!(body_text(allowed).await.contains("root@example.gov.co"));
}

#[tokio::test]
async fn lookups_require_a_session() {
    let t = test_app();
    let resp = t
        .app
        .oneshot(
            Request::get("/api/lookups/departments")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn lookups_return_json_options_for_signed_in_users() {
    let t = test_app();
    let viewer = t.users.seed("vera@example.gov.co", "s3cret-pass", Role::Viewer);
    let resp = t
        .app
        .oneshot(
            Request::get(format!("/api/lookups/municipalities?parent={}", Uuid::new_v4()))
                .header(header::COOKIE, session_cookie(&t.cfg, &viewer))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let options: Vec<serde_json::Value> = serde_json::from_str(&body_text(resp).await).unwrap();
    assert!(options.is_empty());
}

#[tokio::test]
async fn unknown_lookup_is_not_found() {
    let t = test_app();
    let viewer = t.users.seed("vera@example.gov.co", "s3cret-pass", Role::Viewer);
    let resp = t
        .app
        .oneshot(
            Request::get("/api/lookups/planets")
                .header(header::COOKIE, session_cookie(&t.cfg, &viewer))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_record_renders_not_found_page() {
    let t = test_app();
    let viewer = t.users.seed("vera@example.gov.co", "s3cret-pass", Role::Viewer);
    let resp = t
        .app
        .oneshot(
            Request::get(format!("/indicators/{}", Uuid::new_v4()))
                .header(header::COOKIE, session_cookie(&t.cfg, &viewer))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(body_text(resp).await.contains("404"));
}
