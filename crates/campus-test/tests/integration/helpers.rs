#![allow(clippy::expect_used, dead_code)]
//! Test helpers for integration tests.
//!
//! Provides utilities for:
//! - Handing out isolated test databases from a shared pool
//! - Building the full Salvo service over such a database
//! - Making JSON requests and asserting on responses
//! - Seeding accounts, formations and courses
//!
//! ## Database Isolation
//! A fixed set of databases is created and migrated once per test run. Each
//! `TestDb` takes one of them, truncates it, and gives it back on drop.

use std::sync::{Arc, Mutex, TryLockError};

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use salvo::http::header::HeaderName;
use salvo::http::{Method, ReqBody, StatusCode};
use salvo::prelude::*;
use salvo::test::{RequestBuilder, ResponseExt};
use serde_json::Value;
use tokio::sync::{OnceCell, broadcast};

use campus_app::config::ConfigHandler;
use campus_app::db_handler::DbProviderHandler;
use campus_db::db::connection::{DbConnection, DbPool, create_pool};
use campus_db::db::enums::Role;
use campus_db::db::migrations::run_pending_migrations;
use campus_db::db::query::{
    course as course_query, formation as formation_query, student as student_query,
    user as user_query,
};
use campus_db::model::course::{Course, NewCourse};
use campus_db::model::formation::{Formation, NewFormation};
use campus_db::model::student::NewStudentProfile;
use campus_db::model::user::{NewUser, User};
use campus_service::auth::casbin::{CasbinEnforcerHandler, init_casbin};
use campus_service::auth::password::hash_password;
use campus_test::{TEST_PASSWORD, base_database_url, test_settings};

pub use campus_test::TEST_MAX_UPLOAD_BYTES;

/// Returns early from a test when no database server is configured.
macro_rules! require_db {
    () => {
        match TestDb::new().await.expect("Failed to acquire test database") {
            Some(db) => db,
            None => {
                eprintln!("TEST_DATABASE_URL not set, skipping");
                return;
            }
        }
    };
}
pub(crate) use require_db;

struct PooledDatabase {
    db_name: String,
    pool: DbPool,
}

struct DatabasePool {
    databases: Vec<Mutex<Option<PooledDatabase>>>,
    notify: broadcast::Sender<()>,
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            mutex.clear_poison();
            poisoned.into_inner()
        }
    }
}

fn try_lock<T>(mutex: &Mutex<T>) -> Option<std::sync::MutexGuard<'_, T>> {
    match mutex.try_lock() {
        Ok(guard) => Some(guard),
        Err(TryLockError::Poisoned(poisoned)) => {
            mutex.clear_poison();
            Some(poisoned.into_inner())
        }
        Err(TryLockError::WouldBlock) => None,
    }
}

static DB_POOL: OnceCell<Arc<DatabasePool>> = OnceCell::const_new();

async fn init_db_pool(base_url: &str) -> anyhow::Result<Arc<DatabasePool>> {
    const DB_POOL_SIZE: usize = 8;

    let admin_pool = create_pool(&format!("{base_url}/postgres"), 2).await?;

    let creations = (1..=DB_POOL_SIZE).map(|i| {
        let admin_pool = admin_pool.clone();
        async move {
            let db_name = format!("campus_test_{i}");
            let database_url = format!("{base_url}/{db_name}");
            {
                let mut admin_conn = admin_pool.get().await?;
                diesel::sql_query(format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
                    .execute(&mut admin_conn)
                    .await?;
                diesel::sql_query(format!("CREATE DATABASE \"{db_name}\""))
                    .execute(&mut admin_conn)
                    .await?;
            }
            run_pending_migrations(&database_url).await?;
            let pool = create_pool(&database_url, 8).await?;
            eprintln!("[TestDb] Created {db_name}");
            anyhow::Ok(PooledDatabase { db_name, pool })
        }
    });

    let databases = futures::future::try_join_all(creations)
        .await?
        .into_iter()
        .map(|db| Mutex::new(Some(db)))
        .collect();
    let (notify, _) = broadcast::channel(64);

    Ok(Arc::new(DatabasePool { databases, notify }))
}

#[derive(QueryableByName)]
struct TableRow {
    #[diesel(sql_type = diesel::sql_types::Text)]
    tablename: String,
}

/// One isolated database, returned to the shared pool on drop.
pub struct TestDb {
    pool: DbPool,
    db_name: String,
    index: usize,
}

impl TestDb {
    /// ## Summary
    /// Acquires a clean database, or `None` without `TEST_DATABASE_URL`.
    ///
    /// ## Errors
    /// Returns an error if the databases cannot be created or truncated.
    pub async fn new() -> anyhow::Result<Option<Self>> {
        let Some(base_url) = base_database_url() else {
            return Ok(None);
        };
        let shared = DB_POOL
            .get_or_try_init(|| init_db_pool(&base_url))
            .await?
            .clone();

        loop {
            let mut receiver = shared.notify.subscribe();
            let taken = shared.databases.iter().enumerate().find_map(|(index, slot)| {
                try_lock(slot)
                    .and_then(|mut guard| guard.take())
                    .map(|db| (index, db))
            });

            if let Some((index, db)) = taken {
                Self::truncate(&db.pool).await?;
                return Ok(Some(Self {
                    pool: db.pool,
                    db_name: db.db_name,
                    index,
                }));
            }

            #[expect(unused_must_use)]
            receiver.recv().await;
        }
    }

    async fn truncate(pool: &DbPool) -> anyhow::Result<()> {
        let mut conn = pool.get().await?;
        let tables: Vec<String> = diesel::sql_query(
            "SELECT tablename FROM pg_tables WHERE schemaname = 'public' \
             AND tablename <> '__diesel_schema_migrations'",
        )
        .load::<TableRow>(&mut conn)
        .await?
        .into_iter()
        .map(|row| format!("\"{}\"", row.tablename))
        .collect();

        if !tables.is_empty() {
            diesel::sql_query(format!("TRUNCATE TABLE {} CASCADE", tables.join(", ")))
                .execute(&mut conn)
                .await?;
        }
        Ok(())
    }

    /// ## Errors
    /// Returns an error if no connection can be obtained.
    pub async fn get_conn(&self) -> anyhow::Result<DbConnection<'_>> {
        Ok(self.pool.get().await?)
    }

    /// ## Summary
    /// Full API service over this database, wired like the server binary.
    pub async fn service(&self) -> Service {
        let enforcer = init_casbin().await.expect("Casbin enforcer should load");
        let router = Router::new()
            .hoop(DbProviderHandler {
                provider: self.pool.clone(),
            })
            .hoop(ConfigHandler {
                settings: Arc::new(test_settings()),
            })
            .hoop(CasbinEnforcerHandler {
                enforcer: Arc::new(enforcer),
            })
            .push(campus_app::app::api::routes());
        Service::new(router)
    }

    /// Seeds an active account with [`TEST_PASSWORD`].
    pub async fn seed_user(&self, role: Role, email: &str) -> User {
        let mut conn = self.get_conn().await.expect("connection");
        let password_hash = hash_password(TEST_PASSWORD).expect("hashable password");
        let user = user_query::create_user(
            &mut conn,
            &NewUser {
                id: uuid::Uuid::now_v7(),
                email,
                first_name: "Test",
                last_name: role.as_str(),
                role,
                password_hash: Some(&password_hash),
                is_active: true,
                activation_token_hash: None,
                activation_expires_at: None,
            },
        )
        .await
        .expect("user insert");

        if role == Role::Student {
            student_query::create_profile(
                &mut conn,
                &NewStudentProfile {
                    user_id: user.id,
                    formation_id: None,
                },
            )
            .await
            .expect("profile insert");
        }
        user
    }

    /// Seeds a student enrolled in `formation_id`.
    pub async fn seed_student(&self, email: &str, formation_id: uuid::Uuid) -> User {
        let mut conn = self.get_conn().await.expect("connection");
        let password_hash = hash_password(TEST_PASSWORD).expect("hashable password");
        let user = user_query::create_user(
            &mut conn,
            &NewUser {
                id: uuid::Uuid::now_v7(),
                email,
                first_name: "Test",
                last_name: "Student",
                role: Role::Student,
                password_hash: Some(&password_hash),
                is_active: true,
                activation_token_hash: None,
                activation_expires_at: None,
            },
        )
        .await
        .expect("user insert");
        student_query::create_profile(
            &mut conn,
            &NewStudentProfile {
                user_id: user.id,
                formation_id: Some(formation_id),
            },
        )
        .await
        .expect("profile insert");
        user
    }

    pub async fn seed_formation(&self, name: &str) -> Formation {
        let mut conn = self.get_conn().await.expect("connection");
        formation_query::create_formation(
            &mut conn,
            &NewFormation {
                id: uuid::Uuid::now_v7(),
                name,
                description: None,
                start_date: None,
                end_date: None,
            },
        )
        .await
        .expect("formation insert")
    }

    pub async fn seed_course(
        &self,
        formation_id: uuid::Uuid,
        teacher_id: Option<uuid::Uuid>,
        title: &str,
    ) -> Course {
        let mut conn = self.get_conn().await.expect("connection");
        course_query::create_course(
            &mut conn,
            &NewCourse {
                id: uuid::Uuid::now_v7(),
                formation_id,
                teacher_id,
                title,
                description: None,
            },
        )
        .await
        .expect("course insert")
    }

    /// Counts rows of a table.
    pub async fn count(&self, table: &str) -> i64 {
        #[derive(QueryableByName)]
        struct CountRow {
            #[diesel(sql_type = diesel::sql_types::BigInt)]
            count: i64,
        }
        let mut conn = self.get_conn().await.expect("connection");
        diesel::sql_query(format!("SELECT COUNT(*) AS count FROM \"{table}\""))
            .get_result::<CountRow>(&mut conn)
            .await
            .expect("count query")
            .count
    }
}

impl Drop for TestDb {
    fn drop(&mut self) {
        let Some(shared) = DB_POOL.get() else {
            return;
        };
        *lock(&shared.databases[self.index]) = Some(PooledDatabase {
            db_name: self.db_name.clone(),
            pool: self.pool.clone(),
        });
        #[expect(unused_must_use)]
        shared.notify.send(());
    }
}

/// Logs in through the API and returns the bearer token.
pub async fn login(service: &Service, email: &str) -> String {
    let res = TestRequest::post("/api/auth/login")
        .json(&serde_json::json!({ "email": email, "password": TEST_PASSWORD }))
        .send(service)
        .await
        .assert_status(StatusCode::OK);
    res.json()["token"]
        .as_str()
        .expect("token in login response")
        .to_string()
}

/// Test request builder for constructing HTTP requests.
pub struct TestRequest {
    method: Method,
    path: String,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl TestRequest {
    #[must_use]
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn post(path: &str) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn put(path: &str) -> Self {
        Self::new(Method::PUT, path)
    }

    #[must_use]
    pub fn delete(path: &str) -> Self {
        Self::new(Method::DELETE, path)
    }

    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn bearer(self, token: &str) -> Self {
        self.header("Authorization", &format!("Bearer {token}"))
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    #[must_use]
    pub fn json(self, value: &Value) -> Self {
        self.header("Content-Type", "application/json")
            .body(value.to_string())
    }

    /// Sets a multipart body with one file part and optional text fields.
    #[must_use]
    pub fn multipart(
        self,
        file_name: &str,
        content_type: &str,
        content: &[u8],
        fields: &[(&str, &str)],
    ) -> Self {
        const BOUNDARY: &str = "campus-test-boundary";
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        self.header(
            "Content-Type",
            &format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(body)
    }

    /// ## Panics
    /// Panics if the response body cannot be read.
    pub async fn send(self, service: &Service) -> TestResponse {
        let url = format!("http://127.0.0.1:5800{}", self.path);
        let mut client = RequestBuilder::new(&url, self.method.clone());

        for (name, value) in self.headers {
            if let Ok(header_name) = HeaderName::try_from(name.as_str()) {
                client = client.add_header(header_name, value, true);
            }
        }
        if let Some(body) = self.body {
            client = client.body(ReqBody::Once(body.into()));
        }

        let mut response = client.send(service).await;
        let status = response
            .status_code
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect();
        let body = response
            .take_bytes(None)
            .await
            .unwrap_or_default()
            .to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Represents an HTTP test response for assertions.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl TestResponse {
    #[must_use]
    pub fn assert_status(self, expected: StatusCode) -> Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {expected} but got {}: {}",
            self.status,
            self.body_string()
        );
        self
    }

    #[must_use]
    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// ## Panics
    /// Panics if the body is not JSON.
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("JSON response body")
    }

    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
