//! Shared test harness: in-memory database, fake storage provider, and
//! token minting for the API tests.

use async_trait::async_trait;
use axum_test::TestServer;
use bytes::Bytes;
use jsonwebtoken::{EncodingKey, Header, encode};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::collections::HashMap;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};
use studyshare::handlers::AppState;
use studyshare::routes::routes::routes;
use studyshare::services::auth::{AuthVerifier, Claims};
use studyshare::services::object_storage::{ObjectStorage, StorageError, StoredObject};
use studyshare::services::resource_service::ResourceService;

/// Secret shared between minted test tokens and the verifier.
pub const TEST_SECRET: &str = "studyshare-test-secret";

/// Small cap so oversized-upload tests stay cheap.
pub const MAX_UPLOAD_BYTES: u64 = 1024 * 1024;

/// In-memory stand-in for the storage provider.
///
/// Tracks stored objects and upload calls, and can be told to fail uploads
/// or deletions to exercise the cleanup paths.
#[derive(Default)]
pub struct FakeStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    upload_calls: AtomicUsize,
    next_id: AtomicUsize,
    pub fail_uploads: AtomicBool,
    pub fail_deletes: AtomicBool,
}

impl FakeStorage {
    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn store(
        &self,
        file_name: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<StoredObject, StorageError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::Provider {
                status: 500,
                message: "upload refused".into(),
            });
        }

        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let storage_id = format!("resources/{n}-{file_name}");
        let kind = if content_type.starts_with("image/") {
            "image"
        } else {
            "raw"
        };
        let url = format!("https://res.cloudinary.com/test/{kind}/upload/v1700000000/{storage_id}");

        self.objects
            .lock()
            .unwrap()
            .insert(storage_id.clone(), data.to_vec());

        Ok(StoredObject {
            url,
            storage_id: Some(storage_id),
            size: data.len() as i64,
            content_type: content_type.to_string(),
        })
    }

    async fn delete(&self, storage_id: &str) -> Result<(), StorageError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::Provider {
                status: 500,
                message: "delete refused".into(),
            });
        }

        self.objects.lock().unwrap().remove(storage_id);
        Ok(())
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub storage: Arc<FakeStorage>,
    pub db: Arc<SqlitePool>,
}

/// Spin up the full router over an in-memory database and fake storage.
pub async fn spawn_app() -> TestApp {
    // One connection: each new in-memory SQLite connection would otherwise
    // be a separate empty database.
    let db = Arc::new(
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("failed to open in-memory database"),
    );

    for stmt in include_str!("../../migrations/0001_init.sql")
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        sqlx::query(stmt)
            .execute(&*db)
            .await
            .expect("failed to apply schema");
    }

    let storage = Arc::new(FakeStorage::default());
    let resources = ResourceService::new(db.clone(), storage.clone(), MAX_UPLOAD_BYTES);
    let auth = Arc::new(AuthVerifier::new(TEST_SECRET));

    let app = routes(MAX_UPLOAD_BYTES as usize, None).with_state(AppState { resources, auth });

    TestApp {
        server: TestServer::new(app).expect("failed to start test server"),
        storage,
        db,
    }
}

/// Mint a token the app's verifier accepts.
pub fn mint_token(user_id: &str, name: Option<&str>) -> String {
    mint_token_with_secret(user_id, name, TEST_SECRET)
}

pub fn mint_token_with_secret(user_id: &str, name: Option<&str>, secret: &str) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        name: name.map(str::to_string),
        email: Some(format!("{user_id}@example.edu")),
        iat: now as u64,
        exp: (now + 3600) as u64,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to mint test token")
}
