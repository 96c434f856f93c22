/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - Test database setup and per-test user creation
/// - JWT token generation
/// - Request builders for JSON and multipart endpoints
///
/// Integration tests need a running PostgreSQL instance (`DATABASE_URL`)
/// and are marked `#[ignore]`; run them with `cargo test -- --ignored`.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chorus_api::app::{build_router, AppState};
use chorus_api::config::Config;
use chorus_shared::auth::jwt::{create_token, Claims};
use chorus_shared::auth::password::hash_password;
use chorus_shared::db::migrations::run_migrations;
use chorus_shared::models::user::{CreateUser, User};
use chorus_shared::storage::MediaStore;
use sqlx::PgPool;
use tower::Service as _;
use uuid::Uuid;

/// Host header used by every test request; asset URLs resolve against it
pub const TEST_HOST: &str = "chorus.test";

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub config: Config,
    pub user: User,
    pub jwt_token: String,
    // Held so the media directory outlives the test
    _media_dir: tempfile::TempDir,
}

impl TestContext {
    /// Creates a new test context with a fresh user and media directory
    pub async fn new() -> anyhow::Result<Self> {
        // Load test configuration
        let config = Config::from_env()?;

        // Connect to database and apply migrations
        let db = PgPool::connect(&config.database.url).await?;
        run_migrations(&db).await?;

        // Media storage under a temp directory
        let media_dir = tempfile::tempdir()?;
        let media = MediaStore::new(media_dir.path());
        media.init().await?;

        // Create test user
        let user = User::create(
            &db,
            CreateUser {
                username: format!("test-user-{}", Uuid::new_v4()),
                password_hash: hash_password("pw123")?,
                profile_image: None,
            },
        )
        .await?;

        // Generate JWT token
        let claims = Claims::new(user.id, user.username.clone());
        let jwt_token = create_token(&claims, &config.jwt.secret)?;

        // Build app
        let state = AppState::new(db.clone(), config.clone(), media);
        let app = build_router(state);

        Ok(TestContext {
            db,
            app,
            config,
            user,
            jwt_token,
            _media_dir: media_dir,
        })
    }

    /// Returns authorization header value for the primary test user
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.jwt_token)
    }

    /// Cleans up test data
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        User::delete_account(&self.db, self.user.id).await?;
        Ok(())
    }

    /// Sends a JSON request and returns (status, parsed body)
    pub async fn request(
        &mut self,
        method: &str,
        uri: &str,
        auth: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::HOST, TEST_HOST);

        if let Some(token) = auth {
            builder = builder.header(header::AUTHORIZATION, token);
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };

        let response = self.app.call(request).await.expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let value = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };

        (status, value)
    }

    /// Uploads a track through the multipart endpoint
    pub async fn upload_track(
        &mut self,
        auth: &str,
        title: &str,
        artist: Option<&str>,
        content_type: &str,
    ) -> (StatusCode, serde_json::Value) {
        let boundary = "chorus-test-boundary";
        let body = multipart_upload_body(boundary, title, artist, content_type);

        let request = Request::builder()
            .method("POST")
            .uri("/music/upload")
            .header(header::HOST, TEST_HOST)
            .header(header::AUTHORIZATION, auth)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .expect("request");

        let response = self.app.call(request).await.expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let value: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");

        (status, value)
    }

    /// Registers a secondary user via the API and returns (username, bearer header)
    pub async fn register_user(&mut self, prefix: &str) -> (String, String) {
        let username = format!("{}-{}", prefix, Uuid::new_v4());
        let (status, body) = self
            .request(
                "POST",
                "/register",
                None,
                Some(serde_json::json!({ "username": username, "password": "pw123" })),
            )
            .await;

        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
        let token = body["access_token"].as_str().expect("token").to_string();
        (username, format!("Bearer {}", token))
    }
}

/// Builds a multipart form with a title, optional artist, and an audio file
/// declared with the given content type
fn multipart_upload_body(
    boundary: &str,
    title: &str,
    artist: Option<&str>,
    content_type: &str,
) -> Vec<u8> {
    let mut body = Vec::new();

    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\n{}\r\n",
            boundary, title
        )
        .as_bytes(),
    );

    if let Some(artist) = artist {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"artist\"\r\n\r\n{}\r\n",
                boundary, artist
            )
            .as_bytes(),
        );
    }

    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"audio_file\"; filename=\"track.mp3\"\r\nContent-Type: {}\r\n\r\n",
            boundary, content_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"fake-audio-bytes");
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    body
}
