/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use chorus_api::{app::AppState, config::Config};
/// use chorus_shared::storage::MediaStore;
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let media = MediaStore::new(&config.media.root);
/// let state = AppState::new(pool, config, media);
/// let app = chorus_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{
    extract::{DefaultBodyLimit, Request},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post},
    Router,
};
use chorus_shared::auth::jwt;
use chorus_shared::auth::middleware::{AuthContext, MaybeAuthContext};
use chorus_shared::storage::{MediaStore, MEDIA_ROUTE};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Uploaded media storage
    pub media: MediaStore,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config, media: MediaStore) -> Self {
        Self {
            db,
            config: Arc::new(config),
            media,
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                        # Health check (public)
/// ├── /register, /login              # Account creation and login (public)
/// ├── /logout, /profile              # Session endpoints (auth)
/// ├── /music/                        # Catalog
/// │   ├── GET  /list|/popular|/search   # Public; is_liked personalizes
/// │   ├── POST /upload                  # Multipart upload (auth)
/// │   ├── POST /:id/like                # Toggle like (auth)
/// │   ├── GET  /liked                   # Liked tracks (auth)
/// │   └── DELETE /:id/delete            # Owner-only delete (auth)
/// ├── /playlists/                    # Playlists (all auth)
/// ├── /account/delete                # Cascading account deletion (auth)
/// └── /media/*                       # Uploaded files (static)
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Body limit for uploads
/// 4. Authentication (per-route basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Account routes (public, no auth required)
    let public_auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login));

    // Session routes (require JWT authentication)
    let session_routes = Router::new()
        .route("/logout", post(routes::auth::logout))
        .route("/profile", get(routes::auth::profile))
        .route("/account/delete", delete(routes::account::delete_account))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Public catalog routes; a valid token personalizes is_liked
    let public_music_routes = Router::new()
        .route("/music/list", get(routes::music::list))
        .route("/music/popular", get(routes::music::popular))
        .route("/music/search", get(routes::music::search))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            optional_jwt_auth_layer,
        ));

    // Catalog mutations (require JWT authentication)
    let music_routes = Router::new()
        .route("/music/upload", post(routes::music::upload))
        .route("/music/:id/like", post(routes::music::like))
        .route("/music/liked", get(routes::music::liked))
        .route("/music/:id/delete", delete(routes::music::delete))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Playlist routes (require JWT authentication)
    let playlist_routes = Router::new()
        .route("/playlists", get(routes::playlists::list))
        .route("/playlists/create", post(routes::playlists::create))
        .route("/playlists/create-final", post(routes::playlists::create_final))
        .route("/playlists/create-page", get(routes::playlists::create_page))
        .route("/playlists/add-song", post(routes::playlists::add_song))
        .route("/playlists/user-playlists", get(routes::playlists::user_playlists))
        .route("/playlists/public", get(routes::playlists::public_list))
        .route("/playlists/public/:id", get(routes::playlists::public_detail_simple))
        .route("/playlists/public/:id/detail", get(routes::playlists::public_detail))
        .route("/playlists/:id", get(routes::playlists::detail))
        .route("/playlists/:id/delete", delete(routes::playlists::delete))
        .route("/playlists/:id/remove-song", post(routes::playlists::remove_song))
        .route("/playlists/:id/toggle-public", post(routes::playlists::toggle_public))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        // Production mode: configure allowed origins
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    // Combine all routes with middleware stack
    Router::new()
        .merge(health_routes)
        .merge(public_auth_routes)
        .merge(session_routes)
        .merge(public_music_routes)
        .merge(music_routes)
        .merge(playlist_routes)
        .nest_service(MEDIA_ROUTE, ServeDir::new(state.media.root()))
        .layer(DefaultBodyLimit::max(state.config.media.max_upload_bytes))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Extracts and validates the Bearer token from the Authorization header,
/// then injects an `AuthContext` into request extensions.
async fn jwt_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    // Extract Authorization header
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            crate::error::ApiError::Unauthorized("Missing authorization header".to_string())
        })?;

    // Parse Bearer token
    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        crate::error::ApiError::BadRequest("Expected Bearer token".to_string())
    })?;

    // Validate token
    let claims = jwt::validate_token(token, state.jwt_secret())?;

    // Insert auth context into request extensions
    req.extensions_mut()
        .insert(AuthContext::from_claims(&claims));

    Ok(next.run(req).await)
}

/// Optional JWT authentication middleware layer
///
/// For public routes whose responses personalize for a logged-in caller.
/// A missing or invalid token degrades to an anonymous request instead of
/// rejecting it.
async fn optional_jwt_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let context = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(|token| jwt::validate_token(token, state.jwt_secret()).ok())
        .map(|claims| AuthContext::from_claims(&claims));

    req.extensions_mut().insert(MaybeAuthContext(context));

    next.run(req).await
}

#[cfg(test)]
mod tests {
    // AppState construction and routing are covered by the integration
    // tests in tests/, which build the full router against a database.
}
