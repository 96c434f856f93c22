/// Authentication endpoints
///
/// This module provides account endpoints:
/// - Registration
/// - Login
/// - Logout (stateless acknowledgement)
/// - Profile
///
/// # Endpoints
///
/// - `POST /register` - Register new user
/// - `POST /login` - Login and get an access token
/// - `POST /logout` - Acknowledge logout (auth)
/// - `GET /profile` - Current user's profile (auth)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Host, State},
    http::StatusCode,
    Extension, Json,
};
use chorus_shared::{
    auth::{jwt, middleware::AuthContext, password},
    models::user::{CreateUser, User},
    storage,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Register request
///
/// Both fields are optional at the deserialization layer so that a missing
/// field reports the API's own 400 instead of a framework rejection.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Desired username (unique, case-sensitive)
    #[validate(length(max = 150, message = "Username must be at most 150 characters"))]
    pub username: Option<String>,

    /// Password (hashed before storage; never persisted in plaintext)
    pub password: Option<String>,
}

/// Register / login response
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Confirmation message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Access token (24h)
    pub access_token: String,

    /// Authenticated username
    pub username: String,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username
    pub username: Option<String>,

    /// Password
    pub password: Option<String>,
}

/// Logout response
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    /// Confirmation message
    pub message: String,
}

/// Profile response
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    /// Username
    pub username: String,

    /// Absolute profile image URL, if one is set
    pub profile_image: Option<String>,
}

/// Pulls (username, password) out of a request, rejecting blank input
///
/// Registration and login share the same "Username and password required"
/// contract for missing fields.
fn required_credentials(
    username: Option<String>,
    password: Option<String>,
) -> Result<(String, String), ApiError> {
    match (username, password) {
        (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => Ok((u, p)),
        _ => Err(ApiError::BadRequest(
            "Username and password required".to_string(),
        )),
    }
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /register
/// Content-Type: application/json
///
/// {
///   "username": "alice",
///   "password": "pw123"
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "message": "User created successfully",
///   "access_token": "eyJ...",
///   "username": "alice"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing credentials or username already exists
/// - `500 Internal Server Error`: Server error
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    // Validate request
    req.validate().map_err(ApiError::from_validation)?;

    let (username, plaintext) = required_credentials(req.username, req.password)?;

    // Reject duplicates with a case-sensitive exact match
    if User::username_taken(&state.db, &username).await? {
        return Err(ApiError::BadRequest("Username already exists".to_string()));
    }

    // Hash password
    let password_hash = password::hash_password(&plaintext)?;

    // Create user
    let user = User::create(
        &state.db,
        CreateUser {
            username: username.clone(),
            password_hash,
            profile_image: None,
        },
    )
    .await?;

    // Generate access token
    let claims = jwt::Claims::new(user.id, user.username.clone());
    let access_token = jwt::create_token(&claims, state.jwt_secret())?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: Some("User created successfully".to_string()),
            access_token,
            username: user.username,
        }),
    ))
}

/// Login endpoint
///
/// Authenticates a user and returns an access token.
///
/// # Endpoint
///
/// ```text
/// POST /login
/// Content-Type: application/json
///
/// {
///   "username": "alice",
///   "password": "pw123"
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "access_token": "eyJ...",
///   "username": "alice"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing or invalid credentials
/// - `500 Internal Server Error`: Server error
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let (username, plaintext) = required_credentials(req.username, req.password)?;

    // Find user by username; report the same error as a bad password
    let user = User::find_by_username(&state.db, &username)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Invalid credentials".to_string()))?;

    // Verify password
    let valid = password::verify_password(&plaintext, &user.password_hash)?;
    if !valid {
        return Err(ApiError::BadRequest("Invalid credentials".to_string()));
    }

    // Generate access token
    let claims = jwt::Claims::new(user.id, user.username.clone());
    let access_token = jwt::create_token(&claims, state.jwt_secret())?;

    Ok(Json(AuthResponse {
        message: None,
        access_token,
        username: user.username,
    }))
}

/// Logout endpoint
///
/// Tokens are stateless, so there is nothing to revoke server-side; this
/// exists for clients that want an explicit logout round-trip.
pub async fn logout(Extension(_auth): Extension<AuthContext>) -> Json<LogoutResponse> {
    Json(LogoutResponse {
        message: "Successfully logged out".to_string(),
    })
}

/// Profile endpoint
///
/// Returns the authenticated user's username and profile image URL.
///
/// # Errors
///
/// - `401 Unauthorized`: Missing or invalid token
/// - `404 Not Found`: Token refers to a deleted account
pub async fn profile(
    State(state): State<AppState>,
    Host(host): Host,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ProfileResponse>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(ProfileResponse {
        username: user.username,
        profile_image: storage::absolute_url_opt(&host, user.profile_image.as_deref()),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_credentials_present() {
        let result = required_credentials(Some("alice".to_string()), Some("pw123".to_string()));
        assert_eq!(
            result.unwrap(),
            ("alice".to_string(), "pw123".to_string())
        );
    }

    #[test]
    fn test_required_credentials_missing() {
        for (username, password) in [
            (None, None),
            (Some("alice".to_string()), None),
            (None, Some("pw123".to_string())),
            (Some(String::new()), Some("pw123".to_string())),
            (Some("alice".to_string()), Some(String::new())),
        ] {
            let result = required_credentials(username, password);
            assert!(matches!(result, Err(ApiError::BadRequest(_))));
        }
    }

    #[test]
    fn test_register_request_length_validation() {
        let req = RegisterRequest {
            username: Some("a".repeat(151)),
            password: Some("pw123".to_string()),
        };
        assert!(req.validate().is_err());

        let req = RegisterRequest {
            username: Some("alice".to_string()),
            password: Some("pw123".to_string()),
        };
        assert!(req.validate().is_ok());
    }
}
