/// Account deletion endpoint
///
/// # Endpoints
///
/// - `DELETE /account/delete` - Delete the authenticated account and
///   everything it owns

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Extension, Json};
use chorus_shared::{auth::middleware::AuthContext, models::user::User};
use serde::Serialize;

/// Account deletion response
#[derive(Debug, Serialize)]
pub struct DeleteAccountResponse {
    /// Whether the deletion completed
    pub success: bool,

    /// Confirmation message
    pub message: String,
}

/// Deletes the authenticated account
///
/// Purges, in order: the user's uploaded music (with its like and playlist
/// membership rows), their playlists, their like relation, and finally the
/// user record — all in one transaction. Irreversible.
///
/// # Endpoint
///
/// ```text
/// DELETE /account/delete
/// Authorization: Bearer <token>
/// ```
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "message": "Account and all associated data deleted successfully"
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Missing or invalid token
/// - `404 Not Found`: Token refers to an already-deleted account
/// - `500 Internal Server Error`: Server error
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<DeleteAccountResponse>> {
    tracing::info!(user_id = %auth.user_id, username = %auth.username, "Starting account deletion");

    let deletion = User::delete_account(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(
        user_id = %auth.user_id,
        music_deleted = deletion.music_deleted,
        playlists_deleted = deletion.playlists_deleted,
        likes_cleared = deletion.likes_cleared,
        "Account deletion completed"
    );

    Ok(Json(DeleteAccountResponse {
        success: true,
        message: "Account and all associated data deleted successfully".to_string(),
    }))
}
