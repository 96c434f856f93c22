/// Music catalog endpoints
///
/// This module provides the catalog surface:
/// - Multipart upload (audio + optional cover)
/// - Listing, popular ranking, and search (public; personalized `is_liked`)
/// - Like toggling and the liked listing
/// - Owner-only deletion
///
/// # Endpoints
///
/// - `POST /music/upload` - Upload a track (auth)
/// - `GET /music/list` - Full catalog, newest first
/// - `POST /music/:id/like` - Toggle like (auth)
/// - `GET /music/liked` - Tracks the caller likes (auth)
/// - `GET /music/popular` - Top 5 by like count
/// - `GET /music/search?q=...` - Up to 10 substring matches
/// - `DELETE /music/:id/delete` - Delete own track (auth)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Host, Multipart, Path, Query, State},
    Extension, Json,
};
use chorus_shared::{
    auth::middleware::{AuthContext, MaybeAuthContext},
    models::music::{CreateMusic, Music, MusicRow},
    storage::{self, MediaKind},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How many tracks the popular listing returns
const POPULAR_LIMIT: i64 = 5;

/// How many results a search returns at most
const SEARCH_LIMIT: i64 = 10;

/// A catalog entry as shaped for responses
///
/// Carries both the stored relative paths and the absolute URLs resolved
/// against the requesting host.
#[derive(Debug, Serialize)]
pub struct MusicResponse {
    /// Music ID
    pub id: Uuid,

    /// Track title
    pub title: String,

    /// Artist name (may be empty)
    pub artist: String,

    /// Stored audio path (relative to the media root)
    pub audio_file: String,

    /// Absolute audio URL for this request's host
    pub audio_url: String,

    /// Stored cover path, if any
    pub cover_image: Option<String>,

    /// Absolute cover URL, if any
    pub cover_url: Option<String>,

    /// Uploading user's ID
    pub uploaded_by: Uuid,

    /// Uploading user's username
    pub uploaded_by_username: String,

    /// Upload time
    pub uploaded_at: DateTime<Utc>,

    /// Number of users who like this track
    pub like_count: i64,

    /// Whether the viewing user likes this track (false when anonymous)
    pub is_liked: bool,
}

impl MusicResponse {
    /// Shapes an annotated catalog row for the given request host
    pub fn from_row(host: &str, row: MusicRow) -> Self {
        Self {
            audio_url: storage::absolute_url(host, &row.audio_file),
            cover_url: storage::absolute_url_opt(host, row.cover_image.as_deref()),
            id: row.id,
            title: row.title,
            artist: row.artist,
            audio_file: row.audio_file,
            cover_image: row.cover_image,
            uploaded_by: row.uploaded_by,
            uploaded_by_username: row.uploaded_by_username,
            uploaded_at: row.uploaded_at,
            like_count: row.like_count,
            is_liked: row.is_liked,
        }
    }

    /// Shapes a whole listing for the given request host
    pub fn from_rows(host: &str, rows: Vec<MusicRow>) -> Vec<Self> {
        rows.into_iter().map(|row| Self::from_row(host, row)).collect()
    }
}

/// Upload response
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Confirmation message
    pub message: String,

    /// Summary of the created track
    pub music: UploadedMusic,
}

/// Summary of a freshly uploaded track
#[derive(Debug, Serialize)]
pub struct UploadedMusic {
    /// Music ID
    pub id: Uuid,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Absolute audio URL
    pub audio_url: String,

    /// Absolute cover URL, if a cover was uploaded
    pub cover_url: Option<String>,
}

/// Like toggle response
#[derive(Debug, Serialize)]
pub struct LikeResponse {
    /// Whether the caller now likes the track
    pub liked: bool,

    /// The track's like count after the toggle
    pub like_count: i64,
}

/// Search query parameters
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Search query; empty or missing returns no results
    pub q: Option<String>,
}

/// Delete response
#[derive(Debug, Serialize)]
pub struct DeleteMusicResponse {
    /// Whether the deletion completed
    pub success: bool,

    /// Confirmation message
    pub message: String,
}

/// One part of the upload form, buffered in memory
struct UploadedFile {
    filename: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

/// Upload a track
///
/// Accepts a multipart form with `title`, optional `artist`, a required
/// `audio_file` whose declared content type must be an accepted audio
/// format, and an optional `cover_image`. Files are stored synchronously
/// within the request.
///
/// # Endpoint
///
/// ```text
/// POST /music/upload
/// Authorization: Bearer <token>
/// Content-Type: multipart/form-data
/// ```
///
/// # Response
///
/// ```json
/// {
///   "message": "Music uploaded successfully",
///   "music": {
///     "id": "uuid",
///     "title": "Song A",
///     "artist": "",
///     "audio_url": "http://host/media/music/....mp3",
///     "cover_url": null
///   }
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing title/audio, or audio format not allowed
/// - `401 Unauthorized`: Missing or invalid token
/// - `500 Internal Server Error`: Storage or database failure
pub async fn upload(
    State(state): State<AppState>,
    Host(host): Host,
    Extension(auth): Extension<AuthContext>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let mut title: Option<String> = None;
    let mut artist: Option<String> = None;
    let mut audio_file: Option<UploadedFile> = None;
    let mut cover_image: Option<UploadedFile> = None;

    // Walk the multipart form
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart form: {}", e)))?
    {
        match field.name() {
            Some("title") => {
                title = Some(field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("Unreadable title field: {}", e))
                })?);
            }
            Some("artist") => {
                artist = Some(field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("Unreadable artist field: {}", e))
                })?);
            }
            Some("audio_file") => {
                let filename = field.file_name().unwrap_or("audio").to_string();
                let content_type = field.content_type().map(|ct| ct.to_string());
                let bytes = field.bytes().await.map_err(|e| {
                    ApiError::BadRequest(format!("Unreadable audio file: {}", e))
                })?;
                audio_file = Some(UploadedFile {
                    filename,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            Some("cover_image") => {
                let filename = field.file_name().unwrap_or("cover").to_string();
                let content_type = field.content_type().map(|ct| ct.to_string());
                let bytes = field.bytes().await.map_err(|e| {
                    ApiError::BadRequest(format!("Unreadable cover image: {}", e))
                })?;
                cover_image = Some(UploadedFile {
                    filename,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    // Title and audio are required
    let (title, audio) = match (title.filter(|t| !t.is_empty()), audio_file) {
        (Some(t), Some(a)) => (t, a),
        _ => {
            return Err(ApiError::BadRequest(
                "Title and audio file are required".to_string(),
            ))
        }
    };

    // The declared content type must be on the audio allow-list
    let content_type = audio.content_type.as_deref().unwrap_or("");
    if !storage::is_allowed_audio_type(content_type) {
        return Err(ApiError::BadRequest("Invalid audio format".to_string()));
    }

    // Persist the files, then the row
    let audio_path = state
        .media
        .save(MediaKind::Audio, &audio.filename, &audio.bytes)
        .await?;

    let cover_path = match cover_image {
        Some(cover) => Some(
            state
                .media
                .save(MediaKind::Cover, &cover.filename, &cover.bytes)
                .await?,
        ),
        None => None,
    };

    let music = Music::create(
        &state.db,
        CreateMusic {
            title,
            artist: artist.unwrap_or_default(),
            audio_file: audio_path,
            cover_image: cover_path,
            uploaded_by: auth.user_id,
        },
    )
    .await?;

    tracing::info!(music_id = %music.id, uploader = %auth.username, "Track uploaded");

    Ok(Json(UploadResponse {
        message: "Music uploaded successfully".to_string(),
        music: UploadedMusic {
            id: music.id,
            title: music.title,
            artist: music.artist,
            audio_url: storage::absolute_url(&host, &music.audio_file),
            cover_url: storage::absolute_url_opt(&host, music.cover_image.as_deref()),
        },
    }))
}

/// Full catalog listing, newest upload first
///
/// Public; `is_liked` is false for anonymous callers.
pub async fn list(
    State(state): State<AppState>,
    Host(host): Host,
    Extension(viewer): Extension<MaybeAuthContext>,
) -> ApiResult<Json<Vec<MusicResponse>>> {
    let rows = Music::list_all(&state.db, viewer.user_id()).await?;
    Ok(Json(MusicResponse::from_rows(&host, rows)))
}

/// Toggles the caller's like on a track
///
/// # Errors
///
/// - `401 Unauthorized`: Missing or invalid token
/// - `404 Not Found`: Unknown music id
pub async fn like(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(music_id): Path<Uuid>,
) -> ApiResult<Json<LikeResponse>> {
    let (liked, like_count) = Music::toggle_like(&state.db, auth.user_id, music_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Music not found".to_string()))?;

    Ok(Json(LikeResponse { liked, like_count }))
}

/// Lists the tracks the caller currently likes
pub async fn liked(
    State(state): State<AppState>,
    Host(host): Host,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<MusicResponse>>> {
    let rows = Music::list_liked(&state.db, auth.user_id).await?;
    Ok(Json(MusicResponse::from_rows(&host, rows)))
}

/// Top tracks by like count
pub async fn popular(
    State(state): State<AppState>,
    Host(host): Host,
    Extension(viewer): Extension<MaybeAuthContext>,
) -> ApiResult<Json<Vec<MusicResponse>>> {
    let rows = Music::popular(&state.db, viewer.user_id(), POPULAR_LIMIT).await?;
    Ok(Json(MusicResponse::from_rows(&host, rows)))
}

/// Case-insensitive substring search over title and artist
///
/// An empty or missing query returns an empty list, not the whole catalog.
pub async fn search(
    State(state): State<AppState>,
    Host(host): Host,
    Extension(viewer): Extension<MaybeAuthContext>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<MusicResponse>>> {
    let query = params.q.unwrap_or_default();
    let query = query.trim();

    if query.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let rows = Music::search(&state.db, viewer.user_id(), query, SEARCH_LIMIT).await?;
    Ok(Json(MusicResponse::from_rows(&host, rows)))
}

/// Deletes a track the caller uploaded
///
/// A track that exists but belongs to someone else reports the same 404 as
/// a missing one.
///
/// # Errors
///
/// - `401 Unauthorized`: Missing or invalid token
/// - `404 Not Found`: Unknown id or not the uploader
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(music_id): Path<Uuid>,
) -> ApiResult<Json<DeleteMusicResponse>> {
    let deleted = Music::delete_owned(&state.db, auth.user_id, music_id).await?;

    if !deleted {
        return Err(ApiError::NotFound(
            "Music not found or you do not have permission to delete it".to_string(),
        ));
    }

    Ok(Json(DeleteMusicResponse {
        success: true,
        message: "Music deleted successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> MusicRow {
        MusicRow {
            id: Uuid::new_v4(),
            title: "Song A".to_string(),
            artist: String::new(),
            audio_file: "music/abc.mp3".to_string(),
            cover_image: None,
            uploaded_by: Uuid::new_v4(),
            uploaded_by_username: "alice".to_string(),
            uploaded_at: Utc::now(),
            like_count: 0,
            is_liked: false,
        }
    }

    #[test]
    fn test_music_response_resolves_urls() {
        let row = sample_row();
        let response = MusicResponse::from_row("localhost:8080", row);

        assert_eq!(
            response.audio_url,
            "http://localhost:8080/media/music/abc.mp3"
        );
        assert!(response.cover_url.is_none());
        assert_eq!(response.like_count, 0);
        assert!(!response.is_liked);
    }

    #[test]
    fn test_music_response_resolves_cover() {
        let mut row = sample_row();
        row.cover_image = Some("music_covers/c.png".to_string());

        let response = MusicResponse::from_row("example.com", row);
        assert_eq!(
            response.cover_url.as_deref(),
            Some("http://example.com/media/music_covers/c.png")
        );
    }

    #[test]
    fn test_limits() {
        assert_eq!(POPULAR_LIMIT, 5);
        assert_eq!(SEARCH_LIMIT, 10);
    }
}
