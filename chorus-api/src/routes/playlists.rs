/// Playlist endpoints
///
/// This module provides playlist CRUD, membership management, and the
/// public-visibility surface. The virtual "Liked Songs" playlist is served
/// alongside real playlists and addressed by the `liked_songs` sentinel id;
/// handlers branch on [`PlaylistRef`] so the special case can't be missed.
///
/// # Endpoints
///
/// - `GET /playlists` - Liked-songs pseudo-entry + owned playlists (auth)
/// - `POST /playlists/create` - Create an empty playlist (auth)
/// - `POST /playlists/create-final` - Create with an initial song set (auth)
/// - `GET /playlists/create-page` - Catalog listing for assembly (auth)
/// - `POST /playlists/add-song` - Add a song, or like via the sentinel (auth)
/// - `GET /playlists/user-playlists` - Owned playlists only (auth)
/// - `GET /playlists/:id` - Detail, sentinel-aware (auth, owner)
/// - `DELETE /playlists/:id/delete` - Delete (auth, owner)
/// - `POST /playlists/:id/remove-song` - Remove a song (auth, owner)
/// - `GET /playlists/public` - All public playlists (auth)
/// - `GET /playlists/public/:id` (+ `/detail`) - Public detail, any caller
/// - `POST /playlists/:id/toggle-public` - Flip visibility (auth, owner)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::music::MusicResponse,
};
use axum::{
    extract::{Host, Path, State},
    Extension, Json,
};
use chorus_shared::{
    auth::middleware::AuthContext,
    models::{
        music::Music,
        playlist::{CreatePlaylist, Playlist, PlaylistRef, PlaylistSummary, LIKED_SONGS_ID},
        playlist_song::PlaylistSong,
    },
    storage,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Display name of the virtual liked-songs playlist
const LIKED_SONGS_NAME: &str = "Liked Songs";

/// One entry of the playlist listing: either the liked-songs pseudo-entry
/// or a real playlist summary
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PlaylistEntry {
    /// The synthetic liked-songs entry, always first
    LikedSongs(LikedSongsEntry),

    /// A persisted playlist
    Playlist(PlaylistSummaryResponse),
}

/// The synthetic liked-songs listing entry
#[derive(Debug, Serialize)]
pub struct LikedSongsEntry {
    /// Always the `liked_songs` sentinel
    pub id: &'static str,

    /// Always "Liked Songs"
    pub name: &'static str,

    /// Number of tracks the caller likes
    pub song_count: i64,

    /// Always true; distinguishes the pseudo-entry for clients
    pub is_liked_playlist: bool,

    /// The liked-songs playlist is always private
    pub is_public: bool,
}

/// A playlist summary as shaped for responses
#[derive(Debug, Serialize)]
pub struct PlaylistSummaryResponse {
    /// Playlist ID
    pub id: Uuid,

    /// Playlist name
    pub name: String,

    /// Description
    pub description: String,

    /// Creation time
    pub created_at: DateTime<Utc>,

    /// Number of member songs
    pub song_count: i64,

    /// Visibility flag
    pub is_public: bool,

    /// Owner's username
    pub owner_username: String,

    /// Cover URL derived from the first-inserted song, if any
    pub cover_url: Option<String>,

    /// Always false for real playlists
    pub is_liked_playlist: bool,
}

impl PlaylistSummaryResponse {
    /// Shapes a summary row for the given request host
    fn from_summary(host: &str, summary: PlaylistSummary) -> Self {
        Self {
            id: summary.id,
            name: summary.name,
            description: summary.description,
            created_at: summary.created_at,
            song_count: summary.song_count,
            is_public: summary.is_public,
            owner_username: summary.owner_username,
            cover_url: storage::absolute_url_opt(host, summary.cover_image.as_deref()),
            is_liked_playlist: false,
        }
    }
}

/// Create playlist request
#[derive(Debug, Deserialize)]
pub struct CreatePlaylistRequest {
    /// Playlist name (required)
    pub name: Option<String>,

    /// Description (defaults to empty)
    pub description: Option<String>,

    /// Initial visibility (defaults to private)
    pub is_public: Option<bool>,
}

/// Create playlist response
#[derive(Debug, Serialize)]
pub struct CreatePlaylistResponse {
    /// Playlist ID
    pub id: Uuid,

    /// Playlist name
    pub name: String,

    /// Visibility flag
    pub is_public: bool,
}

/// Create-with-songs request
#[derive(Debug, Deserialize)]
pub struct CreateFinalRequest {
    /// Playlist name (required)
    pub name: Option<String>,

    /// Description (defaults to empty)
    pub description: Option<String>,

    /// Songs to attach; ids that don't resolve are silently skipped
    #[serde(default)]
    pub song_ids: Vec<Uuid>,

    /// Initial visibility (defaults to public on this flow)
    pub is_public: Option<bool>,
}

/// Create-with-songs response
#[derive(Debug, Serialize)]
pub struct CreateFinalResponse {
    /// Confirmation message
    pub message: String,

    /// Playlist ID
    pub playlist_id: Uuid,

    /// Number of songs *requested*, including skipped ids
    pub song_count: usize,

    /// Visibility flag
    pub is_public: bool,
}

/// Add-song request; `playlist_id` may be the liked-songs sentinel
#[derive(Debug, Deserialize)]
pub struct AddSongRequest {
    /// Target playlist, or `liked_songs`
    pub playlist_id: PlaylistRef,

    /// Song to add
    pub song_id: Uuid,
}

/// Remove-song request
#[derive(Debug, Deserialize)]
pub struct RemoveSongRequest {
    /// Song to remove
    pub song_id: Uuid,
}

/// Simple message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Confirmation message
    pub message: String,
}

/// Toggle-public response
#[derive(Debug, Serialize)]
pub struct TogglePublicResponse {
    /// Confirmation message
    pub message: String,

    /// The new flag value
    pub is_public: bool,
}

/// Playlist detail response (sentinel-aware: `id` may be `liked_songs`)
#[derive(Debug, Serialize)]
pub struct PlaylistDetailResponse {
    /// Playlist id, or the `liked_songs` sentinel
    pub id: String,

    /// Playlist name
    pub name: String,

    /// Description
    pub description: String,

    /// Visibility flag (always false for the liked-songs view)
    pub is_public: bool,

    /// Owner's username
    pub owner_username: String,

    /// Member songs in insertion order
    pub songs: Vec<MusicResponse>,
}

/// A public-playlist listing entry
#[derive(Debug, Serialize)]
pub struct PublicPlaylistEntry {
    /// Playlist ID
    pub id: Uuid,

    /// Playlist name
    pub name: String,

    /// Owner's username
    pub owner_name: String,

    /// Description
    pub description: String,

    /// Number of member songs
    pub song_count: i64,

    /// Cover URL derived from the first-inserted song, if any
    pub cover_url: Option<String>,
}

/// A song inside a public playlist detail
#[derive(Debug, Serialize)]
pub struct PublicSongEntry {
    /// Music ID
    pub id: Uuid,

    /// Track title
    pub title: String,

    /// Artist, with "Unknown Artist" standing in for blank values
    pub artist: String,

    /// Uploader's username
    pub uploaded_by: String,

    /// Absolute audio URL
    pub audio_url: String,

    /// Absolute cover URL, if any
    pub cover_url: Option<String>,
}

/// Public playlist detail response
///
/// `is_public` is only reported by the `/detail` variant.
#[derive(Debug, Serialize)]
pub struct PublicPlaylistDetailResponse {
    /// Playlist ID
    pub id: Uuid,

    /// Playlist name
    pub name: String,

    /// Owner's username
    pub owner: String,

    /// Description
    pub description: String,

    /// Number of member songs
    pub song_count: usize,

    /// Member songs in insertion order
    pub songs: Vec<PublicSongEntry>,

    /// Visibility flag (reported by the `/detail` variant only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}

/// Lists the caller's playlists, prefixed with the liked-songs pseudo-entry
pub async fn list(
    State(state): State<AppState>,
    Host(host): Host,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<PlaylistEntry>>> {
    let liked_count = Music::count_liked(&state.db, auth.user_id).await?;
    let summaries = Playlist::list_owned(&state.db, auth.user_id).await?;

    let mut entries = vec![PlaylistEntry::LikedSongs(LikedSongsEntry {
        id: LIKED_SONGS_ID,
        name: LIKED_SONGS_NAME,
        song_count: liked_count,
        is_liked_playlist: true,
        is_public: false,
    })];

    entries.extend(
        summaries
            .into_iter()
            .map(|s| PlaylistEntry::Playlist(PlaylistSummaryResponse::from_summary(&host, s))),
    );

    Ok(Json(entries))
}

/// Lists the caller's playlists without the pseudo-entry
pub async fn user_playlists(
    State(state): State<AppState>,
    Host(host): Host,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<PlaylistSummaryResponse>>> {
    let summaries = Playlist::list_owned(&state.db, auth.user_id).await?;

    Ok(Json(
        summaries
            .into_iter()
            .map(|s| PlaylistSummaryResponse::from_summary(&host, s))
            .collect(),
    ))
}

/// Catalog listing used while assembling a new playlist
pub async fn create_page(
    State(state): State<AppState>,
    Host(host): Host,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<MusicResponse>>> {
    let rows = Music::list_all(&state.db, Some(auth.user_id)).await?;
    Ok(Json(MusicResponse::from_rows(&host, rows)))
}

/// Creates an empty playlist
///
/// # Errors
///
/// - `400 Bad Request`: Missing name
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreatePlaylistRequest>,
) -> ApiResult<Json<CreatePlaylistResponse>> {
    let name = req
        .name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Playlist name is required".to_string()))?;

    let playlist = Playlist::create(
        &state.db,
        CreatePlaylist {
            name,
            description: req.description.unwrap_or_default(),
            owner_id: auth.user_id,
            is_public: req.is_public.unwrap_or(false),
        },
    )
    .await?;

    Ok(Json(CreatePlaylistResponse {
        id: playlist.id,
        name: playlist.name,
        is_public: playlist.is_public,
    }))
}

/// Creates a playlist with an initial set of songs
///
/// Song ids that do not resolve to an existing track are silently skipped;
/// the reported `song_count` is the requested count either way.
///
/// # Errors
///
/// - `400 Bad Request`: Missing name
pub async fn create_final(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateFinalRequest>,
) -> ApiResult<Json<CreateFinalResponse>> {
    let name = req
        .name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Playlist name is required".to_string()))?;

    let playlist = Playlist::create(
        &state.db,
        CreatePlaylist {
            name,
            description: req.description.unwrap_or_default(),
            owner_id: auth.user_id,
            // This flow defaults to public, unlike plain create
            is_public: req.is_public.unwrap_or(true),
        },
    )
    .await?;

    for song_id in &req.song_ids {
        if Music::find_by_id(&state.db, *song_id).await?.is_none() {
            continue;
        }
        PlaylistSong::add(&state.db, playlist.id, *song_id).await?;
    }

    Ok(Json(CreateFinalResponse {
        message: "Playlist created successfully".to_string(),
        playlist_id: playlist.id,
        song_count: req.song_ids.len(),
        is_public: playlist.is_public,
    }))
}

/// Adds a song to a playlist, or to the liked set via the sentinel
///
/// Against the liked-songs sentinel this is add-only: an already-liked song
/// reports "Already in liked songs" rather than toggling off, unlike the
/// dedicated like endpoint. For real playlists an existing membership is a
/// no-op reported as "Song already in playlist".
///
/// # Errors
///
/// - `404 Not Found`: Playlist missing/not owned, or song missing
pub async fn add_song(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<AddSongRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let message = match req.playlist_id {
        PlaylistRef::LikedSongs => {
            let added = Music::like_if_absent(&state.db, auth.user_id, req.song_id)
                .await?
                .ok_or_else(|| ApiError::NotFound("Playlist or song not found".to_string()))?;

            if added {
                "Added to liked songs"
            } else {
                "Already in liked songs"
            }
        }
        PlaylistRef::Playlist(playlist_id) => {
            let playlist = Playlist::find_owned(&state.db, playlist_id, auth.user_id)
                .await?
                .ok_or_else(|| ApiError::NotFound("Playlist or song not found".to_string()))?;

            if Music::find_by_id(&state.db, req.song_id).await?.is_none() {
                return Err(ApiError::NotFound("Playlist or song not found".to_string()));
            }

            // Membership uniqueness is enforced here, not by the schema
            if PlaylistSong::exists(&state.db, playlist.id, req.song_id).await? {
                "Song already in playlist"
            } else {
                PlaylistSong::add(&state.db, playlist.id, req.song_id).await?;
                "Song added to playlist"
            }
        }
    };

    Ok(Json(MessageResponse {
        message: message.to_string(),
    }))
}

/// Playlist detail, sentinel-aware
///
/// The sentinel yields the caller's liked songs as a virtual playlist; a
/// real id must be owned by the caller.
///
/// # Errors
///
/// - `404 Not Found`: Unknown id or not the owner
pub async fn detail(
    State(state): State<AppState>,
    Host(host): Host,
    Extension(auth): Extension<AuthContext>,
    Path(playlist_ref): Path<PlaylistRef>,
) -> ApiResult<Json<PlaylistDetailResponse>> {
    let response = match playlist_ref {
        PlaylistRef::LikedSongs => {
            let rows = Music::list_liked(&state.db, auth.user_id).await?;

            PlaylistDetailResponse {
                id: LIKED_SONGS_ID.to_string(),
                name: LIKED_SONGS_NAME.to_string(),
                description: "Your liked songs".to_string(),
                is_public: false,
                owner_username: auth.username.clone(),
                songs: MusicResponse::from_rows(&host, rows),
            }
        }
        PlaylistRef::Playlist(playlist_id) => {
            let playlist = Playlist::find_owned(&state.db, playlist_id, auth.user_id)
                .await?
                .ok_or_else(|| {
                    ApiError::NotFound("Playlist not found or access denied".to_string())
                })?;

            let rows = PlaylistSong::songs(&state.db, playlist.id, Some(auth.user_id)).await?;

            PlaylistDetailResponse {
                id: playlist.id.to_string(),
                name: playlist.name,
                description: playlist.description,
                is_public: playlist.is_public,
                owner_username: auth.username.clone(),
                songs: MusicResponse::from_rows(&host, rows),
            }
        }
    };

    Ok(Json(response))
}

/// Deletes a playlist the caller owns
///
/// # Errors
///
/// - `404 Not Found`: Unknown id or not the owner
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(playlist_id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let deleted = Playlist::delete_owned(&state.db, playlist_id, auth.user_id).await?;

    if !deleted {
        return Err(ApiError::NotFound("Playlist not found".to_string()));
    }

    Ok(Json(MessageResponse {
        message: "Playlist deleted successfully".to_string(),
    }))
}

/// Removes a song from a playlist the caller owns
///
/// Removing a song that is not in the playlist is a success; the song and
/// playlist must exist, though.
///
/// # Errors
///
/// - `404 Not Found`: Playlist missing/not owned, or song missing
pub async fn remove_song(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(playlist_id): Path<Uuid>,
    Json(req): Json<RemoveSongRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let playlist = Playlist::find_owned(&state.db, playlist_id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Playlist or song not found".to_string()))?;

    if Music::find_by_id(&state.db, req.song_id).await?.is_none() {
        return Err(ApiError::NotFound("Playlist or song not found".to_string()));
    }

    PlaylistSong::remove(&state.db, playlist.id, req.song_id).await?;

    Ok(Json(MessageResponse {
        message: "Song removed from playlist".to_string(),
    }))
}

/// Lists all public playlists
pub async fn public_list(
    State(state): State<AppState>,
    Host(host): Host,
    Extension(_auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<PublicPlaylistEntry>>> {
    let summaries = Playlist::list_public(&state.db).await?;
    tracing::debug!(count = summaries.len(), "Fetched public playlists");

    Ok(Json(
        summaries
            .into_iter()
            .map(|s| PublicPlaylistEntry {
                id: s.id,
                name: s.name,
                owner_name: s.owner_username,
                description: s.description,
                song_count: s.song_count,
                cover_url: storage::absolute_url_opt(&host, s.cover_image.as_deref()),
            })
            .collect(),
    ))
}

/// Resolves a playlist owner's username, falling back to "Unknown"
async fn owner_username(state: &AppState, owner_id: Uuid) -> ApiResult<String> {
    let owner = chorus_shared::models::user::User::find_by_id(&state.db, owner_id).await?;
    Ok(owner.map(|u| u.username).unwrap_or_else(|| "Unknown".to_string()))
}

/// Builds the shared public-detail payload for both wire variants
async fn public_playlist_payload(
    state: &AppState,
    host: &str,
    playlist_id: Uuid,
) -> ApiResult<(Playlist, Vec<PublicSongEntry>)> {
    // Only the public flag gates access here; ownership is irrelevant
    let playlist = Playlist::find_public(&state.db, playlist_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Playlist not found or not public".to_string()))?;

    let songs = PlaylistSong::songs(&state.db, playlist.id, None)
        .await?
        .into_iter()
        .map(|row| PublicSongEntry {
            id: row.id,
            title: row.title,
            artist: if row.artist.is_empty() {
                "Unknown Artist".to_string()
            } else {
                row.artist
            },
            uploaded_by: row.uploaded_by_username,
            audio_url: storage::absolute_url(host, &row.audio_file),
            cover_url: storage::absolute_url_opt(host, row.cover_image.as_deref()),
        })
        .collect();

    Ok((playlist, songs))
}

/// Public playlist detail
///
/// Any authenticated caller may read any public playlist; private ones are
/// a 404 for everyone.
pub async fn public_detail_simple(
    State(state): State<AppState>,
    Host(host): Host,
    Extension(_auth): Extension<AuthContext>,
    Path(playlist_id): Path<Uuid>,
) -> ApiResult<Json<PublicPlaylistDetailResponse>> {
    let (playlist, songs) = public_playlist_payload(&state, &host, playlist_id).await?;

    let owner = owner_username(&state, playlist.owner_id).await?;
    let description = if playlist.description.is_empty() {
        "No description".to_string()
    } else {
        playlist.description
    };

    Ok(Json(PublicPlaylistDetailResponse {
        id: playlist.id,
        name: playlist.name,
        owner,
        description,
        song_count: songs.len(),
        songs,
        is_public: None,
    }))
}

/// Public playlist detail (`/detail` variant, reports `is_public`)
pub async fn public_detail(
    State(state): State<AppState>,
    Host(host): Host,
    Extension(_auth): Extension<AuthContext>,
    Path(playlist_id): Path<Uuid>,
) -> ApiResult<Json<PublicPlaylistDetailResponse>> {
    let (playlist, songs) = public_playlist_payload(&state, &host, playlist_id).await?;

    let owner = owner_username(&state, playlist.owner_id).await?;

    tracing::debug!(playlist_id = %playlist.id, songs = songs.len(), "Loaded public playlist");

    Ok(Json(PublicPlaylistDetailResponse {
        id: playlist.id,
        name: playlist.name,
        owner,
        description: playlist.description,
        song_count: songs.len(),
        songs,
        is_public: Some(playlist.is_public),
    }))
}

/// Flips the public flag on a playlist the caller owns
///
/// # Errors
///
/// - `404 Not Found`: Unknown id or not the owner
pub async fn toggle_public(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(playlist_id): Path<Uuid>,
) -> ApiResult<Json<TogglePublicResponse>> {
    let is_public = Playlist::toggle_public(&state.db, playlist_id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Playlist not found".to_string()))?;

    Ok(Json(TogglePublicResponse {
        message: format!(
            "Playlist is now {}",
            if is_public { "public" } else { "private" }
        ),
        is_public,
    }))
}
