/// Database models for Chorus
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts
/// - `music`: Uploaded tracks, their like relation, and catalog queries
/// - `playlist`: Playlists, the public flag, and the liked-songs sentinel
/// - `playlist_song`: Ordered playlist membership join rows
///
/// # Example
///
/// ```no_run
/// use chorus_shared::models::user::{CreateUser, User};
/// use chorus_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let new_user = CreateUser {
///     username: "alice".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     profile_image: None,
/// };
///
/// let user = User::create(&pool, new_user).await?;
/// # Ok(())
/// # }
/// ```

pub mod music;
pub mod playlist;
pub mod playlist_song;
pub mod user;
