/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login, logout, and profile
/// - `music`: Catalog upload, listing, likes, popular, search, delete
/// - `playlists`: Playlist CRUD, membership, and public visibility
/// - `account`: Cascading account deletion

pub mod account;
pub mod auth;
pub mod health;
pub mod music;
pub mod playlists;
