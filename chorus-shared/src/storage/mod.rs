/// Uploaded media storage
///
/// Audio files, cover art, and profile images are written synchronously
/// inside the upload request, under a fixed directory per media kind:
///
/// ```text
/// <media_root>/
/// ├── music/          # audio files
/// ├── music_covers/   # cover images
/// └── profiles/       # profile images
/// ```
///
/// Database rows store the path *relative* to the media root (e.g.
/// `music/3f2a....mp3`). Responses resolve it to an absolute URL using the
/// incoming request's host, so the same row works behind any hostname.
///
/// # Example
///
/// ```no_run
/// use chorus_shared::storage::{MediaKind, MediaStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MediaStore::new("./media");
/// store.init().await?;
///
/// let rel = store.save(MediaKind::Audio, "song.mp3", b"...").await?;
/// assert!(rel.starts_with("music/"));
/// # Ok(())
/// # }
/// ```

use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

/// URL path under which the media root is served
pub const MEDIA_ROUTE: &str = "/media";

/// Audio content types accepted for upload
pub const ALLOWED_AUDIO_TYPES: [&str; 4] =
    ["audio/mpeg", "audio/wav", "audio/mp3", "audio/x-m4a"];

/// Checks whether a declared content type is an accepted audio format
pub fn is_allowed_audio_type(content_type: &str) -> bool {
    ALLOWED_AUDIO_TYPES.contains(&content_type)
}

/// Error type for media storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Filesystem operation failed
    #[error("Media storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Upload contained no data
    #[error("Uploaded file is empty")]
    EmptyFile,
}

/// The kind of media being stored, which selects the target subdirectory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// Audio files (`music/`)
    Audio,

    /// Cover images (`music_covers/`)
    Cover,

    /// Profile images (`profiles/`)
    Profile,
}

impl MediaKind {
    /// Subdirectory of the media root for this kind
    pub fn subdir(&self) -> &'static str {
        match self {
            MediaKind::Audio => "music",
            MediaKind::Cover => "music_covers",
            MediaKind::Profile => "profiles",
        }
    }
}

/// Filesystem-backed media store rooted at a configurable directory
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    /// Creates a store rooted at `root` (not yet touching the filesystem)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The media root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the media root and all per-kind subdirectories
    ///
    /// Called once at startup; idempotent.
    pub async fn init(&self) -> Result<(), StorageError> {
        for kind in [MediaKind::Audio, MediaKind::Cover, MediaKind::Profile] {
            tokio::fs::create_dir_all(self.root.join(kind.subdir())).await?;
        }
        Ok(())
    }

    /// Persists uploaded bytes and returns the stored relative path
    ///
    /// The stored filename is a fresh UUID carrying over a sanitized version
    /// of the original extension, so uploads can never collide or escape the
    /// media root.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::EmptyFile` for zero-byte uploads, or an I/O
    /// error if the write fails.
    pub async fn save(
        &self,
        kind: MediaKind,
        original_filename: &str,
        bytes: &[u8],
    ) -> Result<String, StorageError> {
        if bytes.is_empty() {
            return Err(StorageError::EmptyFile);
        }

        let filename = match sanitized_extension(original_filename) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };
        let relative = format!("{}/{}", kind.subdir(), filename);

        tokio::fs::write(self.root.join(&relative), bytes).await?;
        debug!(path = %relative, size = bytes.len(), "Stored media file");

        Ok(relative)
    }

    /// Removes a stored file by its relative path
    ///
    /// Missing files are ignored; a stale row pointing at a deleted asset is
    /// not an error worth failing a request over.
    pub async fn remove(&self, relative_path: &str) -> Result<(), StorageError> {
        match tokio::fs::remove_file(self.root.join(relative_path)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}

/// Resolves a stored relative path to an absolute URL for the given request host
///
/// # Example
///
/// ```
/// use chorus_shared::storage::absolute_url;
///
/// let url = absolute_url("localhost:8080", "music/abc.mp3");
/// assert_eq!(url, "http://localhost:8080/media/music/abc.mp3");
/// ```
pub fn absolute_url(host: &str, relative_path: &str) -> String {
    format!("http://{}{}/{}", host, MEDIA_ROUTE, relative_path)
}

/// Resolves an optional stored path; `None` stays `None`
pub fn absolute_url_opt(host: &str, relative_path: Option<&str>) -> Option<String> {
    relative_path.map(|rel| absolute_url(host, rel))
}

/// Extracts a lowercase alphanumeric extension from an uploaded filename
///
/// Anything else (missing, oversized, or containing path tricks) is dropped.
fn sanitized_extension(filename: &str) -> Option<String> {
    let ext = Path::new(filename).extension()?.to_str()?;
    if ext.is_empty() || ext.len() > 8 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_audio_types() {
        assert!(is_allowed_audio_type("audio/mpeg"));
        assert!(is_allowed_audio_type("audio/wav"));
        assert!(is_allowed_audio_type("audio/mp3"));
        assert!(is_allowed_audio_type("audio/x-m4a"));

        assert!(!is_allowed_audio_type("audio/ogg"));
        assert!(!is_allowed_audio_type("video/mp4"));
        assert!(!is_allowed_audio_type("text/plain"));
        assert!(!is_allowed_audio_type(""));
    }

    #[test]
    fn test_media_kind_subdirs() {
        assert_eq!(MediaKind::Audio.subdir(), "music");
        assert_eq!(MediaKind::Cover.subdir(), "music_covers");
        assert_eq!(MediaKind::Profile.subdir(), "profiles");
    }

    #[test]
    fn test_sanitized_extension() {
        assert_eq!(sanitized_extension("song.mp3"), Some("mp3".to_string()));
        assert_eq!(sanitized_extension("SONG.MP3"), Some("mp3".to_string()));
        assert_eq!(sanitized_extension("a.b.wav"), Some("wav".to_string()));
        assert_eq!(sanitized_extension("noext"), None);
        assert_eq!(sanitized_extension("trailing."), None);
        assert_eq!(sanitized_extension("weird.mp3/../../x"), None);
        assert_eq!(sanitized_extension("long.extension123"), None);
    }

    #[test]
    fn test_absolute_url() {
        assert_eq!(
            absolute_url("localhost:8080", "music/abc.mp3"),
            "http://localhost:8080/media/music/abc.mp3"
        );
        assert_eq!(
            absolute_url_opt("example.com", Some("music_covers/c.png")),
            Some("http://example.com/media/music_covers/c.png".to_string())
        );
        assert_eq!(absolute_url_opt("example.com", None), None);
    }

    #[tokio::test]
    async fn test_save_and_remove() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = MediaStore::new(dir.path());
        store.init().await.expect("init");

        let rel = store
            .save(MediaKind::Audio, "track.mp3", b"not really audio")
            .await
            .expect("save");

        assert!(rel.starts_with("music/"));
        assert!(rel.ends_with(".mp3"));
        assert!(dir.path().join(&rel).exists());

        store.remove(&rel).await.expect("remove");
        assert!(!dir.path().join(&rel).exists());

        // Removing again is fine
        store.remove(&rel).await.expect("idempotent remove");
    }

    #[tokio::test]
    async fn test_save_empty_file_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = MediaStore::new(dir.path());
        store.init().await.expect("init");

        let result = store.save(MediaKind::Cover, "cover.png", b"").await;
        assert!(matches!(result, Err(StorageError::EmptyFile)));
    }
}
