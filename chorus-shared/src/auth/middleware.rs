/// Request authentication context
///
/// The HTTP layer validates a Bearer token, builds an [`AuthContext`] from
/// its claims, and inserts it into request extensions. Handlers then extract
/// it with Axum's `Extension` extractor.
///
/// Routes that are public but still personalize their responses for a
/// logged-in caller (e.g. `is_liked` on the music listing) receive a
/// [`MaybeAuthContext`] instead, which is `None` for anonymous requests.
///
/// # Example
///
/// ```ignore
/// use axum::Extension;
/// use chorus_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("Hello, {}!", auth.username)
/// }
/// ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::Claims;

/// Authentication context added to request extensions
///
/// Built from validated JWT claims; present only on authenticated routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Authenticated username
    pub username: String,
}

impl AuthContext {
    /// Creates auth context from validated JWT claims
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username.clone(),
        }
    }
}

/// Optional authentication context for public routes
///
/// Public endpoints that still tailor their output for a logged-in caller
/// carry this extension: `Some` when a valid Bearer token accompanied the
/// request, `None` otherwise. An invalid token on a public route degrades
/// to `None` rather than rejecting the request.
#[derive(Debug, Clone)]
pub struct MaybeAuthContext(pub Option<AuthContext>);

impl MaybeAuthContext {
    /// The authenticated user's ID, if any
    pub fn user_id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|ctx| ctx.user_id)
    }
}

/// Error type for authentication failures
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No credentials provided
    #[error("Missing authorization header")]
    MissingCredentials,

    /// Malformed authorization header
    #[error("{0}")]
    InvalidFormat(String),

    /// Token failed validation
    #[error("{0}")]
    InvalidToken(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_context_from_claims() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, "alice".to_string());

        let ctx = AuthContext::from_claims(&claims);
        assert_eq!(ctx.user_id, user_id);
        assert_eq!(ctx.username, "alice");
    }

    #[test]
    fn test_maybe_auth_context() {
        let anonymous = MaybeAuthContext(None);
        assert!(anonymous.user_id().is_none());

        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, "bob".to_string());
        let authed = MaybeAuthContext(Some(AuthContext::from_claims(&claims)));
        assert_eq!(authed.user_id(), Some(user_id));
    }
}
