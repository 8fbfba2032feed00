//! Session context and the guard in front of protected views.

use std::fmt;
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::error::TokenError;
use crate::token::{DecodedIdentity, check_format, decode_identity};

/// Persistent storage for the bearer token under a fixed key.
pub trait TokenStore {
    type Error: std::error::Error + Send + Sync + 'static;

    fn load(&self) -> Result<Option<String>, Self::Error>;
    fn save(&self, token: &str) -> Result<(), Self::Error>;
    fn clear(&self) -> Result<(), Self::Error>;
}

/// An authenticated session. Passed explicitly to every API call.
#[derive(Clone)]
pub struct Session {
    token: String,
    identity: Option<DecodedIdentity>,
}

impl Session {
    /// Builds a session from a raw token, decoding its claims for display.
    ///
    /// Fails only if the token is not shaped like a JWT. A token whose
    /// payload cannot be decoded still yields a session without identity.
    pub fn from_token(token: impl Into<String>) -> Result<Self, TokenError> {
        let token = token.into();
        check_format(&token)?;

        let identity = match decode_identity(&token) {
            Ok(identity) => Some(identity),
            Err(e) => {
                warn!("Token decoding failed: {}", e);
                None
            }
        };

        Ok(Self { token, identity })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn identity(&self) -> Option<&DecodedIdentity> {
        self.identity.as_ref()
    }

    pub fn display_name(&self) -> &str {
        self.identity
            .as_ref()
            .map(DecodedIdentity::display_name)
            .unwrap_or("Guest")
    }

    pub fn role(&self) -> Option<&str> {
        self.identity
            .as_ref()
            .and_then(|i| i.role.as_deref())
            .filter(|r| !r.is_empty())
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("identity", &self.identity)
            .finish()
    }
}

/// Result of running the session guard.
#[derive(Debug)]
pub enum Guard {
    Authenticated(Session),
    /// No usable credential; the caller must send the user to login.
    Login,
}

/// Checks for a stored credential.
///
/// Only presence and shape are checked. An expired token passes; the API
/// rejects it with 401 and the caller then ends the session.
pub fn require_session<S: TokenStore>(store: &S) -> Result<Guard, S::Error> {
    let Some(token) = store.load()? else {
        debug!("No stored token, redirecting to login");
        return Ok(Guard::Login);
    };

    match Session::from_token(token) {
        Ok(session) => Ok(Guard::Authenticated(session)),
        Err(e) => {
            warn!("Discarding stored token: {}", e);
            store.clear()?;
            Ok(Guard::Login)
        }
    }
}

/// Stores a freshly issued token and opens a session for it.
pub fn start_session<S: TokenStore>(
    store: &S,
    token: impl Into<String>,
) -> Result<Session, StartSessionError<S::Error>> {
    let session = Session::from_token(token).map_err(StartSessionError::Token)?;
    store
        .save(session.token())
        .map_err(StartSessionError::Store)?;
    Ok(session)
}

/// Destroys the stored credential. Used on logout and on 401 responses.
pub fn end_session<S: TokenStore>(store: &S) -> Result<(), S::Error> {
    debug!("Ending session");
    store.clear()
}

#[derive(Debug, thiserror::Error)]
pub enum StartSessionError<E: std::error::Error + 'static> {
    #[error("{0}")]
    Token(TokenError),
    #[error("Failed to store token: {0}")]
    Store(E),
}

/// In-memory token store.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    type Error = std::convert::Infallible;

    fn load(&self) -> Result<Option<String>, Self::Error> {
        Ok(self.token.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, token: &str) -> Result<(), Self::Error> {
        *self.token.lock().unwrap_or_else(|e| e.into_inner()) = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), Self::Error> {
        *self.token.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::tests::make_token;
    use serde_json::json;

    #[test]
    fn test_guard_without_token_redirects() {
        let store = MemoryTokenStore::new();
        assert!(matches!(require_session(&store).unwrap(), Guard::Login));
    }

    #[test]
    fn test_guard_discards_malformed_token() {
        let store = MemoryTokenStore::with_token("not-a-jwt");

        assert!(matches!(require_session(&store).unwrap(), Guard::Login));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_guard_accepts_expired_token() {
        let token = make_token(&json!({ "username": "late", "exp": 10 }));
        let store = MemoryTokenStore::with_token(token.clone());

        match require_session(&store).unwrap() {
            Guard::Authenticated(session) => {
                assert_eq!(session.token(), token);
                assert_eq!(session.display_name(), "late");
            }
            Guard::Login => panic!("Expected an authenticated session"),
        }
    }

    #[test]
    fn test_undecodable_payload_still_authenticates() {
        let store = MemoryTokenStore::with_token("aaa.%%%.ccc");

        match require_session(&store).unwrap() {
            Guard::Authenticated(session) => {
                assert!(session.identity().is_none());
                assert_eq!(session.display_name(), "Guest");
                assert_eq!(session.role(), None);
            }
            Guard::Login => panic!("Expected an authenticated session"),
        }
    }

    #[test]
    fn test_start_and_end_session() {
        let store = MemoryTokenStore::new();
        let token = make_token(&json!({ "username": "kim", "role": "admin" }));

        let session = start_session(&store, token.clone()).unwrap();
        assert_eq!(session.role(), Some("admin"));
        assert_eq!(session.bearer(), format!("Bearer {}", token));
        assert_eq!(store.load().unwrap(), Some(token));

        end_session(&store).unwrap();
        assert!(matches!(require_session(&store).unwrap(), Guard::Login));
    }

    #[test]
    fn test_start_session_rejects_malformed_token() {
        let store = MemoryTokenStore::new();

        let result = start_session(&store, "nope");
        assert!(matches!(result, Err(StartSessionError::Token(_))));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_debug_redacts_token() {
        let session = Session::from_token("a.b.c").unwrap();
        assert!(!format!("{:?}", session).contains("a.b.c"));
    }
}
