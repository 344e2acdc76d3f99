//! Session persistence and identity bootstrap.
//!
//! The browser client kept a `userInfo` JSON blob plus an `auth` flag in
//! session storage, with older drafts writing only a plain username. The
//! typed client keeps one JSON session file and accepts every historical
//! shape on load. Identity resolution never hard-fails on an authenticated
//! session: a structured record wins, a legacy plain username is promoted,
//! and an empty record falls back to the fixed default identity.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

use peerchat_proto::Identity;

/// Base URL of a locally running chat daemon.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Environment override for the daemon base URL.
pub const ENV_BASE_URL: &str = "PEERCHAT_BASE_URL";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// No authenticated session exists. Terminal for the chat view; the
    /// caller routes to the login flow instead.
    #[error("no authenticated session")]
    AuthRequired,
}

/// Persisted session state, the analogue of the browser's `userInfo` blob
/// plus the `auth` flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer_id: Option<String>,
    #[serde(default)]
    pub auth: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_time: Option<String>,
}

impl SessionRecord {
    /// A freshly authenticated session, stamped with the current time.
    pub fn authenticated(
        username: impl Into<String>,
        peer_id: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            peer_id: Some(peer_id.into()),
            auth: true,
            base_url: Some(base_url.into()),
            login_time: Some(Utc::now().to_rfc3339()),
        }
    }
}

/// On-disk shapes accepted on load. Older drafts stored just the username.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredSession {
    Record(SessionRecord),
    PlainUsername(String),
}

impl StoredSession {
    fn into_record(self) -> SessionRecord {
        match self {
            Self::Record(record) => record,
            // A plain-username file predates the auth flag; its presence
            // was the auth marker.
            Self::PlainUsername(username) => SessionRecord {
                username,
                peer_id: None,
                auth: true,
                base_url: None,
                login_time: None,
            },
        }
    }
}

/// Storage seam for the session record.
pub trait SessionStore {
    type Error: std::error::Error + Send + Sync + 'static;

    fn load_session(&self) -> Result<Option<SessionRecord>, Self::Error>;
    fn save_session(&self, record: &SessionRecord) -> Result<(), Self::Error>;
    fn clear_session(&self) -> Result<(), Self::Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("session file IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("session file decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

/// JSON-file session store.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for JsonFileStore {
    type Error = StoreError;

    fn load_session(&self) -> Result<Option<SessionRecord>, Self::Error> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };
        let stored: StoredSession = serde_json::from_str(&raw)?;
        Ok(Some(stored.into_record()))
    }

    fn save_session(&self, record: &SessionRecord) -> Result<(), Self::Error> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(record)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }

    fn clear_session(&self) -> Result<(), Self::Error> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}

/// Resolve the canonical local identity from whatever the store holds.
///
/// Fails only with [`SessionError::AuthRequired`]; every authenticated
/// state yields an identity. An unreadable store is treated the same as an
/// absent one. Resolution is read-only and idempotent.
pub fn resolve_identity<S: SessionStore>(store: &S) -> Result<Identity, SessionError> {
    let record = match store.load_session() {
        Ok(record) => record,
        Err(error) => {
            warn!(error = %error, "session store unreadable, treating as unauthenticated");
            None
        }
    };

    let Some(record) = record else {
        return Err(SessionError::AuthRequired);
    };
    if !record.auth {
        return Err(SessionError::AuthRequired);
    }

    if record.username.trim().is_empty() {
        return Ok(Identity::fallback());
    }

    Ok(Identity {
        username: record.username,
        peer_id: record
            .peer_id
            .filter(|peer_id| !peer_id.trim().is_empty()),
    })
}

/// Resolve the daemon base URL: explicit flag, then environment, then the
/// stored session's URL, then the local default. Returns the URL and which
/// source produced it.
pub fn resolve_base_url(
    flag: Option<&str>,
    stored: Option<&str>,
) -> (String, &'static str) {
    if let Some(flag) = non_empty(flag) {
        return (normalize_base_url(&flag), "flag");
    }
    if let Some(env) = std::env::var(ENV_BASE_URL)
        .ok()
        .and_then(|value| non_empty(Some(value.as_str())))
    {
        return (normalize_base_url(&env), ENV_BASE_URL);
    }
    if let Some(stored) = non_empty(stored) {
        return (normalize_base_url(&stored), "stored_session");
    }
    (DEFAULT_BASE_URL.to_string(), "default_local")
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn with_env<T>(value: Option<&str>, test: impl FnOnce() -> T) -> T {
        let lock = ENV_LOCK.get_or_init(|| Mutex::new(()));
        let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let previous = std::env::var(ENV_BASE_URL).ok();
        if let Some(value) = value {
            unsafe { std::env::set_var(ENV_BASE_URL, value) };
        } else {
            unsafe { std::env::remove_var(ENV_BASE_URL) };
        }

        let result = test();

        if let Some(value) = previous {
            unsafe { std::env::set_var(ENV_BASE_URL, value) };
        } else {
            unsafe { std::env::remove_var(ENV_BASE_URL) };
        }

        result
    }

    fn store_in(dir: &tempfile::TempDir) -> JsonFileStore {
        JsonFileStore::new(dir.path().join("session.json"))
    }

    #[test]
    fn missing_session_is_auth_required() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        assert_eq!(resolve_identity(&store), Err(SessionError::AuthRequired));
    }

    #[test]
    fn structured_record_resolves_with_peer_id() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        store
            .save_session(&SessionRecord::authenticated(
                "bob",
                "web_1",
                "http://127.0.0.1:8000",
            ))
            .expect("save");

        let identity = resolve_identity(&store).expect("identity");
        assert_eq!(identity.username, "bob");
        assert_eq!(identity.peer_id.as_deref(), Some("web_1"));
    }

    #[test]
    fn legacy_plain_username_file_is_promoted() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        fs::write(store.path(), r#""alice""#).expect("write legacy file");

        let identity = resolve_identity(&store).expect("identity");
        assert_eq!(identity.username, "alice");
        assert!(identity.peer_id.is_none());
    }

    #[test]
    fn authenticated_but_empty_record_falls_back_to_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        fs::write(store.path(), r#"{"auth":true}"#).expect("write record");

        let identity = resolve_identity(&store).expect("identity");
        assert_eq!(identity, Identity::fallback());
    }

    #[test]
    fn unauthenticated_record_is_auth_required() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        fs::write(store.path(), r#"{"username":"bob","auth":false}"#).expect("write record");

        assert_eq!(resolve_identity(&store), Err(SessionError::AuthRequired));
    }

    #[test]
    fn resolution_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        store
            .save_session(&SessionRecord::authenticated("bob", "web_1", DEFAULT_BASE_URL))
            .expect("save");

        let first = resolve_identity(&store);
        let second = resolve_identity(&store);
        assert_eq!(first, second);
    }

    #[test]
    fn corrupt_session_file_reads_as_unauthenticated() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        fs::write(store.path(), "not json at all {{{").expect("write garbage");

        assert_eq!(resolve_identity(&store), Err(SessionError::AuthRequired));
    }

    #[test]
    fn clear_session_removes_the_file_and_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        store
            .save_session(&SessionRecord::authenticated("bob", "web_1", DEFAULT_BASE_URL))
            .expect("save");

        store.clear_session().expect("clear");
        store.clear_session().expect("clear again");
        assert_eq!(store.load_session().expect("load"), None);
    }

    #[test]
    fn base_url_prefers_flag_then_env_then_stored() {
        with_env(Some("http://env.example.com/"), || {
            let (url, source) = resolve_base_url(Some("http://flag.example.com/"), None);
            assert_eq!(url, "http://flag.example.com");
            assert_eq!(source, "flag");

            let (url, source) = resolve_base_url(None, Some("http://stored.example.com"));
            assert_eq!(url, "http://env.example.com");
            assert_eq!(source, ENV_BASE_URL);
        });

        with_env(None, || {
            let (url, source) = resolve_base_url(None, Some("http://stored.example.com/"));
            assert_eq!(url, "http://stored.example.com");
            assert_eq!(source, "stored_session");

            let (url, source) = resolve_base_url(None, None);
            assert_eq!(url, DEFAULT_BASE_URL);
            assert_eq!(source, "default_local");
        });
    }
}
