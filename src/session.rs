//! Signed-in state persisted between runs.
//!
//! The file holds an `authenticated` flag and the user profile side by side.
//! The flag alone decides whether the user is signed in; a profile that
//! fails to parse is dropped without touching the flag.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::error::{DeskError, Result};
use crate::models::UserProfile;
use crate::settings::config_dir;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub authenticated: bool,
    pub user: Option<UserProfile>,
}

impl Session {
    pub fn signed_in(user: UserProfile) -> Self {
        Self {
            authenticated: true,
            user: Some(user),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Fail with `NotAuthenticated` unless signed in.
    pub fn require(&self) -> Result<&Self> {
        if self.authenticated {
            Ok(self)
        } else {
            Err(DeskError::NotAuthenticated)
        }
    }

    pub fn display_name(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.name.as_str())
    }
}

#[derive(Serialize)]
struct SessionFile<'a> {
    authenticated: bool,
    user: Option<&'a UserProfile>,
}

pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_location() -> Self {
        Self::new(config_dir().join("session.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Session {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Session::default(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to read session");
                return Session::default();
            }
        };

        let raw: Value = match serde_json::from_str(&content) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to parse session");
                return Session::default();
            }
        };

        let authenticated = raw.get("authenticated").and_then(Value::as_bool) == Some(true);
        if !authenticated {
            return Session::default();
        }

        let user = match raw.get("user") {
            None | Some(Value::Null) => None,
            Some(value) => match serde_json::from_value::<UserProfile>(value.clone()) {
                Ok(user) => Some(user),
                Err(e) => {
                    tracing::error!(error = %e, "failed to parse user data");
                    None
                }
            },
        };

        Session {
            authenticated,
            user,
        }
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let file = SessionFile {
            authenticated: session.authenticated,
            user: session.user.as_ref(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        std::fs::write(&self.path, format!("{json}\n"))?;
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, SessionStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("cfg").join("session.json"));
        (dir, store)
    }

    #[test]
    fn test_missing_file_is_signed_out() {
        let (_dir, store) = store();
        let session = store.load();
        assert!(!session.is_authenticated());
        assert!(session.user.is_none());
        assert!(matches!(session.require(), Err(DeskError::NotAuthenticated)));
    }

    #[test]
    fn test_save_load_roundtrip() {
        let (_dir, store) = store();
        store.save(&Session::signed_in(UserProfile::test_user())).unwrap();
        let session = store.load();
        assert!(session.is_authenticated());
        assert_eq!(session.user, Some(UserProfile::test_user()));
        assert_eq!(session.display_name(), Some("Test User"));
    }

    #[test]
    fn test_clear_signs_out() {
        let (_dir, store) = store();
        store.save(&Session::signed_in(UserProfile::test_user())).unwrap();
        store.clear().unwrap();
        assert!(!store.path().exists());
        assert_eq!(store.load(), Session::default());
        // clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_malformed_profile_keeps_flag() {
        let (_dir, store) = store();
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), r#"{"authenticated": true, "user": {"name": 42}}"#).unwrap();
        let session = store.load();
        assert!(session.is_authenticated());
        assert!(session.user.is_none());
    }

    #[test]
    fn test_profile_ignored_when_not_authenticated() {
        let (_dir, store) = store();
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(
            store.path(),
            r#"{"authenticated": false, "user": {"name": "A", "email": "a@b.c", "roles": []}}"#,
        )
        .unwrap();
        assert_eq!(store.load(), Session::default());
    }

    #[test]
    fn test_corrupt_file_is_signed_out() {
        let (_dir, store) = store();
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "authenticated=true").unwrap();
        assert!(!store.load().is_authenticated());
    }
}
