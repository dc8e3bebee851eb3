//! Authentication session store
//!
//! The single owner of the bearer token and user profile. State is
//! rehydrated from storage when the store is loaded, replaced on login, and
//! cleared on logout; nothing else reads or writes the persisted keys.

use crate::error::{ClientError, Result};
use signdev_types::{AuthResponse, User};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

const TOKEN_KEY: &str = "token";
const USER_KEY: &str = "user";

/// Key/value persistence behind the session store
pub trait SessionStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;
}

/// Storage kept in a single JSON object on disk.
///
/// Values that are themselves JSON objects or arrays are stored inline, so
/// the file reads `{ "token": "...", "user": { ... } }`. The file is created
/// readable by its owner only on Unix.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Map<String, Value>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(Map::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(ClientError::Storage(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn write_all(&self, items: &Map<String, Value>) -> Result<()> {
        if items.is_empty() {
            return match std::fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(ClientError::Storage(format!(
                    "Failed to remove {}: {}",
                    self.path.display(),
                    e
                ))),
            };
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ClientError::Storage(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
        let json = serde_json::to_string_pretty(items)?;
        let write_err =
            |e: std::io::Error| ClientError::Storage(format!("Failed to write {}: {}", self.path.display(), e));
        let mut file = owner_only(std::fs::OpenOptions::new().write(true).create(true).truncate(true))
            .open(&self.path)
            .map_err(write_err)?;
        restrict_permissions(&file).map_err(write_err)?;
        file.write_all(json.as_bytes()).map_err(write_err)
    }
}

#[cfg(unix)]
fn owner_only(options: &mut std::fs::OpenOptions) -> &mut std::fs::OpenOptions {
    use std::os::unix::fs::OpenOptionsExt;
    options.mode(0o600)
}

#[cfg(not(unix))]
fn owner_only(options: &mut std::fs::OpenOptions) -> &mut std::fs::OpenOptions {
    options
}

/// `mode` only applies when the file is created
#[cfg(unix)]
fn restrict_permissions(file: &std::fs::File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_file: &std::fs::File) -> std::io::Result<()> {
    Ok(())
}

/// Stored form of a value: embedded JSON for objects and arrays, a string otherwise
fn to_stored(value: &str) -> Value {
    match serde_json::from_str::<Value>(value) {
        Ok(parsed @ (Value::Object(_) | Value::Array(_))) => parsed,
        _ => Value::String(value.to_string()),
    }
}

fn from_stored(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

impl SessionStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        Ok(self.read_all()?.remove(key).map(from_stored))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut items = self.read_all()?;
        items.insert(key.to_string(), to_stored(value));
        self.write_all(&items)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut items = self.read_all()?;
        if items.remove(key).is_some() {
            self.write_all(&items)?;
        }
        Ok(())
    }
}

/// Storage that lives as long as the process
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        items.remove(key);
        Ok(())
    }
}

/// An authenticated session
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    /// Absent when the stored profile was missing or unreadable
    pub user: Option<User>,
}

/// Owner of the current session
pub struct SessionStore {
    storage: Box<dyn SessionStorage>,
    state: RwLock<Option<Session>>,
}

impl SessionStore {
    /// Rehydrate the session from storage
    pub fn load(storage: Box<dyn SessionStorage>) -> Result<Self> {
        let token = storage.get_item(TOKEN_KEY)?.filter(|t| !t.is_empty());

        let state = match token {
            Some(token) => {
                let user = match storage.get_item(USER_KEY)? {
                    Some(raw) => match serde_json::from_str::<User>(&raw) {
                        Ok(user) => Some(user),
                        Err(e) => {
                            warn!("Ignoring unreadable stored user profile: {}", e);
                            None
                        }
                    },
                    None => None,
                };
                debug!("Restored session from storage");
                Some(Session { token, user })
            }
            None => None,
        };

        Ok(Self {
            storage,
            state: RwLock::new(state),
        })
    }

    /// A store that forgets everything when the process exits
    pub fn in_memory() -> Self {
        Self {
            storage: Box::new(MemoryStorage::new()),
            state: RwLock::new(None),
        }
    }

    pub fn token(&self) -> Option<String> {
        self.current().map(|s| s.token)
    }

    pub fn user(&self) -> Option<User> {
        self.current().and_then(|s| s.user)
    }

    pub fn current(&self) -> Option<Session> {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current().is_some()
    }

    /// Persist a fresh login and make it current
    pub fn login(&self, auth: AuthResponse) -> Result<()> {
        let user_json = serde_json::to_string(&auth.user)?;
        self.storage.set_item(TOKEN_KEY, &auth.token)?;
        self.storage.set_item(USER_KEY, &user_json)?;

        info!(email = %auth.user.email, "Logged in");
        *self.state.write().unwrap_or_else(|e| e.into_inner()) = Some(Session {
            token: auth.token,
            user: Some(auth.user),
        });
        Ok(())
    }

    /// Forget the session in memory and in storage
    pub fn logout(&self) -> Result<()> {
        *self.state.write().unwrap_or_else(|e| e.into_inner()) = None;
        self.storage.remove_item(TOKEN_KEY)?;
        self.storage.remove_item(USER_KEY)?;
        info!("Logged out");
        Ok(())
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn auth(token: &str, email: &str) -> AuthResponse {
        AuthResponse {
            token: token.to_string(),
            user: User {
                id: Some("u1".to_string()),
                name: "Ada".to_string(),
                email: email.to_string(),
                extra: Default::default(),
            },
        }
    }

    #[test]
    fn test_empty_storage_has_no_session() {
        let store = SessionStore::load(Box::new(MemoryStorage::new())).unwrap();
        assert!(!store.is_authenticated());
        assert_eq!(store.token(), None);
    }

    #[test]
    fn test_login_then_logout() {
        let store = SessionStore::in_memory();
        store.login(auth("t-1", "ada@example.com")).unwrap();
        assert_eq!(store.token().as_deref(), Some("t-1"));
        assert_eq!(store.user().unwrap().email, "ada@example.com");

        store.logout().unwrap();
        assert!(!store.is_authenticated());
        assert_eq!(store.user(), None);
    }

    #[test]
    fn test_session_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let store = SessionStore::load(Box::new(FileStorage::new(&path))).unwrap();
        store.login(auth("persisted", "ada@example.com")).unwrap();
        drop(store);

        let reloaded = SessionStore::load(Box::new(FileStorage::new(&path))).unwrap();
        assert_eq!(reloaded.token().as_deref(), Some("persisted"));
        assert_eq!(reloaded.user().unwrap().name, "Ada");
    }

    #[test]
    fn test_file_layout_embeds_user_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = SessionStore::load(Box::new(FileStorage::new(&path))).unwrap();
        store.login(auth("t-9", "ada@example.com")).unwrap();

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["token"], Value::String("t-9".to_string()));
        assert_eq!(raw["user"]["name"], Value::String("Ada".to_string()));
        assert_eq!(raw["user"]["email"], Value::String("ada@example.com".to_string()));
    }

    #[test]
    fn test_file_reads_plain_values_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let storage = FileStorage::new(&path);
        storage.set_item(TOKEN_KEY, "12345").unwrap();
        storage.set_item("note", "{not json").unwrap();

        assert_eq!(storage.get_item(TOKEN_KEY).unwrap().as_deref(), Some("12345"));
        assert_eq!(storage.get_item("note").unwrap().as_deref(), Some("{not json"));
    }

    #[cfg(unix)]
    #[test]
    fn test_session_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{}").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let store = SessionStore::load(Box::new(FileStorage::new(&path))).unwrap();
        store.login(auth("secret", "ada@example.com")).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_logout_clears_persisted_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = SessionStore::load(Box::new(FileStorage::new(&path))).unwrap();
        store.login(auth("t", "a@example.com")).unwrap();
        store.logout().unwrap();
        assert!(!path.exists());

        let reloaded = SessionStore::load(Box::new(FileStorage::new(&path))).unwrap();
        assert!(!reloaded.is_authenticated());
    }

    #[test]
    fn test_user_without_token_is_ignored() {
        let storage = MemoryStorage::new();
        storage
            .set_item(USER_KEY, r#"{"name":"Ghost","email":"g@example.com"}"#)
            .unwrap();
        let store = SessionStore::load(Box::new(storage)).unwrap();
        assert!(!store.is_authenticated());
        assert_eq!(store.user(), None);
    }

    #[test]
    fn test_corrupt_profile_keeps_token() {
        let storage = MemoryStorage::new();
        storage.set_item(TOKEN_KEY, "t-2").unwrap();
        storage.set_item(USER_KEY, "{not json").unwrap();
        let store = SessionStore::load(Box::new(storage)).unwrap();
        assert_eq!(store.token().as_deref(), Some("t-2"));
        assert_eq!(store.user(), None);
    }

    #[test]
    fn test_corrupt_file_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "[1, 2").unwrap();
        let err = SessionStore::load(Box::new(FileStorage::new(&path))).unwrap_err();
        assert!(matches!(err, ClientError::Serialization(_)));
    }
}
