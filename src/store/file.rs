use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PlannerError, Result};

use super::{ProfileDocument, ProfileKey, ProfileStore};

/// One pretty-printed JSON file per profile under a root directory.
#[derive(Debug)]
pub struct JsonFileProfileStore {
    root: PathBuf,
    connected: bool,
}

impl JsonFileProfileStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            connected: false,
        }
    }

    fn path_for(&self, key: &ProfileKey) -> PathBuf {
        self.root
            .join(format!("{}.json", encode_file_name(&key.document_path())))
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.connected {
            Ok(())
        } else {
            Err(PlannerError::StoreDisconnected)
        }
    }
}

impl ProfileStore for JsonFileProfileStore {
    // The directory is created on first save, so read-only use leaves no trace.
    fn connect(&mut self) -> Result<()> {
        if self.root.exists() && !self.root.is_dir() {
            return Err(PlannerError::Store(format!(
                "{} is not a directory",
                self.root.display()
            )));
        }
        log::debug!("profile store opened at {}", self.root.display());
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn load(&self, key: &ProfileKey) -> Result<Option<ProfileDocument>> {
        self.ensure_connected()?;
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path)?;
        let doc = serde_json::from_str(&raw).map_err(|e| {
            PlannerError::Store(format!("reading profile {}: {e}", path.display()))
        })?;
        Ok(Some(doc))
    }

    fn save(&mut self, key: &ProfileKey, update: ProfileDocument) -> Result<ProfileDocument> {
        let mut doc = self.load(key)?.unwrap_or_default();
        doc.merge(update);
        fs::create_dir_all(&self.root)?;
        let path = self.path_for(key);
        fs::write(&path, serde_json::to_string_pretty(&doc)?)?;
        log::debug!("saved profile to {}", path.display());
        Ok(doc)
    }
}

/// Keeps ASCII alphanumerics, `-`, `_` and `.`; every other byte becomes
/// `%XX`, so distinct keys never share a file.
fn encode_file_name(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for byte in path.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.') {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PlanSettings, RawDebt};

    fn temp_root(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "avalanche-profiles-{label}-{}",
            std::process::id()
        ))
    }

    #[test]
    fn file_names_are_escaped() {
        assert_eq!(
            encode_file_name("public/data/userProfiles/ann b"),
            "public%2Fdata%2FuserProfiles%2Fann%20b"
        );
    }

    #[test]
    fn saves_and_reloads_across_connections() {
        let root = temp_root("reload");
        let key = ProfileKey::authenticated("uid-42").expect("non-empty");
        let debts = vec![RawDebt::new(1, "Card", 2_500.0, 22.0)];

        let mut store = JsonFileProfileStore::new(&root);
        assert!(matches!(store.load(&key), Err(PlannerError::StoreDisconnected)));
        store.connect().expect("temp dir is writable");
        store
            .save(&key, ProfileDocument::snapshot(&PlanSettings::default(), &debts))
            .expect("saved");
        store.disconnect();

        let mut reopened = JsonFileProfileStore::new(&root);
        reopened.connect().expect("temp dir is writable");
        let loaded = reopened.load(&key).expect("readable").expect("present");
        assert_eq!(loaded.debts, Some(debts));
        assert_eq!(
            loaded.settings_or(PlanSettings::default()),
            PlanSettings::default()
        );

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn loading_does_not_create_the_directory() {
        let root = temp_root("load-only");
        let _ = fs::remove_dir_all(&root);
        let key = ProfileKey::anonymous("ann").expect("non-empty");

        let mut store = JsonFileProfileStore::new(&root);
        store.connect().expect("missing directory is fine");
        assert_eq!(store.load(&key).expect("connected"), None);
        store.disconnect();
        assert!(!root.exists());
    }

    #[test]
    fn connect_rejects_a_file_in_place_of_the_directory() {
        let root = temp_root("not-a-dir");
        fs::write(&root, "x").expect("temp file");

        let mut store = JsonFileProfileStore::new(&root);
        assert!(matches!(store.connect(), Err(PlannerError::Store(_))));
        assert!(!store.is_connected());

        let _ = fs::remove_file(&root);
    }
}
