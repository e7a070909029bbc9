use std::collections::HashMap;

use crate::error::{PlannerError, Result};

use super::{ProfileDocument, ProfileKey, ProfileStore};

/// Process-local store, used by tests and by the server when no profile
/// directory is configured.
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    documents: HashMap<String, ProfileDocument>,
    connected: bool,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileStore for MemoryProfileStore {
    fn connect(&mut self) -> Result<()> {
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
        if !self.connected {
            return Err(PlannerError::StoreDisconnected);
        }
        Ok(self.documents.get(&key.document_path()).cloned())
    }

    fn save(&mut self, key: &ProfileKey, update: ProfileDocument) -> Result<ProfileDocument> {
        if !self.connected {
            return Err(PlannerError::StoreDisconnected);
        }
        let doc = self.documents.entry(key.document_path()).or_default();
        doc.merge(update);
        Ok(doc.clone())
    }
}
