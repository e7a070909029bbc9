//! Saved plan profiles.
//!
//! A [`ProfileStore`] is handed to whatever needs to load or save a profile;
//! it has an explicit `connect`/`disconnect` lifecycle and every operation on
//! a disconnected store fails with [`PlannerError::StoreDisconnected`].
//! Writes merge field by field and the last write wins.

mod file;
mod memory;

use serde::{Deserialize, Serialize};

use crate::core::{PlanSettings, RawDebt, RawValue};
use crate::error::Result;

pub use file::JsonFileProfileStore;
pub use memory::MemoryProfileStore;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProfileKey {
    /// Local nickname, compared case-insensitively.
    Anonymous(String),
    /// Identity issued by an authentication provider.
    Authenticated(String),
}

impl ProfileKey {
    pub fn anonymous(nickname: &str) -> Option<Self> {
        let normalized = nickname.trim().to_lowercase();
        (!normalized.is_empty()).then_some(ProfileKey::Anonymous(normalized))
    }

    pub fn authenticated(uid: &str) -> Option<Self> {
        let uid = uid.trim();
        (!uid.is_empty()).then(|| ProfileKey::Authenticated(uid.to_string()))
    }

    pub fn document_path(&self) -> String {
        match self {
            ProfileKey::Anonymous(nickname) => format!("public/data/userProfiles/{nickname}"),
            ProfileKey::Authenticated(uid) => format!("users/{uid}/debtPlanner/mainData"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_percent: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debts: Option<Vec<RawDebt>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl ProfileDocument {
    pub fn snapshot(settings: &PlanSettings, debts: &[RawDebt]) -> Self {
        Self {
            budget: Some(RawValue::Number(settings.budget)),
            min_percent: Some(RawValue::Number(settings.min_percent)),
            debts: Some(debts.to_vec()),
            updated_at: Some(chrono::Utc::now().to_rfc3339()),
        }
    }

    pub fn merge(&mut self, update: ProfileDocument) {
        if update.budget.is_some() {
            self.budget = update.budget;
        }
        if update.min_percent.is_some() {
            self.min_percent = update.min_percent;
        }
        if update.debts.is_some() {
            self.debts = update.debts;
        }
        if update.updated_at.is_some() {
            self.updated_at = update.updated_at;
        }
    }

    /// Settings stored in the document, falling back to `defaults` for
    /// missing or non-numeric fields.
    pub fn settings_or(&self, defaults: PlanSettings) -> PlanSettings {
        PlanSettings {
            budget: self
                .budget
                .as_ref()
                .and_then(RawValue::finite)
                .unwrap_or(defaults.budget),
            min_percent: self
                .min_percent
                .as_ref()
                .and_then(RawValue::finite)
                .unwrap_or(defaults.min_percent),
        }
    }
}

pub trait ProfileStore: Send {
    fn connect(&mut self) -> Result<()>;

    fn disconnect(&mut self);

    fn is_connected(&self) -> bool;

    fn load(&self, key: &ProfileKey) -> Result<Option<ProfileDocument>>;

    /// Merges `update` into the stored document and returns the result.
    fn save(&mut self, key: &ProfileKey, update: ProfileDocument) -> Result<ProfileDocument>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_keys_are_trimmed_and_case_insensitive() {
        assert_eq!(
            ProfileKey::anonymous("  Somchai "),
            Some(ProfileKey::Anonymous("somchai".to_string()))
        );
        assert_eq!(ProfileKey::anonymous("   "), None);
        assert_eq!(
            ProfileKey::anonymous("Ann").map(|k| k.document_path()),
            Some("public/data/userProfiles/ann".to_string())
        );
        assert_eq!(
            ProfileKey::authenticated("uid-1").map(|k| k.document_path()),
            Some("users/uid-1/debtPlanner/mainData".to_string())
        );
    }

    #[test]
    fn merge_keeps_fields_missing_from_update() {
        let mut doc = ProfileDocument::snapshot(
            &PlanSettings::default(),
            &[RawDebt::new(1, "Card", 500.0, 20.0)],
        );
        doc.merge(ProfileDocument {
            budget: Some(RawValue::Number(9_000.0)),
            ..ProfileDocument::default()
        });
        assert_eq!(doc.budget, Some(RawValue::Number(9_000.0)));
        assert_eq!(doc.min_percent, Some(RawValue::Number(5.0)));
        assert_eq!(doc.debts.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn settings_fall_back_for_text_values() {
        let doc: ProfileDocument =
            serde_json::from_str(r#"{"budget": "12000", "minPercent": "", "debts": []}"#)
                .expect("valid document");
        let settings = doc.settings_or(PlanSettings::default());
        assert_eq!(settings.budget, 12_000.0);
        assert_eq!(settings.min_percent, 5.0);
    }
}
