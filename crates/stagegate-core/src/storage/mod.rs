//! # Preference Storage
//!
//! The capture flow reads its configuration at the start of a cycle and
//! writes it back on user action. Both go through [`PreferenceStore`], which
//! the owner injects instead of reaching for ambient global state.
//!
//! Implementations:
//! - [`MemoryPreferences`]: volatile, for tests and embedding
//! - [`RedbPreferences`]: disk-backed via redb

mod redb_prefs;

pub use redb_prefs::RedbPreferences;

use crate::primitives::{MAX_KEY_LENGTH, PREFERRED_CAMERA_KEY};
use crate::{CameraFacing, CaptureError, PreferenceValue};
use std::collections::BTreeMap;

// =============================================================================
// STORE TRAIT
// =============================================================================

/// A key-value configuration provider.
pub trait PreferenceStore {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<PreferenceValue>, CaptureError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: PreferenceValue) -> Result<(), CaptureError>;

    /// Remove `key`. Returns the value that was stored.
    fn remove(&mut self, key: &str) -> Result<Option<PreferenceValue>, CaptureError>;

    /// All entries, ordered by key.
    fn entries(&self) -> Result<Vec<(String, PreferenceValue)>, CaptureError>;
}

/// Reject empty or oversized keys.
pub fn validate_key(key: &str) -> Result<(), CaptureError> {
    if key.is_empty() || key.len() > MAX_KEY_LENGTH {
        return Err(CaptureError::InvalidKey(key.to_string()));
    }
    Ok(())
}

// =============================================================================
// IN-MEMORY STORE
// =============================================================================

/// Volatile preference store.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences {
    values: BTreeMap<String, PreferenceValue>,
}

impl MemoryPreferences {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Result<Option<PreferenceValue>, CaptureError> {
        validate_key(key)?;
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: PreferenceValue) -> Result<(), CaptureError> {
        validate_key(key)?;
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<Option<PreferenceValue>, CaptureError> {
        validate_key(key)?;
        Ok(self.values.remove(key))
    }

    fn entries(&self) -> Result<Vec<(String, PreferenceValue)>, CaptureError> {
        Ok(self
            .values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

// =============================================================================
// TYPED ACCESSORS
// =============================================================================

/// Typed view of the preferences the capture flow uses.
pub struct CameraPreferences;

impl CameraPreferences {
    /// The camera the user last switched to. Defaults to the back camera.
    ///
    /// A stored value that does not name a camera is ignored.
    pub fn preferred_facing(store: &dyn PreferenceStore) -> Result<CameraFacing, CaptureError> {
        match store.get(PREFERRED_CAMERA_KEY)? {
            None => Ok(CameraFacing::default()),
            Some(PreferenceValue::Int(id)) => Ok(CameraFacing::from_id(id).unwrap_or_else(|| {
                tracing::warn!(id, "ignoring unknown preferred camera id");
                CameraFacing::default()
            })),
            Some(other) => {
                tracing::warn!(kind = other.kind(), "ignoring non-integer preferred camera");
                Ok(CameraFacing::default())
            }
        }
    }

    /// Remember `facing` for the next session.
    pub fn set_preferred_facing(
        store: &mut dyn PreferenceStore,
        facing: CameraFacing,
    ) -> Result<(), CaptureError> {
        store.set(PREFERRED_CAMERA_KEY, PreferenceValue::Int(facing.id()))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_basic_operations() {
        let mut store = MemoryPreferences::new();
        assert_eq!(store.get("a").expect("get"), None);

        store.set("a", PreferenceValue::Bool(true)).expect("set");
        store.set("b", PreferenceValue::Int(3)).expect("set");
        assert_eq!(store.get("a").expect("get"), Some(PreferenceValue::Bool(true)));

        let keys: Vec<String> = store
            .entries()
            .expect("entries")
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["a", "b"]);

        assert_eq!(
            store.remove("a").expect("remove"),
            Some(PreferenceValue::Bool(true))
        );
        assert_eq!(store.get("a").expect("get"), None);
    }

    #[test]
    fn invalid_keys_rejected() {
        let mut store = MemoryPreferences::new();
        assert!(matches!(
            store.set("", PreferenceValue::Int(0)),
            Err(CaptureError::InvalidKey(_))
        ));
        let long = "k".repeat(MAX_KEY_LENGTH + 1);
        assert!(store.get(&long).is_err());
    }

    #[test]
    fn preferred_facing_defaults_to_back() {
        let store = MemoryPreferences::new();
        assert_eq!(
            CameraPreferences::preferred_facing(&store).expect("read"),
            CameraFacing::Back
        );
    }

    #[test]
    fn preferred_facing_roundtrip() {
        let mut store = MemoryPreferences::new();
        CameraPreferences::set_preferred_facing(&mut store, CameraFacing::Front).expect("write");
        assert_eq!(
            store.get(PREFERRED_CAMERA_KEY).expect("get"),
            Some(PreferenceValue::Int(1))
        );
        assert_eq!(
            CameraPreferences::preferred_facing(&store).expect("read"),
            CameraFacing::Front
        );
    }

    #[test]
    fn garbage_preferred_facing_ignored() {
        let mut store = MemoryPreferences::new();
        store
            .set(PREFERRED_CAMERA_KEY, PreferenceValue::Int(42))
            .expect("set");
        assert_eq!(
            CameraPreferences::preferred_facing(&store).expect("read"),
            CameraFacing::Back
        );

        store
            .set(PREFERRED_CAMERA_KEY, PreferenceValue::Text("front".into()))
            .expect("set");
        assert_eq!(
            CameraPreferences::preferred_facing(&store).expect("read"),
            CameraFacing::Back
        );
    }
}
