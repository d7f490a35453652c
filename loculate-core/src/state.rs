use crate::origins::{NO_SELECTION, SavedOrigins};
use crate::types::Theme;
use serde_json::{Map, Value, json};

pub const KEY_SAVED_ORIGINS: &str = "savedOrigins";
pub const KEY_SELECTED_ORIGIN_INDEX: &str = "selectedOriginIndex";
pub const KEY_SELECTED_TEXT: &str = "selectedText";
pub const KEY_THEME: &str = "theme";
/// Single-origin key from before the list existed. Read for migration, never written.
pub const KEY_LEGACY_ORIGIN: &str = "origin";

/// A partial key/value record as returned by a store `get` or passed to `set`.
pub type StoreRecord = Map<String, Value>;

/// Everything the panel reads on mount, decoded leniently.
///
/// Keys that are missing or hold the wrong JSON type decode as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PanelSnapshot {
    pub saved_origins: Option<Vec<String>>,
    pub selected_origin_index: Option<i64>,
    pub selected_text: Option<String>,
    pub theme: Option<Theme>,
    pub legacy_origin: Option<String>,
}

impl PanelSnapshot {
    pub fn from_record(record: &StoreRecord) -> Self {
        Self {
            saved_origins: record.get(KEY_SAVED_ORIGINS).and_then(decode_string_list),
            selected_origin_index: record.get(KEY_SELECTED_ORIGIN_INDEX).and_then(Value::as_i64),
            selected_text: record
                .get(KEY_SELECTED_TEXT)
                .and_then(Value::as_str)
                .map(str::to_string),
            theme: record
                .get(KEY_THEME)
                .and_then(|v| serde_json::from_value(v.clone()).ok()),
            legacy_origin: record
                .get(KEY_LEGACY_ORIGIN)
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }

    /// The reconciled origin list; never trusts the stored index as-is.
    pub fn origins(&self) -> SavedOrigins {
        SavedOrigins::from_parts(
            self.saved_origins.clone().unwrap_or_default(),
            self.selected_origin_index.unwrap_or(NO_SELECTION),
        )
    }

    /// Pending destination, if a non-blank one was captured.
    pub fn destination(&self) -> Option<&str> {
        self.selected_text
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Applies a migration in place so the snapshot matches what was written back.
    pub fn apply(&mut self, writes: &StoreRecord) {
        let merged = PanelSnapshot::from_record(writes);
        if merged.saved_origins.is_some() {
            self.saved_origins = merged.saved_origins;
        }
        if merged.selected_origin_index.is_some() {
            self.selected_origin_index = merged.selected_origin_index;
        }
    }
}

fn decode_string_list(value: &Value) -> Option<Vec<String>> {
    let items = value.as_array()?;
    let list: Vec<String> = items
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect();
    if list.len() != items.len() {
        log::warn!(
            "dropping {} non-string saved origin entries; selection may shift",
            items.len() - list.len()
        );
    }
    Some(list)
}

/// Store writes promoting the legacy single origin into the list keys.
///
/// Returns `None` when there is nothing to migrate: no usable legacy value, or the
/// list keys already exist. The legacy key itself is left in place.
pub fn plan_migration(snapshot: &PanelSnapshot) -> Option<StoreRecord> {
    if snapshot.saved_origins.is_some() {
        return None;
    }
    let legacy = snapshot.legacy_origin.as_deref()?.trim();
    if legacy.is_empty() {
        return None;
    }
    Some(origins_record(&SavedOrigins::from_parts(
        vec![legacy.to_string()],
        0,
    )))
}

/// Both origin keys together, as a single `set`.
pub fn origins_record(origins: &SavedOrigins) -> StoreRecord {
    let mut record = StoreRecord::new();
    record.insert(KEY_SAVED_ORIGINS.into(), json!(origins.entries()));
    record.insert(
        KEY_SELECTED_ORIGIN_INDEX.into(),
        json!(origins.selected_index()),
    );
    record
}

/// Just the index key, for a pick that leaves the list alone.
pub fn selected_index_record(origins: &SavedOrigins) -> StoreRecord {
    let mut record = StoreRecord::new();
    record.insert(
        KEY_SELECTED_ORIGIN_INDEX.into(),
        json!(origins.selected_index()),
    );
    record
}

pub fn selected_text_record(text: &str) -> StoreRecord {
    let mut record = StoreRecord::new();
    record.insert(KEY_SELECTED_TEXT.into(), json!(text));
    record
}

pub fn theme_record(theme: Theme) -> StoreRecord {
    let mut record = StoreRecord::new();
    record.insert(KEY_THEME.into(), json!(theme.as_str()));
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(v: Value) -> StoreRecord {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn legacy_origin_migrates_to_list() {
        let snap = PanelSnapshot::from_record(&record(json!({"origin": "X"})));
        let writes = plan_migration(&snap).unwrap();
        assert_eq!(writes.get(KEY_SAVED_ORIGINS), Some(&json!(["X"])));
        assert_eq!(writes.get(KEY_SELECTED_ORIGIN_INDEX), Some(&json!(0)));
        assert!(!writes.contains_key(KEY_LEGACY_ORIGIN));
    }

    #[test]
    fn migration_is_noop_once_list_exists() {
        let snap = PanelSnapshot::from_record(&record(json!({
            "origin": "X",
            "savedOrigins": ["X"],
            "selectedOriginIndex": 0,
        })));
        assert_eq!(plan_migration(&snap), None);
    }

    #[test]
    fn blank_legacy_value_is_ignored() {
        let snap = PanelSnapshot::from_record(&record(json!({"origin": "  "})));
        assert_eq!(plan_migration(&snap), None);
    }

    #[test]
    fn snapshot_reconciles_stale_index() {
        let snap = PanelSnapshot::from_record(&record(json!({
            "savedOrigins": ["A"],
            "selectedOriginIndex": 1,
        })));
        let origins = snap.origins();
        assert_eq!(origins.selected_origin(), Some("A"));
    }

    #[test]
    fn wrong_types_decode_as_missing() {
        let snap = PanelSnapshot::from_record(&record(json!({
            "savedOrigins": "not a list",
            "selectedOriginIndex": "0",
            "theme": "sepia",
            "selectedText": 42,
        })));
        assert_eq!(snap, PanelSnapshot::default());
    }

    #[test]
    fn apply_merges_migration_writes() {
        let mut snap = PanelSnapshot::from_record(&record(json!({"origin": "X"})));
        let writes = plan_migration(&snap).unwrap();
        snap.apply(&writes);
        assert_eq!(snap.origins().selected_origin(), Some("X"));
        assert_eq!(plan_migration(&snap), None);
    }

    #[test]
    fn non_string_origins_are_dropped() {
        let snap = PanelSnapshot::from_record(&record(json!({
            "savedOrigins": [7, "A", null],
            "selectedOriginIndex": 0,
        })));
        assert_eq!(snap.saved_origins, Some(vec!["A".to_string()]));
        assert_eq!(snap.origins().selected_origin(), Some("A"));
    }

    #[test]
    fn blank_selection_is_not_a_destination() {
        let snap = PanelSnapshot::from_record(&record(json!({"selectedText": "  \n"})));
        assert_eq!(snap.destination(), None);
    }
}
