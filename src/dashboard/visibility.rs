//! Widget visibility tree: a nested map of booleans and boolean arrays under
//! `layout.widgetVisibility`, addressed by dotted paths such as
//! `"quickActions.viewMessages"` or `"kpiCards"` plus a slot index.
//!
//! Resolution is default-allow: only an explicit `false` hides a widget. A
//! missing branch, a missing slot, or a value of any other shape resolves to
//! visible.

use crate::models::DashboardConfig;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WidgetVisibility(Map<String, Value>);

impl WidgetVisibility {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the raw value stored at `path`, if every segment exists.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let segments: Vec<&str> = path.split('.').collect();
        let (last, parents) = segments.split_last()?;
        let mut current = &self.0;
        for segment in parents {
            match current.get(*segment) {
                Some(Value::Object(next)) => current = next,
                _ => return None,
            }
        }
        current.get(*last)
    }

    pub fn resolve(&self, path: &str, index: Option<usize>) -> bool {
        match (self.lookup(path), index) {
            (Some(Value::Array(slots)), Some(index)) => slots.get(index) != Some(&Value::Bool(false)),
            (value, _) => value != Some(&Value::Bool(false)),
        }
    }

    /// Writes one flag, creating intermediate objects as needed. A segment that
    /// currently holds a non-object is replaced by an empty object.
    ///
    /// An index whose slot array cannot be allocated is refused with a warning
    /// and no slot is written.
    pub fn set(&mut self, path: &str, visible: bool, index: Option<usize>) {
        let segments: Vec<&str> = path.split('.').collect();
        let Some((last, parents)) = segments.split_last() else {
            return;
        };

        let mut current = &mut self.0;
        for segment in parents {
            let entry = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            current = match entry {
                Value::Object(next) => next,
                _ => return,
            };
        }

        match index {
            Some(index) => {
                let slots = ensure_array(current, last);
                if slots.len() <= index {
                    let grown = index
                        .checked_add(1)
                        .and_then(|len| slots.try_reserve(len - slots.len()).ok().map(|_| len));
                    let Some(len) = grown else {
                        tracing::warn!(path = %path, index, "visibility slot index cannot be allocated");
                        return;
                    };
                    slots.resize(len, Value::Null);
                }
                slots[index] = Value::Bool(visible);
            }
            None => {
                current.insert(last.to_string(), Value::Bool(visible));
            }
        }
    }

    /// One-level overlay: every top-level key of `persisted` replaces the same
    /// key here wholesale.
    pub fn overlay(&self, persisted: &WidgetVisibility) -> WidgetVisibility {
        let mut merged = self.0.clone();
        for (key, value) in &persisted.0 {
            merged.insert(key.clone(), value.clone());
        }
        Self(merged)
    }

    /// Top-level array at `key`, created (or coerced from another shape) if needed.
    pub(crate) fn slots_mut(&mut self, key: &str) -> &mut Vec<Value> {
        ensure_array(&mut self.0, key)
    }
}

fn ensure_array<'a>(map: &'a mut Map<String, Value>, key: &str) -> &'a mut Vec<Value> {
    let entry = map
        .entry(key.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    if !entry.is_array() {
        *entry = Value::Array(Vec::new());
    }
    match entry {
        Value::Array(slots) => slots,
        _ => unreachable!("entry was just coerced to an array"),
    }
}

pub fn is_visible(config: &DashboardConfig, path: &str, index: Option<usize>) -> bool {
    config.layout.widget_visibility.resolve(path, index)
}

/// Returns a copy of `config` with one flag written; the input is untouched.
pub fn set_visibility(
    config: &DashboardConfig,
    path: &str,
    visible: bool,
    index: Option<usize>,
) -> DashboardConfig {
    let mut next = config.clone();
    next.layout.widget_visibility.set(path, visible, index);
    next
}

#[cfg(test)]
mod tests {
    use super::{is_visible, set_visibility, WidgetVisibility};
    use crate::dashboard::defaults::default_dashboard_config;
    use serde_json::json;

    fn tree(value: serde_json::Value) -> WidgetVisibility {
        serde_json::from_value(value).expect("visibility tree")
    }

    #[test]
    fn missing_paths_resolve_visible() {
        let mut config = default_dashboard_config();
        config.layout.widget_visibility = tree(json!({ "taskList": false }));
        assert!(is_visible(&config, "quickActions.viewMessages", None));
        assert!(is_visible(&config, "does.not.exist", None));
        assert!(is_visible(&config, "", None));
        assert!(!is_visible(&config, "taskList", None));
    }

    #[test]
    fn non_boolean_values_count_as_visible() {
        let visibility = tree(json!({
            "helpSection": "yes",
            "activityFeed": null,
            "chartSections": true,
            "kpiCards": [false, null, 0]
        }));
        assert!(visibility.resolve("helpSection", None));
        assert!(visibility.resolve("activityFeed", None));
        assert!(visibility.resolve("chartSections.performanceChart", None));
        assert!(!visibility.resolve("kpiCards", Some(0)));
        assert!(visibility.resolve("kpiCards", Some(1)));
        assert!(visibility.resolve("kpiCards", Some(2)));
        assert!(visibility.resolve("kpiCards", Some(9)));
        assert!(visibility.resolve("kpiCards", None));
    }

    #[test]
    fn index_on_scalar_falls_back_to_scalar() {
        let visibility = tree(json!({ "announcements": false, "helpSection": true }));
        assert!(!visibility.resolve("announcements", Some(3)));
        assert!(visibility.resolve("helpSection", Some(0)));
    }

    #[test]
    fn write_then_read_returns_written_value() {
        let config = default_dashboard_config();
        for path in ["taskList", "quickActions.viewMessages", "brand.new.leaf"] {
            for visible in [true, false] {
                let next = set_visibility(&config, path, visible, None);
                assert_eq!(is_visible(&next, path, None), visible, "{path}");
            }
        }
    }

    #[test]
    fn indexed_write_leaves_other_slots_alone() {
        let config = default_dashboard_config();
        let next = set_visibility(&config, "kpiCards", false, Some(2));
        assert!(!is_visible(&next, "kpiCards", Some(2)));
        for slot in [0, 1, 3] {
            assert_eq!(
                is_visible(&next, "kpiCards", Some(slot)),
                is_visible(&config, "kpiCards", Some(slot))
            );
        }
        assert!(is_visible(&config, "kpiCards", Some(2)));
    }

    #[test]
    fn indexed_write_extends_with_unspecified_slots() {
        let config = default_dashboard_config();
        let next = set_visibility(&config, "taskStats.perAssignee", false, Some(3));
        assert!(!is_visible(&next, "taskStats.perAssignee", Some(3)));
        assert!(is_visible(&next, "taskStats.perAssignee", Some(0)));
        assert_eq!(
            next.layout.widget_visibility.lookup("taskStats.perAssignee"),
            Some(&json!([null, null, null, false]))
        );
    }

    #[test]
    fn writes_through_scalar_intermediates() {
        let mut config = default_dashboard_config();
        config.layout.widget_visibility = tree(json!({ "quickActions": true }));
        let next = set_visibility(&config, "quickActions.addKPI", false, None);
        assert!(!is_visible(&next, "quickActions.addKPI", None));
    }

    #[test]
    fn unindexed_write_replaces_array() {
        let config = default_dashboard_config();
        let next = set_visibility(&config, "kpiCards", false, None);
        assert_eq!(next.layout.widget_visibility.lookup("kpiCards"), Some(&json!(false)));
    }

    #[test]
    fn writes_are_idempotent() {
        let config = default_dashboard_config();
        let once = set_visibility(&config, "chartSections.performanceTrends", false, None);
        let twice = set_visibility(&once, "chartSections.performanceTrends", false, None);
        assert_eq!(once, twice);

        let once = set_visibility(&config, "kpiCards", false, Some(1));
        let twice = set_visibility(&once, "kpiCards", false, Some(1));
        assert_eq!(once, twice);
    }

    #[test]
    fn far_index_write_lands() {
        let config = default_dashboard_config();
        let next = set_visibility(&config, "kpiCards", false, Some(5000));
        assert!(!is_visible(&next, "kpiCards", Some(5000)));
        assert!(is_visible(&next, "kpiCards", Some(4999)));
        assert!(is_visible(&next, "kpiCards", Some(0)));
        match next.layout.widget_visibility.lookup("kpiCards") {
            Some(serde_json::Value::Array(slots)) => assert_eq!(slots.len(), 5001),
            other => panic!("expected slot array, got {other:?}"),
        }
    }

    #[test]
    fn unallocatable_index_leaves_tree_unchanged() {
        let config = default_dashboard_config();
        assert_eq!(set_visibility(&config, "kpiCards", false, Some(usize::MAX)), config);
        assert_eq!(set_visibility(&config, "kpiCards", false, Some(usize::MAX - 1)), config);
    }
}
