use std::collections::HashMap;
use std::sync::Arc;
use serde_json::Value;

/// Read-only hints handed to every hook stage.
///
/// The caller's map is copied on construction so later changes to it are not
/// visible here. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct HookHints {
    hints: Arc<HashMap<String, Value>>,
}

impl HookHints {
    pub fn new(hints: &HashMap<String, Value>) -> Self {
        Self {
            hints: Arc::new(hints.clone()),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// The value stored under `key`, `None` when absent
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.hints.get(key)
    }

    pub fn len(&self) -> usize {
        self.hints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hints.is_empty()
    }
}

impl FromIterator<(String, Value)> for HookHints {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            hints: Arc::new(iter.into_iter().collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn value_is_stable_and_absent_for_unknown_keys() {
        let hints: HookHints = [("trace".to_string(), json!("abc"))].into_iter().collect();

        assert_eq!(hints.value("trace"), Some(&json!("abc")));
        assert_eq!(hints.value("trace"), hints.value("trace"));
        assert_eq!(hints.value("missing"), None);
    }

    #[test]
    fn caller_mutation_after_construction_is_invisible() {
        let mut source = HashMap::new();
        source.insert("sample_rate".to_string(), json!(0.5));
        let hints = HookHints::new(&source);

        source.insert("sample_rate".to_string(), json!(1.0));
        source.insert("extra".to_string(), json!(true));

        assert_eq!(hints.value("sample_rate"), Some(&json!(0.5)));
        assert_eq!(hints.value("extra"), None);
        assert_eq!(hints.len(), 1);
    }
}
