//! Agent registration metadata
//!
//! Registration files are loosely structured JSON. Only a handful of fields
//! matter to the jobs (`name`, `description`, `image`, `tags`, `services`)
//! and any of them may be missing or of the wrong type, so the raw object is
//! kept and read through lenient accessors.

use serde_json::{Map, Value};

/// Resolved metadata object; empty when resolution failed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentMetadata(Map<String, Value>);

/// One entry of the metadata `services` list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceEntry {
    pub name: Option<String>,
    pub endpoint: Option<String>,
    pub domains: Vec<String>,
    pub skills: Vec<String>,
}

impl AgentMetadata {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap a parsed JSON document; anything but an object becomes empty
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Raw field access
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String field, `None` if absent or not a string
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Display name; blank names count as absent
    pub fn name(&self) -> Option<&str> {
        self.str_field("name").filter(|n| !n.trim().is_empty())
    }

    pub fn description(&self) -> Option<&str> {
        self.str_field("description")
    }

    pub fn image(&self) -> Option<&str> {
        self.str_field("image").filter(|i| !i.is_empty())
    }

    /// String entries of the `tags` list
    pub fn tags(&self) -> Vec<&str> {
        string_items(self.0.get("tags")).collect()
    }

    /// Object entries of the `services` list
    pub fn services(&self) -> Vec<ServiceEntry> {
        let entries = match self.0.get("services") {
            Some(Value::Array(entries)) => entries,
            _ => return Vec::new(),
        };

        entries
            .iter()
            .filter_map(Value::as_object)
            .map(|svc| ServiceEntry {
                name: svc.get("name").and_then(Value::as_str).map(str::to_string),
                endpoint: svc.get("endpoint").and_then(Value::as_str).map(str::to_string),
                domains: string_items(svc.get("domains")).map(str::to_string).collect(),
                skills: string_items(svc.get("skills")).map(str::to_string).collect(),
            })
            .collect()
    }

    /// Truthiness of a field: `true`, a non-zero number, a non-empty string,
    /// list or object
    pub fn flag(&self, key: &str) -> bool {
        match self.0.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().map_or(false, |v| v != 0.0),
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Array(a)) => !a.is_empty(),
            Some(Value::Object(o)) => !o.is_empty(),
            Some(Value::Null) | None => false,
        }
    }
}

fn string_items(value: Option<&Value>) -> impl Iterator<Item = &str> {
    value
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_non_object_is_empty() {
        assert!(AgentMetadata::from_value(json!([1, 2])).is_empty());
        assert!(AgentMetadata::from_value(json!("text")).is_empty());
        assert!(AgentMetadata::from_value(Value::Null).is_empty());
    }

    #[test]
    fn test_accessors_ignore_wrong_types() {
        let metadata = AgentMetadata::from_value(json!({
            "name": 42,
            "description": "Routes swaps",
            "tags": ["DeFi", 7, "amm"],
            "services": "not a list"
        }));

        assert_eq!(metadata.name(), None);
        assert_eq!(metadata.description(), Some("Routes swaps"));
        assert_eq!(metadata.tags(), vec!["DeFi", "amm"]);
        assert!(metadata.services().is_empty());
    }

    #[test]
    fn test_blank_name_is_absent() {
        let metadata = AgentMetadata::from_value(json!({ "name": "  " }));
        assert_eq!(metadata.name(), None);
    }

    #[test]
    fn test_services_parsed() {
        let metadata = AgentMetadata::from_value(json!({
            "services": [
                { "name": "web", "endpoint": "https://agent.example" },
                { "name": "OASF", "domains": ["finance"], "skills": ["swap", 3] },
                "bogus"
            ]
        }));

        let services = metadata.services();
        assert_eq!(services.len(), 2);
        assert_eq!(services[0].endpoint.as_deref(), Some("https://agent.example"));
        assert_eq!(services[1].domains, vec!["finance"]);
        assert_eq!(services[1].skills, vec!["swap"]);
    }

    #[test]
    fn test_flag_truthiness() {
        let metadata = AgentMetadata::from_value(json!({
            "a": true, "b": false, "c": 1, "d": 0, "e": "yes", "f": "", "g": null
        }));

        assert!(metadata.flag("a"));
        assert!(!metadata.flag("b"));
        assert!(metadata.flag("c"));
        assert!(!metadata.flag("d"));
        assert!(metadata.flag("e"));
        assert!(!metadata.flag("f"));
        assert!(!metadata.flag("g"));
        assert!(!metadata.flag("missing"));
    }
}
