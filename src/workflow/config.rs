/// Block configuration
///
/// A block's config is an open JSON object whose shape depends on the block
/// type. The store never validates it; the typed readers below back the
/// inspector's select and list fields, and values that fail to parse read as
/// unset.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

/// Open key/value settings attached to a block
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockConfig(Map<String, Value>);

impl BlockConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shallow merge: keys in `partial` overwrite, every other key survives
    pub fn merge(&mut self, partial: Map<String, Value>) {
        for (key, value) in partial {
            self.0.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Deserialize a single key into a typed value, `None` when absent or malformed
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.0
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Uploaded file referenced by a `file` block
    pub fn file_id(&self) -> Option<&str> {
        self.get_str("fileId")
    }

    pub fn api_method(&self) -> Option<ApiMethod> {
        self.get_as("apiMethod")
    }

    pub fn file_type(&self) -> Option<FileType> {
        self.get_as("fileType")
    }

    pub fn db_type(&self) -> Option<DbType> {
        self.get_as("dbType")
    }

    pub fn cleaning_rules(&self) -> Vec<CleaningRule> {
        self.get_as("cleaningRules").unwrap_or_default()
    }

    pub fn transformations(&self) -> Vec<Transformation> {
        self.get_as("transformations").unwrap_or_default()
    }

    pub fn merge_strategy(&self) -> Option<MergeStrategy> {
        self.get_as("mergeStrategy")
    }
}

impl From<Map<String, Value>> for BlockConfig {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApiMethod {
    Get,
    Post,
    Put,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Csv,
    Xlsx,
    Json,
    Xml,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    Postgresql,
    Mysql,
    Supabase,
}

/// One rule of a `clean` block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleaningRule {
    pub field: String,
    pub action: CleaningAction,
    /// Fill value for `fill_nulls`, pattern for `regex_replace`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleaningAction {
    RemoveDuplicates,
    FillNulls,
    Trim,
    Normalize,
    RegexReplace,
}

/// One step of a `transform` block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transformation {
    #[serde(rename = "type")]
    pub kind: TransformationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<Aggregation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<SortDirection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformationKind {
    Formula,
    Filter,
    Aggregate,
    Sort,
    Rename,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Sum,
    Avg,
    Min,
    Max,
    Count,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Join semantics of a `merge` block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    Inner,
    Left,
    Right,
    Full,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn merge_keeps_unrelated_keys() {
        let mut config = BlockConfig::from(map(json!({ "apiUrl": "https://a", "apiMethod": "GET" })));
        config.merge(map(json!({ "apiMethod": "POST" })));

        assert_eq!(config.get_str("apiUrl"), Some("https://a"));
        assert_eq!(config.api_method(), Some(ApiMethod::Post));
        assert_eq!(config.len(), 2);
    }

    #[test]
    fn typed_views_tolerate_malformed_values() {
        let config = BlockConfig::from(map(json!({
            "mergeStrategy": "sideways",
            "cleaningRules": [{ "field": "amount", "action": "fill_nulls", "value": "0" }],
            "transformations": "not a list"
        })));

        assert_eq!(config.merge_strategy(), None);
        assert_eq!(
            config.cleaning_rules(),
            vec![CleaningRule {
                field: "amount".to_string(),
                action: CleaningAction::FillNulls,
                value: Some("0".to_string()),
            }]
        );
        assert!(config.transformations().is_empty());
    }

    #[test]
    fn transformation_reads_camel_case_keys() {
        let config = BlockConfig::from(map(json!({
            "transformations": [{ "type": "rename", "field": "amt", "newName": "amount" }]
        })));

        let steps = config.transformations();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].kind, TransformationKind::Rename);
        assert_eq!(steps[0].new_name.as_deref(), Some("amount"));
    }
}
