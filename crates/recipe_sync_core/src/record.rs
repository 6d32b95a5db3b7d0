use std::fmt;

use serde::Deserialize;
use serde_json::{Map, Value};

/// Identifier linking a local entry back to its upstream recipe.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExternalId(String);

impl ExternalId {
    /// Normalizes a raw JSON id. Falsy ids (`0`, `"0"`, blank) count as missing.
    pub fn from_json(value: &Value) -> Option<Self> {
        let raw = match value {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        if raw.is_empty() || raw == "0" {
            return None;
        }
        Some(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ExternalId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One recipe object as served by the upstream API.
///
/// Decoding never fails: a non-object element or a wrongly-typed field simply
/// leaves the corresponding value absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Value")]
pub struct SourceRecipeRecord {
    pub id: Option<ExternalId>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub instructions: Option<String>,
    pub image_url: Option<String>,
    pub updated_at: Option<String>,
    pub difficulty: Option<String>,
    pub season: Option<String>,
    pub keywords: Option<String>,
    pub blog_content: Option<String>,
}

impl SourceRecipeRecord {
    /// Record carrying only an identifier.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: ExternalId::from_json(&Value::String(id.into())),
            ..Self::default()
        }
    }

    /// Title with surrounding whitespace removed, `None` when blank.
    pub fn title(&self) -> Option<&str> {
        non_blank(&self.title)
    }

    pub fn description(&self) -> Option<&str> {
        non_blank(&self.description)
    }

    pub fn image_url(&self) -> Option<&str> {
        non_blank(&self.image_url)
    }

    pub fn blog_content(&self) -> Option<&str> {
        non_blank(&self.blog_content)
    }

    /// Upstream last-modified stamp, empty string when absent.
    pub fn updated_at(&self) -> &str {
        self.updated_at.as_deref().map(str::trim).unwrap_or_default()
    }
}

impl From<Value> for SourceRecipeRecord {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::from_object(&map),
            _ => Self::default(),
        }
    }
}

impl SourceRecipeRecord {
    fn from_object(map: &Map<String, Value>) -> Self {
        let text = |key: &str| map.get(key).and_then(lenient_string);
        Self {
            id: map.get("id").and_then(ExternalId::from_json),
            title: text("title"),
            description: text("description"),
            instructions: text("instructions"),
            image_url: text("image_url"),
            updated_at: text("updated_at"),
            difficulty: text("difficulty"),
            season: text("season"),
            keywords: text("keywords"),
            blog_content: text("blog_content"),
        }
    }
}

fn lenient_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn non_blank(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_and_string_ids_normalize() {
        assert_eq!(ExternalId::from_json(&json!(12)), Some(ExternalId::from("12")));
        assert_eq!(ExternalId::from_json(&json!(" 7 ")), Some(ExternalId::from("7")));
        assert_eq!(ExternalId::from_json(&json!(0)), None);
        assert_eq!(ExternalId::from_json(&json!("0")), None);
        assert_eq!(ExternalId::from_json(&json!("")), None);
        assert_eq!(ExternalId::from_json(&json!(null)), None);
        assert_eq!(ExternalId::from_json(&json!([1])), None);
    }

    #[test]
    fn wrongly_typed_fields_become_absent() {
        let record: SourceRecipeRecord = serde_json::from_value(json!({
            "id": 3,
            "title": null,
            "description": ["x"],
            "keywords": 42,
            "created_at": "2024-01-01",
        }))
        .unwrap();
        assert_eq!(record.id, Some(ExternalId::from("3")));
        assert_eq!(record.title, None);
        assert_eq!(record.description, None);
        assert_eq!(record.keywords.as_deref(), Some("42"));
    }

    #[test]
    fn non_object_element_has_no_id() {
        let records: Vec<SourceRecipeRecord> =
            serde_json::from_str(r#"[{"id": 1}, "junk", 5]"#).unwrap();
        assert_eq!(records.len(), 3);
        assert!(records[0].id.is_some());
        assert!(records[1].id.is_none());
        assert!(records[2].id.is_none());
    }

    #[test]
    fn blank_accessors_return_none() {
        let record = SourceRecipeRecord {
            title: Some("   ".into()),
            updated_at: Some(" 2024-01-01 ".into()),
            ..SourceRecipeRecord::with_id("1")
        };
        assert_eq!(record.title(), None);
        assert_eq!(record.updated_at(), "2024-01-01");
        assert_eq!(SourceRecipeRecord::default().updated_at(), "");
    }
}
