//! Records, batches and results.
//!
//! # Design
//! Callers may hand over nothing, a single record, or a list of records for
//! each phase. `Records` collapses those three shapes into one ordered `Vec`
//! as soon as the input is constructed or deserialized, so nothing past this
//! module ever inspects the shape again.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::ConfigError;

/// A caller-supplied record. Opaque apart from the identifier field.
pub type Record = serde_json::Map<String, Value>;

/// Ordered records for one phase, normalized from any accepted shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Records(Vec<Record>);

impl Records {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Vec<Record> {
        self.0
    }
}

impl From<Record> for Records {
    fn from(record: Record) -> Self {
        Self(vec![record])
    }
}

impl From<Vec<Record>> for Records {
    fn from(records: Vec<Record>) -> Self {
        Self(records)
    }
}

impl<R: Into<Records>> From<Option<R>> for Records {
    fn from(records: Option<R>) -> Self {
        records.map(Into::into).unwrap_or_default()
    }
}

impl FromIterator<Record> for Records {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Records {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RecordsShape {
    Many(Vec<Record>),
    One(Record),
}

impl<'de> Deserialize<'de> for Records {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<RecordsShape>::deserialize(deserializer)? {
            None => Records::new(),
            Some(RecordsShape::One(record)) => record.into(),
            Some(RecordsShape::Many(records)) => records.into(),
        })
    }
}

/// One `load` invocation's payload.
///
/// `create` is mandatory; `update` and `delete` default to nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Batch {
    pub create: Records,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update: Option<Records>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Records>,
}

impl Batch {
    pub fn new(create: impl Into<Records>) -> Self {
        Self {
            create: create.into(),
            update: None,
            delete: None,
        }
    }

    pub fn with_update(mut self, update: impl Into<Records>) -> Self {
        self.update = Some(update.into());
        self
    }

    pub fn with_delete(mut self, delete: impl Into<Records>) -> Self {
        self.delete = Some(delete.into());
        self
    }

    /// Build a batch from untyped JSON.
    ///
    /// A missing `create` key is a `ConfigError::MissingCreate`; a `create`
    /// key holding `null` is an empty create phase.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        let Value::Object(mut fields) = value else {
            return Err(ConfigError::MissingCreate);
        };
        let create = fields.remove("create").ok_or(ConfigError::MissingCreate)?;
        let phase = |value: Option<Value>| -> Result<Option<Records>, ConfigError> {
            match value {
                None | Some(Value::Null) => Ok(None),
                Some(value) => serde_json::from_value(value)
                    .map(Some)
                    .map_err(ConfigError::InvalidBatch),
            }
        };
        Ok(Self {
            create: serde_json::from_value(create).map_err(ConfigError::InvalidBatch)?,
            update: phase(fields.remove("update"))?,
            delete: phase(fields.remove("delete"))?,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let value = serde_json::from_str(json).map_err(ConfigError::InvalidBatch)?;
        Self::from_value(value)
    }
}

impl<'de> Deserialize<'de> for Batch {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Batch::from_value(value).map_err(serde::de::Error::custom)
    }
}

/// One of the three phases of a batch, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Create,
    Update,
    Delete,
}

impl Phase {
    pub const ORDER: [Phase; 3] = [Phase::Create, Phase::Update, Phase::Delete];

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Create => "create",
            Phase::Update => "update",
            Phase::Delete => "delete",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw response bodies of one phase, index-aligned with its records.
pub type PhaseResult = Vec<String>;

/// Aggregated outcome of a successful batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub create_results: PhaseResult,
    pub update_results: PhaseResult,
    pub delete_results: PhaseResult,
}

impl BatchResult {
    pub fn results(&self, phase: Phase) -> &PhaseResult {
        match phase {
            Phase::Create => &self.create_results,
            Phase::Update => &self.update_results,
            Phase::Delete => &self.delete_results,
        }
    }

    pub(crate) fn results_mut(&mut self, phase: Phase) -> &mut PhaseResult {
        match phase {
            Phase::Create => &mut self.create_results,
            Phase::Update => &mut self.update_results,
            Phase::Delete => &mut self.delete_results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn null_single_and_list_normalize_to_a_sequence() {
        let none: Records = serde_json::from_value(json!(null)).unwrap();
        assert!(none.is_empty());

        let one: Records = serde_json::from_value(json!({"x": 1})).unwrap();
        assert_eq!(one, Records::from(record(json!({"x": 1}))));

        let many: Records = serde_json::from_value(json!([{"x": 1}, {"x": 2}])).unwrap();
        assert_eq!(many.len(), 2);
        assert_eq!(many.iter().next().unwrap()["x"], 1);
    }

    #[test]
    fn records_reject_scalars() {
        assert!(serde_json::from_value::<Records>(json!(7)).is_err());
        assert!(serde_json::from_value::<Records>(json!([1, 2])).is_err());
    }

    #[test]
    fn absent_option_is_empty() {
        let records = Records::from(None::<Record>);
        assert!(records.is_empty());
    }

    #[test]
    fn batch_without_create_is_rejected() {
        let err = Batch::from_value(json!({"update": [{"_id": 1}]})).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCreate));

        let err = Batch::from_value(json!(null)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCreate));
    }

    #[test]
    fn batch_with_null_create_is_empty() {
        let batch = Batch::from_value(json!({"create": null})).unwrap();
        assert!(batch.create.is_empty());
        assert!(batch.update.is_none());
        assert!(batch.delete.is_none());
    }

    #[test]
    fn batch_deserializes_through_serde() {
        let batch: Batch =
            serde_json::from_str(r#"{"create": {"a": 1}, "delete": [{"_id": 3}]}"#).unwrap();
        assert_eq!(batch.create.len(), 1);
        assert_eq!(batch.delete.map(|d| d.len()), Some(1));

        let err = serde_json::from_str::<Batch>(r#"{"delete": []}"#).unwrap_err();
        assert!(err.to_string().contains("no creation data supplied"));
    }

    #[test]
    fn malformed_phase_is_invalid_batch() {
        let err = Batch::from_json(r#"{"create": [], "update": "nope"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBatch(_)));
    }

    #[test]
    fn batch_result_serializes_camel_case() {
        let result = BatchResult {
            create_results: vec!["a".to_string()],
            ..BatchResult::default()
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            json!({"createResults": ["a"], "updateResults": [], "deleteResults": []})
        );
    }
}
