//! The tracking store seam.
//!
//! Queries are a conjunction of equality filters. Link-valued filters
//! (`{"type": .., "id": ..}`) match on type and id only.

use std::future::Future;

use serde_json::Value;
use shotver_core::entity::EntityLink;
use shotver_core::types::DbId;

/// Field name/value map of a record or payload.
pub type Fields = serde_json::Map<String, Value>;

/// Errors from a tracking store implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The store returned a non-2xx status code.
    #[error("Tracking store API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Authentication failed: {0}")]
    Auth(String),

    /// A record or response did not have the expected shape.
    #[error("Malformed {entity_type} record: {message}")]
    Decode {
        entity_type: String,
        message: String,
    },

    /// A payload could not be turned into store fields.
    #[error("Failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("{entity_type} with id {id} does not exist")]
    RecordNotFound { entity_type: String, id: DbId },
}

/// Equality predicate `[field, "is", value]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

impl Filter {
    pub fn is(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Reference-equality predicate against a linked record.
    pub fn is_link(field: impl Into<String>, link: &EntityLink) -> Self {
        Self::is(field, link.to_value())
    }

    /// The filter in array form: `["code", "is", "sh010"]`.
    pub fn to_value(&self) -> Value {
        serde_json::json!([self.field, "is", self.value])
    }

    pub fn matches(&self, record: &Record) -> bool {
        if self.field == "id" {
            return self.value.as_i64() == Some(record.id);
        }
        let Some(actual) = record.fields.get(&self.field) else {
            return self.value.is_null();
        };
        match (&self.value, actual) {
            (Value::Object(wanted), Value::Object(found)) => {
                wanted.get("type") == found.get("type") && wanted.get("id") == found.get("id")
            }
            (wanted, found) => wanted == found,
        }
    }
}

/// A record returned by the store, with link fields flattened to
/// `{"type", "id", "name"}` objects.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub entity_type: String,
    pub id: DbId,
    pub fields: Fields,
}

impl Record {
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    pub fn i32_field(&self, name: &str) -> Option<i32> {
        self.fields
            .get(name)
            .and_then(Value::as_i64)
            .and_then(|v| i32::try_from(v).ok())
    }

    pub fn link_field(&self, name: &str) -> Option<EntityLink> {
        self.fields
            .get(name)
            .filter(|v| v.is_object())
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn require_str(&self, name: &str) -> Result<&str, StoreError> {
        self.str_field(name)
            .ok_or_else(|| self.decode_error(format!("missing string field '{name}'")))
    }

    pub fn require_i32(&self, name: &str) -> Result<i32, StoreError> {
        self.i32_field(name)
            .ok_or_else(|| self.decode_error(format!("missing integer field '{name}'")))
    }

    pub fn require_link(&self, name: &str) -> Result<EntityLink, StoreError> {
        self.link_field(name)
            .ok_or_else(|| self.decode_error(format!("missing link field '{name}'")))
    }

    pub fn decode_error(&self, message: impl Into<String>) -> StoreError {
        StoreError::Decode {
            entity_type: self.entity_type.clone(),
            message: format!("id {}: {}", self.id, message.into()),
        }
    }
}

/// Generic query/mutate access to the production-tracking database.
pub trait TrackingStore: Send + Sync {
    /// All records of `entity_type` matching every filter.
    fn find(
        &self,
        entity_type: &str,
        filters: &[Filter],
        fields: &[&str],
    ) -> impl Future<Output = Result<Vec<Record>, StoreError>> + Send;

    /// The first record matching every filter, if any.
    fn find_one(
        &self,
        entity_type: &str,
        filters: &[Filter],
        fields: &[&str],
    ) -> impl Future<Output = Result<Option<Record>, StoreError>> + Send;

    /// Create a record. The store assigns the id.
    fn create(
        &self,
        entity_type: &str,
        data: &Fields,
    ) -> impl Future<Output = Result<Record, StoreError>> + Send;

    /// Overwrite the given fields of an existing record.
    fn update(
        &self,
        entity_type: &str,
        id: DbId,
        data: &Fields,
    ) -> impl Future<Output = Result<Record, StoreError>> + Send;

    /// Retire (soft-delete) a record so it no longer matches queries.
    fn retire(
        &self,
        entity_type: &str,
        id: DbId,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn shot() -> Record {
        let mut fields = Fields::new();
        fields.insert("code".into(), json!("sh010"));
        fields.insert(
            "sg_sequence".into(),
            json!({"type": "Sequence", "id": 3, "name": "sc01"}),
        );
        fields.insert("sg_cut_in".into(), json!(1001));
        Record {
            entity_type: "Shot".into(),
            id: 10,
            fields,
        }
    }

    #[test]
    fn filter_array_form() {
        assert_eq!(
            Filter::is("code", "sh010").to_value(),
            json!(["code", "is", "sh010"])
        );
    }

    #[test]
    fn link_filter_ignores_name() {
        let filter = Filter::is_link("sg_sequence", &EntityLink::new("Sequence", 3));
        assert!(filter.matches(&shot()));
        let other = Filter::is_link("sg_sequence", &EntityLink::new("Sequence", 4));
        assert!(!other.matches(&shot()));
    }

    #[test]
    fn id_filter_matches_record_id() {
        assert!(Filter::is("id", 10).matches(&shot()));
        assert!(!Filter::is("id", 11).matches(&shot()));
    }

    #[test]
    fn absent_field_only_matches_null() {
        assert!(!Filter::is("sg_status_list", "rev").matches(&shot()));
        assert!(Filter::is("sg_status_list", Value::Null).matches(&shot()));
    }

    #[test]
    fn typed_accessors() {
        let record = shot();
        assert_eq!(record.require_str("code").unwrap(), "sh010");
        assert_eq!(record.require_i32("sg_cut_in").unwrap(), 1001);
        let link = record.require_link("sg_sequence").unwrap();
        assert_eq!(link.name.as_deref(), Some("sc01"));
        assert!(record.require_str("sg_cut_in").is_err());
        assert!(record.require_link("code").is_err());
    }
}
