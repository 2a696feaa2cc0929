//! Projects, tracked entities, and the containers they live in.
//!
//! Shots hang off a Sequence record, assets carry a plain asset-type tag,
//! and a Sequence is its own container. [`Entity::container_identifier`]
//! hides that difference from naming and path derivation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

/// Kind of tracked entity a version can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Shot,
    Asset,
    Sequence,
}

impl EntityKind {
    /// The entity type name used by the tracking store.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Shot => "Shot",
            Self::Asset => "Asset",
            Self::Sequence => "Sequence",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = CoreError;

    /// Accepts the store type name in any ASCII case (`Shot`, `shot`, `SHOT`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "shot" => Ok(Self::Shot),
            "asset" => Ok(Self::Asset),
            "sequence" => Ok(Self::Sequence),
            _ => Err(CoreError::InvalidEntityKind(s.to_string())),
        }
    }
}

/// A reference to another record, as embedded in link fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityLink {
    #[serde(rename = "type")]
    pub entity_type: String,
    pub id: DbId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl EntityLink {
    pub fn new(entity_type: impl Into<String>, id: DbId) -> Self {
        Self {
            entity_type: entity_type.into(),
            id,
            name: None,
        }
    }

    /// The link in the shape the store expects inside filters and payloads.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({ "type": self.entity_type, "id": self.id })
    }
}

/// A project, looked up by its unique `code`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: DbId,
    pub code: String,
    /// Display name.
    pub name: String,
    /// Short code used as the first token of version codes (e.g. `STU`).
    pub short_code: String,
}

impl Project {
    /// Directory name of the project under the output root: `{code}_{name}`.
    pub fn directory_name(&self) -> String {
        format!("{}_{}", self.code, self.name)
    }

    pub fn link(&self) -> EntityLink {
        EntityLink::new("Project", self.id)
    }
}

/// Where an entity sits inside its project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Container {
    /// A Sequence record (shots and sequences).
    Sequence { id: DbId, name: String },
    /// A free-form asset type tag such as `character` or `prop`.
    AssetType { tag: String },
}

impl Container {
    pub fn identifier(&self) -> &str {
        match self {
            Self::Sequence { name, .. } => name,
            Self::AssetType { tag } => tag,
        }
    }
}

/// A resolved shot, asset, or sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: DbId,
    pub code: String,
    pub kind: EntityKind,
    pub project: EntityLink,
    pub container: Container,
}

impl Entity {
    /// Sequence name for shots and sequences, asset-type tag for assets.
    pub fn container_identifier(&self) -> &str {
        self.container.identifier()
    }

    pub fn link(&self) -> EntityLink {
        EntityLink::new(self.kind.as_str(), self.id)
    }
}

/// A resolved HumanUser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: DbId,
    pub name: Option<String>,
    pub login: Option<String>,
}

impl UserRef {
    pub fn link(&self) -> EntityLink {
        EntityLink::new("HumanUser", self.id)
    }
}

/// One uniquely valued HumanUser field to look a user up by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum UserLookup {
    Id(DbId),
    Name(String),
    Login(String),
    Email(String),
}

impl UserLookup {
    /// Store field name the lookup filters on.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Id(_) => "id",
            Self::Name(_) => "name",
            Self::Login(_) => "login",
            Self::Email(_) => "email",
        }
    }

    pub fn value(&self) -> serde_json::Value {
        match self {
            Self::Id(id) => serde_json::Value::from(*id),
            Self::Name(v) | Self::Login(v) | Self::Email(v) => serde_json::Value::from(v.as_str()),
        }
    }
}

impl fmt::Display for UserLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.field(), self.value())
    }
}

/// Parses `field=value`, e.g. `login=stu` or `name=Stu Aitken`.
impl FromStr for UserLookup {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((field, value)) = s.split_once('=') else {
            return Err(CoreError::Validation(format!(
                "User lookup must be field=value, got '{s}'"
            )));
        };
        let value = value.trim();
        if value.is_empty() {
            return Err(CoreError::Validation(format!("User lookup '{s}' has no value")));
        }
        match field.trim().to_ascii_lowercase().as_str() {
            "id" => value
                .parse()
                .map(Self::Id)
                .map_err(|_| CoreError::Validation(format!("User id must be an integer, got '{value}'"))),
            "name" => Ok(Self::Name(value.to_string())),
            "login" => Ok(Self::Login(value.to_string())),
            "email" => Ok(Self::Email(value.to_string())),
            other => Err(CoreError::Validation(format!(
                "Unknown user lookup field '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn kind_parses_any_case() {
        assert_eq!("Shot".parse::<EntityKind>().unwrap(), EntityKind::Shot);
        assert_eq!("shot".parse::<EntityKind>().unwrap(), EntityKind::Shot);
        assert_eq!("ASSET".parse::<EntityKind>().unwrap(), EntityKind::Asset);
        assert_eq!(
            "sequence".parse::<EntityKind>().unwrap(),
            EntityKind::Sequence
        );
    }

    #[test]
    fn user_lookup_parses_field_value() {
        assert_eq!(
            "name=Stu Aitken".parse::<UserLookup>().unwrap(),
            UserLookup::Name("Stu Aitken".into())
        );
        assert_eq!("login=stu".parse::<UserLookup>().unwrap(), UserLookup::Login("stu".into()));
        assert_eq!("ID=42".parse::<UserLookup>().unwrap(), UserLookup::Id(42));
        assert_matches!("stu".parse::<UserLookup>(), Err(CoreError::Validation(_)));
        assert_matches!("id=abc".parse::<UserLookup>(), Err(CoreError::Validation(_)));
        assert_matches!("phone=123".parse::<UserLookup>(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn kind_rejects_unknown() {
        assert_matches!(
            "Camera".parse::<EntityKind>(),
            Err(CoreError::InvalidEntityKind(k)) if k == "Camera"
        );
    }

    #[test]
    fn container_identifier_per_kind() {
        let shot = Container::Sequence {
            id: 4,
            name: "sc01".into(),
        };
        let asset = Container::AssetType {
            tag: "character".into(),
        };
        assert_eq!(shot.identifier(), "sc01");
        assert_eq!(asset.identifier(), "character");
    }

    #[test]
    fn project_directory_name() {
        let project = Project {
            id: 1,
            code: "P1".into(),
            name: "Proj".into(),
            short_code: "S0001".into(),
        };
        assert_eq!(project.directory_name(), "P1_Proj");
    }

    #[test]
    fn link_value_omits_name() {
        let mut link = EntityLink::new("Sequence", 9);
        link.name = Some("sc01".into());
        assert_eq!(
            link.to_value(),
            serde_json::json!({"type": "Sequence", "id": 9})
        );
    }

    #[test]
    fn user_lookup_field_and_value() {
        let by_email = UserLookup::Email("stu@example.com".into());
        assert_eq!(by_email.field(), "email");
        assert_eq!(by_email.value(), serde_json::json!("stu@example.com"));
        assert_eq!(UserLookup::Id(37).value(), serde_json::json!(37));
    }
}
