#![allow(dead_code)]

use serde_json::{json, Value};
use shotver_core::entity::{Entity, EntityKind, UserLookup};
use shotver_core::version::{FrameRange, NewVersion};
use shotver_tracking::memory::InMemoryStore;
use shotver_tracking::store::{Fields, Record};
use shotver_tracking::EntityRepo;

pub fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

pub fn link(record: &Record) -> Value {
    json!({"type": record.entity_type, "id": record.id})
}

/// Seed a store with one project holding sequence `sc01` / shot `sh010`,
/// asset `character` / `MyAsset`, and user "Stu Aitken".
pub async fn seeded_store() -> InMemoryStore {
    let store = InMemoryStore::new();

    let project = store
        .insert(
            "Project",
            fields(json!({"code": "S0001", "name": "Demo", "sg_projcode": "S0001"})),
        )
        .await;
    store
        .insert(
            "Project",
            fields(json!({"code": "A0875", "name": "Other", "sg_projcode": "OTH"})),
        )
        .await;

    let sequence = store
        .insert(
            "Sequence",
            fields(json!({"code": "sc01", "project": link(&project)})),
        )
        .await;
    store
        .insert(
            "Shot",
            fields(json!({
                "code": "sh010",
                "project": link(&project),
                "sg_sequence": {"type": "Sequence", "id": sequence.id, "name": "sc01"},
            })),
        )
        .await;
    store
        .insert(
            "Asset",
            fields(json!({
                "code": "MyAsset",
                "project": link(&project),
                "sg_asset_type": "character",
            })),
        )
        .await;
    store
        .insert(
            "HumanUser",
            fields(json!({"name": "Stu Aitken", "login": "stu", "email": "stu@example.com"})),
        )
        .await;

    store
}

pub async fn shot(store: &InMemoryStore) -> Entity {
    EntityRepo::resolve(store, "S0001", EntityKind::Shot, Some("sc01"), "sh010")
        .await
        .expect("shot resolves")
}

pub fn lighting() -> NewVersion {
    NewVersion {
        version_type: "Lighting".into(),
        frame_range: FrameRange::new(1, 65).expect("valid range"),
        description: "added by tests".into(),
        user: UserLookup::Name("Stu Aitken".into()),
    }
}
