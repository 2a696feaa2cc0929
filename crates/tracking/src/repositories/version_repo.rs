//! Repository for `Version` records.
//!
//! Increments are computed read-then-write against a store with no
//! transactions, so two artists versioning the same entity at once can
//! both pick the same increment. [`VersionRepo::create`] detects that
//! after the fact: the record with the lower id keeps the increment, the
//! other is retired and the call fails with [`CoreError::Conflict`].
//! [`VersionRepo::create_with_retry`] recomputes and tries again.

use serde_json::Value;
use shotver_core::entity::Entity;
use shotver_core::error::CoreError;
use shotver_core::naming::{validate_token, version_code};
use shotver_core::publish::UpdatePayload;
use shotver_core::types::Timestamp;
use shotver_core::version::{self, NewVersion, Version};

use crate::error::{TrackingError, TrackingResult};
use crate::repositories::{ProjectRepo, UserRepo};
use crate::store::{Fields, Filter, Record, StoreError, TrackingStore};

/// Field list shared across queries.
const FIELDS: &[&str] = &[
    "id",
    "code",
    "entity",
    "project",
    "user",
    "description",
    "sg_increment",
    "sg_version_type",
    "sg_first_frame",
    "sg_last_frame",
    "frame_count",
    "sg_status_list",
    "created_at",
];

/// How many times [`VersionRepo::create_with_retry`] attempts a creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
}

impl RetryPolicy {
    /// At least one attempt is always made.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Listing, lookup, creation, and media updates of versions.
pub struct VersionRepo;

impl VersionRepo {
    // ── Lookups ──────────────────────────────────────────────────────

    /// All versions of `entity`, optionally limited to one version type.
    /// Order is whatever the store returns; empty if there are none.
    pub async fn list<S: TrackingStore>(
        store: &S,
        entity: &Entity,
        version_type: Option<&str>,
    ) -> TrackingResult<Vec<Version>> {
        let mut filters = vec![Filter::is_link("entity", &entity.link())];
        if let Some(version_type) = version_type {
            filters.push(Filter::is("sg_version_type", version_type));
        }
        let records = store.find("Version", &filters, FIELDS).await?;
        Ok(records
            .iter()
            .filter(|r| has_increment(r))
            .map(decode)
            .collect::<Result<Vec<_>, _>>()?)
    }

    /// The version of `version_type` with the highest increment.
    pub async fn latest<S: TrackingStore>(
        store: &S,
        entity: &Entity,
        version_type: &str,
    ) -> TrackingResult<Option<Version>> {
        let versions = Self::list(store, entity, Some(version_type)).await?;
        Ok(version::latest(&versions).cloned())
    }

    /// The version of `version_type` with exactly `increment`.
    pub async fn specific<S: TrackingStore>(
        store: &S,
        entity: &Entity,
        version_type: &str,
        increment: i32,
    ) -> TrackingResult<Option<Version>> {
        let versions = Self::list(store, entity, Some(version_type)).await?;
        Ok(version::specific(&versions, increment).cloned())
    }

    // ── Creation ─────────────────────────────────────────────────────

    /// Create the next version of `entity`, a single attempt.
    ///
    /// Nothing is written when the project or user lookup fails. A lost
    /// increment race retires the new record and returns
    /// [`CoreError::Conflict`].
    #[tracing::instrument(
        skip(store, entity, input),
        fields(entity = %entity.code, version_type = %input.version_type)
    )]
    pub async fn create<S: TrackingStore>(
        store: &S,
        entity: &Entity,
        input: &NewVersion,
    ) -> TrackingResult<Version> {
        validate_token("version type", &input.version_type)?;

        let project = ProjectRepo::find_by_id(store, entity.project.id)
            .await?
            .ok_or_else(|| CoreError::not_found("Project", entity.project.id.to_string()))?;

        let existing = Self::list(store, entity, Some(&input.version_type)).await?;
        let increment = version::next_increment(&existing);
        let code = version_code(&project, entity, &input.version_type, increment);

        let user = UserRepo::resolve(store, &input.user).await?;

        let mut data = Fields::new();
        data.insert("project".into(), project.link().to_value());
        data.insert("code".into(), Value::from(code.as_str()));
        data.insert("description".into(), Value::from(input.description.as_str()));
        data.insert("entity".into(), entity.link().to_value());
        data.insert("sg_version_type".into(), Value::from(input.version_type.as_str()));
        data.insert("sg_increment".into(), Value::from(increment));
        data.insert("user".into(), user.link().to_value());
        data.insert("sg_first_frame".into(), Value::from(input.frame_range.first));
        data.insert("sg_last_frame".into(), Value::from(input.frame_range.last));
        data.insert("frame_count".into(), Value::from(input.frame_range.frame_count()));

        let created = store.create("Version", &data).await?;

        let siblings = store
            .find(
                "Version",
                &[
                    Filter::is_link("entity", &entity.link()),
                    Filter::is("sg_version_type", input.version_type.as_str()),
                    Filter::is("sg_increment", increment),
                ],
                &["id"],
            )
            .await?;
        if let Some(winner) = siblings.iter().map(|r| r.id).filter(|id| *id < created.id).min() {
            tracing::warn!(
                code = %code,
                winner,
                loser = created.id,
                "Increment taken by a concurrent creation, retiring new version"
            );
            store.retire("Version", created.id).await?;
            return Err(CoreError::Conflict(format!(
                "Increment {increment} of {code} was taken by version {winner}"
            ))
            .into());
        }

        // Stores may echo back only a subset of fields on create.
        let mut fields = data;
        fields.extend(created.fields);
        let version = decode(&Record {
            entity_type: created.entity_type,
            id: created.id,
            fields,
        })?;

        tracing::info!(id = version.id, code = %version.code, "Created version");
        Ok(version)
    }

    /// [`Self::create`], recomputing the increment after each conflict.
    pub async fn create_with_retry<S: TrackingStore>(
        store: &S,
        entity: &Entity,
        input: &NewVersion,
        policy: RetryPolicy,
    ) -> TrackingResult<Version> {
        let mut attempt = 1;
        loop {
            match Self::create(store, entity, input).await {
                Err(err) if err.is_conflict() && attempt < policy.max_attempts => {
                    tracing::info!(
                        attempt,
                        max_attempts = policy.max_attempts,
                        "Retrying version creation"
                    );
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    // ── Publishing ───────────────────────────────────────────────────

    /// Write a publish payload to `version` and return the stored record.
    pub async fn apply_update<S: TrackingStore>(
        store: &S,
        version: &Version,
        payload: &UpdatePayload,
    ) -> TrackingResult<Version> {
        let fields = payload.to_fields().map_err(StoreError::from)?;
        store.update("Version", version.id, &fields).await?;

        let record = store
            .find_one("Version", &[Filter::is("id", version.id)], FIELDS)
            .await?
            .ok_or_else(|| StoreError::RecordNotFound {
                entity_type: "Version".to_string(),
                id: version.id,
            })?;

        tracing::info!(id = version.id, code = %version.code, "Published version media");
        decode(&record).map_err(TrackingError::from)
    }
}

/// Versions published by hand can lack an increment. They never take part
/// in numbering.
fn has_increment(record: &Record) -> bool {
    match record.i32_field("sg_increment") {
        Some(increment) if increment >= 1 => true,
        _ => {
            tracing::warn!(
                id = record.id,
                code = record.str_field("code").unwrap_or_default(),
                "Skipping version without a positive increment"
            );
            false
        }
    }
}

fn decode(record: &Record) -> Result<Version, StoreError> {
    let increment = record.require_i32("sg_increment")?;
    if increment < 1 {
        return Err(record.decode_error(format!("non-positive increment {increment}")));
    }

    Ok(Version {
        id: record.id,
        code: record.require_str("code")?.to_string(),
        entity: record.require_link("entity")?,
        project: record.link_field("project"),
        version_type: record.require_str("sg_version_type")?.to_string(),
        increment,
        first_frame: record.i32_field("sg_first_frame"),
        last_frame: record.i32_field("sg_last_frame"),
        frame_count: record.i32_field("frame_count"),
        description: record.str_field("description").map(str::to_string),
        user: record.link_field("user"),
        status: record.str_field("sg_status_list").map(str::to_string),
        created_at: record
            .str_field("created_at")
            .and_then(|s| s.parse::<Timestamp>().ok()),
    })
}
