//! Resolution of shots, assets, and sequences.
//!
//! Shots are found through their Sequence record, assets through a plain
//! asset-type tag, and sequences directly by code.

use shotver_core::entity::{Container, Entity, EntityKind, EntityLink, Project};
use shotver_core::error::CoreError;
use shotver_core::naming::validate_token;

use crate::error::TrackingResult;
use crate::repositories::ProjectRepo;
use crate::store::{Filter, Record, TrackingStore};

const FIELDS: &[&str] = &["id", "code", "project"];
const SHOT_FIELDS: &[&str] = &["id", "code", "project", "sg_sequence"];
const ASSET_FIELDS: &[&str] = &["id", "code", "project", "sg_asset_type"];

/// Resolves (project, container, code) triples to a unique entity.
pub struct EntityRepo;

impl EntityRepo {
    /// Resolve an entity of `kind` named `entity_code` in `project_code`.
    ///
    /// `container` is the Sequence code for shots and the asset-type tag
    /// for assets. Sequences are their own container and ignore it.
    ///
    /// Fails with [`CoreError::NotFound`] naming whichever of the project,
    /// sequence, or entity could not be found.
    #[tracing::instrument(skip(store))]
    pub async fn resolve<S: TrackingStore>(
        store: &S,
        project_code: &str,
        kind: EntityKind,
        container: Option<&str>,
        entity_code: &str,
    ) -> TrackingResult<Entity> {
        validate_token("project code", project_code)?;
        validate_token("entity code", entity_code)?;

        let project = ProjectRepo::find_by_code(store, project_code)
            .await?
            .ok_or_else(|| CoreError::not_found("Project", project_code))?;

        let entity = match kind {
            EntityKind::Shot => {
                let sequence_code = require_container(kind, container)?;
                Self::resolve_shot(store, &project, sequence_code, entity_code).await?
            }
            EntityKind::Asset => {
                let tag = require_container(kind, container)?;
                Self::resolve_asset(store, &project, tag, entity_code).await?
            }
            EntityKind::Sequence => Self::resolve_sequence(store, &project, entity_code).await?,
        };

        tracing::debug!(
            id = entity.id,
            container = entity.container_identifier(),
            "Resolved entity"
        );
        Ok(entity)
    }

    async fn resolve_shot<S: TrackingStore>(
        store: &S,
        project: &Project,
        sequence_code: &str,
        shot_code: &str,
    ) -> TrackingResult<Entity> {
        let sequence = store
            .find_one(
                "Sequence",
                &[
                    Filter::is_link("project", &project.link()),
                    Filter::is("code", sequence_code),
                ],
                FIELDS,
            )
            .await?
            .ok_or_else(|| {
                CoreError::not_found("Sequence", format!("{}/{sequence_code}", project.code))
            })?;

        let shot = store
            .find_one(
                "Shot",
                &[
                    Filter::is_link("project", &project.link()),
                    Filter::is("code", shot_code),
                    Filter::is_link("sg_sequence", &EntityLink::new("Sequence", sequence.id)),
                ],
                SHOT_FIELDS,
            )
            .await?
            .ok_or_else(|| {
                CoreError::not_found(
                    "Shot",
                    format!("{}/{sequence_code}/{shot_code}", project.code),
                )
            })?;

        let container = Container::Sequence {
            id: sequence.id,
            name: sequence.require_str("code")?.to_string(),
        };
        decode(&shot, EntityKind::Shot, project, container)
    }

    async fn resolve_asset<S: TrackingStore>(
        store: &S,
        project: &Project,
        tag: &str,
        asset_code: &str,
    ) -> TrackingResult<Entity> {
        let asset = store
            .find_one(
                "Asset",
                &[
                    Filter::is_link("project", &project.link()),
                    Filter::is("code", asset_code),
                    Filter::is("sg_asset_type", tag),
                ],
                ASSET_FIELDS,
            )
            .await?
            .ok_or_else(|| {
                CoreError::not_found("Asset", format!("{}/{tag}/{asset_code}", project.code))
            })?;

        let container = Container::AssetType {
            tag: tag.to_string(),
        };
        decode(&asset, EntityKind::Asset, project, container)
    }

    async fn resolve_sequence<S: TrackingStore>(
        store: &S,
        project: &Project,
        sequence_code: &str,
    ) -> TrackingResult<Entity> {
        let sequence = store
            .find_one(
                "Sequence",
                &[
                    Filter::is_link("project", &project.link()),
                    Filter::is("code", sequence_code),
                ],
                FIELDS,
            )
            .await?
            .ok_or_else(|| {
                CoreError::not_found("Sequence", format!("{}/{sequence_code}", project.code))
            })?;

        let container = Container::Sequence {
            id: sequence.id,
            name: sequence.require_str("code")?.to_string(),
        };
        decode(&sequence, EntityKind::Sequence, project, container)
    }
}

fn require_container(kind: EntityKind, container: Option<&str>) -> Result<&str, CoreError> {
    let value = container
        .ok_or_else(|| CoreError::Validation(format!("{kind} lookups need a container code")))?;
    validate_token("container code", value)?;
    Ok(value)
}

fn decode(
    record: &Record,
    kind: EntityKind,
    project: &Project,
    container: Container,
) -> TrackingResult<Entity> {
    Ok(Entity {
        id: record.id,
        code: record.require_str("code")?.to_string(),
        kind,
        project: record.link_field("project").unwrap_or_else(|| project.link()),
        container,
    })
}
