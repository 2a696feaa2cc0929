//! Repository for `Project` records.

use shotver_core::entity::Project;
use shotver_core::types::DbId;

use crate::error::TrackingResult;
use crate::store::{Filter, Record, StoreError, TrackingStore};

/// Field list shared across queries.
const FIELDS: &[&str] = &["id", "code", "name", "sg_projcode"];

/// Lookups of projects by code or id.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Find a project by its unique code (e.g. `A0875`).
    pub async fn find_by_code<S: TrackingStore>(
        store: &S,
        code: &str,
    ) -> TrackingResult<Option<Project>> {
        let record = store
            .find_one("Project", &[Filter::is("code", code)], FIELDS)
            .await?;
        Ok(record.as_ref().map(decode).transpose()?)
    }

    /// Find a project by id.
    pub async fn find_by_id<S: TrackingStore>(
        store: &S,
        id: DbId,
    ) -> TrackingResult<Option<Project>> {
        let record = store
            .find_one("Project", &[Filter::is("id", id)], FIELDS)
            .await?;
        Ok(record.as_ref().map(decode).transpose()?)
    }
}

fn decode(record: &Record) -> Result<Project, StoreError> {
    Ok(Project {
        id: record.id,
        code: record.require_str("code")?.to_string(),
        name: record.require_str("name")?.to_string(),
        short_code: record.require_str("sg_projcode")?.to_string(),
    })
}
