//! Version records and the increment rules that govern them.
//!
//! For a fixed (entity, version type) pair increments run `1..=max` with no
//! gaps. A new version always takes `max + 1`; nothing here ever renumbers
//! or reuses an increment.

use serde::{Deserialize, Serialize};

use crate::entity::{EntityLink, UserLookup};
use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// A version record as stored in the tracking store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
    pub id: DbId,
    pub code: String,
    pub entity: EntityLink,
    pub project: Option<EntityLink>,
    pub version_type: String,
    pub increment: i32,
    pub first_frame: Option<i32>,
    pub last_frame: Option<i32>,
    pub frame_count: Option<i32>,
    pub description: Option<String>,
    pub user: Option<EntityLink>,
    pub status: Option<String>,
    pub created_at: Option<Timestamp>,
}

impl Version {
    pub fn frame_range(&self) -> Option<FrameRange> {
        match (self.first_frame, self.last_frame) {
            (Some(first), Some(last)) => Some(FrameRange { first, last }),
            _ => None,
        }
    }
}

/// Inclusive frame range of a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRange {
    pub first: i32,
    pub last: i32,
}

impl FrameRange {
    pub fn new(first: i32, last: i32) -> Result<Self, CoreError> {
        if last < first {
            return Err(CoreError::Validation(format!(
                "Frame range {first}-{last} ends before it starts"
            )));
        }
        if last.checked_sub(first).and_then(|d| d.checked_add(1)).is_none() {
            return Err(CoreError::Validation(format!(
                "Frame range {first}-{last} is too long"
            )));
        }
        Ok(Self { first, last })
    }

    /// `last - first + 1`, saturating at `i32::MAX` for ranges not built
    /// through [`FrameRange::new`].
    pub fn frame_count(&self) -> i32 {
        let count = i64::from(self.last) - i64::from(self.first) + 1;
        i32::try_from(count).unwrap_or(i32::MAX)
    }
}

/// Input for creating the next version of an entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVersion {
    pub version_type: String,
    pub frame_range: FrameRange,
    pub description: String,
    pub user: UserLookup,
}

/// The version with the highest increment, if any.
pub fn latest(versions: &[Version]) -> Option<&Version> {
    versions.iter().max_by_key(|v| v.increment)
}

/// The version whose increment equals `increment`, if any.
pub fn specific(versions: &[Version], increment: i32) -> Option<&Version> {
    versions.iter().find(|v| v.increment == increment)
}

/// `max(increments) + 1`, or `1` when there are no versions yet.
pub fn next_increment(versions: &[Version]) -> i32 {
    latest(versions).map_or(1, |v| v.increment + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(id: DbId, increment: i32) -> Version {
        Version {
            id,
            code: format!("STU_sc01_sh010_Lighting_{increment:03}"),
            entity: EntityLink::new("Shot", 10),
            project: None,
            version_type: "Lighting".into(),
            increment,
            first_frame: Some(1),
            last_frame: Some(65),
            frame_count: Some(65),
            description: None,
            user: None,
            status: None,
            created_at: None,
        }
    }

    #[test]
    fn latest_is_max_increment_regardless_of_order() {
        let versions = vec![version(1, 2), version(2, 5), version(3, 1)];
        assert_eq!(latest(&versions).map(|v| v.increment), Some(5));
    }

    #[test]
    fn latest_of_empty_is_none() {
        assert!(latest(&[]).is_none());
    }

    #[test]
    fn specific_finds_exact_increment() {
        let versions = vec![version(1, 1), version(2, 2)];
        assert_eq!(specific(&versions, 2).map(|v| v.id), Some(2));
        assert!(specific(&versions, 3).is_none());
    }

    #[test]
    fn next_increment_starts_at_one() {
        assert_eq!(next_increment(&[]), 1);
        assert_eq!(next_increment(&[version(1, 1), version(2, 2)]), 3);
    }

    #[test]
    fn frame_range_counts_inclusively() {
        let range = FrameRange::new(1, 65).unwrap();
        assert_eq!(range.frame_count(), 65);
        assert_eq!(FrameRange::new(1001, 1001).unwrap().frame_count(), 1);
    }

    #[test]
    fn frame_range_rejects_reversed() {
        assert!(FrameRange::new(10, 9).is_err());
    }

    #[test]
    fn frame_range_rejects_count_overflow() {
        assert!(FrameRange::new(i32::MIN, i32::MAX).is_err());
        assert!(FrameRange::new(-1, i32::MAX).is_err());
        assert_eq!(FrameRange::new(0, i32::MAX - 1).unwrap().frame_count(), i32::MAX);

        let unchecked = FrameRange {
            first: i32::MIN,
            last: i32::MAX,
        };
        assert_eq!(unchecked.frame_count(), i32::MAX);
    }
}
