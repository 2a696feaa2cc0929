//! Version code naming convention.
//!
//! Convention: `{project_short_code}_{container}_{entity_code}_{version_type}_{increment:03}`
//!
//! The same tokens become directory names, so each one is checked with
//! [`validate_token`] before it reaches the store or the filesystem.

use std::sync::LazyLock;

use regex::Regex;

use crate::entity::{Entity, Project};
use crate::error::CoreError;

/// Separator between version code tokens.
pub const CODE_DELIMITER: &str = "_";

/// Width of the zero-padded increment in codes and directory names.
pub const INCREMENT_WIDTH: usize = 3;

/// Width of the zero-padded frame number in frame file names.
pub const FRAME_WIDTH: usize = 4;

/// Tokens may contain letters, digits, spaces, `_`, `-` and `.`, but must
/// not start with a dot (rules out `..`) and must not contain separators.
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_\-][A-Za-z0-9 _.\-]*$").expect("valid regex")
});

/// Zero-pad an increment to [`INCREMENT_WIDTH`] digits (`1` -> `"001"`).
pub fn pad_increment(increment: i32) -> String {
    format!("{increment:0width$}", width = INCREMENT_WIDTH)
}

/// Zero-pad a frame number to [`FRAME_WIDTH`] digits (`7` -> `"0007"`).
pub fn pad_frame(frame: i32) -> String {
    format!("{frame:0width$}", width = FRAME_WIDTH)
}

/// Build the deterministic version code for `increment` of `version_type`.
///
/// ```
/// use shotver_core::entity::{Container, Entity, EntityKind, EntityLink, Project};
/// use shotver_core::naming::version_code;
///
/// let project = Project { id: 1, code: "S0001".into(), name: "Demo".into(), short_code: "S0001".into() };
/// let shot = Entity {
///     id: 10,
///     code: "sh010".into(),
///     kind: EntityKind::Shot,
///     project: EntityLink::new("Project", 1),
///     container: Container::Sequence { id: 3, name: "sc01".into() },
/// };
/// assert_eq!(version_code(&project, &shot, "Lighting", 1), "S0001_sc01_sh010_Lighting_001");
/// ```
pub fn version_code(
    project: &Project,
    entity: &Entity,
    version_type: &str,
    increment: i32,
) -> String {
    let increment = pad_increment(increment);
    [
        project.short_code.as_str(),
        entity.container_identifier(),
        entity.code.as_str(),
        version_type,
        increment.as_str(),
    ]
    .join(CODE_DELIMITER)
}

/// Reject empty tokens and tokens that could escape their path segment.
pub fn validate_token(label: &str, value: &str) -> Result<(), CoreError> {
    if TOKEN_RE.is_match(value) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "{label} '{value}' must be non-empty and contain only letters, digits, spaces, '_', '-' or '.'"
        )))
    }
}
