//! Filesystem layout of version media.
//!
//! ```text
//! {root}/{project.code}_{project.name}/output/{kind}/{container}/{entity}/{version_type}/{increment:03}/
//!   frames/{version.code}_%04d.exr
//!   preview/{version.code}.mov
//!   preview/{version.code}_SG.mp4
//!   preview/{version.code}_SG.webm
//! ```
//!
//! Derivation is a pure string computation. The separator comes from the
//! injected [`MediaRoot`], not from the host, so Windows layouts can be
//! computed (and tested) anywhere.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::entity::{Entity, Project};
use crate::naming::{pad_frame, pad_increment};
use crate::version::Version;

/// Placeholder for the frame number inside the frame template.
pub const FRAME_PLACEHOLDER: &str = "%04d";

/// Directory holding rendered frames.
pub const FRAMES_DIR: &str = "frames";

/// Directory holding encoded movies.
pub const PREVIEW_DIR: &str = "preview";

/// Fixed segment between the project directory and the entity kind.
pub const OUTPUT_DIR: &str = "output";

/// One of the three encoded outputs of a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaFlavor {
    /// ProRes mastering movie.
    Mov,
    /// H.264 web movie.
    Mp4,
    /// VP8 web movie.
    Webm,
}

impl MediaFlavor {
    pub const ALL: [MediaFlavor; 3] = [Self::Mov, Self::Mp4, Self::Webm];

    pub fn key(self) -> &'static str {
        match self {
            Self::Mov => "mov",
            Self::Mp4 => "mp4",
            Self::Webm => "webm",
        }
    }

    /// Suffix appended to the version code to form the file name.
    pub fn file_suffix(self) -> &'static str {
        match self {
            Self::Mov => ".mov",
            Self::Mp4 => "_SG.mp4",
            Self::Webm => "_SG.webm",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Mov => "video/quicktime",
            Self::Mp4 => "video/mp4",
            Self::Webm => "video/webm",
        }
    }
}

impl fmt::Display for MediaFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Separator convention of the output mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathStyle {
    Posix,
    Windows,
}

impl PathStyle {
    pub fn host() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Posix
        }
    }

    pub fn separator(self) -> char {
        match self {
            Self::Posix => '/',
            Self::Windows => '\\',
        }
    }
}

/// Root of the output mount plus the separator convention it uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRoot {
    pub path: String,
    pub style: PathStyle,
}

impl MediaRoot {
    pub fn new(path: impl Into<String>, style: PathStyle) -> Self {
        Self {
            path: path.into(),
            style,
        }
    }

    /// The studio default mount for the host OS: `X:` on Windows,
    /// `/Volumes/output` elsewhere.
    pub fn host_default() -> Self {
        match PathStyle::host() {
            PathStyle::Windows => Self::new("X:", PathStyle::Windows),
            PathStyle::Posix => Self::new("/Volumes/output", PathStyle::Posix),
        }
    }

    /// Root with any trailing separators removed.
    pub fn trimmed(&self) -> &str {
        self.path.trim_end_matches(['/', '\\'])
    }

    fn join<'a>(&'a self, segments: impl IntoIterator<Item = &'a str>) -> String {
        let sep = self.style.separator().to_string();
        std::iter::once(self.trimmed())
            .chain(segments)
            .collect::<Vec<_>>()
            .join(&sep)
    }
}

/// Canonical media locations of a single version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaPathSet {
    /// Frame sequence template containing [`FRAME_PLACEHOLDER`].
    pub input_frame_template: PathBuf,
    pub movie_path: PathBuf,
    pub mp4_path: PathBuf,
    pub webm_path: PathBuf,
}

impl MediaPathSet {
    pub fn path(&self, flavor: MediaFlavor) -> &Path {
        match flavor {
            MediaFlavor::Mov => &self.movie_path,
            MediaFlavor::Mp4 => &self.mp4_path,
            MediaFlavor::Webm => &self.webm_path,
        }
    }

    /// The file of a single frame, with its number padded to four digits.
    pub fn frame_path(&self, frame: i32) -> PathBuf {
        let template = self.input_frame_template.to_string_lossy();
        PathBuf::from(template.replace(FRAME_PLACEHOLDER, &pad_frame(frame)))
    }
}

/// Map an entity version to its media locations under `root`.
pub fn derive_paths(
    root: &MediaRoot,
    project: &Project,
    entity: &Entity,
    version: &Version,
) -> MediaPathSet {
    let project_dir = project.directory_name();
    let increment = pad_increment(version.increment);
    let segments = [
        project_dir.as_str(),
        OUTPUT_DIR,
        entity.kind.as_str(),
        entity.container_identifier(),
        entity.code.as_str(),
        version.version_type.as_str(),
        increment.as_str(),
    ];

    let frame_name = format!("{}_{FRAME_PLACEHOLDER}.exr", version.code);
    let frames = root.join(segments.iter().copied().chain([FRAMES_DIR, frame_name.as_str()]));

    let media_file = |flavor: MediaFlavor| {
        let name = format!("{}{}", version.code, flavor.file_suffix());
        PathBuf::from(root.join(segments.iter().copied().chain([PREVIEW_DIR, name.as_str()])))
    };

    MediaPathSet {
        input_frame_template: PathBuf::from(frames),
        movie_path: media_file(MediaFlavor::Mov),
        mp4_path: media_file(MediaFlavor::Mp4),
        webm_path: media_file(MediaFlavor::Webm),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Container, EntityKind, EntityLink};

    fn project() -> Project {
        Project {
            id: 1,
            code: "P1".into(),
            name: "Proj".into(),
            short_code: "S0001".into(),
        }
    }

    fn shot() -> Entity {
        Entity {
            id: 10,
            code: "sh010".into(),
            kind: EntityKind::Shot,
            project: EntityLink::new("Project", 1),
            container: Container::Sequence {
                id: 3,
                name: "sc01".into(),
            },
        }
    }

    fn version(increment: i32) -> Version {
        Version {
            id: 100,
            code: format!("S0001_sc01_sh010_Lighting_{increment:03}"),
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
    fn posix_layout() {
        let root = MediaRoot::new("/Volumes/output", PathStyle::Posix);
        let paths = derive_paths(&root, &project(), &shot(), &version(1));
        assert_eq!(
            paths.movie_path,
            PathBuf::from(
                "/Volumes/output/P1_Proj/output/Shot/sc01/sh010/Lighting/001/preview/S0001_sc01_sh010_Lighting_001.mov"
            )
        );
        assert_eq!(
            paths.mp4_path,
            PathBuf::from(
                "/Volumes/output/P1_Proj/output/Shot/sc01/sh010/Lighting/001/preview/S0001_sc01_sh010_Lighting_001_SG.mp4"
            )
        );
        assert_eq!(
            paths.webm_path,
            PathBuf::from(
                "/Volumes/output/P1_Proj/output/Shot/sc01/sh010/Lighting/001/preview/S0001_sc01_sh010_Lighting_001_SG.webm"
            )
        );
        assert_eq!(
            paths.input_frame_template,
            PathBuf::from(
                "/Volumes/output/P1_Proj/output/Shot/sc01/sh010/Lighting/001/frames/S0001_sc01_sh010_Lighting_001_%04d.exr"
            )
        );
    }

    #[test]
    fn windows_layout() {
        let root = MediaRoot::new("X:", PathStyle::Windows);
        let paths = derive_paths(&root, &project(), &shot(), &version(1));
        assert_eq!(
            paths.movie_path.to_string_lossy(),
            r"X:\P1_Proj\output\Shot\sc01\sh010\Lighting\001\preview\S0001_sc01_sh010_Lighting_001.mov"
        );
    }

    #[test]
    fn trailing_separator_on_root_is_ignored() {
        let a = MediaRoot::new("/Volumes/output/", PathStyle::Posix);
        let b = MediaRoot::new("/Volumes/output", PathStyle::Posix);
        assert_eq!(
            derive_paths(&a, &project(), &shot(), &version(1)),
            derive_paths(&b, &project(), &shot(), &version(1))
        );
    }

    #[test]
    fn asset_uses_type_tag_segment() {
        let asset = Entity {
            id: 20,
            code: "MyAsset".into(),
            kind: EntityKind::Asset,
            project: EntityLink::new("Project", 1),
            container: Container::AssetType {
                tag: "character".into(),
            },
        };
        let mut v = version(3);
        v.version_type = "Model".into();
        v.code = "S0001_character_MyAsset_Model_003".into();
        let root = MediaRoot::new("/Volumes/output", PathStyle::Posix);
        let paths = derive_paths(&root, &project(), &asset, &v);
        assert_eq!(
            paths.movie_path,
            PathBuf::from(
                "/Volumes/output/P1_Proj/output/Asset/character/MyAsset/Model/003/preview/S0001_character_MyAsset_Model_003.mov"
            )
        );
    }

    #[test]
    fn derivation_is_deterministic() {
        let root = MediaRoot::new("/Volumes/output", PathStyle::Posix);
        assert_eq!(
            derive_paths(&root, &project(), &shot(), &version(4)),
            derive_paths(&root, &project(), &shot(), &version(4))
        );
    }

    #[test]
    fn increment_only_changes_increment_segment_and_file_name() {
        let root = MediaRoot::new("/Volumes/output", PathStyle::Posix);
        let one = derive_paths(&root, &project(), &shot(), &version(1));
        let two = derive_paths(&root, &project(), &shot(), &version(2));
        let expected = one
            .movie_path
            .to_string_lossy()
            .replace("/001/", "/002/")
            .replace("_001.mov", "_002.mov");
        assert_eq!(two.movie_path.to_string_lossy(), expected);
        assert_eq!(
            two.mp4_path.to_string_lossy(),
            one.mp4_path
                .to_string_lossy()
                .replace("/001/", "/002/")
                .replace("_001_SG", "_002_SG")
        );
    }

    #[test]
    fn frame_path_pads_to_four_digits() {
        let root = MediaRoot::new("/Volumes/output", PathStyle::Posix);
        let paths = derive_paths(&root, &project(), &shot(), &version(1));
        assert!(paths
            .frame_path(7)
            .to_string_lossy()
            .ends_with("frames/S0001_sc01_sh010_Lighting_001_0007.exr"));
    }

    #[test]
    fn flavor_file_names() {
        assert_eq!(MediaFlavor::Mov.file_suffix(), ".mov");
        assert_eq!(MediaFlavor::Mp4.file_suffix(), "_SG.mp4");
        assert_eq!(MediaFlavor::Webm.content_type(), "video/webm");
    }
}
