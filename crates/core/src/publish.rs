//! Version update payload for published media.
//!
//! Publication is all-or-nothing: a payload is only built when the
//! mastering movie and both web movies exist. The payload is applied by
//! the tracking store; nothing here performs I/O.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::media_status::MediaStatus;
use crate::naming::pad_frame;
use crate::paths::{MediaFlavor, MediaPathSet, MediaRoot, FRAME_PLACEHOLDER};
use crate::version::Version;

/// Status a version moves to once its media is published ("under review").
pub const STATUS_UNDER_REVIEW: &str = "rev";

/// Transcoding status flag written alongside uploaded movie links.
pub const TRANSCODING_COMPLETE: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    Local,
    Web,
}

/// A file/link field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDescriptor {
    pub name: String,
    pub content_type: String,
    pub link_type: LinkType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Maps files under the output mount to URLs of the media web server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaUrlMap {
    pub media_root: MediaRoot,
    pub url_root: String,
}

impl MediaUrlMap {
    pub fn new(media_root: MediaRoot, url_root: impl Into<String>) -> Self {
        Self {
            media_root,
            url_root: url_root.into(),
        }
    }

    /// `url_root` + the path relative to the mount, with `/` separators.
    pub fn url_for(&self, path: &Path) -> Result<String, CoreError> {
        let full = path.to_string_lossy();
        let relative = full.strip_prefix(self.media_root.trimmed()).ok_or_else(|| {
            CoreError::Validation(format!(
                "{full} is not under media root {}",
                self.media_root.path
            ))
        })?;
        if !(relative.is_empty() || relative.starts_with(['/', '\\'])) {
            return Err(CoreError::Validation(format!(
                "{full} is not under media root {}",
                self.media_root.path
            )));
        }
        let relative = relative.replace('\\', "/");
        let relative = relative.trim_start_matches('/');
        Ok(format!(
            "{}/{relative}",
            self.url_root.trim_end_matches('/')
        ))
    }
}

/// Field updates written to a version once all media exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePayload {
    pub sg_path_to_frames: String,
    pub sg_path_to_movie: String,
    pub sg_qt: LinkDescriptor,
    pub sg_uploaded_movie_mp4: LinkDescriptor,
    pub sg_uploaded_movie_webm: LinkDescriptor,
    pub sg_uploaded_movie_transcoding_status: i32,
    pub sg_status_list: String,
}

impl UpdatePayload {
    /// The payload as a field map for the store.
    pub fn to_fields(
        &self,
    ) -> Result<serde_json::Map<String, serde_json::Value>, serde_json::Error> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(serde::ser::Error::custom(format!(
                "update payload serialized to a non-object: {other}"
            ))),
        }
    }
}

/// Build the update for `version` from its media paths and their status.
///
/// Fails with [`CoreError::IncompleteMedia`] unless every flavor is present.
pub fn build_update(
    version: &Version,
    paths: &MediaPathSet,
    status: &MediaStatus,
    urls: &MediaUrlMap,
) -> Result<UpdatePayload, CoreError> {
    let missing = status.missing();
    if !missing.is_empty() {
        return Err(CoreError::IncompleteMedia { missing });
    }

    let first_frame = version.first_frame.ok_or_else(|| {
        CoreError::Validation(format!("Version {} has no first frame", version.code))
    })?;

    let frames = paths
        .input_frame_template
        .to_string_lossy()
        .replace(FRAME_PLACEHOLDER, &pad_frame(first_frame));
    let movie = paths.movie_path.to_string_lossy().into_owned();

    let local_link = LinkDescriptor {
        name: file_name(version, MediaFlavor::Mov),
        content_type: MediaFlavor::Mov.content_type().to_string(),
        link_type: LinkType::Local,
        local_path: Some(movie.clone()),
        url: None,
    };

    let web_link = |flavor: MediaFlavor| -> Result<LinkDescriptor, CoreError> {
        Ok(LinkDescriptor {
            name: file_name(version, flavor),
            content_type: flavor.content_type().to_string(),
            link_type: LinkType::Web,
            local_path: None,
            url: Some(urls.url_for(paths.path(flavor))?),
        })
    };

    Ok(UpdatePayload {
        sg_path_to_frames: frames,
        sg_path_to_movie: movie,
        sg_qt: local_link,
        sg_uploaded_movie_mp4: web_link(MediaFlavor::Mp4)?,
        sg_uploaded_movie_webm: web_link(MediaFlavor::Webm)?,
        sg_uploaded_movie_transcoding_status: TRANSCODING_COMPLETE,
        sg_status_list: STATUS_UNDER_REVIEW.to_string(),
    })
}

fn file_name(version: &Version, flavor: MediaFlavor) -> String {
    format!("{}{}", version.code, flavor.file_suffix())
}
