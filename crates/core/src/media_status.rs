//! Existence checks for rendered frames and encoded media.
//!
//! Status is derived from files on disk only. An encoder run that exits
//! non-zero but still leaves a file behind counts as present.

use serde::{Deserialize, Serialize};

use crate::paths::{MediaFlavor, MediaPathSet};

/// Existence of each encoded output of a version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaStatus {
    pub mov: bool,
    pub mp4: bool,
    pub webm: bool,
}

impl MediaStatus {
    pub fn get(&self, flavor: MediaFlavor) -> bool {
        match flavor {
            MediaFlavor::Mov => self.mov,
            MediaFlavor::Mp4 => self.mp4,
            MediaFlavor::Webm => self.webm,
        }
    }

    pub fn set(&mut self, flavor: MediaFlavor, present: bool) {
        match flavor {
            MediaFlavor::Mov => self.mov = present,
            MediaFlavor::Mp4 => self.mp4 = present,
            MediaFlavor::Webm => self.webm = present,
        }
    }

    /// Flavors whose file is absent, in [`MediaFlavor::ALL`] order.
    pub fn missing(&self) -> Vec<MediaFlavor> {
        MediaFlavor::ALL
            .into_iter()
            .filter(|f| !self.get(*f))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.mov && self.mp4 && self.webm
    }
}

/// `true` iff every frame in `first..=last` exists on disk.
pub fn check_frames(paths: &MediaPathSet, first_frame: i32, last_frame: i32) -> bool {
    (first_frame..=last_frame).all(|frame| paths.frame_path(frame).exists())
}

/// Frame numbers in `first..=last` with no file on disk.
pub fn missing_frames(paths: &MediaPathSet, first_frame: i32, last_frame: i32) -> Vec<i32> {
    (first_frame..=last_frame)
        .filter(|frame| !paths.frame_path(*frame).exists())
        .collect()
}

/// Existence of each encoded output. The frame template is an input and is
/// not part of the result.
pub fn check_media(paths: &MediaPathSet) -> MediaStatus {
    let mut status = MediaStatus::default();
    for flavor in MediaFlavor::ALL {
        let present = paths.path(flavor).exists();
        tracing::debug!(%flavor, path = %paths.path(flavor).display(), present, "Checked media file");
        status.set(flavor, present);
    }
    status
}
