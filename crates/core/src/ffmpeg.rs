//! FFmpeg invocation for version media.
//!
//! Each [`MediaFlavor`] has a fixed encode profile. Runs are reported as
//! structured [`EncodeReport`]s for diagnostics, but whether a flavor
//! counts as produced is decided by [`check_media`] alone: the encoder's
//! exit status never feeds into [`MediaStatus`].

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::media_status::{check_media, MediaStatus};
use crate::paths::{MediaFlavor, MediaPathSet};

/// Default encode deadline per flavor.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Bytes of stderr kept on a report.
const STDERR_TAIL_BYTES: usize = 4096;

/// Scale to 1280 wide, keeping an even height.
const SCALE_FILTER: &str = "scale=1280:trunc(ow/a/2)*2";

/// Error type for encoder setup. Failed encodes are not errors; see
/// [`EncodeReport`].
#[derive(Debug, thiserror::Error)]
pub enum FfmpegError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// How an encoder process ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProcessOutcome {
    /// Exit code (`-1` if killed by signal).
    Exited { exit_code: i32 },
    TimedOut,
    SpawnFailed { message: String },
}

/// Diagnostics from a single encoder run.
#[derive(Debug, Clone, Serialize)]
pub struct EncodeReport {
    pub flavor: MediaFlavor,
    pub output_path: PathBuf,
    #[serde(flatten)]
    pub outcome: ProcessOutcome,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
    /// Last few KiB of stderr.
    pub stderr_tail: String,
}

impl EncodeReport {
    pub fn exited_cleanly(&self) -> bool {
        self.outcome == ProcessOutcome::Exited { exit_code: 0 }
    }
}

/// Reports for all flavors plus the file-based status that follows them.
#[derive(Debug, Clone, Serialize)]
pub struct EncodeSummary {
    pub reports: Vec<EncodeReport>,
    pub status: MediaStatus,
}

/// Codec and container arguments for `flavor`, between input and output.
#[rustfmt::skip]
pub fn profile_args(flavor: MediaFlavor) -> &'static [&'static str] {
    match flavor {
        MediaFlavor::Mov => &[
            "-pix_fmt", "yuv422p10le",
            "-vcodec", "prores",
            "-profile:v", "3",
            "-vendor", "ap10",
            "-filter:v", SCALE_FILTER,
            "-acodec", "pcm_s16le",
            "-ar", "48k",
        ],
        MediaFlavor::Mp4 => &[
            "-pix_fmt", "yuv420p",
            "-vcodec", "libx264",
            "-filter:v", SCALE_FILTER,
            "-b:v", "4000k",
            "-vprofile", "high",
            "-bf", "0",
            "-strict", "experimental",
            "-acodec", "aac",
            "-ab", "160k",
            "-ac", "2",
        ],
        MediaFlavor::Webm => &[
            "-pix_fmt", "yuv420p",
            "-vcodec", "libvpx",
            "-filter:v", SCALE_FILTER,
            "-b:v", "4000k",
            "-quality", "realtime",
            "-cpu-used", "0",
            "-qmin", "10",
            "-qmax", "42",
            "-acodec", "libvorbis",
            "-aq", "60",
            "-ac", "2",
        ],
    }
}

/// Full argument list: `-y -r {fps} -i {input} {profile} -r {fps} {output}`.
pub fn encode_args(flavor: MediaFlavor, input: &Path, output: &Path, fps: f64) -> Vec<OsString> {
    let rate = fps.to_string();
    let mut args: Vec<OsString> = vec!["-y".into(), "-r".into(), rate.clone().into(), "-i".into()];
    args.push(input.as_os_str().to_owned());
    args.extend(profile_args(flavor).iter().map(OsString::from));
    args.push("-r".into());
    args.push(rate.into());
    args.push(output.as_os_str().to_owned());
    args
}

/// Runs the ffmpeg binary for each media flavor of a version.
#[derive(Debug, Clone)]
pub struct Encoder {
    pub binary: PathBuf,
    pub timeout: Duration,
}

impl Default for Encoder {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("ffmpeg"),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Encoder {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    /// Encode one flavor from the frame template in `paths`.
    pub async fn encode(&self, flavor: MediaFlavor, paths: &MediaPathSet, fps: f64) -> EncodeReport {
        let output_path = paths.path(flavor).to_path_buf();
        let args = encode_args(flavor, &paths.input_frame_template, &output_path, fps);

        let mut cmd = tokio::process::Command::new(&self.binary);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let start = Instant::now();
        tracing::info!(%flavor, output = %output_path.display(), "Encoding version media");

        let (outcome, stderr) = match cmd.spawn() {
            Err(e) => (
                ProcessOutcome::SpawnFailed {
                    message: e.to_string(),
                },
                String::new(),
            ),
            Ok(child) => match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
                Ok(Ok(output)) => (
                    ProcessOutcome::Exited {
                        exit_code: output.status.code().unwrap_or(-1),
                    },
                    String::from_utf8_lossy(&output.stderr).into_owned(),
                ),
                Ok(Err(e)) => (
                    ProcessOutcome::SpawnFailed {
                        message: e.to_string(),
                    },
                    String::new(),
                ),
                // The child is dropped with the timed-out future and killed.
                Err(_elapsed) => (ProcessOutcome::TimedOut, String::new()),
            },
        };

        let report = EncodeReport {
            flavor,
            output_path,
            outcome,
            duration_ms: start.elapsed().as_millis() as u64,
            stderr_tail: tail(&stderr, STDERR_TAIL_BYTES),
        };

        if report.exited_cleanly() {
            tracing::info!(%flavor, duration_ms = report.duration_ms, "Encoder finished");
        } else {
            tracing::warn!(%flavor, outcome = ?report.outcome, "Encoder did not exit cleanly");
        }
        report
    }

    /// Encode every flavor in turn, then report what exists on disk.
    pub async fn encode_all(&self, paths: &MediaPathSet, fps: f64) -> Result<EncodeSummary, FfmpegError> {
        for flavor in MediaFlavor::ALL {
            if let Some(dir) = paths.path(flavor).parent() {
                tokio::fs::create_dir_all(dir).await?;
            }
        }

        let mut reports = Vec::with_capacity(MediaFlavor::ALL.len());
        for flavor in MediaFlavor::ALL {
            reports.push(self.encode(flavor, paths, fps).await);
        }

        Ok(EncodeSummary {
            reports,
            status: check_media(paths),
        })
    }
}

/// The last `max_bytes` of `s`, cut on a char boundary.
fn tail(s: &str, max_bytes: usize) -> String {
    if s.len() <= max_bytes {
        return s.to_string();
    }
    let mut start = s.len() - max_bytes;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    s[start..].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_set(dir: &Path) -> MediaPathSet {
        MediaPathSet {
            input_frame_template: dir.join("frames").join("v001_%04d.exr"),
            movie_path: dir.join("preview").join("v001.mov"),
            mp4_path: dir.join("preview").join("v001_SG.mp4"),
            webm_path: dir.join("preview").join("v001_SG.webm"),
        }
    }

    #[test]
    fn args_place_rate_before_input_and_output() {
        let args = encode_args(
            MediaFlavor::Mp4,
            Path::new("/in/v_%04d.exr"),
            Path::new("/out/v_SG.mp4"),
            30.0,
        );
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(&args[..5], ["-y", "-r", "30", "-i", "/in/v_%04d.exr"]);
        assert_eq!(&args[args.len() - 3..], ["-r", "30", "/out/v_SG.mp4"]);
        assert!(args.contains(&"libx264".to_string()));
    }

    #[test]
    fn profiles_pick_expected_codecs() {
        assert!(profile_args(MediaFlavor::Mov).contains(&"prores"));
        assert!(profile_args(MediaFlavor::Mp4).contains(&"aac"));
        assert!(profile_args(MediaFlavor::Webm).contains(&"libvpx"));
        assert!(profile_args(MediaFlavor::Webm).contains(&"libvorbis"));
    }

    #[test]
    fn fractional_frame_rate_is_kept() {
        let args = encode_args(MediaFlavor::Mov, Path::new("in"), Path::new("out"), 23.976);
        assert_eq!(args[2], OsString::from("23.976"));
    }

    #[test]
    fn tail_keeps_end_of_output() {
        assert_eq!(tail("abcdef", 3), "def");
        assert_eq!(tail("abc", 10), "abc");
        assert_eq!(tail("aé", 1), "");
    }

    #[tokio::test]
    async fn missing_binary_is_reported_not_raised() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let encoder = Encoder::new(dir.path().join("no-such-ffmpeg"), Duration::from_secs(5));
        let summary = encoder
            .encode_all(&path_set(dir.path()), 24.0)
            .await
            .expect("setup succeeds");

        assert_eq!(summary.reports.len(), 3);
        assert!(summary
            .reports
            .iter()
            .all(|r| matches!(r.outcome, ProcessOutcome::SpawnFailed { .. })));
        assert_eq!(summary.status, MediaStatus::default());
        assert!(dir.path().join("preview").is_dir());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn status_follows_files_not_exit_codes() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("create temp dir");
        let script = dir.path().join("fake-ffmpeg.sh");
        // Writes the output file (last argument) and then fails.
        std::fs::write(
            &script,
            "#!/bin/sh\nfor last; do :; done\ntouch \"$last\"\necho boom >&2\nexit 3\n",
        )
        .expect("write script");
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))
            .expect("chmod script");

        let encoder = Encoder::new(&script, Duration::from_secs(10));
        let summary = encoder
            .encode_all(&path_set(dir.path()), 30.0)
            .await
            .expect("setup succeeds");

        assert!(summary.status.is_complete());
        for report in &summary.reports {
            assert_eq!(report.outcome, ProcessOutcome::Exited { exit_code: 3 });
            assert!(report.stderr_tail.contains("boom"));
        }
    }
}
