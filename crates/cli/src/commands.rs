//! Subcommand handlers. Each prints its result to stdout as JSON.

use anyhow::{bail, Context};
use serde::Serialize;
use shotver_core::entity::Entity;
use shotver_core::error::CoreError;
use shotver_core::ffmpeg::Encoder;
use shotver_core::media_status::{check_media, missing_frames};
use shotver_core::paths::{derive_paths, MediaPathSet};
use shotver_core::publish::{build_update, MediaUrlMap, STATUS_UNDER_REVIEW};
use shotver_core::version::{FrameRange, NewVersion, Version};
use shotver_tracking::store::TrackingStore;
use shotver_tracking::{EntityRepo, ProjectRepo, VersionRepo};

use crate::cli::{Command, CreateArgs, EntityArgs, VersionArgs};
use crate::config::CliConfig;

/// Frame check result.
#[derive(Debug, Serialize)]
struct FrameReport {
    first_frame: i32,
    last_frame: i32,
    complete: bool,
    missing: Vec<i32>,
}

pub async fn dispatch<S: TrackingStore>(
    store: &S,
    config: &CliConfig,
    command: Command,
) -> anyhow::Result<()> {
    match command {
        Command::Entity(args) => print_json(&resolve(store, &args).await?),

        Command::Versions {
            entity,
            version_type,
        } => {
            let entity = resolve(store, &entity).await?;
            let mut versions = VersionRepo::list(store, &entity, version_type.as_deref()).await?;
            versions.sort_by(|a, b| {
                (a.version_type.as_str(), a.increment).cmp(&(b.version_type.as_str(), b.increment))
            });
            print_json(&versions)
        }

        Command::Latest {
            entity,
            version_type,
        } => {
            let entity = resolve(store, &entity).await?;
            let version = VersionRepo::latest(store, &entity, &version_type).await?;
            print_json(&version)
        }

        Command::Show { target } => {
            let (_, version) = select(store, &target).await?;
            print_json(&version)
        }

        Command::Create { entity, input } => {
            let entity = resolve(store, &entity).await?;
            let version =
                VersionRepo::create_with_retry(store, &entity, &new_version(input)?, config.retry)
                    .await?;
            print_json(&version)
        }

        Command::Paths { target } => {
            let (entity, version) = select(store, &target).await?;
            print_json(&paths_for(store, config, &entity, &version).await?)
        }

        Command::CheckFrames { target } => {
            let (entity, version) = select(store, &target).await?;
            let paths = paths_for(store, config, &entity, &version).await?;
            print_json(&frame_report(&version, &paths)?)
        }

        Command::Encode { target, fps } => {
            let (entity, version) = select(store, &target).await?;
            let paths = paths_for(store, config, &entity, &version).await?;
            let summary = encoder(config).encode_all(&paths, fps).await?;
            print_json(&summary)
        }

        Command::Publish { target } => {
            let (entity, version) = select(store, &target).await?;
            let paths = paths_for(store, config, &entity, &version).await?;
            let updated = publish(store, config, &version, &paths).await?;
            print_json(&updated)
        }

        Command::Run { entity, input, fps } => {
            let entity = resolve(store, &entity).await?;
            let version =
                VersionRepo::create_with_retry(store, &entity, &new_version(input)?, config.retry)
                    .await?;
            tracing::info!(code = %version.code, increment = version.increment, "Version created");

            let paths = paths_for(store, config, &entity, &version).await?;
            let frames = frame_report(&version, &paths)?;
            if !frames.complete {
                print_json(&frames)?;
                bail!(
                    "{} is missing {} frame(s), not encoding",
                    version.code,
                    frames.missing.len()
                );
            }

            let summary = encoder(config).encode_all(&paths, fps).await?;
            for report in summary.reports.iter().filter(|r| !r.exited_cleanly()) {
                tracing::warn!(flavor = %report.flavor, outcome = ?report.outcome, "Encoder reported a failure");
            }

            let updated = publish(store, config, &version, &paths).await?;
            print_json(&updated)
        }
    }
}

async fn resolve<S: TrackingStore>(store: &S, args: &EntityArgs) -> anyhow::Result<Entity> {
    Ok(EntityRepo::resolve(
        store,
        &args.project,
        args.kind,
        args.container.as_deref(),
        &args.code,
    )
    .await?)
}

/// The requested increment, or the latest version of the type.
async fn select<S: TrackingStore>(
    store: &S,
    args: &VersionArgs,
) -> anyhow::Result<(Entity, Version)> {
    let entity = resolve(store, &args.entity).await?;
    let version = match args.increment {
        Some(increment) => {
            VersionRepo::specific(store, &entity, &args.version_type, increment).await?
        }
        None => VersionRepo::latest(store, &entity, &args.version_type).await?,
    };
    let key = match args.increment {
        Some(increment) => format!("{}/{}/{increment}", entity.code, args.version_type),
        None => format!("{}/{}", entity.code, args.version_type),
    };
    let version = version.ok_or_else(|| CoreError::not_found("Version", key))?;
    Ok((entity, version))
}

async fn paths_for<S: TrackingStore>(
    store: &S,
    config: &CliConfig,
    entity: &Entity,
    version: &Version,
) -> anyhow::Result<MediaPathSet> {
    let project = ProjectRepo::find_by_id(store, entity.project.id)
        .await?
        .ok_or_else(|| CoreError::not_found("Project", entity.project.id.to_string()))?;
    Ok(derive_paths(&config.media_root, &project, entity, version))
}

fn new_version(args: CreateArgs) -> anyhow::Result<NewVersion> {
    Ok(NewVersion {
        version_type: args.version_type,
        frame_range: FrameRange::new(args.first_frame, args.last_frame)?,
        description: args.description,
        user: args.user,
    })
}

fn frame_report(version: &Version, paths: &MediaPathSet) -> anyhow::Result<FrameReport> {
    let Some(range) = version.frame_range() else {
        bail!("{} has no frame range", version.code);
    };
    let missing = missing_frames(paths, range.first, range.last);
    Ok(FrameReport {
        first_frame: range.first,
        last_frame: range.last,
        complete: missing.is_empty(),
        missing,
    })
}

fn encoder(config: &CliConfig) -> Encoder {
    Encoder::new(&config.ffmpeg_path, config.encode_timeout)
}

async fn publish<S: TrackingStore>(
    store: &S,
    config: &CliConfig,
    version: &Version,
    paths: &MediaPathSet,
) -> anyhow::Result<Version> {
    let status = check_media(paths);
    let urls = MediaUrlMap::new(config.media_root.clone(), config.media_url_root.clone());
    let payload = build_update(version, paths, &status, &urls)
        .with_context(|| format!("Cannot publish {}", version.code))?;
    Ok(VersionRepo::apply_update(store, version, &payload).await?)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
