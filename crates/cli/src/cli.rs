use clap::{Args, Parser, Subcommand};
use shotver_core::entity::{EntityKind, UserLookup};

/// Version bookkeeping for ShotGrid-tracked shots, assets, and sequences.
#[derive(Parser, Debug)]
#[command(name = "shotver", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve a project/container/entity triple to its record.
    Entity(EntityArgs),

    /// List versions of an entity.
    Versions {
        #[command(flatten)]
        entity: EntityArgs,
        /// Only list versions of this type.
        #[arg(long = "type", value_name = "TYPE")]
        version_type: Option<String>,
    },

    /// Show the version with the highest increment.
    Latest {
        #[command(flatten)]
        entity: EntityArgs,
        #[arg(long = "type", value_name = "TYPE")]
        version_type: String,
    },

    /// Show one version by increment.
    Show {
        #[command(flatten)]
        target: VersionArgs,
    },

    /// Create the next version of an entity.
    Create {
        #[command(flatten)]
        entity: EntityArgs,
        #[command(flatten)]
        input: CreateArgs,
    },

    /// Print the media locations of a version.
    Paths {
        #[command(flatten)]
        target: VersionArgs,
    },

    /// Check that every frame of a version exists on disk.
    CheckFrames {
        #[command(flatten)]
        target: VersionArgs,
    },

    /// Encode the preview movies of a version.
    Encode {
        #[command(flatten)]
        target: VersionArgs,
        #[arg(long, default_value_t = 25.0)]
        fps: f64,
    },

    /// Link encoded media to a version and move it to review.
    Publish {
        #[command(flatten)]
        target: VersionArgs,
    },

    /// Create a version, verify its frames, encode, and publish.
    Run {
        #[command(flatten)]
        entity: EntityArgs,
        #[command(flatten)]
        input: CreateArgs,
        #[arg(long, default_value_t = 25.0)]
        fps: f64,
    },
}

/// Identifies a tracked entity.
#[derive(Args, Debug, Clone)]
pub struct EntityArgs {
    /// Project code, e.g. `S0001`.
    #[arg(long)]
    pub project: String,
    /// shot, asset, or sequence.
    #[arg(long)]
    pub kind: EntityKind,
    /// Sequence code for shots, asset-type tag for assets.
    #[arg(long)]
    pub container: Option<String>,
    /// Entity code, e.g. `sh010`.
    #[arg(long = "entity", value_name = "CODE")]
    pub code: String,
}

/// Identifies one version of an entity. Without `--increment` the latest
/// version of the type is used.
#[derive(Args, Debug, Clone)]
pub struct VersionArgs {
    #[command(flatten)]
    pub entity: EntityArgs,
    #[arg(long = "type", value_name = "TYPE")]
    pub version_type: String,
    #[arg(long)]
    pub increment: Option<i32>,
}

#[derive(Args, Debug, Clone)]
pub struct CreateArgs {
    #[arg(long = "type", value_name = "TYPE")]
    pub version_type: String,
    #[arg(long)]
    pub first_frame: i32,
    #[arg(long)]
    pub last_frame: i32,
    #[arg(long, default_value = "")]
    pub description: String,
    /// Artist as `field=value`, with field one of id, name, login, email.
    #[arg(long, value_name = "FIELD=VALUE")]
    pub user: UserLookup,
}
