//! Domain logic for version tracking of shots, assets, and sequences.
//!
//! Everything in this crate is free of network access. The tracking
//! store lives behind a trait in `shotver-tracking`; this crate only
//! defines the records that flow through it, how versions are named,
//! where their media lives on disk, and how published media is
//! described back to the store.

pub mod entity;
pub mod error;
pub mod ffmpeg;
pub mod media_status;
pub mod naming;
pub mod paths;
pub mod publish;
pub mod types;
pub mod version;
