//! Tracking store access for version management.
//!
//! [`store::TrackingStore`] is the seam to the production-tracking
//! database. [`shotgun::ShotgunClient`] talks to a ShotGrid site over its
//! REST API and [`memory::InMemoryStore`] keeps records in process. The
//! repositories turn raw records into the typed domain of `shotver-core`.

pub mod error;
pub mod memory;
pub mod repositories;
pub mod shotgun;
pub mod store;

pub use repositories::{EntityRepo, ProjectRepo, RetryPolicy, UserRepo, VersionRepo};
