//! Repository layer for the tracking store.
//!
//! Each repository is a zero-sized struct whose associated functions take
//! the store handle explicitly. No connection state is held here.

pub mod entity_repo;
pub mod project_repo;
pub mod user_repo;
pub mod version_repo;

pub use entity_repo::EntityRepo;
pub use project_repo::ProjectRepo;
pub use user_repo::UserRepo;
pub use version_repo::{RetryPolicy, VersionRepo};
