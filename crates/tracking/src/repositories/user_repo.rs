//! Repository for `HumanUser` records.

use shotver_core::entity::{UserLookup, UserRef};
use shotver_core::error::CoreError;

use crate::error::TrackingResult;
use crate::store::{Filter, Record, TrackingStore};

const FIELDS: &[&str] = &["id", "name", "login", "email"];

/// Resolves users by one uniquely valued field.
pub struct UserRepo;

impl UserRepo {
    /// Resolve `lookup` to exactly one user.
    ///
    /// Fails with [`CoreError::NotFound`] when no user, or more than one,
    /// matches.
    #[tracing::instrument(skip(store))]
    pub async fn resolve<S: TrackingStore>(
        store: &S,
        lookup: &UserLookup,
    ) -> TrackingResult<UserRef> {
        let filter = Filter::is(lookup.field(), lookup.value());
        let mut matches = store.find("HumanUser", &[filter], FIELDS).await?;

        if matches.len() != 1 {
            if matches.len() > 1 {
                tracing::warn!(count = matches.len(), "User lookup is ambiguous");
            }
            return Err(CoreError::not_found("HumanUser", lookup.to_string()).into());
        }

        Ok(decode(&matches.remove(0)))
    }
}

fn decode(record: &Record) -> UserRef {
    UserRef {
        id: record.id,
        name: record.str_field("name").map(str::to_string),
        login: record.str_field("login").map(str::to_string),
    }
}
