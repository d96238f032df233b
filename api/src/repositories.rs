#[cfg(test)]
pub mod memory;
pub mod sql;
#[cfg(test)]
pub(crate) mod testing;

use uuid::Uuid;

use crate::domains::{NewPerson, Person, ValidationFailure};

/// Closed set of failures a store adapter may report. Anything the adapter
/// cannot classify ends up in `Unavailable`.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("a person with this name already exists")]
    DuplicateName,
    #[error("refused to store invalid record: {0}")]
    Invalid(#[from] ValidationFailure),
    #[error("store unavailable: {0:#}")]
    Unavailable(#[source] anyhow::Error),
}

pub type Result<T, E = RepositoryError> = std::result::Result<T, E>;

#[async_trait::async_trait]
pub trait PeopleRepository {
    async fn find_all(&self) -> Result<Vec<Person>>;
    async fn find_one(&self, id: Uuid) -> Result<Option<Person>>;
    async fn find_by_name(&self, name: &str) -> Result<Option<Person>>;
    /// Fails with `DuplicateName` when a live record already has the name.
    /// The check and the write are atomic.
    async fn insert(&self, id: Uuid, person: &NewPerson) -> Result<Person>;
    /// Returns the updated record, or `None` when `id` does not exist.
    async fn replace(&self, id: Uuid, person: &NewPerson) -> Result<Option<Person>>;
    /// Returns whether a record was removed.
    async fn delete(&self, id: Uuid) -> Result<bool>;
    async fn count_people(&self) -> Result<i64>;
}
