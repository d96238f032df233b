use anyhow::anyhow;
use uuid::Uuid;

use crate::domains::{NewPerson, Person};

use super::{PeopleRepository, RepositoryError, Result};

/// A store whose connection is gone: every call fails.
pub struct UnavailableRepository;

fn refused() -> RepositoryError {
    RepositoryError::Unavailable(anyhow!("connection refused"))
}

#[async_trait::async_trait]
impl PeopleRepository for UnavailableRepository {
    async fn find_all(&self) -> Result<Vec<Person>> {
        Err(refused())
    }

    async fn find_one(&self, _: Uuid) -> Result<Option<Person>> {
        Err(refused())
    }

    async fn find_by_name(&self, _: &str) -> Result<Option<Person>> {
        Err(refused())
    }

    async fn insert(&self, _: Uuid, _: &NewPerson) -> Result<Person> {
        Err(refused())
    }

    async fn replace(&self, _: Uuid, _: &NewPerson) -> Result<Option<Person>> {
        Err(refused())
    }

    async fn delete(&self, _: Uuid) -> Result<bool> {
        Err(refused())
    }

    async fn count_people(&self) -> Result<i64> {
        Err(refused())
    }
}
