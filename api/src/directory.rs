use std::sync::Arc;

use uuid::Uuid;

use crate::{
    domains::{validate, Person, ValidationFailure},
    repositories::{PeopleRepository, RepositoryError},
};

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("malformatted id")]
    MalformedId,
    #[error("person not found")]
    NotFound,
    #[error(transparent)]
    Validation(ValidationFailure),
    #[error("name must be unique")]
    DuplicateName,
    #[error("storage unavailable")]
    StorageUnavailable(#[source] anyhow::Error),
}

impl From<RepositoryError> for DirectoryError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DuplicateName => DirectoryError::DuplicateName,
            RepositoryError::Invalid(kind) => DirectoryError::Validation(kind),
            RepositoryError::Unavailable(err) => DirectoryError::StorageUnavailable(err),
        }
    }
}

impl From<ValidationFailure> for DirectoryError {
    fn from(kind: ValidationFailure) -> Self {
        DirectoryError::Validation(kind)
    }
}

pub type Result<T, E = DirectoryError> = std::result::Result<T, E>;

#[derive(Debug, PartialEq, Eq)]
pub enum Deleted {
    Deleted,
}

/// CRUD operations over person records. Holds no state besides the store
/// handle, so clones are cheap and can be shared across requests.
#[derive(Clone)]
pub struct Directory {
    repository: Arc<dyn PeopleRepository + Send + Sync>,
}

impl Directory {
    pub fn new(repository: Arc<dyn PeopleRepository + Send + Sync>) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> Result<Vec<Person>> {
        Ok(self.repository.find_all().await?)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Person> {
        let id = parse_id(id)?;

        self.repository
            .find_one(id)
            .await?
            .ok_or(DirectoryError::NotFound)
    }

    #[tracing::instrument(skip(self))]
    pub async fn create(&self, name: Option<String>, number: Option<String>) -> Result<Person> {
        let person = validate(name, number)?;

        // Fast path only; the store's own uniqueness check is what closes
        // the race between concurrent creates.
        if self.repository.find_by_name(&person.name).await?.is_some() {
            return Err(DirectoryError::DuplicateName);
        }

        let person = self.repository.insert(Uuid::now_v7(), &person).await?;
        tracing::debug!(id = %person.id, "person created");

        Ok(person)
    }

    #[tracing::instrument(skip(self))]
    pub async fn update(
        &self,
        id: &str,
        name: Option<String>,
        number: Option<String>,
    ) -> Result<Person> {
        let id = parse_id(id)?;
        let person = match validate(name, number) {
            Ok(person) => person,
            Err(ValidationFailure::MissingField) => {
                return Err(ValidationFailure::MissingField.into())
            }
            // a missing record takes precedence over a broken name or number
            Err(kind) => match self.repository.find_one(id).await? {
                Some(_) => return Err(kind.into()),
                None => return Err(DirectoryError::NotFound),
            },
        };

        self.repository
            .replace(id, &person)
            .await?
            .ok_or(DirectoryError::NotFound)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<Deleted> {
        let id = parse_id(id)?;

        if self.repository.delete(id).await? {
            Ok(Deleted::Deleted)
        } else {
            Err(DirectoryError::NotFound)
        }
    }

    pub async fn count(&self) -> Result<i64> {
        Ok(self.repository.count_people().await?)
    }
}

fn parse_id(id: &str) -> Result<Uuid> {
    id.parse().map_err(|_| DirectoryError::MalformedId)
}
