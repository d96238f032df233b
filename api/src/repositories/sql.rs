use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, Executor, PgPool};
use uuid::Uuid;

use crate::domains::{NewPerson, Person};

use super::{PeopleRepository, RepositoryError, Result};

const SCHEMA: &str = include_str!("../../sql/schema.sql");

#[derive(Clone)]
pub struct SqlPeopleRepository {
    pub(super) pool: PgPool,
}

impl SqlPeopleRepository {
    pub async fn connect(addr: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(addr)
            .await
            .context("failed to init pool")?;

        pool.execute(SCHEMA)
            .await
            .context("failed to create schema")?;

        tracing::info!(target: "store", max_connections, "connected to database");

        Ok(Self { pool })
    }
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        let is_unique_violation = err
            .as_database_error()
            .is_some_and(|err| err.is_unique_violation());

        if is_unique_violation {
            RepositoryError::DuplicateName
        } else {
            RepositoryError::Unavailable(err.into())
        }
    }
}

#[async_trait::async_trait]
impl PeopleRepository for SqlPeopleRepository {
    async fn find_all(&self) -> Result<Vec<Person>> {
        sqlx::query_as("SELECT id, name, number FROM people ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(Into::into)
    }

    async fn find_one(&self, id: Uuid) -> Result<Option<Person>> {
        sqlx::query_as("SELECT id, name, number FROM people WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Into::into)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Person>> {
        sqlx::query_as("SELECT id, name, number FROM people WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(Into::into)
    }

    async fn insert(&self, id: Uuid, person: &NewPerson) -> Result<Person> {
        person.revalidate()?;

        sqlx::query_as(
            "\
INSERT INTO people (id, name, number) \
VALUES ($1, $2, $3) \
RETURNING id, name, number\
",
        )
        .bind(id)
        .bind(&person.name)
        .bind(&person.number)
        .fetch_one(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn replace(&self, id: Uuid, person: &NewPerson) -> Result<Option<Person>> {
        person.revalidate()?;

        sqlx::query_as(
            "\
UPDATE people \
   SET name = $2, number = $3 \
 WHERE id = $1 \
RETURNING id, name, number\
",
        )
        .bind(id)
        .bind(&person.name)
        .bind(&person.number)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM people WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_people(&self) -> Result<i64> {
        let (rows,) = sqlx::query_as("SELECT COUNT(1) FROM people")
            .fetch_one(&self.pool)
            .await?;

        Ok(rows)
    }
}
