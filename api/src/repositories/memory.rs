use std::{
    collections::BTreeMap,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use anyhow::anyhow;
use uuid::Uuid;

use crate::domains::{NewPerson, Person};

use super::{PeopleRepository, RepositoryError, Result};

/// In-process store keyed by id. Every write takes the lock for the whole
/// check-then-write, so name uniqueness holds under concurrent callers.
#[derive(Default)]
pub struct MemoryPeopleRepository {
    inner: RwLock<BTreeMap<Uuid, Person>>,
}

impl MemoryPeopleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<Uuid, Person>>> {
        self.inner
            .read()
            .map_err(|err| RepositoryError::Unavailable(anyhow!("lock poisoned: {err}")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<Uuid, Person>>> {
        self.inner
            .write()
            .map_err(|err| RepositoryError::Unavailable(anyhow!("lock poisoned: {err}")))
    }
}

fn name_taken(people: &BTreeMap<Uuid, Person>, name: &str, except: Option<Uuid>) -> bool {
    people
        .values()
        .any(|person| person.name == name && Some(person.id) != except)
}

#[async_trait::async_trait]
impl PeopleRepository for MemoryPeopleRepository {
    async fn find_all(&self) -> Result<Vec<Person>> {
        Ok(self.read()?.values().cloned().collect())
    }

    async fn find_one(&self, id: Uuid) -> Result<Option<Person>> {
        Ok(self.read()?.get(&id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Person>> {
        Ok(self
            .read()?
            .values()
            .find(|person| person.name == name)
            .cloned())
    }

    async fn insert(&self, id: Uuid, person: &NewPerson) -> Result<Person> {
        person.revalidate()?;

        let mut people = self.write()?;
        if name_taken(&people, &person.name, None) {
            return Err(RepositoryError::DuplicateName);
        }
        if people.contains_key(&id) {
            return Err(RepositoryError::Unavailable(anyhow!("id {id} already in use")));
        }

        let person = Person {
            id,
            name: person.name.clone(),
            number: person.number.clone(),
        };
        people.insert(id, person.clone());

        Ok(person)
    }

    async fn replace(&self, id: Uuid, person: &NewPerson) -> Result<Option<Person>> {
        person.revalidate()?;

        let mut people = self.write()?;
        if !people.contains_key(&id) {
            return Ok(None);
        }
        if name_taken(&people, &person.name, Some(id)) {
            return Err(RepositoryError::DuplicateName);
        }

        let person = Person {
            id,
            name: person.name.clone(),
            number: person.number.clone(),
        };
        people.insert(id, person.clone());

        Ok(Some(person))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.write()?.remove(&id).is_some())
    }

    async fn count_people(&self) -> Result<i64> {
        Ok(self.read()?.len() as i64)
    }
}

#[cfg(test)]
mod tests {
    use crate::domains::ValidationFailure;

    use super::*;

    fn new_person(name: &str, number: &str) -> NewPerson {
        NewPerson {
            name: name.into(),
            number: number.into(),
        }
    }

    #[tokio::test]
    async fn insert_then_find() {
        let repo = MemoryPeopleRepository::new();
        let id = Uuid::now_v7();

        let inserted = repo
            .insert(id, &new_person("Arto Hellas", "040-1234556"))
            .await
            .unwrap();
        assert_eq!(inserted.id, id);

        let found = repo.find_one(id).await.unwrap().unwrap();
        assert_eq!(found.name, "Arto Hellas");
        assert_eq!(found.number, "040-1234556");

        let by_name = repo.find_by_name("Arto Hellas").await.unwrap().unwrap();
        assert_eq!(by_name.id, id);
        assert!(repo.find_by_name("arto hellas").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rejects_duplicate_names_on_insert_and_replace() {
        let repo = MemoryPeopleRepository::new();
        let ada = Uuid::now_v7();
        let dan = Uuid::now_v7();
        repo.insert(ada, &new_person("Ada", "12-345678")).await.unwrap();
        repo.insert(dan, &new_person("Dan", "12-345679")).await.unwrap();

        let err = repo
            .insert(Uuid::now_v7(), &new_person("Ada", "99-999999"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::DuplicateName));

        let err = repo
            .replace(dan, &new_person("Ada", "12-345679"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::DuplicateName));

        // keeping its own name is not a collision
        let updated = repo
            .replace(ada, &new_person("Ada", "00-000000"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.number, "00-000000");
        assert_eq!(repo.count_people().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn writes_are_validated_by_the_store() {
        let repo = MemoryPeopleRepository::new();

        let err = repo
            .insert(Uuid::now_v7(), &new_person("Al", "12-345678"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::Invalid(ValidationFailure::NameTooShort)
        ));

        let id = Uuid::now_v7();
        repo.insert(id, &new_person("Alan", "12-345678")).await.unwrap();
        let err = repo
            .replace(id, &new_person("Alan", "12345678"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::Invalid(ValidationFailure::NumberFormatInvalid)
        ));
        assert_eq!(repo.count_people().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn replace_and_delete_missing_ids() {
        let repo = MemoryPeopleRepository::new();
        let id = Uuid::now_v7();

        assert!(repo
            .replace(id, &new_person("Nobody", "12-345678"))
            .await
            .unwrap()
            .is_none());
        assert!(!repo.delete(id).await.unwrap());
    }

    #[tokio::test]
    async fn find_all_is_stable() {
        let repo = MemoryPeopleRepository::new();
        for (name, number) in [("Zed", "11-111111"), ("Amy", "22-222222"), ("Max", "33-333333")] {
            repo.insert(Uuid::now_v7(), &new_person(name, number))
                .await
                .unwrap();
        }

        let first = repo.find_all().await.unwrap();
        let second = repo.find_all().await.unwrap();
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);

        let mut names: Vec<_> = first.into_iter().map(|person| person.name).collect();
        names.sort();
        assert_eq!(names, ["Amy", "Max", "Zed"]);
    }
}
