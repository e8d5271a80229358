//! Static directory backends for development and tests.

use crate::error::{DirectoryError, DirectoryResult};
use crate::model::{DirectorySnapshot, Person};
use crate::Directory;
use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHasher};
use async_trait::async_trait;
use std::collections::HashMap;

/// Declaration of one test user; the password is hashed at construction.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub handle: String,
    pub email: Option<String>,
    pub password: String,
    pub on_site: bool,
    pub positions: Vec<String>,
    pub teams: Vec<String>,
    pub on_duty_position: Option<String>,
}

impl TestUser {
    pub fn new(handle: &str, password: &str) -> Self {
        Self {
            handle: handle.to_string(),
            email: Some(format!("{}@example.org", handle.to_lowercase())),
            password: password.to_string(),
            on_site: true,
            positions: vec![],
            teams: vec![],
            on_duty_position: None,
        }
    }
}

/// Directory backed by a fixed user list.
pub struct TestUsersDirectory {
    snapshot: DirectorySnapshot,
}

impl TestUsersDirectory {
    pub fn new(users: Vec<TestUser>) -> DirectoryResult<Self> {
        let mut on_duty = HashMap::new();
        let mut people = Vec::with_capacity(users.len());
        for (index, user) in users.into_iter().enumerate() {
            let salt = SaltString::generate(&mut OsRng);
            let hash = Argon2::default()
                .hash_password(user.password.as_bytes(), &salt)
                .map_err(|e| DirectoryError::Hash(e.to_string()))?
                .to_string();
            if let Some(position) = user.on_duty_position {
                on_duty.insert(user.handle.to_lowercase(), position);
            }
            people.push(Person {
                handle: user.handle,
                email: user.email,
                password_hash: Some(hash),
                status: "active".to_string(),
                on_site: user.on_site,
                directory_id: (index + 1) as i64,
                positions: user.positions,
                teams: user.teams,
            });
        }
        Ok(Self {
            snapshot: DirectorySnapshot { people, on_duty },
        })
    }

    /// The stock development user set; each password equals the handle.
    pub fn with_default_users() -> DirectoryResult<Self> {
        Self::new(vec![
            TestUser {
                positions: vec!["Operator".to_string()],
                on_duty_position: Some("Operator".to_string()),
                ..TestUser::new("Hardware", "Hardware")
            },
            TestUser {
                positions: vec!["Dirt".to_string()],
                ..TestUser::new("Tulsa", "Tulsa")
            },
            TestUser {
                teams: vec!["Green Dot".to_string()],
                on_site: false,
                ..TestUser::new("Moonbeam", "Moonbeam")
            },
        ])
    }
}

#[async_trait]
impl Directory for TestUsersDirectory {
    async fn personnel(&self) -> DirectoryResult<DirectorySnapshot> {
        Ok(self.snapshot.clone())
    }
}

/// A directory with nobody in it.
pub struct NoopDirectory;

#[async_trait]
impl Directory for NoopDirectory {
    async fn personnel(&self) -> DirectoryResult<DirectorySnapshot> {
        Ok(DirectorySnapshot::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_users_log_in_with_their_handle() {
        let directory = TestUsersDirectory::with_default_users().unwrap();
        let snapshot = directory.personnel().await.unwrap();
        let hardware = snapshot.person_by_handle("hardware").unwrap();
        assert!(hardware.verify_password("Hardware"));
        assert!(!hardware.verify_password("hardware"));
        assert_eq!(snapshot.on_duty_position("Hardware"), Some("Operator"));
    }

    #[tokio::test]
    async fn noop_directory_is_empty() {
        let snapshot = NoopDirectory.personnel().await.unwrap();
        assert!(snapshot.people.is_empty());
    }
}
