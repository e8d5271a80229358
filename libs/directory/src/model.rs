//! Directory data model.

use argon2::password_hash::PasswordHash;
use argon2::{Argon2, PasswordVerifier};
use serde::Serialize;
use std::collections::HashMap;

/// One Ranger as the external directory knows them.
#[derive(Debug, Clone, Serialize)]
pub struct Person {
    pub handle: String,
    pub email: Option<String>,
    /// Argon2id PHC string. Never serialized.
    #[serde(skip)]
    pub password_hash: Option<String>,
    pub status: String,
    pub on_site: bool,
    pub directory_id: i64,
    pub positions: Vec<String>,
    pub teams: Vec<String>,
}

impl Person {
    /// Verify a login password against the stored hash. A missing or empty
    /// hash never verifies; nobody logs in as an account with no password.
    pub fn verify_password(&self, password: &str) -> bool {
        let Some(hash) = self.password_hash.as_deref() else {
            return false;
        };
        if hash.is_empty() {
            return false;
        }
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

/// A point-in-time view of the whole directory.
#[derive(Debug, Clone, Default)]
pub struct DirectorySnapshot {
    pub people: Vec<Person>,
    /// Handle (lowercased) to the position the person is currently on duty
    /// for, from open timesheet entries.
    pub on_duty: HashMap<String, String>,
}

impl DirectorySnapshot {
    pub fn person_by_handle(&self, handle: &str) -> Option<&Person> {
        self.people
            .iter()
            .find(|p| p.handle.eq_ignore_ascii_case(handle))
    }

    pub fn person_by_email(&self, email: &str) -> Option<&Person> {
        self.people.iter().find(|p| {
            p.email
                .as_deref()
                .is_some_and(|e| e.eq_ignore_ascii_case(email))
        })
    }

    /// Login lookup: handle first, then email, both case-insensitive.
    pub fn person_by_identification(&self, identification: &str) -> Option<&Person> {
        self.person_by_handle(identification)
            .or_else(|| self.person_by_email(identification))
    }

    pub fn on_duty_position(&self, handle: &str) -> Option<&str> {
        self.on_duty.get(&handle.to_lowercase()).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::password_hash::{rand_core::OsRng, SaltString};
    use argon2::PasswordHasher;

    fn person(handle: &str, email: Option<&str>, password: Option<&str>) -> Person {
        let password_hash = password.map(|p| {
            let salt = SaltString::generate(&mut OsRng);
            Argon2::default()
                .hash_password(p.as_bytes(), &salt)
                .unwrap()
                .to_string()
        });
        Person {
            handle: handle.to_string(),
            email: email.map(String::from),
            password_hash,
            status: "active".to_string(),
            on_site: true,
            directory_id: 1,
            positions: vec![],
            teams: vec![],
        }
    }

    #[test]
    fn password_verifies_against_phc_hash() {
        let p = person("Hardware", None, Some("s3cret"));
        assert!(p.verify_password("s3cret"));
        assert!(!p.verify_password("wrong"));
    }

    #[test]
    fn empty_or_missing_hash_never_verifies() {
        let mut p = person("Hardware", None, None);
        assert!(!p.verify_password(""));
        assert!(!p.verify_password("anything"));
        p.password_hash = Some(String::new());
        assert!(!p.verify_password(""));
    }

    #[test]
    fn identification_matches_handle_or_email_case_insensitively() {
        let snapshot = DirectorySnapshot {
            people: vec![person("Hardware", Some("hw@example.org"), None)],
            on_duty: HashMap::new(),
        };
        assert!(snapshot.person_by_identification("hardware").is_some());
        assert!(snapshot.person_by_identification("HW@EXAMPLE.ORG").is_some());
        assert!(snapshot.person_by_identification("nobody").is_none());
    }
}
