//! Clubhouse-backed directory.
//!
//! Reads the external Ranger Clubhouse MySQL database. This connection is
//! read-only and entirely separate from the IMS store.

use crate::error::DirectoryResult;
use crate::model::{DirectorySnapshot, Person};
use crate::Directory;
use async_trait::async_trait;
use sea_orm::{
    ConnectOptions, Database, DatabaseConnection, FromQueryResult, Statement,
};
use std::collections::HashMap;

/// Statuses whose holders may appear in the IMS.
const VISIBLE_STATUSES: &str = "'active', 'inactive', 'inactive extension', 'auditor', 'vintage'";

#[derive(Debug, FromQueryResult)]
struct PersonRow {
    id: i64,
    callsign: String,
    email: Option<String>,
    password: Option<String>,
    status: String,
    on_site: bool,
}

#[derive(Debug, FromQueryResult)]
struct MembershipRow {
    person_id: i64,
    title: String,
}

pub struct ClubhouseDirectory {
    db: DatabaseConnection,
}

impl ClubhouseDirectory {
    pub async fn connect(url: &str) -> DirectoryResult<Self> {
        let mut options = ConnectOptions::new(url.to_string());
        options.max_connections(5);
        let db = Database::connect(options).await?;
        Ok(Self { db })
    }

    async fn fetch_all<R: FromQueryResult>(&self, sql: &str) -> DirectoryResult<Vec<R>> {
        let stmt = Statement::from_string(self.db.get_database_backend(), sql);
        Ok(R::find_by_statement(stmt).all(&self.db).await?)
    }
}

#[async_trait]
impl Directory for ClubhouseDirectory {
    async fn personnel(&self) -> DirectoryResult<DirectorySnapshot> {
        let people: Vec<PersonRow> = self
            .fetch_all(&format!(
                "SELECT id, callsign, email, password, status, on_site \
                 FROM person WHERE status IN ({VISIBLE_STATUSES})"
            ))
            .await?;

        let positions: Vec<MembershipRow> = self
            .fetch_all(
                "SELECT pp.person_id, p.title FROM position p \
                 JOIN person_position pp ON pp.position_id = p.id",
            )
            .await?;

        let teams: Vec<MembershipRow> = self
            .fetch_all(
                "SELECT pt.person_id, t.title FROM team t \
                 JOIN person_team pt ON pt.team_id = t.id",
            )
            .await?;

        // Open timesheet rows are the people currently on duty.
        let on_duty_rows: Vec<MembershipRow> = self
            .fetch_all(
                "SELECT ts.person_id, p.title FROM timesheet ts \
                 JOIN position p ON p.id = ts.position_id \
                 WHERE ts.on_duty IS NOT NULL AND ts.off_duty IS NULL",
            )
            .await?;

        let mut positions_by_person: HashMap<i64, Vec<String>> = HashMap::new();
        for row in positions {
            positions_by_person.entry(row.person_id).or_default().push(row.title);
        }
        let mut teams_by_person: HashMap<i64, Vec<String>> = HashMap::new();
        for row in teams {
            teams_by_person.entry(row.person_id).or_default().push(row.title);
        }
        let on_duty_by_person: HashMap<i64, String> = on_duty_rows
            .into_iter()
            .map(|row| (row.person_id, row.title))
            .collect();

        let mut on_duty = HashMap::new();
        let people = people
            .into_iter()
            .map(|row| {
                if let Some(position) = on_duty_by_person.get(&row.id) {
                    on_duty.insert(row.callsign.to_lowercase(), position.clone());
                }
                Person {
                    handle: row.callsign,
                    email: row.email,
                    password_hash: row.password,
                    status: row.status,
                    on_site: row.on_site,
                    directory_id: row.id,
                    positions: positions_by_person.remove(&row.id).unwrap_or_default(),
                    teams: teams_by_person.remove(&row.id).unwrap_or_default(),
                }
            })
            .collect();

        Ok(DirectorySnapshot { people, on_duty })
    }
}
