//! Incident type vocabulary.

use crate::error::{StoreError, StoreResult};
use crate::rows::IncidentTypeRow;
use crate::{exec, fetch_all, Store};

impl Store {
    /// The visible vocabulary, or everything when `include_hidden`.
    pub async fn incident_types(&self, include_hidden: bool) -> StoreResult<Vec<IncidentTypeRow>> {
        if include_hidden {
            fetch_all(
                self.connection(),
                "incident_types_all",
                "SELECT id, name, hidden FROM incident_type ORDER BY name",
                vec![],
            )
            .await
        } else {
            fetch_all(
                self.connection(),
                "incident_types_visible",
                "SELECT id, name, hidden FROM incident_type WHERE hidden = ? ORDER BY name",
                vec![false.into()],
            )
            .await
        }
    }

    pub async fn create_incident_type(&self, name: &str) -> StoreResult<()> {
        let result = exec(
            self.connection(),
            "create_incident_type",
            "INSERT INTO incident_type (name, hidden) VALUES (?, ?)",
            vec![name.into(), false.into()],
        )
        .await;
        match result {
            Ok(_) => Ok(()),
            Err(StoreError::Db(e)) if e.to_string().to_lowercase().contains("unique") => {
                Err(StoreError::DuplicateName(name.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Hiding removes a type from the visible vocabulary without deleting it.
    pub async fn set_incident_type_hidden(&self, name: &str, hidden: bool) -> StoreResult<()> {
        exec(
            self.connection(),
            "set_incident_type_hidden",
            "UPDATE incident_type SET hidden = ? WHERE name = ?",
            vec![hidden.into(), name.into()],
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::Store;

    #[tokio::test]
    async fn hidden_types_stay_in_the_full_listing() {
        let store = Store::connect_fake().await.unwrap();
        store.create_incident_type("Medical").await.unwrap();
        store.create_incident_type("Fire").await.unwrap();
        store.set_incident_type_hidden("Fire", true).await.unwrap();

        let visible = store.incident_types(false).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "Medical");

        let all = store.incident_types(true).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().any(|t| t.name == "Fire" && t.hidden));
    }
}
