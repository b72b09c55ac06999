//! Anuncios públicos con descartes persistidos.

use crate::adapters::http::ApiClient;
use crate::domain::model::Announcement;
use crate::domain::ports::KeyValueStore;
use crate::utils::error::Result;
use std::collections::BTreeSet;
use std::sync::Arc;

pub const DISMISSED_KEY: &str = "dismissedAnnouncements";

pub struct AnnouncementBoard {
    storage: Arc<dyn KeyValueStore>,
    announcements: Vec<Announcement>,
    dismissed: BTreeSet<String>,
}

impl AnnouncementBoard {
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Result<Self> {
        let dismissed = match storage.get_item(DISMISSED_KEY)? {
            Some(raw) => serde_json::from_str::<Vec<String>>(&raw).unwrap_or_else(|e| {
                tracing::warn!("⚠️ Ignoring malformed {}: {}", DISMISSED_KEY, e);
                Vec::new()
            }),
            None => Vec::new(),
        };

        Ok(Self {
            storage,
            announcements: Vec::new(),
            dismissed: dismissed.into_iter().collect(),
        })
    }

    pub fn replace(&mut self, announcements: Vec<Announcement>) {
        self.announcements = announcements;
    }

    /// Si falla la petición el tablero queda vacío.
    pub async fn refresh(&mut self, api: &ApiClient) -> &[Announcement] {
        self.announcements = match api.announcements().await {
            Ok(list) => list,
            Err(e) => {
                tracing::error!("Error fetching announcements: {}", e);
                Vec::new()
            }
        };
        &self.announcements
    }

    pub fn visible(&self) -> Vec<&Announcement> {
        self.announcements
            .iter()
            .filter(|a| a.is_active() && !self.dismissed.contains(&a.id))
            .collect()
    }

    pub fn is_dismissed(&self, id: &str) -> bool {
        self.dismissed.contains(id)
    }

    pub fn dismiss(&mut self, id: &str) -> Result<()> {
        if self.dismissed.insert(id.to_string()) {
            let ids: Vec<&String> = self.dismissed.iter().collect();
            self.storage
                .set_item(DISMISSED_KEY, &serde_json::to_string(&ids)?)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::MemoryStorage;
    use crate::domain::model::AnnouncementKind;

    fn announcement(id: &str, active: Option<bool>) -> Announcement {
        Announcement {
            id: id.to_string(),
            title: format!("Anuncio {}", id),
            message: "Mantenimiento a las 22hs".to_string(),
            kind: AnnouncementKind::Warning,
            created_at: "2024-05-01T10:00:00Z".to_string(),
            active,
        }
    }

    #[test]
    fn test_dismissed_stay_hidden_after_reload() {
        let storage = Arc::new(MemoryStorage::new());
        let mut board = AnnouncementBoard::load(storage.clone()).unwrap();
        board.replace(vec![announcement("1", None), announcement("2", Some(true))]);

        board.dismiss("1").unwrap();
        assert_eq!(board.visible().len(), 1);

        let mut reloaded = AnnouncementBoard::load(storage.clone()).unwrap();
        reloaded.replace(vec![announcement("1", None), announcement("2", Some(true))]);
        let visible: Vec<&str> = reloaded.visible().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(visible, vec!["2"]);
        assert_eq!(
            storage.get_item(DISMISSED_KEY).unwrap().as_deref(),
            Some(r#"["1"]"#)
        );
    }

    #[test]
    fn test_inactive_never_visible() {
        let storage = Arc::new(MemoryStorage::new());
        let mut board = AnnouncementBoard::load(storage).unwrap();
        board.replace(vec![announcement("1", Some(false))]);

        assert!(board.visible().is_empty());
    }

    #[test]
    fn test_malformed_dismissed_list_is_ignored() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_item(DISMISSED_KEY, "not json").unwrap();

        let mut board = AnnouncementBoard::load(storage).unwrap();
        board.replace(vec![announcement("1", None)]);

        assert_eq!(board.visible().len(), 1);
        assert!(!board.is_dismissed("1"));
    }
}
