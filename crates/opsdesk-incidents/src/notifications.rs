use chrono::{DateTime, Utc};
use opsdesk_types::models::Notification;
use uuid::Uuid;

/// Feed of desk events, newest first.
#[derive(Debug, Default)]
pub struct NotificationLog {
    entries: Vec<Notification>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        title: &str,
        message: String,
        incident_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> &Notification {
        self.entries.insert(
            0,
            Notification {
                id: format!("notif-{}", Uuid::new_v4().simple()),
                title: title.to_string(),
                message,
                timestamp: now,
                read: false,
                incident_id: incident_id.map(str::to_string),
            },
        );
        &self.entries[0]
    }

    /// Returns false if no notification has this id.
    pub fn mark_read(&mut self, id: &str) -> bool {
        match self.entries.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.read = true;
                true
            }
            None => false,
        }
    }

    pub fn unread_count(&self) -> usize {
        self.entries.iter().filter(|n| !n.read).count()
    }

    pub fn entries(&self) -> &[Notification] {
        &self.entries
    }
}
