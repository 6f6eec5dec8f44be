use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use opsdesk_types::api::{EditIncidentRequest, IncidentView, NewCommentRequest, ReportIncidentRequest};
use opsdesk_types::models::{Comment, Incident, IncidentStatus, User, UserRole};
use opsdesk_types::validate::{Validate, ValidationErrors};

use crate::filter::{self, IncidentFilter};
use crate::notifications::NotificationLog;
use crate::seed;
use crate::tags::TagSet;

#[derive(Debug, thiserror::Error)]
pub enum DeskError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("incident not found")]
    NotFound,

    #[error("{0}")]
    PermissionDenied(&'static str),
}

/// The incident collection, kept newest-first by reported date, together
/// with the assignable users and the notification feed.
pub struct IncidentDesk {
    incidents: Vec<Incident>,
    users: Vec<User>,
    notifications: NotificationLog,
}

impl IncidentDesk {
    pub fn new(users: Vec<User>, mut incidents: Vec<Incident>) -> Self {
        incidents.sort_by(|a, b| b.reported_date.cmp(&a.reported_date));
        Self {
            incidents,
            users,
            notifications: NotificationLog::new(),
        }
    }

    /// A desk loaded with the reference users and starter incidents.
    pub fn seeded(now: DateTime<Utc>) -> Self {
        Self::new(seed::users(), seed::incidents(now))
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn incidents(&self) -> &[Incident] {
        &self.incidents
    }

    pub fn notifications(&self) -> &NotificationLog {
        &self.notifications
    }

    pub fn notifications_mut(&mut self) -> &mut NotificationLog {
        &mut self.notifications
    }

    pub fn get(&self, id: &str) -> Option<&Incident> {
        self.incidents.iter().find(|i| i.id == id)
    }

    pub fn list(&self, filter: &IncidentFilter) -> Vec<&Incident> {
        filter::project(&self.incidents, filter)
    }

    pub fn assignee_name(&self, assignee_id: Option<&str>) -> String {
        match assignee_id {
            None => "Unassigned".to_string(),
            Some(id) => self
                .users
                .iter()
                .find(|u| u.id == id)
                .map(|u| u.name.clone())
                .unwrap_or_else(|| "Unknown User".to_string()),
        }
    }

    pub fn view(&self, incident: &Incident, now: DateTime<Utc>) -> IncidentView {
        IncidentView {
            incident: incident.clone(),
            overdue: incident.is_overdue(now),
            assignee_name: self.assignee_name(incident.assignee_id.as_deref()),
        }
    }

    /// Records a new incident. Status always starts as `New`.
    pub fn report(
        &mut self,
        req: ReportIncidentRequest,
        now: DateTime<Utc>,
    ) -> Result<Incident, DeskError> {
        let mut errors = req.validate().err().unwrap_or_default();
        if let Some(due) = req.due_date {
            if due.date_naive() < now.date_naive() {
                errors.push("dueDate", "Due date cannot be in the past");
            }
        }
        let assignee_id = self.check_assignee(req.assignee_id, &mut errors);
        let tags = collect_tags(&req.tags, &mut errors);
        errors.into_result()?;

        let severity = req.severity.ok_or_else(|| {
            ValidationErrors::single("severity", "You need to select a severity level.")
        })?;

        let incident = Incident {
            id: format!("inc-{}", Uuid::new_v4().simple()),
            title: req.title.trim().to_string(),
            description: req.description.trim().to_string(),
            severity,
            status: IncidentStatus::New,
            reported_date: now,
            due_date: req.due_date,
            tags,
            assignee_id,
            comments: vec![],
        };

        self.incidents.insert(0, incident.clone());
        self.incidents.sort_by(|a, b| b.reported_date.cmp(&a.reported_date));

        info!("Incident {} reported ({})", incident.id, incident.severity);
        self.notifications.push(
            "Incident Reported",
            format!("New incident \"{}\" has been added.", incident.title),
            Some(&incident.id),
            now,
        );

        Ok(incident)
    }

    /// Replaces the editable fields of an incident. Id, reported date and
    /// comments are kept.
    pub fn update(
        &mut self,
        id: &str,
        req: EditIncidentRequest,
        role: UserRole,
        now: DateTime<Utc>,
    ) -> Result<Incident, DeskError> {
        if role == UserRole::Viewer {
            return Err(DeskError::PermissionDenied("Viewers cannot edit incidents."));
        }
        let pos = self
            .incidents
            .iter()
            .position(|i| i.id == id)
            .ok_or(DeskError::NotFound)?;

        let mut errors = req.validate().err().unwrap_or_default();
        let assignee_id = self.check_assignee(req.assignee_id, &mut errors);
        let tags = collect_tags(&req.tags, &mut errors);
        errors.into_result()?;

        let (severity, status) = match (req.severity, req.status) {
            (Some(severity), Some(status)) => (severity, status),
            _ => return Err(ValidationErrors::single("status", "You need to select a status.").into()),
        };

        let previous = self.incidents[pos].status;
        let incident = &mut self.incidents[pos];
        incident.title = req.title.trim().to_string();
        incident.description = req.description.trim().to_string();
        incident.severity = severity;
        incident.status = status;
        incident.due_date = req.due_date;
        incident.tags = tags;
        incident.assignee_id = assignee_id;
        let updated = incident.clone();

        let (title, message) = if !previous.is_resolved() && status.is_resolved() {
            (
                "Incident Resolved",
                format!("Incident \"{}\" has been marked as {}.", updated.title, status),
            )
        } else if previous != status {
            (
                "Incident Status Updated",
                format!("Status for \"{}\" changed to {}.", updated.title, status),
            )
        } else {
            (
                "Incident Updated",
                format!("Details for \"{}\" have been updated.", updated.title),
            )
        };
        debug!("Incident {} updated: {}", updated.id, message);
        self.notifications.push(title, message, Some(&updated.id), now);

        Ok(updated)
    }

    /// Appends a comment. Comments are never removed.
    pub fn add_comment(
        &mut self,
        id: &str,
        author: &str,
        req: NewCommentRequest,
        role: UserRole,
        now: DateTime<Utc>,
    ) -> Result<Comment, DeskError> {
        if role == UserRole::Viewer {
            return Err(DeskError::PermissionDenied("Viewers cannot add comments."));
        }
        req.validate()?;

        let incident = self
            .incidents
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(DeskError::NotFound)?;

        let comment = Comment {
            id: format!("cmt-{}", Uuid::new_v4().simple()),
            author: author.to_string(),
            text: req.text.trim().to_string(),
            timestamp: now,
        };
        incident.comments.push(comment.clone());
        let title = incident.title.clone();

        self.notifications.push(
            "Comment Added",
            format!("New comment by {} on \"{}\".", comment.author, title),
            Some(id),
            now,
        );

        Ok(comment)
    }

    fn check_assignee(&self, assignee: Option<String>, errors: &mut ValidationErrors) -> Option<String> {
        let assignee = assignee.map(|a| a.trim().to_string()).filter(|a| !a.is_empty())?;
        if !self.users.iter().any(|u| u.id == assignee) {
            errors.push("assigneeId", "Unknown assignee");
        }
        Some(assignee)
    }
}

fn collect_tags(tags: &[String], errors: &mut ValidationErrors) -> Vec<String> {
    // Count and length problems were already reported by `validate`.
    if errors.has_field("tags") {
        return vec![];
    }
    match TagSet::from_tags(tags) {
        Ok(set) => set.into_vec(),
        Err(e) => {
            errors.push("tags", e.to_string());
            vec![]
        }
    }
}
