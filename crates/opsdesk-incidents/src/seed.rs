//! Reference users and the starter incident set loaded into a fresh desk.

use chrono::{DateTime, Duration, Utc};
use opsdesk_types::models::{Comment, Incident, IncidentStatus, Severity, User};

pub fn users() -> Vec<User> {
    [
        ("user-1", "Alice Johnson"),
        ("user-2", "Bob Williams"),
        ("user-3", "Charlie Brown"),
        ("user-4", "Diana Davis"),
    ]
    .into_iter()
    .map(|(id, name)| User {
        id: id.to_string(),
        name: name.to_string(),
        avatar_url: Some(format!("https://i.pravatar.cc/40?u={}", id)),
    })
    .collect()
}

fn comments(incident: &str, count: usize, now: DateTime<Utc>) -> Vec<Comment> {
    let authors = users();
    // oldest first
    (0..count)
        .map(|i| Comment {
            id: format!("cmt-{}-{}", incident, i + 1),
            author: authors[i % authors.len()].name.clone(),
            text: format!("Update {} on this incident.", i + 1),
            timestamp: now - Duration::hours((count - i) as i64 * 6),
        })
        .collect()
}

fn tags(list: &[&str]) -> Vec<String> {
    list.iter().map(|t| t.to_string()).collect()
}

/// Starter incidents, reported an hour apart with the last one newest.
pub fn incidents(now: DateTime<Utc>) -> Vec<Incident> {
    let reported = |hours_ago: i64| now - Duration::hours(hours_ago);

    vec![
        Incident {
            id: "inc-001".into(),
            title: "Minor UI Glitch in Reporting Module".into(),
            description: "Users reported a minor visual misalignment in the reporting module when viewed on older browsers. Does not affect functionality.".into(),
            severity: Severity::Low,
            status: IncidentStatus::Closed,
            reported_date: reported(5),
            due_date: None,
            tags: tags(&["ui", "bug", "frontend"]),
            assignee_id: Some("user-1".into()),
            comments: comments("inc-001", 1, now),
        },
        Incident {
            id: "inc-002".into(),
            title: "Incorrect Data Aggregation in Summary".into(),
            description: "The summary dashboard occasionally shows incorrect counts for medium severity incidents. Requires investigation into the aggregation logic.".into(),
            severity: Severity::Medium,
            status: IncidentStatus::Investigating,
            reported_date: reported(4),
            due_date: None,
            tags: tags(&["data", "backend", "bug", "dashboard"]),
            assignee_id: Some("user-2".into()),
            comments: comments("inc-002", 3, now),
        },
        Incident {
            id: "inc-003".into(),
            title: "Critical Authentication Bypass Vulnerability".into(),
            description: "A severe vulnerability allows unauthorized access under specific conditions. Immediate patching required.".into(),
            severity: Severity::High,
            status: IncidentStatus::Mitigated,
            reported_date: reported(3),
            due_date: None,
            tags: tags(&["security", "auth", "critical", "backend"]),
            assignee_id: Some("user-3".into()),
            comments: comments("inc-003", 5, now),
        },
        Incident {
            id: "inc-004".into(),
            title: "Slow API Response Time".into(),
            description: "The main data retrieval API is experiencing intermittent slowdowns during peak hours, affecting user experience.".into(),
            severity: Severity::Medium,
            status: IncidentStatus::Investigating,
            reported_date: reported(2),
            due_date: None,
            tags: tags(&["performance", "api", "backend"]),
            assignee_id: Some("user-2".into()),
            comments: comments("inc-004", 2, now),
        },
        Incident {
            id: "inc-005".into(),
            title: "Inconsistent Severity Tagging".into(),
            description: "Some automatically tagged incidents have inconsistent severity levels compared to manual assessments. Review tagging rules.".into(),
            severity: Severity::Low,
            status: IncidentStatus::New,
            reported_date: reported(1),
            due_date: None,
            tags: tags(&["ai", "tagging", "data-quality"]),
            assignee_id: None,
            comments: vec![],
        },
    ]
}
