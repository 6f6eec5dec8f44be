use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use tracing::info;

use opsdesk_incidents::IncidentFilter;
use opsdesk_types::api::{
    Claims, EditIncidentRequest, IncidentQuery, IncidentView, NewCommentRequest, NotificationList,
    ReportIncidentRequest,
};

use crate::error::ApiError;
use crate::state::AppState;

pub async fn list_users(State(state): State<AppState>) -> impl IntoResponse {
    let desk = state.desk.read().await;
    Json(desk.users().to_vec())
}

pub async fn list_incidents(
    State(state): State<AppState>,
    Query(query): Query<IncidentQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = IncidentFilter::from_query(&query)?;
    let now = Utc::now();

    let desk = state.desk.read().await;
    let incidents: Vec<IncidentView> = desk
        .list(&filter)
        .into_iter()
        .map(|i| desk.view(i, now))
        .collect();

    Ok(Json(incidents))
}

pub async fn get_incident(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let desk = state.desk.read().await;
    let incident = desk.get(&id).ok_or(ApiError::NotFound("Incident"))?;
    Ok(Json(desk.view(incident, Utc::now())))
}

pub async fn report_incident(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ReportIncidentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let now = Utc::now();
    let mut desk = state.desk.write().await;
    let incident = desk.report(req, now)?;

    info!("Incident {} reported by {}", incident.id, claims.email);
    Ok((StatusCode::CREATED, Json(desk.view(&incident, now))))
}

pub async fn update_incident(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<EditIncidentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let now = Utc::now();
    let mut desk = state.desk.write().await;
    let incident = desk.update(&id, req, claims.role, now)?;
    Ok(Json(desk.view(&incident, now)))
}

pub async fn add_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<NewCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut desk = state.desk.write().await;
    let comment = desk.add_comment(&id, &claims.email, req, claims.role, Utc::now())?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn list_notifications(State(state): State<AppState>) -> impl IntoResponse {
    let desk = state.desk.read().await;
    let log = desk.notifications();
    Json(NotificationList {
        unread: log.unread_count(),
        notifications: log.entries().to_vec(),
    })
}

pub async fn mark_notification_read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let mut desk = state.desk.write().await;
    if !desk.notifications_mut().mark_read(&id) {
        return Err(ApiError::NotFound("Notification"));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::auth::create_token;
    use crate::test_support::{register_user, send, test_app};
    use opsdesk_types::models::UserRole;
    use uuid::Uuid;

    #[tokio::test]
    async fn list_applies_filters_and_sort() {
        let (app, _) = test_app();

        let (status, all) = send(&app, Method::GET, "/incidents", None, None).await;
        assert_eq!(status, StatusCode::OK);
        let all = all.as_array().unwrap().clone();
        assert_eq!(all.len(), 5);
        assert_eq!(all[0]["id"], "inc-005");

        let (_, unassigned) = send(&app, Method::GET, "/incidents?assignee=unassigned", None, None).await;
        let unassigned = unassigned.as_array().unwrap();
        assert_eq!(unassigned.len(), 1);
        assert_eq!(unassigned[0]["assigneeName"], "Unassigned");

        let (_, bob) = send(
            &app,
            Method::GET,
            "/incidents?severity=Medium&status=Investigating&assignee=user-2&sort=oldest",
            None,
            None,
        )
        .await;
        let ids: Vec<&str> = bob.as_array().unwrap().iter().map(|i| i["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["inc-002", "inc-004"]);

        let (status, body) = send(&app, Method::GET, "/incidents?severity=Critical", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["fields"][0]["field"], "severity");
    }

    #[tokio::test]
    async fn report_edit_and_comment_flow() {
        let (app, _) = test_app();
        let (_, token) = register_user(&app, "ops@example.com").await;

        let (status, reported) = send(
            &app,
            Method::POST,
            "/incidents",
            Some(&token),
            Some(json!({
                "title": "Checkout timeouts",
                "description": "Checkout requests time out after 30 seconds",
                "severity": "High",
                "tags": ["payments"],
                "assigneeId": "user-4"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", reported);
        assert_eq!(reported["status"], "New");
        assert_eq!(reported["assigneeName"], "Diana Davis");
        let uri = format!("/incidents/{}", reported["id"].as_str().unwrap());

        let (status, comment) = send(
            &app,
            Method::POST,
            &format!("{}/comments", uri),
            Some(&token),
            Some(json!({ "text": "Rolled back the gateway deploy" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(comment["author"], "ops@example.com");

        let (status, edited) = send(
            &app,
            Method::PUT,
            &uri,
            Some(&token),
            Some(json!({
                "title": "Checkout timeouts (resolved)",
                "description": "Checkout requests time out after 30 seconds",
                "severity": "High",
                "status": "Mitigated",
                "tags": ["payments", "gateway"],
                "assigneeId": "user-4"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(edited["status"], "Mitigated");
        assert_eq!(edited["comments"].as_array().unwrap().len(), 1);
        assert_eq!(edited["reportedDate"], reported["reportedDate"]);

        let (_, feed) = send(&app, Method::GET, "/notifications", None, None).await;
        assert_eq!(feed["unread"], 3);
        let latest = feed["notifications"][0]["id"].as_str().unwrap().to_string();
        assert!(feed["notifications"][0]["message"].as_str().unwrap().contains("marked as Mitigated"));

        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/notifications/{}/read", latest),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, feed) = send(&app, Method::GET, "/notifications", None, None).await;
        assert_eq!(feed["unread"], 2);
    }

    #[tokio::test]
    async fn sixth_tag_is_rejected() {
        let (app, _) = test_app();
        let (_, token) = register_user(&app, "ops@example.com").await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/incidents",
            Some(&token),
            Some(json!({
                "title": "Too many tags",
                "description": "This report carries one tag too many",
                "severity": "Low",
                "tags": ["a", "b", "c", "d", "e", "f"]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["fields"][0]["message"], "Maximum 5 tags allowed");
    }

    #[tokio::test]
    async fn viewer_is_forbidden_from_editing() {
        let (app, state) = test_app();
        let viewer = create_token(
            &state.jwt.secret,
            chrono::Duration::hours(1),
            Uuid::new_v4(),
            "viewer@example.com",
            UserRole::Viewer,
        )
        .unwrap();

        let (status, body) = send(
            &app,
            Method::POST,
            "/incidents/inc-001/comments",
            Some(&viewer),
            Some(json!({ "text": "Can I help?" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["message"], "Viewers cannot add comments.");
    }

    #[tokio::test]
    async fn unknown_incident_and_notification_are_not_found() {
        let (app, _) = test_app();
        let (_, token) = register_user(&app, "ops@example.com").await;

        let (status, _) = send(&app, Method::GET, "/incidents/inc-404", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) =
            send(&app, Method::POST, "/notifications/notif-404/read", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn users_are_listed() {
        let (app, _) = test_app();
        let (status, users) = send(&app, Method::GET, "/users", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(users.as_array().unwrap().len(), 4);
        assert_eq!(users[0]["name"], "Alice Johnson");
    }
}
