use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use rand_core::OsRng;
use tracing::{info, warn};
use uuid::Uuid;

use opsdesk_db::format_timestamp;
use opsdesk_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use opsdesk_types::models::UserRole;
use opsdesk_types::validate::Validate;

use crate::blocking;
use crate::error::ApiError;
use crate::state::AppState;

const EMAIL_TAKEN: &str = "Email is already registered";

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;
    let email = req.email.trim().to_string();
    let role = req.role.unwrap_or_default();
    let user_id = Uuid::new_v4();

    let account_email = email.clone();
    blocking(&state, move |s| {
        // Cheap early exit; the UNIQUE index still decides concurrent races.
        if s.db.get_user_by_email(&account_email)?.is_some() {
            return Err(ApiError::Conflict(EMAIL_TAKEN.into()));
        }

        // Hash password with Argon2id
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(req.password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
            .to_string();

        let created = s.db.create_user(
            &user_id.to_string(),
            &account_email,
            &password_hash,
            role.as_str(),
            &format_timestamp(chrono::Utc::now()),
        )?;
        if !created {
            return Err(ApiError::Conflict(EMAIL_TAKEN.into()));
        }
        Ok(())
    })
    .await?;

    let token = create_token(&state.jwt.secret, state.jwt.ttl, user_id, &email, role)?;
    info!("Registered user {} ({})", email, role.as_str());

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id,
            email,
            role,
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;

    let user = blocking(&state, move |s| {
        let user = s
            .db
            .get_user_by_email(req.email.trim())?
            .ok_or(ApiError::Unauthorized)?;

        // Verify password
        let parsed_hash = PasswordHash::new(&user.password)
            .map_err(|e| anyhow::anyhow!("stored hash for {} is corrupt: {}", user.id, e))?;

        Argon2::default()
            .verify_password(req.password.as_bytes(), &parsed_hash)
            .map_err(|_| ApiError::Unauthorized)?;

        Ok::<_, ApiError>(user)
    })
    .await?;

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| anyhow::anyhow!("corrupt user id '{}': {}", user.id, e))?;

    let role = user.role.parse::<UserRole>().unwrap_or_else(|e| {
        warn!("User {} has {}; treating as Viewer", user.id, e);
        UserRole::Viewer
    });

    let token = create_token(&state.jwt.secret, state.jwt.ttl, user_id, &user.email, role)?;

    Ok(Json(LoginResponse {
        user_id,
        email: user.email,
        role,
        token,
    }))
}

pub fn create_token(
    secret: &str,
    ttl: chrono::Duration,
    user_id: Uuid,
    email: &str,
    role: UserRole,
) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        role,
        exp: (chrono::Utc::now() + ttl).timestamp().max(0) as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::middleware::decode_token;
    use crate::test_support::{register_user, send, test_app};
    use opsdesk_types::models::UserRole;

    #[tokio::test]
    async fn register_then_login() {
        let (app, state) = test_app();
        let (user_id, token) = register_user(&app, "ops@example.com").await;

        let claims = decode_token(&state.jwt.secret, &token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, UserRole::Admin);

        let (status, body) = send(
            &app,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "OPS@example.com", "password": "correct-horse" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["userId"], user_id.to_string());
        assert!(body["token"].as_str().is_some());
    }

    #[tokio::test]
    async fn mismatched_confirmation_is_a_field_error() {
        let (app, _) = test_app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/auth/register",
            None,
            Some(json!({
                "email": "ops@example.com",
                "password": "correct-horse",
                "confirmPassword": "correct-h0rse"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["fields"][0]["field"], "confirmPassword");
        assert_eq!(body["error"]["fields"][0]["message"], "Passwords do not match");
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let (app, _) = test_app();
        register_user(&app, "ops@example.com").await;
        let (status, _) = send(
            &app,
            Method::POST,
            "/auth/register",
            None,
            Some(json!({
                "email": "ops@example.com",
                "password": "another-pass",
                "confirmPassword": "another-pass"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_duplicate_registrations_conflict() {
        let (app, _) = test_app();
        let attempts: Vec<_> = ["race@example.com", "RACE@example.com", "race@example.com", "Race@Example.com"]
            .into_iter()
            .map(|email| {
                let app = app.clone();
                tokio::spawn(async move {
                    let body = json!({
                        "email": email,
                        "password": "correct-horse",
                        "confirmPassword": "correct-horse"
                    });
                    send(&app, Method::POST, "/auth/register", None, Some(body)).await.0
                })
            })
            .collect();

        let mut statuses = Vec::new();
        for attempt in attempts {
            statuses.push(attempt.await.unwrap());
        }

        let created = statuses.iter().filter(|s| **s == StatusCode::CREATED).count();
        let conflicts = statuses.iter().filter(|s| **s == StatusCode::CONFLICT).count();
        assert_eq!((created, conflicts), (1, 3), "statuses: {:?}", statuses);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_are_unauthorized() {
        let (app, _) = test_app();
        register_user(&app, "ops@example.com").await;

        for body in [
            json!({ "email": "ops@example.com", "password": "wrong-horse" }),
            json!({ "email": "nobody@example.com", "password": "correct-horse" }),
        ] {
            let (status, _) = send(&app, Method::POST, "/auth/login", None, Some(body)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn viewer_role_is_carried_in_the_token() {
        let (app, state) = test_app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/auth/register",
            None,
            Some(json!({
                "email": "viewer@example.com",
                "password": "correct-horse",
                "confirmPassword": "correct-horse",
                "role": "Viewer"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let claims = decode_token(&state.jwt.secret, body["token"].as_str().unwrap()).unwrap();
        assert_eq!(claims.role, UserRole::Viewer);
    }
}
