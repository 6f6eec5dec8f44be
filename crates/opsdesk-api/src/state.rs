use std::sync::Arc;

use tokio::sync::RwLock;

use opsdesk_db::Database;
use opsdesk_incidents::IncidentDesk;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub desk: RwLock<IncidentDesk>,
    pub jwt: JwtSettings,
}

/// Signing secret and lifetime for issued tokens.
#[derive(Debug, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub ttl: chrono::Duration,
}

impl AppStateInner {
    pub fn new(db: Database, desk: IncidentDesk, jwt: JwtSettings) -> AppState {
        Arc::new(Self {
            db,
            desk: RwLock::new(desk),
            jwt,
        })
    }
}
