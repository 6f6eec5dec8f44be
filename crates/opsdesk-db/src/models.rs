/// Database row types, mapped directly from SQLite rows.
/// Distinct from opsdesk-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub rating: f64,
    pub user_id: String,
    pub created_at: String,
    pub updated_at: String,
}
