use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Incident, IncidentStatus, Notification, Product, Severity, UserRole};

// -- JWT Claims --

/// JWT claims shared by the REST guard and the token issuer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    #[serde(default)]
    pub role: UserRole,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub token: String,
}

// -- Products --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub rating: f64,
}

/// PATCH body: absent fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProductRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

/// Product listing filters. Every absent (or empty) filter is a no-op and
/// present filters combine with AND.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl ProductQuery {
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref().filter(|c| !c.is_empty())
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Case-insensitive substring match over name or description.
    pub fn matches_search(&self, product: &Product) -> bool {
        self.search_matches(&product.name, &product.description)
    }

    /// Unicode-aware: both sides are folded with `str::to_lowercase`.
    pub fn search_matches(&self, name: &str, description: &str) -> bool {
        match self.search() {
            Some(needle) => {
                let needle = needle.to_lowercase();
                name.to_lowercase().contains(&needle)
                    || description.to_lowercase().contains(&needle)
            }
            None => true,
        }
    }

    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category) = self.category() {
            if product.category != category {
                return false;
            }
        }
        if self.min_price.is_some_and(|min| product.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| product.price > max) {
            return false;
        }
        if self.min_rating.is_some_and(|min| product.rating < min) {
            return false;
        }
        self.matches_search(product)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

// -- Incidents --

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReportIncidentRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub assignee_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EditIncidentRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub status: Option<IncidentStatus>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub assignee_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewCommentRequest {
    pub text: String,
}

/// Raw incident listing query. `severity`, `status` and `assignee` accept
/// `All`; `assignee` also accepts `unassigned`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncidentQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
}

/// An incident as rendered to clients, with derived display fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentView {
    #[serde(flatten)]
    pub incident: Incident,
    pub overdue: bool,
    pub assignee_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationList {
    pub unread: usize,
    pub notifications: Vec<Notification>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str, category: &str, price: f64, rating: f64) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: name.into(),
            description: format!("{} for everyday use", name),
            category: category.into(),
            price,
            rating,
            user_id: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn empty_query_matches_everything() {
        let q = ProductQuery::default();
        assert!(q.matches(&product("Kettle", "kitchen", 0.0, 0.0)));
        assert!(q.matches(&product("Lamp", "home", 999.0, 5.0)));
    }

    #[test]
    fn filters_combine_conjunctively() {
        let q = ProductQuery {
            category: Some("kitchen".into()),
            min_price: Some(10.0),
            max_price: Some(50.0),
            min_rating: Some(3.0),
            search: Some("KETTLE".into()),
        };
        assert!(q.matches(&product("Steel Kettle", "kitchen", 20.0, 4.0)));
        assert!(!q.matches(&product("Steel Kettle", "home", 20.0, 4.0)));
        assert!(!q.matches(&product("Steel Kettle", "kitchen", 60.0, 4.0)));
        assert!(!q.matches(&product("Steel Kettle", "kitchen", 5.0, 4.0)));
        assert!(!q.matches(&product("Steel Kettle", "kitchen", 20.0, 2.5)));
        assert!(!q.matches(&product("Toaster", "kitchen", 20.0, 4.0)));
    }

    #[test]
    fn search_covers_description_and_ignores_blank() {
        let mut p = product("Widget", "tools", 1.0, 1.0);
        p.description = "Hand-forged in Sheffield".into();
        let q = ProductQuery { search: Some("sheffield".into()), ..Default::default() };
        assert!(q.matches(&p));

        let blank = ProductQuery {
            search: Some("   ".into()),
            category: Some(String::new()),
            ..Default::default()
        };
        assert!(blank.matches(&p));
    }

    #[test]
    fn register_request_uses_camel_case() {
        let req: RegisterRequest = serde_json::from_str(
            r#"{"email":"a@b.io","password":"hunter22","confirmPassword":"hunter22"}"#,
        )
        .unwrap();
        assert_eq!(req.confirm_password, "hunter22");
        assert!(req.role.is_none());
    }
}
