use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use opsdesk_db::format_timestamp;
use opsdesk_db::models::ProductRow;
use opsdesk_types::api::{
    Claims, CreateProductRequest, MessageResponse, ProductQuery, UpdateProductRequest,
};
use opsdesk_types::models::Product;
use opsdesk_types::validate::Validate;

use crate::blocking;
use crate::error::ApiError;
use crate::state::AppState;

fn parse_timestamp(value: &str, row_id: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' on product '{}': {}", value, row_id, e);
            DateTime::default()
        })
}

fn product_from_row(row: ProductRow) -> Product {
    Product {
        id: row.id.parse().unwrap_or_else(|e| {
            warn!("Corrupt product id '{}': {}", row.id, e);
            Uuid::default()
        }),
        user_id: row.user_id.parse().unwrap_or_else(|e| {
            warn!("Corrupt user_id '{}' on product '{}': {}", row.user_id, row.id, e);
            Uuid::default()
        }),
        created_at: parse_timestamp(&row.created_at, &row.id),
        updated_at: parse_timestamp(&row.updated_at, &row.id),
        name: row.name,
        description: row.description,
        category: row.category,
        price: row.price,
        rating: row.rating,
    }
}

pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<impl IntoResponse, ApiError> {
    query.validate()?;
    let rows = blocking(&state, move |s| s.db.find_products(&query)).await?;
    let products: Vec<Product> = rows.into_iter().map(product_from_row).collect();
    Ok(Json(products))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let row = blocking(&state, move |s| s.db.get_product(&id))
        .await?
        .ok_or(ApiError::NotFound("Product"))?;
    Ok(Json(product_from_row(row)))
}

pub async fn create_product(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;

    let now = format_timestamp(Utc::now());
    let row = ProductRow {
        id: Uuid::new_v4().to_string(),
        name: req.name.trim().to_string(),
        description: req.description,
        category: req.category.trim().to_string(),
        price: req.price,
        rating: req.rating,
        user_id: claims.sub.to_string(),
        created_at: now.clone(),
        updated_at: now,
    };

    let inserted = row.clone();
    blocking(&state, move |s| s.db.insert_product(&inserted)).await?;

    info!("Product {} created by {}", row.id, claims.email);
    Ok((StatusCode::CREATED, Json(product_from_row(row))))
}

/// Products owned by someone else are reported as missing.
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(mut req): Json<UpdateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;
    req.name = req.name.map(|n| n.trim().to_string());
    req.category = req.category.map(|c| c.trim().to_string());

    let owner = claims.sub.to_string();
    let row = blocking(&state, move |s| {
        let now = format_timestamp(Utc::now());
        if !s.db.update_product(&id, &owner, &req, &now)? {
            return Ok(None);
        }
        s.db.get_product(&id)
    })
    .await?
    .ok_or(ApiError::NotFound("Product"))?;

    Ok(Json(product_from_row(row)))
}

/// Products owned by someone else are reported as missing.
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = claims.sub.to_string();
    let target = id.clone();
    let deleted = blocking(&state, move |s| s.db.delete_product(&target, &owner)).await?;
    if !deleted {
        return Err(ApiError::NotFound("Product"));
    }

    info!("Product {} deleted by {}", id, claims.email);
    Ok(Json(MessageResponse {
        message: "Product deleted successfully".into(),
    }))
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::http::{Method, StatusCode};
    use serde_json::{Value, json};

    use crate::test_support::{register_user, send, test_app};

    async fn create(app: &Router, token: &str, name: &str, category: &str, price: f64, rating: f64) -> Value {
        let (status, body) = send(
            app,
            Method::POST,
            "/products",
            Some(token),
            Some(json!({
                "name": name,
                "description": format!("{} with a two year warranty", name),
                "category": category,
                "price": price,
                "rating": rating
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body
    }

    #[tokio::test]
    async fn create_and_fetch_product() {
        let (app, _) = test_app();
        let (user_id, token) = register_user(&app, "owner@example.com").await;

        let created = create(&app, &token, "Standing Desk", "office", 399.0, 4.4).await;
        assert_eq!(created["userId"], user_id.to_string());
        assert!(created["createdAt"].as_str().is_some());

        let uri = format!("/products/{}", created["id"].as_str().unwrap());
        let (status, fetched) = send(&app, Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn invalid_product_reports_fields() {
        let (app, _) = test_app();
        let (_, token) = register_user(&app, "owner@example.com").await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/products",
            Some(&token),
            Some(json!({
                "name": "Broken", "description": "", "category": "misc",
                "price": -5.0, "rating": 7.0
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let fields: Vec<&str> = body["error"]["fields"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, vec!["price", "rating"]);
    }

    #[tokio::test]
    async fn other_users_cannot_update_or_delete() {
        let (app, _) = test_app();
        let (_, owner) = register_user(&app, "owner@example.com").await;
        let (_, intruder) = register_user(&app, "intruder@example.com").await;

        let product = create(&app, &owner, "Chef Knife", "kitchen", 89.0, 4.8).await;
        let uri = format!("/products/{}", product["id"].as_str().unwrap());

        let (status, body) =
            send(&app, Method::PATCH, &uri, Some(&intruder), Some(json!({ "price": 1.0 }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["message"], "Product not found");

        let (status, _) = send(&app, Method::DELETE, &uri, Some(&intruder), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, unchanged) = send(&app, Method::GET, &uri, None, None).await;
        assert_eq!(unchanged["price"], 89.0);
    }

    #[tokio::test]
    async fn owner_can_patch_and_delete() {
        let (app, _) = test_app();
        let (_, owner) = register_user(&app, "owner@example.com").await;
        let product = create(&app, &owner, "Chef Knife", "kitchen", 89.0, 4.8).await;
        let uri = format!("/products/{}", product["id"].as_str().unwrap());

        let (status, patched) =
            send(&app, Method::PATCH, &uri, Some(&owner), Some(json!({ "price": 79.5 }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(patched["price"], 79.5);
        assert_eq!(patched["name"], "Chef Knife");

        let (status, body) = send(&app, Method::DELETE, &uri, Some(&owner), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Product deleted successfully");

        let (status, _) = send(&app, Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn listing_applies_every_filter() {
        let (app, _) = test_app();
        let (_, token) = register_user(&app, "owner@example.com").await;
        create(&app, &token, "Espresso Machine", "kitchen", 249.0, 4.5).await;
        create(&app, &token, "Coffee Grinder", "kitchen", 59.0, 3.2).await;
        create(&app, &token, "Desk Lamp", "home", 35.0, 3.9).await;

        let (_, all) = send(&app, Method::GET, "/products", None, None).await;
        assert_eq!(all.as_array().unwrap().len(), 3);

        let (status, filtered) = send(
            &app,
            Method::GET,
            "/products?category=kitchen&minPrice=50&maxPrice=100&minRating=3&search=COFFEE",
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = filtered
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Coffee Grinder"]);
    }

    #[tokio::test]
    async fn search_is_case_insensitive_beyond_ascii() {
        let (app, _) = test_app();
        let (_, token) = register_user(&app, "owner@example.com").await;
        create(&app, &token, "ÉCLAIR MOLD", "kitchen", 24.0, 4.1).await;
        create(&app, &token, "Eclair Tray", "kitchen", 19.0, 3.8).await;

        let (status, found) = send(&app, Method::GET, "/products?search=%C3%A9clair", None, None).await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = found
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["ÉCLAIR MOLD"]);
    }

    #[tokio::test]
    async fn non_finite_bounds_are_rejected() {
        let (app, _) = test_app();
        let (status, body) = send(&app, Method::GET, "/products?minPrice=NaN", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["fields"][0]["field"], "minPrice");
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let (app, _) = test_app();
        let (status, _) = send(&app, Method::GET, "/products/does-not-exist", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
