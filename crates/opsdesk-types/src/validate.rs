//! Field-level validation shared by the server and the client.
//!
//! Validation never stops at the first problem: every failing field is
//! reported so forms can show all messages at once.

use serde::{Deserialize, Serialize};

use crate::api::{
    CreateProductRequest, EditIncidentRequest, LoginRequest, NewCommentRequest, ProductQuery,
    RegisterRequest, ReportIncidentRequest, UpdateProductRequest,
};

pub const TITLE_MIN_CHARS: usize = 5;
pub const DESCRIPTION_MIN_CHARS: usize = 10;
pub const DESCRIPTION_MAX_CHARS: usize = 500;
pub const MAX_TAGS: usize = 5;
pub const MAX_TAG_CHARS: usize = 20;
pub const PASSWORD_MIN_CHARS: usize = 8;
pub const RATING_MAX: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("{}", join_messages(.errors))]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

fn join_messages(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn check_title(title: &str, errors: &mut ValidationErrors) {
    if char_len(title.trim()) < TITLE_MIN_CHARS {
        errors.push("title", "Title must be at least 5 characters.");
    }
}

fn check_description(description: &str, errors: &mut ValidationErrors) {
    let len = char_len(description.trim());
    if len < DESCRIPTION_MIN_CHARS {
        errors.push("description", "Description must be at least 10 characters.");
    } else if len > DESCRIPTION_MAX_CHARS {
        errors.push("description", "Description cannot exceed 500 characters.");
    }
}

/// Checks a complete tag list: at most five tags, each 1..=20 characters.
pub fn check_tags(tags: &[String], errors: &mut ValidationErrors) {
    if tags.len() > MAX_TAGS {
        errors.push("tags", "Maximum 5 tags allowed");
    }
    for tag in tags {
        let len = char_len(tag.trim());
        if len == 0 {
            errors.push("tags", "Tag cannot be empty");
        } else if len > MAX_TAG_CHARS {
            errors.push("tags", "Tag too long");
        }
    }
}

fn check_email(email: &str, errors: &mut ValidationErrors) {
    let valid = match email.trim().split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid {
        errors.push("email", "Please enter a valid email address");
    }
}

fn check_price(price: f64, errors: &mut ValidationErrors) {
    if !price.is_finite() || price < 0.0 {
        errors.push("price", "Price must not be less than 0");
    }
}

fn check_rating(rating: f64, errors: &mut ValidationErrors) {
    if !rating.is_finite() || !(0.0..=RATING_MAX).contains(&rating) {
        errors.push("rating", "Rating must be between 0 and 5");
    }
}

fn check_required(field: &str, value: &str, errors: &mut ValidationErrors) {
    if value.trim().is_empty() {
        errors.push(field, format!("{} should not be empty", field));
    }
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_email(&self.email, &mut errors);
        if char_len(&self.password) < PASSWORD_MIN_CHARS {
            errors.push("password", "Password must be at least 8 characters");
        }
        if self.confirm_password != self.password {
            errors.push("confirmPassword", "Passwords do not match");
        }
        errors.into_result()
    }
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_required("email", &self.email, &mut errors);
        check_required("password", &self.password, &mut errors);
        errors.into_result()
    }
}

impl Validate for CreateProductRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_required("name", &self.name, &mut errors);
        check_required("category", &self.category, &mut errors);
        check_price(self.price, &mut errors);
        check_rating(self.rating, &mut errors);
        errors.into_result()
    }
}

impl Validate for UpdateProductRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(name) = &self.name {
            check_required("name", name, &mut errors);
        }
        if let Some(category) = &self.category {
            check_required("category", category, &mut errors);
        }
        if let Some(price) = self.price {
            check_price(price, &mut errors);
        }
        if let Some(rating) = self.rating {
            check_rating(rating, &mut errors);
        }
        errors.into_result()
    }
}

impl Validate for ProductQuery {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        for (field, bound) in [
            ("minPrice", self.min_price),
            ("maxPrice", self.max_price),
            ("minRating", self.min_rating),
        ] {
            if bound.is_some_and(|b| !b.is_finite()) {
                errors.push(field, format!("{} must be a finite number", field));
            }
        }
        errors.into_result()
    }
}

impl Validate for ReportIncidentRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_title(&self.title, &mut errors);
        check_description(&self.description, &mut errors);
        if self.severity.is_none() {
            errors.push("severity", "You need to select a severity level.");
        }
        check_tags(&self.tags, &mut errors);
        errors.into_result()
    }
}

impl Validate for EditIncidentRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_title(&self.title, &mut errors);
        check_description(&self.description, &mut errors);
        if self.severity.is_none() {
            errors.push("severity", "You need to select a severity level.");
        }
        if self.status.is_none() {
            errors.push("status", "You need to select a status.");
        }
        check_tags(&self.tags, &mut errors);
        errors.into_result()
    }
}

impl Validate for NewCommentRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        if self.text.trim().is_empty() {
            return Err(ValidationErrors::single(
                "text",
                "Please enter some text to add a comment.",
            ));
        }
        Ok(())
    }
}
