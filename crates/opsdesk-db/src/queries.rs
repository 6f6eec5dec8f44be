use crate::models::{ProductRow, UserRow};
use crate::Database;
use anyhow::Result;
use opsdesk_types::api::{ProductQuery, UpdateProductRequest};
use rusqlite::{Connection, ErrorCode, Row};
use rusqlite::types::ToSql;

const PRODUCT_COLUMNS: &str =
    "id, name, description, category, price, rating, user_id, created_at, updated_at";

impl Database {
    // -- Users --

    /// Returns false when the email (compared case-insensitively) is already taken.
    pub fn create_user(
        &self,
        id: &str,
        email: &str,
        password_hash: &str,
        role: &str,
        created_at: &str,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (id, email, password, role, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, email, password_hash, role, created_at),
            );
            match inserted {
                Ok(_) => Ok(true),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == ErrorCode::ConstraintViolation =>
                {
                    Ok(false)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    // -- Products --

    pub fn insert_product(&self, row: &ProductRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO products (id, name, description, category, price, rating, user_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                rusqlite::params![
                    row.id,
                    row.name,
                    row.description,
                    row.category,
                    row.price,
                    row.rating,
                    row.user_id,
                    row.created_at,
                    row.updated_at,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_product(&self, id: &str) -> Result<Option<ProductRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS);
            conn.query_row(&sql, [id], product_from_row).optional()
        })
    }

    /// Every supplied filter narrows the result; absent filters are skipped.
    pub fn find_products(&self, query: &ProductQuery) -> Result<Vec<ProductRow>> {
        self.with_conn(|conn| query_products(conn, query))
    }

    /// Applies the present fields of `changes` to a product owned by `owner_id`.
    /// Returns false when no such product exists for that owner.
    pub fn update_product(
        &self,
        id: &str,
        owner_id: &str,
        changes: &UpdateProductRequest,
        updated_at: &str,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let affected = conn.execute(
                "UPDATE products SET
                    name = COALESCE(?3, name),
                    description = COALESCE(?4, description),
                    category = COALESCE(?5, category),
                    price = COALESCE(?6, price),
                    rating = COALESCE(?7, rating),
                    updated_at = ?8
                 WHERE id = ?1 AND user_id = ?2",
                rusqlite::params![
                    id,
                    owner_id,
                    changes.name,
                    changes.description,
                    changes.category,
                    changes.price,
                    changes.rating,
                    updated_at,
                ],
            )?;
            Ok(affected > 0)
        })
    }

    /// Returns false when no product with this id belongs to `owner_id`.
    pub fn delete_product(&self, id: &str, owner_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let affected = conn.execute(
                "DELETE FROM products WHERE id = ?1 AND user_id = ?2",
                [id, owner_id],
            )?;
            Ok(affected > 0)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!(
        "SELECT id, email, password, role, created_at FROM users WHERE {} = ?1",
        column
    );
    let mut stmt = conn.prepare(&sql)?;

    stmt.query_row([value], |row| {
        Ok(UserRow {
            id: row.get(0)?,
            email: row.get(1)?,
            password: row.get(2)?,
            role: row.get(3)?,
            created_at: row.get(4)?,
        })
    })
    .optional()
}

fn query_products(conn: &Connection, query: &ProductQuery) -> Result<Vec<ProductRow>> {
    let mut clauses: Vec<String> = Vec::new();
    let mut params: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(category) = query.category() {
        params.push(Box::new(category.to_string()));
        clauses.push(format!("category = ?{}", params.len()));
    }
    if let Some(min) = query.min_price {
        params.push(Box::new(min));
        clauses.push(format!("price >= ?{}", params.len()));
    }
    if let Some(max) = query.max_price {
        params.push(Box::new(max));
        clauses.push(format!("price <= ?{}", params.len()));
    }
    if let Some(min) = query.min_rating {
        params.push(Box::new(min));
        clauses.push(format!("rating >= ?{}", params.len()));
    }

    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };
    let sql = format!(
        "SELECT {} FROM products{} ORDER BY created_at ASC",
        PRODUCT_COLUMNS, where_clause
    );

    let mut stmt = conn.prepare(&sql)?;
    let refs: Vec<&dyn ToSql> = params.iter().map(|p| &**p).collect();

    let mut rows = stmt
        .query_map(refs.as_slice(), product_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    // SQLite's lower() only folds ASCII, so text search runs here.
    rows.retain(|row| query.search_matches(&row.name, &row.description));

    Ok(rows)
}

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<ProductRow> {
    Ok(ProductRow {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        category: row.get(3)?,
        price: row.get(4)?,
        rating: row.get(5)?,
        user_id: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
