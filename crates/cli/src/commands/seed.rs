//! Reference data seeding command.
//!
//! Idempotent: rows that already exist (by unique name) are left untouched.

use super::CommandError;

const COLORS: &[&str] = &[
    "Negro", "Blanco", "Gris", "Azul", "Rojo", "Verde", "Beige", "Café",
];

const CATEGORIES: &[(&str, &str)] = &[
    ("Poleras", "letter"),
    ("Polerones", "letter"),
    ("Pantalones", "numeric"),
    ("Shorts", "numeric"),
    ("Vestidos", "letter"),
    ("Zapatillas", "shoe"),
];

const BRANDS: &[&str] = &["Telar", "Andes Wear", "Costa Sur"];

/// Insert the baseline reference rows.
///
/// # Errors
///
/// Returns `CommandError` when the database is unreachable.
pub async fn run() -> Result<(), CommandError> {
    let pool = super::connect().await?;

    for name in COLORS {
        sqlx::query("INSERT IGNORE INTO colors (name) VALUES (?)")
            .bind(name)
            .execute(&pool)
            .await?;
    }

    for (name, size_type) in CATEGORIES {
        sqlx::query("INSERT IGNORE INTO categories (name, size_type) VALUES (?, ?)")
            .bind(name)
            .bind(size_type)
            .execute(&pool)
            .await?;
    }

    for name in BRANDS {
        sqlx::query("INSERT IGNORE INTO brands (name) VALUES (?)")
            .bind(name)
            .execute(&pool)
            .await?;
    }

    tracing::info!("Reference data seeded");
    Ok(())
}
