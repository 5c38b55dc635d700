// src/db/favorite_repository.rs
// DOCUMENTATION: PostgreSQL access for the favorites table
// PURPOSE: Save, list and unsave restaurants keyed by (user_id, restaurant_id)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{FavoritesStore, StoreError};
use crate::models::{Coordinates, FavoriteRecord};

/// Internal struct for mapping favorite rows
#[derive(Debug, FromRow)]
struct FavoriteRow {
    pub user_id: Uuid,
    pub restaurant_id: String,
    pub name: String,
    pub cuisine: Option<String>,
    pub price: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub created_at: DateTime<Utc>,
}

impl FavoriteRow {
    fn to_record(self) -> FavoriteRecord {
        FavoriteRecord {
            user_id: self.user_id,
            place_id: self.restaurant_id,
            name: self.name,
            cuisine: self.cuisine.unwrap_or_else(|| "Unknown".to_string()),
            price: self.price.as_deref().and_then(|p| p.parse().ok()),
            coordinates: Coordinates {
                lat: self.lat,
                lng: self.lng,
            },
            saved_at: self.created_at,
        }
    }
}

/// PgFavoritesStore: favorites backed by PostgreSQL
/// DOCUMENTATION: The (user_id, restaurant_id) primary key makes a repeated
/// save collapse into the existing row
#[derive(Clone)]
pub struct PgFavoritesStore {
    pool: PgPool,
}

impl PgFavoritesStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FavoritesStore for PgFavoritesStore {
    async fn list_favorites(&self, user_id: Uuid) -> Result<Vec<FavoriteRecord>, StoreError> {
        let rows = sqlx::query_as::<_, FavoriteRow>(
            r#"
            SELECT user_id, restaurant_id, name, cuisine, price, lat, lng, created_at
            FROM favorites
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            log::error!("Failed to list favorites for {}: {}", user_id, e);
            StoreError::from(e)
        })?;

        Ok(rows.into_iter().map(FavoriteRow::to_record).collect())
    }

    async fn insert_favorite(&self, record: &FavoriteRecord) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO favorites (
                user_id, restaurant_id, name, cuisine, price, lat, lng, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (user_id, restaurant_id) DO NOTHING
            "#,
        )
        .bind(record.user_id) // $1
        .bind(&record.place_id) // $2
        .bind(&record.name) // $3
        .bind(&record.cuisine) // $4
        .bind(record.price.map(|p| p.as_str())) // $5
        .bind(record.coordinates.lat) // $6
        .bind(record.coordinates.lng) // $7
        .bind(record.saved_at) // $8
        .execute(&self.pool)
        .await
        .map_err(|e| {
            log::error!(
                "Failed to save favorite {} for {}: {}",
                record.place_id,
                record.user_id,
                e
            );
            StoreError::from(e)
        })?;

        if result.rows_affected() == 0 {
            log::debug!(
                "Favorite {} already saved for {}",
                record.place_id,
                record.user_id
            );
        }
        Ok(())
    }

    async fn delete_favorite(&self, user_id: Uuid, place_id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND restaurant_id = $2")
            .bind(user_id)
            .bind(place_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                log::error!("Failed to delete favorite {} for {}: {}", place_id, user_id, e);
                StoreError::from(e)
            })?;

        Ok(())
    }
}
