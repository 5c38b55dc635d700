// src/db/profile_repository.rs
// DOCUMENTATION: PostgreSQL access for the profiles table
// PURPOSE: Preference, role and spin quota columns of a user's profile row

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{ProfileStore, QuotaStore, StoreError};
use crate::models::{Preference, PreferenceRow, Profile, QuotaState, Role};

/// Internal struct for mapping profile rows
#[derive(Debug, FromRow)]
struct ProfileRow {
    pub preferred_cuisines: Option<String>,
    pub dietary_restrictions: Option<String>,
    pub price_tier: Option<String>,
    pub radius_km: Option<f64>,
    pub open_now_only: Option<bool>,
    pub include_visited: Option<bool>,
    pub role: Option<String>,
    pub daily_spins: Option<i32>,
    pub last_spin_date: Option<NaiveDate>,
}

impl ProfileRow {
    fn to_profile(self) -> Profile {
        let preference = PreferenceRow {
            preferred_cuisines: self.preferred_cuisines,
            dietary_restrictions: self.dietary_restrictions,
            price_tier: self.price_tier,
            radius_km: self.radius_km,
            open_now_only: self.open_now_only,
            include_visited: self.include_visited,
        }
        .into_preference();

        Profile {
            preference,
            role: Role::from_db(self.role.as_deref()),
            quota: QuotaState {
                spins_used_today: self.daily_spins.unwrap_or(0).max(0) as u32,
                last_spin_date: self.last_spin_date,
            },
        }
    }
}

/// PgProfileStore: profile and quota operations backed by PostgreSQL
/// DOCUMENTATION: The quota write is a single conditional statement so two
/// concurrent spins can never both advance from the same counter value
#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn load_profile(&self, user_id: Uuid) -> Result<Option<Profile>, StoreError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT
                preferred_cuisines, dietary_restrictions, price_tier,
                radius_km, open_now_only, include_visited,
                role, daily_spins, last_spin_date
            FROM profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            log::error!("Failed to load profile {}: {}", user_id, e);
            StoreError::from(e)
        })?;

        Ok(row.map(ProfileRow::to_profile))
    }

    async fn save_preference(
        &self,
        user_id: Uuid,
        preference: &Preference,
    ) -> Result<(), StoreError> {
        let row = PreferenceRow::from_preference(preference);

        sqlx::query(
            r#"
            INSERT INTO profiles (
                user_id, preferred_cuisines, dietary_restrictions, price_tier,
                radius_km, open_now_only, include_visited
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id) DO UPDATE
            SET preferred_cuisines = EXCLUDED.preferred_cuisines,
                dietary_restrictions = EXCLUDED.dietary_restrictions,
                price_tier = EXCLUDED.price_tier,
                radius_km = EXCLUDED.radius_km,
                open_now_only = EXCLUDED.open_now_only,
                include_visited = EXCLUDED.include_visited
            "#,
        )
        .bind(user_id) // $1
        .bind(&row.preferred_cuisines) // $2
        .bind(&row.dietary_restrictions) // $3
        .bind(&row.price_tier) // $4
        .bind(row.radius_km) // $5
        .bind(row.open_now_only) // $6
        .bind(row.include_visited) // $7
        .execute(&self.pool)
        .await
        .map_err(|e| {
            log::error!("Failed to save preferences for {}: {}", user_id, e);
            StoreError::from(e)
        })?;

        log::info!("Saved preferences for user {}", user_id);
        Ok(())
    }
}

#[async_trait]
impl QuotaStore for PgProfileStore {
    async fn load_quota(&self, user_id: Uuid) -> Result<QuotaState, StoreError> {
        let row: Option<(Option<i32>, Option<NaiveDate>)> = sqlx::query_as(
            "SELECT daily_spins, last_spin_date FROM profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            log::error!("Failed to load quota for {}: {}", user_id, e);
            StoreError::from(e)
        })?;

        Ok(row
            .map(|(spins, date)| QuotaState {
                spins_used_today: spins.unwrap_or(0).max(0) as u32,
                last_spin_date: date,
            })
            .unwrap_or_default())
    }

    async fn compare_and_set_quota(
        &self,
        user_id: Uuid,
        expected: &QuotaState,
        next: &QuotaState,
    ) -> Result<bool, StoreError> {
        // A missing row reads as the default state, so only a default
        // expectation may create the row.
        let sql = if *expected == QuotaState::default() {
            r#"
            INSERT INTO profiles (user_id, daily_spins, last_spin_date)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE
            SET daily_spins = EXCLUDED.daily_spins,
                last_spin_date = EXCLUDED.last_spin_date
            WHERE COALESCE(profiles.daily_spins, 0) = $4
              AND profiles.last_spin_date IS NOT DISTINCT FROM $5
            "#
        } else {
            r#"
            UPDATE profiles
            SET daily_spins = $2,
                last_spin_date = $3
            WHERE user_id = $1
              AND COALESCE(daily_spins, 0) = $4
              AND last_spin_date IS NOT DISTINCT FROM $5
            "#
        };

        let result = sqlx::query(sql)
            .bind(user_id) // $1
            .bind(next.spins_used_today as i32) // $2
            .bind(next.last_spin_date) // $3
            .bind(expected.spins_used_today as i32) // $4
            .bind(expected.last_spin_date) // $5
            .execute(&self.pool)
            .await
            .map_err(|e| {
                log::error!("Failed to record spin for {}: {}", user_id, e);
                StoreError::from(e)
            })?;

        Ok(result.rows_affected() == 1)
    }
}
