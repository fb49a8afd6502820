use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::{ActivityZoneRecord, Athlete, Credentials, Stats};

/// Profile, credential, and activity-record stores over one Postgres pool.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn upsert_athlete(
        &self,
        athlete: &Athlete,
        credentials: &Credentials,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO athletes (id, name, resting_hr, max_hr, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name,
                resting_hr = EXCLUDED.resting_hr,
                max_hr = EXCLUDED.max_hr
            "#,
        )
        .bind(athlete.id)
        .bind(&athlete.name)
        .bind(athlete.resting_hr)
        .bind(athlete.max_hr)
        .bind(athlete.created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO credentials (athlete_id, access_token, refresh_token, expires_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (athlete_id) DO UPDATE
            SET access_token = EXCLUDED.access_token,
                refresh_token = EXCLUDED.refresh_token,
                expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(athlete.id)
        .bind(&credentials.access_token)
        .bind(&credentials.refresh_token)
        .bind(credentials.expires_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    pub async fn get_athlete(&self, id: i64) -> Result<Option<Athlete>, AppError> {
        let athlete = sqlx::query_as(
            r#"
            SELECT id, name, resting_hr, max_hr, created_at
            FROM athletes
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(athlete)
    }

    pub async fn list_athletes(&self) -> Result<Vec<Athlete>, AppError> {
        let athletes: Vec<Athlete> = sqlx::query_as(
            r#"
            SELECT id, name, resting_hr, max_hr, created_at
            FROM athletes
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(athletes)
    }

    /// Removes the athlete; credentials and records go with the row.
    pub async fn delete_athlete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM athletes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }

        Ok(())
    }

    pub async fn get_credentials(&self, athlete_id: i64) -> Result<Option<Credentials>, AppError> {
        let credentials = sqlx::query_as(
            r#"
            SELECT access_token, refresh_token, expires_at
            FROM credentials
            WHERE athlete_id = $1
            "#,
        )
        .bind(athlete_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(credentials)
    }

    pub async fn save_credentials(
        &self,
        athlete_id: i64,
        credentials: &Credentials,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO credentials (athlete_id, access_token, refresh_token, expires_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (athlete_id) DO UPDATE
            SET access_token = EXCLUDED.access_token,
                refresh_token = EXCLUDED.refresh_token,
                expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(athlete_id)
        .bind(&credentials.access_token)
        .bind(&credentials.refresh_token)
        .bind(credentials.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Last-write-wins upsert keyed by activity ID, so replayed events
    /// simply overwrite.
    pub async fn upsert_record(
        &self,
        athlete_id: i64,
        activity_id: i64,
        record: &ActivityZoneRecord,
    ) -> Result<(), AppError> {
        let encoded = record.to_canonical_json()?;

        sqlx::query(
            r#"
            INSERT INTO activity_records (athlete_id, activity_id, record, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (athlete_id, activity_id) DO UPDATE
            SET record = EXCLUDED.record,
                updated_at = NOW()
            "#,
        )
        .bind(athlete_id)
        .bind(activity_id)
        .bind(&encoded)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn delete_record(&self, athlete_id: i64, activity_id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM activity_records WHERE athlete_id = $1 AND activity_id = $2")
            .bind(athlete_id)
            .bind(activity_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn delete_athlete_records(&self, athlete_id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM activity_records WHERE athlete_id = $1")
            .bind(athlete_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// All of an athlete's records as (activity id, canonical JSON).
    /// Decoding is the aggregator's job so a bad row becomes a skip, not
    /// a query failure.
    pub async fn list_records(&self, athlete_id: i64) -> Result<Vec<(i64, String)>, AppError> {
        let records: Vec<(i64, String)> = sqlx::query_as(
            r#"
            SELECT activity_id, record
            FROM activity_records
            WHERE athlete_id = $1
            ORDER BY activity_id
            "#,
        )
        .bind(athlete_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    pub async fn get_stats(&self) -> Result<Stats, AppError> {
        let athletes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM athletes")
            .fetch_one(&self.pool)
            .await?;
        let activities: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM activity_records")
            .fetch_one(&self.pool)
            .await?;

        Ok(Stats {
            athletes,
            activities,
        })
    }
}
