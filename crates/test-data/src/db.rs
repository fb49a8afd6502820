//! Database seeding utilities.

use sqlx::PgPool;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::info;

use zones::database::Database;
use zones::errors::AppError;
use zones::models::{Athlete, Credentials};

use crate::generators::{GeneratedActivity, GeneratedAthlete};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Service error: {0}")]
    Service(#[from] AppError),
}

/// Database seeder for inserting generated test data.
pub struct Seeder {
    db: Database,
}

impl Seeder {
    /// Creates a new seeder with the given database pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            db: Database::new(pool),
        }
    }

    /// Seeds athletes into the database with placeholder credentials.
    pub async fn seed_athletes(&self, athletes: &[GeneratedAthlete]) -> Result<(), SeedError> {
        info!("Seeding {} athletes...", athletes.len());
        for generated in athletes {
            let athlete = Athlete {
                id: generated.id,
                name: generated.name.clone(),
                resting_hr: generated.resting_hr,
                max_hr: generated.max_hr,
                created_at: OffsetDateTime::now_utc(),
            };
            let credentials = Credentials {
                access_token: format!("seed-access-{}", generated.id),
                refresh_token: format!("seed-refresh-{}", generated.id),
                expires_at: OffsetDateTime::now_utc().unix_timestamp() + 21_600,
            };
            self.db.upsert_athlete(&athlete, &credentials).await?;
        }
        Ok(())
    }

    /// Seeds activity records for one athlete through the service's own
    /// upsert path, so seeded rows use the canonical encoding.
    pub async fn seed_records(
        &self,
        athlete_id: i64,
        activities: &[GeneratedActivity],
    ) -> Result<(), SeedError> {
        for activity in activities {
            self.db
                .upsert_record(athlete_id, activity.activity_id, &activity.record)
                .await?;
        }
        Ok(())
    }
}
