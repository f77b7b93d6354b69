//! Database service for usage-service.

use crate::models::{
    NewUsageRecord, SubscriptionStatus, UsageBreakdownRow, UsagePage, UsageQuota,
    UsageRangeFilter, UsageRecord, UserSubscription,
};
use crate::services::metrics::DB_QUERY_DURATION;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "usage-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["health_check"])
            .start_timer();

        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;

        timer.observe_duration();
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    // =========================================================================
    // Usage Ledger Operations
    // =========================================================================

    /// Append a priced record to the ledger. Insert-only; ledger rows are
    /// never updated or deleted.
    #[instrument(skip(self, input), fields(service = %input.service.as_str(), operation = %input.operation))]
    pub async fn insert_usage_record(
        &self,
        input: &NewUsageRecord,
    ) -> Result<UsageRecord, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_usage_record"])
            .start_timer();

        let record_id = Uuid::new_v4();
        let record = sqlx::query_as::<_, UsageRecord>(
            r#"
            INSERT INTO usage_records (record_id, service, model, operation, input_units, output_units, image_count, cost, success, error_type, user_id, session_id, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING record_id, service, model, operation, input_units, output_units, image_count, cost, success, error_type, user_id, session_id, recorded_at, created_utc
            "#,
        )
        .bind(record_id)
        .bind(input.service.as_str())
        .bind(&input.model)
        .bind(&input.operation)
        .bind(input.input_units)
        .bind(input.output_units)
        .bind(input.image_count)
        .bind(input.cost)
        .bind(input.success)
        .bind(&input.error_type)
        .bind(input.user_id)
        .bind(&input.session_id)
        .bind(input.recorded_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to insert usage record: {}", e)))?;

        timer.observe_duration();

        Ok(record)
    }

    /// List one page of ledger records in a time range, oldest first.
    /// Records may arrive out of order, so readers always sort by timestamp
    /// (with the record id as a tiebreaker), never insertion order. Keyset
    /// pagination: rows strictly after the cursor record, one extra row
    /// fetched to detect whether a further page exists.
    #[instrument(skip(self, filter))]
    pub async fn list_usage_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        filter: &UsageRangeFilter,
    ) -> Result<UsagePage, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_usage_range"])
            .start_timer();

        let limit = if filter.page_size > 0 {
            filter.page_size.clamp(1, 1000) as i64
        } else {
            500
        };
        let service_str = filter.service.map(|s| s.as_str().to_string());

        let mut records = sqlx::query_as::<_, UsageRecord>(
            r#"
            SELECT record_id, service, model, operation, input_units, output_units, image_count, cost, success, error_type, user_id, session_id, recorded_at, created_utc
            FROM usage_records
            WHERE recorded_at >= $1 AND recorded_at < $2
              AND ($3::uuid IS NULL OR user_id = $3)
              AND ($4::varchar IS NULL OR service = $4)
              AND ($5::bool IS NULL OR success = $5)
              AND ($6::uuid IS NULL OR (recorded_at, record_id) >
                  (SELECT recorded_at, record_id FROM usage_records WHERE record_id = $6))
            ORDER BY recorded_at, record_id
            LIMIT $7
            "#,
        )
        .bind(start)
        .bind(end)
        .bind(filter.user_id)
        .bind(&service_str)
        .bind(filter.success)
        .bind(filter.cursor)
        .bind(limit + 1)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list usage records: {}", e)))?;

        let next_cursor = if records.len() as i64 > limit {
            records.truncate(limit as usize);
            records.last().map(|r| r.record_id)
        } else {
            None
        };

        timer.observe_duration();

        Ok(UsagePage {
            records,
            next_cursor,
        })
    }

    /// Aggregate a day's ledger: total cost, request count, success count.
    #[instrument(skip(self))]
    pub async fn daily_usage_totals(
        &self,
        date: NaiveDate,
    ) -> Result<(Decimal, i64, i64), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["daily_usage_totals"])
            .start_timer();

        let row: (Option<Decimal>, i64, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(cost), 0), COUNT(*), COUNT(*) FILTER (WHERE success)
            FROM usage_records
            WHERE recorded_at >= $1::date AND recorded_at < $1::date + INTERVAL '1 day'
            "#,
        )
        .bind(date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to aggregate daily usage: {}", e))
        })?;

        timer.observe_duration();

        Ok((row.0.unwrap_or(Decimal::ZERO), row.1, row.2))
    }

    /// Per-(service, model) cost breakdown for a day.
    #[instrument(skip(self))]
    pub async fn daily_usage_breakdown(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<UsageBreakdownRow>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["daily_usage_breakdown"])
            .start_timer();

        let rows = sqlx::query_as::<_, UsageBreakdownRow>(
            r#"
            SELECT service, model, COUNT(*) AS request_count, COALESCE(SUM(cost), 0) AS total_cost
            FROM usage_records
            WHERE recorded_at >= $1::date AND recorded_at < $1::date + INTERVAL '1 day'
            GROUP BY service, model
            ORDER BY service, model
            "#,
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to aggregate daily breakdown: {}", e))
        })?;

        timer.observe_duration();

        Ok(rows)
    }

    /// Count a user's successful listing and video operations since a cutoff.
    /// Used by the projector's trailing-window rate estimate.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn recent_usage_counts(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<(i64, i64), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["recent_usage_counts"])
            .start_timer();

        let row: (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE operation LIKE '%listing%'),
                COUNT(*) FILTER (WHERE operation LIKE '%video%')
            FROM usage_records
            WHERE user_id = $1 AND success AND recorded_at >= $2
            "#,
        )
        .bind(user_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to count recent usage: {}", e))
        })?;

        timer.observe_duration();

        Ok(row)
    }

    // =========================================================================
    // Quota Operations
    // =========================================================================

    /// Get the quota row for a user and period, if one exists yet.
    #[instrument(skip(self), fields(user_id = %user_id, period = %period))]
    pub async fn get_quota(
        &self,
        user_id: Uuid,
        period: &str,
    ) -> Result<Option<UsageQuota>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_quota"])
            .start_timer();

        let quota = sqlx::query_as::<_, UsageQuota>(
            r#"
            SELECT user_id, plan_id, period, listings_used, videos_used, last_reset, created_utc, updated_utc
            FROM usage_quotas
            WHERE user_id = $1 AND period = $2
            "#,
        )
        .bind(user_id)
        .bind(period)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get quota: {}", e)))?;

        timer.observe_duration();

        Ok(quota)
    }

    /// Atomically add to a user's period counters, creating the row on first
    /// use. A single upsert, not a read-modify-write, so concurrent requests
    /// near the limit cannot lose updates.
    #[instrument(skip(self), fields(user_id = %user_id, period = %period))]
    pub async fn increment_quota(
        &self,
        user_id: Uuid,
        plan_id: &str,
        period: &str,
        listings_delta: i32,
        videos_delta: i32,
    ) -> Result<UsageQuota, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["increment_quota"])
            .start_timer();

        let quota = sqlx::query_as::<_, UsageQuota>(
            r#"
            INSERT INTO usage_quotas (user_id, plan_id, period, listings_used, videos_used, last_reset)
            VALUES ($1, $2, $3, $4, $5, NOW())
            ON CONFLICT (user_id, period) DO UPDATE
            SET listings_used = usage_quotas.listings_used + EXCLUDED.listings_used,
                videos_used = usage_quotas.videos_used + EXCLUDED.videos_used,
                updated_utc = NOW()
            RETURNING user_id, plan_id, period, listings_used, videos_used, last_reset, created_utc, updated_utc
            "#,
        )
        .bind(user_id)
        .bind(plan_id)
        .bind(period)
        .bind(listings_delta)
        .bind(videos_delta)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to increment quota: {}", e)))?;

        timer.observe_duration();

        Ok(quota)
    }

    // =========================================================================
    // Subscription Operations
    // =========================================================================

    /// Get a user's subscription, if any.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_subscription(
        &self,
        user_id: Uuid,
    ) -> Result<Option<UserSubscription>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_subscription"])
            .start_timer();

        let subscription = sqlx::query_as::<_, UserSubscription>(
            r#"
            SELECT user_id, plan_id, status, current_period_start, current_period_end, cancel_at_period_end, trial_end, created_utc, updated_utc
            FROM user_subscriptions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get subscription: {}", e)))?;

        timer.observe_duration();

        Ok(subscription)
    }

    /// Create or replace a user's subscription row for a trial.
    #[instrument(skip(self), fields(user_id = %user_id, plan_id = %plan_id))]
    pub async fn upsert_trial_subscription(
        &self,
        user_id: Uuid,
        plan_id: &str,
        period_start: DateTime<Utc>,
        trial_end: DateTime<Utc>,
    ) -> Result<UserSubscription, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["upsert_trial_subscription"])
            .start_timer();

        let subscription = sqlx::query_as::<_, UserSubscription>(
            r#"
            INSERT INTO user_subscriptions (user_id, plan_id, status, current_period_start, current_period_end, cancel_at_period_end, trial_end)
            VALUES ($1, $2, $3, $4, $5, FALSE, $5)
            ON CONFLICT (user_id) DO UPDATE
            SET plan_id = EXCLUDED.plan_id,
                status = EXCLUDED.status,
                current_period_start = EXCLUDED.current_period_start,
                current_period_end = EXCLUDED.current_period_end,
                trial_end = EXCLUDED.trial_end,
                updated_utc = NOW()
            RETURNING user_id, plan_id, status, current_period_start, current_period_end, cancel_at_period_end, trial_end, created_utc, updated_utc
            "#,
        )
        .bind(user_id)
        .bind(plan_id)
        .bind(SubscriptionStatus::Trialing.as_str())
        .bind(period_start)
        .bind(trial_end)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to create trial subscription: {}", e))
        })?;

        timer.observe_duration();
        info!(user_id = %subscription.user_id, plan_id = %subscription.plan_id, "Trial subscription created");

        Ok(subscription)
    }
}
