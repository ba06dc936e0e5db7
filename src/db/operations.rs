use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite};
use tracing::info;

use crate::config::DatabaseConfig;
use crate::db::models::{Account, NewAccount, Profile, ProfileChanges};
use crate::error::{AppError, DatabaseError};

const ACCOUNT_COLUMNS: &str =
    "id, username, password_hash, email, first_name, last_name, is_active, date_joined, last_login";
const PROFILE_COLUMNS: &str = "id, account_id, phone_number, bio, created_at, updated_at";

#[derive(Clone)]
pub struct DbOperations {
    pool: Arc<SqlitePool>,
}

impl DbOperations {
    /// Opens the pool described by `config` and bootstraps the schema.
    ///
    /// In-memory databases live only as long as their connection, so they are
    /// pinned to a single connection that is never recycled.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?
            .create_if_missing(true);

        let in_memory = config.url.contains(":memory:") || config.url.contains("mode=memory");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
                .max_connections(config.max_connections)
                .acquire_timeout(Duration::from_secs(5))
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        let db = Self { pool: Arc::new(pool) };
        db.run_migrations().await?;
        Ok(db)
    }

    pub async fn run_migrations(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations").run(self.pool.as_ref()).await?;
        info!("Database schema is up to date");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub async fn create_account(&self, new: &NewAccount) -> Result<Account, AppError> {
        let sql = format!(
            "INSERT INTO accounts (username, password_hash, email, first_name, last_name, is_active, date_joined) \
             VALUES (?, ?, ?, ?, ?, 1, ?) RETURNING {}",
            ACCOUNT_COLUMNS
        );
        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(&new.username)
            .bind(&new.password_hash)
            .bind(&new.email)
            .bind(&new.first_name)
            .bind(&new.last_name)
            .bind(Utc::now())
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(account)
    }

    /// Returns the account named `new.username`, inserting it from `new` when
    /// absent. The flag reports whether this call created the row.
    pub async fn get_or_create_account(&self, new: &NewAccount) -> Result<(Account, bool), AppError> {
        let inserted = sqlx::query(
            "INSERT INTO accounts (username, password_hash, email, first_name, last_name, is_active, date_joined) \
             VALUES (?, ?, ?, ?, ?, 1, ?) ON CONFLICT(username) DO NOTHING",
        )
        .bind(&new.username)
        .bind(&new.password_hash)
        .bind(&new.email)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(Utc::now())
        .execute(self.pool.as_ref())
        .await?
        .rows_affected();

        let account = self
            .find_account_by_username(&new.username)
            .await?
            .ok_or(DatabaseError::NotFound)?;

        Ok((account, inserted > 0))
    }

    pub async fn find_account_by_username(&self, username: &str) -> Result<Option<Account>, AppError> {
        let sql = format!("SELECT {} FROM accounts WHERE username = ?", ACCOUNT_COLUMNS);
        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(username)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(account)
    }

    pub async fn find_account_by_id(&self, id: i64) -> Result<Option<Account>, AppError> {
        let sql = format!("SELECT {} FROM accounts WHERE id = ?", ACCOUNT_COLUMNS);
        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(account)
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts WHERE username = ?")
            .bind(username)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count > 0)
    }

    pub async fn count_accounts(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }

    pub async fn touch_last_login(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE accounts SET last_login = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    /// Returns the profile owned by `account_id`, creating it on first access.
    /// `default_phone` only applies when the row is created here.
    pub async fn get_or_create_profile(
        &self,
        account_id: i64,
        default_phone: Option<&str>,
    ) -> Result<Profile, AppError> {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO profiles (account_id, phone_number, bio, created_at, updated_at) \
             VALUES (?, ?, NULL, ?, ?) ON CONFLICT(account_id) DO NOTHING",
        )
        .bind(account_id)
        .bind(default_phone)
        .bind(now)
        .bind(now)
        .execute(self.pool.as_ref())
        .await?;

        let sql = format!("SELECT {} FROM profiles WHERE account_id = ?", PROFILE_COLUMNS);
        let profile = sqlx::query_as::<_, Profile>(&sql)
            .bind(account_id)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(profile)
    }

    pub async fn find_profile(&self, account_id: i64) -> Result<Option<Profile>, AppError> {
        let sql = format!("SELECT {} FROM profiles WHERE account_id = ?", PROFILE_COLUMNS);
        let profile = sqlx::query_as::<_, Profile>(&sql)
            .bind(account_id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(profile)
    }

    /// Writes only the columns present in `changes` and bumps `updated_at`.
    pub async fn update_profile(
        &self,
        account_id: i64,
        changes: &ProfileChanges,
    ) -> Result<Profile, AppError> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE profiles SET updated_at = ");
        query.push_bind(Utc::now());
        if let Some(phone_number) = &changes.phone_number {
            query.push(", phone_number = ").push_bind(phone_number.clone());
        }
        if let Some(bio) = &changes.bio {
            query.push(", bio = ").push_bind(bio.clone());
        }
        query.push(" WHERE account_id = ").push_bind(account_id);
        query.push(" RETURNING ").push(PROFILE_COLUMNS);

        let profile = query
            .build_query_as::<Profile>()
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(profile)
    }
}
