use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteExecutor;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub session_id: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
    pub is_persistent: bool,
}

impl Session {
    pub fn lifetime(remember_me: bool) -> Duration {
        if remember_me {
            Duration::days(10)
        } else {
            Duration::minutes(30)
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub async fn create<'e, E: SqliteExecutor<'e>>(
        executor: E,
        user_id: i64,
        remember_me: bool,
    ) -> Result<Session, sqlx::Error> {
        let session = Session {
            session_id: Uuid::new_v4().to_string(),
            user_id,
            expires_at: Utc::now() + Self::lifetime(remember_me),
            is_persistent: remember_me,
        };
        sqlx::query(
            "INSERT INTO sessions (session_id, user_id, expires_at, is_persistent) VALUES (?, ?, ?, ?)",
        )
        .bind(&session.session_id)
        .bind(session.user_id)
        .bind(session.expires_at)
        .bind(session.is_persistent)
        .execute(executor)
        .await?;
        Ok(session)
    }

    pub async fn find<'e, E: SqliteExecutor<'e>>(
        executor: E,
        session_id: &str,
    ) -> Result<Option<Session>, sqlx::Error> {
        sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE session_id = ?")
            .bind(session_id)
            .fetch_optional(executor)
            .await
    }

    pub async fn delete<'e, E: SqliteExecutor<'e>>(
        executor: E,
        session_id: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM sessions WHERE session_id = ?")
            .bind(session_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn delete_expired_for_user<'e, E: SqliteExecutor<'e>>(
        executor: E,
        user_id: i64,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = ? AND expires_at <= ?")
            .bind(user_id)
            .bind(Utc::now())
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_all<'e, E: SqliteExecutor<'e>>(executor: E) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions").execute(executor).await?;
        Ok(result.rows_affected())
    }
}
