use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteExecutor;
use sqlx::FromRow;

/// `successor_id` cannot start until `predecessor_id` is done.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TaskDependency {
    pub predecessor_id: i64,
    pub successor_id: i64,
    pub created_at: DateTime<Utc>,
}

impl TaskDependency {
    pub async fn find<'e, E: SqliteExecutor<'e>>(
        executor: E,
        predecessor_id: i64,
        successor_id: i64,
    ) -> Result<Option<TaskDependency>, sqlx::Error> {
        sqlx::query_as::<_, TaskDependency>(
            "SELECT * FROM task_dependencies WHERE predecessor_id = ? AND successor_id = ?",
        )
        .bind(predecessor_id)
        .bind(successor_id)
        .fetch_optional(executor)
        .await
    }

    pub async fn insert<'e, E: SqliteExecutor<'e>>(
        executor: E,
        predecessor_id: i64,
        successor_id: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO task_dependencies (predecessor_id, successor_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(predecessor_id)
        .bind(successor_id)
        .bind(Utc::now())
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn delete<'e, E: SqliteExecutor<'e>>(
        executor: E,
        predecessor_id: i64,
        successor_id: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM task_dependencies WHERE predecessor_id = ? AND successor_id = ?")
            .bind(predecessor_id)
            .bind(successor_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// True when `successor_id` already reaches `predecessor_id` through
    /// existing edges, so the new edge would close a loop.
    pub async fn would_create_cycle<'e, E: SqliteExecutor<'e>>(
        executor: E,
        predecessor_id: i64,
        successor_id: i64,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "WITH RECURSIVE downstream(id) AS (
                 SELECT ?
                 UNION
                 SELECT d.successor_id FROM task_dependencies d JOIN downstream ON d.predecessor_id = downstream.id
             )
             SELECT EXISTS (SELECT 1 FROM downstream WHERE id = ?)",
        )
        .bind(successor_id)
        .bind(predecessor_id)
        .fetch_one(executor)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn seeded_pool() -> sqlx::SqlitePool {
        let pool = db::connect("sqlite::memory:", 1).await.unwrap();
        db::init(&pool).await.unwrap();
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO users (username, email, password_hash, created_at, updated_at)
             VALUES ('alice', 'alice@example.com', 'x', ?, ?)",
        )
        .bind(now)
        .bind(now)
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO projects (name, key, creator_id, created_at, updated_at)
             VALUES ('Website', 'WEBS-001', 1, ?, ?)",
        )
        .bind(now)
        .bind(now)
        .execute(&pool)
        .await
        .unwrap();
        for number in 1..=3 {
            sqlx::query(
                "INSERT INTO tasks (project_id, task_number, title, created_at, updated_at)
                 VALUES (1, ?, 'step', ?, ?)",
            )
            .bind(number)
            .bind(now)
            .bind(now)
            .execute(&pool)
            .await
            .unwrap();
        }
        pool
    }

    #[actix_web::test]
    async fn cycles_are_detected_through_the_chain() {
        let pool = seeded_pool().await;
        TaskDependency::insert(&pool, 1, 2).await.unwrap();
        TaskDependency::insert(&pool, 2, 3).await.unwrap();

        assert!(TaskDependency::would_create_cycle(&pool, 3, 1).await.unwrap());
        assert!(TaskDependency::would_create_cycle(&pool, 2, 1).await.unwrap());
        assert!(!TaskDependency::would_create_cycle(&pool, 1, 3).await.unwrap());
    }
}
