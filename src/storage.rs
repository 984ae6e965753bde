use crate::errors::StoreResult;
use rusqlite::Connection;
use std::path::Path;
use tracing::info;

const SCHEMA_VERSION: i64 = 1;

pub fn open_database(path: &Path) -> StoreResult<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let conn = Connection::open(path)?;
    initialize_schema(&conn)?;
    info!("database ready at {}", path.display());
    Ok(conn)
}

pub fn open_in_memory() -> StoreResult<Connection> {
    let conn = Connection::open_in_memory()?;
    initialize_schema(&conn)?;
    Ok(conn)
}

pub fn initialize_schema(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if version < 1 {
        apply_migration_1(conn)?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    }

    Ok(())
}

fn apply_migration_1(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS habits (
            id          TEXT PRIMARY KEY,
            title       TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS habit_week_days (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            habit_id  TEXT NOT NULL REFERENCES habits(id),
            week_day  INTEGER NOT NULL CHECK(week_day BETWEEN 0 AND 6)
        );

        CREATE TABLE IF NOT EXISTS days (
            id        TEXT PRIMARY KEY,
            date      TEXT NOT NULL UNIQUE,
            week_day  INTEGER NOT NULL CHECK(week_day BETWEEN 0 AND 6)
        );

        CREATE TABLE IF NOT EXISTS day_habits (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            day_id    TEXT NOT NULL REFERENCES days(id),
            habit_id  TEXT NOT NULL REFERENCES habits(id),
            UNIQUE(day_id, habit_id)
        );

        CREATE INDEX IF NOT EXISTS idx_habit_week_days_day ON habit_week_days(week_day, habit_id);
        CREATE INDEX IF NOT EXISTS idx_day_habits_day ON day_habits(day_id);
        "#,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_is_idempotent() {
        let conn = open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        let version: i64 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
                 AND name IN ('habits', 'habit_week_days', 'days', 'day_habits')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 4);
    }

    #[test]
    fn open_database_creates_parent_directory() {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let mut dir = std::env::temp_dir();
        dir.push(format!("habit_tracker_storage_{}_{}", std::process::id(), nanos));
        let path = dir.join("nested").join("habits.db");

        let conn = open_database(&path).unwrap();
        drop(conn);
        assert!(path.exists());

        std::fs::remove_dir_all(&dir).ok();
    }
}
