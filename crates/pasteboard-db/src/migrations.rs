use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub const LATEST_VERSION: i64 = 1;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);"
    )?;

    let version: i64 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (users, pastes, comments)");
        // Rolled back on drop if any statement fails
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(
            "
            CREATE TABLE users (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL UNIQUE,
                email       TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE pastes (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                external_id TEXT NOT NULL UNIQUE,
                title       TEXT,
                code        TEXT NOT NULL,
                listed      INTEGER NOT NULL DEFAULT 1,
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                user_id     INTEGER REFERENCES users(id) ON DELETE SET NULL,
                reply_to    INTEGER REFERENCES pastes(id) ON DELETE SET NULL
            );

            CREATE INDEX idx_pastes_listed ON pastes(listed, created_at);
            CREATE INDEX idx_pastes_user ON pastes(user_id);

            CREATE TABLE comments (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                message     TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                paste_id    INTEGER NOT NULL REFERENCES pastes(id) ON DELETE CASCADE
            );

            CREATE INDEX idx_comments_paste ON comments(paste_id, created_at);
            CREATE INDEX idx_comments_user ON comments(user_id);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
        tx.commit()?;
    }

    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_exists(conn: &Connection, name: &str) -> bool {
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |r| r.get::<_, i64>(0),
        )
        .unwrap()
            > 0
    }

    #[test]
    fn failed_migration_leaves_no_partial_schema() {
        let conn = Connection::open_in_memory().unwrap();
        // Clashes with the last table v1 creates
        conn.execute_batch("CREATE TABLE comments (id INTEGER PRIMARY KEY);").unwrap();

        assert!(run(&conn).is_err());
        assert!(!table_exists(&conn, "users"));
        assert!(!table_exists(&conn, "pastes"));

        conn.execute_batch("DROP TABLE comments;").unwrap();
        run(&conn).unwrap();
        assert!(table_exists(&conn, "users"));
        assert!(table_exists(&conn, "comments"));
        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(version, LATEST_VERSION);
    }
}
