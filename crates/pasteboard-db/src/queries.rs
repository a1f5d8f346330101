use crate::models::{CommentRow, PasteRow, UserRow};
use crate::Database;
use anyhow::{Result, anyhow};
use pasteboard_types::models::EXTERNAL_ID_LEN;
use rusqlite::{Connection, Row};
use tracing::warn;
use uuid::Uuid;

/// Fresh external ids are drawn this many times before giving up on a collision.
const EXTERNAL_ID_ATTEMPTS: usize = 5;

const PASTE_COLUMNS: &str =
    "p.id, p.external_id, p.title, p.code, p.listed, p.created_at, p.user_id, u.name, p.reply_to
     FROM pastes p
     LEFT JOIN users u ON p.user_id = u.id";

const COMMENT_COLUMNS: &str =
    "c.id, c.message, c.created_at, c.user_id, u.name, c.paste_id, p.external_id
     FROM comments c
     JOIN users u ON c.user_id = u.id
     JOIN pastes p ON c.paste_id = p.id";

/// Values supplied when a paste is submitted; ids and timestamps are assigned here.
pub struct NewPaste<'a> {
    pub title: Option<&'a str>,
    pub code: &'a str,
    pub listed: bool,
    pub user_id: Option<i64>,
    pub reply_to: Option<i64>,
}

impl Database {
    // -- Users --

    pub fn create_user(&self, name: &str, email: &str, password_hash: &str) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (name, email, password) VALUES (?1, ?2, ?3)",
                (name, email, password_hash),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_name(&self, name: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "name", name))
    }

    pub fn count_users(&self) -> Result<i64> {
        self.with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?))
    }

    /// Administrative removal. Comments go with the user; pastes are kept ownerless.
    pub fn delete_user(&self, id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let removed = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
            Ok(removed > 0)
        })
    }

    // -- Pastes --

    pub fn insert_paste(&self, paste: &NewPaste<'_>) -> Result<PasteRow> {
        self.with_conn_mut(|conn| {
            for _ in 0..EXTERNAL_ID_ATTEMPTS {
                let external_id = new_external_id();
                let inserted = conn.execute(
                    "INSERT INTO pastes (external_id, title, code, listed, user_id, reply_to)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    rusqlite::params![
                        &external_id,
                        paste.title,
                        paste.code,
                        paste.listed,
                        paste.user_id,
                        paste.reply_to,
                    ],
                );

                match inserted {
                    Ok(_) => {
                        let id = conn.last_insert_rowid();
                        return query_paste_by_id(conn, id)?
                            .ok_or_else(|| anyhow!("Inserted paste {} not found", id));
                    }
                    Err(e) if is_external_id_collision(&e) => {
                        warn!("External id collision on '{}', drawing another", external_id);
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            Err(anyhow!("No free external id after {} attempts", EXTERNAL_ID_ATTEMPTS))
        })
    }

    pub fn get_paste(&self, id: i64) -> Result<Option<PasteRow>> {
        self.with_conn(|conn| query_paste_by_id(conn, id))
    }

    pub fn get_paste_by_external_id(&self, external_id: &str) -> Result<Option<PasteRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {PASTE_COLUMNS} WHERE p.external_id = ?1");
            conn.query_row(&sql, [external_id], map_paste).optional()
        })
    }

    /// Most recently created paste owned by the user.
    pub fn latest_paste_for_user(&self, user_id: i64) -> Result<Option<PasteRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {PASTE_COLUMNS} WHERE p.user_id = ?1 ORDER BY p.created_at DESC, p.id DESC LIMIT 1"
            );
            conn.query_row(&sql, [user_id], map_paste).optional()
        })
    }

    pub fn pastes_for_user(&self, user_id: i64) -> Result<Vec<PasteRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {PASTE_COLUMNS} WHERE p.user_id = ?1 ORDER BY p.created_at DESC, p.id DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id], map_paste)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Pastes that name `paste_id` as their reply-to parent, oldest first.
    pub fn replies_to(&self, paste_id: i64) -> Result<Vec<PasteRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {PASTE_COLUMNS} WHERE p.reply_to = ?1 ORDER BY p.created_at ASC, p.id ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([paste_id], map_paste)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// One page of listed pastes, newest first, with the total listed count.
    /// Pages are 1-based.
    pub fn listed_pastes(&self, page: u32, per_page: u32) -> Result<(Vec<PasteRow>, u64)> {
        let offset = u64::from(page.max(1) - 1) * u64::from(per_page);
        self.with_conn(|conn| {
            let total: i64 =
                conn.query_row("SELECT COUNT(*) FROM pastes WHERE listed = 1", [], |r| r.get(0))?;

            let sql = format!(
                "SELECT {PASTE_COLUMNS} WHERE p.listed = 1
                 ORDER BY p.created_at DESC, p.id DESC
                 LIMIT ?1 OFFSET ?2"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params![per_page, offset as i64], map_paste)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok((rows, total as u64))
        })
    }

    pub fn all_listed_pastes(&self) -> Result<Vec<PasteRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {PASTE_COLUMNS} WHERE p.listed = 1 ORDER BY p.id ASC");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], map_paste)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Deletes the paste; its comments cascade.
    pub fn delete_paste(&self, id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let removed = conn.execute("DELETE FROM pastes WHERE id = ?1", [id])?;
            Ok(removed > 0)
        })
    }

    // -- Comments --

    /// Fails with a foreign-key error when the user or paste does not exist.
    pub fn insert_comment(&self, message: &str, user_id: i64, paste_id: i64) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO comments (message, user_id, paste_id) VALUES (?1, ?2, ?3)",
                rusqlite::params![message, user_id, paste_id],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn comments_for_paste(&self, paste_id: i64) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {COMMENT_COLUMNS} WHERE c.paste_id = ?1 ORDER BY c.created_at ASC, c.id ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([paste_id], map_comment)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn comments_for_user(&self, user_id: i64) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {COMMENT_COLUMNS} WHERE c.user_id = ?1 ORDER BY c.created_at DESC, c.id DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id], map_comment)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_comments_for_paste(&self, paste_id: i64) -> Result<i64> {
        self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM comments WHERE paste_id = ?1",
                [paste_id],
                |r| r.get(0),
            )?)
        })
    }
}

fn new_external_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(EXTERNAL_ID_LEN);
    id
}

fn is_external_id_collision(e: &rusqlite::Error) -> bool {
    match e {
        rusqlite::Error::SqliteFailure(err, Some(msg)) => {
            err.code == rusqlite::ErrorCode::ConstraintViolation && msg.contains("external_id")
        }
        _ => false,
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    // `column` is always a literal from this module
    let sql = format!("SELECT id, name, email, password, created_at FROM users WHERE {column} = ?1");
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
                password: row.get(3)?,
                created_at: row.get(4)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_paste_by_id(conn: &Connection, id: i64) -> Result<Option<PasteRow>> {
    let sql = format!("SELECT {PASTE_COLUMNS} WHERE p.id = ?1");
    conn.query_row(&sql, [id], map_paste).optional()
}

fn map_paste(row: &Row<'_>) -> rusqlite::Result<PasteRow> {
    Ok(PasteRow {
        id: row.get(0)?,
        external_id: row.get(1)?,
        title: row.get(2)?,
        code: row.get(3)?,
        listed: row.get(4)?,
        created_at: row.get(5)?,
        user_id: row.get(6)?,
        author_name: row.get(7)?,
        reply_to: row.get(8)?,
    })
}

fn map_comment(row: &Row<'_>) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get(0)?,
        message: row.get(1)?,
        created_at: row.get(2)?,
        user_id: row.get(3)?,
        author_name: row.get(4)?,
        paste_id: row.get(5)?,
        paste_external_id: row.get(6)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
