use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params_from_iter};

use mira_types::models::MOMENT_PREFIX;
use mira_types::{Dream, Message, MoodEntry, Role};

use crate::models::{DreamRow, MessageRow, MoodRow, UserRow};
use crate::{Database, format_ts};

/// Time range, ordering and row limit applied to a per-user select.
///
/// `since` is inclusive and `until` exclusive, so adjacent ranges never
/// share a row.
#[derive(Debug, Clone, Default)]
pub struct RowFilter {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub oldest_first: bool,
    pub limit: Option<u32>,
}

impl RowFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn newest(limit: u32) -> Self {
        Self::default().limit(limit)
    }

    pub fn between(since: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        Self::default().since(since).until(until)
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn oldest_first(mut self) -> Self {
        self.oldest_first = true;
        self
    }
}

/// Incrementally built `WHERE user_id = ?1 AND ...` statement.
struct Select {
    sql: String,
    params: Vec<String>,
}

impl Select {
    fn new(head: &str, table: &str, user_id: &str) -> Self {
        Self {
            sql: format!("{head} FROM {table} WHERE user_id = ?1"),
            params: vec![user_id.to_string()],
        }
    }

    fn and(mut self, clause: &str, value: String) -> Self {
        self.params.push(value);
        self.sql
            .push_str(&format!(" AND {} ?{}", clause, self.params.len()));
        self
    }

    fn range(mut self, filter: &RowFilter) -> Self {
        if let Some(since) = filter.since {
            self = self.and("created_at >=", format_ts(since));
        }
        if let Some(until) = filter.until {
            self = self.and("created_at <", format_ts(until));
        }
        self
    }

    fn ordered(mut self, filter: &RowFilter) -> Self {
        let dir = if filter.oldest_first { "ASC" } else { "DESC" };
        self.sql
            .push_str(&format!(" ORDER BY created_at {dir}, rowid {dir}"));
        if let Some(limit) = filter.limit {
            self.sql.push_str(&format!(" LIMIT {limit}"));
        }
        self
    }

    fn query<T, F>(&self, conn: &Connection, map: F) -> Result<Vec<T>>
    where
        F: FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
    {
        let mut stmt = conn.prepare(&self.sql)?;
        let rows = stmt
            .query_map(params_from_iter(self.params.iter()), map)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn count(&self, conn: &Connection) -> Result<u64> {
        let n: i64 = conn.query_row(&self.sql, params_from_iter(self.params.iter()), |row| {
            row.get(0)
        })?;
        Ok(n as u64)
    }
}

const MESSAGE_COLUMNS: &str = "SELECT id, user_id, role, content, created_at";
const MOOD_COLUMNS: &str = "SELECT id, user_id, mood, color, created_at";
const DREAM_COLUMNS: &str = "SELECT id, user_id, dream_text, created_at";
const COUNT: &str = "SELECT COUNT(*)";

fn message_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        role: row.get(2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn mood_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MoodRow> {
    Ok(MoodRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        mood: row.get(2)?,
        color: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn dream_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DreamRow> {
    Ok(DreamRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        dream_text: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn message_select(head: &str, user_id: &str, role: Option<Role>) -> Select {
    let select = Select::new(head, "messages", user_id);
    match role {
        Some(role) => select.and("role =", role.as_str().to_string()),
        None => select,
    }
}

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: &str,
        email: &str,
        password_hash: &str,
        created_at: DateTime<Utc>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, password, created_at) VALUES (?1, ?2, ?3, ?4)",
                (id, email, password_hash, format_ts(created_at)),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    /// Returns false when no such user exists.
    pub fn update_password(&self, user_id: &str, password_hash: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE users SET password = ?1 WHERE id = ?2",
                (password_hash, user_id),
            )?;
            Ok(n > 0)
        })
    }

    // -- Password resets --

    pub fn insert_password_reset(
        &self,
        token_hash: &str,
        user_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO password_resets (token_hash, user_id, expires_at) VALUES (?1, ?2, ?3)",
                (token_hash, user_id, format_ts(expires_at)),
            )?;
            Ok(())
        })
    }

    /// Remove a reset token and return its user id if it had not expired by `now`.
    pub fn consume_password_reset(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let found: Option<(String, String)> = conn
                .query_row(
                    "SELECT user_id, expires_at FROM password_resets WHERE token_hash = ?1",
                    [token_hash],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            let Some((user_id, expires_at)) = found else {
                return Ok(None);
            };

            conn.execute(
                "DELETE FROM password_resets WHERE token_hash = ?1",
                [token_hash],
            )?;

            if expires_at > format_ts(now) {
                Ok(Some(user_id))
            } else {
                Ok(None)
            }
        })
    }

    // -- Messages --

    pub fn insert_message(
        &self,
        id: &str,
        user_id: &str,
        role: Role,
        content: &str,
        created_at: DateTime<Utc>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (id, user_id, role, content, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, user_id, role.as_str(), content, format_ts(created_at)),
            )?;
            Ok(())
        })
    }

    pub fn get_messages(
        &self,
        user_id: &str,
        role: Option<Role>,
        filter: &RowFilter,
    ) -> Result<Vec<Message>> {
        self.with_conn(|conn| {
            let rows = message_select(MESSAGE_COLUMNS, user_id, role)
                .range(filter)
                .ordered(filter)
                .query(conn, message_row)?;
            Ok(rows.into_iter().map(MessageRow::into_model).collect())
        })
    }

    /// Moment journal entries, newest first.
    pub fn get_moments(&self, user_id: &str, limit: u32) -> Result<Vec<Message>> {
        let filter = RowFilter::newest(limit);
        self.with_conn(|conn| {
            let rows = message_select(MESSAGE_COLUMNS, user_id, Some(Role::User))
                .and("content LIKE", format!("{MOMENT_PREFIX}%"))
                .ordered(&filter)
                .query(conn, message_row)?;
            Ok(rows.into_iter().map(MessageRow::into_model).collect())
        })
    }

    pub fn count_messages(
        &self,
        user_id: &str,
        role: Option<Role>,
        filter: &RowFilter,
    ) -> Result<u64> {
        self.with_conn(|conn| message_select(COUNT, user_id, role).range(filter).count(conn))
    }

    // -- Moods --

    pub fn insert_mood(
        &self,
        id: &str,
        user_id: &str,
        mood: &str,
        color: &str,
        created_at: DateTime<Utc>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO moods (id, user_id, mood, color, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, user_id, mood, color, format_ts(created_at)),
            )?;
            Ok(())
        })
    }

    pub fn get_moods(&self, user_id: &str, filter: &RowFilter) -> Result<Vec<MoodEntry>> {
        self.with_conn(|conn| {
            let rows = Select::new(MOOD_COLUMNS, "moods", user_id)
                .range(filter)
                .ordered(filter)
                .query(conn, mood_row)?;
            Ok(rows.into_iter().map(MoodRow::into_model).collect())
        })
    }

    pub fn count_moods(&self, user_id: &str, filter: &RowFilter) -> Result<u64> {
        self.with_conn(|conn| Select::new(COUNT, "moods", user_id).range(filter).count(conn))
    }

    // -- Dreams --

    pub fn insert_dream(
        &self,
        id: &str,
        user_id: &str,
        dream_text: &str,
        created_at: DateTime<Utc>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO dreams (id, user_id, dream_text, created_at) VALUES (?1, ?2, ?3, ?4)",
                (id, user_id, dream_text, format_ts(created_at)),
            )?;
            Ok(())
        })
    }

    pub fn get_dreams(&self, user_id: &str, filter: &RowFilter) -> Result<Vec<Dream>> {
        self.with_conn(|conn| {
            let rows = Select::new(DREAM_COLUMNS, "dreams", user_id)
                .range(filter)
                .ordered(filter)
                .query(conn, dream_row)?;
            Ok(rows.into_iter().map(DreamRow::into_model).collect())
        })
    }

    pub fn count_dreams(&self, user_id: &str, filter: &RowFilter) -> Result<u64> {
        self.with_conn(|conn| Select::new(COUNT, "dreams", user_id).range(filter).count(conn))
    }

    // -- Erasure --

    /// Delete every message, mood and dream owned by `user_id`, table by table.
    /// Returns the number of rows removed from each table.
    pub fn erase_user_data(&self, user_id: &str) -> Result<(usize, usize, usize)> {
        self.with_conn(|conn| {
            let messages = conn.execute("DELETE FROM messages WHERE user_id = ?1", [user_id])?;
            let moods = conn.execute("DELETE FROM moods WHERE user_id = ?1", [user_id])?;
            let dreams = conn.execute("DELETE FROM dreams WHERE user_id = ?1", [user_id])?;
            Ok((messages, moods, dreams))
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, email, password, created_at FROM users WHERE {column} = ?1"
    ))?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                email: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
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

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn db_with_user(id: &str) -> Database {
        let db = Database::open_in_memory().unwrap();
        db.create_user(id, &format!("{id}@example.com"), "hash", Utc::now())
            .unwrap();
        db
    }

    fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    #[test]
    fn range_filter_is_half_open() {
        let db = db_with_user("u1");
        let start = Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();

        db.insert_mood(&new_id(), "u1", "Happy", "#f472b6", start).unwrap();
        db.insert_mood(&new_id(), "u1", "Sad", "#8b5cf6", end - Duration::milliseconds(1))
            .unwrap();
        db.insert_mood(&new_id(), "u1", "Calm", "#c084fc", end).unwrap();

        let may = db.get_moods("u1", &RowFilter::between(start, end)).unwrap();
        assert_eq!(may.len(), 2);
        assert_eq!(may[0].mood, "Sad");
        assert_eq!(db.count_moods("u1", &RowFilter::between(start, end)).unwrap(), 2);

        let june = db.get_moods("u1", &RowFilter::all().since(end)).unwrap();
        assert_eq!(june.len(), 1);
        assert_eq!(june[0].mood, "Calm");
    }

    #[test]
    fn messages_filter_by_role_and_limit() {
        let db = db_with_user("u1");
        let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
        for i in 0..4 {
            let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
            db.insert_message(&new_id(), "u1", role, &format!("m{i}"), t0 + Duration::minutes(i))
                .unwrap();
        }

        let users = db.get_messages("u1", Some(Role::User), &RowFilter::all()).unwrap();
        let contents: Vec<&str> = users.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["m2", "m0"]);

        let oldest = db
            .get_messages("u1", None, &RowFilter::newest(1).oldest_first())
            .unwrap();
        assert_eq!(oldest[0].content, "m0");
        assert_eq!(db.count_messages("u1", None, &RowFilter::all()).unwrap(), 4);
    }

    #[test]
    fn moments_are_found_by_prefix() {
        let db = db_with_user("u1");
        db.insert_message(&new_id(), "u1", Role::User, "hello", Utc::now()).unwrap();
        db.insert_message(&new_id(), "u1", Role::User, "[Moment] sunset walk", Utc::now())
            .unwrap();

        let moments = db.get_moments("u1", 3).unwrap();
        assert_eq!(moments.len(), 1);
        assert_eq!(moments[0].moment_text(), "sunset walk");
    }

    #[test]
    fn erase_only_touches_one_user() {
        let db = db_with_user("u1");
        db.create_user("u2", "u2@example.com", "hash", Utc::now()).unwrap();
        for user in ["u1", "u2"] {
            db.insert_message(&new_id(), user, Role::User, "hi", Utc::now()).unwrap();
            db.insert_mood(&new_id(), user, "Calm", "#c084fc", Utc::now()).unwrap();
            db.insert_dream(&new_id(), user, "flying", Utc::now()).unwrap();
        }

        assert_eq!(db.erase_user_data("u1").unwrap(), (1, 1, 1));

        let all = RowFilter::all();
        assert!(db.get_messages("u1", None, &all).unwrap().is_empty());
        assert!(db.get_moods("u1", &all).unwrap().is_empty());
        assert!(db.get_dreams("u1", &all).unwrap().is_empty());
        assert_eq!(db.count_dreams("u2", &all).unwrap(), 1);
    }

    #[test]
    fn reset_tokens_are_single_use_and_expire() {
        let db = db_with_user("u1");
        let now = Utc::now();
        db.insert_password_reset("live", "u1", now + Duration::hours(1)).unwrap();
        db.insert_password_reset("stale", "u1", now - Duration::minutes(1)).unwrap();

        assert_eq!(db.consume_password_reset("live", now).unwrap().as_deref(), Some("u1"));
        assert_eq!(db.consume_password_reset("live", now).unwrap(), None);
        assert_eq!(db.consume_password_reset("stale", now).unwrap(), None);
    }
}
