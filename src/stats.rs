use std::collections::HashMap;
use std::path::Path;

use chrono::Local;
use rusqlite::{params, Connection};

use crate::error::Result;

/// Cross-session per-character mistake counts.
pub trait ErrorStats {
    /// Record one mistake on `character`.
    fn add_error(&mut self, character: char) -> Result<()>;

    /// Characters with the most recorded mistakes, most frequent first.
    fn high_error_chars(&self, limit: usize) -> Result<Vec<(char, u64)>>;

    fn reset_stats(&mut self) -> Result<()>;
}

fn rank(mut counts: Vec<(char, u64)>, limit: usize) -> Vec<(char, u64)> {
    counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    counts.truncate(limit);
    counts
}

/// In-process store, used in tests and when no database can be opened.
#[derive(Debug, Default, Clone)]
pub struct MemoryErrorStats {
    counts: HashMap<char, u64>,
}

impl MemoryErrorStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, character: char) -> u64 {
        self.counts.get(&character).copied().unwrap_or(0)
    }
}

impl ErrorStats for MemoryErrorStats {
    fn add_error(&mut self, character: char) -> Result<()> {
        *self.counts.entry(character).or_insert(0) += 1;
        Ok(())
    }

    fn high_error_chars(&self, limit: usize) -> Result<Vec<(char, u64)>> {
        Ok(rank(self.counts.iter().map(|(&c, &n)| (c, n)).collect(), limit))
    }

    fn reset_stats(&mut self) -> Result<()> {
        self.counts.clear();
        Ok(())
    }
}

/// SQLite-backed store of error counts
#[derive(Debug)]
pub struct SqliteErrorStats {
    conn: Connection,
}

impl SqliteErrorStats {
    /// Open (or create) the database at `path`, creating parent directories.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS error_counts (
                character TEXT PRIMARY KEY,
                count INTEGER NOT NULL DEFAULT 0,
                last_seen TEXT NOT NULL
            )
            "#,
            [],
        )?;

        Ok(Self { conn })
    }

    pub fn count(&self, character: char) -> Result<u64> {
        let mut stmt = self
            .conn
            .prepare("SELECT count FROM error_counts WHERE character = ?1")?;
        let mut rows = stmt.query([character.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(row.get::<_, i64>(0)? as u64),
            None => Ok(0),
        }
    }
}

impl ErrorStats for SqliteErrorStats {
    fn add_error(&mut self, character: char) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO error_counts (character, count, last_seen)
            VALUES (?1, 1, ?2)
            ON CONFLICT(character) DO UPDATE SET
                count = count + 1,
                last_seen = excluded.last_seen
            "#,
            params![character.to_string(), Local::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn high_error_chars(&self, limit: usize) -> Result<Vec<(char, u64)>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT character, count
            FROM error_counts
            ORDER BY count DESC, character ASC
            LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map([limit as i64], |row| {
            let char_str: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            Ok((char_str.chars().next().unwrap_or('\0'), count as u64))
        })?;

        let mut ranked = Vec::new();
        for row in rows {
            ranked.push(row?);
        }
        Ok(ranked)
    }

    fn reset_stats(&mut self) -> Result<()> {
        self.conn.execute("DELETE FROM error_counts", [])?;
        Ok(())
    }
}

impl<T: ErrorStats + ?Sized> ErrorStats for Box<T> {
    fn add_error(&mut self, character: char) -> Result<()> {
        (**self).add_error(character)
    }

    fn high_error_chars(&self, limit: usize) -> Result<Vec<(char, u64)>> {
        (**self).high_error_chars(limit)
    }

    fn reset_stats(&mut self) -> Result<()> {
        (**self).reset_stats()
    }
}
