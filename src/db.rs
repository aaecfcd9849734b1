//! SQLite persistence for enriched chats.
//!
//! Each run rebuilds the `chat` table and writes every message in a single
//! transaction. Unknown values are stored as NULL.

use std::fs;
use std::path::Path;

use rusqlite::{params, Connection, Statement};
use tracing::{debug, error};

use crate::error::Result;
use crate::models::{Chat, Message};
use crate::schema::chat;

/// SQLite sink for an enriched chat.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database file and recreate the `chat` table.
    pub fn open(path: &Path) -> Result<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::run_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// In-memory database, mostly useful in tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::run_migrations(&conn)?;
        Ok(Self { conn })
    }

    fn run_migrations(conn: &Connection) -> Result<()> {
        conn.execute_batch(include_str!("../migrations/2026-10-19-000000_create_chat/up.sql"))?;
        Ok(())
    }

    /// Borrow the underlying connection for queries.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Write one row per message. A row that fails to insert is logged and
    /// skipped; the returned count covers only rows actually written.
    pub fn store_chat(&mut self, chat: &Chat) -> Result<usize> {
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            chat::TABLE,
            chat::COLUMNS.join(", "),
            vec!["?"; chat::COLUMNS.len()].join(", ")
        );

        let tx = self.conn.transaction()?;
        let mut written = 0;
        {
            let mut stmt = tx.prepare(&sql)?;
            for message in chat.messages() {
                match insert_message(&mut stmt, message) {
                    Ok(_) => written += 1,
                    Err(e) => error!(
                        message_id = ?message.message_id,
                        error = %e,
                        "error while inserting message to db"
                    ),
                }
            }
        }
        tx.commit()?;

        debug!(rows = written, "messages stored");
        Ok(written)
    }
}

fn insert_message(stmt: &mut Statement<'_>, message: &Message) -> rusqlite::Result<usize> {
    let (latitude, longitude) = message
        .geo_position
        .as_ref()
        .and_then(|g| g.coordinates())
        .unzip();
    let media = message.media.as_ref();
    let sender = message.sender_contact.as_ref();

    stmt.execute(params![
        message.message_id,
        message.from_me,
        latitude,
        longitude,
        message.key_id,
        media.and_then(|m| m.file_path.as_deref()),
        media.and_then(|m| m.media_job_uuid.as_deref()),
        media.and_then(|m| m.mime_type.as_deref()),
        media.and_then(|m| m.transcription.as_deref()),
        media.and_then(|m| m.audio_length_seconds),
        media.and_then(|m| m.file_size_byte),
        message.chat_id,
        message.reply_to,
        sender.and_then(|s| s.name.as_deref()),
        sender.and_then(|s| s.number.as_deref()),
        sender.and_then(|s| s.raw_string_jid.as_deref()),
        message.text_data,
        message.timestamp,
    ])
}
