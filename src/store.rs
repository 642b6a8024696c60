use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use serde::Serialize;

use crate::model::AutofillResponse;
use crate::util::{ensure_directory, now_utc_string};

pub const STORE_SCHEMA_VERSION: &str = "0.1.0";

#[derive(Debug, Clone)]
pub struct ExtractionRecord<'a> {
    pub extraction_id: &'a str,
    pub source_path: &'a str,
    pub sha256: &'a str,
    pub format: &'a str,
    pub response: &'a AutofillResponse,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractionSummary {
    pub extraction_id: String,
    pub source_path: String,
    pub format: String,
    pub extracted_at: String,
    pub field_count: i64,
    pub meeting_room_count: i64,
    pub hotel_name: Option<String>,
}

pub fn open_store(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
    {
        ensure_directory(parent)?;
    }

    let connection = Connection::open(db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    configure_connection(&connection)?;
    ensure_schema(&connection)?;
    Ok(connection)
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

pub fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS metadata (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS extractions (
              extraction_id TEXT PRIMARY KEY,
              source_path TEXT NOT NULL,
              sha256 TEXT NOT NULL,
              format TEXT NOT NULL,
              extracted_at TEXT NOT NULL,
              field_count INTEGER NOT NULL,
              meeting_room_count INTEGER NOT NULL,
              hotel_name TEXT,
              fields_json TEXT NOT NULL,
              facts_json TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_extractions_sha256 ON extractions(sha256);
            ",
        )
        .context("failed to create store schema")?;

    connection
        .execute(
            "INSERT OR REPLACE INTO metadata(key, value) VALUES('schema_version', ?1)",
            params![STORE_SCHEMA_VERSION],
        )
        .context("failed to record store schema version")?;

    Ok(())
}

pub fn record_extraction(connection: &Connection, record: &ExtractionRecord<'_>) -> Result<()> {
    let fields_json = serde_json::to_string(&record.response.fields)
        .context("failed to serialize extracted fields")?;
    let facts_json = serde_json::to_string(&record.response.facts)
        .context("failed to serialize extracted facts")?;

    connection
        .execute(
            "INSERT INTO extractions(
               extraction_id, source_path, sha256, format, extracted_at,
               field_count, meeting_room_count, hotel_name, fields_json, facts_json
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                record.extraction_id,
                record.source_path,
                record.sha256,
                record.format,
                now_utc_string(),
                record.response.fields.len() as i64,
                record.response.facts.meeting_rooms.len() as i64,
                record.response.fields.get("hotel_name"),
                fields_json,
                facts_json,
            ],
        )
        .with_context(|| format!("failed to record extraction {}", record.extraction_id))?;

    Ok(())
}

pub fn count_rows(connection: &Connection, sql: &str) -> Result<i64> {
    let count = connection
        .query_row(sql, [], |row| row.get(0))
        .with_context(|| format!("failed to count rows: {sql}"))?;
    Ok(count)
}

pub fn recent_extractions(connection: &Connection, limit: usize) -> Result<Vec<ExtractionSummary>> {
    let mut statement = connection
        .prepare(
            "SELECT extraction_id, source_path, format, extracted_at,
                    field_count, meeting_room_count, hotel_name
             FROM extractions
             ORDER BY extracted_at DESC, extraction_id DESC
             LIMIT ?1",
        )
        .context("failed to prepare recent extractions query")?;

    let rows = statement
        .query_map(params![limit as i64], |row| {
            Ok(ExtractionSummary {
                extraction_id: row.get(0)?,
                source_path: row.get(1)?,
                format: row.get(2)?,
                extracted_at: row.get(3)?,
                field_count: row.get(4)?,
                meeting_room_count: row.get(5)?,
                hotel_name: row.get(6)?,
            })
        })
        .context("failed to query recent extractions")?;

    rows.collect::<rusqlite::Result<Vec<ExtractionSummary>>>()
        .context("failed to read recent extractions")
}

pub fn load_response(connection: &Connection, extraction_id: &str) -> Result<AutofillResponse> {
    let (fields_json, facts_json): (String, String) = connection
        .query_row(
            "SELECT fields_json, facts_json FROM extractions WHERE extraction_id = ?1",
            params![extraction_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .with_context(|| format!("failed to load extraction {extraction_id}"))?;

    Ok(AutofillResponse {
        fields: serde_json::from_str(&fields_json)
            .with_context(|| format!("failed to parse fields of {extraction_id}"))?,
        facts: serde_json::from_str(&facts_json)
            .with_context(|| format!("failed to parse facts of {extraction_id}"))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HotelFacts, MeetingRoom};

    fn sample_response() -> AutofillResponse {
        let mut response = AutofillResponse {
            fields: Default::default(),
            facts: HotelFacts {
                total_guestrooms: Some(250),
                total_meeting_space_sqft: Some(12_000),
                meeting_rooms: vec![MeetingRoom {
                    sqft: Some(3456),
                    ..MeetingRoom::named("Grand Ballroom")
                }],
            },
        };
        response
            .fields
            .insert("hotel_name".to_string(), "The Capitol Inn".to_string());
        response
            .fields
            .insert("rooms_total".to_string(), "250".to_string());
        response
    }

    #[test]
    fn record_extraction_round_trips_through_sqlite() {
        let connection = Connection::open_in_memory().expect("in-memory sqlite opens");
        ensure_schema(&connection).expect("schema applies");

        let response = sample_response();
        record_extraction(
            &connection,
            &ExtractionRecord {
                extraction_id: "ext-1",
                source_path: "sheets/capitol.docx",
                sha256: "abc123",
                format: "docx",
                response: &response,
            },
        )
        .expect("record inserts");

        let count = count_rows(&connection, "SELECT COUNT(*) FROM extractions").expect("count");
        assert_eq!(count, 1);

        let recent = recent_extractions(&connection, 5).expect("recent query");
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].hotel_name.as_deref(), Some("The Capitol Inn"));
        assert_eq!(recent[0].meeting_room_count, 1);
        assert_eq!(recent[0].field_count, 2);

        let loaded = load_response(&connection, "ext-1").expect("response loads");
        assert_eq!(loaded, response);
    }

    #[test]
    fn duplicate_extraction_id_is_rejected() {
        let connection = Connection::open_in_memory().expect("in-memory sqlite opens");
        ensure_schema(&connection).expect("schema applies");

        let response = sample_response();
        let record = ExtractionRecord {
            extraction_id: "ext-1",
            source_path: "sheets/capitol.docx",
            sha256: "abc123",
            format: "docx",
            response: &response,
        };
        record_extraction(&connection, &record).expect("first record inserts");

        assert!(record_extraction(&connection, &record).is_err());
        let count = count_rows(&connection, "SELECT COUNT(*) FROM extractions").expect("count");
        assert_eq!(count, 1);
    }

    #[test]
    fn ensure_schema_is_repeatable() {
        let connection = Connection::open_in_memory().expect("in-memory sqlite opens");
        ensure_schema(&connection).expect("first apply");
        ensure_schema(&connection).expect("second apply");

        let version: String = connection
            .query_row(
                "SELECT value FROM metadata WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .expect("schema version recorded");
        assert_eq!(version, STORE_SCHEMA_VERSION);
    }
}
