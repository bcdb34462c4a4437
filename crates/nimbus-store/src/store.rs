//! Main store implementation.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension};
use time::OffsetDateTime;
use tracing::{debug, info};

use nimbus_types::WeatherObservation;

use crate::error::{Error, Result};
use crate::models::StoredWeather;
use crate::schema;

const WEATHER_COLUMNS: &str = "id, city, zip_code, temperature, description, retrieved_at";

/// SQLite-based store for cached weather records.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| Error::CreateDirectory {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        info!("Opening database at {}", path.display());
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        schema::initialize(&conn)?;

        Ok(Self { conn })
    }

    /// Open the default database location.
    pub fn open_default() -> Result<Self> {
        Self::open(crate::default_db_path())
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    /// Get the cached record for a city, exact match.
    pub fn get_by_city(&self, city: &str) -> Result<Option<StoredWeather>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {WEATHER_COLUMNS} FROM weather WHERE city = ? \
             ORDER BY retrieved_at DESC LIMIT 1",
        ))?;

        let record = stmt.query_row([city], row_to_weather).optional()?;
        Ok(record)
    }

    /// Get the cached record for a postal code, exact match.
    ///
    /// Zip codes are not a reconciliation key; if several rows carry the
    /// same zip the most recently retrieved one wins.
    pub fn get_by_zip(&self, zip_code: &str) -> Result<Option<StoredWeather>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {WEATHER_COLUMNS} FROM weather WHERE zip_code = ? \
             ORDER BY retrieved_at DESC LIMIT 1",
        ))?;

        let record = stmt.query_row([zip_code], row_to_weather).optional()?;
        Ok(record)
    }

    /// Get a record by its row id.
    pub fn get_by_id(&self, id: i64) -> Result<Option<StoredWeather>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {WEATHER_COLUMNS} FROM weather WHERE id = ?"))?;

        let record = stmt.query_row([id], row_to_weather).optional()?;
        Ok(record)
    }

    /// Insert or update the record for an observation's city.
    ///
    /// Reconciles by `city`: an existing row is mutated in place
    /// (temperature, description, retrieved_at, zip_code) keeping its id;
    /// otherwise a new row is inserted. Returns the stored record.
    pub fn upsert(&self, observation: &WeatherObservation) -> Result<StoredWeather> {
        let retrieved_at = observation.retrieved_at.unix_timestamp();

        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM weather WHERE city = ? ORDER BY retrieved_at DESC LIMIT 1",
                [&observation.city],
                |row| row.get(0),
            )
            .optional()?;

        let id = match existing {
            Some(id) => {
                self.conn.execute(
                    "UPDATE weather SET temperature = ?1, description = ?2, \
                     retrieved_at = ?3, zip_code = ?4 WHERE id = ?5",
                    rusqlite::params![
                        observation.temperature_c,
                        observation.description,
                        retrieved_at,
                        observation.zip_code,
                        id
                    ],
                )?;
                debug!("Updated weather record for {}", observation.city);
                id
            }
            None => {
                self.conn.execute(
                    "INSERT INTO weather (city, zip_code, temperature, description, retrieved_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    rusqlite::params![
                        observation.city,
                        observation.zip_code,
                        observation.temperature_c,
                        observation.description,
                        retrieved_at
                    ],
                )?;
                debug!("Inserted weather record for {}", observation.city);
                self.conn.last_insert_rowid()
            }
        };

        self.get_by_id(id)?
            .ok_or_else(|| Error::RecordNotFound(observation.city.clone()))
    }

    /// List the distinct cities currently cached, deduplicated.
    pub fn distinct_cities(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT city FROM weather ORDER BY city")?;

        let cities = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(cities)
    }

    /// List all cached records, newest first.
    pub fn list(&self) -> Result<Vec<StoredWeather>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {WEATHER_COLUMNS} FROM weather ORDER BY retrieved_at DESC",
        ))?;

        let records = stmt
            .query_map([], row_to_weather)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Count cached records.
    pub fn count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM weather", [], |row| row.get(0))?;

        Ok(count as u64)
    }
}

fn row_to_weather(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredWeather> {
    Ok(StoredWeather {
        id: row.get(0)?,
        city: row.get(1)?,
        zip_code: row.get(2)?,
        temperature_c: row.get(3)?,
        description: row.get(4)?,
        retrieved_at: OffsetDateTime::from_unix_timestamp(row.get(5)?).unwrap(),
    })
}
