//! Parcel repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD and client-lookup APIs over the `parcel` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths validate field values before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - `set_address` only succeeds while the parcel is `registered`.
//! - `set_status` only accepts the single forward lifecycle step.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::parcel::{
    validate_address, ClientId, Parcel, ParcelNumber, ParcelStatus, ParcelValidationError,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const PARCEL_SELECT_SQL: &str = "SELECT
    number,
    client,
    status,
    address,
    created_at
FROM parcel";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for parcel persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Field values failed model validation before a write.
    Validation(ParcelValidationError),
    /// Underlying SQLite/bootstrap failure, propagated unchanged.
    Db(DbError),
    /// No parcel row matches the given tracking number.
    NotFound(ParcelNumber),
    /// Address mutation attempted after the parcel left `registered`.
    IllegalMutation {
        number: ParcelNumber,
        status: ParcelStatus,
    },
    /// Status write that is not the single forward lifecycle step.
    IllegalTransition {
        number: ParcelNumber,
        from: ParcelStatus,
        to: ParcelStatus,
    },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from the expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid parcel record.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(number) => write!(f, "parcel not found: {number}"),
            Self::IllegalMutation { number, status } => write!(
                f,
                "parcel {number} address cannot change in status `{status}`"
            ),
            Self::IllegalTransition { number, from, to } => {
                write!(f, "parcel {number} cannot move from `{from}` to `{to}`")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "parcel repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "parcel repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "parcel repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted parcel data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ParcelValidationError> for RepoError {
    fn from(value: ParcelValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for parcel persistence operations.
pub trait ParcelRepository {
    /// Inserts one parcel and returns the engine-assigned tracking number.
    ///
    /// Every field is persisted as given except `number`, which the input
    /// may leave at `0`; any caller-provided value is ignored.
    fn add(&self, parcel: &Parcel) -> RepoResult<ParcelNumber>;
    /// Loads one parcel by tracking number.
    fn get(&self, number: ParcelNumber) -> RepoResult<Parcel>;
    /// Rewrites the delivery address of a still-`registered` parcel.
    fn set_address(&self, number: ParcelNumber, new_address: &str) -> RepoResult<()>;
    /// Moves the parcel one step forward in its lifecycle.
    fn set_status(&self, number: ParcelNumber, new_status: ParcelStatus) -> RepoResult<()>;
    /// Removes one parcel row. Deleting an unknown number is a no-op.
    fn delete(&self, number: ParcelNumber) -> RepoResult<()>;
    /// Lists all parcels of one client, ordered by tracking number.
    fn get_by_client(&self, client: ClientId) -> RepoResult<Vec<Parcel>>;
}

/// SQLite-backed parcel repository.
pub struct SqliteParcelRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteParcelRepository<'conn> {
    /// Creates a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_parcel_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ParcelRepository for SqliteParcelRepository<'_> {
    fn add(&self, parcel: &Parcel) -> RepoResult<ParcelNumber> {
        parcel.validate()?;

        self.conn.execute(
            "INSERT INTO parcel (
                client,
                status,
                address,
                created_at
            ) VALUES (?1, ?2, ?3, ?4);",
            params![
                parcel.client,
                status_to_db(parcel.status),
                parcel.address.as_str(),
                parcel.created_at.as_str(),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn get(&self, number: ParcelNumber) -> RepoResult<Parcel> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PARCEL_SELECT_SQL} WHERE number = ?1;"))?;

        let mut rows = stmt.query([number])?;
        if let Some(row) = rows.next()? {
            return parse_parcel_row(row);
        }

        Err(RepoError::NotFound(number))
    }

    fn set_address(&self, number: ParcelNumber, new_address: &str) -> RepoResult<()> {
        validate_address(new_address)?;

        match current_status(self.conn, number)? {
            None => return Err(RepoError::NotFound(number)),
            Some(status) if !status.allows_address_change() => {
                return Err(RepoError::IllegalMutation { number, status });
            }
            Some(_) => {}
        }

        let changed = self.conn.execute(
            "UPDATE parcel
             SET address = ?2
             WHERE number = ?1
               AND status = 'registered';",
            params![number, new_address],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(number));
        }

        Ok(())
    }

    fn set_status(&self, number: ParcelNumber, new_status: ParcelStatus) -> RepoResult<()> {
        let current = match current_status(self.conn, number)? {
            Some(status) => status,
            None => return Err(RepoError::NotFound(number)),
        };

        if !current.can_advance_to(new_status) {
            return Err(RepoError::IllegalTransition {
                number,
                from: current,
                to: new_status,
            });
        }

        // Guarded by the probed status so the write stays a compare-and-set.
        let changed = self.conn.execute(
            "UPDATE parcel
             SET status = ?2
             WHERE number = ?1
               AND status = ?3;",
            params![number, status_to_db(new_status), status_to_db(current)],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(number));
        }

        Ok(())
    }

    fn delete(&self, number: ParcelNumber) -> RepoResult<()> {
        self.conn
            .execute("DELETE FROM parcel WHERE number = ?1;", [number])?;
        Ok(())
    }

    fn get_by_client(&self, client: ClientId) -> RepoResult<Vec<Parcel>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PARCEL_SELECT_SQL}
             WHERE client = ?1
             ORDER BY number ASC;"
        ))?;

        let mut rows = stmt.query([client])?;
        let mut parcels = Vec::new();
        while let Some(row) = rows.next()? {
            parcels.push(parse_parcel_row(row)?);
        }

        Ok(parcels)
    }
}

fn parse_parcel_row(row: &Row<'_>) -> RepoResult<Parcel> {
    let status_text: String = row.get("status")?;
    let status = parse_status(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid parcel status `{status_text}` in parcel.status"
        ))
    })?;

    let parcel = Parcel {
        number: row.get("number")?,
        client: row.get("client")?,
        status,
        address: row.get("address")?,
        created_at: row.get("created_at")?,
    };
    parcel.validate()?;
    Ok(parcel)
}

fn current_status(conn: &Connection, number: ParcelNumber) -> RepoResult<Option<ParcelStatus>> {
    let value: Option<String> = conn
        .query_row(
            "SELECT status FROM parcel WHERE number = ?1;",
            [number],
            |row| row.get(0),
        )
        .optional()?;

    match value {
        None => Ok(None),
        Some(text) => match parse_status(&text) {
            Some(status) => Ok(Some(status)),
            None => Err(RepoError::InvalidData(format!(
                "invalid parcel status `{text}` in parcel.status"
            ))),
        },
    }
}

fn status_to_db(status: ParcelStatus) -> &'static str {
    match status {
        ParcelStatus::Registered => "registered",
        ParcelStatus::Sent => "sent",
        ParcelStatus::Delivered => "delivered",
    }
}

fn parse_status(value: &str) -> Option<ParcelStatus> {
    match value {
        "registered" => Some(ParcelStatus::Registered),
        "sent" => Some(ParcelStatus::Sent),
        "delivered" => Some(ParcelStatus::Delivered),
        _ => None,
    }
}

fn ensure_parcel_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "parcel")? {
        return Err(RepoError::MissingRequiredTable("parcel"));
    }

    for column in ["number", "client", "status", "address", "created_at"] {
        if !table_has_column(conn, "parcel", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "parcel",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
