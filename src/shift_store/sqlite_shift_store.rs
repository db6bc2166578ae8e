use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema, BASE_DB_VERSION,
    DEFAULT_TIMESTAMP,
};
use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::{
    path::Path,
    sync::{Arc, Mutex},
};
use tracing::info;

use super::models::{
    Application, ApplicationStatus, Shift, ShiftChanges, ShiftDraft, ShiftStatus,
    WorkerApplication,
};
use super::trait_def::ShiftStore;

/// V 0
const SHIFT_TABLE_V_0: Table = Table {
    name: "shift",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!("owner_id", &SqlType::Integer, non_null = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("description", &SqlType::Text),
        sqlite_column!("pay_rate", &SqlType::Real, non_null = true),
        sqlite_column!("lat", &SqlType::Real, non_null = true),
        sqlite_column!("lng", &SqlType::Real, non_null = true),
        sqlite_column!("status", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[],
    indices: &[
        ("idx_shift_owner_id", "owner_id"),
        ("idx_shift_status", "status"),
    ],
};

// worker_id refers to the user store, which lives in a separate database,
// so it cannot carry a foreign key here.
const APPLICATION_TABLE_V_0: Table = Table {
    name: "application",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!(
            "shift_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "shift",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("worker_id", &SqlType::Integer, non_null = true),
        sqlite_column!("status", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[&["shift_id", "worker_id"]],
    indices: &[
        ("idx_application_shift_id", "shift_id"),
        ("idx_application_worker_id", "worker_id"),
    ],
};

const VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[SHIFT_TABLE_V_0, APPLICATION_TABLE_V_0],
    migration: None,
}];

#[derive(Clone)]
pub struct SqliteShiftStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteShiftStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let conn = if db_path.as_ref().exists() {
            Connection::open_with_flags(
                db_path,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                    | rusqlite::OpenFlags::SQLITE_OPEN_URI
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?
        } else {
            let conn = Connection::open(db_path)?;
            VERSIONED_SCHEMAS.last().unwrap().create(&conn)?;
            conn
        };
        conn.execute("PRAGMA foreign_keys = ON;", [])?;

        let db_version = conn
            .query_row("PRAGMA user_version;", [], |row| row.get::<usize, i64>(0))
            .context("Failed to read database version")?
            - BASE_DB_VERSION as i64;

        if db_version < 0 {
            bail!(
                "Database version {} is not a shift store database",
                db_version
            );
        }
        let version = db_version as usize;

        if version >= VERSIONED_SCHEMAS.len() {
            bail!("Database version {} is too new", version);
        }
        VERSIONED_SCHEMAS
            .get(version)
            .context("Failed to get schema")?
            .validate(&conn)?;

        Self::migrate_if_needed(&conn, version)?;

        Ok(SqliteShiftStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn migrate_if_needed(conn: &Connection, version: usize) -> Result<()> {
        let mut latest_from = version;
        for schema in VERSIONED_SCHEMAS.iter().skip(version + 1) {
            if let Some(migration_fn) = schema.migration {
                info!(
                    "Migrating shift db from version {} to {}",
                    latest_from, schema.version
                );
                migration_fn(conn)?;
                latest_from = schema.version;
            }
        }
        conn.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + latest_from),
            [],
        )?;
        Ok(())
    }
}

const SHIFT_COLUMNS: &str = "id, owner_id, title, description, pay_rate, lat, lng, status, created";

fn row_to_shift(row: &rusqlite::Row) -> rusqlite::Result<Shift> {
    let status: String = row.get(7)?;
    Ok(Shift {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        pay_rate: row.get(4)?,
        lat: row.get(5)?,
        lng: row.get(6)?,
        status: ShiftStatus::from_str(&status).ok_or_else(|| {
            rusqlite::Error::InvalidColumnType(7, status, rusqlite::types::Type::Text)
        })?,
        created: row.get(8)?,
    })
}

const APPLICATION_COLUMNS: &str = "id, shift_id, worker_id, status, created";

fn row_to_application(row: &rusqlite::Row) -> rusqlite::Result<Application> {
    let status: String = row.get(3)?;
    Ok(Application {
        id: row.get(0)?,
        shift_id: row.get(1)?,
        worker_id: row.get(2)?,
        status: ApplicationStatus::from_str(&status).ok_or_else(|| {
            rusqlite::Error::InvalidColumnType(3, status, rusqlite::types::Type::Text)
        })?,
        created: row.get(4)?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::ConstraintViolation)
    )
}

impl ShiftStore for SqliteShiftStore {
    fn create_shift(&self, draft: ShiftDraft) -> Result<Shift> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT INTO {} (owner_id, title, description, pay_rate, lat, lng, status) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                SHIFT_TABLE_V_0.name
            ),
            params![
                draft.owner_id,
                draft.title,
                draft.description,
                draft.pay_rate,
                draft.lat,
                draft.lng,
                ShiftStatus::Open.as_str()
            ],
        )
        .context("Failed to insert shift")?;
        let shift_id = conn.last_insert_rowid();

        conn.query_row(
            &format!(
                "SELECT {} FROM {} WHERE id = ?1",
                SHIFT_COLUMNS, SHIFT_TABLE_V_0.name
            ),
            params![shift_id],
            row_to_shift,
        )
        .context("Failed to read back created shift")
    }

    fn get_shift(&self, shift_id: i64) -> Result<Option<Shift>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                &format!(
                    "SELECT {} FROM {} WHERE id = ?1",
                    SHIFT_COLUMNS, SHIFT_TABLE_V_0.name
                ),
                params![shift_id],
                row_to_shift,
            )
            .optional()?)
    }

    fn get_shifts_by_owner(&self, owner_id: i64) -> Result<Vec<Shift>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} WHERE owner_id = ?1 ORDER BY created DESC, id DESC",
            SHIFT_COLUMNS, SHIFT_TABLE_V_0.name
        ))?;
        let shifts = stmt
            .query_map(params![owner_id], row_to_shift)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(shifts)
    }

    fn get_open_shifts(&self) -> Result<Vec<Shift>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} WHERE status = ?1",
            SHIFT_COLUMNS, SHIFT_TABLE_V_0.name
        ))?;
        let shifts = stmt
            .query_map(params![ShiftStatus::Open.as_str()], row_to_shift)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(shifts)
    }

    fn update_shift(&self, shift_id: i64, changes: &ShiftChanges) -> Result<Option<Shift>> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            &format!(
                "UPDATE {} SET title = ?1, description = ?2, pay_rate = ?3, lat = ?4, lng = ?5 \
                 WHERE id = ?6",
                SHIFT_TABLE_V_0.name
            ),
            params![
                changes.title,
                changes.description,
                changes.pay_rate,
                changes.lat,
                changes.lng,
                shift_id
            ],
        )?;
        if updated == 0 {
            return Ok(None);
        }
        Ok(conn
            .query_row(
                &format!(
                    "SELECT {} FROM {} WHERE id = ?1",
                    SHIFT_COLUMNS, SHIFT_TABLE_V_0.name
                ),
                params![shift_id],
                row_to_shift,
            )
            .optional()?)
    }

    fn update_shift_status(&self, shift_id: i64, status: ShiftStatus) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!("UPDATE {} SET status = ?1 WHERE id = ?2", SHIFT_TABLE_V_0.name),
            params![status.as_str(), shift_id],
        )
        .with_context(|| format!("Failed to update status of shift {}", shift_id))?;
        Ok(())
    }

    fn delete_shift(&self, shift_id: i64) -> Result<bool> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            &format!(
                "DELETE FROM {} WHERE shift_id = ?1",
                APPLICATION_TABLE_V_0.name
            ),
            params![shift_id],
        )?;
        let deleted = tx.execute(
            &format!("DELETE FROM {} WHERE id = ?1", SHIFT_TABLE_V_0.name),
            params![shift_id],
        )?;
        tx.commit()?;
        Ok(deleted > 0)
    }

    fn create_application(&self, shift_id: i64, worker_id: i64) -> Result<Option<Application>> {
        let conn = self.conn.lock().unwrap();
        let inserted = conn.execute(
            &format!(
                "INSERT INTO {} (shift_id, worker_id, status) VALUES (?1, ?2, ?3)",
                APPLICATION_TABLE_V_0.name
            ),
            params![shift_id, worker_id, ApplicationStatus::Pending.as_str()],
        );
        match inserted {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => return Ok(None),
            Err(err) => return Err(err).context("Failed to insert application"),
        }
        let application_id = conn.last_insert_rowid();

        conn.query_row(
            &format!(
                "SELECT {} FROM {} WHERE id = ?1",
                APPLICATION_COLUMNS, APPLICATION_TABLE_V_0.name
            ),
            params![application_id],
            row_to_application,
        )
        .context("Failed to read back created application")
        .map(Some)
    }

    fn get_application(&self, application_id: i64) -> Result<Option<Application>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                &format!(
                    "SELECT {} FROM {} WHERE id = ?1",
                    APPLICATION_COLUMNS, APPLICATION_TABLE_V_0.name
                ),
                params![application_id],
                row_to_application,
            )
            .optional()?)
    }

    fn get_applications_by_worker(&self, worker_id: i64) -> Result<Vec<WorkerApplication>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT a.id, a.shift_id, a.worker_id, a.status, a.created, s.title, s.pay_rate \
             FROM {} a JOIN {} s ON a.shift_id = s.id \
             WHERE a.worker_id = ?1 ORDER BY a.created DESC, a.id DESC",
            APPLICATION_TABLE_V_0.name, SHIFT_TABLE_V_0.name
        ))?;
        let applications = stmt
            .query_map(params![worker_id], |row| {
                let status: String = row.get(3)?;
                Ok(WorkerApplication {
                    id: row.get(0)?,
                    shift_id: row.get(1)?,
                    worker_id: row.get(2)?,
                    status: ApplicationStatus::from_str(&status).ok_or_else(|| {
                        rusqlite::Error::InvalidColumnType(3, status, rusqlite::types::Type::Text)
                    })?,
                    created: row.get(4)?,
                    shift_title: row.get(5)?,
                    shift_pay_rate: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(applications)
    }

    fn get_applications_by_shift(&self, shift_id: i64) -> Result<Vec<Application>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} WHERE shift_id = ?1 ORDER BY created ASC, id ASC",
            APPLICATION_COLUMNS, APPLICATION_TABLE_V_0.name
        ))?;
        let applications = stmt
            .query_map(params![shift_id], row_to_application)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(applications)
    }

    fn update_application_status(
        &self,
        application_id: i64,
        status: ApplicationStatus,
    ) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "UPDATE {} SET status = ?1 WHERE id = ?2",
                APPLICATION_TABLE_V_0.name
            ),
            params![status.as_str(), application_id],
        )
        .with_context(|| format!("Failed to update status of application {}", application_id))?;
        Ok(())
    }

    fn accept_application(&self, application_id: i64, shift_id: i64) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            &format!(
                "UPDATE {} SET status = ?1 WHERE id = ?2",
                APPLICATION_TABLE_V_0.name
            ),
            params![ApplicationStatus::Accepted.as_str(), application_id],
        )?;
        tx.execute(
            &format!("UPDATE {} SET status = ?1 WHERE id = ?2", SHIFT_TABLE_V_0.name),
            params![ShiftStatus::Filled.as_str(), shift_id],
        )?;
        tx.commit()
            .with_context(|| format!("Failed to accept application {}", application_id))
    }

    fn delete_application(&self, application_id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1", APPLICATION_TABLE_V_0.name),
            params![application_id],
        )?;
        Ok(deleted > 0)
    }
}
