use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema, BASE_DB_VERSION,
    DEFAULT_TIMESTAMP,
};
use crate::user::auth::{ShiftKerjaHasher, UserCredentials};
use crate::user::{NewUser, User, UserRole, UserStore};
use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::{
    path::Path,
    str::FromStr,
    sync::{Arc, Mutex},
};
use tracing::info;

/// V 0
const USER_TABLE_V_0: Table = Table {
    name: "user",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!("email", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("full_name", &SqlType::Text, non_null = true),
        sqlite_column!("role", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[],
    indices: &[("idx_user_email", "email")],
};

const USER_PASSWORD_CREDENTIALS_V_0: Table = Table {
    name: "user_password_credentials",
    columns: &[
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "user",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("salt", &SqlType::Text, non_null = true),
        sqlite_column!("hash", &SqlType::Text, non_null = true),
        sqlite_column!("hasher", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[],
    indices: &[("idx_user_password_credentials_user_id", "user_id")],
};

const VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[USER_TABLE_V_0, USER_PASSWORD_CREDENTIALS_V_0],
    migration: None,
}];

#[derive(Clone)]
pub struct SqliteUserStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteUserStore {
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

        let db_version = conn
            .query_row("PRAGMA user_version;", [], |row| row.get::<usize, i64>(0))
            .context("Failed to read database version")?
            - BASE_DB_VERSION as i64;

        if db_version < 0 {
            bail!("Database version {} is not a user store database", db_version);
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

        Ok(SqliteUserStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn migrate_if_needed(conn: &Connection, version: usize) -> Result<()> {
        let mut latest_from = version;
        for schema in VERSIONED_SCHEMAS.iter().skip(version + 1) {
            if let Some(migration_fn) = schema.migration {
                info!(
                    "Migrating user db from version {} to {}",
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

fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<(i64, String, String, String, i64)> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
    ))
}

fn build_user((id, email, full_name, role, created): (i64, String, String, String, i64)) -> Result<User> {
    let role = UserRole::from_str(&role)
        .with_context(|| format!("Unknown role {} stored for user {}", role, id))?;
    Ok(User {
        id,
        email,
        full_name,
        role,
        created,
    })
}

impl UserStore for SqliteUserStore {
    fn create_user(&self, new_user: NewUser, password: &str) -> Result<Option<User>> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let taken: i64 = tx.query_row(
            &format!(
                "SELECT COUNT(*) FROM {} WHERE email = ?1",
                USER_TABLE_V_0.name
            ),
            params![new_user.email],
            |row| row.get(0),
        )?;
        if taken > 0 {
            return Ok(None);
        }

        tx.execute(
            &format!(
                "INSERT INTO {} (email, full_name, role) VALUES (?1, ?2, ?3)",
                USER_TABLE_V_0.name
            ),
            params![new_user.email, new_user.full_name, new_user.role.as_str()],
        )
        .with_context(|| format!("Failed to create user {}", new_user.email))?;
        let user_id = tx.last_insert_rowid();

        let credentials = UserCredentials::from_password(user_id, password)?;
        tx.execute(
            &format!(
                "INSERT INTO {} (user_id, salt, hash, hasher) VALUES (?1, ?2, ?3, ?4)",
                USER_PASSWORD_CREDENTIALS_V_0.name
            ),
            params![
                user_id,
                credentials.salt,
                credentials.hash,
                credentials.hasher.to_string()
            ],
        )?;

        let created: i64 = tx.query_row(
            &format!("SELECT created FROM {} WHERE id = ?1", USER_TABLE_V_0.name),
            params![user_id],
            |row| row.get(0),
        )?;
        tx.commit()?;

        Ok(Some(User {
            id: user_id,
            email: new_user.email,
            full_name: new_user.full_name,
            role: new_user.role,
            created,
        }))
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                &format!(
                    "SELECT id, email, full_name, role, created FROM {} WHERE email = ?1",
                    USER_TABLE_V_0.name
                ),
                params![email],
                row_to_user,
            )
            .optional()?;
        row.map(build_user).transpose()
    }

    fn get_user_by_id(&self, user_id: i64) -> Result<Option<User>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                &format!(
                    "SELECT id, email, full_name, role, created FROM {} WHERE id = ?1",
                    USER_TABLE_V_0.name
                ),
                params![user_id],
                row_to_user,
            )
            .optional()?;
        row.map(build_user).transpose()
    }

    fn get_credentials(&self, user_id: i64) -> Result<Option<UserCredentials>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                &format!(
                    "SELECT user_id, salt, hash, hasher FROM {} WHERE user_id = ?1",
                    USER_PASSWORD_CREDENTIALS_V_0.name
                ),
                params![user_id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        match row {
            None => Ok(None),
            Some((user_id, salt, hash, hasher)) => Ok(Some(UserCredentials {
                user_id,
                salt,
                hash,
                hasher: ShiftKerjaHasher::from_str(&hasher)?,
            })),
        }
    }
}
