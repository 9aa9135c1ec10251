//! SQLite backend.
//!
//! Runs the relational suite through `rusqlite`. The database is either a
//! file or a private in-memory database that lives as long as the
//! connection.

use std::path::PathBuf;

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Params as SqlParams};
use tracing::{debug, info, warn};

use dbbench_core::{Backend, ConnectionError, OperationError, OperationOutcome, Params};

use super::{batch_size, query_error, KeyCache, DATA_SEED, KEY_SAMPLE};
use crate::fixtures::{generate_posts, generate_users, DataGen, Scale};
use crate::suite;

/// Vendor identifier.
pub const VENDOR: &str = "sqlite";

/// Path that selects an in-memory database.
pub const IN_MEMORY: &str = ":memory:";

const SCHEMA: &str = r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT UNIQUE NOT NULL,
        age INTEGER,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    );

    CREATE TABLE IF NOT EXISTS posts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER,
        title TEXT NOT NULL,
        content TEXT,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);
    CREATE INDEX IF NOT EXISTS idx_posts_user_id ON posts(user_id);
"#;

const INSERT_USER: &str = "INSERT INTO users (name, email, age) VALUES (?1, ?2, ?3)";
const INSERT_POST: &str = "INSERT INTO posts (user_id, title, content) VALUES (?1, ?2, ?3)";
const SELECT_BY_ID: &str = "SELECT * FROM users WHERE id = ?1";
const SELECT_BY_EMAIL: &str = "SELECT * FROM users WHERE email = ?1";
const SELECT_WITH_JOIN: &str = r#"
    SELECT u.id, u.name, u.email, p.id AS post_id, p.title
    FROM users u
    LEFT JOIN posts p ON u.id = p.user_id
    WHERE u.id = ?1"#;
const UPDATE_AGE: &str = "UPDATE users SET age = ?1 WHERE id = ?2";
const AGGREGATE: &str = r#"
    SELECT COUNT(*) AS total_users, AVG(age) AS avg_age, MIN(age) AS min_age, MAX(age) AS max_age
    FROM users"#;
const COMPLEX: &str = r#"
    SELECT u.id, u.name, u.email, COUNT(p.id) AS post_count
    FROM users u
    LEFT JOIN posts p ON u.id = p.user_id
    WHERE u.age BETWEEN ?1 AND ?2
    GROUP BY u.id, u.name, u.email
    HAVING COUNT(p.id) > 0
    ORDER BY post_count DESC
    LIMIT 10"#;
const DELETE_USER: &str = "DELETE FROM users WHERE id = ?1";

/// SQLite backend for benchmarks.
pub struct SqliteBackend {
    path: PathBuf,
    scale: Scale,
    seed: bool,
    conn: Option<Connection>,
    data: DataGen,
    keys: KeyCache,
}

impl SqliteBackend {
    /// Create a backend for the database file at `path`.
    ///
    /// `":memory:"` selects a fresh in-memory database.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            scale: Scale::default(),
            seed: true,
            conn: None,
            data: DataGen::new(DATA_SEED),
            keys: KeyCache::default(),
        }
    }

    /// Create a backend over a fresh in-memory database.
    pub fn in_memory() -> Self {
        Self::new(IN_MEMORY)
    }

    /// Set the amount of seed data.
    pub fn with_scale(mut self, scale: Scale) -> Self {
        self.scale = scale;
        self
    }

    /// Use existing rows instead of loading seed data.
    pub fn without_seed(mut self) -> Self {
        self.seed = false;
        self
    }

    fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == IN_MEMORY
    }

    fn setup_error(e: rusqlite::Error) -> ConnectionError {
        ConnectionError::Setup {
            vendor: VENDOR.to_string(),
            message: e.to_string(),
        }
    }

    /// Insert seed users and posts in one transaction.
    fn populate(conn: &mut Connection, scale: Scale) -> rusqlite::Result<()> {
        let users = generate_users(scale.users());
        let posts = generate_posts(scale.posts(), users.len());

        let tx = conn.transaction()?;
        let mut ids = Vec::with_capacity(users.len());
        {
            let mut stmt = tx.prepare(INSERT_USER)?;
            for user in &users {
                stmt.execute(params![user.name, user.email, user.age])?;
                ids.push(tx.last_insert_rowid());
            }

            let mut stmt = tx.prepare(INSERT_POST)?;
            for post in &posts {
                stmt.execute(params![ids[post.author], post.title, post.content])?;
            }
        }
        tx.commit()?;

        info!(vendor = VENDOR, users = users.len(), posts = posts.len(), "seed data loaded");
        Ok(())
    }
}

impl Backend for SqliteBackend {
    fn vendor(&self) -> &str {
        VENDOR
    }

    fn connect(&mut self) -> Result<(), ConnectionError> {
        let conn = if self.is_in_memory() {
            Connection::open_in_memory()
        } else {
            Connection::open(&self.path)
        }
        .map_err(|e| ConnectionError::Unreachable {
            vendor: VENDOR.to_string(),
            message: e.to_string(),
        })?;

        debug!(vendor = VENDOR, path = %self.path.display(), "connected");
        self.conn = Some(conn);
        Ok(())
    }

    fn prepare(&mut self) -> Result<(), ConnectionError> {
        let conn = self.conn.as_mut().ok_or_else(|| ConnectionError::Setup {
            vendor: VENDOR.to_string(),
            message: "not connected".to_string(),
        })?;

        conn.execute_batch(SCHEMA).map_err(Self::setup_error)?;
        if self.seed {
            Self::populate(conn, self.scale).map_err(Self::setup_error)?;
        }
        self.keys.clear();
        Ok(())
    }

    fn perform(
        &mut self,
        operation: &str,
        params: &Params,
    ) -> Result<OperationOutcome, OperationError> {
        let Self {
            conn, data, keys, ..
        } = self;
        let conn = conn.as_ref().ok_or(OperationError::NotConnected)?;

        let outcome = match operation {
            suite::INSERT_SINGLE => {
                let user = data.user();
                OperationOutcome::timed(|| {
                    execute(conn, INSERT_USER, params![user.name, user.email, user.age])
                })
            }
            suite::INSERT_BATCH => {
                let users = data.users(batch_size(params)?);
                let sql = format!(
                    "INSERT INTO users (name, email, age) VALUES {}",
                    vec!["(?, ?, ?)"; users.len()].join(", ")
                );
                let values: Vec<Value> = users
                    .into_iter()
                    .flat_map(|u| {
                        [
                            Value::Text(u.name),
                            Value::Text(u.email),
                            Value::Integer(u.age.into()),
                        ]
                    })
                    .collect();
                OperationOutcome::timed(|| execute(conn, &sql, params_from_iter(values.iter())))
            }
            suite::SELECT_BY_ID => {
                let id = keys.id(data, || load_ids(conn))?;
                OperationOutcome::timed(|| fetch(conn, SELECT_BY_ID, [id]))
            }
            suite::SELECT_BY_EMAIL => {
                let email = keys.email(data, || load_emails(conn))?;
                OperationOutcome::timed(|| fetch(conn, SELECT_BY_EMAIL, [&email]))
            }
            suite::SELECT_WITH_JOIN => {
                let id = keys.id(data, || load_ids(conn))?;
                OperationOutcome::timed(|| fetch(conn, SELECT_WITH_JOIN, [id]))
            }
            suite::UPDATE => {
                let id = keys.id(data, || load_ids(conn))?;
                let age = data.age();
                OperationOutcome::timed(|| execute(conn, UPDATE_AGE, params![age, id]))
            }
            suite::AGGREGATE_QUERY => OperationOutcome::timed(|| fetch(conn, AGGREGATE, [])),
            suite::COMPLEX_QUERY => {
                let (low, high) = data.age_window();
                OperationOutcome::timed(|| fetch(conn, COMPLEX, [low, high]))
            }
            suite::DELETE => {
                let id = keys.take_id(data, || load_ids(conn))?;
                OperationOutcome::timed(|| execute(conn, DELETE_USER, [id]))
            }
            other => return Err(OperationError::UnknownOperation(other.to_string())),
        };

        Ok(outcome)
    }

    fn cleanup(&mut self) {
        self.keys.clear();
        let Some(conn) = self.conn.as_ref() else {
            return;
        };
        if let Err(e) = conn.execute_batch("DROP TABLE IF EXISTS posts; DROP TABLE IF EXISTS users;") {
            warn!(vendor = VENDOR, error = %e, "cleanup failed");
        }
    }

    fn disconnect(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err((_, e)) = conn.close() {
                warn!(vendor = VENDOR, error = %e, "close failed");
            }
        }
    }
}

/// Run a statement and report the rows it changed.
fn execute<P: SqlParams>(conn: &Connection, sql: &str, params: P) -> Result<u64, OperationError> {
    let mut stmt = conn.prepare_cached(sql).map_err(query_error)?;
    let changed = stmt.execute(params).map_err(query_error)?;
    Ok(changed as u64)
}

/// Run a query and read every column of every row. Reads touch no records.
fn fetch<P: SqlParams>(conn: &Connection, sql: &str, params: P) -> Result<u64, OperationError> {
    let mut stmt = conn.prepare_cached(sql).map_err(query_error)?;
    let columns = stmt.column_count();
    let mut rows = stmt.query(params).map_err(query_error)?;
    while let Some(row) = rows.next().map_err(query_error)? {
        for i in 0..columns {
            let _: Value = row.get(i).map_err(query_error)?;
        }
    }
    Ok(0)
}

fn load_ids(conn: &Connection) -> Result<Vec<i64>, OperationError> {
    let mut stmt = conn
        .prepare_cached("SELECT id FROM users LIMIT ?1")
        .map_err(query_error)?;
    let ids = stmt
        .query_map([KEY_SAMPLE], |row| row.get::<_, i64>(0))
        .and_then(|rows| rows.collect())
        .map_err(query_error)?;
    Ok(ids)
}

fn load_emails(conn: &Connection) -> Result<Vec<String>, OperationError> {
    let mut stmt = conn
        .prepare_cached("SELECT email FROM users LIMIT ?1")
        .map_err(query_error)?;
    let emails = stmt
        .query_map([KEY_SAMPLE], |row| row.get::<_, String>(0))
        .and_then(|rows| rows.collect())
        .map_err(query_error)?;
    Ok(emails)
}
