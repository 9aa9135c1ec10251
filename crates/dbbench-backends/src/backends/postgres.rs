//! PostgreSQL backend.
//!
//! Requires a running PostgreSQL instance reachable at the configured URL.
//! Enable with `--features postgres`.
//!
//! The backend owns a private Tokio runtime and blocks on every query, so it
//! plugs into the synchronous runner like any other adapter.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

use dbbench_core::{Backend, ConnectionError, OperationError, OperationOutcome, Params};

use super::{batch_size, query_error, KeyCache, DATA_SEED, KEY_SAMPLE};
use crate::fixtures::{generate_posts, generate_users, DataGen, Scale};
use crate::suite;

/// Vendor identifier.
pub const VENDOR: &str = "postgresql";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: [&str; 4] = [
    r#"CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        email VARCHAR(255) UNIQUE NOT NULL,
        age INTEGER,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )"#,
    r#"CREATE TABLE IF NOT EXISTS posts (
        id BIGSERIAL PRIMARY KEY,
        user_id BIGINT REFERENCES users(id) ON DELETE CASCADE,
        title VARCHAR(255) NOT NULL,
        content TEXT,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)",
    "CREATE INDEX IF NOT EXISTS idx_posts_user_id ON posts(user_id)",
];

const INSERT_USER: &str = "INSERT INTO users (name, email, age) VALUES ($1, $2, $3)";
const INSERT_USER_RETURNING: &str =
    "INSERT INTO users (name, email, age) VALUES ($1, $2, $3) RETURNING id";
const INSERT_POST: &str = "INSERT INTO posts (user_id, title, content) VALUES ($1, $2, $3)";
const SELECT_BY_ID: &str = "SELECT * FROM users WHERE id = $1";
const SELECT_BY_EMAIL: &str = "SELECT * FROM users WHERE email = $1";
const SELECT_WITH_JOIN: &str = r#"
    SELECT u.id, u.name, u.email, p.id AS post_id, p.title
    FROM users u
    LEFT JOIN posts p ON u.id = p.user_id
    WHERE u.id = $1"#;
const UPDATE_AGE: &str = "UPDATE users SET age = $1 WHERE id = $2";
const AGGREGATE: &str = r#"
    SELECT COUNT(*) AS total_users, AVG(age) AS avg_age, MIN(age) AS min_age, MAX(age) AS max_age
    FROM users"#;
const COMPLEX: &str = r#"
    SELECT u.id, u.name, u.email, COUNT(p.id) AS post_count
    FROM users u
    LEFT JOIN posts p ON u.id = p.user_id
    WHERE u.age BETWEEN $1 AND $2
    GROUP BY u.id, u.name, u.email
    HAVING COUNT(p.id) > 0
    ORDER BY post_count DESC
    LIMIT 10"#;
const DELETE_USER: &str = "DELETE FROM users WHERE id = $1";

/// An open pool and the runtime driving it.
struct Connection {
    rt: Runtime,
    pool: PgPool,
}

/// PostgreSQL backend for benchmarks.
pub struct PostgresBackend {
    url: String,
    scale: Scale,
    seed: bool,
    conn: Option<Connection>,
    data: DataGen,
    keys: KeyCache,
}

impl PostgresBackend {
    /// Create a backend for the database at `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            scale: Scale::default(),
            seed: true,
            conn: None,
            data: DataGen::new(DATA_SEED),
            keys: KeyCache::default(),
        }
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

    fn unreachable(message: impl ToString) -> ConnectionError {
        ConnectionError::Unreachable {
            vendor: VENDOR.to_string(),
            message: message.to_string(),
        }
    }

    fn setup_error(message: impl ToString) -> ConnectionError {
        ConnectionError::Setup {
            vendor: VENDOR.to_string(),
            message: message.to_string(),
        }
    }
}

/// Insert seed users and posts in one transaction.
async fn populate(pool: &PgPool, scale: Scale) -> Result<(), sqlx::Error> {
    let users = generate_users(scale.users());
    let posts = generate_posts(scale.posts(), users.len());

    let mut tx = pool.begin().await?;
    let mut ids = Vec::with_capacity(users.len());
    for user in &users {
        let id = sqlx::query_scalar::<_, i64>(INSERT_USER_RETURNING)
            .bind(&user.name)
            .bind(&user.email)
            .bind(user.age)
            .fetch_one(&mut *tx)
            .await?;
        ids.push(id);
    }
    for post in &posts {
        sqlx::query(INSERT_POST)
            .bind(ids[post.author])
            .bind(&post.title)
            .bind(&post.content)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    info!(vendor = VENDOR, users = users.len(), posts = posts.len(), "seed data loaded");
    Ok(())
}

impl Backend for PostgresBackend {
    fn vendor(&self) -> &str {
        VENDOR
    }

    fn connect(&mut self) -> Result<(), ConnectionError> {
        let rt = Runtime::new().map_err(Self::unreachable)?;
        let pool = rt
            .block_on(
                PgPoolOptions::new()
                    .max_connections(1)
                    .acquire_timeout(CONNECT_TIMEOUT)
                    .connect(&self.url),
            )
            .map_err(Self::unreachable)?;

        debug!(vendor = VENDOR, "connected");
        self.conn = Some(Connection { rt, pool });
        Ok(())
    }

    fn prepare(&mut self) -> Result<(), ConnectionError> {
        let Connection { rt, pool } = self
            .conn
            .as_ref()
            .ok_or_else(|| Self::setup_error("not connected"))?;

        rt.block_on(async {
            for statement in SCHEMA {
                sqlx::query(statement).execute(pool).await?;
            }
            if self.seed {
                populate(pool, self.scale).await?;
            }
            Ok::<_, sqlx::Error>(())
        })
        .map_err(Self::setup_error)?;

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
        let Connection { rt, pool } = conn.as_ref().ok_or(OperationError::NotConnected)?;

        let outcome = match operation {
            suite::INSERT_SINGLE => {
                let user = data.user();
                OperationOutcome::timed(|| {
                    rt.block_on(async {
                        sqlx::query(INSERT_USER)
                            .bind(&user.name)
                            .bind(&user.email)
                            .bind(user.age)
                            .execute(pool)
                            .await
                    })
                    .map(|r| r.rows_affected())
                    .map_err(query_error)
                })
            }
            suite::INSERT_BATCH => {
                let users = data.users(batch_size(params)?);
                let placeholders: Vec<String> = (0..users.len())
                    .map(|i| format!("(${}, ${}, ${})", 3 * i + 1, 3 * i + 2, 3 * i + 3))
                    .collect();
                let sql = format!(
                    "INSERT INTO users (name, email, age) VALUES {}",
                    placeholders.join(", ")
                );
                OperationOutcome::timed(|| {
                    rt.block_on(async {
                        let mut query = sqlx::query(&sql);
                        for user in &users {
                            query = query.bind(&user.name).bind(&user.email).bind(user.age);
                        }
                        query.execute(pool).await
                    })
                    .map(|r| r.rows_affected())
                    .map_err(query_error)
                })
            }
            suite::SELECT_BY_ID => {
                let id = keys.id(data, || load_ids(rt, pool))?;
                OperationOutcome::timed(|| {
                    rt.block_on(sqlx::query(SELECT_BY_ID).bind(id).fetch_all(pool))
                        .map(|_| 0)
                        .map_err(query_error)
                })
            }
            suite::SELECT_BY_EMAIL => {
                let email = keys.email(data, || load_emails(rt, pool))?;
                OperationOutcome::timed(|| {
                    rt.block_on(sqlx::query(SELECT_BY_EMAIL).bind(&email).fetch_all(pool))
                        .map(|_| 0)
                        .map_err(query_error)
                })
            }
            suite::SELECT_WITH_JOIN => {
                let id = keys.id(data, || load_ids(rt, pool))?;
                OperationOutcome::timed(|| {
                    rt.block_on(sqlx::query(SELECT_WITH_JOIN).bind(id).fetch_all(pool))
                        .map(|_| 0)
                        .map_err(query_error)
                })
            }
            suite::UPDATE => {
                let id = keys.id(data, || load_ids(rt, pool))?;
                let age = data.age();
                OperationOutcome::timed(|| {
                    rt.block_on(sqlx::query(UPDATE_AGE).bind(age).bind(id).execute(pool))
                        .map(|r| r.rows_affected())
                        .map_err(query_error)
                })
            }
            suite::AGGREGATE_QUERY => OperationOutcome::timed(|| {
                rt.block_on(sqlx::query(AGGREGATE).fetch_all(pool))
                    .map(|_| 0)
                    .map_err(query_error)
            }),
            suite::COMPLEX_QUERY => {
                let (low, high) = data.age_window();
                OperationOutcome::timed(|| {
                    rt.block_on(sqlx::query(COMPLEX).bind(low).bind(high).fetch_all(pool))
                        .map(|_| 0)
                        .map_err(query_error)
                })
            }
            suite::DELETE => {
                let id = keys.take_id(data, || load_ids(rt, pool))?;
                OperationOutcome::timed(|| {
                    rt.block_on(sqlx::query(DELETE_USER).bind(id).execute(pool))
                        .map(|r| r.rows_affected())
                        .map_err(query_error)
                })
            }
            other => return Err(OperationError::UnknownOperation(other.to_string())),
        };

        Ok(outcome)
    }

    fn cleanup(&mut self) {
        self.keys.clear();
        let Some(Connection { rt, pool }) = self.conn.as_ref() else {
            return;
        };

        let result = rt.block_on(async {
            sqlx::query("DROP TABLE IF EXISTS posts CASCADE")
                .execute(pool)
                .await?;
            sqlx::query("DROP TABLE IF EXISTS users CASCADE")
                .execute(pool)
                .await
        });
        if let Err(e) = result {
            warn!(vendor = VENDOR, error = %e, "cleanup failed");
        }
    }

    fn disconnect(&mut self) {
        if let Some(Connection { rt, pool }) = self.conn.take() {
            rt.block_on(pool.close());
        }
    }
}

fn load_ids(rt: &Runtime, pool: &PgPool) -> Result<Vec<i64>, OperationError> {
    rt.block_on(
        sqlx::query_scalar::<_, i64>("SELECT id FROM users LIMIT $1")
            .bind(KEY_SAMPLE)
            .fetch_all(pool),
    )
    .map_err(query_error)
}

fn load_emails(rt: &Runtime, pool: &PgPool) -> Result<Vec<String>, OperationError> {
    rt.block_on(
        sqlx::query_scalar::<_, String>("SELECT email FROM users LIMIT $1")
            .bind(KEY_SAMPLE)
            .fetch_all(pool),
    )
    .map_err(query_error)
}
