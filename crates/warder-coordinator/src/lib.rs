//! # warder-coordinator
//!
//! Thin async client for the fleet's shared coordinator: a keyed in-memory
//! store exposing a sorted-set priority queue (`tasks`), per-file byte-chunk
//! lists (`data:{pointer}`), and per-request event lists (`event:{root_id}`).
//!
//! Backed by Redis. Every operation used by the worker is server-atomic
//! (`ZPOPMIN`, `LPOP`, pipelined `RPUSH`+`EXPIREAT`); no cross-key
//! transactions are required or attempted.

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::debug;

pub const TASKS_KEY: &str = "tasks";
/// Sentinel record that terminates a request's event stream.
pub const FIN: &[u8] = b"FIN";

#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error("failed to connect to coordinator at {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: redis::RedisError,
    },
    #[error("coordinator operation failed: {0}")]
    Op(#[from] redis::RedisError),
}

pub type Result<T> = std::result::Result<T, CoordinatorError>;

fn data_key(pointer: &str) -> String {
    format!("data:{pointer}")
}

fn event_key(root_id: &str) -> String {
    format!("event:{root_id}")
}

/// Client wrapping a single multiplexed Redis connection.
#[derive(Clone)]
pub struct CoordinatorClient {
    conn: ConnectionManager,
}

impl std::fmt::Debug for CoordinatorClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinatorClient")
            .field("connection", &"ConnectionManager")
            .finish()
    }
}

impl CoordinatorClient {
    /// Connect to the coordinator at `addr`, selecting logical database `db`.
    pub async fn connect(addr: &str, db: i64) -> Result<Self> {
        debug!(addr, db, "connecting to coordinator");

        let client = redis::Client::open(addr).map_err(|source| CoordinatorError::Connect {
            addr: addr.to_string(),
            source,
        })?;

        let mut conn =
            ConnectionManager::new(client)
                .await
                .map_err(|source| CoordinatorError::Connect {
                    addr: addr.to_string(),
                    source,
                })?;

        if db != 0 {
            redis::cmd("SELECT")
                .arg(db)
                .query_async::<_, ()>(&mut conn)
                .await?;
        }

        Ok(Self { conn })
    }

    /// Startup health check. Fatal to the caller if this fails.
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    /// Atomically pop the lowest-scored member of the `tasks` sorted set.
    /// Returns `(root_id, expire_at_unix_secs)`, or `None` if the queue is empty.
    pub async fn pop_task(&self) -> Result<Option<(String, f64)>> {
        let mut conn = self.conn.clone();
        let popped: Vec<(String, f64)> = conn.zpopmin(TASKS_KEY, 1).await?;
        Ok(popped.into_iter().next())
    }

    /// Drain `data:{pointer}` by repeated left-pop, concatenating chunks in
    /// order until the list is empty.
    pub async fn drain_bytes(&self, pointer: &str) -> Result<Vec<u8>> {
        let mut conn = self.conn.clone();
        let key = data_key(pointer);
        let mut out = Vec::new();
        loop {
            let chunk: Option<Vec<u8>> = conn.lpop(&key, None).await?;
            match chunk {
                Some(bytes) => out.extend_from_slice(&bytes),
                None => break,
            }
        }
        Ok(out)
    }

    /// Right-push `data` as a single chunk under a fresh `data:{pointer}`
    /// key and stamp its expiration, as one pipelined batch. Used by
    /// extracting scanners (`ScanZip` and friends) to hand a child file's
    /// bytes back to the coordinator before returning it as a `File`.
    pub async fn push_bytes(&self, pointer: &str, data: &[u8], expire_at_unix_secs: i64) -> Result<()> {
        let mut conn = self.conn.clone();
        let key = data_key(pointer);
        redis::pipe()
            .rpush(&key, data)
            .ignore()
            .expire_at(&key, expire_at_unix_secs)
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    /// Right-push `record` to `event:{root_id}` and stamp its expiration, as
    /// one pipelined batch (no cross-key atomicity implied or required).
    pub async fn emit(&self, root_id: &str, record: &[u8], expire_at_unix_secs: i64) -> Result<()> {
        let mut conn = self.conn.clone();
        let key = event_key(root_id);
        redis::pipe()
            .rpush(&key, record)
            .ignore()
            .expire_at(&key, expire_at_unix_secs)
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    /// Convenience wrapper: emit the literal `FIN` sentinel.
    pub async fn emit_fin(&self, root_id: &str, expire_at_unix_secs: i64) -> Result<()> {
        self.emit(root_id, FIN, expire_at_unix_secs).await
    }
}
