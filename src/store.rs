//! Transactional destinations for encoded trips.
//!
//! [`PgStore`] talks to PostgreSQL through one sqlx connection driven by a
//! current-thread runtime, so every call blocks until the database answers.
//! [`MemoryStore`] keeps committed rows in memory and backs `--dry-run`.

use log::debug;
use sqlx::{Connection, PgConnection, Postgres, QueryBuilder};
use tokio::runtime::Runtime;

use crate::{
    encode::{Cell, CellType, EncodedTrip},
    error::StoreError,
    record::CANONICAL_COLUMNS,
};

pub trait TripStore {
    type Transaction<'a>: TripTransaction
    where
        Self: 'a;

    fn begin(&mut self) -> Result<Self::Transaction<'_>, StoreError>;

    fn close(self) -> Result<(), StoreError>
    where
        Self: Sized;
}

pub trait TripTransaction {
    fn insert_chunk(&mut self, rows: &[EncodedTrip]) -> Result<(), StoreError>;

    fn commit(self) -> Result<(), StoreError>;

    fn rollback(self) -> Result<(), StoreError>;
}

/// Accepts `name` or `schema.name` made of ASCII letters, digits and `_`.
pub fn is_valid_table_name(name: &str) -> bool {
    let parts = name.split('.').collect::<Vec<_>>();
    parts.len() <= 2
        && parts.iter().all(|part| {
            let mut chars = part.chars();
            chars
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

pub fn insert_statement_prefix(table: &str) -> String {
    format!("INSERT INTO {table} ({}) ", CANONICAL_COLUMNS.join(", "))
}

pub struct PgStore {
    runtime: Runtime,
    conn: PgConnection,
    table: String,
}

impl PgStore {
    pub fn connect(url: &str, table: &str) -> Result<Self, StoreError> {
        if !is_valid_table_name(table) {
            return Err(StoreError::InvalidTable(table.to_string()));
        }
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let conn = runtime.block_on(PgConnection::connect(url))?;
        debug!("Connected to database; loading into {table}");
        Ok(Self {
            runtime,
            conn,
            table: table.to_string(),
        })
    }
}

pub struct PgTransaction<'a> {
    runtime: &'a Runtime,
    tx: sqlx::Transaction<'a, Postgres>,
    table: &'a str,
}

impl TripStore for PgStore {
    type Transaction<'a> = PgTransaction<'a>;

    fn begin(&mut self) -> Result<PgTransaction<'_>, StoreError> {
        let tx = self.runtime.block_on(self.conn.begin())?;
        Ok(PgTransaction {
            runtime: &self.runtime,
            tx,
            table: &self.table,
        })
    }

    fn close(self) -> Result<(), StoreError> {
        self.runtime.block_on(self.conn.close())?;
        Ok(())
    }
}

impl TripTransaction for PgTransaction<'_> {
    fn insert_chunk(&mut self, rows: &[EncodedTrip]) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(insert_statement_prefix(self.table));
        builder.push_values(rows, |mut b, row| {
            for cell in row {
                match cell {
                    Cell::Text(value) => b.push_bind(value.clone()),
                    Cell::Timestamp(value) => b.push_bind(*value),
                    Cell::Null(CellType::Text) => b.push_bind(None::<String>),
                    Cell::Null(CellType::Timestamp) => b.push_bind(None::<chrono::NaiveDateTime>),
                };
            }
        });
        self.runtime
            .block_on(builder.build().execute(&mut *self.tx))?;
        Ok(())
    }

    fn commit(self) -> Result<(), StoreError> {
        self.runtime.block_on(self.tx.commit())?;
        Ok(())
    }

    fn rollback(self) -> Result<(), StoreError> {
        self.runtime.block_on(self.tx.rollback())?;
        Ok(())
    }
}

/// In-memory store. Rows become visible only when their transaction commits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    committed: Vec<EncodedTrip>,
    transactions: usize,
    commits: usize,
    rollbacks: usize,
    failure: Option<(usize, usize)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails chunk `chunk` (0-based) of the `transaction`-th transaction
    /// (0-based, counted across `begin` calls).
    pub fn failing_at(transaction: usize, chunk: usize) -> Self {
        Self {
            failure: Some((transaction, chunk)),
            ..Self::default()
        }
    }

    pub fn rows(&self) -> &[EncodedTrip] {
        &self.committed
    }

    pub fn transactions(&self) -> usize {
        self.transactions
    }

    pub fn commits(&self) -> usize {
        self.commits
    }

    pub fn rollbacks(&self) -> usize {
        self.rollbacks
    }
}

#[derive(Debug)]
pub struct MemoryTransaction<'a> {
    store: &'a mut MemoryStore,
    index: usize,
    staged: Vec<EncodedTrip>,
    chunks: usize,
}

impl TripStore for MemoryStore {
    type Transaction<'a> = MemoryTransaction<'a>;

    fn begin(&mut self) -> Result<MemoryTransaction<'_>, StoreError> {
        let index = self.transactions;
        self.transactions += 1;
        Ok(MemoryTransaction {
            store: self,
            index,
            staged: Vec::new(),
            chunks: 0,
        })
    }

    fn close(self) -> Result<(), StoreError> {
        debug!(
            "Closing in-memory store with {} committed row(s)",
            self.committed.len()
        );
        Ok(())
    }
}

impl TripTransaction for MemoryTransaction<'_> {
    fn insert_chunk(&mut self, rows: &[EncodedTrip]) -> Result<(), StoreError> {
        let chunk = self.chunks;
        self.chunks += 1;
        if self.store.failure == Some((self.index, chunk)) {
            return Err(StoreError::Rejected(format!(
                "chunk {chunk} rejected by in-memory store"
            )));
        }
        self.staged.extend_from_slice(rows);
        Ok(())
    }

    fn commit(self) -> Result<(), StoreError> {
        self.store.committed.extend(self.staged);
        self.store.commits += 1;
        Ok(())
    }

    fn rollback(self) -> Result<(), StoreError> {
        self.store.rollbacks += 1;
        Ok(())
    }
}
