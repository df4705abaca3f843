//! Chunked, all-or-nothing loading of one file's trips.

use log::{debug, error};

use crate::{
    encode::EncodedTrip,
    error::LoadError,
    record::CANONICAL_COLUMNS,
    store::{TripStore, TripTransaction},
};

pub const DEFAULT_CHUNK_SIZE: usize = 2000;

/// PostgreSQL caps a statement at 65 535 bind parameters.
pub const MAX_CHUNK_SIZE: usize = 65_535 / CANONICAL_COLUMNS.len();

/// Inserts `rows` in order, `chunk_size` rows per statement (clamped to
/// `1..=MAX_CHUNK_SIZE`), inside a single transaction. Any chunk failure
/// rolls the whole transaction back and is returned to the caller. Empty
/// input returns 0 without opening a transaction.
pub fn bulk_insert<S: TripStore>(
    store: &mut S,
    rows: &[EncodedTrip],
    chunk_size: usize,
) -> Result<usize, LoadError> {
    if rows.is_empty() {
        return Ok(0);
    }
    let chunk_size = chunk_size.clamp(1, MAX_CHUNK_SIZE);
    let chunks = rows.len().div_ceil(chunk_size);
    let mut tx = store.begin().map_err(LoadError::Begin)?;
    let mut inserted = 0usize;

    for (idx, chunk) in rows.chunks(chunk_size).enumerate() {
        debug!(
            "Inserting chunk {} / {} ({} row(s))",
            idx + 1,
            chunks,
            chunk.len()
        );
        if let Err(source) = tx.insert_chunk(chunk) {
            let failure = LoadError::Insert {
                chunk: idx + 1,
                chunks,
                source,
            };
            error!("{failure}; rolling back {inserted} row(s) staged for this file");
            return Err(match tx.rollback() {
                Ok(()) => failure,
                Err(source) => LoadError::Rollback {
                    original: Box::new(failure),
                    source,
                },
            });
        }
        inserted += chunk.len();
    }

    tx.commit().map_err(LoadError::Commit)?;
    Ok(inserted)
}
