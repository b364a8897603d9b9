//! The process-wide transitive-closure engine.
//!
//! The engine owns one closure cache behind a mutex, so concurrent users
//! serialize on it and an interleaved caller can never corrupt another's
//! result: a cached closure is only reused when the incoming adjacency
//! matrix is a superset of the cached one, which closure monotonicity
//! makes sound regardless of who computed the cache.

use std::fmt;
use std::sync::{Mutex, OnceLock, PoisonError};

/// Failures of the closure engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccelError {
    /// [`initialize`] has not been called (or [`teardown`] already was).
    NotInitialized,
    /// The matrix buffer does not hold `node_count * node_count` cells.
    BufferSizeMismatch { expected: usize, found: usize },
}

impl fmt::Display for AccelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "closure engine is not initialized"),
            Self::BufferSizeMismatch { expected, found } => write!(
                f,
                "matrix buffer holds {found} cells, expected {expected}"
            ),
        }
    }
}

impl std::error::Error for AccelError {}

/// Bit-packed rows: `words_per_row` words per node, row-major.
struct ClosureCache {
    node_count: usize,
    adjacency: Vec<u64>,
    closure: Vec<u64>,
}

struct EngineState {
    cache: Option<ClosureCache>,
}

fn engine() -> &'static Mutex<Option<EngineState>> {
    static ENGINE: OnceLock<Mutex<Option<EngineState>>> = OnceLock::new();
    ENGINE.get_or_init(|| Mutex::new(None))
}

fn lock() -> std::sync::MutexGuard<'static, Option<EngineState>> {
    engine().lock().unwrap_or_else(PoisonError::into_inner)
}

/// Brings the engine up. Idempotent: a second call on a live engine keeps
/// its cache.
pub fn initialize() {
    let mut guard = lock();
    if guard.is_none() {
        *guard = Some(EngineState { cache: None });
        tracing::debug!("closure engine initialized");
    }
}

/// Tears the engine down and drops its cache. Subsequent
/// [`compute_closure`] calls fail until the next [`initialize`].
pub fn teardown() {
    let mut guard = lock();
    if guard.take().is_some() {
        tracing::debug!("closure engine torn down");
    }
}

#[must_use]
pub fn is_initialized() -> bool {
    lock().is_some()
}

/// Replaces `matrix` (row-major 0/1 adjacency, `node_count * node_count`
/// cells) with its transitive closure over paths of one or more edges.
///
/// `fresh == false` hints that `matrix` extends the previously computed
/// adjacency; the hint is verified against the cache and silently ignored
/// when it does not hold, so a wrong hint costs time, never correctness.
///
/// # Errors
///
/// [`AccelError::NotInitialized`] without a live engine;
/// [`AccelError::BufferSizeMismatch`] when the buffer disagrees with
/// `node_count`.
pub fn compute_closure(
    matrix: &mut [u8],
    node_count: usize,
    fresh: bool,
) -> Result<(), AccelError> {
    let expected = node_count * node_count;
    if matrix.len() != expected {
        return Err(AccelError::BufferSizeMismatch {
            expected,
            found: matrix.len(),
        });
    }

    let mut guard = lock();
    let Some(state) = guard.as_mut() else {
        return Err(AccelError::NotInitialized);
    };

    let words_per_row = node_count.div_ceil(64);
    let mut adjacency = vec![0u64; node_count * words_per_row];
    for i in 0..node_count {
        for j in 0..node_count {
            if matrix[i * node_count + j] != 0 {
                adjacency[i * words_per_row + j / 64] |= 1 << (j % 64);
            }
        }
    }

    let mut closure = adjacency.clone();
    let mut reused = false;
    if !fresh {
        if let Some(cache) = state.cache.as_ref() {
            let extends = cache.node_count == node_count
                && cache
                    .adjacency
                    .iter()
                    .zip(&adjacency)
                    .all(|(cached, new)| cached & !new == 0);
            if extends {
                for (word, prior) in closure.iter_mut().zip(&cache.closure) {
                    *word |= prior;
                }
                reused = true;
            }
        }
    }

    // repeated squaring: after k rounds the closure covers all paths of
    // up to 2^k edges, so the fixpoint arrives in O(log n) rounds
    let mut rounds = 0usize;
    let mut acc = vec![0u64; words_per_row];
    loop {
        let mut next = closure.clone();
        for i in 0..node_count {
            let row = i * words_per_row;
            acc.fill(0);
            for word_index in 0..words_per_row {
                let mut bits = closure[row + word_index];
                while bits != 0 {
                    let j = word_index * 64 + bits.trailing_zeros() as usize;
                    bits &= bits - 1;
                    let j_row = j * words_per_row;
                    for (w, word) in acc.iter_mut().enumerate() {
                        *word |= closure[j_row + w];
                    }
                }
            }
            for (w, word) in acc.iter().enumerate() {
                next[row + w] |= word;
            }
        }
        rounds += 1;
        if next == closure {
            break;
        }
        closure = next;
    }

    for i in 0..node_count {
        for j in 0..node_count {
            matrix[i * node_count + j] =
                u8::from(closure[i * words_per_row + j / 64] >> (j % 64) & 1 == 1);
        }
    }

    tracing::debug!(node_count, rounds, reused, "transitive closure computed");
    state.cache = Some(ClosureCache {
        node_count,
        adjacency,
        closure,
    });
    Ok(())
}
