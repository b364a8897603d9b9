use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Local};
use rand::distr::{Distribution, Uniform};
use rand::RngExt;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;
use veriso_core::history::{Event, History, Session, Transaction};

#[derive(Clone, Debug, Default, Deserialize, Serialize, TypedBuilder)]
pub struct HistParams {
    pub id: u64,
    pub n_session: u64,
    pub n_key: u64,
    pub n_transaction: u64,
    pub n_event: u64,
}

/// A generated history plus the parameters and timing of its generation.
#[derive(Deserialize, Serialize, Debug)]
pub struct GeneratedHistory {
    params: HistParams,
    info: String,
    start: DateTime<Local>,
    end: DateTime<Local>,
    data: History<u64, u64>,
}

impl GeneratedHistory {
    #[must_use]
    pub const fn new(
        params: HistParams,
        info: String,
        start: DateTime<Local>,
        end: DateTime<Local>,
        data: History<u64, u64>,
    ) -> Self {
        Self {
            params,
            info,
            start,
            end,
            data,
        }
    }

    #[must_use]
    pub const fn get_id(&self) -> u64 {
        self.params.id
    }

    #[must_use]
    pub const fn get_data(&self) -> &History<u64, u64> {
        &self.data
    }

    #[must_use]
    pub fn into_data(self) -> History<u64, u64> {
        self.data
    }

    #[must_use]
    pub const fn get_params(&self) -> &HistParams {
        &self.params
    }

    #[must_use]
    pub fn get_cloned_params(&self) -> HistParams {
        self.params.clone()
    }

    #[must_use]
    pub fn get_duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Generate a single history with `n_session` sessions, each containing
/// `n_transaction` transactions of `n_event` events over `n_key` keys.
///
/// # Coherence invariant
///
/// Every generated read is coherent: each `Read { key, value }` is backed
/// by a `Write { key, value }` somewhere in the history or by the initial
/// state, and no two writes install the same `(key, value)` pair.
///
/// This is achieved by:
/// 1. Seeding the initial state with value 0 for every key, so reads
///    always have a valid version to observe.
/// 2. Tracking `latest_writes` -- a map from key to its most recently
///    written version -- and sampling reads from it instead of generating
///    arbitrary (possibly non-existent) versions.
/// 3. Handing out versions from per-key monotone counters, so writers
///    never collide on a `(key, value)` pair.
///
/// # Panics
///
/// Panics if `n_key` is zero (cannot create a uniform distribution over an
/// empty range).
#[must_use]
pub fn generate_single_history(
    n_session: u64,
    n_key: u64,
    n_transaction: u64,
    n_event: u64,
) -> History<u64, u64> {
    let mut counters: HashMap<u64, u64> = HashMap::new();
    let mut latest_writes: HashMap<u64, u64> = (0..n_key).map(|k| (k, 0)).collect();
    let mut random_generator = rand::rng();
    let read_key_range = Uniform::new(0, n_key).unwrap();

    let sessions: Vec<Session<u64, u64>> = (0..n_session)
        .map(|_| {
            let mut txns: Vec<Transaction<u64, u64>> = Vec::new();

            for _ in 0..n_transaction {
                let readable = latest_writes.clone();
                let mut read_keys: HashSet<u64> = HashSet::new();
                let events = (0..n_event)
                    .map(|_| {
                        let key = read_key_range.sample(&mut random_generator);
                        let want_read = random_generator.random::<bool>();
                        if want_read && read_keys.insert(key) {
                            Event::read(key, readable[&key])
                        } else {
                            let version = {
                                let entry = counters.entry(key).or_default();
                                *entry += 1;
                                *entry
                            };
                            latest_writes.insert(key, version);
                            Event::write(key, version)
                        }
                    })
                    .collect();
                txns.push(Transaction::new(events));
            }

            txns
        })
        .collect();

    History::with_initial_state(sessions, (0..n_key).map(|k| (k, 0)).collect())
}

#[must_use]
pub fn generate_mult_histories(
    n_hist: u64,
    n_session: u64,
    n_key: u64,
    n_transaction: u64,
    n_event: u64,
) -> Vec<GeneratedHistory> {
    (0..n_hist)
        .into_par_iter()
        .map(|i_hist| {
            let start_time = Local::now();
            let hist = generate_single_history(n_session, n_key, n_transaction, n_event);
            let end_time = Local::now();
            GeneratedHistory {
                params: HistParams {
                    id: i_hist,
                    n_session,
                    n_key,
                    n_transaction,
                    n_event,
                },
                info: "generated".to_string(),
                start: start_time,
                end: end_time,
                data: hist,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use veriso_core::audit::{AuditOptions, Auditor, Isolation};

    use super::*;

    #[test]
    fn generated_histories_are_well_formed() {
        for _ in 0..10 {
            let history = generate_single_history(3, 4, 3, 4);
            assert!(
                Auditor::new(history, AuditOptions::new(Isolation::Serializable)).is_ok(),
                "generated reads must resolve to real writes",
            );
        }
    }

    #[test]
    fn generated_history_has_requested_shape() {
        let history = generate_single_history(4, 5, 2, 3);
        assert_eq!(history.sessions().len(), 4);
        assert_eq!(history.transaction_count(), 8);
        assert_eq!(history.initial_state().len(), 5);
    }

    #[test]
    fn batch_generation_assigns_sequential_ids() {
        let histories = generate_mult_histories(4, 2, 3, 2, 3);
        let ids: Vec<u64> = histories.iter().map(GeneratedHistory::get_id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2, 3]);
    }
}
