//! Pooled random sampling of live candidates.
//!
//! Traffic density differs by orders of magnitude between regions, so
//! candidates from every region go into one pool that is shuffled as a
//! whole and then cut to the snapshot limit. No per-region quotas.

use std::sync::Mutex;

use common::StateVector;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::gateway::RegionReport;

/// A state vector tagged with the region whose query returned it.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub state: StateVector,
    pub origin: String,
}

/// Flatten region reports into one pool, keeping report order.
/// Failed regions contribute nothing.
pub fn pool_candidates(reports: Vec<RegionReport>) -> Vec<Candidate> {
    reports
        .into_iter()
        .filter_map(|report| {
            let origin = report.region;
            report.result.ok().map(|states| {
                states
                    .into_iter()
                    .map(|state| Candidate {
                        state,
                        origin: origin.clone(),
                    })
                    .collect::<Vec<_>>()
            })
        })
        .flatten()
        .collect()
}

/// Shuffles a candidate pool and truncates it to `limit`.
pub struct Sampler {
    limit: usize,
    rng: Mutex<StdRng>,
}

impl Sampler {
    /// Sampler backed by OS entropy.
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Reproducible sampler for tests and replays.
    pub fn seeded(limit: usize, seed: u64) -> Self {
        Self {
            limit,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Fisher–Yates shuffle of the whole pool, then keep the first `limit`.
    pub fn sample(&self, mut candidates: Vec<Candidate>) -> Vec<Candidate> {
        if candidates.is_empty() {
            return candidates;
        }

        {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            candidates.shuffle(&mut *rng);
        }
        candidates.truncate(self.limit);
        candidates
    }
}
