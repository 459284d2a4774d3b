//! Process-wide ranking cache.
//!
//! Holds an immutable snapshot behind an `Arc`. A refresh builds a complete
//! new snapshot and swaps the pointer, so readers see either the previous
//! cycle or the new one, never a mix.

use chrono::{DateTime, Utc};
use std::sync::{Arc, PoisonError, RwLock};

use crate::types::{Ranking, ScoredSignal};

/// One completed refresh cycle.
#[derive(Debug, Clone, Default)]
pub struct RankingSnapshot {
    /// Entries by descending score, ties in symbol-list order.
    pub entries: Vec<ScoredSignal>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl RankingSnapshot {
    fn view<'a>(&self, entries: impl Iterator<Item = &'a ScoredSignal>) -> Ranking {
        Ranking {
            data: entries.cloned().collect(),
            updated_at: self.updated_at,
        }
    }
}

/// Ranking cache shared by the scheduler (single writer) and the API.
pub struct RankingCache {
    current: RwLock<Arc<RankingSnapshot>>,
}

impl RankingCache {
    /// Create an empty cache.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Current snapshot. Cheap: clones the pointer only.
    pub fn snapshot(&self) -> Arc<RankingSnapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the ranking with a cycle's results.
    ///
    /// Entries are ordered by descending score with a stable sort, so equal
    /// scores keep their input order.
    pub fn replace(&self, mut entries: Vec<ScoredSignal>, updated_at: DateTime<Utc>) {
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        let next = Arc::new(RankingSnapshot {
            entries,
            updated_at: Some(updated_at),
        });
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = next;
    }

    /// Full ranking.
    pub fn get_ranking(&self) -> Ranking {
        let snapshot = self.snapshot();
        snapshot.view(snapshot.entries.iter())
    }

    /// Entries with `score >= min_score`, still by descending score.
    pub fn get_ranking_above(&self, min_score: u8) -> Ranking {
        let snapshot = self.snapshot();
        snapshot.view(snapshot.entries.iter().filter(|e| e.score >= min_score))
    }

    /// Cached entry for a symbol (case-insensitive).
    pub fn get(&self, symbol: &str) -> Option<ScoredSignal> {
        self.snapshot()
            .entries
            .iter()
            .find(|e| e.symbol.eq_ignore_ascii_case(symbol))
            .cloned()
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.snapshot().updated_at
    }

    pub fn len(&self) -> usize {
        self.snapshot().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().entries.is_empty()
    }
}

impl Default for RankingCache {
    fn default() -> Self {
        Self {
            current: RwLock::new(Arc::new(RankingSnapshot::default())),
        }
    }
}
