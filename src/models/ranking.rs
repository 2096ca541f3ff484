use serde::{Deserialize, Serialize};

/// Accumulated statistics for one player, stored at a single position of the
/// ranked index.
///
/// `history` is append-only and `total_runs` always equals its length. Only the
/// index can append scores; collaborators update the remaining counters through
/// the `record_*` mutators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    key: String,
    best_score: u64,
    history: Vec<u64>,
    total_runs: u64,
    death_count: u64,
    best_event_streak: u64,
    bosses_defeated: u64,
}

impl Record {
    /// A first run: singleton history, every other counter zero.
    pub fn new(key: impl Into<String>, score: u64) -> Self {
        Record {
            key: key.into(),
            best_score: score,
            history: vec![score],
            total_runs: 1,
            death_count: 0,
            best_event_streak: 0,
            bosses_defeated: 0,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn best_score(&self) -> u64 {
        self.best_score
    }

    /// Every score submitted for this player, oldest first.
    pub fn history(&self) -> &[u64] {
        &self.history
    }

    pub fn total_runs(&self) -> u64 {
        self.total_runs
    }

    pub fn death_count(&self) -> u64 {
        self.death_count
    }

    pub fn best_event_streak(&self) -> u64 {
        self.best_event_streak
    }

    pub fn bosses_defeated(&self) -> u64 {
        self.bosses_defeated
    }

    /// Appends a run score. Returns `true` when it beats the previous best.
    pub(crate) fn push_score(&mut self, score: u64) -> bool {
        let new_best = score > self.best_score;
        if new_best {
            self.best_score = score;
        }
        self.history.push(score);
        self.total_runs = self.history.len() as u64;
        new_best
    }

    pub fn record_death(&mut self) {
        self.death_count = self.death_count.saturating_add(1);
    }

    /// Raises the event-streak high-water mark; lower values are ignored.
    pub fn record_event_streak(&mut self, events: u64) {
        self.best_event_streak = self.best_event_streak.max(events);
    }

    pub fn add_bosses_defeated(&mut self, count: u64) {
        self.bosses_defeated = self.bosses_defeated.saturating_add(count);
    }

    pub fn average_score(&self) -> Option<f64> {
        if self.history.is_empty() {
            return None;
        }
        let sum: u128 = self.history.iter().map(|&s| u128::from(s)).sum();
        Some(sum as f64 / self.history.len() as f64)
    }

    /// The last `k` scores, oldest first.
    pub fn recent_history(&self, k: usize) -> &[u64] {
        let start = self.history.len().saturating_sub(k);
        &self.history[start..]
    }

    pub fn wins(&self) -> u64 {
        self.total_runs.saturating_sub(self.death_count)
    }

    /// Whole-number percentage of runs survived.
    pub fn win_rate(&self) -> u64 {
        if self.total_runs == 0 {
            0
        } else {
            self.wins() * 100 / self.total_runs
        }
    }

    /// Describes the first violated record invariant, if any.
    pub(crate) fn invariant_violation(&self) -> Option<String> {
        if self.total_runs != self.history.len() as u64 {
            return Some(format!(
                "record '{}' has totalRuns {} but {} history entries",
                self.key,
                self.total_runs,
                self.history.len()
            ));
        }
        match self.history.iter().max() {
            None => Some(format!("record '{}' has an empty history", self.key)),
            Some(&max) if max != self.best_score => Some(format!(
                "record '{}' has bestScore {} but its history maximum is {}",
                self.key, self.best_score, max
            )),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub player: String,
    pub score: i64,
    pub events_survived: u64,
    pub bosses_defeated: u64,
    pub died: bool,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RunOutcome {
    pub player: String,
    pub new_best: bool,
    pub best_score: u64,
    pub total_runs: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    pub rank: usize,
    pub name: String,
    pub best_score: u64,
    pub bosses_defeated: u64,
    pub best_event_streak: u64,
    pub death_count: u64,
    pub total_runs: u64,
    pub win_rate: u64,
}

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RankingStats {
    pub total_players: usize,
    pub average_score: u64,
    pub total_bosses: u64,
    pub total_events: u64,
    pub average_win_rate: u64,
}

#[derive(Debug, Serialize)]
pub struct RankingReport {
    pub players: Vec<RankingEntry>,
    pub total: usize,
    pub stats: RankingStats,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDetail {
    pub name: String,
    pub best_score: u64,
    pub bosses_defeated: u64,
    pub best_event_streak: u64,
    pub death_count: u64,
    pub total_runs: u64,
    pub win_rate: u64,
    pub recent_history: Vec<u64>,
    pub best_recent: u64,
    pub worst_recent: u64,
    pub average_score: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStats {
    pub total_players: usize,
    pub total_deaths: u64,
    pub version: &'static str,
    pub generated_at: String,
}

#[derive(Debug, Deserialize)]
pub struct RankingQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct TopQuery {
    pub n: Option<i64>,
}
