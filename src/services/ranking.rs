use crate::error::RankingError;
use crate::models::ranking::*;
use crate::services::ranked_index::{RankedIndex, Upserted};
use crate::validation;
use chrono::Utc;
use log::info;

const RECENT_RUNS: usize = 10;

/// Applies the result of a finished run: the score goes into the index, then
/// the player's event streak, boss kills and death count are updated.
pub fn record_run(index: &mut RankedIndex, run: RunSummary) -> Result<RunOutcome, RankingError> {
    let player = validation::validate_player_name(&run.player)?;
    let upserted = index.upsert(&player, run.score)?;

    let record = index
        .get_mut(&player)
        .ok_or_else(|| RankingError::NotFound(player.clone()))?;
    record.record_event_streak(run.events_survived);
    record.add_bosses_defeated(run.bosses_defeated);
    if run.died {
        record.record_death();
    }

    let new_best = matches!(
        upserted,
        Upserted::Inserted | Upserted::Updated { new_best: true }
    );
    if new_best {
        info!("new best for {}: {}", player, record.best_score());
    }

    Ok(RunOutcome {
        new_best,
        best_score: record.best_score(),
        total_runs: record.total_runs(),
        player,
    })
}

fn entry(rank: usize, record: &Record) -> RankingEntry {
    RankingEntry {
        rank,
        name: record.key().to_string(),
        best_score: record.best_score(),
        bosses_defeated: record.bosses_defeated(),
        best_event_streak: record.best_event_streak(),
        death_count: record.death_count(),
        total_runs: record.total_runs(),
        win_rate: record.win_rate(),
    }
}

// Integer mean, summed wide so that large scores cannot overflow.
fn mean(values: impl ExactSizeIterator<Item = u64>) -> u64 {
    let count = values.len() as u128;
    if count == 0 {
        return 0;
    }
    let sum: u128 = values.map(u128::from).sum();
    u64::try_from(sum / count).unwrap_or(u64::MAX)
}

fn saturating_total(values: impl Iterator<Item = u64>) -> u64 {
    values.fold(0, u64::saturating_add)
}

/// Every player sorted by best score (highest first, ties by name), with
/// aggregate statistics over the whole leaderboard.
pub fn get_ranking(index: &RankedIndex, limit: Option<i64>) -> Result<RankingReport, RankingError> {
    let limit = match limit {
        Some(n) => validation::validate_limit(n)?,
        None => usize::MAX,
    };

    let mut records: Vec<&Record> = index.iter().collect();
    // Stable sort keeps ascending key order among equal scores.
    records.sort_by(|a, b| b.best_score().cmp(&a.best_score()));

    let stats = if records.is_empty() {
        RankingStats::default()
    } else {
        RankingStats {
            total_players: records.len(),
            average_score: mean(records.iter().map(|r| r.best_score())),
            total_bosses: saturating_total(records.iter().map(|r| r.bosses_defeated())),
            total_events: saturating_total(records.iter().map(|r| r.best_event_streak())),
            average_win_rate: mean(records.iter().map(|r| r.win_rate())),
        }
    };

    let players: Vec<RankingEntry> = records
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, record)| entry(i + 1, record))
        .collect();

    Ok(RankingReport {
        total: players.len(),
        players,
        stats,
    })
}

/// The index's own top-N, in tree traversal order.
pub fn get_top(index: &RankedIndex, n: i64) -> Result<Vec<RankingEntry>, RankingError> {
    Ok(index
        .top_n(n)?
        .enumerate()
        .map(|(i, record)| entry(i + 1, record))
        .collect())
}

pub fn get_player(index: &RankedIndex, name: &str) -> Result<PlayerDetail, RankingError> {
    let record = index
        .get(name)
        .ok_or_else(|| RankingError::NotFound(name.to_string()))?;

    let recent = record.recent_history(RECENT_RUNS);
    Ok(PlayerDetail {
        name: record.key().to_string(),
        best_score: record.best_score(),
        bosses_defeated: record.bosses_defeated(),
        best_event_streak: record.best_event_streak(),
        death_count: record.death_count(),
        total_runs: record.total_runs(),
        win_rate: record.win_rate(),
        recent_history: recent.to_vec(),
        best_recent: recent.iter().copied().max().unwrap_or(0),
        worst_recent: recent.iter().copied().min().unwrap_or(0),
        average_score: record.average_score().unwrap_or(0.0),
    })
}

pub fn get_stats(index: &RankedIndex) -> ServerStats {
    ServerStats {
        total_players: index.count(),
        total_deaths: index.total_deaths(),
        version: env!("CARGO_PKG_VERSION"),
        generated_at: Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(player: &str, score: i64, died: bool) -> RunSummary {
        RunSummary {
            player: player.into(),
            score,
            events_survived: 5,
            bosses_defeated: 1,
            died,
        }
    }

    fn sample_index() -> RankedIndex {
        let mut index = RankedIndex::new();
        record_run(&mut index, run("B", 200, false)).unwrap();
        record_run(&mut index, run("A", 50, true)).unwrap();
        record_run(&mut index, run("C", 100, false)).unwrap();
        index
    }

    #[test]
    fn test_record_run_updates_all_counters() {
        let mut index = RankedIndex::new();
        let first = record_run(&mut index, run("  Ana ", 100, true)).unwrap();
        assert_eq!(
            first,
            RunOutcome {
                player: "Ana".into(),
                new_best: true,
                best_score: 100,
                total_runs: 1,
            }
        );

        let second = record_run(
            &mut index,
            RunSummary {
                events_survived: 2,
                ..run("Ana", 40, false)
            },
        )
        .unwrap();
        assert!(!second.new_best);
        assert_eq!(second.total_runs, 2);

        let ana = index.get("Ana").unwrap();
        assert_eq!(ana.death_count(), 1);
        assert_eq!(ana.bosses_defeated(), 2);
        assert_eq!(ana.best_event_streak(), 5);
        assert_eq!(ana.history(), &[100, 40]);
    }

    #[test]
    fn test_record_run_rejects_bad_input() {
        let mut index = RankedIndex::new();
        assert!(matches!(
            record_run(&mut index, run("Ana", -10, false)),
            Err(RankingError::InvalidScore(-10))
        ));
        assert!(matches!(
            record_run(&mut index, run("   ", 10, false)),
            Err(RankingError::InvalidArgument(_))
        ));
        assert!(index.is_empty());
    }

    #[test]
    fn test_ranking_sorted_by_score() {
        let index = sample_index();
        let report = get_ranking(&index, None).unwrap();
        let names: Vec<&str> = report.players.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["B", "C", "A"]);
        assert_eq!(report.players[0].rank, 1);
        assert_eq!(report.total, 3);
        assert_eq!(
            report.stats,
            RankingStats {
                total_players: 3,
                average_score: 116,
                total_bosses: 3,
                total_events: 15,
                average_win_rate: 66,
            }
        );
    }

    #[test]
    fn test_ranking_limit() {
        let index = sample_index();
        let report = get_ranking(&index, Some(1)).unwrap();
        assert_eq!(report.total, 1);
        assert_eq!(report.players[0].name, "B");
        assert_eq!(report.stats.total_players, 3);
        assert!(get_ranking(&index, Some(-1)).is_err());
    }

    #[test]
    fn test_huge_scores_do_not_overflow() {
        let mut index = RankedIndex::new();
        for player in ["A", "B", "C"] {
            index.upsert(player, i64::MAX).unwrap();
        }
        for _ in 0..2 {
            index.upsert("A", i64::MAX).unwrap();
        }
        let report = get_ranking(&index, None).unwrap();
        assert_eq!(report.stats.average_score, i64::MAX as u64);
        assert_eq!(report.total, 3);

        let detail = get_player(&index, "A").unwrap();
        assert_eq!(detail.total_runs, 3);
        assert_eq!(detail.average_score, i64::MAX as f64);
    }

    #[test]
    fn test_empty_ranking() {
        let report = get_ranking(&RankedIndex::new(), None).unwrap();
        assert!(report.players.is_empty());
        assert_eq!(report.stats, RankingStats::default());
    }

    #[test]
    fn test_top_uses_traversal_order() {
        let index = sample_index();
        let top = get_top(&index, 2).unwrap();
        let names: Vec<&str> = top.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["C", "B"]);
    }

    #[test]
    fn test_player_detail() {
        let mut index = sample_index();
        for score in 0..12 {
            record_run(&mut index, run("A", score * 10, false)).unwrap();
        }
        let detail = get_player(&index, "A").unwrap();
        assert_eq!(detail.total_runs, 13);
        assert_eq!(detail.recent_history.len(), 10);
        assert_eq!(detail.recent_history[0], 20);
        assert_eq!(detail.best_recent, 110);
        assert_eq!(detail.worst_recent, 20);
        assert_eq!(detail.best_score, 110);
        assert!(matches!(
            get_player(&index, "Nobody"),
            Err(RankingError::NotFound(_))
        ));
    }

    #[test]
    fn test_stats() {
        let index = sample_index();
        let stats = get_stats(&index);
        assert_eq!(stats.total_players, 3);
        assert_eq!(stats.total_deaths, 1);
        assert!(!stats.generated_at.is_empty());
    }
}
