//! Persistent player leaderboard for Insalubre runs.
//!
//! The core is [`services::ranked_index::RankedIndex`], an AVL tree of
//! [`models::ranking::Record`]s keyed by player name. The game loop records
//! runs through [`services::ranking::record_run`] and persists the tree with
//! [`storage::RankingStore`]; the HTTP handlers only ever read saved snapshots.

pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod storage;
pub mod validation;
