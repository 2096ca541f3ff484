//! Height-balanced search tree of player records, keyed by player name.
//!
//! Every public operation leaves the tree ordered by key and AVL-balanced, so
//! lookups and inserts are O(log n). There is no deletion: players are never
//! removed once they have a record.

use crate::error::RankingError;
use crate::models::ranking::Record;
use crate::validation;
use log::debug;
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::iter::Take;

type Link = Option<Box<Node>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Node {
    #[serde(flatten)]
    record: Record,
    height: u32,
    #[serde(deserialize_with = "required_child")]
    left: Link,
    #[serde(deserialize_with = "required_child")]
    right: Link,
}

// Children must be present in the persisted form, even when null.
fn required_child<'de, D>(deserializer: D) -> Result<Link, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Box<Node>>::deserialize(deserializer)
}

impl Node {
    fn leaf(record: Record) -> Box<Node> {
        Box::new(Node {
            record,
            height: 1,
            left: None,
            right: None,
        })
    }

    fn update_height(&mut self) {
        self.height = 1 + height(&self.left).max(height(&self.right));
    }

    fn balance_factor(&self) -> i64 {
        i64::from(height(&self.left)) - i64::from(height(&self.right))
    }
}

fn height(link: &Link) -> u32 {
    link.as_ref().map_or(0, |node| node.height)
}

fn balance_factor(link: &Link) -> i64 {
    link.as_ref().map_or(0, |node| node.balance_factor())
}

fn rotate_right(mut y: Box<Node>) -> Box<Node> {
    let Some(mut x) = y.left.take() else {
        return y;
    };
    y.left = x.right.take();
    y.update_height();
    x.right = Some(y);
    x.update_height();
    x
}

fn rotate_left(mut x: Box<Node>) -> Box<Node> {
    let Some(mut y) = x.right.take() else {
        return x;
    };
    x.right = y.left.take();
    x.update_height();
    y.left = Some(x);
    y.update_height();
    y
}

/// What an upsert did to the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upserted {
    Inserted,
    Updated { new_best: bool },
}

fn upsert_at(link: Link, key: &str, score: u64) -> (Box<Node>, Upserted) {
    let mut node = match link {
        Some(node) => node,
        None => return (Node::leaf(Record::new(key, score)), Upserted::Inserted),
    };

    let outcome = match key.cmp(node.record.key()) {
        Ordering::Less => {
            let (child, outcome) = upsert_at(node.left.take(), key, score);
            node.left = Some(child);
            outcome
        }
        Ordering::Greater => {
            let (child, outcome) = upsert_at(node.right.take(), key, score);
            node.right = Some(child);
            outcome
        }
        Ordering::Equal => {
            // Updating in place leaves every height untouched.
            let new_best = node.record.push_score(score);
            return (node, Upserted::Updated { new_best });
        }
    };

    (rebalance(node, key), outcome)
}

fn rebalance(mut node: Box<Node>, key: &str) -> Box<Node> {
    node.update_height();
    let factor = node.balance_factor();

    if factor > 1 {
        match node.left.as_ref().map(|left| key.cmp(left.record.key())) {
            Some(Ordering::Less) => {
                debug!("left-left rotation at '{}'", node.record.key());
                return rotate_right(node);
            }
            Some(Ordering::Greater) => {
                debug!("left-right rotation at '{}'", node.record.key());
                node.left = node.left.take().map(rotate_left);
                return rotate_right(node);
            }
            _ => {}
        }
    } else if factor < -1 {
        match node.right.as_ref().map(|right| key.cmp(right.record.key())) {
            Some(Ordering::Greater) => {
                debug!("right-right rotation at '{}'", node.record.key());
                return rotate_left(node);
            }
            Some(Ordering::Less) => {
                debug!("right-left rotation at '{}'", node.record.key());
                node.right = node.right.take().map(rotate_right);
                return rotate_left(node);
            }
            _ => {}
        }
    }

    node
}

fn count(link: &Link) -> usize {
    link.as_ref()
        .map_or(0, |node| 1 + count(&node.left) + count(&node.right))
}

/// Checks ordering, stored heights, balance and record invariants below
/// `node`, where every key must lie strictly between `lower` and `upper`.
/// Returns the subtree height.
fn verify_node(node: &Node, lower: Option<&str>, upper: Option<&str>) -> Result<u32, RankingError> {
    let key = node.record.key();
    if lower.is_some_and(|lo| key <= lo) || upper.is_some_and(|hi| key >= hi) {
        return Err(RankingError::MalformedIndex(format!(
            "key '{}' is out of search-tree order",
            key
        )));
    }
    if let Some(violation) = node.record.invariant_violation() {
        return Err(RankingError::MalformedIndex(violation));
    }

    let left = match &node.left {
        Some(child) => verify_node(child, lower, Some(key))?,
        None => 0,
    };
    let right = match &node.right {
        Some(child) => verify_node(child, Some(key), upper)?,
        None => 0,
    };

    let expected = 1 + left.max(right);
    if node.height != expected {
        return Err(RankingError::MalformedIndex(format!(
            "node '{}' stores height {} but its subtrees give {}",
            key, node.height, expected
        )));
    }
    if left.abs_diff(right) > 1 {
        return Err(RankingError::MalformedIndex(format!(
            "node '{}' is unbalanced (left height {}, right height {})",
            key, left, right
        )));
    }
    Ok(expected)
}

/// The player leaderboard: records keyed by player name in an AVL tree.
#[derive(Debug, Clone, Default)]
pub struct RankedIndex {
    root: Link,
}

impl RankedIndex {
    pub fn new() -> Self {
        RankedIndex::default()
    }

    /// Records a run score for `key`, creating the player on first sight.
    ///
    /// An existing player keeps the higher of the old best and `score`, and
    /// `score` is always appended to their history. Negative scores are
    /// rejected with [`RankingError::InvalidScore`] and leave the index as is.
    pub fn upsert(&mut self, key: &str, score: i64) -> Result<Upserted, RankingError> {
        let score = validation::validate_score(score)?;
        let (root, outcome) = upsert_at(self.root.take(), key, score);
        self.root = Some(root);
        debug!("upsert '{}' with score {}: {:?}", key, score, outcome);
        debug_assert!(
            self.verify().is_ok(),
            "ranked index invariants broken after upsert of '{}'",
            key
        );
        Ok(outcome)
    }

    pub fn get(&self, key: &str) -> Option<&Record> {
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            match key.cmp(node.record.key()) {
                Ordering::Less => current = node.left.as_deref(),
                Ordering::Greater => current = node.right.as_deref(),
                Ordering::Equal => return Some(&node.record),
            }
        }
        None
    }

    /// Mutable lookup for the end-of-run counters. Scores go through
    /// [`RankedIndex::upsert`].
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Record> {
        let mut current = self.root.as_deref_mut();
        while let Some(node) = current {
            match key.cmp(node.record.key()) {
                Ordering::Less => current = node.left.as_deref_mut(),
                Ordering::Greater => current = node.right.as_deref_mut(),
                Ordering::Equal => return Some(&mut node.record),
            }
        }
        None
    }

    /// Up to `n` records in right-first traversal order (descending key).
    ///
    /// The traversal follows the tree, not the scores: when key order and
    /// score order disagree the result is not sorted by best score. The
    /// iterator stops visiting nodes once `n` records have been produced.
    pub fn top_n(&self, n: i64) -> Result<Take<Descending<'_>>, RankingError> {
        let n = validation::validate_limit(n)?;
        Ok(Descending::new(self.root.as_deref()).take(n))
    }

    /// All records in ascending key order.
    pub fn iter(&self) -> Iter<'_> {
        Iter::new(self.root.as_deref())
    }

    pub fn count(&self) -> usize {
        count(&self.root)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Height of the whole tree; 0 when empty.
    pub fn height(&self) -> u32 {
        height(&self.root)
    }

    pub fn balance_factor(&self) -> i64 {
        balance_factor(&self.root)
    }

    /// The record currently at the root of the tree.
    pub fn root(&self) -> Option<&Record> {
        self.root.as_deref().map(|node| &node.record)
    }

    pub fn total_deaths(&self) -> u64 {
        self.iter().map(Record::death_count).sum()
    }

    /// Checks every structural and record invariant, reporting the first
    /// violation found.
    pub fn verify(&self) -> Result<(), RankingError> {
        match &self.root {
            Some(node) => verify_node(node, None, None).map(|_| ()),
            None => Ok(()),
        }
    }

    /// Nested JSON form of the tree, one object per node with explicit
    /// `null` children. The empty index is `null`.
    pub fn to_json(&self) -> Result<String, RankingError> {
        Ok(serde_json::to_string_pretty(&self.root)?)
    }

    /// Restores a tree written by [`RankedIndex::to_json`].
    ///
    /// Stored heights are trusted, then checked: missing fields, wrong heights,
    /// imbalance or broken key order fail with
    /// [`RankingError::MalformedIndex`] rather than being repaired.
    pub fn from_json(text: &str) -> Result<Self, RankingError> {
        let root: Link = serde_json::from_str(text)?;
        let index = RankedIndex { root };
        index.verify()?;
        Ok(index)
    }
}

/// Reverse in-order traversal: right subtree, node, left subtree.
pub struct Descending<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Descending<'a> {
    fn new(root: Option<&'a Node>) -> Self {
        let mut iter = Descending { stack: Vec::new() };
        iter.push_right_spine(root);
        iter
    }

    fn push_right_spine(&mut self, mut node: Option<&'a Node>) {
        while let Some(n) = node {
            self.stack.push(n);
            node = n.right.as_deref();
        }
    }
}

impl<'a> Iterator for Descending<'a> {
    type Item = &'a Record;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_right_spine(node.left.as_deref());
        Some(&node.record)
    }
}

pub struct Iter<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iter<'a> {
    fn new(root: Option<&'a Node>) -> Self {
        let mut iter = Iter { stack: Vec::new() };
        iter.push_left_spine(root);
        iter
    }

    fn push_left_spine(&mut self, mut node: Option<&'a Node>) {
        while let Some(n) = node {
            self.stack.push(n);
            node = n.left.as_deref();
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Record;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left_spine(node.right.as_deref());
        Some(&node.record)
    }
}
