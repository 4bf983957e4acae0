//! Skip list ordered by an integer score, used as the backing store for
//! sorted-set ranges. Duplicate scores are permitted (this is a multiset, not
//! a map): `Add` never checks for an existing (score, value) pair.

use rand::Rng;
use slab::Slab;

const MAX_LEVEL: usize = 20;
const PROMOTION_P: f64 = 0.5;

#[derive(Debug)]
struct Node<T> {
    score: i64,
    value: T,
    forward: Vec<Option<usize>>,
}

#[derive(Debug)]
pub struct SkipList<T> {
    nodes: Slab<Node<T>>,
    head: [Option<usize>; MAX_LEVEL],
    level: usize,
}

impl<T> Default for SkipList<T>
where
    T: Clone + Eq,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SkipList<T>
where
    T: Clone + Eq,
{
    pub fn new() -> Self {
        SkipList { nodes: Slab::new(), head: [None; MAX_LEVEL], level: 1 }
    }

    fn forward(&self, pred: Option<usize>, level: usize) -> Option<usize> {
        match pred {
            None => self.head[level],
            Some(key) => self.nodes[key].forward.get(level).copied().flatten(),
        }
    }

    fn set_forward(&mut self, pred: Option<usize>, level: usize, target: Option<usize>) {
        match pred {
            None => self.head[level] = target,
            Some(key) => {
                let fwd = &mut self.nodes[key].forward;
                if level < fwd.len() {
                    fwd[level] = target;
                }
            }
        }
    }

    fn random_level() -> usize {
        let mut rng = rand::rng();
        let mut level = 1;
        while level < MAX_LEVEL && rng.random_bool(PROMOTION_P) {
            level += 1;
        }
        level
    }

    /// Inserts `(score, value)` unconditionally; duplicates of the same score
    /// are fine and will appear in score order with insertion order among
    /// themselves undefined.
    pub fn add(&mut self, score: i64, value: T) {
        let mut update: Vec<Option<usize>> = vec![None; self.level];
        let mut pred = None;
        for lvl in (0..self.level).rev() {
            loop {
                match self.forward(pred, lvl) {
                    Some(next) if self.nodes[next].score < score => pred = Some(next),
                    _ => break,
                }
            }
            update[lvl] = pred;
        }

        let new_level = Self::random_level();
        if new_level > self.level {
            update.resize(new_level, None);
            self.level = new_level;
        }

        let forward = vec![None; new_level];
        let key = self.nodes.insert(Node { score, value, forward });
        for lvl in 0..new_level {
            let next = self.forward(update[lvl], lvl);
            self.nodes[key].forward[lvl] = next;
            self.set_forward(update[lvl], lvl, Some(key));
        }
    }

    /// Removes the first node matching exactly `(score, value)`. Returns
    /// whether a node was removed.
    pub fn delete(&mut self, score: i64, value: &T) -> bool {
        let mut update: Vec<Option<usize>> = vec![None; self.level];
        let mut pred = None;
        for lvl in (0..self.level).rev() {
            loop {
                match self.forward(pred, lvl) {
                    Some(next)
                        if self.nodes[next].score < score
                            || (self.nodes[next].score == score && &self.nodes[next].value != value) =>
                    {
                        pred = Some(next)
                    }
                    _ => break,
                }
            }
            update[lvl] = pred;
        }

        let target = self.forward(pred, 0);
        let target = match target {
            Some(key) if self.nodes[key].score == score && &self.nodes[key].value == value => key,
            _ => return false,
        };

        let target_level = self.nodes[target].forward.len();
        for lvl in 0..target_level {
            if self.forward(update[lvl], lvl) == Some(target) {
                let next = self.nodes[target].forward[lvl];
                self.set_forward(update[lvl], lvl, next);
            }
        }
        self.nodes.remove(target);
        while self.level > 1 && self.head[self.level - 1].is_none() {
            self.level -= 1;
        }
        true
    }

    /// Returns `(score, value)` pairs with `left <= score <= right`, in
    /// ascending score order.
    pub fn range(&self, left: i64, right: i64) -> Vec<(i64, T)> {
        let mut out = Vec::new();
        let mut pred = None;
        for lvl in (0..self.level).rev() {
            loop {
                match self.forward(pred, lvl) {
                    Some(next) if self.nodes[next].score < left => pred = Some(next),
                    _ => break,
                }
            }
        }
        let mut cursor = self.forward(pred, 0);
        while let Some(key) = cursor {
            let node = &self.nodes[key];
            if node.score > right {
                break;
            }
            out.push((node.score, node.value.clone()));
            cursor = node.forward.first().copied().flatten();
        }
        out
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_returns_ascending_scores() {
        let mut s: SkipList<String> = SkipList::new();
        s.add(10, "a".into());
        s.add(5, "b".into());
        s.add(20, "c".into());
        let got: Vec<(i64, String)> = s.range(0, 15);
        assert_eq!(got, vec![(5, "b".to_string()), (10, "a".to_string())]);
    }

    #[test]
    fn delete_removes_exact_match_only() {
        let mut s: SkipList<String> = SkipList::new();
        s.add(10, "a".into());
        s.add(10, "b".into());
        assert!(s.delete(10, &"a".to_string()));
        let got = s.range(0, 100);
        assert_eq!(got, vec![(10, "b".to_string())]);
        assert!(!s.delete(10, &"a".to_string()));
    }

    #[test]
    fn duplicate_scores_both_survive_until_deleted() {
        let mut s: SkipList<i32> = SkipList::new();
        s.add(1, 100);
        s.add(1, 200);
        assert_eq!(s.len(), 2);
        let got = s.range(1, 1);
        assert_eq!(got.len(), 2);
    }

    #[test]
    fn range_with_no_matches_is_empty() {
        let mut s: SkipList<i32> = SkipList::new();
        s.add(1, 1);
        s.add(2, 2);
        assert!(s.range(10, 20).is_empty());
    }

    #[test]
    fn many_inserts_keep_list_sorted() {
        let mut s: SkipList<i64> = SkipList::new();
        for i in (0..200).rev() {
            s.add(i, i);
        }
        let got = s.range(i64::MIN, i64::MAX);
        let scores: Vec<i64> = got.iter().map(|(sc, _)| *sc).collect();
        let mut sorted = scores.clone();
        sorted.sort();
        assert_eq!(scores, sorted);
        assert_eq!(got.len(), 200);
    }
}
