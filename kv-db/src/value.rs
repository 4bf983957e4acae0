//! The typed value a key can be bound to, and the two composite container
//! types (`SetValue`, `SortedSetValue`) that combine a `Dict` with a `List`
//! or `SkipList` from `kv-core`.

use kv_core::{Dict, LinkedList, NodeHandle, SkipList};

use crate::error::DbError;

/// A set keeps a dict from member to list-node handle alongside an ordered
/// list of members, so membership tests and removal are both O(1).
#[derive(Debug)]
pub struct SetValue {
    members: Dict<String, NodeHandle>,
    order: LinkedList<String>,
}

impl Default for SetValue {
    fn default() -> Self {
        Self::new()
    }
}

impl SetValue {
    pub fn new() -> Self {
        SetValue { members: Dict::new(), order: LinkedList::new() }
    }

    pub fn add(&mut self, member: String) -> Result<(), DbError> {
        if self.members.exists(&member) {
            return Err(DbError::KeyAlreadyExists);
        }
        let handle = self.order.push_back(member.clone());
        self.members.set(member, handle).map_err(DbError::from)?;
        Ok(())
    }

    /// Removes `member` if present. Silently succeeds if it is already
    /// absent — see DESIGN.md for why this diverges from a strict "member
    /// not found" error.
    pub fn remove(&mut self, member: &str) {
        if let Ok(handle) = self.members.delete(&member.to_string()) {
            self.order.remove(handle);
        }
    }

    pub fn contains(&mut self, member: &str) -> bool {
        self.members.exists(&member.to_string())
    }

    pub fn card(&self) -> usize {
        self.order.len()
    }

    pub fn members(&self) -> Vec<String> {
        self.order.values().into_iter().cloned().collect()
    }

    /// Members present in both `self` and `other`.
    pub fn inter(&mut self, other: &mut SetValue) -> Vec<String> {
        let (small, big) = if self.card() <= other.card() { (self, other) } else { (other, self) };
        small.members().into_iter().filter(|m| big.contains(m)).collect()
    }

    /// Members present in `self` or `other`, each appearing once.
    pub fn union(&self, other: &SetValue) -> Vec<String> {
        let mut seen: Vec<String> = self.members();
        for m in other.members() {
            if !seen.contains(&m) {
                seen.push(m);
            }
        }
        seen
    }
}

/// A sorted set keeps a dict from member to score alongside a skip list
/// ordered by score, so score lookups are O(1) and range scans are
/// O(log n + k).
#[derive(Debug)]
pub struct SortedSetValue {
    scores: Dict<String, i64>,
    order: SkipList<String>,
}

/// Scores strictly greater than this are rejected as overflow, matching the
/// reference implementation's bound (`1 << 60`, inclusive).
pub const MAX_SCORE: i64 = 1 << 60;

impl Default for SortedSetValue {
    fn default() -> Self {
        Self::new()
    }
}

impl SortedSetValue {
    pub fn new() -> Self {
        SortedSetValue { scores: Dict::new(), order: SkipList::new() }
    }

    pub fn add_member(&mut self, member: String, score: i64) -> Result<(), DbError> {
        if score.unsigned_abs() as i128 > MAX_SCORE as i128 {
            return Err(DbError::Overflow);
        }
        if self.scores.exists(&member) {
            return Err(DbError::KeyAlreadyExists);
        }
        self.order.add(score, member.clone());
        self.scores.set(member, score).map_err(DbError::from)?;
        Ok(())
    }

    pub fn score(&mut self, member: &str) -> Result<i64, DbError> {
        self.scores.get(&member.to_string()).copied().map_err(DbError::from)
    }

    /// Adds `delta` to `member`'s score, inserting it at `delta` if absent.
    /// Removes and reinserts into the skip list so ordering stays correct.
    pub fn incr(&mut self, member: &str, delta: i64) -> Result<i64, DbError> {
        let current = self.scores.get(&member.to_string()).copied().unwrap_or(0);
        let new_score = current.checked_add(delta).ok_or(DbError::Overflow)?;
        if new_score.unsigned_abs() as i128 > MAX_SCORE as i128 {
            return Err(DbError::Overflow);
        }
        if self.scores.exists(&member.to_string()) {
            self.order.delete(current, &member.to_string());
        }
        self.order.add(new_score, member.to_string());
        self.scores.set(member.to_string(), new_score).map_err(DbError::from)?;
        Ok(new_score)
    }

    /// Removes `member` if present; a no-op otherwise (mirrors `SetValue::remove`).
    pub fn remove(&mut self, member: &str) {
        if let Ok(score) = self.scores.delete(&member.to_string()) {
            self.order.delete(score, &member.to_string());
        }
    }

    /// Member names (not scores) for every entry with `left <= score <= right`.
    pub fn range(&self, left: i64, right: i64) -> Vec<String> {
        self.order.range(left, right).into_iter().map(|(_, member)| member).collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// The tagged cell every key is bound to.
#[derive(Debug)]
pub enum Value {
    Str(String),
    Hash(Dict<String, String>),
    Set(SetValue),
    SortedSet(SortedSetValue),
    List(LinkedList<String>),
}

impl Value {
    pub fn as_str(&self) -> Result<&str, DbError> {
        match self {
            Value::Str(s) => Ok(s),
            _ => Err(DbError::IllegalType),
        }
    }

    pub fn as_hash_mut(&mut self) -> Result<&mut Dict<String, String>, DbError> {
        match self {
            Value::Hash(h) => Ok(h),
            _ => Err(DbError::IllegalType),
        }
    }

    pub fn as_set_mut(&mut self) -> Result<&mut SetValue, DbError> {
        match self {
            Value::Set(s) => Ok(s),
            _ => Err(DbError::IllegalType),
        }
    }

    pub fn as_sorted_set_mut(&mut self) -> Result<&mut SortedSetValue, DbError> {
        match self {
            Value::SortedSet(z) => Ok(z),
            _ => Err(DbError::IllegalType),
        }
    }

    pub fn as_list_mut(&mut self) -> Result<&mut LinkedList<String>, DbError> {
        match self {
            Value::List(l) => Ok(l),
            _ => Err(DbError::IllegalType),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_add_rejects_duplicate_member() {
        let mut s = SetValue::new();
        s.add("m".into()).unwrap();
        assert_eq!(s.add("m".into()), Err(DbError::KeyAlreadyExists));
    }

    #[test]
    fn set_remove_absent_member_is_a_no_op() {
        let mut s = SetValue::new();
        s.remove("missing");
        assert_eq!(s.card(), 0);
    }

    #[test]
    fn set_union_deduplicates() {
        let mut a = SetValue::new();
        a.add("x".into()).unwrap();
        a.add("y".into()).unwrap();
        let mut b = SetValue::new();
        b.add("y".into()).unwrap();
        b.add("z".into()).unwrap();
        let mut union = a.union(&b);
        union.sort();
        assert_eq!(union, vec!["x", "y", "z"]);
    }

    #[test]
    fn set_inter_keeps_common_members_only() {
        let mut a = SetValue::new();
        a.add("x".into()).unwrap();
        a.add("y".into()).unwrap();
        let mut b = SetValue::new();
        b.add("y".into()).unwrap();
        b.add("z".into()).unwrap();
        assert_eq!(a.inter(&mut b), vec!["y".to_string()]);
    }

    #[test]
    fn sorted_set_incr_reorders_by_new_score() {
        let mut z = SortedSetValue::new();
        z.add_member("a".into(), 10).unwrap();
        z.incr("a", 50).unwrap();
        assert_eq!(z.score("a").unwrap(), 60);
        assert_eq!(z.range(0, 100), vec!["a".to_string()]);
    }

    #[test]
    fn sorted_set_rejects_score_overflow() {
        let mut z = SortedSetValue::new();
        assert_eq!(z.add_member("a".into(), MAX_SCORE + 1), Err(DbError::Overflow));
    }
}
