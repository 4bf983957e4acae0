//! Time events, in the spirit of the reference event loop's linked list of
//! `{ mask, nextDeadline, intervalNs, callback }` records. Callbacks are
//! plain function pointers rather than closures: the one consumer of this
//! facility (the active-expiration sweep) needs access to the database,
//! which a captured closure cannot cleanly share with the rest of the loop,
//! so `run_due` takes it as an explicit argument instead.

use kv_db::Database;

pub enum Mask {
    Normal,
    /// Self-cancels after firing once. No production timer currently uses
    /// this; `register_once` exists for the one-shot half of the model and
    /// is exercised directly in tests.
    #[cfg_attr(not(test), allow(dead_code))]
    Once,
}

struct TimeEvent {
    mask: Mask,
    next_deadline_ns: i64,
    interval_ns: i64,
    callback: fn(&mut Database, i64),
}

#[derive(Default)]
pub struct TimeEvents {
    events: Vec<TimeEvent>,
}

impl TimeEvents {
    pub fn new() -> Self {
        TimeEvents { events: Vec::new() }
    }

    pub fn register_normal(&mut self, now_ns: i64, interval_ns: i64, callback: fn(&mut Database, i64)) {
        self.events.push(TimeEvent { mask: Mask::Normal, next_deadline_ns: now_ns + interval_ns, interval_ns, callback });
    }

    #[cfg(test)]
    pub fn register_once(&mut self, deadline_ns: i64, callback: fn(&mut Database, i64)) {
        self.events.push(TimeEvent { mask: Mask::Once, next_deadline_ns: deadline_ns, interval_ns: 0, callback });
    }

    /// Earliest deadline among all registered events, or `None` if there are
    /// none. The main loop clamps its wait to at most one second past this.
    pub fn next_deadline_ns(&self) -> Option<i64> {
        self.events.iter().map(|e| e.next_deadline_ns).min()
    }

    /// Runs every event whose deadline has passed, using the snapshot of
    /// events present at the start of the call — an event a callback
    /// registers mid-call only fires on a later tick.
    pub fn run_due(&mut self, db: &mut Database, now_ns: i64) {
        let due_count = self.events.len();
        let mut i = 0;
        while i < due_count.min(self.events.len()) {
            if self.events[i].next_deadline_ns <= now_ns {
                (self.events[i].callback)(db, now_ns);
                match self.events[i].mask {
                    Mask::Once => {
                        self.events.remove(i);
                        continue;
                    }
                    Mask::Normal => {
                        self.events[i].next_deadline_ns = now_ns + self.events[i].interval_ns;
                    }
                }
            }
            i += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_db: &mut Database, _now: i64) {}

    #[test]
    fn normal_event_reschedules_after_firing() {
        let mut events = TimeEvents::new();
        let mut db = Database::new();
        events.register_normal(0, 1_000, noop);
        assert_eq!(events.next_deadline_ns(), Some(1_000));
        events.run_due(&mut db, 1_000);
        assert_eq!(events.next_deadline_ns(), Some(2_000));
        events.run_due(&mut db, 1_500);
        assert_eq!(events.next_deadline_ns(), Some(2_000));
        events.run_due(&mut db, 2_000);
        assert_eq!(events.next_deadline_ns(), Some(3_000));
    }

    #[test]
    fn once_event_fires_a_single_time() {
        let mut events = TimeEvents::new();
        let mut db = Database::new();
        events.register_once(500, noop);
        events.run_due(&mut db, 1_000);
        assert_eq!(events.next_deadline_ns(), None);
    }

    #[test]
    fn event_not_yet_due_does_not_fire() {
        let mut events = TimeEvents::new();
        let mut db = Database::new();
        events.register_normal(0, 10_000, noop);
        events.run_due(&mut db, 5_000);
        assert_eq!(events.next_deadline_ns(), Some(10_000));
    }

    #[test]
    fn active_expiration_callback_reclaims_expired_keys() {
        let mut events = TimeEvents::new();
        let mut db = Database::new();
        db.set_str("k", "v".into(), 100).unwrap();
        fn sweep(db: &mut Database, now: i64) {
            db.sweep_expired_sample(now, 20);
        }
        events.register_normal(0, 1_000, sweep);
        events.run_due(&mut db, 1_000);
        assert_eq!(db.len(), 0);
    }
}
