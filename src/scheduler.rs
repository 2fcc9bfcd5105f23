use std::cell::Cell;
use std::rc::Rc;

/// Shared flag that voids every task scheduled under it once cancelled
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

#[derive(Debug)]
struct Pending<A> {
    id: TaskId,
    due_at: f64,
    action: A,
    token: CancelToken,
}

/// Delayed actions on the scene's clock.
///
/// Time only moves through [`Scheduler::advance`], so the host's tick drives it.
#[derive(Debug)]
pub struct Scheduler<A> {
    now: f64,
    next_id: u64,
    pending: Vec<Pending<A>>,
}

impl<A> Scheduler<A> {
    pub fn new() -> Self {
        Self {
            now: 0.0,
            next_id: 0,
            pending: Vec::new(),
        }
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn schedule(&mut self, delay_secs: f64, action: A, token: &CancelToken) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.pending.push(Pending {
            id,
            due_at: self.now + delay_secs.max(0.0),
            action,
            token: token.clone(),
        });
        id
    }

    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.id != id);
        self.pending.len() != before
    }

    pub fn is_pending(&self, id: TaskId) -> bool {
        self.pending
            .iter()
            .any(|p| p.id == id && !p.token.is_cancelled())
    }

    pub fn len(&self) -> usize {
        self.pending
            .iter()
            .filter(|p| !p.token.is_cancelled())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Move the clock forward and hand back every live action that came due, oldest first.
    pub fn advance(&mut self, dt_secs: f64) -> Vec<(TaskId, A)> {
        self.now += dt_secs.max(0.0);
        let now = self.now + f64::EPSILON;

        self.pending.retain(|p| !p.token.is_cancelled());

        let mut due = Vec::new();
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].due_at <= now {
                due.push(self.pending.remove(i));
            } else {
                i += 1;
            }
        }

        due.sort_by(|a, b| {
            a.due_at
                .partial_cmp(&b.due_at)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.id.0.cmp(&b.id.0))
        });
        due.into_iter().map(|p| (p.id, p.action)).collect()
    }
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actions<A>(due: Vec<(TaskId, A)>) -> Vec<A> {
        due.into_iter().map(|(_, a)| a).collect()
    }

    #[test]
    fn test_actions_fire_when_due() {
        let token = CancelToken::new();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(1.0, "one", &token);
        scheduler.schedule(0.5, "half", &token);

        assert!(actions(scheduler.advance(0.25)).is_empty());
        assert_eq!(actions(scheduler.advance(0.25)), vec!["half"]);
        assert_eq!(actions(scheduler.advance(0.5)), vec!["one"]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_due_actions_are_ordered() {
        let token = CancelToken::new();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(3.0, 3, &token);
        scheduler.schedule(1.0, 1, &token);
        scheduler.schedule(2.0, 2, &token);
        scheduler.schedule(1.0, 11, &token);

        assert_eq!(actions(scheduler.advance(5.0)), vec![1, 11, 2, 3]);
    }

    #[test]
    fn test_cancelled_token_drops_tasks() {
        let old = CancelToken::new();
        let fresh = CancelToken::new();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(1.0, "stale", &old);
        scheduler.schedule(1.0, "live", &fresh);

        old.cancel();
        assert_eq!(scheduler.len(), 1);
        assert_eq!(actions(scheduler.advance(1.0)), vec!["live"]);
    }

    #[test]
    fn test_cancel_single_task() {
        let token = CancelToken::new();
        let mut scheduler = Scheduler::new();
        let id = scheduler.schedule(1.0, "x", &token);

        assert!(scheduler.is_pending(id));
        assert!(scheduler.cancel(id));
        assert!(!scheduler.is_pending(id));
        assert!(!scheduler.cancel(id));
        assert!(actions(scheduler.advance(2.0)).is_empty());
    }

    #[test]
    fn test_clock_accumulates() {
        let mut scheduler: Scheduler<()> = Scheduler::new();
        scheduler.advance(0.5);
        scheduler.advance(0.25);
        assert_eq!(scheduler.now(), 0.75);
    }
}
