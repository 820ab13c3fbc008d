//! Delay service contracts and a manually driven clock for deterministic tests.

use std::{cell::RefCell, rc::Rc, time::Duration};

use futures::{channel::oneshot, future::LocalBoxFuture};

/// Host service for one-shot delays on the UI event loop.
pub trait DelayService {
    /// Returns a future that resolves once `duration` has elapsed.
    fn delay(&self, duration: Duration) -> LocalBoxFuture<'static, ()>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Delay service whose delays resolve immediately.
pub struct ImmediateDelayService;

impl DelayService for ImmediateDelayService {
    fn delay(&self, _duration: Duration) -> LocalBoxFuture<'static, ()> {
        Box::pin(async {})
    }
}

#[derive(Default)]
struct ManualClockState {
    now: Duration,
    next_seq: u64,
    pending: Vec<PendingDelay>,
}

struct PendingDelay {
    deadline: Duration,
    seq: u64,
    wake: oneshot::Sender<()>,
}

/// Delay service driven by explicit [`ManualDelayService::advance`] calls.
///
/// Delays resolve in deadline order; delays sharing a deadline resolve in creation order.
#[derive(Clone, Default)]
pub struct ManualDelayService {
    state: Rc<RefCell<ManualClockState>>,
}

impl ManualDelayService {
    /// Current virtual time since creation.
    pub fn now(&self) -> Duration {
        self.state.borrow().now
    }

    /// Number of delays that have not resolved yet.
    pub fn pending(&self) -> usize {
        self.state.borrow().pending.len()
    }

    /// Advances virtual time and resolves every delay whose deadline has passed.
    ///
    /// Woken futures still need their executor to be polled before they observe completion.
    pub fn advance(&self, by: Duration) {
        let due = {
            let mut state = self.state.borrow_mut();
            state.now += by;
            let now = state.now;
            let (mut due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut state.pending)
                .into_iter()
                .partition(|delay| delay.deadline <= now);
            state.pending = pending;
            due.sort_by_key(|delay| (delay.deadline, delay.seq));
            due
        };
        for delay in due {
            let _ = delay.wake.send(());
        }
    }
}

impl DelayService for ManualDelayService {
    fn delay(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        let (wake, wait) = oneshot::channel();
        {
            let mut state = self.state.borrow_mut();
            let deadline = state.now + duration;
            let seq = state.next_seq;
            state.next_seq += 1;
            state.pending.push(PendingDelay {
                deadline,
                seq,
                wake,
            });
        }
        Box::pin(async move {
            let _ = wait.await;
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use futures::{executor::LocalPool, task::LocalSpawnExt};

    use super::*;

    #[test]
    fn manual_delays_resolve_only_after_advance() {
        let mut pool = LocalPool::new();
        let clock = ManualDelayService::default();
        let fired = Rc::new(Cell::new(false));

        let wait = clock.delay(Duration::from_millis(300));
        let flag = fired.clone();
        pool.spawner()
            .spawn_local(async move {
                wait.await;
                flag.set(true);
            })
            .expect("spawn");

        pool.run_until_stalled();
        assert!(!fired.get());

        clock.advance(Duration::from_millis(299));
        pool.run_until_stalled();
        assert!(!fired.get());
        assert_eq!(clock.pending(), 1);

        clock.advance(Duration::from_millis(1));
        pool.run_until_stalled();
        assert!(fired.get());
        assert_eq!(clock.pending(), 0);
        assert_eq!(clock.now(), Duration::from_millis(300));
    }

    #[test]
    fn immediate_delay_is_ready() {
        futures::executor::block_on(ImmediateDelayService.delay(Duration::from_secs(5)));
    }
}
