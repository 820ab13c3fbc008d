//! Event-loop integration: task spawning and timer-backed delays.

use std::{rc::Rc, time::Duration};

use futures::{channel::oneshot, future::LocalBoxFuture};
use palette_host::DelayService;

/// Spawns a local task on the UI event loop.
pub type Spawner = Rc<dyn Fn(LocalBoxFuture<'static, ()>)>;

/// Spawner backed by [`leptos::spawn_local`].
pub fn leptos_spawner() -> Spawner {
    Rc::new(|task: LocalBoxFuture<'static, ()>| leptos::spawn_local(task))
}

/// Delay service backed by [`leptos::set_timeout`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeoutDelayService;

impl DelayService for TimeoutDelayService {
    fn delay(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        let (wake, wait) = oneshot::channel::<()>();
        leptos::set_timeout(
            move || {
                let _ = wake.send(());
            },
            duration,
        );
        Box::pin(async move {
            let _ = wait.await;
        })
    }
}
