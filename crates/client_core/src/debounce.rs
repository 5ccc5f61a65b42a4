use std::{sync::Arc, time::Duration};

use tokio::{
    task::JoinHandle,
    time::{sleep_until, Instant},
};

type Commit<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Forwards the last pushed value to `commit` once `delay` has passed with no
/// newer push. Must be pushed to from inside a tokio runtime.
pub struct Debouncer<T> {
    delay: Duration,
    commit: Commit<T>,
    pending: Option<JoinHandle<()>>,
}

impl<T> Debouncer<T>
where
    T: Send + 'static,
{
    pub fn new(delay: Duration, commit: impl Fn(T) + Send + Sync + 'static) -> Self {
        Self {
            delay,
            commit: Arc::new(commit),
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn push(&mut self, value: T) {
        self.cancel();

        let deadline = Instant::now() + self.delay;
        let commit = Arc::clone(&self.commit);
        self.pending = Some(tokio::spawn(async move {
            sleep_until(deadline).await;
            commit(value);
        }));
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
#[path = "tests/debounce_tests.rs"]
mod tests;
