/// One-shot timers owned by the poller
use log::debug;
use std::future;
use std::pin::Pin;
use tokio::time::{sleep, Duration, Sleep};

/// A single re-armable one-shot timer.
///
/// Arming replaces any previous deadline, so at most one instance of each
/// timer is ever outstanding. Cancelling drops the underlying sleep; a
/// cancelled timer can never fire.
#[derive(Debug)]
pub struct Timer {
    name: &'static str,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl Timer {
    pub fn new(name: &'static str) -> Self {
        Timer { name, sleep: None }
    }

    pub fn arm(&mut self, delay: Duration) {
        if self.sleep.is_some() {
            debug!("Replacing armed {} timer", self.name);
        }
        debug!("Arming {} timer for {}s", self.name, delay.as_secs());
        self.sleep = Some(Box::pin(sleep(delay)));
    }

    /// Returns whether a timer was armed
    pub fn cancel(&mut self) -> bool {
        let was_armed = self.sleep.take().is_some();
        if was_armed {
            debug!("Cancelled {} timer", self.name);
        }
        was_armed
    }

    pub fn is_armed(&self) -> bool {
        self.sleep.is_some()
    }

    #[cfg(test)]
    pub fn deadline(&self) -> Option<tokio::time::Instant> {
        self.sleep.as_ref().map(|s| s.deadline())
    }

    /// Resolves once the armed deadline passes and disarms the timer.
    ///
    /// Never resolves while disarmed. Dropping this future before it
    /// completes leaves the timer armed.
    pub async fn expired(&mut self) {
        match self.sleep.as_mut() {
            Some(sleep) => sleep.await,
            None => future::pending().await,
        }
        self.sleep = None;
    }
}
