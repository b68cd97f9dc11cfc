pub mod backoff;
pub mod handle;
pub mod poller;
pub mod sinks;
pub mod timer;

pub use handle::SchedulerHandle;
pub use poller::Scheduler;
pub use sinks::{AlertSink, LogDisplay, LogNotifier, Sinks};
