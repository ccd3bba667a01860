/// Timer seam shared by every animation loop on the page.
///
/// Each call hands back an owned task; dropping the task cancels it. Components
/// keep their own tasks, so there is no global registry to clean up.
pub trait Scheduler: Clone + 'static {
    type Task: 'static;

    fn timeout<F>(&self, millis: u32, callback: F) -> Self::Task
    where
        F: FnOnce() + 'static;

    fn interval<F>(&self, millis: u32, callback: F) -> Self::Task
    where
        F: FnMut() + 'static;
}

#[cfg(test)]
pub use manual::{ManualScheduler, ManualTask};
