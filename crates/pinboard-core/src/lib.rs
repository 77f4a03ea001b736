//! Core pinboard library (backend client, config, feed and compose flows).

pub mod backend;
pub mod compose;
pub mod config;
pub mod feed;
pub mod paths;
pub mod types;

#[cfg(test)]
pub(crate) mod test_env {
    use std::sync::{Mutex, MutexGuard};

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Serializes tests that mutate PINBOARD_* environment variables.
    pub(crate) fn lock() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
