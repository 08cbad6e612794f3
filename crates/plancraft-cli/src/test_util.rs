//! Helpers for tests that touch process-wide environment variables.

use std::sync::{Mutex, MutexGuard};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Serialize tests that read or write environment variables.
pub fn lock_env() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Restores the previous values of the variables it touched on drop.
///
/// Only use while holding [`lock_env`].
pub struct EnvGuard {
    saved: Vec<(String, Option<String>)>,
}

impl EnvGuard {
    pub fn set(vars: &[(&str, &str)]) -> Self {
        let saved = vars
            .iter()
            .map(|(key, value)| {
                let previous = std::env::var(key).ok();
                unsafe { std::env::set_var(key, value) };
                ((*key).to_owned(), previous)
            })
            .collect();
        Self { saved }
    }

    pub fn clear(keys: &[&str]) -> Self {
        let saved = keys
            .iter()
            .map(|key| {
                let previous = std::env::var(key).ok();
                unsafe { std::env::remove_var(key) };
                ((*key).to_owned(), previous)
            })
            .collect();
        Self { saved }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, previous) in self.saved.iter().rev() {
            match previous {
                Some(value) => unsafe { std::env::set_var(key, value) },
                None => unsafe { std::env::remove_var(key) },
            }
        }
    }
}
