//! Page location seam.

use mockall::automock;
use parking_lot::Mutex;

/// Current page location and redirects.
#[automock]
pub trait Navigator: Send + Sync {
    /// Path of the page currently shown.
    fn current_path(&self) -> String;

    /// Navigate to `path`.
    fn redirect(&self, path: &str);
}

/// Navigator that only tracks a path in memory.
#[derive(Debug)]
pub struct MemoryNavigator {
    history: Mutex<Vec<String>>,
}

impl MemoryNavigator {
    /// A navigator showing `path`.
    #[must_use]
    pub fn at(path: impl Into<String>) -> Self {
        Self {
            history: Mutex::new(vec![path.into()]),
        }
    }

    /// Every path visited, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.history.lock().clone()
    }
}

impl Navigator for MemoryNavigator {
    fn current_path(&self) -> String {
        self.history.lock().last().cloned().unwrap_or_default()
    }

    fn redirect(&self, path: &str) {
        self.history.lock().push(path.to_string());
    }
}
