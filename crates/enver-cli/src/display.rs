//! Console output shared by concurrent executions
//!
//! Every user-facing line goes through [`Console`], which holds one lock so
//! lines from concurrently running executions never interleave.

use console::style;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

#[derive(Default)]
pub struct Console {
    lock: Mutex<()>,
}

impl Console {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the output lock
    pub fn exclusive<T>(&self, f: impl FnOnce() -> T) -> T {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    pub fn executing(&self, name: &str) {
        self.exclusive(|| println!("{} Executing: {}", style("→").blue(), name));
    }

    /// Report a written env file, tagged with the execution name when given
    pub fn wrote(&self, execution: Option<&str>, count: usize, path: &Path) {
        self.exclusive(|| match execution {
            Some(name) => println!(
                "  [{}] Wrote {} environment variables to {}",
                name,
                count,
                path.display()
            ),
            None => println!(
                "{} Wrote {} environment variables to {}",
                style("✓").green().bold(),
                count,
                path.display()
            ),
        });
    }

    /// Print a warning without taking the lock; call inside [`Console::exclusive`]
    pub fn warn_locked(&self, message: &str) {
        println!("{} {}", style("⚠").yellow(), message);
    }

    /// Print a success line without taking the lock
    pub fn success_locked(&self, message: &str) {
        println!("{} {}", style("✓").green(), message);
    }
}
