use indicatif::{ProgressBar, ProgressStyle};
use std::fmt::Display;
use std::sync::Mutex;
use std::time::Duration;

const MAX_PROGRESS_WIDTH: usize = 80;

/// Receives short, frequently replaced status messages.
pub trait ProgressSink {
    fn progress(&self, message: &str);
}

/// Terminal output: permanent report lines on stdout plus one volatile
/// spinner line for progress.
pub struct Console {
    spinner: ProgressBar,
    last_progress: Mutex<String>,
}

impl Console {
    pub fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner} {msg}")
                .unwrap(),
        );
        spinner.enable_steady_tick(Duration::from_millis(120));
        Self::with_spinner(spinner)
    }

    /// Console without a visible progress line.
    #[cfg(test)]
    pub fn hidden() -> Self {
        Self::with_spinner(ProgressBar::hidden())
    }

    fn with_spinner(spinner: ProgressBar) -> Self {
        Self {
            spinner,
            last_progress: Mutex::new(String::new()),
        }
    }

    /// Print a permanent line, clearing the progress line first.
    pub fn println(&self, message: impl Display) {
        self.spinner.suspend(|| println!("{message}"));
        self.spinner.set_message("");
        if let Ok(mut last) = self.last_progress.lock() {
            last.clear();
        }
    }

    /// Handle used to wipe the progress line from a signal handler.
    pub fn progress_handle(&self) -> ProgressBar {
        self.spinner.clone()
    }

    /// Acquire the console for the rest of the scope; the progress line is
    /// cleared when the guard drops.
    pub fn guard(&self) -> ConsoleGuard<'_> {
        ConsoleGuard { console: self }
    }

    fn clear(&self) {
        self.spinner.finish_and_clear();
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for Console {
    fn progress(&self, message: &str) {
        let message = truncate_progress(message);
        let Ok(mut last) = self.last_progress.lock() else {
            return;
        };
        if *last != message {
            self.spinner.set_message(message.clone());
            *last = message;
        }
    }
}

pub struct ConsoleGuard<'a> {
    console: &'a Console,
}

impl Drop for ConsoleGuard<'_> {
    fn drop(&mut self) {
        self.console.clear();
    }
}

fn truncate_progress(message: &str) -> String {
    if message.chars().count() <= MAX_PROGRESS_WIDTH {
        return message.to_string();
    }
    let mut truncated: String = message.chars().take(MAX_PROGRESS_WIDTH - 3).collect();
    truncated.push_str("...");
    truncated
}
