//! CLI output formatting: consistent, styled messages and progress reporting
//! for long-running scan passes.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

pub struct Output {
    debug: bool,
}

impl Output {
    pub fn new(debug: bool) -> Self {
        Self { debug }
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", style("✔").green(), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✖").red(), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", style("⚠").yellow(), message);
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", style("ℹ").blue(), message);
    }

    pub fn debug(&self, message: &str) {
        if self.debug {
            println!("{} {}", style("🐛").dim(), style(message).dim());
        }
    }

    /// Create a progress bar for a bounded scan pass.
    pub fn progress_bar(&self, len: u64, message: &str) -> ProgressBar {
        let pb = ProgressBar::new(len);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        pb.set_message(message.to_string());
        pb
    }
}
