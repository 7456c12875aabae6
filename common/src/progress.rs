//! Human readable progress of a synchronization run
//!
//! The reporter never decides anything: the transfer engine hands it a [`Status`]
//! snapshot at each decision point and the reporter only renders it, either as plain
//! text lines on stdout or as a progress bar on stderr.

use std::io::IsTerminal;

const MIB: f64 = (1024 * 1024) as f64;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ProgressType {
    /// Progress bar when stderr is a terminal, text updates otherwise
    #[default]
    #[value(alias = "Auto")]
    Auto,
    /// Animated progress bar
    #[value(name = "ProgressBar", alias = "progress-bar")]
    ProgressBar,
    /// One status line per update, appropriate for logging
    #[value(name = "TextUpdates", alias = "text-updates")]
    TextUpdates,
}

/// Snapshot of how far a run has progressed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Status {
    pub files_done: usize,
    pub total_files: usize,
    pub bytes_done: u64,
    pub total_bytes: u64,
}

/// Percentage of `done` in `total`; nothing left to do counts as complete.
fn percent(done: f64, total: f64) -> f64 {
    if total > 0.0 {
        done / total * 100.0
    } else {
        100.0
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let done_mib = self.bytes_done as f64 / MIB;
        let total_mib = self.total_bytes as f64 / MIB;
        write!(
            f,
            "Progress: {}/{} ({:.1}%) files, {:.1}/{:.1} ({:.1}%) MiB.",
            self.files_done,
            self.total_files,
            percent(self.files_done as f64, self.total_files as f64),
            done_mib,
            total_mib,
            percent(done_mib, total_mib),
        )
    }
}

enum Sink {
    Hidden,
    Text,
    Bar(indicatif::ProgressBar),
}

pub struct ProgressReporter {
    sink: Sink,
}

impl ProgressReporter {
    pub fn new(progress_type: ProgressType, quiet: bool, total_bytes: u64) -> Self {
        if quiet {
            return Self::hidden();
        }
        let use_bar = match progress_type {
            ProgressType::Auto => std::io::stderr().is_terminal(),
            ProgressType::ProgressBar => true,
            ProgressType::TextUpdates => false,
        };
        if !use_bar {
            return Self { sink: Sink::Text };
        }
        let bar = indicatif::ProgressBar::new(total_bytes);
        let style = indicatif::ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} {msg}",
        )
        .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar());
        bar.set_style(style);
        Self {
            sink: Sink::Bar(bar),
        }
    }

    /// Reporter that emits nothing.
    pub fn hidden() -> Self {
        Self { sink: Sink::Hidden }
    }

    fn line(&self, message: &str) {
        match &self.sink {
            Sink::Hidden => {}
            Sink::Text => println!("{message}"),
            Sink::Bar(bar) if bar.is_finished() => println!("{message}"),
            Sink::Bar(bar) => bar.println(message),
        }
    }

    /// Sets the amount of data the run is going to move, once it is known.
    pub fn set_total_bytes(&self, total_bytes: u64) {
        if let Sink::Bar(bar) = &self.sink {
            bar.set_length(total_bytes);
        }
    }

    fn update_bar(&self, status: &Status) {
        if let Sink::Bar(bar) = &self.sink {
            bar.set_position(status.bytes_done);
            bar.set_message(format!("{}/{} files", status.files_done, status.total_files));
        }
    }

    /// Free-form message, e.g. the start and finish banners.
    pub fn message(&self, message: &str) {
        self.line(message);
    }

    pub fn file_verified(&self, status: &Status, display_name: &str) {
        self.line(&format!("OK {display_name}"));
        self.update_bar(status);
    }

    pub fn copy_attempt(&self, status: &Status, display_name: &str, size: u64, try_count: u32) {
        if let Sink::Text = self.sink {
            self.line(&status.to_string());
        }
        self.line(&format!(
            "Transferring \"{}\" ({:.1} MiB, try {})...",
            display_name,
            size as f64 / MIB,
            try_count
        ));
        self.update_bar(status);
    }

    pub fn copy_failed(&self, display_name: &str, reason: &dyn std::fmt::Display) {
        self.line(&format!("Failed to transfer \"{display_name}\": {reason}"));
    }

    pub fn finish(&self) {
        if let Sink::Bar(bar) = &self.sink {
            bar.finish_and_clear();
        }
    }
}
