//! Download progress display. Every download owns one line of a shared
//! `MultiProgress`, so concurrent transfers never overwrite each other.

use indicatif::{DecimalBytes, MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, Read};

/// Maximum redraws per second across all lines.
const REDRAW_HZ: u8 = 10;

// SI units (1 kB = 1000 B) throughout.
const SPINNER_TEMPLATE: &str = "{spinner:.green} {msg} {decimal_bytes} completed";
const BAR_TEMPLATE: &str = "{spinner:.green} {msg} [{bar:30.cyan/blue}] \
     {decimal_bytes}/{decimal_total_bytes} ({decimal_bytes_per_sec})";
const FINISHED_TEMPLATE: &str = "{msg}";

#[derive(Clone)]
pub struct ProgressDisplay {
    multi: MultiProgress,
}

impl Default for ProgressDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressDisplay {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::with_draw_target(ProgressDrawTarget::stdout_with_hz(REDRAW_HZ)),
        }
    }

    /// A display that draws nothing; messages still reach stdout.
    pub fn hidden() -> Self {
        Self {
            multi: MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
        }
    }

    /// Adds a new line for a download labelled `label`.
    pub fn counter(&self, label: &str) -> ProgressCounter {
        let bar = self.multi.add(ProgressBar::new_spinner());
        ProgressCounter::with_bar(label, bar)
    }

    /// Prints a message above the progress lines.
    pub fn println(&self, message: &str) {
        if self.multi.is_hidden() {
            println!("{message}");
        } else if self.multi.println(message).is_err() {
            println!("{message}");
        }
    }
}

/// Running byte count for one download.
pub struct ProgressCounter {
    total: u64,
    label: String,
    bar: ProgressBar,
}

impl ProgressCounter {
    /// A counter that is not attached to any display.
    pub fn detached(label: &str) -> Self {
        Self::with_bar(label, ProgressBar::hidden())
    }

    fn with_bar(label: &str, bar: ProgressBar) -> Self {
        bar.set_style(
            ProgressStyle::with_template(SPINNER_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(label.to_string());
        Self {
            total: 0,
            label: label.to_string(),
            bar,
        }
    }

    /// Switches the line to a bounded bar once the size is known.
    pub fn set_length(&self, length: u64) {
        self.bar.set_style(
            ProgressStyle::with_template(BAR_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("━╸─"),
        );
        self.bar.set_length(length);
    }

    pub fn record(&mut self, bytes: usize) {
        self.total += bytes as u64;
        self.bar.set_position(self.total);
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn status_line(&self) -> String {
        format!("{} {} completed", self.label, DecimalBytes(self.total))
    }

    /// Replaces the line with its final status line.
    pub fn finish(&self) {
        self.bar.set_style(
            ProgressStyle::with_template(FINISHED_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        self.bar.finish_with_message(self.status_line());
    }

    pub fn abandon(&self) {
        self.bar.abandon();
    }
}

/// Reader adapter that counts every byte passing through it.
pub struct ProgressReader<'a, R> {
    inner: R,
    counter: &'a mut ProgressCounter,
}

impl<'a, R: Read> ProgressReader<'a, R> {
    pub fn new(inner: R, counter: &'a mut ProgressCounter) -> Self {
        Self { inner, counter }
    }
}

impl<R: Read> Read for ProgressReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.counter.record(n);
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_counter_accumulates() {
        let mut counter = ProgressCounter::detached("Download basic:");
        counter.record(100);
        counter.record(412);
        assert_eq!(counter.total(), 512);
    }

    #[test]
    fn test_status_line() {
        let mut counter = ProgressCounter::detached("Download sdk:");
        counter.record(512);
        assert_eq!(counter.status_line(), "Download sdk: 512 B completed");

        counter.record(2000 - 512);
        assert_eq!(counter.status_line(), "Download sdk: 2.00 kB completed");

        counter.record(1_500_000);
        assert_eq!(counter.status_line(), "Download sdk: 1.50 MB completed");
    }

    #[test]
    fn test_finish_shows_status_line() {
        let mut counter = ProgressCounter::detached("Download basic:");
        counter.record(1000);
        counter.finish();

        assert!(counter.bar.is_finished());
        assert_eq!(counter.bar.message(), "Download basic: 1.00 kB completed");
    }

    #[test]
    fn test_reader_counts_bytes() {
        let data = vec![7u8; 10_000];
        let mut counter = ProgressCounter::detached("test");
        let mut out = Vec::new();

        {
            let mut reader = ProgressReader::new(Cursor::new(&data), &mut counter);
            io::copy(&mut reader, &mut out).unwrap();
        }

        assert_eq!(out, data);
        assert_eq!(counter.total(), 10_000);
    }

    #[test]
    fn test_display_lines_are_independent() {
        let display = ProgressDisplay::hidden();
        let mut basic = display.counter("basic");
        let mut sdk = display.counter("sdk");
        sdk.set_length(64);

        basic.record(10);
        sdk.record(32);
        basic.finish();
        sdk.finish();

        assert_eq!(basic.total(), 10);
        assert_eq!(sdk.total(), 32);
    }
}
