// AI
//! 📊 progress.rs — "Are we there yet?" — every scan, every time, forever.
//!
//! 🚀 A spinner while partitions fly by, and a comfy table once they've landed.
//! We don't know the total row count up front (a listing tells you keys, not rows),
//! so there is no percent bar here. Just a spinner and honest counters.
//!
//! ⚠️  Warning: Watching this spinner will not make it go faster. Science says no.
//!
//! 🦆 The duck has nothing to do with this module. It's just vibing.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use comfy_table::{Cell, CellAlignment, Table, presets::UTF8_FULL_CONDENSED};
use indicatif::{ProgressBar, ProgressStyle};

use crate::supervisors::ScanSummary;

/// 🔢 Formats a number with commas for the 3 people in the audience who like readability.
/// "1000000 rows" → "1,000,000 rows" — you're welcome, eyes.
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

/// ⏱️ Formats a Duration into MM:SS or HH:MM:SS.
/// If it shows HH:MM:SS, you should probably call your mom. It's been a while.
fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// 📊 Live counters behind the spinner. Clone it into every worker; the clones share state.
#[derive(Clone)]
pub struct ScanProgress {
    source_name: Arc<str>,
    progress_bar: ProgressBar,
    loaders_done: Arc<AtomicU64>,
    partitions: Arc<AtomicU64>,
    rows: Arc<AtomicU64>,
    start_time: Instant,
}

impl std::fmt::Debug for ScanProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // -- 🎭 ProgressBar is a diva and doesn't derive Debug
        f.debug_struct("ScanProgress")
            .field("source_name", &self.source_name)
            .field("loaders_done", &self.loaders_done.load(Ordering::Relaxed))
            .field("partitions", &self.partitions.load(Ordering::Relaxed))
            .field("rows", &self.rows.load(Ordering::Relaxed))
            .finish()
    }
}

impl ScanProgress {
    /// 🚀 A spinner on stderr, labelled with whatever we're scanning.
    pub fn new(source_name: impl Into<String>) -> Self {
        let progress_bar = ProgressBar::new_spinner();
        progress_bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        progress_bar.enable_steady_tick(Duration::from_millis(120));
        Self::with_bar(source_name.into(), progress_bar)
    }

    /// 🙈 Same counters, nothing drawn. For tests and non-interactive runs.
    pub fn hidden(source_name: impl Into<String>) -> Self {
        Self::with_bar(source_name.into(), ProgressBar::hidden())
    }

    fn with_bar(source_name: String, progress_bar: ProgressBar) -> Self {
        Self {
            source_name: source_name.into(),
            progress_bar,
            loaders_done: Arc::new(AtomicU64::new(0)),
            partitions: Arc::new(AtomicU64::new(0)),
            rows: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    /// 🧱 One partition drained, `rows` rows in it.
    pub fn record_partition(&self, rows: u64) {
        self.partitions.fetch_add(1, Ordering::Relaxed);
        self.rows.fetch_add(rows, Ordering::Relaxed);
        self.refresh();
    }

    /// ✅ One loader fully drained.
    pub fn record_loader(&self) {
        self.loaders_done.fetch_add(1, Ordering::Relaxed);
        self.refresh();
    }

    pub fn rows(&self) -> u64 {
        self.rows.load(Ordering::Relaxed)
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// ✅ Stop the spinner, leave the last message on screen.
    pub fn finish(&self) {
        self.progress_bar.finish();
    }

    fn refresh(&self) {
        self.progress_bar.set_message(format!(
            "{}: {} loaders, {} partitions, {} rows",
            self.source_name,
            format_number(self.loaders_done.load(Ordering::Relaxed)),
            format_number(self.partitions.load(Ordering::Relaxed)),
            format_number(self.rows.load(Ordering::Relaxed)),
        ));
    }
}

/// 🍽️ The post-scan table: one line per loader, then the totals.
pub fn render_summary(summary: &ScanSummary, elapsed: Duration) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["loader", "objects", "partitions", "rows"]);

    let right = |value: u64| Cell::new(format_number(value)).set_alignment(CellAlignment::Right);

    for report in &summary.reports {
        table.add_row(vec![
            Cell::new(&report.label),
            right(report.objects as u64),
            right(report.partitions as u64),
            right(report.rows as u64),
        ]);
    }
    table.add_row(vec![
        Cell::new(format!(
            "total: {} loaders in {}",
            summary.loaders,
            format_duration(elapsed)
        )),
        right(summary.objects() as u64),
        right(summary.partitions as u64),
        right(summary.rows as u64),
    ]);

    table.to_string()
}
