// Progress module - coarse textual progress for long-running phases
//
// A reporter is owned by exactly one task; nothing here is shared between
// threads.

use std::io::{self, Stderr, Write};

/// Writes a `\r`-overwritten progress line every `stride` steps
pub struct ProgressReporter<W: Write = Stderr> {
    label: &'static str,
    total: usize,
    stride: usize,
    sink: W,
    reports: usize,
}

impl ProgressReporter<Stderr> {
    /// Reporter writing to the diagnostic stream
    pub fn stderr(label: &'static str, total: usize, stride: usize) -> Self {
        Self::with_sink(label, total, stride, io::stderr())
    }
}

impl<W: Write> ProgressReporter<W> {
    pub fn with_sink(label: &'static str, total: usize, stride: usize, sink: W) -> Self {
        Self {
            label,
            total,
            stride: stride.max(1),
            sink,
            reports: 0,
        }
    }

    /// Record that step `index` is being processed
    pub fn tick(&mut self, index: usize) {
        if index % self.stride != 0 {
            return;
        }
        let percent = index as f64 / self.total.saturating_sub(1).max(1) as f64 * 100.0;
        // Observational only; a closed stderr must not stop the run.
        let _ = write!(
            self.sink,
            "\r{}: {}/{} ({:.1}% complete)     ",
            self.label, index, self.total, percent
        );
        let _ = self.sink.flush();
        self.reports += 1;
    }

    /// Terminate the progress line
    pub fn finish(&mut self) {
        let _ = writeln!(self.sink);
        let _ = self.sink.flush();
    }

    /// Number of progress lines written so far
    pub fn reports(&self) -> usize {
        self.reports
    }

    pub fn into_sink(self) -> W {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_at_fixed_stride() {
        let mut reporter = ProgressReporter::with_sink("transform", 20, 5, Vec::new());
        for index in 0..20 {
            reporter.tick(index);
        }
        reporter.finish();
        assert_eq!(reporter.reports(), 4);

        let text = String::from_utf8(reporter.into_sink()).unwrap();
        assert!(text.contains("transform: 0/20 (0.0% complete)"));
        assert!(text.contains("transform: 15/20"));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_zero_stride_treated_as_every_step() {
        let mut reporter = ProgressReporter::with_sink("synthesis", 1, 0, Vec::new());
        reporter.tick(0);
        assert_eq!(reporter.reports(), 1);
    }
}
