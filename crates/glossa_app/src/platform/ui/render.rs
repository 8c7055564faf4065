//! Terminal rendering of [`DashboardView`].
//!
//! [`Console`] remembers what it already printed, so each render only yields
//! the lines that changed: new log entries, a new status line, a new chart,
//! or a new preview.

use glossa_core::{Comparison, DashboardView, LogEntry};

const SPARK: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const CHART_WIDTH: usize = 40;

#[derive(Debug, Default)]
pub struct Console {
    printed_logs: usize,
    last_status: Option<String>,
    last_chart: Option<String>,
    last_comparison: Option<Comparison>,
}

impl Console {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, view: &DashboardView) -> Vec<String> {
        let mut lines = Vec::new();
        self.render_logs(view, &mut lines);

        if view.comparison != self.last_comparison {
            if let Some(comparison) = &view.comparison {
                lines.extend(preview_block(comparison));
            }
            self.last_comparison = view.comparison.clone();
        }

        if let Some(chart) = chart_line(view) {
            if self.last_chart.as_ref() != Some(&chart) {
                lines.push(chart.clone());
                self.last_chart = Some(chart);
            }
        }

        let status = status_line(view);
        if self.last_status.as_ref() != Some(&status) {
            lines.push(status.clone());
            self.last_status = Some(status);
        }
        lines
    }

    fn render_logs(&mut self, view: &DashboardView, lines: &mut Vec<String>) {
        if view.log_count < self.printed_logs {
            // A new run wiped the log.
            lines.push("---- new run ----".to_string());
            self.printed_logs = 0;
        }
        let fresh = view.log_count - self.printed_logs;
        let shown = fresh.min(view.log_tail.len());
        if fresh > shown {
            lines.push(format!("... {} earlier entries not shown", fresh - shown));
        }
        let start = view.log_tail.len() - shown;
        lines.extend(view.log_tail[start..].iter().map(log_line));
        self.printed_logs = view.log_count;
    }
}

pub fn log_line(entry: &LogEntry) -> String {
    format!(
        "{} [{:<5}] {}",
        short_time(&entry.timestamp),
        entry.severity.label(),
        entry.message
    )
}

/// `HH:MM:SS` out of an RFC 3339 stamp; anything else is shown unchanged.
fn short_time(timestamp: &str) -> &str {
    match timestamp.split_once('T') {
        Some((_, rest)) => rest.get(..8).unwrap_or(rest),
        None => timestamp,
    }
}

pub fn status_line(view: &DashboardView) -> String {
    let mut line = format!(
        "[{}] {}/{} ({:.1}%) | {} rpm | {} tpm | ok {:.1}% err {:.1}% | {}",
        view.status,
        view.completed,
        view.total,
        view.percent,
        format_rate(view.requests_per_minute),
        format_rate(view.tokens_per_minute),
        view.success_percent,
        view.error_percent,
        view.elapsed
    );
    if let Some(file) = &view.current_file {
        line.push_str(" | ");
        line.push_str(file);
    }
    if view.resuming {
        line.push_str(" | resuming");
    }
    line
}

fn format_rate(value: f64) -> String {
    if value >= 10_000.0 {
        format!("{:.1}k", value / 1000.0)
    } else {
        format!("{:.1}", value)
    }
}

pub fn chart_line(view: &DashboardView) -> Option<String> {
    if view.chart.is_empty() {
        return None;
    }
    let skip = view.chart.len().saturating_sub(CHART_WIDTH);
    let samples = &view.chart[skip..];
    let rpm: Vec<f64> = samples.iter().map(|sample| sample.rpm).collect();
    let tpm: Vec<f64> = samples.iter().map(|sample| sample.tpm).collect();
    Some(format!(
        "rpm {} peak {} | tpm {} peak {}",
        sparkline(&rpm),
        format_rate(peak(&rpm)),
        sparkline(&tpm),
        format_rate(peak(&tpm))
    ))
}

fn peak(values: &[f64]) -> f64 {
    values.iter().copied().fold(0.0, f64::max)
}

pub fn sparkline(values: &[f64]) -> String {
    let max = peak(values);
    values
        .iter()
        .map(|&value| {
            if max <= 0.0 || !value.is_finite() || value <= 0.0 {
                return SPARK[0];
            }
            let level = (value / max * (SPARK.len() - 1) as f64).round() as usize;
            SPARK[level.min(SPARK.len() - 1)]
        })
        .collect()
}

fn preview_block(comparison: &Comparison) -> Vec<String> {
    let mut lines = vec!["---- preview ----".to_string()];
    lines.extend(comparison.source.lines().map(|line| format!("  > {line}")));
    lines.extend(comparison.translation.lines().map(|line| format!("  < {line}")));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use glossa_core::{ChartSample, JobStatus, LogId, Severity};

    fn entry(id: u64, message: &str) -> LogEntry {
        LogEntry {
            id: LogId::Remote(id),
            timestamp: "2024-05-01T10:15:30Z".to_string(),
            message: message.to_string(),
            severity: Severity::Info,
        }
    }

    fn view_with_logs(messages: &[&str]) -> DashboardView {
        let log_tail: Vec<LogEntry> = messages
            .iter()
            .enumerate()
            .map(|(idx, message)| entry(idx as u64, message))
            .collect();
        DashboardView {
            status: JobStatus::Running,
            log_count: log_tail.len(),
            log_tail,
            elapsed: "00:00:05".to_string(),
            ..DashboardView::default()
        }
    }

    #[test]
    fn only_new_log_entries_are_printed() {
        let mut console = Console::new();
        let first = console.render(&view_with_logs(&["a", "b"]));
        assert_eq!(first[0], "10:15:30 [INFO ] a");
        assert_eq!(first[1], "10:15:30 [INFO ] b");

        let second = console.render(&view_with_logs(&["a", "b", "c"]));
        assert_eq!(second, vec!["10:15:30 [INFO ] c".to_string()]);
    }

    #[test]
    fn cleared_log_starts_over() {
        let mut console = Console::new();
        console.render(&view_with_logs(&["a", "b", "c"]));
        let lines = console.render(&view_with_logs(&["fresh"]));
        assert_eq!(lines[0], "---- new run ----");
        assert_eq!(lines[1], "10:15:30 [INFO ] fresh");
    }

    #[test]
    fn entries_beyond_the_tail_are_summarized() {
        let mut view = view_with_logs(&["x", "y"]);
        view.log_count = 5;
        let lines = Console::new().render(&view);
        assert_eq!(lines[0], "... 3 earlier entries not shown");
        assert_eq!(lines[1], "10:15:30 [INFO ] x");
    }

    #[test]
    fn unchanged_status_is_not_repeated() {
        let mut console = Console::new();
        let view = DashboardView {
            status: JobStatus::Running,
            completed: 40,
            total: 120,
            percent: 100.0 / 3.0,
            requests_per_minute: 18.5,
            tokens_per_minute: 52_000.0,
            success_percent: 90.0,
            error_percent: 10.0,
            elapsed: "00:01:01".to_string(),
            current_file: Some("chapter2.txt".to_string()),
            ..DashboardView::default()
        };
        assert_eq!(
            console.render(&view),
            vec![
                "[running] 40/120 (33.3%) | 18.5 rpm | 52.0k tpm | ok 90.0% err 10.0% | 00:01:01 | chapter2.txt"
                    .to_string()
            ]
        );
        assert!(console.render(&view).is_empty());
    }

    #[test]
    fn preview_printed_when_comparison_changes() {
        let mut console = Console::new();
        let mut view = view_with_logs(&[]);
        view.comparison = Some(Comparison {
            source: "Hallo".to_string(),
            translation: "Hello".to_string(),
        });
        let lines = console.render(&view);
        assert_eq!(&lines[..3], ["---- preview ----", "  > Hallo", "  < Hello"]);

        let again = console.render(&view);
        assert!(!again.iter().any(|line| line.contains("preview")));
    }

    #[test]
    fn sparkline_scales_to_the_peak() {
        assert_eq!(sparkline(&[0.0, 5.0, 10.0]), "▁▅█");
        assert_eq!(sparkline(&[0.0, 0.0]), "▁▁");
        assert_eq!(sparkline(&[]), "");

        let view = DashboardView {
            chart: vec![
                ChartSample {
                    time: "1".to_string(),
                    rpm: 2.0,
                    tpm: 100.0,
                },
                ChartSample {
                    time: "2".to_string(),
                    rpm: 4.0,
                    tpm: 50.0,
                },
            ],
            ..DashboardView::default()
        };
        assert_eq!(
            chart_line(&view).as_deref(),
            Some("rpm ▅█ peak 4.0 | tpm █▅ peak 100.0")
        );
    }
}
