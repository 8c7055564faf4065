/// Answer of the breakpoint query: did a previous job stop half way?
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BreakpointStatus {
    pub can_resume: bool,
    pub has_incomplete: bool,
    pub project_name: Option<String>,
    pub total_lines: Option<u64>,
    pub completed_lines: Option<u64>,
    pub progress_percent: Option<f64>,
}

impl BreakpointStatus {
    pub fn offers_resume(&self) -> bool {
        self.has_incomplete && self.can_resume
    }

    /// Completion of the interrupted job. Falls back to the line counts when the
    /// service omits the percentage.
    pub fn percent(&self) -> f64 {
        if let Some(percent) = self.progress_percent {
            return percent.clamp(0.0, 100.0);
        }
        match (self.completed_lines, self.total_lines) {
            (Some(done), Some(total)) if total > 0 => {
                (done.min(total) as f64 / total as f64) * 100.0
            }
            _ => 0.0,
        }
    }

    pub fn notice(&self) -> String {
        let project = self.project_name.as_deref().unwrap_or("unnamed project");
        format!(
            "Found interrupted job \"{project}\" at {:.1}%; the next start will resume it",
            self.percent()
        )
    }
}
