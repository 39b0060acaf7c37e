use colored::*;
use phpgate_core::inspect::{StageReport, StageStatus};

/// Output mode for the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Quiet,
}

/// Reporter handles all terminal output.
pub struct Reporter {
    mode: OutputMode,
}

impl Reporter {
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }

    pub fn error(&mut self, message: &str) {
        eprintln!("{} {}", "ERROR:".red(), message);
    }

    /// `<TOOL> off`
    pub fn off(&mut self, label: &str) {
        if self.mode == OutputMode::Human {
            println!("{}", format!("{label} off").yellow());
        }
    }

    /// `<TOOL> OK`
    pub fn ok(&mut self, label: &str) {
        if self.mode == OutputMode::Human {
            println!("{}", format!("{label} OK").green());
        }
    }

    /// Analyzer output is printed verbatim in every mode.
    pub fn issues(&mut self, label: &str, output: &str) {
        println!("{}", format!("{label} issues detected:").red().bold());
        print!("{output}");
        if !output.is_empty() && !output.ends_with('\n') {
            println!();
        }
    }

    pub fn report_stages(&mut self, stages: &[StageReport]) {
        for stage in stages {
            let label = stage.tool.label();
            match &stage.status {
                StageStatus::Off => self.off(label),
                StageStatus::Passed => self.ok(label),
                StageStatus::Failed(result) => self.issues(label, &result.output),
            }
        }
    }
}
