//! Running the two analyzers against a snapshot.
//!
//! PHP_CodeSniffer always runs before PHP Mess Detector. Each can be
//! switched off on its own. The first analyzer to exit non-zero ends the
//! inspection, and later analyzers are not started.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::config::Config;
use crate::error::GateError;

/// The external analyzers, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    /// PHP_CodeSniffer (`phpcs`)
    CodeSniffer,
    /// PHP Mess Detector (`phpmd`)
    MessDetector,
}

impl Tool {
    /// Run order.
    pub const ALL: [Tool; 2] = [Tool::CodeSniffer, Tool::MessDetector];

    /// Short label used in status lines.
    pub fn label(&self) -> &'static str {
        match self {
            Tool::CodeSniffer => "PHPCS",
            Tool::MessDetector => "PHPMD",
        }
    }

    pub fn is_active(&self, config: &Config) -> bool {
        match self {
            Tool::CodeSniffer => config.phpcs.active,
            Tool::MessDetector => config.phpmd.active,
        }
    }

    pub fn binary<'a>(&self, config: &'a Config) -> &'a Path {
        match self {
            Tool::CodeSniffer => &config.phpcs.bin,
            Tool::MessDetector => &config.phpmd.bin,
        }
    }

    /// Builds the argument list for inspecting `files`.
    ///
    /// Options left empty in the configuration are omitted entirely.
    pub fn args(&self, config: &Config, files: &[PathBuf]) -> Vec<OsString> {
        match self {
            Tool::CodeSniffer => {
                let cs = &config.phpcs;
                let mut args: Vec<OsString> = vec!["-s".into()];
                if cs.ignore_warnings {
                    args.push("-n".into());
                }
                push_prefixed(&mut args, "--standard=", &cs.coding_standard);
                push_prefixed(&mut args, "--sniffs=", &cs.sniffs);
                push_prefixed(&mut args, "--encoding=", &cs.encoding);
                push_prefixed(&mut args, "--ignore=", &cs.ignore);
                args.extend(files.iter().map(|f| f.as_os_str().to_os_string()));
                args
            }
            Tool::MessDetector => {
                let md = &config.phpmd;
                // phpmd takes all inputs as a single comma-separated argument.
                let mut inputs = OsString::new();
                for (i, file) in files.iter().enumerate() {
                    if i > 0 {
                        inputs.push(",");
                    }
                    inputs.push(file.as_os_str());
                }

                let mut args = vec![inputs];
                for positional in [&md.output, &md.patterns_list] {
                    if !positional.is_empty() {
                        args.push(positional.into());
                    }
                }
                push_pair(&mut args, "--suffixes", &md.suffixes);
                push_pair(&mut args, "--exclude", &md.exclude);
                args
            }
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

fn push_prefixed(args: &mut Vec<OsString>, flag: &str, value: &str) {
    if !value.is_empty() {
        args.push(format!("{flag}{value}").into());
    }
}

fn push_pair(args: &mut Vec<OsString>, flag: &str, value: &str) {
    if !value.is_empty() {
        args.push(flag.into());
        args.push(value.into());
    }
}

/// Exit code and combined output of one analyzer run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub code: i32,
    /// stdout followed by stderr.
    pub output: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Executes an analyzer and waits for it to finish.
pub trait ToolRunner {
    fn run(&self, program: &Path, args: &[OsString]) -> Result<ToolOutput, GateError>;
}

/// Spawns analyzers as blocking child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
    fn run(&self, program: &Path, args: &[OsString]) -> Result<ToolOutput, GateError> {
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| GateError::Spawn {
                program: program.to_path_buf(),
                source,
            })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        // Killed by a signal: no code to forward, report a plain failure.
        let code = output.status.code().unwrap_or(1);
        Ok(ToolOutput {
            code,
            output: combined,
        })
    }
}

/// Result of one analyzer stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageStatus {
    /// Disabled in the configuration.
    Off,
    Passed,
    Failed(ToolOutput),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub tool: Tool,
    pub status: StageStatus,
}

/// Runs the active analyzers over `files` in [`Tool::ALL`] order.
///
/// The returned reports are in run order. If one analyzer fails, its report
/// is the last one, and analyzers after it are neither run nor reported.
///
/// # Errors
///
/// Returns [`GateError::Spawn`] if an analyzer cannot be started.
pub fn run_inspection(
    config: &Config,
    files: &[PathBuf],
    runner: &dyn ToolRunner,
) -> Result<Vec<StageReport>, GateError> {
    let mut reports = Vec::with_capacity(Tool::ALL.len());

    for tool in Tool::ALL {
        if !tool.is_active(config) {
            debug!(%tool, "analyzer disabled");
            reports.push(StageReport {
                tool,
                status: StageStatus::Off,
            });
            continue;
        }

        let program = tool.binary(config);
        let args = tool.args(config, files);
        debug!(%tool, program = %program.display(), args = %display_args(&args), "running analyzer");

        let result = runner.run(program, &args)?;
        debug!(%tool, code = result.code, "analyzer finished");

        if result.success() {
            reports.push(StageReport {
                tool,
                status: StageStatus::Passed,
            });
        } else {
            reports.push(StageReport {
                tool,
                status: StageStatus::Failed(result),
            });
            break;
        }
    }

    Ok(reports)
}

/// Renders an argument list for logs and error messages.
pub fn display_args(args: &[OsString]) -> String {
    args.iter()
        .map(|a| a.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::ffi::OsStr;

    fn lossy(arg: &OsStr) -> String {
        arg.to_string_lossy().into_owned()
    }

    /// Records invocations and replies with canned exit codes per program.
    struct FakeRunner {
        codes: Vec<(PathBuf, i32)>,
        calls: RefCell<Vec<(PathBuf, Vec<String>)>>,
    }

    impl FakeRunner {
        fn new(phpcs_code: i32, phpmd_code: i32) -> Self {
            Self {
                codes: vec![
                    (PathBuf::from("/usr/bin/phpcs"), phpcs_code),
                    (PathBuf::from("/usr/bin/phpmd"), phpmd_code),
                ],
                calls: RefCell::new(Vec::new()),
            }
        }

        fn called(&self) -> Vec<PathBuf> {
            self.calls.borrow().iter().map(|(p, _)| p.clone()).collect()
        }
    }

    impl ToolRunner for FakeRunner {
        fn run(&self, program: &Path, args: &[OsString]) -> Result<ToolOutput, GateError> {
            self.calls.borrow_mut().push((
                program.to_path_buf(),
                args.iter().map(|a| lossy(a)).collect(),
            ));
            let code = self
                .codes
                .iter()
                .find(|(p, _)| p == program)
                .map(|(_, c)| *c)
                .unwrap_or(127);
            Ok(ToolOutput {
                code,
                output: format!("{} says {code}", program.display()),
            })
        }
    }

    fn files() -> Vec<PathBuf> {
        vec![
            PathBuf::from("/stage/a.php"),
            PathBuf::from("/stage/src/B.php"),
        ]
    }

    fn arg_strings(tool: Tool, config: &Config) -> Vec<String> {
        tool.args(config, &files()).iter().map(|a| lossy(a)).collect()
    }

    #[test]
    fn phpcs_default_args() {
        insta::assert_debug_snapshot!(arg_strings(Tool::CodeSniffer, &Config::default()), @r#"
        [
            "-s",
            "-n",
            "--standard=PEAR",
            "--encoding=utf-8",
            "/stage/a.php",
            "/stage/src/B.php",
        ]
        "#);
    }

    #[test]
    fn phpcs_all_options_set() {
        let config = Config::from_source(
            "PHPCS_IGNORE_WARNINGS=0\n\
             PHPCS_CODING_STANDARD=PSR12\n\
             PHPCS_SNIFFS=Generic.PHP.DisallowShortOpenTag\n\
             PHPCS_ENCODING=latin1\n\
             PHPCS_IGNORE=*/tests/*\n",
        )
        .unwrap();
        insta::assert_debug_snapshot!(arg_strings(Tool::CodeSniffer, &config), @r#"
        [
            "-s",
            "--standard=PSR12",
            "--sniffs=Generic.PHP.DisallowShortOpenTag",
            "--encoding=latin1",
            "--ignore=*/tests/*",
            "/stage/a.php",
            "/stage/src/B.php",
        ]
        "#);
    }

    #[test]
    fn phpcs_empty_options_are_omitted() {
        let config = Config::from_source(
            "PHPCS_IGNORE_WARNINGS=\nPHPCS_CODING_STANDARD=\nPHPCS_ENCODING=\n",
        )
        .unwrap();
        assert_eq!(
            arg_strings(Tool::CodeSniffer, &config),
            vec!["-s", "/stage/a.php", "/stage/src/B.php"]
        );
    }

    #[test]
    fn phpmd_default_args() {
        insta::assert_debug_snapshot!(arg_strings(Tool::MessDetector, &Config::default()), @r#"
        [
            "/stage/a.php,/stage/src/B.php",
            "text",
            "cleancode,codesize,controversial,design,naming,unusedcode",
        ]
        "#);
    }

    #[test]
    fn phpmd_suffixes_and_exclude() {
        let config = Config::from_source(
            "PHPMD_OUTPUT=xml\nPHPMD_PATTERNS_LIST=codesize\nPHPMD_SUFFIXES=php,phtml\nPHPMD_EXCLUDE=vendor\n",
        )
        .unwrap();
        insta::assert_debug_snapshot!(arg_strings(Tool::MessDetector, &config), @r#"
        [
            "/stage/a.php,/stage/src/B.php",
            "xml",
            "codesize",
            "--suffixes",
            "php,phtml",
            "--exclude",
            "vendor",
        ]
        "#);
    }

    #[test]
    fn values_with_spaces_stay_single_arguments() {
        let config = Config::from_source("PHPCS_IGNORE=\"my dir/*\"\n").unwrap();
        let args = arg_strings(Tool::CodeSniffer, &config);
        assert!(args.contains(&"--ignore=my dir/*".to_string()));
    }

    #[test]
    fn both_pass() {
        let runner = FakeRunner::new(0, 0);
        let reports = run_inspection(&Config::default(), &files(), &runner).unwrap();

        assert_eq!(
            reports,
            vec![
                StageReport { tool: Tool::CodeSniffer, status: StageStatus::Passed },
                StageReport { tool: Tool::MessDetector, status: StageStatus::Passed },
            ]
        );
        assert_eq!(
            runner.called(),
            vec![PathBuf::from("/usr/bin/phpcs"), PathBuf::from("/usr/bin/phpmd")]
        );
    }

    #[test]
    fn first_failure_stops_inspection() {
        let runner = FakeRunner::new(2, 0);
        let reports = run_inspection(&Config::default(), &files(), &runner).unwrap();

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].tool, Tool::CodeSniffer);
        match &reports[0].status {
            StageStatus::Failed(out) => {
                assert_eq!(out.code, 2);
                assert!(out.output.contains("phpcs says 2"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(runner.called(), vec![PathBuf::from("/usr/bin/phpcs")]);
    }

    #[test]
    fn disabled_first_then_failing_second() {
        let config = Config::from_source("PHPCS_ACTIVE=0\n").unwrap();
        let runner = FakeRunner::new(0, 3);
        let reports = run_inspection(&config, &files(), &runner).unwrap();

        assert_eq!(reports[0].status, StageStatus::Off);
        assert_eq!(reports[1].tool, Tool::MessDetector);
        assert!(matches!(&reports[1].status, StageStatus::Failed(o) if o.code == 3));
        assert_eq!(runner.called(), vec![PathBuf::from("/usr/bin/phpmd")]);
    }

    #[test]
    fn both_disabled_runs_nothing() {
        let config = Config::from_source("PHPCS_ACTIVE=0\nPHPMD_ACTIVE=0\n").unwrap();
        let runner = FakeRunner::new(1, 1);
        let reports = run_inspection(&config, &files(), &runner).unwrap();

        assert!(reports.iter().all(|r| r.status == StageStatus::Off));
        assert_eq!(reports.len(), 2);
        assert!(runner.called().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn process_runner_captures_output_and_code() {
        let args: Vec<OsString> = vec!["-c".into(), "echo out; echo err >&2; exit 5".into()];
        let result = ProcessRunner.run(Path::new("/bin/sh"), &args).unwrap();
        assert_eq!(result.code, 5);
        assert_eq!(result.output, "out\nerr\n");
    }

    #[test]
    fn process_runner_reports_spawn_failure() {
        let result = ProcessRunner.run(Path::new("/definitely/not/a/tool"), &[]);
        assert!(matches!(result, Err(GateError::Spawn { .. })));
    }

    #[test]
    fn display_args_joins_with_spaces() {
        let args: Vec<OsString> = vec!["-s".into(), "a.php".into()];
        assert_eq!(display_args(&args), "-s a.php");
    }
}
