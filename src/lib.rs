use error_set::error_set;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

pub mod changes;
pub mod filter;
pub mod parse;
pub mod report;

pub use changes::{ChangeSet, FileChanges};
pub use filter::filter_report;
pub use parse::{ReportParser, parse_report};
pub use report::{CoverageRecord, CoverageReport};

error_set! {
    /// Top-level error for a filter run
    FilterError := DiffCommandError || DiffParseError || ReportIoError || MalformedReport

    /// Errors from git command execution
    DiffCommandError := {
        #[display("Failed to run git diff: {message}")]
        DiffFailed { message: String },
        #[display("git diff failed: {stderr}")]
        DiffExitError { stderr: String },
        #[display("Invalid UTF-8 in git diff output: {message}")]
        InvalidUtf8 { message: String },
    }

    /// Errors from interpreting unified diff output
    DiffParseError := {
        /// A `@@` line that is not a valid hunk header
        #[display("Invalid hunk header '{header}'")]
        InvalidHunkHeader { header: String },
    }

    /// Errors reading the input report or writing the filtered one
    ReportIoError := {
        #[display("LCOV report not found at path: {path}")]
        ReportNotFound { path: String },
        #[display("Failed to read LCOV report {path}: {message}")]
        ReadFailed { path: String, message: String },
        #[display("Failed to write LCOV report {path}: {message}")]
        WriteFailed { path: String, message: String },
    }

    /// Errors from parsing LCOV text
    MalformedReport := {
        /// A numeric field could not be parsed
        #[display("Line {line}: invalid number '{value}' in {directive} record")]
        InvalidNumber { line: usize, directive: String, value: String },
        /// `DA` payload is missing its `,<hits>` part
        #[display("Line {line}: expected 'DA:<line>,<hits>', got '{text}'")]
        InvalidLineData { line: usize, text: String },
        /// A data directive appeared before any `SF:` line
        #[display("Line {line}: {directive} record outside of an SF record")]
        OutsideRecord { line: usize, directive: String },
    }
}

/// How changed lines are derived from `git diff`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineSource {
    /// `--numstat` added count `n`, treated as lines `1..=n`
    #[default]
    AddedCount,
    /// New-side line numbers from `-U0` hunk headers
    Hunks,
}

/// Inputs for a single filter run
#[derive(Debug, Clone)]
pub struct Config {
    /// Repository to run git in
    pub repo: PathBuf,
    /// Commit the working tree is compared against
    pub commit: String,
    /// Pathspec restricting the diff
    pub path: PathBuf,
    /// Input LCOV report
    pub report: PathBuf,
    /// Where the filtered LCOV report is written
    pub output: PathBuf,
    pub line_source: LineSource,
}

/// What a successful run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub output: PathBuf,
    pub changed_files: usize,
    pub report_records: usize,
    pub kept_records: usize,
}

/// Run the whole pipeline: diff, parse, filter, write.
///
/// Any failure aborts the run. A failure after the output file was created
/// may leave it partially written.
///
/// # Examples
/// ```no_run
/// # use git_lcov_filter::{Config, LineSource, run};
/// let summary = run(&Config {
///     repo: ".".into(),
///     commit: "HEAD~1".to_string(),
///     path: "src".into(),
///     report: "lcov.info".into(),
///     output: "lcov.filtered.info".into(),
///     line_source: LineSource::AddedCount,
/// })
/// .unwrap();
/// println!("{}", summary.output.display());
/// ```
pub fn run(config: &Config) -> Result<RunSummary, FilterError> {
    let changes = GitDiff::new(&config.repo).changes(
        &config.commit,
        &config.path,
        config.line_source,
    )?;
    debug!(files = changes.len(), "collected changed lines");

    let report = read_report(&config.report)?;
    debug!(records = report.len(), "parsed coverage report");

    let filtered = filter_report(&changes, &report);
    if filtered.is_empty() {
        warn!("no changed lines have coverage data");
    }

    write_report(&filtered, &config.output)?;
    info!(
        output = %config.output.display(),
        kept = filtered.len(),
        "wrote filtered report"
    );

    Ok(RunSummary {
        output: config.output.clone(),
        changed_files: changes.len(),
        report_records: report.len(),
        kept_records: filtered.len(),
    })
}

/// Runs `git diff` against a repository and turns its output into a [`ChangeSet`]
pub struct GitDiff<'a> {
    repo_path: &'a Path,
}

impl<'a> GitDiff<'a> {
    /// Create a new GitDiff for the given repository path
    pub fn new(repo_path: &'a Path) -> Self {
        Self { repo_path }
    }

    /// Changed lines between `commit` and the working tree, restricted to `path`
    pub fn changes(
        &self,
        commit: &str,
        path: &Path,
        source: LineSource,
    ) -> Result<ChangeSet, FilterError> {
        match source {
            LineSource::AddedCount => {
                let output = self.run_diff(&[commit, "--numstat"], path)?;
                Ok(changes::parse_numstat(&output))
            }
            LineSource::Hunks => {
                let output = self.run_diff(
                    &[
                        commit,
                        "--no-ext-diff",
                        "-U0",
                        "--no-color",
                        "--src-prefix=a/",
                        "--dst-prefix=b/",
                    ],
                    path,
                )?;
                Ok(changes::parse_unified(&output)?)
            }
        }
    }

    /// Run `git -C <repo> diff <args> -- <path>` and return its stdout
    fn run_diff(&self, args: &[&str], path: &Path) -> Result<String, DiffCommandError> {
        debug!(repo = %self.repo_path.display(), ?args, path = %path.display(), "running git diff");

        let output = Command::new("git")
            .arg("-C")
            .arg(self.repo_path)
            .arg("diff")
            .args(args)
            .arg("--")
            .arg(path)
            .output()
            .map_err(|e| DiffCommandError::DiffFailed {
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DiffCommandError::DiffExitError {
                stderr: stderr.into_owned(),
            });
        }

        String::from_utf8(output.stdout).map_err(|e| DiffCommandError::InvalidUtf8 {
            message: e.to_string(),
        })
    }
}

/// Read and parse an LCOV report from disk, one line at a time
pub fn read_report(path: &Path) -> Result<CoverageReport, FilterError> {
    if !path.exists() {
        return Err(ReportIoError::ReportNotFound {
            path: path.display().to_string(),
        }
        .into());
    }

    let read_failed = |e: std::io::Error| ReportIoError::ReadFailed {
        path: path.display().to_string(),
        message: e.to_string(),
    };

    let reader = BufReader::new(File::open(path).map_err(read_failed)?);
    let mut parser = ReportParser::new();
    for line in reader.lines() {
        parser.push_line(&line.map_err(read_failed)?)?;
    }

    Ok(parser.finish())
}

/// Write `report` in LCOV syntax to `path`, replacing any existing file
pub fn write_report(report: &CoverageReport, path: &Path) -> Result<(), ReportIoError> {
    let write_failed = |e: std::io::Error| ReportIoError::WriteFailed {
        path: path.display().to_string(),
        message: e.to_string(),
    };

    let mut writer = BufWriter::new(File::create(path).map_err(write_failed)?);
    write!(writer, "{report}").map_err(write_failed)?;
    writer.flush().map_err(write_failed)
}
