use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use git_lcov_filter::{Config, LineSource};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "git-lcov-filter")]
#[command(version, about = "Narrow an LCOV report to the lines changed since a git commit")]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn", value_parser = parse_log_level)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

/// How changed lines are derived from git
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLineSource {
    /// Lines 1..=N where N is the numstat added count
    AddedCount,
    /// Real new-side line numbers from diff hunk headers
    Hunks,
}

impl From<CliLineSource> for LineSource {
    fn from(source: CliLineSource) -> Self {
        match source {
            CliLineSource::AddedCount => LineSource::AddedCount,
            CliLineSource::Hunks => LineSource::Hunks,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Write an LCOV report containing only the lines changed since a commit
    Filter {
        /// Commit to diff the working tree against
        #[arg(long, env = "GIT_LCOV_FILTER_COMMIT")]
        commit: String,

        /// Directory (pathspec) the diff is restricted to
        #[arg(long, env = "GIT_LCOV_FILTER_PATH", default_value = ".")]
        path: PathBuf,

        /// Input LCOV report
        #[arg(long, env = "GIT_LCOV_FILTER_REPORT")]
        report: PathBuf,

        /// Output path for the filtered LCOV report
        #[arg(long, env = "GIT_LCOV_FILTER_OUTPUT")]
        output: PathBuf,

        /// Repository to run git in
        #[arg(long, env = "GIT_LCOV_FILTER_REPO", default_value = ".")]
        repo: PathBuf,

        /// How changed lines are derived
        #[arg(long, value_enum, default_value = "added-count")]
        line_source: CliLineSource,
    },
    /// Print a shell completion script
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
    /// Print the man page
    Man,
}

/// Accept any directive string `EnvFilter` understands
fn parse_log_level(value: &str) -> Result<String, String> {
    EnvFilter::try_new(value)
        .map(|_| value.to_string())
        .map_err(|err| format!("invalid log filter '{value}': {err}"))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    match execute(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn execute(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Filter {
            commit,
            path,
            report,
            output,
            repo,
            line_source,
        } => {
            let summary = git_lcov_filter::run(&Config {
                repo,
                commit,
                path,
                report,
                output,
                line_source: line_source.into(),
            })?;
            println!(
                "Filtered LCOV report saved to: {}",
                summary.output.display()
            );
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "git-lcov-filter", &mut io::stdout());
        }
        Commands::Man => {
            clap_mangen::Man::new(Cli::command()).render(&mut io::stdout())?;
        }
    }

    Ok(())
}
