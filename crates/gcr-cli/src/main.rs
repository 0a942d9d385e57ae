//! gcr - run commands across student assignment checkouts
//!
//! ## Commands
//!
//! - `configure`: Write the organization, working directory and token
//! - `checkout`: Clone student repositories for an assignment
//! - `run`: Run a command in each checkout and show its output
//! - `check`: Run a command in each checkout and summarise pass/fail
//! - `show`: Display one file from each checkout
//! - `update-file`: Copy one file into every checkout

mod prompt;

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::{info, warn};

use gcr_core::{
    report_aggregate, run_interactive, show_file, update_file, Acknowledge, BatchSpan,
    CommandSpec, Config, DirectoryResolver, ExecSettings, FanOutExecutor, FilterMode,
    InteractiveReporter, ProgressObserver, StdinAcknowledge, TargetDirectory,
    DEFAULT_WORKING_DIR,
};
use gcr_github::{checkout, GithubClient, RepoSource, Selection};

#[derive(Parser)]
#[command(name = "gcr")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run commands across student assignment repositories", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file (default: <config dir>/gcr/config.json)
    #[arg(long, global = true, env = "GCR_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initial configuration
    Configure {
        /// Overwrite an existing config file
        #[arg(long)]
        reset: bool,
    },

    /// Check out student repositories
    Checkout {
        /// Assignment name (repository prefix)
        assignment: String,

        /// A single student to check out
        student: Option<String>,

        /// Check out every repository for the assignment
        #[arg(long)]
        all: bool,
    },

    /// Run a local command within each student repo
    Run {
        /// Assignment name (repository prefix)
        assignment: String,

        /// Command line to run, split with shell quoting rules
        command: String,

        /// Only this student's checkout
        student: Option<String>,

        /// Only show targets whose command failed
        #[arg(long)]
        errors_only: bool,

        /// Only show targets whose command succeeded
        #[arg(long)]
        success_only: bool,

        /// Pause for <Enter> after each shown target
        #[arg(long)]
        wait: bool,

        /// Let output stream straight to the terminal
        #[arg(long)]
        no_capture: bool,

        /// Kill a target's command after this many seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        /// Targets to run at once (requires captured output)
        #[arg(short, long, default_value = "1")]
        jobs: usize,
    },

    /// Run a local command within each student repo and aggregate output
    Check {
        /// Assignment name (repository prefix)
        assignment: String,

        /// Command line to run, split with shell quoting rules
        command: String,

        /// Kill a target's command after this many seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        /// Targets to run at once
        #[arg(short, long, default_value = "1")]
        jobs: usize,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// View a file for each student repo
    Show {
        /// Assignment name (repository prefix)
        assignment: String,

        /// Path of the file inside each checkout
        filename: String,

        /// Only this student's checkout
        student: Option<String>,

        /// Pause for <Enter> after each file
        #[arg(long)]
        wait: bool,
    },

    /// Update a file in each student repo
    UpdateFile {
        /// Assignment name (repository prefix)
        assignment: String,

        /// File to copy into each checkout
        newfile: PathBuf,

        /// Destination path inside each checkout
        filepath: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Reports own stdout; keep lifecycle logs quiet unless asked.
    gcr_core::init_tracing(cli.json_logs, gcr_core::level_for(cli.verbose));

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::default_path()?,
    };

    match cli.command {
        Commands::Configure { reset } => cmd_configure(&config_path, reset).await,
        Commands::Checkout {
            assignment,
            student,
            all,
        } => cmd_checkout(&load_config(&config_path)?, &assignment, student, all).await,
        Commands::Run {
            assignment,
            command,
            student,
            errors_only,
            success_only,
            wait,
            no_capture,
            timeout,
            jobs,
        } => {
            let filter = FilterMode::from_flags(errors_only, success_only)?;
            let settings = ExecSettings {
                capture: !no_capture,
                timeout: timeout.map(Duration::from_secs),
                jobs,
            };
            cmd_run(
                &load_config(&config_path)?,
                &assignment,
                &command,
                student.as_deref(),
                filter,
                settings,
                wait,
            )
            .await
        }
        Commands::Check {
            assignment,
            command,
            timeout,
            jobs,
            json,
        } => {
            let settings = ExecSettings {
                capture: true,
                timeout: timeout.map(Duration::from_secs),
                jobs,
            };
            cmd_check(&load_config(&config_path)?, &assignment, &command, settings, json).await
        }
        Commands::Show {
            assignment,
            filename,
            student,
            wait,
        } => cmd_show(
            &load_config(&config_path)?,
            &assignment,
            &filename,
            student.as_deref(),
            wait,
        ),
        Commands::UpdateFile {
            assignment,
            newfile,
            filepath,
        } => cmd_update_file(&load_config(&config_path)?, &assignment, &newfile, &filepath),
    }
}

fn load_config(path: &Path) -> Result<Config> {
    Ok(Config::load(path)?)
}

/// Resolve checkouts, warning when a named student has none.
fn resolve_targets(
    config: &Config,
    assignment: &str,
    student: Option<&str>,
) -> Result<Vec<TargetDirectory>> {
    let root = config.working_path()?;
    let targets = DirectoryResolver::new(root).resolve(assignment, student)?;
    for missing in targets.iter().filter(|t| !t.exists()) {
        warn!(target_dir = %missing.name, "No checkout found; run 'gcr checkout' first");
    }
    Ok(targets)
}

/// Prompt for settings, verify them against GitHub and write the config
async fn cmd_configure(path: &Path, reset: bool) -> Result<()> {
    if path.is_file() && !reset {
        anyhow::bail!(
            "{} already exists, pass --reset to overwrite",
            path.display()
        );
    }

    let working_dir = prompt::prompt("Working directory", Some(DEFAULT_WORKING_DIR))?;
    let org_name = prompt::prompt("GitHub organization", None)?;
    println!("Visit https://github.com/settings/tokens/new and obtain a personal access token.");
    println!("{}", "Be sure to select 'repo' scope!".magenta());
    let github_token = prompt::prompt_secret("GitHub token")?;

    let config = Config::new(org_name, working_dir, github_token);

    // Test login before writing anything.
    let client = GithubClient::new(&config.github_token)?;
    client
        .verify_org(&config.org_name)
        .await
        .context(format!("Could not authenticate for github.com/{}", config.org_name))?;

    config.save(path)?;
    println!(
        "{}",
        format!("Successfully configured, writing '{}'", path.display()).green()
    );
    Ok(())
}

/// Clone an assignment's repositories into the working directory
async fn cmd_checkout(
    config: &Config,
    assignment: &str,
    student: Option<String>,
    all: bool,
) -> Result<()> {
    let selection = Selection::from_args(student, all)?;
    let client = GithubClient::new(&config.github_token)?;
    let root = config.working_path()?;

    let summary = checkout(&client, &config.org_name, &root, assignment, &selection)
        .await
        .context(format!(
            "Failed to list repositories in github.com/{}",
            config.org_name
        ))?;

    println!(
        "{}, {} already existed.",
        format!("{} new repositories", summary.cloned.len()).green(),
        summary.existing.len()
    );
    for (name, reason) in &summary.failed {
        eprintln!("{} {name}: {reason}", "✗".red());
    }
    if !summary.failed.is_empty() {
        anyhow::bail!("{} repositories failed to clone", summary.failed.len());
    }
    Ok(())
}

/// Run a command in each checkout, presenting results one by one
async fn cmd_run(
    config: &Config,
    assignment: &str,
    command: &str,
    student: Option<&str>,
    filter: FilterMode,
    settings: ExecSettings,
    wait: bool,
) -> Result<()> {
    let capture = settings.capture;
    let executor = FanOutExecutor::new(settings)?;
    let command = CommandSpec::parse(command)?;
    let targets = resolve_targets(config, assignment, student)?;
    let _span = BatchSpan::enter(assignment);
    info!(targets = targets.len(), command = %command, "Running");

    let mut reporter = InteractiveReporter::new(io::stdout(), filter, capture);
    if wait {
        reporter = reporter.with_pause(Box::new(StdinAcknowledge));
    }
    let results = run_interactive(&executor, &targets, &command, &mut reporter).await?;

    let failed = results.iter().filter(|r| !r.passed()).count();
    if failed > 0 {
        anyhow::bail!("{failed} of {} targets failed", results.len());
    }
    Ok(())
}

/// Run a command in every checkout and print the aggregate report
async fn cmd_check(
    config: &Config,
    assignment: &str,
    command_line: &str,
    settings: ExecSettings,
    json: bool,
) -> Result<()> {
    let executor = FanOutExecutor::new(settings)?;
    let command = CommandSpec::parse(command_line)?;
    let targets = resolve_targets(config, assignment, None)?;
    let _span = BatchSpan::enter(assignment);

    let mut progress = ProgressObserver::new(targets.len(), command_line);
    let results = executor
        .execute_batch_observed(&targets, &command, &mut progress)
        .await;
    progress.finish();

    let report = report_aggregate(&results, command_line);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report.render(&mut io::stdout())?;
    }

    if report.has_failures() {
        anyhow::bail!(
            "{} of {} targets failed",
            report.stats.failed,
            report.stats.total()
        );
    }
    Ok(())
}

/// Show one file from each checkout
fn cmd_show(
    config: &Config,
    assignment: &str,
    filename: &str,
    student: Option<&str>,
    wait: bool,
) -> Result<()> {
    let targets = resolve_targets(config, assignment, student)?;
    let mut ack = StdinAcknowledge;
    let pause: Option<&mut dyn Acknowledge> = if wait { Some(&mut ack) } else { None };
    show_file(&mut io::stdout(), &targets, filename, pause)?;
    Ok(())
}

/// Copy one file into every checkout
fn cmd_update_file(
    config: &Config,
    assignment: &str,
    newfile: &Path,
    filepath: &Path,
) -> Result<()> {
    if !newfile.is_file() {
        anyhow::bail!("{} is not a file", newfile.display());
    }
    let targets = resolve_targets(config, assignment, None)?;

    println!("copying {} to:", newfile.display());
    let summary = update_file(&targets, newfile, filepath);
    for dest in &summary.updated {
        println!("    {}", dest.display());
    }
    for dest in &summary.skipped {
        println!("    {} {}", dest.display(), "(source, skipped)".dimmed());
    }
    for (dest, reason) in &summary.failed {
        eprintln!("    {} {}: {reason}", "✗".red(), dest.display());
    }

    if summary.has_failures() {
        anyhow::bail!("{} copies failed", summary.failed.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_parses_positional_student_after_command() {
        let cli = Cli::try_parse_from([
            "gcr",
            "run",
            "hw1",
            "pytest -x",
            "alice",
            "--errors-only",
            "--jobs",
            "4",
        ])
        .unwrap();

        match cli.command {
            Commands::Run {
                assignment,
                command,
                student,
                errors_only,
                jobs,
                ..
            } => {
                assert_eq!(assignment, "hw1");
                assert_eq!(command, "pytest -x");
                assert_eq!(student.as_deref(), Some("alice"));
                assert!(errors_only);
                assert_eq!(jobs, 4);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "gcr",
            "check",
            "hw1",
            "make test",
            "--json",
            "--verbose",
            "--config",
            "/tmp/gcr.json",
        ])
        .unwrap();

        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/gcr.json")));
        assert!(matches!(cli.command, Commands::Check { json: true, .. }));
    }

    #[test]
    fn test_update_file_arguments() {
        let cli =
            Cli::try_parse_from(["gcr", "update-file", "hw1", "new.py", "tests/test_hw.py"])
                .unwrap();
        match cli.command {
            Commands::UpdateFile {
                newfile, filepath, ..
            } => {
                assert_eq!(newfile, PathBuf::from("new.py"));
                assert_eq!(filepath, PathBuf::from("tests/test_hw.py"));
            }
            _ => panic!("expected update-file"),
        }
    }

    #[test]
    fn test_configure_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        Config::new("course", "~/gcr-workdir", "t").save(&path).unwrap();

        let rt = tokio::runtime::Runtime::new().unwrap();
        let err = rt.block_on(cmd_configure(&path, false)).unwrap_err();
        assert!(err.to_string().contains("--reset"));
    }
}
