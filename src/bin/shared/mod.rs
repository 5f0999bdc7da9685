//! Pieces shared by the `compressor`, `trimmer`, and `union` binaries.

// Each binary uses a different subset.
#![allow(dead_code)]

use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use clap::{Args, CommandFactory};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;
use vidkit::{FfmpegLogLevel, JobOptions, ProgressCallback, ProgressInfo, format_timecode};

pub type CliResult<T = ()> = Result<T, Box<dyn Error>>;

#[derive(Debug, Args, Clone, Default)]
pub struct GlobalOptions {
    /// Show debug logging output.
    #[arg(long)]
    pub verbose: bool,

    /// Show a progress bar while working.
    #[arg(long)]
    pub progress: bool,

    /// Refuse to overwrite an existing output file.
    #[arg(long)]
    pub no_clobber: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Print shell completions for SHELL and exit.
    #[arg(long, value_enum, value_name = "SHELL")]
    pub completions: Option<Shell>,
}

impl GlobalOptions {
    /// Install logging and the FFmpeg log level.
    pub fn apply(&self) -> CliResult {
        init_logging(self.verbose);

        if let Some(level) = &self.log_level {
            let parsed: FfmpegLogLevel = level.parse()?;
            vidkit::set_ffmpeg_log_level(parsed);
        }
        Ok(())
    }

    /// Options for a library call, plus the progress bar to close afterwards.
    pub fn job_options(&self) -> (JobOptions, Option<Arc<TerminalProgress>>) {
        if self.progress {
            let progress = Arc::new(TerminalProgress::new());
            let options = JobOptions::new().with_progress(progress.clone());
            (options, Some(progress))
        } else {
            (JobOptions::new(), None)
        }
    }
}

/// Library logs go to stderr. `RUST_LOG` overrides the default level.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "error" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // Fails only when a global subscriber is already installed; keep that one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Print completions for the binary's own command line when requested.
///
/// Returns `true` if completions were printed and the binary should exit.
pub fn print_completions<C: CommandFactory>(global: &GlobalOptions, name: &str) -> bool {
    let Some(shell) = global.completions else {
        return false;
    };
    let mut command = C::command();
    clap_complete::generate(shell, &mut command, name, &mut std::io::stdout());
    true
}

pub fn ensure_writable_path(path: &Path, no_clobber: bool) -> CliResult {
    if path.exists() {
        if no_clobber {
            return Err(format!(
                "output already exists: {} (remove --no-clobber to replace)",
                path.display()
            )
            .into());
        }
        warn(&format!("overwriting {}", path.display()));
    }
    Ok(())
}

pub fn warn(message: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), message.yellow());
}

pub fn note(message: &str) {
    eprintln!("{} {message}", "note:".cyan().bold());
}

pub fn success(message: &str) {
    println!("{}", message.green());
}

/// Entry point wrapper: print the error in red and exit with status 1.
pub fn exit_on_error(result: CliResult) {
    if let Err(error) = result {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}

/// Progress bar over media time, in milliseconds.
pub struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.green} {bar:40.cyan/blue} {percent:>3}% {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style.progress_chars("##-"));
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if let Some(total) = info.total {
            self.bar.set_length(total.as_millis() as u64);
        }
        self.bar.set_position(info.processed.as_millis() as u64);

        let mut message = format_timecode(info.processed);
        if let Some(total) = info.total {
            message.push_str(&format!(" / {}", format_timecode(total)));
        }
        if let Some(remaining) = info.estimated_remaining {
            message.push_str(&format!(" (eta {}s)", remaining.as_secs()));
        }
        self.bar.set_message(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logging_can_be_initialised_twice() {
        init_logging(false);
        init_logging(true);
        log::error!("still routed after a second init");
    }
}
