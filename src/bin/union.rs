use std::path::PathBuf;

use clap::Parser;
use vidkit::{Concatenator, format_timecode};

mod shared;

use shared::{CliResult, GlobalOptions};

const CLI_AFTER_HELP: &str = "Examples:\n  union -o output.mp4 input1.mp4 input2.avi input3.mkv\n  union -o output.mp4 part*.mp4 --progress";

#[derive(Debug, Parser)]
#[command(
    name = "union",
    version,
    about = "Video file union tool using FFmpeg",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    /// Output video file path.
    #[arg(short, long, required_unless_present = "completions")]
    output: Option<PathBuf>,

    /// Input video file paths to be merged, in order.
    #[arg(required_unless_present = "completions", num_args = 1..)]
    videos: Vec<PathBuf>,

    #[command(flatten)]
    global: GlobalOptions,
}

fn run() -> CliResult {
    let cli = Cli::parse();
    if shared::print_completions::<Cli>(&cli.global, "union") {
        return Ok(());
    }
    cli.global.apply()?;

    let Some(output) = &cli.output else {
        return Err("--output is required".into());
    };

    let concatenator = Concatenator::new(output).inputs(&cli.videos);
    concatenator.validate()?;

    shared::ensure_writable_path(output, cli.global.no_clobber)?;

    println!("Merging videos...");
    let (options, progress) = cli.global.job_options();
    let result = concatenator.run_with_options(&options);
    if let Some(progress) = progress {
        progress.finish();
    }
    let report = result?;

    shared::success(&format!(
        "Videos merged successfully into: {} ({})",
        output.display(),
        format_timecode(report.duration)
    ));
    Ok(())
}

fn main() {
    shared::exit_on_error(run());
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn videos_are_positional() {
        let cli = Cli::try_parse_from(["union", "-o", "out.mp4", "a.mp4", "b.mkv"]).unwrap();
        assert_eq!(cli.videos, [PathBuf::from("a.mp4"), PathBuf::from("b.mkv")]);
    }

    #[test]
    fn at_least_one_video() {
        assert!(Cli::try_parse_from(["union", "-o", "out.mp4"]).is_err());
    }
}
