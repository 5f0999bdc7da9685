use std::path::PathBuf;

use clap::Parser;
use vidkit::{TrimRange, Trimmer, format_timecode};

mod shared;

use shared::{CliResult, GlobalOptions};

const CLI_AFTER_HELP: &str = "Examples:\n  trimmer -i input.mp4 -o clip.mp4 --ss 00:01:30 --to 00:02:30\n  trimmer -i input.mp4 -o intro.mp4 --ds 45";

#[derive(Debug, Parser)]
#[command(
    name = "trimmer",
    version,
    about = "Video trimmer using FFmpeg",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    /// Input video file path.
    #[arg(short, long, required_unless_present = "completions")]
    input: Option<PathBuf>,

    /// Output video file path.
    #[arg(short, long, required_unless_present = "completions")]
    output: Option<PathBuf>,

    /// Start time (e.g. 00:01:30 for 1 min 30 sec).
    #[arg(long, visible_alias = "ss", value_name = "TIME")]
    start: Option<String>,

    /// End time (e.g. 00:02:30 for 2 min 30 sec).
    #[arg(long, visible_alias = "to", value_name = "TIME")]
    end: Option<String>,

    /// Duration from the start of the file (e.g. 00:01:00 for 1 min).
    #[arg(long, visible_alias = "ds", value_name = "TIME")]
    duration: Option<String>,

    #[command(flatten)]
    global: GlobalOptions,
}

fn run() -> CliResult {
    let cli = Cli::parse();
    if shared::print_completions::<Cli>(&cli.global, "trimmer") {
        return Ok(());
    }
    cli.global.apply()?;

    let (Some(input), Some(output)) = (&cli.input, &cli.output) else {
        return Err("both --input and --output are required".into());
    };

    let range = TrimRange::from_arguments(
        cli.start.as_deref(),
        cli.end.as_deref(),
        cli.duration.as_deref(),
    )?;

    shared::ensure_writable_path(output, cli.global.no_clobber)?;

    let (options, progress) = cli.global.job_options();
    let result = Trimmer::new(input, output, range).run_with_options(&options);
    if let Some(progress) = progress {
        progress.finish();
    }
    let report = result?;

    if range.start().saturating_sub(report.actual_start).as_millis() > 0 && report.packets > 0 {
        shared::note(&format!(
            "cut starts at the keyframe at {} (requested {})",
            format_timecode(report.actual_start),
            format_timecode(range.start())
        ));
    }

    shared::success(&format!("Video trimmed successfully: {}", output.display()));
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
    fn ffmpeg_style_aliases() {
        let cli = Cli::try_parse_from([
            "trimmer", "-i", "in.mp4", "-o", "out.mp4", "--ss", "00:01:30", "--to", "2:30",
        ])
        .unwrap();
        assert_eq!(cli.start.as_deref(), Some("00:01:30"));
        assert_eq!(cli.end.as_deref(), Some("2:30"));
        assert!(cli.duration.is_none());
    }

    #[test]
    fn duration_alias() {
        let cli =
            Cli::try_parse_from(["trimmer", "-i", "in.mp4", "-o", "out.mp4", "--ds", "45"]).unwrap();
        assert_eq!(cli.duration.as_deref(), Some("45"));
    }
}
