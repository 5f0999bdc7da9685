use std::path::PathBuf;

use clap::Parser;
use serde_json::json;
use vidkit::{BitrateWarning, CompressionPlan, CompressionTarget, Compressor};

mod shared;

use shared::{CliResult, GlobalOptions};

const CLI_AFTER_HELP: &str = "Examples:\n  compressor -i input.mp4 -o output.mp4 -b 1000k\n  compressor -i input.mp4 -o output.mp4 --fs 25\n  compressor -i input.mp4 -o output.mp4 --fs 25 --dry-run --json";

#[derive(Debug, Parser)]
#[command(
    name = "compressor",
    version,
    about = "Video compressor using FFmpeg",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    /// Input video file path.
    #[arg(short, long, required_unless_present = "completions")]
    input: Option<PathBuf>,

    /// Output video file path.
    #[arg(short, long, required_unless_present = "completions")]
    output: Option<PathBuf>,

    /// Target video bitrate (e.g. 1000k, or just 1000 for 1000 kbps).
    #[arg(short, long)]
    bitrate: Option<String>,

    /// Target file size in MB (overrides bitrate if specified).
    #[arg(long, visible_alias = "fs", value_name = "MB")]
    filesize: Option<f64>,

    /// Print the planned bitrates without encoding.
    #[arg(long)]
    dry_run: bool,

    /// Print the result as machine-readable JSON.
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    global: GlobalOptions,
}

fn plan_json(cli: &Cli, plan: &CompressionPlan) -> serde_json::Value {
    json!({
        "input": cli.input.as_ref().map(|path| path.display().to_string()),
        "output": cli.output.as_ref().map(|path| path.display().to_string()),
        "dry_run": cli.dry_run,
        "duration_seconds": plan.duration.as_secs_f64(),
        "video_bitrate": plan.video_bitrate.bits_per_second(),
        "video_bitrate_text": plan.video_bitrate.to_string(),
        "audio_bitrate": plan.audio_bitrate.bits_per_second(),
        "estimate": plan.estimate.map(|estimate| json!({
            "target_size_mb": cli.filesize,
            "source_audio_bitrate": estimate.audio_bit_rate,
            "audio_size_mb": estimate.audio_size_mb,
            "overhead_mb": estimate.overhead_mb,
            "available_video_mb": estimate.available_video_mb,
            "below_floor": estimate.warning.is_some(),
        })),
    })
}

fn run() -> CliResult {
    let cli = Cli::parse();
    if shared::print_completions::<Cli>(&cli.global, "compressor") {
        return Ok(());
    }
    cli.global.apply()?;

    let (Some(input), Some(output)) = (&cli.input, &cli.output) else {
        return Err("both --input and --output are required".into());
    };

    if cli.bitrate.is_some() && cli.filesize.is_some() {
        shared::warn("Both bitrate and filesize specified. Filesize will take precedence.");
    }

    let target = CompressionTarget::from_arguments(cli.bitrate.as_deref(), cli.filesize)?;
    if let (CompressionTarget::Bitrate(bitrate), Some(text)) = (target, &cli.bitrate)
        && !text.trim().ends_with(['k', 'K', 'm', 'M'])
        && !cli.json
    {
        shared::note(&format!("Interpreting bitrate as {bitrate}"));
    }

    let compressor = Compressor::new(input, output, target);
    let plan = compressor.plan()?;

    if let Some(estimate) = &plan.estimate {
        if let Some(BitrateWarning::BelowFloor { computed }) = estimate.warning {
            shared::warn(&format!(
                "Calculated bitrate ({}k) is too low for reasonable quality.",
                computed / 1000
            ));
            shared::warn(&format!("Setting to minimum bitrate of {}", plan.video_bitrate));
        }
        if !cli.json {
            println!(
                "Calculated bitrate for {}MB target: {}",
                cli.filesize.unwrap_or_default(),
                plan.video_bitrate
            );
        }
    }

    if cli.dry_run {
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&plan_json(&cli, &plan))?);
        } else {
            println!(
                "Would encode {} at video {} / audio {}",
                input.display(),
                plan.video_bitrate,
                plan.audio_bitrate
            );
        }
        return Ok(());
    }

    shared::ensure_writable_path(output, cli.global.no_clobber)?;

    let (options, progress) = cli.global.job_options();
    let result = compressor.encode(&plan, &options);
    if let Some(progress) = progress {
        progress.finish();
    }
    result?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&plan_json(&cli, &plan))?);
    } else {
        shared::success(&format!(
            "Compression completed: {} with bitrate {}",
            output.display(),
            plan.video_bitrate
        ));
    }
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
    fn fs_alias_and_bitrate() {
        let cli = Cli::try_parse_from([
            "compressor", "-i", "in.mp4", "-o", "out.mp4", "-b", "800", "--fs", "12.5",
        ])
        .unwrap();
        assert_eq!(cli.filesize, Some(12.5));
        assert_eq!(cli.bitrate.as_deref(), Some("800"));
    }

    #[test]
    fn input_and_output_are_required() {
        assert!(Cli::try_parse_from(["compressor", "-i", "in.mp4"]).is_err());
    }

    #[test]
    fn completions_need_no_paths() {
        let cli = Cli::try_parse_from(["compressor", "--completions", "bash"]).unwrap();
        assert!(cli.global.completions.is_some());
    }
}
