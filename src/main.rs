// file: src/main.rs
// description: commandline application entry point
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use pixel_polish::config::DEFAULT_CONFIG_PATH;
use pixel_polish::utils::logging::{format_error, format_info, format_success};
use pixel_polish::utils::telemetry;
use pixel_polish::{
    ArgValues, Config, Executor, LinePrompter, Mode, ProgressStyle, RunRequest, RunSummary,
    Scale, SettingsResolver, TerminalPrompter,
};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(name = "pixel_polish")]
#[command(version = "0.1.0")]
#[command(
    about = "Remove image backgrounds, upscale and enhance images into a PNG",
    long_about = None
)]
struct Cli {
    /// 1 = remove background and upscale, 2 = upscale only
    #[arg(short, long, value_name = "1|2", value_parser = parse_mode)]
    mode: Option<Mode>,

    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    #[arg(short, long, value_name = "2|4|8", value_parser = parse_scale)]
    scale: Option<Scale>,

    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Overrides `progress.style` from the configuration
    #[arg(long, value_enum, value_name = "STYLE")]
    progress: Option<ProgressStyle>,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    /// Never prompt; missing values fall back to configured defaults
    #[arg(long, action = ArgAction::SetTrue)]
    non_interactive: bool,
}

fn parse_mode(value: &str) -> std::result::Result<Mode, String> {
    let selector: u8 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not 1 or 2", value))?;
    Mode::from_selector(selector).map_err(|e| e.to_string())
}

fn parse_scale(value: &str) -> std::result::Result<Scale, String> {
    let factor: u32 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not 2, 4 or 8", value))?;
    Scale::try_from(factor).map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    pixel_polish::utils::logging::init_logger(cli.color, cli.verbose);

    match run(cli) {
        Ok(summary) => {
            println!(
                "\n{}",
                format_success(&format!(
                    "Processing complete! Saved to: {}",
                    summary.output.display()
                ))
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!(
                "\n{}",
                format_error(&format!("Error during processing: {:#}", e))
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<RunSummary> {
    info!("Loading configuration from: {}", cli.config.display());

    let config = if cli.config.exists() {
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?
    } else {
        warn!(
            "Config file {} not found, using default configuration",
            cli.config.display()
        );
        Config::load(None).unwrap_or_else(|e| {
            warn!("Falling back to built-in defaults: {}", e);
            Config::default_config()
        })
    };

    let args = ArgValues {
        mode: cli.mode,
        input: cli.input,
        output: cli.output,
        scale: cli.scale,
    };
    let request = resolve_request(&config, args, cli.non_interactive)?;

    println!(
        "\n{}",
        format_info(&format!("Starting processing (Mode: {})...", request.mode))
    );

    let executor = Executor::from_config(&config)?;
    let style = cli.progress.unwrap_or(config.progress.style);
    let mut progress = style.build(cli.color && config.progress.color);

    let summary = executor.run_with_summary(&request, &mut progress)?;

    if let Some(slowest) = telemetry::slowest(&summary.timings) {
        debug!(
            "Slowest stage: {} ({:.3}s of {:.3}s)",
            slowest.stage,
            slowest.elapsed.as_secs_f64(),
            telemetry::total_elapsed(&summary.timings).as_secs_f64()
        );
    }
    info!(
        "{}x{} -> {}x{} in {:.2}s",
        summary.source_dimensions.0,
        summary.source_dimensions.1,
        summary.final_dimensions.0,
        summary.final_dimensions.1,
        summary.duration.as_secs_f64()
    );

    Ok(summary)
}

fn resolve_request(config: &Config, args: ArgValues, non_interactive: bool) -> Result<RunRequest> {
    let request = if non_interactive {
        SettingsResolver::<TerminalPrompter>::non_interactive(config).resolve(args)?
    } else if io::stdin().is_terminal() {
        SettingsResolver::interactive(config, TerminalPrompter::default()).resolve(args)?
    } else {
        let prompter = LinePrompter::new(io::stdin().lock(), io::stdout());
        SettingsResolver::interactive(config, prompter).resolve(args)?
    };

    Ok(request)
}
