mod reports;
mod scenarios;

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use pwa_kit_core::{PwaConfig, PwaOverrides};
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::time::Instant;

use scenarios::{ScenarioResult, find_scenario, list_scenarios};

#[derive(Debug, Parser)]
#[command(name = "pwa-kit-tester", version = "0.1.0")]
#[command(about = "Replays pwa-kit install prompt, cache and theme flows against an in-memory browser")]
struct Args {
    /// Scenarios to run (comma-separated, or "all")
    #[arg(long, default_value = "all")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// JSON file with `initPWA` options to run the scenarios under
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    let config = load_config(args.config.as_deref())?;
    if args.verbose {
        println!("{}", "🧪 pwa-kit Scenario Tester".bright_cyan().bold());
        println!("Running as app {:?}", config.app_name);
    }

    let start_time = Instant::now();
    let results = run_scenarios(&expand_scenarios(&args.scenarios)?, &config);
    write_reports(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }
    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:16} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn load_config(path: Option<&Path>) -> Result<PwaConfig> {
    let overrides = match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            PwaOverrides::from_json(&json)?
        }
        None => PwaOverrides::default(),
    };
    Ok(overrides.resolve()?)
}

fn expand_scenarios(arg: &str) -> Result<Vec<String>> {
    let requested: Vec<String> = arg
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if requested.iter().any(|s| s == "all") {
        return Ok(list_scenarios()
            .into_iter()
            .map(|(key, _)| key.to_string())
            .collect());
    }
    if let Some(unknown) = requested.iter().find(|s| find_scenario(s).is_none()) {
        bail!("unknown scenario '{unknown}' (see --list-scenarios)");
    }
    Ok(requested)
}

fn run_scenarios(keys: &[String], config: &PwaConfig) -> Vec<ScenarioResult> {
    keys.iter()
        .filter_map(|key| find_scenario(key))
        .map(|scenario| {
            log::debug!("running scenario {}", scenario.key);
            scenario.run(config)
        })
        .collect()
}

fn write_reports(args: &Args, results: &[ScenarioResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;
    match args.report.as_str() {
        "json" => reports::generate_json_report(&mut output_target, results)?,
        "markdown" => reports::generate_markdown_report(&mut output_target, results)?,
        _ => reports::generate_console_report(
            &mut output_target,
            results,
            start_time.elapsed(),
        )?,
    }
    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
