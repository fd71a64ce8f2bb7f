// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod runtime;

use anyhow::{Context, Result};
use config::Config;
use lossmap_api::Client;
use lossmap_app::{AppState, format_currency_short};
use lossmap_geo::CountyAtlas;
use runtime::{DemoRuntime, HttpRuntime};
use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;

const DEMO_SEED: u64 = 7;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `lossmap --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    init_logging(&config)?;

    if options.demo {
        let atlas = CountyAtlas::from_geojson_str(&lossmap_testkit::county_grid_geojson())
            .context("build demo county atlas")?;
        if options.check_only {
            return Ok(());
        }
        let mut state = AppState::default();
        let mut runtime = DemoRuntime::new(DEMO_SEED);
        return lossmap_tui::run_app(&mut state, &mut runtime, atlas);
    }

    let client = Client::new(config.api_base_url(), config.api_timeout()?).with_context(|| {
        format!(
            "invalid [api] config in {}; fix base_url/timeout values",
            options.config_path.display()
        )
    })?;

    if let Some(n) = options.top {
        return print_top(&client, n);
    }
    if let Some(state_filter) = &options.bands {
        return print_bands(&client, state_filter.as_deref());
    }

    let atlas = load_atlas(&config)?;
    if options.check_only {
        return Ok(());
    }

    let mut state = AppState::default();
    let mut runtime = HttpRuntime::new(client);
    lossmap_tui::run_app(&mut state, &mut runtime, atlas)
}

fn load_atlas(config: &Config) -> Result<CountyAtlas> {
    match config.counties_path() {
        Some(path) => {
            let atlas = CountyAtlas::from_geojson_file(&path)
                .context("load county topology; fix [map].counties_path or remove it")?;
            tracing::info!(counties = atlas.len(), path = %path.display(), "county topology loaded");
            Ok(atlas)
        }
        None => {
            tracing::info!("no [map].counties_path configured; map panel will be empty");
            Ok(CountyAtlas::default())
        }
    }
}

fn init_logging(config: &Config) -> Result<()> {
    let Some(path) = config.log_file() else {
        return Ok(());
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open log file {}", path.display()))?;
    let filter = tracing_subscriber::EnvFilter::try_new(config.log_level())
        .with_context(|| format!("invalid log.level {:?}", config.log_level()))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn print_top(client: &Client, n: usize) -> Result<()> {
    let top = client.fetch_top(n)?;
    if let Some(run) = &top.run {
        println!("run {run}");
    }
    for (rank, entry) in top.top.iter().enumerate() {
        println!(
            "{:>3}  {:<12} {:<16} {:<4} {}",
            rank + 1,
            entry.geoid,
            entry.county,
            entry.state,
            format_currency_short(entry.el_total_sum)
        );
    }
    Ok(())
}

fn print_bands(client: &Client, state: Option<&str>) -> Result<()> {
    let bands = client.fetch_bands(state)?;
    if let Some(run) = &bands.run {
        println!("run {run}");
    }
    println!("{} tracts", bands.count);
    for band in &bands.bands {
        println!(
            "{:<12} {:<4} p50 {:<10} p90 {}",
            band.geoid,
            band.state,
            format_currency_short(band.p50),
            format_currency_short(band.p90)
        );
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    demo: bool,
    top: Option<usize>,
    bands: Option<Option<String>>,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_example: false,
        check_only: false,
        demo: false,
        top: None,
        bands: None,
        show_help: false,
    };

    let mut iter = args.into_iter().peekable();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--top" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--top requires a count"))?;
                let n: usize = value
                    .as_ref()
                    .parse()
                    .with_context(|| format!("invalid --top count {:?}", value.as_ref()))?;
                options.top = Some(n);
            }
            "--bands" => {
                let take_state = iter
                    .peek()
                    .is_some_and(|next| !next.as_ref().starts_with("--"));
                let state = if take_state {
                    iter.next().map(|value| value.as_ref().to_owned())
                } else {
                    None
                };
                options.bands = Some(state);
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("lossmap");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a config template");
    println!("  --check                  Validate config, client, and topology, then exit");
    println!("  --demo                   Launch with deterministic fixture data (no network)");
    println!("  --top <n>                Print the top-N highest-loss tracts and exit");
    println!("  --bands [state]          Print per-tract p50/p90 bands and exit");
    println!("  --help                   Show this help");
}

#[cfg(test)]
mod tests {
    use super::{CliOptions, parse_cli_args};
    use anyhow::Result;
    use std::path::PathBuf;

    fn default_options_path() -> PathBuf {
        PathBuf::from("/tmp/lossmap-config.toml")
    }

    #[test]
    fn parse_cli_args_defaults_to_provided_config_path() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            options,
            CliOptions {
                config_path: default_options_path(),
                print_config_path: false,
                print_example: false,
                check_only: false,
                demo: false,
                top: None,
                bands: None,
                show_help: false,
            }
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_config_path_override() -> Result<()> {
        let options = parse_cli_args(
            vec!["--config", "/custom/config.toml"],
            default_options_path(),
        )?;
        assert_eq!(options.config_path, PathBuf::from("/custom/config.toml"));
        Ok(())
    }

    #[test]
    fn parse_cli_args_errors_for_missing_config_value() {
        let error = parse_cli_args(vec!["--config"], default_options_path())
            .expect_err("missing config value should fail");
        assert!(error.to_string().contains("--config requires a file path"));
    }

    #[test]
    fn parse_cli_args_errors_for_unknown_argument() {
        let error = parse_cli_args(vec!["--wat"], default_options_path())
            .expect_err("unknown arg should fail");
        let message = error.to_string();
        assert!(message.contains("unknown argument"));
        assert!(message.contains("--help"));
    }

    #[test]
    fn parse_cli_args_sets_print_check_and_demo_flags() -> Result<()> {
        let options = parse_cli_args(
            vec![
                "--print-config-path",
                "--print-example-config",
                "--check",
                "--demo",
            ],
            default_options_path(),
        )?;
        assert!(options.print_config_path);
        assert!(options.print_example);
        assert!(options.check_only);
        assert!(options.demo);
        assert!(!options.show_help);
        Ok(())
    }

    #[test]
    fn parse_cli_args_parses_top_count() -> Result<()> {
        let options = parse_cli_args(vec!["--top", "15"], default_options_path())?;
        assert_eq!(options.top, Some(15));
        Ok(())
    }

    #[test]
    fn parse_cli_args_rejects_bad_top_count() {
        let error = parse_cli_args(vec!["--top", "many"], default_options_path())
            .expect_err("non-numeric count should fail");
        assert!(error.to_string().contains("invalid --top count"));

        let error = parse_cli_args(vec!["--top"], default_options_path())
            .expect_err("missing count should fail");
        assert!(error.to_string().contains("--top requires a count"));
    }

    #[test]
    fn parse_cli_args_handles_bands_with_and_without_state() -> Result<()> {
        let with_state = parse_cli_args(vec!["--bands", "TX"], default_options_path())?;
        assert_eq!(with_state.bands, Some(Some("TX".to_owned())));

        let without_state = parse_cli_args(vec!["--bands"], default_options_path())?;
        assert_eq!(without_state.bands, Some(None));

        let followed_by_flag = parse_cli_args(vec!["--bands", "--check"], default_options_path())?;
        assert_eq!(followed_by_flag.bands, Some(None));
        assert!(followed_by_flag.check_only);
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_help_flag_for_long_and_short_variants() -> Result<()> {
        let long = parse_cli_args(vec!["--help"], default_options_path())?;
        assert!(long.show_help);

        let short = parse_cli_args(vec!["-h"], default_options_path())?;
        assert!(short.show_help);
        Ok(())
    }
}
