//! weewx CLI
//!
//! Command-line interface for fetching and inspecting weewx station reports.

#![allow(clippy::print_stdout)]

mod settings;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use integration_weewx::{
    ATTRIBUTION, FORECAST_DAYS, FixedTimezone, GeoTimezoneResolver, REPORT_CHARACTERISTICS,
    TimezoneResolver, WeatherClient, WeatherResult, WeewxClient, parse_feed, parse_report,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::settings::Settings;

/// weewx CLI
#[derive(Parser)]
#[command(name = "weewx-cli")]
#[command(author, version, about = "Weather reports from a weewx station RSS feed", long_about = None)]
struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file (TOML)
    #[arg(short, long, env = "WEEWX_CONFIG", default_value = "weewx.toml")]
    config: PathBuf,

    /// Station RSS feed URL (overrides the configuration)
    #[arg(short, long)]
    url: Option<String>,

    /// Station timezone, skipping the lookup from the feed's coordinates
    #[arg(short, long)]
    timezone: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the feed and print the current report
    ///
    /// Example: weewx-cli --url http://station.local/weewx/RSS/weewx_rss.xml update
    Update {
        /// Print a one-line summary instead of JSON
        #[arg(short, long)]
        summary: bool,
    },

    /// Parse a saved RSS document instead of fetching it
    ///
    /// Example: weewx-cli parse ./weewx_rss.xml --summary
    Parse {
        /// Path to the RSS document
        file: PathBuf,

        /// Print a one-line summary instead of JSON
        #[arg(short, long)]
        summary: bool,
    },

    /// Show provider attribution and the report fields it fills
    Info,
}

/// Determine log filter level from verbosity count
const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Pick the timezone resolver: a fixed zone if one is given, otherwise the
/// coordinate lookup
fn timezone_resolver(zone: Option<String>) -> Arc<dyn TimezoneResolver> {
    match zone {
        Some(zone) => Arc::new(FixedTimezone::new(zone)),
        None => Arc::new(GeoTimezoneResolver::new()),
    }
}

/// Render a result either as pretty JSON or as the report summary
fn render(result: &WeatherResult, summary: bool) -> anyhow::Result<String> {
    if summary {
        Ok(result.report.summary())
    } else {
        Ok(serde_json::to_string_pretty(result)?)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = log_filter_from_verbosity(cli.verbose);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::load(&cli.config)?;
    let zone = cli.timezone.or_else(|| settings.timezone.clone());

    match cli.command {
        Commands::Update { summary } => {
            let config = settings.weewx_config(cli.url.as_deref())?;
            info!(url = %config.feed_url, "Fetching weewx feed");

            let client = WeewxClient::with_resolver(config, timezone_resolver(zone))?;
            let result = client.update().await?;

            println!("{}", render(&result, summary)?);
        },

        Commands::Parse { file, summary } => {
            let body = tokio::fs::read_to_string(&file).await?;
            let items = parse_feed(&body)?;
            let resolver = timezone_resolver(zone);
            let result = parse_report(&items, resolver.as_ref())?;

            println!("{}", render(&result, summary)?);
        },

        Commands::Info => {
            println!("{ATTRIBUTION}");
            println!("Report fields: {}", REPORT_CHARACTERISTICS.join(", "));
            println!("Forecast days: {FORECAST_DAYS}");
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use integration_weewx::{CompassPoint, WeatherReport};

    use super::*;

    fn parse_args(args: &[&str]) -> Result<Cli, clap::Error> {
        let os_args: Vec<OsString> = args.iter().map(OsString::from).collect();
        Cli::try_parse_from(os_args)
    }

    fn sample_result() -> WeatherResult {
        WeatherResult::from_report(WeatherReport {
            observation_time: "14:30:00".to_string(),
            temperature: 12.5,
            dew_point: 8.1,
            humidity: 75.0,
            air_pressure: Some(1014),
            rain_1h: 0.2,
            rain_day: 3.0,
            wind_speed: 3.4,
            wind_direction: Some(CompassPoint::Sw),
            wind_speed_max: 8.3,
        })
    }

    #[test]
    fn log_filter_verbosity_zero() {
        assert_eq!(log_filter_from_verbosity(0), "warn");
    }

    #[test]
    fn log_filter_verbosity_one() {
        assert_eq!(log_filter_from_verbosity(1), "info");
    }

    #[test]
    fn log_filter_verbosity_two() {
        assert_eq!(log_filter_from_verbosity(2), "debug");
    }

    #[test]
    fn log_filter_verbosity_three_or_more() {
        assert_eq!(log_filter_from_verbosity(3), "trace");
        assert_eq!(log_filter_from_verbosity(10), "trace");
    }

    #[test]
    fn cli_parses_update_command() {
        let cli = parse_args(&["weewx-cli", "update"]).unwrap();
        assert!(matches!(cli.command, Commands::Update { summary: false }));
        assert_eq!(cli.config, PathBuf::from("weewx.toml"));
        assert!(cli.url.is_none());
    }

    #[test]
    fn cli_parses_global_options() {
        let cli = parse_args(&[
            "weewx-cli",
            "-vv",
            "--url",
            "http://station.local/rss.xml",
            "--timezone",
            "Europe/Berlin",
            "update",
            "--summary",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.url.as_deref(), Some("http://station.local/rss.xml"));
        assert_eq!(cli.timezone.as_deref(), Some("Europe/Berlin"));
        assert!(matches!(cli.command, Commands::Update { summary: true }));
    }

    #[test]
    fn cli_parses_parse_command() {
        let cli = parse_args(&["weewx-cli", "parse", "feed.xml"]).unwrap();
        match cli.command {
            Commands::Parse { file, summary } => {
                assert_eq!(file, PathBuf::from("feed.xml"));
                assert!(!summary);
            },
            _ => panic!("Expected Parse command"),
        }
    }

    #[test]
    fn cli_requires_subcommand() {
        assert!(parse_args(&["weewx-cli"]).is_err());
    }

    #[test]
    fn render_json() {
        let output = render(&sample_result(), false).unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["report"]["ObservationTime"], "14:30:00");
        assert_eq!(json["forecasts"], serde_json::json!([]));
    }

    #[test]
    fn render_summary() {
        let output = render(&sample_result(), true).unwrap();
        assert!(output.starts_with("14:30:00"));
        assert!(output.contains("SW"));
    }

    #[test]
    fn fixed_timezone_resolver_selected() {
        let resolver = timezone_resolver(Some("Asia/Tokyo".to_string()));
        assert_eq!(resolver.resolve(0.0, 0.0).as_deref(), Some("Asia/Tokyo"));
    }
}
