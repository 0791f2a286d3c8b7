use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use clap::{Arg, ArgAction, Command};
use tracing::info;

use crate::{
    HistoryEntry, ParseFailurePolicy, RecommendationRequest, Settings, TravelAdvisor,
    WeatherSnapshot,
};

fn command() -> Command {
    Command::new("tripcast")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Weather-aware travel recommendations with provider fallback")
        .arg(
            Arg::new("message")
                .help("What the traveller is asking for")
                .default_value("")
                .index(1),
        )
        .arg(
            Arg::new("weather")
                .short('w')
                .long("weather")
                .value_name("FILE")
                .help("JSON weather snapshot for the selected city"),
        )
        .arg(
            Arg::new("history")
                .long("history")
                .value_name("FILE")
                .help("JSON list of prior conversation turns"),
        )
        .arg(
            Arg::new("language")
                .short('l')
                .long("language")
                .value_name("TAG")
                .help("Response language, e.g. en-US, ja-JP, hi-IN")
                .default_value("en-US"),
        )
        .arg(
            Arg::new("duration")
                .short('d')
                .long("duration")
                .value_name("DAYS")
                .help("Trip length in days")
                .default_value("1"),
        )
        .arg(
            Arg::new("intent")
                .long("intent")
                .action(ArgAction::SetTrue)
                .help("Print the classified intents instead of a plan"),
        )
        .arg(
            Arg::new("strict-parsing")
                .long("strict-parsing")
                .action(ArgAction::SetTrue)
                .help("Try the next provider when a reply cannot be structured"),
        )
        .arg(
            Arg::new("timeout")
                .short('t')
                .long("timeout")
                .value_name("SECONDS")
                .help("Per-provider deadline in seconds, 0 to disable (or set TRIPCAST_TIMEOUT_SECS)"),
        )
}

fn read_json<T: serde::de::DeserializeOwned>(path: &str) -> anyhow::Result<T> {
    let text = fs::read_to_string(Path::new(path)).with_context(|| format!("reading {path}"))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {path}"))
}

/// CLI entry point for the tripcast binary
pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let matches = command().get_matches();

    let mut settings = Settings::from_env()?;
    if let Some(seconds) = matches.get_one::<String>("timeout") {
        let seconds: u64 = seconds
            .parse()
            .with_context(|| format!("invalid --timeout `{seconds}`"))?;
        settings.attempt_timeout = (seconds > 0).then(|| Duration::from_secs(seconds));
    }
    if matches.get_flag("strict-parsing") {
        settings.parse_failure_policy = ParseFailurePolicy::AdvanceChain;
    }

    let advisor = TravelAdvisor::from_settings(&settings);
    info!(
        providers = advisor.orchestrator().providers().len(),
        "advisor ready"
    );

    let message = matches
        .get_one::<String>("message")
        .cloned()
        .unwrap_or_default();
    let language = matches
        .get_one::<String>("language")
        .cloned()
        .unwrap_or_else(|| "en-US".to_string());

    if matches.get_flag("intent") {
        let intents = advisor.classify_intent(&message, &language).await;
        println!("{}", serde_json::to_string_pretty(&intents)?);
        return Ok(());
    }

    let duration: u32 = match matches.get_one::<String>("duration") {
        Some(days) => days
            .parse()
            .with_context(|| format!("invalid --duration `{days}`"))?,
        None => 1,
    };

    let mut request = RecommendationRequest::new(message)
        .with_language(language)
        .with_duration(duration);
    if let Some(path) = matches.get_one::<String>("weather") {
        let weather: WeatherSnapshot = read_json(path)?;
        request = request.with_weather(weather);
    }
    if let Some(path) = matches.get_one::<String>("history") {
        let history: Vec<HistoryEntry> = read_json(path)?;
        request = request.with_history(history);
    }

    let response = advisor.generate_recommendation(&request).await;
    info!(provider = %response.provider, origin = ?response.origin, "recommendation ready");
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parses_flags() {
        let matches = command()
            .try_get_matches_from([
                "tripcast",
                "Plan a rainy day",
                "--duration",
                "3",
                "--strict-parsing",
                "--language",
                "ja-JP",
            ])
            .unwrap();

        assert_eq!(matches.get_one::<String>("message").unwrap(), "Plan a rainy day");
        assert_eq!(matches.get_one::<String>("duration").unwrap(), "3");
        assert_eq!(matches.get_one::<String>("language").unwrap(), "ja-JP");
        assert!(matches.get_flag("strict-parsing"));
        assert!(!matches.get_flag("intent"));
    }

    #[test]
    fn test_message_is_optional() {
        let matches = command().try_get_matches_from(["tripcast"]).unwrap();
        assert_eq!(matches.get_one::<String>("message").unwrap(), "");
        assert!(matches.get_one::<String>("weather").is_none());
    }
}
