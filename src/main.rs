//! Slider administration console.
//!
//! Usage:
//!   slider-admin list                 # Show the collection in display order
//!   slider-admin audit                # Validate every entry per language
//!   slider-admin move <from> <to>     # Move an entry (0-based positions)
//!   slider-admin toggle <id>          # Flip an entry's active flag
//!   slider-admin delete <id>          # Remove an entry
//!   slider-admin metrics              # Print decode/resync counters as JSON
//!
//! Required environment variables:
//! - SLIDER_API_URL
//!
//! Optional:
//! - SLIDER_API_KEY
//! - UI_LANGUAGE (defaults to en)
//! - READ_RETRY_ATTEMPTS (defaults to 3)

use anyhow::{bail, Context, Result};
use slider_admin::board::{OperationOutcome, SliderBoard};
use slider_admin::config::Config;
use slider_admin::i18n::{ConsoleMetrics, SliderValidator, UiStrings};
use slider_admin::store::{fetch_tracks, HttpStore};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("slider_admin=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("list");

    let config = Config::from_env()?;
    let strings = UiStrings::for_code(&config.ui_language);
    let store = HttpStore::from_config(&config);

    let tracks = fetch_tracks(&store).await?;
    let mut board = SliderBoard::load(store, tracks)
        .await
        .context("Failed to load sliders")?;

    match command {
        "list" => {
            for slider in board.entries() {
                let default_code = board.tracks().default_track().code();
                let title = slider
                    .content
                    .title
                    .get(default_code)
                    .map(String::as_str)
                    .unwrap_or("");
                println!(
                    "{:>3}  {:<8} {:<8} {}",
                    slider.order,
                    slider.id,
                    if slider.is_active { "active" } else { "hidden" },
                    title
                );
            }
        }
        "audit" => {
            let mut invalid = 0;
            for slider in board.entries() {
                let report = SliderValidator::validate_content(&slider.content, board.tracks());
                if !report.is_valid() {
                    invalid += 1;
                }
                for (scope, messages) in report.error_messages(strings) {
                    for message in messages {
                        println!("{} [{}] error: {}", slider.id, scope, message);
                    }
                }
                for (scope, messages) in report.warning_messages(strings) {
                    for message in messages {
                        println!("{} [{}] warning: {}", slider.id, scope, message);
                    }
                }
            }
            info!(
                "Audited {} sliders, {} incomplete",
                board.entries().len(),
                invalid
            );
        }
        "move" => {
            let from = parse_position(args.get(1), "from")?;
            let to = parse_position(args.get(2), "to")?;
            let outcome = board.move_entry(from, to).await?;
            print_outcome(outcome, strings.order_saved, strings.resynced);
        }
        "toggle" => {
            let id = required_arg(args.get(1), "id")?;
            let outcome = board.toggle_active(id).await?;
            print_outcome(outcome, strings.entry_saved, strings.resynced);
        }
        "delete" => {
            let id = required_arg(args.get(1), "id")?;
            let outcome = board.remove(id).await?;
            print_outcome(outcome, strings.entry_deleted, strings.resynced);
        }
        "metrics" => {
            let metrics = ConsoleMetrics::global().report();
            println!("{}", serde_json::to_string_pretty(&metrics)?);
        }
        other => bail!("Unknown command '{}'", other),
    }

    Ok(())
}

fn print_outcome(outcome: OperationOutcome, applied: &str, resynced: &str) {
    match outcome {
        OperationOutcome::Unchanged => info!("Nothing to change"),
        OperationOutcome::Applied => info!("{}", applied),
        OperationOutcome::Resynced { failures } => {
            for failure in &failures {
                warn!("Slider {}: {}", failure.id, failure.error);
            }
            warn!("{}", resynced);
        }
    }
}

fn required_arg<'a>(arg: Option<&'a String>, name: &str) -> Result<&'a str> {
    arg.map(String::as_str)
        .with_context(|| format!("Missing argument <{}>", name))
}

fn parse_position(arg: Option<&String>, name: &str) -> Result<usize> {
    let raw = required_arg(arg, name)?;
    raw.parse::<usize>()
        .with_context(|| format!("Invalid position <{}>: '{}'", name, raw))
}
