//! nomee: command-line tool for testimonial analysis.
//!
//! Runs the phrase extractor, quote highlighter, pill builder, and signal
//! aggregation over local input, and exercises the submission rate limiter
//! against PostgreSQL or an in-memory store. Results are printed to stdout
//! as pretty JSON; logs go to stderr.

mod telemetry;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use nomee_core::{
    normalize_email, AppConfig, Contribution, HighlightPattern, IdentifierHash, RateLimitDecision,
    RateLimiter, RelationshipBucket, SignalCard, SignalSummary, Tier, TraitSignal, Vocabulary,
};
use nomee_db::Database;
use nomee_signals::{
    pills_with, rank_trait_signals, relationship_breakdown, Extractor, HighlightOptions,
    Highlighter, Segment, SignalBuilder,
};

#[derive(Parser)]
#[command(name = "nomee")]
#[command(author, version, about = "Testimonial analysis for Nomee")]
#[command(propagate_version = true)]
struct Cli {
    /// Vocabulary file (.yaml, .yml or .json); overrides NOMEE_VOCABULARY_PATH
    #[arg(long, global = true)]
    vocabulary: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract two to four highlight phrases from a testimonial
    Extract {
        #[arg(short, long)]
        text: String,

        /// Contributor-selected trait (repeatable)
        #[arg(long = "trait", value_name = "TRAIT")]
        traits: Vec<String>,
    },

    /// Build up to three display pills for a testimonial card
    Pills {
        #[arg(short, long)]
        text: String,

        #[arg(long = "trait", value_name = "TRAIT")]
        traits: Vec<String>,
    },

    /// Split a quote into plain and highlighted segments
    Highlight {
        #[arg(short, long)]
        text: String,

        /// Phrase to mark (repeatable); defaults to extracted phrases
        #[arg(short, long = "pattern", value_name = "PHRASE")]
        patterns: Vec<String>,

        /// Highlight budget for marker phrases
        #[arg(short, long, default_value_t = 8)]
        max: usize,

        /// Skip numeric and impact-verb detection
        #[arg(long)]
        no_impact: bool,
    },

    /// Summarize a collection of contributions
    Signals {
        /// JSON file: a contributions array, or an object with
        /// `contributions`, `trait_signals` and `total_contributions`
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Print the identifier hash used as the rate limit key
    HashEmail {
        email: String,
    },

    /// Check (and record) a rate-limited attempt
    CheckLimit {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, default_value = nomee_core::defaults::SUBMISSION_ACTION)]
        action: String,

        /// PostgreSQL URL; overrides DATABASE_URL. In-memory store when unset
        #[arg(long)]
        database_url: Option<String>,
    },
}

/// Accepted shapes for `signals --input`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignalsInput {
    Contributions(Vec<Contribution>),
    Collection {
        contributions: Vec<Contribution>,
        #[serde(default)]
        trait_signals: Option<Vec<TraitSignal>>,
        #[serde(default)]
        total_contributions: Option<usize>,
    },
}

#[derive(Debug, Serialize)]
struct SignalsReport {
    #[serde(flatten)]
    summary: SignalSummary,
    relationships: BTreeMap<RelationshipBucket, usize>,
}

#[derive(Debug, Serialize)]
struct LimitReport {
    identifier: IdentifierHash,
    action: String,
    store: &'static str,
    #[serde(flatten)]
    decision: RateLimitDecision,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let _log_guard = telemetry::init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("Invalid configuration")?;
    let vocab_path = cli.vocabulary.clone().or_else(|| config.vocabulary_path.clone());
    let vocab = load_vocabulary(vocab_path.as_deref())?;

    let output = match cli.command {
        Commands::Extract { text, traits } => cmd_extract(&vocab, &text, &traits)?,
        Commands::Pills { text, traits } => cmd_pills(&vocab, &text, &traits)?,
        Commands::Highlight {
            text,
            patterns,
            max,
            no_impact,
        } => cmd_highlight(&vocab, &text, &patterns, max, !no_impact)?,
        Commands::Signals { input } => cmd_signals(&vocab, &config, &input)?,
        Commands::HashEmail { email } => cmd_hash_email(&email)?,
        Commands::CheckLimit {
            email,
            action,
            database_url,
        } => {
            let url = database_url.or_else(|| config.database_url.clone());
            let runtime = tokio::runtime::Runtime::new().context("Failed to start runtime")?;
            runtime.block_on(cmd_check_limit(&config, &email, &action, url.as_deref()))?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn load_vocabulary(path: Option<&Path>) -> anyhow::Result<Vocabulary> {
    match path {
        Some(path) => Vocabulary::from_path(path)
            .with_context(|| format!("Failed to load vocabulary from {}", path.display())),
        None => {
            debug!(subsystem = "cli", "Using built-in vocabulary");
            Ok(Vocabulary::default())
        }
    }
}

fn cmd_extract(
    vocab: &Vocabulary,
    text: &str,
    traits: &[String],
) -> anyhow::Result<serde_json::Value> {
    let extractor = Extractor::new(vocab);
    let text = nomee_core::sanitize_text(Some(text));
    let traits = nomee_core::sanitize_traits(traits);
    let patterns = extractor.extract(&text, &traits);
    Ok(serde_json::to_value(patterns)?)
}

fn cmd_pills(
    vocab: &Vocabulary,
    text: &str,
    traits: &[String],
) -> anyhow::Result<serde_json::Value> {
    let extractor = Extractor::new(vocab);
    let pills = pills_with(&extractor, Some(text), Some(traits));
    Ok(serde_json::to_value(pills)?)
}

fn cmd_highlight(
    vocab: &Vocabulary,
    text: &str,
    phrases: &[String],
    max: usize,
    impact_detection: bool,
) -> anyhow::Result<serde_json::Value> {
    let patterns: Vec<HighlightPattern> = if phrases.is_empty() {
        let text = nomee_core::sanitize_text(Some(text));
        Extractor::new(vocab).extract(&text, &[])
    } else {
        phrases
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(|p| HighlightPattern::new(p.to_lowercase(), Tier::WorkingStyle))
            .collect()
    };

    let segments: Vec<Segment> = Highlighter::new(vocab).highlight(
        text,
        &patterns,
        HighlightOptions::new(max, impact_detection),
    );
    Ok(json!({ "patterns": patterns, "segments": segments }))
}

fn cmd_signals(
    vocab: &Vocabulary,
    config: &AppConfig,
    input: &Path,
) -> anyhow::Result<serde_json::Value> {
    let raw = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let parsed: SignalsInput = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", input.display()))?;

    let (contributions, ranked, total) = match parsed {
        SignalsInput::Collection {
            contributions,
            trait_signals,
            total_contributions,
        } => (contributions, trait_signals, total_contributions),
        SignalsInput::Contributions(contributions) => (contributions, None, None),
    };

    let cards: Vec<SignalCard> = contributions.iter().map(SignalCard::from).collect();
    let ranked = ranked.unwrap_or_else(|| rank_trait_signals(&cards));
    let total = total.unwrap_or(contributions.len());

    let builder = SignalBuilder::new(config.signals.clone(), vocab);
    let summary = builder.build(&cards, &ranked, total);
    info!(
        subsystem = "cli",
        op = "signals",
        input_count = contributions.len(),
        sufficient = summary.sufficient,
        "Signals computed"
    );

    let report = SignalsReport {
        summary,
        relationships: relationship_breakdown(&contributions),
    };
    Ok(serde_json::to_value(report)?)
}

fn cmd_hash_email(email: &str) -> anyhow::Result<serde_json::Value> {
    let identifier = identifier_for(email)?;
    Ok(json!({ "identifier": identifier }))
}

fn identifier_for(email: &str) -> anyhow::Result<IdentifierHash> {
    if normalize_email(email).is_empty() {
        bail!("Email must not be empty");
    }
    Ok(IdentifierHash::from_email(email))
}

async fn cmd_check_limit(
    config: &AppConfig,
    email: &str,
    action: &str,
    database_url: Option<&str>,
) -> anyhow::Result<serde_json::Value> {
    let identifier = identifier_for(email)?;
    let action = action.trim();
    if action.is_empty() {
        bail!("Action must not be empty");
    }

    let (limiter, store) = match database_url {
        Some(url) => {
            let db = Database::connect(url)
                .await
                .context("Failed to connect to database")?;
            db.migrate().await.context("Failed to run migrations")?;
            (db.rate_limiter(), "postgres")
        }
        None => (RateLimiter::in_memory(), "memory"),
    };

    let decision = limiter.check(&identifier, action, &config.rate_limit).await;
    let report = LimitReport {
        identifier,
        action: action.to_string(),
        store,
        decision,
    };
    Ok(serde_json::to_value(report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config() -> AppConfig {
        AppConfig::from_lookup(|_| None).unwrap()
    }

    #[test]
    fn test_cli_parses_extract_with_traits() {
        let cli = Cli::try_parse_from([
            "nomee", "extract", "--text", "Calm and strategic", "--trait", "Calm", "--trait",
            "Kind",
        ])
        .unwrap();
        match cli.command {
            Commands::Extract { text, traits } => {
                assert_eq!(text, "Calm and strategic");
                assert_eq!(traits, vec!["Calm", "Kind"]);
            }
            _ => panic!("expected extract"),
        }
    }

    #[test]
    fn test_cli_global_vocabulary_after_subcommand() {
        let cli = Cli::try_parse_from([
            "nomee",
            "highlight",
            "--text",
            "x",
            "--no-impact",
            "--vocabulary",
            "vocab.yaml",
        ])
        .unwrap();
        assert_eq!(cli.vocabulary, Some(PathBuf::from("vocab.yaml")));
        match cli.command {
            Commands::Highlight { max, no_impact, .. } => {
                assert_eq!(max, 8);
                assert!(no_impact);
            }
            _ => panic!("expected highlight"),
        }
    }

    #[test]
    fn test_cli_check_limit_default_action() {
        let cli = Cli::try_parse_from(["nomee", "check-limit", "--email", "a@b.co"]).unwrap();
        match cli.command {
            Commands::CheckLimit {
                action,
                database_url,
                ..
            } => {
                assert_eq!(action, "submit_contribution");
                assert!(database_url.is_none());
            }
            _ => panic!("expected check-limit"),
        }
    }

    #[test]
    fn test_cli_rejects_missing_text() {
        assert!(Cli::try_parse_from(["nomee", "extract"]).is_err());
    }

    #[test]
    fn test_highlight_uses_given_patterns() {
        let vocab = Vocabulary::default();
        let out = cmd_highlight(&vocab, "Deeply Strategic work", &["strategic".into()], 8, false)
            .unwrap();
        let segments = out["segments"].as_array().unwrap();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[1]["kind"], "highlight");
        assert_eq!(segments[1]["text"], "Strategic");
    }

    #[test]
    fn test_hash_email_normalizes() {
        let a = cmd_hash_email("  Person@Example.COM ").unwrap();
        let b = cmd_hash_email("person@example.com").unwrap();
        assert_eq!(a, b);
        assert!(cmd_hash_email("   ").is_err());
    }

    #[test]
    fn test_signals_accepts_bare_array() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"id": "00000000-0000-0000-0000-000000000001", "written_note": "Grew revenue fast", "trait_groups": ["Calm"], "relationship": "client"}},
                {{"id": "00000000-0000-0000-0000-000000000002", "written_note": "Calm lead", "trait_groups": ["Calm"]}},
                {{"id": "00000000-0000-0000-0000-000000000003", "written_note": "Calm again", "trait_groups": ["calm"]}}
            ]"#
        )
        .unwrap();

        let out = cmd_signals(&Vocabulary::default(), &config(), file.path()).unwrap();
        assert_eq!(out["sufficient"], true);
        assert_eq!(out["top_signals"][0]["label"], "Calm");
        assert_eq!(out["relationships"]["client"], 1);
        assert_eq!(out["relationships"]["other"], 2);
    }

    #[test]
    fn test_signals_respects_given_total() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"contributions": [{{"id": "00000000-0000-0000-0000-000000000001", "written_note": "ok"}}],
                "trait_signals": [{{"label": "Calm", "count": 1}}],
                "total_contributions": 2}}"#
        )
        .unwrap();

        let out = cmd_signals(&Vocabulary::default(), &config(), file.path()).unwrap();
        assert_eq!(out["sufficient"], false);
        assert_eq!(out["top_signals"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_check_limit_in_memory() {
        let out = cmd_check_limit(&config(), "a@b.co", "submit_contribution", None)
            .await
            .unwrap();
        assert_eq!(out["store"], "memory");
        assert_eq!(out["allowed"], true);
        assert_eq!(out["remaining"], 2);
        assert_eq!(out["degraded"], false);
    }
}
