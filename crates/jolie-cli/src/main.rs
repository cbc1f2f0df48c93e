// ============================================================================
// jolie-memory — CLI for Jolie's profile memory
// ============================================================================
// Usage:
//   jolie-memory get <id>                          Show a stored profile
//   jolie-memory create --identifier <id> [...]    Create a profile
//   jolie-memory update <id> [--skin-type ...]     Update profile fields
//   jolie-memory delete <id> --yes                 Delete a profile
//   jolie-memory health                            Check store connectivity
//   jolie-memory inspect "<message>"               Dry-run the chat pipeline
// ============================================================================

use anyhow::{anyhow, bail, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use jolie_core::prompt::profile_summary;
use jolie_core::{
    classify, extract_fields, normalize, JsonMap, MemoryStore, ProfileUpdate, PromptBuilder,
    StoreConfig, SupabaseStore, UserProfile,
};
use serde_json::{json, Value};

/// Jolie profile memory tool
#[derive(Parser)]
#[command(name = "jolie-memory", version, about = "Inspect and manage Jolie's profile memory")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the stored profile for an identifier
    Get { identifier: String },

    /// Create a new profile
    Create {
        /// User email
        #[arg(long)]
        identifier: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        skin_type: Option<String>,
        #[arg(long)]
        language: Option<String>,
    },

    /// Update fields of an existing profile
    Update {
        identifier: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        skin_type: Option<String>,
        #[arg(long)]
        language: Option<String>,
        /// Merged into preferences
        #[arg(long)]
        fragrance: Option<String>,
        /// Merged into preferences
        #[arg(long)]
        texture: Option<String>,
    },

    /// Delete a profile
    Delete {
        identifier: String,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },

    /// Check that the memory store is reachable
    Health,

    /// Show how a message would be handled, without any network calls
    Inspect { message: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { message } => cmd_inspect(&message),
        command => {
            let config = StoreConfig::from_env()?;
            let store = SupabaseStore::new(&config);
            run_store_command(&store, command).await
        }
    }
}

async fn run_store_command(store: &dyn MemoryStore, command: Commands) -> Result<()> {
    match command {
        Commands::Get { identifier } => {
            let profile = store
                .fetch(&identifier)
                .await?
                .ok_or_else(|| anyhow!("No profile for {}", identifier))?;
            print_json(&profile)
        }
        Commands::Create {
            identifier,
            name,
            skin_type,
            language,
        } => {
            let mut meta = JsonMap::new();
            meta.insert("source".to_string(), json!("cli"));
            let profile = UserProfile {
                name,
                skin_type,
                language,
                meta: Some(meta),
                timestamp: Some(Utc::now().to_rfc3339()),
                ..UserProfile::new(identifier)
            };
            let rows = store.create(&profile).await?;
            print_json(&rows)
        }
        Commands::Update {
            identifier,
            name,
            skin_type,
            language,
            fragrance,
            texture,
        } => {
            let mut update = ProfileUpdate {
                name,
                skin_type,
                language,
                ..ProfileUpdate::default()
            };

            if fragrance.is_some() || texture.is_some() {
                let existing = store
                    .fetch(&identifier)
                    .await?
                    .ok_or_else(|| anyhow!("No profile for {}", identifier))?;
                let mut preferences = existing.preferences.unwrap_or_default();
                if let Some(fragrance) = fragrance {
                    preferences.insert("fragrance".to_string(), Value::String(fragrance));
                }
                if let Some(texture) = texture {
                    preferences.insert("texture".to_string(), Value::String(texture));
                }
                update.preferences = Some(preferences);
            }

            if update.is_empty() {
                bail!("Nothing to update. Pass at least one field flag.");
            }

            let rows = store.update(&identifier, &update).await?;
            print_json(&rows)
        }
        Commands::Delete { identifier, yes } => {
            if !yes {
                bail!("Refusing to delete {} without --yes", identifier);
            }
            store.delete(&identifier).await?;
            println!("Memory for {} deleted", identifier);
            Ok(())
        }
        Commands::Health => {
            store.health_check().await?;
            println!("Memory store reachable");
            Ok(())
        }
        Commands::Inspect { message } => cmd_inspect(&message),
    }
}

fn cmd_inspect(message: &str) -> Result<()> {
    let normalized = normalize(message);
    let extracted = extract_fields(&normalized.cleaned);
    let intent = classify(&normalized.lowered);

    // A profile built from this message alone, to preview the summary clause
    let preview = extracted.to_profile("preview");
    let prompt = PromptBuilder::default().build(intent, Some(&preview), &normalized.lowered);

    print_json(&json!({
        "cleaned": normalized.cleaned,
        "lowered": normalized.lowered,
        "extracted": extracted,
        "intent": intent,
        "profile_summary": profile_summary(&preview),
        "messages": prompt,
    }))
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
