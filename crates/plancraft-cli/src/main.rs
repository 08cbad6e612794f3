mod config;
mod generate_cmd;
mod plan_cmds;
#[cfg(test)]
mod test_util;

use clap::{CommandFactory, Parser, Subcommand};
use uuid::Uuid;

use plancraft_core::llm::LlmProvider;
use plancraft_db::models::PlanKind;
use plancraft_db::pool;

use config::PlancraftConfig;
use generate_cmd::GenerateArgs;

#[derive(Parser)]
#[command(name = "plancraft", about = "Generate and track AI-drafted learning and goal plans")]
struct Cli {
    /// Database URL (overrides PLANCRAFT_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a plancraft config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/plancraft")]
        db_url: String,
        /// Generation service: openai or gemini
        #[arg(long, default_value = "openai")]
        provider: LlmProvider,
        /// Model id (defaults to the provider's default model)
        #[arg(long)]
        model: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Initialize the plancraft database (requires config file or env vars)
    DbInit,
    /// Generate a plan for a goal and store it
    Generate {
        /// What you want to learn or achieve
        goal: String,
        /// Plan shape: skills (learning path) or tasks (goal breakdown)
        #[arg(long, default_value = "skills")]
        variant: PlanKind,
        /// Number of skills to ask for (skills plans only, 3-20)
        #[arg(long)]
        count: Option<u32>,
        /// Extra background for the generator
        #[arg(long)]
        context: Option<String>,
        /// Owner of the new plan (defaults to the configured owner)
        #[arg(long)]
        owner: Option<Uuid>,
        /// Print the generated plan without storing it
        #[arg(long)]
        dry_run: bool,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Plan management
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Print shell completions
    Completions {
        /// Target shell
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Show plan details (or list the owner's plans)
    Show {
        /// Plan ID to show (omit to list all)
        plan_id: Option<String>,
        /// Owner to act as (defaults to the configured owner)
        #[arg(long)]
        owner: Option<Uuid>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Delete a plan and everything in it
    Delete {
        /// Plan ID to delete
        plan_id: String,
        /// Owner to act as (defaults to the configured owner)
        #[arg(long)]
        owner: Option<Uuid>,
    },
    /// Mark an item done, or not done if it already is
    Toggle {
        /// Item ID to toggle
        item_id: String,
        /// Owner to act as (defaults to the configured owner)
        #[arg(long)]
        owner: Option<Uuid>,
    },
}

/// Execute the `plancraft init` command: write config file.
fn cmd_init(db_url: &str, provider: LlmProvider, model: Option<String>, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let owner_id = Uuid::new_v4();
    let model = model.unwrap_or_else(|| provider.default_model().to_string());

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        llm: config::LlmSection {
            provider: Some(provider),
            model: Some(model.clone()),
            ..Default::default()
        },
        owner: config::OwnerSection { id: owner_id },
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!("  llm.provider = {provider}");
    println!("  llm.model    = {model}");
    println!("  owner.id     = {owner_id}");
    println!();
    println!(
        "Set {} (or {}) to your API key.",
        config::API_KEY_ENV_VAR,
        provider.api_key_env_var()
    );
    println!("Next: run `plancraft db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `plancraft db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = PlancraftConfig::resolve(cli_db_url)?;

    println!("Initializing plancraft database...");

    pool::ensure_database_exists(&resolved.db_config).await?;
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    pool::run_migrations(&db_pool).await?;

    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }

    db_pool.close().await;

    println!("plancraft db-init complete.");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            db_url,
            provider,
            model,
            force,
        } => {
            cmd_init(&db_url, provider, model, force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.database_url.as_deref()).await?;
        }
        Commands::Generate {
            goal,
            variant,
            count,
            context,
            owner,
            dry_run,
            json,
        } => {
            let resolved = PlancraftConfig::resolve(cli.database_url.as_deref())?;
            let args = GenerateArgs {
                goal,
                kind: variant,
                count,
                context,
                owner,
                dry_run,
                json,
            };
            if let Err(e) = generate_cmd::run_generate(args, &resolved).await {
                eprintln!("{}", generate_cmd::user_message(&e));
                std::process::exit(generate_cmd::exit_code(&e));
            }
        }
        Commands::Plan { command } => {
            let resolved = PlancraftConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = plan_cmds::run_plan_command(command, &db_pool, &resolved).await;
            db_pool.close().await;
            result?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "plancraft", &mut std::io::stdout());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generate_parses_variant_and_flags() {
        let cli = Cli::try_parse_from([
            "plancraft",
            "generate",
            "Run a marathon",
            "--variant",
            "tasks",
            "--context",
            "I run 5k today",
            "--dry-run",
        ])
        .unwrap();

        match cli.command {
            Commands::Generate {
                goal,
                variant,
                count,
                context,
                dry_run,
                json,
                ..
            } => {
                assert_eq!(goal, "Run a marathon");
                assert_eq!(variant, PlanKind::Tasks);
                assert_eq!(count, None);
                assert_eq!(context.as_deref(), Some("I run 5k today"));
                assert!(dry_run);
                assert!(!json);
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn unknown_variant_is_rejected() {
        let result = Cli::try_parse_from(["plancraft", "generate", "x", "--variant", "goals"]);
        assert!(result.is_err());
    }

    #[test]
    fn plan_toggle_takes_owner() {
        let owner = Uuid::new_v4().to_string();
        let cli = Cli::try_parse_from([
            "plancraft",
            "--database-url",
            "postgresql://h/db",
            "plan",
            "toggle",
            "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "--owner",
            &owner,
        ])
        .unwrap();

        assert_eq!(cli.database_url.as_deref(), Some("postgresql://h/db"));
        match cli.command {
            Commands::Plan {
                command: PlanCommands::Toggle { owner: parsed, .. },
            } => assert_eq!(parsed.map(|u| u.to_string()), Some(owner)),
            _ => panic!("expected plan toggle"),
        }
    }
}
