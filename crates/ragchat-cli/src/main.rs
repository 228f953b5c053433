//! `ragchat` - terminal client for a retrieval-augmented chat backend.

mod chat;
mod command;

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use ragchat_core::config::ClientConfig;
use ragchat_core::event_bus::EventBus;
use ragchat_core::paths::default_config_dir;
use ragchat_core::remote::{resolve_bot, BotRegistry, HttpRemoteService};
use ragchat_core::session::{SessionKey, SessionStore};
use ragchat_core::storage::FileStorage;
use ragchat_core::ConversationController;

#[derive(Parser)]
#[command(name = "ragchat")]
#[command(about = "Chat with retrieval-augmented bots and feed them sources", long_about = None)]
struct Cli {
    /// Directory holding config.json and chat storage (default: ~/.config/ragchat)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Backend URL (overrides config)
    #[arg(long, global = true)]
    server_url: Option<String>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List, create or delete bots (lists when no action is given)
    Bots {
        #[command(subcommand)]
        action: Option<BotsAction>,
    },
    /// Print the saved transcript of a bot
    History {
        #[arg(long)]
        bot: String,
    },
    /// Delete every saved transcript
    Purge,
    /// Chat with a bot interactively
    Chat {
        #[arg(long)]
        bot: String,
    },
}

#[derive(Subcommand)]
enum BotsAction {
    /// List the bots the backend knows about
    List,
    /// Register a new bot and print its slug
    Create { name: String },
    /// Remove a bot by slug
    Delete { slug: String },
}

/// Everything a subcommand needs, resolved from flags and config.
struct Context {
    config: ClientConfig,
    store: Arc<SessionStore>,
    remote: Arc<HttpRemoteService>,
}

impl Context {
    fn load(cli: &Cli) -> Result<Self, Box<dyn Error>> {
        let config_dir = match &cli.config_dir {
            Some(dir) => dir.clone(),
            None => default_config_dir()?,
        };

        let mut config = ClientConfig::load(&config_dir)?;
        if let Some(url) = &cli.server_url {
            config.server_url = url.clone();
        }

        let storage = FileStorage::new(config.storage_dir(&config_dir));
        log::debug!("Chat storage at {}", storage.dir().display());

        let store = Arc::new(SessionStore::new(Arc::new(storage)));
        let remote = Arc::new(HttpRemoteService::new(
            config.server_url.clone(),
            config.request_timeout(),
        ));

        Ok(Self {
            config,
            store,
            remote,
        })
    }

    /// Display name for `slug`, falling back to the slug itself when the
    /// registry is unreachable or does not know the bot.
    async fn bot_name(&self, slug: &str) -> String {
        match resolve_bot(self.remote.as_ref(), slug).await {
            Ok(Some(bot)) => bot.name,
            Ok(None) => slug.to_string(),
            Err(e) => {
                log::warn!("Could not resolve bot {slug}: {e}");
                slug.to_string()
            }
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let ctx = Context::load(&cli)?;

    match cli.command {
        Commands::Bots { action } => match action.unwrap_or(BotsAction::List) {
            BotsAction::List => {
                let bots = ctx.remote.list().await?;
                if bots.is_empty() {
                    println!("No bots registered at {}", ctx.remote.base_url());
                }
                for bot in bots {
                    println!("{:<24} {}", bot.slug, bot.name);
                }
            }
            BotsAction::Create { name } => {
                if name.trim().is_empty() {
                    return Err("Bot name cannot be empty".into());
                }
                let bot = ctx.remote.create(&name).await?;
                println!("Created {} (chat with: ragchat chat --bot {})", bot.name, bot.slug);
            }
            BotsAction::Delete { slug } => {
                ctx.remote.delete(&slug).await?;
                println!("Deleted {slug}");
            }
        },
        Commands::History { bot } => {
            let key = SessionKey::app(bot.as_str());
            let transcript = ctx.store.open(&key);
            chat::print_transcript(&transcript, &bot);
        }
        Commands::Purge => {
            ctx.store.purge_all()?;
            println!("All chats purged.");
        }
        Commands::Chat { bot } => {
            let key = SessionKey::app(bot.as_str());
            let name = ctx.bot_name(&bot).await;
            let controller = ConversationController::new(
                key.clone(),
                ctx.store.clone(),
                ctx.remote.clone(),
                ctx.config.model_config(key.kind()),
                Arc::new(EventBus::new()),
            );

            chat::run(&controller, &name).await?;
            controller.close();
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn bots_without_action_lists() {
        let cli = Cli::try_parse_from(["ragchat", "bots"]).unwrap();
        assert!(matches!(cli.command, Commands::Bots { action: None }));
    }

    #[test]
    fn bots_create_takes_name() {
        let cli = Cli::try_parse_from(["ragchat", "bots", "create", "Support Bot"]).unwrap();
        let Commands::Bots {
            action: Some(BotsAction::Create { name }),
        } = cli.command
        else {
            panic!("expected bots create");
        };
        assert_eq!(name, "Support Bot");
    }

    #[test]
    fn bots_delete_takes_slug_and_global_flags() {
        let cli = Cli::try_parse_from([
            "ragchat",
            "bots",
            "delete",
            "support_bot",
            "--server-url",
            "http://bots:9000",
        ])
        .unwrap();
        assert_eq!(cli.server_url.as_deref(), Some("http://bots:9000"));
        assert!(matches!(
            cli.command,
            Commands::Bots {
                action: Some(BotsAction::Delete { ref slug })
            } if slug == "support_bot"
        ));
    }
}
