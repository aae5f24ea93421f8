//! Binary entrypoint for the ranvale player administration CLI.
//!
//! Commands:
//! - `init` - write a starter `config.toml` and create the player store
//! - `create <name> [--account <acct>]` - create a character (prompts for a password)
//! - `list` - list stored characters
//! - `show <name>` - print a character record as JSON
//! - `train <name> --skill <id> --level <n> [--cost <c>] [--duration-ms <ms>]` - queue training and start the clock
//! - `check-training <name>` - apply whatever queued training has completed
//! - `delete <name>` - remove a character
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::info;

use ranvale::config::Config;
use ranvale::entity::notice::CollectingSink;
use ranvale::entity::{PlayerEntity, PlayerStore, SkillId, TrainingSession};

#[derive(Parser)]
#[command(name = "ranvale")]
#[command(about = "Player state administration for the Ranvale world")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration and create the player store
    Init,
    /// Create a new character
    Create {
        name: String,
        /// Owning account; defaults to the character name
        #[arg(short, long)]
        account: Option<String>,
        /// Skip the password prompt
        #[arg(long)]
        no_password: bool,
    },
    /// List stored characters
    List,
    /// Print a character record as JSON
    Show { name: String },
    /// Queue a training session and start accruing time
    Train {
        name: String,
        #[arg(short, long)]
        skill: String,
        #[arg(short, long)]
        level: u32,
        #[arg(long, default_value_t = 1)]
        cost: i64,
        #[arg(long, default_value_t = 60_000)]
        duration_ms: u64,
    },
    /// Apply completed training
    CheckTraining { name: String },
    /// Delete a character
    Delete { name: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init = cli.command {
        init_logging(&None, cli.verbose);
        Config::create_default(&cli.config).await?;
        info!("Configuration file created at {}", cli.config);
        let cfg = Config::load(&cli.config).await?;
        let path = cfg.storage.players_path();
        PlayerStore::open(&path)?;
        info!("Player store ready at {}", path.display());
        return Ok(());
    }

    let config = Config::load(&cli.config).await?;
    init_logging(&Some(config.clone()), cli.verbose);
    let store = PlayerStore::open(config.storage.players_path())?;

    match cli.command {
        Commands::Init => {}
        Commands::Create {
            name,
            account,
            no_password,
        } => {
            if store.player_exists(&name)? {
                return Err(anyhow!("A character named {} already exists", name));
            }
            let account = account.unwrap_or_else(|| name.clone());
            let mut player = PlayerEntity::new(&name, &account);
            if let Some(vnum) = config.player.starting_location {
                player.set_location(vnum);
            }
            if let Some(locale) = &config.player.locale {
                player.set_locale(locale);
            }
            if !no_password {
                let password = prompt_new_password()?;
                player.set_password_with(&config.password_hasher()?, &password)?;
            }
            player.save(&store)?;
            println!("Created {}.", name);
        }
        Commands::List => {
            let mut ids = store.list_player_ids()?;
            ids.sort();
            for id in ids {
                println!("{}", id);
            }
        }
        Commands::Show { name } => {
            let player = PlayerEntity::load(&store, &name)?;
            let value: serde_json::Value = serde_json::from_str(&player.stringify()?)?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        Commands::Train {
            name,
            skill,
            level,
            cost,
            duration_ms,
        } => {
            let id: SkillId = skill.parse()?;
            let mut player = PlayerEntity::load(&store, &name)?;
            player.queue_training(TrainingSession::new(id, cost, level, duration_ms));
            player.begin_training();
            player.save(&store)?;
            println!(
                "{} begins training {} toward level {}.",
                player.name(),
                id,
                level
            );
        }
        Commands::CheckTraining { name } => {
            let mut player = PlayerEntity::load(&store, &name)?;
            if player.check_training().is_none() {
                println!("Nothing to apply.");
            }
            let mut sink = CollectingSink::default();
            player.flush(&mut sink);
            for notice in sink.player {
                println!("{}", notice.text);
            }
            player.save(&store)?;
        }
        Commands::Delete { name } => {
            if store.delete_player(&name)? {
                println!("Deleted {}.", name);
            } else {
                println!("No character named {}.", name);
            }
        }
    }

    Ok(())
}

fn prompt_new_password() -> Result<String> {
    let pass1 = rpassword::prompt_password("New password: ")?;
    if pass1.len() < 8 {
        return Err(anyhow!("password too short (min 8)"));
    }
    if pass1.len() > 128 {
        return Err(anyhow!("password too long"));
    }
    let pass2 = rpassword::prompt_password("Confirm password: ")?;
    if pass1 != pass2 {
        return Err(anyhow!("passwords do not match"));
    }
    Ok(pass1)
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .and_then(|c| c.logging.level.parse().ok())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|c| c.logging.file.as_ref())
        .and_then(|file| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(file)
                .ok()
        });

    match log_file {
        Some(f) => {
            let file = std::sync::Mutex::new(f);
            // Echo to the console only when attached to a terminal.
            let is_tty = atty::is(atty::Stream::Stderr);
            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());
                if let Ok(mut guard) = file.lock() {
                    let _ = writeln!(guard, "{}", line);
                }
                if is_tty {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
        }
        None => {
            builder.format(|fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
            });
        }
    }
    let _ = builder.try_init();
}
