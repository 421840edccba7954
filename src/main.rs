use clap::{Parser, Subcommand};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chat_mediator::application::messaging::CommandDispatcher;
use chat_mediator::infrastructure::adapters::console::ConsoleAdapter;
use chat_mediator::infrastructure::config::Config;
use chat_mediator::infrastructure::script::Script;
use chat_mediator::ChatServer;

#[derive(Parser)]
#[command(name = "chat-mediator")]
#[command(about = "A minimal multi-user chat mediator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a session script (built-in demo when no script is given)
    Run {
        /// YAML script file
        #[arg(short, long)]
        script: Option<PathBuf>,
    },
    /// Start an interactive console
    Console,
    /// Show version
    Version,
    /// Generate default config
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { script } => {
            let config = load_config(&cli.config);
            run_script(&config, script);
        }
        Commands::Console => {
            let config = load_config(&cli.config);
            run_console(&config);
        }
        Commands::Version => {
            println!("chat-mediator v{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::InitConfig { force } => {
            init_config(&cli.config, force);
        }
    }
}

fn load_config(path: &Path) -> Config {
    if !path.exists() {
        return Config::load_env().unwrap_or_else(|e| {
            tracing::warn!("Ignoring environment overrides: {}", e);
            Config::default()
        });
    }

    let mut config = Config::load(path).unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}, using defaults", e);
        Config::default()
    });
    if let Err(e) = config.apply_env(|key| std::env::var(key).ok()) {
        tracing::warn!("Ignoring environment overrides: {}", e);
    }
    config
}

fn build_dispatcher(config: &Config) -> CommandDispatcher {
    let server = ChatServer::new(&config.server.name)
        .with_duplicate_policy(config.registration.on_duplicate);
    tracing::info!("Starting chat server: {}", server.name());
    CommandDispatcher::new(&config.console.prefix, Arc::new(server))
}

fn run_script(config: &Config, path: Option<PathBuf>) {
    let script = match path {
        Some(path) => match Script::load(&path) {
            Ok(script) => script,
            Err(e) => {
                tracing::error!("Failed to load script {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => Script::demo(),
    };

    let dispatcher = build_dispatcher(config);
    let summary = script.run(&dispatcher, |_, result| match result {
        Ok(reply) => println!("{}\n", reply),
        Err(e) => eprintln!("error: {}\n", e),
    });

    if summary.failed > 0 {
        std::process::exit(2);
    }
}

fn run_console(config: &Config) {
    let dispatcher = build_dispatcher(config);
    println!("Type {}help for commands, quit to leave.", config.console.prefix);

    let console = ConsoleAdapter::new(dispatcher).with_prompt(&config.console.prompt);
    let stdin = io::stdin();
    if let Err(e) = console.run(stdin.lock(), io::stdout()) {
        tracing::error!("Console error: {}", e);
    }
}

fn init_config(path: &Path, force: bool) {
    if path.exists() && !force {
        eprintln!("{} already exists (use --force to overwrite)", path.display());
        return;
    }

    match Config::default().to_yaml() {
        Ok(yaml) => match fs::write(path, yaml) {
            Ok(()) => println!("Created {}", path.display()),
            Err(e) => eprintln!("Failed to write {}: {}", path.display(), e),
        },
        Err(e) => eprintln!("{}", e),
    }
}
