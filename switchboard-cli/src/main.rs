use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use switchboard_core::config::Config;
use switchboard_core::{format_prompt, Message, ProviderRegistry, RouteRequest, Router, Server};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "switchboard")]
#[command(about = "Route chat requests to LLM providers", long_about = None)]
#[command(version)]
struct Cli {
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Start the HTTP server")]
    Serve {
        #[arg(long, help = "Override server.host")]
        host: Option<String>,

        #[arg(long, help = "Override server.port")]
        port: Option<u16>,
    },

    #[command(about = "Show current configuration")]
    Show,

    #[command(about = "List registered providers")]
    Providers,

    #[command(about = "Default model commands")]
    Model {
        #[command(subcommand)]
        command: ModelCommands,
    },

    #[command(about = "Send one request through the router and print the response")]
    Route {
        #[arg(short, long, help = "Provider name (defaults to defaults.provider)")]
        provider: Option<String>,

        #[arg(short, long, help = "Model id (defaults to defaults.model)")]
        model: Option<String>,

        #[arg(short, long, help = "System message placed before the prompt")]
        system: Option<String>,

        #[arg(long)]
        max_tokens: Option<u32>,

        #[arg(long)]
        temperature: Option<f64>,

        #[arg(long, help = "Print the flattened prompt instead of calling the provider")]
        dry_run: bool,

        #[arg(help = "User message")]
        prompt: String,
    },
}

#[derive(Subcommand)]
enum ModelCommands {
    #[command(about = "Show the default model")]
    Show,

    #[command(about = "Set the default model")]
    Set {
        #[arg(help = "Model id (e.g., 'anthropic.claude-v2' or 'anthropic.claude-instant-v1')")]
        model: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port } => serve(&cli.config, host, port).await,
        Commands::Show => show_config(&cli.config),
        Commands::Providers => list_providers(&cli.config),
        Commands::Model { command } => match command {
            ModelCommands::Show => show_model(&cli.config),
            ModelCommands::Set { model } => set_model(&cli.config, &model),
        },
        Commands::Route {
            provider,
            model,
            system,
            max_tokens,
            temperature,
            dry_run,
            prompt,
        } => {
            let config = load_config(&cli.config)?;
            let mut messages = Vec::new();
            if let Some(system) = system {
                messages.push(Message::system(system));
            }
            messages.push(Message::user(prompt));

            let mut params = config.defaults.params();
            if let Some(max_tokens) = max_tokens {
                params = params.with_max_tokens(max_tokens);
            }
            if let Some(temperature) = temperature {
                params = params.with_temperature(temperature);
            }

            let request = RouteRequest {
                provider: provider
                    .unwrap_or_else(|| config.defaults.provider.clone())
                    .to_lowercase(),
                model: model.unwrap_or_else(|| config.defaults.model.clone()),
                messages,
                params,
            };

            if dry_run {
                print_dry_run(&request);
                Ok(())
            } else {
                route_once(&config, &request).await
            }
        }
    }
}

/// Reads the config file when present; a missing file means defaults.
fn load_config(config_path: &Path) -> Result<Config> {
    if config_path.exists() {
        Config::load(config_path).context("Failed to load config")
    } else {
        Ok(Config::default())
    }
}

async fn serve(config_path: &Path, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let server = Server::new(config).context("Failed to build providers")?;
    server.start().await.context("Server failed")?;
    Ok(())
}

fn show_config(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;

    println!("{}", "Current Configuration:".bold().green());
    println!();
    println!("{}", "Server:".bold());
    println!("  Address:        {}:{}", config.server.host, config.server.port);
    println!("  Strict Status:  {}", config.server.strict_status);
    println!();
    println!("{}", "Defaults:".bold());
    println!("  Provider:       {}", config.defaults.provider.cyan());
    println!("  Model:          {}", config.defaults.model.cyan());
    println!("  Max Tokens:     {}", config.defaults.max_tokens);
    println!("  Temperature:    {}", config.defaults.temperature);
    println!("  Stream:         {}", config.defaults.stream);
    println!();
    println!("{}", "Bedrock:".bold());
    println!(
        "  Region:         {}",
        config.bedrock.region.as_deref().unwrap_or("(environment)")
    );
    println!(
        "  Endpoint:       {}",
        config.bedrock.endpoint.as_deref().unwrap_or("(default)")
    );
    println!("  Credentials:    {}", credential_source(&config));

    Ok(())
}

fn credential_source(config: &Config) -> &'static str {
    let bedrock = &config.bedrock;
    if bedrock.bearer_token.is_some() {
        "bearer token (config)"
    } else if bedrock.access_key_id.is_some() && bedrock.secret_access_key.is_some() {
        "access key (config)"
    } else {
        "environment"
    }
}

fn list_providers(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let registry = ProviderRegistry::from_config(&config).context("Failed to build providers")?;

    println!("{}", "Registered providers:".bold().green());
    println!();
    for name in registry.names() {
        let marker = if name == config.defaults.provider {
            " (default)".dimmed().to_string()
        } else {
            String::new()
        };
        println!("  {} {}{}", "•".cyan(), name.bold(), marker);
    }

    Ok(())
}

fn show_model(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    println!("{}: {}", "Default model".bold(), config.defaults.model.cyan());
    Ok(())
}

fn set_model(config_path: &Path, model: &str) -> Result<()> {
    let content = match std::fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e).context("Failed to read config file"),
    };
    let updated = with_default_model(&content, model)?;

    std::fs::write(config_path, updated).context("Failed to write config file")?;

    println!("{} Default model updated to: {}", "✓".green().bold(), model.cyan());
    Ok(())
}

/// Returns `content` with `defaults.model` set to `model`, keeping every
/// other key as written.
fn with_default_model(content: &str, model: &str) -> Result<String> {
    let mut config: serde_yaml::Value = if content.trim().is_empty() {
        serde_yaml::Value::Mapping(serde_yaml::Mapping::new())
    } else {
        serde_yaml::from_str(content).context("Failed to parse config")?
    };

    let root = config
        .as_mapping_mut()
        .context("Config root must be a mapping")?;
    if root.get("defaults").is_none() {
        root.insert(
            serde_yaml::Value::String("defaults".to_string()),
            serde_yaml::Value::Mapping(serde_yaml::Mapping::new()),
        );
    }

    let defaults = config
        .get_mut("defaults")
        .and_then(|v| v.as_mapping_mut())
        .context("`defaults` must be a mapping")?;
    defaults.insert(
        serde_yaml::Value::String("model".to_string()),
        serde_yaml::Value::String(model.to_string()),
    );

    serde_yaml::to_string(&config).context("Failed to serialize config")
}

fn print_dry_run(request: &RouteRequest) {
    println!("{} {} / {}", "→".blue(), request.provider.bold(), request.model.cyan());
    println!(
        "  max_tokens={} temperature={} stream={}",
        request.params.max_tokens, request.params.temperature, request.params.stream
    );
    println!();
    println!("{:?}", format_prompt(&request.messages));
}

async fn route_once(config: &Config, request: &RouteRequest) -> Result<()> {
    let registry = ProviderRegistry::from_config(config).context("Failed to build providers")?;
    let router = Router::new(Arc::new(registry));

    println!(
        "{} Routing to {} ({})...",
        "→".blue(),
        request.provider.bold(),
        request.model.cyan()
    );

    let payload = router
        .route(request)
        .await
        .with_context(|| format!("Request to '{}' failed", request.provider))?;

    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("Failed to render response")?
    );
    Ok(())
}
