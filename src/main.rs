//! ollamastream - demo CLI entry point

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use ollamastream::{
    cli::{Args, Commands, Verbosity},
    ChatClient, ChatMessage, ClientConfig, ModelDirectory, StdoutSink,
};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbosity());

    let config = args.client_config()?;

    match &args.command {
        Commands::Chat { prompt, system, once } => {
            run_chat(&config, prompt, system.as_deref(), *once).await?
        }
        Commands::Json { prompt } => run_json(&config, prompt, args.verbosity()).await?,
        Commands::Models => run_models(&config).await?,
        Commands::Show { name } => run_show(&config, name).await?,
        Commands::Health => run_health(&config).await?,
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn init_tracing(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.log_filter()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run_chat(config: &ClientConfig, prompt: &str, system: Option<&str>, once: bool) -> Result<()> {
    let client = ChatClient::new(config.clone())?;

    let mut messages = Vec::new();
    if let Some(system) = system {
        messages.push(ChatMessage::system(system));
    }
    messages.push(ChatMessage::user(prompt));

    let mut sink = StdoutSink;
    let result = if once {
        client.chat(&messages, &mut sink).await?
    } else {
        client.stream_chat(&messages, &mut sink).await?
    };

    if result.succeeded {
        eprintln!("{}", "[Streaming Complete]".green());
    } else {
        eprintln!("{}", result.full_text.yellow());
    }
    Ok(())
}

async fn run_json(config: &ClientConfig, prompt: &str, verbosity: Verbosity) -> Result<()> {
    let client = ChatClient::new(config.clone())?;

    let spinner = ProgressBar::new_spinner();
    if verbosity.show_progress() {
        spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
        spinner.set_message("Model thinking...");
        spinner.enable_steady_tick(Duration::from_millis(100));
    }

    let value = client.chat_json(&[ChatMessage::user(prompt)]).await;
    spinner.finish_and_clear();

    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

async fn run_models(config: &ClientConfig) -> Result<()> {
    let directory = ModelDirectory::new(config)?;
    let models = directory.list_models().await;

    if models.is_empty() {
        println!("{}", "No models found (is `ollama serve` running?)".yellow());
        return Ok(());
    }

    for model in models {
        let marker = if model.name == config.model { "*".green() } else { " ".normal() };
        println!("{} {}", marker, model.name);
    }
    Ok(())
}

async fn run_show(config: &ClientConfig, name: &str) -> Result<()> {
    let directory = ModelDirectory::new(config)?;

    match directory.get_model_info(name).await? {
        Some(info) => {
            println!("{}", info.name.bold());
            println!("  Format:          {}", info.format);
            println!("  Parameter size:  {}", info.parameter_size);
            if info.supported_families.is_empty() {
                println!("  Families:        -");
            } else {
                println!("  Families:        {}", info.supported_families.join(", "));
            }
        }
        None => println!("{} model info unavailable for {}", "✗".red(), name),
    }
    Ok(())
}

async fn run_health(config: &ClientConfig) -> Result<()> {
    let client = ChatClient::new(config.clone())?;

    if client.health_check().await {
        println!("{} Ollama reachable at {}", "✓".green(), config.host);
    } else {
        println!("{} Ollama not reachable at {} (start with: ollama serve)", "✗".red(), config.host);
    }
    Ok(())
}
