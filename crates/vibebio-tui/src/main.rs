use std::fs::OpenOptions;
use std::io::Write;

use anyhow::{bail, Result};
use clap::Parser;
use tokio::sync::mpsc;
use vibebio_core::{
    spawn_generation, Backend, Config, GenerationEvent, Provider, Session, StreamUpdate,
    SuggestionFormat, Vibe,
};

mod app;
mod clipboard;
mod handler;
mod notification;
mod tui;
mod ui;

use app::App;
use clipboard::TerminalClipboard;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "vibebio")]
#[command(version, about = "Generate social media bios in your terminal, streamed from an LLM")]
struct Cli {
    /// Backend to use: endpoint, ollama or openai
    #[arg(short, long)]
    provider: Option<String>,
    /// Model for the ollama and openai backends
    #[arg(short, long)]
    model: Option<String>,
    /// URL of the bio endpoint
    #[arg(short, long)]
    endpoint: Option<String>,
    /// Starting vibe: professional, casual or funny
    #[arg(short, long)]
    vibe: Option<String>,
    /// How replies are split into cards: marker or numbered
    #[arg(short, long)]
    format: Option<String>,
    /// Generate once for BIO, print the result and exit
    #[arg(long, value_name = "BIO")]
    print: Option<String>,
}

impl Cli {
    /// Fold command-line overrides into the loaded config
    fn apply(&self, config: &mut Config) -> Result<()> {
        if let Some(provider) = &self.provider {
            match Provider::from_str(provider) {
                Some(p) => config.switch_provider(p),
                None => bail!("Unknown provider '{}'", provider),
            }
        }
        if let Some(model) = &self.model {
            config.default_model = Some(model.clone());
        }
        if let Some(endpoint) = &self.endpoint {
            config.endpoint_url = Some(endpoint.clone());
        }
        if let Some(vibe) = &self.vibe {
            match Vibe::from_str(vibe) {
                Some(v) => config.default_vibe = Some(v),
                None => bail!("Unknown vibe '{}'", vibe),
            }
        }
        if let Some(format) = &self.format {
            match SuggestionFormat::from_str(format) {
                Some(f) => config.suggestion_format = Some(f),
                None => bail!("Unknown format '{}'", format),
            }
        }
        Ok(())
    }
}

fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("warn");
    let mut builder = env_logger::Builder::from_env(env);

    // The terminal belongs to the UI, so logs go to a file when possible
    let file = Config::config_dir().ok().and_then(|dir| {
        std::fs::create_dir_all(&dir).ok()?;
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("vibebio.log"))
            .ok()
    });
    match file {
        Some(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        None => {
            builder.filter_level(log::LevelFilter::Off);
        }
    }
    builder.init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let mut config = Config::load().unwrap_or_else(|e| {
        log::warn!("Using default config: {}", e);
        Config::new()
    });
    cli.apply(&mut config)?;

    match &cli.print {
        Some(bio) => print_bios(&config, bio).await,
        None => run_tui(config).await,
    }
}

/// Stream one generation to stdout, then list the cards
async fn print_bios(config: &Config, bio: &str) -> Result<()> {
    let provider = config.provider();
    let backend = Backend::from_config(config, provider, &config.model_for(provider))?;

    let mut session = Session::new(config.default_vibe());
    session.update_input(bio);
    let Some(request) = session.submit() else {
        bail!("A request is already in flight");
    };

    let (tx, mut rx) = mpsc::unbounded_channel::<GenerationEvent>();
    let task = spawn_generation(backend, request, move |event| tx.send(event).is_ok());

    let mut stdout = std::io::stdout();
    while let Some(event) = rx.recv().await {
        let text = match &event {
            GenerationEvent::Chunk { text, .. } => Some(text.clone()),
            _ => None,
        };
        match session.apply(event) {
            StreamUpdate::FirstChunk | StreamUpdate::Chunk => {
                if let Some(text) = text {
                    write!(stdout, "{}", text)?;
                    stdout.flush()?;
                }
            }
            StreamUpdate::Completed => break,
            StreamUpdate::Failed(error) => {
                task.await?;
                bail!("Generation failed: {}", error);
            }
            StreamUpdate::Ignored => {}
        }
    }
    task.await?;
    writeln!(stdout)?;

    for (i, card) in session.cards(config.suggestion_format()).iter().enumerate() {
        writeln!(stdout, "\n[{}] {}", i + 1, card)?;
    }
    Ok(())
}

async fn run_tui(config: Config) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let mut events = EventHandler::new();
    let clipboard = TerminalClipboard::new(config.clipboard_backend());
    let mut app = App::new(config, Box::new(clipboard), Some(events.sender()));

    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    app.cancel_generation();
    tui::restore()?;
    result
}

async fn run_loop(terminal: &mut tui::Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }
    Ok(())
}
