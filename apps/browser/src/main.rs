use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    settings::load_settings_from, ui_channel, CharactersRepository, ClientSettings,
    DetailCoordinator, DetailOutcome, Dispatcher, FetchOutcome, HttpCharactersRepository,
    HttpImageFetcher, ImageLoader, ListCoordinator, UiQueue,
};
use shared::domain::CharacterId;
use tokio::runtime::Handle;
use tracing::info;
use url::Url;

mod views;

use views::{ConsoleDetailView, ConsoleListView};

#[derive(Parser, Debug)]
struct Args {
    /// Settings file; defaults to ./client.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    base_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Lists characters, optionally filtered by name.
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Shows one character with its first episode.
    Show { id: i64 },
    /// Downloads a character's avatar twice to exercise the cache.
    Avatar { id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => load_settings_from(path)?,
        None => client_core::load_settings(),
    };
    if let Some(base_url) = args.base_url {
        settings.api_base_url = base_url;
    }

    let repository: Arc<dyn CharactersRepository> =
        Arc::new(HttpCharactersRepository::new(&settings)?);
    let (ui, queue) = ui_channel();
    let dispatcher = Dispatcher::new(Handle::current(), ui);

    match args.command {
        Command::List { search, pages } => {
            list(&settings, repository, dispatcher, queue, search, pages).await
        }
        Command::Show { id } => show(repository, dispatcher, queue, CharacterId(id)).await,
        Command::Avatar { id } => {
            avatar(&settings, repository, dispatcher, queue, CharacterId(id)).await
        }
    }
}

async fn list(
    settings: &ClientSettings,
    repository: Arc<dyn CharactersRepository>,
    dispatcher: Dispatcher,
    mut queue: UiQueue,
    search: Option<String>,
    pages: u32,
) -> Result<()> {
    let coordinator =
        ListCoordinator::with_debounce(repository, dispatcher, settings.search_debounce());
    let view = Arc::new(ConsoleListView::default());
    coordinator.attach_view(&view);

    match search.as_deref() {
        Some(query) => coordinator.search(Some(query)),
        None => coordinator.setup_view(),
    };

    let mut loaded = 0;
    while queue.run_next().await {
        if coordinator.snapshot().is_fetching {
            continue;
        }
        if let Some(message) = view.take_error() {
            return Err(anyhow!(message));
        }
        loaded += 1;
        if loaded >= pages || coordinator.load_next_page() != FetchOutcome::Issued {
            break;
        }
    }

    let state = coordinator.snapshot();
    info!(
        characters = state.characters.len(),
        page = state.current_page,
        pages = state.total_pages,
        "listing done"
    );
    Ok(())
}

async fn show(
    repository: Arc<dyn CharactersRepository>,
    dispatcher: Dispatcher,
    mut queue: UiQueue,
    id: CharacterId,
) -> Result<()> {
    let character = repository
        .fetch_character_by_id(id)
        .await
        .with_context(|| format!("failed to load character {id}"))?;

    let coordinator = DetailCoordinator::new(character, repository, dispatcher);
    let view = Arc::new(ConsoleDetailView::default());
    coordinator.attach_view(&view);
    info!(
        id = %coordinator.character().id,
        episodes = coordinator.character().episode.len(),
        "showing character"
    );

    if coordinator.setup_view() == DetailOutcome::EnrichmentRequested {
        while !view.is_finished() && queue.run_next().await {}
    }

    match view.error() {
        Some(message) => Err(anyhow!(message)),
        None => Ok(()),
    }
}

async fn avatar(
    settings: &ClientSettings,
    repository: Arc<dyn CharactersRepository>,
    dispatcher: Dispatcher,
    mut queue: UiQueue,
    id: CharacterId,
) -> Result<()> {
    let character = repository
        .fetch_character_by_id(id)
        .await
        .with_context(|| format!("failed to load character {id}"))?;
    let url = Url::parse(&character.image)
        .with_context(|| format!("character {id} has no usable image url"))?;

    let http = reqwest::Client::builder()
        .timeout(settings.request_timeout())
        .user_agent(settings.user_agent.clone())
        .build()?;
    let loader = ImageLoader::new(Arc::new(HttpImageFetcher::new(http)), dispatcher);

    for attempt in 1..=2 {
        let (tx, rx) = tokio::sync::oneshot::channel();
        loader.load(url.clone(), move |image| {
            let _ = tx.send(image);
        });
        let image = tokio::select! {
            image = rx => image?,
            _ = async { while queue.run_next().await {} } => None,
        };
        match image {
            Some(image) => println!(
                "attempt {attempt}: {}x{} ({} cached)",
                image.width,
                image.height,
                loader.len()
            ),
            None => return Err(anyhow!("could not load avatar from {url}")),
        }
    }
    Ok(())
}
