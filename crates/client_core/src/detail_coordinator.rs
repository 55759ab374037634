use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, PoisonError,
};

use shared::domain::Character;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    display::{DetailDisplay, ViewHandle},
    projection::DetailProjection,
    repository::CharactersRepository,
    ui::Dispatcher,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailOutcome {
    /// The first episode is being fetched; loading ends when it resolves.
    EnrichmentRequested,
    /// Nothing to enrich with; loading already ended.
    NoEnrichment,
    AlreadySetUp,
}

pub struct DetailCoordinator {
    character: Character,
    repository: Arc<dyn CharactersRepository>,
    dispatcher: Dispatcher,
    view: Mutex<ViewHandle<dyn DetailDisplay>>,
    started: AtomicBool,
}

impl DetailCoordinator {
    pub fn new(
        character: Character,
        repository: Arc<dyn CharactersRepository>,
        dispatcher: Dispatcher,
    ) -> Arc<Self> {
        Arc::new(Self {
            character,
            repository,
            dispatcher,
            view: Mutex::new(ViewHandle::detached()),
            started: AtomicBool::new(false),
        })
    }

    pub fn character(&self) -> &Character {
        &self.character
    }

    pub fn attach_view<V: DetailDisplay + 'static>(&self, view: &Arc<V>) {
        let view: Arc<dyn DetailDisplay> = view.clone();
        *self.view.lock().unwrap_or_else(PoisonError::into_inner) = ViewHandle::attach(&view);
    }

    pub fn setup_view(&self) -> DetailOutcome {
        if self.started.swap(true, Ordering::SeqCst) {
            return DetailOutcome::AlreadySetUp;
        }

        let view = self
            .view
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        view.with(|view| view.set_loading(true));
        view.with(|view| view.setup_view());

        let base = DetailProjection::base(&self.character);
        view.with(|view| view.display_projection(&base));

        let Some(episode_url) = self
            .character
            .first_episode_url()
            .and_then(|raw| Url::parse(raw).ok())
        else {
            debug!(character = %self.character.id, "no episode to enrich detail with");
            view.with(|view| view.set_loading(false));
            return DetailOutcome::NoEnrichment;
        };

        info!(character = %self.character.id, url = %episode_url, "fetching first episode");
        let repository = Arc::clone(&self.repository);
        let dispatcher = self.dispatcher.clone();
        let character_id = self.character.id;
        self.dispatcher.spawn(async move {
            let result = repository.fetch_episode(&episode_url).await;
            dispatcher.post(move || {
                match result {
                    Ok(episode) => {
                        let enriched = base.with_first_episode(&episode);
                        view.with(|view| view.display_projection(&enriched));
                    }
                    Err(err) => {
                        warn!(character = %character_id, error = %err, "first episode fetch failed");
                        view.with(|view| view.display_error(&err.to_string()));
                    }
                }
                view.with(|view| view.set_loading(false));
            });
        });

        DetailOutcome::EnrichmentRequested
    }
}

#[cfg(test)]
#[path = "tests/detail_coordinator_tests.rs"]
mod tests;
