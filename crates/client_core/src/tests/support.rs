use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use shared::{
    domain::{
        Character, CharacterId, CharacterStatus, Episode, EpisodeId, Location, LocationRef, Page,
        PageInfo,
    },
    error::RepositoryError,
};
use tokio::sync::{mpsc, oneshot};
use url::Url;

use crate::repository::{CharactersRepository, RepositoryResult};

pub fn make_character(id: i64, episodes: &[&str], kind: &str) -> Character {
    Character {
        id: CharacterId(id),
        name: format!("Rick Sanchez {id}"),
        status: CharacterStatus::Alive,
        species: "Human".into(),
        kind: kind.into(),
        gender: "Male".into(),
        origin: LocationRef {
            name: "Earth (C-137)".into(),
            url: "https://example.com/api/location/1".into(),
        },
        location: LocationRef {
            name: "Citadel of Ricks".into(),
            url: "https://example.com/api/location/3".into(),
        },
        image: format!("https://example.com/api/character/avatar/{id}.jpeg"),
        episode: episodes.iter().map(|e| e.to_string()).collect(),
        url: format!("https://example.com/api/character/{id}"),
        created: Utc.with_ymd_and_hms(2017, 11, 4, 18, 48, 46).unwrap(),
    }
}

pub fn make_episode(code: &str, name: &str) -> Episode {
    Episode {
        id: EpisodeId(1),
        name: name.into(),
        air_date: "December 2, 2013".into(),
        episode: code.into(),
        characters: Vec::new(),
        url: "https://example.com/api/episode/1".into(),
        created: Utc.with_ymd_and_hms(2017, 11, 10, 12, 56, 33).unwrap(),
    }
}

pub fn make_page(first_id: i64, count: usize, pages: u32) -> Page<Character> {
    Page {
        info: PageInfo {
            count: pages * count as u32,
            pages,
            next: None,
            prev: None,
        },
        results: (0..count as i64)
            .map(|offset| make_character(first_id + offset, &[], ""))
            .collect(),
    }
}

/// Recorded `list_characters` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListCall {
    pub page: Option<u32>,
    pub name: Option<String>,
}

type PendingList = (ListCall, oneshot::Sender<RepositoryResult<Page<Character>>>);

/// Repository whose `list_characters` calls block until the test answers them.
pub struct ScriptedRepository {
    calls: mpsc::UnboundedSender<PendingList>,
    list_calls: AtomicUsize,
    episode: Mutex<Option<RepositoryResult<Episode>>>,
    episode_calls: AtomicUsize,
}

pub struct RepositoryController {
    calls: mpsc::UnboundedReceiver<PendingList>,
}

impl ScriptedRepository {
    pub fn new() -> (Self, RepositoryController) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                calls: tx,
                list_calls: AtomicUsize::new(0),
                episode: Mutex::new(None),
                episode_calls: AtomicUsize::new(0),
            },
            RepositoryController { calls: rx },
        )
    }

    pub fn with_episode(result: RepositoryResult<Episode>) -> Self {
        let (repository, _controller) = Self::new();
        *repository.episode.lock().expect("lock") = Some(result);
        repository
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn episode_calls(&self) -> usize {
        self.episode_calls.load(Ordering::SeqCst)
    }
}

impl RepositoryController {
    /// Waits for the next `list_characters` call and hands back its responder.
    pub async fn next_call(
        &mut self,
    ) -> (ListCall, oneshot::Sender<RepositoryResult<Page<Character>>>) {
        self.calls.recv().await.expect("repository dropped")
    }

    pub fn has_pending_call(&mut self) -> bool {
        !self.calls.is_empty()
    }
}

fn unsupported<T>() -> RepositoryResult<T> {
    Err(RepositoryError::network("not scripted"))
}

#[async_trait]
impl CharactersRepository for ScriptedRepository {
    async fn list_characters(
        &self,
        page: Option<u32>,
        name: Option<&str>,
    ) -> RepositoryResult<Page<Character>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        let call = ListCall {
            page,
            name: name.map(str::to_string),
        };
        if self.calls.send((call, tx)).is_err() {
            return unsupported();
        }
        rx.await
            .unwrap_or_else(|_| Err(RepositoryError::network("responder dropped")))
    }

    async fn fetch_character(&self, _url: &Url) -> RepositoryResult<Character> {
        unsupported()
    }

    async fn fetch_character_by_id(&self, _id: CharacterId) -> RepositoryResult<Character> {
        unsupported()
    }

    async fn fetch_characters(&self, _ids: &[CharacterId]) -> RepositoryResult<Vec<Character>> {
        unsupported()
    }

    async fn fetch_location(&self, _url: &Url) -> RepositoryResult<Location> {
        unsupported()
    }

    async fn fetch_episode(&self, _url: &Url) -> RepositoryResult<Episode> {
        self.episode_calls.fetch_add(1, Ordering::SeqCst);
        self.episode
            .lock()
            .expect("lock")
            .clone()
            .unwrap_or_else(unsupported)
    }
}
