use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::{Character, CharacterId, Episode, Location, Page},
    error::{ApiError, RepositoryError},
    protocol::{character_batch_path, character_path, ListCharactersQuery, CHARACTER_PATH},
};
use tracing::debug;
use url::Url;

use crate::settings::ClientSettings;

pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

#[async_trait]
pub trait CharactersRepository: Send + Sync {
    async fn list_characters(
        &self,
        page: Option<u32>,
        name: Option<&str>,
    ) -> RepositoryResult<Page<Character>>;
    async fn fetch_character(&self, url: &Url) -> RepositoryResult<Character>;
    async fn fetch_character_by_id(&self, id: CharacterId) -> RepositoryResult<Character>;
    async fn fetch_characters(&self, ids: &[CharacterId]) -> RepositoryResult<Vec<Character>>;
    async fn fetch_location(&self, url: &Url) -> RepositoryResult<Location>;
    async fn fetch_episode(&self, url: &Url) -> RepositoryResult<Episode>;
}

#[derive(Clone)]
pub struct HttpCharactersRepository {
    http: Client,
    base_url: Url,
}

impl HttpCharactersRepository {
    pub fn new(settings: &ClientSettings) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(settings.request_timeout())
            .user_agent(settings.user_agent.clone())
            .build()?;
        Ok(Self::with_client(http, settings.base_url()?))
    }

    pub fn with_client(http: Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    fn endpoint(&self, path: &str) -> RepositoryResult<Url> {
        self.base_url
            .join(path)
            .map_err(|err| RepositoryError::invalid_url(format!("{path}: {err}")))
    }

    async fn get_json<T, Q>(&self, url: Url, query: Option<&Q>) -> RepositoryResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        ensure_http_url(&url)?;
        debug!(%url, "GET");

        let mut request = self.http.get(url);
        if let Some(query) = query {
            request = request.query(query);
        }
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ApiError>(&body)
                .map(|body| body.error)
                .unwrap_or_else(|_| {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                });
            return Err(RepositoryError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl CharactersRepository for HttpCharactersRepository {
    async fn list_characters(
        &self,
        page: Option<u32>,
        name: Option<&str>,
    ) -> RepositoryResult<Page<Character>> {
        let url = self.endpoint(CHARACTER_PATH)?;
        let query = ListCharactersQuery::new(page, name);
        self.get_json(url, Some(&query)).await
    }

    async fn fetch_character(&self, url: &Url) -> RepositoryResult<Character> {
        self.get_json(url.clone(), None::<&ListCharactersQuery>).await
    }

    async fn fetch_character_by_id(&self, id: CharacterId) -> RepositoryResult<Character> {
        let url = self.endpoint(&character_path(id))?;
        self.get_json(url, None::<&ListCharactersQuery>).await
    }

    async fn fetch_characters(&self, ids: &[CharacterId]) -> RepositoryResult<Vec<Character>> {
        match ids {
            [] => Ok(Vec::new()),
            // The batch endpoint answers a single id with a bare object.
            [id] => Ok(vec![self.fetch_character_by_id(*id).await?]),
            ids => {
                let url = self.endpoint(&character_batch_path(ids))?;
                self.get_json(url, None::<&ListCharactersQuery>).await
            }
        }
    }

    async fn fetch_location(&self, url: &Url) -> RepositoryResult<Location> {
        self.get_json(url.clone(), None::<&ListCharactersQuery>).await
    }

    async fn fetch_episode(&self, url: &Url) -> RepositoryResult<Episode> {
        self.get_json(url.clone(), None::<&ListCharactersQuery>).await
    }
}

fn ensure_http_url(url: &Url) -> RepositoryResult<()> {
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(()),
        _ => Err(RepositoryError::invalid_url(url.as_str())),
    }
}

fn map_transport_error(err: reqwest::Error) -> RepositoryError {
    if err.is_decode() {
        RepositoryError::decoding(err.to_string())
    } else if err.is_builder() {
        RepositoryError::invalid_url(err.to_string())
    } else {
        RepositoryError::network(err.to_string())
    }
}

#[cfg(test)]
#[path = "tests/repository_tests.rs"]
mod tests;
