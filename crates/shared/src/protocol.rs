use serde::{Deserialize, Serialize};

use crate::domain::CharacterId;

pub const DEFAULT_API_BASE_URL: &str = "https://rickandmortyapi.com/api/";
pub const CHARACTER_PATH: &str = "character";

/// Query string for `GET /character`. Absent fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListCharactersQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ListCharactersQuery {
    pub fn new(page: Option<u32>, name: Option<&str>) -> Self {
        Self {
            page,
            name: name.map(str::to_string),
        }
    }
}

/// Path segment for the batch endpoint, e.g. `character/1,2,3`.
pub fn character_batch_path(ids: &[CharacterId]) -> String {
    let joined = ids
        .iter()
        .map(|id| id.0.to_string())
        .collect::<Vec<_>>()
        .join(",");
    format!("{CHARACTER_PATH}/{joined}")
}

pub fn character_path(id: CharacterId) -> String {
    format!("{CHARACTER_PATH}/{}", id.0)
}
