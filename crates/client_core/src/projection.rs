use shared::domain::{Character, CharacterId, Episode};
use url::Url;

pub const SUBTITLE_SEPARATOR: &str = " • ";
pub const LOCATION_TITLE: &str = "Last known location";
pub const FIRST_EPISODE_TITLE: &str = "First episode";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionRow {
    pub title: String,
    pub value: String,
}

impl ProjectionRow {
    pub fn new(title: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
        }
    }
}

/// What the detail screen shows for one character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailProjection {
    pub title: String,
    pub subtitle: String,
    pub status: String,
    pub location_title: String,
    pub location_value: String,
    pub image_url: Option<Url>,
    pub rows: Vec<ProjectionRow>,
}

impl DetailProjection {
    pub fn base(character: &Character) -> Self {
        let mut rows = vec![
            ProjectionRow::new("Status", character.status.as_str()),
            ProjectionRow::new("Species", &character.species),
        ];
        if !character.kind.is_empty() {
            rows.push(ProjectionRow::new("Type", &character.kind));
        }
        rows.extend([
            ProjectionRow::new("Gender", &character.gender),
            ProjectionRow::new("Origin", &character.origin.name),
            ProjectionRow::new(LOCATION_TITLE, &character.location.name),
        ]);

        let subtitle = [
            character.species.as_str(),
            character.kind.as_str(),
            character.gender.as_str(),
        ]
        .into_iter()
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(SUBTITLE_SEPARATOR);

        Self {
            title: character.name.clone(),
            subtitle,
            status: character.status.as_str().to_string(),
            location_title: LOCATION_TITLE.to_string(),
            location_value: character.location.name.clone(),
            image_url: Url::parse(&character.image).ok(),
            rows,
        }
    }

    /// Copy of `self` with the first-episode row right after the first row.
    pub fn with_first_episode(&self, episode: &Episode) -> Self {
        let mut enriched = self.clone();
        let row = ProjectionRow::new(
            FIRST_EPISODE_TITLE,
            format!("{} — {}", episode.episode, episode.name),
        );
        enriched.rows.insert(1.min(enriched.rows.len()), row);
        enriched
    }
}

/// One line of the character list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterRow {
    pub id: CharacterId,
    pub name: String,
    pub image_url: Option<Url>,
}

impl From<&Character> for CharacterRow {
    fn from(character: &Character) -> Self {
        Self {
            id: character.id,
            name: character.name.clone(),
            image_url: Url::parse(&character.image).ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{make_character, make_episode};

    fn titles(projection: &DetailProjection) -> Vec<&str> {
        projection.rows.iter().map(|row| row.title.as_str()).collect()
    }

    #[test]
    fn base_includes_type_row_only_when_present() {
        let with_type = DetailProjection::base(&make_character(1, &[], "Scientist"));
        assert_eq!(
            titles(&with_type),
            vec!["Status", "Species", "Type", "Gender", "Origin", "Last known location"]
        );

        let without_type = DetailProjection::base(&make_character(1, &[], ""));
        assert_eq!(
            titles(&without_type),
            vec!["Status", "Species", "Gender", "Origin", "Last known location"]
        );
    }

    #[test]
    fn subtitle_drops_empty_segments() {
        let character = make_character(1, &[], "");
        assert_eq!(DetailProjection::base(&character).subtitle, "Human • Male");

        let character = make_character(1, &[], "Scientist");
        assert_eq!(
            DetailProjection::base(&character).subtitle,
            "Human • Scientist • Male"
        );
    }

    #[test]
    fn unparsable_image_has_no_url() {
        let mut character = make_character(1, &[], "");
        character.image = "not a url".into();
        assert!(DetailProjection::base(&character).image_url.is_none());
        assert!(CharacterRow::from(&character).image_url.is_none());
    }

    #[test]
    fn first_episode_row_is_inserted_at_index_one() {
        let base = DetailProjection::base(&make_character(1, &[], "Scientist"));
        let enriched = base.with_first_episode(&make_episode("S01E01", "Pilot"));

        assert_eq!(enriched.rows.len(), base.rows.len() + 1);
        assert_eq!(
            enriched.rows[1],
            ProjectionRow::new("First episode", "S01E01 — Pilot")
        );
        assert_eq!(enriched.rows[0], base.rows[0]);
        assert_eq!(&enriched.rows[2..], &base.rows[1..]);
        assert_eq!(enriched.title, base.title);
    }
}
