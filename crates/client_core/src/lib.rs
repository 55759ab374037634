pub mod detail_coordinator;
pub mod display;
pub mod image_loader;
pub mod list_coordinator;
pub mod projection;
pub mod repository;
pub mod settings;
pub mod ui;

pub use detail_coordinator::{DetailCoordinator, DetailOutcome};
pub use display::{DetailDisplay, ListDisplay, ViewHandle};
pub use image_loader::{DecodedImage, HttpImageFetcher, ImageFetcher, ImageLoader};
pub use list_coordinator::{FetchOutcome, ListCoordinator, SearchState, SkipReason};
pub use projection::{CharacterRow, DetailProjection, ProjectionRow};
pub use repository::{CharactersRepository, HttpCharactersRepository, RepositoryResult};
pub use settings::{load_settings, ClientSettings};
pub use ui::{ui_channel, Dispatcher, UiContext, UiQueue};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
