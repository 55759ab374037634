use std::sync::Mutex;

use client_core::{CharacterRow, DetailDisplay, DetailProjection, ListDisplay};
use shared::domain::Character;

#[derive(Default)]
struct ListViewState {
    printed: usize,
    error: Option<String>,
}

#[derive(Default)]
pub struct ConsoleListView {
    state: Mutex<ListViewState>,
}

impl ConsoleListView {
    pub fn take_error(&self) -> Option<String> {
        self.state.lock().ok().and_then(|mut state| state.error.take())
    }
}

impl ListDisplay for ConsoleListView {
    fn setup_view(&self) {
        println!("{:>5}  name", "id");
    }

    fn display_characters(&self, characters: &[Character]) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        // A shorter list means the results were reset.
        if characters.len() < state.printed {
            println!("--");
            state.printed = 0;
        }
        for character in &characters[state.printed..] {
            let row = CharacterRow::from(character);
            println!("{:>5}  {}", row.id, row.name);
        }
        state.printed = characters.len();
    }

    fn display_error(&self, message: &str) {
        eprintln!("error: {message}");
        if let Ok(mut state) = self.state.lock() {
            state.error = Some(message.to_string());
        }
    }
}

#[derive(Default)]
struct DetailViewState {
    loading: bool,
    finished: bool,
    error: Option<String>,
}

#[derive(Default)]
pub struct ConsoleDetailView {
    state: Mutex<DetailViewState>,
}

impl ConsoleDetailView {
    pub fn is_finished(&self) -> bool {
        self.state.lock().map(|state| state.finished).unwrap_or(true)
    }

    pub fn error(&self) -> Option<String> {
        self.state.lock().ok().and_then(|state| state.error.clone())
    }
}

impl DetailDisplay for ConsoleDetailView {
    fn set_loading(&self, loading: bool) {
        if let Ok(mut state) = self.state.lock() {
            if state.loading && !loading {
                state.finished = true;
            }
            state.loading = loading;
        }
    }

    fn setup_view(&self) {
        println!("==");
    }

    fn display_projection(&self, projection: &DetailProjection) {
        println!("{}", projection.title);
        if !projection.subtitle.is_empty() {
            println!("  {}", projection.subtitle);
        }
        if let Some(url) = &projection.image_url {
            println!("  image: {url}");
        }
        for row in &projection.rows {
            println!("  {:<20} {}", row.title, row.value);
        }
        println!();
    }

    fn display_error(&self, message: &str) {
        eprintln!("error: {message}");
        if let Ok(mut state) = self.state.lock() {
            state.error = Some(message.to_string());
        }
    }
}
