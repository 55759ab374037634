use std::sync::{Arc, Weak};

use shared::domain::Character;

use crate::projection::DetailProjection;

pub trait ListDisplay: Send + Sync {
    fn setup_view(&self);
    fn display_characters(&self, characters: &[Character]);
    fn display_error(&self, message: &str);
}

pub trait DetailDisplay: Send + Sync {
    fn set_loading(&self, loading: bool);
    fn setup_view(&self);
    fn display_projection(&self, projection: &DetailProjection);
    fn display_error(&self, message: &str);
}

/// Non-owning handle to a display target.
pub struct ViewHandle<V: ?Sized> {
    target: Option<Weak<V>>,
}

impl<V: ?Sized> ViewHandle<V> {
    pub fn detached() -> Self {
        Self { target: None }
    }

    pub fn attach(view: &Arc<V>) -> Self {
        Self {
            target: Some(Arc::downgrade(view)),
        }
    }

    /// Runs `f` against the view if it is still alive.
    pub fn with(&self, f: impl FnOnce(&V)) {
        if let Some(view) = self.target.as_ref().and_then(Weak::upgrade) {
            f(&view);
        }
    }
}

impl<V: ?Sized> Clone for ViewHandle<V> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
        }
    }
}

impl<V: ?Sized> Default for ViewHandle<V> {
    fn default() -> Self {
        Self::detached()
    }
}
