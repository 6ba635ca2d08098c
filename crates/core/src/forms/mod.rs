//! Draft management for per-patient record forms.
//!
//! A form pairs the draft being edited with the snapshot last synced from
//! storage. Edits go through closures so dirtiness is recomputed after every
//! mutation, saves go through the upsert coordinator, and each form exposes
//! a [`DirtyFlag`] handle the hosting shell can watch before letting the
//! user navigate away.

pub mod history;
pub mod singleton;

pub use history::HistoryForm;
pub use singleton::SingletonForm;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Observable dirty state of one form.
///
/// Clone the handle out of a form and poll [`is_dirty`](DirtyFlag::is_dirty)
/// from outside; the owning form keeps it current through edits, loads and
/// saves. Each form owns exactly one flag, so no global registry is needed.
#[derive(Clone, Debug, Default)]
pub struct DirtyFlag(Arc<AtomicBool>);

impl DirtyFlag {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Whether the draft currently differs from its snapshot.
    pub fn is_dirty(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub(crate) fn set(&self, dirty: bool) {
        self.0.store(dirty, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_cloned_handle_observes_the_owner() {
        let flag = DirtyFlag::new();
        let handle = flag.clone();
        assert!(!handle.is_dirty());

        flag.set(true);
        assert!(handle.is_dirty());

        flag.set(false);
        assert!(!handle.is_dirty());
    }
}
