//! Change and status notifications delivered to the display layer.

/// A notification fired by [`crate::WordLookupService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    WordChanged,
    TypeChanged,
    DefinitionChanged,
    /// Outcome of an `open_database` call.
    DatabaseOpened(bool),
    /// Human-readable failure text (driver text or a fixed phrase).
    ErrorOccurred(String),
}

/// Type alias for a notification listener.
///
/// Listeners run synchronously, in registration order, inside the call that
/// caused the notification. `FnMut` allows a listener to update captured
/// state (e.g. redraw a widget or collect events in a test).
pub type Listener = Box<dyn FnMut(&Notification) + Send + Sync>;

/// Ordered set of listeners.
#[derive(Default)]
pub struct Listeners {
    inner: Vec<Listener>,
}

impl Listeners {
    pub fn push(&mut self, listener: Listener) {
        self.inner.push(listener);
    }

    pub fn emit(&mut self, notification: Notification) {
        for listener in self.inner.iter_mut() {
            listener(&notification);
        }
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.inner.len())
            .finish()
    }
}
