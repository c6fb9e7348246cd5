use serde_json::Value;

use crate::{
    error::{HistoryError, Result},
    path::Location,
};

pub mod simulated;
#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(not(target_arch = "wasm32"))]
pub type DefaultWindow = simulated::SimulatedWindow;

#[cfg(target_arch = "wasm32")]
pub type DefaultWindow = web::WebWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowEvent {
    /// An existing entry became active through the back/forward buttons or `go`.
    PopState,
    /// The fragment of the address changed.
    HashChange,
}

impl WindowEvent {
    pub fn name(self) -> &'static str {
        match self {
            WindowEvent::PopState => "popstate",
            WindowEvent::HashChange => "hashchange",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

/// The addressable document context the browser and hash histories drive.
///
/// Implementations wrap a session history: one stack of urls, each with an opaque
/// state slot, plus the events fired when the active entry changes.
pub trait HostWindow: 'static {
    /// Whether a document is actually attached to this context.
    fn is_available(&self) -> bool {
        true
    }

    fn location(&self) -> Location;

    /// The state slot of the active entry, if the platform holds anything there.
    fn history_state(&self) -> Option<Value>;

    fn push_state(&self, state: Value, url: &str) -> Result<()>;

    fn replace_state(&self, state: Value, url: &str) -> Result<()>;

    /// Moves through the session history. The resulting entry change is reported later
    /// through [`WindowEvent::PopState`].
    fn go(&self, delta: isize) -> Result<()>;

    /// Full navigation to `url`, bypassing the state slots.
    fn assign(&self, url: &str) -> Result<()>;

    fn add_listener(&self, event: WindowEvent, handler: Box<dyn Fn()>) -> ListenerId;

    fn remove_listener(&self, id: ListenerId);
}

/// The window of the running page.
///
/// Only a browser page has one. Everywhere else this fails with
/// [`HistoryError::EnvironmentUnavailable`].
pub fn ambient_window(operation: &'static str) -> Result<DefaultWindow> {
    #[cfg(target_arch = "wasm32")]
    {
        web::WebWindow::ambient().ok_or(HistoryError::EnvironmentUnavailable(operation))
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        Err(HistoryError::EnvironmentUnavailable(operation))
    }
}
