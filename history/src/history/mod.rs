use std::{fmt, ops::Deref};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::Result,
    navigate::{self, NavigateOptions, NavigateTo},
    path::{Location, To},
    state::{HistoryState, StateContainer},
    subscribable::Subscription,
};

pub mod browser;
pub mod hash;
pub mod memory;
mod platform;

/// Why the current entry changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    /// An existing entry became current again.
    Pop,
    /// A new entry was appended, dropping everything after the old current entry.
    Push,
    /// The current entry was overwritten in place.
    Replace,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Pop => "POP",
            Action::Push => "PUSH",
            Action::Replace => "REPLACE",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryKind {
    Browser,
    Hash,
    Memory,
}

/// A [`Location`] plus the caller state and key of the entry it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigatorLocation<S = Value> {
    #[serde(flatten)]
    pub location: Location,
    pub state: Option<S>,
    pub key: String,
}

impl<S> NavigatorLocation<S> {
    pub fn new(location: Location, state: StateContainer<S>) -> Self {
        Self {
            location,
            state: state.value,
            key: state.key,
        }
    }
}

impl<S> Deref for NavigatorLocation<S> {
    type Target = Location;

    fn deref(&self) -> &Self::Target {
        &self.location
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryUpdate<S = Value> {
    pub location: NavigatorLocation<S>,
    pub action: Action,
}

/// The mutations every backend supports.
pub trait HistoryActions<S> {
    /// Appends a new entry for `uri`, which must start with `/`.
    fn push(&self, uri: &str, state: Option<S>) -> Result<()>;

    /// Overwrites the current entry with `uri`, which must start with `/`.
    fn replace(&self, uri: &str, state: Option<S>) -> Result<()>;

    /// Moves `delta` entries through the stack. Moving past either end does nothing.
    fn go(&self, delta: isize) -> Result<()>;
}

/// A navigation history, independent of where the entries are kept.
pub trait History<S: HistoryState = Value>: HistoryActions<S> {
    fn location(&self) -> NavigatorLocation<S>;

    fn action(&self) -> Action;

    /// Registers `listener`, calling it right away with the current location.
    fn subscribe(&self, listener: Box<dyn Fn(&HistoryUpdate<S>)>) -> Subscription;

    /// Turns a path or location into an href usable by this backend.
    fn create_href(&self, to: To) -> String;

    /// Stops listening to the platform. Calling it again does nothing.
    fn release(&self);

    fn kind(&self) -> HistoryKind;

    fn navigate(&self, to: NavigateTo, options: Option<NavigateOptions<S>>) -> Result<()> {
        navigate::navigate(self, to, options)
    }
}
