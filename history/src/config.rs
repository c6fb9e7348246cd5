use serde::Deserialize;

use crate::{
    error::Result,
    history::{
        browser::BrowserHistory, hash::HashHistory, memory::MemoryHistory, History, HistoryKind,
    },
    path::To,
    state::HistoryState,
    window::ambient_window,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MemoryHistoryOptions {
    pub initial_entries: Vec<To>,
    pub initial_index: usize,
}

impl Default for MemoryHistoryOptions {
    fn default() -> Self {
        Self {
            initial_entries: vec![To::from("/")],
            initial_index: 0,
        }
    }
}

impl From<&str> for MemoryHistoryOptions {
    fn from(initial_path: &str) -> Self {
        Self {
            initial_entries: vec![To::from(initial_path)],
            initial_index: 0,
        }
    }
}

impl From<String> for MemoryHistoryOptions {
    fn from(initial_path: String) -> Self {
        Self::from(initial_path.as_str())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Backend to use. Without one, the browser history is picked when a document
    /// is around and the memory history otherwise.
    pub kind: Option<HistoryKind>,
    pub memory: MemoryHistoryOptions,
}

/// Builds the history described by `config` on the page's own window.
pub fn create_history<S: HistoryState>(config: &HistoryConfig) -> Result<Box<dyn History<S>>> {
    let history: Box<dyn History<S>> = match config.kind {
        Some(HistoryKind::Browser) => Box::new(BrowserHistory::<S>::new()?),
        Some(HistoryKind::Hash) => Box::new(HashHistory::<S>::new()?),
        Some(HistoryKind::Memory) => Box::new(MemoryHistory::<S>::new(config.memory.clone())?),
        None => match ambient_window("createHistory") {
            Ok(window) => Box::new(BrowserHistory::<S, _>::with_window(window)?),
            Err(_) => {
                log::debug!("No document available, keeping history in memory");
                Box::new(MemoryHistory::<S>::new(config.memory.clone())?)
            }
        },
    };
    Ok(history)
}
