use std::{cell::Cell, rc::Rc};

use serde_json::Value;

use super::{
    platform::{Addressing, PlatformHistory},
    Action, History, HistoryActions, HistoryKind, HistoryUpdate, NavigatorLocation,
};
use crate::{
    error::{HistoryError, Result},
    path::To,
    state::HistoryState,
    subscribable::Subscription,
    window::{ambient_window, DefaultWindow, HostWindow, ListenerId, WindowEvent},
};

struct BrowserInner<S, W> {
    platform: PlatformHistory<S, W>,
    popstate: Cell<Option<ListenerId>>,
}

/// Keeps the location in the address bar through the HTML5 History API.
///
/// This gives the cleanest urls, but the server has to answer every path with the
/// app's index page. Cloning the handle shares the same history.
pub struct BrowserHistory<S: HistoryState = Value, W: HostWindow = DefaultWindow> {
    inner: Rc<BrowserInner<S, W>>,
}

impl<S: HistoryState, W: HostWindow> Clone for BrowserHistory<S, W> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S: HistoryState> BrowserHistory<S, DefaultWindow> {
    /// Creates a history on the page's own window.
    pub fn new() -> Result<Self> {
        Self::with_window(ambient_window("createBrowserHistory")?)
    }
}

impl<S: HistoryState, W: HostWindow> BrowserHistory<S, W> {
    pub fn with_window(window: W) -> Result<Self> {
        if !window.is_available() {
            return Err(HistoryError::EnvironmentUnavailable("createBrowserHistory"));
        }

        let inner = Rc::new(BrowserInner {
            platform: PlatformHistory::new(window, Addressing::Path),
            popstate: Cell::new(None),
        });

        let weak = Rc::downgrade(&inner);
        let id = inner.platform.window.add_listener(
            WindowEvent::PopState,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.platform.sync(Action::Pop);
                }
            }),
        );
        inner.popstate.set(Some(id));
        log::debug!("Browser history listening at {}", inner.platform.container.location().location);

        Ok(Self { inner })
    }

    pub fn subscribe(&self, listener: impl Fn(&HistoryUpdate<S>) + 'static) -> Subscription {
        self.inner.platform.container.subscribe(listener)
    }

    pub fn window(&self) -> &W {
        &self.inner.platform.window
    }
}

impl<S: HistoryState, W: HostWindow> HistoryActions<S> for BrowserHistory<S, W> {
    fn push(&self, uri: &str, state: Option<S>) -> Result<()> {
        self.inner.platform.push(uri, state)
    }

    fn replace(&self, uri: &str, state: Option<S>) -> Result<()> {
        self.inner.platform.replace(uri, state)
    }

    fn go(&self, delta: isize) -> Result<()> {
        self.inner.platform.go(delta)
    }
}

impl<S: HistoryState, W: HostWindow> History<S> for BrowserHistory<S, W> {
    fn location(&self) -> NavigatorLocation<S> {
        self.inner.platform.container.location()
    }

    fn action(&self) -> Action {
        self.inner.platform.container.action()
    }

    fn subscribe(&self, listener: Box<dyn Fn(&HistoryUpdate<S>)>) -> Subscription {
        self.inner.platform.container.subscribe(listener)
    }

    fn create_href(&self, to: To) -> String {
        self.inner.platform.create_href(&to.to_path_string())
    }

    fn release(&self) {
        if let Some(id) = self.inner.popstate.take() {
            log::debug!("Browser history released");
            self.inner.platform.window.remove_listener(id);
        }
    }

    fn kind(&self) -> HistoryKind {
        HistoryKind::Browser
    }
}
