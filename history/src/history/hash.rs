use std::{cell::Cell, rc::Rc};

use serde_json::Value;

use super::{
    platform::{fragment_differs, Addressing, PlatformHistory},
    Action, History, HistoryActions, HistoryKind, HistoryUpdate, NavigatorLocation,
};
use crate::{
    error::{HistoryError, Result},
    path::To,
    state::HistoryState,
    subscribable::Subscription,
    window::{ambient_window, DefaultWindow, HostWindow, ListenerId, WindowEvent},
};

struct HashInner<S, W> {
    platform: PlatformHistory<S, W>,
    listeners: Cell<Option<(ListenerId, ListenerId)>>,
    released: Cell<bool>,
}

impl<S: HistoryState, W: HostWindow> HashInner<S, W> {
    fn attach(self: &Rc<Self>) {
        if self.released.get() || self.listeners.get().is_some() {
            return;
        }

        let weak = Rc::downgrade(self);
        let popstate = self.platform.window.add_listener(
            WindowEvent::PopState,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.platform.sync(Action::Pop);
                }
            }),
        );
        let weak = Rc::downgrade(self);
        let hashchange = self.platform.window.add_listener(
            WindowEvent::HashChange,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.on_hashchange();
                }
            }),
        );
        self.listeners.set(Some((popstate, hashchange)));
        log::debug!("Hash history listening");

        // Anything may have happened to the fragment while nobody was listening.
        self.reconcile();
    }

    fn detach(&self) {
        if let Some((popstate, hashchange)) = self.listeners.take() {
            self.platform.window.remove_listener(popstate);
            self.platform.window.remove_listener(hashchange);
            log::debug!("Hash history stopped listening");
        }
    }

    // Back/forward fires popstate and hashchange for the same move, and push/replace
    // fire hashchange for entries that are already recorded. Only a fragment that
    // names a different path than the recorded one is a real transition.
    fn on_hashchange(&self) {
        let fragment = self.platform.fragment_path();
        if fragment_differs(&fragment, &self.platform.container.location()) {
            self.platform.sync(Action::Pop);
        } else {
            log::trace!("Ignoring extraneous hashchange to {fragment:?}");
        }
    }

    /// Catches up with the platform when its current entry is not the recorded one.
    fn reconcile(&self) {
        let current = self.platform.current_location();
        let recorded = self.platform.container.location();
        if current.location != recorded.location || current.key != recorded.key {
            log::debug!("Hash history caught up to {}", current.location);
            self.platform.container.set(current, Action::Pop);
        }
    }
}

/// Keeps the location in the fragment after `#`.
///
/// Works on any static file server, since the server never sees the app's path.
/// Listeners are only attached to the window while somebody is subscribed.
pub struct HashHistory<S: HistoryState = Value, W: HostWindow = DefaultWindow> {
    inner: Rc<HashInner<S, W>>,
}

impl<S: HistoryState, W: HostWindow> Clone for HashHistory<S, W> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S: HistoryState> HashHistory<S, DefaultWindow> {
    /// Creates a history on the page's own window.
    pub fn new() -> Result<Self> {
        Self::with_window(ambient_window("createHashHistory")?)
    }
}

impl<S: HistoryState, W: HostWindow> HashHistory<S, W> {
    pub fn with_window(window: W) -> Result<Self> {
        if !window.is_available() {
            return Err(HistoryError::EnvironmentUnavailable("createHashHistory"));
        }

        let inner = Rc::new(HashInner {
            platform: PlatformHistory::new(window, Addressing::Fragment),
            listeners: Cell::new(None),
            released: Cell::new(false),
        });

        let on_init = Rc::downgrade(&inner);
        let on_destroy = Rc::downgrade(&inner);
        inner.platform.container.set_lifecycle(
            move || {
                if let Some(inner) = on_init.upgrade() {
                    inner.attach();
                }
            },
            move || {
                if let Some(inner) = on_destroy.upgrade() {
                    inner.detach();
                }
            },
        );

        Ok(Self { inner })
    }

    pub fn subscribe(&self, listener: impl Fn(&HistoryUpdate<S>) + 'static) -> Subscription {
        self.inner.platform.container.subscribe(listener)
    }

    pub fn window(&self) -> &W {
        &self.inner.platform.window
    }

    fn is_listening(&self) -> bool {
        self.inner.listeners.get().is_some()
    }
}

impl<S: HistoryState, W: HostWindow> HistoryActions<S> for HashHistory<S, W> {
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

impl<S: HistoryState, W: HostWindow> History<S> for HashHistory<S, W> {
    fn location(&self) -> NavigatorLocation<S> {
        if !self.is_listening() && !self.inner.released.get() {
            self.inner.reconcile();
        }
        self.inner.platform.container.location()
    }

    fn action(&self) -> Action {
        if !self.is_listening() && !self.inner.released.get() {
            self.inner.reconcile();
        }
        self.inner.platform.container.action()
    }

    fn subscribe(&self, listener: Box<dyn Fn(&HistoryUpdate<S>)>) -> Subscription {
        self.inner.platform.container.subscribe(listener)
    }

    fn create_href(&self, to: To) -> String {
        self.inner.platform.create_href(&to.to_path_string())
    }

    fn release(&self) {
        self.inner.released.set(true);
        self.inner.detach();
    }

    fn kind(&self) -> HistoryKind {
        HistoryKind::Hash
    }
}
