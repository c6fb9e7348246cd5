use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    rc::Rc,
};

use serde_json::Value;
use url::Url;

use super::{HostWindow, ListenerId, WindowEvent};
use crate::{
    error::{HistoryError, Result},
    path::Location,
};

const ORIGIN: &str = "http://localhost/";

struct Entry {
    url: Url,
    state: Option<Value>,
}

struct Session {
    entries: Vec<Entry>,
    index: usize,
}

impl Session {
    fn current(&self) -> &Entry {
        &self.entries[self.index]
    }

    fn append(&mut self, entry: Entry) {
        self.entries.truncate(self.index + 1);
        self.entries.push(entry);
        self.index = self.entries.len() - 1;
    }
}

struct Inner {
    available: bool,
    entry_limit: Cell<Option<usize>>,
    session: RefCell<Session>,
    listeners: RefCell<Vec<(ListenerId, WindowEvent, Rc<dyn Fn()>)>>,
    next_listener: Cell<u64>,
    pending: RefCell<VecDeque<WindowEvent>>,
}

/// An in-process session history that behaves like a browser tab.
///
/// `push_state` and `replace_state` are silent, like in a browser. Moving through the
/// stack with `go` only queues the matching events; they are delivered once
/// [`dispatch_pending`](Self::dispatch_pending) runs, the way a browser delivers them
/// on a later task. Clones share the same tab.
#[derive(Clone)]
pub struct SimulatedWindow {
    inner: Rc<Inner>,
}

impl SimulatedWindow {
    /// Opens a tab at `path`, which is resolved against `http://localhost/`.
    pub fn new(path: &str) -> Result<Self> {
        Ok(Self::open(resolve(&origin()?, path)?, true))
    }

    /// A context without a document, as found in a worker or on a server.
    pub fn detached() -> Result<Self> {
        Ok(Self::open(origin()?, false))
    }

    fn open(url: Url, available: bool) -> Self {
        Self {
            inner: Rc::new(Inner {
                available,
                entry_limit: Cell::new(None),
                session: RefCell::new(Session {
                    entries: vec![Entry { url, state: None }],
                    index: 0,
                }),
                listeners: RefCell::new(Vec::new()),
                next_listener: Cell::new(0),
                pending: RefCell::new(VecDeque::new()),
            }),
        }
    }

    /// Makes `push_state` fail once the tab holds `limit` entries, like browsers that
    /// cap the number of `pushState` calls.
    pub fn set_entry_limit(&self, limit: Option<usize>) {
        self.inner.entry_limit.set(limit);
    }

    /// Delivers queued events, including any queued while delivering. Returns how many
    /// were delivered.
    pub fn dispatch_pending(&self) -> usize {
        let mut delivered = 0;
        loop {
            let next = self.inner.pending.borrow_mut().pop_front();
            let Some(event) = next else {
                return delivered;
            };
            self.dispatch(event);
            delivered += 1;
        }
    }

    /// Fires `event` right away, whether or not anything changed.
    pub fn dispatch(&self, event: WindowEvent) {
        let handlers: Vec<Rc<dyn Fn()>> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .filter(|(_, kind, _)| *kind == event)
            .map(|(_, _, handler)| handler.clone())
            .collect();
        log::trace!("Dispatching {} to {} handlers", event.name(), handlers.len());
        for handler in handlers {
            handler();
        }
    }

    pub fn back(&self) -> Result<()> {
        self.go(-1)
    }

    pub fn forward(&self) -> Result<()> {
        self.go(1)
    }

    /// The user edits the fragment in the address bar.
    pub fn navigate_fragment(&self, fragment: &str) {
        let url = {
            let session = self.inner.session.borrow();
            let mut url = session.current().url.clone();
            url.set_fragment(Some(fragment.strip_prefix('#').unwrap_or(fragment)));
            url
        };
        self.inner
            .session
            .borrow_mut()
            .append(Entry { url, state: None });
        self.queue(WindowEvent::PopState);
        self.queue(WindowEvent::HashChange);
    }

    pub fn len(&self) -> usize {
        self.inner.session.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.session.borrow().entries.is_empty()
    }

    pub fn index(&self) -> usize {
        self.inner.session.borrow().index
    }

    /// Path, search and hash of the active entry.
    pub fn href(&self) -> String {
        let location = self.location();
        format!("{}{}{}", location.pathname, location.search, location.hash)
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    pub fn pending_events(&self) -> usize {
        self.inner.pending.borrow().len()
    }

    fn queue(&self, event: WindowEvent) {
        self.inner.pending.borrow_mut().push_back(event);
    }

    fn resolve(&self, url: &str) -> Result<Url> {
        resolve(&self.inner.session.borrow().current().url, url)
    }
}

fn origin() -> Result<Url> {
    Url::parse(ORIGIN).map_err(|e| HistoryError::Platform(e.to_string()))
}

fn resolve(base: &Url, url: &str) -> Result<Url> {
    base.join(url)
        .map_err(|e| HistoryError::Platform(format!("Invalid url {url:?}: {e}")))
}

fn non_empty(prefix: char, part: Option<&str>) -> String {
    match part {
        Some(part) if !part.is_empty() => format!("{prefix}{part}"),
        _ => String::new(),
    }
}

impl HostWindow for SimulatedWindow {
    fn is_available(&self) -> bool {
        self.inner.available
    }

    fn location(&self) -> Location {
        let session = self.inner.session.borrow();
        let url = &session.current().url;
        Location {
            pathname: url.path().to_string(),
            search: non_empty('?', url.query()),
            hash: non_empty('#', url.fragment()),
        }
    }

    fn history_state(&self) -> Option<Value> {
        self.inner.session.borrow().current().state.clone()
    }

    fn push_state(&self, state: Value, url: &str) -> Result<()> {
        if let Some(limit) = self.inner.entry_limit.get() {
            if self.len() >= limit {
                return Err(HistoryError::Platform(format!(
                    "Too many calls to pushState, limit is {limit}"
                )));
            }
        }
        let url = self.resolve(url)?;
        self.inner.session.borrow_mut().append(Entry {
            url,
            state: Some(state),
        });
        Ok(())
    }

    fn replace_state(&self, state: Value, url: &str) -> Result<()> {
        let url = self.resolve(url)?;
        let mut session = self.inner.session.borrow_mut();
        let index = session.index;
        session.entries[index] = Entry {
            url,
            state: Some(state),
        };
        Ok(())
    }

    fn go(&self, delta: isize) -> Result<()> {
        let fragment_changed = {
            let mut session = self.inner.session.borrow_mut();
            let Some(index) = session.index.checked_add_signed(delta) else {
                return Ok(());
            };
            if delta == 0 || index >= session.entries.len() {
                return Ok(());
            }
            let previous = session.current().url.fragment().map(str::to_string);
            session.index = index;
            previous.as_deref() != session.current().url.fragment()
        };
        self.queue(WindowEvent::PopState);
        if fragment_changed {
            self.queue(WindowEvent::HashChange);
        }
        Ok(())
    }

    fn assign(&self, url: &str) -> Result<()> {
        let url = self.resolve(url)?;
        let fragment_only = {
            let session = self.inner.session.borrow();
            let current = &session.current().url;
            current[..url::Position::AfterQuery] == url[..url::Position::AfterQuery]
                && current.fragment() != url.fragment()
        };
        self.inner
            .session
            .borrow_mut()
            .append(Entry { url, state: None });
        if fragment_only {
            self.queue(WindowEvent::PopState);
            self.queue(WindowEvent::HashChange);
        }
        Ok(())
    }

    fn add_listener(&self, event: WindowEvent, handler: Box<dyn Fn()>) -> ListenerId {
        let id = ListenerId::new(self.inner.next_listener.get());
        self.inner.next_listener.set(self.inner.next_listener.get() + 1);
        self.inner
            .listeners
            .borrow_mut()
            .push((id, event, Rc::from(handler)));
        id
    }

    fn remove_listener(&self, id: ListenerId) {
        self.inner
            .listeners
            .borrow_mut()
            .retain(|(listener_id, _, _)| *listener_id != id);
    }
}
