use crate::{
    container::HistoryContainer,
    error::{assert_absolute_uri, HistoryError, Result},
    history::{Action, NavigatorLocation},
    path::{normalize_pathname, parse_path, stringify_path, Location},
    state::{HistoryState, StateContainer},
    window::HostWindow,
};

/// Which part of the address holds the app's path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Addressing {
    /// The whole path, search and hash.
    Path,
    /// Only the fragment after `#`.
    Fragment,
}

/// State shared by the histories that sit on top of a [`HostWindow`].
pub(crate) struct PlatformHistory<S, W> {
    pub(crate) window: W,
    pub(crate) container: HistoryContainer<S>,
    addressing: Addressing,
}

impl<S: HistoryState, W: HostWindow> PlatformHistory<S, W> {
    pub(crate) fn new(window: W, addressing: Addressing) -> Self {
        let initial = read_location(&window, addressing);
        Self {
            window,
            container: HistoryContainer::new(initial),
            addressing,
        }
    }

    pub(crate) fn current_location(&self) -> NavigatorLocation<S> {
        read_location(&self.window, self.addressing)
    }

    /// The fragment without its leading `#`.
    pub(crate) fn fragment_path(&self) -> String {
        let hash = self.window.location().hash;
        hash.strip_prefix('#').unwrap_or(&hash).to_string()
    }

    pub(crate) fn create_href(&self, to: &str) -> String {
        match self.addressing {
            Addressing::Path => to.to_string(),
            Addressing::Fragment => format!("#{to}"),
        }
    }

    /// Records whatever entry the platform now shows.
    pub(crate) fn sync(&self, action: Action) {
        self.container.set(self.current_location(), action);
    }

    pub(crate) fn push(&self, uri: &str, state: Option<S>) -> Result<()> {
        assert_absolute_uri("History.push", uri)?;
        let href = self.create_href(uri);
        let blob = serde_json::to_value(StateContainer::new(state))?;
        match self.window.push_state(blob, &href) {
            Ok(()) => {}
            // Some browsers cap the number of pushState calls per session.
            Err(e @ HistoryError::Platform(_)) => {
                log::warn!("pushState failed ({e}), falling back to a full navigation to {href}");
                self.window.assign(&href)?;
            }
            Err(e) => return Err(e),
        }
        self.sync(Action::Push);
        Ok(())
    }

    pub(crate) fn replace(&self, uri: &str, state: Option<S>) -> Result<()> {
        assert_absolute_uri("History.replace", uri)?;
        let href = self.create_href(uri);
        let blob = serde_json::to_value(StateContainer::new(state))?;
        self.window.replace_state(blob, &href)?;
        self.sync(Action::Replace);
        Ok(())
    }

    pub(crate) fn go(&self, delta: isize) -> Result<()> {
        log::debug!("Asking the platform to go {delta}");
        self.window.go(delta)
    }
}

fn read_location<S: HistoryState, W: HostWindow>(
    window: &W,
    addressing: Addressing,
) -> NavigatorLocation<S> {
    let raw = window.location();
    let location = match addressing {
        Addressing::Path => Location {
            pathname: normalize_pathname(&raw.pathname),
            search: raw.search,
            hash: raw.hash,
        },
        Addressing::Fragment => fragment_location(raw.hash.strip_prefix('#').unwrap_or(&raw.hash)),
    };
    NavigatorLocation::new(
        location,
        StateContainer::recover(window.history_state().as_ref()),
    )
}

pub(crate) fn fragment_location(fragment: &str) -> Location {
    parse_path(fragment).unwrap_or_else(|_| {
        log::warn!("Fragment {fragment:?} is not an absolute path, reading it as \"/{fragment}\"");
        parse_path(&format!("/{fragment}")).unwrap_or_default()
    })
}

/// Whether `fragment` names a different path than `location`.
pub(crate) fn fragment_differs(fragment: &str, location: &Location) -> bool {
    stringify_path(&fragment_location(fragment)) != stringify_path(location)
}
