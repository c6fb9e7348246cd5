use crate::{
    error::{HistoryError, Result},
    history::HistoryActions,
    path::{parse_path, stringify_path},
};

/// Where `navigate` should go: a path, or a number of entries to move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigateTo {
    Path(String),
    Delta(isize),
}

impl From<&str> for NavigateTo {
    fn from(path: &str) -> Self {
        NavigateTo::Path(path.to_string())
    }
}

impl From<String> for NavigateTo {
    fn from(path: String) -> Self {
        NavigateTo::Path(path)
    }
}

impl From<isize> for NavigateTo {
    fn from(delta: isize) -> Self {
        NavigateTo::Delta(delta)
    }
}

impl From<i32> for NavigateTo {
    fn from(delta: i32) -> Self {
        NavigateTo::Delta(delta as isize)
    }
}

/// Deltas coming from untyped sources, such as a script binding, have to be whole
/// numbers.
impl TryFrom<f64> for NavigateTo {
    type Error = HistoryError;

    fn try_from(delta: f64) -> Result<Self> {
        if !delta.is_finite() || delta.fract() != 0.0 {
            return Err(HistoryError::invalid(
                "navigate",
                "When supplying a number, the first argument is expected to be a whole number.",
                delta.to_string(),
            ));
        }
        if delta < isize::MIN as f64 || delta > isize::MAX as f64 {
            return Err(HistoryError::invalid(
                "navigate",
                "The number of entries to move is out of range.",
                delta.to_string(),
            ));
        }
        Ok(NavigateTo::Delta(delta as isize))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NavigateOptions<S> {
    pub state: Option<S>,
    pub replace: bool,
}

impl<S> Default for NavigateOptions<S> {
    fn default() -> Self {
        Self {
            state: None,
            replace: false,
        }
    }
}

impl<S> NavigateOptions<S> {
    pub fn replace() -> Self {
        Self {
            state: None,
            replace: true,
        }
    }

    pub fn with_state(state: S) -> Self {
        Self {
            state: Some(state),
            replace: false,
        }
    }
}

/// Translates one navigation request into `push`, `replace` or `go` on `actions`.
///
/// Paths may start with `/`, `?` or `#`. Search or hash only paths are resolved
/// against the root, so `"?q=1"` navigates to `"/?q=1"`.
pub fn navigate<S, A: HistoryActions<S> + ?Sized>(
    actions: &A,
    to: NavigateTo,
    options: Option<NavigateOptions<S>>,
) -> Result<()> {
    match to {
        NavigateTo::Delta(delta) => {
            if options.is_some() {
                log::warn!(
                    "Navigation options (state or replace) are not supported when navigating \
                     by a number of entries. They are ignored."
                );
            }
            actions.go(delta)
        }
        NavigateTo::Path(path) => {
            if !path.starts_with(['/', '?', '#']) {
                return Err(HistoryError::invalid(
                    "navigate",
                    "First argument must start with \"/\", \"?\" or \"#\".",
                    path,
                ));
            }
            let uri = if path.starts_with('/') {
                path
            } else {
                stringify_path(&parse_path(&path)?)
            };
            let NavigateOptions { state, replace } = options.unwrap_or_default();
            if replace {
                actions.replace(&uri, state)
            } else {
                actions.push(&uri, state)
            }
        }
    }
}
