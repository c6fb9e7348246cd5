use std::{cell::RefCell, rc::Rc};

use serde_json::Value;

use super::{Action, History, HistoryActions, HistoryKind, HistoryUpdate, NavigatorLocation};
use crate::{
    config::MemoryHistoryOptions,
    container::HistoryContainer,
    error::{assert_absolute_uri, Result},
    path::{parse_path, To},
    state::{HistoryState, StateContainer},
    subscribable::Subscription,
};

struct Stack<S> {
    entries: Vec<NavigatorLocation<S>>,
    index: usize,
}

struct MemoryInner<S> {
    container: HistoryContainer<S>,
    stack: RefCell<Stack<S>>,
}

/// Keeps the whole history stack in memory.
///
/// Useful for tests and for hosts without an address bar, such as a widget embedded
/// in another app. Cloning the handle shares the same stack.
pub struct MemoryHistory<S: HistoryState = Value> {
    inner: Rc<MemoryInner<S>>,
}

impl<S: HistoryState> Clone for MemoryHistory<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

fn create_entry<S>(to: &To, state: Option<S>) -> Result<NavigatorLocation<S>> {
    Ok(NavigatorLocation::new(
        to.to_location()?,
        StateContainer::new(state),
    ))
}

impl<S: HistoryState> MemoryHistory<S> {
    pub fn new(options: impl Into<MemoryHistoryOptions>) -> Result<Self> {
        let options = options.into();
        let mut entries = options
            .initial_entries
            .iter()
            .map(|to| create_entry(to, None))
            .collect::<Result<Vec<_>>>()?;
        if entries.is_empty() {
            entries.push(create_entry(&To::from("/"), None)?);
        }

        let mut index = options.initial_index;
        if index >= entries.len() {
            log::warn!(
                "Initial index {index} is outside of {} entries, using the last one",
                entries.len()
            );
            index = entries.len() - 1;
        }

        let container = HistoryContainer::new(entries[index].clone());
        Ok(Self {
            inner: Rc::new(MemoryInner {
                container,
                stack: RefCell::new(Stack { entries, index }),
            }),
        })
    }

    pub fn subscribe(&self, listener: impl Fn(&HistoryUpdate<S>) + 'static) -> Subscription {
        self.inner.container.subscribe(listener)
    }

    pub fn index(&self) -> usize {
        self.inner.stack.borrow().index
    }

    pub fn len(&self) -> usize {
        self.inner.stack.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.stack.borrow().entries.is_empty()
    }

    pub fn entries(&self) -> Vec<NavigatorLocation<S>> {
        self.inner.stack.borrow().entries.clone()
    }
}

impl<S: HistoryState> HistoryActions<S> for MemoryHistory<S> {
    fn push(&self, uri: &str, state: Option<S>) -> Result<()> {
        assert_absolute_uri("History.push", uri)?;
        let entry = NavigatorLocation::new(parse_path(uri)?, StateContainer::new(state));
        {
            let mut stack = self.inner.stack.borrow_mut();
            // Going somewhere new after going back starts a new branch, the old forward
            // entries are gone for good.
            let index = stack.index + 1;
            stack.entries.truncate(index);
            stack.entries.push(entry.clone());
            stack.index = index;
        }
        self.inner.container.set(entry, Action::Push);
        Ok(())
    }

    fn replace(&self, uri: &str, state: Option<S>) -> Result<()> {
        assert_absolute_uri("History.replace", uri)?;
        let entry = NavigatorLocation::new(parse_path(uri)?, StateContainer::new(state));
        {
            let mut stack = self.inner.stack.borrow_mut();
            let index = stack.index;
            stack.entries[index] = entry.clone();
        }
        self.inner.container.set(entry, Action::Replace);
        Ok(())
    }

    fn go(&self, delta: isize) -> Result<()> {
        let entry = {
            let mut stack = self.inner.stack.borrow_mut();
            let len = stack.entries.len();
            let Some(index) = stack.index.checked_add_signed(delta).filter(|i| *i < len) else {
                log::debug!("Ignoring go({delta}) at {} of {len} entries", stack.index);
                return Ok(());
            };
            stack.index = index;
            stack.entries[index].clone()
        };
        self.inner.container.set(entry, Action::Pop);
        Ok(())
    }
}

impl<S: HistoryState> History<S> for MemoryHistory<S> {
    fn location(&self) -> NavigatorLocation<S> {
        self.inner.container.location()
    }

    fn action(&self) -> Action {
        self.inner.container.action()
    }

    fn subscribe(&self, listener: Box<dyn Fn(&HistoryUpdate<S>)>) -> Subscription {
        self.inner.container.subscribe(listener)
    }

    fn create_href(&self, to: To) -> String {
        to.to_path_string()
    }

    fn release(&self) {}

    fn kind(&self) -> HistoryKind {
        HistoryKind::Memory
    }
}

#[cfg(test)]
mod test {
    use std::cell::Cell;

    use serde_json::json;

    use super::*;
    use crate::path::Location;

    fn paths(history: &MemoryHistory) -> Vec<String> {
        history
            .entries()
            .iter()
            .map(|entry| entry.location.to_string())
            .collect()
    }

    fn counted(history: &MemoryHistory) -> (Rc<Cell<u32>>, Subscription) {
        let calls = Rc::new(Cell::new(0));
        let sink = calls.clone();
        let subscription = history.subscribe(move |_: &HistoryUpdate| sink.set(sink.get() + 1));
        (calls, subscription)
    }

    #[test]
    fn defaults_to_root() {
        let history = MemoryHistory::<Value>::new(MemoryHistoryOptions::default()).unwrap();
        assert_eq!(paths(&history), vec!["/"]);
        assert_eq!(history.index(), 0);
        assert_eq!(history.action(), Action::Pop);
    }

    #[test]
    fn initial_path_string() {
        let history = MemoryHistory::<Value>::new("/start?x#y").unwrap();
        assert_eq!(history.location().to_string(), "/start?x#y");
        assert!(MemoryHistory::<Value>::new("start").is_err());
    }

    #[test]
    fn initial_entries_and_index() {
        let history = MemoryHistory::<Value>::new(MemoryHistoryOptions {
            initial_entries: vec![
                "/a".into(),
                Location {
                    pathname: "/b".to_string(),
                    search: "?q".to_string(),
                    hash: String::new(),
                }
                .into(),
                "/c".into(),
            ],
            initial_index: 1,
        })
        .unwrap();
        assert_eq!(history.location().to_string(), "/b?q");
        assert_eq!(history.len(), 3);

        history.go(1).unwrap();
        assert_eq!(history.location().pathname, "/c");
    }

    #[test]
    fn out_of_range_initial_index_is_clamped() {
        let history = MemoryHistory::<Value>::new(MemoryHistoryOptions {
            initial_entries: vec!["/a".into(), "/b".into()],
            initial_index: 9,
        })
        .unwrap();
        assert_eq!(history.index(), 1);
    }

    #[test]
    fn push_discards_the_forward_branch() {
        let history = MemoryHistory::<Value>::new(MemoryHistoryOptions::default()).unwrap();
        history.push("/a", None).unwrap();
        history.push("/b", None).unwrap();
        history.go(-1).unwrap();
        assert_eq!(history.location().pathname, "/a");
        assert_eq!(history.index(), 1);

        history.push("/c", None).unwrap();
        assert_eq!(paths(&history), vec!["/", "/a", "/c"]);
        assert_eq!(history.index(), 2);

        let (calls, _subscription) = counted(&history);
        history.go(1).unwrap();
        assert_eq!(history.index(), 2);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn go_out_of_bounds_is_silent() {
        let history = MemoryHistory::<Value>::new(MemoryHistoryOptions::default()).unwrap();
        let (calls, _subscription) = counted(&history);
        history.go(1).unwrap();
        history.go(-1).unwrap();
        history.go(isize::MIN).unwrap();
        history.go(isize::MAX).unwrap();
        assert_eq!(history.index(), 0);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn replace_overwrites_in_place_with_a_new_key() {
        let history = MemoryHistory::<Value>::new("/a").unwrap();
        let before = history.location().key;
        history.replace("/b", Some(json!({ "from": "a" }))).unwrap();
        assert_eq!(paths(&history), vec!["/b"]);
        assert_ne!(history.location().key, before);
        assert_eq!(history.location().state, Some(json!({ "from": "a" })));
        assert_eq!(history.action(), Action::Replace);
    }

    #[test]
    fn pop_keeps_keys_and_state() {
        let history = MemoryHistory::<Value>::new("/").unwrap();
        history.push("/a", Some(json!(1))).unwrap();
        let key = history.location().key;
        history.push("/b", None).unwrap();
        history.go(-1).unwrap();
        assert_eq!(history.location().key, key);
        assert_eq!(history.location().state, Some(json!(1)));
        assert_eq!(history.action(), Action::Pop);
    }

    #[test]
    fn invalid_uris_leave_the_stack_alone() {
        let history = MemoryHistory::<Value>::new("/").unwrap();
        let (calls, _subscription) = counted(&history);
        assert!(history.push("relative", None).is_err());
        assert!(history.replace("#hash", None).is_err());
        assert_eq!(paths(&history), vec!["/"]);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn href_is_identity_and_release_is_harmless() {
        let history = MemoryHistory::<Value>::new("/").unwrap();
        assert_eq!(history.create_href("/path?search#hash".into()), "/path?search#hash");
        assert_eq!(
            history.create_href(
                Location {
                    pathname: "/b".to_string(),
                    search: String::new(),
                    hash: "#c".to_string(),
                }
                .into()
            ),
            "/b#c"
        );
        history.release();
        history.push("/after", None).unwrap();
        assert_eq!(history.location().pathname, "/after");
    }

    #[test]
    fn instances_are_independent() {
        let first = MemoryHistory::<Value>::new("/").unwrap();
        let second = MemoryHistory::<Value>::new("/").unwrap();
        first.push("/only-first", None).unwrap();
        assert_eq!(second.location().pathname, "/");
        assert_eq!(second.len(), 1);

        let shared = first.clone();
        shared.push("/shared", None).unwrap();
        assert_eq!(first.location().pathname, "/shared");
    }
}
