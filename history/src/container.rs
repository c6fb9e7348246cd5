use std::{cell::RefCell, rc::Rc};

use crate::{
    history::{Action, HistoryUpdate, NavigatorLocation},
    state::HistoryState,
    subscribable::{Subscribable, Subscription},
};

/// Owns the canonical `(location, action)` pair shared by every backend.
///
/// [`set`](Self::set) is the only writer. It swaps both fields under one borrow, so a
/// reader never sees a location paired with the wrong action, and then notifies every
/// subscriber before returning.
pub struct HistoryContainer<S> {
    current: Rc<RefCell<HistoryUpdate<S>>>,
    subscribable: Subscribable<HistoryUpdate<S>>,
}

impl<S: HistoryState> HistoryContainer<S> {
    pub fn new(initial_location: NavigatorLocation<S>) -> Self {
        let current = Rc::new(RefCell::new(HistoryUpdate {
            location: initial_location,
            action: Action::Pop,
        }));
        let source = current.clone();
        Self {
            current,
            subscribable: Subscribable::new(move || source.borrow().clone()),
        }
    }

    pub fn location(&self) -> NavigatorLocation<S> {
        self.current.borrow().location.clone()
    }

    pub fn action(&self) -> Action {
        self.current.borrow().action
    }

    pub fn snapshot(&self) -> HistoryUpdate<S> {
        self.current.borrow().clone()
    }

    pub(crate) fn set(&self, location: NavigatorLocation<S>, action: Action) {
        log::debug!("{action} {} (key {})", location.location, location.key);
        {
            let mut current = self.current.borrow_mut();
            current.location = location;
            current.action = action;
        }
        self.subscribable.notify();
    }

    pub fn subscribe(&self, listener: impl Fn(&HistoryUpdate<S>) + 'static) -> Subscription {
        self.subscribable.subscribe(listener)
    }

    pub(crate) fn set_lifecycle(
        &self,
        on_init: impl Fn() + 'static,
        on_destroy: impl Fn() + 'static,
    ) {
        self.subscribable.set_lifecycle(on_init, on_destroy);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribable.len()
    }
}

#[cfg(test)]
mod test {
    use serde_json::Value;

    use super::*;
    use crate::{path::parse_path, state::StateContainer};

    fn entry(path: &str) -> NavigatorLocation<Value> {
        NavigatorLocation::new(parse_path(path).unwrap(), StateContainer::new(None))
    }

    #[test]
    fn starts_as_pop() {
        let container = HistoryContainer::new(entry("/start"));
        assert_eq!(container.action(), Action::Pop);
        assert_eq!(container.location().pathname, "/start");
    }

    #[test]
    fn set_replaces_both_fields_and_notifies() {
        let container = HistoryContainer::new(entry("/"));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let _subscription = container.subscribe(move |update| {
            sink.borrow_mut()
                .push((update.location.pathname.clone(), update.action));
        });

        container.set(entry("/a"), Action::Push);
        container.set(entry("/b"), Action::Replace);

        assert_eq!(
            *seen.borrow(),
            vec![
                ("/".to_string(), Action::Pop),
                ("/a".to_string(), Action::Push),
                ("/b".to_string(), Action::Replace),
            ]
        );
        assert_eq!(container.snapshot().action, Action::Replace);
    }

    #[test]
    fn listeners_can_read_back_during_notify() {
        let container = Rc::new(HistoryContainer::new(entry("/")));
        let reader = Rc::downgrade(&container);
        let matches = Rc::new(RefCell::new(Vec::new()));
        let sink = matches.clone();
        let _subscription = container.subscribe(move |update| {
            if let Some(container) = reader.upgrade() {
                sink.borrow_mut()
                    .push(container.location() == update.location);
            }
        });
        container.set(entry("/x"), Action::Push);
        assert_eq!(*matches.borrow(), vec![true, true]);
    }
}
