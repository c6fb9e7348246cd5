use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

type Listener<T> = Rc<dyn Fn(&T)>;
type Hook = Rc<dyn Fn()>;

struct Registry<T> {
    get_state: Box<dyn Fn() -> T>,
    listeners: RefCell<Vec<(u64, Listener<T>)>>,
    next_id: Cell<u64>,
    on_init: RefCell<Option<Hook>>,
    on_destroy: RefCell<Option<Hook>>,
}

impl<T> Registry<T> {
    fn remove(&self, id: u64) {
        let now_empty = {
            let mut listeners = self.listeners.borrow_mut();
            let before = listeners.len();
            listeners.retain(|(listener_id, _)| *listener_id != id);
            listeners.len() != before && listeners.is_empty()
        };
        if now_empty {
            let hook = self.on_destroy.borrow().clone();
            if let Some(hook) = hook {
                hook();
            }
        }
    }
}

/// One-to-many notifier over a state accessor.
///
/// Every listener receives the current state once when it subscribes and again on
/// every [`notify`](Self::notify). The first subscriber triggers the `on_init` hook and
/// the last one to leave triggers `on_destroy`, so owners can keep background work
/// alive only while somebody is listening.
///
/// Notifications iterate over a snapshot of the listeners. A listener removed while a
/// notification is running still receives that notification.
pub struct Subscribable<T> {
    registry: Rc<Registry<T>>,
}

impl<T> Clone for Subscribable<T> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
        }
    }
}

impl<T: 'static> Subscribable<T> {
    pub fn new(get_state: impl Fn() -> T + 'static) -> Self {
        Self {
            registry: Rc::new(Registry {
                get_state: Box::new(get_state),
                listeners: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
                on_init: RefCell::new(None),
                on_destroy: RefCell::new(None),
            }),
        }
    }

    pub fn set_lifecycle(&self, on_init: impl Fn() + 'static, on_destroy: impl Fn() + 'static) {
        *self.registry.on_init.borrow_mut() = Some(Rc::new(on_init));
        *self.registry.on_destroy.borrow_mut() = Some(Rc::new(on_destroy));
    }

    pub fn subscribe(&self, listener: impl Fn(&T) + 'static) -> Subscription {
        if self.is_empty() {
            let hook = self.registry.on_init.borrow().clone();
            if let Some(hook) = hook {
                hook();
            }
        }

        let id = self.registry.next_id.get();
        self.registry.next_id.set(id + 1);
        let listener: Listener<T> = Rc::new(listener);
        self.registry
            .listeners
            .borrow_mut()
            .push((id, listener.clone()));

        listener(&(self.registry.get_state)());

        let registry: Weak<Registry<T>> = Rc::downgrade(&self.registry);
        Subscription::new(move || {
            if let Some(registry) = registry.upgrade() {
                registry.remove(id);
            }
        })
    }

    pub fn notify(&self) {
        let snapshot: Vec<Listener<T>> = self
            .registry
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        log::trace!("Notifying {} listeners", snapshot.len());
        for listener in snapshot {
            listener(&(self.registry.get_state)());
        }
    }

    pub fn len(&self) -> usize {
        self.registry.listeners.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.listeners.borrow().is_empty()
    }
}

/// Handle returned by `subscribe`. Dropping it removes the listener.
#[must_use = "dropping a Subscription immediately unsubscribes the listener"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    fn new(unsubscribe: impl FnOnce() + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    pub fn unsubscribe(mut self) {
        self.release();
    }

    /// Keeps the listener registered for as long as the source lives.
    pub fn forget(mut self) {
        self.unsubscribe = None;
    }

    fn release(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}
