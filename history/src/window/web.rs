use std::cell::{Cell, RefCell};

use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::{prelude::Closure, JsCast};

use super::{HostWindow, ListenerId, WindowEvent};
use crate::{
    error::{HistoryError, Result},
    path::Location,
    utils::JsErr,
};

/// The browser's own window, driven through the HTML5 History API.
pub struct WebWindow {
    window: web_sys::Window,
    history: web_sys::History,
    listeners: RefCell<Vec<(ListenerId, WindowEvent, Closure<dyn Fn()>)>>,
    next_listener: Cell<u64>,
}

impl WebWindow {
    pub fn ambient() -> Option<Self> {
        Self::from_window(web_sys::window()?)
    }

    pub fn from_window(window: web_sys::Window) -> Option<Self> {
        window.document()?;
        let history = window.history().ok()?;
        Some(Self {
            window,
            history,
            listeners: RefCell::new(Vec::new()),
            next_listener: Cell::new(0),
        })
    }

    fn to_js(state: &Value) -> Result<wasm_bindgen::JsValue> {
        state
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(|e| HistoryError::StateConversion(e.to_string()))
    }
}

impl Drop for WebWindow {
    fn drop(&mut self) {
        for (_, event, cb) in self.listeners.borrow_mut().drain(..) {
            if let Err(e) = self
                .window
                .remove_event_listener_with_callback(event.name(), cb.as_ref().unchecked_ref())
            {
                log::error!("Failed to remove {} listener: {}", event.name(), JsErr::from(e));
            }
        }
    }
}

impl HostWindow for WebWindow {
    fn is_available(&self) -> bool {
        self.window.document().is_some()
    }

    fn location(&self) -> Location {
        let location = self.window.location();
        Location {
            pathname: location.pathname().unwrap_or_else(|_| "/".to_string()),
            search: location.search().unwrap_or_default(),
            hash: location.hash().unwrap_or_default(),
        }
    }

    fn history_state(&self) -> Option<Value> {
        let state = self.history.state().ok()?;
        if state.is_null() || state.is_undefined() {
            return None;
        }
        serde_wasm_bindgen::from_value(state).ok()
    }

    fn push_state(&self, state: Value, url: &str) -> Result<()> {
        self.history
            .push_state_with_url(&Self::to_js(&state)?, "", Some(url))
            .map_err(JsErr::from)?;
        Ok(())
    }

    fn replace_state(&self, state: Value, url: &str) -> Result<()> {
        self.history
            .replace_state_with_url(&Self::to_js(&state)?, "", Some(url))
            .map_err(JsErr::from)?;
        Ok(())
    }

    fn go(&self, delta: isize) -> Result<()> {
        let delta = i32::try_from(delta).unwrap_or(if delta < 0 { i32::MIN } else { i32::MAX });
        self.history.go_with_delta(delta).map_err(JsErr::from)?;
        Ok(())
    }

    fn assign(&self, url: &str) -> Result<()> {
        self.window.location().assign(url).map_err(JsErr::from)?;
        Ok(())
    }

    fn add_listener(&self, event: WindowEvent, handler: Box<dyn Fn()>) -> ListenerId {
        let id = ListenerId::new(self.next_listener.get());
        self.next_listener.set(self.next_listener.get() + 1);

        let cb = Closure::wrap(handler);
        if let Err(e) = self
            .window
            .add_event_listener_with_callback(event.name(), cb.as_ref().unchecked_ref())
        {
            log::error!("Failed to add {} listener: {}", event.name(), JsErr::from(e));
        }
        self.listeners.borrow_mut().push((id, event, cb));
        id
    }

    fn remove_listener(&self, id: ListenerId) {
        let mut listeners = self.listeners.borrow_mut();
        let Some(pos) = listeners.iter().position(|(listener_id, _, _)| *listener_id == id) else {
            return;
        };
        let (_, event, cb) = listeners.remove(pos);
        if let Err(e) = self
            .window
            .remove_event_listener_with_callback(event.name(), cb.as_ref().unchecked_ref())
        {
            log::error!("Failed to remove {} listener: {}", event.name(), JsErr::from(e));
        }
    }
}
