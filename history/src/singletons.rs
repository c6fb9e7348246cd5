//! Ready-made default instances, created on first use.
//!
//! They live per thread, since histories are single threaded. Call
//! [`release_singletons`] to detach them from the window and drop them; the next access
//! creates fresh ones.

use std::cell::RefCell;

use crate::{
    config::MemoryHistoryOptions,
    error::Result,
    history::{browser::BrowserHistory, hash::HashHistory, memory::MemoryHistory, History},
};

thread_local! {
    static BROWSER: RefCell<Option<BrowserHistory>> = const { RefCell::new(None) };
    static HASH: RefCell<Option<HashHistory>> = const { RefCell::new(None) };
    static MEMORY: RefCell<Option<MemoryHistory>> = const { RefCell::new(None) };
}

pub fn browser_history() -> Result<BrowserHistory> {
    BROWSER.with(|slot| {
        let mut slot = slot.borrow_mut();
        if let Some(history) = slot.as_ref() {
            return Ok(history.clone());
        }
        let history = BrowserHistory::new()?;
        *slot = Some(history.clone());
        Ok(history)
    })
}

pub fn hash_history() -> Result<HashHistory> {
    HASH.with(|slot| {
        let mut slot = slot.borrow_mut();
        if let Some(history) = slot.as_ref() {
            return Ok(history.clone());
        }
        let history = HashHistory::new()?;
        *slot = Some(history.clone());
        Ok(history)
    })
}

pub fn memory_history() -> Result<MemoryHistory> {
    MEMORY.with(|slot| {
        let mut slot = slot.borrow_mut();
        if let Some(history) = slot.as_ref() {
            return Ok(history.clone());
        }
        let history = MemoryHistory::new(MemoryHistoryOptions::default())?;
        *slot = Some(history.clone());
        Ok(history)
    })
}

pub fn release_singletons() {
    if let Some(history) = BROWSER.with(|slot| slot.borrow_mut().take()) {
        history.release();
    }
    if let Some(history) = HASH.with(|slot| slot.borrow_mut().take()) {
        history.release();
    }
    if let Some(history) = MEMORY.with(|slot| slot.borrow_mut().take()) {
        history.release();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{error::HistoryError, history::HistoryActions};

    #[test]
    fn memory_singleton_is_shared_until_released() {
        let first = memory_history().unwrap();
        first.push("/shared", None).unwrap();
        assert_eq!(memory_history().unwrap().location().pathname, "/shared");

        release_singletons();
        assert_eq!(memory_history().unwrap().location().pathname, "/");
        release_singletons();
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn window_singletons_need_a_page() {
        assert!(matches!(
            browser_history(),
            Err(HistoryError::EnvironmentUnavailable(_))
        ));
        assert!(matches!(
            hash_history(),
            Err(HistoryError::EnvironmentUnavailable(_))
        ));
    }
}
