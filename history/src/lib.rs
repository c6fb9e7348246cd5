#![allow(
    clippy::module_name_repetitions,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::must_use_candidate,
    clippy::missing_errors_doc
)]
#![warn(
    clippy::all,
    rust_2018_idioms,
    rust_2021_compatibility,
    rust_2024_compatibility
)]

//! Navigation history with interchangeable backends.
//!
//! A [`BrowserHistory`] keeps the location in the address bar, a [`HashHistory`] keeps
//! it in the fragment after `#`, and a [`MemoryHistory`] keeps a stack in memory. All
//! of them implement [`History`]: read the current [`NavigatorLocation`] and
//! [`Action`], `push`, `replace` or `go`, and subscribe to every change.
//!
//! ```
//! use navigator_history::prelude::*;
//!
//! let history = MemoryHistory::<serde_json::Value>::new("/").unwrap();
//! let _subscription = history.subscribe(|update: &HistoryUpdate| {
//!     println!("{} {}", update.action, update.location.location);
//! });
//! history.navigate("/search?q=falafel".into(), None).unwrap();
//! assert_eq!(history.location().search, "?q=falafel");
//! assert_eq!(history.action(), Action::Push);
//! ```

pub mod config;
pub mod container;
pub mod error;
pub mod history;
pub mod navigate;
pub mod path;
pub mod singletons;
pub mod state;
pub mod subscribable;
mod utils;
pub mod window;

pub use config::{create_history, HistoryConfig, MemoryHistoryOptions};
pub use error::{HistoryError, Result};
pub use history::{
    browser::BrowserHistory, hash::HashHistory, memory::MemoryHistory, Action, History,
    HistoryActions, HistoryKind, HistoryUpdate, NavigatorLocation,
};
pub use navigate::{navigate, NavigateOptions, NavigateTo};
pub use path::{parse_path, stringify_path, Location, To};
pub use state::HistoryState;
pub use subscribable::Subscription;
pub use window::{DefaultWindow, HostWindow};

pub mod prelude {
    pub use crate::{
        Action, BrowserHistory, HashHistory, History, HistoryActions, HistoryUpdate, Location,
        MemoryHistory, NavigateOptions, NavigateTo, NavigatorLocation,
    };
}
