use std::fmt;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::js_sys;

use crate::error::HistoryError;

/// A value thrown by a browser API, e.g. the `SecurityError` raised once a page
/// calls `pushState` too often.
#[derive(Debug)]
pub struct JsErr {
    name: Option<String>,
    message: String,
}

impl fmt::Display for JsErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl From<JsValue> for JsErr {
    fn from(value: JsValue) -> Self {
        match value.dyn_into::<js_sys::Error>() {
            Ok(error) => JsErr {
                name: Some(String::from(error.name())),
                message: String::from(error.message()),
            },
            Err(value) => JsErr {
                name: None,
                message: String::from(js_sys::JsString::from(value)),
            },
        }
    }
}

impl From<JsErr> for HistoryError {
    fn from(error: JsErr) -> Self {
        HistoryError::Platform(error.to_string())
    }
}
