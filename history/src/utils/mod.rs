#[cfg(target_arch = "wasm32")]
pub mod jserror;

#[cfg(target_arch = "wasm32")]
pub use jserror::JsErr;
