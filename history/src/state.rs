use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Key reported for entries the history did not create itself, e.g. the page the
/// user typed into the address bar.
pub const INITIAL_KEY: &str = "initial";

/// Caller supplied state that can be stored with a history entry.
pub trait HistoryState: Clone + Serialize + DeserializeOwned + 'static {}

impl<T: Clone + Serialize + DeserializeOwned + 'static> HistoryState for T {}

/// The blob written into the platform's per-entry state slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateContainer<S> {
    pub value: Option<S>,
    pub key: String,
}

impl<S> StateContainer<S> {
    /// Wraps `value` with a freshly generated key.
    pub fn new(value: Option<S>) -> Self {
        Self {
            value,
            key: create_key(),
        }
    }
}

impl<S: HistoryState> StateContainer<S> {
    /// Reads back a blob previously persisted by the platform.
    ///
    /// The blob is untrusted. Anything missing or of the wrong shape falls back to a
    /// `null` value and the [`INITIAL_KEY`].
    pub fn recover(blob: Option<&Value>) -> Self {
        let Some(Value::Object(fields)) = blob else {
            return Self::initial();
        };
        let key = fields
            .get("key")
            .and_then(Value::as_str)
            .filter(|key| !key.is_empty())
            .map_or_else(|| INITIAL_KEY.to_string(), str::to_string);
        let value = fields
            .get("value")
            .filter(|value| !value.is_null())
            .and_then(|value| serde_json::from_value(value.clone()).ok());
        Self { value, key }
    }

    pub fn initial() -> Self {
        Self {
            value: None,
            key: INITIAL_KEY.to_string(),
        }
    }
}

pub fn create_key() -> String {
    let mut key = Uuid::new_v4().simple().to_string();
    key.truncate(12);
    key
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Scroll {
        y: u32,
    }

    #[test]
    fn keys_are_fresh() {
        let a = StateContainer::<Value>::new(None);
        let b = StateContainer::<Value>::new(None);
        assert_ne!(a.key, b.key);
        assert_eq!(a.key.len(), 12);
    }

    #[test]
    fn recovers_persisted_blob() {
        let blob = serde_json::to_value(StateContainer {
            value: Some(Scroll { y: 40 }),
            key: "abc".to_string(),
        })
        .unwrap();
        let recovered = StateContainer::<Scroll>::recover(Some(&blob));
        assert_eq!(recovered.value, Some(Scroll { y: 40 }));
        assert_eq!(recovered.key, "abc");
    }

    #[test]
    fn malformed_blobs_fall_back() {
        let initial = StateContainer::<Scroll>::initial();
        assert_eq!(StateContainer::<Scroll>::recover(None), initial);
        assert_eq!(StateContainer::<Scroll>::recover(Some(&Value::Null)), initial);
        assert_eq!(StateContainer::<Scroll>::recover(Some(&json!(7))), initial);
        assert_eq!(
            StateContainer::<Scroll>::recover(Some(&json!({ "key": 3, "value": "x" }))),
            initial
        );

        // A good key survives a value of the wrong shape
        let recovered = StateContainer::<Scroll>::recover(Some(&json!({
            "key": "k1",
            "value": { "x": 1 },
        })));
        assert_eq!(recovered.value, None);
        assert_eq!(recovered.key, "k1");
    }
}
