use std::{
    collections::BTreeMap,
    fmt,
    str::{FromStr, Split},
};

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use url::form_urlencoded::{self, Parse};

use crate::error::{HistoryError, Result};

/// A path split into its three url components.
///
/// `pathname` is never empty, `search` is either empty or starts with `?` and `hash`
/// is either empty or starts with `#`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub pathname: String,
    pub search: String,
    pub hash: String,
}

impl Default for Location {
    fn default() -> Self {
        Self {
            pathname: "/".to_string(),
            search: String::new(),
            hash: String::new(),
        }
    }
}

impl Location {
    pub fn path_segments(&self) -> Option<Split<'_, char>> {
        self.pathname
            .strip_prefix('/')
            .map(|remainder| remainder.split('/'))
    }

    pub fn query_iter(&self) -> Parse<'_> {
        form_urlencoded::parse(
            self.search
                .strip_prefix('?')
                .unwrap_or(&self.search)
                .as_bytes(),
        )
    }

    pub fn query_pairs(&self) -> BTreeMap<String, String> {
        self.query_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

// A lone "?" or "#" carries no information.
fn normalize_fragment(fragment: &str) -> &str {
    if fragment.len() == 1 {
        ""
    } else {
        fragment
    }
}

/// Splits a path like `"/search?q=falafel#result-3"` into a [`Location`].
///
/// Only absolute paths can be parsed. Search or hash only paths (`"?q=1"`, `"#top"`)
/// get a pathname of `"/"`, as does the empty string.
pub fn parse_path(path: &str) -> Result<Location> {
    if !path.is_empty() && !path.starts_with(['/', '?', '#']) {
        return Err(HistoryError::invalid(
            "parsePath",
            "First argument must start with \"/\", \"?\" or \"#\".",
            path,
        ));
    }

    let (pathname_and_search, hash) = match path.find('#') {
        Some(pos) => path.split_at(pos),
        None => (path, ""),
    };
    let (pathname, search) = match pathname_and_search.find('?') {
        Some(pos) => pathname_and_search.split_at(pos),
        None => (pathname_and_search, ""),
    };

    Ok(Location {
        pathname: (if pathname.is_empty() { "/" } else { pathname }).to_string(),
        search: normalize_fragment(search).to_string(),
        hash: normalize_fragment(hash).to_string(),
    })
}

/// Joins a [`Location`] back into a single path string.
pub fn stringify_path(location: &Location) -> String {
    let mut path = String::with_capacity(
        location.pathname.len() + location.search.len() + location.hash.len(),
    );
    path.push_str(&location.pathname);
    path.push_str(&location.search);
    path.push_str(&location.hash);
    path
}

/// Characters that stay literal when a path is encoded: alphanumerics, the reserved
/// delimiters and the unreserved marks.
const URI_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b';')
    .remove(b',')
    .remove(b'/')
    .remove(b'?')
    .remove(b':')
    .remove(b'@')
    .remove(b'&')
    .remove(b'=')
    .remove(b'+')
    .remove(b'$')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'#');

/// Escapes of these stay escaped, since decoding them would change how the path splits.
const URI_RESERVED: &[u8] = b";/?:@&=+$,#";

/// Splits `path` at the first escape of a reserved character, returning the text before
/// it, the escape itself and the rest.
fn split_at_reserved_escape(path: &str) -> (&str, &str, &str) {
    let bytes = path.as_bytes();
    let found = bytes.iter().enumerate().find_map(|(i, byte)| {
        let hex = bytes.get(i + 1..i + 3)?;
        if *byte != b'%' || !hex.iter().all(u8::is_ascii_hexdigit) {
            return None;
        }
        let decoded = u8::from_str_radix(std::str::from_utf8(hex).ok()?, 16).ok()?;
        URI_RESERVED.contains(&decoded).then_some(i)
    });
    match found {
        Some(i) => (&path[..i], &path[i..i + 3], &path[i + 3..]),
        None => (path, "", ""),
    }
}

/// Decodes a pathname read from the platform and encodes it again, so every escape
/// is spelled the same way: `/caf%c3%a9` becomes `/caf%C3%A9` and `/%41bc` becomes
/// `/Abc`. Escaped delimiters such as `%2F` are kept. A path whose escapes are not
/// valid UTF-8 is returned as is.
pub(crate) fn normalize_pathname(pathname: &str) -> String {
    let mut normalized = String::with_capacity(pathname.len());
    let mut rest = pathname;
    while !rest.is_empty() {
        let (chunk, escape, tail) = split_at_reserved_escape(rest);
        match percent_decode_str(chunk).decode_utf8() {
            Ok(decoded) => normalized.extend(utf8_percent_encode(&decoded, URI_ENCODE_SET)),
            Err(e) => {
                log::warn!("Pathname {pathname:?} could not be decoded ({e}), keeping it as is");
                return pathname.to_string();
            }
        }
        normalized.push_str(escape);
        rest = tail;
    }
    normalized
}

impl FromStr for Location {
    type Err = HistoryError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        parse_path(path)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.pathname, self.search, self.hash)
    }
}

/// A navigation target, either a raw path or an already split location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum To {
    Path(String),
    Location(Location),
}

impl To {
    pub fn to_path_string(&self) -> String {
        match self {
            To::Path(path) => path.clone(),
            To::Location(location) => stringify_path(location),
        }
    }

    pub fn to_location(&self) -> Result<Location> {
        match self {
            To::Path(path) => parse_path(path),
            To::Location(location) => Ok(location.clone()),
        }
    }
}

impl From<&str> for To {
    fn from(path: &str) -> Self {
        To::Path(path.to_string())
    }
}

impl From<String> for To {
    fn from(path: String) -> Self {
        To::Path(path)
    }
}

impl From<Location> for To {
    fn from(location: Location) -> Self {
        To::Location(location)
    }
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;

    fn loc(pathname: &str, search: &str, hash: &str) -> Location {
        Location {
            pathname: pathname.to_string(),
            search: search.to_string(),
            hash: hash.to_string(),
        }
    }

    #[test]
    fn parsing() {
        assert_eq!(
            parse_path("/search?q=falafel#result-3").unwrap(),
            loc("/search", "?q=falafel", "#result-3")
        );
        assert_eq!(parse_path("/routeA").unwrap(), loc("/routeA", "", ""));
        assert_eq!(parse_path("?q=1").unwrap(), loc("/", "?q=1", ""));
        assert_eq!(parse_path("#top").unwrap(), loc("/", "", "#top"));
        assert_eq!(parse_path("?q=1#top").unwrap(), loc("/", "?q=1", "#top"));
        assert_eq!(parse_path("").unwrap(), Location::default());

        // A "?" inside the hash belongs to the hash
        assert_eq!(parse_path("/a#b?c").unwrap(), loc("/a", "", "#b?c"));
    }

    #[test]
    fn lone_delimiters_normalize_away() {
        assert_eq!(parse_path("/p?#").unwrap(), loc("/p", "", ""));
        assert_eq!(parse_path("/p?#").unwrap(), parse_path("/p").unwrap());
        assert_eq!(parse_path("/p?").unwrap(), loc("/p", "", ""));
        assert_eq!(parse_path("/p#").unwrap(), loc("/p", "", ""));
    }

    #[test]
    fn relative_paths_are_rejected() {
        let err = parse_path("relative/path").unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(parse_path("http://example.com/").is_err());
    }

    #[test]
    fn stringify() {
        assert_eq!(stringify_path(&loc("", "?s", "#h")), "?s#h");
        assert_eq!(
            stringify_path(&loc("/search", "?q=falafel", "#result-3")),
            "/search?q=falafel#result-3"
        );
        assert_eq!(loc("/a", "?b", "").to_string(), "/a?b");
    }

    #[test]
    fn targets() {
        let to: To = "/a?b#c".into();
        assert_eq!(to.to_location().unwrap(), loc("/a", "?b", "#c"));
        let to: To = loc("/x", "", "#y").into();
        assert_eq!(to.to_path_string(), "/x#y");
        assert!(To::from("nope").to_location().is_err());
    }

    #[test]
    fn query_and_segments() {
        let location: Location = "/users/42/posts?sort=new&page=2".parse().unwrap();
        assert_eq!(
            location.path_segments().unwrap().collect::<Vec<_>>(),
            vec!["users", "42", "posts"]
        );
        let pairs = location.query_pairs();
        assert_eq!(pairs.get("sort").map(String::as_str), Some("new"));
        assert_eq!(pairs.get("page").map(String::as_str), Some("2"));
    }

    #[test]
    fn pathname_normalization() {
        assert_eq!(normalize_pathname("/a b"), "/a%20b");
        assert_eq!(normalize_pathname("/caf%C3%A9"), "/caf%C3%A9");
        assert_eq!(normalize_pathname("/plain/path"), "/plain/path");
        assert_eq!(normalize_pathname("/café"), "/caf%C3%A9");
    }

    #[test]
    fn pathname_escapes_are_canonicalized() {
        assert_eq!(normalize_pathname("/caf%c3%a9"), "/caf%C3%A9");
        assert_eq!(normalize_pathname("/%41bc"), "/Abc");
        assert_eq!(normalize_pathname("/100%25"), "/100%25");
        assert_eq!(normalize_pathname("/%7Euser/a%20b"), "/~user/a%20b");
    }

    #[test]
    fn escaped_delimiters_survive_normalization() {
        assert_eq!(normalize_pathname("/a%2Fb"), "/a%2Fb");
        assert_eq!(normalize_pathname("/a%3fb%23c"), "/a%3fb%23c");
        assert_eq!(normalize_pathname("/%2F%c3%a9%2F"), "/%2F%C3%A9%2F");
    }

    #[test]
    fn undecodable_pathnames_are_kept() {
        assert_eq!(normalize_pathname("/broken%C3"), "/broken%C3");
        assert_eq!(normalize_pathname("/%FF%FE"), "/%FF%FE");
    }

    proptest! {
        #[test]
        fn round_trip(
            pathname in "(/[a-z0-9._-]{0,8}){1,4}",
            search in "(\\?[a-z0-9=&]{1,10})?",
            hash in "(#[a-z0-9?/-]{1,10})?",
        ) {
            let path = format!("{pathname}{search}{hash}");
            let location = parse_path(&path).unwrap();
            prop_assert_eq!(stringify_path(&location), path);
            prop_assert_eq!(parse_path(&stringify_path(&location)).unwrap(), location);
        }
    }
}
