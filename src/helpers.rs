use crate::Error;
use percent_encoding::percent_decode_str;
use std::any::Any;

pub(crate) fn percent_decode_request_path(val: &str) -> crate::Result<String> {
    percent_decode_str(val)
        .decode_utf8()
        .map(|val| val.into_owned())
        .map_err(|e| Error::PathDecode(e.to_string()).into())
}

/// Gives every path a leading slash and strips trailing ones, so `/users/` and `/users` compare equal.
/// The root stays `/`.
pub(crate) fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_owned();
    }

    if trimmed.starts_with('/') {
        trimmed.to_owned()
    } else {
        format!("/{}", trimmed)
    }
}

/// Joins a consumed mount prefix and a child path without doubling the slash.
pub(crate) fn join_paths(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    }
}

pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_normalize_trailing_slashes() {
        assert_eq!(normalize_path("/users/"), "/users");
        assert_eq!(normalize_path("/users///"), "/users");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("users/42"), "/users/42");
    }

    #[test]
    fn should_decode_percent_encoded_paths() {
        assert_eq!(percent_decode_request_path("/a%20b").unwrap(), "/a b");
        assert!(percent_decode_request_path("/%FF").is_err());
    }

    #[test]
    fn should_join_paths() {
        assert_eq!(join_paths("/api", "/items"), "/api/items");
        assert_eq!(join_paths("/api/", "/items"), "/api/items");
        assert_eq!(join_paths("", "/items"), "/items");
    }
}
