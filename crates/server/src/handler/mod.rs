pub mod index;
pub mod proxy;

/// Split `/profile/rest/of/path` into `("profile", "rest/of/path")`.
pub(crate) fn split_profile_path(path: &str) -> (&str, &str) {
    let path = path.trim_start_matches('/');
    path.split_once('/').unwrap_or((path, ""))
}
