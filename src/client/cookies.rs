// Cookie Reader: pulls the CSRF token out of a Cookie header string

/// Cookie Django stores the CSRF token in
pub const DEFAULT_CSRF_COOKIE: &str = "csrftoken";

/// Value of `name` in a `k=v; k2=v2` cookie string, percent-decoded
pub fn get_cookie(cookies: &str, name: &str) -> Option<String> {
    if cookies.trim().is_empty() {
        return None;
    }
    cookies
        .split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix(name)?.strip_prefix('='))
        .map(|raw| match urlencoding::decode(raw) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => raw.to_string(),
        })
}
