//! Ordered header map with case-insensitive names.

/// A case-insensitive, multi-value HTTP header map.
///
/// Entries keep insertion order. [`insert`](Self::insert) appends, while
/// [`set`](Self::set) replaces every existing value for the name, which is
/// what the router uses for the `Allow` header on `405` responses.
///
/// # Examples
///
/// ```
/// use segroute::http::Headers;
///
/// let mut headers = Headers::new();
/// headers.insert("Allow", "GET");
/// headers.set("allow", "GET, PUT");
///
/// assert_eq!(headers.get("ALLOW"), Some("GET, PUT"));
/// assert_eq!(headers.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Appends a value; earlier values for the same name are kept.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Replaces all values for `name` with a single `value`.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.remove(&name);
        self.entries.push((name, value.into()));
    }

    /// Returns the first value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns every value for `name`, in insertion order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Removes every entry named `name`, returning whether anything was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.entries.len() < before
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case() {
        let mut h = Headers::new();
        h.insert("Content-Type", "text/plain");
        assert_eq!(h.get("content-type"), Some("text/plain"));
        assert_eq!(h.get("CONTENT-TYPE"), Some("text/plain"));
    }

    #[test]
    fn get_outlives_the_name_it_was_given() {
        let mut h = Headers::new();
        h.insert("Allow", "GET");
        let value = {
            let name = String::from("allow");
            h.get(&name)
        };
        assert_eq!(value, Some("GET"));
    }

    #[test]
    fn insert_keeps_every_value() {
        let mut h = Headers::new();
        h.insert("Set-Cookie", "a=1");
        h.insert("set-cookie", "b=2");
        let vals: Vec<_> = h.get_all("SET-COOKIE").collect();
        assert_eq!(vals, vec!["a=1", "b=2"]);
    }

    #[test]
    fn set_replaces_previous_values() {
        let mut h = Headers::new();
        h.insert("Allow", "GET");
        h.insert("X-Other", "1");
        h.insert("allow", "PUT");
        h.set("Allow", "GET, PUT");
        let vals: Vec<_> = h.get_all("allow").collect();
        assert_eq!(vals, vec!["GET, PUT"]);
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn remove_reports_whether_anything_went() {
        let mut h = Headers::new();
        h.insert("X-Foo", "bar");
        assert!(h.remove("x-foo"));
        assert!(h.is_empty());
        assert!(!h.remove("x-foo"));
        assert!(!h.contains("x-foo"));
    }
}
