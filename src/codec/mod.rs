use serde::Serialize;

pub mod aes;
pub mod signature;

/// Request fields in the exact order the provider's signature or hash
/// verification expects. Reordering silently invalidates signatures, so the
/// order is part of the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderedFields(Vec<(String, String)>);

impl OrderedFields {
    pub fn new() -> Self {
        OrderedFields(Vec::new())
    }

    /// Literal order: fields appear exactly as pushed.
    pub fn push(&mut self, key: &str, value: impl Into<String>) {
        self.0.push((key.to_string(), value.into()));
    }

    /// Lexicographic order, for providers that hash over sorted fields.
    pub fn sorted(pairs: Vec<(&str, String)>) -> Self {
        let mut pairs: Vec<(String, String)> =
            pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        OrderedFields(pairs)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for OrderedFields {
    fn default() -> Self {
        Self::new()
    }
}

/// Order-preserving form encoding of the fields. Deterministic: the same
/// fields always produce byte-identical output.
pub fn urlencode(fields: &OrderedFields) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in fields.iter() {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

/// Like `urlencode`, but `:` and `/` stay unescaped. Providers that hash
/// over the field string compare URL and timestamp values raw, so escaping
/// them would invalidate the hash.
pub fn urlencode_keeping_url_chars(fields: &OrderedFields) -> String {
    urlencode(fields).replace("%3A", ":").replace("%2F", "/")
}

/// Append encoded fields to a base URL as its query string.
pub fn with_query(base_url: &str, fields: &OrderedFields) -> String {
    format!("{}?{}", base_url, urlencode(fields))
}
