//! Cache-key construction.
//!
//! Every cache key is a 32-byte BLAKE3 digest. Inputs are normalized *before*
//! hashing, so semantically-equal requests land on the same key. A key that is
//! built from un-normalized text does not fail, it just never hits.

use blake3::Hasher;

/// A normalized, order-sensitive cache key.
pub type CacheKey = [u8; 32];

/// Hashes raw text (embedding lookups key on the exact text).
#[inline]
pub fn hash_text(text: &str) -> CacheKey {
    *blake3::hash(text.as_bytes()).as_bytes()
}

/// Removes line breaks so reformatted occurrences share a key.
pub fn strip_newlines(text: &str) -> String {
    text.chars().filter(|c| *c != '\n' && *c != '\r').collect()
}

/// Incremental builder for composite keys.
///
/// Each field is length-prefixed, so `("ab", "c")` and `("a", "bc")` never collide.
#[derive(Debug, Clone)]
pub struct KeyBuilder {
    hasher: Hasher,
}

impl KeyBuilder {
    /// Starts a key in the given namespace (one namespace per cache flavour).
    pub fn new(namespace: &str) -> Self {
        let mut builder = Self {
            hasher: Hasher::new(),
        };
        builder.push_text(namespace);
        builder
    }

    /// Appends a text field verbatim.
    pub fn text(mut self, value: &str) -> Self {
        self.push_text(value);
        self
    }

    /// Appends a text field with line breaks removed.
    pub fn stripped_text(self, value: &str) -> Self {
        self.text(&strip_newlines(value))
    }

    /// Appends a float by its bit pattern.
    pub fn float(mut self, value: f64) -> Self {
        self.hasher.update(&value.to_bits().to_le_bytes());
        self
    }

    pub fn finish(self) -> CacheKey {
        *self.hasher.finalize().as_bytes()
    }

    fn push_text(&mut self, value: &str) {
        self.hasher.update(&(value.len() as u64).to_le_bytes());
        self.hasher.update(value.as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_hash_text_determinism() {
        let text = "HTTP request with Content-Type application/json";

        let hash1 = hash_text(text);
        let hash2 = hash_text(text);

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 32);
    }

    #[test]
    fn test_hash_text_is_exact() {
        let texts = [
            "String toString()",
            "string toString()",
            "String toString() ",
            "String\ntoString()",
        ];

        let hashes: HashSet<_> = texts.iter().map(|t| hash_text(t)).collect();
        assert_eq!(hashes.len(), texts.len());
    }

    #[test]
    fn test_strip_newlines() {
        assert_eq!(strip_newlines("a\nb\r\nc"), "abc");
        assert_eq!(strip_newlines("no breaks"), "no breaks");
        assert_eq!(strip_newlines(""), "");
    }

    #[test]
    fn test_stripped_text_normalizes_line_breaks() {
        let a = KeyBuilder::new("related")
            .text("query")
            .stripped_text("client.post(url)\n    .send()")
            .finish();
        let b = KeyBuilder::new("related")
            .text("query")
            .stripped_text("client.post(url)    .send()")
            .finish();

        assert_eq!(a, b);
    }

    #[test]
    fn test_field_boundaries_prevent_ambiguity() {
        let a = KeyBuilder::new("ns").text("ab").text("c").finish();
        let b = KeyBuilder::new("ns").text("a").text("bc").finish();

        assert_ne!(a, b);
    }

    #[test]
    fn test_namespace_separates_keys() {
        let a = KeyBuilder::new("embed").text("x").finish();
        let b = KeyBuilder::new("generate").text("x").finish();

        assert_ne!(a, b);
    }

    #[test]
    fn test_float_fields_are_sensitive() {
        let a = KeyBuilder::new("ns").float(0.59).finish();
        let b = KeyBuilder::new("ns").float(0.5932).finish();

        assert_ne!(a, b);
    }
}
