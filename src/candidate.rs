//! Candidates extracted from corpus units.
//!
//! A candidate has two renderings: a *signature* that is embedded and compared to
//! the query, and a *pattern* used for the cheap syntactic pre-filter in the
//! classify pass. Candidates are deduplicated by pattern.

use serde::{Deserialize, Serialize};

/// Marker that identifies constructor patterns; those keep their angle brackets.
pub const CONSTRUCTOR_MARKER: &str = "<constructor>";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate {
    /// Text embedded for ranking, e.g. `boolean add(E e)`.
    pub signature: String,
    /// Matchable pattern, e.g. `java.util.List add(..)`.
    pub pattern: String,
}

impl Candidate {
    pub fn new(signature: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            signature: signature.into(),
            pattern: pattern.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(rename = "type")]
    pub type_name: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Structured description of a used method, as reported by a syntax-tree walker.
pub struct MethodShape {
    #[serde(default)]
    pub declaring_type: Option<String>,
    pub name: String,
    #[serde(default)]
    pub return_type: Option<String>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl MethodShape {
    /// `"{Ret} {name}({T p, ...})"` with package prefixes dropped.
    pub fn signature(&self) -> String {
        let ret = self
            .return_type
            .as_deref()
            .map(simple_type_name)
            .unwrap_or_default();
        let params = self
            .parameters
            .iter()
            .map(|p| format!("{} {}", simple_type_name(&p.type_name), p.name))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{ret} {}({params})", self.name)
    }

    /// `"{declaring_type} {name}(..)"`.
    pub fn pattern(&self) -> String {
        format!(
            "{} {}(..)",
            self.declaring_type.as_deref().unwrap_or_default(),
            self.name
        )
    }

    pub fn to_candidate(&self) -> Candidate {
        Candidate::new(self.signature(), self.pattern())
    }
}

/// Drops package qualifiers from a type name, keeping one generic argument.
///
/// `java.util.List<java.lang.String>` becomes `List<String>`. Only the last
/// argument before the first closing or nested bracket survives, so
/// `java.util.Map<java.lang.String, java.lang.Integer>` becomes `Map<Integer>`.
pub fn simple_type_name(qualified: &str) -> String {
    let mut parts = qualified.split(['<', '>']);
    let outer = parts.next().unwrap_or_default();
    let inner = parts.next().unwrap_or_default();

    let outer = after_last_dot(outer);
    let inner = after_last_dot(inner);
    if inner.is_empty() {
        outer.to_string()
    } else {
        format!("{outer}<{inner}>")
    }
}

fn after_last_dot(name: &str) -> &str {
    name.rfind('.').map_or(name, |i| &name[i + 1..])
}

/// Removes every `<...>` group, nested ones included.
///
/// Unbalanced closing brackets are kept as-is.
pub fn strip_generics(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut depth = 0usize;
    for c in pattern.chars() {
        match c {
            '<' => depth += 1,
            '>' if depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
/// A Top-K pattern in its matchable form.
pub struct MethodPattern {
    raw: String,
    normalized: String,
}

impl MethodPattern {
    /// Normalizes `raw`: generic arguments are stripped unless it is a constructor
    /// pattern, and whitespace runs collapse to one space.
    pub fn materialize(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            normalized: normalize_pattern(raw),
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn as_str(&self) -> &str {
        &self.normalized
    }

    pub fn is_constructor(&self) -> bool {
        self.raw.contains(CONSTRUCTOR_MARKER)
    }

    /// Whether an occurrence reported under `pattern` falls under this one.
    pub fn matches(&self, pattern: &str) -> bool {
        normalize_pattern(pattern) == self.normalized
    }
}

impl std::fmt::Display for MethodPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.normalized)
    }
}

fn normalize_pattern(raw: &str) -> String {
    let stripped = if raw.contains(CONSTRUCTOR_MARKER) {
        raw.to_string()
    } else {
        strip_generics(raw)
    };
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
