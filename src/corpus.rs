//! Corpus units as delivered by a syntax-tree walker.
//!
//! A unit is one source file: the candidates it declares or uses (scan pass) and
//! the occurrences that may be classified (classify pass). The walker itself is
//! external; this is the JSON shape it hands over.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::candidate::{Candidate, MethodShape};

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("failed to read corpus {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse corpus {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
/// A candidate either pre-rendered or as a method shape to render.
pub enum CandidateSpec {
    Rendered(Candidate),
    Shape(MethodShape),
}

impl CandidateSpec {
    pub fn to_candidate(&self) -> Candidate {
        match self {
            CandidateSpec::Rendered(candidate) => candidate.clone(),
            CandidateSpec::Shape(shape) => shape.to_candidate(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
/// A call site, with the pattern the walker matched it under.
pub struct Occurrence {
    pub text: String,
    pub pattern: String,
}

impl Occurrence {
    pub fn new(text: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            pattern: pattern.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CorpusUnit {
    pub source: String,
    #[serde(default)]
    pub candidates: Vec<CandidateSpec>,
    #[serde(default)]
    pub occurrences: Vec<Occurrence>,
}

impl CorpusUnit {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            candidates: Vec::new(),
            occurrences: Vec::new(),
        }
    }

    pub fn with_candidate(mut self, candidate: Candidate) -> Self {
        self.candidates.push(CandidateSpec::Rendered(candidate));
        self
    }

    pub fn with_occurrence(mut self, occurrence: Occurrence) -> Self {
        self.occurrences.push(occurrence);
        self
    }

    pub fn rendered_candidates(&self) -> impl Iterator<Item = Candidate> + '_ {
        self.candidates.iter().map(CandidateSpec::to_candidate)
    }
}

/// Parses a JSON array of units.
pub fn parse(json: &str) -> Result<Vec<CorpusUnit>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Reads and parses a corpus file.
pub fn load(path: &Path) -> Result<Vec<CorpusUnit>, CorpusError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CorpusError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let units = parse(&raw).map_err(|source| CorpusError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), units = units.len(), "Loaded corpus");
    Ok(units)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const CORPUS: &str = r#"[
        {
            "source": "src/A.java",
            "candidates": [
                {"signature": "boolean add(E e)", "pattern": "java.util.List add(..)"},
                {"declaring_type": "java.util.Map", "name": "put", "return_type": "java.lang.Object",
                 "parameters": [{"type": "java.lang.String", "name": "key"}]}
            ],
            "occurrences": [
                {"text": "list.add(x)", "pattern": "java.util.List add(..)"}
            ]
        },
        {"source": "src/B.java"}
    ]"#;

    #[test]
    fn test_parse_mixed_candidates() {
        let units = parse(CORPUS).expect("parse");
        assert_eq!(units.len(), 2);

        let candidates: Vec<Candidate> = units[0].rendered_candidates().collect();
        assert_eq!(candidates[0], Candidate::new("boolean add(E e)", "java.util.List add(..)"));
        assert_eq!(candidates[1], Candidate::new("Object put(String key)", "java.util.Map put(..)"));
        assert_eq!(units[0].occurrences[0], Occurrence::new("list.add(x)", "java.util.List add(..)"));

        assert!(units[1].candidates.is_empty());
        assert!(units[1].occurrences.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(CORPUS.as_bytes()).expect("write");

        let units = load(file.path()).expect("load");
        assert_eq!(units[0].source, "src/A.java");
    }

    #[test]
    fn test_load_errors() {
        let missing = load(Path::new("/definitely/not/here.json"));
        assert!(matches!(missing, Err(CorpusError::Io { .. })));

        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(b"{not json").expect("write");
        assert!(matches!(load(file.path()), Err(CorpusError::Parse { .. })));
    }
}
