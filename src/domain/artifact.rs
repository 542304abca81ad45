//! Compiled artifacts and cache keys.

use serde::{Deserialize, Serialize};

use crate::domain::ast::Program;

/// The output of a successful compilation: everything an executor needs to
/// run the program without seeing the source again.
///
/// Serialization is deterministic because declared inputs and outputs are
/// ordered vectors, never maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    /// Hex SHA-256 over source and compiler version.
    pub hash: String,
    /// Version of the compiler that produced this artifact.
    pub compiler_version: String,
    /// Validated program, executable as-is.
    pub program: Program,
    /// Free identifiers the caller must supply as scalar parameters, in
    /// first-appearance order.
    pub inputs: Vec<String>,
    /// Assigned names, in declaration order.
    pub outputs: Vec<String>,
}

impl Artifact {
    pub fn cache_key(&self) -> CacheKey {
        CacheKey {
            hash: self.hash.clone(),
            compiler_version: self.compiler_version.clone(),
        }
    }
}

/// Identity of an artifact in both cache tiers.
///
/// The compiler version is part of the key, so a version bump naturally
/// misses on every old entry and old entries age out by TTL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub hash: String,
    pub compiler_version: String,
}

impl CacheKey {
    /// Wire form used as the shared tier's primary key.
    pub fn wire(&self) -> String {
        format!("{}:{}", self.hash, self.compiler_version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ast::{Expr, Span, Stmt};

    fn sample_artifact() -> Artifact {
        Artifact {
            hash: "abc123".into(),
            compiler_version: "1.0.0".into(),
            program: Program {
                statements: vec![Stmt {
                    name: "output".into(),
                    expr: Expr::Number {
                        value: 1.0,
                        span: Span::new(1, 10),
                    },
                    span: Span::new(1, 1),
                }],
            },
            inputs: vec!["threshold".into()],
            outputs: vec!["output".into()],
        }
    }

    #[test]
    fn cache_key_wire_format() {
        let key = sample_artifact().cache_key();
        assert_eq!(key.wire(), "abc123:1.0.0");
    }

    #[test]
    fn artifact_serde_round_trip() {
        let artifact = sample_artifact();
        let json = serde_json::to_string(&artifact).unwrap();
        let back: Artifact = serde_json::from_str(&json).unwrap();
        assert_eq!(artifact, back);
    }

    #[test]
    fn serialization_is_deterministic() {
        let artifact = sample_artifact();
        let a = serde_json::to_string(&artifact).unwrap();
        let b = serde_json::to_string(&artifact).unwrap();
        assert_eq!(a, b);
    }
}
