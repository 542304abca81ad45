//! Compilation: parse, validate, and package an artifact.

use sha2::{Digest, Sha256};

use crate::domain::artifact::Artifact;
use crate::domain::ast::{Expr, Program};
use crate::domain::parser::parse_program;
use crate::domain::series::OHLCV_COLUMNS;
use crate::domain::validator::{self, ValidationReport};

/// Participates in every artifact hash and cache key. Bump on any change to
/// the grammar, the validator rules, or execution semantics.
pub const ENGINE_COMPILER_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq)]
pub struct CompileOutput {
    pub report: ValidationReport,
    /// Present only when the report has no errors.
    pub artifact: Option<Artifact>,
}

/// Compile DSL source into an artifact.
///
/// Never fails outright: malformed source comes back as a report whose
/// `syntax_errors` is non-empty, so callers handle every rejection through
/// one channel.
pub fn compile(source: &str) -> CompileOutput {
    compile_with_version(source, ENGINE_COMPILER_VERSION)
}

/// Same as [`compile`] with an explicit version, so cache invalidation on
/// version bumps can be exercised without rebuilding the crate.
pub fn compile_with_version(source: &str, version: &str) -> CompileOutput {
    let program = match parse_program(source) {
        Ok(program) => program,
        Err(err) => {
            return CompileOutput {
                report: ValidationReport {
                    syntax_errors: vec![err],
                    ..ValidationReport::default()
                },
                artifact: None,
            };
        }
    };
    let report = validator::validate(&program);

    if !report.is_clean() {
        return CompileOutput {
            report,
            artifact: None,
        };
    }

    let artifact = Artifact {
        hash: source_hash(source, version),
        compiler_version: version.to_string(),
        inputs: declared_inputs(&program),
        outputs: declared_outputs(&program),
        program,
    };

    CompileOutput {
        report,
        artifact: Some(artifact),
    }
}

/// Hex SHA-256 over the source and compiler version, NUL-separated.
pub fn source_hash(source: &str, version: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update(b"\0");
    hasher.update(version.as_bytes());
    hex::encode(hasher.finalize())
}

/// Free identifiers in first-appearance order: everything referenced that is
/// not an OHLCV column and not assigned earlier in the program. These become
/// the artifact's required scalar parameters.
fn declared_inputs(program: &Program) -> Vec<String> {
    let mut inputs = Vec::new();
    let mut locals: Vec<&str> = Vec::new();

    for stmt in &program.statements {
        collect_free_idents(&stmt.expr, &locals, &mut inputs);
        locals.push(&stmt.name);
    }

    inputs
}

fn collect_free_idents(expr: &Expr, locals: &[&str], inputs: &mut Vec<String>) {
    match expr {
        Expr::Number { .. } => {}
        Expr::Ident { name, .. } => {
            if !OHLCV_COLUMNS.contains(&name.as_str())
                && !locals.contains(&name.as_str())
                && !inputs.iter().any(|i| i == name)
            {
                inputs.push(name.clone());
            }
        }
        Expr::Call { args, .. } => {
            for arg in args {
                collect_free_idents(arg, locals, inputs);
            }
        }
        Expr::Unary { operand, .. } => collect_free_idents(operand, locals, inputs),
        Expr::Binary { left, right, .. } => {
            collect_free_idents(left, locals, inputs);
            collect_free_idents(right, locals, inputs);
        }
        Expr::When {
            value,
            cond,
            fallback,
            ..
        } => {
            collect_free_idents(value, locals, inputs);
            collect_free_idents(cond, locals, inputs);
            collect_free_idents(fallback, locals, inputs);
        }
    }
}

/// Assigned names in declaration order; reassignment keeps the first slot.
fn declared_outputs(program: &Program) -> Vec<String> {
    let mut outputs: Vec<String> = Vec::new();
    for stmt in &program.statements {
        if !outputs.iter().any(|o| o == &stmt.name) {
            outputs.push(stmt.name.clone());
        }
    }
    outputs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_clean_program() {
        let out = compile("fast = sma(close, 10)\nsignal = fast > close");
        assert!(out.report.is_clean());
        let artifact = out.artifact.unwrap();
        assert_eq!(artifact.compiler_version, ENGINE_COMPILER_VERSION);
        assert_eq!(artifact.outputs, vec!["fast", "signal"]);
        assert!(artifact.inputs.is_empty());
        assert_eq!(artifact.hash.len(), 64);
    }

    #[test]
    fn compile_rejected_program_has_no_artifact() {
        let out = compile("x = open_file(close, 1)");
        assert!(!out.report.is_clean());
        assert!(out.artifact.is_none());
    }

    #[test]
    fn syntax_error_lands_in_report() {
        let out = compile("import os");
        assert!(out.artifact.is_none());
        assert_eq!(out.report.error_count(), 1);
        assert!(out.report.syntax_errors[0].message.contains("expected"));
    }

    #[test]
    fn free_identifiers_become_inputs() {
        let out = compile("band = close + threshold\nexit = band * scale + threshold");
        let artifact = out.artifact.unwrap();
        assert_eq!(artifact.inputs, vec!["threshold", "scale"]);
    }

    #[test]
    fn locals_are_not_inputs() {
        let out = compile("a = close + 1\nb = a * 2");
        assert!(out.artifact.unwrap().inputs.is_empty());
    }

    #[test]
    fn identifier_used_before_assignment_is_input() {
        // `b` is free on line 1 even though line 2 assigns it.
        let out = compile("a = b + 1\nb = close");
        let artifact = out.artifact.unwrap();
        assert_eq!(artifact.inputs, vec!["b"]);
    }

    #[test]
    fn hash_is_deterministic_and_source_sensitive() {
        let a = compile("x = close + 1").artifact.unwrap();
        let b = compile("x = close + 1").artifact.unwrap();
        let c = compile("x = close + 2").artifact.unwrap();
        assert_eq!(a.hash, b.hash);
        assert_ne!(a.hash, c.hash);
    }

    #[test]
    fn hash_changes_with_compiler_version() {
        let a = compile_with_version("x = close", "1.0.0").artifact.unwrap();
        let b = compile_with_version("x = close", "1.0.1").artifact.unwrap();
        assert_ne!(a.hash, b.hash);
        assert_ne!(a.cache_key().wire(), b.cache_key().wire());
    }

    #[test]
    fn reassignment_keeps_one_output_slot() {
        let out = compile("x = 1\nx = 2");
        assert_eq!(out.artifact.unwrap().outputs, vec!["x"]);
    }
}
