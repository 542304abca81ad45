//! Security and semantic validation.
//!
//! The sandbox is allow-list based: a program may only reference the OHLCV
//! columns, its own assignments, scalar parameters, and the fixed stdlib
//! catalogue. Validation walks the whole program and reports every finding,
//! never stopping at the first, so a user fixes a script in one round trip.
//!
//! Rule codes are stable:
//! - `SEC001` call to a function outside the catalogue
//! - `SEC002` dunder identifier
//! - `SEC003` reserved host-language keyword used as a name
//! - `SEC004` expression nesting beyond the depth ceiling
//! - `VAL001` wrong argument count for a catalogue function
//! - `VAL002` non-positive literal window argument
//! - `W001` (warning) assignment shadows an OHLCV column

use crate::domain::ast::{Expr, Program};
use crate::domain::error::{SecurityViolation, SyntaxError};
use crate::domain::series::OHLCV_COLUMNS;
use crate::domain::stdlib;

/// Expressions deeper than this are rejected outright.
pub const MAX_NESTING_DEPTH: usize = 32;

/// Names that read like escape hatches in embedding host languages. They are
/// banned as identifiers even though the grammar itself has no use for them.
const RESERVED_NAMES: [&str; 10] = [
    "import", "eval", "exec", "while", "for", "def", "class", "lambda", "globals", "locals",
];

/// Everything a compile attempt has to say about a program. Syntax errors
/// and security violations both land here; neither ever reaches execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub syntax_errors: Vec<SyntaxError>,
    pub errors: Vec<SecurityViolation>,
    pub warnings: Vec<SecurityViolation>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.syntax_errors.is_empty() && self.errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.syntax_errors.len() + self.errors.len()
    }
}

/// Validate a parsed program. Always returns the full report.
pub fn validate(program: &Program) -> ValidationReport {
    let mut report = ValidationReport::default();

    for stmt in &program.statements {
        check_name(&stmt.name, stmt.span.line, stmt.span.col, &mut report);
        if OHLCV_COLUMNS.contains(&stmt.name.as_str()) {
            report.warnings.push(SecurityViolation {
                rule: "W001".into(),
                line: stmt.span.line,
                col: stmt.span.col,
                message: format!("assignment '{}' shadows an OHLCV column", stmt.name),
            });
        }
        check_expr(&stmt.expr, 1, &mut report);
    }

    report
}

fn check_name(name: &str, line: u32, col: u32, report: &mut ValidationReport) {
    if name.starts_with("__") {
        report.errors.push(SecurityViolation {
            rule: "SEC002".into(),
            line,
            col,
            message: format!("dunder identifier '{name}' is not allowed"),
        });
    }
    if RESERVED_NAMES.contains(&name) {
        report.errors.push(SecurityViolation {
            rule: "SEC003".into(),
            line,
            col,
            message: format!("'{name}' is a reserved word and cannot be used as a name"),
        });
    }
}

fn check_expr(expr: &Expr, depth: usize, report: &mut ValidationReport) {
    if depth > MAX_NESTING_DEPTH {
        let span = expr.span();
        report.errors.push(SecurityViolation {
            rule: "SEC004".into(),
            line: span.line,
            col: span.col,
            message: format!("expression nesting exceeds {MAX_NESTING_DEPTH} levels"),
        });
        // Deeper levels would only repeat the finding.
        return;
    }

    match expr {
        Expr::Number { .. } => {}
        Expr::Ident { name, span } => {
            check_name(name, span.line, span.col, report);
        }
        Expr::Call { name, args, span } => {
            check_name(name, span.line, span.col, report);
            match stdlib::lookup(name) {
                None => {
                    report.errors.push(SecurityViolation {
                        rule: "SEC001".into(),
                        line: span.line,
                        col: span.col,
                        message: format!("call to unknown function '{name}'"),
                    });
                }
                Some(spec) => {
                    if args.len() != spec.arity {
                        report.errors.push(SecurityViolation {
                            rule: "VAL001".into(),
                            line: span.line,
                            col: span.col,
                            message: format!(
                                "'{name}' takes {} argument(s), got {}",
                                spec.arity,
                                args.len()
                            ),
                        });
                    }
                    // Window arguments sit at position 2 for every windowed
                    // function in the catalogue.
                    if let Some(Expr::Number { value, span }) = args.get(1) {
                        let windowed = name != "abs" && name != "min" && name != "max";
                        if windowed && (*value < 1.0 || value.fract() != 0.0) {
                            report.errors.push(SecurityViolation {
                                rule: "VAL002".into(),
                                line: span.line,
                                col: span.col,
                                message: format!(
                                    "'{name}' window must be a positive integer, got {value}"
                                ),
                            });
                        }
                    }
                }
            }
            for arg in args {
                check_expr(arg, depth + 1, report);
            }
        }
        Expr::Unary { operand, .. } => check_expr(operand, depth + 1, report),
        Expr::Binary { left, right, .. } => {
            check_expr(left, depth + 1, report);
            check_expr(right, depth + 1, report);
        }
        Expr::When {
            value,
            cond,
            fallback,
            ..
        } => {
            check_expr(value, depth + 1, report);
            check_expr(cond, depth + 1, report);
            check_expr(fallback, depth + 1, report);
        }
    }
}
