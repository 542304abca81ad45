//! Artifact execution.
//!
//! The executor interprets a validated program over one bar table inside a
//! fresh namespace, under the configured resource ceilings. Parameter
//! checking happens before any worker thread is spawned; time, memory, and
//! output ceilings are enforced during the run.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::domain::artifact::Artifact;
use crate::domain::ast::{BinaryOp, Expr, UnaryOp};
use crate::domain::error::{ExecutionError, LimitKind};
use crate::domain::limiter::{self, ResourceLimit};
use crate::domain::namespace::Namespace;
use crate::domain::series::{Mask, OhlcvSeries, Series, Value};
use crate::domain::stdlib;

/// Result of one successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionOutput {
    /// One series per declared output, in declaration order. Scalars are
    /// broadcast to the bar count; masks become 1/0 series.
    pub outputs: Vec<(String, Series)>,
    pub warnings: Vec<String>,
    pub elapsed: Duration,
    pub peak_memory_bytes: u64,
}

#[derive(Debug, Clone, Default)]
pub struct Executor {
    limits: ResourceLimit,
}

impl Executor {
    pub fn new(limits: ResourceLimit) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &ResourceLimit {
        &self.limits
    }

    /// Run an artifact over a bar table with the given scalar parameters.
    pub fn run(
        &self,
        artifact: &Artifact,
        bars: &OhlcvSeries,
        params: &HashMap<String, f64>,
    ) -> Result<ExecutionOutput, ExecutionError> {
        check_params(artifact, params)?;

        if bars.len() > self.limits.max_output_len {
            return Err(ExecutionError::ResourceLimitExceeded {
                kind: LimitKind::Output,
                limit: self.limits.max_output_len as u64,
                observed: bars.len() as u64,
            });
        }

        let artifact = artifact.clone();
        let bars = bars.clone();
        let params = params.clone();
        let limits = self.limits;
        limiter::run_bounded(&self.limits, move |cancel| {
            interpret(&artifact, &bars, &params, &limits, cancel)
        })
    }
}

/// Reject before spawning anything if the supplied parameters do not match
/// the artifact's declared inputs exactly.
fn check_params(
    artifact: &Artifact,
    params: &HashMap<String, f64>,
) -> Result<(), ExecutionError> {
    let mut missing: Vec<String> = artifact
        .inputs
        .iter()
        .filter(|name| !params.contains_key(*name))
        .cloned()
        .collect();
    let mut unexpected: Vec<String> = params
        .keys()
        .filter(|name| !artifact.inputs.contains(name))
        .cloned()
        .collect();

    if missing.is_empty() && unexpected.is_empty() {
        return Ok(());
    }
    missing.sort();
    unexpected.sort();
    Err(ExecutionError::ParamMismatch {
        missing,
        unexpected,
    })
}

fn interpret(
    artifact: &Artifact,
    bars: &OhlcvSeries,
    params: &HashMap<String, f64>,
    limits: &ResourceLimit,
    cancel: &AtomicBool,
) -> Result<ExecutionOutput, ExecutionError> {
    let started = Instant::now();
    let mut ns = Namespace::for_run(bars, params);
    let mut warnings = Vec::new();
    let mut peak_memory_bytes = ns.total_bytes();
    let len = bars.len();

    for stmt in &artifact.program.statements {
        if cancel.load(Ordering::Relaxed) {
            return Err(ExecutionError::ResourceLimitExceeded {
                kind: LimitKind::Time,
                limit: limits.max_duration_ms,
                observed: started.elapsed().as_millis() as u64,
            });
        }

        let value = eval(&stmt.expr, &ns, len, &mut warnings)?;
        ns.bind(stmt.name.clone(), value);

        let used = ns.total_bytes();
        peak_memory_bytes = peak_memory_bytes.max(used);
        if used > limits.max_memory_bytes {
            return Err(ExecutionError::ResourceLimitExceeded {
                kind: LimitKind::Memory,
                limit: limits.max_memory_bytes,
                observed: used,
            });
        }
    }

    let mut outputs = Vec::with_capacity(artifact.outputs.len());
    for name in &artifact.outputs {
        let value = ns.get(name).ok_or_else(|| ExecutionError::RuntimeFault {
            message: format!("output '{name}' was never assigned"),
        })?;
        outputs.push((name.clone(), to_series(value, len)));
    }

    Ok(ExecutionOutput {
        outputs,
        warnings,
        elapsed: started.elapsed(),
        peak_memory_bytes,
    })
}

/// Numeric operand view used by arithmetic and comparisons.
enum NumOperand<'a> {
    Scalar(f64),
    Series(&'a Series),
}

impl NumOperand<'_> {
    fn at(&self, index: usize) -> Option<f64> {
        match self {
            NumOperand::Scalar(v) => Some(*v),
            NumOperand::Series(s) => s.get(index),
        }
    }

    fn is_series(&self) -> bool {
        matches!(self, NumOperand::Series(_))
    }
}

fn numeric<'a>(value: &'a Value, context: &str) -> Result<NumOperand<'a>, ExecutionError> {
    match value {
        Value::Scalar(v) => Ok(NumOperand::Scalar(*v)),
        Value::Series(s) => Ok(NumOperand::Series(s)),
        Value::Mask(_) => Err(ExecutionError::RuntimeFault {
            message: format!("{context}: comparison result cannot be used as a number"),
        }),
    }
}

fn eval(
    expr: &Expr,
    ns: &Namespace,
    len: usize,
    warnings: &mut Vec<String>,
) -> Result<Value, ExecutionError> {
    match expr {
        Expr::Number { value, .. } => Ok(Value::Scalar(*value)),

        Expr::Ident { name, span } => match ns.get(name) {
            Some(value) => Ok(value.clone()),
            None => Err(ExecutionError::RuntimeFault {
                message: format!("undefined name '{name}' at {}:{}", span.line, span.col),
            }),
        },

        Expr::Call { name, args, .. } => {
            let mut evaluated = Vec::with_capacity(args.len());
            for arg in args {
                evaluated.push(eval(arg, ns, len, warnings)?);
            }
            stdlib::call(name, &evaluated, warnings)
        }

        Expr::Unary { op, operand, span } => {
            let value = eval(operand, ns, len, warnings)?;
            match (op, value) {
                (UnaryOp::Neg, Value::Scalar(v)) => Ok(Value::Scalar(-v)),
                (UnaryOp::Neg, Value::Series(s)) => Ok(Value::Series(s.map(|v| -v))),
                (UnaryOp::Neg, Value::Mask(_)) => Err(ExecutionError::RuntimeFault {
                    message: format!(
                        "cannot negate a comparison result at {}:{}",
                        span.line, span.col
                    ),
                }),
                (UnaryOp::Not, Value::Mask(m)) => Ok(Value::Mask(Mask {
                    points: m.points.iter().map(|p| p.map(|b| !b)).collect(),
                })),
                (UnaryOp::Not, other) => Err(ExecutionError::RuntimeFault {
                    message: format!(
                        "'not' expects a condition, got {} at {}:{}",
                        other.kind(),
                        span.line,
                        span.col
                    ),
                }),
            }
        }

        Expr::Binary {
            op, left, right, span,
        } => {
            let lhs = eval(left, ns, len, warnings)?;
            let rhs = eval(right, ns, len, warnings)?;
            let at = format!("{}:{}", span.line, span.col);
            match op {
                BinaryOp::And | BinaryOp::Or => logical(*op, &lhs, &rhs, &at),
                BinaryOp::Gt
                | BinaryOp::Lt
                | BinaryOp::Ge
                | BinaryOp::Le
                | BinaryOp::Eq
                | BinaryOp::Ne => compare(*op, &lhs, &rhs, len, &at),
                BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
                    arithmetic(*op, &lhs, &rhs, &at)
                }
            }
        }

        Expr::When {
            value,
            cond,
            fallback,
            span,
        } => {
            let value = eval(value, ns, len, warnings)?;
            let cond = eval(cond, ns, len, warnings)?;
            let fallback = eval(fallback, ns, len, warnings)?;

            let mask = match &cond {
                Value::Mask(m) => m,
                other => {
                    return Err(ExecutionError::RuntimeFault {
                        message: format!(
                            "'when' condition must be a comparison, got {} at {}:{}",
                            other.kind(),
                            span.line,
                            span.col
                        ),
                    });
                }
            };
            let at = format!("{}:{}", span.line, span.col);
            let value = numeric(&value, &at)?;
            let fallback = numeric(&fallback, &at)?;

            // Undefined conditions select the fallback branch.
            let points = (0..mask.len())
                .map(|i| match mask.points[i] {
                    Some(true) => value.at(i),
                    _ => fallback.at(i),
                })
                .collect();
            Ok(Value::Series(Series::from_points(points)))
        }
    }
}

fn arithmetic(op: BinaryOp, lhs: &Value, rhs: &Value, at: &str) -> Result<Value, ExecutionError> {
    let a = numeric(lhs, at)?;
    let b = numeric(rhs, at)?;

    let apply = |x: f64, y: f64| -> Result<f64, ExecutionError> {
        match op {
            BinaryOp::Add => Ok(x + y),
            BinaryOp::Sub => Ok(x - y),
            BinaryOp::Mul => Ok(x * y),
            BinaryOp::Div => {
                if y == 0.0 {
                    Err(ExecutionError::RuntimeFault {
                        message: format!("division by zero at {at}"),
                    })
                } else {
                    Ok(x / y)
                }
            }
            _ => unreachable!("non-arithmetic op routed to arithmetic"),
        }
    };

    if !a.is_series() && !b.is_series() {
        let (NumOperand::Scalar(x), NumOperand::Scalar(y)) = (&a, &b) else {
            unreachable!()
        };
        return Ok(Value::Scalar(apply(*x, *y)?));
    }

    let n = match (&a, &b) {
        (NumOperand::Series(s), NumOperand::Series(t)) => s.len().max(t.len()),
        (NumOperand::Series(s), _) | (_, NumOperand::Series(s)) => s.len(),
        _ => unreachable!(),
    };

    let mut points = Vec::with_capacity(n);
    for i in 0..n {
        points.push(match (a.at(i), b.at(i)) {
            (Some(x), Some(y)) => Some(apply(x, y)?),
            _ => None,
        });
    }
    Ok(Value::Series(Series::from_points(points)))
}

fn compare(
    op: BinaryOp,
    lhs: &Value,
    rhs: &Value,
    len: usize,
    at: &str,
) -> Result<Value, ExecutionError> {
    let a = numeric(lhs, at)?;
    let b = numeric(rhs, at)?;

    let test = |x: f64, y: f64| -> bool {
        match op {
            BinaryOp::Gt => x > y,
            BinaryOp::Lt => x < y,
            BinaryOp::Ge => x >= y,
            BinaryOp::Le => x <= y,
            BinaryOp::Eq => x == y,
            BinaryOp::Ne => x != y,
            _ => unreachable!("non-comparison op routed to compare"),
        }
    };

    // Scalar-only comparisons still broadcast to the bar count so the result
    // composes with per-element selection.
    let n = match (&a, &b) {
        (NumOperand::Series(s), NumOperand::Series(t)) => s.len().max(t.len()),
        (NumOperand::Series(s), _) | (_, NumOperand::Series(s)) => s.len(),
        _ => len,
    };

    let points = (0..n)
        .map(|i| match (a.at(i), b.at(i)) {
            (Some(x), Some(y)) => Some(test(x, y)),
            _ => None,
        })
        .collect();
    Ok(Value::Mask(Mask { points }))
}

fn logical(op: BinaryOp, lhs: &Value, rhs: &Value, at: &str) -> Result<Value, ExecutionError> {
    let (Value::Mask(a), Value::Mask(b)) = (lhs, rhs) else {
        return Err(ExecutionError::RuntimeFault {
            message: format!(
                "'{}' expects conditions on both sides at {at}",
                op.symbol()
            ),
        });
    };

    let points = a
        .points
        .iter()
        .zip(&b.points)
        .map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) => Some(match op {
                BinaryOp::And => *x && *y,
                BinaryOp::Or => *x || *y,
                _ => unreachable!("non-logical op routed to logical"),
            }),
            _ => None,
        })
        .collect();
    Ok(Value::Mask(Mask { points }))
}

fn to_series(value: &Value, len: usize) -> Series {
    match value {
        Value::Series(s) => s.clone(),
        Value::Scalar(v) => Series::from_points(vec![Some(*v); len]),
        Value::Mask(m) => Series::from_points(
            m.points
                .iter()
                .map(|p| p.map(|b| if b { 1.0 } else { 0.0 }))
                .collect(),
        ),
    }
}
