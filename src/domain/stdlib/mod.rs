//! Standard library: the fixed catalogue of vectorized functions available
//! inside every execution namespace.
//!
//! Every function is pure, operates on whole series, and uses the engine's
//! uniform no-value convention: positions that cannot be computed (warmup
//! regions, undefined inputs) are `None`, reported through a warning rather
//! than an error. Adding or changing a function requires bumping
//! [`STDLIB_VERSION`] so cached artifacts referencing the old catalogue are
//! invalidated.

pub mod bollinger;
pub mod ema;
pub mod roc;
pub mod rsi;
pub mod sma;
pub mod stddev;
pub mod window;
pub mod wma;

use crate::domain::error::ExecutionError;
use crate::domain::series::{Series, Value};

/// Bumped whenever a function is added, removed, or changes signature.
pub const STDLIB_VERSION: &str = "1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FnSpec {
    pub name: &'static str,
    pub arity: usize,
}

/// The complete, fixed catalogue. Order is stable; names are the only way
/// DSL code can reach host functionality.
pub const CATALOGUE: [FnSpec; 15] = [
    FnSpec { name: "sma", arity: 2 },
    FnSpec { name: "ema", arity: 2 },
    FnSpec { name: "wma", arity: 2 },
    FnSpec { name: "rsi", arity: 2 },
    FnSpec { name: "roc", arity: 2 },
    FnSpec { name: "stddev", arity: 2 },
    FnSpec { name: "bollinger_upper", arity: 3 },
    FnSpec { name: "bollinger_middle", arity: 3 },
    FnSpec { name: "bollinger_lower", arity: 3 },
    FnSpec { name: "shift", arity: 2 },
    FnSpec { name: "highest", arity: 2 },
    FnSpec { name: "lowest", arity: 2 },
    FnSpec { name: "abs", arity: 1 },
    FnSpec { name: "min", arity: 2 },
    FnSpec { name: "max", arity: 2 },
];

pub fn lookup(name: &str) -> Option<&'static FnSpec> {
    CATALOGUE.iter().find(|spec| spec.name == name)
}

fn fault(message: String) -> ExecutionError {
    ExecutionError::RuntimeFault { message }
}

fn series_arg<'a>(name: &str, args: &'a [Value], idx: usize) -> Result<&'a Series, ExecutionError> {
    match args.get(idx) {
        Some(Value::Series(s)) => Ok(s),
        Some(other) => Err(fault(format!(
            "{name}: argument {} must be a series, got {}",
            idx + 1,
            other.kind()
        ))),
        None => Err(fault(format!("{name}: missing argument {}", idx + 1))),
    }
}

fn value_arg<'a>(name: &str, args: &'a [Value], idx: usize) -> Result<&'a Value, ExecutionError> {
    args.get(idx)
        .ok_or_else(|| fault(format!("{name}: missing argument {}", idx + 1)))
}

fn scalar_arg(name: &str, args: &[Value], idx: usize) -> Result<f64, ExecutionError> {
    match args.get(idx) {
        Some(Value::Scalar(v)) => Ok(*v),
        Some(other) => Err(fault(format!(
            "{name}: argument {} must be a scalar, got {}",
            idx + 1,
            other.kind()
        ))),
        None => Err(fault(format!("{name}: missing argument {}", idx + 1))),
    }
}

fn period_arg(name: &str, args: &[Value], idx: usize) -> Result<usize, ExecutionError> {
    let v = scalar_arg(name, args, idx)?;
    if !v.is_finite() || v.fract() != 0.0 || v < 1.0 {
        return Err(fault(format!(
            "{name}: window period must be a positive integer, got {v}"
        )));
    }
    Ok(v as usize)
}

/// Elementwise binary combine with scalar broadcast.
fn broadcast2(
    name: &str,
    a: &Value,
    b: &Value,
    f: impl Fn(f64, f64) -> f64,
) -> Result<Value, ExecutionError> {
    match (a, b) {
        (Value::Scalar(x), Value::Scalar(y)) => Ok(Value::Scalar(f(*x, *y))),
        (Value::Series(s), Value::Scalar(y)) => Ok(Value::Series(s.map(|x| f(x, *y)))),
        (Value::Scalar(x), Value::Series(s)) => Ok(Value::Series(s.map(|y| f(*x, y)))),
        (Value::Series(s), Value::Series(t)) => {
            if s.len() != t.len() {
                return Err(fault(format!(
                    "{name}: series length mismatch ({} vs {})",
                    s.len(),
                    t.len()
                )));
            }
            Ok(Value::Series(s.zip_with(t, f)))
        }
        (a, b) => Err(fault(format!(
            "{name}: expects numeric arguments, got {} and {}",
            a.kind(),
            b.kind()
        ))),
    }
}

/// Indicator calls whose warmup region warrants an insufficient-window warning.
fn is_windowed(name: &str) -> bool {
    matches!(
        name,
        "sma"
            | "ema"
            | "wma"
            | "rsi"
            | "roc"
            | "stddev"
            | "bollinger_upper"
            | "bollinger_middle"
            | "bollinger_lower"
            | "highest"
            | "lowest"
    )
}

/// Dispatch a stdlib call by name.
///
/// The validator guarantees `name` is registered and the argument count
/// matches before execution, so the per-function helpers only have to check
/// argument kinds and runtime window values.
pub fn call(
    name: &str,
    args: &[Value],
    warnings: &mut Vec<String>,
) -> Result<Value, ExecutionError> {
    let result = match name {
        "sma" => {
            let s = series_arg(name, args, 0)?;
            let period = period_arg(name, args, 1)?;
            Value::Series(sma::compute(s, period))
        }
        "ema" => {
            let s = series_arg(name, args, 0)?;
            let period = period_arg(name, args, 1)?;
            Value::Series(ema::compute(s, period))
        }
        "wma" => {
            let s = series_arg(name, args, 0)?;
            let period = period_arg(name, args, 1)?;
            Value::Series(wma::compute(s, period))
        }
        "rsi" => {
            let s = series_arg(name, args, 0)?;
            let period = period_arg(name, args, 1)?;
            Value::Series(rsi::compute(s, period))
        }
        "roc" => {
            let s = series_arg(name, args, 0)?;
            let period = period_arg(name, args, 1)?;
            Value::Series(roc::compute(s, period))
        }
        "stddev" => {
            let s = series_arg(name, args, 0)?;
            let period = period_arg(name, args, 1)?;
            Value::Series(stddev::compute(s, period))
        }
        "bollinger_upper" | "bollinger_middle" | "bollinger_lower" => {
            let s = series_arg(name, args, 0)?;
            let period = period_arg(name, args, 1)?;
            let mult = scalar_arg(name, args, 2)?;
            if !mult.is_finite() || mult <= 0.0 {
                return Err(fault(format!(
                    "{name}: multiplier must be positive, got {mult}"
                )));
            }
            let band = match name {
                "bollinger_upper" => bollinger::Band::Upper,
                "bollinger_middle" => bollinger::Band::Middle,
                _ => bollinger::Band::Lower,
            };
            Value::Series(bollinger::compute(s, period, mult, band))
        }
        "shift" => {
            let s = series_arg(name, args, 0)?;
            let offset = period_arg(name, args, 1)?;
            Value::Series(window::shift(s, offset))
        }
        "highest" => {
            let s = series_arg(name, args, 0)?;
            let period = period_arg(name, args, 1)?;
            Value::Series(window::rolling_extreme(s, period, f64::max))
        }
        "lowest" => {
            let s = series_arg(name, args, 0)?;
            let period = period_arg(name, args, 1)?;
            Value::Series(window::rolling_extreme(s, period, f64::min))
        }
        "abs" => match args.first() {
            Some(Value::Scalar(v)) => Value::Scalar(v.abs()),
            Some(Value::Series(s)) => Value::Series(s.map(f64::abs)),
            Some(other) => {
                return Err(fault(format!("abs: expects a number, got {}", other.kind())));
            }
            None => return Err(fault("abs: missing argument 1".into())),
        },
        "min" => broadcast2(name, value_arg(name, args, 0)?, value_arg(name, args, 1)?, f64::min)?,
        "max" => broadcast2(name, value_arg(name, args, 0)?, value_arg(name, args, 1)?, f64::max)?,
        _ => return Err(fault(format!("unknown function '{name}'"))),
    };

    if is_windowed(name) {
        if let Value::Series(out) = &result {
            let input_warmup = match args.first() {
                Some(Value::Series(s)) => s.warmup_len(),
                _ => 0,
            };
            let warmup = out.warmup_len();
            if warmup > input_warmup && !out.is_empty() {
                warnings.push(format!(
                    "{name}: first {warmup} value(s) undefined (insufficient window)"
                ));
            }
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_lookup() {
        assert_eq!(lookup("sma").unwrap().arity, 2);
        assert_eq!(lookup("bollinger_upper").unwrap().arity, 3);
        assert!(lookup("open_file").is_none());
        assert!(lookup("eval").is_none());
    }

    #[test]
    fn sma_window_semantics_with_warning() {
        let mut warnings = Vec::new();
        let args = vec![
            Value::Series(Series::from_values(vec![10.0, 20.0, 30.0])),
            Value::Scalar(3.0),
        ];
        let result = call("sma", &args, &mut warnings).unwrap();
        match result {
            Value::Series(s) => assert_eq!(s.points, vec![None, None, Some(20.0)]),
            other => panic!("expected series, got {other:?}"),
        }
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("insufficient window"));
    }

    #[test]
    fn no_warning_when_fully_defined() {
        let mut warnings = Vec::new();
        let args = vec![
            Value::Series(Series::from_values(vec![10.0, 20.0, 30.0])),
            Value::Scalar(1.0),
        ];
        call("sma", &args, &mut warnings).unwrap();
        assert!(warnings.is_empty());
    }

    #[test]
    fn period_must_be_positive_integer() {
        let mut warnings = Vec::new();
        let series = Value::Series(Series::from_values(vec![1.0, 2.0]));

        let err = call("sma", &[series.clone(), Value::Scalar(0.0)], &mut warnings).unwrap_err();
        assert!(matches!(err, ExecutionError::RuntimeFault { .. }));

        let err = call("sma", &[series, Value::Scalar(2.5)], &mut warnings).unwrap_err();
        assert!(matches!(err, ExecutionError::RuntimeFault { .. }));
    }

    #[test]
    fn series_arg_kind_checked() {
        let mut warnings = Vec::new();
        let err = call(
            "sma",
            &[Value::Scalar(1.0), Value::Scalar(3.0)],
            &mut warnings,
        )
        .unwrap_err();
        assert!(err.to_string().contains("must be a series"));
    }

    #[test]
    fn abs_scalar_and_series() {
        let mut warnings = Vec::new();
        assert_eq!(
            call("abs", &[Value::Scalar(-2.0)], &mut warnings).unwrap(),
            Value::Scalar(2.0)
        );
        let out = call(
            "abs",
            &[Value::Series(Series::from_points(vec![
                Some(-1.0),
                None,
                Some(3.0),
            ]))],
            &mut warnings,
        )
        .unwrap();
        match out {
            Value::Series(s) => assert_eq!(s.points, vec![Some(1.0), None, Some(3.0)]),
            other => panic!("expected series, got {other:?}"),
        }
    }

    #[test]
    fn min_max_broadcast() {
        let mut warnings = Vec::new();
        let s = Value::Series(Series::from_values(vec![1.0, 5.0]));
        let out = call("min", &[s.clone(), Value::Scalar(3.0)], &mut warnings).unwrap();
        match out {
            Value::Series(out) => assert_eq!(out.points, vec![Some(1.0), Some(3.0)]),
            other => panic!("expected series, got {other:?}"),
        }
        assert_eq!(
            call("max", &[Value::Scalar(1.0), Value::Scalar(2.0)], &mut warnings).unwrap(),
            Value::Scalar(2.0)
        );
    }

    #[test]
    fn min_missing_argument_is_fault() {
        let mut warnings = Vec::new();
        let err = call("min", &[Value::Scalar(1.0)], &mut warnings).unwrap_err();
        assert!(err.to_string().contains("missing argument 2"));
    }

    #[test]
    fn min_length_mismatch_is_fault() {
        let mut warnings = Vec::new();
        let a = Value::Series(Series::from_values(vec![1.0]));
        let b = Value::Series(Series::from_values(vec![1.0, 2.0]));
        let err = call("min", &[a, b], &mut warnings).unwrap_err();
        assert!(err.to_string().contains("length mismatch"));
    }
}
