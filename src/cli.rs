//! CLI definition and dispatch.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::adapters::csv_adapter::CsvBarAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::memory_cache_adapter::MemoryCacheAdapter;
use crate::adapters::sqlite_cache_adapter::SqliteCacheAdapter;
use crate::domain::cache::ArtifactCache;
use crate::domain::compiler;
use crate::domain::error::EngineError;
use crate::domain::executor::Executor;
use crate::domain::settings::{CacheBackend, EngineSettings};
use crate::ports::data_port::BarSource;

#[derive(Parser, Debug)]
#[command(name = "signalscript", about = "Strategy DSL compiler and sandboxed executor")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile a script and print its diagnostics
    Check {
        script: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Compile a script and run it over a CSV bar file
    Run {
        script: PathBuf,
        #[arg(long)]
        bars: PathBuf,
        /// Scalar parameter, repeatable: --param name=value
        #[arg(long = "param", value_name = "NAME=VALUE")]
        params: Vec<String>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Drop expired cache entries, or everything with --all
    PurgeCache {
        #[arg(long)]
        all: bool,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Check { script, config } => run_check(&script, config.as_ref()),
        Command::Run {
            script,
            bars,
            params,
            config,
        } => run_run(&script, &bars, &params, config.as_ref()),
        Command::PurgeCache { all, config } => run_purge_cache(all, config.as_ref()),
    }
}

fn load_settings(config_path: Option<&PathBuf>) -> Result<EngineSettings, ExitCode> {
    let Some(path) = config_path else {
        return Ok(EngineSettings::default());
    };
    let adapter = FileConfigAdapter::from_file(path).map_err(|e| {
        let err = EngineError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })?;
    EngineSettings::from_port(&adapter).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn build_cache(settings: &EngineSettings) -> Result<ArtifactCache, EngineError> {
    let memory = Box::new(MemoryCacheAdapter::new(
        settings.cache.memory_capacity,
        settings.cache.memory_ttl,
    ));
    let shared: Option<Box<dyn crate::ports::ArtifactStore + Send + Sync>> =
        match &settings.cache.backend {
            CacheBackend::Memory => None,
            CacheBackend::Sqlite { path } => Some(Box::new(SqliteCacheAdapter::new(
                path,
                settings.cache.pool_size,
                settings.cache.shared_ttl_seconds,
            )?)),
        };
    Ok(ArtifactCache::new(memory, shared))
}

fn read_script(path: &PathBuf) -> Result<String, ExitCode> {
    fs::read_to_string(path).map_err(|e| {
        let err = EngineError::Io(e);
        eprintln!("error: {}: {err}", path.display());
        ExitCode::from(&err)
    })
}

fn parse_params(raw: &[String]) -> Result<HashMap<String, f64>, EngineError> {
    let mut params = HashMap::new();
    for entry in raw {
        let invalid = |reason: &str| EngineError::ConfigInvalid {
            section: "param".into(),
            key: entry.clone(),
            reason: reason.into(),
        };
        let (name, value) = entry.split_once('=').ok_or_else(|| invalid("expected NAME=VALUE"))?;
        if name.is_empty() {
            return Err(invalid("empty parameter name"));
        }
        let value: f64 = value.parse().map_err(|_| invalid("value is not a number"))?;
        params.insert(name.to_string(), value);
    }
    Ok(params)
}

fn run_check(script_path: &PathBuf, config_path: Option<&PathBuf>) -> ExitCode {
    if let Err(code) = load_settings(config_path) {
        return code;
    }
    let source = match read_script(script_path) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let out = compiler::compile(&source);
    for warning in &out.report.warnings {
        eprintln!("warning: {warning}");
    }
    if !out.report.is_clean() {
        for syntax in &out.report.syntax_errors {
            eprintln!("{}", syntax.display_with_context(&source));
        }
        for violation in &out.report.errors {
            eprintln!("error: {violation}");
        }
        let err = EngineError::CompileRejected(out.report.error_count());
        eprintln!("error: {err}");
        return ExitCode::from(&err);
    }

    // Artifact is always present when the report is clean.
    if let Some(artifact) = &out.artifact {
        println!("ok {}", artifact.hash);
        println!("inputs: {}", artifact.inputs.join(", "));
        println!("outputs: {}", artifact.outputs.join(", "));
    }
    ExitCode::SUCCESS
}

fn run_run(
    script_path: &PathBuf,
    bars_path: &PathBuf,
    raw_params: &[String],
    config_path: Option<&PathBuf>,
) -> ExitCode {
    let settings = match load_settings(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let source = match read_script(script_path) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let params = match parse_params(raw_params) {
        Ok(p) => p,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(&err);
        }
    };

    let cache = match build_cache(&settings) {
        Ok(c) => c,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(&err);
        }
    };
    let bars = match CsvBarAdapter::new(bars_path).load() {
        Ok(b) => b,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(&err);
        }
    };

    let outcome = cache.get_or_compile(&source);
    for warning in &outcome.report.warnings {
        eprintln!("warning: {warning}");
    }
    let Some(artifact) = outcome.artifact else {
        for syntax in &outcome.report.syntax_errors {
            eprintln!("{}", syntax.display_with_context(&source));
        }
        for violation in &outcome.report.errors {
            eprintln!("error: {violation}");
        }
        let err = EngineError::CompileRejected(outcome.report.error_count());
        eprintln!("error: {err}");
        return ExitCode::from(&err);
    };
    tracing::info!(
        hash = %artifact.hash,
        from_cache = outcome.from_cache,
        bars = bars.len(),
        "running artifact"
    );

    let executor = Executor::new(settings.limits);
    let output = match executor.run(&artifact, &bars, &params) {
        Ok(o) => o,
        Err(exec) => {
            let err = EngineError::Execution(exec);
            eprintln!("error: {err}");
            return ExitCode::from(&err);
        }
    };

    for warning in &output.warnings {
        eprintln!("warning: {warning}");
    }
    for (name, series) in &output.outputs {
        let cells: Vec<String> = series
            .points
            .iter()
            .map(|p| p.map(|v| v.to_string()).unwrap_or_default())
            .collect();
        println!("{name},{}", cells.join(","));
    }
    tracing::info!(
        elapsed_ms = output.elapsed.as_millis() as u64,
        peak_memory_bytes = output.peak_memory_bytes,
        "execution finished"
    );
    ExitCode::SUCCESS
}

fn run_purge_cache(all: bool, config_path: Option<&PathBuf>) -> ExitCode {
    let settings = match load_settings(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let cache = match build_cache(&settings) {
        Ok(c) => c,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(&err);
        }
    };

    let dropped = if all { cache.clear() } else { cache.purge_expired() };
    println!("purged {dropped} entries");
    ExitCode::SUCCESS
}
