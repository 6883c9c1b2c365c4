use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use crate::aligner::DEFAULT_SKIP_BUDGET;
use crate::feature_store;
use crate::season::SeasonId;
use crate::shift_ledger::SKEW_EPSILON;
use crate::timeline::BuildOptions;

const CACHE_DIR: &str = "rink_timeline";
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_THREADS: usize = 4;

// Flags that consume the following argument when not written as `--flag=value`.
const VALUE_FLAGS: [&str; 6] = [
    "--data-dir",
    "--season",
    "--db",
    "--skip-budget",
    "--skew-epsilon",
    "--threads",
];

#[derive(Debug, Clone)]
pub struct AccumulateConfig {
    pub data_dir: PathBuf,
    pub seasons: Vec<SeasonId>,
    pub db_path: PathBuf,
    pub build: BuildOptions,
    pub threads: usize,
    pub force: bool,
}

impl AccumulateConfig {
    /// Flags win over environment variables, which win over defaults.
    pub fn resolve(args: &[String]) -> Result<Self> {
        let data_dir = arg_value(args, "--data-dir")
            .or_else(|| env_value("TIMELINE_DATA_DIR"))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let raw_seasons = arg_values(args, "--season");
        let raw_seasons = if raw_seasons.is_empty() {
            env_value("TIMELINE_SEASONS").into_iter().collect()
        } else {
            raw_seasons
        };
        let mut seasons = Vec::new();
        for raw in &raw_seasons {
            for part in raw.split([',', ';', ' ']).filter(|p| !p.trim().is_empty()) {
                let season = part
                    .parse::<SeasonId>()
                    .with_context(|| format!("invalid season `{part}`"))?;
                if !seasons.contains(&season) {
                    seasons.push(season);
                }
            }
        }

        let db_path = arg_value(args, "--db")
            .or_else(|| env_value("TIMELINE_DB_PATH"))
            .map(PathBuf::from)
            .or_else(feature_store::default_db_path)
            .context("unable to resolve sqlite path; pass --db or set TIMELINE_DB_PATH")?;

        let build = resolve_build(args)?;

        let threads = arg_value(args, "--threads")
            .or_else(|| env_value("TIMELINE_THREADS"))
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_THREADS)
            .clamp(1, 32);

        Ok(Self {
            data_dir,
            seasons,
            db_path,
            build,
            threads,
            force: has_flag(args, "--force"),
        })
    }
}

pub fn resolve_build(args: &[String]) -> Result<BuildOptions> {
    let skip_budget = match arg_value(args, "--skip-budget")
        .or_else(|| env_value("TIMELINE_SKIP_BUDGET"))
    {
        Some(raw) => raw
            .trim()
            .parse::<usize>()
            .with_context(|| format!("invalid skip budget `{raw}`"))?
            .clamp(1, 1000),
        None => DEFAULT_SKIP_BUDGET,
    };

    let skew_epsilon = match arg_value(args, "--skew-epsilon")
        .or_else(|| env_value("TIMELINE_SKEW_EPSILON"))
    {
        Some(raw) => {
            let eps = raw
                .trim()
                .parse::<f64>()
                .with_context(|| format!("invalid skew epsilon `{raw}`"))?;
            if !(eps.is_finite() && eps > 0.0) {
                return Err(anyhow!("skew epsilon must be positive, got {eps}"));
            }
            eps
        }
        None => SKEW_EPSILON,
    };

    Ok(BuildOptions {
        skip_budget,
        skew_epsilon,
    })
}

pub fn positional_args(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg.starts_with("--") {
            skip_next = VALUE_FLAGS.contains(&arg.as_str());
            continue;
        }
        out.push(arg.as_str());
    }
    out
}

/// `$XDG_CACHE_HOME/rink_timeline`, else `~/.cache/rink_timeline`.
pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(CACHE_DIR));
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn arg_value(args: &[String], name: &str) -> Option<String> {
    arg_values(args, name).pop()
}

fn arg_values(args: &[String], name: &str) -> Vec<String> {
    let prefix = format!("{name}=");
    let mut out = Vec::new();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            if !value.trim().is_empty() {
                out.push(value.trim().to_string());
            }
            continue;
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
            && !next.starts_with("--")
        {
            out.push(next.trim().to_string());
        }
    }
    out
}

fn has_flag(args: &[String], name: &str) -> bool {
    args.iter().any(|arg| arg == name)
}
