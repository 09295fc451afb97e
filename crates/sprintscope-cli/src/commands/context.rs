//! Shared command plumbing: global flags, dataset/config loading, cache.

use std::path::PathBuf;

use clap::Args;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sprintscope_core::risk::{rng_for, Mcg128Xsl64};
use sprintscope_core::storage::cache_dir;
use sprintscope_core::{fingerprint, AnalyticsConfig, Dataset, ResultCache};

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Dataset JSON file (sprints, stories, initiatives, team)
    #[arg(long, global = true, env = "SPRINTSCOPE_DATA")]
    pub data: Option<PathBuf>,

    /// Configuration TOML file (defaults to ~/.config/sprintscope/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Seed for the completion simulation (overrides simulation.seed)
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Skip the on-disk result cache
    #[arg(long, global = true)]
    pub no_cache: bool,
}

/// Everything a data command needs.
pub struct Context {
    pub dataset: Dataset,
    pub config: AnalyticsConfig,
    seed: Option<u64>,
    cache: Option<ResultCache>,
}

impl Context {
    pub fn load(global: &GlobalArgs) -> Result<Self, Box<dyn std::error::Error>> {
        let path = global
            .data
            .as_deref()
            .ok_or("no dataset given; pass --data <file.json> or set SPRINTSCOPE_DATA")?;
        let dataset = Dataset::from_json_file(path)?;
        let config = AnalyticsConfig::load(global.config.as_deref())?;

        let cache = if global.no_cache {
            None
        } else {
            match cache_dir().map(|dir| ResultCache::with_dir(dir.join("results"))) {
                Ok(Ok(cache)) => Some(cache),
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "result cache unavailable");
                    None
                }
                Err(e) => {
                    tracing::warn!(error = %e, "result cache unavailable");
                    None
                }
            }
        };

        Ok(Self {
            seed: global.seed.or(config.simulation.seed),
            dataset,
            config,
            cache,
        })
    }

    /// Effective simulation seed.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn rng(&self) -> Mcg128Xsl64 {
        rng_for(self.seed)
    }

    /// Run `compute`, reusing a cached result for the same command, inputs
    /// and configuration. Unseeded random results are never cached.
    pub fn cached<K, T, F>(&mut self, command: &str, key: &K, randomized: bool, compute: F) -> Result<T, Box<dyn std::error::Error>>
    where
        K: Serialize + ?Sized,
        T: Serialize + DeserializeOwned,
        F: FnOnce(&Self) -> Result<T, Box<dyn std::error::Error>>,
    {
        let cacheable = !randomized || self.seed.is_some();
        if !cacheable || self.cache.is_none() {
            return compute(self);
        }

        let inputs = (command, key, &self.dataset, self.seed);
        let fp = fingerprint(&inputs, &self.config)?;
        if let Some(hit) = self.cache.as_mut().and_then(|c| c.get::<T>(&fp)) {
            tracing::debug!(command, "using cached result");
            return Ok(hit);
        }

        let value = compute(self)?;
        if let Some(cache) = self.cache.as_mut() {
            if let Err(e) = cache.insert(&fp, &value) {
                tracing::warn!(error = %e, "failed to store result in cache");
            }
        }
        Ok(value)
    }
}

/// Pretty-print a value as JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CommandResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
