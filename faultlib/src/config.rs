use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use crate::error::{Error, Result};

/// A configuration for a whole Monte Carlo run
///
/// Every field is optional in the JSON input; missing fields take the defaults below, so `{}` is
/// a valid configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Number of traces to generate and average over
    pub trials: u64,
    /// Number of references in each trace. Independent of `trials`
    pub trace_length: usize,
    /// Smallest working set size to simulate
    pub wss_lower: usize,
    /// Largest working set size to simulate, inclusive
    pub wss_upper: usize,
    /// Mean of the normal distribution each region's pages are drawn from
    pub mean: f64,
    /// Standard deviation of that distribution
    pub std_dev: f64,
    /// Number of contiguous regions in a trace, each with its own hot spot
    pub regions: usize,
    /// Distance between the hot spots of adjacent regions
    pub region_stride: i64,
    /// Seed for the random source. Seeded from OS entropy when absent
    pub seed: Option<u64>,
    /// Number of worker threads trials are spread over
    pub threads: usize,
    /// How LRU finds its victim
    pub lru_strategy: LruStrategy,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            trials: 1000,
            trace_length: 1000,
            wss_lower: 4,
            wss_upper: 20,
            mean: 10.0,
            std_dev: 2.0,
            regions: 10,
            region_stride: 10,
            seed: None,
            threads: 1,
            lru_strategy: LruStrategy::default(),
        }
    }
}

impl SimulationConfig {
    /// Reads and validates a JSON configuration
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let config: SimulationConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON configuration file
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::InvalidConfig(format!("Couldn't open the config file at path {}: {e}", path.display())))?;
        Self::from_reader(BufReader::new(file))
    }

    /// Checks the configuration describes a simulation which can be run
    pub fn validate(&self) -> Result<()> {
        let reject = |reason: String| Err(Error::InvalidConfig(reason));
        if self.trials == 0 {
            return reject("trials must be at least 1".to_string());
        }
        if self.wss_lower == 0 {
            return reject("wss_lower must be at least 1".to_string());
        }
        if self.wss_lower > self.wss_upper {
            return reject(format!("wss_lower ({}) is greater than wss_upper ({})", self.wss_lower, self.wss_upper));
        }
        if self.regions == 0 {
            return reject("regions must be at least 1".to_string());
        }
        if self.trace_length < self.regions {
            return reject(format!("trace_length ({}) must be at least the number of regions ({})", self.trace_length, self.regions));
        }
        if !self.mean.is_finite() {
            return reject(format!("mean must be finite, got {}", self.mean));
        }
        if !self.std_dev.is_finite() || self.std_dev < 0.0 {
            return reject(format!("std_dev must be finite and non-negative, got {}", self.std_dev));
        }
        if self.threads == 0 {
            return reject("threads must be at least 1".to_string());
        }
        Ok(())
    }

    /// The simulated working set sizes, in ascending order
    pub fn working_set_sizes(&self) -> std::ops::RangeInclusive<usize> {
        self.wss_lower..=self.wss_upper
    }
}

/// The replacement policies compared by the simulator
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum PolicyKind {
    #[serde(alias = "lru")]
    LeastRecentlyUsed,
    #[serde(alias = "fifo")]
    FirstInFirstOut,
    #[serde(alias = "clock")]
    Clock,
}

impl PolicyKind {
    /// Every policy, in output column order
    pub const ALL: [PolicyKind; 3] = [PolicyKind::LeastRecentlyUsed, PolicyKind::FirstInFirstOut, PolicyKind::Clock];

    /// The column header used in the results table
    pub fn column_name(self) -> &'static str {
        match self {
            PolicyKind::LeastRecentlyUsed => "LRU",
            PolicyKind::FirstInFirstOut => "FIFO",
            PolicyKind::Clock => "Clock",
        }
    }

    /// Position in `ALL`
    pub fn index(self) -> usize {
        match self {
            PolicyKind::LeastRecentlyUsed => 0,
            PolicyKind::FirstInFirstOut => 1,
            PolicyKind::Clock => 2,
        }
    }
}

/// How the LRU policy finds its victim. Both select identical victims - rescan or timestamp.
/// Defaults to rescan.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum LruStrategy {
    /// Scan the trace backwards from each fault
    #[default]
    #[serde(alias = "rescan")]
    Rescan,
    /// Keep a logical timestamp per slot
    #[serde(alias = "timestamp")]
    Timestamp,
}
