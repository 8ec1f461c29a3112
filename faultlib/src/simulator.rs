use std::ops::RangeInclusive;
use std::thread;
use std::time::{Duration, Instant};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use crate::config::{LruStrategy, PolicyKind, SimulationConfig};
use crate::frame::count_faults;
use crate::trace::{SeededSource, TraceGenerator, UniformSource};
use crate::PageId;

/// The Monte Carlo simulator. Generates one trace per trial, runs every policy over every
/// working set size on that trace, and averages the fault counts once all trials are done.
///
/// It supports calling simulate multiple times; each call starts from fresh accumulators, and
/// the time taken is added to the total
pub struct Simulator {
    config: SimulationConfig,
    generator: TraceGenerator,
    result: SimulationResult,
    simulation_time: Duration,
}

/// The averaged fault counts of a simulation. Can be serialised to JSON
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct SimulationResult {
    trials: u64,
    rows: Vec<ResultRow>,
}

/// The averaged fault counts for one working set size
#[derive(Debug, Copy, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct ResultRow {
    pub wss: usize,
    pub lru: u64,
    pub fifo: u64,
    pub clock: u64,
}

impl ResultRow {
    /// The averaged fault count for one policy
    pub fn get(&self, kind: PolicyKind) -> u64 {
        match kind {
            PolicyKind::LeastRecentlyUsed => self.lru,
            PolicyKind::FirstInFirstOut => self.fifo,
            PolicyKind::Clock => self.clock,
        }
    }
}

impl SimulationResult {
    /// The number of trials averaged over
    pub fn trials(&self) -> u64 {
        self.trials
    }

    /// One row per working set size, ascending
    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn row(&self, wss: usize) -> Option<&ResultRow> {
        self.rows.iter().find(|row| row.wss == wss)
    }

    /// The averaged fault count of one policy at one working set size
    pub fn average(&self, kind: PolicyKind, wss: usize) -> Option<u64> {
        self.row(wss).map(|row| row.get(kind))
    }
}

/// Running sums of fault counts, per policy and working set size
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FaultAccumulator {
    wss_lower: usize,
    // Indexed by wss - wss_lower, then by PolicyKind::index
    sums: Vec<[u64; 3]>,
}

impl FaultAccumulator {
    pub fn new(sizes: RangeInclusive<usize>) -> Self {
        let wss_lower = *sizes.start();
        Self {
            wss_lower,
            sums: vec![[0; 3]; sizes.count()],
        }
    }

    /// Adds the fault count of one policy run
    ///
    /// # Panics
    ///
    /// If `wss` is outside the range the accumulator was created with
    pub fn add(&mut self, kind: PolicyKind, wss: usize, faults: u64) {
        self.sums[wss - self.wss_lower][kind.index()] += faults;
    }

    pub fn sum(&self, kind: PolicyKind, wss: usize) -> u64 {
        self.sums[wss - self.wss_lower][kind.index()]
    }

    /// Adds another accumulator over the same sizes into this one
    pub fn merge(&mut self, other: &FaultAccumulator) {
        debug_assert_eq!(self.wss_lower, other.wss_lower);
        debug_assert_eq!(self.sums.len(), other.sums.len());
        for (mine, theirs) in self.sums.iter_mut().zip(&other.sums) {
            for (a, b) in mine.iter_mut().zip(theirs) {
                *a += *b;
            }
        }
    }

    /// Divides every sum by the trial count, truncating
    pub fn average(&self, trials: u64) -> SimulationResult {
        let rows = self.sums
            .iter()
            .enumerate()
            .map(|(offset, sums)| ResultRow {
                wss: self.wss_lower + offset,
                lru: sums[PolicyKind::LeastRecentlyUsed.index()] / trials,
                fifo: sums[PolicyKind::FirstInFirstOut.index()] / trials,
                clock: sums[PolicyKind::Clock.index()] / trials,
            })
            .collect();
        SimulationResult { trials, rows }
    }
}

/// Runs every policy at every working set size over one trace, accumulating the fault counts
pub fn run_trial(trace: &[PageId], sizes: RangeInclusive<usize>, lru_strategy: LruStrategy, accumulator: &mut FaultAccumulator) {
    for wss in sizes {
        for kind in PolicyKind::ALL {
            accumulator.add(kind, wss, count_faults(kind, lru_strategy, wss, trace));
        }
    }
}

impl Simulator {
    /// Creates a new simulator for a given configuration
    ///
    /// # Arguments
    ///
    /// * `config`: A validated simulation configuration, usually resulting from parsing JSON
    ///
    /// returns: Simulator
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            config: config.clone(),
            generator: TraceGenerator::from_config(config),
            result: FaultAccumulator::new(config.working_set_sizes()).average(config.trials),
            simulation_time: Duration::new(0, 0),
        }
    }

    /// Runs the configured number of trials on a single thread, drawing randomness from `source`
    ///
    /// returns: &SimulationResult
    pub fn simulate<U: UniformSource + ?Sized>(&mut self, source: &mut U) -> &SimulationResult {
        let start = Instant::now();
        let trials = self.config.trials;
        info!("Running {trials} traces of {} references", self.generator.length());
        let mut accumulator = FaultAccumulator::new(self.config.working_set_sizes());
        let mut trace = Vec::with_capacity(self.generator.length());
        let progress_step = (trials / 10).max(1);
        for trial in 0..trials {
            debug!("Running traces... ({}/{trials})", trial + 1);
            self.generator.fill(source, &mut trace);
            run_trial(&trace, self.config.working_set_sizes(), self.config.lru_strategy, &mut accumulator);
            if (trial + 1) % progress_step == 0 {
                info!("Completed {}/{trials} traces", trial + 1);
            }
        }
        self.finish(&accumulator, start)
    }

    /// Spreads the configured number of trials over `threads` workers
    ///
    /// Worker `k` takes trials `k, k + threads, ...` and draws from its own ChaCha8 stream `k` of
    /// `seed`, so the result depends only on the seed and the thread count. Each worker keeps a
    /// private accumulator, and these are summed once every worker has finished
    ///
    /// # Panics
    ///
    /// If `threads` is zero, or a worker panics
    pub fn simulate_parallel(&mut self, seed: u64, threads: usize) -> &SimulationResult {
        assert!(threads > 0, "at least one worker is required");
        let start = Instant::now();
        let trials = self.config.trials;
        info!("Running {trials} traces of {} references on {threads} threads", self.generator.length());
        let generator = &self.generator;
        let config = &self.config;
        let accumulator = thread::scope(|scope| {
            let workers: Vec<_> = (0..threads)
                .map(|worker| {
                    scope.spawn(move || {
                        let mut source = SeededSource::with_stream(seed, worker as u64);
                        let mut accumulator = FaultAccumulator::new(config.working_set_sizes());
                        let mut trace = Vec::with_capacity(generator.length());
                        let mut trial = worker as u64;
                        while trial < trials {
                            debug!("Worker {worker} running trace {}/{trials}", trial + 1);
                            generator.fill(&mut source, &mut trace);
                            run_trial(&trace, config.working_set_sizes(), config.lru_strategy, &mut accumulator);
                            trial += threads as u64;
                        }
                        accumulator
                    })
                })
                .collect();
            let mut total = FaultAccumulator::new(config.working_set_sizes());
            for worker in workers {
                match worker.join() {
                    Ok(partial) => total.merge(&partial),
                    Err(panic) => std::panic::resume_unwind(panic),
                }
            }
            total
        });
        self.finish(&accumulator, start)
    }

    /// Runs the simulation as configured: seeded from the configuration (or OS entropy), on the
    /// configured number of threads
    pub fn run(&mut self) -> &SimulationResult {
        let seed = self.config.seed.unwrap_or_else(rand::random);
        info!("Using seed {seed}");
        let threads = self.config.threads;
        if threads == 1 {
            self.simulate(&mut SeededSource::new(seed))
        } else {
            self.simulate_parallel(seed, threads)
        }
    }

    fn finish(&mut self, accumulator: &FaultAccumulator, start: Instant) -> &SimulationResult {
        self.result = accumulator.average(self.config.trials);
        let end = Instant::now();
        self.simulation_time += end - start;
        info!("Finished {} traces in {:?}", self.config.trials, end - start);
        &self.result
    }

    /// The result of the last simulation, all zeroes before one has run
    pub fn result(&self) -> &SimulationResult {
        &self.result
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Gets the wall-clock execution time for simulating
    pub fn get_execution_time(&self) -> &Duration {
        &self.simulation_time
    }
}
