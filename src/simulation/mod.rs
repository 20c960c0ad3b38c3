pub mod metrics;
mod process;

pub use metrics::{parse_metric, parse_value, MetricError};
pub use process::{default_program, ProcessSimulator, SimulatorBuild};

use crate::types::{CacheStats, RenderMode};
use indexmap::IndexMap;
use tracing::debug;

/// External evaluation process, reachable only through its text output.
pub trait Simulator {
    /// Run the simulator on `params` followed by the render token and return its stdout.
    ///
    /// Launch failures and abnormal exits yield empty or partial text.
    fn invoke(&self, params: &[f64], render: &RenderMode) -> String;

    /// Run the simulator without parameters and read the argument count it expects.
    fn expected_args(&self) -> Result<usize, String>;
}

/// Exact-equality key for a candidate vector (bitwise, no tolerance).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey(Vec<u64>);

impl CacheKey {
    pub fn new(params: &[f64]) -> Self {
        Self(params.iter().map(|v| v.to_bits()).collect())
    }
}

/// Memoizing front of a [`Simulator`], owning the cache and call counter of one run.
pub struct SimulatorAdapter<S: Simulator> {
    simulator: S,
    cache: IndexMap<CacheKey, String>,
    call_counter: u64,
    calls_between_image: u64,
    hits: u64,
    misses: u64,
}

impl<S: Simulator> SimulatorAdapter<S> {
    pub fn new(simulator: S, calls_between_image: u64) -> Self {
        Self {
            simulator,
            cache: IndexMap::new(),
            call_counter: 0,
            calls_between_image: calls_between_image.max(1),
            hits: 0,
            misses: 0,
        }
    }

    pub fn simulator(&self) -> &S {
        &self.simulator
    }

    pub fn call_counter(&self) -> u64 {
        self.call_counter
    }

    /// Render mode for the next evaluation; advances the call counter.
    ///
    /// The counter moves on every evaluation, cache hits included, so the
    /// cadence follows evaluation requests rather than process launches.
    pub fn next_render_mode(&mut self) -> RenderMode {
        let mode = if self.call_counter % self.calls_between_image == 0 {
            RenderMode::Auto
        } else {
            RenderMode::Suppress
        };
        self.call_counter += 1;
        mode
    }

    /// Output for `params`, from the cache when this exact vector was seen before.
    pub fn invoke(&mut self, params: &[f64], render: &RenderMode) -> &str {
        let key = CacheKey::new(params);
        if self.cache.contains_key(&key) {
            self.hits += 1;
            debug!(call = self.call_counter, "cache hit");
        } else {
            self.misses += 1;
            let output = self.simulator.invoke(params, render);
            debug!(
                call = self.call_counter,
                render = render.as_arg(),
                bytes = output.len(),
                "simulator invoked"
            );
            self.cache.insert(key.clone(), output);
        }
        self.cache.get(&key).map(String::as_str).unwrap_or_default()
    }

    /// Evaluation entry point used by the objective: cadence first, then the cache.
    pub fn evaluate(&mut self, params: &[f64]) -> String {
        let render = self.next_render_mode();
        self.invoke(params, &render).to_string()
    }

    pub fn expected_args(&self) -> Result<usize, String> {
        self.simulator.expected_args()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Forget everything from a previous run.
    pub fn reset(&mut self) {
        self.cache.clear();
        self.call_counter = 0;
        self.hits = 0;
        self.misses = 0;
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.cache.len(),
        }
    }

    /// Cached vectors in the order they were first evaluated.
    pub fn history(&self) -> impl Iterator<Item = (&CacheKey, &str)> {
        self.cache.iter().map(|(k, v)| (k, v.as_str()))
    }
}
