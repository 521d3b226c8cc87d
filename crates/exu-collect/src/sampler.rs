//! Online reducers applied to metric streams before storage.
//!
//! A reducer turns a high-frequency stream of observations into a sparser
//! stream of summary values without retaining full-resolution history. The
//! variants form a closed set dispatched by pattern match; composition is
//! expressed with [`Sampler::pipe`].

use serde::{Deserialize, Serialize};

/// A stateful online reducer over scalar observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Sampler {
    /// Pass every observation through unchanged.
    Identity,
    /// Average observations over a fixed-size window, emitting one mean per
    /// full window.
    Window {
        /// Window length.
        size: usize,
        /// Accumulation buffer, `size` slots.
        buffer: Vec<f64>,
        /// Fill cursor into the buffer.
        clock: usize,
    },
    /// Emit every `freq`-th observation, including the very first.
    Subsample {
        /// Emission period.
        freq: usize,
        /// Observation counter mod nothing; ticks when `clock % freq == 0`.
        clock: usize,
    },
    /// Exponential moving average `z <- decay * z + (1 - decay) * v`.
    MovingAverage {
        /// Decay factor in `[0, 1)`.
        decay: f64,
        /// Current accumulator value.
        z: f64,
    },
    /// Swallow every observation.
    Ignore,
    /// Left-to-right composition of reducers; empty output at any stage
    /// short-circuits the rest.
    Pipe(Vec<Sampler>),
}

impl Sampler {
    /// A pass-through reducer.
    pub fn identity() -> Self {
        Sampler::Identity
    }

    /// A fixed-size windowed mean.
    pub fn window(size: usize) -> Self {
        Sampler::Window {
            size: size.max(1),
            buffer: vec![0.0; size.max(1)],
            clock: 0,
        }
    }

    /// A periodic subsampler.
    pub fn subsample(freq: usize) -> Self {
        Sampler::Subsample {
            freq: freq.max(1),
            clock: 0,
        }
    }

    /// An exponential moving average.
    pub fn moving_average(decay: f64) -> Self {
        Sampler::MovingAverage { decay, z: 0.0 }
    }

    /// A reducer that drops everything.
    pub fn ignore() -> Self {
        Sampler::Ignore
    }

    /// Composes reducers in sequence.
    pub fn pipe(stages: Vec<Sampler>) -> Self {
        Sampler::Pipe(stages)
    }

    /// Whether this reducer drops every observation.
    pub fn is_ignore(&self) -> bool {
        matches!(self, Sampler::Ignore)
    }

    /// Feeds one observation through the reducer.
    pub fn next(&mut self, v: f64) -> Option<f64> {
        match self {
            Sampler::Identity => Some(v),
            Sampler::Window {
                size,
                buffer,
                clock,
            } => {
                buffer[*clock] = v;
                *clock += 1;
                if *clock == *size {
                    *clock = 0;
                    Some(mean(buffer))
                } else {
                    None
                }
            }
            Sampler::Subsample { freq, clock } => {
                let tick = *clock % *freq == 0;
                *clock += 1;
                if tick {
                    Some(v)
                } else {
                    None
                }
            }
            Sampler::MovingAverage { decay, z } => {
                *z = *decay * *z + (1.0 - *decay) * v;
                Some(*z)
            }
            Sampler::Ignore => None,
            Sampler::Pipe(stages) => {
                let mut out = Some(v);
                for stage in stages {
                    out = match out {
                        Some(value) => stage.next(value),
                        None => return None,
                    };
                }
                out
            }
        }
    }

    /// Feeds a lazily-produced observation through the reducer.
    ///
    /// The closure runs only when the reducer's sampling condition actually
    /// requires the value, so expensive evaluation metrics are not computed
    /// on steps that would be dropped anyway.
    pub fn next_eval(&mut self, f: impl FnOnce() -> f64) -> Option<f64> {
        match self {
            Sampler::Identity => Some(f()),
            Sampler::Subsample { freq, clock } => {
                let tick = *clock % *freq == 0;
                *clock += 1;
                if tick {
                    Some(f())
                } else {
                    None
                }
            }
            Sampler::Ignore => None,
            Sampler::Pipe(stages) => {
                let (first, rest) = match stages.split_first_mut() {
                    Some(split) => split,
                    None => return Some(f()),
                };
                let mut out = first.next_eval(f);
                for stage in rest {
                    out = match out {
                        Some(value) => stage.next(value),
                        None => return None,
                    };
                }
                out
            }
            other => {
                let v = f();
                other.next(v)
            }
        }
    }

    /// Applies the same observation `times` times.
    ///
    /// Equivalent to calling [`next`](Self::next) in a loop and collecting
    /// the emissions, but reducers exploit the repetition: a window fills in
    /// slices and skips whole windows outright (a window uniformly filled
    /// with `v` has mean `v`), and a subsampler counts its ticks in closed
    /// form.
    pub fn repeat(&mut self, v: f64, times: usize) -> Vec<f64> {
        match self {
            Sampler::Identity => vec![v; times],
            Sampler::Ignore => Vec::new(),
            Sampler::MovingAverage { .. } => {
                let mut out = Vec::with_capacity(times);
                for _ in 0..times {
                    if let Some(z) = self.next(v) {
                        out.push(z);
                    }
                }
                out
            }
            Sampler::Subsample { freq, clock } => {
                let start = *clock;
                let end = start + times;
                let ticks = div_ceil(end, *freq) - div_ceil(start, *freq);
                *clock = end % *freq;
                vec![v; ticks]
            }
            Sampler::Window {
                size,
                buffer,
                clock,
            } => {
                let mut out = Vec::new();
                let mut remaining = times;
                while remaining > 0 {
                    let room = *size - *clock;
                    let take = remaining.min(room);

                    // a full window of one repeated value trivially means v
                    if *clock == 0 && take == *size {
                        remaining -= take;
                        out.push(v);
                        continue;
                    }

                    for slot in buffer.iter_mut().skip(*clock).take(take) {
                        *slot = v;
                    }
                    *clock = (*clock + take) % *size;
                    remaining -= take;

                    if *clock == 0 {
                        out.push(mean(buffer));
                    }
                }
                out
            }
            Sampler::Pipe(stages) => {
                let (first, rest) = match stages.split_first_mut() {
                    Some(split) => split,
                    None => return vec![v; times],
                };
                let mut out = Vec::new();
                'emission: for emitted in first.repeat(v, times) {
                    let mut cur = emitted;
                    for stage in rest.iter_mut() {
                        cur = match stage.next(cur) {
                            Some(value) => value,
                            None => continue 'emission,
                        };
                    }
                    out.push(cur);
                }
                out
            }
        }
    }

    /// Drains any partially-accumulated state at the end of a run.
    ///
    /// A half-full window emits the mean of what it holds; a subsampler
    /// resets its clock; a moving average keeps its state (it is not
    /// windowed) and emits nothing.
    pub fn end(&mut self) -> Option<f64> {
        match self {
            Sampler::Window { buffer, clock, .. } => {
                let out = if *clock > 0 {
                    Some(mean(&buffer[..*clock]))
                } else {
                    None
                };
                *clock = 0;
                out
            }
            Sampler::Subsample { clock, .. } => {
                *clock = 0;
                None
            }
            _ => None,
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn div_ceil(x: usize, d: usize) -> usize {
    (x + d - 1) / d
}
