// ============================================================================
// SIGNAL SOURCES
// ============================================================================

use crate::config::LEVELS;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::io::{BufRead, BufReader};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use thiserror::Error;
use tracing::{debug, warn};

/// One reading from a signal source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalSample {
    /// Signal level in `0..LEVELS`, higher is stronger.
    Level(u8),
    Disconnected,
}

impl SignalSample {
    /// Level sample clamped into the valid range.
    pub fn level(level: u8) -> Self {
        SignalSample::Level(level.min(LEVELS - 1))
    }

    pub fn is_disconnected(&self) -> bool {
        matches!(self, SignalSample::Disconnected)
    }

    /// Fill fraction shown for this sample.
    pub fn fraction(&self) -> f32 {
        match *self {
            SignalSample::Level(level) => level.min(LEVELS - 1) as f32 / (LEVELS - 1) as f32,
            SignalSample::Disconnected => 0.0,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignalError {
    #[error("signal source is unavailable")]
    Unavailable,

    #[error("malformed signal reading: {input:?}")]
    Malformed { input: String },
}

/// Anything the poller can ask for the current signal level.
///
/// Implementations must return quickly; blocking work belongs on another
/// thread, with `sample` reporting whatever was last observed.
pub trait SignalSource {
    fn sample(&mut self) -> Result<SignalSample, SignalError>;
}

impl<S: SignalSource + ?Sized> SignalSource for Box<S> {
    fn sample(&mut self) -> Result<SignalSample, SignalError> {
        (**self).sample()
    }
}

/// A missing source behaves like an unavailable one.
impl<S: SignalSource> SignalSource for Option<S> {
    fn sample(&mut self) -> Result<SignalSample, SignalError> {
        match self {
            Some(source) => source.sample(),
            None => Err(SignalError::Unavailable),
        }
    }
}

/// Always reports the same sample.
#[derive(Debug, Clone, Copy)]
pub struct FixedSignal(pub SignalSample);

impl SignalSource for FixedSignal {
    fn sample(&mut self) -> Result<SignalSample, SignalError> {
        Ok(self.0)
    }
}

/// Replays a fixed sequence of readings, then repeats the last one.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSignal {
    pending: VecDeque<Result<SignalSample, SignalError>>,
    last: Option<Result<SignalSample, SignalError>>,
    calls: usize,
}

impl ScriptedSignal {
    pub fn new(readings: impl IntoIterator<Item = Result<SignalSample, SignalError>>) -> Self {
        Self {
            pending: readings.into_iter().collect(),
            last: None,
            calls: 0,
        }
    }

    pub fn from_samples(samples: impl IntoIterator<Item = SignalSample>) -> Self {
        Self::new(samples.into_iter().map(Ok))
    }

    /// Queues another reading.
    pub fn push(&mut self, reading: Result<SignalSample, SignalError>) {
        self.pending.push_back(reading);
    }

    /// How many times `sample` has been called.
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl SignalSource for ScriptedSignal {
    fn sample(&mut self) -> Result<SignalSample, SignalError> {
        self.calls += 1;
        if let Some(next) = self.pending.pop_front() {
            self.last = Some(next);
        }
        self.last.clone().unwrap_or(Err(SignalError::Unavailable))
    }
}

// ============================================================================
// PIPE SOURCE
// ============================================================================

const NO_READING: u32 = u32::MAX;
const DISCONNECTED: u32 = u32::MAX - 1;

/// Reads levels line by line from a stream on a helper thread.
///
/// Lines are a level (`0`..`4`) or one of `none`, `off`, `-` for a lost
/// connection. `sample` only reads the most recent value and never blocks.
#[derive(Debug, Clone)]
pub struct PipeSignal {
    latest: Arc<AtomicU32>,
}

impl PipeSignal {
    pub fn stdin() -> Self {
        Self::from_reader(BufReader::new(std::io::stdin()))
    }

    pub fn from_reader<R: BufRead + Send + 'static>(reader: R) -> Self {
        let latest = Arc::new(AtomicU32::new(NO_READING));
        let shared = Arc::clone(&latest);

        thread::spawn(move || {
            for line in reader.lines() {
                let Ok(line) = line else {
                    break;
                };
                match parse_reading(&line) {
                    Ok(SignalSample::Level(level)) => {
                        shared.store(u32::from(level), Ordering::Relaxed)
                    }
                    Ok(SignalSample::Disconnected) => shared.store(DISCONNECTED, Ordering::Relaxed),
                    Err(e) => warn!("ignoring pipe input: {}", e),
                }
            }
            debug!("signal pipe closed");
        });

        Self { latest }
    }
}

impl SignalSource for PipeSignal {
    fn sample(&mut self) -> Result<SignalSample, SignalError> {
        match self.latest.load(Ordering::Relaxed) {
            NO_READING => Err(SignalError::Unavailable),
            DISCONNECTED => Ok(SignalSample::Disconnected),
            level => Ok(SignalSample::level(level.min(u32::from(LEVELS - 1)) as u8)),
        }
    }
}

/// Parses one line of pipe input.
pub fn parse_reading(line: &str) -> Result<SignalSample, SignalError> {
    let trimmed = line.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "none" | "off" | "-" => Ok(SignalSample::Disconnected),
        other => other
            .parse::<u8>()
            .ok()
            .filter(|level| *level < LEVELS)
            .map(SignalSample::Level)
            .ok_or_else(|| SignalError::Malformed {
                input: trimmed.to_string(),
            }),
    }
}

// ============================================================================
// RANDOM WALK SOURCE
// ============================================================================

/// Wanders between neighbouring levels and occasionally drops out.
#[derive(Debug, Clone)]
pub struct RandomWalkSignal {
    rng: StdRng,
    current: SignalSample,
    dropout_chance: f64,
}

impl RandomWalkSignal {
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            current: SignalSample::Level(LEVELS - 1),
            dropout_chance: 0.1,
        }
    }

    pub fn dropout_chance(mut self, chance: f64) -> Self {
        self.dropout_chance = chance.clamp(0.0, 1.0);
        self
    }
}

impl Default for RandomWalkSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalSource for RandomWalkSignal {
    fn sample(&mut self) -> Result<SignalSample, SignalError> {
        self.current = match self.current {
            SignalSample::Disconnected => {
                if self.rng.random_bool(0.5) {
                    SignalSample::Level(self.rng.random_range(0..LEVELS))
                } else {
                    SignalSample::Disconnected
                }
            }
            SignalSample::Level(_) if self.rng.random_bool(self.dropout_chance) => {
                SignalSample::Disconnected
            }
            SignalSample::Level(level) => {
                let step: i8 = self.rng.random_range(-1..=1);
                let next = (level as i8 + step).clamp(0, LEVELS as i8 - 1);
                SignalSample::Level(next as u8)
            }
        };
        Ok(self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::{Duration, Instant};

    #[test]
    fn level_maps_to_quarters() {
        assert_eq!(SignalSample::Level(0).fraction(), 0.0);
        assert_eq!(SignalSample::Level(2).fraction(), 0.5);
        assert_eq!(SignalSample::Level(4).fraction(), 1.0);
        assert_eq!(SignalSample::Level(9).fraction(), 1.0);
        assert_eq!(SignalSample::Disconnected.fraction(), 0.0);
        assert_eq!(SignalSample::level(200), SignalSample::Level(4));
    }

    #[test]
    fn parses_pipe_lines() {
        assert_eq!(parse_reading(" 3 "), Ok(SignalSample::Level(3)));
        assert_eq!(parse_reading("None"), Ok(SignalSample::Disconnected));
        assert_eq!(parse_reading("-"), Ok(SignalSample::Disconnected));
        assert!(matches!(parse_reading("5"), Err(SignalError::Malformed { .. })));
        assert!(matches!(parse_reading("loud"), Err(SignalError::Malformed { .. })));
    }

    #[test]
    fn scripted_signal_repeats_last_reading() {
        let mut s = ScriptedSignal::from_samples([SignalSample::Level(1), SignalSample::Disconnected]);
        assert_eq!(s.sample(), Ok(SignalSample::Level(1)));
        assert_eq!(s.sample(), Ok(SignalSample::Disconnected));
        assert_eq!(s.sample(), Ok(SignalSample::Disconnected));
        assert_eq!(s.calls(), 3);

        let mut empty = ScriptedSignal::default();
        assert_eq!(empty.sample(), Err(SignalError::Unavailable));
    }

    #[test]
    fn missing_source_is_unavailable() {
        let mut none: Option<FixedSignal> = None;
        assert_eq!(none.sample(), Err(SignalError::Unavailable));
    }

    #[test]
    fn pipe_signal_reports_latest_line() {
        let mut pipe = PipeSignal::from_reader(Cursor::new("2\nbogus\n4\noff\n"));

        let deadline = Instant::now() + Duration::from_secs(2);
        while pipe.sample() != Ok(SignalSample::Disconnected) && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(pipe.sample(), Ok(SignalSample::Disconnected));
    }

    #[test]
    fn random_walk_stays_in_range() {
        let mut walk = RandomWalkSignal::with_seed(7).dropout_chance(0.2);
        let mut saw_dropout = false;
        for _ in 0..500 {
            match walk.sample().unwrap() {
                SignalSample::Level(level) => assert!(level < LEVELS),
                SignalSample::Disconnected => saw_dropout = true,
            }
        }
        assert!(saw_dropout);
    }
}
