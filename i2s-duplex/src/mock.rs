//! In-memory peripheral and delay used by the unit and integration tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;
use parking_lot::Mutex;

use crate::bus::{BusError, I2sBus};
use crate::config::{BusConfig, PinMap};
use crate::format::sample_to_word;

/// Scripted result of one transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Move the whole buffer.
    Full,
    /// Move this many bytes.
    Bytes(usize),
    /// Fail with this error. `Timeout` sleeps for the timeout first.
    Fail(BusError),
}

#[derive(Default)]
struct State {
    installed: bool,
    install_count: usize,
    uninstall_count: usize,
    zero_count: usize,
    calls: usize,
    last_config: Option<BusConfig>,
    pins: Option<PinMap>,
    clock: Option<(u32, u8, u8)>,
    install_error: Option<BusError>,
    pins_error: Option<BusError>,
    clock_error: Option<BusError>,

    write_script: VecDeque<Step>,
    write_default: Option<Step>,
    writes: Vec<usize>,
    written: Vec<u32>,
    writes_while_uninstalled: usize,

    read_script: VecDeque<Step>,
    read_default: Option<Step>,
    reads: Vec<usize>,
    next_sample: i16,
}

/// Mock bus. Counts every hardware call and records transferred data.
///
/// Reads produce a ramp of samples (0, 1, 2, …) encoded as hardware words.
pub struct MockBus {
    state: Mutex<State>,
    pace: Duration,
}

impl Default for MockBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBus {
    pub fn new() -> Self {
        Self::with_pace(Duration::from_micros(200))
    }

    /// Mock whose transfers each take `pace` to complete.
    pub fn with_pace(pace: Duration) -> Self {
        Self {
            state: Mutex::new(State::default()),
            pace,
        }
    }

    pub fn fail_install(&self, err: BusError) {
        self.state.lock().install_error = Some(err);
    }

    pub fn fail_pins(&self, err: BusError) {
        self.state.lock().pins_error = Some(err);
    }

    pub fn fail_clock(&self, err: BusError) {
        self.state.lock().clock_error = Some(err);
    }

    /// Queue results for the next writes; afterwards `Full` is used again.
    pub fn script_writes(&self, steps: &[Step]) {
        self.state.lock().write_script.extend(steps.iter().copied());
    }

    /// Result for every write once the script is exhausted.
    pub fn default_write(&self, step: Step) {
        self.state.lock().write_default = Some(step);
    }

    pub fn script_reads(&self, steps: &[Step]) {
        self.state.lock().read_script.extend(steps.iter().copied());
    }

    pub fn default_read(&self, step: Step) {
        self.state.lock().read_default = Some(step);
    }

    pub fn install_count(&self) -> usize {
        self.state.lock().install_count
    }

    pub fn uninstall_count(&self) -> usize {
        self.state.lock().uninstall_count
    }

    pub fn zero_count(&self) -> usize {
        self.state.lock().zero_count
    }

    pub fn is_installed(&self) -> bool {
        self.state.lock().installed
    }

    /// Install, uninstall, pin, clock and DMA-zero calls made so far.
    pub fn hardware_calls(&self) -> usize {
        self.state.lock().calls
    }

    pub fn last_config(&self) -> Option<BusConfig> {
        self.state.lock().last_config.clone()
    }

    pub fn pins(&self) -> Option<PinMap> {
        self.state.lock().pins
    }

    pub fn last_clock(&self) -> Option<(u32, u8, u8)> {
        self.state.lock().clock
    }

    /// Requested byte length of every write, in order.
    pub fn writes(&self) -> Vec<usize> {
        self.state.lock().writes.clone()
    }

    /// Words accepted by the hardware, in order.
    pub fn written(&self) -> Vec<u32> {
        self.state.lock().written.clone()
    }

    pub fn writes_while_uninstalled(&self) -> usize {
        self.state.lock().writes_while_uninstalled
    }

    pub fn reads(&self) -> Vec<usize> {
        self.state.lock().reads.clone()
    }

    fn next_step(script: &mut VecDeque<Step>, default: Option<Step>) -> Step {
        script.pop_front().or(default).unwrap_or(Step::Full)
    }
}

impl I2sBus for MockBus {
    fn install(&self, config: &BusConfig) -> Result<(), BusError> {
        let mut s = self.state.lock();
        s.calls += 1;
        s.install_count += 1;
        s.last_config = Some(config.clone());
        if let Some(err) = s.install_error {
            return Err(err);
        }
        s.installed = true;
        Ok(())
    }

    fn uninstall(&self) {
        let mut s = self.state.lock();
        s.calls += 1;
        s.uninstall_count += 1;
        s.installed = false;
    }

    fn set_pins(&self, pins: &PinMap) -> Result<(), BusError> {
        let mut s = self.state.lock();
        s.calls += 1;
        if let Some(err) = s.pins_error {
            return Err(err);
        }
        s.pins = Some(*pins);
        Ok(())
    }

    fn zero_dma_buffer(&self) {
        let mut s = self.state.lock();
        s.calls += 1;
        s.zero_count += 1;
    }

    fn set_clock(
        &self,
        sample_rate: u32,
        bits_per_sample: u8,
        channels: u8,
    ) -> Result<(), BusError> {
        let mut s = self.state.lock();
        s.calls += 1;
        if let Some(err) = s.clock_error {
            return Err(err);
        }
        s.clock = Some((sample_rate, bits_per_sample, channels));
        Ok(())
    }

    fn write(&self, words: &[u32], timeout: Duration) -> Result<usize, BusError> {
        let step = {
            let mut s = self.state.lock();
            s.writes.push(words.len() * 4);
            if !s.installed {
                s.writes_while_uninstalled += 1;
            }
            let default = s.write_default;
            Self::next_step(&mut s.write_script, default)
        };

        match step {
            Step::Fail(BusError::Timeout) => {
                thread::sleep(timeout);
                Err(BusError::Timeout)
            }
            Step::Fail(err) => Err(err),
            Step::Full | Step::Bytes(_) => {
                thread::sleep(self.pace);
                let bytes = match step {
                    Step::Bytes(n) => n.min(words.len() * 4),
                    _ => words.len() * 4,
                };
                self.state.lock().written.extend_from_slice(&words[..bytes / 4]);
                Ok(bytes)
            }
        }
    }

    fn read(&self, words: &mut [u32], timeout: Duration) -> Result<usize, BusError> {
        let step = {
            let mut s = self.state.lock();
            s.reads.push(words.len() * 4);
            let default = s.read_default;
            Self::next_step(&mut s.read_script, default)
        };

        match step {
            Step::Fail(BusError::Timeout) => {
                thread::sleep(timeout);
                Err(BusError::Timeout)
            }
            Step::Fail(err) => Err(err),
            Step::Full | Step::Bytes(_) => {
                thread::sleep(self.pace);
                let bytes = match step {
                    Step::Bytes(n) => n.min(words.len() * 4),
                    _ => words.len() * 4,
                };
                let mut s = self.state.lock();
                for word in &mut words[..bytes / 4] {
                    *word = sample_to_word(s.next_sample);
                    s.next_sample = s.next_sample.wrapping_add(1);
                }
                Ok(bytes)
            }
        }
    }
}

/// Delay that returns immediately and records every millisecond request.
#[derive(Clone, Default)]
pub struct MockDelay {
    delays: Arc<Mutex<Vec<u32>>>,
}

impl MockDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delays(&self) -> Vec<u32> {
        self.delays.lock().clone()
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, _ns: u32) {}

    fn delay_ms(&mut self, ms: u32) {
        self.delays.lock().push(ms);
    }
}

/// Poll `cond` until it holds or two seconds pass.
pub fn wait_for(cond: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    cond()
}
