//! Simulated JQ8400 and a fake clock for driving the driver on the host
#![allow(dead_code)]

use std::cell::Cell;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal_async::delay::DelayNs;
use embedded_io_async::{ErrorType, Read, ReadReady, Write};
use jq8400_async::{Config, Jq8400, TimeSource};

pub use embassy_futures::block_on;

const NANOS_PER_MILLI: u64 = 1_000_000;

/// Shared simulated time, in nanoseconds
#[derive(Clone, Default)]
pub struct Clock(Rc<Cell<u64>>);

impl Clock {
    pub fn now_ms(&self) -> u64 {
        self.0.get() / NANOS_PER_MILLI
    }

    /// Let time pass outside any driver call
    pub fn advance_ms(&self, ms: u64) {
        self.advance_ns(ms * NANOS_PER_MILLI);
    }

    fn advance_ns(&self, ns: u64) {
        self.0.set(self.0.get() + ns);
    }
}

/// Millisecond time source reading the shared clock
pub struct FakeTime(pub Clock);

impl TimeSource for FakeTime {
    type Instant = u64;

    fn now(&self) -> Self::Instant {
        self.0.now_ms()
    }

    fn is_elapsed(&self, since: Self::Instant, timeout_ms: u64) -> bool {
        self.0.now_ms().saturating_sub(since) >= timeout_ms
    }
}

/// Delay that moves the shared clock forward instead of sleeping
pub struct FakeDelay(pub Clock);

impl DelayNs for FakeDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.0.advance_ns(u64::from(ns));
    }

    async fn delay_us(&mut self, us: u32) {
        self.0.advance_ns(u64::from(us) * 1_000);
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.0.advance_ns(u64::from(ms) * NANOS_PER_MILLI);
    }
}

/// A JQ8400 living on the other end of the serial line
///
/// Every `write` call is taken as one frame. Queries are answered after
/// `latency_ms` of simulated time.
pub struct SimulatedJq8400 {
    clock: Clock,
    /// Frames received, in order
    pub written: Vec<Vec<u8>>,
    rx: VecDeque<(u64, u8)>,
    pub latency_ms: u64,
    /// Spacing between reply bytes, as on a slow line
    pub byte_gap_ms: u64,
    /// Most bytes handed out per read
    pub max_read: usize,
    /// Never answer anything
    pub silent: bool,
    /// Raw replies used instead of the simulated ones, one per query
    pub overrides: VecDeque<Vec<u8>>,
    /// Status bytes returned before falling back to `status`
    pub status_script: VecDeque<u8>,
    pub status: u8,
    pub sources: u8,
    pub source: u8,
    pub files: u16,
    pub folders: u16,
    pub index: u16,
    pub length: u16,
    pub position: u16,
    pub name: Vec<u8>,
}

impl SimulatedJq8400 {
    pub fn new() -> Self {
        Self {
            clock: Clock::default(),
            written: Vec::new(),
            rx: VecDeque::new(),
            latency_ms: 5,
            byte_gap_ms: 0,
            max_read: usize::MAX,
            silent: false,
            overrides: VecDeque::new(),
            status_script: VecDeque::new(),
            status: 0,
            sources: 0b0000_0110,
            source: 1,
            files: 12,
            folders: 3,
            index: 1,
            length: 184,
            position: 0,
            name: b"003.MP3".to_vec(),
        }
    }

    pub fn clock(&self) -> Clock {
        self.clock.clone()
    }

    /// Bytes already waiting on the line, e.g. a late reply or boot noise
    pub fn inject(&mut self, bytes: &[u8]) {
        let now = self.clock.now_ms();
        self.rx.extend(bytes.iter().map(|&b| (now, b)));
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    fn reply(&mut self, bytes: Vec<u8>) {
        if self.silent {
            return;
        }
        let ready_at = self.clock.now_ms() + self.latency_ms;
        let gap = self.byte_gap_ms;
        self.rx.extend(
            bytes
                .into_iter()
                .enumerate()
                .map(|(i, b)| (ready_at + i as u64 * gap, b)),
        );
    }

    fn index_argument(args: &[u8]) -> u16 {
        match args {
            [low] => u16::from(*low),
            [high, low] => u16::from_be_bytes([*high, *low]),
            _ => 0,
        }
    }

    fn handle(&mut self, frame: &[u8]) {
        assert_eq!(frame[0], 0xAA, "frame without start marker: {:02X?}", frame);
        let args = &frame[2..];
        let simulated = match frame[1] {
            0x01 => Some(vec![self.status_script.pop_front().unwrap_or(self.status)]),
            0x02 => {
                self.status = 1;
                None
            }
            0x03 => {
                self.status = 2;
                None
            }
            0x04 | 0x10 => {
                self.status = 0;
                None
            }
            0x07 => {
                self.index = Self::index_argument(args);
                self.status = 1;
                None
            }
            0x1F => {
                self.index = Self::index_argument(args);
                self.status = 0;
                None
            }
            0x09 => Some(vec![self.sources]),
            0x0A => Some(vec![self.source]),
            0x0B => {
                self.source = args[0];
                None
            }
            0x0C => Some(self.files.to_be_bytes().to_vec()),
            0x0D => Some(self.index.to_be_bytes().to_vec()),
            0x24 => Some(self.length.to_be_bytes().to_vec()),
            0x50 => Some(self.position.to_be_bytes().to_vec()),
            0x53 => Some(self.folders.to_be_bytes().to_vec()),
            0x1E => {
                let mut line = self.name.clone();
                line.push(b'\n');
                Some(line)
            }
            _ => None,
        };

        if let Some(bytes) = simulated {
            let bytes = self.overrides.pop_front().unwrap_or(bytes);
            self.reply(bytes);
        }
    }
}

impl ErrorType for SimulatedJq8400 {
    type Error = Infallible;
}

impl Write for SimulatedJq8400 {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.written.push(buf.to_vec());
        self.handle(buf);
        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl ReadReady for SimulatedJq8400 {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        let now = self.clock.now_ms();
        Ok(matches!(self.rx.front(), Some(&(ready_at, _)) if ready_at <= now))
    }
}

impl Read for SimulatedJq8400 {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let now = self.clock.now_ms();
        let limit = buf.len().min(self.max_read);
        let mut n = 0;
        while n < limit {
            match self.rx.front() {
                Some(&(ready_at, byte)) if ready_at <= now => {
                    buf[n] = byte;
                    self.rx.pop_front();
                    n += 1;
                }
                _ => break,
            }
        }
        Ok(n)
    }
}

pub type Player<'a> = Jq8400<'a, SimulatedJq8400, FakeTime, FakeDelay>;

pub fn player(port: &mut SimulatedJq8400, config: Config) -> Player<'_> {
    let clock = port.clock();
    Jq8400::new(port, config, FakeTime(clock.clone()), FakeDelay(clock))
}
