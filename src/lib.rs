//! A no_std async library for interfacing with JQ8400 serial MP3 modules
//!
//! This crate drives JQ8400 (and compatible) audio playback modules over any
//! UART implementing the embedded-io-async traits. It handles frame encoding,
//! timeout-bounded reply acquisition, typed decoding of replies and the
//! repeated-read policy needed for the module's unreliable status query.
//!
//! ## Features
//!
//! - Async/await API for embedded systems
//! - Every documented JQ8400 command described once in [`COMMAND_TABLE`]
//! - Timeouts that never block past the deadline by more than one poll interval
//! - Confirmed status reads with an explicit confidence flag
//! - no_std compatible, no allocation
//!
//! ## Protocol
//!
//! Commands are `0xAA`, one command byte and up to two argument bytes, with
//! no length field and no checksum. Replies are one byte, two bytes (high
//! byte first) or a line of text ended by `\n`, depending on the command.
//! Many commands get no reply at all.
//!
//! ## Example
//!
//! ```rust,no_run
//! use embedded_hal_async::delay::DelayNs;
//! use embedded_io_async::{Read, ReadReady, Write};
//! use jq8400_async::{Config, Jq8400, Source, TimeSource};
//!
//! // Backed by a hardware timer on a real board
//! fn millis() -> u64 {
//!     0
//! }
//!
//! struct MyTimeSource;
//! impl TimeSource for MyTimeSource {
//!     type Instant = u64;
//!     fn now(&self) -> Self::Instant {
//!         millis()
//!     }
//!     fn is_elapsed(&self, since: Self::Instant, timeout_ms: u64) -> bool {
//!         millis().saturating_sub(since) >= timeout_ms
//!     }
//! }
//!
//! async fn example<U, D>(uart: &mut U, delay: D)
//! where
//!     U: Read + Write + ReadReady,
//!     D: DelayNs,
//! {
//!     let mut mp3 = Jq8400::try_new(
//!         uart,              // UART port (9600 baud, 8N1)
//!         Config::default(), // 1000 ms reply timeout
//!         MyTimeSource,
//!         delay,
//!     )
//!     .await
//!     .expect("Failed to initialize JQ8400");
//!
//!     mp3.set_source(Source::SdCard).await.expect("Failed to select SD card");
//!     mp3.play_by_index(1).await.expect("Failed to play file");
//! }
//! ```
//!
//! Some replies from the module are known to be unreliable, most notably the
//! playback status. [`Jq8400::status`] repeats the query according to the
//! configured [`StatusPolicy`]. Volume, equalizer and loop mode cannot be read
//! back at all; the driver only remembers what it last wrote
//! ([`LastKnownSettings`]).
//!
//! This crate optionally supports logging via the defmt framework.
//! Enable the "defmt" feature to activate logging.

#![cfg_attr(not(test), no_std)]

mod command;
mod response;
mod status;
mod types;

use embedded_hal_async::delay::DelayNs;
use embedded_io_async::{Read, ReadReady, Write};

#[cfg(feature = "defmt")]
use defmt::{debug, info, warn};

pub use command::{
    ArgShape, Arguments, ByteDomain, COMMAND_TABLE, Command, CommandSpec, Frame, MAX_FRAME_LEN,
    ResponseShape, START_BYTE, Support,
};
pub use response::{DecodeError, DecodedValue, TEXT_END_MARKER, TEXT_TERMINATOR, Text, decode_word};
pub use status::{Confidence, Consensus, StatusPolicy, StatusReading};
pub use types::{Equalizer, LastKnownSettings, LoopMode, PlayStatus, Source, SourceSet};

/// Reply timeout used unless overridden
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// Sleep between polls of the transport while waiting for a reply. The line
/// counts as quiet once nothing has arrived for this long.
pub const POLL_INTERVAL_MS: u32 = 10;

/// Time allowed for discarding stale input before a command is sent
const DRAIN_BUDGET_MS: u64 = 50;

/// Settle time after a soft reset unless overridden
const DEFAULT_RESET_DURATION_MS: u32 = 500;

/// Settle time after switching source while the module mounts the media
const SOURCE_SWITCH_MS: u32 = 200;

/// Highest volume step
pub const MAX_VOLUME: u8 = 30;

/// Highest folder number addressable by name
const MAX_FOLDER: u8 = 99;

/// Bytes pulled from the transport per read
const RX_CHUNK: usize = 16;

/// Minimal time provider trait for timeout tracking. Implement this for your platform.
pub trait TimeSource {
    /// Monotonic time point type
    type Instant: Copy + Clone + PartialEq + PartialOrd;

    /// Get the current time
    fn now(&self) -> Self::Instant;

    /// Check if a timeout has occurred
    fn is_elapsed(&self, since: Self::Instant, timeout_ms: u64) -> bool;
}

/// Errors that can occur when operating the JQ8400
///
/// A truncated text reply and a low-confidence status are not errors; they
/// are reported through [`Text::is_truncated`] and [`Confidence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<SerialError> {
    /// Serial port communication error
    SerialPort(SerialError),
    /// Nothing arrived before the deadline
    NoResponse,
    /// A fixed-width reply stopped short at the deadline
    Incomplete {
        /// Bytes the reply should have
        expected: usize,
        /// Bytes that arrived
        received: usize,
    },
    /// Reply byte outside the values the command can return
    OutOfDomain {
        /// Command that produced the reply
        command: Command,
        /// Byte received
        value: u8,
    },
    /// Command parameter was invalid
    BadParameter,
    /// Command is known but has no working implementation on the module
    Unsupported(Command),
    /// Arguments or expected reply do not match the command table
    WrongShape(Command),
}

/// Driver settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Reply timeout for queries in milliseconds
    pub timeout_ms: u64,
    /// Wait after a soft reset before the module takes commands again
    pub reset_duration_ms: u32,
    /// How status reads are confirmed
    pub status: StatusPolicy,
}

impl Config {
    /// Settings matching the module's documented timing: 1000 ms reply
    /// timeout, 500 ms reset settle time, status accepted on first read
    pub const fn new() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            reset_duration_ms: DEFAULT_RESET_DURATION_MS,
            status: StatusPolicy::new(),
        }
    }

    /// Reply timeout used by the high-level queries
    pub const fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Wait after a soft reset, for modules that need longer to boot
    pub const fn with_reset_duration_ms(mut self, reset_duration_ms: u32) -> Self {
        self.reset_duration_ms = reset_duration_ms;
        self
    }

    /// Agreement rule applied by [`Jq8400::status`]
    pub const fn with_status_policy(mut self, status: StatusPolicy) -> Self {
        self.status = status;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// How a reply ends
#[derive(Clone, Copy)]
enum Until {
    /// The buffer is full
    Filled,
    /// This byte arrives; the buffer keeps one slot for the end marker
    Terminator(u8),
}

/// Bytes collected by [`Jq8400::acquire`]
struct Acquired {
    len: usize,
    /// Filled completely, or terminator seen with nothing dropped
    complete: bool,
}

/// Main driver for interfacing with JQ8400 modules
///
/// The driver borrows the transport exclusively. Every operation takes
/// `&mut self` and finishes its exchange (sent, and reply read or timed out)
/// before returning, so a command is never sent while a reply is pending.
pub struct Jq8400<'a, S, T, D>
where
    S: Read + Write + ReadReady,
    T: TimeSource,
    D: DelayNs,
{
    port: &'a mut S,
    config: Config,
    time_source: T,
    delay: D,
    settings: LastKnownSettings,
}

impl<'a, S, T, D> Jq8400<'a, S, T, D>
where
    S: Read + Write + ReadReady,
    T: TimeSource,
    D: DelayNs,
{
    /// Create a driver without touching the module
    ///
    /// Last-known settings start at the module's power-on defaults.
    pub fn new(port: &'a mut S, config: Config, time_source: T, delay: D) -> Self {
        Self {
            port,
            config,
            time_source,
            delay,
            settings: LastKnownSettings::POWER_ON,
        }
    }

    /// Create a driver and bring the module to a known state
    ///
    /// The serial port must be configured with 9600 baud, 8N1 format.
    ///
    /// The initialization sequence:
    /// 1. Clears any pending data in the receive buffer
    /// 2. Sends a soft reset
    /// 3. Waits `config.reset_duration_ms` and discards whatever the module
    ///    printed while restarting
    ///
    /// # Arguments
    /// * `port` - Serial port connected to the JQ8400 module
    /// * `config` - Timeouts and status policy
    /// * `time_source` - Source of time for timeout tracking
    /// * `delay` - Delay provider for polling and settle times
    pub async fn try_new(
        port: &'a mut S,
        config: Config,
        time_source: T,
        delay: D,
    ) -> Result<Self, Error<S::Error>> {
        let mut player = Self::new(port, config, time_source, delay);

        #[cfg(feature = "defmt")]
        info!("Clearing initial receive buffer");
        player.clear_receive_buffer().await?;

        player.reset().await?;

        #[cfg(feature = "defmt")]
        info!("JQ8400 initialization complete");

        Ok(player)
    }

    /// Give the transport back
    pub fn release(self) -> &'a mut S {
        self.port
    }

    /// Settings currently in effect
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Default reply timeout for the high-level queries
    pub fn timeout_ms(&self) -> u64 {
        self.config.timeout_ms
    }

    /// Change the default reply timeout for the high-level queries
    pub fn set_timeout_ms(&mut self, timeout_ms: u64) {
        self.config.timeout_ms = timeout_ms;
    }

    /// Change how [`Self::status`] confirms its reads
    pub fn set_status_policy(&mut self, policy: StatusPolicy) {
        self.config.status = policy;
    }

    /// Discard anything waiting in the receive buffer
    ///
    /// A late reply to an earlier query must not be taken as the reply to the
    /// next one. Returns once the line has been quiet for one poll interval,
    /// or after a short budget if it keeps chattering.
    async fn clear_receive_buffer(&mut self) -> Result<usize, Error<S::Error>> {
        let mut buffer = [0u8; RX_CHUNK];
        let start = self.time_source.now();
        let mut cleared = 0;

        loop {
            let n = if self.port.read_ready().map_err(Error::SerialPort)? {
                self.port
                    .read(&mut buffer)
                    .await
                    .map_err(Error::SerialPort)?
            } else {
                0
            };

            if n > 0 {
                cleared += n;

                #[cfg(feature = "defmt")]
                debug!("Cleared {} bytes: {:?}", n, &buffer[..n]);
            } else {
                self.delay.delay_ms(POLL_INTERVAL_MS).await;
                if !self.port.read_ready().map_err(Error::SerialPort)? {
                    break;
                }
            }

            if self.time_source.is_elapsed(start, DRAIN_BUDGET_MS) {
                #[cfg(feature = "defmt")]
                warn!("Receive buffer still busy after drain budget");
                break;
            }
        }

        Ok(cleared)
    }

    /// Validate and write one frame
    async fn transmit(&mut self, frame: &Frame) -> Result<(), Error<S::Error>> {
        let command = frame.command();
        let spec = command.spec();

        if spec.support == Support::Unimplemented {
            #[cfg(feature = "defmt")]
            warn!("{} is not implemented on the module", command);
            return Err(Error::Unsupported(command));
        }
        if !frame.is_well_formed() {
            return Err(Error::WrongShape(command));
        }

        #[cfg(feature = "defmt")]
        if spec.support == Support::Uncertain {
            warn!("{} ({:#x}) is poorly documented", command, spec.id);
        }

        self.clear_receive_buffer().await?;

        let mut out_buffer = [0u8; MAX_FRAME_LEN];
        let bytes = frame.encode(&mut out_buffer);

        #[cfg(feature = "defmt")]
        info!("tx {}", bytes);

        self.port.write_all(bytes).await.map_err(Error::SerialPort)?;
        self.port.flush().await.map_err(Error::SerialPort)
    }

    /// Collect a reply into `buf` until it ends or `timeout_ms` after
    /// `timeout_start`
    ///
    /// Only reads when the transport reports data ready, sleeping
    /// [`POLL_INTERVAL_MS`] otherwise, so the deadline is overrun by at most
    /// one poll interval.
    ///
    /// With [`Until::Filled`] exactly `buf.len()` bytes are read and a short
    /// reply is an error. With [`Until::Terminator`] at most `buf.len() - 1`
    /// data bytes are kept and [`TEXT_END_MARKER`] is written after them; a
    /// missing terminator is reported as incomplete, not as an error, as long
    /// as something arrived. Once the buffer is full, the rest of the line is
    /// read and dropped until the terminator or a quiet poll interval, so no
    /// tail is left for the next exchange. `buf` must not be empty.
    async fn acquire(
        &mut self,
        buf: &mut [u8],
        until: Until,
        timeout_start: T::Instant,
        timeout_ms: u64,
    ) -> Result<Acquired, Error<S::Error>> {
        let limit = match until {
            Until::Filled => buf.len(),
            Until::Terminator(_) => buf.len() - 1,
        };
        let mut len = 0;
        let mut received = 0;
        let mut dropped = false;
        let mut receive_buffer = [0u8; RX_CHUNK];

        while !self.time_source.is_elapsed(timeout_start, timeout_ms) {
            if !self.port.read_ready().map_err(Error::SerialPort)? {
                self.delay.delay_ms(POLL_INTERVAL_MS).await;

                // A full text buffer only waits for the line to go quiet
                let full = matches!(until, Until::Terminator(_)) && received > 0 && len == limit;
                if full && !self.port.read_ready().map_err(Error::SerialPort)? {
                    break;
                }
                continue;
            }

            // Fixed-width replies never take more than they need
            let wanted = match until {
                Until::Filled => (limit - len).min(RX_CHUNK),
                Until::Terminator(_) => RX_CHUNK,
            };
            let bytes_read = self
                .port
                .read(&mut receive_buffer[..wanted])
                .await
                .map_err(Error::SerialPort)?;
            if bytes_read == 0 {
                self.delay.delay_ms(POLL_INTERVAL_MS).await;
                continue;
            }

            #[cfg(feature = "defmt")]
            debug!(
                "Read {} bytes: {:?}",
                bytes_read,
                &receive_buffer[..bytes_read]
            );

            for &byte in &receive_buffer[..bytes_read] {
                received += 1;
                match until {
                    Until::Terminator(terminator) if byte == terminator => {
                        buf[len] = TEXT_END_MARKER;
                        return Ok(Acquired {
                            len,
                            complete: !dropped,
                        });
                    }
                    Until::Terminator(_) if len == limit => {
                        #[cfg(feature = "defmt")]
                        if !dropped {
                            info!("Text reply truncated at {} bytes", len);
                        }
                        dropped = true;
                    }
                    _ => {
                        buf[len] = byte;
                        len += 1;

                        if matches!(until, Until::Filled) && len == limit {
                            return Ok(Acquired {
                                len,
                                complete: true,
                            });
                        }
                    }
                }
            }
        }

        #[cfg(feature = "defmt")]
        info!("Reply ended without terminator after {} bytes", received);

        if received == 0 {
            return Err(Error::NoResponse);
        }
        match until {
            Until::Filled => Err(Error::Incomplete {
                expected: limit,
                received: len,
            }),
            Until::Terminator(_) => {
                buf[len] = TEXT_END_MARKER;
                Ok(Acquired {
                    len,
                    complete: false,
                })
            }
        }
    }

    /// Send a command that gets no reply
    ///
    /// Returns as soon as the frame is written; the module acknowledges
    /// nothing.
    pub async fn send(&mut self, frame: Frame) -> Result<(), Error<S::Error>> {
        if frame.command().spec().response != ResponseShape::None {
            return Err(Error::WrongShape(frame.command()));
        }
        self.transmit(&frame).await
    }

    /// Send a command and decode its one- or two-byte reply
    ///
    /// # Arguments
    /// * `frame` - Command to send
    /// * `timeout_ms` - How long the whole exchange may take
    ///
    /// # Errors
    /// `NoResponse` if nothing arrives, `Incomplete` if the reply is cut
    /// short, `OutOfDomain` if the byte is not a value the command returns.
    pub async fn query(
        &mut self,
        frame: Frame,
        timeout_ms: u64,
    ) -> Result<DecodedValue, Error<S::Error>> {
        let command = frame.command();
        let shape = command.spec().response;
        let width = shape.width().ok_or(Error::WrongShape(command))?;

        let timeout_start = self.time_source.now();
        self.transmit(&frame).await?;

        let mut raw = [0u8; 2];
        self.acquire(&mut raw[..width], Until::Filled, timeout_start, timeout_ms)
            .await?;

        DecodedValue::decode(shape, &raw[..width]).map_err(|e| match e {
            DecodeError::OutOfDomain(value) => {
                #[cfg(feature = "defmt")]
                warn!("{} replied with out of range value {}", command, value);
                Error::OutOfDomain { command, value }
            }
            DecodeError::Shape => Error::WrongShape(command),
        })
    }

    /// Send a command and read its text reply into `buf`
    ///
    /// Keeps at most `buf.len() - 1` bytes and writes [`TEXT_END_MARKER`]
    /// after them. Never writes past `buf`. A reply longer than that is
    /// still read to its end before returning.
    ///
    /// # Errors
    /// `BadParameter` for an empty buffer, `NoResponse` if nothing arrives.
    pub async fn query_text<'b>(
        &mut self,
        frame: Frame,
        buf: &'b mut [u8],
        timeout_ms: u64,
    ) -> Result<Text<'b>, Error<S::Error>> {
        let command = frame.command();
        if command.spec().response != ResponseShape::Text {
            return Err(Error::WrongShape(command));
        }
        if buf.is_empty() {
            return Err(Error::BadParameter);
        }

        let timeout_start = self.time_source.now();
        self.transmit(&frame).await?;

        let until = Until::Terminator(TEXT_TERMINATOR);
        let acquired = self.acquire(buf, until, timeout_start, timeout_ms).await?;

        let filled: &'b [u8] = buf;
        Ok(Text::new(&filled[..acquired.len], !acquired.complete))
    }

    async fn command(
        &mut self,
        command: Command,
        arguments: Arguments,
    ) -> Result<(), Error<S::Error>> {
        self.send(Frame::new(command, arguments)).await
    }

    async fn query_byte(&mut self, command: Command) -> Result<u8, Error<S::Error>> {
        self.query(Frame::bare(command), self.config.timeout_ms)
            .await?
            .as_byte()
            .ok_or(Error::WrongShape(command))
    }

    async fn query_word(&mut self, command: Command) -> Result<u16, Error<S::Error>> {
        self.query(Frame::bare(command), self.config.timeout_ms)
            .await?
            .as_word()
            .ok_or(Error::WrongShape(command))
    }

    /// Start playing the current file; resumes if paused
    pub async fn play(&mut self) -> Result<(), Error<S::Error>> {
        self.command(Command::Play, Arguments::None).await
    }

    /// Pause the current file; `play` resumes it
    pub async fn pause(&mut self) -> Result<(), Error<S::Error>> {
        self.command(Command::Pause, Arguments::None).await
    }

    /// Stop playback
    ///
    /// The identifier for stop is uncertain in the module documentation.
    pub async fn stop(&mut self) -> Result<(), Error<S::Error>> {
        self.command(Command::Stop, Arguments::None).await
    }

    /// Play the next file
    pub async fn next(&mut self) -> Result<(), Error<S::Error>> {
        self.command(Command::Next, Arguments::None).await
    }

    /// Play the previous file
    pub async fn previous(&mut self) -> Result<(), Error<S::Error>> {
        self.command(Command::Previous, Arguments::None).await
    }

    /// Play the first file of the next folder
    pub async fn next_folder(&mut self) -> Result<(), Error<S::Error>> {
        self.command(Command::NextFolder, Arguments::None).await
    }

    /// Play the first file of the previous folder
    pub async fn previous_folder(&mut self) -> Result<(), Error<S::Error>> {
        self.command(Command::PreviousFolder, Arguments::None).await
    }

    /// Play a file by its FAT table index
    ///
    /// The index is the order the files were written to the media, not the
    /// order of their names. Sort the FAT table (e.g. with `fatsort`) if the
    /// two need to agree.
    pub async fn play_by_index(&mut self, index: u16) -> Result<(), Error<S::Error>> {
        self.command(Command::PlayByIndex, Arguments::Index(index))
            .await
    }

    /// Play `/FF/NNN.mp3` where folders are named `00`-`99` and files
    /// `000`-`999`, zero padded
    ///
    /// # Errors
    /// Returns `Error::BadParameter` if the folder number is greater than 99.
    pub async fn play_file_in_folder(
        &mut self,
        folder: u8,
        file: u8,
    ) -> Result<(), Error<S::Error>> {
        if folder > MAX_FOLDER {
            return Err(Error::BadParameter);
        }
        self.command(Command::PlayFileInFolder, Arguments::Pair(folder, file))
            .await
    }

    /// Move to a file by FAT table index without starting it
    ///
    /// Any playing file stops. The output stays powered until play or stop.
    pub async fn seek_by_index(&mut self, index: u16) -> Result<(), Error<S::Error>> {
        self.command(Command::SeekByIndex, Arguments::Index(index))
            .await
    }

    /// Volume up by one step
    pub async fn volume_up(&mut self) -> Result<(), Error<S::Error>> {
        self.command(Command::VolumeUp, Arguments::None).await?;
        if self.settings.volume < MAX_VOLUME {
            self.settings.volume += 1;
        }
        Ok(())
    }

    /// Volume down by one step
    pub async fn volume_down(&mut self) -> Result<(), Error<S::Error>> {
        self.command(Command::VolumeDown, Arguments::None).await?;
        self.settings.volume = self.settings.volume.saturating_sub(1);
        Ok(())
    }

    /// Set the volume level (0-30)
    ///
    /// # Errors
    /// Returns `Error::BadParameter` if the volume is greater than 30.
    pub async fn set_volume(&mut self, volume: u8) -> Result<(), Error<S::Error>> {
        if volume > MAX_VOLUME {
            return Err(Error::BadParameter);
        }
        self.command(Command::SetVolume, Arguments::Byte(volume))
            .await?;
        self.settings.volume = volume;
        Ok(())
    }

    /// Select an equalizer preset and remember it in the last-known settings
    pub async fn set_equalizer(&mut self, equalizer: Equalizer) -> Result<(), Error<S::Error>> {
        self.command(Command::SetEqualizer, Arguments::Byte(equalizer as u8))
            .await?;
        self.settings.equalizer = equalizer;
        Ok(())
    }

    /// Select a loop mode and remember it in the last-known settings
    pub async fn set_loop_mode(&mut self, loop_mode: LoopMode) -> Result<(), Error<S::Error>> {
        self.command(Command::SetLoopMode, Arguments::Byte(loop_mode as u8))
            .await?;
        self.settings.loop_mode = loop_mode;
        Ok(())
    }

    /// Select the media to play from
    ///
    /// Waits afterwards, whether or not the write succeeded, so the module
    /// can mount the new source before the next command.
    pub async fn set_source(&mut self, source: Source) -> Result<(), Error<S::Error>> {
        let cmd_result = self
            .command(Command::SetSource, Arguments::Byte(source as u8))
            .await;
        self.delay.delay_ms(SOURCE_SWITCH_MS).await;
        cmd_result
    }

    /// Put the module to sleep. Playing stops; `play` starts the current
    /// file again from the beginning.
    pub async fn sleep(&mut self) -> Result<(), Error<S::Error>> {
        self.command(Command::Sleep, Arguments::None).await
    }

    /// Soft reset the module
    ///
    /// Waits `reset_duration_ms`, drops whatever the module printed while
    /// restarting and forgets the last-known settings. A module that stays
    /// confused may need a real power cycle.
    pub async fn reset(&mut self) -> Result<(), Error<S::Error>> {
        #[cfg(feature = "defmt")]
        info!("Sending reset command");

        self.command(Command::Reset, Arguments::None).await?;

        #[cfg(feature = "defmt")]
        info!(
            "Waiting {}ms for device reset",
            self.config.reset_duration_ms
        );
        self.delay.delay_ms(self.config.reset_duration_ms).await;

        self.clear_receive_buffer().await?;
        self.settings = LastKnownSettings::POWER_ON;
        Ok(())
    }

    /// Number of files on the current source
    pub async fn count_files(&mut self) -> Result<u16, Error<S::Error>> {
        self.query_word(Command::CountFiles).await
    }

    /// Number of folders on the current source
    pub async fn count_folders(&mut self) -> Result<u16, Error<S::Error>> {
        self.query_word(Command::CountFolders).await
    }

    /// FAT table index of the playing, paused, or next/last file
    ///
    /// Usable with [`Self::play_by_index`].
    pub async fn current_file_index(&mut self) -> Result<u16, Error<S::Error>> {
        self.query_word(Command::CurrentFileIndex).await
    }

    /// Seconds into the playing or paused file
    pub async fn current_file_position(&mut self) -> Result<u16, Error<S::Error>> {
        self.query_word(Command::CurrentFilePosition).await
    }

    /// Length of the playing or paused file in seconds
    pub async fn current_file_length(&mut self) -> Result<u16, Error<S::Error>> {
        self.query_word(Command::CurrentFileLength).await
    }

    /// Short name of the current file, read into `buf`
    ///
    /// Only meaningful while playing or paused from the SD card; the module
    /// cannot say which source is active.
    pub async fn current_file_name<'b>(
        &mut self,
        buf: &'b mut [u8],
    ) -> Result<Text<'b>, Error<S::Error>> {
        let timeout_ms = self.config.timeout_ms;
        self.query_text(Frame::bare(Command::CurrentFileName), buf, timeout_ms)
            .await
    }

    /// Sources that can currently be selected
    pub async fn available_sources(&mut self) -> Result<SourceSet, Error<S::Error>> {
        let timeout_ms = self.config.timeout_ms;
        self.query(Frame::bare(Command::AvailableSources), timeout_ms)
            .await?
            .as_flags()
            .ok_or(Error::WrongShape(Command::AvailableSources))
    }

    /// Whether `source` is among the [`Self::available_sources`]
    pub async fn is_source_available(&mut self, source: Source) -> Result<bool, Error<S::Error>> {
        Ok(self.available_sources().await?.contains(source))
    }

    /// Source the module reports as selected
    pub async fn current_source(&mut self) -> Result<Source, Error<S::Error>> {
        let value = self.query_byte(Command::CurrentSource).await?;
        Source::try_from(value).map_err(|_| Error::OutOfDomain {
            command: Command::CurrentSource,
            value,
        })
    }

    /// Playback status, confirmed according to the status policy
    ///
    /// CAUTION: the module's answer is unreliable. It sometimes reports
    /// paused while playing, and playing from on-board flash never reports
    /// stopped. A result that could not be confirmed within the query budget
    /// comes back with [`Confidence::Low`] instead of an error.
    pub async fn status(&mut self) -> Result<StatusReading, Error<S::Error>> {
        let mut consensus = Consensus::new(self.config.status);
        loop {
            let value = self.query_byte(Command::Status).await?;
            let status = PlayStatus::try_from(value).map_err(|_| Error::OutOfDomain {
                command: Command::Status,
                value,
            })?;

            if let Some(reading) = consensus.observe(status) {
                #[cfg(feature = "defmt")]
                info!(
                    "Status {} after {} queries ({})",
                    reading.status, reading.queries, reading.confidence
                );
                return Ok(reading);
            }
        }
    }

    /// Whether the confirmed status is playing
    pub async fn is_playing(&mut self) -> Result<bool, Error<S::Error>> {
        Ok(self.status().await?.status == PlayStatus::Playing)
    }

    /// Settings last written to the module, not read from it
    pub fn last_known(&self) -> &LastKnownSettings {
        &self.settings
    }

    /// Last volume written, 0-30; the module cannot be asked
    pub fn volume(&self) -> u8 {
        self.settings.volume
    }

    /// Last equalizer preset written; the module cannot be asked
    pub fn equalizer(&self) -> Equalizer {
        self.settings.equalizer
    }

    /// Last loop mode written; the module cannot be asked
    pub fn loop_mode(&self) -> LoopMode {
        self.settings.loop_mode
    }
}
