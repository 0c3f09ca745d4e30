//! Option domains exposed to callers and the values decoded from replies

/// Equalizer presets available on the JQ8400
#[repr(u8)]
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Equalizer {
    /// Normal (flat) equalizer setting
    Normal = 0x0,
    /// Pop music equalizer preset
    Pop = 0x1,
    /// Rock music equalizer preset
    Rock = 0x2,
    /// Jazz music equalizer preset
    Jazz = 0x3,
    /// Classical music equalizer preset
    Classic = 0x4,
}

impl TryFrom<u8> for Equalizer {
    type Error = ();
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x0 => Ok(Equalizer::Normal),
            0x1 => Ok(Equalizer::Pop),
            0x2 => Ok(Equalizer::Rock),
            0x3 => Ok(Equalizer::Jazz),
            0x4 => Ok(Equalizer::Classic),
            _ => Err(()),
        }
    }
}

/// Playback repetition policies
///
/// Only `All`, `Folder`, `One` and `OneStop` behave predictably on real
/// modules. `Random` has been seen to play one track and lock out next/previous.
#[repr(u8)]
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoopMode {
    /// Loop through all files
    All = 0,
    /// Repeat one file
    One = 1,
    /// Play one file and stop
    OneStop = 2,
    /// Random order
    Random = 3,
    /// Loop through the files of the current folder (SD card only)
    Folder = 4,
    /// Random order, reshuffled
    RandomRandom = 5,
    /// Play the current folder once and stop
    FolderStop = 6,
    /// Play all files once and stop
    AllStop = 7,
}

impl TryFrom<u8> for LoopMode {
    type Error = ();
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(LoopMode::All),
            1 => Ok(LoopMode::One),
            2 => Ok(LoopMode::OneStop),
            3 => Ok(LoopMode::Random),
            4 => Ok(LoopMode::Folder),
            5 => Ok(LoopMode::RandomRandom),
            6 => Ok(LoopMode::FolderStop),
            7 => Ok(LoopMode::AllStop),
            _ => Err(()),
        }
    }
}

/// Media the module can play from. The datasheet calls these "drives".
#[repr(u8)]
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Source {
    /// Connected USB device
    Usb = 0,
    /// SD card
    SdCard = 1,
    /// On-board flash memory
    Flash = 2,
}

impl Source {
    /// Bit representing this source in a [`SourceSet`]
    pub const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl TryFrom<u8> for Source {
    type Error = ();
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Source::Usb),
            1 => Ok(Source::SdCard),
            2 => Ok(Source::Flash),
            _ => Err(()),
        }
    }
}

/// Playback status reported by the module
#[repr(u8)]
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlayStatus {
    Stopped = 0,
    Playing = 1,
    Paused = 2,
}

impl TryFrom<u8> for PlayStatus {
    type Error = ();
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PlayStatus::Stopped),
            1 => Ok(PlayStatus::Playing),
            2 => Ok(PlayStatus::Paused),
            _ => Err(()),
        }
    }
}

/// Sources reported as selectable, bit `i` standing for source `i`
///
/// Decoded fresh from every availability query.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SourceSet(u8);

impl SourceSet {
    /// Wrap a raw availability byte; every bit is kept
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Raw availability byte
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether bit `index` (0-7) is set; indices past 7 are never set
    pub const fn has_bit(self, index: u8) -> bool {
        index < 8 && self.0 & (1 << index) != 0
    }

    /// Whether `source` is marked available
    pub const fn contains(self, source: Source) -> bool {
        self.0 & source.bit() != 0
    }

    /// No source is available
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Known sources present in the set
    pub fn iter(self) -> impl Iterator<Item = Source> {
        [Source::Usb, Source::SdCard, Source::Flash]
            .into_iter()
            .filter(move |source| self.contains(*source))
    }
}

/// Settings the driver last wrote to the module
///
/// The JQ8400 has no dependable getters for volume, equalizer or loop mode,
/// so these are assumptions: initialised to the power-on defaults, updated
/// on every successful set command, reset with the module, and never checked
/// against the hardware.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LastKnownSettings {
    pub volume: u8,
    pub equalizer: Equalizer,
    pub loop_mode: LoopMode,
}

impl LastKnownSettings {
    /// Power-on defaults of the module
    pub const POWER_ON: Self = Self {
        volume: 20,
        equalizer: Equalizer::Normal,
        loop_mode: LoopMode::OneStop,
    };
}

impl Default for LastKnownSettings {
    fn default() -> Self {
        Self::POWER_ON
    }
}
