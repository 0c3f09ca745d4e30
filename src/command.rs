//! Command table and frame encoder
//!
//! Every command the JQ8400 understands is described once in [`COMMAND_TABLE`]:
//! its identifier byte, the arguments it takes, the reply it produces and how
//! far the identifier can be trusted. The encoder and the response decoder both
//! work from this table.
//!
//! Frames sent to the module have no length field and no checksum:
//!
//! ```text
//! +------+---------+--------+--------+
//! | 0xAA | command | (arg1) | (arg2) |
//! +------+---------+--------+--------+
//! ```

/// Start marker opening every frame sent to the module
pub const START_BYTE: u8 = 0xAA;

/// Longest frame on the wire: start marker, command and two arguments
pub const MAX_FRAME_LEN: usize = 4;

/// Commands understood by the JQ8400
///
/// Variants are declared in the same order as [`COMMAND_TABLE`].
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Query playback status (stopped, playing, paused)
    Status,
    /// Start or resume playback
    Play,
    /// Pause playback
    Pause,
    /// Put the module to sleep
    Sleep,
    /// Soft reset of the module
    Reset,
    /// Play the previous file
    Previous,
    /// Play the next file
    Next,
    /// Play a file by its FAT index
    PlayByIndex,
    /// Play a numbered file inside a numbered folder
    PlayFileInFolder,
    /// Bitmask of selectable sources
    AvailableSources,
    /// Currently selected source
    CurrentSource,
    /// Select the source to play from
    SetSource,
    /// Number of files on the current source
    CountFiles,
    /// FAT index of the current file
    CurrentFileIndex,
    /// Play the previous folder
    PreviousFolder,
    /// Play the next folder
    NextFolder,
    /// Stop playback
    Stop,
    /// FAT index of the first file in a folder
    FirstFileInFolderIndex,
    /// Number of files in a folder
    CountInFolder,
    /// Set the volume, 0-30
    SetVolume,
    /// Volume up by one step
    VolumeUp,
    /// Volume down by one step
    VolumeDown,
    /// Insert a file by index into the current playback
    InsertByIndex,
    /// Select the loop mode
    SetLoopMode,
    /// Select the equalizer preset
    SetEqualizer,
    /// Short name of the current file
    CurrentFileName,
    /// Move to a file by index without starting playback
    SeekByIndex,
    /// Length of the current file in seconds
    CurrentFileLength,
    /// Position inside the current file in seconds
    CurrentFilePosition,
    /// Volume getter, listed by the datasheet but never verified
    QueryVolume,
    /// Equalizer getter, listed by the datasheet but never verified
    QueryEqualizer,
    /// Loop mode getter, listed by the datasheet but never verified
    QueryLoopMode,
    /// Number of folders on the current source
    CountFolders,
}

impl Command {
    /// Table entry describing this command
    pub fn spec(self) -> &'static CommandSpec {
        &COMMAND_TABLE[self as usize]
    }

    /// Identifier byte sent on the wire
    pub fn id(self) -> u8 {
        self.spec().id
    }
}

/// Arguments a command takes
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ArgShape {
    /// No argument bytes
    None,
    /// One argument byte
    Byte,
    /// Two argument bytes, sent in call order
    Pair,
    /// 16-bit file index, one byte when it fits, otherwise high then low
    Index,
}

/// Value domain of a single-byte reply
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ByteDomain {
    /// Playback status, 0-2
    Status,
    /// Media source, 0-2
    Source,
    /// Volume, 0-30
    Volume,
    /// Equalizer preset, 0-4
    Equalizer,
    /// Loop mode, 0-7
    LoopMode,
}

impl ByteDomain {
    /// Largest valid value
    pub const fn max(self) -> u8 {
        match self {
            ByteDomain::Status => 2,
            ByteDomain::Source => 2,
            ByteDomain::Volume => 30,
            ByteDomain::Equalizer => 4,
            ByteDomain::LoopMode => 7,
        }
    }

    /// Whether `value` is one the reply can carry
    pub const fn contains(self, value: u8) -> bool {
        value <= self.max()
    }
}

/// Reply a command produces
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResponseShape {
    /// Fire-and-forget, the module sends nothing back
    None,
    /// One byte read bit by bit
    Flags,
    /// One byte checked against its domain
    Byte(ByteDomain),
    /// Two bytes, high byte first
    Word,
    /// Text ended by [`crate::TEXT_TERMINATOR`]
    Text,
}

impl ResponseShape {
    /// Number of bytes in a fixed-width reply
    pub const fn width(self) -> Option<usize> {
        match self {
            ResponseShape::Flags | ResponseShape::Byte(_) => Some(1),
            ResponseShape::Word => Some(2),
            ResponseShape::None | ResponseShape::Text => None,
        }
    }
}

/// How far a command identifier can be trusted
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Support {
    /// Documented and observed to work
    Implemented,
    /// Sent as documented, but the documentation is doubtful
    Uncertain,
    /// Known identifier without a working implementation; never sent
    Unimplemented,
}

/// One row of the command table
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandSpec {
    pub command: Command,
    pub id: u8,
    pub args: ArgShape,
    pub response: ResponseShape,
    pub support: Support,
}

impl CommandSpec {
    const fn new(
        command: Command,
        id: u8,
        args: ArgShape,
        response: ResponseShape,
        support: Support,
    ) -> Self {
        Self {
            command,
            id,
            args,
            response,
            support,
        }
    }
}

use ArgShape as A;
use ResponseShape as R;
use Support as S;

/// Every command, in declaration order of [`Command`]
///
/// Sleep and Reset share 0x04 and Stop may really be 0x04 as well; these are
/// gaps in the module documentation and are kept as documented.
#[rustfmt::skip]
pub static COMMAND_TABLE: [CommandSpec; 33] = [
    CommandSpec::new(Command::Status, 0x01, A::None, R::Byte(ByteDomain::Status), S::Implemented),
    CommandSpec::new(Command::Play, 0x02, A::None, R::None, S::Implemented),
    CommandSpec::new(Command::Pause, 0x03, A::None, R::None, S::Implemented),
    CommandSpec::new(Command::Sleep, 0x04, A::None, R::None, S::Uncertain),
    CommandSpec::new(Command::Reset, 0x04, A::None, R::None, S::Uncertain),
    CommandSpec::new(Command::Previous, 0x05, A::None, R::None, S::Implemented),
    CommandSpec::new(Command::Next, 0x06, A::None, R::None, S::Implemented),
    CommandSpec::new(Command::PlayByIndex, 0x07, A::Index, R::None, S::Implemented),
    CommandSpec::new(Command::PlayFileInFolder, 0x08, A::Pair, R::None, S::Uncertain),
    CommandSpec::new(Command::AvailableSources, 0x09, A::None, R::Flags, S::Implemented),
    CommandSpec::new(Command::CurrentSource, 0x0A, A::None, R::Byte(ByteDomain::Source), S::Implemented),
    CommandSpec::new(Command::SetSource, 0x0B, A::Byte, R::None, S::Implemented),
    CommandSpec::new(Command::CountFiles, 0x0C, A::None, R::Word, S::Uncertain),
    CommandSpec::new(Command::CurrentFileIndex, 0x0D, A::None, R::Word, S::Uncertain),
    CommandSpec::new(Command::PreviousFolder, 0x0E, A::None, R::None, S::Implemented),
    CommandSpec::new(Command::NextFolder, 0x0F, A::None, R::None, S::Implemented),
    CommandSpec::new(Command::Stop, 0x10, A::None, R::None, S::Uncertain),
    CommandSpec::new(Command::FirstFileInFolderIndex, 0x11, A::Byte, R::Word, S::Unimplemented),
    CommandSpec::new(Command::CountInFolder, 0x12, A::Byte, R::Word, S::Unimplemented),
    CommandSpec::new(Command::SetVolume, 0x13, A::Byte, R::None, S::Implemented),
    CommandSpec::new(Command::VolumeUp, 0x14, A::None, R::None, S::Implemented),
    CommandSpec::new(Command::VolumeDown, 0x15, A::None, R::None, S::Implemented),
    CommandSpec::new(Command::InsertByIndex, 0x16, A::Index, R::None, S::Unimplemented),
    CommandSpec::new(Command::SetLoopMode, 0x18, A::Byte, R::None, S::Implemented),
    CommandSpec::new(Command::SetEqualizer, 0x1A, A::Byte, R::None, S::Implemented),
    CommandSpec::new(Command::CurrentFileName, 0x1E, A::None, R::Text, S::Implemented),
    CommandSpec::new(Command::SeekByIndex, 0x1F, A::Index, R::None, S::Implemented),
    CommandSpec::new(Command::CurrentFileLength, 0x24, A::None, R::Word, S::Implemented),
    CommandSpec::new(Command::CurrentFilePosition, 0x50, A::None, R::Word, S::Uncertain),
    CommandSpec::new(Command::QueryVolume, 0x43, A::None, R::Byte(ByteDomain::Volume), S::Unimplemented),
    CommandSpec::new(Command::QueryEqualizer, 0x44, A::None, R::Byte(ByteDomain::Equalizer), S::Unimplemented),
    CommandSpec::new(Command::QueryLoopMode, 0x45, A::None, R::Byte(ByteDomain::LoopMode), S::Unimplemented),
    CommandSpec::new(Command::CountFolders, 0x53, A::None, R::Word, S::Implemented),
];

/// Argument values carried by a frame
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Arguments {
    None,
    Byte(u8),
    Pair(u8, u8),
    Index(u16),
}

impl Arguments {
    /// Shape these arguments would fill in the command table
    pub const fn shape(&self) -> ArgShape {
        match self {
            Arguments::None => ArgShape::None,
            Arguments::Byte(_) => ArgShape::Byte,
            Arguments::Pair(_, _) => ArgShape::Pair,
            Arguments::Index(_) => ArgShape::Index,
        }
    }
}

/// A command ready to be written to the module
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    command: Command,
    arguments: Arguments,
}

impl Frame {
    /// Pair a command with its arguments; checked against the table on send
    pub const fn new(command: Command, arguments: Arguments) -> Self {
        Self { command, arguments }
    }

    /// Frame for a command without arguments
    pub const fn bare(command: Command) -> Self {
        Self::new(command, Arguments::None)
    }

    /// Command carried by the frame
    pub const fn command(&self) -> Command {
        self.command
    }

    /// Arguments carried by the frame
    pub const fn arguments(&self) -> Arguments {
        self.arguments
    }

    /// Whether the arguments match what the command table expects
    pub fn is_well_formed(&self) -> bool {
        self.arguments.shape() == self.command.spec().args
    }

    /// Serialize into `buf`, returning the bytes to put on the wire
    pub fn encode<'b>(&self, buf: &'b mut [u8; MAX_FRAME_LEN]) -> &'b [u8] {
        buf[0] = START_BYTE;
        buf[1] = self.command.id();
        let len = match self.arguments {
            Arguments::None => 2,
            Arguments::Byte(arg) => {
                buf[2] = arg;
                3
            }
            Arguments::Pair(arg1, arg2) => {
                buf[2] = arg1;
                buf[3] = arg2;
                4
            }
            Arguments::Index(index) => match u8::try_from(index) {
                Ok(low) => {
                    buf[2] = low;
                    3
                }
                Err(_) => {
                    let [high, low] = index.to_be_bytes();
                    buf[2] = high;
                    buf[3] = low;
                    4
                }
            },
        };
        &buf[..len]
    }
}
