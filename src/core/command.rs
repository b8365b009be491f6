#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Outbound action codes understood by the actuator/command dispatcher.
///
/// Code 0 is the illegal command and codes 7..=10 are internal saccade codes;
/// neither is ever produced by the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum Command {
    #[default]
    NoOp = 0x1,
    Forward = 0x2,
    Left = 0x3,
    Right = 0x4,
    AdjustLeft = 0x5,
    AdjustRight = 0x6,
    Song = 0xB,
    Blink = 0xC,
}

impl Command {
    /// Every command the supervisor may emit, in code order.
    pub const ALL: [Command; 8] = [
        Command::NoOp,
        Command::Forward,
        Command::Left,
        Command::Right,
        Command::AdjustLeft,
        Command::AdjustRight,
        Command::Song,
        Command::Blink,
    ];

    /// Commands that move (or deliberately don't move) the robot. This is the
    /// default pool for exploratory random actions.
    pub const MOBILE: [Command; 6] = [
        Command::NoOp,
        Command::Forward,
        Command::Left,
        Command::Right,
        Command::AdjustLeft,
        Command::AdjustRight,
    ];

    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.code() == code)
    }

    pub fn name(self) -> &'static str {
        match self {
            Command::NoOp => "no operation",
            Command::Forward => "forward",
            Command::Left => "left",
            Command::Right => "right",
            Command::AdjustLeft => "adjust left",
            Command::AdjustRight => "adjust right",
            Command::Song => "song",
            Command::Blink => "blink",
        }
    }

    /// Two-letter mnemonic used in rule listings.
    pub fn short_name(self) -> &'static str {
        match self {
            Command::NoOp => "NO",
            Command::Forward => "FW",
            Command::Left => "LT",
            Command::Right => "RT",
            Command::AdjustLeft => "AL",
            Command::AdjustRight => "AR",
            Command::Song => "SO",
            Command::Blink => "BL",
        }
    }
}

impl core::fmt::Display for Command {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}
