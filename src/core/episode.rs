#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::command::Command;
use crate::error::ParseError;
use crate::sequence::SequenceId;

/// Fixed-width binary feature vector.
///
/// Position 0 is the most significant bit of `summary()`, so the summary of
/// `"0101"` is 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SensorVector {
    bits: u64,
    width: u8,
}

impl SensorVector {
    pub fn from_bits(bits: &[bool]) -> Self {
        debug_assert!(bits.len() <= 64);
        let packed = bits
            .iter()
            .fold(0u64, |acc, &b| (acc << 1) | u64::from(b));
        Self {
            bits: packed,
            width: bits.len() as u8,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width as usize
    }

    #[inline]
    pub fn get(&self, position: usize) -> bool {
        if position >= self.width() {
            return false;
        }
        let shift = self.width() - 1 - position;
        (self.bits >> shift) & 1 == 1
    }

    /// All sensors folded into one integer (first sensor most significant).
    #[inline]
    pub fn summary(&self) -> u64 {
        self.bits
    }
}

impl core::fmt::Display for SensorVector {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for i in 0..self.width() {
            f.write_str(if self.get(i) { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// One observed state at level 0.
///
/// Everything but the command is fixed at creation. The command starts as
/// no-op and is assigned exactly once by the command selector.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Episode {
    now: u64,
    sensors: SensorVector,
    goal: bool,
    cmd: Command,
    cmd_assigned: bool,
}

impl Episode {
    pub fn new(now: u64, sensors: SensorVector, goal_sensor: usize) -> Self {
        Self {
            now,
            goal: sensors.get(goal_sensor),
            sensors,
            cmd: Command::NoOp,
            cmd_assigned: false,
        }
    }

    /// Build an episode whose command is already known (replayed logs, tests).
    pub fn with_command(mut self, cmd: Command) -> Self {
        self.cmd = cmd;
        self.cmd_assigned = true;
        self
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn sensors(&self) -> SensorVector {
        self.sensors
    }

    pub fn is_goal(&self) -> bool {
        self.goal
    }

    pub fn command(&self) -> Command {
        self.cmd
    }

    pub fn has_command(&self) -> bool {
        self.cmd_assigned
    }

    /// Returns `false` (and leaves the episode untouched) if a command was
    /// already assigned.
    pub(crate) fn assign_command(&mut self, cmd: Command) -> bool {
        if self.cmd_assigned {
            return false;
        }
        self.cmd = cmd;
        self.cmd_assigned = true;
        true
    }
}

/// A completed sequence one level down, seen as a single entry of this level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SequenceEntry {
    pub id: SequenceId,
    pub contains_goal: bool,
}

/// One slot of a level's episode store.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LevelEntry {
    Episode(Episode),
    Sequence(SequenceEntry),
}

impl LevelEntry {
    pub fn is_goal(&self) -> bool {
        match self {
            LevelEntry::Episode(ep) => ep.is_goal(),
            LevelEntry::Sequence(seq) => seq.contains_goal,
        }
    }

    pub fn as_episode(&self) -> Option<&Episode> {
        match self {
            LevelEntry::Episode(ep) => Some(ep),
            LevelEntry::Sequence(_) => None,
        }
    }

    pub fn as_sequence(&self) -> Option<SequenceEntry> {
        match self {
            LevelEntry::Sequence(seq) => Some(*seq),
            LevelEntry::Episode(_) => None,
        }
    }

    /// LHS comparison: the action taken is part of the context.
    pub fn matches_lhs(&self, other: &LevelEntry) -> bool {
        match (self, other) {
            (LevelEntry::Episode(a), LevelEntry::Episode(b)) => {
                a.sensors == b.sensors && a.cmd == b.cmd
            }
            (LevelEntry::Sequence(a), LevelEntry::Sequence(b)) => a.id == b.id,
            _ => false,
        }
    }

    /// RHS comparison: the outcome's own action is not chosen yet, so only
    /// the sensors count.
    pub fn matches_outcome(&self, other: &LevelEntry) -> bool {
        match (self, other) {
            (LevelEntry::Episode(a), LevelEntry::Episode(b)) => a.sensors == b.sensors,
            (LevelEntry::Sequence(a), LevelEntry::Sequence(b)) => a.id == b.id,
            _ => false,
        }
    }
}

/// Turns raw sensor tokens into episodes.
///
/// Token format: `num_sensors` characters of `0`/`1`, optionally followed by
/// whitespace and a decimal timestamp. Without a timestamp the parser counts
/// ticks itself.
#[derive(Debug, Clone)]
pub struct EpisodeParser {
    num_sensors: usize,
    goal_sensor: usize,
    last_timestamp: Option<u64>,
}

impl EpisodeParser {
    pub fn new(num_sensors: usize, goal_sensor: usize) -> Self {
        Self {
            num_sensors,
            goal_sensor,
            last_timestamp: None,
        }
    }

    pub fn last_timestamp(&self) -> Option<u64> {
        self.last_timestamp
    }

    pub fn parse(&mut self, token: &str) -> Result<Episode, ParseError> {
        let token = token.trim();

        let mut bits = Vec::with_capacity(self.num_sensors);
        for (position, ch) in token.chars().take(self.num_sensors).enumerate() {
            match ch {
                '0' => bits.push(false),
                '1' => bits.push(true),
                found => return Err(ParseError::NonBinaryFeature { position, found }),
            }
        }
        if bits.len() < self.num_sensors {
            return Err(ParseError::TooShort {
                expected: self.num_sensors,
                got: bits.len(),
            });
        }

        // Feature characters are ASCII, so this slice is on a char boundary.
        let tail = &token[self.num_sensors..];
        if let Some(found) = tail.chars().next().filter(|c| !c.is_whitespace()) {
            return Err(ParseError::TooLong {
                expected: self.num_sensors,
                found,
            });
        }
        let tail = tail.trim_start();
        let now = match tail.split_whitespace().next() {
            None => self.last_timestamp.map_or(0, |t| t.saturating_add(1)),
            Some(digits) => {
                if !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(ParseError::BadTimestamp(digits.to_string()));
                }
                digits
                    .parse::<u64>()
                    .map_err(|_| ParseError::BadTimestamp(digits.to_string()))?
            }
        };

        if let Some(previous) = self.last_timestamp {
            if now <= previous {
                return Err(ParseError::NonMonotonicTimestamp { previous, got: now });
            }
        }
        self.last_timestamp = Some(now);

        Ok(Episode::new(
            now,
            SensorVector::from_bits(&bits),
            self.goal_sensor,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sensor_summary_puts_first_sensor_high() {
        let v = SensorVector::from_bits(&[false, true, false, true]);
        assert_eq!(v.summary(), 5);
        assert!(v.get(1));
        assert!(!v.get(0));
        assert!(!v.get(17));
        assert_eq!(v.to_string(), "0101");
    }

    #[test]
    fn parse_counts_ticks_without_timestamp() {
        let mut p = EpisodeParser::new(4, 0);
        let a = p.parse("0001").unwrap();
        let b = p.parse("1000\n").unwrap();
        assert_eq!(a.now(), 0);
        assert_eq!(b.now(), 1);
        assert!(!a.is_goal());
        assert!(b.is_goal());
        assert_eq!(b.command(), Command::NoOp);
        assert!(!b.has_command());
    }

    #[test]
    fn parse_reads_trailing_timestamp() {
        let mut p = EpisodeParser::new(4, 3);
        let ep = p.parse("0011 42").unwrap();
        assert_eq!(ep.now(), 42);
        assert!(ep.is_goal());
    }

    #[test]
    fn parse_rejects_non_binary_features() {
        let mut p = EpisodeParser::new(4, 0);
        assert_eq!(
            p.parse("01x1"),
            Err(ParseError::NonBinaryFeature {
                position: 2,
                found: 'x'
            })
        );
        // A rejected token must not advance the clock.
        assert_eq!(p.last_timestamp(), None);
    }

    #[test]
    fn parse_rejects_short_tokens_and_bad_timestamps() {
        let mut p = EpisodeParser::new(4, 0);
        assert_eq!(
            p.parse("01"),
            Err(ParseError::TooShort {
                expected: 4,
                got: 2
            })
        );
        assert_eq!(
            p.parse("0101 12a"),
            Err(ParseError::BadTimestamp("12a".to_string()))
        );
    }

    #[test]
    fn parse_requires_whitespace_before_the_timestamp() {
        let mut p = EpisodeParser::new(4, 0);
        assert_eq!(
            p.parse("01011"),
            Err(ParseError::TooLong {
                expected: 4,
                found: '1'
            })
        );
        assert_eq!(p.last_timestamp(), None);

        let ep = p.parse("0101\t1").unwrap();
        assert_eq!(ep.now(), 1);
        assert_eq!(ep.sensors().to_string(), "0101");
    }

    #[test]
    fn parse_rejects_time_going_backwards() {
        let mut p = EpisodeParser::new(2, 0);
        p.parse("01 10").unwrap();
        assert_eq!(
            p.parse("01 10"),
            Err(ParseError::NonMonotonicTimestamp {
                previous: 10,
                got: 10
            })
        );
    }

    #[test]
    fn command_is_assigned_once() {
        let mut ep = Episode::new(0, SensorVector::from_bits(&[false, true]), 0);
        assert!(ep.assign_command(Command::Left));
        assert!(!ep.assign_command(Command::Right));
        assert_eq!(ep.command(), Command::Left);
    }

    #[test]
    fn lhs_match_includes_action_but_outcome_match_does_not() {
        let s = SensorVector::from_bits(&[false, true]);
        let a = LevelEntry::Episode(Episode::new(0, s, 0).with_command(Command::Left));
        let b = LevelEntry::Episode(Episode::new(1, s, 0).with_command(Command::Right));
        assert!(!a.matches_lhs(&b));
        assert!(a.matches_outcome(&b));

        let s1 = LevelEntry::Sequence(SequenceEntry {
            id: 3,
            contains_goal: false,
        });
        let s2 = LevelEntry::Sequence(SequenceEntry {
            id: 3,
            contains_goal: false,
        });
        assert!(s1.matches_lhs(&s2));
        assert!(!s1.matches_lhs(&a));
    }
}
