#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Handle into a level's rule arena.
pub type RuleId = usize;

/// Handle into a level's cousins arena.
pub type CousinsId = usize;

/// "The LHS window of `length` consecutive entries ending at `index` is
/// followed by the entry at `outcome`."
///
/// Positions refer to the episode store of the rule's own level; rules never
/// copy entries.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rule {
    pub level: usize,
    pub index: usize,
    pub length: usize,
    pub outcome: usize,
    pub freq: u32,
    pub is_percentage: bool,
    pub contains_goal: bool,
    pub contains_start: bool,
    pub cousins: Option<CousinsId>,
}

impl Rule {
    /// Oldest entry of the LHS window.
    #[inline]
    pub fn window_start(&self) -> usize {
        self.index + 1 - self.length
    }

    /// LHS positions, oldest first.
    pub fn window(&self) -> core::ops::RangeInclusive<usize> {
        self.window_start()..=self.index
    }

    /// Share of the cousins group this rule accounts for, in percent.
    pub fn percentage(&self, group: &Cousins) -> u32 {
        if group.overall_freq == 0 {
            return 0;
        }
        self.freq.saturating_mul(100) / group.overall_freq
    }
}

/// Rules that share one LHS but disagree about the outcome.
///
/// `overall_freq` is kept equal to the sum of the members' `freq`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cousins {
    pub members: Vec<RuleId>,
    pub overall_freq: u32,
}

impl Cousins {
    pub fn contains(&self, rule: RuleId) -> bool {
        self.members.contains(&rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(index: usize, length: usize) -> Rule {
        Rule {
            level: 0,
            index,
            length,
            outcome: index + 1,
            freq: 1,
            is_percentage: false,
            contains_goal: false,
            contains_start: false,
            cousins: None,
        }
    }

    #[test]
    fn window_covers_length_entries_ending_at_index() {
        let r = rule(5, 3);
        assert_eq!(r.window_start(), 3);
        assert_eq!(r.window().collect::<Vec<_>>(), vec![3, 4, 5]);
    }

    #[test]
    fn percentage_is_share_of_group() {
        let mut r = rule(0, 1);
        r.freq = 1;
        let group = Cousins {
            members: vec![0, 1],
            overall_freq: 4,
        };
        assert_eq!(r.percentage(&group), 25);
        assert_eq!(r.percentage(&Cousins::default()), 0);
    }
}
