//! Incremental rule induction.
//!
//! Every new entry at a level yields a length-1 candidate rule anchored at the
//! newest pair of entries. The candidate is compared against the rule table in
//! insertion order; it is either absorbed by an existing rule (frequency bump,
//! cousin bookkeeping) or inserted. The effective rule extends the level's open
//! sequence, and a sequence closed by a goal or percentage rule is promoted as a
//! new entry one level up.

use tracing::debug;

use crate::episode::{LevelEntry, SequenceEntry};
use crate::level::{Hierarchy, Level};
use crate::rule::{Cousins, CousinsId, Rule, RuleId};
use crate::sequence::ClosedSequence;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoRuleReason {
    /// Fewer than two entries at this level.
    TooFewEntries,
    /// The would-be LHS entry is itself goal-bearing.
    GoalBeforeOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleUpdate {
    Created,
    Reinforced,
    /// Candidate and an existing rule became a new cousins group.
    SeededCousins,
    /// Candidate added to an existing cousins group.
    JoinedCousins,
    /// A cousin with the same outcome absorbed the candidate.
    ReinforcedCousin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Induction {
    NoRule(NoRuleReason),
    Applied {
        rule: RuleId,
        update: RuleUpdate,
        closed: Option<ClosedSequence>,
    },
}

impl Induction {
    pub fn rule(&self) -> Option<RuleId> {
        match self {
            Induction::Applied { rule, .. } => Some(*rule),
            Induction::NoRule(_) => None,
        }
    }

    pub fn closed(&self) -> Option<ClosedSequence> {
        match self {
            Induction::Applied { closed, .. } => *closed,
            Induction::NoRule(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelInduction {
    pub level: usize,
    pub induction: Induction,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    index: usize,
    outcome: usize,
    length: usize,
    contains_goal: bool,
    contains_start: bool,
}

enum Resolution {
    Grew,
    Abandon,
    Reinforce,
    SeedCousins,
    JoinCousins(CousinsId),
}

impl Hierarchy {
    /// Induce from the newest level-0 entry and cascade promotions upward.
    ///
    /// Returns one record per level touched, lowest first. Promotion stops
    /// silently at the top level.
    pub fn update_rules(&mut self) -> Vec<LevelInduction> {
        let mut report = Vec::new();
        let mut depth = 0;

        loop {
            let induction = self.levels[depth].induce(self.max_lhs_len);
            debug!(level = depth, ?induction, "rule induction");
            report.push(LevelInduction {
                level: depth,
                induction,
            });

            let Some(closed) = induction.closed() else {
                break;
            };

            let next = depth + 1;
            if next >= self.levels.len() {
                debug!(level = depth, sequence = closed.id, "top level reached; not promoting");
                break;
            }

            self.levels[next].push_entry(LevelEntry::Sequence(SequenceEntry {
                id: closed.id,
                contains_goal: closed.contains_goal,
            }));
            depth = next;
        }

        report
    }
}

impl Level {
    pub(crate) fn induce(&mut self, max_lhs_len: usize) -> Induction {
        let n = self.entries.len();
        if n < 2 {
            return Induction::NoRule(NoRuleReason::TooFewEntries);
        }
        if self.entries[n - 2].is_goal() {
            return Induction::NoRule(NoRuleReason::GoalBeforeOutcome);
        }

        let mut cand = Candidate {
            index: n - 2,
            outcome: n - 1,
            length: 1,
            contains_goal: self.entries[n - 1].is_goal(),
            contains_start: self.rules.last().map_or(true, |r| r.contains_goal),
        };

        let mut applied: Option<(RuleId, RuleUpdate)> = None;

        'scan: for existing in 0..self.rules.len() {
            let mut j = 0;
            loop {
                let shared = cand.length.min(self.rules[existing].length);
                if j < shared {
                    let ours = &self.entries[cand.index - j];
                    let theirs = &self.entries[self.rules[existing].index - j];
                    if !ours.matches_lhs(theirs) {
                        continue 'scan;
                    }
                    j += 1;
                    continue;
                }

                match self.resolve(existing, &mut cand, max_lhs_len) {
                    Resolution::Grew => continue,
                    Resolution::Abandon => continue 'scan,
                    Resolution::Reinforce => {
                        self.rules[existing].freq += 1;
                        applied = Some((existing, RuleUpdate::Reinforced));
                    }
                    Resolution::SeedCousins => {
                        let id = self.seed_cousins(existing, &cand);
                        applied = Some((id, RuleUpdate::SeededCousins));
                    }
                    Resolution::JoinCousins(group) => {
                        applied = Some(self.join_cousins(group, &cand));
                    }
                }
                break 'scan;
            }
        }

        let (rule, update) = match applied {
            Some(done) => done,
            None => (self.insert(&cand, None), RuleUpdate::Created),
        };

        self.sequences.push_open(rule);
        let (contains_goal, is_percentage) = {
            let r = &self.rules[rule];
            (r.contains_goal, r.is_percentage)
        };
        let closed = if contains_goal || is_percentage {
            let seed = (!contains_goal).then_some(rule);
            Some(self.sequences.close(contains_goal, seed))
        } else {
            None
        };

        Induction::Applied {
            rule,
            update,
            closed,
        }
    }

    /// Decide what to do once the shared part of both LHS windows matched.
    fn resolve(&mut self, existing: RuleId, cand: &mut Candidate, max_lhs_len: usize) -> Resolution {
        let Rule {
            index,
            length,
            outcome,
            is_percentage,
            cousins,
            ..
        } = self.rules[existing];
        let same_outcome = self.entries[cand.outcome].matches_outcome(&self.entries[outcome]);

        if cand.length == length {
            if is_percentage {
                if let Some(group) = cousins {
                    return Resolution::JoinCousins(group);
                }
            }
            if same_outcome {
                return Resolution::Reinforce;
            }

            // A candidate that cannot grow can never be told apart, so the
            // existing rule keeps its count and they become cousins.
            if !self.can_grow(cand.index, cand.length, max_lhs_len) {
                return Resolution::SeedCousins;
            }
            cand.length += 1;
            if self.can_grow(index, length, max_lhs_len) {
                self.grow_rule(existing);
            }
            return Resolution::Grew;
        }

        if cand.length < length {
            if self.can_grow(cand.index, cand.length, max_lhs_len) {
                cand.length += 1;
                return Resolution::Grew;
            }
            return Resolution::Abandon;
        }

        // The existing rule is the shorter one. Cousins never grow.
        if is_percentage {
            return Resolution::Abandon;
        }
        if same_outcome {
            return Resolution::Reinforce;
        }
        if self.can_grow(index, length, max_lhs_len) {
            self.grow_rule(existing);
            return Resolution::Grew;
        }
        Resolution::Abandon
    }

    /// A window may grow by one entry if it stays within `max_lhs_len`, within
    /// the store, and off goal-bearing entries.
    fn can_grow(&self, index: usize, length: usize, max_lhs_len: usize) -> bool {
        length < max_lhs_len && index >= length && !self.entries[index - length].is_goal()
    }

    fn grow_rule(&mut self, id: RuleId) {
        let rule = &mut self.rules[id];
        rule.length += 1;
        rule.freq = 1;
    }

    fn insert(&mut self, cand: &Candidate, cousins: Option<CousinsId>) -> RuleId {
        self.rules.push(Rule {
            level: self.depth,
            index: cand.index,
            length: cand.length,
            outcome: cand.outcome,
            freq: 1,
            is_percentage: cousins.is_some(),
            contains_goal: cand.contains_goal,
            contains_start: cand.contains_start,
            cousins,
        });
        self.rules.len() - 1
    }

    fn seed_cousins(&mut self, existing: RuleId, cand: &Candidate) -> RuleId {
        let group = self.cousins.len();
        let id = self.insert(cand, Some(group));

        let rule = &mut self.rules[existing];
        rule.is_percentage = true;
        rule.cousins = Some(group);
        let overall_freq = rule.freq + 1;

        self.cousins.push(Cousins {
            members: vec![existing, id],
            overall_freq,
        });
        id
    }

    fn join_cousins(&mut self, group: CousinsId, cand: &Candidate) -> (RuleId, RuleUpdate) {
        let matching = self.cousins[group].members.iter().copied().find(|&m| {
            self.entries[cand.outcome].matches_outcome(&self.entries[self.rules[m].outcome])
        });

        let result = match matching {
            Some(m) => {
                self.rules[m].freq += 1;
                (m, RuleUpdate::ReinforcedCousin)
            }
            None => {
                let id = self.insert(cand, Some(group));
                self.cousins[group].members.push(id);
                (id, RuleUpdate::JoinedCousins)
            }
        };

        self.cousins[group].overall_freq += 1;
        result
    }
}
