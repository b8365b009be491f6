//! Route planning and execution.
//!
//! A route is the most recent goal-terminated sequence, taken from the most
//! abstract level that has one and flattened into level-0 rules. Executing it
//! replays the actions recorded in those rules' LHS windows while checking
//! that the world keeps matching the predicted sensors.

use tracing::info;

use crate::command::Command;
use crate::episode::SensorVector;
use crate::error::PlanError;
use crate::level::{Hierarchy, Level};
use crate::rule::RuleId;

#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    level: usize,
    rules: Vec<RuleId>,
    curr_rule: usize,
    curr_ep_in_rule: usize,
    needs_recalc: bool,
    expected: Option<SensorVector>,
}

/// Plan toward the latest goal-terminated sequence.
///
/// Levels are searched from the deepest down; the first one with a goal
/// sequence wins.
pub fn plan_route(hierarchy: &Hierarchy) -> Result<Route, PlanError> {
    let (level, seq) = hierarchy
        .levels()
        .iter()
        .rev()
        .find_map(|lvl| {
            let id = lvl.sequences().last_goal()?;
            lvl.sequences().get(id).map(|seq| (lvl.depth(), seq))
        })
        .ok_or(PlanError::NoGoalSequence)?;

    let mut rules = seq.rules.clone();
    for depth in (1..=level).rev() {
        rules = expand_one_level(&hierarchy.levels()[depth], &hierarchy.levels()[depth - 1], &rules);
    }
    if rules.is_empty() {
        return Err(PlanError::RouteExhausted);
    }

    info!(level, steps = rules.len(), "planned route");
    Ok(Route {
        level,
        rules,
        curr_rule: 0,
        curr_ep_in_rule: 0,
        needs_recalc: false,
        expected: None,
    })
}

/// Replace rules of `upper` by the rules of the lower-level sequences their
/// entries stand for.
fn expand_one_level(upper: &Level, lower: &Level, rules: &[RuleId]) -> Vec<RuleId> {
    let mut out: Vec<RuleId> = Vec::new();
    for idx in trajectory(upper, rules) {
        let Some(entry) = upper.entry(idx).and_then(|e| e.as_sequence()) else {
            continue;
        };
        let Some(seq) = lower.sequences().get(entry.id) else {
            continue;
        };
        for &r in &seq.rules {
            // Sequences closed by a percentage rule restart with that rule.
            if out.last() != Some(&r) {
                out.push(r);
            }
        }
    }
    out
}

/// Entry positions visited by a run of rules: the first rule's whole LHS
/// window, then each rule's outcome.
fn trajectory(level: &Level, rules: &[RuleId]) -> Vec<usize> {
    let mut out = Vec::new();
    let mut iter = rules.iter().filter_map(|&id| level.rule(id));
    if let Some(first) = iter.next() {
        out.extend(first.window());
        out.push(first.outcome);
    }
    out.extend(iter.map(|r| r.outcome));
    out
}

impl Route {
    pub fn level(&self) -> usize {
        self.level
    }

    pub fn rules(&self) -> &[RuleId] {
        &self.rules
    }

    pub fn curr_rule(&self) -> usize {
        self.curr_rule
    }

    pub fn curr_ep_in_rule(&self) -> usize {
        self.curr_ep_in_rule
    }

    pub fn needs_recalc(&self) -> bool {
        self.needs_recalc
    }

    /// Sensors the last step is expected to produce.
    pub fn expected(&self) -> Option<SensorVector> {
        self.expected
    }

    pub fn is_exhausted(&self) -> bool {
        self.curr_rule >= self.rules.len()
    }

    pub fn mark_for_recalc(&mut self) {
        self.needs_recalc = true;
    }

    /// Whether the route may be continued from `current`. Marks the route for
    /// recalculation when it may not.
    pub fn next_step_is_valid(&mut self, current: SensorVector) -> bool {
        if self.needs_recalc {
            return false;
        }
        let diverged = self.expected.is_some_and(|e| e != current);
        if self.is_exhausted() || diverged {
            self.needs_recalc = true;
            return false;
        }
        true
    }

    /// Emit the action at the cursor and advance it.
    pub fn take_next_step(&mut self, hierarchy: &Hierarchy) -> Result<Command, PlanError> {
        let level0 = &hierarchy.levels()[0];
        let Some(rule) = self.rules.get(self.curr_rule).and_then(|&id| level0.rule(id)) else {
            self.needs_recalc = true;
            return Err(PlanError::RouteExhausted);
        };

        let pos = rule.window_start() + self.curr_ep_in_rule;
        let Some(step) = level0.entry(pos).and_then(|e| e.as_episode()) else {
            self.needs_recalc = true;
            return Err(PlanError::RouteExhausted);
        };
        let cmd = step.command();

        let final_step = self.curr_ep_in_rule + 1 >= rule.length;
        let next_pos = if final_step { rule.outcome } else { pos + 1 };
        self.expected = level0
            .entry(next_pos)
            .and_then(|e| e.as_episode())
            .map(|ep| ep.sensors());

        if final_step {
            if rule.contains_goal {
                self.needs_recalc = true;
            }
            self.curr_rule += 1;
            // Earlier LHS entries of the next rule were already walked.
            self.curr_ep_in_rule = self
                .rules
                .get(self.curr_rule)
                .and_then(|&id| level0.rule(id))
                .map_or(0, |r| r.length - 1);
        } else {
            self.curr_ep_in_rule += 1;
        }

        Ok(cmd)
    }
}
