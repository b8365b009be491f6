use crate::episode::LevelEntry;
use crate::level::Level;
use crate::planner::Route;
use crate::rule::{Cousins, Rule, RuleId};
use crate::sequence::{Sequence, SequenceId};
use crate::supervisor::Supervisor;

#[cfg(feature = "serde")]
use serde::Serialize;

/// How many of the newest episodes a snapshot carries.
pub const RECENT_EPISODES: usize = 20;

/// A read-only snapshot of what the supervisor has learned.
///
/// Snapshotting allocates and is meant for on-demand inspection; the tick
/// loop never builds one.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SupervisorSnapshot {
    pub episodes: usize,
    pub goal_log: Vec<u64>,
    pub rand_chance: f32,
    pub levels: Vec<LevelSnapshot>,
    pub route: Option<RouteSnapshot>,
    /// Newest first.
    pub recent_episodes: Vec<EpisodeSnapshot>,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct LevelSnapshot {
    pub depth: usize,
    pub entries: usize,
    /// Rendered as `outcome <--NN-- lhs, ...`, newest LHS entry first.
    pub rules: Vec<String>,
    pub cousins: Vec<Cousins>,
    pub sequences: Vec<Sequence>,
    pub open_sequence: Vec<RuleId>,
    pub last_goal_sequence: Option<SequenceId>,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct RouteSnapshot {
    pub level: usize,
    pub rules: Vec<RuleId>,
    pub curr_rule: usize,
    pub curr_ep_in_rule: usize,
    pub needs_recalc: bool,
    pub expected: Option<String>,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct EpisodeSnapshot {
    pub now: u64,
    pub sensors: String,
    pub summary: u64,
    pub goal: bool,
    pub command: &'static str,
}

pub struct SupervisorAdapter<'a> {
    sup: &'a Supervisor,
}

impl<'a> SupervisorAdapter<'a> {
    pub fn new(sup: &'a Supervisor) -> Self {
        Self { sup }
    }

    pub fn snapshot(&self) -> SupervisorSnapshot {
        let hierarchy = self.sup.hierarchy();

        let recent_episodes = hierarchy.levels()[0]
            .entries()
            .iter()
            .rev()
            .filter_map(LevelEntry::as_episode)
            .take(RECENT_EPISODES)
            .map(|ep| EpisodeSnapshot {
                now: ep.now(),
                sensors: ep.sensors().to_string(),
                summary: ep.sensors().summary(),
                goal: ep.is_goal(),
                command: ep.command().short_name(),
            })
            .collect();

        SupervisorSnapshot {
            episodes: hierarchy.episode_count(),
            goal_log: self.sup.goal_log().to_vec(),
            rand_chance: self.sup.rand_chance(),
            levels: hierarchy.levels().iter().map(level_snapshot).collect(),
            route: self.sup.route().map(route_snapshot),
            recent_episodes,
        }
    }
}

pub fn level_snapshot(level: &Level) -> LevelSnapshot {
    LevelSnapshot {
        depth: level.depth(),
        entries: level.entries().len(),
        rules: level.rules().iter().map(|r| render_rule(level, r)).collect(),
        cousins: level.cousins().to_vec(),
        sequences: level.sequences().closed().to_vec(),
        open_sequence: level.sequences().open().to_vec(),
        last_goal_sequence: level.sequences().last_goal(),
    }
}

fn route_snapshot(route: &Route) -> RouteSnapshot {
    RouteSnapshot {
        level: route.level(),
        rules: route.rules().to_vec(),
        curr_rule: route.curr_rule(),
        curr_ep_in_rule: route.curr_ep_in_rule(),
        needs_recalc: route.needs_recalc(),
        expected: route.expected().map(|s| s.to_string()),
    }
}

/// One-line rendering of a rule.
///
/// Level-0 entries show the sensor summary and the command short name; higher
/// levels show the sequence they stand for as `S<id>`.
pub fn render_rule(level: &Level, rule: &Rule) -> String {
    let mut out = render_entry(level.entry(rule.outcome), false);

    match rule.cousins.and_then(|id| level.cousin_group(id)) {
        Some(group) if rule.is_percentage => {
            out.push_str(&format!(" <--{:2}-- ", rule.percentage(group)));
        }
        _ => out.push_str(" <------ "),
    }

    let lhs: Vec<String> = rule
        .window()
        .rev()
        .map(|idx| render_entry(level.entry(idx), true))
        .collect();
    out.push_str(&lhs.join(", "));
    out
}

fn render_entry(entry: Option<&LevelEntry>, with_command: bool) -> String {
    match entry {
        Some(LevelEntry::Episode(ep)) if with_command => {
            format!("{} {}", ep.sensors().summary(), ep.command().short_name())
        }
        Some(LevelEntry::Episode(ep)) => ep.sensors().summary().to_string(),
        Some(LevelEntry::Sequence(seq)) => format!("S{}", seq.id),
        None => "?".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use crate::config::SupervisorConfig;
    use crate::episode::{Episode, SensorVector};
    use crate::level::Hierarchy;

    fn push(h: &mut Hierarchy, now: u64, bits: &[bool]) {
        h.push_episode(Episode::new(now, SensorVector::from_bits(bits), 0).with_command(Command::Forward));
        h.update_rules();
    }

    #[test]
    fn rules_render_with_percentages() {
        let mut h = Hierarchy::new(2, 1);
        let a = [false, true, false, false];
        let b = [false, false, true, false];
        let c = [false, false, false, true];
        push(&mut h, 0, &a);
        push(&mut h, 1, &b);
        push(&mut h, 2, &a);
        push(&mut h, 3, &c);

        let snap = level_snapshot(h.level(0).unwrap());
        assert_eq!(snap.rules[0], "2 <--50-- 4 FW");
        assert_eq!(snap.rules[1], "4 <------ 2 FW");
        assert_eq!(snap.rules[2], "1 <--50-- 4 FW");
        assert_eq!(snap.cousins.len(), 1);
        assert_eq!(snap.sequences.len(), 1);
    }

    #[test]
    fn snapshot_reports_every_level_and_the_newest_episodes_first() {
        let cfg = SupervisorConfig::with_sensors(4, 0)
            .with_seed(1)
            .with_rand_chance(0.0);
        let mut sup = Supervisor::new(cfg).unwrap();
        for t in 0..30u64 {
            let token = if t % 3 == 2 { "1000" } else if t % 3 == 1 { "0010" } else { "0001" };
            sup.tick(token).unwrap();
        }

        let snap = SupervisorAdapter::new(&sup).snapshot();
        assert_eq!(snap.episodes, 30);
        assert_eq!(snap.levels.len(), 3);
        assert_eq!(snap.goal_log.len(), 10);
        assert_eq!(snap.recent_episodes.len(), RECENT_EPISODES);
        assert_eq!(snap.recent_episodes[0].now, 29);
        assert!(snap.recent_episodes[0].goal);
        assert!(snap.route.is_some());
    }
}
