use tracing::{debug, info, warn};

use crate::command::Command;
use crate::config::SupervisorConfig;
use crate::episode::EpisodeParser;
use crate::error::{PlanError, SupervisorError};
use crate::inductor::LevelInduction;
use crate::level::Hierarchy;
use crate::planner::{plan_route, Route};
use crate::prng::Prng;

/// Where a tick's command came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CommandSource {
    /// Epsilon draw picked a random legal action.
    Explore,
    /// Next step of the active route.
    Route,
    /// Planning or execution failed; random legal action instead.
    Fallback,
    /// Goal reached; the robot sings instead of moving.
    Goal,
}

#[derive(Debug, Clone)]
pub struct TickOutcome {
    pub command: Command,
    pub source: CommandSource,
    /// The observed episode had its goal sensor set.
    pub goal: bool,
    /// Induction results, lowest level first.
    pub inductions: Vec<LevelInduction>,
}

/// Owns the whole learning state for one robot.
///
/// Feed it one sensor token per tick; it answers with the command to send.
#[derive(Debug)]
pub struct Supervisor {
    cfg: SupervisorConfig,
    parser: EpisodeParser,
    hierarchy: Hierarchy,
    route: Option<Route>,
    rng: Prng,
    rand_chance: f32,
    goal_log: Vec<u64>,
}

impl Supervisor {
    pub fn new(cfg: SupervisorConfig) -> Result<Self, SupervisorError> {
        cfg.validate().map_err(SupervisorError::InvalidConfig)?;

        let seed = cfg.seed.unwrap_or_else(seed_from_clock);
        debug!(seed, sensors = cfg.num_sensors, max_depth = cfg.max_depth, "supervisor init");

        Ok(Self {
            parser: EpisodeParser::new(cfg.num_sensors, cfg.goal_sensor),
            hierarchy: Hierarchy::new(cfg.max_depth, cfg.max_lhs_len),
            route: None,
            rng: Prng::new(seed),
            rand_chance: cfg.initial_rand_chance,
            goal_log: Vec::new(),
            cfg,
        })
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.cfg
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    /// Current exploration probability.
    pub fn rand_chance(&self) -> f32 {
        self.rand_chance
    }

    /// Timestamps of every goal episode seen so far.
    pub fn goal_log(&self) -> &[u64] {
        &self.goal_log
    }

    pub fn goal_count(&self) -> usize {
        self.goal_log.len()
    }

    /// Process one sensor token and return the command for the robot.
    ///
    /// A goal episode is answered with [`Command::Song`] and skips the
    /// selector; the route is replanned on the next tick.
    /// A rejected token leaves every piece of state untouched.
    pub fn tick(&mut self, token: &str) -> Result<TickOutcome, SupervisorError> {
        let ep = self.parser.parse(token)?;
        let goal = ep.is_goal();
        let now = ep.now();

        self.hierarchy.push_episode(ep);
        if goal {
            self.record_goal(now);
        }

        let inductions = self.hierarchy.update_rules();
        let (command, source) = if goal {
            (Command::Song, CommandSource::Goal)
        } else {
            self.choose_command()
        };
        self.hierarchy.assign_newest_command(command);

        debug!(now, cmd = command.short_name(), ?source, "tick");
        Ok(TickOutcome {
            command,
            source,
            goal,
            inductions,
        })
    }

    fn record_goal(&mut self, now: u64) {
        self.goal_log.push(now);

        let floor = self.cfg.min_rand_chance;
        if self.rand_chance > floor {
            self.rand_chance = (self.rand_chance * self.cfg.rand_decay).max(floor);
        }
        if let Some(route) = self.route.as_mut() {
            route.mark_for_recalc();
        }

        info!(
            now,
            goals = self.goal_log.len(),
            rand_chance = self.rand_chance,
            "goal reached"
        );
    }

    /// Epsilon-greedy choice between a random legal action and the route.
    pub fn choose_command(&mut self) -> (Command, CommandSource) {
        if self.rng.chance(self.rand_chance) {
            return (self.random_action(), CommandSource::Explore);
        }

        match self.steer() {
            Ok(cmd) => (cmd, CommandSource::Route),
            Err(PlanError::NoGoalSequence) => {
                debug!("no goal sequence yet; acting randomly");
                (self.random_action(), CommandSource::Fallback)
            }
            Err(err) => {
                warn!(%err, "route failed; acting randomly");
                (self.random_action(), CommandSource::Fallback)
            }
        }
    }

    /// Follow the active route, replanning first when it is missing or no
    /// longer matches the newest episode.
    pub fn steer(&mut self) -> Result<Command, PlanError> {
        let current = self.hierarchy.newest_episode().map(|ep| ep.sensors());
        let valid = match (self.route.as_mut(), current) {
            (Some(route), Some(sensors)) => route.next_step_is_valid(sensors),
            _ => false,
        };

        if !valid {
            self.route = None;
            self.route = Some(plan_route(&self.hierarchy)?);
        }

        let route = self.route.as_mut().ok_or(PlanError::NoGoalSequence)?;
        route.take_next_step(&self.hierarchy)
    }

    fn random_action(&mut self) -> Command {
        self.rng
            .pick(&self.cfg.legal_actions)
            .copied()
            .unwrap_or_default()
    }
}

fn seed_from_clock() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;

    fn quiet(sensors: usize) -> Supervisor {
        let cfg = SupervisorConfig::with_sensors(sensors, 0)
            .with_seed(11)
            .with_rand_chance(0.0);
        Supervisor::new(cfg).unwrap()
    }

    #[test]
    fn invalid_config_is_rejected() {
        let err = Supervisor::new(SupervisorConfig::with_sensors(4, 9)).err();
        assert!(matches!(err, Some(SupervisorError::InvalidConfig(_))));
    }

    #[test]
    fn malformed_token_leaves_store_unchanged() {
        let mut sup = quiet(4);
        let err = sup.tick("01x1").unwrap_err();
        assert_eq!(
            err,
            SupervisorError::Parse(ParseError::NonBinaryFeature {
                position: 2,
                found: 'x'
            })
        );
        assert_eq!(sup.hierarchy().episode_count(), 0);

        assert!(matches!(
            sup.tick("01011"),
            Err(SupervisorError::Parse(ParseError::TooLong { .. }))
        ));
        assert_eq!(sup.hierarchy().episode_count(), 0);

        sup.tick("0101").unwrap();
        assert_eq!(sup.hierarchy().episode_count(), 1);
    }

    #[test]
    fn goal_ticks_announce_with_a_song() {
        let mut sup = quiet(4);
        sup.tick("0001").unwrap();
        sup.tick("0010").unwrap();

        let out = sup.tick("1000").unwrap();
        assert!(out.goal);
        assert_eq!(out.command, Command::Song);
        assert_eq!(out.source, CommandSource::Goal);
        assert_eq!(sup.hierarchy().newest_episode().map(|ep| ep.command()), Some(Command::Song));
        // The selector was skipped, so no route was planned on the goal tick.
        assert!(sup.route().is_none());
    }

    #[test]
    fn without_goals_the_selector_falls_back_to_random_actions() {
        let mut sup = quiet(4);
        let out = sup.tick("0001").unwrap();
        assert_eq!(out.source, CommandSource::Fallback);
        assert!(sup.config().legal_actions.contains(&out.command));

        let ep = sup.hierarchy().newest_episode().unwrap();
        assert!(ep.has_command());
        assert_eq!(ep.command(), out.command);
        assert!(sup.route().is_none());
    }

    #[test]
    fn full_exploration_never_consults_the_planner() {
        let cfg = SupervisorConfig::with_sensors(4, 0)
            .with_seed(3)
            .with_rand_chance(1.0);
        let mut sup = Supervisor::new(cfg).unwrap();
        for token in ["0001", "0010", "0100", "0001"] {
            assert_eq!(sup.tick(token).unwrap().source, CommandSource::Explore);
        }
        assert!(sup.route().is_none());
    }

    #[test]
    fn goals_decay_exploration_down_to_the_floor() {
        let cfg = SupervisorConfig::with_sensors(4, 0).with_seed(5);
        let mut sup = Supervisor::new(cfg).unwrap();

        let out = sup.tick("1000 7").unwrap();
        assert!(out.goal);
        assert!((sup.rand_chance() - 0.72).abs() < 1e-6);
        assert_eq!(sup.goal_log(), &[7]);

        for t in 8..100 {
            sup.tick(&format!("1000 {t}")).unwrap();
        }
        assert!((sup.rand_chance() - 0.05).abs() < 1e-6);
        assert_eq!(sup.goal_count(), 93);
    }

    #[test]
    fn after_a_goal_the_route_replays_the_successful_actions() {
        let mut sup = quiet(4);
        for token in ["0001", "0010", "1000"] {
            sup.tick(token).unwrap();
        }
        let first = sup.hierarchy().episode(0).unwrap().command();
        let second = sup.hierarchy().episode(1).unwrap().command();

        let out = sup.tick("0001").unwrap();
        assert_eq!(out.source, CommandSource::Route);
        assert_eq!(out.command, first);
        assert_eq!(sup.route().map(Route::level), Some(0));

        let out = sup.tick("0010").unwrap();
        assert_eq!(out.source, CommandSource::Route);
        assert_eq!(out.command, second);
        assert!(sup.route().is_some_and(Route::needs_recalc));
    }

    #[test]
    fn divergence_triggers_a_replan() {
        let mut sup = quiet(4);
        for token in ["0001", "0010", "1000", "0001"] {
            sup.tick(token).unwrap();
        }
        // The route expects "0010" next; the world disagrees.
        let out = sup.tick("0100").unwrap();
        assert_eq!(out.source, CommandSource::Route);
        let route = sup.route().unwrap();
        assert_eq!((route.curr_rule(), route.curr_ep_in_rule()), (1, 0));
        assert!(!route.needs_recalc());
    }
}
