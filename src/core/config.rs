use crate::command::Command;

#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Width of the sensor vector carried by every episode.
    pub num_sensors: usize,

    /// Position of the goal indicator inside the sensor vector.
    pub goal_sensor: usize,

    /// Longest LHS window a rule may grow to while disambiguating.
    pub max_lhs_len: usize,

    /// Number of abstraction levels (level 0 holds raw episodes).
    pub max_depth: usize,

    // Epsilon-greedy exploration.
    pub initial_rand_chance: f32,
    pub rand_decay: f32,
    pub min_rand_chance: f32,

    /// Pool for exploratory and fallback actions.
    pub legal_actions: Vec<Command>,

    // If set, makes exploration reproducible for evaluation.
    pub seed: Option<u64>,
}

impl Default for SupervisorConfig {
    /// Matches the Roomba sensor packet: ten binary sensors, IR (goal) first.
    fn default() -> Self {
        Self {
            num_sensors: 10,
            goal_sensor: 0,
            max_lhs_len: 4,
            max_depth: 3,
            initial_rand_chance: 0.8,
            rand_decay: 0.9,
            min_rand_chance: 0.05,
            legal_actions: Command::MOBILE.to_vec(),
            seed: None,
        }
    }
}

impl SupervisorConfig {
    /// Sensor vectors are packed into a `u64`.
    pub const MAX_SENSORS: usize = 64;
    pub const MAX_DEPTH: usize = 16;

    pub fn with_sensors(num_sensors: usize, goal_sensor: usize) -> Self {
        Self {
            num_sensors,
            goal_sensor,
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_lhs_len(mut self, len: usize) -> Self {
        self.max_lhs_len = len;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_rand_chance(mut self, chance: f32) -> Self {
        self.initial_rand_chance = chance;
        self
    }

    pub fn with_legal_actions(mut self, actions: &[Command]) -> Self {
        self.legal_actions = actions.to_vec();
        self
    }

    /// Validate the configuration, returning an error message if invalid.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.num_sensors == 0 {
            return Err("num_sensors must be >= 1");
        }
        if self.num_sensors > Self::MAX_SENSORS {
            return Err("num_sensors must be <= 64");
        }
        if self.goal_sensor >= self.num_sensors {
            return Err("goal_sensor must index into the sensor vector");
        }
        if self.max_lhs_len == 0 {
            return Err("max_lhs_len must be >= 1");
        }
        if self.max_depth == 0 || self.max_depth > Self::MAX_DEPTH {
            return Err("max_depth must be in [1, 16]");
        }
        if !(0.0..=1.0).contains(&self.initial_rand_chance) {
            return Err("initial_rand_chance must be in [0, 1]");
        }
        if !(self.rand_decay > 0.0 && self.rand_decay <= 1.0) {
            return Err("rand_decay must be in (0, 1]");
        }
        if !(0.0..=1.0).contains(&self.min_rand_chance) {
            return Err("min_rand_chance must be in [0, 1]");
        }
        if self.legal_actions.is_empty() {
            return Err("legal_actions must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = SupervisorConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.num_sensors, 10);
        assert_eq!(cfg.goal_sensor, 0);
    }

    #[test]
    fn goal_sensor_must_be_in_range() {
        let cfg = SupervisorConfig::with_sensors(4, 4);
        assert_eq!(
            cfg.validate(),
            Err("goal_sensor must index into the sensor vector")
        );
    }

    #[test]
    fn rejects_degenerate_limits() {
        assert!(SupervisorConfig::default().with_max_lhs_len(0).validate().is_err());
        assert!(SupervisorConfig::default().with_max_depth(0).validate().is_err());
        assert!(SupervisorConfig::with_sensors(65, 0).validate().is_err());
        assert!(SupervisorConfig::default()
            .with_legal_actions(&[])
            .validate()
            .is_err());
        assert!(SupervisorConfig::default()
            .with_rand_chance(1.5)
            .validate()
            .is_err());
    }
}
