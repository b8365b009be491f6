//! Hierarchical rule and sequence learning for the UPBOT supervisor.
//!
//! A [`supervisor::Supervisor`] receives one binary sensor token per tick,
//! induces predictive rules from the episode stream, groups rules into
//! sequences that become the entries of the next level up, and steers the
//! robot along a route toward the most recently reached goal.

#[path = "core/command.rs"]
pub mod command;

#[path = "core/config.rs"]
pub mod config;

#[path = "core/error.rs"]
pub mod error;

#[path = "core/episode.rs"]
pub mod episode;

#[path = "core/rule.rs"]
pub mod rule;

#[path = "core/sequence.rs"]
pub mod sequence;

#[path = "core/level.rs"]
pub mod level;

#[path = "core/inductor.rs"]
pub mod inductor;

#[path = "core/planner.rs"]
pub mod planner;

#[path = "core/prng.rs"]
pub mod prng;

#[path = "core/supervisor.rs"]
pub mod supervisor;

pub mod observer;

pub mod prelude {
    pub use crate::command::Command;
    pub use crate::config::SupervisorConfig;
    pub use crate::error::{ParseError, PlanError, SupervisorError};
    pub use crate::inductor::{Induction, LevelInduction, NoRuleReason, RuleUpdate};
    pub use crate::observer::{SupervisorAdapter, SupervisorSnapshot};
    pub use crate::supervisor::{CommandSource, Supervisor, TickOutcome};
}
