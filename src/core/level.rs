use crate::episode::{Episode, LevelEntry};
use crate::rule::{Cousins, CousinsId, Rule, RuleId};
use crate::sequence::SequenceTable;

/// Everything learned at one abstraction level: the append-only episode
/// store, the rule and cousins arenas, and the sequence table.
#[derive(Debug, Clone)]
pub struct Level {
    pub(crate) depth: usize,
    pub(crate) entries: Vec<LevelEntry>,
    pub(crate) rules: Vec<Rule>,
    pub(crate) cousins: Vec<Cousins>,
    pub(crate) sequences: SequenceTable,
}

impl Level {
    pub fn new(depth: usize) -> Self {
        Self {
            depth,
            entries: Vec::new(),
            rules: Vec::new(),
            cousins: Vec::new(),
            sequences: SequenceTable::new(),
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn entries(&self) -> &[LevelEntry] {
        &self.entries
    }

    pub fn entry(&self, idx: usize) -> Option<&LevelEntry> {
        self.entries.get(idx)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(id)
    }

    pub fn cousins(&self) -> &[Cousins] {
        &self.cousins
    }

    pub fn cousin_group(&self, id: CousinsId) -> Option<&Cousins> {
        self.cousins.get(id)
    }

    pub fn sequences(&self) -> &SequenceTable {
        &self.sequences
    }

    pub(crate) fn push_entry(&mut self, entry: LevelEntry) {
        self.entries.push(entry);
    }
}

/// The stack of levels, from raw episodes (level 0) up to `max_depth - 1`.
#[derive(Debug, Clone)]
pub struct Hierarchy {
    pub(crate) levels: Vec<Level>,
    pub(crate) max_lhs_len: usize,
}

impl Hierarchy {
    pub fn new(max_depth: usize, max_lhs_len: usize) -> Self {
        Self {
            levels: (0..max_depth.max(1)).map(Level::new).collect(),
            max_lhs_len: max_lhs_len.max(1),
        }
    }

    pub fn max_depth(&self) -> usize {
        self.levels.len()
    }

    pub fn max_lhs_len(&self) -> usize {
        self.max_lhs_len
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn level(&self, depth: usize) -> Option<&Level> {
        self.levels.get(depth)
    }

    /// Append a raw episode to level 0. Call `update_rules` afterwards.
    pub fn push_episode(&mut self, ep: Episode) {
        self.levels[0].push_entry(LevelEntry::Episode(ep));
    }

    pub fn episode_count(&self) -> usize {
        self.levels[0].entries.len()
    }

    pub fn episode(&self, idx: usize) -> Option<&Episode> {
        self.levels[0].entry(idx).and_then(LevelEntry::as_episode)
    }

    pub fn newest_episode(&self) -> Option<&Episode> {
        self.levels[0].entries.last().and_then(LevelEntry::as_episode)
    }

    /// Returns `false` if there is no episode or its command was already set.
    pub(crate) fn assign_newest_command(&mut self, cmd: crate::command::Command) -> bool {
        match self.levels[0].entries.last_mut() {
            Some(LevelEntry::Episode(ep)) => ep.assign_command(cmd),
            _ => false,
        }
    }
}
