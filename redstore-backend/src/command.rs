//! Store commands and the per-batch pipeline.
//!
//! Only the commands the mapping engine issues are modelled. Stores translate
//! each variant to exactly one Redis command.

use std::fmt;

use bytes::Bytes;

/// One end of a `ZREMRANGEBYSCORE` range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreBound {
    /// `-inf`
    NegInfinity,
    /// An inclusive score.
    Inclusive(f64),
}

impl ScoreBound {
    /// Returns `true` if `score` lies on the inner side of this bound when
    /// used as the minimum of a range.
    pub fn admits_from_below(&self, score: f64) -> bool {
        match self {
            ScoreBound::NegInfinity => true,
            ScoreBound::Inclusive(bound) => score >= *bound,
        }
    }

    /// Returns `true` if `score` lies on the inner side of this bound when
    /// used as the maximum of a range.
    pub fn admits_from_above(&self, score: f64) -> bool {
        match self {
            ScoreBound::NegInfinity => false,
            ScoreBound::Inclusive(bound) => score <= *bound,
        }
    }
}

impl fmt::Display for ScoreBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreBound::NegInfinity => f.write_str("-inf"),
            ScoreBound::Inclusive(score) => write!(f, "{score}"),
        }
    }
}

/// A single write command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `ZADD key score member`
    ZAdd {
        key: String,
        score: f64,
        member: Bytes,
    },
    /// `ZREMRANGEBYSCORE key min max`
    ZRemRangeByScore {
        key: String,
        min: ScoreBound,
        max: ScoreBound,
    },
    /// `ZREMRANGEBYRANK key start stop`
    ZRemRangeByRank { key: String, start: i64, stop: i64 },
    /// `SADD key member`
    SAdd { key: String, member: Bytes },
    /// `RPUSH key value`
    RPush { key: String, value: Bytes },
    /// `LPUSH key value`
    LPush { key: String, value: Bytes },
    /// `LREM key count value`
    LRem {
        key: String,
        count: i64,
        value: Bytes,
    },
    /// `LTRIM key start stop`
    LTrim { key: String, start: i64, stop: i64 },
    /// `SET key value`
    Set { key: String, value: Bytes },
    /// `EXPIRE key seconds`
    Expire { key: String, seconds: u64 },
    /// `PUBLISH channel message`
    Publish { channel: String, message: Bytes },
}

impl Command {
    /// Redis command name.
    pub fn name(&self) -> &'static str {
        match self {
            Command::ZAdd { .. } => "ZADD",
            Command::ZRemRangeByScore { .. } => "ZREMRANGEBYSCORE",
            Command::ZRemRangeByRank { .. } => "ZREMRANGEBYRANK",
            Command::SAdd { .. } => "SADD",
            Command::RPush { .. } => "RPUSH",
            Command::LPush { .. } => "LPUSH",
            Command::LRem { .. } => "LREM",
            Command::LTrim { .. } => "LTRIM",
            Command::Set { .. } => "SET",
            Command::Expire { .. } => "EXPIRE",
            Command::Publish { .. } => "PUBLISH",
        }
    }

    /// The key (or channel) the command targets.
    pub fn key(&self) -> &str {
        match self {
            Command::ZAdd { key, .. }
            | Command::ZRemRangeByScore { key, .. }
            | Command::ZRemRangeByRank { key, .. }
            | Command::SAdd { key, .. }
            | Command::RPush { key, .. }
            | Command::LPush { key, .. }
            | Command::LRem { key, .. }
            | Command::LTrim { key, .. }
            | Command::Set { key, .. }
            | Command::Expire { key, .. } => key,
            Command::Publish { channel, .. } => channel,
        }
    }
}

/// Commands collected for one batch, sent to the store as a single round trip.
///
/// Order is preserved: later trims and duplicate removals depend on earlier
/// writes to the same key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    commands: Vec<Command>,
}

impl Pipeline {
    /// Creates an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a command.
    pub fn push(&mut self, command: Command) -> &mut Self {
        self.commands.push(command);
        self
    }

    /// Appends a command when there is one.
    pub fn push_opt(&mut self, command: Option<Command>) -> &mut Self {
        if let Some(command) = command {
            self.commands.push(command);
        }
        self
    }

    /// Number of queued commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` if no command is queued.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Queued commands in order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }
}

impl IntoIterator for Pipeline {
    type Item = Command;
    type IntoIter = std::vec::IntoIter<Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.into_iter()
    }
}

impl<'a> IntoIterator for &'a Pipeline {
    type Item = &'a Command;
    type IntoIter = std::slice::Iter<'a, Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}
