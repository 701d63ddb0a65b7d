//! Bound-size policy: expiration, age eviction and count trimming.
//!
//! Every bound is expressed as a plain command appended right after the write
//! it guards. Count bounds use negative ranks, so Redis measures the structure
//! when the command runs and each write is checked on its own.

use redstore_backend::{Command, ScoreBound};
use redstore_core::EventTime;

/// Which end of a structure holds the newest entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Order {
    /// Lists grow at the tail; sorted sets keep their highest ranks.
    #[default]
    Asc,
    /// Lists grow at the head; sorted sets keep their lowest ranks.
    Desc,
}

/// Caps on key lifetime, entry age and entry count.
///
/// `None` disables a bound. Age applies to sorted sets only, count applies to
/// sorted sets and lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoundPolicy {
    /// `EXPIRE` seconds applied after every write.
    pub key_expire: Option<u64>,
    /// Sorted-set members scored older than `now - value_expire` are removed.
    pub value_expire: Option<u64>,
    /// Maximum number of entries kept.
    pub value_length: Option<u64>,
    /// Eviction direction.
    pub order: Order,
}

impl BoundPolicy {
    /// `EXPIRE key ttl`
    pub fn expire(&self, key: &str) -> Option<Command> {
        self.key_expire.map(|seconds| Command::Expire {
            key: key.to_owned(),
            seconds,
        })
    }

    /// `ZREMRANGEBYSCORE key -inf (now - value_expire)`
    pub fn zset_age_bound(&self, key: &str, now: EventTime) -> Option<Command> {
        self.value_expire.map(|max_age| Command::ZRemRangeByScore {
            key: key.to_owned(),
            min: ScoreBound::NegInfinity,
            max: ScoreBound::Inclusive(now.saturating_sub(saturating_i64(max_age)) as f64),
        })
    }

    /// Keeps `value_length` members of a sorted set.
    ///
    /// Ascending order removes from the low-score end, descending from the
    /// high-score end.
    pub fn zset_count_bound(&self, key: &str) -> Option<Command> {
        let length = saturating_i64(self.value_length?);
        let (start, stop) = match self.order {
            Order::Asc => (0, -(length + 1)),
            Order::Desc => (length, -1),
        };
        Some(Command::ZRemRangeByRank {
            key: key.to_owned(),
            start,
            stop,
        })
    }

    /// Keeps the `value_length` most recently pushed list elements.
    pub fn list_count_bound(&self, key: &str) -> Option<Command> {
        let length = saturating_i64(self.value_length?);
        let (start, stop) = match self.order {
            Order::Asc => (-length, -1),
            Order::Desc => (0, length - 1),
        };
        Some(Command::LTrim {
            key: key.to_owned(),
            start,
            stop,
        })
    }
}

fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX - 1)
}
