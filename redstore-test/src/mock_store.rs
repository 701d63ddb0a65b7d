use std::collections::{BTreeSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use redstore_backend::{Command, Pipeline, ScoreBound, Store, StoreError, StoreResult};

/// A value held under one key.
#[derive(Debug, Clone, PartialEq)]
pub enum Stored {
    String(Bytes),
    Set(BTreeSet<Bytes>),
    List(VecDeque<Bytes>),
    /// Members ordered by `(score, member)`, like Redis.
    ZSet(Vec<(Bytes, f64)>),
}

/// In-memory store emulating the Redis semantics of every [`Command`].
///
/// Commands against a key of another type are ignored, as their replies would
/// be by a real pipeline.
#[derive(Clone, Debug, Default)]
pub struct MockStore {
    pub data: Arc<DashMap<String, Stored>>,
    pub expirations: Arc<DashMap<String, u64>>,
    published: Arc<Mutex<Vec<(String, Bytes)>>>,
    commands: Arc<Mutex<Vec<Command>>>,
    execute_count: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every `execute` fails with a connection error.
    pub fn failing() -> Self {
        let store = Self::new();
        store.set_failing(true);
        store
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of pipelines received.
    pub fn execute_count(&self) -> usize {
        self.execute_count.load(Ordering::SeqCst)
    }

    /// Every command received, in order.
    pub fn commands(&self) -> Vec<Command> {
        self.commands.lock().unwrap().clone()
    }

    /// Every `(channel, message)` published, in order.
    pub fn published(&self) -> Vec<(String, Bytes)> {
        self.published.lock().unwrap().clone()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn ttl(&self, key: &str) -> Option<u64> {
        self.expirations.get(key).map(|ttl| *ttl)
    }

    pub fn string(&self, key: &str) -> Option<Bytes> {
        match self.data.get(key).as_deref() {
            Some(Stored::String(value)) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn set_members(&self, key: &str) -> Vec<Bytes> {
        match self.data.get(key).as_deref() {
            Some(Stored::Set(members)) => members.iter().cloned().collect(),
            _ => Vec::new(),
        }
    }

    pub fn list(&self, key: &str) -> Vec<Bytes> {
        match self.data.get(key).as_deref() {
            Some(Stored::List(values)) => values.iter().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// Members with their scores, lowest rank first.
    pub fn zset(&self, key: &str) -> Vec<(Bytes, f64)> {
        match self.data.get(key).as_deref() {
            Some(Stored::ZSet(members)) => members.clone(),
            _ => Vec::new(),
        }
    }

    /// Seeds a key, bypassing the command log.
    pub fn insert(&self, key: impl Into<String>, value: Stored) {
        self.data.insert(key.into(), value);
    }

    pub fn apply(&self, command: &Command) {
        match command {
            Command::ZAdd { key, score, member } => {
                let mut entry = self
                    .data
                    .entry(key.clone())
                    .or_insert_with(|| Stored::ZSet(Vec::new()));
                if let Stored::ZSet(members) = entry.value_mut() {
                    members.retain(|(existing, _)| existing != member);
                    members.push((member.clone(), *score));
                    members.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
                }
            }
            Command::ZRemRangeByScore { key, min, max } => {
                self.modify(key, |stored| {
                    if let Stored::ZSet(members) = stored {
                        members.retain(|(_, score)| !in_score_range(*score, min, max));
                    }
                });
            }
            Command::ZRemRangeByRank { key, start, stop } => {
                self.modify(key, |stored| {
                    if let Stored::ZSet(members) = stored
                        && let Some(range) = rank_range(members.len(), *start, *stop)
                    {
                        members.drain(range);
                    }
                });
            }
            Command::SAdd { key, member } => {
                let mut entry = self
                    .data
                    .entry(key.clone())
                    .or_insert_with(|| Stored::Set(BTreeSet::new()));
                if let Stored::Set(members) = entry.value_mut() {
                    members.insert(member.clone());
                }
            }
            Command::RPush { key, value } => self.push(key, value, false),
            Command::LPush { key, value } => self.push(key, value, true),
            Command::LRem { key, count, value } => {
                self.modify(key, |stored| {
                    if let Stored::List(values) = stored {
                        remove_occurrences(values, *count, value);
                    }
                });
            }
            Command::LTrim { key, start, stop } => {
                self.modify(key, |stored| {
                    if let Stored::List(values) = stored {
                        let kept = match rank_range(values.len(), *start, *stop) {
                            Some(range) => values.drain(range).collect(),
                            None => VecDeque::new(),
                        };
                        *values = kept;
                    }
                });
            }
            Command::Set { key, value } => {
                self.data.insert(key.clone(), Stored::String(value.clone()));
                self.expirations.remove(key);
            }
            Command::Expire { key, seconds } => {
                if self.data.contains_key(key) {
                    self.expirations.insert(key.clone(), *seconds);
                }
            }
            Command::Publish { channel, message } => {
                self.published
                    .lock()
                    .unwrap()
                    .push((channel.clone(), message.clone()));
            }
        }
    }

    fn push(&self, key: &str, value: &Bytes, head: bool) {
        let mut entry = self
            .data
            .entry(key.to_owned())
            .or_insert_with(|| Stored::List(VecDeque::new()));
        if let Stored::List(values) = entry.value_mut() {
            if head {
                values.push_front(value.clone());
            } else {
                values.push_back(value.clone());
            }
        }
    }

    /// Runs `f` on an existing key and deletes the key once it is empty.
    fn modify(&self, key: &str, f: impl FnOnce(&mut Stored)) {
        let empty = match self.data.get_mut(key) {
            Some(mut stored) => {
                f(stored.value_mut());
                stored.is_empty()
            }
            None => return,
        };
        if empty {
            self.data.remove(key);
            self.expirations.remove(key);
        }
    }
}

impl Stored {
    fn is_empty(&self) -> bool {
        match self {
            Stored::String(_) => false,
            Stored::Set(members) => members.is_empty(),
            Stored::List(values) => values.is_empty(),
            Stored::ZSet(members) => members.is_empty(),
        }
    }
}

fn in_score_range(score: f64, min: &ScoreBound, max: &ScoreBound) -> bool {
    min.admits_from_below(score) && max.admits_from_above(score)
}

/// Resolves Redis `start`/`stop` indexes, negative ones counting from the end.
pub fn rank_range(len: usize, start: i64, stop: i64) -> Option<std::ops::RangeInclusive<usize>> {
    let len = i64::try_from(len).ok()?;
    let start = if start < 0 { (start + len).max(0) } else { start };
    let stop = if stop < 0 { stop + len } else { stop.min(len - 1) };
    if start > stop || start >= len {
        return None;
    }
    Some(start as usize..=stop as usize)
}

fn remove_occurrences(values: &mut VecDeque<Bytes>, count: i64, value: &Bytes) {
    let limit = match count {
        0 => usize::MAX,
        count => usize::try_from(count.unsigned_abs()).unwrap_or(usize::MAX),
    };
    let positions: Vec<usize> = if count < 0 {
        values
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, existing)| *existing == value)
            .map(|(index, _)| index)
            .take(limit)
            .collect()
    } else {
        values
            .iter()
            .enumerate()
            .filter(|(_, existing)| *existing == value)
            .map(|(index, _)| index)
            .take(limit)
            .collect()
    };
    let mut positions = positions;
    positions.sort_unstable_by(|a, b| b.cmp(a));
    for index in positions {
        values.remove(index);
    }
}

#[async_trait]
impl Store for MockStore {
    async fn execute(&self, pipeline: Pipeline) -> StoreResult<()> {
        self.execute_count.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::ConnectionError(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "mock store is down",
            ))));
        }

        for command in &pipeline {
            self.apply(command);
        }
        self.commands.lock().unwrap().extend(pipeline);
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
