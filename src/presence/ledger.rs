//! 在场台账 (Presence Ledger)
//! 每个被追踪ID的首次/最近出现时间与确认状态

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use log::debug;

use super::seconds_between;
use crate::detection::Identifier;

/// 在场记录 (每个活跃ID一条)
#[derive(Clone, Debug, PartialEq)]
pub struct PresenceRecord {
    pub identifier: Identifier,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,

    /// 已通过防抖确认
    pub confirmed: bool,

    /// 本次连续在场期间已提醒
    pub notified: bool,
}

impl PresenceRecord {
    fn new(identifier: Identifier, now: DateTime<Utc>) -> Self {
        Self {
            identifier,
            first_seen: now,
            last_seen: now,
            confirmed: false,
            notified: false,
        }
    }

    /// 从首次出现到 `now` 的秒数
    pub fn age_seconds(&self, now: DateTime<Utc>) -> f64 {
        seconds_between(self.first_seen, now)
    }

    /// 首次到最近出现的停留秒数
    pub fn dwell_seconds(&self) -> f64 {
        seconds_between(self.first_seen, self.last_seen)
    }
}

/// 在场台账,ID唯一
#[derive(Debug, Default)]
pub struct PresenceLedger {
    records: BTreeMap<Identifier, PresenceRecord>,
}

impl PresenceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// 用本帧候选ID更新台账
    ///
    /// 新ID建档,已有ID刷新 `last_seen`;缺席的ID不在这里移除
    pub fn update(
        &mut self,
        candidates: &BTreeSet<Identifier>,
        now: DateTime<Utc>,
    ) -> BTreeSet<Identifier> {
        for &id in candidates {
            match self.records.get_mut(&id) {
                Some(record) => {
                    // 时钟回拨时保持 last_seen >= first_seen
                    if now > record.last_seen {
                        record.last_seen = now;
                    }
                }
                None => {
                    debug!("🚶 新目标 ID:{}", id);
                    self.records.insert(id, PresenceRecord::new(id, now));
                }
            }
        }

        candidates.clone()
    }

    pub fn get(&self, id: Identifier) -> Option<&PresenceRecord> {
        self.records.get(&id)
    }

    pub fn get_mut(&mut self, id: Identifier) -> Option<&mut PresenceRecord> {
        self.records.get_mut(&id)
    }

    pub fn remove(&mut self, id: Identifier) -> Option<PresenceRecord> {
        self.records.remove(&id)
    }

    pub fn contains(&self, id: Identifier) -> bool {
        self.records.contains_key(&id)
    }

    /// 当前追踪的ID (升序)
    pub fn tracked_ids(&self) -> BTreeSet<Identifier> {
        self.records.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PresenceRecord> {
        self.records.values()
    }
}
