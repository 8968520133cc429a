//! 防抖与提醒闸门 (Debounce & Notification Gate)
//!
//! 单个ID需持续出现 `confirmation_delay` 秒才确认;
//! 任意两次提醒之间至少间隔 `cooldown` 秒 (全局,与ID无关)

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use log::{debug, info};

use super::ledger::PresenceLedger;
use super::seconds_between;
use crate::detection::Identifier;
use crate::notify::Notification;

#[derive(Debug)]
pub struct NotificationGate {
    /// 确认延迟 (秒), 0 = 立即确认
    confirmation_delay: f64,

    /// 全局冷却 (秒)
    cooldown: f64,

    /// 上次提醒时间, None = 闸门初始打开
    last_notification: Option<DateTime<Utc>>,
}

impl NotificationGate {
    pub fn new(confirmation_delay: f64, cooldown: f64) -> Self {
        Self {
            confirmation_delay,
            cooldown,
            last_notification: None,
        }
    }

    pub fn last_notification(&self) -> Option<DateTime<Utc>> {
        self.last_notification
    }

    fn cooldown_elapsed(&self, now: DateTime<Utc>) -> bool {
        match self.last_notification {
            Some(last) => seconds_between(last, now) >= self.cooldown,
            None => true,
        }
    }

    /// 评估本帧活跃ID,按ID升序处理
    ///
    /// 每个连续在场期间最多提醒一次
    pub fn evaluate(
        &mut self,
        ledger: &mut PresenceLedger,
        active: &BTreeSet<Identifier>,
        now: DateTime<Utc>,
    ) -> Vec<Notification> {
        let mut fired = Vec::new();

        for &id in active {
            let Some(record) = ledger.get_mut(id) else {
                continue;
            };

            let age = record.age_seconds(now);
            if age < self.confirmation_delay {
                continue;
            }

            if !record.confirmed {
                record.confirmed = true;
                debug!("✅ ID:{} 已确认 (持续 {:.2}s)", id, age);
            }

            if record.notified || !self.cooldown_elapsed(now) {
                continue;
            }

            record.notified = true;
            self.last_notification = Some(now);
            info!("🔔 ID:{} 确认在场,触发提醒", id);
            fired.push(Notification::confirmed(id, self.confirmation_delay, now));
        }

        fired
    }
}
