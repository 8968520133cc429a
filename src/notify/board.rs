//! 屏幕提示板 - 每条提示显示固定时长后过期

use chrono::{DateTime, Utc};

use super::Notification;
use crate::presence::seconds_between;

#[derive(Debug)]
pub struct MessageBoard {
    /// 显示时长 (秒)
    duration_seconds: f64,
    messages: Vec<(String, DateTime<Utc>)>,
}

impl MessageBoard {
    pub fn new(duration_seconds: f64) -> Self {
        Self {
            duration_seconds,
            messages: Vec::new(),
        }
    }

    pub fn push(&mut self, notification: &Notification) {
        self.messages
            .push((notification.message.clone(), notification.emitted_at));
    }

    /// 当前仍在显示期内的提示 (按发出顺序),同时清理过期提示
    pub fn active(&mut self, now: DateTime<Utc>) -> Vec<&str> {
        let duration = self.duration_seconds;
        self.messages
            .retain(|(_, ts)| seconds_between(*ts, now) < duration);
        self.messages.iter().map(|(msg, _)| msg.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
