/// 提醒系统 (Notification System)
///
/// 引擎只决定何时提醒,播放由外部完成且不阻塞帧循环
/// - Chime: 双音提示音播放线程
/// - Board: 屏幕提示 (定时过期)
pub mod board;
pub mod chime;

use chrono::{DateTime, Utc};

use crate::detection::Identifier;

pub use board::MessageBoard;
pub use chime::{ChimeNotifier, Tone, CHIME};

/// 提醒事件
#[derive(Clone, Debug, PartialEq)]
pub struct Notification {
    pub identifier: Identifier,
    pub message: String,
    pub emitted_at: DateTime<Utc>,
}

impl Notification {
    pub fn confirmed(identifier: Identifier, delay_seconds: f64, emitted_at: DateTime<Utc>) -> Self {
        Self {
            identifier,
            message: format!("Person {} confirmed after {} sec.", identifier, delay_seconds),
            emitted_at,
        }
    }
}

/// 提醒播放接口
///
/// 实现必须立即返回;播放失败在实现内部吞掉
pub trait Notifier: Send {
    fn notify(&self, notification: &Notification);
}

/// 不播放任何声音
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, _notification: &Notification) {}
}
