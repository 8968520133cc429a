// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
pub mod audit; // 审计日志
pub mod config; // 在场追踪配置参数
pub mod detection; // 检测边界与面积过滤
pub mod error;
pub mod notify; // 提醒与屏幕提示
pub mod presence; // 在场追踪引擎

pub use crate::audit::{AuditSink, CompletedVisit, CsvAuditLog, MemoryAuditLog};
pub use crate::config::{Mode, SentinelConfig};
pub use crate::detection::{BBox, FrameDetections, FrameNormalizer, Identifier, RawDetection};
pub use crate::error::{Result, SentinelError};
pub use crate::notify::{ChimeNotifier, MessageBoard, Notification, Notifier, SilentNotifier};
pub use crate::presence::{
    AggregateSnapshot, FrameClock, FrameOutcome, PresenceEngine, TimeSource,
};

/// Unix秒 → UTC时间
pub fn timestamp_from_secs(secs: f64) -> Option<chrono::DateTime<chrono::Utc>> {
    use chrono::TimeZone;

    if !secs.is_finite() {
        return None;
    }
    let millis = (secs * 1000.0).round() as i64;
    chrono::Utc.timestamp_millis_opt(millis).single()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_from_secs() {
        let ts = timestamp_from_secs(1_700_000_000.25).unwrap();
        assert_eq!(ts.timestamp_millis(), 1_700_000_000_250);
        assert!(timestamp_from_secs(f64::NAN).is_none());
    }
}
