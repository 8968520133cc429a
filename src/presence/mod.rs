/// 在场追踪引擎 (Presence Tracking Engine)
///
/// 每帧流程: 归一化 → 台账更新 → 防抖/提醒闸门 → 离场/审计 → 统计
/// - Ledger:    在场台账
/// - Gate:      防抖与全局冷却
/// - Departure: 离场检测与审计记录
/// - Stats:     聚合统计
/// - Clock:     帧时间来源 (检测器时间或墙上时钟,运行期间不切换)
/// - Engine:    持有全部可变状态,唯一入口 `advance()`
pub mod clock;
pub mod departure;
pub mod engine;
pub mod gate;
pub mod ledger;
pub mod stats;

use chrono::{DateTime, Utc};

pub use clock::{FrameClock, TimeSource};
pub use departure::{AuditFailure, DepartureLogger, DepartureReport};
pub use engine::{FrameOutcome, PresenceEngine};
pub use gate::NotificationGate;
pub use ledger::{PresenceLedger, PresenceRecord};
pub use stats::AggregateSnapshot;

/// `from` 到 `to` 的秒数 (毫秒精度)
pub fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 1000.0
}

/// 保留两位小数
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_seconds_between() {
        let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        assert_eq!(seconds_between(t0, t0 + Duration::milliseconds(8_250)), 8.25);
        assert_eq!(seconds_between(t0 + Duration::seconds(1), t0), -1.0);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(8.004), 8.0);
        assert_eq!(round2(1.236), 1.24);
        assert_eq!(round2(0.0), 0.0);
    }
}
