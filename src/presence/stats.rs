//! 聚合统计 (Aggregate Statistics)

use crate::audit::CompletedVisit;

/// 每帧重新计算的统计快照
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AggregateSnapshot {
    /// 当前画面内人数
    pub current_count: usize,

    /// 累计访客数 = 已离场 + 当前在场
    pub total_unique_visitors: usize,

    /// 已记录访问的平均停留秒数 (无记录时为0)
    pub average_duration_seconds: f64,
}

impl AggregateSnapshot {
    pub fn compute(
        current_count: usize,
        departed_total: usize,
        completed: &[CompletedVisit],
    ) -> Self {
        let average_duration_seconds = if completed.is_empty() {
            0.0
        } else {
            completed.iter().map(|v| v.duration_seconds).sum::<f64>() / completed.len() as f64
        };

        Self {
            current_count,
            total_unique_visitors: departed_total + current_count,
            average_duration_seconds,
        }
    }

    /// 叠加显示文本
    pub fn overlay_lines(&self) -> [String; 3] {
        [
            format!("Current in Frame: {}", self.current_count),
            format!("Total Unique Visitors: {}", self.total_unique_visitors),
            format!("Avg Duration: {:.2} sec", self.average_duration_seconds),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn visit(duration_seconds: f64) -> CompletedVisit {
        let ts = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        CompletedVisit {
            identifier: 1,
            first_seen: ts,
            last_seen: ts,
            duration_seconds,
        }
    }

    #[test]
    fn test_empty_history() {
        let snapshot = AggregateSnapshot::compute(2, 0, &[]);
        assert_eq!(snapshot.current_count, 2);
        assert_eq!(snapshot.total_unique_visitors, 2);
        assert_eq!(snapshot.average_duration_seconds, 0.0);
    }

    #[test]
    fn test_average_over_completed() {
        let snapshot = AggregateSnapshot::compute(1, 3, &[visit(6.0), visit(9.0)]);
        assert_eq!(snapshot.total_unique_visitors, 4);
        assert_eq!(snapshot.average_duration_seconds, 7.5);
    }

    #[test]
    fn test_overlay_lines() {
        let snapshot = AggregateSnapshot::compute(1, 1, &[visit(8.0)]);
        assert_eq!(
            snapshot.overlay_lines(),
            [
                "Current in Frame: 1".to_string(),
                "Total Unique Visitors: 2".to_string(),
                "Avg Duration: 8.00 sec".to_string(),
            ]
        );
    }
}
