//! 离场检测与审计记录 (Departure & Audit Logger)
//!
//! 上一帧活跃、本帧缺席的ID视为离场:
//! 计算停留时长,达到最短记录时长才写入审计日志,台账记录无论如何都移除

use std::collections::BTreeSet;

use log::{debug, info, warn};

use super::ledger::PresenceLedger;
use super::round2;
use crate::audit::{AuditSink, CompletedVisit};
use crate::detection::Identifier;
use crate::error::SentinelError;

/// 一次审计写入失败 (记录仍计入统计)
#[derive(Debug)]
pub struct AuditFailure {
    pub visit: CompletedVisit,
    pub error: SentinelError,
}

/// 单次对账结果
#[derive(Debug, Default)]
pub struct DepartureReport {
    /// 达到最短时长的访问 (含写入失败的)
    pub completed: Vec<CompletedVisit>,

    /// 因停留过短未记录的ID
    pub filtered: Vec<Identifier>,

    pub failures: Vec<AuditFailure>,
}

pub struct DepartureLogger {
    /// 最短记录时长 (秒), 0 = 全部记录
    min_log_duration: f64,
    sink: Box<dyn AuditSink>,

    /// 内存中的全部已完成访问 (统计用,不回读审计文件)
    completed: Vec<CompletedVisit>,

    /// 累计离场ID数 (含未记录的短暂停留)
    departed_total: usize,
}

impl DepartureLogger {
    pub fn new(min_log_duration: f64, sink: Box<dyn AuditSink>) -> Self {
        Self {
            min_log_duration,
            sink,
            completed: Vec::new(),
            departed_total: 0,
        }
    }

    /// 对比上一帧与本帧活跃集合,处理离场ID (按ID升序)
    pub fn reconcile(
        &mut self,
        ledger: &mut PresenceLedger,
        previous: &BTreeSet<Identifier>,
        active: &BTreeSet<Identifier>,
    ) -> DepartureReport {
        let mut report = DepartureReport::default();

        for &id in previous.difference(active) {
            let Some(record) = ledger.remove(id) else {
                continue;
            };
            self.departed_total += 1;

            let duration = round2(record.dwell_seconds());
            if duration < self.min_log_duration {
                debug!("🚪 ID:{} 停留 {:.2}s,低于记录阈值", id, duration);
                report.filtered.push(id);
                continue;
            }

            let visit = CompletedVisit {
                identifier: id,
                first_seen: record.first_seen,
                last_seen: record.last_seen,
                duration_seconds: duration,
            };

            match self.sink.append(&visit) {
                Ok(()) => info!("🚪 ID:{} 离场,停留 {:.2}s", id, duration),
                Err(error) => {
                    warn!("⚠️  ID:{} 审计写入失败 (继续运行): {}", id, error);
                    report.failures.push(AuditFailure {
                        visit: visit.clone(),
                        error,
                    });
                }
            }

            self.completed.push(visit.clone());
            report.completed.push(visit);
        }

        report
    }

    /// 内存中的已完成访问
    pub fn completed(&self) -> &[CompletedVisit] {
        &self.completed
    }

    pub fn departed_total(&self) -> usize {
        self.departed_total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditLog;
    use crate::error::Result;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::milliseconds(millis)
    }

    fn ids(v: &[Identifier]) -> BTreeSet<Identifier> {
        v.iter().copied().collect()
    }

    struct BrokenSink;

    impl AuditSink for BrokenSink {
        fn append(&mut self, _visit: &CompletedVisit) -> Result<()> {
            Err(SentinelError::AuditWriterClosed)
        }
    }

    #[test]
    fn test_departure_logged_with_duration() {
        let log = MemoryAuditLog::new();
        let mut logger = DepartureLogger::new(5.0, Box::new(log.clone()));
        let mut ledger = PresenceLedger::new();

        ledger.update(&ids(&[7]), t(0));
        let previous = ledger.update(&ids(&[7]), t(8_000));
        let active = ledger.update(&ids(&[]), t(8_500));
        let report = logger.reconcile(&mut ledger, &previous, &active);

        assert_eq!(report.completed.len(), 1);
        assert_eq!(report.completed[0].duration_seconds, 8.0);
        assert_eq!(log.visits(), report.completed);
        assert!(ledger.is_empty());
        assert_eq!(logger.departed_total(), 1);
    }

    #[test]
    fn test_short_visit_filtered_but_removed() {
        let log = MemoryAuditLog::new();
        let mut logger = DepartureLogger::new(5.0, Box::new(log.clone()));
        let mut ledger = PresenceLedger::new();

        let previous = ledger.update(&ids(&[3]), t(0));
        ledger.update(&previous, t(2_000));
        let active = ledger.update(&ids(&[]), t(2_100));
        let report = logger.reconcile(&mut ledger, &previous, &active);

        assert!(report.completed.is_empty());
        assert_eq!(report.filtered, vec![3]);
        assert!(log.visits().is_empty());
        assert!(!ledger.contains(3));
        assert_eq!(logger.departed_total(), 1);
        assert!(logger.completed().is_empty());
    }

    #[test]
    fn test_write_failure_still_counted() {
        let mut logger = DepartureLogger::new(0.0, Box::new(BrokenSink));
        let mut ledger = PresenceLedger::new();

        let previous = ledger.update(&ids(&[1, 2]), t(0));
        let active = ledger.update(&ids(&[2]), t(1_000));
        let report = logger.reconcile(&mut ledger, &previous, &active);

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].visit.identifier, 1);
        assert_eq!(logger.completed().len(), 1);
        assert!(ledger.contains(2));
    }

    #[test]
    fn test_duration_rounded_to_two_decimals() {
        let log = MemoryAuditLog::new();
        let mut logger = DepartureLogger::new(0.0, Box::new(log.clone()));
        let mut ledger = PresenceLedger::new();

        let previous = ledger.update(&ids(&[5]), t(0));
        ledger.update(&previous, t(1_237));
        let active = ledger.update(&ids(&[]), t(2_000));
        logger.reconcile(&mut ledger, &previous, &active);

        assert_eq!(log.visits()[0].duration_seconds, 1.24);
    }
}
