//! 在场追踪引擎
//!
//! 由外部帧循环每帧调用一次 `advance()`, 严格顺序执行

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use log::info;

use super::departure::{AuditFailure, DepartureLogger};
use super::gate::NotificationGate;
use super::ledger::PresenceLedger;
use super::stats::AggregateSnapshot;
use crate::audit::{format_local, AuditSink, CompletedVisit};
use crate::config::SentinelConfig;
use crate::detection::{FrameDetections, FrameNormalizer, Identifier};
use crate::error::Result;
use crate::notify::{Notification, Notifier};

/// 单帧处理结果 (交给渲染/显示)
#[derive(Debug, Default)]
pub struct FrameOutcome {
    pub snapshot: AggregateSnapshot,
    pub notifications: Vec<Notification>,
    pub completed: Vec<CompletedVisit>,
    pub audit_failures: Vec<AuditFailure>,
}

pub struct PresenceEngine {
    normalizer: FrameNormalizer,
    ledger: PresenceLedger,
    gate: NotificationGate,
    departures: DepartureLogger,
    notifier: Box<dyn Notifier>,

    /// 上一帧活跃ID
    previous_active: BTreeSet<Identifier>,
    frame_count: u64,
}

impl PresenceEngine {
    /// 创建引擎,配置非法时立即失败
    pub fn new(
        config: &SentinelConfig,
        sink: Box<dyn AuditSink>,
        notifier: Box<dyn Notifier>,
    ) -> Result<Self> {
        config.validate()?;

        info!(
            "🚀 在场追踪引擎启动 | 模式 {:?} | 面积比例 {:.3} | 确认 {}s | 冷却 {}s | 记录阈值 {}s",
            config.mode,
            config.min_area_ratio,
            config.confirmation_delay_seconds,
            config.global_cooldown_seconds,
            config.min_log_duration_seconds
        );

        Ok(Self {
            normalizer: FrameNormalizer::new(
                config.min_area_ratio,
                config.tracked_classes.clone(),
            ),
            ledger: PresenceLedger::new(),
            gate: NotificationGate::new(
                config.confirmation_delay_seconds,
                config.global_cooldown_seconds,
            ),
            departures: DepartureLogger::new(config.min_log_duration_seconds, sink),
            notifier,
            previous_active: BTreeSet::new(),
            frame_count: 0,
        })
    }

    /// 处理一帧检测结果
    ///
    /// 空检测帧是合法输入,上一帧的所有目标都会离场;
    /// 采集失败的帧不应调用本函数
    pub fn advance(&mut self, frame: &FrameDetections, now: DateTime<Utc>) -> FrameOutcome {
        // 1. 面积过滤
        let candidates = self.normalizer.candidate_ids(frame);

        // 2. 台账更新
        let active = self.ledger.update(&candidates, now);

        // 3. 防抖 + 全局冷却
        let notifications = self.gate.evaluate(&mut self.ledger, &active, now);
        for notification in &notifications {
            self.notifier.notify(notification);
        }

        // 4. 离场对账
        let report = self
            .departures
            .reconcile(&mut self.ledger, &self.previous_active, &active);
        self.previous_active = active;
        self.frame_count += 1;

        // 5. 统计
        FrameOutcome {
            snapshot: self.snapshot(),
            notifications,
            completed: report.completed,
            audit_failures: report.failures,
        }
    }

    /// 关闭时结算所有仍在场的目标,保证进行中的访问不丢失
    pub fn shutdown(&mut self, now: DateTime<Utc>) -> FrameOutcome {
        let remaining = self.ledger.tracked_ids();
        info!(
            "🛑 引擎关闭 ({}) | 共处理 {} 帧 | 结算 {} 个在场目标",
            format_local(&now),
            self.frame_count,
            remaining.len()
        );

        let report = self
            .departures
            .reconcile(&mut self.ledger, &remaining, &BTreeSet::new());
        self.previous_active.clear();

        FrameOutcome {
            snapshot: self.snapshot(),
            notifications: Vec::new(),
            completed: report.completed,
            audit_failures: report.failures,
        }
    }

    pub fn snapshot(&self) -> AggregateSnapshot {
        AggregateSnapshot::compute(
            self.ledger.len(),
            self.departures.departed_total(),
            self.departures.completed(),
        )
    }

    pub fn ledger(&self) -> &PresenceLedger {
        &self.ledger
    }

    pub fn completed_visits(&self) -> &[CompletedVisit] {
        self.departures.completed()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}
