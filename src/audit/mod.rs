/// 审计日志 (Audit Log)
///
/// 只追加的访问记录,一次完成的访问写一行
/// - CsvAuditLog: CSV文件 + 独立写入线程 (有界超时)
/// - MemoryAuditLog: 内存记录,用于嵌入与测试
pub mod csv_log;

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Local, Utc};

use crate::detection::Identifier;
use crate::error::Result;

pub use csv_log::{CsvAuditLog, AUDIT_HEADER};

/// 一次完成的访问 (创建后不可修改)
#[derive(Clone, Debug, PartialEq)]
pub struct CompletedVisit {
    pub identifier: Identifier,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,

    /// 停留秒数,保留两位小数
    pub duration_seconds: f64,
}

/// 审计输出接口
pub trait AuditSink: Send {
    /// 追加一条记录,返回前应已落盘 (或超时)
    fn append(&mut self, visit: &CompletedVisit) -> Result<()>;
}

/// 本地时间格式 `YYYY-MM-DD HH:MM:SS`
pub fn format_local(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// 内存审计记录,克隆后共享同一份数据
#[derive(Clone, Debug, Default)]
pub struct MemoryAuditLog {
    visits: Arc<Mutex<Vec<CompletedVisit>>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visits(&self) -> Vec<CompletedVisit> {
        self.visits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AuditSink for MemoryAuditLog {
    fn append(&mut self, visit: &CompletedVisit) -> Result<()> {
        self.visits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(visit.clone());
        Ok(())
    }
}
