//! CSV审计日志
//!
//! 写入在独立线程完成,调用方最多等待 `timeout`

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, SendTimeoutError, Sender};
use log::{debug, error, info, warn};

use super::{format_local, AuditSink, CompletedVisit};
use crate::error::{Result, SentinelError};

/// CSV表头
pub const AUDIT_HEADER: [&str; 4] = ["Person_ID", "First_Seen", "Last_Seen", "Duration_sec"];

/// 写入请求: 记录 + 回执通道
type WriteRequest = (CompletedVisit, Sender<Result<()>>);

pub struct CsvAuditLog {
    path: PathBuf,
    timeout: Duration,
    tx: Option<Sender<WriteRequest>>,
    handle: Option<JoinHandle<()>>,
    /// 写入线程退出时断开
    done: Receiver<()>,
}

impl CsvAuditLog {
    /// 打开 (或创建) 审计文件
    ///
    /// 文件不存在或为空时写入表头,已有内容只追加
    pub fn open(path: impl AsRef<Path>, timeout: Duration) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let needs_header = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if needs_header {
            writer.write_record(AUDIT_HEADER)?;
            writer.flush()?;
            info!("📝 创建审计日志 {}", path.display());
        } else {
            info!("📝 追加到已有审计日志 {}", path.display());
        }

        let (tx, rx) = bounded::<WriteRequest>(64);
        let (done_tx, done) = bounded::<()>(1);
        let handle = thread::Builder::new()
            .name("audit-writer".into())
            .spawn(move || {
                Self::run(writer, rx);
                drop(done_tx);
            })?;

        Ok(Self {
            path,
            timeout,
            tx: Some(tx),
            handle: Some(handle),
            done,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 写入线程: 逐条写入并刷盘后回执
    fn run(mut writer: csv::Writer<File>, rx: Receiver<WriteRequest>) {
        while let Ok((visit, ack)) = rx.recv() {
            let result = write_row(&mut writer, &visit);
            if let Err(e) = &result {
                error!("❌ 审计写入失败 ID:{}: {}", visit.identifier, e);
            }
            // 调用方可能已超时离开
            let _ = ack.send(result);
        }
        debug!("审计写入线程退出");
    }
}

fn write_row(writer: &mut csv::Writer<File>, visit: &CompletedVisit) -> Result<()> {
    writer.write_record([
        visit.identifier.to_string(),
        format_local(&visit.first_seen),
        format_local(&visit.last_seen),
        format!("{:.2}", visit.duration_seconds),
    ])?;
    writer.flush()?;
    Ok(())
}

impl AuditSink for CsvAuditLog {
    fn append(&mut self, visit: &CompletedVisit) -> Result<()> {
        let tx = self.tx.as_ref().ok_or(SentinelError::AuditWriterClosed)?;
        let timeout_err = || SentinelError::AuditTimeout {
            identifier: visit.identifier,
            timeout_ms: self.timeout.as_millis() as u64,
        };

        let (ack_tx, ack_rx) = bounded(1);
        match tx.send_timeout((visit.clone(), ack_tx), self.timeout) {
            Ok(()) => {}
            Err(SendTimeoutError::Timeout(_)) => return Err(timeout_err()),
            Err(SendTimeoutError::Disconnected(_)) => return Err(SentinelError::AuditWriterClosed),
        }

        match ack_rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(timeout_err()),
            Err(RecvTimeoutError::Disconnected) => Err(SentinelError::AuditWriterClosed),
        }
    }
}

impl Drop for CsvAuditLog {
    fn drop(&mut self) {
        // 关闭通道,最多等待 timeout 让排队中的记录写完
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            if !join_within(handle, &self.done, self.timeout) {
                warn!(
                    "⚠️  审计写入线程 {}ms 内未退出,不再等待: {}",
                    self.timeout.as_millis(),
                    self.path.display()
                );
            }
        }
    }
}

/// 在 `timeout` 内等到线程退出则回收并返回 true,否则放弃等待
fn join_within(handle: JoinHandle<()>, done: &Receiver<()>, timeout: Duration) -> bool {
    match done.recv_timeout(timeout) {
        Err(RecvTimeoutError::Timeout) => false,
        _ => {
            let _ = handle.join();
            true
        }
    }
}
