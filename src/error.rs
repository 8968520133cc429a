use thiserror::Error;

pub type Result<T, E = SentinelError> = std::result::Result<T, E>;

/// 在场追踪系统错误
#[derive(Debug, Error)]
pub enum SentinelError {
    /// 配置非法 (启动时立即失败)
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// 帧尺寸非法 (宽或高为0)
    #[error("invalid frame geometry: {width}x{height}")]
    InvalidFrame { width: u32, height: u32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("audit log CSV error: {0}")]
    AuditCsv(#[from] csv::Error),

    /// 审计写入超时 (记录可能稍后落盘)
    #[error("audit write for person {identifier} timed out after {timeout_ms}ms")]
    AuditTimeout { identifier: u32, timeout_ms: u64 },

    /// 审计写入线程已退出
    #[error("audit writer thread is gone")]
    AuditWriterClosed,

    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
}
