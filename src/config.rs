//! 在场追踪配置 - 通过JSON文件调整参数
//! Presence tracking configuration

use std::fs;
use std::path::Path;
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SentinelError};

/// 运行模式
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// 首次出现立即提醒,记录所有访问
    Instant,
    /// 持续出现5秒后提醒,只记录停留5秒以上的访问
    Debounced,
}

/// 在场追踪参数配置
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentinelConfig {
    pub mode: Mode,

    // === 检测过滤 ===
    pub min_area_ratio: f64,       // 检测框面积/画面面积 最小比例
    pub tracked_classes: Vec<u32>, // 参与统计的类别 (COCO 0=person)

    // === 提醒 ===
    pub confirmation_delay_seconds: f64, // 确认延迟 (防抖)
    pub global_cooldown_seconds: f64,    // 全局提醒冷却
    pub message_duration_seconds: f64,   // 屏幕提示显示时长

    // === 审计日志 ===
    pub min_log_duration_seconds: f64, // 最短记录停留时长
    pub audit_log_path: String,
    pub audit_write_timeout_ms: u64,
}

/// 配置文件内容,缺省字段按模式预设补齐,未知字段报错
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ConfigFile {
    mode: Option<Mode>,
    min_area_ratio: Option<f64>,
    tracked_classes: Option<Vec<u32>>,
    confirmation_delay_seconds: Option<f64>,
    global_cooldown_seconds: Option<f64>,
    message_duration_seconds: Option<f64>,
    min_log_duration_seconds: Option<f64>,
    audit_log_path: Option<String>,
    audit_write_timeout_ms: Option<u64>,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self::preset(Mode::Debounced)
    }
}

impl SentinelConfig {
    /// 模式预设
    pub fn preset(mode: Mode) -> Self {
        let (confirmation_delay_seconds, min_log_duration_seconds) = match mode {
            Mode::Instant => (0.0, 0.0),
            Mode::Debounced => (5.0, 5.0),
        };

        Self {
            mode,
            min_area_ratio: 0.03,
            tracked_classes: vec![0],
            confirmation_delay_seconds,
            global_cooldown_seconds: 10.0,
            message_duration_seconds: 5.0,
            min_log_duration_seconds,
            audit_log_path: "visitor_log.csv".to_string(),
            audit_write_timeout_ms: 500,
        }
    }

    /// 从JSON文件加载配置
    ///
    /// 文件不存在时写出默认配置;解析失败直接返回错误
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(json) => {
                let config = Self::from_json(&json)?;
                info!("✅ 配置已从 {} 加载", path.display());
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("📝 配置文件不存在,创建默认配置...");
                let config = Self::default();
                if let Err(e) = config.save(path) {
                    warn!("⚠️  默认配置写入失败: {}", e);
                }
                Ok(config)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 解析JSON配置 (缺省字段取所选模式的预设值)
    pub fn from_json(json: &str) -> Result<Self> {
        let file: ConfigFile = serde_json::from_str(json)?;
        let mut config = Self::preset(file.mode.unwrap_or(Mode::Debounced));

        if let Some(v) = file.min_area_ratio {
            config.min_area_ratio = v;
        }
        if let Some(v) = file.tracked_classes {
            config.tracked_classes = v;
        }
        if let Some(v) = file.confirmation_delay_seconds {
            config.confirmation_delay_seconds = v;
        }
        if let Some(v) = file.global_cooldown_seconds {
            config.global_cooldown_seconds = v;
        }
        if let Some(v) = file.message_duration_seconds {
            config.message_duration_seconds = v;
        }
        if let Some(v) = file.min_log_duration_seconds {
            config.min_log_duration_seconds = v;
        }
        if let Some(v) = file.audit_log_path {
            config.audit_log_path = v;
        }
        if let Some(v) = file.audit_write_timeout_ms {
            config.audit_write_timeout_ms = v;
        }

        Ok(config)
    }

    /// 保存配置到JSON文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        info!("💾 配置已保存到 {}", path.as_ref().display());
        Ok(())
    }

    /// 校验配置,启动时调用
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_area_ratio) {
            return Err(invalid(format!(
                "minAreaRatio must be within [0, 1], got {}",
                self.min_area_ratio
            )));
        }

        let seconds = [
            ("confirmationDelaySeconds", self.confirmation_delay_seconds),
            ("globalCooldownSeconds", self.global_cooldown_seconds),
            ("minLogDurationSeconds", self.min_log_duration_seconds),
            ("messageDurationSeconds", self.message_duration_seconds),
        ];
        for (name, value) in seconds {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        if self.message_duration_seconds == 0.0 {
            return Err(invalid("messageDurationSeconds must be positive".into()));
        }
        if self.audit_write_timeout_ms == 0 {
            return Err(invalid("auditWriteTimeoutMs must be positive".into()));
        }
        if self.audit_log_path.trim().is_empty() {
            return Err(invalid("auditLogPath must not be empty".into()));
        }

        Ok(())
    }

    pub fn audit_write_timeout(&self) -> Duration {
        Duration::from_millis(self.audit_write_timeout_ms)
    }

    /// 打印当前配置
    pub fn log_summary(&self) {
        info!("🎛️  当前在场追踪配置:");
        info!("  模式: {:?}", self.mode);
        info!("  最小面积比例: {:.3}", self.min_area_ratio);
        info!("  确认延迟: {}s", self.confirmation_delay_seconds);
        info!("  全局冷却: {}s", self.global_cooldown_seconds);
        info!("  最短记录时长: {}s", self.min_log_duration_seconds);
        info!("  审计日志: {}", self.audit_log_path);
    }
}

fn invalid(msg: String) -> SentinelError {
    SentinelError::InvalidConfig(msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let instant = SentinelConfig::preset(Mode::Instant);
        assert_eq!(instant.confirmation_delay_seconds, 0.0);
        assert_eq!(instant.min_log_duration_seconds, 0.0);

        let debounced = SentinelConfig::default();
        assert_eq!(debounced.mode, Mode::Debounced);
        assert_eq!(debounced.confirmation_delay_seconds, 5.0);
        assert_eq!(debounced.min_log_duration_seconds, 5.0);
        assert_eq!(debounced.global_cooldown_seconds, 10.0);
        assert!((debounced.min_area_ratio - 0.03).abs() < 1e-12);
        assert!(debounced.validate().is_ok());
    }

    #[test]
    fn test_from_json_fills_missing_from_mode() {
        let config =
            SentinelConfig::from_json(r#"{"mode":"instant","globalCooldownSeconds":3}"#).unwrap();
        assert_eq!(config.mode, Mode::Instant);
        assert_eq!(config.confirmation_delay_seconds, 0.0);
        assert_eq!(config.global_cooldown_seconds, 3.0);
        assert_eq!(config.audit_log_path, "visitor_log.csv");
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            SentinelConfig::from_json("{not json"),
            Err(SentinelError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_from_json_rejects_unknown_key() {
        // 拼错的字段名不能悄悄回落到默认值
        assert!(matches!(
            SentinelConfig::from_json(r#"{"globalCooldown":3}"#),
            Err(SentinelError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_validate_rejects_negative_cooldown() {
        let mut config = SentinelConfig::default();
        config.global_cooldown_seconds = -1.0;
        assert!(matches!(
            config.validate(),
            Err(SentinelError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_ratio_and_path() {
        let mut config = SentinelConfig::default();
        config.min_area_ratio = 1.5;
        assert!(config.validate().is_err());

        let mut config = SentinelConfig::default();
        config.audit_log_path = "  ".into();
        assert!(config.validate().is_err());

        let mut config = SentinelConfig::default();
        config.confirmation_delay_seconds = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sentinel.json");

        let config = SentinelConfig::load(&path).unwrap();
        assert_eq!(config, SentinelConfig::default());
        assert!(path.exists());

        // 写出的文件可以被再次加载
        let reloaded = SentinelConfig::load(&path).unwrap();
        assert_eq!(reloaded, config);
    }
}
