//! 提示音播放线程
//!
//! 帧循环只做 `try_send`,队列满时丢弃,永不阻塞

use std::io::Write;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use log::{debug, info, warn};

use super::{Notification, Notifier};

/// 单个音调
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tone {
    pub frequency_hz: u32,
    pub duration_ms: u64,
}

/// 双音提示: 先高后低
pub const CHIME: [Tone; 2] = [
    Tone {
        frequency_hz: 800,
        duration_ms: 200,
    },
    Tone {
        frequency_hz: 600,
        duration_ms: 300,
    },
];

/// 音调序列播放函数
pub type Player = fn(&[Tone]) -> std::io::Result<()>;

/// 提示音播放器 (独立线程)
pub struct ChimeNotifier {
    tx: Option<Sender<Notification>>,
    handle: Option<JoinHandle<()>>,
}

impl ChimeNotifier {
    /// 使用终端响铃播放
    pub fn new() -> Self {
        Self::with_player(play)
    }

    pub fn with_player(player: Player) -> Self {
        let (tx, rx) = bounded::<Notification>(8);
        let handle = thread::Builder::new()
            .name("chime".into())
            .spawn(move || Self::run(rx, player));

        match handle {
            Ok(handle) => Self {
                tx: Some(tx),
                handle: Some(handle),
            },
            Err(e) => {
                warn!("⚠️  提示音线程启动失败,提醒将静音: {}", e);
                Self {
                    tx: None,
                    handle: None,
                }
            }
        }
    }

    fn run(rx: Receiver<Notification>, player: Player) {
        debug!("🔈 提示音线程启动");
        while let Ok(notification) = rx.recv() {
            info!("🔔 {}", notification.message);
            if let Err(e) = player(&CHIME) {
                debug!("提示音播放失败: {}", e);
            }
        }
        debug!("🔈 提示音线程退出");
    }
}

impl Default for ChimeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for ChimeNotifier {
    fn notify(&self, notification: &Notification) {
        let Some(tx) = &self.tx else {
            return;
        };
        match tx.try_send(notification.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => debug!("提示音队列已满,丢弃 ID:{}", notification.identifier),
            Err(TrySendError::Disconnected(_)) => debug!("提示音线程已退出"),
        }
    }
}

impl Drop for ChimeNotifier {
    fn drop(&mut self) {
        // 先关闭通道,线程播放完剩余提示后退出
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// 终端响铃播放音调序列
///
/// 终端响铃没有音高,频率只记录在日志中
pub fn play(tones: &[Tone]) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    for tone in tones {
        debug!("🎵 {} Hz {} ms", tone.frequency_hz, tone.duration_ms);
        stderr.write_all(b"\x07")?;
        stderr.flush()?;
        thread::sleep(Duration::from_millis(tone.duration_ms));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_chime_tones() {
        assert_eq!(CHIME[0].frequency_hz, 800);
        assert_eq!(CHIME[1].duration_ms, 300);
    }

    fn slow_player(tones: &[Tone]) -> std::io::Result<()> {
        thread::sleep(Duration::from_millis(10 * tones.len() as u64));
        Ok(())
    }

    #[test]
    fn test_notify_never_blocks() {
        let notifier = ChimeNotifier::with_player(slow_player);
        let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let start = std::time::Instant::now();
        for id in 0..64 {
            notifier.notify(&Notification::confirmed(id, 5.0, at));
        }
        // 队列满时直接丢弃,不等待播放
        assert!(start.elapsed() < Duration::from_millis(100));

        drop(notifier);
        // 最多播放队列中的8条 + 正在播放的1条
        assert!(start.elapsed() < Duration::from_millis(1_000));
    }
}
