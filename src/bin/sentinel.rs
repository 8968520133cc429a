/// 数字卫兵 (Digital Sentinel)
///
/// 在场追踪与访客统计
///
/// 系统架构:
/// 1. 读取线程: 解析外部检测/追踪器输出 (JSON Lines) → FrameDetections
/// 2. 主线程:   在场引擎逐帧推进 + 提示输出
/// 3. 提示音线程 / 审计写入线程: 由引擎的协作者持有
/// 4. Ctrl-C: 置位中断标志,帧循环退出后结算仍在场的目标
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, error, info, warn};
use presence_sentinel::{
    ChimeNotifier, CsvAuditLog, FrameClock, FrameDetections, FrameOutcome, MessageBoard, Mode,
    Notifier, PresenceEngine, SentinelConfig, SilentNotifier,
};

/// 帧循环检查中断标志的间隔
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// 数字卫兵参数
#[derive(Parser, Debug)]
#[command(author, version, about = "数字卫兵 - 在场追踪与访客统计", long_about = None)]
struct Args {
    /// 检测结果输入 (JSON Lines),缺省读取标准输入
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// 配置文件 (JSON),不存在时写出默认配置
    #[arg(short, long, default_value = "sentinel.json")]
    config: PathBuf,

    /// 运行模式 (覆盖确认延迟与最短记录时长的预设)
    #[arg(short, long, value_enum)]
    mode: Option<Mode>,

    /// 检测框面积/画面面积 最小比例
    #[arg(long)]
    min_area_ratio: Option<f64>,

    /// 确认延迟 (秒)
    #[arg(long)]
    confirmation_delay: Option<f64>,

    /// 全局提醒冷却 (秒)
    #[arg(long)]
    cooldown: Option<f64>,

    /// 最短记录停留时长 (秒)
    #[arg(long)]
    min_log_duration: Option<f64>,

    /// 审计日志路径 (CSV)
    #[arg(long)]
    audit_log: Option<String>,

    /// 静音,不播放提示音
    #[arg(long)]
    mute: bool,
}

/// 读取线程 → 主线程
enum InputEvent {
    Frame(FrameDetections),
    Quit,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    // Ctrl-C 只置位标志,由帧循环退出后照常结算
    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        if let Err(e) = ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst)) {
            warn!("⚠️  Ctrl-C 处理器安装失败: {}", e);
        }
    }

    let mut config = SentinelConfig::load(&args.config)
        .with_context(|| format!("加载配置失败: {}", args.config.display()))?;
    apply_overrides(&mut config, &args);
    config.validate().context("配置校验失败")?;
    config.log_summary();

    info!("🚀 数字卫兵系统启动");

    // ========== 协作者: 审计日志 + 提示音 ==========
    let sink = CsvAuditLog::open(&config.audit_log_path, config.audit_write_timeout())
        .with_context(|| format!("打开审计日志失败: {}", config.audit_log_path))?;
    let audit_path = sink.path().to_path_buf();
    let notifier: Box<dyn Notifier> = if args.mute {
        Box::new(SilentNotifier)
    } else {
        Box::new(ChimeNotifier::new())
    };
    let mut engine = PresenceEngine::new(&config, Box::new(sink), notifier)?;
    let mut board = MessageBoard::new(config.message_duration_seconds);

    // ========== 启动读取线程 ==========
    let input: Box<dyn BufRead + Send> = match &args.input {
        Some(path) => {
            info!("📹 检测输入: {}", path.display());
            let file = File::open(path)
                .with_context(|| format!("打开检测输入失败: {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => {
            info!("📹 检测输入: 标准输入");
            Box::new(BufReader::new(std::io::stdin()))
        }
    };

    let (tx, rx) = bounded::<InputEvent>(120);
    let reader = thread::Builder::new()
        .name("detections".into())
        .spawn(move || read_detections(input, tx))
        .context("启动读取线程失败")?;

    info!("✅ 系统就绪,开始监控...");

    // ========== 主线程: 帧循环 ==========
    let mut clock = FrameClock::new();
    run_frame_loop(&mut engine, &mut board, &mut clock, &rx, &stop);

    // ========== 关闭: 结算仍在场的目标 ==========
    let now = clock.last().unwrap_or_else(Utc::now);
    let outcome = engine.shutdown(now);
    report_failures(&outcome);
    print_hud(&outcome, &mut board, now);

    drop(rx);
    if stop.load(Ordering::SeqCst) {
        // 读取线程可能阻塞在标准输入上,不再等待
        debug!("中断退出,不等待读取线程");
    } else if reader.join().is_err() {
        warn!("⚠️  读取线程异常退出");
    }

    info!("💾 访问记录: {}", audit_path.display());
    info!("👋 数字卫兵已退出");
    Ok(())
}

/// 按帧推进引擎,直到输入结束、收到退出指令或中断
fn run_frame_loop(
    engine: &mut PresenceEngine,
    board: &mut MessageBoard,
    clock: &mut FrameClock,
    rx: &Receiver<InputEvent>,
    stop: &AtomicBool,
) {
    let mut last_hud: Vec<String> = Vec::new();

    loop {
        if stop.load(Ordering::SeqCst) {
            info!("🛑 收到中断信号");
            break;
        }

        let frame = match rx.recv_timeout(POLL_INTERVAL) {
            Ok(InputEvent::Frame(frame)) => frame,
            Ok(InputEvent::Quit) => {
                info!("🛑 收到退出指令");
                break;
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        let now = clock.stamp(&frame, Utc::now());
        let outcome = engine.advance(&frame, now);
        for notification in &outcome.notifications {
            board.push(notification);
        }
        report_failures(&outcome);

        let hud = hud_lines(&outcome, board, now);
        if hud != last_hud {
            for line in &hud {
                println!("{}", line);
            }
            println!();
            last_hud = hud;
        }

        if engine.frame_count() % 300 == 0 {
            debug!(
                "🎯 已处理 {} 帧 | 在场 {} 人",
                engine.frame_count(),
                outcome.snapshot.current_count
            );
        }
    }
}

/// 读取线程: 每行一帧,解析失败视为采集失败 (不推进引擎)
fn read_detections(input: Box<dyn BufRead + Send>, tx: Sender<InputEvent>) {
    for (index, line) in input.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("❌ 读取检测输入失败: {}", e);
                break;
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed == "quit" || trimmed == "q" {
            let _ = tx.send(InputEvent::Quit);
            return;
        }

        match serde_json::from_str::<FrameDetections>(trimmed) {
            Ok(frame) => {
                if tx.send(InputEvent::Frame(frame)).is_err() {
                    return;
                }
            }
            Err(e) => warn!("⚠️  第{}行 采集失败,跳过本帧: {}", index + 1, e),
        }
    }
    debug!("检测输入结束");
}

/// 命令行参数覆盖配置文件
fn apply_overrides(config: &mut SentinelConfig, args: &Args) {
    if let Some(mode) = args.mode {
        let preset = SentinelConfig::preset(mode);
        config.mode = mode;
        config.confirmation_delay_seconds = preset.confirmation_delay_seconds;
        config.min_log_duration_seconds = preset.min_log_duration_seconds;
    }
    if let Some(v) = args.min_area_ratio {
        config.min_area_ratio = v;
    }
    if let Some(v) = args.confirmation_delay {
        config.confirmation_delay_seconds = v;
    }
    if let Some(v) = args.cooldown {
        config.global_cooldown_seconds = v;
    }
    if let Some(v) = args.min_log_duration {
        config.min_log_duration_seconds = v;
    }
    if let Some(path) = &args.audit_log {
        config.audit_log_path = path.clone();
    }
}

fn report_failures(outcome: &FrameOutcome) {
    for failure in &outcome.audit_failures {
        error!(
            "❌ 访问记录未能写入 ID:{} ({:.2}s): {}",
            failure.visit.identifier, failure.visit.duration_seconds, failure.error
        );
    }
}

fn hud_lines(outcome: &FrameOutcome, board: &mut MessageBoard, now: DateTime<Utc>) -> Vec<String> {
    let mut lines: Vec<String> = outcome.snapshot.overlay_lines().into_iter().collect();
    lines.extend(board.active(now).into_iter().map(str::to_string));
    lines
}

fn print_hud(outcome: &FrameOutcome, board: &mut MessageBoard, now: DateTime<Utc>) {
    for line in hud_lines(outcome, board, now) {
        println!("{}", line);
    }
}
