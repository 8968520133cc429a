//! 帧时钟
//!
//! 首帧决定整个运行期间的时间来源:
//! 首帧带时间戳 → 检测器时间 (缺时间戳的帧沿用上一帧时间);
//! 首帧无时间戳 → 墙上时钟 (之后的时间戳忽略)

use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::detection::FrameDetections;
use crate::timestamp_from_secs;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeSource {
    Detector,
    Wall,
}

#[derive(Debug, Default)]
pub struct FrameClock {
    source: Option<TimeSource>,
    last: Option<DateTime<Utc>>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(&self) -> Option<TimeSource> {
        self.source
    }

    /// 最后一帧的时间
    pub fn last(&self) -> Option<DateTime<Utc>> {
        self.last
    }

    /// 给一帧定时间, `wall` 为调用时的墙上时钟
    pub fn stamp(&mut self, frame: &FrameDetections, wall: DateTime<Utc>) -> DateTime<Utc> {
        let detector = frame.timestamp().and_then(timestamp_from_secs);
        let source = *self.source.get_or_insert_with(|| {
            let source = if detector.is_some() {
                TimeSource::Detector
            } else {
                TimeSource::Wall
            };
            info!("⏱️  时间来源: {:?}", source);
            source
        });

        let now = match source {
            TimeSource::Detector => {
                if detector.is_none() {
                    debug!("帧缺少时间戳,沿用上一帧时间");
                }
                detector.or(self.last).unwrap_or(wall)
            }
            TimeSource::Wall => wall,
        };
        self.last = Some(now);
        now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditLog;
    use crate::config::SentinelConfig;
    use crate::detection::{BBox, RawDetection};
    use crate::notify::SilentNotifier;
    use crate::presence::PresenceEngine;
    use chrono::{Duration, TimeZone};

    const DETECTOR_T0: f64 = 1_700_000_000.0;

    fn wall(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_800_000_000, 0).unwrap() + Duration::seconds(secs)
    }

    fn frame(ids: &[u32]) -> FrameDetections {
        let detections = ids
            .iter()
            .map(|&id| RawDetection::tracked(id, BBox::new(0.0, 0.0, 200.0, 300.0)))
            .collect();
        FrameDetections::new(640, 480, detections).unwrap()
    }

    #[test]
    fn test_wall_clock_stream_ignores_later_timestamps() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.stamp(&frame(&[7]), wall(0)), wall(0));
        assert_eq!(clock.source(), Some(TimeSource::Wall));

        let timed = frame(&[7]).with_timestamp(DETECTOR_T0 + 1.0);
        assert_eq!(clock.stamp(&timed, wall(1)), wall(1));
        assert_eq!(clock.last(), Some(wall(1)));
    }

    #[test]
    fn test_detector_stream_carries_last_timestamp() {
        let mut clock = FrameClock::new();
        let t0 = timestamp_from_secs(DETECTOR_T0).unwrap();

        let first = frame(&[7]).with_timestamp(DETECTOR_T0);
        assert_eq!(clock.stamp(&first, wall(0)), t0);
        assert_eq!(clock.source(), Some(TimeSource::Detector));

        // 缺时间戳: 沿用上一帧,不跳到墙上时钟
        assert_eq!(clock.stamp(&frame(&[7]), wall(1)), t0);

        let later = frame(&[7]).with_timestamp(DETECTOR_T0 + 2.5);
        assert_eq!(
            clock.stamp(&later, wall(2)),
            t0 + Duration::milliseconds(2_500)
        );
    }

    #[test]
    fn test_mixed_stream_still_confirms_and_logs() {
        // 首帧无时间戳,之后60帧带检测器时间,最后一帧为空
        let config = SentinelConfig::default();
        let log = MemoryAuditLog::new();
        let mut engine =
            PresenceEngine::new(&config, Box::new(log.clone()), Box::new(SilentNotifier)).unwrap();
        let mut clock = FrameClock::new();

        let mut notifications = 0;
        let now = clock.stamp(&frame(&[7]), wall(0));
        notifications += engine.advance(&frame(&[7]), now).notifications.len();

        for i in 1..=60 {
            let f = frame(&[7]).with_timestamp(DETECTOR_T0 + i as f64);
            let now = clock.stamp(&f, wall(i));
            notifications += engine.advance(&f, now).notifications.len();
        }

        let empty = frame(&[]).with_timestamp(DETECTOR_T0 + 61.0);
        let now = clock.stamp(&empty, wall(61));
        engine.advance(&empty, now);

        assert_eq!(notifications, 1);
        let visits = log.visits();
        assert_eq!(visits.len(), 1);
        assert_eq!(visits[0].identifier, 7);
        assert_eq!(visits[0].duration_seconds, 60.0);
    }
}
