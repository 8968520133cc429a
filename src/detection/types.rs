/// 检测数据结构定义 (外部检测/追踪器 → 在场引擎)
/// Data structures at the detector boundary
use serde::Deserialize;

use crate::error::{Result, SentinelError};

/// 追踪器分配的目标ID
pub type Identifier = u32;

/// 检测框 (Detection bounding box), 像素坐标
#[derive(Clone, Debug, PartialEq)]
pub struct BBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub confidence: f32,
    pub class_id: u32,
}

impl BBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            confidence: 1.0,
            class_id: 0,
        }
    }

    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).abs()
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).abs()
    }

    pub fn area(&self) -> f64 {
        self.width() as f64 * self.height() as f64
    }
}

/// 单个原始检测 (追踪ID可能缺失)
#[derive(Clone, Debug, PartialEq)]
pub struct RawDetection {
    pub id: Option<Identifier>,
    pub bbox: BBox,
}

impl RawDetection {
    pub fn tracked(id: Identifier, bbox: BBox) -> Self {
        Self { id: Some(id), bbox }
    }
}

/// 一帧完整的检测结果,交给引擎后不可修改
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(try_from = "FrameWire")]
pub struct FrameDetections {
    width: u32,
    height: u32,
    timestamp: Option<f64>,
    detections: Vec<RawDetection>,
}

impl FrameDetections {
    /// 构建帧检测结果,画面面积为0时拒绝
    pub fn new(width: u32, height: u32, detections: Vec<RawDetection>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(SentinelError::InvalidFrame { width, height });
        }
        Ok(Self {
            width,
            height,
            timestamp: None,
            detections,
        })
    }

    /// 附带检测器给出的帧时间 (Unix秒)
    pub fn with_timestamp(mut self, timestamp: f64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn frame_area(&self) -> f64 {
        self.width as f64 * self.height as f64
    }

    pub fn timestamp(&self) -> Option<f64> {
        self.timestamp
    }

    pub fn detections(&self) -> &[RawDetection] {
        &self.detections
    }
}

/// 通过面积过滤的候选目标 (只存活一帧)
#[derive(Clone, Debug, PartialEq)]
pub struct DetectionCandidate {
    pub identifier: Identifier,
    pub box_area: f64,
    pub frame_area: f64,
}

impl DetectionCandidate {
    pub fn area_ratio(&self) -> f64 {
        self.box_area / self.frame_area
    }
}

// ========== JSON 线格式 ==========

#[derive(Debug, Deserialize)]
struct DetectionWire {
    #[serde(default)]
    id: Option<Identifier>,
    #[serde(rename = "box")]
    bbox: [f32; 4],
    #[serde(default, rename = "class")]
    class_id: u32,
    #[serde(default = "default_confidence")]
    confidence: f32,
}

fn default_confidence() -> f32 {
    1.0
}

#[derive(Debug, Deserialize)]
struct FrameWire {
    #[serde(default)]
    timestamp: Option<f64>,
    width: u32,
    height: u32,
    #[serde(default)]
    detections: Vec<DetectionWire>,
}

impl TryFrom<FrameWire> for FrameDetections {
    type Error = SentinelError;

    fn try_from(wire: FrameWire) -> Result<Self> {
        let detections = wire
            .detections
            .into_iter()
            .map(|d| {
                let [x1, y1, x2, y2] = d.bbox;
                RawDetection {
                    id: d.id,
                    bbox: BBox {
                        x1,
                        y1,
                        x2,
                        y2,
                        confidence: d.confidence,
                        class_id: d.class_id,
                    },
                }
            })
            .collect();

        let frame = FrameDetections::new(wire.width, wire.height, detections)?;
        Ok(match wire.timestamp {
            Some(ts) => frame.with_timestamp(ts),
            None => frame,
        })
    }
}
