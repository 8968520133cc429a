//! 帧事件归一化 (Frame Event Normalizer)
//! 丢弃过小/过远的检测框,输出本帧候选ID集合

use std::collections::BTreeSet;

use super::types::{DetectionCandidate, FrameDetections, Identifier};

/// 面积过滤器 (纯函数,无副作用)
#[derive(Clone, Debug)]
pub struct FrameNormalizer {
    /// 检测框面积 / 画面面积 的最小比例
    min_area_ratio: f64,

    /// 参与统计的类别,为空时不过滤
    tracked_classes: Vec<u32>,
}

impl FrameNormalizer {
    pub fn new(min_area_ratio: f64, tracked_classes: Vec<u32>) -> Self {
        Self {
            min_area_ratio,
            tracked_classes,
        }
    }

    /// 提取本帧所有合格候选
    ///
    /// 没有追踪ID的检测框直接丢弃
    pub fn candidates(&self, frame: &FrameDetections) -> Vec<DetectionCandidate> {
        let frame_area = frame.frame_area();

        frame
            .detections()
            .iter()
            .filter(|d| {
                self.tracked_classes.is_empty() || self.tracked_classes.contains(&d.bbox.class_id)
            })
            .filter_map(|d| {
                let identifier = d.id?;
                let candidate = DetectionCandidate {
                    identifier,
                    box_area: d.bbox.area(),
                    frame_area,
                };
                (candidate.area_ratio() >= self.min_area_ratio).then_some(candidate)
            })
            .collect()
    }

    /// 本帧候选ID (去重,升序)
    pub fn candidate_ids(&self, frame: &FrameDetections) -> BTreeSet<Identifier> {
        self.candidates(frame)
            .into_iter()
            .map(|c| c.identifier)
            .collect()
    }
}
