/// 检测边界 (Detection Boundary)
///
/// 外部检测/追踪器的输出在这里转换为强类型数据
/// - Types:      帧检测结果与候选目标
/// - Normalizer: 面积过滤
pub mod normalizer;
pub mod types;

pub use normalizer::FrameNormalizer;
pub use types::{BBox, DetectionCandidate, FrameDetections, Identifier, RawDetection};
