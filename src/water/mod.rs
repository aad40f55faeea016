//! Image statistics and water type classification

pub mod classifier;
pub mod statistics;

pub use classifier::{classify, decide, WaterAnalysis, WaterType, WaterTypeSource};
pub use statistics::{safe_ratio, ChannelMeans, ImageAnalyzer, ImageStatistics, SceneMetrics};
