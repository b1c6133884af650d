//! 脸型识别 WASM 库
//!
//! 基于 68 点面部关键点，计算几何比例并按固定决策树给出六种脸型之一。
//! 同一份实现既编译为 WebAssembly 在浏览器端运行，也作为 rlib 供服务端复用。
//!
//! ## 模块
//! - `landmarks`: 68 点关键点集合及各区域访问
//! - `classifier`: 测量值、比例与脸型决策树

pub mod classifier;
pub mod landmarks;

pub use classifier::{
    classify, classify_flat, Classification, ClassifyError, FaceShape, FaceShapeClassifier,
    Measurements, Ratios, UnknownFaceShape,
};
pub use landmarks::{LandmarkError, LandmarkSet, Point, LANDMARK_COUNT};
