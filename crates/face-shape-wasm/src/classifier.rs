//! 脸型分类模块
//!
//! 由关键点计算五个测量值：
//! - 脸宽 = |jaw[16].x - jaw[0].x|
//! - 脸高 = |nose[0].y - jaw[8].y|
//! - 下颌宽 = |jaw[14].x - jaw[2].x|
//! - 额宽 = |rightBrow[0].x - leftBrow[4].x|
//! - 下巴宽 = |jaw[10].x - jaw[6].x|
//!
//! 再由三个比例走固定决策树：
//! - 宽脸 (脸宽/脸高 > 0.95): Round / Heart / Square
//! - 长脸: Oval / Diamond / Oblong
//!
//! 阈值均为严格不等式，等于阈值时落入 else 分支。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use wasm_bindgen::prelude::*;

use crate::landmarks::{LandmarkError, LandmarkSet};

/// 宽脸判定阈值（脸宽/脸高）
pub const WIDE_FACE_THRESHOLD: f64 = 0.95;
/// 下颌/额头比例上阈值
pub const BROAD_JAW_THRESHOLD: f64 = 0.9;
/// 下颌/额头比例下阈值，同时用作下巴/下颌阈值
pub const NARROW_JAW_THRESHOLD: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaceShape {
    Round,
    Oval,
    Square,
    Heart,
    Diamond,
    Oblong,
}

impl FaceShape {
    /// 展示顺序
    pub const ALL: [FaceShape; 6] = [
        FaceShape::Round,
        FaceShape::Oblong,
        FaceShape::Diamond,
        FaceShape::Oval,
        FaceShape::Heart,
        FaceShape::Square,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FaceShape::Round => "Round",
            FaceShape::Oval => "Oval",
            FaceShape::Square => "Square",
            FaceShape::Heart => "Heart",
            FaceShape::Diamond => "Diamond",
            FaceShape::Oblong => "Oblong",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            FaceShape::Round => "round",
            FaceShape::Oval => "oval",
            FaceShape::Square => "square",
            FaceShape::Heart => "heart",
            FaceShape::Diamond => "diamond",
            FaceShape::Oblong => "oblong",
        }
    }

    /// 原始决策树，对任意 f64 输入都给出结果（NaN 比较恒为 false，落入 Oblong）
    pub fn from_ratios(ratios: &Ratios) -> Self {
        if ratios.width_to_height > WIDE_FACE_THRESHOLD {
            if ratios.jaw_to_forehead > BROAD_JAW_THRESHOLD
                && ratios.chin_to_jaw > NARROW_JAW_THRESHOLD
            {
                FaceShape::Round
            } else if ratios.jaw_to_forehead < NARROW_JAW_THRESHOLD {
                FaceShape::Heart
            } else {
                FaceShape::Square
            }
        } else if ratios.jaw_to_forehead > BROAD_JAW_THRESHOLD {
            FaceShape::Oval
        } else if ratios.jaw_to_forehead < NARROW_JAW_THRESHOLD {
            FaceShape::Diamond
        } else {
            FaceShape::Oblong
        }
    }
}

impl fmt::Display for FaceShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown face shape '{0}'")]
pub struct UnknownFaceShape(pub String);

impl FromStr for FaceShape {
    type Err = UnknownFaceShape;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        FaceShape::ALL
            .into_iter()
            .find(|shape| shape.slug().eq_ignore_ascii_case(needle))
            .ok_or_else(|| UnknownFaceShape(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifyError {
    #[error(transparent)]
    Landmarks(#[from] LandmarkError),
    #[error("degenerate face geometry: {measurement} is zero or out of range")]
    DegenerateGeometry { measurement: &'static str },
}

/// 五个测量值，均为坐标差的绝对值
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurements {
    pub face_width: f64,
    pub face_height: f64,
    pub jaw_width: f64,
    pub forehead_width: f64,
    pub chin_width: f64,
}

impl Measurements {
    pub fn from_landmarks(landmarks: &LandmarkSet) -> Self {
        let jaw = landmarks.jaw_outline();
        let nose_top = landmarks.nose()[0];
        let right_brow = landmarks.right_eyebrow();
        let left_brow = landmarks.left_eyebrow();

        Self {
            face_width: (jaw[16].x - jaw[0].x).abs(),
            face_height: (nose_top.y - jaw[8].y).abs(),
            jaw_width: (jaw[14].x - jaw[2].x).abs(),
            forehead_width: (right_brow[0].x - left_brow[4].x).abs(),
            chin_width: (jaw[10].x - jaw[6].x).abs(),
        }
    }

    /// 计算比例；作为分母的测量值为零时返回错误，不产生 Infinity/NaN
    pub fn ratios(&self) -> Result<Ratios, ClassifyError> {
        let denominators = [
            ("faceHeight", self.face_height),
            ("foreheadWidth", self.forehead_width),
            ("jawWidth", self.jaw_width),
        ];
        if let Some((measurement, _)) = denominators.iter().find(|(_, v)| *v == 0.0) {
            return Err(ClassifyError::DegenerateGeometry {
                measurement: *measurement,
            });
        }

        let ratios = Ratios {
            width_to_height: self.face_width / self.face_height,
            jaw_to_forehead: self.jaw_width / self.forehead_width,
            chin_to_jaw: self.chin_width / self.jaw_width,
        };
        // 坐标有限但量级极端时除法仍可能溢出
        if !ratios.is_finite() {
            return Err(ClassifyError::DegenerateGeometry {
                measurement: "ratio",
            });
        }
        Ok(ratios)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ratios {
    pub width_to_height: f64,
    pub jaw_to_forehead: f64,
    pub chin_to_jaw: f64,
}

impl Ratios {
    fn is_finite(&self) -> bool {
        self.width_to_height.is_finite()
            && self.jaw_to_forehead.is_finite()
            && self.chin_to_jaw.is_finite()
    }
}

/// 分类结果：脸型及其依据
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub shape: FaceShape,
    pub measurements: Measurements,
    pub ratios: Ratios,
}

/// 对单张人脸的关键点进行脸型分类
pub fn classify(landmarks: &LandmarkSet) -> Result<Classification, ClassifyError> {
    let measurements = Measurements::from_landmarks(landmarks);
    let ratios = measurements.ratios()?;
    Ok(Classification {
        shape: FaceShape::from_ratios(&ratios),
        measurements,
        ratios,
    })
}

/// 对扁平坐标数组（136 个浮点数）进行脸型分类
pub fn classify_flat(coords: &[f64]) -> Result<Classification, ClassifyError> {
    let landmarks = LandmarkSet::from_flat(coords)?;
    classify(&landmarks)
}

/// 浏览器端脸型分类器
///
/// 接收检测器输出的 68 点坐标（136 个浮点数，x0, y0, x1, y1, ...）。
/// 记录最近一次成功分类的脸型，供摄像头连续截帧时展示。
#[wasm_bindgen]
pub struct FaceShapeClassifier {
    last_shape: Option<FaceShape>,
}

#[wasm_bindgen]
impl FaceShapeClassifier {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self { last_shape: None }
    }

    /// 返回 `{ shape, measurements, ratios }`；输入无效时抛出 Error
    #[wasm_bindgen(js_name = "classify")]
    pub fn classify_js(&mut self, landmarks: &[f64]) -> Result<JsValue, JsValue> {
        let classification = self.run(landmarks)?;
        serde_wasm_bindgen::to_value(&classification).map_err(JsValue::from)
    }

    /// 仅返回脸型名称
    #[wasm_bindgen(js_name = "classifyLabel")]
    pub fn classify_label(&mut self, landmarks: &[f64]) -> Result<String, JsValue> {
        self.run(landmarks).map(|c| c.shape.name().to_string())
    }

    /// 最近一次成功分类的脸型名称
    #[wasm_bindgen(js_name = "lastShape")]
    pub fn last_shape(&self) -> Option<String> {
        self.last_shape.map(|shape| shape.name().to_string())
    }

    pub fn reset(&mut self) {
        self.last_shape = None;
    }

    /// 按展示顺序返回全部脸型名称
    pub fn shapes(&self) -> js_sys::Array {
        FaceShape::ALL
            .iter()
            .map(|shape| JsValue::from_str(shape.name()))
            .collect()
    }
}

impl FaceShapeClassifier {
    fn run(&mut self, landmarks: &[f64]) -> Result<Classification, JsValue> {
        self.classify_and_remember(landmarks)
            .map_err(|e| JsValue::from(js_sys::Error::new(&e.to_string())))
    }

    /// 分类失败时保留上一次的结果
    fn classify_and_remember(
        &mut self,
        landmarks: &[f64],
    ) -> Result<Classification, ClassifyError> {
        let classification = classify_flat(landmarks)?;
        self.last_shape = Some(classification.shape);
        Ok(classification)
    }
}

impl Default for FaceShapeClassifier {
    fn default() -> Self {
        Self::new()
    }
}
