//! 68 点面部关键点模块
//!
//! 关键点编号沿用 face-api.js / dlib 的 68 点约定：
//! - 0..=16: 下颌轮廓
//! - 17..=21: 左眉
//! - 22..=26: 右眉
//! - 27..=35: 鼻子（27 为鼻梁顶点）
//! - 36..=41 / 42..=47: 左眼 / 右眼
//! - 48..=67: 嘴部

use std::ops::Range;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 单张人脸的关键点数量
pub const LANDMARK_COUNT: usize = 68;

const JAW_OUTLINE: Range<usize> = 0..17;
const LEFT_EYEBROW: Range<usize> = 17..22;
const RIGHT_EYEBROW: Range<usize> = 22..27;
const NOSE: Range<usize> = 27..36;
const LEFT_EYE: Range<usize> = 36..42;
const RIGHT_EYE: Range<usize> = 42..48;
const MOUTH: Range<usize> = 48..68;

/// 二维点
///
/// 反序列化同时接受 face-api.js 序列化出的 `_x` / `_y` 字段名。
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    #[serde(alias = "_x")]
    pub x: f64,
    #[serde(alias = "_y")]
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LandmarkError {
    #[error("expected {expected} landmark points, got {actual}")]
    WrongCount { expected: usize, actual: usize },
    #[error("expected {expected} coordinates, got {actual}")]
    WrongCoordinateCount { expected: usize, actual: usize },
    #[error("landmark {index} has a non-finite coordinate")]
    NonFinite { index: usize },
}

/// 单张人脸的 68 点关键点集合
///
/// 构造时校验点数和坐标有限性，之后不可变。
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    points: Vec<Point>,
}

impl LandmarkSet {
    /// 从点列表构造
    pub fn from_points(points: Vec<Point>) -> Result<Self, LandmarkError> {
        if points.len() != LANDMARK_COUNT {
            return Err(LandmarkError::WrongCount {
                expected: LANDMARK_COUNT,
                actual: points.len(),
            });
        }
        if let Some(index) = points.iter().position(|p| !p.is_finite()) {
            return Err(LandmarkError::NonFinite { index });
        }
        Ok(Self { points })
    }

    /// 从扁平坐标数组构造
    ///
    /// 输入: 136 个浮点数，按 x0, y0, x1, y1, ... 排列
    pub fn from_flat(coords: &[f64]) -> Result<Self, LandmarkError> {
        if coords.len() != LANDMARK_COUNT * 2 {
            return Err(LandmarkError::WrongCoordinateCount {
                expected: LANDMARK_COUNT * 2,
                actual: coords.len(),
            });
        }
        let points = coords
            .chunks_exact(2)
            .map(|xy| Point::new(xy[0], xy[1]))
            .collect();
        Self::from_points(points)
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn point(&self, index: usize) -> Option<Point> {
        self.points.get(index).copied()
    }

    pub fn jaw_outline(&self) -> &[Point] {
        &self.points[JAW_OUTLINE]
    }

    pub fn left_eyebrow(&self) -> &[Point] {
        &self.points[LEFT_EYEBROW]
    }

    pub fn right_eyebrow(&self) -> &[Point] {
        &self.points[RIGHT_EYEBROW]
    }

    pub fn nose(&self) -> &[Point] {
        &self.points[NOSE]
    }

    pub fn left_eye(&self) -> &[Point] {
        &self.points[LEFT_EYE]
    }

    pub fn right_eye(&self) -> &[Point] {
        &self.points[RIGHT_EYE]
    }

    pub fn mouth(&self) -> &[Point] {
        &self.points[MOUTH]
    }

    /// 返回所有坐标按 `factor` 缩放后的新集合
    pub fn scaled(&self, factor: f64) -> Result<Self, LandmarkError> {
        Self::from_points(
            self.points
                .iter()
                .map(|p| Point::new(p.x * factor, p.y * factor))
                .collect(),
        )
    }

    /// 水平镜像（x 取反），对应前置摄像头的镜像画面
    pub fn mirrored(&self) -> Self {
        Self {
            points: self.points.iter().map(|p| Point::new(-p.x, p.y)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered() -> Vec<Point> {
        (0..LANDMARK_COUNT)
            .map(|i| Point::new(i as f64, -(i as f64)))
            .collect()
    }

    #[test]
    fn regions_follow_68_point_layout() {
        let set = LandmarkSet::from_points(numbered()).unwrap();
        assert_eq!(set.jaw_outline().len(), 17);
        assert_eq!(set.left_eyebrow().len(), 5);
        assert_eq!(set.right_eyebrow().len(), 5);
        assert_eq!(set.nose().len(), 9);
        assert_eq!(set.left_eye().len(), 6);
        assert_eq!(set.right_eye().len(), 6);
        assert_eq!(set.mouth().len(), 20);

        assert_eq!(set.jaw_outline()[16].x, 16.0);
        assert_eq!(set.left_eyebrow()[4].x, 21.0);
        assert_eq!(set.right_eyebrow()[0].x, 22.0);
        assert_eq!(set.nose()[0].x, 27.0);
        assert_eq!(set.mouth()[19].x, 67.0);
    }

    #[test]
    fn rejects_wrong_point_count() {
        let mut points = numbered();
        points.pop();
        assert_eq!(
            LandmarkSet::from_points(points).unwrap_err(),
            LandmarkError::WrongCount {
                expected: 68,
                actual: 67
            }
        );

        let mut points = numbered();
        points.push(Point::default());
        assert!(matches!(
            LandmarkSet::from_points(points),
            Err(LandmarkError::WrongCount { actual: 69, .. })
        ));
    }

    #[test]
    fn rejects_non_finite_coordinates() {
        let mut points = numbered();
        points[30].y = f64::NAN;
        assert_eq!(
            LandmarkSet::from_points(points).unwrap_err(),
            LandmarkError::NonFinite { index: 30 }
        );

        let mut points = numbered();
        points[0].x = f64::INFINITY;
        assert_eq!(
            LandmarkSet::from_points(points).unwrap_err(),
            LandmarkError::NonFinite { index: 0 }
        );
    }

    #[test]
    fn flat_coordinates_pair_up_in_order() {
        let flat: Vec<f64> = numbered().iter().flat_map(|p| [p.x, p.y]).collect();
        let set = LandmarkSet::from_flat(&flat).unwrap();
        assert_eq!(set.point(8), Some(Point::new(8.0, -8.0)));
        assert_eq!(set.point(68), None);

        assert_eq!(
            LandmarkSet::from_flat(&flat[..135]).unwrap_err(),
            LandmarkError::WrongCoordinateCount {
                expected: 136,
                actual: 135
            }
        );
    }

    #[test]
    fn point_accepts_detector_field_names() {
        let p: Point = serde_json::from_str(r#"{"_x": 1.5, "_y": -2.0}"#).unwrap();
        assert_eq!(p, Point::new(1.5, -2.0));
        let p: Point = serde_json::from_str(r#"{"x": 3.0, "y": 4.0}"#).unwrap();
        assert_eq!(p, Point::new(3.0, 4.0));
    }

    #[test]
    fn mirror_flips_x_only() {
        let set = LandmarkSet::from_points(numbered()).unwrap();
        let mirrored = set.mirrored();
        assert_eq!(mirrored.point(5), Some(Point::new(-5.0, -5.0)));
        assert_eq!(mirrored.mirrored(), set);
    }
}
