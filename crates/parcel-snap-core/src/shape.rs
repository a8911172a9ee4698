//! 地块图形定义
//!
//! 外部绘图层传入的图形：矩形、圆、多边形、多段线（以及两点直线）。
//! 所有图形都用有序顶点序列表示，可选刚体旋转。
//!
//! 矩形允许使用两点（对角）紧凑编码，提取特征前由 [`Shape::vertices`]
//! 展开为四个有序角点。

use crate::math::{rotate_about, Point2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 闭合判定阈值下限（世界单位）
const MIN_CLOSE_THRESHOLD: f64 = 5.0;

/// 顶点数不超过此值时使用宽松系数
const FEW_POINTS_LIMIT: usize = 5;

/// 图形标识符（由外部绘图层分配）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeId(String);

impl ShapeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ShapeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ShapeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 图形类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Rectangle,
    Circle,
    Polygon,
    Polyline,
    /// 两点直线（按多段线规则处理）
    Line,
}

impl ShapeKind {
    /// 产生特征点所需的最少顶点数
    pub fn min_points(&self) -> usize {
        match self {
            ShapeKind::Polyline | ShapeKind::Line => 1,
            _ => 2,
        }
    }

    /// 是否总是闭合
    pub fn is_always_closed(&self) -> bool {
        matches!(
            self,
            ShapeKind::Rectangle | ShapeKind::Circle | ShapeKind::Polygon
        )
    }

    /// 是否产生中心点
    pub fn has_center(&self) -> bool {
        matches!(
            self,
            ShapeKind::Rectangle | ShapeKind::Circle | ShapeKind::Polygon
        )
    }
}

/// 刚体旋转（弧度，逆时针，绕 `center`）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    pub angle: f64,
    pub center: Point2,
}

impl Rotation {
    pub fn new(angle: f64, center: Point2) -> Self {
        Self { angle, center }
    }

    pub fn apply(&self, point: Point2) -> Point2 {
        rotate_about(point, self.center, self.angle)
    }
}

/// 图形
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub id: ShapeId,
    #[serde(rename = "type")]
    pub kind: ShapeKind,
    pub points: Vec<Point2>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Rotation>,
}

impl Shape {
    pub fn new(id: impl Into<ShapeId>, kind: ShapeKind, points: Vec<Point2>) -> Self {
        Self {
            id: id.into(),
            kind,
            points,
            rotation: None,
        }
    }

    /// 两点对角编码的矩形
    pub fn rectangle(id: impl Into<ShapeId>, corner: Point2, opposite: Point2) -> Self {
        Self::new(id, ShapeKind::Rectangle, vec![corner, opposite])
    }

    pub fn polyline(id: impl Into<ShapeId>, points: Vec<Point2>) -> Self {
        Self::new(id, ShapeKind::Polyline, points)
    }

    pub fn polygon(id: impl Into<ShapeId>, points: Vec<Point2>) -> Self {
        Self::new(id, ShapeKind::Polygon, points)
    }

    /// 圆以按顺序排列的圆周顶点给出
    pub fn circle(id: impl Into<ShapeId>, perimeter: Vec<Point2>) -> Self {
        Self::new(id, ShapeKind::Circle, perimeter)
    }

    pub fn line(id: impl Into<ShapeId>, start: Point2, end: Point2) -> Self {
        Self::new(id, ShapeKind::Line, vec![start, end])
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = Some(rotation);
        self
    }

    /// 展开并旋转后的顶点
    ///
    /// 两点矩形展开为 `(a.x,a.y) (b.x,a.y) (b.x,b.y) (a.x,b.y)`，
    /// 然后对所有顶点施加旋转。
    pub fn vertices(&self) -> Vec<Point2> {
        let mut vertices = match (self.kind, self.points.as_slice()) {
            (ShapeKind::Rectangle, [a, b]) => vec![
                Point2::new(a.x, a.y),
                Point2::new(b.x, a.y),
                Point2::new(b.x, b.y),
                Point2::new(a.x, b.y),
            ],
            _ => self.points.clone(),
        };

        if let Some(rotation) = &self.rotation {
            for v in &mut vertices {
                *v = rotation.apply(*v);
            }
        }

        vertices
    }
}

/// 多段线的自适应闭合判定
///
/// 少于 3 个顶点永远不闭合。阈值由平均边长推导：
/// 顶点数 ≤ 5 时为 `max(5.0, 平均边长 × 1.5)`，否则为 `max(5.0, 平均边长 × 0.5)`。
/// 平均边长按 n-1 条相邻边（不含闭合边）计算。
pub fn is_closed_polyline(vertices: &[Point2]) -> bool {
    if vertices.len() < 3 {
        return false;
    }

    let total: f64 = vertices.windows(2).map(|w| (w[1] - w[0]).norm()).sum();
    let avg_edge = total / (vertices.len() - 1) as f64;

    let factor = if vertices.len() <= FEW_POINTS_LIMIT { 1.5 } else { 0.5 };
    let threshold = MIN_CLOSE_THRESHOLD.max(avg_edge * factor);

    let gap = (vertices[vertices.len() - 1] - vertices[0]).norm();
    gap < threshold
}

/// 图形的线段集合（顶点索引对）
///
/// 相邻顶点对，闭合图形再加上 末点→首点 的闭合边。
pub fn segments(kind: ShapeKind, vertices: &[Point2]) -> Vec<(usize, usize)> {
    let n = vertices.len();
    if n < 2 {
        return Vec::new();
    }

    let mut segs: Vec<_> = (0..n - 1).map(|i| (i, i + 1)).collect();

    let closed = if kind.is_always_closed() {
        n >= 3
    } else {
        is_closed_polyline(vertices)
    };

    if closed {
        segs.push((n - 1, 0));
    }

    segs
}
