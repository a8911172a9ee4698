//! 特征点提取
//!
//! 单个图形（加上可选的光标位置）→ 一组带类型的候选捕捉点：
//! - 端点：每个顶点一个
//! - 中点：线段集合中每条线段一个
//! - 中心：顶点的算术平均，仅矩形/圆/多边形
//! - 边：光标在线段上的投影点
//! - 垂直：光标与线段起点连线接近垂直于线段时，位于光标处
//!
//! 顶点数不足的图形（正在绘制中）直接跳过，不视为错误。

use crate::math::{
    angle_between, centroid, closest_point_on_segment, midpoint, rotate_about, Point2,
};
use crate::shape::{segments, Shape, ShapeId, ShapeKind};
use crate::snap::{CandidateMeta, SnapCandidate, SnapType};

/// 边投影点到线段两端的最小距离，避免与端点/中点信号重复
const EDGE_ENDPOINT_CLEARANCE: f64 = 0.5;

/// 垂直判定的角度容差（度）
const PERPENDICULAR_TOLERANCE_DEG: f64 = 5.0;

/// 特征点提取器
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    /// 边投影的最大距离
    snap_distance: f64,
}

impl FeatureExtractor {
    pub fn new(snap_distance: f64) -> Self {
        Self { snap_distance }
    }

    pub fn snap_distance(&self) -> f64 {
        self.snap_distance
    }

    pub fn set_snap_distance(&mut self, snap_distance: f64) {
        self.snap_distance = snap_distance;
    }

    /// 提取图形的全部候选点
    pub fn extract(&self, shape: &Shape, cursor: Option<Point2>) -> Vec<SnapCandidate> {
        let vertices = shape.vertices();
        let real = vertices.len();
        self.extract_vertices(&shape.id, shape.kind, &vertices, cursor, real)
    }

    /// 提取正在绘制的图形，`live` 作为合成的末尾顶点
    ///
    /// 矩形的第二个角点由 `live` 替换；其他图形在末尾追加。
    /// 由合成顶点派生的候选点标记为 `synthetic`。
    pub fn extract_preview(
        &self,
        shape: &Shape,
        live: Point2,
        cursor: Option<Point2>,
    ) -> Vec<SnapCandidate> {
        let mut preview = shape.clone();

        // 合成顶点以世界坐标给出，先逆旋转回图形局部坐标
        let raw = match &shape.rotation {
            Some(r) => rotate_about(live, r.center, -r.angle),
            None => live,
        };

        let real = if shape.kind == ShapeKind::Rectangle {
            preview.points.truncate(1);
            preview.points.len()
        } else {
            shape.vertices().len()
        };
        preview.points.push(raw);

        let vertices = preview.vertices();
        self.extract_vertices(&shape.id, shape.kind, &vertices, cursor, real)
    }

    /// 基于已展开/旋转的顶点提取
    ///
    /// 索引不小于 `real` 的顶点视为合成顶点。
    fn extract_vertices(
        &self,
        owner: &ShapeId,
        kind: ShapeKind,
        vertices: &[Point2],
        cursor: Option<Point2>,
        real: usize,
    ) -> Vec<SnapCandidate> {
        if vertices.is_empty() || vertices.len() < kind.min_points() {
            return Vec::new();
        }

        let synthetic = |i: usize| i >= real;
        let segs = segments(kind, vertices);
        let mut out = Vec::with_capacity(vertices.len() + segs.len() + 1);

        // 端点
        for (i, v) in vertices.iter().enumerate() {
            out.push(candidate(
                owner,
                SnapType::Endpoint,
                i,
                *v,
                CandidateMeta {
                    vertex: Some(i),
                    segment: None,
                    synthetic: synthetic(i),
                },
            ));
        }

        // 中点
        for (k, &(i, j)) in segs.iter().enumerate() {
            out.push(candidate(
                owner,
                SnapType::Midpoint,
                k,
                midpoint(vertices[i], vertices[j]),
                segment_meta(k, synthetic(i) || synthetic(j)),
            ));
        }

        // 中心
        if kind.has_center() {
            if let Some(center) = centroid(vertices) {
                out.push(candidate(
                    owner,
                    SnapType::Center,
                    0,
                    center,
                    CandidateMeta {
                        synthetic: vertices.len() > real,
                        ..CandidateMeta::default()
                    },
                ));
            }
        }

        let Some(cursor) = cursor else {
            return out;
        };

        for (k, &(i, j)) in segs.iter().enumerate() {
            let (start, end) = (vertices[i], vertices[j]);
            let meta = segment_meta(k, synthetic(i) || synthetic(j));

            if let Some(p) = self.edge_projection(cursor, start, end) {
                out.push(candidate(owner, SnapType::Edge, k, p, meta.clone()));
            }

            if is_perpendicular(cursor, start, end) {
                out.push(candidate(owner, SnapType::Perpendicular, k, cursor, meta));
            }
        }

        out
    }

    /// 光标在线段上的投影点
    ///
    /// 需在捕捉距离内，且离两端都至少 [`EDGE_ENDPOINT_CLEARANCE`]。
    fn edge_projection(&self, cursor: Point2, start: Point2, end: Point2) -> Option<Point2> {
        let p = closest_point_on_segment(cursor, start, end)?;

        if (p - cursor).norm() > self.snap_distance {
            return None;
        }
        if (p - start).norm() < EDGE_ENDPOINT_CLEARANCE
            || (p - end).norm() < EDGE_ENDPOINT_CLEARANCE
        {
            return None;
        }
        Some(p)
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(crate::snap::SnapConfig::default().snap_distance)
    }
}

/// `(cursor - start)` 与线段方向的夹角是否在 90° ± 5° 内
fn is_perpendicular(cursor: Point2, start: Point2, end: Point2) -> bool {
    angle_between(&(cursor - start), &(end - start))
        .map(|angle| (angle.to_degrees() - 90.0).abs() <= PERPENDICULAR_TOLERANCE_DEG)
        .unwrap_or(false)
}

fn segment_meta(segment: usize, synthetic: bool) -> CandidateMeta {
    CandidateMeta {
        vertex: None,
        segment: Some(segment),
        synthetic,
    }
}

fn candidate(
    owner: &ShapeId,
    snap_type: SnapType,
    index: usize,
    position: Point2,
    meta: CandidateMeta,
) -> SnapCandidate {
    SnapCandidate::new(
        format!("{}:{}:{}", owner, snap_type.shortcut().to_lowercase(), index),
        position,
        snap_type,
        Some(owner.clone()),
        meta,
    )
}
