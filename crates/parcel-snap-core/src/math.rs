//! 数学基础类型与几何辅助函数
//!
//! 基于 nalgebra 的 2D 点/向量别名，以及捕捉计算中反复用到的几个小工具。

use nalgebra as na;

/// 2D 点
pub type Point2 = na::Point2<f64>;

/// 2D 向量
pub type Vector2 = na::Vector2<f64>;

/// 浮点比较容差
pub const EPSILON: f64 = 1e-10;

/// 绕 `center` 逆时针旋转 `angle` 弧度
pub fn rotate_about(point: Point2, center: Point2, angle: f64) -> Point2 {
    let (sin, cos) = angle.sin_cos();
    let d = point - center;
    Point2::new(
        center.x + d.x * cos - d.y * sin,
        center.y + d.x * sin + d.y * cos,
    )
}

/// 两点中点
pub fn midpoint(a: Point2, b: Point2) -> Point2 {
    Point2::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

/// 点集的算术平均（空集返回 `None`）
pub fn centroid(points: &[Point2]) -> Option<Point2> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Some(Point2::new(sx / n, sy / n))
}

/// 点到线段的最近点
///
/// 投影参数 `t` 被钳制到 `[0, 1]`。零长度线段返回 `None`，
/// 避免除零产生 NaN。
pub fn closest_point_on_segment(point: Point2, start: Point2, end: Point2) -> Option<Point2> {
    let v = end - start;
    let len_sq = v.dot(&v);
    if len_sq < EPSILON {
        return None;
    }

    let t = ((point - start).dot(&v) / len_sq).clamp(0.0, 1.0);
    Some(start + v * t)
}

/// 两向量夹角（弧度，范围 `[0, π]`）
///
/// 任一向量长度为零时返回 `None`。
pub fn angle_between(a: &Vector2, b: &Vector2) -> Option<f64> {
    let denom = a.norm() * b.norm();
    if denom < EPSILON {
        return None;
    }
    // 浮点误差可能让余弦略超出 [-1, 1]
    let cos = (a.dot(b) / denom).clamp(-1.0, 1.0);
    Some(cos.acos())
}
