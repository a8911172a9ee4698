//! 邻近查询
//!
//! 在空间索引上做最近点和半径查询。最近点不是单纯的最近邻：
//! 两个候选点距离相近（差值小于 [`SIMILAR_DISTANCE`]）时优先强度高的，
//! 所以角点会压过边上的投影点。

use crate::math::Point2;
use crate::snap::{SnapCandidate, SnapMask, SnapMatch};
use crate::spatial::SpatialIndex;

/// 距离差小于此值视为"差不多远"，改按强度比较
pub const SIMILAR_DISTANCE: f64 = 3.0;

/// 半径查询排序时视为等距的差值
pub const DISTANCE_TIE: f64 = 0.01;

/// 只读查询视图
#[derive(Debug, Clone, Copy)]
pub struct ProximityQuery<'a> {
    index: &'a SpatialIndex,
    active: SnapMask,
}

impl<'a> ProximityQuery<'a> {
    pub fn new(index: &'a SpatialIndex, active: SnapMask) -> Self {
        Self { index, active }
    }

    /// 半径内且类型已启用的候选点及其距离
    fn within(
        &self,
        point: Point2,
        radius: f64,
    ) -> impl Iterator<Item = (&'a SnapCandidate, f64)> + 'a {
        let (index, active) = (self.index, self.active);
        index
            .neighbor_cells(&point, radius)
            .into_iter()
            .flatten()
            .filter(move |c| active.is_enabled(c.snap_type))
            .map(move |c| (c, c.distance_to(&point)))
            .filter(move |(_, d)| *d <= radius)
    }

    /// 置信度加权的最近捕捉点
    ///
    /// 没有候选点落在 `max_distance` 内时返回 `None`。
    pub fn find_nearest(&self, point: Point2, max_distance: f64) -> Option<SnapMatch> {
        let mut best: Option<(&SnapCandidate, f64)> = None;

        for (c, dist) in self.within(point, max_distance) {
            best = match best {
                None => Some((c, dist)),
                Some((b, best_dist)) => {
                    if (dist - best_dist).abs() < SIMILAR_DISTANCE {
                        if c.strength() > b.strength() {
                            Some((c, dist))
                        } else {
                            Some((b, best_dist))
                        }
                    } else if dist < best_dist {
                        Some((c, dist))
                    } else {
                        Some((b, best_dist))
                    }
                }
            };
        }

        best.map(|(c, distance)| SnapMatch {
            candidate: c.clone(),
            distance,
        })
    }

    /// 半径内全部候选点
    ///
    /// 按距离升序；距离差小于 [`DISTANCE_TIE`] 的相邻项按强度降序。
    pub fn find_in_radius(&self, point: Point2, radius: f64) -> Vec<SnapMatch> {
        let mut matches: Vec<SnapMatch> = self
            .within(point, radius)
            .map(|(c, distance)| SnapMatch {
                candidate: c.clone(),
                distance,
            })
            .collect();

        matches.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        order_ties(&mut matches);
        matches
    }
}

/// 把距离差不多的连续项按强度降序重排
///
/// 以每段第一个元素的距离为基准划分，保证比较器是全序。
fn order_ties(matches: &mut [SnapMatch]) {
    let mut start = 0;
    while start < matches.len() {
        let base = matches[start].distance;
        let mut end = start + 1;
        while end < matches.len() && matches[end].distance - base < DISTANCE_TIE {
            end += 1;
        }
        matches[start..end]
            .sort_by(|a, b| b.candidate.strength().total_cmp(&a.candidate.strength()));
        start = end;
    }
}
