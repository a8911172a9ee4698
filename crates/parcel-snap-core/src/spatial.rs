//! 空间索引
//!
//! 均匀哈希网格，按单元存放候选捕捉点：
//! - 整体重建（每次更新都丢弃旧数据）
//! - 正方形邻域单元枚举，调用方再按欧氏距离精确过滤
//!
//! 单元大小应不小于常用查询半径，这样邻域查询只触及常数个单元。

use crate::math::Point2;
use crate::snap::SnapCandidate;
use std::collections::HashMap;

/// 网格坐标
pub type CellKey = (i64, i64);

/// 基于网格的候选点索引
#[derive(Debug)]
pub struct SpatialIndex {
    /// 网格单元大小
    cell_size: f64,

    /// 网格映射：网格坐标 -> 候选点（按强度降序）
    grid: HashMap<CellKey, Vec<SnapCandidate>>,

    /// 候选点总数
    total: usize,
}

impl SpatialIndex {
    /// 创建新的空间索引
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            grid: HashMap::new(),
            total: 0,
        }
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// 修改单元大小，已有数据按新网格重新分桶
    pub fn set_cell_size(&mut self, cell_size: f64) {
        if (cell_size - self.cell_size).abs() < f64::EPSILON {
            return;
        }
        self.cell_size = cell_size;
        let candidates: Vec<_> = self.grid.drain().flat_map(|(_, c)| c).collect();
        self.rebuild(candidates);
    }

    /// 将世界坐标转换为网格坐标
    pub fn to_grid_coord(&self, point: &Point2) -> CellKey {
        (
            (point.x / self.cell_size).floor() as i64,
            (point.y / self.cell_size).floor() as i64,
        )
    }

    /// 重建索引
    ///
    /// 清空所有单元后逐个插入，插入完成后每个单元按强度降序排列。
    pub fn rebuild(&mut self, candidates: Vec<SnapCandidate>) {
        self.grid.clear();
        self.total = 0;

        for candidate in candidates {
            if !candidate.position.x.is_finite() || !candidate.position.y.is_finite() {
                continue;
            }
            let cell = self.to_grid_coord(&candidate.position);
            self.grid.entry(cell).or_default().push(candidate);
            self.total += 1;
        }

        for cell in self.grid.values_mut() {
            // 稳定排序，同强度保持插入顺序
            cell.sort_by(|a, b| b.strength().total_cmp(&a.strength()));
        }
    }

    /// 邻域单元
    ///
    /// 返回以 `point` 所在单元为中心、半径为 `⌈radius / cell_size⌉` 个单元的
    /// 正方形邻域内所有非空单元。结果是正方形而非圆形，调用方需再按真实距离过滤。
    pub fn neighbor_cells(&self, point: &Point2, radius: f64) -> Vec<&[SnapCandidate]> {
        if self.grid.is_empty()
            || !point.x.is_finite()
            || !point.y.is_finite()
            || !radius.is_finite()
            || radius < 0.0
        {
            return Vec::new();
        }

        let (cx, cy) = self.to_grid_coord(point);
        let reach = (radius / self.cell_size).ceil() as i64;
        let span = (2 * reach as u128 + 1).saturating_pow(2);

        // 邻域比已占用单元还多时，直接扫描已占用单元
        if span > self.grid.len() as u128 {
            let mut keys: Vec<_> = self
                .grid
                .keys()
                .filter(|(gx, gy)| {
                    gx.abs_diff(cx) <= reach as u64 && gy.abs_diff(cy) <= reach as u64
                })
                .copied()
                .collect();
            keys.sort_unstable();
            return keys
                .iter()
                .filter_map(|k| self.grid.get(k).map(Vec::as_slice))
                .collect();
        }

        let mut cells = Vec::new();
        for gx in cx.saturating_sub(reach)..=cx.saturating_add(reach) {
            for gy in cy.saturating_sub(reach)..=cy.saturating_add(reach) {
                if let Some(candidates) = self.grid.get(&(gx, gy)) {
                    cells.push(candidates.as_slice());
                }
            }
        }
        cells
    }

    /// 获取单元内容
    pub fn cell(&self, key: CellKey) -> Option<&[SnapCandidate]> {
        self.grid.get(&key).map(Vec::as_slice)
    }

    /// 清空索引
    pub fn clear(&mut self) {
        self.grid.clear();
        self.total = 0;
    }

    /// 释放全部内存
    pub fn shrink(&mut self) {
        self.clear();
        self.grid.shrink_to_fit();
    }

    /// 非空单元数量
    pub fn cell_count(&self) -> usize {
        self.grid.len()
    }

    /// 候选点数量
    pub fn len(&self) -> usize {
        self.total
    }

    /// 检查是否为空
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new(crate::snap::SnapConfig::default().cell_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snap::{CandidateMeta, SnapType};

    fn cand(id: &str, x: f64, y: f64, t: SnapType) -> SnapCandidate {
        SnapCandidate::new(id.to_string(), Point2::new(x, y), t, None, CandidateMeta::default())
    }

    #[test]
    fn test_rebuild_buckets_by_floor() {
        let mut index = SpatialIndex::new(10.0);
        index.rebuild(vec![
            cand("a", 1.0, 1.0, SnapType::Edge),
            cand("b", 9.9, 0.1, SnapType::Endpoint),
            cand("c", -0.1, 5.0, SnapType::Midpoint),
            cand("d", 25.0, 31.0, SnapType::Grid),
        ]);

        assert_eq!(index.len(), 4);
        assert_eq!(index.cell_count(), 3);
        assert_eq!(index.cell((0, 0)).map(|c| c.len()), Some(2));
        assert!(index.cell((-1, 0)).is_some());
        assert!(index.cell((2, 3)).is_some());
    }

    #[test]
    fn test_cells_sorted_by_strength() {
        let mut index = SpatialIndex::new(10.0);
        index.rebuild(vec![
            cand("g", 1.0, 1.0, SnapType::Grid),
            cand("m", 2.0, 1.0, SnapType::Midpoint),
            cand("e", 3.0, 1.0, SnapType::Endpoint),
        ]);

        let types: Vec<_> = index.cell((0, 0)).unwrap().iter().map(|c| c.snap_type).collect();
        assert_eq!(types, vec![SnapType::Endpoint, SnapType::Midpoint, SnapType::Grid]);
    }

    #[test]
    fn test_rebuild_discards_previous() {
        let mut index = SpatialIndex::new(10.0);
        index.rebuild(vec![cand("a", 1.0, 1.0, SnapType::Edge)]);
        index.rebuild(vec![cand("b", 51.0, 1.0, SnapType::Edge)]);

        assert_eq!(index.len(), 1);
        assert!(index.cell((0, 0)).is_none());
    }

    #[test]
    fn test_neighbor_cells_square() {
        let mut index = SpatialIndex::new(10.0);
        index.rebuild(vec![
            cand("in", 15.0, 15.0, SnapType::Edge),
            cand("corner", 19.0, 19.0, SnapType::Edge),
            cand("far", 45.0, 5.0, SnapType::Edge),
        ]);

        // (5,5) 所在单元 (0,0)，半径 10 => 3x3 单元
        let cells = index.neighbor_cells(&Point2::new(5.0, 5.0), 10.0);
        let found: usize = cells.iter().map(|c| c.len()).sum();
        assert_eq!(found, 2);

        // 空索引或非法输入
        assert!(SpatialIndex::new(10.0).neighbor_cells(&Point2::origin(), 5.0).is_empty());
        assert!(index.neighbor_cells(&Point2::new(f64::NAN, 0.0), 5.0).is_empty());
    }

    #[test]
    fn test_far_query_point_finds_nothing() {
        let mut index = SpatialIndex::new(1.0);
        index.rebuild(
            (0..12)
                .map(|i| cand(&format!("c{i}"), i as f64 * 3.0, 0.0, SnapType::Endpoint))
                .collect(),
        );
        assert_eq!(index.cell_count(), 12);

        assert!(index.neighbor_cells(&Point2::new(1e19, 0.0), 1.0).is_empty());
        assert!(index.neighbor_cells(&Point2::new(-1e19, -1e19), 1.0).is_empty());
    }

    #[test]
    fn test_huge_radius_scans_occupied_cells() {
        let mut index = SpatialIndex::new(1.0);
        index.rebuild(vec![
            cand("a", 0.0, 0.0, SnapType::Edge),
            cand("b", 1e6, -1e6, SnapType::Edge),
        ]);

        let cells = index.neighbor_cells(&Point2::origin(), 1e7);
        assert_eq!(cells.len(), 2);
    }

    #[test]
    fn test_set_cell_size_rebuckets() {
        let mut index = SpatialIndex::new(10.0);
        index.rebuild(vec![
            cand("a", 1.0, 1.0, SnapType::Edge),
            cand("b", 6.0, 1.0, SnapType::Edge),
        ]);
        assert_eq!(index.cell_count(), 1);

        index.set_cell_size(5.0);
        assert_eq!(index.cell_count(), 2);
        assert_eq!(index.len(), 2);
    }
}
