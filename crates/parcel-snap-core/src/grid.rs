//! 网格兜底捕捉
//!
//! 只在光标附近生成规则网格交点，开销与场景中图形数量无关。
//! 生成范围是光标所在网格单元的四个角点，再按搜索半径
//! `max(snap_distance, 2.0)` 过滤。
//!
//! 结果按 (光标网格单元, 搜索半径) 缓存，容量有限，满了淘汰最早的条目。
//! 缓存的是单元角点，距离过滤每次都针对真实光标重新做。

use crate::math::Point2;
use crate::snap::{CandidateMeta, SnapCandidate, SnapType};
use std::collections::{HashMap, VecDeque};

/// 搜索半径下限（世界单位）
pub const MIN_SEARCH_RADIUS: f64 = 2.0;

/// 缓存键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridCacheKey {
    /// 光标所在网格单元
    pub cell: (i64, i64),
    /// 搜索半径（按位比较）
    radius_bits: u64,
}

impl GridCacheKey {
    pub fn new(cell: (i64, i64), radius: f64) -> Self {
        Self {
            cell,
            radius_bits: radius.to_bits(),
        }
    }
}

/// 有界缓存，先进先出淘汰
#[derive(Debug)]
pub struct GridCache {
    capacity: usize,
    entries: HashMap<GridCacheKey, Vec<Point2>>,
    /// 插入顺序
    order: VecDeque<GridCacheKey>,
}

impl GridCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        }
    }

    pub fn get(&self, key: &GridCacheKey) -> Option<&[Point2]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// 插入条目，超出容量时淘汰最早插入的条目
    pub fn insert(&mut self, key: GridCacheKey, points: Vec<Point2>) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.insert(key, points).is_some() {
            return;
        }
        self.order.push_back(key);

        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    pub fn contains(&self, key: &GridCacheKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

/// 网格交点生成器
#[derive(Debug)]
pub struct GridFallbackGenerator {
    /// 网格间距
    spacing: f64,
    cache: GridCache,
    /// 实际生成（缓存未命中）的次数
    generations: u64,
}

impl GridFallbackGenerator {
    pub fn new(spacing: f64, cache_capacity: usize) -> Self {
        Self {
            spacing,
            cache: GridCache::new(cache_capacity),
            generations: 0,
        }
    }

    /// 搜索半径
    pub fn search_radius(snap_distance: f64) -> f64 {
        snap_distance.max(MIN_SEARCH_RADIUS)
    }

    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    /// 修改网格间距（缓存随之失效）
    pub fn set_spacing(&mut self, spacing: f64) {
        if spacing != self.spacing {
            self.spacing = spacing;
            self.cache.clear();
        }
    }

    /// 光标附近的网格候选点
    ///
    /// 不会返回离光标超过搜索半径的点。
    pub fn generate(&mut self, cursor: Point2, snap_distance: f64) -> Vec<SnapCandidate> {
        if !cursor.x.is_finite() || !cursor.y.is_finite() {
            return Vec::new();
        }

        let radius = Self::search_radius(snap_distance);
        let cell = (
            (cursor.x / self.spacing).floor() as i64,
            (cursor.y / self.spacing).floor() as i64,
        );
        let key = GridCacheKey::new(cell, radius);

        let corners = match self.cache.get(&key) {
            Some(corners) => corners.to_vec(),
            None => {
                tracing::trace!(?cell, radius, "grid cache miss");
                let corners = self.lattice_corners(cell);
                self.cache.insert(key, corners.clone());
                corners
            }
        };

        corners
            .into_iter()
            .filter(|p| (p - cursor).norm() <= radius)
            .map(|p| self.candidate(p))
            .collect()
    }

    /// 网格单元的四个角点
    fn lattice_corners(&mut self, (i, j): (i64, i64)) -> Vec<Point2> {
        self.generations += 1;
        let s = self.spacing;
        let (x0, y0) = (i as f64 * s, j as f64 * s);
        let (x1, y1) = (i.saturating_add(1) as f64 * s, j.saturating_add(1) as f64 * s);
        vec![
            Point2::new(x0, y0),
            Point2::new(x1, y0),
            Point2::new(x0, y1),
            Point2::new(x1, y1),
        ]
    }

    fn candidate(&self, position: Point2) -> SnapCandidate {
        let ix = (position.x / self.spacing).round() as i64;
        let iy = (position.y / self.spacing).round() as i64;
        SnapCandidate::new(
            format!("grid:{}:{}", ix, iy),
            position,
            SnapType::Grid,
            None,
            CandidateMeta::default(),
        )
    }

    /// 生成次数（不含缓存命中）
    pub fn generations(&self) -> u64 {
        self.generations
    }

    pub fn cache(&self) -> &GridCache {
        &self.cache
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

impl Default for GridFallbackGenerator {
    fn default() -> Self {
        let config = crate::snap::SnapConfig::default();
        Self::new(config.grid_spacing, config.grid_cache_capacity)
    }
}
