//! 捕捉引擎
//!
//! 独占空间索引和网格缓存，对外提供更新与查询：
//! - `update`：按帧节流，窗口内的调用直接丢弃（不排队）
//! - `force_update`：跳过节流，开始新交互时使用
//! - `find_nearest_snap_point` / `find_snap_points_in_radius`：只读查询
//!
//! 单线程同步调用，不支持在回调中重入同一个实例。

use crate::clock::{Clock, SystemClock};
use crate::error::SnapError;
use crate::feature::FeatureExtractor;
use crate::grid::GridFallbackGenerator;
use crate::math::Point2;
use crate::query::ProximityQuery;
use crate::shape::{Shape, ShapeId};
use crate::snap::{SnapConfig, SnapMask, SnapMatch, SnapType};
use crate::spatial::SpatialIndex;
use serde::Serialize;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// 引擎统计信息
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapStats {
    pub cell_count: usize,
    pub total_candidates: usize,
    pub cell_size: f64,
    pub snap_distance: f64,
    /// 累计重建次数
    pub rebuilds: u64,
    pub grid_cache_entries: usize,
    pub grid_generations: u64,
    pub disposed: bool,
}

/// 光标锁定结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapOutcome {
    /// 锁定后的位置（未命中时为原光标）
    pub position: Point2,
    pub matched: Option<SnapMatch>,
}

impl SnapOutcome {
    pub fn is_snapped(&self) -> bool {
        self.matched.is_some()
    }
}

/// 捕捉引擎
#[derive(Debug)]
pub struct SnapEngine<C: Clock = SystemClock> {
    config: SnapConfig,
    extractor: FeatureExtractor,
    index: SpatialIndex,
    grid: GridFallbackGenerator,
    clock: C,
    /// 上次成功更新的时间
    last_update: Option<Duration>,
    /// 正在绘制的图形
    in_progress: Option<ShapeId>,
    /// 不参与捕捉的图形（正在移动/缩放）
    excluded: HashSet<ShapeId>,
    rebuilds: u64,
    disposed: bool,
}

impl SnapEngine<SystemClock> {
    pub fn new(config: SnapConfig) -> Result<Self, SnapError> {
        Self::with_clock(config, SystemClock::new())
    }
}

impl Default for SnapEngine<SystemClock> {
    fn default() -> Self {
        Self::build(SnapConfig::default(), SystemClock::new())
    }
}

impl<C: Clock> SnapEngine<C> {
    /// 使用指定时间源创建
    pub fn with_clock(config: SnapConfig, clock: C) -> Result<Self, SnapError> {
        config.validate()?;
        Ok(Self::build(config, clock))
    }

    fn build(config: SnapConfig, clock: C) -> Self {
        Self {
            extractor: FeatureExtractor::new(config.snap_distance),
            index: SpatialIndex::new(config.cell_size),
            grid: GridFallbackGenerator::new(config.grid_spacing, config.grid_cache_capacity),
            config,
            clock,
            last_update: None,
            in_progress: None,
            excluded: HashSet::new(),
            rebuilds: 0,
            disposed: false,
        }
    }

    /// 获取配置
    pub fn config(&self) -> &SnapConfig {
        &self.config
    }

    /// 替换配置
    ///
    /// 单元大小变化时已有候选点重新分桶；网格间距或缓存容量变化时缓存清空。
    pub fn set_config(&mut self, config: SnapConfig) -> Result<(), SnapError> {
        config.validate()?;

        self.index.set_cell_size(config.cell_size);
        self.extractor.set_snap_distance(config.snap_distance);
        if config.grid_cache_capacity != self.config.grid_cache_capacity {
            self.grid = GridFallbackGenerator::new(config.grid_spacing, config.grid_cache_capacity);
        } else {
            self.grid.set_spacing(config.grid_spacing);
        }
        self.config = config;
        Ok(())
    }

    /// 设置捕捉距离，非法值被忽略
    pub fn set_snap_distance(&mut self, snap_distance: f64) {
        if !snap_distance.is_finite() || snap_distance < 0.0 {
            warn!(snap_distance, "ignoring invalid snap distance");
            return;
        }
        self.config.snap_distance = snap_distance;
        self.extractor.set_snap_distance(snap_distance);
    }

    /// 设置启用的捕捉类型，立即作用于后续查询
    pub fn set_active_types(&mut self, active_types: SnapMask) {
        self.config.active_types = active_types;
    }

    pub fn active_types(&self) -> SnapMask {
        self.config.active_types
    }

    /// 标记正在绘制的图形，更新时把光标作为它的合成末尾顶点
    pub fn set_in_progress(&mut self, shape: Option<ShapeId>) {
        self.in_progress = shape;
    }

    /// 设置不参与捕捉的图形
    pub fn set_excluded_shapes<I>(&mut self, shapes: I)
    where
        I: IntoIterator<Item = ShapeId>,
    {
        self.excluded = shapes.into_iter().collect();
    }

    /// 节流更新
    ///
    /// 距上次成功更新不足节流间隔时什么也不做，返回 `false`。
    pub fn update(&mut self, shapes: &[Shape], cursor: Option<Point2>) -> bool {
        let now = self.clock.now();
        if let Some(last) = self.last_update {
            let elapsed = now.saturating_sub(last);
            if elapsed < self.config.throttle() {
                trace!(?elapsed, "snap update throttled");
                return false;
            }
        }
        self.rebuild(shapes, cursor, now)
    }

    /// 跳过节流，立即重建
    pub fn force_update(&mut self, shapes: &[Shape], cursor: Option<Point2>) -> bool {
        let now = self.clock.now();
        self.rebuild(shapes, cursor, now)
    }

    fn rebuild(&mut self, shapes: &[Shape], cursor: Option<Point2>, now: Duration) -> bool {
        if self.disposed {
            warn!("update called on a disposed snap engine");
            return false;
        }

        let mut candidates = Vec::new();
        for shape in shapes {
            if self.excluded.contains(&shape.id) {
                continue;
            }
            match cursor {
                Some(live) if self.in_progress.as_ref() == Some(&shape.id) => {
                    candidates.extend(self.extractor.extract_preview(shape, live, cursor));
                }
                _ => candidates.extend(self.extractor.extract(shape, cursor)),
            }
        }

        let shape_candidates = candidates.len();
        let grid = match cursor {
            Some(cursor) if self.config.active_types.is_enabled(SnapType::Grid) => {
                self.grid.generate(cursor, self.config.snap_distance)
            }
            _ => Vec::new(),
        };
        let grid_candidates = grid.len();
        candidates.extend(grid);

        self.index.rebuild(candidates);
        self.last_update = Some(now);
        self.rebuilds += 1;

        debug!(
            shapes = shapes.len(),
            candidates = shape_candidates,
            grid = grid_candidates,
            cells = self.index.cell_count(),
            "snap index rebuilt"
        );
        true
    }

    fn query(&self) -> ProximityQuery<'_> {
        ProximityQuery::new(&self.index, self.config.active_types)
    }

    /// 置信度加权的最近捕捉点
    pub fn find_nearest_snap_point(&self, point: Point2, max_distance: f64) -> Option<SnapMatch> {
        self.query().find_nearest(point, max_distance)
    }

    /// 半径内的全部捕捉点（用于显示捕捉标记）
    pub fn find_snap_points_in_radius(&self, point: Point2, radius: f64) -> Vec<SnapMatch> {
        self.query().find_in_radius(point, radius)
    }

    /// 光标锁定：在捕捉距离内找到候选点就锁定到它
    pub fn snap(&self, cursor: Point2) -> SnapOutcome {
        match self.find_nearest_snap_point(cursor, self.config.snap_distance) {
            Some(m) => SnapOutcome {
                position: m.candidate.position,
                matched: Some(m),
            },
            None => SnapOutcome {
                position: cursor,
                matched: None,
            },
        }
    }

    /// 清空索引与网格缓存，下一次 `update` 不受节流限制
    pub fn clear(&mut self) {
        self.index.clear();
        self.grid.clear_cache();
        self.last_update = None;
    }

    /// 释放全部状态，之后的更新不再生效
    pub fn dispose(&mut self) {
        self.index.shrink();
        self.grid.clear_cache();
        self.in_progress = None;
        self.excluded.clear();
        self.last_update = None;
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// 统计信息
    pub fn stats(&self) -> SnapStats {
        SnapStats {
            cell_count: self.index.cell_count(),
            total_candidates: self.index.len(),
            cell_size: self.index.cell_size(),
            snap_distance: self.config.snap_distance,
            rebuilds: self.rebuilds,
            grid_cache_entries: self.grid.cache().len(),
            grid_generations: self.grid.generations(),
            disposed: self.disposed,
        }
    }
}
