//! 地块绘图实时捕捉引擎
//!
//! 从图形几何中提取特征点，按空间哈希网格建立索引，
//! 在每次光标移动时查询可锁定的位置（角点、中点、中心、边、垂直、网格点）。
//!
//! # 架构设计
//!
//! 依赖顺序（叶子在前）：
//! - `FeatureExtractor`: 单个图形 → 候选捕捉点
//! - `SpatialIndex`: 均匀哈希网格
//! - `ProximityQuery`: 置信度加权的最近点与半径查询
//! - `GridFallbackGenerator`: 光标附近的网格交点（带缓存）
//! - `SnapEngine`: 编排以上组件，负责节流更新
//!
//! # 示例
//!
//! ```rust
//! use parcel_snap_core::prelude::*;
//!
//! let mut engine = SnapEngine::new(SnapConfig::default()).unwrap();
//! let shapes = vec![Shape::rectangle("lot-1", Point2::new(0.0, 0.0), Point2::new(10.0, 10.0))];
//!
//! engine.force_update(&shapes, Some(Point2::new(9.7, 0.2)));
//! let hit = engine.find_nearest_snap_point(Point2::new(9.7, 0.2), 1.0).unwrap();
//! assert_eq!(hit.candidate.snap_type, SnapType::Endpoint);
//! ```

pub mod clock;
pub mod engine;
pub mod error;
pub mod feature;
pub mod grid;
pub mod math;
pub mod query;
pub mod shape;
pub mod snap;
pub mod spatial;

pub mod prelude {
    //! 常用类型的便捷导入
    pub use crate::clock::{Clock, ManualClock, SystemClock};
    pub use crate::engine::{SnapEngine, SnapOutcome, SnapStats};
    pub use crate::error::SnapError;
    pub use crate::feature::FeatureExtractor;
    pub use crate::grid::{GridCache, GridCacheKey, GridFallbackGenerator};
    pub use crate::math::{Point2, Vector2};
    pub use crate::query::ProximityQuery;
    pub use crate::shape::{Rotation, Shape, ShapeId, ShapeKind};
    pub use crate::snap::{CandidateMeta, SnapCandidate, SnapConfig, SnapMask, SnapMatch, SnapType};
    pub use crate::spatial::SpatialIndex;
}
