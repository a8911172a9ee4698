//! 捕捉类型、候选点与配置
//!
//! 支持的捕捉类型（按置信度从高到低）：
//! - 端点 (Endpoint)
//! - 中点 (Midpoint)
//! - 中心 (Center)
//! - 边上最近点 (Edge)
//! - 垂直 (Perpendicular)
//! - 网格点 (Grid)
//!
//! 强度（strength）完全由类型决定，候选点本身不存储强度。

use crate::error::SnapError;
use crate::math::Point2;
use crate::shape::ShapeId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 捕捉类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapType {
    /// 端点捕捉
    Endpoint,
    /// 中点捕捉
    Midpoint,
    /// 中心捕捉
    Center,
    /// 边上投影点
    Edge,
    /// 垂直捕捉（位于光标处）
    Perpendicular,
    /// 网格点捕捉
    Grid,
}

impl SnapType {
    pub const ALL: [SnapType; 6] = [
        SnapType::Endpoint,
        SnapType::Midpoint,
        SnapType::Center,
        SnapType::Edge,
        SnapType::Perpendicular,
        SnapType::Grid,
    ];

    /// 类型对应的固定强度
    pub fn strength(&self) -> f64 {
        match self {
            SnapType::Endpoint => 1.0,
            SnapType::Midpoint => 0.8,
            SnapType::Center => 0.7,
            SnapType::Edge => 0.6,
            SnapType::Perpendicular => 0.5,
            SnapType::Grid => 0.4,
        }
    }

    /// 获取捕捉类型的快捷标记
    pub fn shortcut(&self) -> &'static str {
        match self {
            SnapType::Endpoint => "END",
            SnapType::Midpoint => "MID",
            SnapType::Center => "CEN",
            SnapType::Edge => "EDG",
            SnapType::Perpendicular => "PER",
            SnapType::Grid => "GRI",
        }
    }

    fn bit(&self) -> u8 {
        match self {
            SnapType::Endpoint => SnapMask::ENDPOINT,
            SnapType::Midpoint => SnapMask::MIDPOINT,
            SnapType::Center => SnapMask::CENTER,
            SnapType::Edge => SnapMask::EDGE,
            SnapType::Perpendicular => SnapMask::PERPENDICULAR,
            SnapType::Grid => SnapMask::GRID,
        }
    }
}

/// 捕捉掩码（位域，对应配置中的 activeTypes）
///
/// 序列化为类型名列表，例如 `["endpoint", "midpoint"]`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<SnapType>", into = "Vec<SnapType>")]
pub struct SnapMask {
    bits: u8,
}

impl SnapMask {
    pub const ENDPOINT: u8 = 1 << 0;
    pub const MIDPOINT: u8 = 1 << 1;
    pub const CENTER: u8 = 1 << 2;
    pub const EDGE: u8 = 1 << 3;
    pub const PERPENDICULAR: u8 = 1 << 4;
    pub const GRID: u8 = 1 << 5;

    pub const NONE: SnapMask = SnapMask { bits: 0 };
    pub const ALL: SnapMask = SnapMask { bits: 0b11_1111 };

    pub fn new(bits: u8) -> Self {
        Self {
            bits: bits & Self::ALL.bits,
        }
    }

    pub fn is_enabled(&self, snap_type: SnapType) -> bool {
        self.bits & snap_type.bit() != 0
    }

    pub fn set(&mut self, snap_type: SnapType, enabled: bool) {
        if enabled {
            self.bits |= snap_type.bit();
        } else {
            self.bits &= !snap_type.bit();
        }
    }

    pub fn toggle(&mut self, snap_type: SnapType) {
        let enabled = self.is_enabled(snap_type);
        self.set(snap_type, !enabled);
    }

    /// 已启用的类型
    pub fn types(&self) -> impl Iterator<Item = SnapType> + '_ {
        SnapType::ALL.into_iter().filter(|t| self.is_enabled(*t))
    }
}

impl Default for SnapMask {
    fn default() -> Self {
        Self::ALL
    }
}

impl FromIterator<SnapType> for SnapMask {
    fn from_iter<I: IntoIterator<Item = SnapType>>(iter: I) -> Self {
        let mut mask = SnapMask::NONE;
        for t in iter {
            mask.set(t, true);
        }
        mask
    }
}

impl From<Vec<SnapType>> for SnapMask {
    fn from(types: Vec<SnapType>) -> Self {
        types.into_iter().collect()
    }
}

impl From<SnapMask> for Vec<SnapType> {
    fn from(mask: SnapMask) -> Self {
        mask.types().collect()
    }
}

/// 候选点附加信息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateMeta {
    /// 来源顶点索引（端点）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertex: Option<usize>,
    /// 来源线段索引（中点、边、垂直）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment: Option<usize>,
    /// 由预览光标合成的顶点派生
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub synthetic: bool,
}

/// 捕捉候选点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapCandidate {
    pub id: String,
    pub position: Point2,
    pub snap_type: SnapType,
    /// 所属图形（网格点没有）
    pub owner: Option<ShapeId>,
    #[serde(default)]
    pub meta: CandidateMeta,
}

impl SnapCandidate {
    pub fn new(
        id: String,
        position: Point2,
        snap_type: SnapType,
        owner: Option<ShapeId>,
        meta: CandidateMeta,
    ) -> Self {
        Self {
            id,
            position,
            snap_type,
            owner,
            meta,
        }
    }

    /// 强度由类型推导
    pub fn strength(&self) -> f64 {
        self.snap_type.strength()
    }

    pub fn distance_to(&self, point: &Point2) -> f64 {
        (self.position - point).norm()
    }
}

/// 查询结果：候选点及其到查询点的距离
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapMatch {
    pub candidate: SnapCandidate,
    pub distance: f64,
}

/// 捕捉配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapConfig {
    /// 空间哈希单元大小（世界单位），应不小于常用查询半径
    pub cell_size: f64,
    /// 捕捉距离（世界单位）
    pub snap_distance: f64,
    /// 网格间距
    pub grid_spacing: f64,
    /// 启用的捕捉类型
    pub active_types: SnapMask,
    /// 两次更新之间的最小间隔（毫秒）
    pub throttle_ms: u64,
    /// 网格缓存容量
    pub grid_cache_capacity: usize,
}

impl SnapConfig {
    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    /// 检查配置是否可用
    pub fn validate(&self) -> Result<(), SnapError> {
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(SnapError::InvalidConfig(format!(
                "cell_size must be positive, got {}",
                self.cell_size
            )));
        }
        if !self.grid_spacing.is_finite() || self.grid_spacing <= 0.0 {
            return Err(SnapError::InvalidConfig(format!(
                "grid_spacing must be positive, got {}",
                self.grid_spacing
            )));
        }
        if !self.snap_distance.is_finite() || self.snap_distance < 0.0 {
            return Err(SnapError::InvalidConfig(format!(
                "snap_distance must be non-negative, got {}",
                self.snap_distance
            )));
        }
        Ok(())
    }
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            cell_size: 10.0,
            snap_distance: 1.0,
            grid_spacing: 1.0,
            active_types: SnapMask::default(),
            throttle_ms: 16, // 60Hz 下的一帧
            grid_cache_capacity: 100,
        }
    }
}
