//! 回放场景文件
//!
//! JSON 格式：捕捉配置 + 图形集合 + 光标轨迹。

use parcel_snap_core::prelude::*;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] SnapError),
}

fn default_query_radius() -> f64 {
    2.0
}

fn default_frame_ms() -> u64 {
    16
}

/// 回放场景
#[derive(Debug, Clone, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub config: SnapConfig,
    #[serde(default)]
    pub shapes: Vec<Shape>,
    /// 光标轨迹（每帧一个点）
    #[serde(default)]
    pub cursor_path: Vec<Point2>,
    /// 正在绘制的图形
    #[serde(default)]
    pub in_progress: Option<ShapeId>,
    /// 正在编辑、不参与捕捉的图形
    #[serde(default)]
    pub excluded: Vec<ShapeId>,
    /// 捕捉标记的显示半径
    #[serde(default = "default_query_radius")]
    pub query_radius: f64,
    /// 帧间隔（毫秒）
    #[serde(default = "default_frame_ms")]
    pub frame_ms: u64,
}

impl Scene {
    pub fn from_json(json: &str) -> Result<Self, SceneError> {
        let scene: Scene = serde_json::from_str(json)?;
        scene.config.validate()?;
        Ok(scene)
    }

    /// 从文件加载场景
    pub fn load(path: &Path) -> Result<Self, SceneError> {
        let json = fs::read_to_string(path)?;
        let scene = Self::from_json(&json)?;

        tracing::info!(
            "Loaded {} shapes, {} cursor samples from {}",
            scene.shapes.len(),
            scene.cursor_path.len(),
            path.display()
        );

        Ok(scene)
    }
}
