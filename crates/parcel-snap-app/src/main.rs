//! 捕捉引擎场景回放工具
//!
//! 读取 JSON 场景，按帧把光标轨迹喂给引擎（和交互层的调用方式一致），
//! 每帧输出一行 JSON：锁定结果与捕捉标记。

mod scene;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use parcel_snap_core::prelude::*;
use scene::Scene;

#[derive(Parser, Debug)]
#[command(name = "parcel-snap", about = "Replay a cursor path against the snap engine")]
struct Args {
    /// 场景文件（JSON）
    scene: PathBuf,

    /// 输出半径内的全部捕捉标记
    #[arg(long)]
    indicators: bool,

    /// 调试日志
    #[arg(short, long)]
    verbose: bool,
}

/// 单帧输出
#[derive(Serialize)]
struct FrameReport<'a> {
    frame: usize,
    cursor: Point2,
    rebuilt: bool,
    snap: &'a SnapOutcome,
    indicator_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    indicators: Option<&'a [SnapMatch]>,
}

/// 回放光标轨迹
///
/// 时钟按场景帧间隔推进，节流行为与真实交互一致且可复现。
fn replay<W: Write>(scene: &Scene, show_indicators: bool, out: &mut W) -> Result<SnapStats> {
    let clock = ManualClock::new();
    let mut engine = SnapEngine::with_clock(scene.config.clone(), clock.clone())?;
    engine.set_in_progress(scene.in_progress.clone());
    engine.set_excluded_shapes(scene.excluded.iter().cloned());

    let frame = Duration::from_millis(scene.frame_ms);
    for (i, &cursor) in scene.cursor_path.iter().enumerate() {
        // 第一帧需要立即可用的索引
        let rebuilt = if i == 0 {
            engine.force_update(&scene.shapes, Some(cursor))
        } else {
            engine.update(&scene.shapes, Some(cursor))
        };

        let snap = engine.snap(cursor);
        let indicators = engine.find_snap_points_in_radius(cursor, scene.query_radius);

        let report = FrameReport {
            frame: i,
            cursor,
            rebuilt,
            snap: &snap,
            indicator_count: indicators.len(),
            indicators: show_indicators.then_some(indicators.as_slice()),
        };
        serde_json::to_writer(&mut *out, &report)?;
        writeln!(out)?;

        clock.advance(frame);
    }

    let stats = engine.stats();
    engine.dispose();
    Ok(stats)
}

fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志（输出到 stderr，stdout 留给 JSON）
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    tracing::subscriber::set_global_default(
        FmtSubscriber::builder()
            .with_max_level(level)
            .with_writer(io::stderr)
            .finish(),
    )?;

    let scene = Scene::load(&args.scene)
        .with_context(|| format!("failed to load scene {}", args.scene.display()))?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let stats = replay(&scene, args.indicators, &mut out)?;
    out.flush()?;

    info!(
        "Replayed {} frames: {} rebuilds, {} candidates in {} cells, {} grid generations",
        scene.cursor_path.len(),
        stats.rebuilds,
        stats.total_candidates,
        stats.cell_count,
        stats.grid_generations
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene() -> Scene {
        Scene::from_json(
            r#"{
                "shapes": [
                    {"id": "lot", "type": "rectangle", "points": [[0, 0], [10, 10]]}
                ],
                "cursor_path": [[0.3, 0.7], [0.35, 0.7], [9.8, 0.1]],
                "frame_ms": 10
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_replay_outputs_one_line_per_frame() {
        let mut out = Vec::new();
        let stats = replay(&scene(), false, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);

        // 帧间隔 10ms < 16ms：第二帧被节流，第三帧（20ms 后）重建
        assert_eq!(lines[0]["rebuilt"], true);
        assert_eq!(lines[1]["rebuilt"], false);
        assert_eq!(lines[2]["rebuilt"], true);
        assert_eq!(stats.rebuilds, 2);

        // 第三帧锁定到 (10,0) 端点
        let snap = &lines[2]["snap"];
        assert_eq!(snap["matched"]["candidate"]["snap_type"], "endpoint");
        assert_eq!(snap["position"], serde_json::json!([10.0, 0.0]));
        assert!(lines[2].get("indicators").is_none());
    }

    #[test]
    fn test_replay_with_indicators() {
        let mut out = Vec::new();
        replay(&scene(), true, &mut out).unwrap();

        let first: serde_json::Value =
            serde_json::from_str(String::from_utf8(out).unwrap().lines().next().unwrap()).unwrap();
        let indicators = first["indicators"].as_array().unwrap();
        assert_eq!(indicators.len() as u64, first["indicator_count"].as_u64().unwrap());
        assert!(indicators
            .iter()
            .any(|m| m["candidate"]["snap_type"] == "grid"));
    }
}
