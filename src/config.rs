// config.rs — 启动配置（JSON，全部字段带默认值）

use crate::region::RegionPolicy;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub dome_radius: f32,
    pub slices: u32,
    pub stacks: u32,
    /// 摄像头帧序列目录（真实采集设备由外部协作方落帧到这里）
    pub webcam_dir: PathBuf,
    /// 每路预录流一个帧序列目录
    pub video_dirs: Vec<PathBuf>,
    pub region_policy: RegionPolicy,
    /// 每 tick 触发一条弧线的概率
    pub arc_probability: f64,
    /// 每条弧线的采样数（含两端）
    pub arc_segments: usize,
    pub target_fps: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dome_radius: 300.0,
            slices: 30,
            stacks: 15,
            webcam_dir: PathBuf::from("frames/webcam"),
            video_dirs: vec![
                PathBuf::from("frames/tree"),
                PathBuf::from("frames/free"),
                PathBuf::from("frames/sree"),
            ],
            region_policy: RegionPolicy::FrontWedge,
            arc_probability: 0.02,
            arc_segments: 50,
            target_fps: 30,
        }
    }
}

impl Config {
    /// 无参数时用默认配置；配置不合法属于启动期致命错误。
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(p) => {
                let text = std::fs::read_to_string(p)
                    .with_context(|| format!("cannot read config {}", p.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("invalid config {}", p.display()))?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.dome_radius <= 0.0 {
            bail!("dome_radius must be > 0");
        }
        if self.slices == 0 || self.stacks == 0 {
            bail!("slices and stacks must be >= 1");
        }
        if self.video_dirs.is_empty() {
            bail!("at least one video source directory is required");
        }
        if !(0.0..=1.0).contains(&self.arc_probability) {
            bail!("arc_probability must be within [0, 1]");
        }
        if self.arc_segments < 2 {
            bail!("arc_segments must be >= 2");
        }
        if self.target_fps == 0 {
            bail!("target_fps must be >= 1");
        }
        Ok(())
    }
}
