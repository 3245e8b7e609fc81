// sources.rs — 素材源池：逐帧取图 + 播尽回绕策略

use anyhow::{bail, Context, Result};
use image::RgbaImage;
use std::path::{Path, PathBuf};

/// 帧获取接口。解码属于外部协作方；回绕/重启策略归本模块管。
/// 注意：next_frame 是同步调用，卡住的解码会拖住整个 tick。
pub trait FrameSource {
    /// 向前推进一帧；播尽返回 Ok(None)
    fn next_frame(&mut self) -> Result<Option<RgbaImage>>;
    /// 回到首帧
    fn reset(&mut self) -> Result<()>;
    fn label(&self) -> &str;
}

/// 目录内按文件名排序的图片序列。逐帧解码并统一归一化为 RGBA8，
/// 渲染端拿到的 buffer 格式恒定。
pub struct ImageSequenceSource {
    label: String,
    frames: Vec<PathBuf>,
    cursor: usize,
}

impl ImageSequenceSource {
    pub fn open(label: &str, dir: &Path) -> Result<Self> {
        let mut frames: Vec<PathBuf> = std::fs::read_dir(dir)
            .with_context(|| format!("{label}: cannot read frame directory {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file())
            .collect();
        frames.sort();
        if frames.is_empty() {
            bail!("{label}: no frames in {}", dir.display());
        }
        log::info!("{label}: {} frames from {}", frames.len(), dir.display());
        Ok(Self {
            label: label.to_owned(),
            frames,
            cursor: 0,
        })
    }
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Result<Option<RgbaImage>> {
        let Some(path) = self.frames.get(self.cursor) else {
            return Ok(None);
        };
        let img = image::open(path)
            .with_context(|| format!("{}: failed to decode {}", self.label, path.display()))?;
        self.cursor += 1;
        Ok(Some(img.to_rgba8()))
    }

    fn reset(&mut self) -> Result<()> {
        self.cursor = 0;
        Ok(())
    }

    fn label(&self) -> &str {
        &self.label
    }
}

/// 池内槽位：摄像头或第 i 路视频
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolSlot {
    Webcam,
    Video(usize),
}

/// 独占持有全部解码句柄；单线程模型下无并发访问。
/// 构造时逐一试读（fail closed）：任何一路打不开都拒绝构造。
pub struct SourcePool {
    webcam: Box<dyn FrameSource>,
    videos: Vec<Box<dyn FrameSource>>,
}

fn probe(src: &mut dyn FrameSource) -> Result<()> {
    match src.next_frame()? {
        Some(_) => src.reset(),
        None => bail!("{}: source has no frames", src.label()),
    }
}

impl SourcePool {
    pub fn new(webcam: Box<dyn FrameSource>, videos: Vec<Box<dyn FrameSource>>) -> Result<Self> {
        let mut pool = Self { webcam, videos };
        probe(pool.webcam.as_mut())?;
        for v in &mut pool.videos {
            probe(v.as_mut())?;
        }
        Ok(pool)
    }

    pub fn video_count(&self) -> usize {
        self.videos.len()
    }

    /// 取当前帧并把流推进一帧。播尽时回绕到首帧重读一次；
    /// 重试仍失败按致命错误上抛（继续渲染无图的 patch 会默默破坏画面契约）。
    pub fn current_frame(&mut self, slot: PoolSlot) -> Result<RgbaImage> {
        let src = match slot {
            PoolSlot::Webcam => self.webcam.as_mut(),
            PoolSlot::Video(i) => self
                .videos
                .get_mut(i)
                .with_context(|| format!("video slot {i} out of range"))?
                .as_mut(),
        };
        if let Some(frame) = src.next_frame()? {
            return Ok(frame);
        }
        src.reset()?;
        src.next_frame()?
            .with_context(|| format!("{}: no frame after reset", src.label()))
    }
}
