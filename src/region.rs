// region.rs — 区域分类：每个 patch 由哪个素材源供图

use crate::mesh::{DomePatch, PatchIndex};
use anyhow::{bail, Result};
use serde::Deserialize;
use std::f32::consts::{FRAC_PI_4, PI};

/// 顶部（靠近极点）多大范围交给摄像头
const WEBCAM_THETA_LIMIT: f32 = 0.3;
/// 正面楔形区的半角（总宽 90°）
const WEDGE_HALF_ANGLE: f32 = FRAC_PI_4;

/// 一个 patch 的纹理来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchSource {
    Webcam,
    Video(usize),
    /// 无纹理：画成不混合的纯黑四边形
    Blank,
}

/// 两种独立演化出来的分配策略，二选一，不做合并
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionPolicy {
    /// 前四分之一 slice 给摄像头，其余 slice 按下标轮转分给各视频
    QuadrantSplit,
    /// 顶部给摄像头；|φ| ≤ π/4 的正面楔形均分给各视频；其余留黑
    FrontWedge,
}

pub struct RegionClassifier {
    policy: RegionPolicy,
    slices: u32,
    video_count: usize,
}

impl RegionClassifier {
    pub fn new(policy: RegionPolicy, slices: u32, video_count: usize) -> Result<Self> {
        if slices == 0 {
            bail!("slices must be >= 1");
        }
        if video_count == 0 {
            bail!("at least one video source is required");
        }
        Ok(Self {
            policy,
            slices,
            video_count,
        })
    }

    /// 对每个 patch 恰好返回一个来源；Video(i) 保证 i < video_count。
    /// 阈值都是常量，逐帧重算也稳定。
    pub fn classify(&self, index: PatchIndex, patch: &DomePatch) -> PatchSource {
        match self.policy {
            RegionPolicy::QuadrantSplit => self.classify_quadrant(index),
            RegionPolicy::FrontWedge => self.classify_wedge(patch),
        }
    }

    fn classify_quadrant(&self, index: PatchIndex) -> PatchSource {
        let webcam_slices = self.slices / 4;
        if index.slice < webcam_slices {
            PatchSource::Webcam
        } else {
            // 轮转分配：按剩余 slice 的相对下标取模
            let i = (index.slice - webcam_slices) as usize % self.video_count;
            PatchSource::Video(i)
        }
    }

    fn classify_wedge(&self, patch: &DomePatch) -> PatchSource {
        if patch.theta_mid() < WEBCAM_THETA_LIMIT {
            return PatchSource::Webcam;
        }
        let phi = patch.phi_mid();
        if phi.abs() <= WEDGE_HALF_ANGLE {
            // 把 [-π/4, π/4] 映射到 [0, 1) 再均分成 video_count 段
            let seg_ratio = (phi + WEDGE_HALF_ANGLE) / (PI / 2.0);
            let i = (seg_ratio * self.video_count as f32) as usize;
            PatchSource::Video(i.min(self.video_count - 1))
        } else {
            PatchSource::Blank
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::dome_patches;

    fn classifier(policy: RegionPolicy, slices: u32, videos: usize) -> RegionClassifier {
        RegionClassifier::new(policy, slices, videos).unwrap()
    }

    #[test]
    fn rejects_zero_counts() {
        assert!(RegionClassifier::new(RegionPolicy::FrontWedge, 0, 3).is_err());
        assert!(RegionClassifier::new(RegionPolicy::QuadrantSplit, 30, 0).is_err());
    }

    #[test]
    fn video_index_always_in_range() {
        for policy in [RegionPolicy::QuadrantSplit, RegionPolicy::FrontWedge] {
            let c = classifier(policy, 30, 3);
            for (idx, patch) in dome_patches(300.0, 30, 15) {
                if let PatchSource::Video(i) = c.classify(idx, &patch) {
                    assert!(i < 3, "{:?} gave out-of-range video {}", policy, i);
                }
            }
        }
    }

    #[test]
    fn quadrant_split_last_slice_is_valid_video() {
        // slices=30, videos=3：最后一个 slice（29）必须落在合法视频下标上
        let c = classifier(RegionPolicy::QuadrantSplit, 30, 3);
        let (idx, patch) = dome_patches(300.0, 30, 15)
            .find(|(i, _)| i.slice == 29)
            .unwrap();
        match c.classify(idx, &patch) {
            PatchSource::Video(i) => assert!(i < 3),
            other => panic!("expected video, got {:?}", other),
        }
    }

    #[test]
    fn quadrant_split_front_quarter_is_webcam() {
        let c = classifier(RegionPolicy::QuadrantSplit, 32, 4);
        for (idx, patch) in dome_patches(300.0, 32, 4) {
            let got = c.classify(idx, &patch);
            if idx.slice < 8 {
                assert_eq!(got, PatchSource::Webcam);
            } else {
                assert_eq!(got, PatchSource::Video((idx.slice as usize - 8) % 4));
            }
        }
    }

    #[test]
    fn quadrant_split_never_blank() {
        let c = classifier(RegionPolicy::QuadrantSplit, 30, 3);
        for (idx, patch) in dome_patches(300.0, 30, 15) {
            assert_ne!(c.classify(idx, &patch), PatchSource::Blank);
        }
    }

    #[test]
    fn wedge_top_is_webcam_regardless_of_phi() {
        let c = classifier(RegionPolicy::FrontWedge, 30, 3);
        for (idx, patch) in dome_patches(300.0, 30, 15) {
            if patch.theta_mid() < 0.3 {
                assert_eq!(c.classify(idx, &patch), PatchSource::Webcam);
            }
        }
    }

    #[test]
    fn wedge_segments_map_linearly() {
        let c = classifier(RegionPolicy::FrontWedge, 360, 4);
        // 在 θ 足够大的一行里，楔形内 φ 单调递增时视频下标单调不减
        let mut last = 0usize;
        let mut seen = vec![false; 4];
        for (idx, patch) in dome_patches(300.0, 360, 15) {
            if idx.stack != 10 {
                continue;
            }
            let phi = patch.phi_mid();
            if phi.abs() <= FRAC_PI_4 && phi >= 0.0 {
                match c.classify(idx, &patch) {
                    PatchSource::Video(i) => {
                        assert!(i >= last);
                        last = i;
                        seen[i] = true;
                    }
                    other => panic!("expected video in wedge, got {:?}", other),
                }
            }
        }
        assert!(seen[2] && seen[3], "upper wedge half should cover last segments");
    }

    #[test]
    fn wedge_back_of_dome_is_blank() {
        let c = classifier(RegionPolicy::FrontWedge, 30, 3);
        let mut blanks = 0;
        for (idx, patch) in dome_patches(300.0, 30, 15) {
            if patch.theta_mid() >= 0.3 && patch.phi_mid().abs() > FRAC_PI_4 {
                assert_eq!(c.classify(idx, &patch), PatchSource::Blank);
                blanks += 1;
            }
        }
        assert!(blanks > 0);
    }
}
