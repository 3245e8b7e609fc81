// mesh.rs — 穹顶网格生成（上半球，按 stack/slice 切分为四边形 patch）

use glam::Vec3;
use std::f32::consts::{FRAC_PI_2, PI};

/// patch 的 (stack, slice) 网格地址
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchIndex {
    pub stack: u32,
    pub slice: u32,
}

/// 球面坐标下的一个四边形 patch，θ ∈ [0, π/2]，φ ∈ [0, 2π)
#[derive(Debug, Clone, Copy)]
pub struct DomePatch {
    pub theta0: f32,
    pub theta1: f32,
    pub phi0: f32,
    pub phi1: f32,
    pub radius: f32,
}

impl DomePatch {
    /// 球面 → 笛卡尔：(r·sinθ·cosφ, r·cosθ, r·sinθ·sinφ)，apex 在 +Y
    pub fn vertex(&self, theta: f32, phi: f32) -> Vec3 {
        Vec3::new(
            self.radius * theta.sin() * phi.cos(),
            self.radius * theta.cos(),
            self.radius * theta.sin() * phi.sin(),
        )
    }

    /// 四个角点，顺序 (θ0,φ0) (θ1,φ0) (θ1,φ1) (θ0,φ1)
    pub fn corners(&self) -> [Vec3; 4] {
        [
            self.vertex(self.theta0, self.phi0),
            self.vertex(self.theta1, self.phi0),
            self.vertex(self.theta1, self.phi1),
            self.vertex(self.theta0, self.phi1),
        ]
    }

    pub fn theta_mid(&self) -> f32 {
        (self.theta0 + self.theta1) / 2.0
    }

    /// φ 中点，归一化到 (-π, π]
    pub fn phi_mid(&self) -> f32 {
        let avg = (self.phi0 + self.phi1) / 2.0;
        if avg > PI {
            avg - 2.0 * PI
        } else {
            avg
        }
    }
}

/// 行主序（先 stack 后 slice）生成全部 patch。
/// 纯计算、可重复迭代，不携带跨帧可变状态。
pub fn dome_patches(
    radius: f32,
    slices: u32,
    stacks: u32,
) -> impl Iterator<Item = (PatchIndex, DomePatch)> {
    (0..stacks).flat_map(move |i| {
        (0..slices).map(move |j| {
            let theta0 = (i as f32 / stacks as f32) * FRAC_PI_2;
            let theta1 = ((i + 1) as f32 / stacks as f32) * FRAC_PI_2;
            let phi0 = (j as f32 / slices as f32) * 2.0 * PI;
            let phi1 = ((j + 1) as f32 / slices as f32) * 2.0 * PI;
            (
                PatchIndex { stack: i, slice: j },
                DomePatch {
                    theta0,
                    theta1,
                    phi0,
                    phi1,
                    radius,
                },
            )
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_count_matches_grid() {
        assert_eq!(dome_patches(300.0, 30, 15).count(), 30 * 15);
        assert_eq!(dome_patches(1.0, 1, 1).count(), 1);
    }

    #[test]
    fn angles_cover_upper_hemisphere() {
        for (_, p) in dome_patches(300.0, 30, 15) {
            assert!(p.theta0 < p.theta1);
            assert!(p.theta1 <= FRAC_PI_2 + 1e-6);
            assert!(p.phi0 >= 0.0);
            assert!(p.phi0 < p.phi1);
            assert!(p.phi1 <= 2.0 * PI + 1e-6);
        }
    }

    #[test]
    fn row_major_stack_then_slice() {
        let idx: Vec<PatchIndex> = dome_patches(300.0, 3, 2).map(|(i, _)| i).collect();
        assert_eq!(idx[0], PatchIndex { stack: 0, slice: 0 });
        assert_eq!(idx[1], PatchIndex { stack: 0, slice: 1 });
        assert_eq!(idx[3], PatchIndex { stack: 1, slice: 0 });
    }

    #[test]
    fn apex_vertex_sits_on_y_axis() {
        let (_, p) = dome_patches(300.0, 30, 15).next().unwrap();
        let v = p.vertex(0.0, p.phi0);
        assert!(v.x.abs() < 1e-4 && v.z.abs() < 1e-4);
        assert!((v.y - 300.0).abs() < 1e-4);
    }

    #[test]
    fn phi_mid_normalized_into_signed_range() {
        // 最后一个 slice 的 φ 中点应落在 (-π, π]
        let last = dome_patches(300.0, 30, 15)
            .find(|(i, _)| i.slice == 29)
            .unwrap()
            .1;
        let m = last.phi_mid();
        assert!(m > -PI && m <= PI);
        assert!(m < 0.0); // φ_avg > π 时减去 2π
    }

    #[test]
    fn corners_lie_on_sphere() {
        for (_, p) in dome_patches(250.0, 8, 4) {
            for c in p.corners() {
                assert!((c.length() - 250.0).abs() < 1e-3);
            }
        }
    }
}
