// trajectory.rs — 抛物轨迹模拟与场景累积状态

use glam::Vec3;
use rand::Rng;
use std::f32::consts::TAU;

/// 一条二次 Bezier 弧线：环外起点 → 拱起控制点 → 穹顶足印内终点。
/// 参数曲线，不做物理积分。
#[derive(Debug, Clone, Copy)]
pub struct TrajectoryArc {
    pub start: Vec3,
    pub control: Vec3,
    pub end: Vec3,
}

impl TrajectoryArc {
    /// 起点取在穹顶外 (R+100, R+300) 的环上，终点取在足印内 [0, R-10)，
    /// 控制点在水平中点上方 [R/2, R] 处拱起。
    pub fn random<R: Rng>(rng: &mut R, dome_radius: f32) -> Self {
        let angle = rng.gen_range(0.0..TAU);
        let r_start = rng.gen_range(dome_radius + 100.0..dome_radius + 300.0);
        let start = Vec3::new(r_start * angle.cos(), 0.0, r_start * angle.sin());

        let angle_end = rng.gen_range(0.0..TAU);
        let r_end = rng.gen_range(0.0..dome_radius - 10.0);
        let end = Vec3::new(r_end * angle_end.cos(), 0.0, r_end * angle_end.sin());

        let control = Vec3::new(
            (start.x + end.x) / 2.0,
            rng.gen_range(dome_radius / 2.0..=dome_radius),
            (start.z + end.z) / 2.0,
        );

        Self {
            start,
            control,
            end,
        }
    }

    /// 二次 Bezier：(1-t)²·start + 2(1-t)t·control + t²·end
    pub fn point_at(&self, t: f32) -> Vec3 {
        let u = 1.0 - t;
        u * u * self.start + 2.0 * u * t * self.control + t * t * self.end
    }
}

/// 进程生命周期内只增不减的视觉状态，每帧整体重绘。
/// 无上限累积是刻意保留的行为（落点痕迹持久存在）。
#[derive(Debug, Default)]
pub struct SceneState {
    /// 每条弧线一条 (start, end) 直线
    pub trajectories: Vec<(Vec3, Vec3)>,
    /// 每条弧线至多一个：首个进入穹顶半径的采样点
    pub dome_hits: Vec<Vec3>,
    /// 所有落在穹顶半径内的采样点（黄色轨迹）
    pub inside_tracks: Vec<Vec3>,
    /// 每条弧线无条件记录的末端采样点
    pub base_hits: Vec<Vec3>,
}

impl SceneState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc_count(&self) -> usize {
        self.trajectories.len()
    }

    /// 采样 `segments` 个等距 t ∈ [0,1]（含端点）并记录派生痕迹。
    /// 进入判定用平面半径 sqrt(x²+z²)（竖直圆柱，忽略高度）；
    /// 重入不做特殊处理，track 是累积的而非连续区间。
    pub fn record_arc(&mut self, arc: &TrajectoryArc, dome_radius: f32, segments: usize) {
        debug_assert!(segments >= 2);
        let mut entered = false;
        let mut last = arc.start;
        for i in 0..segments {
            let t = i as f32 / (segments - 1) as f32;
            let p = arc.point_at(t);
            let r = (p.x * p.x + p.z * p.z).sqrt();
            if r <= dome_radius {
                if !entered {
                    self.dome_hits.push(p);
                    entered = true;
                }
                self.inside_tracks.push(p);
            }
            last = p;
        }
        self.base_hits.push(last);
        self.trajectories.push((arc.start, arc.end));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const R: f32 = 300.0;

    fn planar_radius(p: Vec3) -> f32 {
        (p.x * p.x + p.z * p.z).sqrt()
    }

    #[test]
    fn random_arc_respects_sampling_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let arc = TrajectoryArc::random(&mut rng, R);
            let rs = planar_radius(arc.start);
            assert!(rs > R + 100.0 - 1e-3 && rs < R + 300.0 + 1e-3);
            assert!(arc.start.y == 0.0 && arc.end.y == 0.0);
            assert!(planar_radius(arc.end) < R - 10.0 + 1e-3);
            assert!(arc.control.y >= R / 2.0 && arc.control.y <= R);
            assert!((arc.control.x - (arc.start.x + arc.end.x) / 2.0).abs() < 1e-3);
            assert!((arc.control.z - (arc.start.z + arc.end.z) / 2.0).abs() < 1e-3);
        }
    }

    #[test]
    fn per_arc_accounting_invariants() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut scene = SceneState::new();
        for n in 1..=100usize {
            let arc = TrajectoryArc::random(&mut rng, R);
            let hits_before = scene.dome_hits.len();
            let tracks_before = scene.inside_tracks.len();
            scene.record_arc(&arc, R, 50);

            assert_eq!(scene.trajectories.len(), n);
            assert_eq!(scene.base_hits.len(), n);
            let hits_added = scene.dome_hits.len() - hits_before;
            assert!(hits_added <= 1);
            assert!(scene.inside_tracks.len() - tracks_before <= 50);
        }
        // 终点取在足印内，每条弧线必然进入过穹顶
        assert_eq!(scene.dome_hits.len(), 100);
    }

    #[test]
    fn first_dome_hit_is_minimum_index_inside_sample() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let arc = TrajectoryArc::random(&mut rng, R);
            let mut scene = SceneState::new();
            scene.record_arc(&arc, R, 50);

            let expected = (0..50)
                .map(|i| arc.point_at(i as f32 / 49.0))
                .find(|p| planar_radius(*p) <= R)
                .unwrap();
            assert_eq!(scene.dome_hits[0], expected);
        }
    }

    #[test]
    fn fixed_scenario_enters_once_and_lands_at_end() {
        // R=300，起点环半径 400，终点半径 100，拱高 200，50 个采样
        let arc = TrajectoryArc {
            start: Vec3::new(400.0, 0.0, 0.0),
            control: Vec3::new(250.0, 200.0, 0.0),
            end: Vec3::new(100.0, 0.0, 0.0),
        };
        let mut scene = SceneState::new();
        scene.record_arc(&arc, R, 50);

        assert_eq!(scene.dome_hits.len(), 1);
        assert!(!scene.inside_tracks.is_empty());
        assert!(scene.inside_tracks.len() < 50);
        assert_eq!(scene.base_hits[0], arc.end);
        assert_eq!(scene.trajectories[0], (arc.start, arc.end));
    }

    #[test]
    fn arc_outside_dome_still_records_base_hit() {
        // 人造弧线整条留在圆柱外：无 dome hit，base hit 照记
        let arc = TrajectoryArc {
            start: Vec3::new(500.0, 0.0, 0.0),
            control: Vec3::new(500.0, 250.0, 0.0),
            end: Vec3::new(500.0, 0.0, 0.0),
        };
        let mut scene = SceneState::new();
        scene.record_arc(&arc, R, 50);

        assert!(scene.dome_hits.is_empty());
        assert!(scene.inside_tracks.is_empty());
        assert_eq!(scene.base_hits.len(), 1);
        assert_eq!(scene.trajectories.len(), 1);
    }

    #[test]
    fn bezier_endpoints_are_exact() {
        let arc = TrajectoryArc {
            start: Vec3::new(1.0, 2.0, 3.0),
            control: Vec3::new(0.0, 10.0, 0.0),
            end: Vec3::new(-4.0, 0.0, 5.0),
        };
        assert_eq!(arc.point_at(0.0), arc.start);
        assert_eq!(arc.point_at(1.0), arc.end);
    }
}
