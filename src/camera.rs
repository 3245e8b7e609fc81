// camera.rs — 视角状态与取景变换（yaw/pitch/zoom → 眼睛位置）

use glam::{Mat4, Vec3};
use std::f32::consts::FRAC_PI_2;

pub const BASE_DISTANCE: f32 = 1000.0;
pub const MIN_ZOOM: f32 = 0.1;
const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.1;

/// 离散按键的步进量
pub const YAW_STEP: f32 = 0.05;
pub const PITCH_STEP: f32 = 0.05;
pub const ZOOM_STEP: f32 = 0.1;
/// Ctrl+左键按住时每 tick 的持续变焦量（按帧生效，不是按键事件）
pub const ZOOM_DIAL_RATE: f32 = 0.005;

/// 显式的相机状态，穿过输入层和渲染层传递，不用全局量。
/// yaw 不设界（三角函数天然回绕）；pitch、zoom 带夹取。
#[derive(Debug, Clone, Copy)]
pub struct CameraState {
    pub yaw: f32,
    pub pitch: f32,
    pub zoom: f32,
}

impl CameraState {
    pub fn new() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            zoom: 1.0,
        }
    }

    pub fn yaw_by(&mut self, delta: f32) {
        self.yaw += delta;
    }

    pub fn pitch_by(&mut self, delta: f32) {
        self.pitch = (self.pitch + delta).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    pub fn zoom_by(&mut self, delta: f32) {
        self.zoom = (self.zoom + delta).max(MIN_ZOOM);
    }

    /// 持续变焦拨盘：调用方每个调度 tick 调一次（只要按住就生效）
    pub fn zoom_dial(&mut self) {
        self.zoom_by(-ZOOM_DIAL_RATE);
    }

    /// 纯函数：相同输入给出逐位相同的输出
    pub fn eye_position(&self, dome_radius: f32) -> Vec3 {
        let distance = BASE_DISTANCE * self.zoom;
        Vec3::new(
            distance * self.yaw.sin() * self.pitch.cos(),
            distance * self.pitch.sin() + dome_radius / 2.0,
            distance * self.yaw.cos() * self.pitch.cos(),
        )
    }

    /// 视线目标固定在穹顶半高处
    pub fn target(dome_radius: f32) -> Vec3 {
        Vec3::new(0.0, dome_radius / 2.0, 0.0)
    }

    /// 45° 视锥，near 0.1 / far 3000
    pub fn view_proj(&self, dome_radius: f32, aspect: f32) -> Mat4 {
        let proj = Mat4::perspective_rh(45f32.to_radians(), aspect.max(1e-6), 0.1, 3000.0);
        let view = Mat4::look_at_rh(
            self.eye_position(dome_radius),
            Self::target(dome_radius),
            Vec3::Y,
        );
        proj * view
    }
}

impl Default for CameraState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eye_position_reference_pose() {
        // yaw=0, pitch=0, zoom=1, R=300 → (0, 150, 1000)
        let cam = CameraState::new();
        let eye = cam.eye_position(300.0);
        assert_eq!(eye, Vec3::new(0.0, 150.0, 1000.0));
        assert_eq!(CameraState::target(300.0), Vec3::new(0.0, 150.0, 0.0));
    }

    #[test]
    fn eye_position_is_pure() {
        let cam = CameraState {
            yaw: 1.3,
            pitch: 0.4,
            zoom: 2.5,
        };
        assert_eq!(cam.eye_position(300.0), cam.eye_position(300.0));
    }

    #[test]
    fn pitch_stays_clamped() {
        let mut cam = CameraState::new();
        for _ in 0..1000 {
            cam.pitch_by(PITCH_STEP);
        }
        assert!(cam.pitch < FRAC_PI_2 - 0.1 + 1e-6);
        for _ in 0..2000 {
            cam.pitch_by(-PITCH_STEP);
        }
        assert!(cam.pitch > -(FRAC_PI_2 - 0.1) - 1e-6);
    }

    #[test]
    fn zoom_floor_clamped_unbounded_above() {
        let mut cam = CameraState::new();
        for _ in 0..1000 {
            cam.zoom_by(-ZOOM_STEP);
        }
        assert!((cam.zoom - MIN_ZOOM).abs() < 1e-6);
        for _ in 0..1000 {
            cam.zoom_by(ZOOM_STEP);
        }
        assert!(cam.zoom > 50.0);
    }

    #[test]
    fn zoom_dial_respects_floor() {
        let mut cam = CameraState::new();
        for _ in 0..10_000 {
            cam.zoom_dial();
        }
        assert!((cam.zoom - MIN_ZOOM).abs() < 1e-6);
    }
}
