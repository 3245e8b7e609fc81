// main.rs — 事件循环：输入映射、30Hz tick 调度、轨迹触发与渲染派发

mod camera;
mod config;
mod mesh;
mod region;
mod renderer;
mod sources;
mod trajectory;

use camera::CameraState;
use config::Config;
use renderer::Renderer;
use sources::{FrameSource, ImageSequenceSource, SourcePool};
use trajectory::{SceneState, TrajectoryArc};

use anyhow::Result;
use rand::Rng;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::{
    dpi::LogicalSize,
    event::*,
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

fn main() -> Result<()> {
    env_logger::init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = Config::load(config_path.as_deref())?;
    log::info!(
        "dome radius {}, {}x{} patches, policy {:?}",
        config.dome_radius,
        config.slices,
        config.stacks,
        config.region_policy
    );

    // 素材源池：任何一路打不开就在进入渲染循环前退出（fail closed）
    let webcam: Box<dyn FrameSource> =
        Box::new(ImageSequenceSource::open("webcam", &config.webcam_dir)?);
    let videos = config
        .video_dirs
        .iter()
        .enumerate()
        .map(|(i, dir)| {
            ImageSequenceSource::open(&format!("video{i}"), dir)
                .map(|s| Box::new(s) as Box<dyn FrameSource>)
        })
        .collect::<Result<Vec<_>>>()?;
    let mut pool = SourcePool::new(webcam, videos)?;
    log::info!("opened webcam + {} video sources", pool.video_count());

    let event_loop = EventLoop::new();
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Dome Projection")
            .with_inner_size(LogicalSize::new(800, 600))
            .build(&event_loop)?,
    );

    let mut renderer = pollster::block_on(Renderer::new(window.clone(), &config))?;
    let mut cam = CameraState::new();
    let mut scene = SceneState::new();
    let mut rng = rand::thread_rng();

    // 交互状态
    let mut mouse_pressed = false;
    let mut ctrl_held = false;

    // tick 调度与 FPS 统计
    let frame_interval = Duration::from_secs_f64(1.0 / config.target_fps as f64);
    let mut last_tick = Instant::now();
    let mut last_fps_time = Instant::now();
    let mut frame_count = 0u32;
    let mut fps = 0.0f32;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        match event {
            Event::WindowEvent { event, .. } => {
                let response = renderer.egui_state.on_event(&renderer.egui_ctx, &event);
                if response.consumed {
                    return;
                }

                match event {
                    WindowEvent::CloseRequested => {
                        *control_flow = ControlFlow::Exit;
                    }

                    WindowEvent::Resized(new_size) => {
                        renderer.resize(new_size);
                    }

                    WindowEvent::ModifiersChanged(mods) => {
                        ctrl_held = mods.ctrl();
                    }

                    WindowEvent::KeyboardInput { input, .. } => {
                        if input.state == ElementState::Pressed {
                            match input.virtual_keycode {
                                Some(VirtualKeyCode::Left) => cam.yaw_by(-camera::YAW_STEP),
                                Some(VirtualKeyCode::Right) => cam.yaw_by(camera::YAW_STEP),
                                Some(VirtualKeyCode::Up) => cam.pitch_by(camera::PITCH_STEP),
                                Some(VirtualKeyCode::Down) => cam.pitch_by(-camera::PITCH_STEP),
                                // 加号拉近（zoom 因子变小），减号拉远
                                Some(VirtualKeyCode::Plus)
                                | Some(VirtualKeyCode::Equals)
                                | Some(VirtualKeyCode::NumpadAdd) => {
                                    cam.zoom_by(-camera::ZOOM_STEP)
                                }
                                Some(VirtualKeyCode::Minus)
                                | Some(VirtualKeyCode::NumpadSubtract) => {
                                    cam.zoom_by(camera::ZOOM_STEP)
                                }
                                Some(VirtualKeyCode::Escape) => {
                                    *control_flow = ControlFlow::Exit;
                                }
                                _ => {}
                            }
                        }
                    }

                    WindowEvent::MouseInput { state, button, .. } => {
                        if button == MouseButton::Left {
                            mouse_pressed = state == ElementState::Pressed;
                        }
                    }

                    _ => {}
                }
            }

            Event::RedrawRequested(_) => {
                // 持续变焦：Ctrl+左键按住时按帧生效，而不是按 key-down 事件
                if mouse_pressed && ctrl_held {
                    cam.zoom_dial();
                }

                // 概率触发一条新弧线，派生痕迹全部落进 SceneState
                if rng.gen::<f64>() < config.arc_probability {
                    let arc = TrajectoryArc::random(&mut rng, config.dome_radius);
                    scene.record_arc(&arc, config.dome_radius, config.arc_segments);
                }

                // 素材帧上传；回绕重试失败是该源的致命错误
                if let Err(e) = renderer.upload_frames(&mut pool) {
                    log::error!("frame source failed: {e:#}");
                    *control_flow = ControlFlow::Exit;
                    return;
                }

                renderer.update_camera(&cam, config.dome_radius);

                // FPS 统计
                frame_count += 1;
                let now = Instant::now();
                if now.duration_since(last_fps_time).as_secs_f32() >= 1.0 {
                    fps = frame_count as f32 / now.duration_since(last_fps_time).as_secs_f32();
                    frame_count = 0;
                    last_fps_time = now;
                }

                let render_result = renderer.render_with_ui(&window, &scene, |ctx| {
                    draw_status_bar(ctx, &scene, &cam, fps);
                });

                match render_result {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => renderer.resize(renderer.size),
                    Err(wgpu::SurfaceError::OutOfMemory) => *control_flow = ControlFlow::Exit,
                    Err(e) => log::warn!("render error: {e:?}"),
                }
            }

            Event::MainEventsCleared => {
                // 固定 30Hz：间隔没到就不请求重绘
                if last_tick.elapsed() >= frame_interval {
                    last_tick = Instant::now();
                    window.request_redraw();
                }
            }

            _ => {}
        }
    });
}

fn draw_status_bar(ctx: &egui::Context, scene: &SceneState, cam: &CameraState, fps: f32) {
    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            ui.label(format!("Arcs: {}", scene.arc_count()));
            ui.label("|");
            ui.label(format!("Dome hits: {}", scene.dome_hits.len()));
            ui.label("|");
            ui.label(format!("Inside tracks: {}", scene.inside_tracks.len()));
            ui.label("|");
            ui.label(format!("Base hits: {}", scene.base_hits.len()));
            ui.label("|");
            ui.label(format!("Yaw: {:.2}", cam.yaw));
            ui.label("|");
            ui.label(format!("Pitch: {:.2}", cam.pitch));
            ui.label("|");
            ui.label(format!("Zoom: {:.2}", cam.zoom));
            ui.label("|");
            ui.label(format!("FPS: {fps:.1}"));
        });
    });
}
