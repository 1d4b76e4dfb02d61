mod cli;
mod mesh;
mod overlay;
mod shaders;
mod summary;
mod viewer;

use std::sync::Arc;

use anyhow::{Context, Result, ensure};
use clap::Parser;
use orion_scene::camera::{CameraLens, FreeMoveController, OrbitRig};
use orion_scene::dialogue::{GuideMode, GuideState};
use orion_scene::input::{InputQueue, MoveKey, MovementIntent, PointerClick, SceneInput};
use orion_scene::pick::handle_click;
use orion_scene::scene::{OrionScene, SceneConfig};
use glam::Vec3;
use pollster::FutureExt;
use wgpu::SurfaceError;
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, Event, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

use cli::Args;
use viewer::ViewerState;

/// Initial orbit pivot and eye, matching the scene's framing of the cube.
const INITIAL_TARGET: Vec3 = Vec3::ZERO;
const INITIAL_EYE: Vec3 = Vec3::new(0.0, 10.0, 25.0);

/// A press-release pair only counts as a click while the accumulated drag
/// stays under this many pixels.
const CLICK_DRAG_THRESHOLD: f64 = 5.0;

fn move_key_for(code: KeyCode) -> Option<MoveKey> {
    match code {
        KeyCode::KeyW => Some(MoveKey::Forward),
        KeyCode::KeyS => Some(MoveKey::Backward),
        KeyCode::KeyA => Some(MoveKey::Left),
        KeyCode::KeyD => Some(MoveKey::Right),
        _ => None,
    }
}

fn guide_panel_lines(guide: &GuideState, max_cols: usize) -> Vec<String> {
    let mode_label = match guide.mode() {
        GuideMode::Idle => "idle",
        GuideMode::Engaged => "engaged",
    };
    let mut lines = vec![format!("Orion [{mode_label}]")];
    lines.extend(overlay::wrap_message(guide.message(), max_cols));
    lines
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::init();

    ensure!(
        args.move_speed > 0.0 && args.move_speed.is_finite(),
        "move_speed must be a positive number (got {})",
        args.move_speed
    );

    let scene_config = SceneConfig {
        star_count: args.star_count,
        star_seed: args.star_seed,
    };
    let scene = Arc::new(OrionScene::build(&scene_config));
    println!(
        "Scene built: {} objects ({} stars requested, seed {})",
        scene.objects().len(),
        args.star_count,
        args.star_seed
            .map(|seed| seed.to_string())
            .unwrap_or_else(|| "os".to_string())
    );

    if let Some(path) = args.dump_scene.as_ref() {
        summary::write_scene_summary(&scene, path)
            .with_context(|| format!("dumping scene summary to {}", path.display()))?;
        println!("Scene summary exported to {}", path.display());
    }

    if args.headless {
        println!("Headless mode requested; viewer window bootstrap skipped.");
        return Ok(());
    }

    let event_loop = EventLoop::new().context("creating winit event loop")?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Orion Scene")
            .with_inner_size(PhysicalSize::new(1280, 720))
            .build(&event_loop)
            .context("creating viewer window")?,
    );

    let mut state = ViewerState::new(window, scene.clone()).block_on()?;

    let input_queue = InputQueue::new();
    let mut intent = MovementIntent::default();
    let mut guide = GuideState::new();
    let mut rig = OrbitRig::framing(INITIAL_TARGET, INITIAL_EYE);
    let mover = FreeMoveController::new(args.move_speed);
    let lens = CameraLens::default();

    let mut cursor: Option<(f64, f64)> = None;
    let mut left_down = false;
    let mut drag_distance = 0.0f64;

    event_loop
        .run(move |event, target| {
            target.set_control_flow(ControlFlow::Poll);

            match event {
                Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
                    match event {
                        WindowEvent::CloseRequested => target.exit(),
                        WindowEvent::KeyboardInput {
                            event:
                                KeyEvent {
                                    physical_key: PhysicalKey::Code(code),
                                    state: key_state,
                                    ..
                                },
                            ..
                        } => {
                            if code == KeyCode::Escape && key_state == ElementState::Pressed {
                                target.exit();
                            } else if let Some(key) = move_key_for(code) {
                                input_queue.push(SceneInput::Key {
                                    key,
                                    pressed: key_state == ElementState::Pressed,
                                });
                            }
                        }
                        WindowEvent::CursorMoved { position, .. } => {
                            if let Some((last_x, last_y)) = cursor {
                                if left_down {
                                    let dx = position.x - last_x;
                                    let dy = position.y - last_y;
                                    drag_distance += dx.abs() + dy.abs();
                                    rig.apply_drag(dx as f32, dy as f32);
                                }
                            }
                            cursor = Some((position.x, position.y));
                        }
                        WindowEvent::MouseInput {
                            state: button_state,
                            button: MouseButton::Left,
                            ..
                        } => match button_state {
                            ElementState::Pressed => {
                                left_down = true;
                                drag_distance = 0.0;
                            }
                            ElementState::Released => {
                                left_down = false;
                                if drag_distance < CLICK_DRAG_THRESHOLD {
                                    if let Some((x, y)) = cursor {
                                        input_queue.push(SceneInput::Click(PointerClick {
                                            x: x as f32,
                                            y: y as f32,
                                        }));
                                    }
                                }
                            }
                        },
                        WindowEvent::MouseWheel { delta, .. } => {
                            let steps = match delta {
                                MouseScrollDelta::LineDelta(_, y) => y,
                                MouseScrollDelta::PixelDelta(position) => {
                                    (position.y / 40.0) as f32
                                }
                            };
                            rig.apply_zoom(steps);
                        }
                        WindowEvent::Resized(new_size) => state.resize(new_size),
                        WindowEvent::RedrawRequested => {
                            let clicks = input_queue.drain_into(&mut intent);

                            let size = state.size();
                            let width = size.width as f32;
                            let height = size.height as f32;
                            let pose = rig.pose();
                            for click in clicks {
                                if handle_click(
                                    &scene, &pose, &lens, click, width, height, &mut guide,
                                ) {
                                    let lines =
                                        guide_panel_lines(&guide, state.overlay_columns());
                                    state.set_guide_lines(&lines);
                                }
                            }

                            rig.apply_free_move(&mover, &intent);
                            rig.update();

                            let pose = rig.pose();
                            let aspect = if height > 0.0 { width / height } else { 0.0 };
                            if let Some(view_projection) = lens.view_projection(&pose, aspect) {
                                match state.render(view_projection) {
                                    Ok(()) => {}
                                    Err(SurfaceError::Lost) => state.resize(state.size()),
                                    Err(SurfaceError::OutOfMemory) => target.exit(),
                                    Err(err) => log::warn!("render error: {err:?}"),
                                }
                            }
                        }
                        _ => {}
                    }
                }
                Event::AboutToWait => state.window().request_redraw(),
                _ => {}
            }
        })
        .context("running viewer application")?;
    Ok(())
}

#[cfg(test)]
mod main_tests {
    use super::*;

    #[test]
    fn wasd_maps_onto_movement_keys() {
        assert_eq!(move_key_for(KeyCode::KeyW), Some(MoveKey::Forward));
        assert_eq!(move_key_for(KeyCode::KeyS), Some(MoveKey::Backward));
        assert_eq!(move_key_for(KeyCode::KeyA), Some(MoveKey::Left));
        assert_eq!(move_key_for(KeyCode::KeyD), Some(MoveKey::Right));
        assert_eq!(move_key_for(KeyCode::Space), None);
    }

    #[test]
    fn panel_lines_carry_mode_and_message() {
        let mut guide = GuideState::new();
        guide.set_mode(GuideMode::Engaged);
        guide.answer("crypto");
        let lines = guide_panel_lines(&guide, 70);
        assert_eq!(lines[0], "Orion [engaged]");
        assert!(lines.len() > 1);
        assert!(lines[1].contains("cryptocurrencies"));
    }
}
