//! Shapes demo application
//!
//! Renders the box, grid and pyramid scene through the headless device with
//! scripted input standing in for a window: the camera walks forward, then a
//! left-button drag turns it while the pyramid spins in place.

use std::path::Path;

use mini_engine::config::Config;
use mini_engine::core::config::EngineConfig;
use mini_engine::foundation::logging;
use mini_engine::foundation::math::utils::deg_to_rad;
use mini_engine::foundation::time::Timer;
use mini_engine::input::{CameraController, KeyCode, MouseButton};
use mini_engine::render::scene::pyramid_transform;
use mini_engine::render::{Camera, HeadlessConfig, HeadlessDevice, RenderDevice, RenderResult, Renderer, Scene};

const FRAME_COUNT: u64 = 600;
const WALK_UNTIL: u64 = 120;
const DRAG_FRAMES: std::ops::Range<u64> = 200..260;
const PYRAMID_SPIN_RATE: f32 = 0.5;

fn load_config() -> EngineConfig {
    match std::env::args().nth(1) {
        Some(path) => match EngineConfig::load_from_file(Path::new(&path)) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config '{path}': {e}, using defaults");
                EngineConfig::default()
            }
        },
        None => EngineConfig::default(),
    }
}

fn camera_from_config(config: &EngineConfig) -> Camera {
    let [x, y, z] = config.camera.position;
    let mut camera = Camera::new();
    camera.set_position(x, y, z);
    camera.set_frustum(
        deg_to_rad(config.camera.fov_y_degrees),
        config.window.aspect_ratio(),
        config.camera.near,
        config.camera.far,
    );
    camera.update_view();
    camera
}

/// Feed this frame's scripted events to the controller
fn script_input(controller: &mut CameraController, frame: u64) {
    match frame {
        0 => controller.handle_key(KeyCode::W, true),
        WALK_UNTIL => controller.handle_key(KeyCode::W, false),
        _ => {}
    }

    if frame == DRAG_FRAMES.start {
        controller.handle_mouse_button(MouseButton::Left, true, 640.0, 360.0);
    } else if DRAG_FRAMES.contains(&frame) {
        let step = (frame - DRAG_FRAMES.start) as f32;
        controller.handle_mouse_move(640.0 + step * 2.0, 360.0 + step * 0.5);
    } else if frame == DRAG_FRAMES.end {
        controller.handle_mouse_button(MouseButton::Left, false, 760.0, 390.0);
    }

    if frame + 1 == FRAME_COUNT {
        controller.handle_key(KeyCode::Escape, true);
    }
}

fn run(config: &EngineConfig) -> RenderResult<()> {
    let device = HeadlessDevice::new(HeadlessConfig::from_frame_config(&config.frames))?;
    let scene = Scene::shapes(config.frames.frame_resource_count)?;
    let pyramid = scene.handles.pyramid;
    let mut renderer = Renderer::new(device, config, scene)?;

    let mut camera = camera_from_config(config);
    let mut controller = CameraController::new(config.input.clone());
    let mut timer = Timer::new();

    log::info!(
        "Rendering {} frames with {} frame resources",
        FRAME_COUNT,
        config.frames.frame_resource_count
    );

    for frame in 0..FRAME_COUNT {
        timer.tick();
        script_input(&mut controller, frame);
        controller.apply(&mut camera);

        let spin = pyramid_transform(timer.total_time() * PYRAMID_SPIN_RATE);
        renderer.set_transform(pyramid, spin.to_matrix());

        renderer.update(&camera, &timer)?;
        renderer.draw()?;

        if controller.quit_requested() {
            log::info!("Quit requested at frame {frame}");
            break;
        }
    }

    renderer.shutdown()?;

    let ring = renderer.ring_stats();
    let queue = renderer.device().queue().stats();
    log::info!(
        "Drew {} frames: {} stalls, {:.2?} blocked on the fence, last fence {}",
        renderer.frames_drawn(),
        ring.stalls,
        ring.wait_time,
        ring.last_fence
    );
    log::info!(
        "GPU executed {} lists, {} draws ({} indices), {} invalid",
        queue.lists_executed,
        queue.draws_executed,
        queue.indices_drawn,
        queue.invalid_draws
    );
    let position = camera.position();
    log::info!(
        "Camera ended at ({:.2}, {:.2}, {:.2}), last measured at {:.1} fps",
        position.x,
        position.y,
        position.z,
        timer.fps()
    );
    Ok(())
}

fn main() {
    let config = load_config();
    logging::init(&config.log_level);

    if let Err(e) = config.validate() {
        log::error!("Invalid configuration: {e}");
        eprintln!("Invalid configuration: {e}");
        std::process::exit(1);
    }
    log::info!("Starting '{}'", config.window.title);

    if let Err(e) = run(&config) {
        log::error!("Renderer failed: {e}");
        eprintln!("Renderer failed: {e}");
        std::process::exit(1);
    }
}
