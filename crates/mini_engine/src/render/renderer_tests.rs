//! Tests for the renderer frame loop against the headless device

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::core::config::{EngineConfig, FrameConfig};
    use crate::foundation::math::{Mat4, Vec3};
    use crate::foundation::time::Timer;
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    fn config(timeout: Option<Duration>) -> EngineConfig {
        EngineConfig::default().with_frames(
            FrameConfig::default()
                .with_frame_resource_count(3)
                .with_fence_timeout(timeout),
        )
    }

    fn renderer(config: &EngineConfig) -> (Renderer<HeadlessDevice>, SceneItems) {
        let device = HeadlessDevice::new(HeadlessConfig::default()).expect("device");
        let scene = Scene::shapes(config.frames.frame_resource_count).expect("scene");
        let handles = scene.handles;
        (Renderer::new(device, config, scene).expect("renderer"), handles)
    }

    fn camera() -> Camera {
        let mut camera = Camera::new();
        camera.set_position(0.0, 5.0, -30.0);
        camera.update_view();
        camera
    }

    fn frame(renderer: &mut Renderer<HeadlessDevice>, camera: &Camera, timer: &mut Timer) -> RenderResult<()> {
        timer.tick();
        renderer.update(camera, timer)?;
        renderer.draw()
    }

    #[test]
    fn test_frames_reach_the_gpu() {
        let config = config(Some(Duration::from_secs(5)));
        let (mut renderer, _) = renderer(&config);
        let camera = camera();
        let mut timer = Timer::new();

        for _ in 0..10 {
            frame(&mut renderer, &camera, &mut timer).expect("frame");
        }
        renderer.shutdown().expect("shutdown");

        let stats = renderer.device().queue().stats();
        assert_eq!(renderer.frames_drawn(), 10);
        assert_eq!(stats.lists_executed, 10);
        assert_eq!(stats.draws_executed, 40);
        assert_eq!(stats.invalid_draws, 0);
        assert_eq!(stats.indices_drawn, 10 * (36 + 36 + 486 + 18));
        assert_eq!(stats.signals_processed, 11);
        assert_eq!(renderer.ring().completed_fence(), 11);
    }

    #[test]
    fn test_gpu_reads_updated_transform() {
        let config = config(Some(Duration::from_secs(5)));
        let (mut renderer, handles) = renderer(&config);
        let camera = camera();
        let mut timer = Timer::new();

        let pyramid = renderer
            .render_items()
            .items()
            .find(|item| item.shape() == ShapeKind::Pyramid)
            .map(|item| item.cb_index())
            .expect("pyramid item");

        let moved = Mat4::new_translation(&Vec3::new(1.0, 2.0, 3.0));
        assert!(renderer.set_transform(handles.pyramid, moved));
        frame(&mut renderer, &camera, &mut timer).expect("frame");
        renderer.shutdown().expect("shutdown");

        let reads = renderer.device().queue().stats().last_object_reads;
        let seen = reads
            .iter()
            .find(|(index, _)| *index == pyramid)
            .map(|(_, world)| *world)
            .expect("pyramid drawn");
        assert_eq!(seen, ObjectConstants::from_world(&moved).world);
    }

    #[test]
    fn test_transform_lands_in_every_slot() {
        let config = config(Some(Duration::from_secs(5)));
        let (mut renderer, handles) = renderer(&config);
        let camera = camera();
        let mut timer = Timer::new();

        // Settle the initial uploads
        for _ in 0..3 {
            frame(&mut renderer, &camera, &mut timer).expect("frame");
        }

        let moved = Mat4::new_scaling(4.0);
        renderer.set_transform(handles.left_box, moved);

        for _ in 0..3 {
            frame(&mut renderer, &camera, &mut timer).expect("frame");
        }
        renderer.shutdown().expect("shutdown");

        let expected = ObjectConstants::from_world(&moved);
        for slot in renderer.ring().iter() {
            assert_eq!(slot.object_cb.read(0), Some(expected));
        }
        let item = renderer.render_items().get(handles.left_box).expect("item");
        assert_eq!(item.pending_frames(), 0);
    }

    #[test]
    fn test_full_ring_blocks_until_gpu_resumes() {
        let config = config(Some(Duration::from_secs(5)));
        let (mut renderer, _) = renderer(&config);
        let camera = camera();
        let mut timer = Timer::new();

        let control = renderer.device().queue().control();
        control.pause();
        for _ in 0..3 {
            frame(&mut renderer, &camera, &mut timer).expect("frame runs ahead");
        }
        assert_eq!(renderer.ring_stats().stalls, 0);

        let resumer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            control.resume();
        });

        let start = Instant::now();
        frame(&mut renderer, &camera, &mut timer).expect("fourth frame");
        assert!(start.elapsed() >= Duration::from_millis(40));
        assert_eq!(renderer.ring_stats().stalls, 1);

        resumer.join().expect("resumer");
        renderer.shutdown().expect("shutdown");
    }

    #[test]
    fn test_hung_gpu_reports_device_lost() {
        let config = config(Some(Duration::from_millis(100)));
        let (mut renderer, _) = renderer(&config);
        let camera = camera();
        let mut timer = Timer::new();

        renderer.device().queue().pause();
        for _ in 0..3 {
            frame(&mut renderer, &camera, &mut timer).expect("frame runs ahead");
        }

        let err = frame(&mut renderer, &camera, &mut timer).unwrap_err();
        assert!(matches!(err, RenderError::DeviceLost { fence: 1, .. }));

        renderer.device().queue().resume();
        renderer.shutdown().expect("drains once the GPU resumes");
    }

    #[test]
    fn test_repeated_update_stays_on_one_slot() {
        let config = config(None);
        let (mut renderer, _) = renderer(&config);
        let camera = camera();
        let timer = Timer::new();

        renderer.update(&camera, &timer).expect("update");
        renderer.update(&camera, &timer).expect("update again");
        assert_eq!(renderer.ring_stats().frames_begun, 1);
        assert_eq!(renderer.ring().current_index(), 1);

        renderer.draw().expect("draw");
        renderer.draw().expect("second draw is skipped");
        assert_eq!(renderer.frames_drawn(), 1);
    }

    #[test]
    fn test_repeated_update_still_reaches_every_slot() {
        let config = config(Some(Duration::from_secs(5)));
        let (mut renderer, handles) = renderer(&config);
        let camera = camera();
        let mut timer = Timer::new();

        for _ in 0..3 {
            frame(&mut renderer, &camera, &mut timer).expect("frame");
        }

        let moved = Mat4::new_translation(&Vec3::new(9.0, 9.0, 9.0));
        renderer.set_transform(handles.left_box, moved);
        renderer.update(&camera, &timer).expect("update");
        renderer.update(&camera, &timer).expect("update again");
        assert_eq!(
            renderer.render_items().get(handles.left_box).map(|item| item.pending_frames()),
            Some(2)
        );
        renderer.draw().expect("draw");

        for _ in 0..5 {
            frame(&mut renderer, &camera, &mut timer).expect("frame");
        }
        renderer.shutdown().expect("shutdown");

        let expected = ObjectConstants::from_world(&moved);
        let updated: Vec<bool> = renderer
            .ring()
            .iter()
            .map(|slot| slot.object_cb.read(0) == Some(expected))
            .collect();
        assert_eq!(updated, vec![true; 3]);
    }

    #[test]
    fn test_second_geometry_is_bound_once_per_frame() {
        let config = config(Some(Duration::from_secs(5)));
        let device = HeadlessDevice::new(HeadlessConfig::default()).expect("device");
        let mut scene = Scene::shapes(config.frames.frame_resource_count).expect("scene");

        let extra = Arc::new(
            geometry::GeometryBuilder::new("extra")
                .add(ShapeKind::Pyramid, &ShapeBuilder::create_pyramid(1.0, 1.0, 1.0), [1.0; 4])
                .build(),
        );
        let marker = Mat4::new_translation(&Vec3::new(0.0, 7.0, 0.0));
        scene.items.register(marker, &extra, ShapeKind::Pyramid).expect("extra item");

        let mut renderer = Renderer::new(device, &config, scene).expect("renderer");
        let camera = camera();
        let mut timer = Timer::new();
        for _ in 0..2 {
            frame(&mut renderer, &camera, &mut timer).expect("frame");
        }
        renderer.shutdown().expect("shutdown");

        let stats = renderer.device().queue().stats();
        assert_eq!(stats.geometry_binds, 2 * 2);
        assert_eq!(stats.draws_executed, 2 * 5);
        assert_eq!(stats.invalid_draws, 0);
        assert_eq!(stats.indices_drawn, 2 * (36 + 36 + 486 + 18 + 18));
        assert!(stats
            .last_object_reads
            .iter()
            .any(|(index, world)| *index == 4 && *world == ObjectConstants::from_world(&marker).world));
    }

    #[test]
    fn test_pass_constants_follow_camera() {
        let config = config(None);
        let (mut renderer, _) = renderer(&config);
        let mut camera = Camera::new();
        camera.set_position(0.0, 5.0, -30.0);
        let timer = Timer::new();

        // Stale camera: the renderer derives the view itself
        renderer.update(&camera, &timer).expect("update");
        let pass = renderer
            .ring()
            .current()
            .pass_cb
            .read(0)
            .expect("pass constants");

        assert_eq!(pass.eye_pos, [0.0, 5.0, -30.0]);
        assert_eq!(pass.view[1][3], -5.0);
        assert_eq!(pass.view[2][3], 30.0);
        assert_eq!(pass.render_target_size, [1280.0, 720.0]);
        renderer.draw().expect("draw");
    }

    #[test]
    fn test_resize_updates_aspect() {
        let config = config(None);
        let (mut renderer, _) = renderer(&config);
        let mut camera = Camera::new();

        renderer.on_resize(800, 400, &mut camera);
        assert_eq!(renderer.render_target_size(), (800, 400));
        assert!((camera.aspect() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_scene_ring_size_mismatch_rejected() {
        let config = config(None);
        let device = HeadlessDevice::new(HeadlessConfig::default()).expect("device");
        let scene = Scene::shapes(2).expect("scene");
        let result = Renderer::new(device, &config, scene);
        assert!(matches!(result, Err(RenderError::InvalidConfig(_))));
    }

    #[test]
    fn test_allocation_failure_is_fatal_init_error() {
        let config = config(None);
        let device = HeadlessDevice::new(HeadlessConfig::default().with_max_buffer_bytes(128)).expect("device");
        let scene = Scene::shapes(3).expect("scene");
        let result = Renderer::new(device, &config, scene);
        assert!(matches!(
            result,
            Err(RenderError::ResourceCreation { call: "create_upload_buffer", .. })
        ));
    }
}
