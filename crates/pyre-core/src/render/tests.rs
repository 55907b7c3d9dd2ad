//! State machine tests for the batch loop controller.

use super::*;
use crate::generators;
use crate::palette::Palette;

fn test_loop() -> RenderLoop {
    let mut options = IterationOptions::with_palette(Palette::rainbow());
    options.width = 32;
    options.height = 32;
    options.batch_size = 200;
    options.parallelism = 8;
    options.batch_limit = 3;
    options.seed = 7;
    RenderLoop::new(
        generators::example(),
        options,
        PostProcessingOptions::default(),
    )
    .unwrap()
}

#[test]
fn test_initial_state_is_idle() {
    let render_loop = test_loop();
    assert_eq!(render_loop.state(), RenderState::Idle);
    assert_eq!(render_loop.batches_completed(), 0);
}

#[test]
fn test_step_is_noop_unless_running() {
    let mut render_loop = test_loop();
    assert!(!render_loop.step().unwrap());
    assert_eq!(render_loop.batches_completed(), 0);
}

#[test]
fn test_start_step_pause_cycle() {
    let mut render_loop = test_loop();

    render_loop.start();
    assert_eq!(render_loop.state(), RenderState::Running);
    assert!(render_loop.step().unwrap());
    assert_eq!(render_loop.batches_completed(), 1);

    render_loop.pause();
    assert_eq!(render_loop.state(), RenderState::Paused);
    assert!(!render_loop.step().unwrap());
    // Pausing keeps the accumulated counter
    assert_eq!(render_loop.batches_completed(), 1);

    // Resume continues from where it stopped
    render_loop.start();
    assert!(render_loop.step().unwrap());
    assert_eq!(render_loop.batches_completed(), 2);
}

#[test]
fn test_batch_limit_is_terminal() {
    let mut render_loop = test_loop();
    let mut notifications = Vec::new();
    render_loop.run_to_limit(|count| notifications.push(count)).unwrap();

    assert_eq!(render_loop.state(), RenderState::LimitReached);
    assert_eq!(notifications, vec![1, 2, 3]);

    // start() does not leave the terminal state...
    render_loop.start();
    assert!(!render_loop.step().unwrap());

    // ...but an explicit reset does
    render_loop.reset().unwrap();
    assert_eq!(render_loop.state(), RenderState::Idle);
    assert_eq!(render_loop.batches_completed(), 0);
}

#[test]
fn test_gamma_change_keeps_histogram() {
    let mut render_loop = test_loop();
    render_loop.start();
    render_loop.step().unwrap();

    render_loop
        .set_post_processing(PostProcessingOptions { gamma: 1.5 })
        .unwrap();

    assert_eq!(render_loop.batches_completed(), 1);
    assert_eq!(render_loop.state(), RenderState::Running);
}

#[test]
fn test_camera_change_clears_and_restarts() {
    let mut render_loop = test_loop();
    render_loop.start();
    render_loop.step().unwrap();
    assert_eq!(render_loop.batches_completed(), 1);

    let mut options = render_loop.options().clone();
    options.camera_zoom = 2.0;
    render_loop.set_options(options).unwrap();

    // Counter reset, still running
    assert_eq!(render_loop.batches_completed(), 0);
    assert_eq!(render_loop.state(), RenderState::Running);
}

#[test]
fn test_flame_change_while_idle_stays_idle() {
    let mut render_loop = test_loop();
    render_loop.start();
    render_loop.step().unwrap();
    render_loop.pause();

    render_loop.set_flame(generators::barnsley_fern()).unwrap();
    assert_eq!(render_loop.batches_completed(), 0);
    assert_eq!(render_loop.state(), RenderState::Idle);
}

#[test]
fn test_unchanged_options_do_not_invalidate() {
    let mut render_loop = test_loop();
    render_loop.start();
    render_loop.step().unwrap();

    let options = render_loop.options().clone();
    render_loop.set_options(options).unwrap();
    assert_eq!(render_loop.batches_completed(), 1);
}

#[test]
fn test_invalid_configurations_are_rejected() {
    let mut options = IterationOptions::with_palette(Palette::rainbow());
    options.batch_limit = 0;
    let result = RenderLoop::new(
        generators::example(),
        options,
        PostProcessingOptions::default(),
    );
    assert!(matches!(result, Err(RenderError::InvalidParameters(_))));

    let mut render_loop = test_loop();
    let result = render_loop.set_post_processing(PostProcessingOptions { gamma: -1.0 });
    assert!(matches!(result, Err(RenderError::InvalidParameters(_))));

    let result = render_loop.set_flame(crate::models::Flame::new(vec![]));
    assert!(matches!(result, Err(RenderError::InvalidParameters(_))));
}

#[test]
fn test_frame_available_in_every_state() {
    let mut render_loop = test_loop();
    // Idle: frame renders as transparent black
    let idle_frame = render_loop.frame().unwrap();
    assert!(idle_frame.iter().all(|&c| c == 0.0));

    render_loop.run_to_limit(|_| {}).unwrap();
    let final_frame = render_loop.frame().unwrap();
    assert_eq!(final_frame.len(), 32 * 32 * 4);
    assert!(final_frame.iter().any(|&c| c > 0.0));
}
