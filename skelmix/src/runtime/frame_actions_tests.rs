use crate::FrameAction;
use crate::runtime::FrameActionScheduler;
use std::sync::{Arc, Mutex};

fn recording(frames: &[f32]) -> (FrameActionScheduler, Arc<Mutex<Vec<String>>>) {
    let fired = Arc::new(Mutex::new(Vec::new()));
    let actions: Vec<FrameAction> = frames
        .iter()
        .map(|&frame| {
            let fired = Arc::clone(&fired);
            FrameAction::new(frame, format!("at {frame}"), move |ctx| {
                fired.lock().unwrap().push(ctx.action.to_string());
            })
        })
        .collect();
    (FrameActionScheduler::new(&actions), fired)
}

#[test]
fn fires_in_threshold_order_regardless_of_declaration_order() {
    let (mut scheduler, fired) = recording(&[3.0, 1.0, 2.0]);
    assert_eq!(scheduler.len(), 3);

    assert_eq!(scheduler.advance(2.5, "walk", 0), 2);
    assert_eq!(*fired.lock().unwrap(), vec!["at 1", "at 2"]);
    assert_eq!(scheduler.cursor(), 2);
}

#[test]
fn threshold_must_be_strictly_below_position() {
    let (mut scheduler, fired) = recording(&[1.0]);
    assert_eq!(scheduler.advance(1.0, "walk", 0), 0);
    assert_eq!(scheduler.advance(1.01, "walk", 0), 1);
    assert_eq!(fired.lock().unwrap().len(), 1);
}

#[test]
fn actions_fire_once_until_reset() {
    let (mut scheduler, fired) = recording(&[0.5]);
    scheduler.advance(1.0, "walk", 0);
    scheduler.advance(2.0, "walk", 0);
    assert_eq!(fired.lock().unwrap().len(), 1);

    scheduler.reset();
    assert_eq!(scheduler.cursor(), 0);
    scheduler.advance(1.0, "walk", 1);
    assert_eq!(fired.lock().unwrap().len(), 2);
}

#[test]
fn skip_to_passes_earlier_actions_silently() {
    let (mut scheduler, fired) = recording(&[1.0, 2.0, 4.0]);
    scheduler.skip_to(2.0);
    assert_eq!(scheduler.cursor(), 1);

    scheduler.advance(3.0, "walk", 0);
    assert_eq!(*fired.lock().unwrap(), vec!["at 2"]);
}

#[test]
fn context_reports_track_and_loop() {
    let seen = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&seen);
    let action = FrameAction::new(0.5, "step", move |ctx| {
        *sink.lock().unwrap() = Some((ctx.track.to_string(), ctx.frame, ctx.position, ctx.loop_count));
    });
    let mut scheduler = FrameActionScheduler::new(&[action]);
    scheduler.advance(1.5, "run", 3);

    assert_eq!(
        *seen.lock().unwrap(),
        Some(("run".to_string(), 0.5, 1.5, 3))
    );
}

#[test]
fn empty_scheduler_never_fires() {
    let mut scheduler = FrameActionScheduler::new(&[]);
    assert!(scheduler.is_empty());
    assert_eq!(scheduler.advance(100.0, "walk", 0), 0);
}
