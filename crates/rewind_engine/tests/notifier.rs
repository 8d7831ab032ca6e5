use std::time::Duration;

use pretty_assertions::assert_eq;
use rewind_engine::sim::SimNoticeSurface;
use rewind_engine::{Notifier, Settings};

const NOTICE_ID: &str = "ytr-toast";

#[tokio::test(start_paused = true)]
async fn repeated_notices_reuse_one_node() {
    let surface = SimNoticeSurface::new();
    let mut notifier = Notifier::new(surface.clone(), NOTICE_ID, Duration::from_millis(2000));

    assert!(notifier.show("first"));
    assert!(notifier.show("second"));

    assert_eq!(surface.node_count(), 1);
    let node = surface.node(NOTICE_ID).expect("node");
    assert_eq!(node.id(), NOTICE_ID);
    assert_eq!(node.text(), "second");
    assert_eq!(node.show_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn showing_again_restarts_the_hide_timer() {
    let surface = SimNoticeSurface::new();
    let mut notifier = Notifier::new(surface.clone(), NOTICE_ID, Duration::from_millis(2000));

    notifier.show("reset");
    tokio::time::sleep(Duration::from_millis(1500)).await;
    notifier.show("reset");
    tokio::time::sleep(Duration::from_millis(1500)).await;

    let node = surface.node(NOTICE_ID).expect("node");
    assert!(node.is_visible());

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(!node.is_visible());
}

#[tokio::test(start_paused = true)]
async fn settings_control_visibility_and_duration() {
    let surface = SimNoticeSurface::new();
    let mut notifier = Notifier::new(surface.clone(), NOTICE_ID, Duration::from_millis(2000));

    notifier.apply_settings(&Settings {
        show_notice: false,
        ..Settings::default()
    });
    assert!(!notifier.show("hidden"));
    assert_eq!(surface.node_count(), 0);

    notifier.apply_settings(&Settings {
        notice_duration: Duration::from_millis(5000),
        ..Settings::default()
    });
    assert!(notifier.show("shown"));
    tokio::time::sleep(Duration::from_millis(4000)).await;
    let node = surface.node(NOTICE_ID).expect("node");
    assert!(node.is_visible());
    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert!(!node.is_visible());
}
