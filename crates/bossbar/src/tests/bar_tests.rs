use super::*;
use crate::{ChannelObserver, Observer, ObserverError};
use tokio::sync::mpsc::UnboundedReceiver;

struct RejectingObserver {
    id: ObserverId,
}

impl Observer for RejectingObserver {
    fn id(&self) -> ObserverId {
        self.id
    }

    fn is_connected(&self) -> bool {
        true
    }

    fn send(&self, _event: BossEvent) -> Result<(), ObserverError> {
        Err(ObserverError::Rejected {
            observer_id: self.id,
            reason: "socket closed".into(),
        })
    }
}

fn drain(rx: &mut UnboundedReceiver<BossEvent>) -> Vec<BossEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn new_bar_is_full_purple_and_sends_nothing() {
    let bar = BossBar::new(false);
    assert_eq!(bar.percentage(), 100.0);
    assert_eq!(bar.color(), BarColor::Purple);
    assert_eq!(bar.observer_count(), 0);
    assert!(!bar.is_closed());
}

#[tokio::test]
async fn bar_ids_are_unique() {
    let first = BossBar::new(false);
    let second = BossBar::new(false);
    assert_ne!(first.id(), second.id());
    assert_eq!(first.identity(), first.id());
}

#[tokio::test]
async fn adding_observer_sends_show_once() {
    let bar = BossBar::new(true);
    let (observer, mut rx) = ChannelObserver::handle(ObserverId(1));

    bar.add_observer(Arc::clone(&observer)).await.expect("add");
    bar.add_observer(observer).await.expect("add again");

    let events = drain(&mut rx);
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        BossEvent::Show { bar_id, darken_screen: true, color: BarColor::Purple, .. } if *bar_id == bar.id()
    ));
    assert_eq!(bar.observer_count(), 1);
}

#[tokio::test]
async fn percentage_is_clamped_and_broadcast_as_fraction() {
    let bar = BossBar::new(false);
    let (observer, mut rx) = ChannelObserver::handle(ObserverId(1));
    bar.add_observer(observer).await.expect("add");
    drain(&mut rx);

    bar.set_percentage(150).await.expect("over");
    assert_eq!(bar.percentage(), 100.0);
    bar.set_percentage(-5).await.expect("under");
    assert_eq!(bar.percentage(), 0.0);
    bar.set_percentage(40).await.expect("mid");
    assert!((bar.health_fraction() - 0.4).abs() < f32::EPSILON);

    let events = drain(&mut rx);
    assert_eq!(events.len(), 3);
    assert!(matches!(
        events[2],
        BossEvent::HealthPercent { health_percent, .. } if (health_percent - 0.4).abs() < f32::EPSILON
    ));
}

#[tokio::test]
async fn full_title_joins_subtitle_after_blank_line() {
    let bar = BossBar::new(false);
    let (observer, mut rx) = ChannelObserver::handle(ObserverId(1));
    bar.add_observer(observer).await.expect("add");

    bar.set_title("Ender Dragon").await.expect("title");
    assert_eq!(bar.full_title(), "Ender Dragon");
    bar.set_sub_title("Phase 2").await.expect("sub title");
    assert_eq!(bar.full_title(), "Ender Dragon\n\nPhase 2");

    let events = drain(&mut rx);
    assert!(matches!(
        events.last(),
        Some(BossEvent::Title { title, .. }) if title == "Ender Dragon\n\nPhase 2"
    ));
}

#[tokio::test]
async fn color_change_resends_show() {
    let bar = BossBar::new(false);
    let (observer, mut rx) = ChannelObserver::handle(ObserverId(1));
    bar.add_observer(observer).await.expect("add");
    drain(&mut rx);

    bar.set_color(BarColor::Red).await.expect("color");

    let events = drain(&mut rx);
    assert!(matches!(
        events.as_slice(),
        [BossEvent::Show { color: BarColor::Red, .. }]
    ));
}

#[tokio::test]
async fn removing_unknown_observer_is_a_no_op() {
    let bar = BossBar::new(false);
    let (observer, mut rx) = ChannelObserver::handle(ObserverId(1));
    bar.add_observer(observer).await.expect("add");
    drain(&mut rx);

    bar.remove_observer(ObserverId(42)).await;
    assert_eq!(bar.observer_count(), 1);
    assert!(drain(&mut rx).is_empty());

    bar.remove_observer(ObserverId(1)).await;
    assert_eq!(bar.observer_count(), 0);
    assert!(matches!(drain(&mut rx).as_slice(), [BossEvent::Hide { .. }]));
}

#[tokio::test]
async fn hide_and_show_keep_registration() {
    let bar = BossBar::new(false);
    let (observer, mut rx) = ChannelObserver::handle(ObserverId(1));
    bar.add_observer(observer).await.expect("add");
    drain(&mut rx);

    bar.hide_from_all().await;
    bar.show_to_all().await;

    assert_eq!(bar.observer_count(), 1);
    let events = drain(&mut rx);
    assert!(matches!(
        events.as_slice(),
        [BossEvent::Hide { .. }, BossEvent::Show { .. }]
    ));
}

#[tokio::test]
async fn failing_observer_does_not_stop_the_batch() {
    let bar = BossBar::new(false);
    let rejecting: ObserverHandle = Arc::new(RejectingObserver { id: ObserverId(1) });
    let (healthy, mut rx) = ChannelObserver::handle(ObserverId(2));

    bar.attach_observers(&[rejecting, healthy])
        .await
        .expect("attach");
    bar.set_percentage(10).await.expect("percentage");

    assert_eq!(bar.observer_count(), 2);
    assert_eq!(drain(&mut rx).len(), 2);
}

#[tokio::test]
async fn disconnected_observer_is_skipped() {
    let bar = BossBar::new(false);
    let (gone, rx) = ChannelObserver::handle(ObserverId(1));
    drop(rx);
    let (healthy, mut healthy_rx) = ChannelObserver::handle(ObserverId(2));

    bar.add_observers(&[gone, healthy]).await.expect("add");
    bar.set_color(BarColor::Green).await.expect("color");

    assert_eq!(drain(&mut healthy_rx).len(), 2);
}

#[tokio::test]
async fn detach_then_attach_round_trips_observers() {
    let bar = BossBar::new(false);
    let (observer, mut rx) = ChannelObserver::handle(ObserverId(7));
    bar.add_observer(observer).await.expect("add");
    drain(&mut rx);

    let snapshot = bar.observers();
    bar.detach_observers(&snapshot).await.expect("detach");
    assert_eq!(bar.observer_count(), 0);
    bar.attach_observers(&snapshot).await.expect("attach");
    assert!(bar.has_observer(ObserverId(7)));

    let events = drain(&mut rx);
    assert!(matches!(
        events.as_slice(),
        [BossEvent::Hide { .. }, BossEvent::Show { .. }]
    ));
}

#[tokio::test]
async fn closed_bar_rejects_mutation() {
    let bar = BossBar::new(false);
    let (observer, mut rx) = ChannelObserver::handle(ObserverId(1));
    bar.add_observer(observer).await.expect("add");
    drain(&mut rx);

    bar.close().await;
    assert!(bar.is_closed());
    assert_eq!(bar.observer_count(), 0);
    assert!(matches!(drain(&mut rx).as_slice(), [BossEvent::Hide { .. }]));

    let err = bar.set_percentage(10).await.expect_err("closed");
    assert_eq!(err, TargetError::Closed(bar.id()));
    assert!(bar.set_color(BarColor::Red).await.is_err());
    assert!(bar.attach_observers(&[]).await.is_err());

    bar.close().await;
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn display_summarises_state() {
    let bar = BossBar::new(false);
    bar.set_title("Wither").await.expect("title");
    let rendered = bar.to_string();
    assert!(rendered.contains("title=\"Wither\""));
    assert!(rendered.contains("color=purple"));
}

#[tokio::test]
async fn observers_keep_the_order_they_were_added() {
    let bar = BossBar::new(false);
    let (late, _late_rx) = ChannelObserver::handle(ObserverId(30));
    let (early, _early_rx) = ChannelObserver::handle(ObserverId(4));
    let (middle, _middle_rx) = ChannelObserver::handle(ObserverId(12));
    bar.add_observers(&[late, early, middle]).await.expect("add");

    let ids: Vec<ObserverId> = bar.observers().iter().map(|o| o.id()).collect();
    assert_eq!(ids, vec![ObserverId(30), ObserverId(4), ObserverId(12)]);

    bar.remove_observer(ObserverId(4)).await;
    let snapshot = bar.observers();
    bar.detach_observers(&snapshot).await.expect("detach");
    bar.attach_observers(&snapshot).await.expect("attach");
    let ids: Vec<ObserverId> = bar.observers().iter().map(|o| o.id()).collect();
    assert_eq!(ids, vec![ObserverId(30), ObserverId(12)]);
}

#[tokio::test]
async fn closed_bar_rejects_empty_attach_like_detach() {
    let bar = BossBar::new(false);
    bar.close().await;

    assert_eq!(
        bar.attach_observers(&[]).await.expect_err("attach on closed bar"),
        TargetError::Closed(bar.id())
    );
    assert_eq!(
        bar.detach_observers(&[]).await.expect_err("detach on closed bar"),
        TargetError::Closed(bar.id())
    );
}
