use imo_event_bus::*;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct Tick(u32);

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum Signal {
    Init,
    Change,
}

#[tokio::test]
async fn test_event_flow() {
    let bus = EventBus::new();
    let mut rx = bus.subscribe::<Tick>().unwrap();

    bus.publish(Tick(42)).unwrap();

    let received = EventReceiverExt::recv(&mut rx).await.unwrap();
    assert_eq!(*received, Tick(42));
}

#[tokio::test]
async fn test_receiver_lagged_recovery() {
    let bus = EventBus::new();
    let mut rx = bus.subscribe_with_capacity::<Tick>(2).unwrap();

    for i in 0..100 {
        bus.publish(Tick(i)).unwrap();
    }

    let first = EventReceiverExt::recv(&mut rx).await.unwrap();
    assert!(first.0 >= 98, "expected the retained tail, got {}", first.0);

    let second = EventReceiverExt::recv(&mut rx).await.unwrap();
    assert_eq!(second.0, first.0 + 1);
}

#[test]
fn test_zero_capacity_rejected() {
    let bus = EventBus::new();
    assert!(matches!(
        bus.subscribe_with_capacity::<Tick>(0),
        Err(EventBusError::InvalidCapacity { .. })
    ));
}

#[test]
fn test_publish_without_subscribers_is_ok() {
    let bus = EventBus::new();
    assert_eq!(bus.publish(Tick(1)).unwrap(), 0);
}

#[tokio::test]
async fn test_shutdown_closes_receivers() {
    let bus = EventBus::new();
    let mut rx = bus.subscribe::<Tick>().unwrap();

    assert_eq!(bus.shutdown(), 1);
    assert!(EventReceiverExt::recv(&mut rx).await.is_none());
}

#[test]
fn test_notifier_never_delivers_inline() {
    let bus = EventBus::new();
    let queue = ManualQueue::new();
    let notifier = Notifier::new(bus.clone(), Arc::new(queue.clone()));
    let mut rx = bus.subscribe::<Signal>().unwrap();

    assert!(notifier.notify(Signal::Change));
    assert!(rx.try_next().is_none());

    queue.run_pending();
    assert_eq!(rx.try_next().as_deref(), Some(&Signal::Change));
}

#[test]
fn test_notifier_coalesces_within_tick() {
    let bus = EventBus::new();
    let queue = ManualQueue::new();
    let notifier = Notifier::new(bus.clone(), Arc::new(queue.clone()));
    let mut rx = bus.subscribe::<Signal>().unwrap();

    assert!(notifier.notify(Signal::Change));
    assert!(!notifier.notify(Signal::Change));
    assert!(notifier.notify(Signal::Init));
    assert!(!notifier.notify(Signal::Change));

    assert_eq!(queue.run_pending(), 2);
    assert_eq!(rx.try_next().as_deref(), Some(&Signal::Change));
    assert_eq!(rx.try_next().as_deref(), Some(&Signal::Init));
    assert!(rx.try_next().is_none());
}

#[test]
fn test_notifier_repeats_across_ticks() {
    let bus = EventBus::new();
    let queue = ManualQueue::new();
    let notifier = Notifier::new(bus.clone(), Arc::new(queue.clone()));
    let mut rx = bus.subscribe::<Signal>().unwrap();

    notifier.notify(Signal::Change);
    queue.run_pending();
    notifier.notify(Signal::Change);
    queue.run_pending();

    assert!(rx.try_next().is_some());
    assert!(rx.try_next().is_some());
    assert!(rx.try_next().is_none());
}

#[tokio::test(flavor = "current_thread")]
async fn test_tokio_queue_delivers_after_yield() {
    let bus = EventBus::new();
    let notifier = Notifier::new(bus.clone(), Arc::new(TokioQueue::current().unwrap()));
    let mut rx = bus.subscribe::<Signal>().unwrap();

    notifier.notify(Signal::Change);
    notifier.notify(Signal::Change);
    assert!(rx.try_next().is_none());

    let first = EventReceiverExt::recv(&mut rx).await.unwrap();
    assert_eq!(*first, Signal::Change);

    tokio::task::yield_now().await;
    assert!(rx.try_next().is_none());
}
