use std::sync::Arc;

use lanprobe_common::error::ResolveError;
use lanprobe_core::StrategyKind;
use lanprobe_core::test_utils::{FakePeerFactory, FakeSurfaceHost};

use super::{candidates, ms, resolver};

#[tokio::test(start_paused = true)]
async fn surfaces_are_removed_whatever_the_outcome() {
    let surfaces = Arc::new(
        FakeSurfaceHost::new()
            .unload_after("https://fast.local./", &[ms(120), ms(30)])
            .unload_after("https://slow.local./", &[ms(20), ms(90)])
            .fail_navigation("https://broken.local./"),
    );
    let resolver = resolver(None, Some(surfaces.clone()), None);
    let hosts = ["fast.local", "slow.local", "silent.local", "broken.local", "other.local"];

    let ranked = resolver
        .resolve(StrategyKind::Frame, &candidates(&hosts), None)
        .await
        .unwrap();

    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].hostname(), "fast.local");
    assert_eq!(surfaces.created(), hosts.len());
    assert_eq!(surfaces.live(), 0);
    assert!(surfaces.peak_live() <= 4);
}

#[tokio::test(start_paused = true)]
async fn peer_sessions_are_closed_after_success_and_timeout() {
    let peers = Arc::new(FakePeerFactory::new().reachable("e.local", ms(30)));
    let resolver = resolver(None, None, Some(peers.clone()));
    let hosts = ["a.local", "b.local", "c.local", "d.local", "e.local"];

    let ranked = resolver
        .resolve(StrategyKind::Topology, &candidates(&hosts), None)
        .await
        .unwrap();

    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].hostname(), "e.local");
    // two peers per batch
    assert_eq!(peers.created(), 4);
    assert_eq!(peers.live_connections(), 0);
    assert_eq!(peers.live_channels(), 0);
}

#[tokio::test(start_paused = true)]
async fn peer_sessions_are_closed_after_failed_negotiation() {
    let peers = Arc::new(FakePeerFactory::new().fail_negotiation());
    let resolver = resolver(None, None, Some(peers.clone()));

    let ranked = resolver
        .resolve(StrategyKind::Topology, &candidates(&["a.local", "b.local"]), None)
        .await
        .unwrap();

    assert!(ranked.is_empty());
    assert_eq!(peers.live_connections(), 0);
    assert_eq!(peers.live_channels(), 0);
}

#[tokio::test(start_paused = true)]
async fn missing_primitives_surface_as_setup_errors() {
    let surfaces = Arc::new(FakeSurfaceHost::unavailable());
    let resolver = resolver(None, Some(surfaces), None);
    let err = resolver
        .resolve(StrategyKind::Frame, &candidates(&["a.local"]), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::Setup(_)));

    let peers = Arc::new(FakePeerFactory::unavailable());
    let resolver = super::resolver(None, None, Some(peers.clone()));
    let err = resolver
        .resolve(StrategyKind::Topology, &candidates(&["a.local"]), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::Setup(_)));
    assert_eq!(peers.live_connections(), 0);
}
