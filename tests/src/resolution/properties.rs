use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use lanprobe_common::candidate::ResolvedCandidate;
use lanprobe_common::error::ResolveError;
use lanprobe_core::StrategyKind;
use lanprobe_core::test_utils::{FakeHttp, FakePeerFactory, FakeSurfaceHost};

use super::{candidates, ms, resolver};

/// Twelve hosts, every third one local with a confirmation sample that depends on
/// its position, so several share a ping.
fn mixed_http() -> (Arc<FakeHttp>, Vec<&'static str>) {
    const HOSTS: [&str; 12] = [
        "h0.local", "h1.local", "h2.local", "h3.local", "h4.local", "h5.local",
        "h6.local", "h7.local", "h8.local", "h9.local", "h10.local", "h11.local",
    ];
    let mut http = FakeHttp::new();
    for (i, host) in HOSTS.iter().enumerate() {
        if i % 3 == 0 {
            let second = if i < 6 { ms(20) } else { ms(10) };
            http = http.respond(&format!("https://{host}/"), &[ms(300 - i as u64 * 10), second]);
        }
    }
    (Arc::new(http), HOSTS.to_vec())
}

#[tokio::test(start_paused = true)]
async fn results_are_a_duplicate_free_subset_of_the_input() {
    let (http, hosts) = mixed_http();
    let resolver = resolver(Some(http), None, None);

    let mut list = candidates(&hosts);
    list.extend(candidates(&["h0.local", "h3.local"]));
    let ranked = resolver.resolve(StrategyKind::Fetch, &list, None).await.unwrap();

    let input: HashSet<&str> = hosts.iter().copied().collect();
    let mut seen: HashSet<&str> = HashSet::new();
    for r in &ranked {
        assert!(input.contains(r.hostname()), "{} was never offered", r.hostname());
        assert!(seen.insert(r.hostname()), "{} reported twice", r.hostname());
    }
    assert_eq!(ranked.len(), 4);
}

#[tokio::test(start_paused = true)]
async fn results_are_sorted_by_ping_with_input_order_on_ties() -> anyhow::Result<()> {
    let (http, hosts) = mixed_http();
    let resolver = resolver(Some(http), None, None);

    let ranked = resolver
        .resolve(StrategyKind::Fetch, &candidates(&hosts), None)
        .await?;

    for pair in ranked.windows(2) {
        assert!(pair[0].ping <= pair[1].ping);
    }
    let order: Vec<&str> = ranked.iter().map(|r| r.hostname()).collect();
    assert_eq!(order, ["h6.local", "h9.local", "h0.local", "h3.local"]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn double_probe_scenarios_hold_for_both_timing_strategies() {
    let http = FakeHttp::new()
        .respond("https://timeout.local/", &[ms(1_000), ms(10)])
        .respond("https://rising.local/", &[ms(50), ms(80)])
        .respond("https://falling.local/", &[ms(300), ms(40)]);
    let surfaces = FakeSurfaceHost::new()
        .unload_after("https://timeout.local./", &[ms(2_000), ms(10)])
        .unload_after("https://rising.local./", &[ms(50), ms(80)])
        .unload_after("https://falling.local./", &[ms(300), ms(40)]);
    let resolver = resolver(Some(Arc::new(http)), Some(Arc::new(surfaces)), None);
    let list = candidates(&["timeout.local", "rising.local", "falling.local"]);

    for kind in [StrategyKind::Fetch, StrategyKind::Frame] {
        let ranked = resolver.resolve(kind, &list, None).await.unwrap();
        assert_eq!(ranked.len(), 1, "{kind}");
        assert_eq!(ranked[0].hostname(), "falling.local", "{kind}");
        assert_eq!(ranked[0].ping, ms(40), "{kind}");
    }
}

#[tokio::test(start_paused = true)]
async fn callback_sees_exactly_the_final_results() {
    let (http, hosts) = mixed_http();
    let resolver = resolver(Some(http), None, None);

    let seen: Mutex<Vec<ResolvedCandidate>> = Mutex::new(Vec::new());
    let on_found = |r: &ResolvedCandidate| seen.lock().unwrap().push(r.clone());
    let ranked = resolver
        .resolve(StrategyKind::Fetch, &candidates(&hosts), Some(&on_found))
        .await
        .unwrap();

    let seen = seen.into_inner().unwrap();
    assert_eq!(seen.len(), ranked.len());
    for r in &seen {
        assert!(ranked.contains(r));
    }
}

#[tokio::test(start_paused = true)]
async fn in_flight_probes_never_exceed_the_limit() {
    let hosts: Vec<String> = (0..17).map(|i| format!("n{i}.local")).collect();
    let mut http = FakeHttp::new();
    for host in &hosts {
        http = http.respond(&format!("https://{host}/"), &[ms(250), ms(25)]);
    }
    let http = Arc::new(http);
    let resolver = resolver(Some(http.clone()), None, None);

    let refs: Vec<&str> = hosts.iter().map(String::as_str).collect();
    let ranked = resolver
        .resolve(StrategyKind::Fetch, &candidates(&refs), None)
        .await
        .unwrap();

    assert_eq!(ranked.len(), 17);
    assert!(http.peak_in_flight() <= 4);
}

#[tokio::test(start_paused = true)]
async fn topology_discloses_at_most_one_host_per_batch() {
    let hosts = ["a.local", "b.local", "c.local", "d.local", "e.local", "f.local", "g.local"];
    let mut peers = FakePeerFactory::new();
    for host in hosts {
        peers = peers.reachable(host, ms(15));
    }
    let resolver = resolver(None, None, Some(Arc::new(peers)));

    let ranked = resolver
        .resolve(StrategyKind::Topology, &candidates(&hosts), None)
        .await
        .unwrap();

    // batches of three: [a b c] [d e f] [g]
    let order: Vec<&str> = ranked.iter().map(|r| r.hostname()).collect();
    assert_eq!(order, ["a.local", "d.local", "g.local"]);
}

#[tokio::test(start_paused = true)]
async fn nothing_resolved_is_an_empty_list() {
    let resolver = resolver(Some(Arc::new(FakeHttp::new())), None, None);

    let ranked = resolver
        .resolve(StrategyKind::Fetch, &candidates(&["nobody.local"]), None)
        .await
        .unwrap();
    assert!(ranked.is_empty());

    let ranked = resolver.resolve(StrategyKind::Fetch, &[], None).await.unwrap();
    assert!(ranked.is_empty());
}

#[tokio::test]
async fn programmer_errors_fail_fast() {
    let resolver = resolver(Some(Arc::new(FakeHttp::new())), None, None);

    let err = resolver
        .resolve(StrategyKind::Fetch, &candidates(&["ok.local", ""]), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::InvalidCandidate { index: 1, .. }));

    assert!(matches!(
        "webrtc".parse::<StrategyKind>(),
        Err(ResolveError::UnknownStrategy(_))
    ));

    let err = resolver
        .resolve(StrategyKind::Topology, &candidates(&["ok.local"]), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::Unsupported("topology")));
}
