//! Fake capabilities for deterministic testing.
//!
//! Latency is simulated with `tokio::time::sleep`, so tests are meant to run on a
//! paused clock (`#[tokio::test(start_paused = true)]`). Every fake counts the
//! resources it hands out so tests can assert nothing outlives a resolution call.
//! Enable with the `test-utils` feature flag.

use std::collections::{HashMap, VecDeque};
use std::future::pending;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use lanprobe_common::{
    capability::{
        DataChannel, HiddenSurface, HttpProbe, PeerConnection, PeerConnectionFactory, SdpKind,
        SessionDescription, SurfaceHost,
    },
    error::{CapabilityError, FetchError, ProbeError},
};

use crate::resolver::frame::BLANK_TARGET;
use crate::resolver::topology::sdp;

/// Live/peak accounting for one kind of resource.
#[derive(Debug, Default)]
pub struct Gauge {
    created: AtomicUsize,
    live: AtomicUsize,
    peak: AtomicUsize,
}

impl Gauge {
    fn acquire(&self) {
        self.created.fetch_add(1, Ordering::SeqCst);
        let now = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn release(&self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Releases a gauge slot when dropped, including when a timeout drops the future.
struct Held(Arc<Gauge>);

impl Held {
    fn acquire(gauge: &Arc<Gauge>) -> Self {
        gauge.acquire();
        Self(gauge.clone())
    }
}

impl Drop for Held {
    fn drop(&mut self) {
        self.0.release();
    }
}

#[derive(Debug, Clone)]
enum Reply {
    After(Duration),
    OpaqueAfter(Duration),
    Reject,
}

/// Scripted [`HttpProbe`]. Unscripted URLs, and scripted ones past their last
/// reply, never settle.
#[derive(Default)]
pub struct FakeHttp {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<HashMap<String, usize>>,
    in_flight: Arc<Gauge>,
}

impl FakeHttp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settles successive requests to `url` after each of `delays`.
    pub fn respond(self, url: &str, delays: &[Duration]) -> Self {
        self.script(url, delays.iter().map(|d| Reply::After(*d)))
    }

    /// Like [`FakeHttp::respond`] but settles with an opaque failure.
    pub fn respond_opaque(self, url: &str, delays: &[Duration]) -> Self {
        self.script(url, delays.iter().map(|d| Reply::OpaqueAfter(*d)))
    }

    /// Refuses to issue any request to `url`.
    pub fn reject(self, url: &str) -> Self {
        self.script(url, std::iter::once(Reply::Reject))
    }

    fn script(self, url: &str, replies: impl Iterator<Item = Reply>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .extend(replies);
        self
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.live()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.in_flight.peak()
    }
}

#[async_trait]
impl HttpProbe for FakeHttp {
    async fn fetch(&self, url: &str) -> Result<(), FetchError> {
        *self.calls.lock().unwrap().entry(url.to_string()).or_default() += 1;
        let reply = self
            .replies
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(|queue| queue.pop_front());

        let _held = Held::acquire(&self.in_flight);
        match reply {
            Some(Reply::After(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            Some(Reply::OpaqueAfter(delay)) => {
                tokio::time::sleep(delay).await;
                Err(FetchError::Opaque("cross-origin response".into()))
            }
            Some(Reply::Reject) => Err(FetchError::Rejected(format!("invalid url {url}"))),
            None => pending().await,
        }
    }
}

#[derive(Default)]
struct SurfaceScript {
    unloads: HashMap<String, VecDeque<Duration>>,
    broken: Vec<String>,
}

/// Scripted [`SurfaceHost`]. A navigation unloads after the next scripted delay for
/// its URL, or never.
pub struct FakeSurfaceHost {
    script: Arc<Mutex<SurfaceScript>>,
    surfaces: Arc<Gauge>,
    available: bool,
    budget: Option<usize>,
}

impl FakeSurfaceHost {
    pub fn new() -> Self {
        Self {
            script: Arc::default(),
            surfaces: Arc::default(),
            available: true,
            budget: None,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// Hands out `surfaces` surfaces, then reports the primitive unavailable.
    pub fn exhausted_after(mut self, surfaces: usize) -> Self {
        self.budget = Some(surfaces);
        self
    }

    pub fn unload_after(self, url: &str, delays: &[Duration]) -> Self {
        self.script
            .lock()
            .unwrap()
            .unloads
            .entry(url.to_string())
            .or_default()
            .extend(delays.iter().copied());
        self
    }

    pub fn fail_navigation(self, url: &str) -> Self {
        self.script.lock().unwrap().broken.push(url.to_string());
        self
    }

    pub fn created(&self) -> usize {
        self.surfaces.created()
    }

    pub fn live(&self) -> usize {
        self.surfaces.live()
    }

    pub fn peak_live(&self) -> usize {
        self.surfaces.peak()
    }
}

impl Default for FakeSurfaceHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SurfaceHost for FakeSurfaceHost {
    async fn create_surface(&self) -> Result<Box<dyn HiddenSurface>, CapabilityError> {
        let exhausted = self.budget.is_some_and(|n| self.surfaces.created() >= n);
        if !self.available || exhausted {
            return Err(CapabilityError::Unavailable("hidden surfaces"));
        }
        Ok(Box::new(FakeSurface {
            script: self.script.clone(),
            target: None,
            held: Some(Held::acquire(&self.surfaces)),
        }))
    }
}

struct FakeSurface {
    script: Arc<Mutex<SurfaceScript>>,
    target: Option<String>,
    held: Option<Held>,
}

#[async_trait]
impl HiddenSurface for FakeSurface {
    async fn navigate(&mut self, url: &str) -> Result<(), ProbeError> {
        if self.held.is_none() {
            return Err(ProbeError::new("surface was removed"));
        }
        if self.script.lock().unwrap().broken.iter().any(|u| u == url) {
            return Err(ProbeError::new(format!("cannot navigate to {url}")));
        }
        self.target = (url != BLANK_TARGET).then(|| url.to_string());
        Ok(())
    }

    async fn unloaded(&mut self) -> Result<(), ProbeError> {
        let delay = self.target.as_ref().and_then(|url| {
            self.script
                .lock()
                .unwrap()
                .unloads
                .get_mut(url)
                .and_then(|queue| queue.pop_front())
        });
        match delay {
            Some(delay) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            None => pending().await,
        }
    }

    fn remove(&mut self) {
        self.held.take();
    }
}

#[derive(Default)]
struct PeerGauges {
    connections: Arc<Gauge>,
    channels: Arc<Gauge>,
}

/// Scripted [`PeerConnectionFactory`].
///
/// The answering side connects when its remote description offers a reachable
/// hostname, choosing the fastest one, and reports that line's foundation.
pub struct FakePeerFactory {
    reachable: Arc<HashMap<String, Duration>>,
    gauges: Arc<PeerGauges>,
    fail_negotiation: bool,
    available: bool,
}

impl FakePeerFactory {
    pub fn new() -> Self {
        Self {
            reachable: Arc::default(),
            gauges: Arc::default(),
            fail_negotiation: false,
            available: true,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    pub fn reachable(mut self, hostname: &str, latency: Duration) -> Self {
        Arc::make_mut(&mut self.reachable).insert(hostname.to_string(), latency);
        self
    }

    /// Makes every offer fail.
    pub fn fail_negotiation(mut self) -> Self {
        self.fail_negotiation = true;
        self
    }

    pub fn created(&self) -> usize {
        self.gauges.connections.created()
    }

    pub fn live_connections(&self) -> usize {
        self.gauges.connections.live()
    }

    pub fn live_channels(&self) -> usize {
        self.gauges.channels.live()
    }
}

impl Default for FakePeerFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl PeerConnectionFactory for FakePeerFactory {
    fn create(&self) -> Result<Box<dyn PeerConnection>, CapabilityError> {
        if !self.available {
            return Err(CapabilityError::Unavailable("peer connections"));
        }
        Ok(Box::new(FakePeer {
            reachable: self.reachable.clone(),
            channels: self.gauges.channels.clone(),
            fail_negotiation: self.fail_negotiation,
            local: None,
            remote: None,
            selected: None,
            held: Some(Held::acquire(&self.gauges.connections)),
        }))
    }
}

const GATHERED: &str = "v=0\r\n\
    o=- 1 2 IN IP4 127.0.0.1\r\n\
    s=-\r\n\
    m=application 9 UDP/DTLS/SCTP webrtc-datachannel\r\n\
    a=candidate:842163049 1 udp 1677729535 192.168.1.23 56143 typ srflx generation 0\r\n\
    a=end-of-candidates\r\n";

struct FakePeer {
    reachable: Arc<HashMap<String, Duration>>,
    channels: Arc<Gauge>,
    fail_negotiation: bool,
    local: Option<SessionDescription>,
    remote: Option<SessionDescription>,
    selected: Option<String>,
    held: Option<Held>,
}

impl FakePeer {
    fn describe(&self, kind: SdpKind) -> Result<SessionDescription, ProbeError> {
        if self.held.is_none() {
            return Err(ProbeError::new("connection is closed"));
        }
        if self.fail_negotiation {
            return Err(ProbeError::new("negotiation primitive failed"));
        }
        Ok(SessionDescription {
            kind,
            sdp: GATHERED.to_string(),
        })
    }
}

#[async_trait]
impl PeerConnection for FakePeer {
    fn create_data_channel(&mut self, _label: &str) -> Result<Box<dyn DataChannel>, ProbeError> {
        Ok(Box::new(FakeChannel(Some(Held::acquire(&self.channels)))))
    }

    async fn create_offer(&mut self) -> Result<SessionDescription, ProbeError> {
        self.describe(SdpKind::Offer)
    }

    async fn create_answer(&mut self) -> Result<SessionDescription, ProbeError> {
        self.describe(SdpKind::Answer)
    }

    async fn set_local_description(&mut self, desc: SessionDescription) -> Result<(), ProbeError> {
        self.local = Some(desc);
        Ok(())
    }

    async fn set_remote_description(&mut self, desc: SessionDescription) -> Result<(), ProbeError> {
        self.remote = Some(desc);
        Ok(())
    }

    async fn gathering_complete(&mut self) -> Result<(), ProbeError> {
        Ok(())
    }

    fn local_description(&self) -> Option<SessionDescription> {
        self.local.clone()
    }

    async fn connected(&mut self) -> Result<(), ProbeError> {
        let remote = self.remote.as_ref().map(|d| d.sdp.as_str()).unwrap_or_default();
        let winner = sdp::candidate_addresses(remote)
            .into_iter()
            .filter_map(|(foundation, address)| {
                self.reachable.get(&address).map(|latency| (*latency, foundation))
            })
            .min();

        match winner {
            Some((latency, foundation)) => {
                tokio::time::sleep(latency).await;
                self.selected = Some(foundation);
                Ok(())
            }
            None => pending().await,
        }
    }

    fn selected_remote_foundation(&self) -> Option<String> {
        self.selected.clone()
    }

    fn close(&mut self) {
        self.held.take();
    }
}

struct FakeChannel(Option<Held>);

impl DataChannel for FakeChannel {
    fn close(&mut self) {
        self.0.take();
    }
}
