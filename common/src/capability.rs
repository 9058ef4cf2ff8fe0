//! # Capability Ports
//!
//! The side channels the engine probes through, reduced to the handful of operations
//! each strategy actually needs. Hosts (a browser bridge, the native adapters in
//! `lanprobe-core`, test fakes) implement these; strategies only ever see the traits.

use async_trait::async_trait;

use crate::error::{CapabilityError, FetchError, ProbeError};

/// Opaque cross-origin requests.
#[async_trait]
pub trait HttpProbe: Send + Sync {
    /// Issues one request to `url` and waits for it to settle.
    ///
    /// Dropping the returned future must abort the request.
    async fn fetch(&self, url: &str) -> Result<(), FetchError>;
}

/// Creates invisible navigable surfaces.
#[async_trait]
pub trait SurfaceHost: Send + Sync {
    async fn create_surface(&self) -> Result<Box<dyn HiddenSurface>, CapabilityError>;
}

/// One invisible embedded browsing context.
#[async_trait]
pub trait HiddenSurface: Send {
    /// Points the surface at `url`. Returns once the navigation has been started.
    async fn navigate(&mut self, url: &str) -> Result<(), ProbeError>;

    /// Settles when the surface's internal document becomes inaccessible.
    async fn unloaded(&mut self) -> Result<(), ProbeError>;

    /// Detaches the surface from the page. Must be idempotent.
    fn remove(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdpKind {
    Offer,
    Answer,
}

/// A session description as exchanged during negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDescription {
    pub kind: SdpKind,
    pub sdp: String,
}

/// Creates peer connections.
pub trait PeerConnectionFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn PeerConnection>, CapabilityError>;
}

/// One endpoint of a peer-to-peer connection.
#[async_trait]
pub trait PeerConnection: Send {
    fn create_data_channel(&mut self, label: &str) -> Result<Box<dyn DataChannel>, ProbeError>;

    async fn create_offer(&mut self) -> Result<SessionDescription, ProbeError>;

    async fn create_answer(&mut self) -> Result<SessionDescription, ProbeError>;

    async fn set_local_description(&mut self, desc: SessionDescription) -> Result<(), ProbeError>;

    async fn set_remote_description(&mut self, desc: SessionDescription) -> Result<(), ProbeError>;

    /// Settles once address gathering has completed.
    async fn gathering_complete(&mut self) -> Result<(), ProbeError>;

    /// The local description including every gathered address.
    fn local_description(&self) -> Option<SessionDescription>;

    /// Settles when the connection reaches "connected". Errors when it fails instead.
    async fn connected(&mut self) -> Result<(), ProbeError>;

    /// Foundation of the remote address on the currently selected path.
    fn selected_remote_foundation(&self) -> Option<String>;

    /// Must be idempotent.
    fn close(&mut self);
}

pub trait DataChannel: Send {
    fn close(&mut self);
}
