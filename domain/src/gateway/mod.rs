//! Clients for services outside the platform.

pub mod livekit;
