//! Playback capability used by the terminal client.
//!
//! Implementations report back through the app event channel with
//! [`crate::app::events::PlayerEvent`].

pub mod connect;

use async_trait::async_trait;

pub use connect::ConnectPlayer;

#[async_trait]
pub trait Player: Send + Sync {
    /// Find an output device and start reporting state.
    async fn connect(&self) -> anyhow::Result<()>;
    /// `None` resumes whatever is loaded.
    async fn play(&self, track_id: Option<&str>) -> anyhow::Result<()>;
    async fn pause(&self) -> anyhow::Result<()>;
    async fn seek(&self, position_ms: u64) -> anyhow::Result<()>;
    /// 0.0 ..= 1.0
    async fn set_volume(&self, volume: f32) -> anyhow::Result<()>;
    async fn skip_next(&self) -> anyhow::Result<()>;
    async fn skip_prev(&self) -> anyhow::Result<()>;
}
