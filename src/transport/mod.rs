//! Transport module for MCP communication
//!
//! This module defines the Transport trait and the Content-Length framed
//! implementation used by both the server and the client.

use async_trait::async_trait;

use crate::errors::Error;
use crate::messages::Message;

pub mod codec;
pub mod stdio;

pub use codec::{ ContentLengthCodec, MAX_FRAME_SIZE };
pub use stdio::{ FrameReader, FrameWriter, StdioTransport };

/// Outgoing side of a connection
///
/// Implementations must serialize concurrent sends so that frames never
/// interleave.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a message to the peer
    async fn send(&self, message: &Message) -> Result<(), Error>;

    /// Flush and close the outgoing stream
    async fn close(&self) -> Result<(), Error> {
        Ok(())
    }
}
