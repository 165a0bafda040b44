// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection (data-flow edge) definitions for the network.

use crate::port::PortRef;
use crate::processor::ProcessorId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Create a new random connection ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

/// A connection from an outport to an inport.
///
/// Stored once and queried from either end, so both ports always see each
/// other as peers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    /// Unique connection ID
    pub id: ConnectionId,
    /// Producing port
    pub outport: PortRef,
    /// Consuming port
    pub inport: PortRef,
}

impl Connection {
    /// Create a new connection
    pub fn new(outport: PortRef, inport: PortRef) -> Self {
        Self {
            id: ConnectionId::new(),
            outport,
            inport,
        }
    }

    /// Check if this connection involves a specific processor
    pub fn involves_processor(&self, processor: ProcessorId) -> bool {
        self.outport.processor == processor || self.inport.processor == processor
    }

    /// The port at the other end from `port`, if `port` is an endpoint
    pub fn peer_of(&self, port: &PortRef) -> Option<&PortRef> {
        if &self.outport == port {
            Some(&self.inport)
        } else if &self.inport == port {
            Some(&self.outport)
        } else {
            None
        }
    }

    /// Whether this connection joins exactly these two ports, in either order
    pub fn joins(&self, a: &PortRef, b: &PortRef) -> bool {
        (&self.outport == a && &self.inport == b) || (&self.outport == b && &self.inport == a)
    }
}
