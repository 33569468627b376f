//! Connections between actors
//!
//! Swap nodes must be peered before they can negotiate a swap, and swaps with
//! a Lightning leg need a funded channel between the actors' Lightning nodes.

pub mod channel;
pub mod lnd;
pub mod peers;

pub use channel::{
    open_channel, serialize_channel_point, Channel, ChannelConfig, ChannelHandle, ChannelPoint,
    LightningNode, NodeInfo,
};
pub use lnd::LndClient;
pub use peers::connect_peers;
