//! HubPool-side state: root bundle lifecycle, pool rebalance routes,
//! hub block/timestamp resolution, and realized LP fee computation.

pub mod client;
pub mod lpfee;

pub use client::HubPoolClient;
pub use lpfee::average_rate;
