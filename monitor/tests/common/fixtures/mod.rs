//! This module provides reusable test utilities:
//! - In-process fakes for the resolver, prober, endpoint source and sink
//! - Mock servers (Electrum WebSocket, endpoint list, Discord API)
//! - Test configuration builders
//! - Common test data

// Allow unused code in test fixtures - not every test binary uses every helper
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod fakes;
pub mod mock_discord;
pub mod mock_electrum;
pub mod test_data;

// Re-export commonly used items
pub use fakes::{
    FakeResolver, PanickingResolver, RecordingSink, ScriptedProber, SinkCall, StaticSource,
};
pub use mock_discord::MockDiscordServer;
pub use mock_electrum::{ElectrumBehavior, MockElectrumServer};
pub use mock_source::MockSourceServer;
pub use test_config::TestConfigBuilder;
pub use test_data::*;
