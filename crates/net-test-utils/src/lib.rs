//! Test utilities for the Cairn voice-net layer.
//!
//! Provides in-memory stand-ins for the external collaborators plus entity
//! fixtures:
//!
//! - [`MemoryStore`] - in-memory [`net_controller::store::EntityStore`] with
//!   failure injection and write counters
//! - [`MockMinter`] - controllable token issuer (success, failure, delay)
//! - [`SwitchableModeSource`] - mode source whose value and availability can
//!   be flipped mid-test
//! - [`fixtures`] - ready-made operations, actors and nets

mod memory_store;
mod mock_minter;

pub mod fixtures;

pub use memory_store::MemoryStore;
pub use mock_minter::{MockMinter, SwitchableModeSource};
