//! Permissioned governance module: domains with members and treasuries,
//! stone-weighted issues and suggestions, anonymous ratings (signed domain
//! keys or Groth16 membership proofs), the periodic Big Purge, and the
//! Proof-of-Domain validator set.

pub mod app;
pub mod bank;
pub mod codec;
pub mod context;
pub mod crypto;
pub mod error;
pub mod events;
pub mod genesis;
mod hooks;
pub mod keeper;
pub mod keys;
pub mod msg_server;
pub mod msgs;
pub mod params;
pub mod query;
pub mod types;

pub use app::App;
pub use bank::{CoinMover, InMemoryBank};
pub use context::Ctx;
pub use error::{Error, Result};
pub use events::Event;
pub use genesis::{default_genesis, load_genesis_from_file, GenesisState, GenesisValidator};
pub use keeper::Keeper;
pub use msg_server::MsgResponse;
pub use msgs::Msg;
pub use query::{Query, QueryResponse, ZkpState};
pub use types::*;
