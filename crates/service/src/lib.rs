//! Service layer for barrel storage.
//! - `registry`: concurrent dual-indexed collection of live barrels.
//! - `storage`: persistence of the whole registry to a JSON file.
//! - `interaction`: the place/break/interact operations called by the host engine.
//! - `admin` and `runtime`: administrative mutators and the start/save/shutdown lifecycle.

pub mod errors;
pub mod registry;
pub mod storage;
pub mod placement;
pub mod interaction;
pub mod admin;
pub mod runtime;
#[cfg(test)]
pub mod test_support;
