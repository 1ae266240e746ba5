//! Object storage
//!
//! Local staging of content-addressed objects and the remote store they are
//! published to.

pub mod remote;
pub mod staging;

pub use remote::{RemoteStore, MANIFEST_NAME};
pub use staging::{ObjectStaging, StagedObject, STAGED_MANIFEST_NAME};
