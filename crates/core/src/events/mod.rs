//! Run events and the channel that carries them to the client.

mod stream;
mod types;

pub use stream::EventStream;
pub use types::{EventKind, RunEvent};
