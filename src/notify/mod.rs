//! Change notification for entity stores.
//!
//! Two delivery styles are offered: synchronous callbacks registered with
//! `subscribe`, and buffered [`ChangeStream`]s obtained from `watch`. Both
//! are fed from the same in-process notification pass that runs after every
//! successful `create`/`update`.

/// Event and id types.
pub mod events;
/// Handler registry and subscription handles.
pub mod listeners;
/// Channel-backed change streams.
pub mod stream;

pub use events::{ChangeEvent, ChangeKind, SubscriptionId, CHANGE_EVENT};
pub(crate) use listeners::Listeners;
pub use listeners::Subscription;
pub use stream::{ChangeStream, StreamError};
