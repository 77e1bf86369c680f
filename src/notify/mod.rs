//! Notification pipeline.
//!
//! # Data Flow
//! ```text
//! node push (new block)
//!     → chain client producer task (decode events)
//!     → subscription.rs (unbounded, ordered channel)
//!     → driver idle loop
//!     → handler.rs (render batch to console)
//! ```
//!
//! # Design Decisions
//! - Producers never wait on the consumer; nothing is dropped
//! - Decode failures stay local to the field or record they affect
//! - Subscriptions have an explicit unsubscribe and stop on drop

pub mod handler;
pub mod subscription;

pub use handler::NotificationHandler;
pub use subscription::Subscription;
