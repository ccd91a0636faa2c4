//! Courier - high-performance in-process message passing
//!
//! Courier moves fixed-size opaque payloads between threads through
//! lock-free, fixed-capacity ring buffers called inboxes. The fast paths
//! never allocate, never take a lock, and never call into the kernel; spin
//! variants busy-wait with a CPU relax hint, try variants return
//! immediately. Inboxes can be grouped into named nodes for lookup and
//! broadcast fan-out.
//!
//! ```
//! use courier::{Inbox, Node};
//! use std::sync::Arc;
//!
//! let inbox = Arc::new(Inbox::new(512, "ibx", 8)?);
//! let node = Node::new("workers", vec![Arc::clone(&inbox)])?;
//!
//! node.broadcast(&42u64.to_ne_bytes());
//!
//! let mut out = [0u8; 8];
//! assert!(inbox.try_shared_read(&mut out));
//! assert_eq!(u64::from_ne_bytes(out), 42);
//! # Ok::<(), courier::CourierError>(())
//! ```
//!
//! For a typed API that fixes the payload type once, see
//! [`TypedInbox`]; the contracts of the six access disciplines are
//! documented on [`Inbox`].

pub mod constants;
pub mod error;
pub mod inbox;
pub mod node;

// Re-export main components
pub use error::{CourierError, Result};
pub use inbox::{bytes_of, Inbox, Message, TypedInbox};
pub use node::Node;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_inbox_creation() {
        let inbox = Inbox::new(512, "ibx", 16);
        assert!(inbox.is_ok());
    }

    #[test]
    fn test_write_then_read() {
        let inbox = Inbox::new(4, "ibx", 8).unwrap();
        assert!(inbox.try_write(&5u64.to_ne_bytes()));

        let mut out = [0u8; 8];
        assert!(unsafe { inbox.try_read(&mut out) });
        assert_eq!(u64::from_ne_bytes(out), 5);
    }

    #[test]
    fn test_node_lookup_round_trip() {
        let orders = Arc::new(Inbox::new(4, "orders", 8).unwrap());
        let fills = Arc::new(Inbox::new(4, "fills", 8).unwrap());
        let node = Node::new("engine", vec![orders, fills]).unwrap();

        let selected = node.inbox("fills").unwrap();
        assert!(selected.name_is("fills"));

        selected.spin_write(&1u64.to_ne_bytes());
        let mut out = [0u8; 8];
        selected.spin_shared_read(&mut out);
        assert_eq!(u64::from_ne_bytes(out), 1);
    }

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
