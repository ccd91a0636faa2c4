//! Named bundles of inboxes with lookup and broadcast fan-out.
//!
//! A node groups related inboxes under one name so workers can find their
//! inbox by name and producers can fan one message out to every member.
//! The node holds plain [`Arc`] handles: dropping the node releases them,
//! and an inbox shared with other nodes or threads outlives it.

use std::sync::Arc;

use crate::error::{CourierError, Result};
use crate::inbox::Inbox;

/// A named, ordered bundle of inbox handles.
pub struct Node {
    name: String,
    inboxes: Vec<Arc<Inbox>>,
}

impl Node {
    /// Bundle `inboxes` under `name`, keeping registration order.
    ///
    /// Rejects an empty list and the same inbox handle appearing twice.
    /// Distinct inboxes sharing a name are accepted, but make
    /// [`inbox`](Node::inbox) first-match; best avoided.
    pub fn new(name: impl Into<String>, inboxes: Vec<Arc<Inbox>>) -> Result<Self> {
        let name = name.into();
        if inboxes.is_empty() {
            tracing::error!(node = %name, "node rejected: no inboxes");
            return Err(CourierError::EmptyNode);
        }
        for (k, inbox) in inboxes.iter().enumerate() {
            if inboxes[..k].iter().any(|prev| Arc::ptr_eq(prev, inbox)) {
                tracing::error!(node = %name, position = k, "node rejected: duplicate inbox");
                return Err(CourierError::DuplicateInbox(k));
            }
        }

        tracing::debug!(node = %name, inboxes = inboxes.len(), "node created");
        Ok(Self { name, inboxes })
    }

    /// Name the node was created with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the node name equals `cmp`, by byte comparison.
    pub fn name_is(&self, cmp: &str) -> bool {
        self.name == cmp
    }

    /// First attached inbox whose name equals `name`, if any.
    pub fn inbox(&self, name: &str) -> Option<Arc<Inbox>> {
        self.inboxes
            .iter()
            .find(|inbox| inbox.name_is(name))
            .cloned()
    }

    /// Attached inboxes, in registration order.
    pub fn inboxes(&self) -> &[Arc<Inbox>] {
        &self.inboxes
    }

    /// Number of attached inboxes.
    pub fn len(&self) -> usize {
        self.inboxes.len()
    }

    /// Always false; construction rejects empty nodes.
    pub fn is_empty(&self) -> bool {
        self.inboxes.is_empty()
    }

    /// Spin-write `msg` to every attached inbox, in registration order.
    ///
    /// Every member must have been created with the same payload size as
    /// `msg`. Delivery is not atomic across inboxes: readers of one member
    /// can observe the message before another member has accepted it.
    ///
    /// # Panics
    ///
    /// Panics if `msg.len()` differs from any member's payload size.
    pub fn broadcast(&self, msg: &[u8]) {
        for inbox in &self.inboxes {
            inbox.spin_write(msg);
        }
    }

    /// Dissolve the node and hand back its inbox handles.
    pub fn into_inboxes(self) -> Vec<Arc<Inbox>> {
        self.inboxes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inbox(name: &str) -> Arc<Inbox> {
        Arc::new(Inbox::new(4, name, 8).unwrap())
    }

    #[test]
    fn test_rejects_empty_node() {
        assert!(matches!(
            Node::new("node", Vec::new()),
            Err(CourierError::EmptyNode)
        ));
    }

    #[test]
    fn test_rejects_duplicate_inbox() {
        let a = inbox("a");
        let b = inbox("b");
        let result = Node::new("node", vec![a.clone(), b, a]);
        assert!(matches!(result, Err(CourierError::DuplicateInbox(2))));
    }

    #[test]
    fn test_lookup_by_name_is_first_match() {
        let a = inbox("shared_name");
        let b = inbox("shared_name");
        let c = inbox("other");
        let node = Node::new("node", vec![a.clone(), b, c]).unwrap();

        let found = node.inbox("shared_name").unwrap();
        assert!(Arc::ptr_eq(&found, &a));
        assert!(node.inbox("missing").is_none());
    }

    #[test]
    fn test_name_accessors() {
        let node = Node::new("relay", vec![inbox("a")]).unwrap();
        assert_eq!(node.name(), "relay");
        assert!(node.name_is("relay"));
        assert!(!node.name_is("relays"));
        assert_eq!(node.len(), 1);
        assert!(!node.is_empty());
    }

    #[test]
    fn test_broadcast_delivers_one_copy_per_inbox() {
        let a = inbox("a");
        let b = inbox("b");
        let c = inbox("c");
        let node = Node::new("node", vec![a, b, c]).unwrap();

        node.broadcast(&77u64.to_ne_bytes());

        for member in node.inboxes() {
            let mut out = [0u8; 8];
            assert!(unsafe { member.try_read(&mut out) });
            assert_eq!(u64::from_ne_bytes(out), 77);
            // Exactly one copy each.
            assert!(!unsafe { member.try_read(&mut out) });
        }
    }

    #[test]
    fn test_into_inboxes_returns_handles_in_order() {
        let a = inbox("a");
        let b = inbox("b");
        let node = Node::new("node", vec![a.clone(), b.clone()]).unwrap();
        let handles = node.into_inboxes();
        assert_eq!(handles.len(), 2);
        assert!(Arc::ptr_eq(&handles[0], &a));
        assert!(Arc::ptr_eq(&handles[1], &b));
    }
}
