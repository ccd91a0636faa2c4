//! Lock-free fixed-capacity inboxes
//!
//! An inbox is a ring of slots, each a small atomic-flag header followed by
//! a fixed-size payload region. Producers claim a slot by flipping its
//! `has_data` flag, copy the payload, and publish with a release store on
//! `written`; readers mirror the protocol on the way out. Two independent
//! monotonic cursors (one per direction, on separate cache lines) supply
//! slot placement hints; the flags remain the source of truth, which is
//! what keeps the protocol correct under any interleaving of producers and
//! consumers.
//!
//! The module exposes the type-erased byte core ([`Inbox`]) and a typed
//! veneer ([`TypedInbox`]) that fixes the payload type once; the
//! per-operation ordering discipline is documented on [`Inbox`].

mod index;
mod ring;
mod slot;
mod typed;

pub use ring::Inbox;
pub use typed::{bytes_of, Message, TypedInbox};
