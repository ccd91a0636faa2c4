//! Per-slot header: the three-flag publication protocol.

use std::sync::atomic::AtomicBool;

use static_assertions::const_assert_eq;

use crate::constants::SLOT_HEADER_SIZE;

/// Header preceding every payload region in the slot buffer.
///
/// A slot is empty iff `has_data` and `written` are both false, full iff
/// both are true; `has_data` set with `written` clear is an in-flight
/// payload write. `shared` serializes concurrent shared readers on the
/// slot and is only ever true while one of them executes its critical
/// region.
#[repr(C)]
pub(crate) struct SlotHeader {
    /// A writer has claimed the slot; the payload write may still be in flight.
    pub has_data: AtomicBool,
    /// The payload is fully copied in and visible to readers.
    pub written: AtomicBool,
    /// A shared reader currently holds exclusive dequeue rights on the slot.
    pub shared: AtomicBool,
    _pad: [u8; 5],
}

// The header must overlay the first SLOT_HEADER_SIZE bytes of each record
// at any byte offset, so it may not require alignment.
const_assert_eq!(std::mem::size_of::<SlotHeader>(), SLOT_HEADER_SIZE);
const_assert_eq!(std::mem::align_of::<SlotHeader>(), 1);
