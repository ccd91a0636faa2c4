//! The inbox: a fixed-capacity, lock-free ring of message slots.
//!
//! An inbox transports fixed-size opaque payloads between threads without
//! taking a lock or calling into the kernel. Producers and consumers each
//! advance their own monotonic 64-bit cursor; the cursors are reduced modulo
//! the capacity to pick a slot, and the per-slot flag protocol in
//! [`SlotHeader`](super::slot::SlotHeader) decides who owns the slot at any
//! instant. The cursors are hints for slot placement only; the flags are
//! authoritative.
//!
//! Six access disciplines are provided:
//!
//! - [`try_write`](Inbox::try_write) / [`spin_write`](Inbox::spin_write):
//!   any number of concurrent producers.
//! - [`try_read`](Inbox::try_read) / [`spin_read`](Inbox::spin_read): at
//!   most one consumer thread per inbox (`unsafe`, see the safety contracts).
//! - [`try_shared_read`](Inbox::try_shared_read) /
//!   [`spin_shared_read`](Inbox::spin_shared_read): any number of
//!   concurrent consumers, serialized per slot by an exclusion flag.
//!
//! The spin variants busy-wait with a CPU relax hint and never park the
//! thread; callers that need deadlines or cancellation build them from the
//! try variants.

use std::alloc::{self, Layout};
use std::fmt;
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam::utils::CachePadded;

use crate::constants::{MIN_INBOX_CAPACITY, SLOT_BUFFER_ALIGNMENT, SLOT_HEADER_SIZE};
use crate::error::{CourierError, Result};
use crate::inbox::index::SlotIndexer;
use crate::inbox::slot::SlotHeader;

/// A fixed-capacity, lock-free, multi-producer multi-consumer message ring.
///
/// Created once, shared between threads behind an [`Arc`](std::sync::Arc),
/// and freed when the last handle drops. The payload is type-erased; every
/// operation moves exactly [`msg_size`](Inbox::msg_size) bytes. For a typed
/// view, see [`TypedInbox`](super::TypedInbox).
pub struct Inbox {
    /// Consumer cursor. Padded so reader traffic does not invalidate the
    /// producer's cache line.
    read_cursor: CachePadded<AtomicU64>,
    /// Producer cursor.
    write_cursor: CachePadded<AtomicU64>,
    indexer: SlotIndexer,
    msg_size: usize,
    /// Bytes from one slot header to the next: header + payload.
    stride: usize,
    slots: NonNull<u8>,
    buf_layout: Layout,
    name: String,
}

// SAFETY: the slot buffer is shared across threads only through the atomic
// flag protocol. A payload region is written exclusively by the thread that
// claimed `has_data` via compare-exchange and read only after acquiring
// `written` (plus the `shared` token on the multi-reader paths), so no two
// threads access payload bytes concurrently with a write. The allocation
// lives until `Drop`.
unsafe impl Send for Inbox {}
unsafe impl Sync for Inbox {}

impl Inbox {
    /// Create an inbox with `capacity` slots of `msg_size` payload bytes.
    ///
    /// `capacity` must be a power of two and at least 2. The slot storage is
    /// a single zeroed allocation, so every slot starts empty; the fast
    /// paths never allocate.
    pub fn new(capacity: usize, name: impl Into<String>, msg_size: usize) -> Result<Self> {
        let name = name.into();
        if capacity < MIN_INBOX_CAPACITY || !capacity.is_power_of_two() {
            tracing::error!(inbox = %name, capacity, "inbox capacity rejected");
            return Err(CourierError::InvalidCapacity(capacity));
        }

        let stride = SLOT_HEADER_SIZE + msg_size;
        let buf_layout = capacity
            .checked_mul(stride)
            .and_then(|size| Layout::from_size_align(size, SLOT_BUFFER_ALIGNMENT).ok())
            .ok_or_else(|| {
                tracing::error!(inbox = %name, capacity, msg_size, "slot buffer layout overflow");
                CourierError::AllocationFailed
            })?;

        // SAFETY: `buf_layout` has non-zero size (capacity >= 2, stride >= 8).
        let slots = NonNull::new(unsafe { alloc::alloc_zeroed(buf_layout) }).ok_or_else(|| {
            tracing::error!(inbox = %name, capacity, msg_size, "slot buffer allocation failed");
            CourierError::AllocationFailed
        })?;

        tracing::debug!(inbox = %name, capacity, msg_size, "inbox created");
        Ok(Self {
            read_cursor: CachePadded::new(AtomicU64::new(0)),
            write_cursor: CachePadded::new(AtomicU64::new(0)),
            indexer: SlotIndexer::new(capacity),
            msg_size,
            stride,
            slots,
            buf_layout,
            name,
        })
    }

    /// Name the inbox was created with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the inbox name equals `cmp`, by byte comparison.
    pub fn name_is(&self, cmp: &str) -> bool {
        self.name == cmp
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.indexer.capacity()
    }

    /// Fixed payload size in bytes.
    pub fn msg_size(&self) -> usize {
        self.msg_size
    }

    #[inline(always)]
    fn header(&self, idx: usize) -> &SlotHeader {
        debug_assert!(idx < self.capacity());
        // SAFETY: `idx` is a reduced cursor and therefore in bounds; the
        // first SLOT_HEADER_SIZE bytes of each record hold a valid header
        // (the buffer is zero-initialised and headers are only mutated
        // through atomics), and SlotHeader has no alignment requirement.
        unsafe { &*(self.slots.as_ptr().add(idx * self.stride) as *const SlotHeader) }
    }

    #[inline(always)]
    fn payload_ptr(&self, idx: usize) -> *mut u8 {
        debug_assert!(idx < self.capacity());
        // SAFETY: in bounds for the same reason as `header`; the payload
        // region of slot `idx` spans exactly `msg_size` bytes.
        unsafe { self.slots.as_ptr().add(idx * self.stride + SLOT_HEADER_SIZE) }
    }

    /// Reduce the current cursor value without advancing it.
    #[inline(always)]
    fn load_index(&self, cursor: &AtomicU64) -> usize {
        self.indexer.index_of(cursor.load(Ordering::Relaxed))
    }

    /// Advance the cursor and reduce its pre-increment value, reserving a
    /// distinct slot for each concurrent caller.
    #[inline(always)]
    fn claim_index(&self, cursor: &AtomicU64) -> usize {
        self.indexer.index_of(cursor.fetch_add(1, Ordering::Relaxed))
    }

    /// Attempt to write one message without blocking.
    ///
    /// Returns `false` if the candidate slot is still occupied (the inbox is
    /// full or a reader has not finished draining it); the caller retries
    /// under its own policy. Safe for any number of concurrent writers.
    ///
    /// # Panics
    ///
    /// Panics if `msg.len()` differs from the inbox's `msg_size`.
    pub fn try_write(&self, msg: &[u8]) -> bool {
        assert_eq!(msg.len(), self.msg_size, "payload size mismatch");
        // SAFETY: `msg` is valid for `msg_size` reads.
        unsafe { self.try_write_raw(msg.as_ptr()) }
    }

    /// Write one message, busy-waiting until a slot is free.
    ///
    /// Each retry reserves a fresh slot via the write cursor, so concurrent
    /// spinners distribute themselves across the ring instead of contending
    /// on one slot. Never parks the thread.
    ///
    /// # Panics
    ///
    /// Panics if `msg.len()` differs from the inbox's `msg_size`.
    pub fn spin_write(&self, msg: &[u8]) {
        assert_eq!(msg.len(), self.msg_size, "payload size mismatch");
        // SAFETY: `msg` is valid for `msg_size` reads.
        unsafe { self.spin_write_raw(msg.as_ptr()) }
    }

    /// Attempt to read one message without blocking (single-reader).
    ///
    /// Returns `false` if the candidate slot is empty or its payload write
    /// is still in flight.
    ///
    /// # Safety
    ///
    /// At most one thread may use `try_read`/`spin_read` on this inbox at a
    /// time. A second concurrent non-shared reader can release a slot while
    /// the first is still copying from it, allowing a writer to overwrite
    /// the payload mid-copy. Concurrent writers are always fine; concurrent
    /// readers must use the shared variants.
    ///
    /// # Panics
    ///
    /// Panics if `out.len()` differs from the inbox's `msg_size`.
    pub unsafe fn try_read(&self, out: &mut [u8]) -> bool {
        assert_eq!(out.len(), self.msg_size, "payload size mismatch");
        self.try_read_raw(out.as_mut_ptr())
    }

    /// Read one message, busy-waiting until it arrives (single-reader).
    ///
    /// Reserves the next slot up front and spins on that slot's flags with a
    /// CPU relax hint. Never parks the thread and never returns without a
    /// message.
    ///
    /// # Safety
    ///
    /// Same contract as [`try_read`](Inbox::try_read): at most one
    /// non-shared reader thread per inbox.
    ///
    /// # Panics
    ///
    /// Panics if `out.len()` differs from the inbox's `msg_size`.
    pub unsafe fn spin_read(&self, out: &mut [u8]) {
        assert_eq!(out.len(), self.msg_size, "payload size mismatch");
        self.spin_read_raw(out.as_mut_ptr())
    }

    /// Attempt to read one message without blocking, safely alongside other
    /// readers.
    ///
    /// Readers serialize per slot through the `shared` exclusion flag;
    /// exactly one of them dequeues any given message. Returns `false` if
    /// another reader holds the slot or no message is ready.
    ///
    /// # Panics
    ///
    /// Panics if `out.len()` differs from the inbox's `msg_size`.
    pub fn try_shared_read(&self, out: &mut [u8]) -> bool {
        assert_eq!(out.len(), self.msg_size, "payload size mismatch");
        // SAFETY: `out` is valid for `msg_size` writes; payload access is
        // guarded by the `shared` token.
        unsafe { self.try_shared_read_raw(out.as_mut_ptr()) }
    }

    /// Read one message, busy-waiting, safely alongside other readers.
    ///
    /// Each retry reserves a fresh slot via the read cursor. Note that a
    /// reader parked here can only be released by a message arriving; there
    /// is deliberately no cancellation (see the crate docs on termination
    /// disciplines).
    ///
    /// # Panics
    ///
    /// Panics if `out.len()` differs from the inbox's `msg_size`.
    pub fn spin_shared_read(&self, out: &mut [u8]) {
        assert_eq!(out.len(), self.msg_size, "payload size mismatch");
        // SAFETY: `out` is valid for `msg_size` writes; payload access is
        // guarded by the `shared` token.
        unsafe { self.spin_shared_read_raw(out.as_mut_ptr()) }
    }

    // Raw-pointer entry points. The typed layer proves the payload size
    // once at construction and calls these directly; the slice wrappers
    // above assert the size per call. `src`/`dst` must be valid for
    // `msg_size` reads/writes.

    pub(crate) unsafe fn try_write_raw(&self, src: *const u8) -> bool {
        let idx = self.load_index(&self.write_cursor);
        let header = self.header(idx);

        if header
            .has_data
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            ptr::copy_nonoverlapping(src, self.payload_ptr(idx), self.msg_size);
            header.written.store(true, Ordering::Release);
            // Advance the hint only after publication, so a reader racing
            // ahead on the cursor observes a committed slot.
            self.write_cursor.fetch_add(1, Ordering::Release);
            return true;
        }
        false
    }

    pub(crate) unsafe fn spin_write_raw(&self, src: *const u8) {
        loop {
            let idx = self.claim_index(&self.write_cursor);
            let header = self.header(idx);
            if header
                .has_data
                .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
            {
                ptr::copy_nonoverlapping(src, self.payload_ptr(idx), self.msg_size);
                header.written.store(true, Ordering::Release);
                return;
            }
            std::hint::spin_loop();
        }
    }

    pub(crate) unsafe fn try_read_raw(&self, dst: *mut u8) -> bool {
        let idx = self.load_index(&self.read_cursor);
        let header = self.header(idx);

        if !header.has_data.load(Ordering::Relaxed) {
            return false;
        }
        if !header.written.load(Ordering::Acquire) {
            // Writer claimed the slot but the payload is still in flight.
            return false;
        }
        ptr::copy_nonoverlapping(self.payload_ptr(idx), dst, self.msg_size);
        header.written.store(false, Ordering::Relaxed);
        header.has_data.store(false, Ordering::Release);
        self.read_cursor.fetch_add(1, Ordering::Release);
        true
    }

    pub(crate) unsafe fn spin_read_raw(&self, dst: *mut u8) {
        let idx = self.claim_index(&self.read_cursor);
        let header = self.header(idx);

        loop {
            std::hint::spin_loop();
            if header.has_data.load(Ordering::Relaxed) && header.written.load(Ordering::Acquire) {
                ptr::copy_nonoverlapping(self.payload_ptr(idx), dst, self.msg_size);
                header.written.store(false, Ordering::Relaxed);
                header.has_data.store(false, Ordering::Release);
                return;
            }
        }
    }

    pub(crate) unsafe fn try_shared_read_raw(&self, dst: *mut u8) -> bool {
        let idx = self.load_index(&self.read_cursor);
        let header = self.header(idx);

        if header
            .shared
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return false;
        }
        if header.has_data.load(Ordering::Relaxed) && header.written.load(Ordering::Acquire) {
            ptr::copy_nonoverlapping(self.payload_ptr(idx), dst, self.msg_size);
            self.read_cursor.fetch_add(1, Ordering::Release);
            header.written.store(false, Ordering::Relaxed);
            header.has_data.store(false, Ordering::Release);
            header.shared.store(false, Ordering::Release);
            return true;
        }
        header.shared.store(false, Ordering::Release);
        false
    }

    pub(crate) unsafe fn spin_shared_read_raw(&self, dst: *mut u8) {
        loop {
            let idx = self.claim_index(&self.read_cursor);
            let header = self.header(idx);

            if header
                .shared
                .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
            {
                if header.has_data.load(Ordering::Relaxed)
                    && header.written.load(Ordering::Acquire)
                {
                    ptr::copy_nonoverlapping(self.payload_ptr(idx), dst, self.msg_size);
                    header.written.store(false, Ordering::Relaxed);
                    header.has_data.store(false, Ordering::Release);
                    header.shared.store(false, Ordering::Release);
                    return;
                }
                header.shared.store(false, Ordering::Release);
            }
            std::hint::spin_loop();
        }
    }
}

impl fmt::Debug for Inbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inbox")
            .field("name", &self.name)
            .field("capacity", &self.capacity())
            .field("msg_size", &self.msg_size)
            .finish()
    }
}

impl Drop for Inbox {
    fn drop(&mut self) {
        tracing::debug!(inbox = %self.name, "inbox dropped");
        // SAFETY: `slots` was allocated in `new` with `buf_layout` and is
        // deallocated exactly once.
        unsafe { alloc::dealloc(self.slots.as_ptr(), self.buf_layout) }
    }
}
