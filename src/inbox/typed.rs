//! Typed view over the byte-oriented inbox core.
//!
//! The core transports opaque bytes; [`TypedInbox`] fixes the payload type
//! at construction, proves the size once, and then goes through the
//! unchecked raw-pointer entry points. All six access disciplines are
//! mirrored with typed signatures.

use std::fmt;
use std::marker::PhantomData;
use std::mem::{self, MaybeUninit};
use std::sync::Arc;

use crate::error::{CourierError, Result};
use crate::inbox::ring::Inbox;

/// Types that may travel through an inbox as raw bytes.
///
/// # Safety
///
/// Implementors must guarantee that every possible byte pattern of
/// `size_of::<Self>()` bytes is a valid `Self`, and that the type has no
/// padding bytes. In practice that means `#[repr(C)]` structs composed of
/// integer and float fields whose sizes add up without gaps. Types with
/// niches (`bool`, `char`, enums, references) must not implement this.
pub unsafe trait Message: Copy + Send + 'static {}

macro_rules! impl_message_for_primitives {
    ($($ty:ty),* $(,)?) => {
        $(
            // SAFETY: any byte pattern is a valid value and there is no padding.
            unsafe impl Message for $ty {}
        )*
    };
}

impl_message_for_primitives!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64);

// SAFETY: arrays of padding-free any-pattern types are themselves
// padding-free and valid for any pattern.
unsafe impl<T: Message, const N: usize> Message for [T; N] {}

/// Byte view of a message value, e.g. for passing a typed message to
/// [`Node::broadcast`](crate::node::Node::broadcast).
pub fn bytes_of<T: Message>(msg: &T) -> &[u8] {
    // SAFETY: `Message` forbids padding, so every byte of the value is
    // initialised, and the value lives as long as the returned slice.
    unsafe { std::slice::from_raw_parts(msg as *const T as *const u8, mem::size_of::<T>()) }
}

/// A typed handle to an [`Inbox`] whose payload size equals
/// `size_of::<T>()`.
///
/// Cloning is cheap (an [`Arc`] bump); clones address the same ring. The
/// single-reader operations carry the same exclusivity contract as the
/// untyped core.
pub struct TypedInbox<T> {
    inner: Arc<Inbox>,
    _marker: PhantomData<fn(T) -> T>,
}

impl<T> Clone for TypedInbox<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for TypedInbox<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypedInbox").field(&self.inner).finish()
    }
}

impl<T: Message> TypedInbox<T> {
    /// Create a new inbox sized for `T` with `capacity` slots.
    pub fn create(capacity: usize, name: impl Into<String>) -> Result<Self> {
        let inbox = Inbox::new(capacity, name, mem::size_of::<T>())?;
        Ok(Self {
            inner: Arc::new(inbox),
            _marker: PhantomData,
        })
    }

    /// Adopt an existing inbox handle, verifying the payload size once.
    pub fn from_shared(inbox: Arc<Inbox>) -> Result<Self> {
        if inbox.msg_size() != mem::size_of::<T>() {
            return Err(CourierError::MessageSizeMismatch {
                expected: inbox.msg_size(),
                actual: mem::size_of::<T>(),
            });
        }
        Ok(Self {
            inner: inbox,
            _marker: PhantomData,
        })
    }

    /// The untyped handle, e.g. for attaching the inbox to a
    /// [`Node`](crate::node::Node).
    pub fn shared(&self) -> &Arc<Inbox> {
        &self.inner
    }

    /// Non-blocking write; `false` means the candidate slot was occupied.
    pub fn try_write(&self, msg: &T) -> bool {
        // SAFETY: size_of::<T>() == msg_size was proven at construction and
        // `msg` is valid for that many reads.
        unsafe { self.inner.try_write_raw(msg as *const T as *const u8) }
    }

    /// Busy-waiting write; returns once the message is published.
    pub fn spin_write(&self, msg: &T) {
        // SAFETY: as in `try_write`.
        unsafe { self.inner.spin_write_raw(msg as *const T as *const u8) }
    }

    /// Non-blocking single-reader receive.
    ///
    /// # Safety
    ///
    /// At most one thread may use `try_read`/`spin_read` on this inbox at a
    /// time; see [`Inbox::try_read`].
    pub unsafe fn try_read(&self) -> Option<T> {
        let mut out = MaybeUninit::<T>::uninit();
        if self.inner.try_read_raw(out.as_mut_ptr() as *mut u8) {
            // SAFETY: the core copied msg_size bytes and `T: Message`
            // accepts any byte pattern.
            Some(out.assume_init())
        } else {
            None
        }
    }

    /// Busy-waiting single-reader receive.
    ///
    /// # Safety
    ///
    /// Same contract as [`TypedInbox::try_read`].
    pub unsafe fn spin_read(&self) -> T {
        let mut out = MaybeUninit::<T>::uninit();
        self.inner.spin_read_raw(out.as_mut_ptr() as *mut u8);
        // SAFETY: as in `try_read`.
        out.assume_init()
    }

    /// Non-blocking receive, safe under any number of concurrent readers.
    pub fn try_shared_read(&self) -> Option<T> {
        let mut out = MaybeUninit::<T>::uninit();
        // SAFETY: `out` is valid for msg_size writes; payload access is
        // serialized by the slot's exclusion flag.
        unsafe {
            if self.inner.try_shared_read_raw(out.as_mut_ptr() as *mut u8) {
                Some(out.assume_init())
            } else {
                None
            }
        }
    }

    /// Busy-waiting receive, safe under any number of concurrent readers.
    pub fn spin_shared_read(&self) -> T {
        let mut out = MaybeUninit::<T>::uninit();
        // SAFETY: as in `try_shared_read`.
        unsafe {
            self.inner.spin_shared_read_raw(out.as_mut_ptr() as *mut u8);
            out.assume_init()
        }
    }
}
