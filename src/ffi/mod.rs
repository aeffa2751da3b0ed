pub mod syscall;

pub use perf_event_open_sys::bindings;

// Reads an unaligned value at the pointer and offsets the pointer
// by the size of the pointee type.
#[inline]
pub unsafe fn deref_offset<T: Copy>(ptr: &mut *const u8) -> T {
    let val = (*ptr as *const T).read_unaligned();
    *ptr = ptr.add(size_of::<T>());
    val
}

pub type Attr = bindings::perf_event_attr;
