//! System page size detection (Unix via `libc`, fallback elsewhere).

/// Returns the system page size in bytes.
#[cfg(unix)]
pub fn page_size() -> usize {
    // SAFETY: sysconf with _SC_PAGESIZE has no preconditions; a negative return means
    // "unsupported", which we treat as the common 4 KiB default.
    let ret = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if ret > 0 { ret as usize } else { 4096 }
}

#[cfg(not(unix))]
pub fn page_size() -> usize {
    4096
}
