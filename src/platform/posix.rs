// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// POSIX implementation of shared memory and semaphore primitives.
// Binary-compatible with cpp-ipc/src/libipc/platform/posix/shm_posix.cpp.

use std::ffi::CString;
use std::io;
use std::ptr;
use std::sync::atomic::{AtomicI32, Ordering};

use crate::shm_name;

// ---------------------------------------------------------------------------
// Layout helpers — must match C++ calc_size() and acc_of()
// ---------------------------------------------------------------------------

/// Mirrors C++ `calc_size()`: rounds up to `alignof(info_t)` then appends
/// an `atomic<int32_t>` reference counter at the end.
/// `alignof(info_t)` == `alignof(atomic<int32_t>)` == 4.
const ALIGN: usize = std::mem::align_of::<AtomicI32>();

pub(crate) fn calc_size(user_size: usize) -> usize {
    let aligned = ((user_size.wrapping_sub(1) / ALIGN) + 1) * ALIGN;
    aligned + std::mem::size_of::<AtomicI32>()
}

/// Returns a reference to the trailing `AtomicI32` ref-counter inside a mapped
/// region of `total_size` bytes starting at `mem`.
///
/// # Safety
/// `mem` must point to a valid mapped region of at least `total_size` bytes.
unsafe fn acc_of(mem: *mut u8, total_size: usize) -> &'static AtomicI32 {
    let offset = total_size - std::mem::size_of::<AtomicI32>();
    &*(mem.add(offset) as *const AtomicI32)
}

// ---------------------------------------------------------------------------
// PlatformShm — POSIX shared memory
// ---------------------------------------------------------------------------

pub struct PlatformShm {
    mem: *mut u8,
    size: usize,      // total mapped size (including ref counter)
    user_size: usize, // user-requested size
    name: String,     // POSIX name (with leading '/')
    prev_ref: i32,    // ref count *before* our fetch_add (0 means we were first)
}

// Safety: the shared memory region is process-shared by design.
unsafe impl Send for PlatformShm {}
unsafe impl Sync for PlatformShm {}

/// Open mode flags — mirrors C++ `ipc::shm::create` / `ipc::shm::open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShmMode {
    Create,
    Open,
    CreateOrOpen,
}

impl PlatformShm {
    /// Acquire a named shared memory region, binary-compatible with C++ `ipc::shm::acquire`
    /// + `ipc::shm::get_mem`.
    pub fn acquire(name: &str, user_size: usize, mode: ShmMode) -> io::Result<Self> {
        if name.is_empty() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "name is empty"));
        }
        if user_size == 0 {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "size is 0"));
        }

        let posix_name = shm_name::make_shm_name(name);
        let c_name = CString::new(posix_name.as_bytes())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        let perms: libc::mode_t = 0o666; // S_IRUSR|S_IWUSR|S_IRGRP|S_IWGRP|S_IROTH|S_IWOTH
        let total_size = calc_size(user_size);

        // For CreateOrOpen: try exclusive create first so we only call ftruncate
        // when we actually own the new object.  On macOS, calling ftruncate on an
        // already-sized shm object can zero its contents before returning EINVAL.
        let (fd, need_truncate) = match mode {
            ShmMode::Create => {
                let f = unsafe {
                    libc::shm_open(
                        c_name.as_ptr(),
                        libc::O_RDWR | libc::O_CREAT | libc::O_EXCL,
                        perms as libc::c_uint,
                    )
                };
                if f == -1 {
                    return Err(io::Error::last_os_error());
                }
                (f, true)
            }
            ShmMode::Open => {
                let f =
                    unsafe { libc::shm_open(c_name.as_ptr(), libc::O_RDWR, perms as libc::c_uint) };
                if f == -1 {
                    return Err(io::Error::last_os_error());
                }
                (f, false)
            }
            ShmMode::CreateOrOpen => {
                // Try exclusive create first.
                let f = unsafe {
                    libc::shm_open(
                        c_name.as_ptr(),
                        libc::O_RDWR | libc::O_CREAT | libc::O_EXCL,
                        perms as libc::c_uint,
                    )
                };
                if f != -1 {
                    // We created it — must truncate to set the size.
                    (f, true)
                } else {
                    let e = io::Error::last_os_error();
                    if e.raw_os_error() != Some(libc::EEXIST) {
                        return Err(e);
                    }
                    // Already exists — open without truncation.
                    let f2 = unsafe {
                        libc::shm_open(c_name.as_ptr(), libc::O_RDWR, perms as libc::c_uint)
                    };
                    if f2 == -1 {
                        return Err(io::Error::last_os_error());
                    }
                    (f2, false)
                }
            }
        };

        // Ensure permissions (mirrors fchmod in C++)
        unsafe { libc::fchmod(fd, perms) };

        if need_truncate {
            let ret = unsafe { libc::ftruncate(fd, total_size as libc::off_t) };
            if ret != 0 {
                let err = io::Error::last_os_error();
                unsafe { libc::close(fd) };
                return Err(err);
            }
        }

        Self::mmap_and_finish(fd, total_size, user_size, posix_name)
    }

    fn mmap_and_finish(
        fd: i32,
        total_size: usize,
        user_size: usize,
        posix_name: String,
    ) -> io::Result<Self> {
        let mem = unsafe {
            libc::mmap(
                ptr::null_mut(),
                total_size,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                fd,
                0,
            )
        };
        unsafe { libc::close(fd) };

        if mem == libc::MAP_FAILED {
            return Err(io::Error::last_os_error());
        }

        // Increment the reference counter (mirrors C++ get_mem)
        let prev = unsafe { acc_of(mem as *mut u8, total_size).fetch_add(1, Ordering::AcqRel) };

        Ok(Self {
            mem: mem as *mut u8,
            size: total_size,
            user_size,
            name: posix_name,
            prev_ref: prev,
        })
    }

    /// Pointer to the user-visible region (excluding the trailing ref counter).
    pub fn as_ptr(&self) -> *const u8 {
        self.mem
    }

    /// Mutable pointer to the user-visible region.
    pub fn as_mut_ptr(&self) -> *mut u8 {
        self.mem
    }

    /// Total mapped size (including ref counter).
    pub fn mapped_size(&self) -> usize {
        self.size
    }

    /// User-requested size.
    pub fn user_size(&self) -> usize {
        self.user_size
    }

    /// POSIX name (with leading '/').
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The ref count value *before* our own increment during acquire.
    /// Returns 0 if this handle was the first to map the segment.
    pub fn prev_ref_count(&self) -> i32 {
        self.prev_ref
    }

    /// Current reference count.
    pub fn ref_count(&self) -> i32 {
        if self.mem.is_null() || self.size == 0 {
            return 0;
        }
        unsafe { acc_of(self.mem, self.size).load(Ordering::Acquire) }
    }

    /// Force-remove the backing file (shm_unlink). Does NOT release the mapping.
    pub fn unlink(&self) {
        if let Ok(c_name) = CString::new(self.name.as_bytes()) {
            unsafe { libc::shm_unlink(c_name.as_ptr()) };
        }
    }

    /// Unlink a named shm segment by name (static helper).
    pub fn unlink_by_name(name: &str) {
        let posix_name = shm_name::make_shm_name(name);
        if let Ok(c_name) = CString::new(posix_name.as_bytes()) {
            unsafe { libc::shm_unlink(c_name.as_ptr()) };
        }
    }
}

impl Drop for PlatformShm {
    fn drop(&mut self) {
        if self.mem.is_null() {
            return;
        }
        // Decrement ref counter; if we're the last, also unlink.
        let prev = unsafe { acc_of(self.mem, self.size).fetch_sub(1, Ordering::AcqRel) };
        unsafe { libc::munmap(self.mem as *mut libc::c_void, self.size) };
        if prev <= 1 {
            self.unlink();
        }
    }
}

// ---------------------------------------------------------------------------
// PlatformSemaphore — POSIX named counting semaphore (sem_open family)
// ---------------------------------------------------------------------------

pub struct PlatformSemaphore {
    sem: *mut libc::sem_t,
    name: String,
}

// Safety: sem_t accessed through sem_wait/sem_post is safe for concurrent use.
unsafe impl Send for PlatformSemaphore {}
unsafe impl Sync for PlatformSemaphore {}

impl PlatformSemaphore {
    /// Open (or create) a named counting semaphore, initialised to `initial`
    /// if this call creates it. An already-existing semaphore keeps its
    /// current count.
    pub fn open(name: &str, initial: u32) -> io::Result<Self> {
        let posix_name = shm_name::make_shm_name(name);
        let c_name = CString::new(posix_name.as_bytes())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        let sem = unsafe {
            libc::sem_open(
                c_name.as_ptr(),
                libc::O_CREAT,
                0o666 as libc::c_uint,
                initial,
            )
        };
        if sem == libc::SEM_FAILED {
            return Err(io::Error::last_os_error());
        }

        Ok(Self {
            sem: sem as *mut libc::sem_t,
            name: posix_name,
        })
    }

    /// Wait for the semaphore to become available.
    ///
    /// `timeout_ms = None` blocks indefinitely. `Some(ms)` blocks for at most
    /// `ms` milliseconds, returning `Ok(false)` on timeout.
    pub fn wait(&self, timeout_ms: Option<u64>) -> io::Result<bool> {
        match timeout_ms {
            None => {
                loop {
                    let ret = unsafe { libc::sem_wait(self.sem) };
                    if ret == 0 {
                        return Ok(true);
                    }
                    let err = io::Error::last_os_error();
                    if err.kind() != io::ErrorKind::Interrupted {
                        return Err(err);
                    }
                }
            }
            Some(ms) => self.wait_timed(ms),
        }
    }

    #[cfg(target_os = "macos")]
    fn wait_timed(&self, timeout_ms: u64) -> io::Result<bool> {
        // macOS has no sem_timedwait for named semaphores — poll sem_trywait
        // with the crate's adaptive backoff instead.
        let deadline = std::time::Instant::now() + std::time::Duration::from_millis(timeout_ms);
        let mut k = 0u32;
        loop {
            let ret = unsafe { libc::sem_trywait(self.sem) };
            if ret == 0 {
                return Ok(true);
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::WouldBlock && err.raw_os_error() != Some(libc::EAGAIN)
            {
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(err);
            }
            if std::time::Instant::now() >= deadline {
                return Ok(false);
            }
            crate::spin_lock::adaptive_yield_pub(&mut k);
        }
    }

    #[cfg(not(target_os = "macos"))]
    fn wait_timed(&self, timeout_ms: u64) -> io::Result<bool> {
        let mut ts: libc::timespec = unsafe { std::mem::zeroed() };
        unsafe { libc::clock_gettime(libc::CLOCK_REALTIME, &mut ts) };
        let ns_total = ts.tv_nsec as u64 + (timeout_ms % 1000) * 1_000_000;
        ts.tv_sec += (timeout_ms / 1000) as libc::time_t + (ns_total / 1_000_000_000) as libc::time_t;
        ts.tv_nsec = (ns_total % 1_000_000_000) as libc::c_long;

        loop {
            let ret = unsafe { libc::sem_timedwait(self.sem, &ts) };
            if ret == 0 {
                return Ok(true);
            }
            let err = io::Error::last_os_error();
            match err.raw_os_error() {
                Some(libc::ETIMEDOUT) => return Ok(false),
                Some(libc::EINTR) => continue,
                _ => return Err(err),
            }
        }
    }

    /// Release the semaphore `count` times.
    pub fn post(&self, count: u32) -> io::Result<()> {
        for _ in 0..count {
            let ret = unsafe { libc::sem_post(self.sem) };
            if ret != 0 {
                return Err(io::Error::last_os_error());
            }
        }
        Ok(())
    }

    /// POSIX name (with leading '/').
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Remove the backing named semaphore (static helper).
    pub fn clear_storage(name: &str) {
        let posix_name = shm_name::make_shm_name(name);
        if let Ok(c_name) = CString::new(posix_name.as_bytes()) {
            unsafe { libc::sem_unlink(c_name.as_ptr()) };
        }
    }
}

impl Drop for PlatformSemaphore {
    fn drop(&mut self) {
        unsafe { libc::sem_close(self.sem) };
    }
}
