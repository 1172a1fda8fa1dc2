use std::sync::OnceLock;
use windows_sys::Win32::System::SystemInformation::{GetSystemInfo, SYSTEM_INFO};

/// Gets the system's standard page size in bytes.
///
/// The function uses lazy initialization with [`OnceLock`] to cache the result of
/// querying `GetSystemInfo`.
pub fn get_page_size() -> usize {
    static PAGE_SIZE: OnceLock<usize> = OnceLock::new();

    *PAGE_SIZE.get_or_init(|| unsafe {
        let mut system_info: SYSTEM_INFO = std::mem::zeroed();
        GetSystemInfo(&mut system_info);
        system_info.dwPageSize as usize
    })
}

/// Returns `true` if the target architecture performs unaligned multi-byte
/// loads and stores efficiently.
pub fn unaligned_access_supported() -> bool {
    cfg!(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64"))
}
