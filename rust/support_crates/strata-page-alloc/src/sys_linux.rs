use std::sync::OnceLock;

/// Size of a standard page in bytes, queried once with `sysconf`.
///
/// Falls back to 4 KiB when the query fails.
pub fn get_page_size() -> usize {
    static PAGE_SIZE: OnceLock<usize> = OnceLock::new();
    *PAGE_SIZE.get_or_init(|| match unsafe { libc::sysconf(libc::_SC_PAGESIZE) } {
        size if size > 0 => size as usize,
        _ => {
            log::warn!(
                "sysconf(_SC_PAGESIZE) failed ({}), assuming 4 KiB pages",
                std::io::Error::last_os_error()
            );
            4 * 1024
        }
    })
}

/// Returns `true` if the target architecture performs unaligned multi-byte
/// loads and stores efficiently.
pub fn unaligned_access_supported() -> bool {
    cfg!(any(
        target_arch = "x86",
        target_arch = "x86_64",
        target_arch = "aarch64",
        target_arch = "powerpc64",
        target_arch = "s390x"
    ))
}
