/// Returns the "standard page" size in bytes.
pub fn get_page_size() -> usize {
    4 * 1024
}

/// Returns `true` if the target architecture performs unaligned multi-byte
/// loads and stores efficiently.
pub fn unaligned_access_supported() -> bool {
    cfg!(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64"))
}
