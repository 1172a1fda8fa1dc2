//! Direct memory configuration.

use strata_common::{Result, error::Error};

/// Environment variable overriding [`DirectMemoryConfig::max_direct_memory`].
pub const MAX_DIRECT_MEMORY_VAR: &str = "STRATA_MAX_DIRECT_MEMORY";
/// Environment variable overriding [`DirectMemoryConfig::page_aligned`].
pub const PAGE_ALIGN_VAR: &str = "STRATA_PAGE_ALIGN_DIRECT_MEMORY";
/// Environment variable overriding [`DirectMemoryConfig::copy_threshold`].
pub const COPY_THRESHOLD_VAR: &str = "STRATA_COPY_THRESHOLD";

/// Settings for a [`DirectMemory`](crate::DirectMemory) accountant and the buffers
/// allocated through it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectMemoryConfig {
    /// Upper bound on the total bytes reserved by live native allocations.
    pub max_direct_memory: u64,
    /// Whether each native allocation starts on a page boundary.
    pub page_aligned: bool,
    /// Byte length above which bulk transfers between native memory and a
    /// managed array use a single block copy instead of an element loop.
    pub copy_threshold: usize,
    /// Overrides the detected unaligned-access capability of the platform.
    pub unaligned_access: Option<bool>,
}

impl DirectMemoryConfig {
    pub const DEFAULT_MAX_DIRECT_MEMORY: u64 = 8 * 1024 * 1024 * 1024;
    pub const DEFAULT_COPY_THRESHOLD: usize = 6;

    pub fn new() -> DirectMemoryConfig {
        DirectMemoryConfig {
            max_direct_memory: Self::DEFAULT_MAX_DIRECT_MEMORY,
            page_aligned: false,
            copy_threshold: Self::DEFAULT_COPY_THRESHOLD,
            unaligned_access: None,
        }
    }

    pub fn max_direct_memory(mut self, max: u64) -> Self {
        self.max_direct_memory = max;
        self
    }

    pub fn page_aligned(mut self, page_aligned: bool) -> Self {
        self.page_aligned = page_aligned;
        self
    }

    pub fn copy_threshold(mut self, threshold: usize) -> Self {
        self.copy_threshold = threshold;
        self
    }

    pub fn unaligned_access(mut self, unaligned: bool) -> Self {
        self.unaligned_access = Some(unaligned);
        self
    }

    /// Whether multi-byte values may be accessed at arbitrary addresses with a
    /// single wide load/store.
    pub fn is_unaligned_access_supported(&self) -> bool {
        self.unaligned_access
            .unwrap_or_else(crate::sys::unaligned_access_supported)
    }

    /// Builds a configuration from the `STRATA_*` environment variables, using
    /// defaults for the ones that are not set.
    pub fn from_env() -> Result<DirectMemoryConfig> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<DirectMemoryConfig> {
        let mut config = DirectMemoryConfig::new();
        if let Some(value) = lookup(MAX_DIRECT_MEMORY_VAR) {
            config.max_direct_memory = parse_size(MAX_DIRECT_MEMORY_VAR, &value)?;
        }
        if let Some(value) = lookup(PAGE_ALIGN_VAR) {
            config.page_aligned = parse_bool(PAGE_ALIGN_VAR, &value)?;
        }
        if let Some(value) = lookup(COPY_THRESHOLD_VAR) {
            let threshold = parse_size(COPY_THRESHOLD_VAR, &value)?;
            config.copy_threshold = usize::try_from(threshold)
                .map_err(|_| Error::invalid_arg(COPY_THRESHOLD_VAR, "value too large"))?;
        }
        Ok(config)
    }
}

impl Default for DirectMemoryConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses a byte count with an optional `k`, `m` or `g` suffix (case-insensitive).
fn parse_size(name: &str, value: &str) -> Result<u64> {
    let value = value.trim();
    let (digits, multiplier) = match value.chars().last().map(|c| c.to_ascii_lowercase()) {
        Some('k') => (&value[..value.len() - 1], 1u64 << 10),
        Some('m') => (&value[..value.len() - 1], 1u64 << 20),
        Some('g') => (&value[..value.len() - 1], 1u64 << 30),
        _ => (value, 1),
    };
    digits
        .trim()
        .parse::<u64>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
        .ok_or_else(|| Error::invalid_arg(name, format!("invalid size '{value}'")))
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(Error::invalid_arg(name, format!("invalid flag '{value}'"))),
    }
}
