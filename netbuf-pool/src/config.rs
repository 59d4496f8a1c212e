//! Pool-wide configuration, validated once at allocator construction rather
//! than at each builder-method call.

use netbuf_core::{BufferError, Result};

/// Size-classed pooled-allocator tuning knobs.
///
/// Defaults mirror a conservative jemalloc-style configuration: small
/// chunks, modest per-thread caches, alignment off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub num_arenas: usize,
    pub page_size: usize,
    pub max_order: u8,
    pub small_cache_size: usize,
    pub normal_cache_size: usize,
    pub max_cached_buffer_capacity: usize,
    pub cache_trim_interval: u64,
    pub cache_trim_interval_millis: Option<u64>,
    pub direct_memory_cache_alignment: usize,
    pub use_cache_for_all_threads: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        let cpus = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        Self {
            num_arenas: (2 * cpus).max(1),
            page_size: 8192,
            max_order: 9,
            small_cache_size: 256,
            normal_cache_size: 64,
            max_cached_buffer_capacity: 32 * 1024,
            cache_trim_interval: 8192,
            cache_trim_interval_millis: None,
            direct_memory_cache_alignment: 0,
            use_cache_for_all_threads: false,
        }
    }
}

impl PoolConfig {
    pub fn builder() -> PoolConfigBuilder {
        PoolConfigBuilder::default()
    }

    /// Chunk size in bytes: `page_size << max_order`.
    pub fn chunk_size(&self) -> usize {
        self.page_size << self.max_order
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size < 4096 || !self.page_size.is_power_of_two() {
            return Err(BufferError::allocation_failure("page_size must be a power of two >= 4096"));
        }
        if self.max_order > 14 {
            return Err(BufferError::allocation_failure("max_order must be in 0..=14"));
        }
        if self.chunk_size() > 1 << 30 {
            return Err(BufferError::allocation_failure("chunk_size (page_size << max_order) exceeds 2^30"));
        }
        if self.num_arenas == 0 {
            return Err(BufferError::allocation_failure("num_arenas must be >= 1"));
        }
        if self.direct_memory_cache_alignment != 0 && !self.direct_memory_cache_alignment.is_power_of_two() {
            return Err(BufferError::allocation_failure("direct_memory_cache_alignment must be a power of two or 0"));
        }
        Ok(())
    }
}

/// Every setter returns `Self`; validation is deferred entirely to
/// [`PoolConfig::validate`] rather than failing mid-build.
#[derive(Debug, Clone, Default)]
pub struct PoolConfigBuilder {
    config: PoolConfig,
}

impl PoolConfigBuilder {
    pub fn with_num_arenas(mut self, num_arenas: usize) -> Self {
        self.config.num_arenas = num_arenas;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.config.page_size = page_size;
        self
    }

    pub fn with_max_order(mut self, max_order: u8) -> Self {
        self.config.max_order = max_order;
        self
    }

    pub fn with_small_cache_size(mut self, small_cache_size: usize) -> Self {
        self.config.small_cache_size = small_cache_size;
        self
    }

    pub fn with_normal_cache_size(mut self, normal_cache_size: usize) -> Self {
        self.config.normal_cache_size = normal_cache_size;
        self
    }

    pub fn with_max_cached_buffer_capacity(mut self, max_cached_buffer_capacity: usize) -> Self {
        self.config.max_cached_buffer_capacity = max_cached_buffer_capacity;
        self
    }

    pub fn with_cache_trim_interval(mut self, cache_trim_interval: u64) -> Self {
        self.config.cache_trim_interval = cache_trim_interval;
        self
    }

    pub fn with_cache_trim_interval_millis(mut self, millis: Option<u64>) -> Self {
        self.config.cache_trim_interval_millis = millis;
        self
    }

    pub fn with_direct_memory_cache_alignment(mut self, alignment: usize) -> Self {
        self.config.direct_memory_cache_alignment = alignment;
        self
    }

    pub fn with_use_cache_for_all_threads(mut self, use_cache_for_all_threads: bool) -> Self {
        self.config.use_cache_for_all_threads = use_cache_for_all_threads;
        self
    }

    pub fn build(self) -> Result<PoolConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for PoolConfigBuilder {
    fn default() -> Self {
        Self { config: PoolConfig::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        PoolConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_non_power_of_two_page_size() {
        let err = PoolConfig::builder().with_page_size(5000).build();
        assert!(err.is_err());
    }

    #[test]
    fn builder_is_infallible_until_build() {
        let cfg = PoolConfig::builder().with_max_order(99);
        let built = cfg.build();
        assert!(built.is_err());
    }
}
