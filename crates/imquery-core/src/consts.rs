//! Constants used throughout imquery

/// Maximum accepted page width or height
pub const MAX_IMAGE_DIMENSION: u32 = 1 << 20; // 1048576

/// Maximum number of pages enumerated from one container
pub const MAX_PAGES: usize = 65536;

/// Downsample factors accepted by reduced reads
pub const REDUCTION_FACTORS: [u32; 4] = [1, 2, 4, 8];

/// Number of leading bytes inspected when sniffing a container format
pub const SNIFF_LEN: usize = 16;
