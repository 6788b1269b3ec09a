/// Default grid dimensions (200x200 = 40K cells)
pub const DEFAULT_WIDTH: u32 = 200;
pub const DEFAULT_HEIGHT: u32 = 200;

/// Largest width or height a pattern file may ask for
pub const MAX_DIMENSION: u32 = 8192;

/// Default number of distinct cell states
pub const DEFAULT_MODULUS: u32 = 2;

/// Cells are stored as bytes, so at most 256 states fit
pub const MAX_MODULUS: u32 = 256;

/// Default pause between simulation ticks, in milliseconds
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 16;

/// Pattern file loaded when none is given on the command line
pub const DEFAULT_PATTERN_FILE: &str = "default.json";

// ============================================
// Rasterizer
// ============================================

/// Luma for the highest cell state
pub const DARK_VALUE: u8 = 40;

/// Luma for cell state 0
pub const LIGHT_VALUE: u8 = 230;

// ============================================
// Channels
// ============================================

/// Pending commands before new ones are dropped
pub const COMMAND_CAPACITY: usize = 64;

/// Frames in flight; older ones are evicted so the newest always lands
pub const FRAME_CAPACITY: usize = 2;

// ============================================
// Presentation
// ============================================

/// Refresh cadence of the presentation loop (~60 Hz)
pub const REFRESH_INTERVAL_MS: u64 = 16;
