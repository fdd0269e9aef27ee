//! Worker pool and loop state
//!
//! - directory: the fixed pool of workers with LRU selection of idle ones
//! - table: one OFF/LISTEN/TALK record per catalog loop
//! - state: both of the above plus the catalog, kept consistent as one unit

pub mod directory;
pub mod state;
pub mod table;

pub use directory::WorkerDirectory;
pub use state::ControlState;
pub use table::LoopTable;
