pub mod db;

pub use attendance_core::memory::MemoryStore;
pub use db::DbAdapter;
