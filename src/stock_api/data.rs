pub mod memory;
pub mod provider;
pub mod sqlite;
pub mod synthetic;

pub use memory::*;
pub use provider::*;
pub use sqlite::*;
pub use synthetic::*;
