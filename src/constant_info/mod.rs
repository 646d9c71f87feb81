pub mod pool;
pub mod types;

pub use pool::ConstantPool;
pub use types::*;
