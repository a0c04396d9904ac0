mod interface;
mod lock;
mod status;
#[cfg(test)]
mod tests;

pub use interface::*;
pub use lock::*;
pub use status::*;
