pub mod product;
pub mod vendor;

pub use product::*;
pub use vendor::*;
