pub mod macros;

pub mod catalog;
pub mod platform;
pub mod series;
pub mod time;

pub use catalog::*;
pub use platform::*;
pub use series::*;
pub use time::*;
