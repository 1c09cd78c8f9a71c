pub mod discovery;
pub mod map;
pub mod plot;
