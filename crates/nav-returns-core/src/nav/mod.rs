pub mod resolve;
pub mod series;

pub use series::{NavPoint, NavSeries, RawNavEntry};
