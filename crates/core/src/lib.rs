#![forbid(unsafe_code)]

pub mod model;
pub mod stats;
pub mod time;

pub use stats::CourseStats;
pub use time::Clock;
