pub mod calendar;
pub mod cycle;
pub mod entries;
