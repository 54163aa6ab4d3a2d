//! Terminal front end: one module per command plus shared table and spinner helpers

pub mod compare;
pub mod providers;
pub mod rates;
pub mod setup;
pub mod ui;
