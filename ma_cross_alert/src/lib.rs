//! Moving-average crossover alerts.
//!
//! A run fetches recent bars for one instrument, computes a short and a long
//! simple moving average of the close, and emails an alert when the latest
//! bar is a golden or death cross. See [`orchestrator::Orchestrator`].

pub mod config;
pub mod detector;
pub mod logging;
pub mod notifier;
pub mod orchestrator;
pub mod providers;
pub mod signal;
