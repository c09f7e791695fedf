//! Tushare Pro REST provider.
//!
//! Tushare exposes every dataset behind one endpoint: the dataset is chosen by
//! `api_name` in the JSON body and the answer is a column-oriented table
//! (`fields` + `items`). Intraday bars come from `rt_fut_min` (futures) and
//! `rt_min` (stocks), stamped in exchange local time.

pub mod params;
pub mod provider;
pub mod response;

pub use provider::{TushareConfig, TushareProvider};
