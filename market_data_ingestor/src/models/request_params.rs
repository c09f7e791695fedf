use serde::{Deserialize, Serialize};

use crate::models::{asset::AssetClass, timeframe::TimeFrame};

/// Number of bars requested when the caller does not say otherwise.
pub const DEFAULT_BAR_LIMIT: usize = 200;

/// Universal parameters for requesting the most recent bars of one instrument.
///
/// This struct is vendor-agnostic; it is the standard input for all
/// [`DataProvider`](crate::providers::DataProvider) implementations.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BarsRequestParams {
    /// Vendor symbol of the instrument (e.g., `"603300.SH"`, `"IF2506.CFX"`).
    pub symbol: String,

    /// The time interval for each bar.
    ///
    /// **Validation of allowed values is performed by each data provider
    /// implementation, according to their own API rules.**
    pub timeframe: TimeFrame,

    /// The asset class of the symbol. This helps providers route the request
    /// to the correct API or endpoint.
    pub asset_class: AssetClass,

    /// Upper bound on the number of bars returned; the newest bars are kept.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_BAR_LIMIT
}
