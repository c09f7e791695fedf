use serde::{Deserialize, Serialize};

/// Market segment of an instrument. Providers use it to route a request to
/// the right endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    #[default]
    Futures,
    Stock,
}
