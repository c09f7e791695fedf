//! Maps the configured provider kind to a concrete data provider.
use market_data_ingestor::providers::{
    DataProvider, ProviderInitError,
    synthetic::{Scenario, SyntheticProvider},
    tushare_rest::TushareProvider,
};

use crate::config::ProviderCfg;

/// Build the boxed data provider for `config`.
///
/// `synthetic_override` replaces whatever is configured with a synthetic
/// provider for the given scenario whose newest bar is the crossover.
pub fn build_provider(
    config: &ProviderCfg,
    synthetic_override: Option<Scenario>,
) -> Result<Box<dyn DataProvider + Send + Sync>, ProviderInitError> {
    if let Some(scenario) = synthetic_override {
        return Ok(Box::new(SyntheticProvider::new(scenario).with_tail_bars(1)));
    }

    match config {
        ProviderCfg::Tushare(cfg) => {
            let p = TushareProvider::new(cfg)?;
            Ok(Box::new(p))
        }
        ProviderCfg::Synthetic(cfg) => {
            let p = SyntheticProvider::new(cfg.scenario)
                .with_bars(cfg.bars)
                .with_tail_bars(cfg.tail_bars)
                .with_seed(cfg.seed);
            Ok(Box::new(p))
        }
    }
}
