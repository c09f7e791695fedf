use market_data_ingestor::{
    models::{asset::AssetClass, request_params::BarsRequestParams, timeframe::TimeFrame},
    providers::{
        DataProvider,
        tushare_rest::{TushareConfig, TushareProvider},
    },
};
use serial_test::serial;

#[tokio::test]
#[serial]
#[ignore]
async fn test_tushare_provider_fetch_bars() {
    // This test requires TUSHARE_TOKEN to be set in the environment (or a .env file).
    let _ = dotenvy::dotenv();
    if std::env::var("TUSHARE_TOKEN").is_err() {
        println!("Skipping test_tushare_provider_fetch_bars: TUSHARE_TOKEN not set.");
        return;
    }

    let provider =
        TushareProvider::new(&TushareConfig::default()).expect("Failed to create TushareProvider");

    let params = BarsRequestParams {
        symbol: "IF.CFX".to_string(),
        timeframe: TimeFrame::minutes(15).unwrap(),
        asset_class: AssetClass::Futures,
        limit: 30,
    };

    let result = provider.fetch_bars(&params).await;
    assert!(result.is_ok(), "fetch_bars returned an error: {:?}", result.err());

    let series = result.unwrap();
    assert_eq!(series.symbol, "IF.CFX");
    assert!(!series.is_empty(), "Expected at least one bar");
    assert!(series.len() <= 30, "Expected at most 30 bars due to limit");
    assert!(
        series.bars.windows(2).all(|w| w[0].timestamp < w[1].timestamp),
        "bars must be strictly increasing"
    );
}
