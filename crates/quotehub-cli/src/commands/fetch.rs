//! fetch 명령: 캐시 우선 데이터 수집.

use std::sync::Arc;

use tracing::info;

use quotehub_analytics::{
    AtrFeature, BollingerFeature, EmaFeature, MacdFeature, RsiFeature, SmaFeature,
};
use quotehub_core::AppConfig;
use quotehub_data::{BinanceBackend, CandleDownloader, CandleStore, DataManager, DataRequest};

use super::parse_date;

/// fetch 명령 인자.
pub struct FetchParams {
    /// 쉼표로 구분된 심볼 목록
    pub symbols: String,
    /// 시작 날짜 (YYYY-MM-DD)
    pub from: String,
    /// 종료 날짜 (YYYY-MM-DD)
    pub to: String,
    /// 간격 라벨
    pub interval: String,
    /// 데이터 소스
    pub source: String,
    /// 피처 계산 여부
    pub features: bool,
}

/// 설정에 맞춰 다운로더를 구성합니다.
fn build_downloader(config: &AppConfig, store: CandleStore) -> anyhow::Result<CandleDownloader> {
    let mut downloader = CandleDownloader::new(store)
        .with_use_cache(config.data.use_cache)
        .with_max_concurrency(config.data.max_fetch_concurrency);

    match config.sources.get("binance") {
        Some(source_config) if !source_config.enabled => {
            info!("Binance 소스가 설정에서 비활성화됨");
        }
        Some(source_config) => {
            downloader.register_backend(Arc::new(BinanceBackend::from_config(source_config)?));
        }
        None => {
            downloader.register_backend(Arc::new(BinanceBackend::new()));
        }
    }

    Ok(downloader)
}

/// fetch 명령을 실행합니다.
pub async fn run(config: &AppConfig, store: CandleStore, params: FetchParams) -> anyhow::Result<()> {
    let symbols: Vec<String> = params
        .symbols
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if symbols.is_empty() {
        anyhow::bail!("no symbols given");
    }

    let start = parse_date(&params.from)?;
    let end = parse_date(&params.to)?;

    let downloader = build_downloader(config, store)?;

    if params.features {
        let mut manager = DataManager::new(downloader);
        manager.register_calculator(Arc::new(SmaFeature::new(vec![20, 50])));
        manager.register_calculator(Arc::new(EmaFeature::new(vec![12, 26])));
        manager.register_calculator(Arc::new(RsiFeature::default()));
        manager.register_calculator(Arc::new(MacdFeature::default()));
        manager.register_calculator(Arc::new(BollingerFeature::default()));
        manager.register_calculator(Arc::new(AtrFeature::default()));

        let request =
            DataRequest::new(symbols, start, end, params.interval.as_str(), params.source.as_str());
        let snapshot = manager.get_data(&request).await?;

        println!(
            "snapshot v{} · {} symbols · {} candles",
            snapshot.version,
            snapshot.series.len(),
            snapshot.total_candles()
        );
        for (symbol, series) in &snapshot.series {
            println!("  {:<12} {:>6} candles · {} features", symbol, series.candles.len(), series.features.len());
        }
        println!("features: {}", manager.feature_names().join(", "));
    } else {
        let symbol_refs: Vec<&str> = symbols.iter().map(String::as_str).collect();
        let candles = downloader
            .get(&symbol_refs, start, end, &params.interval, &params.source)
            .await?;

        println!("{} candles ({} ~ {})", candles.len(), params.from, params.to);
        for symbol in &symbols {
            let count = candles.iter().filter(|c| &c.symbol == symbol).count();
            println!("  {:<12} {:>6} candles", symbol, count);
        }
    }

    Ok(())
}
