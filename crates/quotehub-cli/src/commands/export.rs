//! export 명령: 캐시된 캔들을 CSV로 내보내기.

use chrono::Utc;

use quotehub_core::types::Window;
use quotehub_data::CandleStore;

use super::parse_date;

/// 캐시된 캔들을 CSV 파일로 내보냅니다.
///
/// `from`을 생략하면 에포크부터, `to`를 생략하면 현재 시각까지입니다.
pub async fn run(
    store: &CandleStore,
    symbol: &str,
    interval: &str,
    source: &str,
    from: Option<String>,
    to: Option<String>,
    output: &str,
) -> anyhow::Result<()> {
    let start = match from {
        Some(s) => parse_date(&s)?,
        None => Default::default(), // 에포크
    };
    let end = match to {
        Some(s) => parse_date(&s)?,
        None => Utc::now(),
    };

    let candles = store
        .query(symbol, interval, source, &Window::new(start, end))
        .await?;

    if candles.is_empty() {
        println!("no cached candles for {} ({}, {})", symbol, interval, source);
        return Ok(());
    }

    let mut writer = csv::Writer::from_path(output)?;
    writer.write_record([
        "symbol", "timestamp", "interval", "source", "open", "high", "low", "close", "volume",
    ])?;
    for candle in &candles {
        writer.write_record([
            candle.symbol.clone(),
            candle.ts.to_rfc3339(),
            candle.interval.clone(),
            candle.source.clone(),
            candle.open.to_string(),
            candle.high.to_string(),
            candle.low.to_string(),
            candle.close.to_string(),
            candle.volume.to_string(),
        ])?;
    }
    writer.flush()?;

    println!("exported {} candles to {}", candles.len(), output);
    Ok(())
}
