//! stats / clear 명령: 저장소 점검 도구.

use chrono::DateTime;

use quotehub_data::CandleStore;

/// 저장소 통계를 출력합니다.
pub async fn stats(store: &CandleStore) -> anyhow::Result<()> {
    let stats = store.stats().await?;

    if stats.is_empty() {
        println!("store is empty");
        return Ok(());
    }

    println!(
        "{:<12} {:<6} {:<10} {:>8}  {:<20} {:<20}",
        "symbol", "ivl", "source", "candles", "earliest", "latest"
    );
    for row in stats {
        let earliest = DateTime::from_timestamp(row.earliest, 0)
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        let latest = DateTime::from_timestamp(row.latest, 0)
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<12} {:<6} {:<10} {:>8}  {:<20} {:<20}",
            row.symbol, row.interval, row.source, row.candles, earliest, latest
        );
    }

    Ok(())
}

/// 특정 심볼의 캐시 레코드를 삭제합니다.
pub async fn clear(store: &CandleStore, symbol: &str) -> anyhow::Result<()> {
    let deleted = store.delete_symbol(symbol).await?;
    println!("deleted {} candles for {}", deleted, symbol);
    Ok(())
}
