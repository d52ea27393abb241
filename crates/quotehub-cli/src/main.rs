//! 시장 데이터 허브 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 비트코인 일봉 수집 (캐시에 없는 구간만 다운로드)
//! quotehub fetch -s BTCUSDT -f 2024-01-01 -t 2024-06-30
//!
//! # 여러 심볼 + 피처 계산
//! quotehub fetch -s BTCUSDT,ETHUSDT -f 2024-01-01 -t 2024-06-30 --features
//!
//! # 저장소 통계
//! quotehub stats
//!
//! # CSV 내보내기
//! quotehub export -s BTCUSDT -o btc.csv
//! ```

use clap::{Parser, Subcommand};
use tracing::warn;

use quotehub_core::{init_logging, AppConfig, LogConfig, LogFormat};
use quotehub_data::CandleStore;

mod commands;

#[derive(Parser)]
#[command(name = "quotehub")]
#[command(about = "QuoteHub - 증분 캐시 기반 시장 데이터 수집 도구", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 설정 파일 경로
    #[arg(long, default_value = "config/default.toml")]
    config: String,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// OHLCV 데이터 수집 (캐시 우선, 누락 구간만 다운로드)
    Fetch {
        /// 심볼 목록 (쉼표로 구분, 예: "BTCUSDT,ETHUSDT")
        #[arg(short, long)]
        symbols: String,

        /// 시작 날짜 (YYYY-MM-DD)
        #[arg(short = 'f', long)]
        from: String,

        /// 종료 날짜 (YYYY-MM-DD)
        #[arg(short, long)]
        to: String,

        /// 간격 라벨 (예: 1h, 4h, 1d)
        #[arg(short, long, default_value = "1d")]
        interval: String,

        /// 데이터 소스
        #[arg(long, default_value = "binance")]
        source: String,

        /// 기술적 지표 피처 계산 포함
        #[arg(long)]
        features: bool,
    },

    /// 저장소 통계 출력
    Stats,

    /// 특정 심볼의 캐시 레코드 삭제
    Clear {
        /// 삭제할 심볼
        #[arg(short, long)]
        symbol: String,
    },

    /// 캐시된 데이터를 CSV로 내보내기
    Export {
        /// 심볼
        #[arg(short, long)]
        symbol: String,

        /// 간격 라벨
        #[arg(short, long, default_value = "1d")]
        interval: String,

        /// 데이터 소스
        #[arg(long, default_value = "binance")]
        source: String,

        /// 시작 날짜 (YYYY-MM-DD, 생략 시 전체)
        #[arg(short = 'f', long)]
        from: Option<String>,

        /// 종료 날짜 (YYYY-MM-DD, 생략 시 현재)
        #[arg(short, long)]
        to: Option<String>,

        /// 출력 CSV 파일 경로
        #[arg(short, long)]
        output: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // 설정 로드 (없으면 기본값으로 진행)
    let (config, config_err) = match AppConfig::load(&cli.config) {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    let format = config
        .logging
        .format
        .parse::<LogFormat>()
        .unwrap_or_default();
    init_logging(LogConfig::new(cli.log_level.as_str()).with_format(format))
        .map_err(|e| anyhow::anyhow!("logging init failed: {}", e))?;

    if let Some(e) = config_err {
        warn!(path = %cli.config, error = %e, "설정 로드 실패, 기본값 사용");
    }

    let store = CandleStore::open_with(&config.database).await?;

    match cli.command {
        Commands::Fetch {
            symbols,
            from,
            to,
            interval,
            source,
            features,
        } => {
            commands::fetch::run(
                &config,
                store,
                commands::fetch::FetchParams {
                    symbols,
                    from,
                    to,
                    interval,
                    source,
                    features,
                },
            )
            .await
        }
        Commands::Stats => commands::inspect::stats(&store).await,
        Commands::Clear { symbol } => commands::inspect::clear(&store, &symbol).await,
        Commands::Export {
            symbol,
            interval,
            source,
            from,
            to,
            output,
        } => commands::export::run(&store, &symbol, &interval, &source, from, to, &output).await,
    }
}
