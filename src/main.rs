mod config;
mod directory;
mod error;
mod output;
mod probe;
mod progress;
mod rank;
mod types;

use anyhow::Result;
use clap::{Parser, Subcommand};
use config::Config;
use directory::DirectoryClient;
use probe::{HttpProber, Prober};
use progress::ProgressTicker;
use rank::RankReport;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use types::MirrorCandidate;

#[derive(Parser)]
#[command(name = "mirrorrank")]
#[command(about = "Benchmark AOSC repository mirrors and generate a ranked sources.list", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Benchmark all mirrors and write the provisioning file
    Rank {
        /// Where to write the generated file
        #[arg(long, short, default_value = output::DEFAULT_FILENAME)]
        output: PathBuf,

        /// Include the testing channel in every repository line
        #[arg(long)]
        testing: bool,

        /// Benchmarking deadline in seconds
        #[arg(long)]
        deadline_secs: Option<u64>,

        /// Mirror directory API base URL
        #[arg(long)]
        api: Option<String>,
    },
    /// List the mirror directory with per-mirror staleness, no probing
    Status {
        /// Mirror directory API base URL
        #[arg(long)]
        api: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Rank {
            output,
            testing,
            deadline_secs,
            api,
        } => handle_rank(output, testing, deadline_secs, api).await?,
        Commands::Status { api } => handle_status(api).await?,
    }

    Ok(())
}

// --- Handlers ---

async fn handle_rank(
    output_path: PathBuf,
    testing: bool,
    deadline_secs: Option<u64>,
    api: Option<String>,
) -> Result<()> {
    let mut cfg = Config::load();
    if let Some(api) = api {
        cfg.api_base = api;
    }
    if let Some(secs) = deadline_secs {
        cfg.deadline = Duration::from_secs(secs);
    }

    let client = DirectoryClient::new(&cfg.api_base, cfg.probe_timeout);
    let prober = Arc::new(HttpProber::new(cfg.probe_timeout, &cfg.reference_path));

    let (text, report) = benchmark_and_render(
        ProgressTicker::start(),
        client.fetch_candidates(),
        prober,
        cfg.deadline,
        testing,
    )
    .await?;

    println!();

    if report.ranked.is_empty() {
        println!(
            "No mirror responded before the deadline ({} failed, {} unanswered).",
            report.failed, report.abandoned
        );
    } else {
        println!(
            "{:<4} {:<10} {:<10} {:<14} URL",
            "RANK", "SCORE", "LATENCY", "NAME"
        );
        println!("{}", "-".repeat(70));
        for (i, c) in report.ranked.iter().enumerate() {
            let latency_str = format!("{}ms", c.elapsed.as_millis());
            println!(
                "{:<4} {:<10.2} {:<10} {:<14} {}",
                i + 1,
                c.score,
                latency_str,
                c.name,
                c.url
            );
        }
        println!("{}", "-".repeat(70));
        if report.failed > 0 || report.abandoned > 0 {
            println!(
                "Excluded: {} failed, {} missed the deadline.",
                report.failed, report.abandoned
            );
        }
    }

    output::write_list(&output_path, &text).await?;
    println!("Wrote {}.", output_path.display());

    Ok(())
}

async fn handle_status(api: Option<String>) -> Result<()> {
    let mut cfg = Config::load();
    if let Some(api) = api {
        cfg.api_base = api;
    }

    let client = DirectoryClient::new(&cfg.api_base, cfg.probe_timeout);
    let candidates = client.fetch_candidates().await?;

    println!("{:<14} {:<10} URL", "NAME", "LAG");
    println!("{}", "-".repeat(70));
    for c in &candidates {
        println!(
            "{:<14} {:<10} {}",
            c.name,
            format_lag(c.lag),
            c.url
        );
    }
    println!("{}", "-".repeat(70));
    println!("{} mirrors listed.", candidates.len());

    Ok(())
}

fn format_lag(lag: Duration) -> String {
    let secs = lag.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else {
        format!("{:.1}h", secs as f64 / 3600.0)
    }
}

/// One full benchmarking run: resolve the directory, rank under the
/// deadline, render.
///
/// The caller hands in a freshly started ticker; it is retired on
/// every terminal path. Only a directory failure propagates; probe
/// failures and an empty ranked list flow through to the rendered
/// output.
async fn benchmark_and_render<F>(
    ticker: ProgressTicker,
    fetch: F,
    prober: Arc<dyn Prober>,
    deadline: Duration,
    testing: bool,
) -> error::Result<(String, RankReport)>
where
    F: Future<Output = error::Result<Vec<MirrorCandidate>>>,
{
    let candidates = match fetch.await {
        Ok(candidates) => candidates,
        Err(e) => {
            ticker.abort().await;
            return Err(e);
        }
    };

    let report = rank::rank(prober, candidates, deadline).await;

    // The aggregator's completion (all reported or deadline) is the
    // real end of the run; the cosmetic ticker follows it, never the
    // other way around.
    ticker.finish().await;

    let text = output::render(&report.ranked, testing);
    Ok((text, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use error::RankError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use types::{ProbeOutcome, ProbeSuccess};

    struct CountingProber {
        calls: AtomicUsize,
        elapsed: Duration,
    }

    #[async_trait]
    impl Prober for CountingProber {
        async fn probe(&self, candidate: MirrorCandidate) -> ProbeOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            ProbeOutcome::Completed(ProbeSuccess {
                candidate,
                elapsed: self.elapsed,
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn directory_failure_skips_probing_and_stops_the_ticker() {
        let prober = Arc::new(CountingProber {
            calls: AtomicUsize::new(0),
            elapsed: Duration::from_millis(50),
        });

        let ticker = ProgressTicker::start();
        let percent = ticker.percent_handle();

        let res = benchmark_and_render(
            ticker,
            async {
                Err(RankError::DirectoryUnreachable {
                    url: "https://aosc.io/api/mirror-status".to_string(),
                    reason: "connection refused".to_string(),
                })
            },
            Arc::clone(&prober) as Arc<dyn Prober>,
            Duration::from_secs(10),
            false,
        )
        .await;

        assert!(matches!(
            res,
            Err(RankError::DirectoryUnreachable { .. })
        ));
        assert_eq!(prober.calls.load(Ordering::SeqCst), 0);

        // the ticker was retired with the run; no more ticks happen
        let frozen = percent.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(percent.load(Ordering::SeqCst), frozen);
        assert!(frozen < 100);
    }

    #[tokio::test]
    async fn full_run_renders_ranked_declarations() {
        let prober = Arc::new(CountingProber {
            calls: AtomicUsize::new(0),
            elapsed: Duration::from_millis(100),
        });

        let candidates = vec![
            MirrorCandidate::new("One", "https://one.example.org/anthon/", Duration::ZERO),
            MirrorCandidate::new("Two", "https://two.example.org/anthon/", Duration::ZERO),
        ];

        let ticker = ProgressTicker::start();
        let percent = ticker.percent_handle();

        let (text, report) = benchmark_and_render(
            ticker,
            async { Ok(candidates) },
            Arc::clone(&prober) as Arc<dyn Prober>,
            Duration::from_secs(10),
            false,
        )
        .await
        .unwrap();

        assert_eq!(prober.calls.load(Ordering::SeqCst), 2);
        assert_eq!(report.ranked.len(), 2);
        assert_eq!(report.ranked[0].elapsed, Duration::from_millis(100));
        // the ticker ends the run pinned at completion
        assert_eq!(percent.load(Ordering::SeqCst), 100);
        assert!(text.starts_with("# Generated by AOSC Mirror Service\n# One\n"));
        assert!(text.contains("deb https://one.example.org/anthon/ main\n"));
        assert!(text.contains("# deb https://two.example.org/anthon/ main\n"));
    }

    #[test]
    fn lag_formats_for_humans() {
        assert_eq!(format_lag(Duration::from_secs(42)), "42s");
        assert_eq!(format_lag(Duration::from_secs(180)), "3m");
        assert_eq!(format_lag(Duration::from_secs(5400)), "1.5h");
    }
}
