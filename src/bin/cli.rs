//! Leakwatch CLI
//!
//! Command-line client for a running Leakwatch server:
//! - List and filter reports
//! - Show statistics
//! - Resolve a report
//! - Check server status

use clap::{Parser, Subcommand};
use leakwatch::api::dto::{
    FilterQuery, HealthResponse, RefreshResponse, ReportDto, ReportsResponse, ResolveResponse,
    StatsResponse,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "leakwatch-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Query and manage water leak reports")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL
    #[arg(long, default_value = "http://localhost:8080", global = true)]
    pub api_url: String,

    /// Output format (table, json, csv)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List reports matching the given filters
    Reports {
        /// all, active or resolved
        #[arg(short, long)]
        status: Option<String>,
        /// Comma-separated severities (Critical,Moderate,Minor)
        #[arg(long)]
        severity: Option<String>,
        /// District name, or "All"
        #[arg(short, long)]
        district: Option<String>,
        /// First creation date to include (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,
        /// Last creation date to include (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,
    },

    /// Show dashboard statistics
    Stats,

    /// Mark a report resolved
    Resolve {
        /// Report id
        id: String,
    },

    /// Force the server to re-fetch reports
    Refresh,

    /// Show server status
    Status,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Reports {
            status,
            severity,
            district,
            start,
            end,
        } => {
            let query = FilterQuery {
                status,
                severity,
                district,
                start,
                end,
            };

            let response = client
                .get(format!("{}/api/v1/reports", cli.api_url))
                .query(&query)
                .send()
                .await?;
            let response = check(response, "Listing reports").await?;
            let data: ReportsResponse = response.json().await?;

            match cli.format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&data)?),
                "csv" => print_csv(&data.reports)?,
                _ => print_table(&data.reports),
            }
        }

        Commands::Stats => {
            let response = client
                .get(format!("{}/api/v1/stats", cli.api_url))
                .send()
                .await?;
            let response = check(response, "Fetching statistics").await?;
            let stats: StatsResponse = response.json().await?;

            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                let s = &stats.statistics;
                println!("Total Active:       {}", s.total_active);
                println!("Resolved Today:     {}", s.resolved_today);
                println!("Critical Issues:    {}", s.critical_active);
                println!("Avg Response Time:  {}", stats.avg_response_time);
                println!();
                println!("All reports: {} ({} resolved)", s.total, s.resolved);
                if let Some(updated) = stats.last_updated {
                    println!("Last updated: {}", updated.format("%Y-%m-%d %H:%M:%S UTC"));
                }
            }
        }

        Commands::Resolve { id } => {
            let response = client
                .post(format!(
                    "{}/api/v1/reports/{}/resolve",
                    cli.api_url,
                    urlencoding::encode(&id)
                ))
                .send()
                .await?;
            let response = check(response, "Resolve").await?;
            let result: ResolveResponse = response.json().await?;
            println!("Report {} {}", result.id, result.status);
        }

        Commands::Refresh => {
            let response = client
                .post(format!("{}/api/v1/refresh", cli.api_url))
                .send()
                .await?;
            let response = check(response, "Refresh").await?;
            let result: RefreshResponse = response.json().await?;
            println!(
                "Loaded {} reports ({} active, {} critical)",
                result.count, result.statistics.total_active, result.statistics.critical_active
            );
        }

        Commands::Status => {
            let response = client.get(format!("{}/health", cli.api_url)).send().await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    let health: HealthResponse = resp.json().await?;

                    println!("Leakwatch v{}", health.version);
                    println!();
                    println!("API Status: {}", health.status);
                    println!("Store:      {} ({})", health.store, health.phase);
                    if let Some(err) = &health.last_error {
                        println!("Last error: {}", err);
                    }
                    match health.last_updated {
                        Some(t) => println!("Updated:    {}", t.format("%Y-%m-%d %H:%M:%S UTC")),
                        None => println!("Updated:    never"),
                    }
                    println!("Live clients: {}", health.ws_connections);
                    println!();
                    println!("Uptime: {}", format_duration(health.uptime_seconds));
                }
                Ok(resp) => {
                    eprintln!("API returned error: {}", resp.status());
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("Cannot connect to Leakwatch API at {}", cli.api_url);
                    eprintln!("Error: {}", e);
                    eprintln!();
                    eprintln!("Make sure the server is running:");
                    eprintln!("  cargo run --bin leakwatch -- --demo");
                    std::process::exit(1);
                }
            }
        }

        Commands::Config { output } => {
            let config = leakwatch::config::generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

/// Exit with the server's error body on a non-success status
async fn check(response: reqwest::Response, action: &str) -> anyhow::Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    eprintln!("{} failed ({}): {}", action, status, text);
    std::process::exit(1);
}

fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else if seconds < 86400 {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    } else {
        format!("{}d {}h", seconds / 86400, (seconds % 86400) / 3600)
    }
}

fn print_table(reports: &[ReportDto]) {
    if reports.is_empty() {
        println!("No leak reports match the current filters.");
        return;
    }

    println!(
        "{:<6} {:<24} {:<16} {:<9} {:<12} {:<20} {}",
        "ID", "Address", "Type", "Severity", "District", "Reported", "Status"
    );
    println!("{}", "-".repeat(98));

    for r in reports {
        println!(
            "{:<6} {:<24} {:<16} {:<9} {:<12} {:<20} {}",
            r.id.to_string(),
            truncate(&r.address, 24),
            truncate(&r.leak_type, 16),
            r.severity.to_string(),
            truncate(&r.district, 12),
            r.reported,
            if r.resolved { "Resolved" } else { "Active" }
        );
    }
    println!();
    println!("{} report(s)", reports.len());
}

fn print_csv(reports: &[ReportDto]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(std::io::stdout());
    writer.write_record([
        "id",
        "address",
        "leak_type",
        "severity",
        "district",
        "created_at",
        "resolved",
        "description",
    ])?;

    for r in reports {
        writer.write_record([
            r.id.to_string(),
            r.address.clone(),
            r.leak_type.clone(),
            r.severity.to_string(),
            r.district.clone(),
            r.created_at.clone().unwrap_or_default(),
            r.resolved.to_string(),
            r.description.clone().unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let cut: String = s.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}
