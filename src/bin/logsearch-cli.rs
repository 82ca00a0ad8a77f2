use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "logsearch-cli")]
#[command(about = "Operator CLI for logsearch-gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:8080")]
    url: String,

    /// Admin API key, sent as a bearer token
    #[arg(short, long)]
    key: Option<String>,

    /// Caller id to charge searches to
    #[arg(long)]
    caller: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate admission statistics
    Stats,
    /// Admission state of one caller
    Client { caller_id: String },
    /// Forget a caller's admission state
    Reset { caller_id: String },
    /// Drop idle callers now
    Sweep,
    /// Run a search through the gateway
    Search {
        query: String,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        min_time: Option<u64>,
        #[arg(long)]
        max_time: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {key}"))?);
    }
    if let Some(caller) = &cli.caller {
        headers.insert("x-caller-id", HeaderValue::from_str(caller)?);
    }

    let request = match cli.command {
        Commands::Stats => client.get(format!("{base}/admin/stats")),
        Commands::Client { caller_id } => client.get(format!("{base}/admin/clients/{caller_id}")),
        Commands::Reset { caller_id } => client.delete(format!("{base}/admin/clients/{caller_id}")),
        Commands::Sweep => client.post(format!("{base}/admin/sweep")),
        Commands::Search {
            query,
            limit,
            min_time,
            max_time,
        } => {
            let mut params = vec![("q", query)];
            params.extend(limit.map(|v| ("limit", v.to_string())));
            params.extend(min_time.map(|v| ("min_time", v.to_string())));
            params.extend(max_time.map(|v| ("max_time", v.to_string())));
            client.get(format!("{base}/api/search")).query(&params)
        }
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let retry_after = res
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let text = res.text().await?;

    if let Some(secs) = retry_after.filter(|_| !status.is_success()) {
        eprintln!("Retry after: {secs}s");
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{text}"),
    }
    ensure_success(status)?;
    Ok(())
}

/// Non-2xx replies become errors so the process exits non-zero.
fn ensure_success(status: reqwest::StatusCode) -> Result<(), String> {
    if status.is_success() {
        Ok(())
    } else {
        Err(format!("gateway returned status {status}"))
    }
}
