use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "provider-cli")]
#[command(about = "Query a running provider-health daemon", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:8081")]
    url: String,

    #[arg(short, long, default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Daemon status
    Status,
    /// Health of every provider, in registration order
    Providers,
    /// Providers by descending score
    Ranked,
    /// Highest-scoring provider
    Best,
    /// Health of one provider
    Show { id: String },
    /// Forget a provider's health history
    Reset { id: String },
    /// Report a failure observed on real traffic
    Fail { id: String },
    /// Ask the balancer for a provider
    Select {
        /// Candidate ids (defaults to every registered provider)
        #[arg(value_delimiter = ',')]
        providers: Vec<String>,
        /// Provider that just failed; selects a failover alternative
        #[arg(long)]
        failed: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let base = cli.url.trim_end_matches('/');
    let request = match cli.command {
        Commands::Status => client.get(format!("{base}/admin/status")),
        Commands::Providers => client.get(format!("{base}/admin/providers")),
        Commands::Ranked => client.get(format!("{base}/admin/providers/ranked")),
        Commands::Best => client.get(format!("{base}/admin/providers/best")),
        Commands::Show { id } => client.get(format!("{base}/admin/providers/{id}")),
        Commands::Reset { id } => client.post(format!("{base}/admin/providers/{id}/reset")),
        Commands::Fail { id } => client.post(format!("{base}/admin/providers/{id}/failure")),
        Commands::Select { providers, failed } => {
            let mut query = Vec::new();
            if !providers.is_empty() {
                query.push(("providers", providers.join(",")));
            }
            if let Some(failed) = failed {
                query.push(("failed", failed));
            }
            client.get(format!("{base}/admin/select")).query(&query)
        }
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await?;
    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            if !text.is_empty() {
                eprintln!("Response: {}", text);
            }
        }
        return Ok(());
    }

    if status == reqwest::StatusCode::NO_CONTENT {
        println!("ok");
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
