// Logvault CLI - submit and inspect logs against a running API server.

use clap::{Parser, Subcommand};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};
use serde_json::{json, Value};

const DEFAULT_API_URL: &str = "http://localhost:3000";

#[derive(Parser)]
#[command(name = "logvault")]
#[command(version = "0.1.0")]
#[command(about = "Log platform CLI", long_about = None)]
struct Cli {
    /// API server URL
    #[arg(short, long, default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Service API key (for `send`)
    #[arg(short = 'k', long, env = "LOGVAULT_API_KEY")]
    api_key: Option<String>,

    /// Operator bearer token (for everything else)
    #[arg(short, long, env = "LOGVAULT_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a log entry
    Send {
        /// Log message
        message: String,

        /// Severity (trace|debug|information|warning|error|critical)
        #[arg(short, long, default_value = "information")]
        level: String,

        /// Optional category
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Search stored logs
    Search {
        /// Free-text query (message, category, exception, stack trace)
        #[arg(short, long)]
        text: Option<String>,

        /// Minimum severity
        #[arg(short, long)]
        min_level: Option<String>,

        /// Scope to one service id
        #[arg(short, long)]
        service: Option<String>,

        /// Maximum results
        #[arg(long, default_value = "20")]
        take: u32,
    },

    /// List registered services
    Services {
        /// Include deactivated services
        #[arg(long)]
        include_inactive: bool,
    },

    /// List services that stopped reporting
    Offline,

    /// Check server health
    Status,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let result = match &cli.command {
        Commands::Send {
            message,
            level,
            category,
        } => send_log(&client, &cli, message, level, category.as_deref()).await,
        Commands::Search {
            text,
            min_level,
            service,
            take,
        } => search_logs(
            &client,
            &cli,
            text.as_deref(),
            min_level.as_deref(),
            service.as_deref(),
            *take,
        )
        .await,
        Commands::Services { include_inactive } => {
            list_services(&client, &cli, *include_inactive).await
        }
        Commands::Offline => offline_services(&client, &cli).await,
        Commands::Status => status(&client, &cli).await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn bearer(cli: &Cli) -> Result<String, String> {
    cli.token
        .clone()
        .ok_or_else(|| "a bearer token is required (--token or LOGVAULT_TOKEN)".to_string())
}

async fn send_log(
    client: &reqwest::Client,
    cli: &Cli,
    message: &str,
    level: &str,
    category: Option<&str>,
) -> Result<(), String> {
    let api_key = cli
        .api_key
        .clone()
        .ok_or_else(|| "an API key is required (--api-key or LOGVAULT_API_KEY)".to_string())?;

    let mut body = json!({ "message": message, "level": level });
    if let Some(category) = category {
        body["category"] = json!(category);
    }

    let response = client
        .post(format!("{}/api/logs", cli.api_url))
        .header("X-API-Key", api_key)
        .json(&body)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if !response.status().is_success() {
        return Err(format!("server returned {}", response.status()));
    }
    let body: Value = response.json().await.map_err(|e| e.to_string())?;
    println!(
        "{} id={}",
        "accepted".green().bold(),
        body["id"].as_str().unwrap_or("?")
    );
    Ok(())
}

async fn search_logs(
    client: &reqwest::Client,
    cli: &Cli,
    text: Option<&str>,
    min_level: Option<&str>,
    service: Option<&str>,
    take: u32,
) -> Result<(), String> {
    let token = bearer(cli)?;
    let mut body = json!({ "take": take });
    if let Some(text) = text {
        body["searchText"] = json!(text);
    }
    if let Some(level) = min_level {
        body["minLevel"] = json!(level);
    }
    if let Some(service) = service {
        body["serviceId"] = json!(service);
    }

    let response = client
        .post(format!("{}/api/logs/search", cli.api_url))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .map_err(|e| e.to_string())?;
    if !response.status().is_success() {
        return Err(format!("server returned {}", response.status()));
    }
    let body: Value = response.json().await.map_err(|e| e.to_string())?;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["time", "level", "service", "message"]);
    for entry in body["logs"].as_array().cloned().unwrap_or_default() {
        table.add_row(vec![
            entry["timestamp"].as_str().unwrap_or("").to_string(),
            entry["level"].as_str().unwrap_or("").to_string(),
            entry["serviceName"].as_str().unwrap_or("").to_string(),
            entry["message"].as_str().unwrap_or("").to_string(),
        ]);
    }
    println!("{table}");
    println!(
        "total (scoped searches only): {}",
        body["totalCount"].as_u64().unwrap_or(0)
    );
    Ok(())
}

async fn list_services(
    client: &reqwest::Client,
    cli: &Cli,
    include_inactive: bool,
) -> Result<(), String> {
    let token = bearer(cli)?;
    let response = client
        .get(format!(
            "{}/api/services?includeInactive={}",
            cli.api_url, include_inactive
        ))
        .bearer_auth(token)
        .send()
        .await
        .map_err(|e| e.to_string())?;
    if !response.status().is_success() {
        return Err(format!("server returned {}", response.status()));
    }
    let services: Value = response.json().await.map_err(|e| e.to_string())?;
    print_services(&services);
    Ok(())
}

async fn offline_services(client: &reqwest::Client, cli: &Cli) -> Result<(), String> {
    let token = bearer(cli)?;
    let response = client
        .get(format!("{}/api/services/offline", cli.api_url))
        .bearer_auth(token)
        .send()
        .await
        .map_err(|e| e.to_string())?;
    if !response.status().is_success() {
        return Err(format!("server returned {}", response.status()));
    }
    let services: Value = response.json().await.map_err(|e| e.to_string())?;
    if services.as_array().map(Vec::len).unwrap_or(0) == 0 {
        println!("{}", "all services are reporting".green());
        return Ok(());
    }
    print_services(&services);
    Ok(())
}

fn print_services(services: &Value) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["name", "client", "environment", "active", "online", "last report"]);
    for service in services.as_array().cloned().unwrap_or_default() {
        table.add_row(vec![
            service["name"].as_str().unwrap_or("").to_string(),
            service["clientName"].as_str().unwrap_or("").to_string(),
            service["environment"].as_str().unwrap_or("").to_string(),
            service["isActive"].as_bool().unwrap_or(false).to_string(),
            service["isOnline"].as_bool().unwrap_or(false).to_string(),
            service["lastLogReceivedAt"].as_str().unwrap_or("-").to_string(),
        ]);
    }
    println!("{table}");
}

async fn status(client: &reqwest::Client, cli: &Cli) -> Result<(), String> {
    let response = client
        .get(format!("{}/health", cli.api_url))
        .send()
        .await
        .map_err(|e| e.to_string())?;
    if response.status().is_success() {
        println!("{}", "server is up".green().bold());
        Ok(())
    } else {
        Err(format!("server returned {}", response.status()))
    }
}
