//! Solace CLI - command-line client for the Solace server

mod rpc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use rpc::RpcClient;
use serde::Deserialize;
use serde_json::{json, Value};
use tabled::{Table, Tabled};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9527";
const PREVIEW_CHARS: usize = 60;

#[derive(Parser)]
#[command(name = "solace")]
#[command(about = "Solace chat backend CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "SOLACE_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,

    /// Print raw JSON results
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a chat message
    Chat {
        message: String,

        /// support | analysis | practice
        #[arg(short, long, default_value = "support")]
        mode: String,

        #[arg(short, long, default_value = "default")]
        user: String,

        /// ru | en
        #[arg(short, long, default_value = "ru")]
        language: String,
    },

    /// Delete conversation history
    ClearHistory {
        #[arg(short, long, default_value = "default")]
        user: String,

        /// Only this mode (default: all modes)
        #[arg(short, long)]
        mode: Option<String>,
    },

    /// Show a background task
    Task { task_id: String },

    /// Cancel a background task that has not finished
    Cancel { task_id: String },

    /// Show (or reset) a user's current topic
    Topic {
        user: String,

        #[arg(long)]
        refresh: bool,
    },

    /// Show a user's recommendations
    Recommendations {
        user: String,

        #[arg(short, long, default_value = "ru")]
        language: String,
    },

    /// Delete everything stored about a user
    DeleteUser { user: String },

    /// Show the quote of the day
    Quote {
        #[arg(short, long)]
        topic: Option<String>,

        #[arg(short, long, default_value = "ru")]
        language: String,
    },

    /// List stored articles
    Articles {
        #[arg(short, long)]
        topic: Option<String>,

        #[arg(short, long, default_value = "ru")]
        language: String,

        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },

    /// Search videos
    Videos {
        #[arg(short, long)]
        topic: Option<String>,

        #[arg(short, long, default_value = "ru")]
        language: String,

        #[arg(short = 'n', long, default_value = "5")]
        limit: u32,
    },

    /// Generate content now
    Generate {
        /// article | quote
        content_type: String,

        #[arg(short, long)]
        topic: Option<String>,

        #[arg(short, long, default_value = "ru")]
        language: String,
    },

    /// Show content for first-time users
    Initial {
        #[arg(short, long, default_value = "ru")]
        language: String,
    },

    /// Show content picked from a user's history
    Personalized {
        user: String,

        #[arg(short, long, default_value = "ru")]
        language: String,
    },

    /// Inspect or reset the video search cache
    VideoCache {
        /// Drop all cached searches
        #[arg(long)]
        clear: bool,

        /// Reset the quota-exceeded flag
        #[arg(long)]
        retry: bool,
    },

    /// Check server health
    Health,

    /// Show queue and database statistics
    Status,

    /// Run maintenance operations
    Maintenance {
        /// Force VACUUM even if not needed
        #[arg(long)]
        force_vacuum: bool,
    },
}

#[derive(Deserialize, Tabled)]
struct ArticleRow {
    title: String,
    topic: String,
    approach: String,
    #[tabled(rename = "content")]
    #[serde(rename = "content", deserialize_with = "preview")]
    preview: String,
}

#[derive(Deserialize, Tabled)]
struct VideoRow {
    title: String,
    channel: String,
    #[tabled(rename = "duration")]
    #[serde(default)]
    formatted_duration: String,
    view_count: u64,
    url: String,
}

#[derive(Deserialize, Tabled)]
struct QueueRow {
    queued: i64,
    running: i64,
    done: i64,
    failed: i64,
    superseded: i64,
    cancelled: i64,
}

fn preview<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let text = String::deserialize(deserializer)?;
    Ok(truncate(&text, PREVIEW_CHARS))
}

fn truncate(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let head: String = flat.chars().take(max_chars).collect();
    format!("{}…", head)
}

fn rows<T: for<'de> Deserialize<'de>>(value: &Value) -> Result<Vec<T>> {
    serde_json::from_value(value.clone()).context("Unexpected response shape")
}

fn print_articles(articles: &Value) -> Result<()> {
    let articles: Vec<ArticleRow> = rows(articles)?;
    if articles.is_empty() {
        println!("{}", "No articles yet".yellow());
    } else {
        println!("{}", Table::new(articles));
    }
    Ok(())
}

fn print_videos(videos: &Value) -> Result<()> {
    let videos: Vec<VideoRow> = rows(videos)?;
    if videos.is_empty() {
        println!("{}", "No videos found".yellow());
    } else {
        println!("{}", Table::new(videos));
    }
    Ok(())
}

fn print_quote(quote: &Value) {
    if quote.is_null() {
        println!("{}", "No quote yet".yellow());
        return;
    }
    println!("  “{}”", quote["text"].as_str().unwrap_or_default().italic());
    println!("    — {}", quote["author"].as_str().unwrap_or_default());
}

fn print_task(task: &Value) {
    let status = task["status"].as_str().unwrap_or_default();
    let colored_status = match status {
        "completed" => status.green(),
        "failed" => status.red(),
        "superseded" => status.yellow(),
        _ => status.cyan(),
    };
    println!("  {} {}", "Task:".bold(), task["task_id"].as_str().unwrap_or_default());
    println!("  {} {}", "Type:".bold(), task["job_type"].as_str().unwrap_or_default());
    println!("  {} {} ({})", "Status:".bold(), colored_status, task["state"]);
    println!("  {} {}", "Attempts:".bold(), task["attempts"]);
    if let Some(error) = task["error"].as_str() {
        println!("  {} {}", "Error:".bold(), error.red());
    }
    if !task["result"].is_null() {
        println!("  {} {}", "Result:".bold(), task["result"]);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let client = RpcClient::new(cli.rpc_url);

    // Method and params for every command
    let (method, params) = match &cli.command {
        Commands::Chat {
            message,
            mode,
            user,
            language,
        } => (
            "chat.send.v1",
            json!({"message": message, "mode": mode, "user_id": user, "language": language}),
        ),
        Commands::ClearHistory { user, mode } => {
            ("chat.clear_history.v1", json!({"user_id": user, "mode": mode}))
        }
        Commands::Task { task_id } => ("task.status.v1", json!({ "task_id": task_id })),
        Commands::Cancel { task_id } => ("task.cancel.v1", json!({ "task_id": task_id })),
        Commands::Topic { user, refresh } => (
            if *refresh {
                "user.topic.refresh.v1"
            } else {
                "user.topic.v1"
            },
            json!({ "user_id": user }),
        ),
        Commands::Recommendations { user, language } => (
            "user.recommendations.v1",
            json!({"user_id": user, "language": language}),
        ),
        Commands::DeleteUser { user } => ("user.delete.v1", json!({ "user_id": user })),
        Commands::Quote { topic, language } => (
            "content.daily_quote.v1",
            json!({"topic": topic, "language": language}),
        ),
        Commands::Articles {
            topic,
            language,
            limit,
        } => (
            "content.articles.v1",
            json!({"topic": topic, "language": language, "limit": limit}),
        ),
        Commands::Videos {
            topic,
            language,
            limit,
        } => (
            "content.videos.v1",
            json!({"topic": topic, "language": language, "limit": limit}),
        ),
        Commands::Generate {
            content_type,
            topic,
            language,
        } => (
            "content.generate.v1",
            json!({"content_type": content_type, "topic": topic, "language": language}),
        ),
        Commands::Initial { language } => ("content.initial.v1", json!({ "language": language })),
        Commands::Personalized { user, language } => (
            "content.personalized.v1",
            json!({"user_id": user, "language": language}),
        ),
        Commands::VideoCache { clear, retry } => match (clear, retry) {
            (true, _) => ("video.cache_clear.v1", json!({})),
            (false, true) => ("video.force_retry.v1", json!({})),
            (false, false) => ("video.cache_status.v1", json!({})),
        },
        Commands::Health => ("system.health.v1", json!({})),
        Commands::Status => ("admin.stats.v1", json!({})),
        Commands::Maintenance { force_vacuum } => (
            "admin.maintenance.v1",
            json!({ "force_vacuum": force_vacuum }),
        ),
    };

    let result = client.call(method, params).await?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    match &cli.command {
        Commands::Chat { .. } => {
            println!("{}", result["response"].as_str().unwrap_or_default());
            println!();
            if let Some(topic) = result["topic"].as_str() {
                println!("  {} {}", "Topic:".dimmed(), topic);
            }
            if let Some(task_id) = result["topic_task_id"].as_str() {
                println!("  {} {}", "Topic task:".dimmed(), task_id);
            }
        }
        Commands::ClearHistory { .. } => {
            println!(
                "{} ({} messages)",
                result["message"].as_str().unwrap_or_default().green().bold(),
                result["deleted"]
            );
        }
        Commands::Task { .. } => print_task(&result),
        Commands::Cancel { task_id } => {
            println!("{}", format!("✓ Task {} cancelled", task_id).green().bold());
            print_task(&result);
        }
        Commands::Topic { user, refresh } => {
            if *refresh {
                println!("{}", result["message"].as_str().unwrap_or_default().green());
                if let Some(previous) = result["previous_topic"].as_str() {
                    println!("  {} {}", "Previous topic:".bold(), previous);
                }
            } else {
                match result["topic"].as_str() {
                    Some(topic) => println!("  {} {}", format!("{}:", user).bold(), topic),
                    None => println!("{}", "No topic yet".yellow()),
                }
            }
        }
        Commands::Recommendations { .. } => {
            if result["status"] == "processing" {
                println!("{}", result["message"].as_str().unwrap_or_default().cyan());
                println!("  {} {}", "Task:".bold(), result["task_id"].as_str().unwrap_or_default());
            } else {
                println!("{} {}", "Topic:".bold(), result["topic"].as_str().unwrap_or_default());
                println!();
                print_quote(&result["quote"]);
                println!();
                print_articles(&result["articles"])?;
                print_videos(&result["videos"])?;
            }
        }
        Commands::DeleteUser { .. } => {
            println!("{}", result["message"].as_str().unwrap_or_default().green().bold());
        }
        Commands::Quote { .. } => print_quote(&result),
        Commands::Articles { .. } => print_articles(&result["articles"])?,
        Commands::Videos { .. } => print_videos(&result["videos"])?,
        Commands::Generate { .. } => {
            println!("{}", result["message"].as_str().unwrap_or_default().green().bold());
            if !result["articles"].as_array().map_or(true, Vec::is_empty) {
                print_articles(&result["articles"])?;
            }
            if !result["quote"].is_null() {
                print_quote(&result["quote"]);
            }
        }
        Commands::Initial { .. } => {
            if result["generation_triggered"].as_bool().unwrap_or(false) {
                println!("{}", "Content is being prepared, try again shortly".cyan());
                if let Some(task_id) = result["task_id"].as_str() {
                    println!("  {} {}", "Task:".bold(), task_id);
                }
            } else {
                print_quote(&result["daily_quote"]);
                println!();
                print_articles(&result["random_articles"])?;
            }
        }
        Commands::Personalized { .. } => {
            println!(
                "  {} {} messages, mostly {}",
                "History:".bold(),
                result["user_stats"]["total_messages"],
                result["most_used_mode"].as_str().unwrap_or_default()
            );
            println!();
            print_quote(&result["daily_quote"]);
            println!();
            print_articles(&result["recommended_articles"])?;
            print_videos(&result["recommended_videos"])?;
        }
        Commands::VideoCache { clear, retry } => {
            if *clear {
                println!("{}", format!("✓ {} cached searches cleared", result["cleared"]).green());
            } else if *retry {
                println!("{}", result["message"].as_str().unwrap_or_default().green());
            } else {
                println!("  {} {}", "Cached queries:".bold(), result["cached_queries"]);
                println!("  {} {}", "API configured:".bold(), result["api_configured"]);
                println!("  {} {}", "Quota exceeded:".bold(), result["quota_exceeded"]);
                println!("  {} {} s", "TTL:".bold(), result["cache_ttl_secs"]);
            }
        }
        Commands::Health => {
            let status = result["status"].as_str().unwrap_or_default();
            let status = if status == "healthy" { status.green() } else { status.red() };
            println!("  {} {}", "Status:".bold(), status);
            println!("  {} {}", "Version:".bold(), result["version"].as_str().unwrap_or_default());
            println!("  {} {}", "LLM configured:".bold(), result["llm_configured"]);
            println!("  {} {}", "Video API configured:".bold(), result["video_api_configured"]);
            println!("  {} {} seconds", "Uptime:".bold(), result["uptime_secs"]);
        }
        Commands::Status => {
            println!("{}", "System Status".cyan().bold());
            println!();
            println!("  {} {}", "RPC URL:".bold(), client.url());
            println!("  {} {:.2} MB", "DB Size:".bold(), result["db_size_mb"].as_f64().unwrap_or(0.0));
            println!("  {} {}", "Conversations:".bold(), result["conversation_count"]);
            println!("  {} {}", "Articles:".bold(), result["article_count"]);
            println!("  {} {}", "Quotes:".bold(), result["quote_count"]);
            println!("  {} {}", "Cache entries:".bold(), result["cache_entry_count"]);
            println!("  {} {} seconds", "Uptime:".bold(), result["uptime_secs"]);
            println!();
            let queue: QueueRow = serde_json::from_value(result["queue"].clone())?;
            println!("{}", Table::new(vec![queue]));
        }
        Commands::Maintenance { force_vacuum } => {
            if *force_vacuum {
                println!("  {} Force VACUUM enabled", "•".bold());
            }
            println!("  ✓ Maintenance completed");
            if result["vacuum_run"].as_bool().unwrap_or(false) {
                println!("  {} VACUUM executed", "✓".green());
            } else {
                println!("  ○ VACUUM skipped (not needed)");
            }
            println!("  {} {} jobs deleted", "✓".green(), result["deleted_jobs"]);
            println!(
                "  {} {} expired cache entries purged",
                "✓".green(),
                result["purged_cache_entries"]
            );
            println!(
                "  {} {:.2} MB → {:.2} MB",
                "DB Size:".bold(),
                result["db_size_before_mb"].as_f64().unwrap_or(0.0),
                result["db_size_after_mb"].as_f64().unwrap_or(0.0)
            );
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
    Ok(())
}
