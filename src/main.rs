//! Dostana - push notifications and operation status from the terminal
#![allow(clippy::uninlined_format_args)]

use std::io::BufRead;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::{Mutex, mpsc};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use dostana::api::{ProfileApi, ProfileClient};
use dostana::desktop::{BrowserViews, HttpPushPlatform, TerminalNotifier};
use dostana::models::{
    Alert, Attachment, FetchState, NotificationRequest, Operation, OperationStatus,
};
use dostana::push::{
    ForegroundListener, NotificationDefaults, Permission, PushSetup, ServiceWorker, WorkerHandle,
    WorkerOutcome, notification_from_push, spawn_worker,
};
use dostana::tracker::{RetryHandler, spawn_tracker_with_expiry};
use dostana::{Config, Database};

/// Shown notifications older than this are pruned from the history
const HISTORY_RETENTION_HOURS: u64 = 24 * 30;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (RUST_LOG=debug for verbose output)
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let command = parse_args()?;
    let config = Config::load()?;

    match command {
        Command::Subscribe { assume_yes } => subscribe(&config, assume_yes).await,
        Command::Unsubscribe => unsubscribe(&config),
        Command::Status => status(&config),
        Command::Push {
            payload,
            foreground,
        } => push_cli(&config, &payload, foreground).await,
        Command::Click {
            url,
            views,
            launch_browser,
        } => click_cli(&config, &url, &views, launch_browser).await,
        Command::Listen { launch_browser } => listen(&config, launch_browser).await,
        Command::History { limit } => history(limit),
        Command::Profile { user_id } => profile(&config, &user_id).await,
        Command::Demo => demo(&config).await,
        Command::Config => write_config(&config),
        Command::Help => {
            print_help();
            Ok(())
        }
        Command::Version => {
            print_version();
            Ok(())
        }
    }
}

/// CLI commands
enum Command {
    Subscribe {
        assume_yes: bool,
    },
    Unsubscribe,
    Status,
    Push {
        payload: String,
        foreground: bool,
    },
    Click {
        url: String,
        views: Vec<String>,
        launch_browser: bool,
    },
    Listen {
        launch_browser: bool,
    },
    History {
        limit: usize,
    },
    Profile {
        user_id: String,
    },
    Demo,
    Config,
    Help,
    Version,
}

fn parse_args() -> Result<Command> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() == 1 {
        return Ok(Command::Help);
    }

    let has_flag = |long: &str, short: &str| args.iter().any(|a| a == long || a == short);

    match args[1].as_str() {
        "-h" | "--help" | "help" => Ok(Command::Help),
        "-v" | "--version" | "version" => Ok(Command::Version),
        "demo" => Ok(Command::Demo),
        "config" => Ok(Command::Config),
        "status" => Ok(Command::Status),
        "unsubscribe" => Ok(Command::Unsubscribe),

        "subscribe" => Ok(Command::Subscribe {
            assume_yes: has_flag("--yes", "-y"),
        }),

        "push" => {
            let payload = args
                .get(2)
                .ok_or_else(|| anyhow::anyhow!("Missing push payload (JSON)"))?
                .clone();
            Ok(Command::Push {
                payload,
                foreground: has_flag("--foreground", "-f"),
            })
        }

        "click" => {
            let url = args
                .get(2)
                .ok_or_else(|| anyhow::anyhow!("Missing notification URL"))?
                .clone();

            // Parse --views flag
            let views = args
                .iter()
                .position(|a| a == "--views")
                .and_then(|i| args.get(i + 1))
                .map(|v| {
                    v.split(',')
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default();

            Ok(Command::Click {
                url,
                views,
                launch_browser: !has_flag("--no-browser", "-n"),
            })
        }

        "listen" => Ok(Command::Listen {
            launch_browser: !has_flag("--no-browser", "-n"),
        }),

        "history" => {
            let limit = args
                .iter()
                .position(|a| a == "--limit" || a == "-l")
                .and_then(|i| args.get(i + 1))
                .and_then(|s| s.parse().ok())
                .unwrap_or(20);
            Ok(Command::History { limit })
        }

        "profile" => {
            let user_id = args
                .get(2)
                .ok_or_else(|| anyhow::anyhow!("Missing user ID"))?
                .clone();
            Ok(Command::Profile { user_id })
        }

        other => Err(anyhow::anyhow!(
            "Unknown command: {other}\nRun 'dostana --help' for usage"
        )),
    }
}

fn print_help() {
    let config_path = Config::default_path()
        .map_or_else(|_| "Unknown".to_string(), |p| p.display().to_string());

    println!(
        r#"{}
🤝 Dostana - push notifications and operation status

USAGE:
    dostana [COMMAND]

COMMANDS:
    subscribe [--yes]                  Enable push notifications
    unsubscribe                        Forget the push subscription
    status                             Show push setup and configuration

    push <json> [--foreground]         Deliver a push payload
      Examples:
        dostana push '{{"title":"Hi","data":{{"url":"/chat/42"}}}}'
        dostana push 'not json'

    click <url> [OPTIONS]              Click a notification pointing at <url>
      Options:
        --views <urls>                 Comma-separated views already open
        -n, --no-browser               Don't launch the browser

    listen [--no-browser]              Read payloads from stdin (one per line,
                                       "click <url>" to click), Ctrl+C to stop

    history [-l <n>]                   Show recently shown notifications
    profile <user-id>                  Fetch a user's profile
    demo                               Watch operation cards go by
    config                             Write the config file with every key filled in

OPTIONS:
    -h, --help                         Show this help message
    -v, --version                      Show version information

CONFIG:
    {}
"#,
        dostana::LOGO,
        config_path
    );
}

fn print_version() {
    println!("dostana {}", dostana::VERSION);
}

async fn subscribe(config: &Config, assume_yes: bool) -> Result<()> {
    let db = Database::open()?;
    let mut setup = PushSetup::new(config).with_subscription(db.get_subscription()?);

    let mut platform = HttpPushPlatform::new(&config.push_service_url);
    if assume_yes {
        platform = platform.with_permission(Permission::Granted);
    }

    match setup.setup(&platform).await {
        Ok(subscription) => {
            db.save_subscription(&subscription)?;
            println!("✓ Push notifications enabled");
            println!("  Endpoint: {}", subscription.endpoint);
        }
        Err(e) => {
            // Push stays inactive; nothing is stored
            println!("⚠ Push notifications not enabled: {}", e);
        }
    }

    Ok(())
}

fn unsubscribe(config: &Config) -> Result<()> {
    let db = Database::open()?;
    let mut setup = PushSetup::new(config).with_subscription(db.get_subscription()?);

    if let Some(subscription) = setup.reset() {
        db.clear_subscription()?;
        tracing::info!("Dropped push subscription {}", subscription.endpoint);
        println!("✓ Push subscription removed");
    } else {
        println!("No push subscription stored.");
    }
    Ok(())
}

fn status(config: &Config) -> Result<()> {
    let db = Database::open()?;

    match db.get_subscription()? {
        Some(subscription) => {
            println!("🔔 Push: enabled");
            println!("   Endpoint: {}", subscription.endpoint);
        }
        None => println!("🔕 Push: not enabled (run: dostana subscribe)"),
    }

    println!("\nWorker:        {} (scope {})", config.worker_path, config.worker_scope);
    println!("Push service:  {}", config.push_service_url);
    println!("App:           {}", config.app_url);
    let key = if config.vapid_public_key.is_empty() {
        "(not set)"
    } else {
        "(set)"
    };
    println!("VAPID key:     {}", key);

    Ok(())
}

fn open_history() -> Result<Arc<Mutex<Database>>> {
    Ok(Arc::new(Mutex::new(Database::open()?)))
}

fn start_worker(
    config: &Config,
    db: Arc<Mutex<Database>>,
    views: BrowserViews,
) -> WorkerHandle {
    spawn_worker(ServiceWorker::new(
        TerminalNotifier::with_history(db),
        views,
        NotificationDefaults::from_config(config),
    ))
}

fn click_target(config: &Config, url: &str) -> NotificationRequest {
    let mut notification = notification_from_push(None, &NotificationDefaults::from_config(config));
    notification.options.data.url = url.to_string();
    notification
}

async fn push_cli(config: &Config, payload: &str, foreground: bool) -> Result<()> {
    let db = open_history()?;

    if foreground {
        let permission = if db.lock().await.get_subscription()?.is_some() {
            Permission::Granted
        } else {
            Permission::Default
        };
        let listener = ForegroundListener::new(
            TerminalNotifier::with_history(db),
            NotificationDefaults::from_config(config),
        );
        if listener
            .on_message(permission, payload.as_bytes())
            .await?
            .is_none()
        {
            println!("Message dropped: notifications are not enabled");
        }
        return Ok(());
    }

    let worker = start_worker(config, db, BrowserViews::new(&config.app_url).headless());
    worker.push(Some(payload.as_bytes().to_vec())).await?;
    Ok(())
}

async fn click_cli(
    config: &Config,
    url: &str,
    views: &[String],
    launch_browser: bool,
) -> Result<()> {
    let db = open_history()?;
    let mut host = BrowserViews::new(&config.app_url).with_views(views);
    if !launch_browser {
        host = host.headless();
    }

    let worker = start_worker(config, db, host);
    match worker.click(click_target(config, url)).await? {
        WorkerOutcome::Focused(view) => println!("✓ Focused existing view {}", view.url),
        WorkerOutcome::Opened(view) => println!("✓ Opened new view {}", view.url),
        _ => {}
    }
    Ok(())
}

async fn listen(config: &Config, launch_browser: bool) -> Result<()> {
    let db = open_history()?;
    let mut host = BrowserViews::new(&config.app_url);
    if !launch_browser {
        host = host.headless();
    }
    let worker = start_worker(config, db, host);
    worker.dispatch(dostana::push::WorkerEvent::Install).await?;
    worker.dispatch(dostana::push::WorkerEvent::Activate).await?;

    let (stop_tx, mut stop_rx) = mpsc::unbounded_channel::<()>();
    ctrlc::set_handler(move || {
        let _ = stop_tx.send(());
    })?;

    println!("Listening for push payloads on stdin (Ctrl+C to stop)...");
    let mut lines = spawn_line_reader(std::io::BufReader::new(std::io::stdin()));

    while let Some(line) = next_line(&mut lines, &mut stop_rx).await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let result = match line.strip_prefix("click ") {
            Some(url) => worker.click(click_target(config, url.trim())).await,
            None => worker.push(Some(line.as_bytes().to_vec())).await,
        };
        if let Err(e) = result {
            eprintln!("✗ {}", e);
        }
    }

    println!("\nStopped.");
    Ok(())
}

type LineReceiver = mpsc::UnboundedReceiver<std::io::Result<String>>;

/// Forward lines from `reader` over a channel.
///
/// Reads happen on a plain thread: a blocked stdin read can't be cancelled,
/// so the thread is left behind when the listener stops and dies with the
/// process.
fn spawn_line_reader<R>(reader: R) -> LineReceiver
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in reader.lines() {
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Next input line, or `None` once input ends or a stop is requested
async fn next_line(
    lines: &mut LineReceiver,
    stop: &mut mpsc::UnboundedReceiver<()>,
) -> Result<Option<String>> {
    tokio::select! {
        biased;
        _ = stop.recv() => Ok(None),
        line = lines.recv() => Ok(line.transpose()?),
    }
}

fn history(limit: usize) -> Result<()> {
    let db = Database::open()?;
    let pruned = db.clear_old_notifications(HISTORY_RETENTION_HOURS)?;
    if pruned > 0 {
        tracing::debug!("Pruned {} old notifications", pruned);
    }

    let recent = db.recent_notifications(limit)?;

    if recent.is_empty() {
        println!("No notifications yet.");
        return Ok(());
    }

    for entry in recent {
        println!(
            "{}  {}\n    {} → {}",
            entry.shown_at.format("%Y-%m-%d %H:%M"),
            entry.title,
            entry.body,
            entry.url
        );
    }

    Ok(())
}

fn write_config(config: &Config) -> Result<()> {
    config.save()?;
    println!("✓ Config written to {}", Config::default_path()?.display());
    Ok(())
}

async fn profile(config: &Config, user_id: &str) -> Result<()> {
    let mut client = ProfileClient::new(&config.api_base_url);
    if let Some(token) = &config.api_token {
        client = client.with_token(token.as_str());
    }

    match client.load_profile(user_id).await {
        FetchState::Success(profile) => {
            println!("{} (@{})", profile.name, profile.username);
            if let Some(bio) = &profile.bio {
                println!("{}", bio);
            }
            Ok(())
        }
        FetchState::Error(message) => Err(anyhow::anyhow!(message)),
        FetchState::Loading => Ok(()),
    }
}

fn print_cards(operations: &[Operation]) {
    println!("{}", "─".repeat(40));
    if operations.is_empty() {
        println!("(nothing in progress)");
    }
    for op in operations {
        println!("{}", op.card());
    }
}

async fn demo(config: &Config) -> Result<()> {
    let tracker = spawn_tracker_with_expiry(config.success_expiry());
    let alerts = dostana::spawn_alerts(config.alert_timeout());

    let mut cards = tracker.subscribe();
    let printer = tokio::spawn(async move {
        while cards.changed().await.is_ok() {
            let ops = cards.borrow_and_update().clone();
            print_cards(&ops);
            if ops.is_empty() {
                break;
            }
        }
    });

    let photo = Operation::new("photo", "Uploading photo")
        .with_attachments(vec![Attachment::image("beach.jpg")]);
    let upload = tracker.track(photo, None, async {
        tokio::time::sleep(Duration::from_millis(700)).await;
        Ok::<_, String>(())
    });

    let retry_tracker = tracker.clone();
    let retry: RetryHandler = Arc::new(move || {
        let tracker = retry_tracker.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(600)).await;
            let _ = tracker.set_status("reel", OperationStatus::Success).await;
        });
    });
    let reel = Operation::new("reel", "Posting reel")
        .with_attachments(vec![Attachment::video("reel.mp4")]);
    let post = tracker.track(reel, Some(retry), async {
        tokio::time::sleep(Duration::from_millis(400)).await;
        Err::<(), _>("network unreachable".to_string())
    });

    let (uploaded, posted) = tokio::join!(upload, post);
    uploaded?.map_err(anyhow::Error::msg)?;

    if let Err(e) = posted? {
        alerts.show(Alert::error(format!("Posting reel failed: {}", e)))?;
        tokio::task::yield_now().await;
        if let Some(alert) = alerts.current() {
            println!("{} {}", alert.kind.emoji(), alert.message);
        }

        tokio::time::sleep(Duration::from_secs(1)).await;
        println!("↻ Retrying reel...");
        tracker.retry("reel").await?;
    }

    let wait = config.success_expiry() + Duration::from_secs(5);
    if tokio::time::timeout(wait, printer).await.is_err() {
        tracing::warn!("Demo did not settle in time");
    }
    tracker.shutdown().await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn test_line_reader_ends_with_input() {
        let (_stop_tx, mut stop_rx) = mpsc::unbounded_channel();
        let mut lines = spawn_line_reader(Cursor::new(b"{}\nclick /chat/1\n".to_vec()));

        let first = next_line(&mut lines, &mut stop_rx).await.unwrap();
        assert_eq!(first.as_deref(), Some("{}"));
        let second = next_line(&mut lines, &mut stop_rx).await.unwrap();
        assert_eq!(second.as_deref(), Some("click /chat/1"));
        assert_eq!(next_line(&mut lines, &mut stop_rx).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_stop_returns_while_read_is_blocked() {
        let (reader, _writer) = std::io::pipe().unwrap();
        let mut lines = spawn_line_reader(std::io::BufReader::new(reader));
        let (stop_tx, mut stop_rx) = mpsc::unbounded_channel();

        stop_tx.send(()).unwrap();
        let next = tokio::time::timeout(
            Duration::from_secs(1),
            next_line(&mut lines, &mut stop_rx),
        )
        .await
        .expect("stop should not wait for input");
        assert_eq!(next.unwrap(), None);
    }
}
