use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use renown::config::OnboardingConfig;
use renown::gateway::{CliGateway, Gateway};
use renown::onboarding::OnboardingManager;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing; the guard must outlive the runtime to flush the file log
    let _log_guard = init_tracing();

    let config = OnboardingConfig::from_env().context("invalid RENOWN_* configuration")?;

    eprintln!("🧊 Renown v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Community: {}", config.community_name);
    eprintln!("   Reply timeout: {}s", config.reply_timeout.as_secs());
    eprintln!(
        "   Channels: log=#{} redirect=#{}",
        config.log_channel, config.redirect_channel
    );

    // ── Gateway ─────────────────────────────────────────────────────────
    let gateway: Arc<dyn Gateway> = Arc::new(CliGateway::new(
        vec![config.log_channel.clone(), config.redirect_channel.clone()],
        config.moderators.clone(),
    ));
    eprintln!(
        "   Gateway: {} (moderators: {})",
        gateway.name(),
        if config.moderators.is_empty() {
            "none".to_string()
        } else {
            config.moderators.join(", ")
        }
    );
    eprintln!("   Title store: {}", config.titles_path.display());
    eprintln!("   Type `join <name>`, then `<name>: <reply>`. Ctrl-D to exit.\n");

    // ── Onboarding ──────────────────────────────────────────────────────
    let (manager, events) = OnboardingManager::launch(config, Arc::clone(&gateway))
        .await
        .context("failed to start onboarding")?;
    manager.run(events).await;

    manager.shutdown();
    gateway.shutdown().await?;
    Ok(())
}

/// Console logging filtered by `RUST_LOG`, plus a daily-rolling file when
/// `RENOWN_LOG_DIR` is set.
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console = fmt::layer().with_target(false).with_writer(std::io::stderr);

    match std::env::var("RENOWN_LOG_DIR") {
        Ok(dir) if !dir.trim().is_empty() => {
            let appender = tracing_appender::rolling::daily(dir.trim(), "renown.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(console)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(console)
                .init();
            None
        }
    }
}
