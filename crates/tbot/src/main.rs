use anyhow::{bail, Context};

use tbot_core::config::Config;

/// Smoke test: `tbot <TOKEN>` bootstraps against the live API and reports
/// where polling would start. Without an argument the token comes from
/// `TELEGRAM_BOT_TOKEN` (and `.env`).
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tbot_core::logging::init("tbot")?;

    let mut args = std::env::args().skip(1);
    let cfg = match (args.next(), args.next()) {
        (Some(token), None) => Config::new(token),
        (None, _) => Config::load()?,
        (Some(_), Some(_)) => bail!("usage: tbot <TOKEN>"),
    };

    let bot = tbot_http::connect(cfg).context("cannot create bot")?;
    let offset = bot.bootstrap().await.context("bootstrap failed")?;

    println!("bootstrapped: cursor={offset} pending={}", bot.pending()?);

    bot.shutdown().await;
    Ok(())
}
