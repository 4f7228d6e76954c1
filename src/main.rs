//! ARK Pulse Drop ledger demo
//!
//! Plays through a scripted day against the on-disk store so the persisted
//! records can be inspected afterwards.

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use pulse_drop::{
    compute_earned_coins,
    ledger::catalog::skin_catalog,
    reward::{coin_packs, credit_capture, InterstitialSchedule, PaymentCapture},
    AdOutcome, CurrencyLedger, FileStore, Leaderboard, LedgerConfig, QuotaLedger, RewardKind,
    RewardMediator, SystemClock, Tier, VERSION,
};

fn main() -> anyhow::Result<()> {
    let config = LedgerConfig::from_env().context("invalid configuration")?;

    // Initialize logging
    let default_level = if cfg!(feature = "debug-tracing") {
        "debug"
    } else {
        config.log_level.as_str()
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    info!("Pulse Drop ledger v{}", VERSION);
    info!("Data directory: {}", config.data_dir.display());

    let store =
        Arc::new(FileStore::open(&config.data_dir).context("failed to open data directory")?);
    demo_day(&config, store);
    Ok(())
}

/// Walk a guest through a day of play.
fn demo_day(config: &LedgerConfig, store: Arc<FileStore>) {
    info!("=== Starting Demo Day ===");

    let tier = Tier::Guest;
    let quota = QuotaLedger::with_table(Arc::clone(&store), SystemClock, config.tiers);
    let mut currency = CurrencyLedger::open(Arc::clone(&store));
    let mut schedule = InterstitialSchedule::open(Arc::clone(&store), config.interstitial_every);
    let mut mediator = RewardMediator::new(config.grant_on_unavailable);
    let mut board = Leaderboard::open(Arc::clone(&store), SystemClock);
    let catalog = skin_catalog();

    if !board.has_name() {
        board.set_player_name("demo");
    }

    info!(
        "Tier {}: {} plays left, {} ad bonuses left, reset in {}",
        tier,
        quota.remaining_plays(tier),
        quota.remaining_ad_bonuses(tier),
        quota.reset_countdown()
    );

    let mut run = 0u32;
    loop {
        if !quota.consume_play(tier) {
            if !mediator.should_offer(RewardKind::BonusPlay, tier, &quota) {
                info!("Out of plays and ad bonuses for today");
                break;
            }
            let outcome = mediator.settle(
                RewardKind::BonusPlay,
                AdOutcome::Viewed,
                tier,
                &quota,
                &mut currency,
            );
            info!("Bonus play ad: {:?}", outcome);
            if !outcome.is_granted() {
                break;
            }
            continue;
        }

        run += 1;
        mediator.reset_session();
        let (score, combo, level) = (400 + u64::from(run) * 150, 5 + run * 2, 1 + run / 2);
        let coins = compute_earned_coins(score, combo, level);
        if !currency.earn(coins) {
            warn!("Run {}: {} coins not credited", run, coins);
        }
        info!("Run {}: score {}, combo {}, level {}, +{} coins", run, score, combo, level, coins);

        if run == 2 {
            let revive =
                mediator.settle(RewardKind::Revive, AdOutcome::Viewed, tier, &quota, &mut currency);
            info!("Revive ad: {:?}", revive);
        }

        let rank = board.player_rank(score);
        board.submit_score(score, level, combo);
        info!("Rank #{}", rank);

        if schedule.on_game_over() {
            info!("Interstitial due after game #{}", schedule.game_count());
        }
    }

    info!("=== Shop ===");
    let packs = coin_packs();
    let capture = PaymentCapture {
        order_id: format!("DEMO-{}", schedule.game_count()),
        pack_id: "pack_s".to_string(),
        payer_email: None,
    };
    match credit_capture(&capture, &packs, &mut currency) {
        Ok(record) => info!("Credited order {}: {} coins", record.order_id, record.coins),
        Err(e) => warn!("Payment credit failed: {}", e),
    }

    for item in &catalog {
        if currency.is_unlocked(&item.id) {
            continue;
        }
        match currency.purchase(&item.id, &catalog) {
            Ok(()) => {
                currency.equip(&item.id);
            }
            Err(e) => {
                info!("Stopped shopping at {}: {}", item.id, e);
                break;
            }
        }
    }

    if let Some(item) = currency.equipped_item(&catalog) {
        info!("Equipped: {} ({})", item.name, item.id);
    }
    info!("Balance: {} coins", currency.balance());

    info!("=== Leaderboard ===");
    for (i, entry) in board.top_scores(5).iter().enumerate() {
        info!(
            "#{}: {} - {} (lv {}, x{})",
            i + 1,
            entry.name,
            entry.score,
            entry.level,
            entry.combo
        );
    }
}
