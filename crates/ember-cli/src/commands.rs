//! CLI command implementations.

use crate::AppContext;
use ember_types::units::format_amount;
use ember_wallet::{Direction, SecretPhrase, TransactionRecord, Unlocked};

type Result = std::result::Result<(), Box<dyn std::error::Error>>;

// ─── Helpers ────────────────────────────────────────────────────────────────

fn prompt_pin(prompt: &str) -> std::result::Result<String, Box<dyn std::error::Error>> {
    let pin = rpassword::prompt_password(prompt)?;
    if pin.is_empty() {
        return Err("PIN cannot be empty".into());
    }
    Ok(pin)
}

fn prompt_new_pin() -> std::result::Result<String, Box<dyn std::error::Error>> {
    let pin = prompt_pin("Choose a 4-digit PIN: ")?;
    let confirm = prompt_pin("Confirm PIN: ")?;
    if pin != confirm {
        return Err("PINs do not match".into());
    }
    Ok(pin)
}

fn ensure_no_wallet(ctx: &AppContext, force: bool) -> Result {
    if !force && ctx.session().has_account()? {
        return Err(format!(
            "a wallet already exists in {} (use --force to replace it)",
            ctx.data_dir().display()
        )
        .into());
    }
    Ok(())
}

async fn unlock(ctx: &AppContext) -> std::result::Result<Unlocked, Box<dyn std::error::Error>> {
    let session = ctx.session();
    if !session.has_account()? {
        return Err("no wallet found; run 'create' or 'restore' first".into());
    }
    let pin = prompt_pin("PIN: ")?;
    Ok(session.unlock(&pin).await?)
}

fn symbol(ctx: &AppContext) -> String {
    ctx.session().active_network().native_symbol
}

fn print_summary(ctx: &AppContext, unlocked: &Unlocked) {
    let network = ctx.session().active_network();
    println!("Address:  {}", unlocked.address);
    println!("Network:  {} (chain {})", network.display_name, network.chain_id);
    println!("Balance:  {} {}", format_amount(unlocked.balance, 6), network.native_symbol);
    if !unlocked.can_sign {
        println!("Mode:     watch-only");
    }
}

fn short(hash: &str) -> String {
    match hash.char_indices().nth(18) {
        Some((end, _)) => format!("{}...", &hash[..end]),
        None => hash.to_string(),
    }
}

fn print_record(tx: &TransactionRecord, symbol: &str) {
    let sign = match tx.direction {
        Direction::Sent => "-",
        Direction::Received => "+",
    };
    let unit = match &tx.asset {
        Some(token) => format!("@{}", short(token)),
        None => symbol.to_string(),
    };
    println!(
        "{:<10} {:<9} {:>20} {:<24} {}",
        tx.network.as_deref().unwrap_or("-"),
        format!("{:?}", tx.direction).to_lowercase(),
        format!("{}{}", sign, format_amount(tx.amount, 6)),
        unit,
        short(&tx.hash),
    );
}

// ─── Commands ───────────────────────────────────────────────────────────────

pub async fn create_wallet(ctx: &AppContext, force: bool) -> Result {
    ensure_no_wallet(ctx, force)?;
    let session = ctx.session();

    let (phrase, address) = session.generate_mnemonic()?;
    println!("IMPORTANT: Write down your seed phrase and keep it safe!");
    println!("If you lose it, you will lose access to your funds.");
    println!();
    println!("Seed phrase (12 words):");
    println!("  {}", phrase.expose());
    println!();
    println!("Address: {}", address);
    println!();

    let pin = prompt_new_pin()?;
    let unlocked = session.create_wallet(Some(phrase), &pin).await?;
    println!("Wallet created in {}", ctx.data_dir().display());
    print_summary(ctx, &unlocked);
    Ok(())
}

pub async fn restore_wallet(ctx: &AppContext, force: bool) -> Result {
    ensure_no_wallet(ctx, force)?;
    let phrase = SecretPhrase::new(rpassword::prompt_password("Seed phrase: ")?);
    let pin = prompt_new_pin()?;
    let unlocked = ctx.session().recover_wallet(phrase.expose(), &pin).await?;
    println!("Wallet restored.");
    print_summary(ctx, &unlocked);
    Ok(())
}

pub async fn wallet_info(ctx: &AppContext) -> Result {
    let unlocked = unlock(ctx).await?;
    print_summary(ctx, &unlocked);
    let session = ctx.session();
    println!(
        "History:  {} on this network, {} total",
        session.visible_history().len(),
        session.history().len()
    );
    Ok(())
}

pub async fn show_balance(ctx: &AppContext) -> Result {
    let unlocked = unlock(ctx).await?;
    println!("{} {}", unlocked.balance, symbol(ctx));
    Ok(())
}

pub async fn send(ctx: &AppContext, to: &str, amount: &str) -> Result {
    unlock(ctx).await?;
    let network = ctx.session().active_network();
    println!("Sending {} {} to {} on {}...", amount, network.native_symbol, to, network.display_name);

    let record = ctx.session().submit(to, amount).await?;
    println!("Transaction broadcast: {}", record.hash);
    println!("Run 'check {}' to follow it.", record.hash);
    Ok(())
}

pub async fn show_history(ctx: &AppContext, limit: usize, all: bool) -> Result {
    unlock(ctx).await?;
    let session = ctx.session();
    let records = if all {
        session.history()
    } else {
        session.visible_history()
    };

    if records.is_empty() {
        println!("No transactions found. Run 'sync' to scan recent blocks.");
        return Ok(());
    }

    println!("Showing {}/{} transactions:", records.len().min(limit), records.len());
    println!();
    println!(
        "{:<10} {:<9} {:>20} {:<24} TX Hash",
        "Network", "Direction", "Amount", "Asset"
    );
    println!("{}", "-".repeat(90));
    let symbol = symbol(ctx);
    for tx in records.iter().take(limit) {
        print_record(tx, &symbol);
    }
    Ok(())
}

pub async fn sync_history(ctx: &AppContext) -> Result {
    unlock(ctx).await?;
    let session = ctx.session();
    println!(
        "Scanning the last {} blocks on {}...",
        session.config().reconcile_window,
        session.active_network().display_name
    );
    let report = session.sync_history().await?;
    println!(
        "Scanned blocks {}..={}: {} new transaction(s).",
        report.from_block, report.to_block, report.added
    );
    Ok(())
}

pub fn list_networks(ctx: &AppContext) -> Result {
    let session = ctx.session();
    let active = session.active_network().key;
    for network in session.networks() {
        let marker = if network.key == active { "*" } else { " " };
        println!(
            "{} {:<10} {:<24} chain {:<10} {}",
            marker, network.key, network.display_name, network.chain_id, network.rpc_endpoint
        );
    }
    Ok(())
}

pub async fn switch_network(ctx: &AppContext, key: &str) -> Result {
    ctx.session().switch_network(key).await?;
    let network = ctx.session().active_network();
    println!("Active network: {} (chain {})", network.display_name, network.chain_id);
    Ok(())
}

pub async fn check_transaction(ctx: &AppContext, hash: &str) -> Result {
    match ctx.session().check_transaction(hash).await? {
        Some(tx) => {
            match tx.block_number {
                Some(block) => println!("Included in block {}", block),
                None => println!("Pending"),
            }
            println!("From:   {}", tx.from);
            println!("To:     {}", tx.to.as_deref().unwrap_or("(contract creation)"));
            println!("Nonce:  {}", tx.nonce);
        }
        None => println!("Not found on {}", ctx.session().active_network().display_name),
    }
    Ok(())
}
