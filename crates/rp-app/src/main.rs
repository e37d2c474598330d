//! ReelPick - slot-style random picker
//!
//! Usage:
//!   reelpick --title "Lunch Picker" --slot "Tacos,Pizza" --slot "Soda,Tea" --draw
//!   reelpick --draw             - draw again from the stored session
//!   reelpick --clear            - forget the stored session

mod cli;
mod setup;

use anyhow::{Context, Result};
use clap::Parser;
use rp_core::{DEFAULT_ITEMS_PER_SLOT, MAX_ITEMS_PER_SLOT, SLOT_COUNT_PRESETS};
use rp_slot_lab::{DrawEvent, DrawStatus, SlotMachine};
use rp_state::{Phase, SaveOutcome, Session, SessionStore, input_progress};
use tokio::sync::broadcast;

use crate::cli::Cli;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let snapshots = cli.snapshot_store();
    if cli.clear {
        let removed = snapshots
            .clear()
            .with_context(|| format!("Failed to clear {}", snapshots.path().display()))?;
        if removed {
            println!("Cleared {}", snapshots.path().display());
        } else {
            println!("Nothing stored at {}", snapshots.path().display());
        }
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("Failed to start runtime")?;

    let store = SessionStore::restore(snapshots);
    let machine = SlotMachine::from_config(store, cli.machine_config());
    runtime.block_on(run(&cli, &machine))
}

async fn run(cli: &Cli, machine: &SlotMachine) -> Result<()> {
    log::info!("Starting ReelPick ({} timing)", cli.timing);

    if let Some(title) = &cli.title {
        setup::configure(machine, title, &cli.slots)?;
    }

    if cli.draw {
        if machine.phase().can_start_draw() {
            draw(machine).await?;
        } else {
            println!("Session is not ready to draw ({})", machine.phase());
        }
    }

    let session = machine.session();
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&session)?);
    } else {
        print_session(&session);
    }

    match machine.save() {
        Some(SaveOutcome::SavedWithoutImages { .. }) => {
            println!("Session saved without images (too large)");
        }
        Some(SaveOutcome::Skipped { reason }) => println!("Session not saved: {}", reason),
        _ => {}
    }
    Ok(())
}

async fn draw(machine: &SlotMachine) -> Result<()> {
    let mut events = machine.subscribe();
    let handle = machine.start_draw()?;
    println!("Spinning...");

    let printer = tokio::spawn(async move { print_reel_stops(&mut events).await });
    let status = handle.wait().await;
    // Last event is already queued; the printer exits on it
    let _ = printer.await;

    if status == DrawStatus::Cancelled {
        println!("Draw cancelled");
    }
    Ok(())
}

async fn print_reel_stops(events: &mut broadcast::Receiver<DrawEvent>) {
    loop {
        match events.recv().await {
            Ok(DrawEvent::ReelStopped { outcome, .. }) => {
                println!("  Reel {} → {}", outcome.slot_index + 1, outcome.item.label());
            }
            Ok(event) if event.is_terminal() => break,
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                log::warn!("Missed {} draw events", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn print_session(session: &Session) {
    if session.is_initial() {
        println!("No session yet. Start one with --title and --slot.");
        return;
    }

    println!("{} [{}]", session.title(), session.phase());
    for slot in session.slots() {
        let labels: Vec<&str> = slot.items.iter().map(|item| item.label()).collect();
        println!("  Slot {}: {}", slot.id + 1, labels.join(", "));
    }

    match session.phase() {
        Phase::CountSetup => {
            let presets: Vec<String> = SLOT_COUNT_PRESETS.iter().map(|n| n.to_string()).collect();
            println!("Next: pick a slot count (common: {})", presets.join(", "));
        }
        Phase::ItemCountSetup => {
            println!(
                "Next: items per slot (1-{}, usually {})",
                MAX_ITEMS_PER_SLOT, DEFAULT_ITEMS_PER_SLOT
            );
        }
        Phase::Inputting => {
            let (position, total) = input_progress(session);
            println!("Entering items: {}/{}", position, total);
        }
        Phase::Result => {
            let picks: Vec<&str> = session.result().iter().map(|item| item.label()).collect();
            println!("Result: {}", picks.join(" | "));
        }
        _ => {}
    }
}
