//! PIX Checkout
//!
//! This example walks through a PIX checkout driven by a session.
//!
//! Key concepts:
//! - Taking the processing lock through `submit` with a stillwater effect
//! - Starting the PIX window from configuration with `begin_pix`
//! - Showing the expiration warning once through the notification gate
//! - Snapshotting the session and restoring it after a "reload"
//! - Letting the window close and observing the expired status
//!
//! Time is scaled down (one tick every 10 ms) so the run finishes quickly.
//!
//! Run with: cargo run --example pix_checkout

use checkout_state::session::payment::PaymentEffect;
use checkout_state::{
    use_can_show_expiration, use_checkout, CheckoutConfigBuilder, CheckoutSession,
    NotificationKind, PaymentAction, PaymentOutcome, SessionSnapshot, Submission,
};
use std::sync::Arc;
use std::time::Duration;
use stillwater::prelude::*;

// Stand-in for a PIX provider client
#[derive(Clone)]
struct PixGateway {
    charge_id: String,
}

fn issue_charge() -> PaymentAction<PixGateway> {
    Arc::new(|| -> PaymentEffect<PixGateway> {
        from_fn(|gateway: &PixGateway| {
            println!("  [Gateway] Issued PIX charge {}", gateway.charge_id);
            Ok(PaymentOutcome::AwaitingConfirmation)
        })
        .boxed()
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== PIX Checkout Example ===\n");

    let config = CheckoutConfigBuilder::new()
        .pix_timer_minutes(1)
        .tick_interval_ms(10)
        .build()?;

    let session = CheckoutSession::new(config.clone())?;

    // Phase 1: start the checkout and issue the charge
    println!("Phase 1: Issuing charge");
    session.begin();
    let gateway = PixGateway {
        charge_id: "pix-0001".to_string(),
    };
    match session.submit(&issue_charge(), &gateway).await {
        Submission::Submitted(status) => println!("  Status after submission: {}", status),
        Submission::AlreadyLocked => println!("  Another submission is in flight"),
    }
    session.begin_pix();
    println!("  PIX window: {}s\n", session.pix_timer_seconds());

    // Phase 2: a view warns the customer once, through the context
    println!("Phase 2: Warning the customer");
    session
        .provide(async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            for attempt in 1..=2 {
                if use_can_show_expiration() {
                    let remaining = use_checkout().pix_timer_seconds();
                    use_checkout().show_notification(
                        NotificationKind::Warning,
                        format!("PIX expires in {}s", remaining),
                    );
                    println!("  Render {}: warning shown ({}s left)", attempt, remaining);
                } else {
                    println!("  Render {}: warning already shown, skipped", attempt);
                }
            }
        })
        .await;
    println!();

    // Phase 3: snapshot, drop and restore
    println!("Phase 3: Reloading the page");
    let json = session.snapshot().to_json()?;
    println!("  Snapshot is {} bytes of JSON", json.len());
    drop(session);

    let snapshot = SessionSnapshot::from_json(&json)?;
    let session = CheckoutSession::restore(snapshot, config)?;
    println!(
        "  Restored: status={}, PIX window {}s\n",
        session.status(),
        session.pix_timer_seconds()
    );

    // Phase 4: wait for the window to close
    println!("Phase 4: Waiting for the PIX window to close");
    let mut views = session.subscribe();
    while !views.borrow_and_update().pix_timer_expired {
        views.changed().await?;
    }
    let view = *views.borrow();
    println!("  Status: {}", view.status);
    println!("  Expired by timer: {}", session.expired_by_timer());
    println!("  Message: {}", session.message().unwrap_or_default());

    println!("\n=== Example Complete ===");
    Ok(())
}
