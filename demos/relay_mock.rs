//! Relay demo against the in-memory host.
//!
//! Runs an 8-channel producer on its own thread and a consumer tick on
//! another, relays one stereo pair across, switches pairs halfway through,
//! and prints the relay statistics.
//!
//! Run with: RUST_LOG=debug cargo run --example relay_mock

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use channel_relay::{FilterSettings, MockHost, OutputFrame, RelayEvent, RelayFilter};
use tracing_subscriber::EnvFilter;

/// 10ms at 48kHz.
const FRAMES_PER_TICK: usize = 480;
const TICK: Duration = Duration::from_millis(10);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let host = Arc::new(MockHost::new());
    let bus = host.add_producer("Mixer Bus", 8, 48000);

    let filter = RelayFilter::builder(host.clone())
        .settings(FilterSettings::relay("Mixer Bus", 1))
        .on_event(|event| match event {
            RelayEvent::BufferUnderrun { .. } | RelayEvent::BufferOverflow { .. } => {
                tracing::trace!(?event, "relay event");
            }
            other => println!("event: {other:?}"),
        })
        .build()?;

    let running = AtomicBool::new(true);

    thread::scope(|s| {
        // Producer thread
        s.spawn(|| {
            while running.load(Ordering::Relaxed) {
                bus.emit_tagged(FRAMES_PER_TICK);
                thread::sleep(TICK);
            }
        });

        // Consumer tick
        for tick in 0..200 {
            if tick == 100 {
                println!("switching to channel pair 3");
                if let Err(e) = filter.update(&FilterSettings::relay("Mixer Bus", 3)) {
                    eprintln!("update failed: {e}");
                }
            }

            let mut output = OutputFrame::new(0, 2, FRAMES_PER_TICK);
            filter.filter_audio(&mut output);

            if tick % 50 == 0 {
                let left = output.plane_f32(0).unwrap_or_default();
                println!("tick {tick}: left[0] = {:?}", left.first());
            }
            thread::sleep(TICK);
        }

        running.store(false, Ordering::Relaxed);
    });

    println!("Stats: {:#?}", filter.stats());
    drop(filter);
    println!("Subscribers left on producer: {}", bus.subscriber_count());

    Ok(())
}
