// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated commit loop that exercises the transaction tracing pipeline.
//!
//! Runs 120 synthetic vsyncs through a [`TransactionTracer`] with a small
//! buffer budget so older entries spill into the starting-state baseline,
//! then prints the surviving trace and exports a Chrome trace JSON file.

use std::fs::File;
use std::io::BufWriter;
use std::time::Duration;

use kurbo::Point;
use strata_core::change::PendingLayerChange;
use strata_core::entry::VsyncId;
use strata_core::layer::{LayerHandle, LayerId};
use strata_core::transaction::TransactionRecord;
use strata_tracer::{TracerConfig, TransactionTracer};

const VSYNC_COUNT: i64 = 120;
/// Small enough that most of the run is absorbed into the baseline.
const DEMO_BUFFER_CAPACITY: usize = 4 * 1024;

const WALLPAPER: LayerHandle = LayerHandle(0x100);
const STATUS_BAR: LayerHandle = LayerHandle(0x200);
const SPLASH: LayerHandle = LayerHandle(0x300);

fn main() {
    let mut tracer = TransactionTracer::new(TracerConfig {
        buffer_capacity: DEMO_BUFFER_CAPACITY,
        flush_interval: Duration::from_millis(100),
    });
    tracer.enable().expect("failed to start tracer thread");

    // -- layer setup -------------------------------------------------------
    tracer.on_layer_added(WALLPAPER, LayerId(1), "wallpaper", 0, None);
    tracer.on_layer_added(STATUS_BAR, LayerId(2), "status-bar", 4, Some(LayerId(1)));
    tracer.on_layer_added(SPLASH, LayerId(3), "splash", 0, None);

    // -- simulated loop ----------------------------------------------------
    let mut next_tx_id: u64 = 1;

    for vsync in 1..=VSYNC_COUNT {
        let mut tx = TransactionRecord::new(next_tx_id, 1000, 4242);
        next_tx_id += 1;

        // The status bar slides in over the first 60 vsyncs.
        if vsync <= 60 {
            let y = -24.0 + 0.4 * vsync as f64;
            tx = tx.with_change(
                PendingLayerChange::new(STATUS_BAR).with_position(Point::new(0.0, y.min(0.0))),
            );
        }

        // The splash screen fades out and is removed at vsync 30.
        if vsync < 30 {
            let alpha = 1.0 - vsync as f32 / 30.0;
            tx = tx.with_change(PendingLayerChange::new(SPLASH).with_alpha(alpha));
        } else if vsync == 30 {
            tracer.on_layer_removed(LayerId(3));
        }

        // A z reshuffle every 40 vsyncs.
        if vsync % 40 == 0 {
            tx = tx.with_change(
                PendingLayerChange::new(WALLPAPER).with_z(i32::try_from(vsync).unwrap()),
            );
        }

        tracer.add_queued_transaction(tx.clone());
        tracer.add_committed_transactions(vec![tx], VsyncId(vsync));
        tracer.flush(VsyncId(vsync));
    }

    // -- export ------------------------------------------------------------
    let trace = tracer.serialize();
    println!(
        "captured {} entries ({} resident, {} bytes used, {} layers in baseline)",
        trace.entries.len(),
        trace.entries.len() - 1,
        tracer.used_bytes(),
        tracer.baseline_len(),
    );

    strata_debug::pretty::print(&trace, &mut std::io::stdout())
        .expect("failed to print trace");

    let path = "trace.json";
    let file = File::create(path).expect("failed to create trace.json");
    let mut writer = BufWriter::new(file);
    strata_debug::chrome::export(&trace, &mut writer).expect("failed to write Chrome trace");
    println!("Wrote {path} ({VSYNC_COUNT} vsyncs)");
}
