// crates/core/src/progress.rs
//! Normalizes raw transfer counters onto the 0–100 job scale.
//!
//! The scale is split into an extraction band (0–10) and a transfer band
//! starting at 10. A single item runs the transfer band up to 100; a
//! playlist of `n` items gives each item an `80 / n` slice, so the last
//! item completes at 90 and the final 10 is reserved for finishing.

/// Progress reported while the extractor resolves metadata.
pub const EXTRACTING_PROGRESS: f64 = 5.0;

/// Start of the transfer band.
pub const TRANSFER_START: f64 = 10.0;

/// Width of the transfer band shared between playlist items.
pub const PLAYLIST_SPAN: f64 = 80.0;

/// Progress of a finished job.
pub const COMPLETE: f64 = 100.0;

/// Overall progress of a single-item job given the item's byte percent.
pub fn single_item_progress(percent: f64) -> f64 {
    clamp(TRANSFER_START + clamp(percent) * 0.9)
}

/// Overall progress at the moment item `current_item` (1-based) of
/// `total_items` starts.
pub fn playlist_item_base(current_item: u32, total_items: u32) -> f64 {
    if total_items == 0 {
        return TRANSFER_START;
    }
    let done = current_item.saturating_sub(1).min(total_items);
    TRANSFER_START + f64::from(done) * PLAYLIST_SPAN / f64::from(total_items)
}

/// Overall progress while item `current_item` of `total_items` is
/// `percent` transferred.
pub fn playlist_progress(current_item: u32, total_items: u32, percent: f64) -> f64 {
    if total_items == 0 {
        return TRANSFER_START;
    }
    let base = playlist_item_base(current_item, total_items);
    // Capped so a fully transferred item lands exactly on its completion value.
    clamp(base + clamp(percent) * 0.8 / f64::from(total_items))
        .min(playlist_item_complete(current_item, total_items))
}

/// Overall progress once `completed` of `total_items` items are done.
pub fn playlist_item_complete(completed: u32, total_items: u32) -> f64 {
    if total_items == 0 {
        return TRANSFER_START;
    }
    let completed = completed.min(total_items);
    TRANSFER_START + f64::from(completed) * PLAYLIST_SPAN / f64::from(total_items)
}

/// Status text shown while an item is transferring.
pub fn transfer_message(item_name: &str, percent: f64) -> String {
    format!("Downloading: {item_name} ({:.1}%)", clamp(percent))
}

fn clamp(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, COMPLETE)
    }
}
