use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use phyto_application::{Dashboard, FlowError};
use phyto_core::classification::ImagePayload;
use phyto_core::history::HistoryEntry;
use std::io::Write;

/// Reads an image file, guessing its MIME type from the extension.
pub async fn load_image(path: &Path) -> Result<ImagePayload> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mime = mime_guess::from_path(path)
        .first()
        .map(|m| m.essence_str().to_string());
    let mut image = ImagePayload::new(bytes, mime);
    if let Some(name) = path.file_name() {
        image = image.with_file_name(name.to_string_lossy());
    }
    Ok(image)
}

/// Runs the analysis, drawing the progress bar until it finishes.
pub async fn analyze_with_progress(dashboard: &Dashboard) -> Result<HistoryEntry, FlowError> {
    let mut progress = dashboard.subscribe_progress();
    let painter = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let value = *progress.borrow_and_update();
            draw_progress(value);
            if value == 100 {
                break;
            }
        }
    });

    let outcome = dashboard.analyze().await;
    painter.abort();
    println!();
    outcome
}

fn draw_progress(percent: u8) {
    const WIDTH: usize = 30;
    let filled = usize::from(percent) * WIDTH / 100;
    let bar = format!("{}{}", "#".repeat(filled), "-".repeat(WIDTH - filled));
    print!("\r{} [{}] {:>3}%", "Analyzing".bright_black(), bar.green(), percent);
    let _ = std::io::stdout().flush();
}
