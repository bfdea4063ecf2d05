use std::path::Path;
use std::sync::Arc;

use anyhow::{Result, bail};
use colored::Colorize;
use phyto_application::{Dashboard, DiagnosisGateway};

use super::utils::{analyze_with_progress, load_image};
use crate::render;

pub async fn run(gateway: Arc<dyn DiagnosisGateway>, path: &Path) -> Result<()> {
    let dashboard = Dashboard::new(gateway);
    dashboard.select_image(load_image(path).await?)?;

    match analyze_with_progress(&dashboard).await {
        Ok(entry) => {
            println!("{}", render::entry_summary(&entry));
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", e.alert_text().red());
            bail!("classification failed")
        }
    }
}
