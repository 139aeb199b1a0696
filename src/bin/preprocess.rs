use anyhow::Result;
use roster_ingest::{
    config::Settings,
    fetch::DownloadManifest,
    logging,
    process::{preprocess_file, write_canonical_csv},
};
use tracing::{error, info, warn};

const PREVIEW_ROWS: usize = 5;

fn main() -> Result<()> {
    logging::init();
    info!("startup");

    let settings = Settings::from_env()?;

    match DownloadManifest::load(&settings.download_path) {
        Ok(Some(m)) => info!(
            url = %m.url,
            size = m.size_bytes,
            downloaded_at = %m.download_end,
            "preprocessing downloaded file"
        ),
        Ok(None) => info!(path = %settings.download_path.display(), "no download manifest"),
        Err(e) => warn!(error = %e, "ignoring unreadable download manifest"),
    }

    let table = match preprocess_file(&settings.download_path) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "preprocessing failed");
            return Err(e.into());
        }
    };

    info!(rows = table.len(), "extracted data preview:");
    for rec in table.records().iter().take(PREVIEW_ROWS) {
        info!("  {}", rec);
    }

    if let Err(e) = write_canonical_csv(&table, &settings.output_path) {
        error!(error = %e, "writing output failed");
        return Err(e.into());
    }
    info!(path = %settings.output_path.display(), "preprocessing complete");
    Ok(())
}
