use anyhow::Result;
use roster_ingest::{
    config::Settings,
    fetch::{save_payload, DownloadManifest, Downloader},
    logging,
};
use tracing::{error, info, warn};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    logging::init();
    info!("startup");

    let settings = Settings::from_env()?;
    info!(url = %settings.source_url, dest = %settings.download_path.display(), "fetching roster");

    let downloader = Downloader::new(settings.source_url.clone(), settings.retry)?;
    let outcome = match downloader.download().await {
        Ok(o) => o,
        Err(e) => {
            error!(error = %e, "download failed");
            return Err(e.into());
        }
    };

    save_payload(&settings.download_path, &outcome.bytes).await?;
    info!(
        path = %settings.download_path.display(),
        size = outcome.bytes.len(),
        attempts = outcome.attempts,
        "file saved"
    );

    let manifest =
        DownloadManifest::from_outcome(downloader.url().as_str(), &settings.download_path, &outcome);
    match manifest.write(&settings.download_path) {
        Ok(path) => info!(path = %path.display(), "manifest written"),
        // the payload is already on disk, which is what matters downstream
        Err(e) => warn!(error = %e, "could not write download manifest"),
    }

    Ok(())
}
