use std::path::PathBuf;
use std::process::ExitCode;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use isoshelf_api::export::{write_export, DEFAULT_EXPORT_FILE};

/// Scan the image directory once and write the catalog as JSON.
///
/// | Env Var       | Default                |
/// |---------------|------------------------|
/// | `ISO_DIR`     | `/isofiles`            |
/// | `EXPORT_PATH` | `$ISO_DIR/data.json`   |
fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "isoshelf_api=info,isoshelf_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let iso_dir = std::env::var("ISO_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/isofiles"));
    let output = std::env::var("EXPORT_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| iso_dir.join(DEFAULT_EXPORT_FILE));

    match write_export(&iso_dir, &output) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, iso_dir = %iso_dir.display(), "Catalog export failed");
            ExitCode::FAILURE
        }
    }
}
