//! Build artifacts for one or all collections

use anyhow::Result;

use crate::build::{BuildReport, Builder};
use crate::config::CollectionConfig;
use crate::Site;

/// Build the named collection, or every configured one.
///
/// When building everything, collections whose source directory does not
/// exist are skipped; a named collection must exist.
pub async fn run(site: &Site, only: Option<&str>) -> Result<Vec<BuildReport>> {
    let start = std::time::Instant::now();

    let collections: Vec<&CollectionConfig> = match only {
        Some(name) => vec![site.collection(name)?],
        None => site.config.collections.iter().collect(),
    };

    let builder = Builder::new(&site.config);
    let mut reports = Vec::new();

    for collection in collections {
        let source_dir = site.source_dir(collection);
        if only.is_none() && !source_dir.is_dir() {
            tracing::warn!(
                "Skipping {}: {:?} does not exist",
                collection.name,
                source_dir
            );
            continue;
        }

        let report = builder
            .build(collection, &source_dir, &site.artifact_dir(collection))
            .await?;
        reports.push(report);
    }

    tracing::info!("Build finished in {:.2}s", start.elapsed().as_secs_f64());
    Ok(reports)
}

/// Print a report the way `folio build` shows it
pub fn print_report(report: &BuildReport) {
    println!("{}", report.summary());
    for (slug, err) in &report.failed {
        println!("  ✗ {}: {}", slug, err);
    }
    for slug in &report.pruned {
        println!("  - {} (removed)", slug);
    }
}
