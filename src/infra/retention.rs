//! Bounded retention of generated PDFs.

use std::{
    fs,
    path::{Path, PathBuf},
    time::SystemTime,
};

use metrics::counter;
use tracing::{debug, warn};

use crate::domain::output::OUTPUT_EXTENSION;

struct Candidate {
    path: PathBuf,
    modified: SystemTime,
}

/// Keep the `keep_count` most recently modified PDFs in `directory` and delete the rest.
///
/// Best-effort: listing and deletion failures are logged and skipped, never returned.
/// Running it again without new files deletes nothing.
pub fn enforce_limit(directory: &Path, keep_count: usize) {
    let mut candidates = match list_pdfs(directory) {
        Ok(candidates) => candidates,
        Err(err) => {
            warn!(
                target = "infra::retention",
                op = "retention::enforce_limit",
                result = "list_error",
                directory = %directory.display(),
                error = %err,
                "Failed to list output directory; skipping eviction"
            );
            return;
        }
    };

    if candidates.len() <= keep_count {
        return;
    }

    // Newest first; ties keep listing order.
    candidates.sort_by(|a, b| b.modified.cmp(&a.modified));

    let mut evicted = 0u64;
    let mut failed = 0u64;
    for candidate in candidates.iter().skip(keep_count) {
        match fs::remove_file(&candidate.path) {
            Ok(()) => {
                evicted += 1;
                debug!(
                    target = "infra::retention",
                    op = "retention::enforce_limit",
                    path = %candidate.path.display(),
                    "Evicted PDF"
                );
            }
            Err(err) => {
                failed += 1;
                debug!(
                    target = "infra::retention",
                    op = "retention::enforce_limit",
                    result = "remove_error",
                    path = %candidate.path.display(),
                    error = %err,
                    "Failed to evict PDF; continuing"
                );
            }
        }
    }

    counter!("stampa_retention_evicted_total").increment(evicted);
    if failed > 0 {
        counter!("stampa_retention_evict_failed_total").increment(failed);
    }

    debug!(
        target = "infra::retention",
        op = "retention::enforce_limit",
        directory = %directory.display(),
        keep_count = keep_count,
        evicted = evicted,
        failed = failed,
        "Retention pass finished"
    );
}

fn list_pdfs(directory: &Path) -> std::io::Result<Vec<Candidate>> {
    let mut candidates = Vec::new();
    for entry in fs::read_dir(directory)? {
        let Ok(entry) = entry else { continue };
        let path = entry.path();
        if !has_pdf_extension(&path) {
            continue;
        }
        // Entries can vanish between listing and stat.
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }
        let Ok(modified) = metadata.modified() else {
            continue;
        };
        candidates.push(Candidate { path, modified });
    }
    Ok(candidates)
}

fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|value| value.to_str())
        .is_some_and(|value| value.eq_ignore_ascii_case(OUTPUT_EXTENSION))
}
