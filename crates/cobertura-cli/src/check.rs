use std::fmt::Write as _;
use std::path::Path;

use anyhow::Context;
use cobertura_core::{load_zones_catalog, AppConfig, InMemoryZoneRepository, ZoneMutationGuard};

/// Load `path` through the zone guard and print one line per branch.
///
/// # Errors
///
/// Returns the first catalog error, naming the branch and zone at fault.
pub(crate) fn run_check(config: &AppConfig, path: &Path) -> anyhow::Result<()> {
    let guard = ZoneMutationGuard::new(config.guard_limits());
    let catalog = load_zones_catalog(path, &guard)
        .with_context(|| format!("checking {}", path.display()))?;
    print!("{}", summarize(&catalog)?);
    Ok(())
}

fn summarize(catalog: &InMemoryZoneRepository) -> anyhow::Result<String> {
    let mut out = String::new();
    let mut total = 0usize;
    for branch in catalog.branches()? {
        let zones = catalog.snapshot(Some(branch.id))?;
        let active = zones.iter().filter(|z| z.active).count();
        let ranges: usize = zones.iter().map(|z| z.street_ranges.len()).sum();
        total += zones.len();
        writeln!(
            out,
            "branch {} {}: {} zone(s), {} active, {} street range(s)",
            branch.id,
            branch.name,
            zones.len(),
            active,
            ranges
        )?;
    }
    writeln!(out, "ok: {total} zone(s)")?;
    Ok(out)
}
