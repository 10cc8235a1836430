use crate::build::ProjectConfig;
use crate::discovery::{DependencyDiscovery, DepsReport};
use crate::exec::Session;
use crate::package::detect_backend;
use crate::result::Result;
use crate::target::Registry;
use std::io::IsTerminal;

async fn discovery<'r>(config: &ProjectConfig, registry: &'r Registry) -> DependencyDiscovery<'r> {
    let backend = detect_backend(&config.discovery.os_release).await;
    if let Some(backend) = &backend {
        log::info!("Using the {} package backend", backend.name());
    }

    DependencyDiscovery::new(registry, backend, config.discovery_settings())
        .with_progress(std::io::stderr().is_terminal())
}

/// Unknown targets are reported on stderr; discovery still exits cleanly.
fn check_target(registry: &Registry, target: &str) -> bool {
    if registry.contains(target) {
        return true;
    }
    eprintln!("No target named '{}'", target);
    false
}

pub async fn execute_build(
    config: &ProjectConfig,
    registry: &Registry,
    session: &mut Session,
    target: &str,
) -> Result<()> {
    if !check_target(registry, target) {
        return Ok(());
    }
    let discovery = discovery(config, registry).await;

    if let Some(report) = discovery.build_deps(target, session).await {
        print_reports(std::slice::from_ref(&report));
    }
    Ok(())
}

pub async fn execute_run(
    config: &ProjectConfig,
    registry: &Registry,
    session: &mut Session,
    target: &str,
) -> Result<()> {
    if !check_target(registry, target) {
        return Ok(());
    }
    let discovery = discovery(config, registry).await;

    let reports = discovery.run_deps(target, session).await;
    if reports.is_empty() && discovery.has_backend() {
        log::info!("Target '{}' produced no executables to inspect", target);
    }
    print_reports(&reports);
    Ok(())
}

fn print_reports(reports: &[DepsReport]) {
    for (i, report) in reports.iter().enumerate() {
        if i > 0 {
            println!();
        }
        print!("{}", report.render());
    }

    let unresolved = unresolved_count(reports);
    if unresolved > 0 {
        eprintln!(
            "note: dependencies of {} package(s) could not be queried; they were kept as-is",
            unresolved
        );
    }
}

fn unresolved_count(reports: &[DepsReport]) -> usize {
    let mut names: Vec<&str> = reports
        .iter()
        .flat_map(|r| r.unresolved.iter().map(|p| p.as_str()))
        .collect();
    names.sort_unstable();
    names.dedup();
    names.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::{DepsKind, Reduction};
    use crate::package::PackageId;

    #[test]
    fn unresolved_packages_are_counted_once() {
        let reduction = Reduction {
            unresolved: vec![PackageId::from("libfoo")],
            ..Reduction::default()
        };
        let report = DepsReport::new(DepsKind::Runtime, "bin/app", Default::default(), reduction);
        assert_eq!(unresolved_count(&[report.clone(), report]), 1);
        assert_eq!(unresolved_count(&[]), 0);
    }
}
