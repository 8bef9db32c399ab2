use std::path::Path;

use handyhub_core::Catalog;

/// Load the catalog named by `path`, or the built-in one.
pub(crate) fn resolve_catalog(path: Option<&Path>) -> anyhow::Result<Catalog> {
    match path {
        Some(path) => Ok(handyhub_core::load_catalog(path)?),
        None => Ok(Catalog::builtin()),
    }
}

/// Print every category and its services.
///
/// # Errors
///
/// Returns an error if a configured catalog file cannot be loaded.
pub(crate) fn run_catalog(path: Option<&Path>) -> anyhow::Result<()> {
    let catalog = resolve_catalog(path)?;

    println!(
        "base location: {} ({}, {})",
        catalog.base_location.address, catalog.base_location.lat, catalog.base_location.lng
    );
    for category in &catalog.categories {
        println!();
        println!("{} {} [{}]", category.icon, category.name, category.id);
        for service in &category.services {
            println!("  {:<22}{:<24}{}", service.id, service.name, service.description);
        }
    }
    println!();
    println!("{} services in {} categories", catalog.service_count(), catalog.categories.len());
    Ok(())
}
