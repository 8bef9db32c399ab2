//! Service catalog offered on the intake page, plus the base location used as
//! the origin for travel estimates.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// `service_type` recorded when the client describes a job outside the catalog.
pub const CUSTOM_TASK: &str = "Custom Task";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceOffering {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCategory {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    pub services: Vec<ServiceOffering>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseLocation {
    pub address: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub categories: Vec<ServiceCategory>,
    pub base_location: BaseLocation,
}

impl Catalog {
    /// Looks up a service by its id across all categories.
    #[must_use]
    pub fn find_service(&self, service_id: &str) -> Option<&ServiceOffering> {
        self.categories
            .iter()
            .flat_map(|c| c.services.iter())
            .find(|s| s.id == service_id)
    }

    #[must_use]
    pub fn service_count(&self) -> usize {
        self.categories.iter().map(|c| c.services.len()).sum()
    }

    /// The catalog shipped with the application.
    #[must_use]
    pub fn builtin() -> Self {
        let categories = BUILTIN
            .iter()
            .map(|(id, name, icon, services)| ServiceCategory {
                id: (*id).to_string(),
                name: (*name).to_string(),
                icon: (*icon).to_string(),
                services: services
                    .iter()
                    .map(|(sid, sname, desc)| ServiceOffering {
                        id: (*sid).to_string(),
                        name: (*sname).to_string(),
                        description: (*desc).to_string(),
                        category: (*id).to_string(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            categories,
            base_location: BaseLocation {
                address: "123 Main St, City, State 12345".to_string(),
                lat: 40.7128,
                lng: -74.0060,
            },
        }
    }
}

type BuiltinCategory = (
    &'static str,
    &'static str,
    &'static str,
    &'static [(&'static str, &'static str, &'static str)],
);

const BUILTIN: &[BuiltinCategory] = &[
    (
        "plumbing",
        "Plumbing",
        "🔧",
        &[
            ("pipe_repair", "Pipe Repair", "Fix leaking or broken pipes"),
            ("drain_cleaning", "Drain Cleaning", "Clear blocked drains"),
            ("faucet_install", "Faucet Installation", "Install or replace faucets"),
        ],
    ),
    (
        "cleaning",
        "Cleaning",
        "🧹",
        &[
            ("deep_clean", "Deep Cleaning", "Thorough house cleaning"),
            ("window_cleaning", "Window Cleaning", "Clean interior and exterior windows"),
            ("carpet_cleaning", "Carpet Cleaning", "Professional carpet cleaning"),
        ],
    ),
    (
        "electrical",
        "Electrical",
        "⚡",
        &[
            ("outlet_repair", "Outlet Repair", "Fix or install electrical outlets"),
            ("lighting_install", "Lighting Installation", "Install new light fixtures"),
            ("circuit_repair", "Circuit Repair", "Fix electrical circuit issues"),
        ],
    ),
    (
        "pool",
        "Pool Maintenance",
        "🏊",
        &[
            ("pool_cleaning", "Pool Cleaning", "Regular pool cleaning service"),
            ("chemical_balance", "Chemical Balance", "Balance pool chemicals"),
            ("equipment_repair", "Equipment Repair", "Fix pool pumps and filters"),
        ],
    ),
    (
        "house_sitting",
        "House Sitting",
        "🏠",
        &[
            ("vacation_sitting", "Vacation Sitting", "Watch house while you are away"),
            ("pet_care", "Pet Care", "Feed and care for pets"),
            ("plant_care", "Plant Care", "Water and maintain plants"),
        ],
    ),
    (
        "errands",
        "Errands",
        "🛒",
        &[
            ("grocery_shopping", "Grocery Shopping", "Shop for groceries"),
            ("prescription_pickup", "Prescription Pickup", "Pick up medications"),
            ("package_delivery", "Package Delivery", "Deliver packages locally"),
        ],
    ),
    (
        "delivery",
        "Delivery",
        "📦",
        &[
            ("local_delivery", "Local Delivery", "Same day local delivery"),
            ("furniture_delivery", "Furniture Delivery", "Deliver furniture items"),
            ("document_delivery", "Document Delivery", "Urgent document delivery"),
        ],
    ),
];

/// Load and validate a catalog from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_catalog(path: &Path) -> Result<Catalog, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CatalogIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let catalog: Catalog = serde_yaml::from_str(&content)?;
    validate_catalog(&catalog)?;
    Ok(catalog)
}

fn validate_catalog(catalog: &Catalog) -> Result<(), ConfigError> {
    let mut seen_categories = HashSet::new();
    let mut seen_services = HashSet::new();

    for category in &catalog.categories {
        if category.id.trim().is_empty() || category.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "category id and name must be non-empty".to_string(),
            ));
        }
        if !seen_categories.insert(category.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate category id: '{}'",
                category.id
            )));
        }

        for service in &category.services {
            if service.name.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "service '{}' in category '{}' has an empty name",
                    service.id, category.id
                )));
            }
            if service.name == CUSTOM_TASK {
                return Err(ConfigError::Validation(format!(
                    "'{CUSTOM_TASK}' is reserved and cannot be a catalog service"
                )));
            }
            if !seen_services.insert(service.id.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate service id: '{}'",
                    service.id
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn builtin_catalog_is_valid() {
        let catalog = Catalog::builtin();
        validate_catalog(&catalog).expect("builtin catalog validates");
        assert_eq!(catalog.categories.len(), 7);
        assert_eq!(catalog.service_count(), 21);
    }

    #[test]
    fn find_service_returns_offering_with_category() {
        let catalog = Catalog::builtin();
        let svc = catalog.find_service("drain_cleaning").expect("present");
        assert_eq!(svc.name, "Drain Cleaning");
        assert_eq!(svc.category, "plumbing");
        assert!(catalog.find_service("rocket_repair").is_none());
    }

    #[test]
    fn load_catalog_reads_yaml() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(
            file,
            r"
categories:
  - id: yard
    name: Yard Work
    services:
      - id: mowing
        name: Lawn Mowing
        description: Mow and edge the lawn
        category: yard
baseLocation:
  address: 9 Elm St
  lat: 41.0
  lng: -73.5
"
        )
        .expect("write yaml");

        let catalog = load_catalog(file.path()).expect("valid catalog");
        assert_eq!(catalog.categories[0].icon, "");
        assert_eq!(catalog.find_service("mowing").map(|s| s.name.as_str()), Some("Lawn Mowing"));
        assert_eq!(catalog.base_location.address, "9 Elm St");
    }

    #[test]
    fn load_catalog_rejects_duplicate_service_ids() {
        let mut catalog = Catalog::builtin();
        let dup = catalog.categories[0].services[0].clone();
        catalog.categories[1].services.push(dup);
        let err = validate_catalog(&catalog).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref m) if m.contains("duplicate service id")));
    }

    #[test]
    fn example_catalog_file_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/catalog.example.yaml");
        let catalog = load_catalog(&path).expect("example catalog loads");
        assert_eq!(catalog.service_count(), 4);
        assert_eq!(catalog.base_location, Catalog::builtin().base_location);
    }

    #[test]
    fn load_catalog_reports_missing_file() {
        let err = load_catalog(Path::new("/nonexistent/catalog.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::CatalogIo { .. }));
    }
}
