use geobridge_core::models::{ProjectSystem, SystemId};
use serde::Serialize;

/// A system a receiving project must define, by name and display color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExpectedSystem {
    pub name: &'static str,
    pub color: &'static str,
}

/// Systems every receiving project must be set up with
pub const EXPECTED_SYSTEMS: &[ExpectedSystem] = &[
    ExpectedSystem { name: "ENE", color: "#AB507E" },
    ExpectedSystem { name: "AG", color: "#D9CD91" },
    ExpectedSystem { name: "FOR", color: "#80BD75" },
    ExpectedSystem { name: "OCN", color: "#8CCDD1" },
    ExpectedSystem { name: "STL", color: "#E6564E" },
    ExpectedSystem { name: "IND", color: "#916DA3" },
    ExpectedSystem { name: "TRAN", color: "#706666" },
    ExpectedSystem { name: "WAT", color: "#6B9CB0" },
];

/// Source categories that can be migrated, and the system code they land in
const CATEGORY_CODES: &[(&str, &str)] = &[("Agricultural & Forestry", "AG"), ("Energy", "ENE")];

impl ExpectedSystem {
    fn is_defined_by(&self, system: &ProjectSystem) -> bool {
        system.sysname == self.name && system.syscolor.trim().eq_ignore_ascii_case(self.color)
    }
}

/// Maps source categories to the system ids of one verified project
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryLookupTable {
    systems: Vec<ProjectSystem>,
}

impl CategoryLookupTable {
    /// Expected systems `systems` does not define
    pub fn missing_systems(systems: &[ProjectSystem]) -> Vec<ExpectedSystem> {
        EXPECTED_SYSTEMS
            .iter()
            .filter(|expected| !systems.iter().any(|s| expected.is_defined_by(s)))
            .copied()
            .collect()
    }

    /// Build the table from a project's systems
    ///
    /// Fails with the missing systems unless every expected system is present.
    pub fn from_verified(
        systems: Vec<ProjectSystem>,
    ) -> std::result::Result<Self, Vec<ExpectedSystem>> {
        let missing = Self::missing_systems(&systems);
        if missing.is_empty() {
            Ok(Self { systems })
        } else {
            Err(missing)
        }
    }

    /// System code a source category maps to, if it can be migrated at all
    pub fn system_code(category: &str) -> Option<&'static str> {
        CATEGORY_CODES.iter().find(|(name, _)| *name == category).map(|(_, code)| *code)
    }

    /// System id for a source category; [`SystemId::UNMAPPED`] when it has none
    ///
    /// The code must name exactly one system of the project.
    pub fn resolve_category(&self, category: &str) -> SystemId {
        let Some(code) = Self::system_code(category) else {
            return SystemId::UNMAPPED;
        };

        let mut matches = self.systems.iter().filter(|s| s.sysname == code);
        match (matches.next(), matches.next()) {
            (Some(system), None) => system.id,
            _ => SystemId::UNMAPPED,
        }
    }

    pub fn systems(&self) -> &[ProjectSystem] {
        &self.systems
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_systems() -> Vec<ProjectSystem> {
        EXPECTED_SYSTEMS
            .iter()
            .enumerate()
            .map(|(i, e)| ProjectSystem {
                id: SystemId(100 + i as u64),
                sysname: e.name.to_string(),
                syscolor: e.color.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_resolve_known_categories() {
        let table = CategoryLookupTable::from_verified(complete_systems()).unwrap();
        assert_eq!(table.resolve_category("Energy"), SystemId(100));
        assert_eq!(table.resolve_category("Agricultural & Forestry"), SystemId(101));
    }

    #[test]
    fn test_unknown_category_is_unmapped() {
        let table = CategoryLookupTable::from_verified(complete_systems()).unwrap();
        assert_eq!(table.resolve_category("Transport"), SystemId::UNMAPPED);
        assert_eq!(table.resolve_category("energy"), SystemId::UNMAPPED);
        assert_eq!(table.resolve_category(""), SystemId::UNMAPPED);
    }

    #[test]
    fn test_duplicate_system_is_unmapped() {
        let mut systems = complete_systems();
        systems.push(ProjectSystem {
            id: SystemId(999),
            sysname: "ENE".to_string(),
            syscolor: "#000000".to_string(),
        });
        let table = CategoryLookupTable::from_verified(systems).unwrap();
        assert_eq!(table.resolve_category("Energy"), SystemId::UNMAPPED);
    }

    #[test]
    fn test_missing_or_recolored_systems_fail_verification() {
        let mut systems = complete_systems();
        systems.retain(|s| s.sysname != "WAT");
        systems[0].syscolor = "#FFFFFF".to_string();

        let missing = CategoryLookupTable::from_verified(systems).unwrap_err();
        let names: Vec<&str> = missing.iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["ENE", "WAT"]);
    }

    #[test]
    fn test_color_comparison_ignores_case() {
        let mut systems = complete_systems();
        systems[0].syscolor = "#ab507e".to_string();
        assert!(CategoryLookupTable::missing_systems(&systems).is_empty());
    }

    #[test]
    fn test_empty_project_is_missing_everything() {
        assert_eq!(CategoryLookupTable::missing_systems(&[]).len(), EXPECTED_SYSTEMS.len());
    }
}
