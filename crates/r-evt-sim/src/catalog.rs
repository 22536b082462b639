//! ---
//! evt_section: "11-simulation"
//! evt_subsection: "module"
//! evt_type: "source"
//! evt_scope: "code"
//! evt_description: "Measurement groups and their classified fields."
//! evt_version: "v0.1.0"
//! evt_owner: "tbd"
//! ---
use r_evt_common::MeasurementGroupConfig;

use crate::policy::FieldCategory;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedField {
    pub name: String,
    pub category: FieldCategory,
}

/// Named set of fields written together under one measurement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasurementGroup {
    name: String,
    fields: Vec<ClassifiedField>,
}

impl MeasurementGroup {
    pub fn new<I, S>(name: &str, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields = fields
            .into_iter()
            .map(|field| {
                let name = field.into();
                let category = FieldCategory::classify(&name);
                ClassifiedField { name, category }
            })
            .collect();
        Self {
            name: name.to_owned(),
            fields,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[ClassifiedField] {
        &self.fields
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.name.as_str())
    }
}

/// Ordered measurement groups; declaration order is emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeasurementCatalog {
    groups: Vec<MeasurementGroup>,
}

impl MeasurementCatalog {
    pub fn new(groups: Vec<MeasurementGroup>) -> Self {
        Self { groups }
    }

    pub fn from_config(groups: &[MeasurementGroupConfig]) -> Self {
        Self::new(
            groups
                .iter()
                .map(|group| MeasurementGroup::new(&group.name, group.fields.iter().cloned()))
                .collect(),
        )
    }

    pub fn groups(&self) -> &[MeasurementGroup] {
        &self.groups
    }

    pub fn get(&self, name: &str) -> Option<&MeasurementGroup> {
        self.groups.iter().find(|group| group.name == name)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use r_evt_common::GenerationConfig;

    #[test]
    fn default_catalog_preserves_declaration_order() {
        let catalog = MeasurementCatalog::from_config(&GenerationConfig::default().measurements);
        assert_eq!(catalog.len(), 12);
        let names: Vec<_> = catalog.groups().iter().map(|g| g.name()).collect();
        assert_eq!(names.first(), Some(&"bms_battery_weather"));
        assert_eq!(names.last(), Some(&"EPAS_oe_response_state_limits"));

        let rear = catalog.get("controller_motor_status_1_REAR").unwrap();
        let categories: Vec<_> = rear.fields().iter().map(|f| f.category).collect();
        assert_eq!(
            categories,
            vec![
                FieldCategory::HighTemperature,
                FieldCategory::LowTemperature,
                FieldCategory::CumulativeDistance,
            ]
        );
    }

    #[test]
    fn every_default_fault_group_field_is_a_flag() {
        let catalog = MeasurementCatalog::from_config(&GenerationConfig::default().measurements);
        let group = catalog.get("bms_fault_and_safety_state").unwrap();
        assert!(group
            .fields()
            .iter()
            .all(|field| field.category == FieldCategory::Flag));
    }
}
