//! Canonicalization and validation of recovered mappings
//!
//! Steps run in a fixed order and the first violated rule is reported:
//! lower-case enumerated values, drop fields outside the allow-list, prune
//! deletes down to `plotName`/`operation`, check required fields, check
//! enumerations, check axis distinctness.

use crate::command::{
    ChartOperationCommand, ChartSize, FieldMapping, Operation, PlotType, ALLOWED_FIELDS,
    OPERATION, PLOT_NAME, PLOT_TYPE, SIZE, X_AXIS, Y_AXIS,
};
use crate::error::SchemaViolation;

const ENUMERATED_FIELDS: [&str; 3] = [OPERATION, PLOT_TYPE, SIZE];

/// Turn any recovered mapping into a validated command
pub fn canonicalize(mut mapping: FieldMapping) -> Result<ChartOperationCommand, SchemaViolation> {
    for key in ENUMERATED_FIELDS {
        mapping.update(key, str::to_lowercase);
    }

    // Blank values count as absent.
    mapping.retain(|key, value| ALLOWED_FIELDS.contains(&key) && !value.trim().is_empty());

    if mapping.get(OPERATION) == Some(Operation::Delete.as_str()) {
        mapping.retain(|key, _| key == PLOT_NAME || key == OPERATION);
    }

    check_required(&mapping)?;

    let operation = parse_field::<Operation>(&mapping, OPERATION)
        .transpose()
        .map_err(SchemaViolation::InvalidOperation)?
        .ok_or(SchemaViolation::MissingField(OPERATION))?;
    let plot_type = parse_field::<PlotType>(&mapping, PLOT_TYPE)
        .transpose()
        .map_err(SchemaViolation::InvalidPlotType)?;
    let size = parse_field::<ChartSize>(&mapping, SIZE)
        .transpose()
        .map_err(SchemaViolation::InvalidSize)?;

    let x_axis = mapping.remove(X_AXIS);
    let y_axis = mapping.remove(Y_AXIS);
    if let (Some(x), Some(y)) = (&x_axis, &y_axis) {
        if x == y {
            return Err(SchemaViolation::DuplicateAxis(x.clone()));
        }
    }

    Ok(ChartOperationCommand {
        plot_name: mapping.remove(PLOT_NAME).unwrap_or_default(),
        operation,
        plot_type,
        size,
        x_axis,
        y_axis,
    })
}

fn check_required(mapping: &FieldMapping) -> Result<(), SchemaViolation> {
    require(mapping, PLOT_NAME)?;
    require(mapping, OPERATION)?;

    if mapping.get(OPERATION) != Some(Operation::Create.as_str()) {
        return Ok(());
    }

    require(mapping, PLOT_TYPE)?;
    require(mapping, SIZE)?;

    if mapping.get(PLOT_TYPE) == Some(PlotType::Pie.as_str()) {
        if !mapping.contains_key(X_AXIS) && !mapping.contains_key(Y_AXIS) {
            return Err(SchemaViolation::MissingPieAxis);
        }
        return Ok(());
    }

    require(mapping, X_AXIS)?;
    require(mapping, Y_AXIS)
}

fn require(mapping: &FieldMapping, field: &'static str) -> Result<(), SchemaViolation> {
    if mapping.contains_key(field) {
        Ok(())
    } else {
        Err(SchemaViolation::MissingField(field))
    }
}

/// `None` when absent, `Some(Err(raw))` when present but outside the enumeration
fn parse_field<T: std::str::FromStr>(
    mapping: &FieldMapping,
    field: &str,
) -> Option<Result<T, String>> {
    mapping
        .get(field)
        .map(|raw| raw.parse::<T>().map_err(|_| raw.to_string()))
}

impl TryFrom<FieldMapping> for ChartOperationCommand {
    type Error = SchemaViolation;

    fn try_from(mapping: FieldMapping) -> Result<Self, Self::Error> {
        canonicalize(mapping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(pairs: &[(&str, &str)]) -> FieldMapping {
        pairs.iter().copied().collect()
    }

    fn create_bar() -> Vec<(&'static str, &'static str)> {
        vec![
            ("plotName", "gross_quantity_chart"),
            ("operation", "create"),
            ("plotType", "bar"),
            ("size", "small"),
            ("xAxis", "BayCode"),
            ("yAxis", "GrossQuantity"),
        ]
    }

    #[test]
    fn test_delete_prunes_everything_else() {
        let command = canonicalize(mapping(&[
            ("plotName", "x"),
            ("operation", "delete"),
            ("plotType", "bar"),
        ]))
        .unwrap();

        assert_eq!(
            serde_json::to_value(&command).unwrap(),
            serde_json::json!({ "plotName": "x", "operation": "delete" })
        );
    }

    #[test]
    fn test_delete_pruning_skips_invalid_extras() {
        // plotType would be invalid, but it is dropped before enumeration checks.
        let command = canonicalize(mapping(&[
            ("plotName", "x"),
            ("operation", "DELETE"),
            ("plotType", "pyramid"),
            ("xAxis", "A"),
            ("yAxis", "A"),
        ]))
        .unwrap();

        assert_eq!(command.operation(), Operation::Delete);
        assert_eq!(command.x_axis(), None);
    }

    #[test]
    fn test_enumerations_are_lowercased() {
        let mut pairs = create_bar();
        pairs[1] = ("operation", "Create");
        pairs[2] = ("plotType", "BAR");
        pairs[3] = ("size", "Small");

        let command = canonicalize(mapping(&pairs)).unwrap();
        assert_eq!(command.operation(), Operation::Create);
        assert_eq!(command.plot_type(), Some(PlotType::Bar));
        assert_eq!(command.size(), Some(ChartSize::Small));
        // Axes keep their case.
        assert_eq!(command.x_axis(), Some("BayCode"));
    }

    #[test]
    fn test_unknown_fields_are_dropped() {
        let mut pairs = create_bar();
        pairs.push(("colour", "red"));

        let command = canonicalize(mapping(&pairs)).unwrap();
        assert!(!command.to_field_mapping().contains_key("colour"));
    }

    #[test]
    fn test_missing_fields_fail_fast_in_order() {
        assert_eq!(
            canonicalize(mapping(&[("operation", "create")])),
            Err(SchemaViolation::MissingField("plotName"))
        );
        assert_eq!(
            canonicalize(mapping(&[("plotName", "x")])),
            Err(SchemaViolation::MissingField("operation"))
        );
        assert_eq!(
            canonicalize(mapping(&[("plotName", "x"), ("operation", "create")])),
            Err(SchemaViolation::MissingField("plotType"))
        );
        assert_eq!(
            canonicalize(mapping(&[
                ("plotName", "x"),
                ("operation", "create"),
                ("plotType", "line"),
                ("size", "large"),
                ("yAxis", "FlowRate"),
            ])),
            Err(SchemaViolation::MissingField("xAxis"))
        );
    }

    #[test]
    fn test_pie_accepts_single_axis() {
        let command = canonicalize(mapping(&[
            ("plotName", "mix"),
            ("operation", "create"),
            ("plotType", "pie"),
            ("size", "medium"),
            ("yAxis", "BaseProductCode"),
        ]))
        .unwrap();

        assert_eq!(command.plot_type(), Some(PlotType::Pie));
        assert_eq!(command.x_axis(), None);
        assert_eq!(command.y_axis(), Some("BaseProductCode"));
    }

    #[test]
    fn test_pie_without_axes_is_rejected() {
        assert_eq!(
            canonicalize(mapping(&[
                ("plotName", "mix"),
                ("operation", "create"),
                ("plotType", "pie"),
                ("size", "medium"),
                ("xAxis", "  "),
            ])),
            Err(SchemaViolation::MissingPieAxis)
        );
    }

    #[test]
    fn test_invalid_enumerations() {
        assert_eq!(
            canonicalize(mapping(&[("plotName", "x"), ("operation", "rename")])),
            Err(SchemaViolation::InvalidOperation("rename".to_string()))
        );

        let mut pairs = create_bar();
        pairs[2] = ("plotType", "Radar");
        assert_eq!(
            canonicalize(mapping(&pairs)),
            Err(SchemaViolation::InvalidPlotType("radar".to_string()))
        );

        let mut pairs = create_bar();
        pairs[3] = ("size", "huge");
        assert_eq!(
            canonicalize(mapping(&pairs)),
            Err(SchemaViolation::InvalidSize("huge".to_string()))
        );
    }

    #[test]
    fn test_update_needs_only_name_and_operation() {
        let command = canonicalize(mapping(&[
            ("plotName", "base_product_code_chart"),
            ("operation", "update"),
            ("size", "large"),
        ]))
        .unwrap();

        assert_eq!(command.operation(), Operation::Update);
        assert_eq!(command.size(), Some(ChartSize::Large));
        assert_eq!(command.plot_type(), None);
    }

    #[test]
    fn test_update_enumerations_are_checked_when_present() {
        // plotType and size are typed on the command, so an update cannot
        // carry a value outside the enumeration (DESIGN.md decision 3).
        assert_eq!(
            canonicalize(mapping(&[
                ("plotName", "a"),
                ("operation", "update"),
                ("plotType", "donut"),
            ])),
            Err(SchemaViolation::InvalidPlotType("donut".to_string()))
        );
        assert_eq!(
            canonicalize(mapping(&[
                ("plotName", "a"),
                ("operation", "update"),
                ("size", "XL"),
            ])),
            Err(SchemaViolation::InvalidSize("xl".to_string()))
        );
    }

    #[test]
    fn test_equal_axes_rejected() {
        let mut pairs = create_bar();
        pairs[4] = ("xAxis", "FlowRate");
        pairs[5] = ("yAxis", "FlowRate");

        assert_eq!(
            canonicalize(mapping(&pairs)),
            Err(SchemaViolation::DuplicateAxis("FlowRate".to_string()))
        );
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: ChartOperationCommand =
            serde_json::from_str(r#"{"plotName":"fallback_chart","operation":"delete"}"#).unwrap();
        assert_eq!(ok.plot_name(), "fallback_chart");

        let bad = serde_json::from_str::<ChartOperationCommand>(
            r#"{"plotName":"x","operation":"create"}"#,
        );
        assert!(bad.unwrap_err().to_string().contains("plotType"));
    }
}
