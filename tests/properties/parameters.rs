//! Property tests for blueprint parameters.

use proptest::prelude::*;

use drawstack::config::{parse_with_warnings, FileFormat};
use drawstack::{Blueprint, Parameters};
use std::path::Path;

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: well-formed names always produce a valid blueprint.
    #[test]
    fn property_valid_names_build(
        state in "[a-z0-9]{3,24}",
        compute in "[a-z0-9][a-z0-9-]{0,58}[a-z0-9]",
    ) {
        let params = Parameters::new("westeurope", state, compute);
        prop_assert!(params.validate().is_empty());
        let set = Blueprint::draw_backend(&params).unwrap();
        prop_assert_eq!(set.len(), 3);
    }

    /// PROPERTY: validation never panics and rejects uppercase storage names.
    #[test]
    fn property_uppercase_storage_rejected(name in "[A-Z][A-Za-z0-9]{2,23}") {
        let params = Parameters::new("westeurope", name, "draw-host");
        let issues = params.validate();
        prop_assert!(issues.iter().any(|i| i.subject == "parameters.state_storage_name"));
    }

    /// PROPERTY: parsing arbitrary text returns a result, never a panic.
    #[test]
    fn property_parse_never_panics(content in ".{0,200}") {
        let _ = parse_with_warnings::<Parameters>(&content, FileFormat::Toml, Path::new("p.toml"));
        let _ = parse_with_warnings::<Parameters>(&content, FileFormat::Yaml, Path::new("p.yaml"));
    }
}
