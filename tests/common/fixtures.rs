//! Shared test content

pub const PARAMS_FILE: &str = "drawstack.params.toml";

pub const CONFIG_TOML: &str = r#"[scope]
subscription_id = "00000000-0000-0000-0000-000000000001"
resource_group = "rg-draw"

[retry]
max_attempts = 2
base_delay_ms = 1
max_delay_ms = 2
"#;

pub const PARAMS_TOML: &str = r#"location = "westeurope"
state_storage_name = "drawstate01"
compute_name = "draw-host"
artifact_storage_name = "drawartifacts"
"#;

pub const PARAMS_YAML: &str = "location: westeurope
state_storage_name: drawstate01
compute_name: draw-host
runtime: node
";
