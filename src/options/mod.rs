//! Viewer options with TOML preset support.
//!
//! Camera, layout, selection and keybinding settings are consolidated
//! here. Options serialize to/from TOML so presets can live in a
//! directory of `*.toml` files.

mod camera;
mod keybindings;
mod layout;
mod selection;

use std::path::Path;

pub use camera::CameraOptions;
pub use keybindings::KeybindingOptions;
pub use layout::LayoutOptions;
use schemars::JsonSchema;
pub use selection::SelectionOptions;
use serde::{Deserialize, Serialize};

use crate::error::CubefieldError;

/// Top-level options container. All sub-structs use `#[serde(default)]` so
/// partial TOML files (e.g. only overriding `[layout]`) work correctly.
#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema,
)]
#[serde(default)]
pub struct Options {
    /// Camera projection and control parameters.
    pub camera: CameraOptions,
    /// Layout strategy and tunables.
    pub layout: LayoutOptions,
    /// Picking parameters.
    pub selection: SelectionOptions,
    /// Keyboard binding options.
    #[schemars(skip)]
    pub keybindings: KeybindingOptions,
}

impl Options {
    /// Generate JSON Schema describing the UI-exposed options.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Options)
    }

    /// Parse options from TOML text. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Returns [`CubefieldError::OptionsParse`] on malformed TOML.
    pub fn from_toml(content: &str) -> Result<Self, CubefieldError> {
        let mut options: Self = toml::from_str(content)
            .map_err(|e| CubefieldError::OptionsParse(e.to_string()))?;
        options.keybindings.rebuild_reverse_map();
        Ok(options)
    }

    /// Load options from a TOML file. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Returns [`CubefieldError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, CubefieldError> {
        let content = std::fs::read_to_string(path)?;
        let options = Self::from_toml(&content)?;
        log::info!("Loaded options from {}", path.display());
        Ok(options)
    }

    /// Save options to a TOML file (pretty-printed).
    ///
    /// # Errors
    ///
    /// Returns [`CubefieldError`] if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<(), CubefieldError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| CubefieldError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        log::info!("Saved options to {}", path.display());
        Ok(())
    }

    /// List available preset names (TOML file stems) in a directory.
    #[must_use]
    pub fn list_presets(dir: &Path) -> Vec<String> {
        let mut names = Vec::new();
        if let Ok(entries) = std::fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "toml") {
                    if let Some(stem) =
                        path.file_stem().and_then(|s| s.to_str())
                    {
                        names.push(stem.to_owned());
                    }
                }
            }
        }
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::KeyAction;
    use crate::layout::LayoutStrategy;

    #[test]
    fn default_round_trips_through_toml() {
        let opts = Options::default();
        let toml_str = toml::to_string_pretty(&opts).unwrap();
        let parsed = Options::from_toml(&toml_str).unwrap();
        assert_eq!(opts, parsed);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r#"
[layout]
strategy = "cluster"
jitter_seed = 7
"#;
        let opts = Options::from_toml(toml_str).unwrap();
        assert_eq!(opts.layout.strategy, LayoutStrategy::Cluster);
        assert_eq!(opts.layout.params().jitter_seed, Some(7));
        assert_eq!(opts.layout.grid_spacing, 2.5);
        assert_eq!(opts.selection.pick_radius_scale, 1.5);
        assert_eq!(opts.camera.fovy, 60.0);
    }

    #[test]
    fn unknown_strategy_falls_back_to_grid() {
        let opts = Options::from_toml("[layout]\nstrategy = \"spiral\"\n").unwrap();
        assert_eq!(opts.layout.strategy, LayoutStrategy::Grid);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(matches!(
            Options::from_toml("[layout\n"),
            Err(CubefieldError::OptionsParse(_))
        ));
    }

    #[test]
    fn keybinding_lookup_survives_load() {
        let opts = Options::from_toml(
            "[keybindings.bindings]\ncycle_layout = \"KeyL\"\n",
        )
        .unwrap();
        assert_eq!(opts.keybindings.lookup("KeyL"), Some(KeyAction::CycleLayout));
        assert_eq!(opts.keybindings.lookup("Tab"), None);

        let defaults = Options::default();
        assert_eq!(defaults.keybindings.lookup("KeyW"), Some(KeyAction::MoveForward));
        assert_eq!(defaults.keybindings.lookup("KeyZ"), None);
    }

    #[test]
    fn save_load_and_list_presets() {
        let dir = std::env::temp_dir()
            .join(format!("cubefield-presets-{}", std::process::id()));
        let mut opts = Options::default();
        opts.layout.strategy = LayoutStrategy::TemporalBanding;
        opts.save(&dir.join("timeline.toml")).unwrap();
        Options::default().save(&dir.join("basic.toml")).unwrap();

        assert_eq!(Options::list_presets(&dir), vec!["basic", "timeline"]);
        let loaded = Options::load(&dir.join("timeline.toml")).unwrap();
        assert_eq!(loaded, opts);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn schema_has_expected_properties() {
        let schema_value =
            serde_json::to_value(Options::json_schema()).unwrap();
        let props = schema_value["properties"].as_object().unwrap();
        assert!(props.contains_key("camera"));
        assert!(props.contains_key("layout"));
        assert!(props.contains_key("selection"));
        assert!(!props.contains_key("keybindings"));

        let camera = &props["camera"]["properties"];
        assert!(camera.get("fovy").is_some());
        assert!(camera.get("znear").is_none());
        let layout = &props["layout"]["properties"];
        assert!(layout.get("strategy").is_some());
        assert!(layout.get("jitter_seed").is_none());
    }
}
