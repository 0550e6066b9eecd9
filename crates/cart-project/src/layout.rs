//! Entry names inside a project file.

use cart_types::ModelAssetId;

pub const METADATA_ENTRY: &str = "metadata.json";
pub const CART_ENTRY: &str = "cart.json";

const MODEL_PREFIX: &str = "models/";
const MODEL_SUFFIX: &str = ".glb";

pub fn model_entry_name(id: ModelAssetId) -> String {
    format!("{MODEL_PREFIX}{id}{MODEL_SUFFIX}")
}

/// Model id of a `models/{id}.glb` entry, or `None` for any other name.
pub fn parse_model_entry(name: &str) -> Option<ModelAssetId> {
    name.strip_prefix(MODEL_PREFIX)?
        .strip_suffix(MODEL_SUFFIX)?
        .parse()
        .ok()
}

/// Whether `name` lives in the models directory, parseable or not.
pub fn is_model_entry(name: &str) -> bool {
    name.starts_with(MODEL_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_entry_names() {
        let id = ModelAssetId::new(12);
        assert_eq!(model_entry_name(id), "models/12.glb");
        assert_eq!(parse_model_entry("models/12.glb"), Some(id));
    }

    #[test]
    fn rejects_other_names() {
        for name in [
            "models/abc.glb",
            "models/-1.glb",
            "models/1.5.glb",
            "models/7.gltf",
            "textures/7.glb",
            "models/.glb",
            "cart.json",
        ] {
            assert_eq!(parse_model_entry(name), None, "{name}");
        }
        assert!(is_model_entry("models/abc.glb"));
        assert!(!is_model_entry("cart.json"));
    }
}
