use {
    anyhow::Result,
    ron::ser::{
        to_string_pretty,
        PrettyConfig,
    },
    serde::Serialize,
    std::{
        fs,
        path::Path,
    },
};

/// Write a config struct to disk as pretty-printed RON, next to whatever
/// artifact (model weights, logs) it belongs to.
pub fn write_config<C: Serialize>(
    config: &C,
    path: impl AsRef<Path>,
) -> Result<()> {
    fs::write(path, to_string_pretty(config, PrettyConfig::default())?)?;
    Ok(())
}
