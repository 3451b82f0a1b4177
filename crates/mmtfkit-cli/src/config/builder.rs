use super::file::FileConfig;
use crate::cli::InteractionsArgs;
use crate::error::{CliError, Result};
use mmtfkit::engine::config::{InteractionConfig, InteractionConfigBuilder};

/// Merges the optional config file with command-line overrides. A value given
/// on the command line always wins over the file.
pub fn build_config(args: &InteractionsArgs) -> Result<InteractionConfig> {
    let file_config = match &args.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };
    merge(file_config, args)
}

fn merge(mut file_config: FileConfig, args: &InteractionsArgs) -> Result<InteractionConfig> {
    let search = file_config.search.take().unwrap_or_default();
    let filters = file_config.filters.take().unwrap_or_default();

    let mut builder = InteractionConfigBuilder::new();
    if let Some(group) = args.group.clone().or(search.target_group) {
        builder = builder.target_group(group);
    }
    if let Some(cutoff) = args.cutoff.or(search.cutoff) {
        builder = builder.cutoff(cutoff);
    }
    let exclude = args.exclude_alt_locs || filters.exclude_alternative_locations.unwrap_or(false);
    builder
        .exclude_alternative_locations(exclude)
        .build()
        .map_err(|e| CliError::Config(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::file::{FileFilterConfig, FileSearchConfig};

    fn args(group: Option<&str>, cutoff: Option<f64>, exclude: bool) -> InteractionsArgs {
        InteractionsArgs {
            inputs: vec!["1znc.mmtf".into()],
            group: group.map(str::to_string),
            cutoff,
            config: None,
            output: None,
            exclude_alt_locs: exclude,
        }
    }

    fn file(group: &str, cutoff: f64, exclude: bool) -> FileConfig {
        FileConfig {
            search: Some(FileSearchConfig {
                target_group: Some(group.to_string()),
                cutoff: Some(cutoff),
            }),
            filters: Some(FileFilterConfig {
                exclude_alternative_locations: Some(exclude),
            }),
        }
    }

    #[test]
    fn command_line_overrides_file() {
        let config = merge(file("ATP", 4.0, false), &args(Some("ZN"), Some(3.0), false)).unwrap();
        assert_eq!(config.target_group, "ZN");
        assert_eq!(config.cutoff, 3.0);
    }

    #[test]
    fn file_fills_values_missing_on_command_line() {
        let config = merge(file("ATP", 4.0, true), &args(None, None, false)).unwrap();
        assert_eq!(config.target_group, "ATP");
        assert_eq!(config.cutoff, 4.0);
        assert!(config.exclude_alternative_locations);
    }

    #[test]
    fn missing_group_is_a_config_error() {
        let err = merge(FileConfig::default(), &args(None, Some(3.0), false)).unwrap_err();
        assert!(matches!(err, CliError::Config(msg) if msg.contains("target_group")));
    }

    #[test]
    fn invalid_cutoff_is_a_config_error() {
        let err = merge(FileConfig::default(), &args(Some("ZN"), Some(0.0), false)).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }
}
