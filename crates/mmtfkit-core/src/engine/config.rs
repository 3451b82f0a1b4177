use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Cutoff distance must be a positive finite number (got {0})")]
    InvalidCutoff(f64),
}

/// Parameters of a group interaction search.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionConfig {
    /// Chemical component identifier of the target group, e.g. `"ZN"`.
    pub target_group: String,
    /// Maximum inclusive interaction distance, in coordinate units.
    pub cutoff: f64,
    /// Skip structures in which any atom has an alternate location.
    pub exclude_alternative_locations: bool,
}

#[derive(Default)]
pub struct InteractionConfigBuilder {
    target_group: Option<String>,
    cutoff: Option<f64>,
    exclude_alternative_locations: Option<bool>,
}

impl InteractionConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target_group(mut self, name: impl Into<String>) -> Self {
        self.target_group = Some(name.into());
        self
    }
    pub fn cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = Some(cutoff);
        self
    }
    pub fn exclude_alternative_locations(mut self, exclude: bool) -> Self {
        self.exclude_alternative_locations = Some(exclude);
        self
    }

    pub fn build(self) -> Result<InteractionConfig, ConfigError> {
        let target_group = self
            .target_group
            .filter(|name| !name.trim().is_empty())
            .ok_or(ConfigError::MissingParameter("target_group"))?;
        let cutoff = self
            .cutoff
            .ok_or(ConfigError::MissingParameter("cutoff"))?;
        if !(cutoff.is_finite() && cutoff > 0.0) {
            return Err(ConfigError::InvalidCutoff(cutoff));
        }
        Ok(InteractionConfig {
            target_group,
            cutoff,
            exclude_alternative_locations: self.exclude_alternative_locations.unwrap_or(false),
        })
    }
}
