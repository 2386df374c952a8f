//! Converter configuration.

use crate::converters::{DitherMode, NoiseShaping};
use crate::error::{Error, Result};

/// User-settable options of the converter.
///
/// Options only affect sample conversion, never negotiation.
///
/// # Example
///
/// ```rust
/// use parallax_audioconvert::config::ConvertConfig;
/// use parallax_audioconvert::converters::{DitherMode, NoiseShaping};
///
/// let mut config = ConvertConfig::default().with_dither(DitherMode::Rpdf);
/// config.set_property("noise-shaping", "high").unwrap();
///
/// assert_eq!(config.dither, DitherMode::Rpdf);
/// assert_eq!(config.noise_shaping, NoiseShaping::High);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConvertConfig {
    /// Dithering to apply when reducing integer precision.
    pub dither: DitherMode,
    /// Noise shaping to apply when reducing integer precision.
    pub noise_shaping: NoiseShaping,
}

impl ConvertConfig {
    /// Name of the dithering property.
    pub const DITHERING: &'static str = "dithering";
    /// Name of the noise shaping property.
    pub const NOISE_SHAPING: &'static str = "noise-shaping";

    /// Set the dither mode.
    pub fn with_dither(mut self, dither: DitherMode) -> Self {
        self.dither = dither;
        self
    }

    /// Set the noise shaping.
    pub fn with_noise_shaping(mut self, noise_shaping: NoiseShaping) -> Self {
        self.noise_shaping = noise_shaping;
        self
    }

    /// Set an option by property name from its string value.
    pub fn set_property(&mut self, name: &str, value: &str) -> Result<()> {
        match name {
            Self::DITHERING => self.dither = value.parse()?,
            Self::NOISE_SHAPING => self.noise_shaping = value.parse()?,
            other => return Err(Error::Config(format!("unknown property: {other}"))),
        }
        tracing::debug!(property = name, value, "property set");
        Ok(())
    }

    /// Current value of a property, as its string nick.
    pub fn property(&self, name: &str) -> Option<&'static str> {
        match name {
            Self::DITHERING => Some(self.dither.nick()),
            Self::NOISE_SHAPING => Some(self.noise_shaping.nick()),
            _ => None,
        }
    }
}
