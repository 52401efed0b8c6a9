//! Decoder settings, loadable from configuration files and environment variables.
use ubyte::ByteUnit;

use crate::decoder::{FormUrlDecoder, MultipartDecoder};
use crate::multipart::DEFAULT_MAX_MEMORY;

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
/// The knobs shared by [`FormUrlDecoder`] and [`MultipartDecoder`].
///
/// Every field is optional when deserializing: missing fields take their
/// default value.
///
/// ```yaml
/// split_enabled: true
/// split_symbol: ";"
/// skip_filled: false
/// max_memory: 8 MiB
/// ```
pub struct DecoderConfig {
    /// See [`FormUrlDecoder::set_split_enabled`].
    pub split_enabled: bool,
    /// See [`FormUrlDecoder::set_split_symbol`].
    pub split_symbol: char,
    /// See [`FormUrlDecoder::set_skip_filled`].
    pub skip_filled: bool,
    /// See [`MultipartDecoder::set_max_memory`].
    pub max_memory: ByteUnit,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            split_enabled: true,
            split_symbol: ',',
            skip_filled: true,
            max_memory: DEFAULT_MAX_MEMORY,
        }
    }
}

impl DecoderConfig {
    pub fn form_url_decoder(&self) -> FormUrlDecoder {
        FormUrlDecoder::new()
            .set_split_enabled(self.split_enabled)
            .set_split_symbol(self.split_symbol)
            .set_skip_filled(self.skip_filled)
    }

    pub fn multipart_decoder(&self) -> MultipartDecoder {
        MultipartDecoder::new()
            .set_split_enabled(self.split_enabled)
            .set_split_symbol(self.split_symbol)
            .set_skip_filled(self.skip_filled)
            .set_max_memory(self.max_memory)
    }
}

#[cfg(feature = "config")]
mod load {
    use std::path::Path;

    use anyhow::Context;
    use figment::{
        Figment,
        providers::{Env, Format, Yaml},
    };

    use super::DecoderConfig;

    /// The prefix of the environment variables that override file settings.
    pub const ENV_PREFIX: &str = "FORMBIND_";

    impl DecoderConfig {
        /// Load the configuration from a YAML file, if it exists, and from
        /// environment variables prefixed with `FORMBIND_`
        /// (e.g. `FORMBIND_MAX_MEMORY=1MiB`).
        ///
        /// Environment variables take precedence over the file.
        pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigLoadError> {
            let path = path.as_ref();
            let _span = tracing::info_span!(
                "Loading decoder configuration",
                configuration.file = %path.display(),
            )
            .entered();
            Figment::new()
                .merge(Yaml::file(path))
                .merge(Env::prefixed(ENV_PREFIX))
                .extract()
                .context("Failed to load the decoder configuration")
                .map_err(ConfigLoadError)
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("Failed to load configuration")]
    /// The error returned by [`DecoderConfig::load`].
    pub struct ConfigLoadError(#[source] anyhow::Error);
}

#[cfg(feature = "config")]
pub use load::{ConfigLoadError, ENV_PREFIX};

#[cfg(test)]
mod tests {
    use ubyte::ByteUnit;

    use super::DecoderConfig;

    #[test]
    fn decoders_inherit_the_settings() {
        let config = DecoderConfig {
            split_enabled: false,
            split_symbol: '|',
            skip_filled: false,
            max_memory: ByteUnit::Kibibyte(4),
        };
        let form = config.form_url_decoder();
        assert!(!form.get_split().enabled);
        assert_eq!(form.get_split().symbol, '|');
        assert!(!form.get_skip_filled());

        let multipart = config.multipart_decoder();
        assert_eq!(multipart.get_max_memory(), ByteUnit::Kibibyte(4));
        assert!(!multipart.get_skip_filled());
    }

    #[cfg(feature = "config")]
    #[test]
    fn load_from_file_and_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "decoders.yml",
                r#"
                split_symbol: ";"
                max_memory: 2 MiB
                "#,
            )?;
            jail.set_env("FORMBIND_SKIP_FILLED", "false");

            let config = DecoderConfig::load("decoders.yml").map_err(|e| format!("{e:?}"))?;
            assert_eq!(
                config,
                DecoderConfig {
                    split_enabled: true,
                    split_symbol: ';',
                    skip_filled: false,
                    max_memory: ByteUnit::Mebibyte(2),
                }
            );
            Ok(())
        });
    }

    #[cfg(feature = "config")]
    #[test]
    fn a_missing_file_means_defaults() {
        figment::Jail::expect_with(|_jail| {
            let config = DecoderConfig::load("missing.yml").map_err(|e| format!("{e:?}"))?;
            assert_eq!(config, DecoderConfig::default());
            Ok(())
        });
    }
}
