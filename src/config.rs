use std::convert::TryFrom;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde_derive::Deserialize;

use crate::error::{IngestError, IngestResult};

/// Settings read from a JSON document such as
///
/// ```json
/// { "model": { "decay": { "zeroThreshold": 0.01, "factor": 0.5 } }, "input": { "delimiter": "," } }
/// ```
///
/// Every field is optional.
#[derive(Debug, Default, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub model: ModelConfig,
    pub input: InputConfig,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    pub decay: DecayConfig,
}

/// How historical data is weighted and when near-zero cells are dropped. Can only be obtained
/// in validated form: `0 <= zero_threshold` and `0 <= factor <= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "RawDecayConfig")]
pub struct DecayConfig {
    zero_threshold: f32,
    factor: f32,
}

#[derive(Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
struct RawDecayConfig {
    zero_threshold: f32,
    factor: f32,
}

impl Default for RawDecayConfig {
    fn default() -> Self {
        RawDecayConfig { zero_threshold: 0.0, factor: 1.0 }
    }
}

impl TryFrom<RawDecayConfig> for DecayConfig {
    type Error = IngestError;

    fn try_from(raw: RawDecayConfig) -> Result<Self, Self::Error> {
        DecayConfig::new(raw.zero_threshold, raw.factor)
    }
}

impl DecayConfig {

    pub fn new(zero_threshold: f32, factor: f32) -> IngestResult<Self> {
        // Written so that NaN fails as well.
        if !(zero_threshold >= 0.0) {
            return Err(IngestError::Config(
                format!("Zero threshold must be nonnegative: {}", zero_threshold)));
        }

        if !(factor >= 0.0 && factor <= 1.0) {
            return Err(IngestError::Config(
                format!("Decay factor must be in [0,1]: {}", factor)));
        }

        Ok(DecayConfig { zero_threshold, factor })
    }

    pub fn zero_threshold(&self) -> f32 {
        self.zero_threshold
    }

    pub fn factor(&self) -> f32 {
        self.factor
    }
}

impl Default for DecayConfig {
    fn default() -> Self {
        DecayConfig { zero_threshold: 0.0, factor: 1.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    pub delimiter: char,
}

impl Default for InputConfig {
    fn default() -> Self {
        InputConfig { delimiter: ',' }
    }
}

impl InputConfig {

    /// The csv reader wants a single byte.
    pub fn delimiter_byte(&self) -> IngestResult<u8> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(IngestError::Config(format!("Delimiter must be ASCII: {:?}", self.delimiter)))
        }
    }
}

impl Config {

    pub fn from_reader<R: Read>(reader: R) -> IngestResult<Self> {
        let config: Config = serde_json::from_reader(reader)?;
        config.input.delimiter_byte()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> IngestResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|source| IngestError::Io { path: path.to_path_buf(), source })?;

        Config::from_reader(BufReader::new(file))
    }
}

#[cfg(test)]
mod tests {

    use super::{Config, DecayConfig};
    use crate::error::IngestError;

    #[test]
    fn defaults_keep_everything() {
        let config = Config::from_reader("{}".as_bytes()).unwrap();

        assert_eq!(config.model.decay.factor(), 1.0);
        assert_eq!(config.model.decay.zero_threshold(), 0.0);
        assert_eq!(config.input.delimiter, ',');
    }

    #[test]
    fn reads_decay_settings() {
        let json = r#"{ "model": { "decay": { "zeroThreshold": 0.1, "factor": 0.5 } },
                        "input": { "delimiter": "\t" } }"#;
        let config = Config::from_reader(json.as_bytes()).unwrap();

        assert_eq!(config.model.decay, DecayConfig::new(0.1, 0.5).unwrap());
        assert_eq!(config.input.delimiter_byte().unwrap(), b'\t');
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(matches!(DecayConfig::new(-0.1, 0.5), Err(IngestError::Config(_))));
        assert!(matches!(DecayConfig::new(0.0, 1.5), Err(IngestError::Config(_))));
        assert!(matches!(DecayConfig::new(0.0, -0.5), Err(IngestError::Config(_))));
        assert!(matches!(DecayConfig::new(std::f32::NAN, 0.5), Err(IngestError::Config(_))));

        let json = r#"{ "model": { "decay": { "factor": 2.0 } } }"#;
        assert!(Config::from_reader(json.as_bytes()).is_err());
    }

    #[test]
    fn rejects_non_ascii_delimiters() {
        let json = r#"{ "input": { "delimiter": "→" } }"#;
        assert!(matches!(Config::from_reader(json.as_bytes()), Err(IngestError::Config(_))));
    }
}
