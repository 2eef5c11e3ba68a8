use serde::{Deserialize, Serialize};

/// Streamlink invocation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamlinkConfig {
    /// Path to streamlink binary
    #[serde(default = "default_streamlink_path")]
    pub binary_path: String,
    /// Quality preference (e.g., "best", "720p")
    #[serde(default = "default_quality")]
    pub quality: String,
    /// Output file extension, without the dot
    #[serde(default = "default_extension")]
    pub extension: String,
    /// `--stream-segment-threads`
    #[serde(default = "default_segment_tuning")]
    pub segment_threads: u32,
    /// `--stream-segment-attempts`
    #[serde(default = "default_segment_tuning")]
    pub segment_attempts: u32,
    /// Streamlink plugin whose `--<plugin>-username/-password` options
    /// carry the platform credentials
    #[serde(default = "default_plugin")]
    pub plugin: String,
    /// Additional arguments, appended before the output option
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_streamlink_path() -> String {
    "streamlink".to_string()
}

fn default_quality() -> String {
    "best".to_string()
}

fn default_extension() -> String {
    "ts".to_string()
}

fn default_segment_tuning() -> u32 {
    5
}

fn default_plugin() -> String {
    "afreeca".to_string()
}

impl Default for StreamlinkConfig {
    fn default() -> Self {
        Self {
            binary_path: default_streamlink_path(),
            quality: default_quality(),
            extension: default_extension(),
            segment_threads: default_segment_tuning(),
            segment_attempts: default_segment_tuning(),
            plugin: default_plugin(),
            extra_args: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: StreamlinkConfig = serde_json::from_str(r#"{"quality":"720p"}"#).unwrap();
        assert_eq!(config.quality, "720p");
        assert_eq!(config.binary_path, "streamlink");
        assert_eq!(config.segment_attempts, 5);
        assert_eq!(config.plugin, "afreeca");
    }
}
