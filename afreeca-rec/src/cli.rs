//! Command line interface.

use std::path::PathBuf;

use clap::Parser;
use inquire::Text;

use crate::{ChannelId, Error, Result};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Login of the channel to watch (prompted for when omitted)
    #[arg(value_name = "CHANNEL")]
    pub channels: Vec<String>,

    /// Credentials file used when USER_NAME / USER_PASSWORD are not set
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Root directory for recordings (overrides OUTPUT_DIR)
    #[arg(short, long, value_name = "PATH")]
    pub output_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Resolve the channel to watch, prompting on the terminal when none was
    /// given.
    ///
    /// Returns `Ok(None)` when the prompt is answered with an empty line or
    /// cancelled.
    pub fn resolve_channel(&self) -> Result<Option<ChannelId>> {
        resolve_channel_with(&self.channels, prompt_channel)
    }
}

/// Channel selection with an injectable prompt.
pub fn resolve_channel_with<P>(channels: &[String], prompt: P) -> Result<Option<ChannelId>>
where
    P: FnOnce() -> Result<Option<String>>,
{
    match channels {
        [] => match prompt()? {
            Some(answer) if !answer.trim().is_empty() => ChannelId::parse(answer).map(Some),
            _ => Ok(None),
        },
        [channel] => ChannelId::parse(channel).map(Some),
        _ => Err(Error::config(format!(
            "only one streamer nickname is allowed, got {}",
            channels.len()
        ))),
    }
}

fn prompt_channel() -> Result<Option<String>> {
    match Text::new("Streamer nickname:").prompt() {
        Ok(answer) => Ok(Some(answer)),
        Err(
            inquire::InquireError::OperationCanceled | inquire::InquireError::OperationInterrupted,
        ) => Ok(None),
        Err(e) => Err(Error::config(format!("failed to read streamer nickname: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn never_prompt() -> Result<Option<String>> {
        panic!("prompt should not be shown");
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_channel() {
        let channel = resolve_channel_with(&args(&["alice"]), never_prompt)
            .unwrap()
            .unwrap();
        assert_eq!(channel.as_str(), "alice");
    }

    #[test]
    fn test_multiple_channels_rejected() {
        let err = resolve_channel_with(&args(&["alice", "bob"]), never_prompt).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("only one streamer nickname"));
    }

    #[test]
    fn test_invalid_channel_rejected() {
        let err = resolve_channel_with(&args(&["../etc"]), never_prompt).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_prompt_used_without_arguments() {
        let channel = resolve_channel_with(&[], || Ok(Some("  bob ".to_string())))
            .unwrap()
            .unwrap();
        assert_eq!(channel.as_str(), "bob");
    }

    #[test]
    fn test_empty_answer_exits_cleanly() {
        assert!(
            resolve_channel_with(&[], || Ok(Some(String::new())))
                .unwrap()
                .is_none()
        );
        assert!(resolve_channel_with(&[], || Ok(None)).unwrap().is_none());
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        assert!(Args::try_parse_from(["afreeca-rec", "-v", "-q", "alice"]).is_err());
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::parse_from(["afreeca-rec", "-v", "--output-dir", "/rec", "alice"]);
        assert!(args.verbose);
        assert!(!args.quiet);
        assert_eq!(args.output_dir, Some(PathBuf::from("/rec")));
        assert_eq!(args.channels, vec!["alice".to_string()]);
    }
}
