use std::path::{Path, PathBuf};
use std::time::Duration;

/// Resolved run settings, built once from the command line and passed
/// explicitly to the countdown, toucher, and logging setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub target: PathBuf,
    pub frequency: Frequency,
    pub verbosity: u8,
}

/// Minutes between touches. Always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frequency {
    minutes: u32,
}

impl Frequency {
    /// Returns `None` for zero minutes.
    pub fn from_minutes(minutes: u32) -> Option<Self> {
        (minutes > 0).then_some(Self { minutes })
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    /// Number of one-second ticks in a countdown.
    pub fn countdown_secs(&self) -> u64 {
        u64::from(self.minutes) * 60
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.countdown_secs())
    }
}

/// Errors raised while validating settings, before the loop starts.
#[derive(Debug)]
pub enum SettingsError {
    /// Frequency was zero.
    ZeroFrequency,
    /// The target names an existing directory; only files can be touched.
    TargetIsDirectory { path: PathBuf },
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::ZeroFrequency => {
                write!(f, "frequency must be at least 1 minute")
            }
            SettingsError::TargetIsDirectory { path } => {
                write!(
                    f,
                    "{} is a directory; pass a file inside it instead",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for SettingsError {}

impl Settings {
    /// Validate raw command-line values into settings.
    pub fn resolve(
        target: &Path,
        frequency_minutes: u32,
        verbosity: u8,
    ) -> Result<Self, SettingsError> {
        let frequency =
            Frequency::from_minutes(frequency_minutes).ok_or(SettingsError::ZeroFrequency)?;

        if target.is_dir() {
            return Err(SettingsError::TargetIsDirectory {
                path: target.to_path_buf(),
            });
        }

        Ok(Self {
            target: target.to_path_buf(),
            frequency,
            verbosity,
        })
    }

    /// Log filter directive for the verbosity count.
    pub fn log_directive(&self) -> &'static str {
        match self.verbosity {
            0 => "horta=warn",
            1 => "horta=info",
            2 => "horta=debug",
            _ => "horta=trace",
        }
    }
}
