use std::fmt;
use std::str::FromStr;

/// Opaque task identifier assigned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Submission counter; replies carrying an older attempt are stale.
pub type Attempt = u64;

/// Backend job status. Tokens the backend may add later land in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TaskStatus {
    #[default]
    Queued,
    Downloading,
    Processing,
    Completed,
    Error,
    Other(String),
}

impl TaskStatus {
    pub fn parse(token: &str) -> Self {
        match token {
            "queued" => Self::Queued,
            "downloading" => Self::Downloading,
            "processing" => Self::Processing,
            "completed" => Self::Completed,
            "error" => Self::Error,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => "queued",
            Self::Downloading => "downloading",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Error => "error",
            Self::Other(token) => token,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

/// One point-in-time status payload for a task.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TaskSnapshot {
    pub status: TaskStatus,
    pub progress: Option<f64>,
    pub speed_bytes_per_sec: Option<f64>,
    pub eta_seconds: Option<f64>,
    pub filename: Option<String>,
    pub error_message: Option<String>,
}

impl TaskSnapshot {
    pub fn new(status: TaskStatus) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn with_progress(mut self, progress: f64) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_rate(mut self, speed_bytes_per_sec: f64, eta_seconds: Option<f64>) -> Self {
        self.speed_bytes_per_sec = Some(speed_bytes_per_sec);
        self.eta_seconds = eta_seconds;
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }
}

/// How a polling run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The backend reported a terminal status.
    Finished(TaskSnapshot),
    /// The backend no longer knows the task.
    Expired,
    /// No snapshot arrived within the configured stall timeout.
    Stalled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatType {
    #[default]
    Video,
    Audio,
}

impl FormatType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }
}

impl FromStr for FormatType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "video" | "mp4" => Ok(Self::Video),
            "audio" | "mp3" => Ok(Self::Audio),
            other => Err(format!("unknown format type `{other}` (expected video or audio)")),
        }
    }
}

/// Quality preference understood by the backend: `best`, `worst` or a maximum height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quality {
    #[default]
    Best,
    Worst,
    MaxHeight(u32),
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Best => f.write_str("best"),
            Self::Worst => f.write_str("worst"),
            Self::MaxHeight(height) => write!(f, "{height}"),
        }
    }
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_ascii_lowercase();
        match token.as_str() {
            "best" => Ok(Self::Best),
            "worst" => Ok(Self::Worst),
            other => other
                .trim_end_matches('p')
                .parse::<u32>()
                .ok()
                .filter(|height| *height > 0)
                .map(Self::MaxHeight)
                .ok_or_else(|| format!("unknown quality `{other}` (expected best, worst or a height)")),
        }
    }
}

/// Everything the backend needs to create a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRequest {
    pub locator: String,
    pub format: FormatType,
    pub quality: Quality,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_completed_and_error_are_terminal() {
        assert!(TaskStatus::parse("completed").is_terminal());
        assert!(TaskStatus::parse("error").is_terminal());
        for token in ["queued", "downloading", "processing", "starting"] {
            assert!(!TaskStatus::parse(token).is_terminal(), "{token}");
        }
        assert_eq!(TaskStatus::parse("starting").as_str(), "starting");
    }

    #[test]
    fn quality_parses_heights() {
        assert_eq!("best".parse::<Quality>(), Ok(Quality::Best));
        assert_eq!("720p".parse::<Quality>(), Ok(Quality::MaxHeight(720)));
        assert_eq!(Quality::MaxHeight(1080).to_string(), "1080");
        assert!("0".parse::<Quality>().is_err());
        assert!("ultra".parse::<Quality>().is_err());
    }

    #[test]
    fn format_type_accepts_aliases() {
        assert_eq!("MP3".parse::<FormatType>(), Ok(FormatType::Audio));
        assert_eq!(FormatType::Video.as_str(), "video");
    }
}
