use std::fmt;
use std::str::FromStr;

/// Output format requested from the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    #[default]
    Mp4,
    Mp3,
    Wav,
    Jpg,
    Png,
}

impl Format {
    pub const ALL: [Format; 5] = [
        Format::Mp4,
        Format::Mp3,
        Format::Wav,
        Format::Jpg,
        Format::Png,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Format::Mp4 => "mp4",
            Format::Mp3 => "mp3",
            Format::Wav => "wav",
            Format::Jpg => "jpg",
            Format::Png => "png",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim();
        Format::ALL
            .into_iter()
            .find(|format| format.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unsupported format '{wanted}'"))
    }
}

/// One entry of the quality selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityOption {
    pub value: &'static str,
    pub label: &'static str,
}

const fn option(value: &'static str, label: &'static str) -> QualityOption {
    QualityOption { value, label }
}

const VIDEO_QUALITIES: [QualityOption; 7] = [
    option("2160p", "4K (2160p)"),
    option("1440p", "2K (1440p)"),
    option("1080p", "Full HD (1080p)"),
    option("720p", "HD (720p)"),
    option("480p", "SD (480p)"),
    option("360p", "Low (360p)"),
    option("best", "Best Available"),
];

const AUDIO_QUALITIES: [QualityOption; 5] = [
    option("320kbps", "320 kbps (Best)"),
    option("256kbps", "256 kbps"),
    option("192kbps", "192 kbps"),
    option("128kbps", "128 kbps"),
    option("best", "Best Available"),
];

const OTHER_QUALITIES: [QualityOption; 1] = [option("best", "Best Available")];

/// Quality options offered for a format, in display order.
pub fn quality_options(format: Format) -> &'static [QualityOption] {
    match format {
        Format::Mp4 => &VIDEO_QUALITIES,
        Format::Mp3 | Format::Wav => &AUDIO_QUALITIES,
        Format::Jpg | Format::Png => &OTHER_QUALITIES,
    }
}

/// The option pre-selected when a format is chosen.
pub fn default_quality(format: Format) -> &'static str {
    match format {
        Format::Mp4 => "1080p",
        Format::Mp3 | Format::Wav => "192kbps",
        Format::Jpg | Format::Png => "best",
    }
}

pub(crate) fn is_quality_offered(format: Format, value: &str) -> bool {
    quality_options(format)
        .iter()
        .any(|option| option.value == value)
}
