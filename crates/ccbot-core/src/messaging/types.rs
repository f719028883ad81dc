/// Persistent quick-reply keyboard shown under the input field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplyMenu {
    pub rows: Vec<Vec<String>>,
    pub resize: bool,
    pub one_time: bool,
}

impl ReplyMenu {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self {
            rows,
            resize: true,
            one_time: false,
        }
    }

    /// Convenience for building rows out of string slices.
    pub fn from_labels(rows: &[&[&str]]) -> Self {
        Self::new(
            rows.iter()
                .map(|row| row.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().flatten().map(String::as_str)
    }
}

/// Feature flags of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    pub supports_reply_keyboards: bool,
    /// The platform can fetch a remote URL itself and deliver it as audio.
    pub supports_audio_by_url: bool,
}
