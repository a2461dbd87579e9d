use std::str::FromStr;

/// How a hostname is compared against the restricted-upstream pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HostMatch {
    /// The host equals the pattern or is a subdomain of it.
    #[default]
    Suffix,
    /// The host contains the pattern anywhere. Also matches look-alike
    /// domains such as `media.example.attacker.net`.
    Contains,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown host match mode {0:?}, expected `suffix` or `contains`")]
pub struct UnknownHostMatch(String);

impl FromStr for HostMatch {
    type Err = UnknownHostMatch;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "suffix" => Ok(Self::Suffix),
            "contains" => Ok(Self::Contains),
            other => Err(UnknownHostMatch(other.to_string())),
        }
    }
}

/// Hostname pattern selecting the restricted upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPattern {
    pattern: String,
    mode: HostMatch,
}

impl HostPattern {
    pub fn new(pattern: impl Into<String>, mode: HostMatch) -> Self {
        let pattern = pattern.into();
        Self {
            pattern: pattern.trim().trim_end_matches('.').to_ascii_lowercase(),
            mode,
        }
    }

    pub fn mode(&self) -> HostMatch {
        self.mode
    }

    pub fn matches(&self, host: &str) -> bool {
        if self.pattern.is_empty() {
            return false;
        }

        let host = host.trim_end_matches('.').to_ascii_lowercase();
        match self.mode {
            HostMatch::Contains => host.contains(&self.pattern),
            HostMatch::Suffix => {
                host == self.pattern
                    || host
                        .strip_suffix(&self.pattern)
                        .is_some_and(|prefix| prefix.ends_with('.'))
            }
        }
    }
}
