/// Lifecycle status of an API key.
///
/// `Revoked` and `Expired` are terminal: no transition ever leaves them.
/// `Expired` is reserved for time-bound keys; nothing expires keys yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStatus {
    Active,
    Revoked,
    Expired,
}

impl KeyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyStatus::Active => "active",
            KeyStatus::Revoked => "revoked",
            KeyStatus::Expired => "expired",
        }
    }

    /// Unknown status strings are treated as revoked so a corrupted row can
    /// never authenticate.
    pub fn from_str(s: &str) -> Self {
        match s {
            "active" => KeyStatus::Active,
            "expired" => KeyStatus::Expired,
            _ => KeyStatus::Revoked,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, KeyStatus::Active)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }
}

impl std::fmt::Display for KeyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
