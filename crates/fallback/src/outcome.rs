use serde::Serialize;

/// Result of a best-effort call: the real value, or a fallback with the
/// reason the real value could not be produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome<T> {
    Ok { value: T },
    Degraded { value: T, reason: String },
}

impl<T> Outcome<T> {
    pub fn ok(value: T) -> Self {
        Outcome::Ok { value }
    }

    pub fn degraded(value: T, reason: impl Into<String>) -> Self {
        Outcome::Degraded {
            value,
            reason: reason.into(),
        }
    }

    pub fn value(&self) -> &T {
        match self {
            Outcome::Ok { value } | Outcome::Degraded { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Outcome::Ok { value } | Outcome::Degraded { value, .. } => value,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Outcome::Degraded { .. })
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Outcome::Ok { .. } => None,
            Outcome::Degraded { reason, .. } => Some(reason),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Ok { value } => Outcome::Ok { value: f(value) },
            Outcome::Degraded { value, reason } => Outcome::Degraded {
                value: f(value),
                reason,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let ok = Outcome::ok(3);
        assert_eq!(*ok.value(), 3);
        assert!(!ok.is_degraded());
        assert_eq!(ok.reason(), None);

        let degraded = Outcome::degraded(4, "timeout").map(|v| v * 2);
        assert_eq!(degraded.reason(), Some("timeout"));
        assert_eq!(degraded.into_value(), 8);
    }
}
