//! Event gate: which deliveries are worth a pipeline run.

/// Event type that can trigger an update.
pub const PULL_REQUEST_EVENT: &str = "pull_request";

/// Pull-request actions that can trigger an update.
pub const TRIGGER_ACTIONS: [&str; 3] = ["opened", "reopened", "synchronize"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    Ignore { reason: String },
}

/// Pure decision on `(event_type, action)`.
pub fn evaluate(event_type: &str, action: &str) -> GateDecision {
    if event_type != PULL_REQUEST_EVENT {
        return GateDecision::Ignore {
            reason: format!("event '{event_type}' is not handled"),
        };
    }
    if !TRIGGER_ACTIONS.contains(&action) {
        return GateDecision::Ignore {
            reason: format!("pull_request action '{action}' is not handled"),
        };
    }
    GateDecision::Proceed
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("opened")]
    #[case("reopened")]
    #[case("synchronize")]
    fn trigger_actions_proceed(#[case] action: &str) {
        assert_eq!(evaluate("pull_request", action), GateDecision::Proceed);
    }

    #[rstest]
    #[case("pull_request", "closed")]
    #[case("pull_request", "labeled")]
    #[case("pull_request", "")]
    #[case("pull_request", "Opened")]
    #[case("push", "opened")]
    #[case("ping", "")]
    #[case("", "synchronize")]
    fn everything_else_is_ignored(#[case] event_type: &str, #[case] action: &str) {
        assert!(matches!(
            evaluate(event_type, action),
            GateDecision::Ignore { .. }
        ));
    }
}
