use std::future::Future;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::errors::error::VcxResult;

/// Whether an exchange continues without the application approving each step.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum AutoAcceptPolicy {
    Always,
    /// Only when the incoming message matches what this agent sent before.
    ContentApproved,
    #[default]
    Never,
}

/// The per record override wins over the agent wide setting.
pub fn compose_auto_accept(
    record_override: Option<AutoAcceptPolicy>,
    global: AutoAcceptPolicy,
) -> AutoAcceptPolicy {
    record_override.unwrap_or(global)
}

/// Decides whether to answer an incoming message right away.
///
/// `counterpart` is the message this agent previously sent on the thread;
/// `content_matches` compares it with the incoming one and is only invoked
/// for [`AutoAcceptPolicy::ContentApproved`].
pub async fn should_auto_respond<M, F, Fut>(
    policy: AutoAcceptPolicy,
    counterpart: Option<M>,
    content_matches: F,
) -> VcxResult<bool>
where
    F: FnOnce(M) -> Fut,
    Fut: Future<Output = VcxResult<bool>>,
{
    match policy {
        AutoAcceptPolicy::Always => Ok(true),
        AutoAcceptPolicy::Never => Ok(false),
        AutoAcceptPolicy::ContentApproved => match counterpart {
            None => Ok(false),
            Some(counterpart) => content_matches(counterpart).await,
        },
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    const POLICIES: [AutoAcceptPolicy; 3] = [
        AutoAcceptPolicy::Always,
        AutoAcceptPolicy::ContentApproved,
        AutoAcceptPolicy::Never,
    ];

    #[test]
    fn test_override_wins_over_global() {
        for record_override in POLICIES {
            for global in POLICIES {
                assert_eq!(
                    compose_auto_accept(Some(record_override), global),
                    record_override
                );
            }
            assert_eq!(compose_auto_accept(None, record_override), record_override);
        }
    }

    #[tokio::test]
    async fn test_decision_table() {
        for (policy, counterpart, equal, expected) in [
            (AutoAcceptPolicy::Always, None, false, true),
            (AutoAcceptPolicy::Always, Some(1), false, true),
            (AutoAcceptPolicy::Never, Some(1), true, false),
            (AutoAcceptPolicy::ContentApproved, None, true, false),
            (AutoAcceptPolicy::ContentApproved, Some(1), false, false),
            (AutoAcceptPolicy::ContentApproved, Some(1), true, true),
        ] {
            let decision = should_auto_respond(policy, counterpart, |_| async move { Ok(equal) })
                .await
                .unwrap();
            assert_eq!(decision, expected, "{policy} {counterpart:?} {equal}");
        }
    }

    #[test]
    fn test_policy_names() {
        assert_eq!(
            serde_json::to_value(AutoAcceptPolicy::ContentApproved).unwrap(),
            "contentApproved"
        );
        assert_eq!(
            AutoAcceptPolicy::from_str("always").unwrap(),
            AutoAcceptPolicy::Always
        );
        assert_eq!(AutoAcceptPolicy::default(), AutoAcceptPolicy::Never);
    }
}
