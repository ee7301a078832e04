//! Incident channel allocation.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::{IncidentError, IncidentResult, PlatformResultExt};
use crate::platform::{ChannelId, ChatPlatform, UserId};

/// Highest numeric suffix tried before giving up.
pub const MAX_CHANNEL_ATTEMPTS: u32 = 9;

/// Channel name prefix for incidents declared on `date`.
pub fn base_channel_name(date: DateTime<Utc>) -> String {
    format!("incident-{}", date.format("%Y%m%d"))
}

/// Remove repeated users, keeping the first occurrence of each.
pub fn dedup_participants<I>(users: I) -> Vec<UserId>
where
    I: IntoIterator<Item = UserId>,
{
    let mut out: Vec<UserId> = Vec::new();
    for user in users {
        if !out.contains(&user) {
            out.push(user);
        }
    }
    out
}

/// Create `<base>-N` for the lowest free N in `1..=9`, then invite everyone.
///
/// Name collisions move on to the next suffix. Any other creation failure,
/// and any invitation failure, aborts; a channel created before a failed
/// invite is left in place.
pub async fn provision_channel<P>(
    platform: &P,
    base: &str,
    participants: &[UserId],
    private: bool,
) -> IncidentResult<ChannelId>
where
    P: ChatPlatform + ?Sized,
{
    let mut channel = None;
    for n in 1..=MAX_CHANNEL_ATTEMPTS {
        let name = format!("{base}-{n}");
        match platform.create_channel(&name, private).await {
            Ok(id) => {
                info!(channel = %id, name = %name, "Created incident channel");
                channel = Some(id);
                break;
            }
            Err(e) if e.is_name_taken() => {
                debug!(name = %name, "Channel name taken, trying next suffix");
            }
            Err(e) => return Err(IncidentError::platform("failed to create incident channel", e)),
        }
    }

    let channel = channel.ok_or_else(|| IncidentError::ChannelNamesExhausted {
        base: base.to_string(),
        attempts: MAX_CHANNEL_ATTEMPTS,
    })?;

    if !participants.is_empty() {
        platform
            .invite_users(&channel, participants)
            .await
            .context("failed to invite users to incident channel")?;
    }

    Ok(channel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlatformError;
    use crate::testing::MemoryPlatform;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn users(ids: &[&str]) -> Vec<UserId> {
        ids.iter().map(|id| UserId::new(*id)).collect()
    }

    #[test]
    fn test_base_name_uses_date() {
        let date = Utc.with_ymd_and_hms(2024, 1, 1, 23, 59, 0).unwrap();
        assert_eq!(base_channel_name(date), "incident-20240101");
    }

    #[test]
    fn test_dedup_keeps_first_seen_order() {
        let deduped = dedup_participants(users(&["U2", "U1", "U2", "U3", "U1"]));
        assert_eq!(deduped, users(&["U2", "U1", "U3"]));
    }

    #[tokio::test]
    async fn test_first_free_suffix() {
        let platform = MemoryPlatform::new();
        platform.take_name("incident-20240101-1");

        let channel = provision_channel(&platform, "incident-20240101", &users(&["U1"]), false)
            .await
            .unwrap();

        assert_eq!(
            platform.channel_name(channel.as_str()),
            Some(("incident-20240101-2".to_string(), false))
        );
        assert_eq!(platform.members(channel.as_str()), users(&["U1"]));
    }

    #[tokio::test]
    async fn test_private_channel() {
        let platform = MemoryPlatform::new();
        let channel = provision_channel(&platform, "incident-20240101", &[], true)
            .await
            .unwrap();
        assert_eq!(
            platform.channel_name(channel.as_str()),
            Some(("incident-20240101-1".to_string(), true))
        );
    }

    #[tokio::test]
    async fn test_empty_participants_skip_invite() {
        let platform = MemoryPlatform::new();
        provision_channel(&platform, "incident-20240101", &[], false)
            .await
            .unwrap();
        assert_eq!(platform.invite_calls(), 0);
    }

    #[tokio::test]
    async fn test_all_names_taken() {
        let platform = MemoryPlatform::new();
        for n in 1..=9 {
            platform.take_name(&format!("incident-20240101-{n}"));
        }

        let err = provision_channel(&platform, "incident-20240101", &[], false)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            IncidentError::ChannelNamesExhausted { attempts: 9, .. }
        ));
    }

    #[tokio::test]
    async fn test_other_create_failure_aborts() {
        let platform = MemoryPlatform::new();
        platform.fail("create_channel", PlatformError::Auth("invalid_auth".into()));

        let err = provision_channel(&platform, "incident-20240101", &[], false)
            .await
            .unwrap_err();
        assert_eq!(
            err.platform_error(),
            Some(&PlatformError::Auth("invalid_auth".into()))
        );
    }

    #[tokio::test]
    async fn test_invite_failure_is_fatal() {
        let platform = MemoryPlatform::new();
        platform.fail("invite_users", PlatformError::Api("user_not_found".into()));

        let err = provision_channel(&platform, "incident-20240101", &users(&["U1"]), false)
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("failed to invite users"));
        assert!(platform.channel_named("incident-20240101-1").is_some());
    }
}
