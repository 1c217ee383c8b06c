//! Cooldown policy over fetch outcomes (§4.H, §8 "Cooldown").

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CooldownReason {
    Status404,
    Status404Repeated,
    Status410,
    Status429,
    Tos,
}

#[derive(Debug, Clone, Copy)]
pub struct CooldownPolicy {
    pub cooldown_404_seconds: u64,
    pub cooldown_404_repeated_seconds: u64,
    pub cooldown_410_seconds: u64,
    pub cooldown_429_base_seconds: u64,
}

impl Default for CooldownPolicy {
    fn default() -> Self {
        CooldownPolicy {
            cooldown_404_seconds: 3600,
            cooldown_410_seconds: 90 * 24 * 3600,
            cooldown_429_base_seconds: 60,
            cooldown_404_repeated_seconds: 3600,
        }
    }
}

/// The cooldown imposed for one fetch outcome, given the repeat count of
/// that status on that URL so far (§4.H, §8 boundary behaviours).
pub fn cooldown_for_status(
    policy: &CooldownPolicy,
    status: u16,
    repeats_so_far: u32,
) -> Option<(u64, CooldownReason)> {
    match status {
        404 => {
            if repeats_so_far + 1 >= 3 {
                let seconds = policy.cooldown_404_repeated_seconds * 2u64.pow(repeats_so_far);
                Some((seconds, CooldownReason::Status404Repeated))
            } else {
                Some((policy.cooldown_404_seconds, CooldownReason::Status404))
            }
        }
        410 => Some((policy.cooldown_410_seconds, CooldownReason::Status410)),
        429 => {
            let seconds = policy.cooldown_429_base_seconds * 2u64.pow(repeats_so_far.min(10));
            Some((seconds, CooldownReason::Status429))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_404_imposes_base_cooldown() {
        let policy = CooldownPolicy::default();
        let (seconds, reason) = cooldown_for_status(&policy, 404, 0).unwrap();
        assert_eq!(seconds, 3600);
        assert_eq!(reason, CooldownReason::Status404);
    }

    #[test]
    fn third_404_escalates_to_repeated_reason() {
        let policy = CooldownPolicy::default();
        let (seconds, reason) = cooldown_for_status(&policy, 404, 2).unwrap();
        assert_eq!(reason, CooldownReason::Status404Repeated);
        assert_eq!(seconds, 3600 * 4);
    }

    #[test]
    fn status_410_imposes_90_day_cooldown() {
        let policy = CooldownPolicy::default();
        let (seconds, reason) = cooldown_for_status(&policy, 410, 0).unwrap();
        assert_eq!(seconds, 90 * 24 * 3600);
        assert_eq!(reason, CooldownReason::Status410);
    }

    #[test]
    fn status_429_backs_off_exponentially() {
        let policy = CooldownPolicy::default();
        let (first, _) = cooldown_for_status(&policy, 429, 0).unwrap();
        let (second, _) = cooldown_for_status(&policy, 429, 1).unwrap();
        assert_eq!(second, first * 2);
    }

    #[test]
    fn status_200_has_no_cooldown() {
        let policy = CooldownPolicy::default();
        assert!(cooldown_for_status(&policy, 200, 0).is_none());
    }
}
