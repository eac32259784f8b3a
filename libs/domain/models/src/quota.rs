//! [libs/domain/models/src/quota.rs]
//! Cuotas de grupo (presupuesto en placa-segundos) y el uso derivado por
//! trabajo que el QuotaManager consolida contra ellas.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupQuota {
    pub group_id: i64,
    /// `None` = sin limite.
    pub quota: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobUsage {
    pub job_id: i64,
    pub group_id: i64,
    pub quota_used: i64,
    pub accounted_for: bool,
}

impl GroupQuota {
    /// Resta `amount` del remanente, con piso en cero (spec §4.F: "subtract
    /// quota_used from user_groups.quota (floored at zero)"). Sin efecto
    /// sobre grupos ilimitados.
    pub fn consume(&mut self, amount: i64) {
        if let Some(remaining) = self.quota.as_mut() {
            *remaining = (*remaining - amount).max(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_floors_at_zero() {
        let mut quota = GroupQuota { group_id: 1, quota: Some(10) };
        quota.consume(30);
        assert_eq!(quota.quota, Some(0));
    }

    #[test]
    fn unlimited_quota_is_unaffected() {
        let mut quota = GroupQuota { group_id: 1, quota: None };
        quota.consume(1_000_000);
        assert_eq!(quota.quota, None);
    }
}
