use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use super::EngineError;

/// Agent commission as basis points off the nightly rate.
///
/// Domain is [0%, 100%): a full commission would zero the nightly rate,
/// so the constructors refuse it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionRate(u32);

impl CommissionRate {
    pub const fn zero() -> Self {
        Self(0)
    }

    pub fn from_basis_points(bps: u32) -> Option<Self> {
        (bps < 10_000).then_some(Self(bps))
    }

    pub fn from_percent(percent: u32) -> Option<Self> {
        Self::from_basis_points(percent * 100)
    }

    pub const fn basis_points(self) -> u32 {
        self.0
    }
}

/// Global fallback when no rule and no agent default applies: 10%.
pub const DEFAULT_COMMISSION: CommissionRate = CommissionRate(1_000);

/// One commission override. Scope narrows by which ids are present;
/// `window` is half-open `[from, until)` on the booking date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionRule {
    pub agent: Option<Ulid>,
    pub property_type: Option<Ulid>,
    pub window: Option<(NaiveDate, NaiveDate)>,
    pub rate: CommissionRate,
}

impl CommissionRule {
    fn applies(&self, agent: Ulid, property_type: Ulid, on: NaiveDate) -> bool {
        if self.agent.is_some_and(|a| a != agent) {
            return false;
        }
        if self.property_type.is_some_and(|p| p != property_type) {
            return false;
        }
        match self.window {
            Some((from, until)) => from <= on && on < until,
            None => true,
        }
    }

    /// Ranked specificity: agent+property (3) > agent (2) > property (1).
    /// Rules scoped to neither never match; the global tier is the 10%
    /// default, not a rule.
    fn specificity(&self) -> u8 {
        match (self.agent.is_some(), self.property_type.is_some()) {
            (true, true) => 3,
            (true, false) => 2,
            (false, true) => 1,
            (false, false) => 0,
        }
    }
}

/// Resolve the applicable commission for one agent, property type and
/// booking date.
///
/// Evaluation is an explicit ranked pass (most specific rank first,
/// first match wins within a rank), then the agent's default, then the
/// global default.
pub fn resolve_commission(
    rules: &[CommissionRule],
    agent: Ulid,
    property_type: Ulid,
    on: NaiveDate,
    agent_default: Option<CommissionRate>,
) -> CommissionRate {
    for rank in (1..=3u8).rev() {
        if let Some(rule) = rules
            .iter()
            .find(|r| r.specificity() == rank && r.applies(agent, property_type, on))
        {
            return rule.rate;
        }
    }
    agent_default.unwrap_or(DEFAULT_COMMISSION)
}

/// An agent as the caller knows it from the external store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub id: Ulid,
    pub approved: bool,
    pub default_rate: Option<CommissionRate>,
}

/// Resolve commission for an agent-priced booking.
///
/// An unapproved agent is refused outright, never silently priced at a
/// default rate.
pub fn resolve_for_agent(
    profile: &AgentProfile,
    rules: &[CommissionRule],
    property_type: Ulid,
    on: NaiveDate,
) -> Result<CommissionRate, EngineError> {
    if !profile.approved {
        return Err(EngineError::AgentNotApproved(profile.id));
    }
    Ok(resolve_commission(
        rules,
        profile.id,
        property_type,
        on,
        profile.default_rate,
    ))
}
