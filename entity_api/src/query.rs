use chrono::{DateTime, Utc};
use entity::session_status::SessionStatus;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Select};
use std::ops::Bound;

/// Sort order on `scheduled_at`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl From<SortOrder> for sea_orm::Order {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Asc => sea_orm::Order::Asc,
            SortOrder::Desc => sea_orm::Order::Desc,
        }
    }
}

/// Filters shared by the student listings of every session kind.
///
/// Each session table has its own `status` and `scheduled_at` columns, so the filters are
/// applied through [`SessionFilters::apply`] with the columns of the entity being queried.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionFilters {
    pub status: Option<SessionStatus>,
    pub excluded_statuses: Vec<SessionStatus>,
    pub scheduled_from: Bound<DateTime<Utc>>,
    pub scheduled_until: Bound<DateTime<Utc>>,
    pub order: Option<SortOrder>,
    pub limit: Option<u64>,
}

impl Default for SessionFilters {
    fn default() -> Self {
        Self {
            status: None,
            excluded_statuses: Vec::new(),
            scheduled_from: Bound::Unbounded,
            scheduled_until: Bound::Unbounded,
            order: None,
            limit: None,
        }
    }
}

impl SessionFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: Option<SessionStatus>) -> Self {
        self.status = status;
        self
    }

    pub fn excluding(mut self, statuses: &[SessionStatus]) -> Self {
        self.excluded_statuses = statuses.to_vec();
        self
    }

    pub fn scheduled_between(
        mut self,
        from: Bound<DateTime<Utc>>,
        until: Bound<DateTime<Utc>>,
    ) -> Self {
        self.scheduled_from = from;
        self.scheduled_until = until;
        self
    }

    pub fn ordered(mut self, order: SortOrder) -> Self {
        self.order = Some(order);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Narrows `select` using the given status and scheduled_at columns of entity `E`.
    pub fn apply<E>(&self, select: Select<E>, status: E::Column, scheduled_at: E::Column) -> Select<E>
    where
        E: EntityTrait,
    {
        let mut select = select;

        if let Some(wanted) = self.status {
            select = select.filter(status.eq(wanted));
        }

        if !self.excluded_statuses.is_empty() {
            select = select.filter(status.is_not_in(self.excluded_statuses.iter().copied()));
        }

        select = match self.scheduled_from {
            Bound::Included(from) => select.filter(scheduled_at.gte(from)),
            Bound::Excluded(from) => select.filter(scheduled_at.gt(from)),
            Bound::Unbounded => select,
        };

        select = match self.scheduled_until {
            Bound::Included(until) => select.filter(scheduled_at.lte(until)),
            Bound::Excluded(until) => select.filter(scheduled_at.lt(until)),
            Bound::Unbounded => select,
        };

        if let Some(order) = self.order {
            select = select.order_by(scheduled_at, order.into());
        }

        if let Some(limit) = self.limit {
            select = select.limit(limit);
        }

        select
    }
}
