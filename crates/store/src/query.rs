use common::UserId;
use domain::OrderStatus;

/// Builder for constructing order listing queries.
///
/// Results are always returned newest-first.
#[derive(Debug, Clone, Default)]
pub struct OrderQuery {
    /// Filter by owning user.
    pub user_id: Option<UserId>,

    /// Filter by status (any of these).
    pub statuses: Option<Vec<OrderStatus>>,

    /// Exclude orders in any of these statuses.
    pub exclude_statuses: Vec<OrderStatus>,

    /// Maximum number of orders to return.
    pub limit: Option<usize>,

    /// Number of orders to skip.
    pub offset: Option<usize>,
}

impl OrderQuery {
    /// Creates a new empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query for one user's orders.
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Default::default()
        }
    }

    /// Filters by status.
    pub fn status(mut self, status: OrderStatus) -> Self {
        self.statuses.get_or_insert_with(Vec::new).push(status);
        self
    }

    /// Excludes a status.
    pub fn excluding(mut self, status: OrderStatus) -> Self {
        self.exclude_statuses.push(status);
        self
    }

    /// Limits the number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips a number of results.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Returns true if `status` passes the status filters.
    pub fn matches_status(&self, status: OrderStatus) -> bool {
        if self.exclude_statuses.contains(&status) {
            return false;
        }
        match self.statuses {
            Some(ref statuses) => statuses.contains(&status),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let user = UserId::new();
        let query = OrderQuery::for_user(user)
            .status(OrderStatus::Shipped)
            .excluding(OrderStatus::Pending)
            .limit(10)
            .offset(5);

        assert_eq!(query.user_id, Some(user));
        assert_eq!(query.statuses, Some(vec![OrderStatus::Shipped]));
        assert_eq!(query.exclude_statuses, vec![OrderStatus::Pending]);
        assert_eq!(query.limit, Some(10));
        assert_eq!(query.offset, Some(5));
    }

    #[test]
    fn test_status_filters() {
        let query = OrderQuery::new().excluding(OrderStatus::Pending);
        assert!(!query.matches_status(OrderStatus::Pending));
        assert!(query.matches_status(OrderStatus::Completed));

        let query = OrderQuery::new().status(OrderStatus::Delivered);
        assert!(query.matches_status(OrderStatus::Delivered));
        assert!(!query.matches_status(OrderStatus::Shipped));
    }
}
