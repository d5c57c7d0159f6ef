//! Orders and the order list filter.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use super::cart::CartItem;
use super::id::OrderId;
use super::status::OrderStatus;

/// An order as listed by the order service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Customer-facing order number.
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub order_status: OrderStatus,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<CartItem>,
}

/// Accept RFC 3339 as well as the zone-less forms some services emit.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Client-side filter over the order list.
///
/// Every bound is optional and inclusive. Blank query values count as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFilter {
    #[serde(default, deserialize_with = "blank_status")]
    pub status: Option<OrderStatus>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub from: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub to: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub min_amount: Option<Decimal>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub max_amount: Option<Decimal>,
}

fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

fn blank_status<'de, D>(deserializer: D) -> Result<Option<OrderStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|raw| !raw.trim().is_empty() && !raw.eq_ignore_ascii_case("all"))
        .map(OrderStatus::from))
}

impl OrderFilter {
    /// Whether no bound is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.from.is_none()
            && self.to.is_none()
            && self.min_amount.is_none()
            && self.max_amount.is_none()
    }

    #[must_use]
    pub fn matches(&self, order: &Order) -> bool {
        let day = order.created_at.date_naive();
        self.status
            .as_ref()
            .is_none_or(|status| *status == order.order_status)
            && self.from.is_none_or(|from| day >= from)
            && self.to.is_none_or(|to| day <= to)
            && self.min_amount.is_none_or(|min| order.total_amount >= min)
            && self.max_amount.is_none_or(|max| order.total_amount <= max)
    }

    /// Keep the matching orders, preserving their order.
    #[must_use]
    pub fn apply(&self, orders: Vec<Order>) -> Vec<Order> {
        if self.is_empty() {
            return orders;
        }
        orders.into_iter().filter(|order| self.matches(order)).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn orders() -> Vec<Order> {
        serde_json::from_str(
            r#"[
                {"id": 1, "order_id": "ORD-1", "order_status": "Pending",
                 "total_amount": 499.5, "created_at": "2024-03-01T10:00:00Z"},
                {"id": 2, "order_id": "ORD-2", "order_status": "delivered",
                 "total_amount": 1500, "created_at": "2024-03-15 08:30:00"},
                {"id": 3, "order_id": "ORD-3", "order_status": "On Hold",
                 "total_amount": 80, "created_at": "2024-04-02T12:00:00.123"}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_parses_mixed_timestamps_and_statuses() {
        let orders = orders();
        assert_eq!(orders[1].order_status, OrderStatus::Delivered);
        assert_eq!(
            orders[2].order_status,
            OrderStatus::Other("On Hold".to_string())
        );
        assert_eq!(
            orders[1].created_at.date_naive(),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
        );
    }

    #[test]
    fn test_filter_by_status() {
        let filter = OrderFilter {
            status: Some(OrderStatus::Delivered),
            ..OrderFilter::default()
        };
        let kept = filter.apply(orders());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].order_id, "ORD-2");
    }

    #[test]
    fn test_filter_bounds_are_inclusive() {
        let filter = OrderFilter {
            from: NaiveDate::from_ymd_opt(2024, 3, 1),
            to: NaiveDate::from_ymd_opt(2024, 3, 15),
            min_amount: Some(Decimal::new(4995, 1)),
            ..OrderFilter::default()
        };
        let kept: Vec<_> = filter.apply(orders()).into_iter().map(|o| o.id).collect();
        assert_eq!(kept, vec![OrderId::new(1), OrderId::new(2)]);
    }

    #[test]
    fn test_blank_query_values_are_unset() {
        let filter: OrderFilter = serde_json::from_value(serde_json::json!({
            "status": "all",
            "from": "",
            "max_amount": " 1000 "
        }))
        .unwrap();
        assert!(filter.status.is_none());
        assert!(filter.from.is_none());
        assert_eq!(filter.max_amount, Some(Decimal::new(1000, 0)));
    }
}
