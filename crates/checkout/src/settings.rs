//! Runtime settings for the checkout services.

use std::time::Duration;

/// Settings shared by the checkout services.
#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    /// ISO currency code sent to the payment gateway.
    pub currency: String,
    /// Shown on the gateway checkout form and in emails.
    pub store_name: String,
    /// Where the gateway redirects after payment.
    pub callback_url: String,
    /// Base URL used for links in emails.
    pub frontend_url: String,
    /// How long an unpaid online order is held.
    pub payment_window: chrono::Duration,
    pub delivery_days: i64,
    pub gateway_timeout: Duration,
    pub mail_timeout: Duration,
    pub sweep_interval: Duration,
}

impl CheckoutSettings {
    /// Link to an order's page on the storefront.
    pub fn order_url(&self, order_id: impl std::fmt::Display) -> String {
        format!("{}/orders/{order_id}", self.frontend_url.trim_end_matches('/'))
    }
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            currency: "INR".to_string(),
            store_name: "Storefront".to_string(),
            callback_url: "http://localhost:3000/payments/verify".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            payment_window: chrono::Duration::minutes(10),
            delivery_days: domain::DEFAULT_DELIVERY_DAYS,
            gateway_timeout: Duration::from_secs(10),
            mail_timeout: Duration::from_secs(5),
            sweep_interval: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = CheckoutSettings::default();
        assert_eq!(settings.currency, "INR");
        assert_eq!(settings.payment_window, chrono::Duration::minutes(10));
        assert_eq!(settings.delivery_days, 5);
        assert_eq!(settings.sweep_interval, Duration::from_secs(30));
    }

    #[test]
    fn test_order_url_trims_trailing_slash() {
        let settings = CheckoutSettings {
            frontend_url: "https://shop.example/".to_string(),
            ..CheckoutSettings::default()
        };
        assert_eq!(settings.order_url("abc"), "https://shop.example/orders/abc");
    }
}
