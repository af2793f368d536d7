//! Built-in HTML email templates with `${name}` placeholders.

/// The emails sent by the checkout services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    StatusChange,
    Cancellation,
    OrderPlaced,
}

const STATUS_CHANGE: &str = r#"<!DOCTYPE html>
<html>
  <body style="font-family: sans-serif; color: #222;">
    <h2>${storeName}</h2>
    <p>Hi ${username},</p>
    <p>The status of your order <strong>${orderRef}</strong> has changed to <strong>${newStatus}</strong>.</p>
    <p><a href="${redirectUrl}">View your order</a></p>
  </body>
</html>
"#;

const CANCELLATION: &str = r#"<!DOCTYPE html>
<html>
  <body style="font-family: sans-serif; color: #222;">
    <h2>${storeName}</h2>
    <p>Hi ${username},</p>
    <p>Your order <strong>${orderRef}</strong> has been cancelled.</p>
    <p>If you already paid, the amount of ${amount} will be refunded to your original payment method.</p>
    <p><a href="${redirectUrl}">View your order</a></p>
  </body>
</html>
"#;

const ORDER_PLACED: &str = r#"<!DOCTYPE html>
<html>
  <body style="font-family: sans-serif; color: #222;">
    <h2>${storeName}</h2>
    <p>Hi ${username},</p>
    <p>Thank you for your order <strong>${orderRef}</strong> of ${amount}.</p>
    <p>Expected delivery: ${deliveryDate}</p>
    <p><a href="${redirectUrl}">Track your order</a></p>
  </body>
</html>
"#;

impl Template {
    pub fn subject(&self) -> &'static str {
        match self {
            Template::StatusChange => "Order Status Change",
            Template::Cancellation => "Cancel Order",
            Template::OrderPlaced => "Order Confirmation",
        }
    }

    fn source(&self) -> &'static str {
        match self {
            Template::StatusChange => STATUS_CHANGE,
            Template::Cancellation => CANCELLATION,
            Template::OrderPlaced => ORDER_PLACED,
        }
    }

    /// Substitutes every `${key}`. Unknown placeholders are left as they are.
    pub fn render(&self, placeholders: &[(&str, String)]) -> String {
        render(self.source(), placeholders)
    }
}

pub fn render(template: &str, placeholders: &[(&str, String)]) -> String {
    placeholders
        .iter()
        .fold(template.to_string(), |html, (key, value)| {
            html.replace(&format!("${{{key}}}"), value)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_all_occurrences() {
        let out = render("${a} and ${a} but ${b}", &[("a", "x".to_string())]);
        assert_eq!(out, "x and x but ${b}");
    }

    #[test]
    fn test_status_change_template() {
        let html = Template::StatusChange.render(&[
            ("storeName", "Shop".to_string()),
            ("username", "asha".to_string()),
            ("orderRef", "ORD-1".to_string()),
            ("newStatus", "SHIPPED".to_string()),
            ("redirectUrl", "http://shop/orders/1".to_string()),
        ]);
        assert!(html.contains("<strong>SHIPPED</strong>"));
        assert!(html.contains("href=\"http://shop/orders/1\""));
        assert!(!html.contains("${"));
    }

    #[test]
    fn test_subjects() {
        assert_eq!(Template::StatusChange.subject(), "Order Status Change");
        assert_eq!(Template::Cancellation.subject(), "Cancel Order");
    }
}
