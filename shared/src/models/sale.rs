//! Sale Record Model

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Payment method code as recorded by the till ("CASH", "TRANSFER", "QRIS", ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentMethod(pub String);

impl PaymentMethod {
    /// Designator used for cash tender
    pub const CASH: &'static str = "CASH";

    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn cash() -> Self {
        Self(Self::CASH.to_string())
    }

    pub fn is_cash(&self) -> bool {
        self.0 == Self::CASH
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PaymentMethod {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

/// How a discount was entered at the till
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    Percentage,
    Nominal,
}

/// Order-level discount
///
/// `amount` is always the money taken off; `value` is what the cashier typed
/// (the percentage for `Percentage`, the nominal for `Nominal`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discount {
    pub amount: Decimal,
    #[serde(default, rename = "type")]
    pub kind: Option<DiscountType>,
    #[serde(default)]
    pub value: Option<Decimal>,
}

impl Discount {
    pub fn nominal(amount: Decimal) -> Self {
        Self {
            amount,
            kind: Some(DiscountType::Nominal),
            value: Some(amount),
        }
    }

    pub fn percentage(amount: Decimal, percent: Decimal) -> Self {
        Self {
            amount,
            kind: Some(DiscountType::Percentage),
            value: Some(percent),
        }
    }
}

/// One tender of a split payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitPayment {
    pub method: PaymentMethod,
    pub amount: Decimal,
}

/// Sale timestamp
///
/// Text coming from the backend is printed as-is; a local wall-clock time is
/// rendered `dd/mm/yyyy hh:mm`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SaleTimestamp {
    Text(String),
    Local(NaiveDateTime),
}

impl From<&str> for SaleTimestamp {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<NaiveDateTime> for SaleTimestamp {
    fn from(at: NaiveDateTime) -> Self {
        Self::Local(at)
    }
}

/// Sold line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub name: String,
    #[serde(default)]
    pub variant: Option<String>,
    pub qty: Decimal,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

impl SaleItem {
    /// Name as printed, with the variant appended when present
    pub fn display_name(&self) -> String {
        match self.variant.as_deref().filter(|v| !v.is_empty()) {
            Some(variant) => format!("{} ({})", self.name, variant),
            None => self.name.clone(),
        }
    }
}

/// Completed sale, as handed to the receipt printer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRecord {
    pub store_name: String,
    #[serde(default)]
    pub branch_name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub cashier_name: Option<String>,
    pub order_number: String,
    pub date: SaleTimestamp,
    #[serde(default)]
    pub items: Vec<SaleItem>,
    pub subtotal: Decimal,
    #[serde(default)]
    pub discount: Option<Discount>,
    #[serde(default)]
    pub tax: Option<Decimal>,
    pub total: Decimal,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub cash_received: Option<Decimal>,
    #[serde(default)]
    pub change: Option<Decimal>,
    #[serde(default)]
    pub split_payments: Option<Vec<SplitPayment>>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub footer: Option<Vec<String>>,
}

impl SaleRecord {
    /// Split tenders, empty when the sale was paid with a single method
    pub fn splits(&self) -> &[SplitPayment] {
        self.split_payments.as_deref().unwrap_or(&[])
    }

    /// Cash was involved, either as the payment method or one of the splits
    pub fn is_cash_like(&self) -> bool {
        self.payment_method.is_cash() || self.splits().iter().any(|p| p.method.is_cash())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(n: i64) -> Decimal {
        Decimal::from(n)
    }

    #[test]
    fn test_deserialize_dashboard_payload() {
        let json = r#"{
            "storeName": "Toko Maju",
            "orderNumber": "INV-001",
            "date": "17/10/2026 10:15",
            "items": [
                {"name": "Topi", "qty": 1, "unitPrice": 15000, "subtotal": 15000}
            ],
            "subtotal": 15000,
            "discount": {"amount": 1500, "type": "PERCENTAGE", "value": 10},
            "total": 13500,
            "paymentMethod": "CASH",
            "cashReceived": 20000,
            "change": 6500
        }"#;

        let sale: SaleRecord = serde_json::from_str(json).unwrap();
        assert_eq!(sale.store_name, "Toko Maju");
        assert_eq!(sale.date, SaleTimestamp::Text("17/10/2026 10:15".into()));
        assert_eq!(sale.items[0].unit_price, dec(15000));
        let discount = sale.discount.unwrap();
        assert_eq!(discount.kind, Some(DiscountType::Percentage));
        assert_eq!(discount.value, Some(dec(10)));
        assert!(sale.payment_method.is_cash());
        assert!(sale.split_payments.is_none());
    }

    #[test]
    fn test_cash_like_via_split() {
        let mut sale: SaleRecord = serde_json::from_str(
            r#"{"storeName":"A","orderNumber":"1","date":"x","subtotal":0,"total":0,"paymentMethod":"SPLIT"}"#,
        )
        .unwrap();
        assert!(!sale.is_cash_like());

        sale.split_payments = Some(vec![
            SplitPayment {
                method: "QRIS".into(),
                amount: dec(5000),
            },
            SplitPayment {
                method: PaymentMethod::cash(),
                amount: dec(5000),
            },
        ]);
        assert!(sale.is_cash_like());
    }

    #[test]
    fn test_display_name_with_variant() {
        let item = SaleItem {
            name: "Kaos".into(),
            variant: Some("XL".into()),
            qty: dec(1),
            unit_price: dec(1),
            subtotal: dec(1),
        };
        assert_eq!(item.display_name(), "Kaos (XL)");
    }
}
