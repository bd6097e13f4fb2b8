//! Sale receipt rendering
//!
//! Turns a [`SaleRecord`] into the ESC/POS text stream for a thermal
//! receipt. Rendering is pure: the same sale and layout always produce the
//! same output, and missing optional fields never fail the render.

use crate::escpos::{EscPosTextBuilder, ellipsize};
use crate::format::{format_currency, format_date, format_number};
use rust_decimal::Decimal;
use shared::{DiscountType, ReceiptLayout, SaleRecord};
use tracing::{debug, instrument};

/// Footer printed when the sale carries none
pub const DEFAULT_FOOTER_THANKS: &str = "Terima Kasih";
pub const DEFAULT_FOOTER_FAREWELL: &str = "Selamat Berbelanja";

/// Blank lines fed before the cut so the last line clears the cutter
const TRAILING_FEED_LINES: usize = 3;

pub struct ReceiptComposer<'a> {
    sale: &'a SaleRecord,
    layout: ReceiptLayout,
}

impl<'a> ReceiptComposer<'a> {
    pub fn new(sale: &'a SaleRecord, layout: ReceiptLayout) -> Self {
        Self { sale, layout }
    }

    #[instrument(skip_all, fields(order = %self.sale.order_number, width = self.layout.char_width()))]
    pub fn render(&self) -> String {
        let mut b = EscPosTextBuilder::new(self.layout.char_width());
        b.init();
        b.align_left();

        self.render_header(&mut b);
        self.render_metadata(&mut b);
        self.render_items(&mut b);
        self.render_totals(&mut b);
        self.render_payment(&mut b);
        self.render_footer(&mut b);

        let out = b.finalize();
        debug!(items = self.sale.items.len(), len = out.len(), "receipt rendered");
        out
    }

    fn render_header(&self, b: &mut EscPosTextBuilder) {
        let sale = self.sale;

        b.size_double();
        b.center_line(&sale.store_name);
        b.size_reset();

        if let Some(branch) = non_empty(&sale.branch_name) {
            b.center_line(branch);
        }
        if let Some(address) = non_empty(&sale.address) {
            b.center_line(address);
        }
        if let Some(phone) = non_empty(&sale.phone) {
            b.center_line(&format!("Telp: {}", phone));
        }
        b.dash_sep();
    }

    fn render_metadata(&self, b: &mut EscPosTextBuilder) {
        let sale = self.sale;
        let w = self.layout.label_width();

        b.label_line("No", w, &sale.order_number);
        b.label_line("Tanggal", w, &format_date(&sale.date));
        if let Some(cashier) = non_empty(&sale.cashier_name) {
            b.label_line("Kasir", w, cashier);
        }
        if let Some(customer) = non_empty(&sale.customer_name) {
            b.label_line("Pembeli", w, customer);
            // phone only makes sense next to a name
            if let Some(phone) = non_empty(&sale.customer_phone) {
                b.label_line("Telp", w, phone);
            }
        }
        b.dash_sep();
    }

    fn render_items(&self, b: &mut EscPosTextBuilder) {
        let max_name = self.layout.char_width().saturating_sub(2);

        for item in &self.sale.items {
            b.write_line(&ellipsize(&item.display_name(), max_name));
            b.line_lr(
                &format!(
                    "{} x {}",
                    format_number(item.qty),
                    format_currency(item.unit_price)
                ),
                &format_currency(item.subtotal),
            );
        }
    }

    fn render_totals(&self, b: &mut EscPosTextBuilder) {
        let sale = self.sale;

        b.dash_sep();
        b.line_lr("Subtotal", &format_currency(sale.subtotal));

        if let Some(discount) = sale.discount.as_ref().filter(|d| d.amount > Decimal::ZERO) {
            let label = match (discount.kind, discount.value) {
                (Some(DiscountType::Percentage), Some(value)) => {
                    format!("Diskon ({}%)", format_number(value))
                }
                _ => "Diskon".to_string(),
            };
            b.line_lr(&label, &format!("-{}", format_currency(discount.amount)));
        }

        if let Some(tax) = sale.tax.filter(|t| *t > Decimal::ZERO) {
            b.line_lr("Pajak", &format_currency(tax));
        }

        b.dash_sep();
        b.bold_on();
        b.line_lr("GRAND TOTAL", &format_currency(sale.total));
        b.bold_off();
    }

    fn render_payment(&self, b: &mut EscPosTextBuilder) {
        let sale = self.sale;
        let splits = sale.splits();

        if splits.len() > 1 {
            b.write_line("Pembayaran Split:");
            for split in splits {
                b.line_lr(
                    &format!("  {}", split.method),
                    &format_currency(split.amount),
                );
            }
        } else {
            b.line_lr(
                &format!("Bayar ({})", sale.payment_method),
                &format_currency(sale.cash_received.unwrap_or(sale.total)),
            );
        }

        if sale.is_cash_like()
            && let Some(change) = sale.change.filter(|c| *c > Decimal::ZERO)
        {
            b.line_lr("Kembali", &format_currency(change));
        }
    }

    fn render_footer(&self, b: &mut EscPosTextBuilder) {
        let (thanks, farewell) = self.footer_lines();

        b.dash_sep();
        b.center_line(thanks);
        b.newline();
        if let Some(farewell) = farewell {
            b.center_line(farewell);
        }
        b.blank_lines(TRAILING_FEED_LINES);
        b.cut();
    }

    /// First footer line always prints; the second only when the sale
    /// supplies one or carries no footer at all.
    fn footer_lines(&self) -> (&str, Option<&str>) {
        match self.sale.footer.as_deref() {
            None | Some([]) => (DEFAULT_FOOTER_THANKS, Some(DEFAULT_FOOTER_FAREWELL)),
            Some([first]) => (first.as_str(), None),
            Some([first, second, ..]) => (first.as_str(), Some(second.as_str())),
        }
    }
}

/// Render a sale into the ESC/POS receipt stream
pub fn compose_receipt(sale: &SaleRecord, layout: ReceiptLayout) -> String {
    ReceiptComposer::new(sale, layout).render()
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escpos::{cmd, strip_control_codes, text_width};
    use shared::{Discount, PaperWidth, PaymentMethod, SaleItem, SaleTimestamp, SplitPayment};

    fn rp(n: i64) -> Decimal {
        Decimal::from(n)
    }

    fn sale() -> SaleRecord {
        SaleRecord {
            store_name: "Toko Maju".into(),
            branch_name: None,
            address: None,
            phone: None,
            cashier_name: None,
            order_number: "INV-0001".into(),
            date: SaleTimestamp::Text("17/10/2026 10:15".into()),
            items: vec![SaleItem {
                name: "Topi".into(),
                variant: None,
                qty: rp(1),
                unit_price: rp(15000),
                subtotal: rp(15000),
            }],
            subtotal: rp(15000),
            discount: None,
            tax: None,
            total: rp(15000),
            payment_method: PaymentMethod::cash(),
            cash_received: Some(rp(20000)),
            change: Some(rp(5000)),
            split_payments: None,
            customer_name: None,
            customer_phone: None,
            footer: None,
        }
    }

    fn lines(sale: &SaleRecord, width: PaperWidth) -> Vec<String> {
        strip_control_codes(&compose_receipt(sale, ReceiptLayout::new(width)))
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_stream_starts_with_init_and_ends_with_cut() {
        let out = compose_receipt(&sale(), ReceiptLayout::default());
        assert!(out.starts_with(&format!("{}{}", cmd::INIT, cmd::ALIGN_LEFT)));
        assert!(out.ends_with(&format!("\n\n\n{}", cmd::CUT)));
    }

    #[test]
    fn test_store_name_double_sized_then_reset() {
        let out = compose_receipt(&sale(), ReceiptLayout::new(PaperWidth::Mm58));
        let expected = format!(
            "{}{}Toko Maju\n{}",
            cmd::SIZE_DOUBLE,
            " ".repeat((32 - 9) / 2),
            cmd::SIZE_NORMAL
        );
        assert!(out.contains(&expected));
    }

    #[test]
    fn test_render_is_deterministic() {
        let s = sale();
        let layout = ReceiptLayout::new(PaperWidth::Mm58);
        assert_eq!(compose_receipt(&s, layout), compose_receipt(&s, layout));
    }

    #[test]
    fn test_header_optional_lines() {
        let mut s = sale();
        s.branch_name = Some("Cabang Depok".into());
        s.address = Some("Jl. Margonda 1".into());
        s.phone = Some("021-555".into());

        let out = lines(&s, PaperWidth::Mm80);
        assert!(out.iter().any(|l| l.trim() == "Cabang Depok"));
        assert!(out.iter().any(|l| l.trim() == "Jl. Margonda 1"));
        assert!(out.iter().any(|l| l.trim() == "Telp: 021-555"));
    }

    #[test]
    fn test_metadata_rows() {
        let mut s = sale();
        s.cashier_name = Some("Sari".into());
        s.customer_phone = Some("0812".into());

        let out = lines(&s, PaperWidth::Mm58);
        assert!(out.contains(&"No      : INV-0001".to_string()));
        assert!(out.contains(&"Tanggal : 17/10/2026 10:15".to_string()));
        assert!(out.contains(&"Kasir   : Sari".to_string()));
        // phone without a customer name is dropped
        assert!(!out.iter().any(|l| l.contains("0812")));

        s.customer_name = Some("Budi".into());
        let out = lines(&s, PaperWidth::Mm80);
        assert!(out.contains(&"Pembeli   : Budi".to_string()));
        assert!(out.contains(&"Telp      : 0812".to_string()));
    }

    #[test]
    fn test_long_item_name_truncated() {
        let mut s = sale();
        s.items[0].name = "A".repeat(31);

        let out = lines(&s, PaperWidth::Mm58);
        let expected = format!("{}...", "A".repeat(27));
        assert!(out.contains(&expected));
        assert_eq!(text_width(&expected), 30);
    }

    #[test]
    fn test_long_item_name_truncated_on_80mm() {
        let mut s = sale();
        s.items[0].name = "C".repeat(47);

        let out = lines(&s, PaperWidth::Mm80);
        let expected = format!("{}...", "C".repeat(43));
        assert!(out.contains(&expected));
        assert_eq!(text_width(&expected), 46);
        assert!(!out.iter().any(|l| l.contains(&"C".repeat(44))));
    }

    #[test]
    fn test_item_name_at_limit_kept() {
        let mut s = sale();
        s.items[0].name = "B".repeat(30);
        let out = lines(&s, PaperWidth::Mm58);
        assert!(out.contains(&"B".repeat(30)));
    }

    #[test]
    fn test_percentage_discount_row() {
        let mut s = sale();
        s.discount = Some(Discount::percentage(rp(5000), rp(10)));

        let out = lines(&s, PaperWidth::Mm58);
        let row = out
            .iter()
            .find(|l| l.starts_with("Diskon"))
            .expect("discount row");
        assert!(row.starts_with("Diskon (10%)"));
        assert!(row.ends_with("-Rp 5.000"));
        assert_eq!(text_width(row), 32);
    }

    #[test]
    fn test_nominal_discount_row_has_no_percent() {
        let mut s = sale();
        s.discount = Some(Discount::nominal(rp(2000)));
        let out = lines(&s, PaperWidth::Mm58);
        let row = out.iter().find(|l| l.starts_with("Diskon")).unwrap();
        assert!(!row.contains('%'));
        assert!(row.ends_with("-Rp 2.000"));
    }

    #[test]
    fn test_zero_discount_and_tax_omitted() {
        let mut s = sale();
        s.discount = Some(Discount::nominal(Decimal::ZERO));
        s.tax = Some(Decimal::ZERO);
        let out = lines(&s, PaperWidth::Mm58);
        assert!(!out.iter().any(|l| l.starts_with("Diskon")));
        assert!(!out.iter().any(|l| l.starts_with("Pajak")));

        s.tax = Some(rp(1650));
        let out = lines(&s, PaperWidth::Mm58);
        assert!(out.iter().any(|l| l.starts_with("Pajak") && l.ends_with("Rp 1.650")));
    }

    #[test]
    fn test_grand_total_is_bold() {
        let out = compose_receipt(&sale(), ReceiptLayout::new(PaperWidth::Mm58));
        let row = format!(
            "{}{}\n{}",
            cmd::BOLD_ON,
            crate::escpos::left_right("GRAND TOTAL", "Rp 15.000", 32),
            cmd::BOLD_OFF
        );
        assert!(out.contains(&row));
    }

    #[test]
    fn test_transfer_suppresses_change() {
        let mut s = sale();
        s.payment_method = PaymentMethod::new("TRANSFER");
        s.cash_received = None;
        s.change = Some(rp(5000));

        let out = lines(&s, PaperWidth::Mm58);
        assert!(!out.iter().any(|l| l.starts_with("Kembali")));
        // falls back to the total when no cash amount was recorded
        assert!(out
            .iter()
            .any(|l| l.starts_with("Bayar (TRANSFER)") && l.ends_with("Rp 15.000")));
    }

    #[test]
    fn test_split_payments() {
        let mut s = sale();
        s.payment_method = PaymentMethod::new("SPLIT");
        s.cash_received = None;
        s.change = Some(rp(1000));
        s.split_payments = Some(vec![
            SplitPayment {
                method: "QRIS".into(),
                amount: rp(10000),
            },
            SplitPayment {
                method: PaymentMethod::cash(),
                amount: rp(6000),
            },
        ]);

        let out = lines(&s, PaperWidth::Mm58);
        let header = out.iter().position(|l| l == "Pembayaran Split:").unwrap();
        assert!(out[header + 1].starts_with("  QRIS") && out[header + 1].ends_with("Rp 10.000"));
        assert!(out[header + 2].starts_with("  CASH") && out[header + 2].ends_with("Rp 6.000"));
        assert!(!out.iter().any(|l| l.starts_with("Bayar")));
        // a cash split counts as cash tender
        assert!(out.iter().any(|l| l.starts_with("Kembali") && l.ends_with("Rp 1.000")));
    }

    #[test]
    fn test_single_split_uses_plain_payment_row() {
        let mut s = sale();
        s.split_payments = Some(vec![SplitPayment {
            method: PaymentMethod::cash(),
            amount: rp(15000),
        }]);
        let out = lines(&s, PaperWidth::Mm58);
        assert!(!out.iter().any(|l| l == "Pembayaran Split:"));
        assert!(out.iter().any(|l| l.starts_with("Bayar (CASH)") && l.ends_with("Rp 20.000")));
    }

    #[test]
    fn test_default_footer() {
        let out = lines(&sale(), PaperWidth::Mm58);
        let thanks = out.iter().position(|l| l.trim() == "Terima Kasih").unwrap();
        assert_eq!(out[thanks], format!("{}Terima Kasih", " ".repeat(10)));
        assert_eq!(out[thanks + 1], "");
        assert_eq!(out[thanks + 2].trim(), "Selamat Berbelanja");
    }

    #[test]
    fn test_custom_footer() {
        let mut s = sale();
        s.footer = Some(vec!["Barang tidak dapat ditukar".into()]);
        let out = lines(&s, PaperWidth::Mm58);
        assert!(out.iter().any(|l| l.trim() == "Barang tidak dapat ditukar"));
        assert!(!out.iter().any(|l| l.contains("Selamat Berbelanja")));

        s.footer = Some(vec!["Makasih".into(), "Sampai jumpa".into()]);
        let out = lines(&s, PaperWidth::Mm58);
        assert!(out.iter().any(|l| l.trim() == "Makasih"));
        assert!(out.iter().any(|l| l.trim() == "Sampai jumpa"));
    }

    #[test]
    fn test_input_not_mutated() {
        let s = sale();
        let before = s.clone();
        let _ = compose_receipt(&s, ReceiptLayout::default());
        assert_eq!(s, before);
    }
}
