//! Fixed print payloads: printer test page and cash drawer kick

use crate::escpos::{EscPosTextBuilder, cmd};
use crate::format::format_datetime;
use chrono::NaiveDateTime;
use shared::{PrinterId, ReceiptLayout};

/// Self-describing test page naming the printer and the time it was sent
pub fn test_page(printer: &PrinterId, at: &NaiveDateTime, layout: ReceiptLayout) -> String {
    let mut b = EscPosTextBuilder::new(layout.char_width());
    b.init();
    b.align_center();
    b.size_double();
    b.write_line("TEST PRINT");
    b.size_reset();
    b.dash_sep();
    b.write_line("Printer berhasil terhubung!");
    b.write_line(&format!("Printer: {}", printer));
    b.write_line(&format!("Waktu: {}", format_datetime(at)));
    b.blank_lines(3);
    b.align_left();
    b.cut();
    b.finalize()
}

/// Drawer kick-out pulse (pin 2)
pub fn cash_drawer_kick() -> Vec<u8> {
    cmd::DRAWER_KICK.to_vec()
}
