//! ESC/POS command builder
//!
//! Accumulates a UTF-8 string of receipt text with ESC/POS control codes
//! inlined at the positions they take effect.

/// ESC/POS control codes emitted by this crate
///
/// These are device commands; they must stay byte-for-byte identical for
/// the target printers.
pub mod cmd {
    /// ESC @ - Initialize printer
    pub const INIT: &str = "\x1B\x40";
    /// ESC a 0 - Left alignment
    pub const ALIGN_LEFT: &str = "\x1B\x61\x00";
    /// ESC a 1 - Center alignment
    pub const ALIGN_CENTER: &str = "\x1B\x61\x01";
    /// ESC a 2 - Right alignment
    pub const ALIGN_RIGHT: &str = "\x1B\x61\x02";
    /// GS ! 0x00 - Normal text size
    pub const SIZE_NORMAL: &str = "\x1D\x21\x00";
    /// GS ! 0x11 - Double width and height
    pub const SIZE_DOUBLE: &str = "\x1D\x21\x11";
    /// ESC E 1 - Bold on
    pub const BOLD_ON: &str = "\x1B\x45\x01";
    /// ESC E 0 - Bold off
    pub const BOLD_OFF: &str = "\x1B\x45\x00";
    /// GS V 0 - Full cut
    pub const CUT: &str = "\x1D\x56\x00";
    /// ESC p 0 25 250 - Pulse drawer kick-out connector pin 2
    ///
    /// Kept as bytes: 250 is not ASCII and must not be UTF-8 encoded.
    pub const DRAWER_KICK: [u8; 5] = [0x1B, 0x70, 0x00, 0x19, 0xFA];
}

/// Character used for divider lines
pub const DIVIDER_CHAR: char = '-';

/// Display width of a string in printer columns
///
/// Receipts are printed in the printer's single-byte code page, one column
/// per character.
pub fn text_width(s: &str) -> usize {
    s.chars().count()
}

/// Leading spaces that center `text` on a line of `width` columns
pub fn center(text: &str, width: usize) -> String {
    let pad = width.saturating_sub(text_width(text)) / 2;
    format!("{}{}", " ".repeat(pad), text)
}

/// Left and right text on the same line, separated by at least one space
///
/// When both sides together exceed the width the row is allowed to overflow
/// instead of being cut.
pub fn left_right(left: &str, right: &str, width: usize) -> String {
    let used = text_width(left) + text_width(right);
    let spaces = width.saturating_sub(used).max(1);
    format!("{}{}{}", left, " ".repeat(spaces), right)
}

/// Truncate to at most `max` columns, marking the cut with "..."
pub fn ellipsize(text: &str, max: usize) -> String {
    if text_width(text) <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// Remove the control codes this crate emits, leaving printable text
///
/// Used for previews and layout checks.
pub fn strip_control_codes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\x1B' => match chars.next() {
                // ESC @
                Some('@') => {}
                // ESC p m t1 t2
                Some('p') => {
                    chars.next();
                    chars.next();
                    chars.next();
                }
                // ESC a n, ESC E n, ESC d n, ESC t n
                Some(_) => {
                    chars.next();
                }
                None => {}
            },
            // GS ! n, GS V n
            '\x1D' => {
                chars.next();
                chars.next();
            }
            _ => out.push(c),
        }
    }

    out
}

/// String-based ESC/POS command builder
///
/// The result is a UTF-8 `String`; conversion to bytes happens when the job
/// is submitted.
pub struct EscPosTextBuilder {
    buf: String,
    width: usize,
}

impl EscPosTextBuilder {
    /// Create a new text builder with specified paper width in characters
    ///
    /// Common widths:
    /// - 58mm paper: 32 characters
    /// - 80mm paper: 48 characters
    pub fn new(width: usize) -> Self {
        Self {
            buf: String::with_capacity(2048),
            width,
        }
    }

    /// Get the configured paper width
    pub fn width(&self) -> usize {
        self.width
    }

    // === Text Output ===

    /// Write raw text
    pub fn write(&mut self, s: &str) -> &mut Self {
        self.buf.push_str(s);
        self
    }

    /// Write text followed by newline
    pub fn write_line(&mut self, s: &str) -> &mut Self {
        self.buf.push_str(s);
        self.buf.push('\n');
        self
    }

    /// Write an empty line
    pub fn newline(&mut self) -> &mut Self {
        self.buf.push('\n');
        self
    }

    /// Write `lines` empty lines
    pub fn blank_lines(&mut self, lines: usize) -> &mut Self {
        for _ in 0..lines {
            self.buf.push('\n');
        }
        self
    }

    // === Printer Control ===

    /// Initialize printer (ESC @)
    pub fn init(&mut self) -> &mut Self {
        self.write(cmd::INIT)
    }

    /// Cut paper (full cut)
    pub fn cut(&mut self) -> &mut Self {
        self.write(cmd::CUT)
    }

    // === Alignment ===

    /// Align text to center
    pub fn align_center(&mut self) -> &mut Self {
        self.write(cmd::ALIGN_CENTER)
    }

    /// Align text to left (default)
    pub fn align_left(&mut self) -> &mut Self {
        self.write(cmd::ALIGN_LEFT)
    }

    /// Align text to right
    pub fn align_right(&mut self) -> &mut Self {
        self.write(cmd::ALIGN_RIGHT)
    }

    // === Text Style ===

    /// Enable bold text
    pub fn bold_on(&mut self) -> &mut Self {
        self.write(cmd::BOLD_ON)
    }

    /// Disable bold text
    pub fn bold_off(&mut self) -> &mut Self {
        self.write(cmd::BOLD_OFF)
    }

    /// Double width and height
    pub fn size_double(&mut self) -> &mut Self {
        self.write(cmd::SIZE_DOUBLE)
    }

    /// Reset to normal size
    pub fn size_reset(&mut self) -> &mut Self {
        self.write(cmd::SIZE_NORMAL)
    }

    // === Separators ===

    /// Print a full-width line of '-' characters
    pub fn dash_sep(&mut self) -> &mut Self {
        let sep = self.dash_sep_str();
        self.write_line(&sep)
    }

    pub fn dash_sep_str(&self) -> String {
        DIVIDER_CHAR.to_string().repeat(self.width)
    }

    // === Layout Helpers ===

    /// Print text centered with leading spaces (no wrapping)
    pub fn center_line(&mut self, s: &str) -> &mut Self {
        let line = center(s, self.width);
        self.write_line(&line)
    }

    /// Print left and right text on the same line
    pub fn line_lr(&mut self, left: &str, right: &str) -> &mut Self {
        let line = left_right(left, right, self.width);
        self.write_line(&line)
    }

    /// Print a `label: value` row with the label padded to `label_width`
    pub fn label_line(&mut self, label: &str, label_width: usize, value: &str) -> &mut Self {
        let line = format!("{:<label_width$}: {}", label, value);
        self.write_line(&line)
    }

    // === Build ===

    /// Finalize and return the accumulated string
    pub fn finalize(self) -> String {
        self.buf
    }

    /// Get the current buffer as a string reference
    pub fn as_str(&self) -> &str {
        &self.buf
    }
}

impl Default for EscPosTextBuilder {
    fn default() -> Self {
        Self::new(48)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_leading_spaces() {
        assert_eq!(center("ABCD", 32), format!("{}ABCD", " ".repeat(14)));
        // odd remainder rounds down
        assert_eq!(center("ABC", 32), format!("{}ABC", " ".repeat(14)));
        assert_eq!(center(&"X".repeat(32), 32), "X".repeat(32));
        // overflowing text is left untouched
        assert_eq!(center(&"X".repeat(40), 32), "X".repeat(40));
    }

    #[test]
    fn test_left_right_fills_width() {
        let row = left_right("Subtotal", "Rp 90.000", 32);
        assert_eq!(text_width(&row), 32);
        assert!(row.starts_with("Subtotal "));
        assert!(row.ends_with(" Rp 90.000"));
    }

    #[test]
    fn test_left_right_overflow_keeps_one_space() {
        let left = "L".repeat(20);
        let right = "R".repeat(20);
        let row = left_right(&left, &right, 32);
        assert_eq!(row, format!("{} {}", left, right));
        assert_eq!(text_width(&row), 41);

        // exact fit still separates
        let row = left_right(&"L".repeat(16), &"R".repeat(16), 32);
        assert_eq!(text_width(&row), 33);
    }

    #[test]
    fn test_left_right_length_property() {
        for (l, r) in [(0usize, 0usize), (5, 5), (31, 0), (0, 31), (16, 15), (30, 30)] {
            let row = left_right(&"a".repeat(l), &"b".repeat(r), 32);
            assert_eq!(text_width(&row), 32.max(l + r + 1), "l={} r={}", l, r);
        }
    }

    #[test]
    fn test_ellipsize() {
        assert_eq!(ellipsize("Topi", 30), "Topi");
        let name = "N".repeat(31);
        let cut = ellipsize(&name, 30);
        assert_eq!(cut, format!("{}...", "N".repeat(27)));
        assert_eq!(text_width(&cut), 30);
    }

    #[test]
    fn test_builder_sequence() {
        let mut b = EscPosTextBuilder::new(10);
        b.init().size_double().center_line("AB").size_reset().dash_sep().cut();

        let out = b.finalize();
        assert_eq!(
            out,
            "\x1B\x40\x1D\x21\x11    AB\n\x1D\x21\x00----------\n\x1D\x56\x00"
        );
    }

    #[test]
    fn test_label_line() {
        let mut b = EscPosTextBuilder::new(32);
        b.label_line("No", 8, "INV-1");
        assert_eq!(b.as_str(), "No      : INV-1\n");
    }

    #[test]
    fn test_strip_control_codes() {
        let mut b = EscPosTextBuilder::new(32);
        b.init()
            .align_left()
            .bold_on()
            .write("GRAND TOTAL")
            .bold_off()
            .newline()
            .cut();
        assert_eq!(strip_control_codes(b.as_str()), "GRAND TOTAL\n");
    }
}
