//! A minimal writer for single-page PDF documents.
//!
//! Only what invoices need is supported: left-aligned text in the two
//! standard Helvetica fonts and straight horizontal rules. The output follows
//! PDF 1.4 with an uncompressed content stream and a byte-exact cross
//! reference table.
//!
//! Page text is encoded with WinAnsiEncoding, which covers Latin-1 and a few
//! typographic characters. Scripts outside of it, such as Devanagari, cannot be
//! drawn with the standard fonts and are shown as '?'. The document title is
//! stored as UTF-16 in the document information dictionary, so it keeps every
//! character.

use std::fmt::Write;

/// A4 portrait width in points.
pub const PAGE_WIDTH: f32 = 595.0;
/// A4 portrait height in points.
pub const PAGE_HEIGHT: f32 = 842.0;

/// The fonts that can be used for text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    /// Helvetica.
    Regular,
    /// Helvetica-Bold.
    Bold,
}

impl Font {
    fn resource_name(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

/// A single page being drawn, in PDF user space (origin at the bottom left).
#[derive(Debug, Default)]
pub struct PdfPage {
    content: String,
    title: Option<String>,
}

impl PdfPage {
    /// Create an empty page.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the document title shown by PDF viewers.
    pub fn title(&mut self, title: &str) -> &mut Self {
        self.title = Some(title.to_owned());
        self
    }

    /// Draw `text` with its baseline starting at (`x`, `y`).
    ///
    /// Characters that WinAnsiEncoding cannot represent are replaced with '?',
    /// except for the rupee sign which is written as "Rs.".
    pub fn text(&mut self, x: f32, y: f32, font: Font, size: f32, text: &str) -> &mut Self {
        // Writing to a String cannot fail.
        let _ = writeln!(
            self.content,
            "BT /{} {size:.1} Tf {x:.2} {y:.2} Td ({}) Tj ET",
            font.resource_name(),
            escape_text(text)
        );
        self
    }

    /// Draw a horizontal line from `x_start` to `x_end` at height `y`.
    pub fn rule(&mut self, x_start: f32, x_end: f32, y: f32) -> &mut Self {
        let _ = writeln!(
            self.content,
            "0.5 w {x_start:.2} {y:.2} m {x_end:.2} {y:.2} l S"
        );
        self
    }

    /// Serialize the page as a complete PDF document.
    pub fn into_bytes(self) -> Vec<u8> {
        let mut objects = vec![
            "<< /Type /Catalog /Pages 2 0 R >>".to_owned(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_owned(),
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH:.0} {PAGE_HEIGHT:.0}] \
                 /Resources << /Font << /F1 4 0 R /F2 5 0 R >> >> /Contents 6 0 R >>"
            ),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_owned(),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>"
                .to_owned(),
            format!(
                "<< /Length {} >>\nstream\n{}endstream",
                self.content.len(),
                self.content
            ),
        ];

        let info = self.title.map(|title| {
            objects.push(format!("<< /Title {} >>", encode_text_string(&title)));
            objects.len()
        });

        let mut document = String::from("%PDF-1.4\n");
        let mut offsets = Vec::with_capacity(objects.len());

        for (index, object) in objects.iter().enumerate() {
            offsets.push(document.len());
            let _ = write!(document, "{} 0 obj\n{object}\nendobj\n", index + 1);
        }

        let xref_offset = document.len();
        let _ = write!(document, "xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
        for offset in offsets {
            // Each entry must be exactly 20 bytes long, including the trailing space and newline.
            let _ = write!(document, "{offset:010} 00000 n \n");
        }
        let info = info
            .map(|number| format!(" /Info {number} 0 R"))
            .unwrap_or_default();
        let _ = write!(
            document,
            "trailer\n<< /Size {} /Root 1 0 R{info} >>\nstartxref\n{xref_offset}\n%%EOF\n",
            objects.len() + 1
        );

        document.into_bytes()
    }
}

/// Encode `text` as the body of a PDF string literal in WinAnsiEncoding.
///
/// Bytes outside of printable ASCII are written as octal escapes so the
/// content stream stays ASCII.
fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '\\' | '(' | ')' => {
                escaped.push('\\');
                escaped.push(c);
            }
            ' '..='~' => escaped.push(c),
            '\u{20B9}' => escaped.push_str("Rs."),
            _ => match win_ansi_byte(c) {
                Some(byte) => {
                    let _ = write!(escaped, "\\{byte:03o}");
                }
                None => escaped.push('?'),
            },
        }
    }

    escaped
}

/// The WinAnsiEncoding code for a character above the ASCII range.
fn win_ansi_byte(c: char) -> Option<u8> {
    let byte = match c {
        '\u{A0}'..='\u{FF}' => c as u8,
        '\u{20AC}' => 0x80,
        '\u{201A}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201E}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02C6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8A,
        '\u{2039}' => 0x8B,
        '\u{0152}' => 0x8C,
        '\u{017D}' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02DC}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9A,
        '\u{203A}' => 0x9B,
        '\u{0153}' => 0x9C,
        '\u{017E}' => 0x9E,
        '\u{0178}' => 0x9F,
        _ => return None,
    };

    Some(byte)
}

/// Encode `text` as a UTF-16BE hex string with a byte order mark, the PDF
/// text string form that can hold any character.
fn encode_text_string(text: &str) -> String {
    let mut encoded = String::from("<FEFF");

    for unit in text.encode_utf16() {
        let _ = write!(encoded, "{unit:04X}");
    }

    encoded.push('>');
    encoded
}

#[cfg(test)]
mod tests {
    use super::{Font, PdfPage, encode_text_string, escape_text};

    fn render(page: PdfPage) -> String {
        String::from_utf8(page.into_bytes()).expect("PDF output should be ASCII")
    }

    #[test]
    fn escapes_special_characters() {
        assert_eq!(escape_text(r"a (b) \c"), r"a \(b\) \\c");
    }

    #[test]
    fn encodes_latin_characters_as_win_ansi() {
        assert_eq!(escape_text("Müller"), r"M\374ller");
        assert_eq!(escape_text("café – €5"), r"caf\351 \226 \2005");
    }

    #[test]
    fn writes_rupee_sign_as_rs() {
        assert_eq!(escape_text("₹100"), "Rs.100");
    }

    #[test]
    fn replaces_characters_outside_win_ansi() {
        assert_eq!(escape_text("आशा Müller\n"), r"??? M\374ller?");
    }

    #[test]
    fn title_is_utf16_with_byte_order_mark() {
        assert_eq!(encode_text_string("Aü"), "<FEFF004100FC>");
        assert_eq!(encode_text_string("आ"), "<FEFF0906>");
    }

    #[test]
    fn title_is_referenced_from_trailer() {
        let mut page = PdfPage::new();
        page.title("Invoice for आशा")
            .text(50.0, 800.0, Font::Regular, 12.0, "Hello");

        let document = render(page);

        assert!(document.contains("7 0 obj\n<< /Title <FEFF"));
        assert!(document.contains("/Info 7 0 R"));
        assert!(document.contains("/Size 8"));
    }

    #[test]
    fn document_has_header_and_trailer() {
        let mut page = PdfPage::new();
        page.text(50.0, 800.0, Font::Bold, 20.0, "Hello");

        let document = render(page);

        assert!(document.starts_with("%PDF-1.4\n"));
        assert!(document.ends_with("%%EOF\n"));
        assert!(document.contains("(Hello) Tj"));
        assert!(document.contains("/F2 20.0 Tf"));
    }

    #[test]
    fn xref_offsets_point_at_objects() {
        let mut page = PdfPage::new();
        page.text(50.0, 800.0, Font::Regular, 12.0, "Line one")
            .rule(50.0, 545.0, 790.0)
            .text(50.0, 780.0, Font::Regular, 12.0, "Line two");

        let document = render(page);

        let xref_start = document.find("xref\n").unwrap();
        let startxref: usize = document
            .rsplit("startxref\n")
            .next()
            .and_then(|tail| tail.lines().next())
            .and_then(|line| line.parse().ok())
            .unwrap();
        assert_eq!(startxref, xref_start);

        let entries: Vec<&str> = document[xref_start..]
            .lines()
            .skip(3)
            .take_while(|line| line.ends_with(" n "))
            .collect();
        assert_eq!(entries.len(), 6);

        for (index, entry) in entries.iter().enumerate() {
            assert_eq!(entry.len() + 1, 20, "xref entry {entry:?} is not 20 bytes");
            let offset: usize = entry[..10].parse().unwrap();
            let want = format!("{} 0 obj", index + 1);
            assert!(
                document[offset..].starts_with(&want),
                "offset {offset} does not point at {want}"
            );
        }
    }

    #[test]
    fn stream_length_matches_content() {
        let mut page = PdfPage::new();
        page.text(50.0, 800.0, Font::Regular, 12.0, "Some text");

        let document = render(page);

        let length: usize = document
            .split("/Length ")
            .nth(1)
            .and_then(|tail| tail.split(' ').next())
            .and_then(|number| number.parse().ok())
            .unwrap();
        let stream_start = document.find("stream\n").unwrap() + "stream\n".len();
        let stream_end = document.find("endstream").unwrap();

        assert_eq!(stream_end - stream_start, length);
    }
}
