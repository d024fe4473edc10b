//! Fallback Encoder — writes a minimal single-page PDF without any engine.
//!
//! Used when LaTeX is unavailable or fails. Only the literal text survives:
//! one line of Helvetica per input line, fixed leading, left aligned. The
//! document always has the same five objects, written in order with their
//! byte offsets recorded for the cross-reference table:
//!
//! | # | object |
//! |---|--------|
//! | 1 | Catalog |
//! | 2 | Pages |
//! | 3 | Page (US Letter) |
//! | 4 | Font (Type1 Helvetica, WinAnsiEncoding) |
//! | 5 | Content stream |

use std::fmt::Write as _;

const PAGE_WIDTH: u32 = 612;
const PAGE_HEIGHT: u32 = 792;
const MARGIN_LEFT: u32 = 54;
const FIRST_BASELINE: u32 = 740;
const MARGIN_BOTTOM: u32 = 54;
const FONT_SIZE: u32 = 10;
const LINE_HEIGHT: u32 = 14;
/// Helvetica at 10pt fits roughly this many average characters across the page.
const WRAP_COLUMNS: usize = 100;
/// Lines that fit between the first baseline and the bottom margin.
const MAX_LINES: usize = ((FIRST_BASELINE - MARGIN_BOTTOM) / LINE_HEIGHT) as usize + 1;

/// Encodes `text` as a one-page PDF. Infallible for any input.
///
/// Every newline becomes its own `Td` move; string operands never contain raw
/// line breaks. Text beyond one page is cut and the last visible line says how
/// many lines were dropped.
pub fn encode_minimal_pdf(text: &str) -> Vec<u8> {
    let content = content_stream(text);

    let mut stream = format!("<< /Length {} >>\nstream\n", content.len()).into_bytes();
    stream.extend_from_slice(&content);
    stream.extend_from_slice(b"\nendstream");

    let objects: [Vec<u8>; 5] = [
        b"<< /Type /Catalog /Pages 2 0 R >>".to_vec(),
        b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_vec(),
        format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
             /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>"
        )
        .into_bytes(),
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_vec(),
        stream,
    ];

    write_document(&objects)
}

/// Serializes numbered objects plus xref table and trailer.
fn write_document(objects: &[Vec<u8>]) -> Vec<u8> {
    let mut pdf = Vec::with_capacity(1024 + objects.iter().map(Vec::len).sum::<usize>());
    pdf.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

    let mut offsets = Vec::with_capacity(objects.len());
    for (index, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n", index + 1).as_bytes());
        pdf.extend_from_slice(body);
        pdf.extend_from_slice(b"\nendobj\n");
    }

    let xref_start = pdf.len();
    let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in &offsets {
        let _ = writeln!(xref, "{offset:010} 00000 n ");
    }
    let _ = write!(
        xref,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_start}\n%%EOF\n",
        objects.len() + 1
    );
    pdf.extend_from_slice(xref.as_bytes());
    pdf
}

fn content_stream(text: &str) -> Vec<u8> {
    let mut out = format!(
        "BT\n/F1 {FONT_SIZE} Tf\n{MARGIN_LEFT} {FIRST_BASELINE} Td\n"
    )
    .into_bytes();

    let mut lines: Vec<String> = text
        .split('\n')
        .flat_map(|line| wrap(&line.replace('\t', "    "), WRAP_COLUMNS))
        .collect();
    if lines.len() > MAX_LINES {
        let dropped = lines.len() - (MAX_LINES - 1);
        lines.truncate(MAX_LINES - 1);
        lines.push(format!("... ({dropped} more lines truncated)"));
    }

    for (index, line) in lines.iter().enumerate() {
        if index > 0 {
            out.extend_from_slice(format!("0 -{LINE_HEIGHT} Td\n").as_bytes());
        }
        out.push(b'(');
        out.extend_from_slice(&pdf_string(line));
        out.extend_from_slice(b") Tj\n");
    }
    out.extend_from_slice(b"ET");
    out
}

/// Breaks `line` at spaces so no piece exceeds `width` characters; words
/// longer than `width` are split hard. Always yields at least one piece.
fn wrap(line: &str, width: usize) -> Vec<String> {
    let line = line.trim_end_matches('\r');
    if line.chars().count() <= width {
        return vec![line.to_string()];
    }

    let mut pieces = Vec::new();
    let mut current = String::new();
    for word in line.split(' ') {
        let mut word = word.to_string();
        while word.chars().count() > width {
            if !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
            }
            let split = word.char_indices().nth(width).map(|(i, _)| i).unwrap_or(word.len());
            let rest = word.split_off(split);
            pieces.push(word);
            word = rest;
        }
        let needed = if current.is_empty() { 0 } else { 1 } + word.chars().count();
        if !current.is_empty() && current.chars().count() + needed > width {
            pieces.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() || pieces.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Encodes one line as the body of a PDF literal string in WinAnsiEncoding.
///
/// `\`, `(` and `)` are escaped, bytes outside printable ASCII are written
/// as octal escapes, control characters are dropped and anything WinAnsi
/// cannot show becomes `?`.
fn pdf_string(line: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(line.len());
    for c in line.chars() {
        match c {
            '\\' => out.extend_from_slice(b"\\\\"),
            '(' => out.extend_from_slice(b"\\("),
            ')' => out.extend_from_slice(b"\\)"),
            ' '..='~' => out.push(c as u8),
            c if c.is_control() => {}
            c => {
                let byte = win_ansi(c).unwrap_or(b'?');
                if byte.is_ascii() {
                    out.push(byte);
                } else {
                    out.extend_from_slice(format!("\\{byte:03o}").as_bytes());
                }
            }
        }
    }
    out
}

/// WinAnsiEncoding byte for a non-ASCII character, where one exists.
fn win_ansi(c: char) -> Option<u8> {
    let byte = match c {
        '\u{00A0}'..='\u{00FF}' => c as u32 as u8,
        '€' => 0x80,
        '‚' => 0x82,
        '„' => 0x84,
        '…' => 0x85,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '™' => 0x99,
        _ => return None,
    };
    Some(byte)
}
