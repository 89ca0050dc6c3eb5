//! 纯文本 PDF 渲染
//!
//! 把 LLM 生成的简历/求职信文本排版成 A4 PDF：单一 Helvetica 字体，
//! 按字宽自动换行并分页。只覆盖 WinAnsi 字符集，其余字符替换为 `?`。

/// A4 页面尺寸（pt）
const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 50.0;
const FONT_SIZE: f32 = 12.0;
const LEADING: f32 = 14.0;

/// 正文可用宽度
const TEXT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

/// 每页行数
const LINES_PER_PAGE: usize = ((PAGE_HEIGHT - 2.0 * MARGIN) / LEADING) as usize;

/// Helvetica 字宽表（1/1000 em），覆盖 ASCII 32..=126
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

/// 渲染纯文本为 PDF 字节
pub fn render_text_pdf(text: &str) -> Vec<u8> {
    let lines = wrap_text(text, TEXT_WIDTH);
    let pages: Vec<&[String]> = if lines.is_empty() {
        vec![&lines[..]]
    } else {
        lines.chunks(LINES_PER_PAGE).collect()
    };

    let mut doc = PdfBuilder::default();
    let page_count = pages.len();
    // 对象编号：1 目录，2 页树，3 字体，之后每页占两个（页面 + 内容流）
    let page_ids: Vec<usize> = (0..page_count).map(|i| 4 + i * 2).collect();

    doc.object(1, b"<< /Type /Catalog /Pages 2 0 R >>");
    let kids = page_ids
        .iter()
        .map(|id| format!("{} 0 R", id))
        .collect::<Vec<_>>()
        .join(" ");
    doc.object(
        2,
        format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids, page_count).as_bytes(),
    );
    doc.object(
        3,
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>",
    );

    for (page_lines, page_id) in pages.iter().zip(&page_ids) {
        let content_id = page_id + 1;
        doc.object(
            *page_id,
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
                 /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
                PAGE_WIDTH, PAGE_HEIGHT, content_id
            )
            .as_bytes(),
        );

        let stream = content_stream(page_lines);
        let mut body = format!("<< /Length {} >>\nstream\n", stream.len()).into_bytes();
        body.extend_from_slice(&stream);
        body.extend_from_slice(b"\nendstream");
        doc.object(content_id, &body);
    }

    doc.finish()
}

fn content_stream(lines: &[String]) -> Vec<u8> {
    let first_baseline = PAGE_HEIGHT - MARGIN - FONT_SIZE;
    let mut out = format!(
        "BT\n/F1 {} Tf\n{} TL\n{} {} Td\n",
        FONT_SIZE, LEADING, MARGIN, first_baseline
    )
    .into_bytes();

    for line in lines {
        out.push(b'(');
        for byte in encode_win_ansi(line) {
            if matches!(byte, b'(' | b')' | b'\\') {
                out.push(b'\\');
            }
            out.push(byte);
        }
        out.extend_from_slice(b") Tj\nT*\n");
    }
    out.extend_from_slice(b"ET");
    out
}

#[derive(Default)]
struct PdfBuilder {
    buf: Vec<u8>,
    offsets: Vec<(usize, usize)>,
}

impl PdfBuilder {
    fn object(&mut self, id: usize, body: &[u8]) {
        if self.buf.is_empty() {
            self.buf.extend_from_slice(b"%PDF-1.4\n");
        }
        self.offsets.push((id, self.buf.len()));
        self.buf.extend_from_slice(format!("{} 0 obj\n", id).as_bytes());
        self.buf.extend_from_slice(body);
        self.buf.extend_from_slice(b"\nendobj\n");
    }

    fn finish(mut self) -> Vec<u8> {
        self.offsets.sort_by_key(|(id, _)| *id);
        let xref_offset = self.buf.len();
        let size = self.offsets.len() + 1;

        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", size);
        for (_, offset) in &self.offsets {
            xref.push_str(&format!("{:010} 00000 n \n", offset));
        }
        xref.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            size, xref_offset
        ));
        self.buf.extend_from_slice(xref.as_bytes());
        self.buf
    }
}

/// 字符映射到 WinAnsi 单字节
fn win_ansi_byte(c: char) -> u8 {
    match c {
        ' '..='~' => c as u8,
        '\u{a0}'..='\u{ff}' => c as u32 as u8,
        '\u{2018}' | '\u{2019}' => b'\'',
        '\u{201c}' | '\u{201d}' => b'"',
        '\u{2013}' | '\u{2014}' => b'-',
        '\u{2022}' => 0x95,
        '\t' => b' ',
        _ => b'?',
    }
}

fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(win_ansi_byte).collect()
}

fn char_width(c: char) -> f32 {
    let byte = win_ansi_byte(c);
    let units = match byte {
        32..=126 => HELVETICA_WIDTHS[(byte - 32) as usize],
        _ => 556,
    };
    units as f32 * FONT_SIZE / 1000.0
}

fn text_width(text: &str) -> f32 {
    text.chars().map(char_width).sum()
}

/// 按字宽换行，段落之间保留空行，超长单词按字符截断
pub(crate) fn wrap_text(text: &str, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.trim_end().lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };

            if text_width(&candidate) <= max_width {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }

            for c in word.chars() {
                if !current.is_empty() && text_width(&current) + char_width(c) > max_width {
                    lines.push(std::mem::take(&mut current));
                }
                current.push(c);
            }
        }
        lines.push(current);
    }

    lines
}
