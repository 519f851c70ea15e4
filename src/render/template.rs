//! Pure template renderer: (LayoutSchema, ReceiptData) → SVG document.
//!
//! The output is deterministic: identical inputs produce byte-identical
//! markup. Missing optional layout fields fall back to the defaults the
//! original receipts used; absent required sections are a caller contract
//! violation handled at the deserialization boundary, not here.

use std::fmt::Write as FmtWrite;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::{
    layout::{ColumnSpec, LayoutSchema},
    receipt::ReceiptData,
    types::{Alignment, FontWeight, HeaderField, TotalsField, TotalsPosition},
};

const DEFAULT_PRIMARY_COLOR: &str = "#000000";
const DEFAULT_SECONDARY_COLOR: &str = "#666666";
const DEFAULT_TEXT_COLOR: &str = "#000000";
const DEFAULT_FONT_FAMILY: &str = "Inter";
const DEFAULT_FOOTER_FONT_SIZE: f32 = 12.0;
const DEFAULT_FOOTER_TEXT: &str = "Thank you for your business!";

const LINE_HEIGHT: f32 = 1.2;
const LOGO_WIDTH: f32 = 120.0;
const LOGO_HEIGHT: f32 = 80.0;
const LOGO_MARGIN: f32 = 10.0;
const NAME_MARGIN: f32 = 8.0;
const FIELD_MARGIN: f32 = 4.0;
const SECTION_GAP: f32 = 20.0;
const INFO_FONT_SIZE: f32 = 12.0;
const INFO_PADDING: f32 = 10.0;
const INFO_ROW_GAP: f32 = 4.0;
const TABLE_HEADER_FONT_SIZE: f32 = 12.0;
const TABLE_CELL_FONT_SIZE: f32 = 11.0;
const CELL_PADDING_X: f32 = 4.0;
const HEADER_PADDING_Y: f32 = 8.0;
const TOTALS_WIDTH: f32 = 200.0;
const TOTALS_ROW_PADDING: f32 = 6.0;
const GRAND_TOTAL_PADDING: f32 = 8.0;
const GRAND_TOTAL_MARGIN: f32 = 4.0;
const NOTES_MARGIN: f32 = 15.0;
const NOTES_FONT_SIZE: f32 = 10.0;
const FOOTER_MARGIN: f32 = 30.0;
const FOOTER_PADDING: f32 = 15.0;

const RULE_COLOR: &str = "#cccccc";
const ROW_RULE_COLOR: &str = "#eeeeee";
const DASH_PATTERN: &str = "4 3";

/// A rendered, self-contained markup document plus its pixel dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptDocument {
    pub svg: String,
    pub width: f32,
    pub height: f32,
}

struct Palette<'a> {
    primary: &'a str,
    secondary: &'a str,
    text: &'a str,
    font: &'a str,
}

/// Render the receipt. Pure: no clock, no network, no disk.
pub fn render(layout: &LayoutSchema, data: &ReceiptData) -> ReceiptDocument {
    let padding = layout.page.padding.max(0.0);
    let content_width = layout.page.width.max(1.0);
    let canvas_width = content_width + 2.0 * padding;
    let x0 = padding;

    let palette = Palette {
        primary: layout
            .colors
            .as_ref()
            .and_then(|c| c.primary.as_deref())
            .unwrap_or(DEFAULT_PRIMARY_COLOR),
        secondary: layout
            .colors
            .as_ref()
            .and_then(|c| c.secondary.as_deref())
            .unwrap_or(DEFAULT_SECONDARY_COLOR),
        text: layout
            .colors
            .as_ref()
            .and_then(|c| c.text.as_deref())
            .unwrap_or(DEFAULT_TEXT_COLOR),
        font: layout
            .fonts
            .as_ref()
            .and_then(|f| f.primary.as_deref())
            .unwrap_or(DEFAULT_FONT_FAMILY),
    };

    let mut body = String::new();
    let mut y = padding;

    y = emit_header(&mut body, layout, data, &palette, x0, content_width, y);
    y += SECTION_GAP;
    y = emit_info_strip(&mut body, data, &palette, x0, content_width, y);
    y += SECTION_GAP;
    y = emit_table(&mut body, layout, data, &palette, x0, content_width, y);
    y += SECTION_GAP;
    y = emit_totals(&mut body, layout, data, &palette, x0, content_width, y);
    if let Some(notes) = data.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        y = emit_notes(&mut body, notes, &palette, x0, content_width, y);
    }
    y = emit_footer(&mut body, layout, &palette, x0, content_width, y);

    let height = y + padding;

    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = fmt_len(canvas_width),
        h = fmt_len(height),
    );
    let _ = write!(
        svg,
        r##"<rect x="0" y="0" width="{w}" height="{h}" fill="#ffffff"/>"##,
        w = fmt_len(canvas_width),
        h = fmt_len(height),
    );
    svg.push_str(&body);
    svg.push_str("</svg>");

    ReceiptDocument {
        svg,
        width: canvas_width,
        height,
    }
}

fn emit_header(
    out: &mut String,
    layout: &LayoutSchema,
    data: &ReceiptData,
    palette: &Palette<'_>,
    x0: f32,
    content_width: f32,
    mut y: f32,
) -> f32 {
    let header = &layout.header;
    let (anchor, text_x) = anchor_for(header.alignment, x0, content_width);

    if let Some(logo_url) = data.business_info.logo_url.as_deref() {
        let logo_x = match header.alignment {
            Alignment::Left => x0,
            Alignment::Center => x0 + (content_width - LOGO_WIDTH) / 2.0,
            Alignment::Right => x0 + content_width - LOGO_WIDTH,
        };
        let _ = write!(
            out,
            r#"<image href="{href}" xlink:href="{href}" x="{x}" y="{y}" width="{w}" height="{h}" preserveAspectRatio="xMidYMid meet"/>"#,
            href = escape_xml(logo_url),
            x = fmt_len(logo_x),
            y = fmt_len(y),
            w = fmt_len(LOGO_WIDTH),
            h = fmt_len(LOGO_HEIGHT),
        );
        y += LOGO_HEIGHT + LOGO_MARGIN;
    }

    for field in &header.fields {
        let value = match field {
            HeaderField::BusinessName => data.business_info.name.as_str(),
            HeaderField::BusinessAddress => data.business_info.address.as_str(),
            HeaderField::BusinessPhone => data.business_info.phone.as_str(),
            HeaderField::BusinessEmail => data.business_info.email.as_str(),
        };

        if matches!(field, HeaderField::BusinessName) {
            let weight = match header.font_weight {
                FontWeight::Normal => "normal",
                FontWeight::Bold => "bold",
            };
            y += header.font_size;
            emit_text(
                out,
                text_x,
                y,
                header.font_size,
                weight,
                palette.primary,
                palette.font,
                anchor,
                value,
            );
            y += header.font_size * (LINE_HEIGHT - 1.0) + NAME_MARGIN;
        } else {
            let size = header.font_size * 0.6;
            y += size;
            emit_text(
                out,
                text_x,
                y,
                size,
                "normal",
                palette.secondary,
                palette.font,
                anchor,
                value,
            );
            y += size * (LINE_HEIGHT - 1.0) + FIELD_MARGIN;
        }
    }

    y
}

fn emit_info_strip(
    out: &mut String,
    data: &ReceiptData,
    palette: &Palette<'_>,
    x0: f32,
    content_width: f32,
    mut y: f32,
) -> f32 {
    emit_rule(out, x0, x0 + content_width, y, RULE_COLOR, 1.0, true);
    y += INFO_PADDING;

    let receipt_number = data.receipt_number.as_deref().unwrap_or("N/A");
    for (label, value) in [("Receipt #:", receipt_number), ("Date:", data.date.as_str())] {
        y += INFO_FONT_SIZE;
        emit_text(
            out,
            x0,
            y,
            INFO_FONT_SIZE,
            "normal",
            palette.text,
            palette.font,
            "start",
            label,
        );
        emit_text(
            out,
            x0 + content_width,
            y,
            INFO_FONT_SIZE,
            "normal",
            palette.text,
            palette.font,
            "end",
            value,
        );
        y += INFO_FONT_SIZE * (LINE_HEIGHT - 1.0) + INFO_ROW_GAP;
    }

    y += INFO_PADDING - INFO_ROW_GAP;
    emit_rule(out, x0, x0 + content_width, y, RULE_COLOR, 1.0, true);
    y
}

fn emit_table(
    out: &mut String,
    layout: &LayoutSchema,
    data: &ReceiptData,
    palette: &Palette<'_>,
    x0: f32,
    content_width: f32,
    mut y: f32,
) -> f32 {
    let table = &layout.table;
    let spans = column_spans(&table.columns, x0, content_width);

    // Header row.
    let header_weight = if table.header_bold { "bold" } else { "normal" };
    y += HEADER_PADDING_Y + TABLE_HEADER_FONT_SIZE;
    for (column, span) in table.columns.iter().zip(&spans) {
        let (anchor, cell_x) = cell_anchor(column.alignment, span);
        emit_text(
            out,
            cell_x,
            y,
            TABLE_HEADER_FONT_SIZE,
            header_weight,
            palette.text,
            palette.font,
            anchor,
            &column.label,
        );
    }
    y += HEADER_PADDING_Y;
    emit_rule(
        out,
        x0,
        x0 + content_width,
        y,
        RULE_COLOR,
        1.0,
        !table.show_borders,
    );

    // Item rows: name, quantity, price, total mapped onto the columns in
    // order; surplus columns stay empty, surplus values are dropped.
    let cell_padding_y = table.row_height.max(0.0) / 3.0;
    for item in &data.items {
        let values = [
            item.name.clone(),
            item.quantity.to_string(),
            format_currency(item.price),
            format_currency(item.total),
        ];

        y += cell_padding_y + TABLE_CELL_FONT_SIZE;
        for (index, span) in spans.iter().enumerate() {
            let Some(value) = values.get(index) else {
                break;
            };
            let column = &table.columns[index];
            let (anchor, cell_x) = cell_anchor(column.alignment, span);
            emit_text(
                out,
                cell_x,
                y,
                TABLE_CELL_FONT_SIZE,
                "normal",
                palette.text,
                palette.font,
                anchor,
                value,
            );
        }
        y += cell_padding_y;

        if table.show_borders {
            emit_rule(out, x0, x0 + content_width, y, ROW_RULE_COLOR, 1.0, false);
        }
    }

    y
}

fn emit_totals(
    out: &mut String,
    layout: &LayoutSchema,
    data: &ReceiptData,
    palette: &Palette<'_>,
    x0: f32,
    content_width: f32,
    mut y: f32,
) -> f32 {
    let totals = &layout.totals;
    let block_width = TOTALS_WIDTH.min(content_width);
    let block_x = match totals.position {
        TotalsPosition::Left => x0,
        TotalsPosition::Right => x0 + content_width - block_width,
    };

    for field in &totals.fields {
        let (label, value) = match field {
            TotalsField::Subtotal => ("Subtotal:", data.subtotal),
            TotalsField::Tax => ("Tax:", data.tax),
            // The grand total is emitted unconditionally below.
            TotalsField::Total => continue,
        };

        y += TOTALS_ROW_PADDING + totals.font_size;
        emit_text(
            out,
            block_x,
            y,
            totals.font_size,
            "normal",
            palette.text,
            palette.font,
            "start",
            label,
        );
        emit_text(
            out,
            block_x + block_width,
            y,
            totals.font_size,
            "normal",
            palette.text,
            palette.font,
            "end",
            &format_currency(value),
        );
        y += TOTALS_ROW_PADDING;
    }

    // Grand total: always shown, visually distinguished.
    y += GRAND_TOTAL_MARGIN;
    emit_rule(out, block_x, block_x + block_width, y, palette.primary, 2.0, false);
    let grand_size = totals.font_size + 2.0;
    y += GRAND_TOTAL_PADDING + grand_size;
    emit_text(
        out,
        block_x,
        y,
        grand_size,
        "bold",
        palette.text,
        palette.font,
        "start",
        "Total:",
    );
    emit_text(
        out,
        block_x + block_width,
        y,
        grand_size,
        "bold",
        palette.text,
        palette.font,
        "end",
        &format_currency(data.total),
    );
    y += TOTALS_ROW_PADDING;

    y
}

fn emit_notes(
    out: &mut String,
    notes: &str,
    palette: &Palette<'_>,
    x0: f32,
    content_width: f32,
    mut y: f32,
) -> f32 {
    y += NOTES_MARGIN;
    for line in wrap_text(notes, content_width, NOTES_FONT_SIZE) {
        y += NOTES_FONT_SIZE;
        emit_text(
            out,
            x0,
            y,
            NOTES_FONT_SIZE,
            "normal",
            palette.secondary,
            palette.font,
            "start",
            &line,
        );
        y += NOTES_FONT_SIZE * (LINE_HEIGHT - 1.0);
    }
    y
}

fn emit_footer(
    out: &mut String,
    layout: &LayoutSchema,
    palette: &Palette<'_>,
    x0: f32,
    content_width: f32,
    mut y: f32,
) -> f32 {
    let footer = &layout.footer;
    let size = footer.font_size.unwrap_or(DEFAULT_FOOTER_FONT_SIZE);
    let alignment = footer.alignment.unwrap_or(Alignment::Center);
    let (anchor, text_x) = anchor_for(alignment, x0, content_width);
    let text = if footer.text.trim().is_empty() {
        DEFAULT_FOOTER_TEXT
    } else {
        footer.text.as_str()
    };

    y += FOOTER_MARGIN;
    emit_rule(out, x0, x0 + content_width, y, RULE_COLOR, 1.0, true);
    y += FOOTER_PADDING;

    for line in wrap_text(text, content_width, size) {
        y += size;
        emit_text(
            out,
            text_x,
            y,
            size,
            "normal",
            palette.secondary,
            palette.font,
            anchor,
            &line,
        );
        y += size * (LINE_HEIGHT - 1.0);
    }

    y
}

struct ColumnSpan {
    x: f32,
    width: f32,
}

/// Column x offsets from the author-supplied percentages, taken verbatim.
/// Over- or under-100 sums simply overflow or underfill the content width.
fn column_spans(columns: &[ColumnSpec], x0: f32, content_width: f32) -> Vec<ColumnSpan> {
    let mut spans = Vec::with_capacity(columns.len());
    let mut x = x0;
    for column in columns {
        let width = content_width * column.width / 100.0;
        spans.push(ColumnSpan { x, width });
        x += width;
    }
    spans
}

fn cell_anchor(alignment: Alignment, span: &ColumnSpan) -> (&'static str, f32) {
    match alignment {
        Alignment::Left => ("start", span.x + CELL_PADDING_X),
        Alignment::Center => ("middle", span.x + span.width / 2.0),
        Alignment::Right => ("end", span.x + span.width - CELL_PADDING_X),
    }
}

fn anchor_for(alignment: Alignment, x0: f32, content_width: f32) -> (&'static str, f32) {
    match alignment {
        Alignment::Left => ("start", x0),
        Alignment::Center => ("middle", x0 + content_width / 2.0),
        Alignment::Right => ("end", x0 + content_width),
    }
}

#[allow(clippy::too_many_arguments)]
fn emit_text(
    out: &mut String,
    x: f32,
    baseline: f32,
    size: f32,
    weight: &str,
    color: &str,
    font: &str,
    anchor: &str,
    value: &str,
) {
    let _ = write!(
        out,
        r#"<text x="{x}" y="{y}" font-size="{size}" font-weight="{weight}" font-family="{font}" fill="{color}" text-anchor="{anchor}">{value}</text>"#,
        x = fmt_len(x),
        y = fmt_len(baseline),
        size = fmt_len(size),
        weight = weight,
        font = escape_xml(font),
        color = escape_xml(color),
        anchor = anchor,
        value = escape_xml(value),
    );
}

fn emit_rule(out: &mut String, x1: f32, x2: f32, y: f32, color: &str, width: f32, dashed: bool) {
    let dash = if dashed {
        format!(r#" stroke-dasharray="{DASH_PATTERN}""#)
    } else {
        String::new()
    };
    let _ = write!(
        out,
        r#"<line x1="{x1}" y1="{y}" x2="{x2}" y2="{y}" stroke="{color}" stroke-width="{width}"{dash}/>"#,
        x1 = fmt_len(x1),
        x2 = fmt_len(x2),
        y = fmt_len(y),
        color = escape_xml(color),
        width = fmt_len(width),
        dash = dash,
    );
}

/// Currency formatting convention: round half-up to exactly two decimals,
/// `$` prefix (10 → `$10.00`, 10.005 → `$10.01`).
pub fn format_currency(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("${rounded:.2}")
}

/// Greedy whitespace wrap against an estimated average glyph width. Long
/// unbreakable words get a line of their own rather than being split.
fn wrap_text(text: &str, content_width: f32, font_size: f32) -> Vec<String> {
    let max_chars = ((content_width / (font_size * 0.55)).floor() as usize).max(8);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
        } else if current.chars().count() + 1 + word.chars().count() <= max_chars {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn fmt_len(value: f32) -> String {
    if (value.fract()).abs() < f32::EPSILON {
        format!("{}", value as i64)
    } else {
        format!("{value:.2}")
    }
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::receipt::{BusinessInfo, ReceiptItem};

    fn dec(value: &str) -> Decimal {
        value.parse().expect("decimal literal")
    }

    fn sample_data() -> ReceiptData {
        ReceiptData {
            business_info: BusinessInfo {
                name: "Acme".to_string(),
                address: "1 Main St".to_string(),
                phone: "555-0100".to_string(),
                email: "a@acme.com".to_string(),
                logo_url: None,
            },
            items: vec![ReceiptItem {
                name: "Widget".to_string(),
                quantity: 2,
                price: dec("10.00"),
                total: dec("20.00"),
            }],
            subtotal: dec("20.00"),
            tax: dec("1.60"),
            total: dec("21.60"),
            receipt_number: Some("R-042".to_string()),
            date: "2026-02-01".to_string(),
            notes: None,
        }
    }

    #[test]
    fn rendering_is_deterministic() {
        let layout = LayoutSchema::default_layout();
        let data = sample_data();
        let first = render(&layout, &data);
        let second = render(&layout, &data);
        assert_eq!(first.svg, second.svg);
        assert_eq!(first.height, second.height);
    }

    #[test]
    fn default_layout_renders_scenario_fields() {
        let layout = LayoutSchema::default_layout();
        let document = render(&layout, &sample_data());

        // Business name styled at the header size and weight.
        assert!(document.svg.contains(
            r##"font-size="20" font-weight="bold" font-family="Inter" fill="#000000" text-anchor="middle">Acme</text>"##
        ));
        // One item row with quantity and currency fixed to two decimals.
        assert!(document.svg.contains(">2</text>"));
        assert!(document.svg.contains(">$10.00</text>"));
        // Grand total line.
        assert!(document.svg.contains(">$21.60</text>"));
    }

    #[test]
    fn currency_is_always_two_decimals_half_up() {
        assert_eq!(format_currency(dec("10")), "$10.00");
        assert_eq!(format_currency(dec("10.005")), "$10.01");
        assert_eq!(format_currency(dec("10.004")), "$10.00");
        assert_eq!(format_currency(dec("0.1")), "$0.10");
    }

    #[test]
    fn missing_receipt_number_renders_placeholder() {
        let layout = LayoutSchema::default_layout();
        let mut data = sample_data();
        data.receipt_number = None;
        let document = render(&layout, &data);
        assert!(document.svg.contains(">N/A</text>"));
    }

    #[test]
    fn footer_defaults_apply_when_optionals_absent() {
        let mut layout = LayoutSchema::default_layout();
        layout.footer.font_size = None;
        layout.footer.alignment = None;
        layout.colors = None;
        layout.fonts = None;

        let document = render(&layout, &sample_data());
        assert!(document.svg.contains(
            r##"font-size="12" font-weight="normal" font-family="Inter" fill="#666666" text-anchor="middle">Thank you for your business!</text>"##
        ));
    }

    #[test]
    fn empty_footer_text_falls_back_to_the_default_line() {
        let mut layout = LayoutSchema::default_layout();
        layout.footer.text = "   ".to_string();
        let document = render(&layout, &sample_data());
        assert!(document.svg.contains("Thank you for your business!"));
    }

    #[test]
    fn over_100_percent_columns_are_rendered_verbatim() {
        let mut layout = LayoutSchema::default_layout();
        for column in &mut layout.table.columns {
            column.width = 40.0; // sums to 160
        }
        // The last column's anchor runs past the content edge; that is the
        // author's layout, rendered as specified.
        let document = render(&layout, &sample_data());
        assert!(document.width > 0.0);
        assert!(document.svg.contains(">Total</text>"));
    }

    #[test]
    fn grand_total_is_shown_even_when_not_listed() {
        let mut layout = LayoutSchema::default_layout();
        layout.totals.fields = vec![TotalsField::Subtotal];
        let document = render(&layout, &sample_data());
        assert!(document.svg.contains(">Total:</text>"));
        assert!(document.svg.contains(">$21.60</text>"));
        assert!(!document.svg.contains(">Tax:</text>"));
    }

    #[test]
    fn notes_are_rendered_only_when_present() {
        let layout = LayoutSchema::default_layout();
        let mut data = sample_data();

        let without = render(&layout, &data);
        assert!(!without.svg.contains("No refunds"));

        data.notes = Some("No refunds after 30 days".to_string());
        let with = render(&layout, &data);
        assert!(with.svg.contains("No refunds after 30 days"));
        assert!(with.height > without.height);
    }

    #[test]
    fn logo_is_embedded_when_url_present() {
        let layout = LayoutSchema::default_layout();
        let mut data = sample_data();
        data.business_info.logo_url = Some("data:image/png;base64,AAAA".to_string());
        let document = render(&layout, &data);
        assert!(document.svg.contains(r#"<image href="data:image/png;base64,AAAA""#));
    }

    #[test]
    fn text_content_is_escaped() {
        let layout = LayoutSchema::default_layout();
        let mut data = sample_data();
        data.business_info.name = "Fish & Chips <Ltd>".to_string();
        let document = render(&layout, &data);
        assert!(document.svg.contains("Fish &amp; Chips &lt;Ltd&gt;"));
        assert!(!document.svg.contains("<Ltd>"));
    }
}
