//! Declarative description of a receipt's visual structure.
//!
//! A [`LayoutSchema`] arrives either from the layout-extraction API, from the
//! built-in template table, or as the hardcoded default. Optional fields fall
//! back to documented defaults at render time; required sections are part of
//! the caller contract and are enforced by deserialization.

use serde::{Deserialize, Serialize};

use crate::domain::types::{
    Alignment, FontWeight, HeaderField, LogoPosition, TotalsField, TotalsPosition,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutSchema {
    pub page: PageSpec,
    pub header: HeaderSpec,
    pub table: TableSpec,
    pub totals: TotalsSpec,
    pub footer: FooterSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<ColorSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fonts: Option<FontSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSpec {
    pub width: f32,
    pub padding: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderSpec {
    pub alignment: Alignment,
    pub font_size: f32,
    pub font_weight: FontWeight,
    pub fields: Vec<HeaderField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_position: Option<LogoPosition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSpec {
    pub columns: Vec<ColumnSpec>,
    pub row_height: f32,
    #[serde(default)]
    pub show_borders: bool,
    #[serde(default = "default_true")]
    pub header_bold: bool,
}

/// A single item-table column. `width` is an author-supplied percentage taken
/// verbatim; columns are never normalized to sum to 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub label: String,
    pub width: f32,
    #[serde(default)]
    pub alignment: Alignment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalsSpec {
    pub position: TotalsPosition,
    pub font_size: f32,
    pub fields: Vec<TotalsField>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FooterSpec {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Alignment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ColorSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FontSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<String>,
}

fn default_true() -> bool {
    true
}

impl LayoutSchema {
    /// The fallback layout served whenever extraction fails or is disabled.
    pub fn default_layout() -> Self {
        Self {
            page: PageSpec {
                width: 384.0,
                padding: 20.0,
            },
            header: HeaderSpec {
                alignment: Alignment::Center,
                font_size: 20.0,
                font_weight: FontWeight::Bold,
                fields: vec![
                    HeaderField::BusinessName,
                    HeaderField::BusinessAddress,
                    HeaderField::BusinessPhone,
                    HeaderField::BusinessEmail,
                ],
                logo_position: None,
            },
            table: TableSpec {
                columns: vec![
                    ColumnSpec {
                        label: "Item".to_string(),
                        width: 50.0,
                        alignment: Alignment::Left,
                    },
                    ColumnSpec {
                        label: "Qty".to_string(),
                        width: 15.0,
                        alignment: Alignment::Center,
                    },
                    ColumnSpec {
                        label: "Price".to_string(),
                        width: 17.0,
                        alignment: Alignment::Right,
                    },
                    ColumnSpec {
                        label: "Total".to_string(),
                        width: 18.0,
                        alignment: Alignment::Right,
                    },
                ],
                row_height: 20.0,
                show_borders: false,
                header_bold: true,
            },
            totals: TotalsSpec {
                position: TotalsPosition::Right,
                font_size: 14.0,
                fields: vec![TotalsField::Subtotal, TotalsField::Tax, TotalsField::Total],
            },
            footer: FooterSpec {
                text: "Thank you for your business!".to_string(),
                font_size: Some(12.0),
                alignment: Some(Alignment::Center),
            },
            colors: Some(ColorSpec {
                primary: Some("#000000".to_string()),
                secondary: Some("#666666".to_string()),
                text: Some("#000000".to_string()),
            }),
            fonts: Some(FontSpec {
                primary: Some("Inter".to_string()),
                secondary: Some("Inter".to_string()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_format_with_optional_fields_absent() {
        let json = r#"{
            "page": {"width": 384, "padding": 20},
            "header": {
                "alignment": "center",
                "fontSize": 20,
                "fontWeight": "bold",
                "fields": ["businessName", "businessPhone"]
            },
            "table": {
                "columns": [
                    {"label": "Item", "width": 60},
                    {"label": "Total", "width": 40, "alignment": "right"}
                ],
                "rowHeight": 22
            },
            "totals": {"position": "right", "fontSize": 14, "fields": ["subtotal", "total"]},
            "footer": {"text": "Come again!"}
        }"#;

        let layout: LayoutSchema = serde_json::from_str(json).expect("parse layout");
        assert_eq!(layout.header.fields.len(), 2);
        assert!(layout.header.logo_position.is_none());
        assert!(!layout.table.show_borders);
        assert!(layout.table.header_bold);
        assert_eq!(layout.table.columns[0].alignment, Alignment::Left);
        assert!(layout.footer.font_size.is_none());
        assert!(layout.colors.is_none());
        assert!(layout.fonts.is_none());
    }

    #[test]
    fn rejects_missing_required_sections() {
        let json = r#"{"page": {"width": 384, "padding": 20}}"#;
        assert!(serde_json::from_str::<LayoutSchema>(json).is_err());
    }

    #[test]
    fn column_widths_are_taken_verbatim() {
        let json = r#"{
            "page": {"width": 300, "padding": 10},
            "header": {"alignment": "left", "fontSize": 18, "fontWeight": "normal", "fields": []},
            "table": {
                "columns": [
                    {"label": "A", "width": 80},
                    {"label": "B", "width": 80}
                ],
                "rowHeight": 18
            },
            "totals": {"position": "left", "fontSize": 12, "fields": []},
            "footer": {"text": ""}
        }"#;

        let layout: LayoutSchema = serde_json::from_str(json).expect("parse layout");
        let sum: f32 = layout.table.columns.iter().map(|c| c.width).sum();
        assert_eq!(sum, 160.0);
    }

    #[test]
    fn default_layout_round_trips() {
        let layout = LayoutSchema::default_layout();
        let json = serde_json::to_string(&layout).expect("serialize");
        let parsed: LayoutSchema = serde_json::from_str(&json).expect("parse");
        assert_eq!(parsed, layout);
    }
}
