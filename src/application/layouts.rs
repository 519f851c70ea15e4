//! Layout sourcing: AI extraction from sample images and the built-in
//! template table. Extraction failures never surface a missing layout — the
//! hardcoded default is substituted instead.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

use crate::application::generation::ArtifactStore;
use crate::application::repos::{FilesRepo, RepoError};
use crate::domain::layout::{
    ColorSpec, ColumnSpec, FontSpec, FooterSpec, HeaderSpec, LayoutSchema, PageSpec, TableSpec,
    TotalsSpec,
};
use crate::domain::types::{
    Alignment, FontWeight, HeaderField, LogoPosition, TotalsField, TotalsPosition,
};
use crate::domain::uploads::{FileKind, StoredFileRecord};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("layout extraction call failed: {0}")]
    Upstream(String),
    #[error("layout extraction returned malformed output: {0}")]
    Malformed(String),
}

/// External multimodal model turning a receipt image into a [`LayoutSchema`].
#[async_trait]
pub trait LayoutExtractor: Send + Sync {
    async fn extract(&self, image: &[u8], mime: &str) -> Result<LayoutSchema, ExtractError>;
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractedLayout {
    pub layout: LayoutSchema,
    pub sample_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReceiptTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub preview: &'static str,
    pub layout: LayoutSchema,
}

#[derive(Debug, Error)]
pub enum LayoutServiceError {
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct LayoutService {
    extractor: Option<Arc<dyn LayoutExtractor>>,
    storage: Arc<dyn ArtifactStore>,
    files: Arc<dyn FilesRepo>,
}

impl LayoutService {
    pub fn new(
        extractor: Option<Arc<dyn LayoutExtractor>>,
        storage: Arc<dyn ArtifactStore>,
        files: Arc<dyn FilesRepo>,
    ) -> Self {
        Self {
            extractor,
            storage,
            files,
        }
    }

    /// Infer a layout from a sample image. Upstream failures (and a missing
    /// extractor) degrade to the default layout; the sample itself is stored
    /// best-effort for later reference.
    pub async fn extract(
        &self,
        user_id: Uuid,
        image: Bytes,
        mime: &str,
    ) -> Result<ExtractedLayout, LayoutServiceError> {
        let layout = match self.extractor.as_ref() {
            Some(extractor) => match extractor.extract(&image, mime).await {
                Ok(layout) => layout,
                Err(err) => {
                    warn!(
                        target = "recibo::layouts",
                        user_id = %user_id,
                        error = %err,
                        "layout extraction failed; serving default layout"
                    );
                    LayoutSchema::default_layout()
                }
            },
            None => LayoutSchema::default_layout(),
        };

        let extension = mime_guess::get_mime_extensions_str(mime)
            .and_then(|candidates| candidates.first())
            .copied()
            .unwrap_or("bin");
        let timestamp = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        let key = format!("{user_id}/{timestamp}-sample.{extension}");
        let sample_url = self.storage.public_url(&key);

        match self.storage.put(&key, image, mime).await {
            Ok(()) => {
                let record = StoredFileRecord {
                    id: Uuid::new_v4(),
                    user_id,
                    file_url: sample_url.clone(),
                    kind: FileKind::Sample,
                    created_at: OffsetDateTime::now_utc(),
                };
                if let Err(err) = self.files.insert_file(record).await {
                    warn!(
                        target = "recibo::layouts",
                        user_id = %user_id,
                        error = %err,
                        "sample file record insert failed"
                    );
                }
            }
            Err(err) => {
                warn!(
                    target = "recibo::layouts",
                    user_id = %user_id,
                    key = %key,
                    error = %err,
                    "sample upload failed"
                );
            }
        }

        Ok(ExtractedLayout { layout, sample_url })
    }

    pub fn templates(&self) -> Vec<ReceiptTemplate> {
        builtin_templates()
    }

    pub fn template_by_id(&self, id: &str) -> Option<ReceiptTemplate> {
        builtin_templates()
            .into_iter()
            .find(|template| template.id == id)
    }
}

fn layout(
    page: PageSpec,
    header: HeaderSpec,
    table: TableSpec,
    totals: TotalsSpec,
    footer: FooterSpec,
    colors: ColorSpec,
    fonts: (&str, &str),
) -> LayoutSchema {
    LayoutSchema {
        page,
        header,
        table,
        totals,
        footer,
        colors: Some(colors),
        fonts: Some(FontSpec {
            primary: Some(fonts.0.to_string()),
            secondary: Some(fonts.1.to_string()),
        }),
    }
}

fn columns(specs: &[(&str, f32, Alignment)]) -> Vec<ColumnSpec> {
    specs
        .iter()
        .map(|(label, width, alignment)| ColumnSpec {
            label: (*label).to_string(),
            width: *width,
            alignment: *alignment,
        })
        .collect()
}

fn colors(primary: &str, secondary: &str, text: &str) -> ColorSpec {
    ColorSpec {
        primary: Some(primary.to_string()),
        secondary: Some(secondary.to_string()),
        text: Some(text.to_string()),
    }
}

fn footer(text: &str, font_size: f32) -> FooterSpec {
    FooterSpec {
        text: text.to_string(),
        font_size: Some(font_size),
        alignment: Some(Alignment::Center),
    }
}

fn totals(font_size: f32) -> TotalsSpec {
    TotalsSpec {
        position: TotalsPosition::Right,
        font_size,
        fields: vec![TotalsField::Subtotal, TotalsField::Tax, TotalsField::Total],
    }
}

const ALL_HEADER_FIELDS: [HeaderField; 4] = [
    HeaderField::BusinessName,
    HeaderField::BusinessAddress,
    HeaderField::BusinessPhone,
    HeaderField::BusinessEmail,
];

fn header(
    alignment: Alignment,
    font_size: f32,
    font_weight: FontWeight,
    fields: &[HeaderField],
    logo_position: Option<LogoPosition>,
) -> HeaderSpec {
    HeaderSpec {
        alignment,
        font_size,
        font_weight,
        fields: fields.to_vec(),
        logo_position,
    }
}

fn table(specs: &[(&str, f32, Alignment)], row_height: f32, show_borders: bool) -> TableSpec {
    TableSpec {
        columns: columns(specs),
        row_height,
        show_borders,
        header_bold: true,
    }
}

/// The built-in template table mirrored by the generator UI.
pub fn builtin_templates() -> Vec<ReceiptTemplate> {
    use Alignment::{Center, Left, Right};

    vec![
        ReceiptTemplate {
            id: "classic",
            name: "Classic",
            description: "Traditional centered receipt layout",
            preview: "📄",
            layout: layout(
                PageSpec {
                    width: 384.0,
                    padding: 20.0,
                },
                header(Center, 22.0, FontWeight::Bold, &ALL_HEADER_FIELDS, None),
                table(
                    &[
                        ("Item", 45.0, Left),
                        ("Qty", 15.0, Center),
                        ("Price", 20.0, Right),
                        ("Total", 20.0, Right),
                    ],
                    22.0,
                    false,
                ),
                totals(14.0),
                footer("Thank you for your business!", 12.0),
                colors("#000000", "#666666", "#000000"),
                ("Inter", "Inter"),
            ),
        },
        ReceiptTemplate {
            id: "modern",
            name: "Modern",
            description: "Clean and minimal with accent colors",
            preview: "✨",
            layout: layout(
                PageSpec {
                    width: 384.0,
                    padding: 24.0,
                },
                header(Left, 24.0, FontWeight::Bold, &ALL_HEADER_FIELDS[..3], None),
                table(
                    &[
                        ("Description", 50.0, Left),
                        ("Qty", 12.0, Center),
                        ("Rate", 18.0, Right),
                        ("Amount", 20.0, Right),
                    ],
                    24.0,
                    true,
                ),
                totals(15.0),
                footer("We appreciate your business!", 11.0),
                colors("#2563eb", "#64748b", "#1e293b"),
                ("Inter", "Inter"),
            ),
        },
        ReceiptTemplate {
            id: "elegant",
            name: "Elegant",
            description: "Sophisticated with refined typography",
            preview: "🎩",
            layout: layout(
                PageSpec {
                    width: 384.0,
                    padding: 28.0,
                },
                header(
                    Center,
                    26.0,
                    FontWeight::Bold,
                    &ALL_HEADER_FIELDS,
                    Some(LogoPosition::Top),
                ),
                table(
                    &[
                        ("Item", 48.0, Left),
                        ("Qty", 12.0, Center),
                        ("Price", 20.0, Right),
                        ("Total", 20.0, Right),
                    ],
                    26.0,
                    false,
                ),
                totals(14.0),
                footer("Thank you for choosing us", 13.0),
                colors("#1a1a2e", "#4a4e69", "#1a1a2e"),
                ("Playfair Display", "Inter"),
            ),
        },
        ReceiptTemplate {
            id: "compact",
            name: "Compact",
            description: "Space-efficient for thermal printers",
            preview: "🧾",
            layout: layout(
                PageSpec {
                    width: 300.0,
                    padding: 12.0,
                },
                header(
                    Center,
                    16.0,
                    FontWeight::Bold,
                    &[HeaderField::BusinessName, HeaderField::BusinessPhone],
                    None,
                ),
                table(
                    &[
                        ("Item", 50.0, Left),
                        ("Qty", 15.0, Center),
                        ("Price", 17.0, Right),
                        ("Total", 18.0, Right),
                    ],
                    18.0,
                    false,
                ),
                totals(12.0),
                footer("Thanks!", 10.0),
                colors("#000000", "#333333", "#000000"),
                ("Courier New", "Courier New"),
            ),
        },
        ReceiptTemplate {
            id: "retail",
            name: "Retail",
            description: "Perfect for stores and shops",
            preview: "🛒",
            layout: layout(
                PageSpec {
                    width: 384.0,
                    padding: 20.0,
                },
                header(
                    Center,
                    20.0,
                    FontWeight::Bold,
                    &ALL_HEADER_FIELDS[..3],
                    Some(LogoPosition::Top),
                ),
                table(
                    &[
                        ("Product", 45.0, Left),
                        ("Qty", 15.0, Center),
                        ("Unit $", 20.0, Right),
                        ("Total", 20.0, Right),
                    ],
                    22.0,
                    true,
                ),
                totals(14.0),
                footer("Thank you for shopping with us!", 11.0),
                colors("#16a34a", "#4b5563", "#111827"),
                ("Inter", "Inter"),
            ),
        },
        ReceiptTemplate {
            id: "restaurant",
            name: "Restaurant",
            description: "Ideal for food service",
            preview: "🍽️",
            layout: layout(
                PageSpec {
                    width: 384.0,
                    padding: 20.0,
                },
                header(Center, 22.0, FontWeight::Bold, &ALL_HEADER_FIELDS[..3], None),
                table(
                    &[
                        ("Item", 55.0, Left),
                        ("Qty", 10.0, Center),
                        ("Price", 17.0, Right),
                        ("Total", 18.0, Right),
                    ],
                    24.0,
                    false,
                ),
                totals(14.0),
                footer("Thank you! Please come again!", 12.0),
                colors("#dc2626", "#78716c", "#1c1917"),
                ("Inter", "Inter"),
            ),
        },
        ReceiptTemplate {
            id: "professional",
            name: "Professional",
            description: "Corporate and business services",
            preview: "💼",
            layout: layout(
                PageSpec {
                    width: 420.0,
                    padding: 30.0,
                },
                header(
                    Left,
                    24.0,
                    FontWeight::Bold,
                    &ALL_HEADER_FIELDS,
                    Some(LogoPosition::Left),
                ),
                table(
                    &[
                        ("Service", 45.0, Left),
                        ("Hours", 15.0, Center),
                        ("Rate", 20.0, Right),
                        ("Amount", 20.0, Right),
                    ],
                    26.0,
                    true,
                ),
                totals(15.0),
                footer("Payment due within 30 days. Thank you!", 11.0),
                colors("#0f172a", "#475569", "#0f172a"),
                ("Inter", "Inter"),
            ),
        },
        ReceiptTemplate {
            id: "minimal",
            name: "Minimal",
            description: "Clean and simple design",
            preview: "⬜",
            layout: {
                let mut schema = layout(
                    PageSpec {
                        width: 360.0,
                        padding: 24.0,
                    },
                    header(
                        Center,
                        18.0,
                        FontWeight::Normal,
                        &[HeaderField::BusinessName, HeaderField::BusinessPhone],
                        None,
                    ),
                    table(
                        &[
                            ("Item", 50.0, Left),
                            ("Qty", 15.0, Center),
                            ("Price", 17.0, Right),
                            ("Total", 18.0, Right),
                        ],
                        20.0,
                        false,
                    ),
                    totals(13.0),
                    footer("Thank you", 11.0),
                    colors("#374151", "#9ca3af", "#374151"),
                    ("Inter", "Inter"),
                );
                schema.table.header_bold = false;
                schema
            },
        },
    ]
}
