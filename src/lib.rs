pub mod adapter;
pub mod cli;
pub mod config;
pub mod ddl;
pub mod diagnostics;
pub mod diagram;
pub mod error;
pub mod measure;
pub mod output;
pub mod resolver;
pub mod schema;

use std::fmt::Write;

use chrono::{Local, NaiveDateTime};
use log::info;
use wasm_bindgen::prelude::*;

use adapter::Adapter;
use config::{DEFAULT_TIMESTAMP_FORMAT, ExportConfig};
use ddl::Header;
use diagnostics::Diagnostics;
use diagram::DiagramModel;

pub use error::{ConfigError, Error};

/// Per-run facts that are not part of the diagram.
#[derive(Debug, Clone)]
pub struct ExportContext {
    pub generated_at: NaiveDateTime,
    /// File name shown in the header, usually the destination's.
    pub source_name: Option<String>,
}

impl ExportContext {
    pub fn now() -> Self {
        Self {
            generated_at: Local::now().naive_local(),
            source_name: None,
        }
    }

    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }
}

/// Result of an export: the script plus everything reported on the way.
#[derive(Debug, Clone)]
pub struct Export {
    pub sql: String,
    pub diagnostics: Diagnostics,
}

/// Turn a diagram into a DDL script.
///
/// Malformed shapes never fail the export; they end up in
/// [`Export::diagnostics`] and are left out of the script.
pub fn export(model: &DiagramModel, config: &ExportConfig, context: &ExportContext) -> Export {
    info!(shapes = model.shapes.len(); "Exporting diagram");
    let mut diagnostics = Diagnostics::new();

    let adapter = Adapter::new(model, config.layout, &mut diagnostics);
    let schema = resolver::resolve(&adapter, &mut diagnostics);

    let generated_at = format_timestamp(&context.generated_at, &config.output.timestamp_format);
    let source = if config.output.include_source {
        context.source_name.as_deref()
    } else {
        None
    };
    let header = Header {
        generated_at: &generated_at,
        source,
    };
    let sql = ddl::render(&schema, &header);

    info!(
        bytes = sql.len(),
        diagnostics = diagnostics.len();
        "Rendered DDL"
    );
    Export { sql, diagnostics }
}

/// Parse a JSON diagram snapshot and export it.
pub fn export_json(
    source: &str,
    config: &ExportConfig,
    context: &ExportContext,
) -> Result<Export, Error> {
    let model = DiagramModel::from_json(source)?;
    Ok(export(&model, config, context))
}

fn format_timestamp(at: &NaiveDateTime, format: &str) -> String {
    let mut text = String::new();
    if write!(text, "{}", at.format(format)).is_err() {
        return at.format(DEFAULT_TIMESTAMP_FORMAT).to_string();
    }
    text
}

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Export a JSON diagram snapshot to `{ sql, diagnostics }`.
#[wasm_bindgen(js_name = "diagramToSql")]
pub fn diagram_to_sql(source: &str) -> Result<js_sys::Object, String> {
    let export = export_json(source, &ExportConfig::default(), &ExportContext::now())
        .map_err(|e| e.to_string())?;

    let diagnostics: js_sys::Array = export
        .diagnostics
        .iter()
        .map(|d| JsValue::from_str(&d.to_string()))
        .collect();

    let result = js_sys::Object::new();
    js_sys::Reflect::set(&result, &"sql".into(), &export.sql.into())
        .map_err(|_| "failed to build result object".to_string())?;
    js_sys::Reflect::set(&result, &"diagnostics".into(), &diagnostics)
        .map_err(|_| "failed to build result object".to_string())?;
    Ok(result)
}
