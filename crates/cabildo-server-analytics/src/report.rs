// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Single-page PDF rendering for the analytics report download.
//!
//! The document is assembled by hand as a minimal PDF 1.4 byte stream: one
//! page, one Helvetica text object, no compression. That keeps the output
//! dependency-free and byte-stable, which is all the download endpoint needs.

use chrono::{DateTime, Utc};

use cabildo_server_api::StatsSummaryResponse;

/// Everything the report page shows.
pub struct ReportData {
	pub generated_at: DateTime<Utc>,
	pub start: Option<DateTime<Utc>>,
	pub end: Option<DateTime<Utc>>,
	pub summary: StatsSummaryResponse,
	pub top_pages: Vec<(String, u64)>,
}

/// Escapes the characters with special meaning inside a PDF string literal.
fn escape_text(text: &str) -> String {
	text.replace('\\', "\\\\")
		.replace('(', "\\(")
		.replace(')', "\\)")
}

struct PageWriter {
	content: String,
	y: i32,
}

impl PageWriter {
	fn new() -> Self {
		Self {
			content: String::new(),
			y: 760,
		}
	}

	fn line(&mut self, size: u32, text: &str) {
		self.content.push_str(&format!(
			"BT /F1 {size} Tf 72 {y} Td ({text}) Tj ET\n",
			y = self.y,
			text = escape_text(text),
		));
		self.y -= (size as i32) + 8;
	}

	fn gap(&mut self, pts: i32) {
		self.y -= pts;
	}
}

fn format_bound(bound: Option<DateTime<Utc>>, fallback: &str) -> String {
	bound
		.map(|dt| dt.format("%Y-%m-%d").to_string())
		.unwrap_or_else(|| fallback.to_string())
}

/// Renders the report as a complete PDF document.
pub fn render_report(data: &ReportData) -> Vec<u8> {
	let mut page = PageWriter::new();

	page.line(18, "Reporte de Analitica Web");
	page.line(
		10,
		&format!("Generado: {}", data.generated_at.format("%Y-%m-%d %H:%M UTC")),
	);
	page.line(
		10,
		&format!(
			"Periodo: {} a {}",
			format_bound(data.start, "inicio"),
			format_bound(data.end, "hoy"),
		),
	);
	page.gap(12);

	page.line(14, "Resumen");
	page.line(11, &format!("Sesiones totales: {}", data.summary.total_sessions));
	page.line(11, &format!("Visitantes unicos: {}", data.summary.total_visitors));
	page.line(11, &format!("Paginas vistas: {}", data.summary.total_pageviews));
	page.line(11, &format!("Tasa de rebote: {:.2}%", data.summary.bounce_rate));
	page.line(
		11,
		&format!("Duracion media de sesion: {:.2} s", data.summary.avg_session_seconds),
	);
	page.line(
		11,
		&format!("Tiempo medio por pagina: {:.2} s", data.summary.avg_page_seconds),
	);
	page.gap(12);

	page.line(14, "Paginas mas visitadas");
	if data.top_pages.is_empty() {
		page.line(11, "Sin datos en el periodo seleccionado");
	}
	for (i, (ruta, views)) in data.top_pages.iter().enumerate() {
		page.line(11, &format!("{}. {} - {} vistas", i + 1, ruta, views));
	}

	assemble(&page.content)
}

/// Lays out the five-object document and its cross-reference table.
fn assemble(content: &str) -> Vec<u8> {
	let objects = [
		"<< /Type /Catalog /Pages 2 0 R >>".to_string(),
		"<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
		"<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
		 /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >>"
			.to_string(),
		format!(
			"<< /Length {} >>\nstream\n{}endstream",
			content.len(),
			content
		),
		"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
	];

	let mut out = Vec::new();
	out.extend_from_slice(b"%PDF-1.4\n");

	let mut offsets = Vec::with_capacity(objects.len());
	for (i, body) in objects.iter().enumerate() {
		offsets.push(out.len());
		out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
	}

	let xref_offset = out.len();
	out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
	out.extend_from_slice(b"0000000000 65535 f \n");
	for offset in offsets {
		out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
	}
	out.extend_from_slice(
		format!(
			"trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
			objects.len() + 1,
			xref_offset
		)
		.as_bytes(),
	);

	out
}
