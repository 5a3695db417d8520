//! XLSX writer

use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;

use crate::error::{XlsxError, XlsxResult};
use crate::options::Compression;
use sheetwright_core::{Cell, CellValue, ColumnStyleRanges, Row, Workbook, Worksheet};

type FileOptions = zip::write::SimpleFileOptions;

/// Stylesheet written when the workbook carries no styles part of its own
const DEFAULT_STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
    <fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts>
    <fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>
    <borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>
    <cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>
    <cellXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/></cellXfs>
    <cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>
</styleSheet>"#;

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Encode characters XML cannot carry as Excel `_xHHHH_` sequences.
///
/// A literal `_xHHHH_` run in the text gets its underscore escaped so the
/// reader does not decode it.
pub(crate) fn encode_excel_escapes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, c) in s.char_indices() {
        match c {
            '\t' | '\n' | '\r' => out.push(c),
            c if (c as u32) < 0x20 => out.push_str(&format!("_x{:04X}_", c as u32)),
            '_' if looks_like_escape(&s[i..]) => out.push_str("_x005F_"),
            c => out.push(c),
        }
    }
    out
}

fn looks_like_escape(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 7
        && bytes[1] == b'x'
        && bytes[2..6].iter().all(u8::is_ascii_hexdigit)
        && bytes[6] == b'_'
}

/// Text element, keeping leading and trailing blanks
fn text_element(s: &str) -> String {
    let encoded = escape_xml(&encode_excel_escapes(s));
    if s.trim() != s {
        format!(r#"<t xml:space="preserve">{}</t>"#, encoded)
    } else {
        format!("<t>{}</t>", encoded)
    }
}

/// XLSX file writer
pub struct XlsxWriter;

impl XlsxWriter {
    /// Write a workbook to a file path
    pub fn write_file<P: AsRef<Path>>(
        workbook: &Workbook,
        path: P,
        compression: Compression,
    ) -> XlsxResult<()> {
        let file = File::create(path)?;
        Self::write(workbook, file, compression)
    }

    /// Write a workbook to a writer
    pub fn write<W: Write + Seek>(
        workbook: &Workbook,
        writer: W,
        compression: Compression,
    ) -> XlsxResult<()> {
        let options = FileOptions::default().compression_method(compression.method());
        let mut zip = zip::ZipWriter::new(writer);

        Self::write_content_types(&mut zip, workbook, options)?;
        Self::write_root_rels(&mut zip, options)?;
        Self::write_workbook_xml(&mut zip, workbook, options)?;
        Self::write_workbook_rels(&mut zip, workbook, options)?;
        Self::write_styles_xml(&mut zip, workbook, options)?;

        for (i, sheet) in workbook.worksheets().enumerate() {
            Self::write_worksheet(&mut zip, workbook, sheet, i, options)?;
        }

        Self::write_shared_strings(&mut zip, workbook, options)?;
        if !workbook.calc_chain().is_empty() {
            Self::write_calc_chain(&mut zip, workbook, options)?;
        }

        zip.finish()?;
        Ok(())
    }

    fn write_content_types<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
        options: FileOptions,
    ) -> XlsxResult<()> {
        zip.start_file("[Content_Types].xml", options)?;

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="xml" ContentType="application/xml"/>
    <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
    <Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
    <Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#,
        );

        for i in 0..workbook.sheet_count() {
            content.push_str(&format!(
                r#"
    <Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                i + 1
            ));
        }

        if !workbook.calc_chain().is_empty() {
            content.push_str(
                r#"
    <Override PartName="/xl/calcChain.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.calcChain+xml"/>"#,
            );
        }

        content.push_str("\n</Types>");

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_root_rels<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        options: FileOptions,
    ) -> XlsxResult<()> {
        zip.start_file("_rels/.rels", options)?;

        let content = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_workbook_xml<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
        options: FileOptions,
    ) -> XlsxResult<()> {
        zip.start_file("xl/workbook.xml", options)?;

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
    <sheets>"#,
        );

        for (i, sheet) in workbook.worksheets().enumerate() {
            let state = if sheet.is_visible() {
                ""
            } else {
                r#" state="hidden""#
            };
            content.push_str(&format!(
                r#"
        <sheet name="{}" sheetId="{}"{} r:id="rId{}"/>"#,
                escape_xml(sheet.name()),
                sheet.sheet_id(),
                state,
                i + 1
            ));
        }

        content.push_str("\n    </sheets>");
        if workbook.settings().calc_on_open {
            content.push_str(r#"
    <calcPr fullCalcOnLoad="1"/>"#);
        }
        content.push_str("\n</workbook>");

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_workbook_rels<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
        options: FileOptions,
    ) -> XlsxResult<()> {
        zip.start_file("xl/_rels/workbook.xml.rels", options)?;

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );

        for i in 0..workbook.sheet_count() {
            content.push_str(&format!(
                r#"
    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                i + 1,
                i + 1
            ));
        }

        // Package parts follow the sheets
        let mut next_rid = workbook.sheet_count() + 1;
        let mut parts = vec![("styles", "styles.xml"), ("sharedStrings", "sharedStrings.xml")];
        if !workbook.calc_chain().is_empty() {
            parts.push(("calcChain", "calcChain.xml"));
        }
        for (kind, target) in parts {
            content.push_str(&format!(
                r#"
    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/{}" Target="{}"/>"#,
                next_rid, kind, target
            ));
            next_rid += 1;
        }

        content.push_str("\n</Relationships>");

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_styles_xml<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
        options: FileOptions,
    ) -> XlsxResult<()> {
        zip.start_file("xl/styles.xml", options)?;
        match workbook.stylesheet().part() {
            Some(part) => zip.write_all(part)?,
            None => zip.write_all(DEFAULT_STYLES.as_bytes())?,
        }
        Ok(())
    }

    fn write_worksheet<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
        sheet: &Worksheet,
        index: usize,
        options: FileOptions,
    ) -> XlsxResult<()> {
        zip.start_file(&format!("xl/worksheets/sheet{}.xml", index + 1), options)?;

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );

        Self::write_columns(&mut content, sheet.columns());

        content.push_str("\n    <sheetData>");
        let shared_count = workbook.shared_values().len();
        for row in sheet.rows() {
            Self::write_row(&mut content, row, shared_count)?;
        }
        content.push_str("\n    </sheetData>");

        content.push_str("\n</worksheet>");

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_columns(content: &mut String, columns: &ColumnStyleRanges) {
        if columns.is_empty() {
            return;
        }

        content.push_str("\n    <cols>");
        for range in columns.ranges() {
            let format = &range.format;
            let mut attrs = format!(r#"min="{}" max="{}""#, range.min, range.max);
            if let Some(width) = format.width {
                attrs.push_str(&format!(r#" width="{}""#, width));
            }
            if let Some(style) = format.style_index {
                attrs.push_str(&format!(r#" style="{}""#, style));
            }
            if format.custom_width {
                attrs.push_str(r#" customWidth="1""#);
            }
            if format.hidden {
                attrs.push_str(r#" hidden="1""#);
            }
            if format.best_fit {
                attrs.push_str(r#" bestFit="1""#);
            }
            if format.outline_level > 0 {
                attrs.push_str(&format!(r#" outlineLevel="{}""#, format.outline_level));
            }
            if format.collapsed {
                attrs.push_str(r#" collapsed="1""#);
            }
            content.push_str(&format!("\n        <col {}/>", attrs));
        }
        content.push_str("\n    </cols>");
    }

    fn write_row(content: &mut String, row: &Row, shared_count: usize) -> XlsxResult<()> {
        let mut attrs = format!(r#"r="{}""#, row.index());
        if let Some(height) = row.height {
            attrs.push_str(&format!(r#" ht="{}" customHeight="1""#, height));
        }
        if let Some(style) = row.style_index {
            attrs.push_str(&format!(r#" s="{}" customFormat="1""#, style));
        }
        if row.hidden {
            attrs.push_str(r#" hidden="1""#);
        }
        if row.outline_level > 0 {
            attrs.push_str(&format!(r#" outlineLevel="{}""#, row.outline_level));
        }
        if row.collapsed {
            attrs.push_str(r#" collapsed="1""#);
        }

        let mut cells = String::new();
        for cell in row.cells() {
            Self::write_cell(&mut cells, cell, row.index(), shared_count)?;
        }

        if cells.is_empty() {
            content.push_str(&format!("\n        <row {}/>", attrs));
        } else {
            content.push_str(&format!("\n        <row {}>{}\n        </row>", attrs, cells));
        }
        Ok(())
    }

    fn write_cell(
        content: &mut String,
        cell: &Cell,
        row_index: u32,
        shared_count: usize,
    ) -> XlsxResult<()> {
        let cell_ref = cell.cell_ref(row_index);
        let style_attr = match cell.style_index() {
            Some(style) => format!(" s=\"{}\"", style),
            None => String::new(),
        };

        let xml = match cell.value() {
            CellValue::Empty => {
                // Unstyled placeholders only keep the row dense in memory
                if cell.style_index().is_none() {
                    return Ok(());
                }
                format!("<c r=\"{}\"{}/>", cell_ref, style_attr)
            }
            CellValue::Text(s) => format!(
                "<c r=\"{}\"{} t=\"inlineStr\"><is>{}</is></c>",
                cell_ref,
                style_attr,
                text_element(s)
            ),
            CellValue::Shared(id) => {
                if *id as usize >= shared_count {
                    return Err(XlsxError::InvalidFormat(format!(
                        "Cell {} refers to shared value {} which does not exist",
                        cell_ref, id
                    )));
                }
                format!("<c r=\"{}\"{} t=\"s\"><v>{}</v></c>", cell_ref, style_attr, id)
            }
            CellValue::Number(n) if n.is_finite() => {
                format!("<c r=\"{}\"{}><v>{}</v></c>", cell_ref, style_attr, n)
            }
            CellValue::Number(_) => {
                log::warn!("cell {}: non-finite number written as #NUM!", cell_ref);
                format!("<c r=\"{}\"{} t=\"e\"><v>#NUM!</v></c>", cell_ref, style_attr)
            }
            CellValue::Boolean(b) => format!(
                "<c r=\"{}\"{} t=\"b\"><v>{}</v></c>",
                cell_ref,
                style_attr,
                if *b { 1 } else { 0 }
            ),
            CellValue::Error(e) => format!(
                "<c r=\"{}\"{} t=\"e\"><v>{}</v></c>",
                cell_ref,
                style_attr,
                escape_xml(e)
            ),
            CellValue::Formula(text) => format!(
                "<c r=\"{}\"{}><f>{}</f></c>",
                cell_ref,
                style_attr,
                escape_xml(text)
            ),
        };

        content.push_str("\n            ");
        content.push_str(&xml);
        Ok(())
    }

    fn write_shared_strings<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
        options: FileOptions,
    ) -> XlsxResult<()> {
        zip.start_file("xl/sharedStrings.xml", options)?;

        let pool = workbook.shared_values();
        let mut content = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{}" uniqueCount="{}">"#,
            pool.len(),
            pool.len()
        );
        for (_, text) in pool.iter() {
            content.push_str(&format!("\n    <si>{}</si>", text_element(text)));
        }
        content.push_str("\n</sst>");

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_calc_chain<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
        options: FileOptions,
    ) -> XlsxResult<()> {
        zip.start_file("xl/calcChain.xml", options)?;

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<calcChain xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );
        for entry in workbook.calc_chain().entries() {
            content.push_str(&format!(
                "\n    <c r=\"{}\" i=\"{}\"/>",
                entry.cell, entry.sheet_id
            ));
        }
        content.push_str("\n</calcChain>");

        zip.write_all(content.as_bytes())?;
        Ok(())
    }
}
