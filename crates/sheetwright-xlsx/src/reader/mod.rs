//! XLSX reader

mod shared_formula;

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use shared_formula::SharedFormulas;
use sheetwright_core::{
    CalcChain, CalcChainEntry, Cell, CellRef, CellValue, ColumnAddress, ColumnFormat,
    ColumnStyleRange, ColumnStyleRanges, Row, SharedValuePool, Stylesheet, Workbook,
    WorkbookSettings, Worksheet,
};

/// Decode Excel's `_xHHHH_` escape sequences in strings.
///
/// Excel stores characters that XML cannot carry (and literal `_x` runs) as
/// `_x` + four hex digits + `_`, e.g. `_x000d_` for a carriage return and
/// `_x005f_` for an underscore. Incomplete sequences are kept as they are.
pub(crate) fn decode_excel_escapes(s: &str) -> String {
    if !s.contains("_x") {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("_x") {
        out.push_str(&rest[..start]);
        let candidate = &rest[start..];
        match decode_escape(candidate) {
            Some(c) => {
                out.push(c);
                rest = &candidate[7..];
            }
            None => {
                out.push_str("_x");
                rest = &candidate[2..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Decode the `_xHHHH_` sequence at the start of `s`
fn decode_escape(s: &str) -> Option<char> {
    if s.as_bytes().get(6) != Some(&b'_') {
        return None;
    }
    let hex = s.get(2..6)?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
}

fn is_true(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

fn attr_string(attr: &quick_xml::events::attributes::Attribute<'_>) -> Option<String> {
    attr.unescape_value().ok().map(|s| s.to_string())
}

fn attr_parse<T: std::str::FromStr>(attr: &quick_xml::events::attributes::Attribute<'_>) -> Option<T> {
    attr.unescape_value().ok().and_then(|s| s.parse::<T>().ok())
}

/// A `<sheet>` entry of the workbook part
#[derive(Debug)]
struct SheetInfo {
    name: String,
    sheet_id: u32,
    r_id: String,
    hidden: bool,
}

/// Row attributes read from a `<row>` element
#[derive(Debug, Default)]
struct RowAttrs {
    index: u32,
    height: Option<f64>,
    hidden: bool,
    style_index: Option<u32>,
    outline_level: u8,
    collapsed: bool,
}

impl RowAttrs {
    fn parse(e: &BytesStart<'_>, previous: u32) -> Self {
        let mut attrs = RowAttrs {
            index: previous + 1,
            ..Default::default()
        };
        let mut ht: Option<f64> = None;
        let mut custom_height = false;
        let mut style: Option<u32> = None;
        let mut custom_format = false;

        for attr in e.attributes().flatten() {
            match attr.key.as_ref() {
                b"r" => {
                    if let Some(r) = attr_parse(&attr) {
                        attrs.index = r;
                    }
                }
                b"ht" => ht = attr_parse(&attr),
                b"customHeight" => custom_height = attr_string(&attr).map_or(false, |s| is_true(&s)),
                b"hidden" => attrs.hidden = attr_string(&attr).map_or(false, |s| is_true(&s)),
                b"s" => style = attr_parse(&attr),
                b"customFormat" => custom_format = attr_string(&attr).map_or(false, |s| is_true(&s)),
                b"outlineLevel" => attrs.outline_level = attr_parse(&attr).unwrap_or(0),
                b"collapsed" => attrs.collapsed = attr_string(&attr).map_or(false, |s| is_true(&s)),
                _ => {}
            }
        }

        if custom_height {
            attrs.height = ht;
        }
        if custom_format {
            attrs.style_index = style;
        }
        attrs
    }

    fn into_row(self, cells: Vec<Cell>) -> XlsxResult<Row> {
        let mut row = Row::from_stored(self.index, cells)?;
        row.height = self.height;
        row.hidden = self.hidden;
        row.style_index = self.style_index;
        row.outline_level = self.outline_level;
        row.collapsed = self.collapsed;
        Ok(row)
    }
}

/// Cell state collected between `<c>` and `</c>`
#[derive(Debug, Default)]
struct PendingCell {
    column: u32,
    row: u32,
    reference: String,
    cell_type: Option<String>,
    style: Option<u32>,
    value: Option<String>,
    formula: Option<String>,
    /// Group index of a shared formula (`<f t="shared" si="..">`)
    shared_index: Option<u32>,
    inline: String,
}

impl PendingCell {
    fn parse(e: &BytesStart<'_>, previous_column: u32, row: u32) -> XlsxResult<Self> {
        let mut cell = PendingCell {
            column: previous_column + 1,
            row,
            ..Default::default()
        };

        for attr in e.attributes().flatten() {
            match attr.key.as_ref() {
                b"r" => {
                    if let Some(r) = attr_string(&attr) {
                        let reference = CellRef::parse(&r).map_err(|e| {
                            XlsxError::Parse(format!("Invalid cell reference '{}': {}", r, e))
                        })?;
                        cell.column = reference.column;
                        cell.row = reference.row;
                        cell.reference = r;
                    }
                }
                b"t" => cell.cell_type = attr_string(&attr),
                b"s" => cell.style = attr_parse(&attr),
                _ => {}
            }
        }
        if cell.reference.is_empty() {
            cell.reference = ColumnAddress::index_to_label(cell.column)?;
        }
        Ok(cell)
    }

    /// Start a formula from the attributes of an `<f>` element
    fn begin_formula(&mut self, e: &BytesStart<'_>) {
        let mut shared = false;
        let mut si = None;
        for attr in e.attributes().flatten() {
            match attr.key.as_ref() {
                b"t" => shared = attr_string(&attr).as_deref() == Some("shared"),
                b"si" => si = attr_parse(&attr),
                _ => {}
            }
        }
        self.formula = Some(String::new());
        self.shared_index = si.filter(|_| shared);
    }

    fn into_cell(self, shared_count: usize, shared: &mut SharedFormulas) -> XlsxResult<Cell> {
        let value = self.value_for(shared_count, shared)?;
        let mut cell = Cell::placeholder(ColumnAddress::new(self.column)?);
        cell.set_value(value);
        if let Some(style) = self.style {
            cell.set_style(style);
        }
        Ok(cell)
    }

    fn value_for(&self, shared_count: usize, shared: &mut SharedFormulas) -> XlsxResult<CellValue> {
        let at = CellRef::new(self.column, self.row);
        match (self.formula.as_deref(), self.shared_index) {
            (Some(f), si) if !f.is_empty() => {
                if let Some(si) = si {
                    shared.set_anchor(si, at, f);
                }
                return Ok(CellValue::formula(f));
            }
            (Some(_), Some(si)) => match shared.formula_at(si, at) {
                Some(f) => return Ok(CellValue::formula(f)),
                None => log::warn!(
                    "cell {}: shared formula group {} has no anchor, keeping its last value",
                    self.reference,
                    si
                ),
            },
            (Some(_), None) => log::warn!(
                "cell {}: empty formula, keeping its last value",
                self.reference
            ),
            (None, _) => {}
        }

        let value = self.value.as_deref();
        let cell_value = match (self.cell_type.as_deref(), value) {
            (Some("inlineStr"), _) => CellValue::Text(decode_excel_escapes(&self.inline)),
            (_, None) => CellValue::Empty,

            // Shared string: keep the reference so pool ids survive a round trip
            (Some("s"), Some(v)) => {
                let id: u32 = v.parse().map_err(|_| {
                    XlsxError::Parse(format!("Invalid shared string index: {}", v))
                })?;
                if id as usize >= shared_count {
                    return Err(XlsxError::Parse(format!(
                        "Shared string index {} out of bounds in cell {}",
                        id, self.reference
                    )));
                }
                CellValue::Shared(id)
            }

            (Some("str"), Some(v)) => CellValue::Text(decode_excel_escapes(v)),
            (Some("b"), Some(v)) => CellValue::Boolean(is_true(v)),
            (Some("e"), Some(v)) => CellValue::Error(v.to_string()),

            (None, Some(v)) | (Some("n"), Some(v)) => match v.parse::<f64>() {
                Ok(n) => CellValue::Number(n),
                Err(_) => CellValue::Text(v.to_string()),
            },

            (Some(other), Some(v)) => {
                log::warn!(
                    "cell {}: unknown cell type '{}', reading value as text",
                    self.reference,
                    other
                );
                CellValue::Text(v.to_string())
            }
        };
        Ok(cell_value)
    }
}

/// XLSX file reader
pub struct XlsxReader;

impl XlsxReader {
    /// Read a workbook from a file path
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsxResult<Workbook> {
        let file = File::open(path)?;
        Self::read(BufReader::new(file))
    }

    /// Read a workbook from a reader
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<Workbook> {
        let mut archive = zip::ZipArchive::new(reader)?;

        // Verify this is an XLSX file
        if archive.by_name("[Content_Types].xml").is_err() {
            return Err(XlsxError::InvalidFormat(
                "Missing [Content_Types].xml".into(),
            ));
        }

        let shared_values = Self::read_shared_strings(&mut archive)?;
        let stylesheet = Self::read_styles(&mut archive)?;
        let sheet_info = Self::read_workbook_xml(&mut archive)?;
        let sheet_paths = Self::read_workbook_rels(&mut archive)?;

        let first_sheet_id = sheet_info.first().map_or(1, |s| s.sheet_id);
        let mut calc_chain = Self::read_calc_chain(&mut archive, first_sheet_id)?;

        let mut worksheets = Vec::with_capacity(sheet_info.len());
        for info in &sheet_info {
            let Some(path) = sheet_paths.get(&info.r_id) else {
                log::warn!(
                    "sheet '{}' is not a worksheet part, skipping it",
                    info.name
                );
                continue;
            };
            let worksheet = Self::read_worksheet(&mut archive, path, info, shared_values.len())?;
            worksheets.push(worksheet);
        }

        // Entries whose cell holds no formula would make the application repair the file
        let listed = calc_chain.len();
        calc_chain.retain(|entry| {
            worksheets
                .iter()
                .find(|w| w.sheet_id() == entry.sheet_id)
                .and_then(|w| w.cell_at(entry.cell.row, entry.cell.column))
                .map_or(false, |cell| cell.value().is_formula())
        });
        if calc_chain.len() < listed {
            log::warn!(
                "dropped {} calculation chain entr(ies) without a formula cell",
                listed - calc_chain.len()
            );
        }

        let mut workbook = Workbook::from_parts(
            worksheets,
            shared_values,
            stylesheet,
            calc_chain,
            WorkbookSettings::default(),
        )?;

        // Ensure at least one sheet exists
        if workbook.is_empty() {
            workbook.add_worksheet()?;
        }

        Ok(workbook)
    }

    /// Read the shared strings table
    fn read_shared_strings<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<SharedValuePool> {
        let file = match archive.by_name("xl/sharedStrings.xml") {
            Ok(f) => f,
            Err(_) => return Ok(SharedValuePool::new()), // No shared strings is valid
        };

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        // Leading and trailing blanks are part of the text
        xml_reader.trim_text(false);

        let mut buf = Vec::new();
        let mut strings = Vec::new();
        let mut current = String::new();
        let mut in_si = false;
        let mut in_t = false;
        let mut in_phonetic = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"si" => {
                        in_si = true;
                        current.clear();
                    }
                    b"rPh" => in_phonetic = true,
                    b"t" if in_si && !in_phonetic => in_t = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) if e.name().as_ref() == b"si" => strings.push(String::new()),
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"si" => {
                        strings.push(decode_excel_escapes(&current));
                        in_si = false;
                    }
                    b"rPh" => in_phonetic = false,
                    b"t" => in_t = false,
                    _ => {}
                },
                Ok(Event::Text(e)) if in_t => current.push_str(&e.unescape()?),
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(SharedValuePool::from_entries(strings))
    }

    /// Read the stylesheet, keeping the part for writing it back
    fn read_styles<R: Read + Seek>(archive: &mut zip::ZipArchive<R>) -> XlsxResult<Stylesheet> {
        let mut part = Vec::new();
        match archive.by_name("xl/styles.xml") {
            Ok(mut file) => {
                file.read_to_end(&mut part)?;
            }
            Err(_) => return Ok(Stylesheet::new()),
        }

        let count = Self::count_cell_formats(part.as_slice())?;
        Ok(Stylesheet::from_part(count, part))
    }

    /// Count the `<xf>` entries of `<cellXfs>`
    fn count_cell_formats<B: BufRead>(part: B) -> XlsxResult<u32> {
        let mut xml_reader = Reader::from_reader(part);
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut in_cell_xfs = false;
        let mut count = 0;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) if e.name().as_ref() == b"cellXfs" => in_cell_xfs = true,
                Ok(Event::End(e)) if e.name().as_ref() == b"cellXfs" => in_cell_xfs = false,
                Ok(Event::Start(e)) | Ok(Event::Empty(e))
                    if in_cell_xfs && e.name().as_ref() == b"xf" =>
                {
                    count += 1
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(count)
    }

    /// Read workbook.xml to get sheet names, ids and rIds
    fn read_workbook_xml<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<SheetInfo>> {
        let file = archive
            .by_name("xl/workbook.xml")
            .map_err(|_| XlsxError::MissingPart("xl/workbook.xml".into()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut sheets = Vec::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"sheet" => {
                    let mut name = None;
                    let mut sheet_id = None;
                    let mut r_id = None;
                    let mut hidden = false;

                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"name" => name = attr_string(&attr),
                            b"sheetId" => sheet_id = attr_parse(&attr),
                            b"r:id" => r_id = attr_string(&attr),
                            b"state" => {
                                hidden = attr_string(&attr).map_or(false, |s| s != "visible")
                            }
                            _ => {}
                        }
                    }

                    match (name, r_id) {
                        (Some(name), Some(r_id)) => {
                            let sheet_id = sheet_id.unwrap_or(sheets.len() as u32 + 1);
                            sheets.push(SheetInfo {
                                name,
                                sheet_id,
                                r_id,
                                hidden,
                            });
                        }
                        _ => {
                            return Err(XlsxError::InvalidFormat(
                                "<sheet> without name or r:id".into(),
                            ))
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(sheets)
    }

    /// Read workbook.xml.rels to get sheet file paths
    fn read_workbook_rels<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<HashMap<String, String>> {
        let file = archive
            .by_name("xl/_rels/workbook.xml.rels")
            .map_err(|_| XlsxError::MissingPart("xl/_rels/workbook.xml.rels".into()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut rels = HashMap::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    let mut id = None;
                    let mut target = None;
                    let mut rel_type = None;

                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"Id" => id = attr_string(&attr),
                            b"Target" => target = attr_string(&attr),
                            b"Type" => rel_type = attr_string(&attr),
                            _ => {}
                        }
                    }

                    // Only include worksheet relationships
                    if let (Some(id), Some(target), Some(rel_type)) = (id, target, rel_type) {
                        if rel_type.ends_with("/worksheet") {
                            // Target is relative to the xl/ folder unless absolute
                            let full_path = match target.strip_prefix('/') {
                                Some(absolute) => absolute.to_string(),
                                None => format!("xl/{}", target),
                            };
                            rels.insert(id, full_path);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(rels)
    }

    /// Read the calculation chain (if present)
    fn read_calc_chain<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        first_sheet_id: u32,
    ) -> XlsxResult<CalcChain> {
        let file = match archive.by_name("xl/calcChain.xml") {
            Ok(f) => f,
            Err(_) => return Ok(CalcChain::new()),
        };

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut entries = Vec::new();
        // An entry without `i` belongs to the sheet of the entry before it
        let mut sheet_id = first_sheet_id;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"c" => {
                    let mut cell = None;
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"r" => cell = attr_string(&attr),
                            b"i" => {
                                if let Some(i) = attr_parse(&attr) {
                                    sheet_id = i;
                                }
                            }
                            _ => {}
                        }
                    }

                    let cell = cell.ok_or_else(|| {
                        XlsxError::InvalidFormat("calculation chain entry without r".into())
                    })?;
                    let cell = CellRef::parse(&cell).map_err(|e| {
                        XlsxError::Parse(format!("Invalid calc chain reference '{}': {}", cell, e))
                    })?;
                    entries.push(CalcChainEntry { sheet_id, cell });
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(CalcChain::from_entries(entries))
    }

    /// Read a worksheet from the archive
    fn read_worksheet<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        path: &str,
        info: &SheetInfo,
        shared_count: usize,
    ) -> XlsxResult<Worksheet> {
        let file = archive
            .by_name(path)
            .map_err(|_| XlsxError::MissingPart(path.to_string()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        // Inline strings keep their blanks
        xml_reader.trim_text(false);

        let mut buf = Vec::new();
        let mut columns: Vec<ColumnStyleRange> = Vec::new();
        let mut rows: Vec<Row> = Vec::new();

        // Current row state
        let mut row_attrs: Option<RowAttrs> = None;
        let mut row_cells: Vec<Cell> = Vec::new();
        let mut last_row = 0u32;

        // Current cell state
        let mut cell: Option<PendingCell> = None;
        let mut shared_formulas = SharedFormulas::new();
        let mut in_value = false;
        let mut in_formula = false;
        let mut in_inline_str = false;
        let mut in_inline_text = false;
        let mut in_phonetic = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"col" => columns.push(Self::parse_column(&e)?),
                    b"row" => {
                        let attrs = RowAttrs::parse(&e, last_row);
                        last_row = attrs.index;
                        row_attrs = Some(attrs);
                        row_cells.clear();
                    }
                    b"c" => {
                        let previous = row_cells.last().map_or(0, Cell::column_index);
                        cell = Some(PendingCell::parse(&e, previous, last_row)?);
                    }
                    b"v" if cell.is_some() => in_value = true,
                    b"f" => {
                        if let Some(cell) = cell.as_mut() {
                            in_formula = true;
                            cell.begin_formula(&e);
                        }
                    }
                    b"is" if cell.is_some() => in_inline_str = true,
                    b"rPh" => in_phonetic = true,
                    b"t" if in_inline_str && !in_phonetic => in_inline_text = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) => match e.name().as_ref() {
                    b"col" => columns.push(Self::parse_column(&e)?),
                    b"row" => {
                        let attrs = RowAttrs::parse(&e, last_row);
                        last_row = attrs.index;
                        rows.push(attrs.into_row(Vec::new())?);
                    }
                    b"c" => {
                        let previous = row_cells.last().map_or(0, Cell::column_index);
                        let pending = PendingCell::parse(&e, previous, last_row)?;
                        row_cells.push(pending.into_cell(shared_count, &mut shared_formulas)?);
                    }
                    b"f" => {
                        if let Some(cell) = cell.as_mut() {
                            cell.begin_formula(&e);
                        }
                    }
                    _ => {}
                },
                Ok(Event::Text(e)) => {
                    if let Some(cell) = cell.as_mut() {
                        if in_value {
                            cell.value
                                .get_or_insert_with(String::new)
                                .push_str(&e.unescape()?);
                        } else if in_formula {
                            if let Some(formula) = cell.formula.as_mut() {
                                formula.push_str(&e.unescape()?);
                            }
                        } else if in_inline_text {
                            cell.inline.push_str(&e.unescape()?);
                        }
                    }
                }
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"v" => in_value = false,
                    b"f" => in_formula = false,
                    b"t" => in_inline_text = false,
                    b"rPh" => in_phonetic = false,
                    b"is" => in_inline_str = false,
                    b"c" => {
                        if let Some(pending) = cell.take() {
                            row_cells.push(pending.into_cell(shared_count, &mut shared_formulas)?);
                        }
                    }
                    b"row" => {
                        if let Some(attrs) = row_attrs.take() {
                            rows.push(attrs.into_row(std::mem::take(&mut row_cells))?);
                        }
                    }
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        let columns = ColumnStyleRanges::from_ranges(columns)?;
        let mut worksheet = Worksheet::from_stored(info.name.clone(), info.sheet_id, rows, columns)?;
        worksheet.set_visible(!info.hidden);

        log::debug!(
            "read sheet '{}' from {}: {} row(s)",
            info.name,
            path,
            worksheet.row_count()
        );
        Ok(worksheet)
    }

    /// Parse a `<col>` element into a column range
    fn parse_column(e: &BytesStart<'_>) -> XlsxResult<ColumnStyleRange> {
        let mut min = None;
        let mut max = None;
        let mut format = ColumnFormat::new();

        for attr in e.attributes().flatten() {
            match attr.key.as_ref() {
                b"min" => min = attr_parse::<u32>(&attr),
                b"max" => max = attr_parse::<u32>(&attr),
                b"width" => format.width = attr_parse(&attr),
                b"customWidth" => {
                    format.custom_width = attr_string(&attr).map_or(false, |s| is_true(&s))
                }
                b"hidden" => format.hidden = attr_string(&attr).map_or(false, |s| is_true(&s)),
                b"style" => format.style_index = attr_parse(&attr),
                b"bestFit" => format.best_fit = attr_string(&attr).map_or(false, |s| is_true(&s)),
                b"outlineLevel" => format.outline_level = attr_parse(&attr).unwrap_or(0),
                b"collapsed" => {
                    format.collapsed = attr_string(&attr).map_or(false, |s| is_true(&s))
                }
                _ => {}
            }
        }

        match (min, max) {
            (Some(min), Some(max)) => Ok(ColumnStyleRange::new(min, max, format)),
            _ => Err(XlsxError::InvalidFormat("<col> without min or max".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sheetwright_core::StyleTable;
    use std::io::{Cursor, Write};

    #[test]
    fn test_decode_excel_escapes() {
        assert_eq!(decode_excel_escapes("hello_x000d_world"), "hello\rworld");
        assert_eq!(decode_excel_escapes("col1_x0009_col2"), "col1\tcol2");
        assert_eq!(
            decode_excel_escapes("line1_x000d__x000a_line2"),
            "line1\r\nline2"
        );
        assert_eq!(decode_excel_escapes("under_x005f_score"), "under_score");
        assert_eq!(decode_excel_escapes("_x000D_"), "\r");
        assert_eq!(decode_excel_escapes("plain text"), "plain text");
    }

    #[test]
    fn test_decode_excel_escapes_partial_sequence() {
        assert_eq!(decode_excel_escapes("_x00"), "_x00");
        assert_eq!(decode_excel_escapes("_x000d"), "_x000d");
        assert_eq!(decode_excel_escapes("_xzzzz_"), "_xzzzz_");
        assert_eq!(decode_excel_escapes("ä_x00e4_ö"), "ääö");
    }

    const CONTENT_TYPES: &[u8] = br#"<?xml version="1.0"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/></Types>"#;
    const WORKBOOK: &[u8] = br#"<?xml version="1.0"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Daten" sheetId="3" r:id="rId1"/><sheet name="Hidden" sheetId="5" state="hidden" r:id="rId2"/></sheets></workbook>"#;
    const WORKBOOK_RELS: &[u8] = br#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="/xl/worksheets/sheet2.xml"/></Relationships>"#;
    const SHARED_STRINGS: &[u8] = br#"<?xml version="1.0"?><sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="3" uniqueCount="3"><si><t>Hallo</t></si><si><r><t xml:space="preserve">rich </t></r><r><t>text</t></r><rPh><t>ignored</t></rPh></si><si><t xml:space="preserve">  padded </t></si></sst>"#;
    const STYLES: &[u8] = br#"<?xml version="1.0"?><styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><cellStyleXfs count="1"><xf numFmtId="0"/></cellStyleXfs><cellXfs count="3"><xf numFmtId="0"/><xf numFmtId="1"/><xf numFmtId="2"><alignment/></xf></cellXfs></styleSheet>"#;
    const CALC_CHAIN: &[u8] = br#"<?xml version="1.0"?><calcChain xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><c r="D2" i="3"/><c r="A1"/></calcChain>"#;
    const SHEET1: &[u8] = br#"<?xml version="1.0"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><cols><col min="1" max="2" width="14.5" customWidth="1"/><col min="4" max="4" hidden="1" width="3"/></cols><sheetData><row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="inlineStr"><is><t xml:space="preserve"> inline_x000a_</t></is></c><c r="C1" t="b"><v>1</v></c></row><row r="2" ht="30" customHeight="1"><c r="B2"><v>5</v></c><c t="s"><v>1</v></c><c r="D2" s="2"><f>B2*2</f><v>10</v></c><c r="F2" s="1"/></row><row r="4" hidden="1"/></sheetData></worksheet>"#;
    const SHEET2: &[u8] = br#"<?xml version="1.0"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData><row r="1"><c r="A1" t="e"><v>#DIV/0!</v></c><c r="B1" t="s"><v>2</v></c></row></sheetData></worksheet>"#;

    fn package(parts: &[(&str, &[u8])]) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let cursor = Cursor::new(&mut buf);
            let mut zip = zip::ZipWriter::new(cursor);
            let options = zip::write::SimpleFileOptions::default();
            for (name, content) in parts {
                zip.start_file(*name, options).unwrap();
                zip.write_all(content).unwrap();
            }
            zip.finish().unwrap();
        }
        buf
    }

    fn full_package() -> Vec<u8> {
        package(&[
            ("[Content_Types].xml", CONTENT_TYPES),
            ("xl/workbook.xml", WORKBOOK),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
            ("xl/sharedStrings.xml", SHARED_STRINGS),
            ("xl/styles.xml", STYLES),
            ("xl/calcChain.xml", CALC_CHAIN),
            ("xl/worksheets/sheet1.xml", SHEET1),
            ("xl/worksheets/sheet2.xml", SHEET2),
        ])
    }

    #[test]
    fn test_read_sheets_and_parts() {
        let workbook = XlsxReader::read(Cursor::new(full_package())).unwrap();

        assert_eq!(workbook.sheet_count(), 2);
        let daten = workbook.worksheet(0).unwrap();
        assert_eq!(daten.name(), "Daten");
        assert_eq!(daten.sheet_id(), 3);
        assert!(daten.is_visible());
        assert!(!workbook.worksheet(1).unwrap().is_visible());

        let pool = workbook.shared_values();
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.resolve(1).unwrap(), "rich text");
        assert_eq!(pool.resolve(2).unwrap(), "  padded ");

        assert_eq!(workbook.stylesheet().cell_format_count(), 3);
        assert_eq!(workbook.stylesheet().part(), Some(STYLES));

        let chain: Vec<_> = workbook
            .calc_chain()
            .entries()
            .iter()
            .map(|e| (e.sheet_id, e.cell.to_string()))
            .collect();
        // A1 holds text, so its entry is dropped
        assert_eq!(chain, vec![(3, "D2".to_string())]);
    }

    const SHARED_SHEET: &[u8] = br#"<?xml version="1.0"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData><row r="1"><c r="A1"><v>1</v></c><c r="B1"><f t="shared" ref="B1:C2" si="0">A1*2</f><v>2</v></c><c r="C1"><f t="shared" si="0"/><v>4</v></c><c r="D1"><f t="shared" si="7"/><v>9</v></c></row><row r="2"><c r="A2"><v>2</v></c><c r="B2"><f t="shared" si="0"></f><v>4</v></c><c r="C2"><f t="shared" si="0"/><v>8</v></c></row></sheetData></worksheet>"#;
    const SHARED_CHAIN: &[u8] = br#"<?xml version="1.0"?><calcChain xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><c r="B1" i="3"/><c r="C1"/><c r="D1"/><c r="B2"/><c r="C2"/></calcChain>"#;

    fn shared_formula_package() -> Vec<u8> {
        package(&[
            ("[Content_Types].xml", CONTENT_TYPES),
            ("xl/workbook.xml", WORKBOOK),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
            ("xl/calcChain.xml", SHARED_CHAIN),
            ("xl/worksheets/sheet1.xml", SHARED_SHEET),
            ("xl/worksheets/sheet2.xml", EMPTY_SHEET),
        ])
    }

    const EMPTY_SHEET: &[u8] = br#"<?xml version="1.0"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData/></worksheet>"#;

    #[test]
    fn test_read_shared_formula_group() {
        let workbook = XlsxReader::read(Cursor::new(shared_formula_package())).unwrap();
        let sheet = workbook.worksheet(0).unwrap();

        assert_eq!(sheet.cell("B1").unwrap().formula(), Some("A1*2"));
        assert_eq!(sheet.cell("B2").unwrap().formula(), Some("A2*2"));
        assert_eq!(sheet.cell("C1").unwrap().formula(), Some("B1*2"));
        assert_eq!(sheet.cell("C2").unwrap().formula(), Some("B2*2"));
    }

    /// A cell of a group without anchor keeps its cached value and leaves the chain
    #[test]
    fn test_read_shared_formula_without_anchor() {
        let workbook = XlsxReader::read(Cursor::new(shared_formula_package())).unwrap();
        let sheet = workbook.worksheet(0).unwrap();

        assert_eq!(sheet.cell("D1").unwrap().value(), &CellValue::Number(9.0));
        let chain: Vec<_> = workbook
            .calc_chain()
            .entries()
            .iter()
            .map(|e| e.cell.to_string())
            .collect();
        assert_eq!(chain, vec!["B1", "C1", "B2", "C2"]);
    }

    #[test]
    fn test_read_cells() {
        let workbook = XlsxReader::read(Cursor::new(full_package())).unwrap();
        let pool = workbook.shared_values();
        let sheet = workbook.worksheet(0).unwrap();

        assert_eq!(sheet.cell("A1").unwrap().value(), &CellValue::Shared(0));
        assert_eq!(sheet.cell("A1").unwrap().value_text(pool).unwrap(), "Hallo");
        assert_eq!(
            sheet.cell("B1").unwrap().value(),
            &CellValue::Text(" inline\n".into())
        );
        assert_eq!(sheet.cell("C1").unwrap().value(), &CellValue::Boolean(true));

        // C2 has no reference and follows B2
        assert_eq!(sheet.cell("B2").unwrap().value(), &CellValue::Number(5.0));
        assert_eq!(sheet.cell("C2").unwrap().value(), &CellValue::Shared(1));
        let formula = sheet.cell("D2").unwrap();
        assert_eq!(formula.formula(), Some("B2*2"));
        assert_eq!(formula.style_index(), Some(2));
        assert_eq!(sheet.cell("F2").unwrap().style_index(), Some(1));

        let errors = workbook.worksheet(1).unwrap();
        assert_eq!(
            errors.cell("A1").unwrap().value(),
            &CellValue::Error("#DIV/0!".into())
        );
    }

    #[test]
    fn test_read_materializes_sparse_rows() {
        let workbook = XlsxReader::read(Cursor::new(full_package())).unwrap();
        let row = workbook.worksheet(0).unwrap().row(2).unwrap();

        let labels: Vec<_> = row.cells().iter().map(Cell::column_label).collect();
        assert_eq!(labels, vec!["A", "B", "C", "D", "E", "F"]);
        assert!(row.cells()[0].is_placeholder());
        assert!(row.cells()[4].is_placeholder());
        assert_eq!(row.height, Some(30.0));
    }

    #[test]
    fn test_read_rows_and_columns() {
        let workbook = XlsxReader::read(Cursor::new(full_package())).unwrap();
        let sheet = workbook.worksheet(0).unwrap();

        let indices: Vec<_> = sheet.rows().iter().map(Row::index).collect();
        assert_eq!(indices, vec![1, 2, 4]);
        assert!(sheet.row(4).unwrap().hidden);

        let ranges = sheet.columns().ranges();
        assert_eq!(ranges.len(), 2);
        assert_eq!((ranges[0].min, ranges[0].max), (1, 2));
        assert_eq!(ranges[0].format.width, Some(14.5));
        assert!(ranges[0].format.custom_width);
        assert!(ranges[1].format.hidden);
    }

    #[test]
    fn test_shared_string_out_of_bounds() {
        let sheet = br#"<worksheet><sheetData><row r="1"><c r="A1" t="s"><v>7</v></c></row></sheetData></worksheet>"#;
        let data = package(&[
            ("[Content_Types].xml", CONTENT_TYPES),
            ("xl/workbook.xml", WORKBOOK),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
            ("xl/worksheets/sheet1.xml", sheet),
            ("xl/worksheets/sheet2.xml", SHEET2),
        ]);

        assert!(matches!(
            XlsxReader::read(Cursor::new(data)),
            Err(XlsxError::Parse(_))
        ));
    }

    #[test]
    fn test_read_requires_content_types() {
        let data = package(&[("xl/workbook.xml", WORKBOOK)]);
        assert!(matches!(
            XlsxReader::read(Cursor::new(data)),
            Err(XlsxError::InvalidFormat(_))
        ));
    }
}
