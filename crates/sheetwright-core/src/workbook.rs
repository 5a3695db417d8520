//! Workbook type - the main document structure

use crate::calc_chain::{CalcChain, SheetCalcChain};
use crate::cell::Cell;
use crate::error::{Error, Result};
use crate::pool::SharedValuePool;
use crate::row::Row;
use crate::style::Stylesheet;
use crate::worksheet::Worksheet;
use crate::MAX_SHEET_NAME_LEN;

/// A workbook (spreadsheet document)
///
/// A workbook owns its worksheets, the one shared value pool every sheet's
/// cells point into, the stylesheet and the calculation chain.
#[derive(Debug, Clone)]
pub struct Workbook {
    /// Worksheets in the workbook
    worksheets: Vec<Worksheet>,
    /// Shared value pool
    shared_values: SharedValuePool,
    /// Cell formats referenced by style index
    stylesheet: Stylesheet,
    /// Formula cells in calculation order
    calc_chain: CalcChain,
    /// Workbook settings
    settings: WorkbookSettings,
}

impl Workbook {
    /// Create a new workbook with one empty worksheet
    pub fn new() -> Self {
        Self::with_settings(WorkbookSettings::default())
    }

    /// Create a new workbook with one empty worksheet named after the settings
    pub fn with_settings(settings: WorkbookSettings) -> Self {
        let first = Worksheet::new(settings.first_sheet_name.clone(), 1);
        Self {
            worksheets: vec![first],
            settings,
            ..Self::empty()
        }
    }

    /// Create an empty workbook with no worksheets
    pub fn empty() -> Self {
        Self {
            worksheets: Vec::new(),
            shared_values: SharedValuePool::new(),
            stylesheet: Stylesheet::new(),
            calc_chain: CalcChain::new(),
            settings: WorkbookSettings::default(),
        }
    }

    /// Assemble a workbook from parts read by a document store
    pub fn from_parts(
        worksheets: Vec<Worksheet>,
        shared_values: SharedValuePool,
        stylesheet: Stylesheet,
        calc_chain: CalcChain,
        settings: WorkbookSettings,
    ) -> Result<Self> {
        let mut workbook = Self {
            worksheets: Vec::with_capacity(worksheets.len()),
            shared_values,
            stylesheet,
            calc_chain,
            settings,
        };
        for worksheet in worksheets {
            workbook.add_existing_worksheet(worksheet)?;
        }
        Ok(workbook)
    }

    /// Get the number of worksheets
    pub fn sheet_count(&self) -> usize {
        self.worksheets.len()
    }

    /// Check if the workbook has no worksheets
    pub fn is_empty(&self) -> bool {
        self.worksheets.is_empty()
    }

    /// Get a worksheet by index
    pub fn worksheet(&self, index: usize) -> Option<&Worksheet> {
        self.worksheets.get(index)
    }

    /// Get a mutable worksheet by index
    pub fn worksheet_mut(&mut self, index: usize) -> Option<&mut Worksheet> {
        self.worksheets.get_mut(index)
    }

    /// Get a worksheet by name
    pub fn worksheet_by_name(&self, name: &str) -> Option<&Worksheet> {
        self.worksheets.iter().find(|ws| ws.name() == name)
    }

    /// Get a mutable worksheet by name
    pub fn worksheet_by_name_mut(&mut self, name: &str) -> Option<&mut Worksheet> {
        self.worksheets.iter_mut().find(|ws| ws.name() == name)
    }

    /// Get the index of a worksheet by name
    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.worksheets.iter().position(|ws| ws.name() == name)
    }

    /// Iterate over all worksheets
    pub fn worksheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.worksheets.iter()
    }

    /// A worksheet together with its calculation chain entries
    ///
    /// Pass the chain to the worksheet's shifting operations so formula
    /// cells stay listed under their new references.
    pub fn worksheet_with_calc_chain(
        &mut self,
        index: usize,
    ) -> Result<(&mut Worksheet, SheetCalcChain<'_>)> {
        let count = self.worksheets.len();
        let worksheet = self
            .worksheets
            .get_mut(index)
            .ok_or(Error::SheetOutOfBounds(index, count))?;
        let chain = self.calc_chain.for_sheet(worksheet.sheet_id());
        Ok((worksheet, chain))
    }

    /// Add a new worksheet with default name
    pub fn add_worksheet(&mut self) -> Result<usize> {
        let name = self.generate_sheet_name();
        self.add_worksheet_with_name(&name)
    }

    /// Add a new worksheet with specified name
    pub fn add_worksheet_with_name(&mut self, name: &str) -> Result<usize> {
        self.validate_sheet_name(name)?;

        let index = self.worksheets.len();
        let worksheet = Worksheet::new(name, self.next_sheet_id());
        self.worksheets.push(worksheet);

        Ok(index)
    }

    /// Add an existing worksheet to the workbook
    pub fn add_existing_worksheet(&mut self, worksheet: Worksheet) -> Result<usize> {
        self.validate_sheet_name(worksheet.name())?;
        if self
            .worksheets
            .iter()
            .any(|ws| ws.sheet_id() == worksheet.sheet_id())
        {
            return Err(Error::InvalidState(format!(
                "sheet id {} is already in use",
                worksheet.sheet_id()
            )));
        }
        let index = self.worksheets.len();
        self.worksheets.push(worksheet);
        Ok(index)
    }

    /// Remove a worksheet by index, dropping its calculation chain entries
    pub fn remove_worksheet(&mut self, index: usize) -> Result<Worksheet> {
        if index >= self.worksheets.len() {
            return Err(Error::SheetOutOfBounds(index, self.worksheets.len()));
        }

        let worksheet = self.worksheets.remove(index);
        self.calc_chain.remove_sheet(worksheet.sheet_id());
        Ok(worksheet)
    }

    /// Rename a worksheet
    pub fn rename_worksheet(&mut self, index: usize, new_name: &str) -> Result<()> {
        if index >= self.worksheets.len() {
            return Err(Error::SheetOutOfBounds(index, self.worksheets.len()));
        }

        // Validate the new name (excluding current sheet from duplicate check)
        self.validate_sheet_name_excluding(new_name, Some(index))?;

        self.worksheets[index].set_name(new_name);
        Ok(())
    }

    /// The shared value pool
    pub fn shared_values(&self) -> &SharedValuePool {
        &self.shared_values
    }

    /// The mutable shared value pool
    pub fn shared_values_mut(&mut self) -> &mut SharedValuePool {
        &mut self.shared_values
    }

    /// The stylesheet
    pub fn stylesheet(&self) -> &Stylesheet {
        &self.stylesheet
    }

    /// Replace the stylesheet
    pub fn set_stylesheet(&mut self, stylesheet: Stylesheet) {
        self.stylesheet = stylesheet;
    }

    /// The calculation chain
    pub fn calc_chain(&self) -> &CalcChain {
        &self.calc_chain
    }

    /// The mutable calculation chain
    pub fn calc_chain_mut(&mut self) -> &mut CalcChain {
        &mut self.calc_chain
    }

    /// Get workbook settings
    pub fn settings(&self) -> &WorkbookSettings {
        &self.settings
    }

    /// Get mutable workbook settings
    pub fn settings_mut(&mut self) -> &mut WorkbookSettings {
        &mut self.settings
    }

    // ==================== Cross-Document Copy ====================

    /// Create a workbook that shares this one's stylesheet and mirrors its
    /// sheets without any rows
    ///
    /// Each mirrored sheet keeps its name and column formats. With
    /// `sheet_name`, only that sheet is mirrored.
    pub fn copy_with_style(&self, sheet_name: Option<&str>) -> Result<Workbook> {
        let sources: Vec<&Worksheet> = match sheet_name {
            Some(name) => vec![self
                .worksheet_by_name(name)
                .ok_or_else(|| Error::SheetNotFound(name.into()))?],
            None => self.worksheets.iter().collect(),
        };

        let mut copy = Workbook::empty();
        copy.stylesheet = self.stylesheet.clone();
        copy.settings = self.settings.clone();
        for source in sources {
            let index = copy.add_worksheet_with_name(source.name())?;
            *copy.worksheets[index].columns_mut() = source.columns().clone();
        }

        log::debug!(
            "copied style of {} sheet(s) into a new workbook",
            copy.sheet_count()
        );
        Ok(copy)
    }

    /// Append a copy of a row of another workbook to one of this workbook's
    /// sheets (see [`Worksheet::copy_row_from_other_document`])
    pub fn copy_row_from_other_document(
        &mut self,
        sheet_index: usize,
        source: &Workbook,
        source_sheet: usize,
        row_index: u32,
    ) -> Result<&mut Row> {
        let row = source
            .worksheet(source_sheet)
            .ok_or(Error::SheetOutOfBounds(source_sheet, source.sheet_count()))?
            .row(row_index)
            .ok_or_else(|| Error::not_found(format!("row {}", row_index)))?;

        let count = self.worksheets.len();
        let worksheet = self
            .worksheets
            .get_mut(sheet_index)
            .ok_or(Error::SheetOutOfBounds(sheet_index, count))?;
        worksheet.copy_row_from_other_document(
            row,
            &source.shared_values,
            &mut self.shared_values,
            &self.stylesheet,
        )
    }

    /// Insert copies of cells of another workbook into row `row_index` of
    /// one of this workbook's sheets
    ///
    /// Shifted formula cells are repointed in this workbook's calculation
    /// chain (see [`Worksheet::copy_cells_from_other_document`]).
    pub fn copy_cells_from_other_document(
        &mut self,
        sheet_index: usize,
        row_index: u32,
        source: &Workbook,
        cells: &[Cell],
    ) -> Result<()> {
        let count = self.worksheets.len();
        let worksheet = self
            .worksheets
            .get_mut(sheet_index)
            .ok_or(Error::SheetOutOfBounds(sheet_index, count))?;
        let mut formulas = self.calc_chain.for_sheet(worksheet.sheet_id());
        worksheet.copy_cells_from_other_document(
            row_index,
            cells,
            &source.shared_values,
            &mut self.shared_values,
            &self.stylesheet,
            &mut formulas,
        )
    }

    // ==================== Sheet Names ====================

    /// Validate a sheet name
    fn validate_sheet_name(&self, name: &str) -> Result<()> {
        self.validate_sheet_name_excluding(name, None)
    }

    /// Validate a sheet name, optionally excluding a sheet from duplicate check
    fn validate_sheet_name_excluding(
        &self,
        name: &str,
        exclude_index: Option<usize>,
    ) -> Result<()> {
        if name.is_empty() {
            return Err(Error::InvalidSheetName("Sheet name cannot be empty".into()));
        }
        if name.chars().count() > MAX_SHEET_NAME_LEN {
            return Err(Error::InvalidSheetName(format!(
                "Sheet name too long (max {} characters)",
                MAX_SHEET_NAME_LEN
            )));
        }

        const INVALID_CHARS: &[char] = &[':', '\\', '/', '?', '*', '[', ']'];
        if let Some(c) = name.chars().find(|c| INVALID_CHARS.contains(c)) {
            return Err(Error::InvalidSheetName(format!(
                "Sheet name cannot contain '{}'",
                c
            )));
        }

        // Case-insensitive
        let name_lower = name.to_lowercase();
        for (i, ws) in self.worksheets.iter().enumerate() {
            if Some(i) != exclude_index && ws.name().to_lowercase() == name_lower {
                return Err(Error::DuplicateSheetName(name.into()));
            }
        }

        Ok(())
    }

    /// Generate a unique sheet name
    fn generate_sheet_name(&self) -> String {
        let mut n = self.worksheets.len() + 1;
        loop {
            let name = format!("Sheet{}", n);
            if self.validate_sheet_name(&name).is_ok() {
                return name;
            }
            n += 1;
        }
    }

    fn next_sheet_id(&self) -> u32 {
        self.worksheets
            .iter()
            .map(Worksheet::sheet_id)
            .max()
            .map_or(1, |id| id + 1)
    }
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

/// Workbook-level settings
#[derive(Debug, Clone)]
pub struct WorkbookSettings {
    /// Name of the sheet a new workbook starts with
    pub first_sheet_name: String,
    /// Ask consumers to recalculate every formula when they open the document
    pub calc_on_open: bool,
}

impl Default for WorkbookSettings {
    fn default() -> Self {
        Self {
            first_sheet_name: "Sheet1".into(),
            calc_on_open: true,
        }
    }
}
