//! Store options

/// How parts are compressed inside the package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// Deflate every part
    #[default]
    Deflated,
    /// Store parts uncompressed
    Stored,
}

impl Compression {
    pub(crate) fn method(self) -> zip::CompressionMethod {
        match self {
            Compression::Deflated => zip::CompressionMethod::Deflated,
            Compression::Stored => zip::CompressionMethod::Stored,
        }
    }
}

/// Options for opening or creating an [`XlsxStore`](crate::XlsxStore)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// Allow saving back to the package
    pub editable: bool,
    /// Compression used when saving
    pub compression: Compression,
}

impl StoreOptions {
    /// Options for a package that is only read
    pub fn read_only() -> Self {
        Self {
            editable: false,
            ..Self::default()
        }
    }
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            editable: true,
            compression: Compression::Deflated,
        }
    }
}
