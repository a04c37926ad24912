use std::fmt;

/// Vendors with a dedicated parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vendor {
    Thorlabs,
    MiniCircuits,
}

impl Vendor {
    /// Brand string written into the record.
    pub fn display_name(&self) -> &'static str {
        match self {
            Vendor::Thorlabs => "Thorlabs",
            Vendor::MiniCircuits => "Mini-Circuits",
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
