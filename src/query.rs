use crate::guid::Guid;
use crate::property::MsiProperty;

/// ERROR_NOT_SUPPORTED, reported when a fallback read is requested for a
/// property with no registry mapping.
pub const CODE_NOT_SUPPORTED: u32 = 50;

/// Outcome of a single installer or registry query. NotFound is routine
/// (missing property, per-user install, absent key) and is what triggers
/// the registry fallback; Error is an anomaly that stops the lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome<T> {
    Found(T),
    NotFound,
    Error { code: u32, message: String },
}

impl<T> QueryOutcome<T> {
    pub fn error(code: u32, context: &str) -> Self {
        QueryOutcome::Error {
            code,
            message: format!("{}: {} ({:#x})", context, code, code),
        }
    }
}

/// The two native installer entry points, behind a seam so the paging and
/// resolution protocols can be driven by scripted fakes in tests.
pub trait InstallerQuery {
    /// MsiGetProductInfoW equivalent: one property of one product.
    fn product_property(&self, product: &Guid, property: MsiProperty) -> QueryOutcome<String>;

    /// MsiEnumRelatedProductsW equivalent: the product code at the given
    /// zero-based page index among products sharing the upgrade code.
    /// NotFound means the enumeration is complete.
    fn related_product(&self, upgrade: &Guid, index: u32) -> QueryOutcome<String>;
}

/// Read access to the per-product InstallProperties key in the
/// system-wide installer hive.
pub trait ConfigStore {
    fn install_property(&self, product: &Guid, value_name: &str) -> QueryOutcome<String>;
}
