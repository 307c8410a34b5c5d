use festa_common::Money;

use crate::{
    db_types::Package,
    traits::BookingError,
};

/// Read-only window onto the package catalog. Catalog management lives in another service; the
/// engine only ever needs "what does this package cost right now".
#[allow(async_fn_in_trait)]
pub trait PackageCatalog {
    async fn fetch_package(&self, package_id: i64) -> Result<Option<Package>, BookingError>;

    /// The current catalog price, with a missing package turned into an error.
    async fn package_price(&self, package_id: i64) -> Result<Money, BookingError> {
        let package = self.fetch_package(package_id).await?.ok_or(BookingError::PackageNotFound(package_id))?;
        Ok(package.price)
    }
}
