use widestring::U16CString;
use windows::core::{PCWSTR, PWSTR};
use windows::Win32::Foundation::{
    ERROR_MORE_DATA, ERROR_NO_MORE_ITEMS, ERROR_SUCCESS, ERROR_UNKNOWN_PRODUCT,
    ERROR_UNKNOWN_PROPERTY,
};
use windows::Win32::System::ApplicationInstallationAndServicing::{
    MsiEnumRelatedProductsW, MsiGetProductInfoW,
};

use crate::guid::Guid;
use crate::property::MsiProperty;
use crate::query::{InstallerQuery, QueryOutcome};

// Enough for install paths and URLs; grown once on ERROR_MORE_DATA.
const PROPERTY_BUFFER_LEN: usize = 512;
// 38-char braced GUID plus the terminator.
const PRODUCT_CODE_BUFFER_LEN: usize = 39;

/// Live Windows Installer, one synchronous native call per query.
/// Buffers are per-call locals, so the type is freely shareable.
pub struct MsiInstaller;

impl InstallerQuery for MsiInstaller {
    fn product_property(&self, product: &Guid, property: MsiProperty) -> QueryOutcome<String> {
        // Braced GUID text and the property tokens never contain NUL.
        let product_wide = U16CString::from_str(product.to_string()).unwrap();
        let property_wide = U16CString::from_str(property.token()).unwrap();

        let mut buffer = vec![0u16; PROPERTY_BUFFER_LEN];
        let mut len = buffer.len() as u32;
        let mut result = unsafe {
            MsiGetProductInfoW(
                PCWSTR::from_raw(product_wide.as_ptr()),
                PCWSTR::from_raw(property_wide.as_ptr()),
                PWSTR::from_raw(buffer.as_mut_ptr()),
                Some(&mut len),
            )
        };
        if result == ERROR_MORE_DATA.0 {
            // len now holds the required count, excluding the terminator.
            buffer = vec![0u16; len as usize + 1];
            len = buffer.len() as u32;
            result = unsafe {
                MsiGetProductInfoW(
                    PCWSTR::from_raw(product_wide.as_ptr()),
                    PCWSTR::from_raw(property_wide.as_ptr()),
                    PWSTR::from_raw(buffer.as_mut_ptr()),
                    Some(&mut len),
                )
            };
        }
        log::debug!(
            "MsiGetProductInfoW({}, {}) -> {}",
            product,
            property.token(),
            result
        );

        match result {
            code if code == ERROR_SUCCESS.0 => {
                QueryOutcome::Found(String::from_utf16_lossy(&buffer[..len as usize]))
            }
            code if code == ERROR_UNKNOWN_PRODUCT.0 || code == ERROR_UNKNOWN_PROPERTY.0 => {
                QueryOutcome::NotFound
            }
            code => QueryOutcome::error(code, "MsiGetProductInfoW"),
        }
    }

    fn related_product(&self, upgrade: &Guid, index: u32) -> QueryOutcome<String> {
        let upgrade_wide = U16CString::from_str(upgrade.to_string()).unwrap();

        let mut buffer = [0u16; PRODUCT_CODE_BUFFER_LEN];
        let result = unsafe {
            MsiEnumRelatedProductsW(
                PCWSTR::from_raw(upgrade_wide.as_ptr()),
                0,
                index,
                PWSTR::from_raw(buffer.as_mut_ptr()),
            )
        };
        log::debug!("MsiEnumRelatedProductsW({}, {}) -> {}", upgrade, index, result);

        match result {
            code if code == ERROR_SUCCESS.0 => {
                let end = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
                QueryOutcome::Found(String::from_utf16_lossy(&buffer[..end]))
            }
            code if code == ERROR_NO_MORE_ITEMS.0 => QueryOutcome::NotFound,
            code => QueryOutcome::error(code, "MsiEnumRelatedProductsW"),
        }
    }
}
