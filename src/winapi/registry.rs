use widestring::U16CString;
use windows::core::PCWSTR;
use windows::Win32::Foundation::{ERROR_FILE_NOT_FOUND, ERROR_MORE_DATA, ERROR_SUCCESS};
use windows::Win32::System::Registry::{
    RegCloseKey, RegOpenKeyExW, RegQueryValueExW, HKEY, HKEY_LOCAL_MACHINE, KEY_READ,
    REG_EXPAND_SZ, REG_SZ, REG_VALUE_TYPE,
};

use crate::guid::Guid;
use crate::query::{ConfigStore, QueryOutcome};

const PRODUCTS_PREFIX: &str =
    r"SOFTWARE\Microsoft\Windows\CurrentVersion\Installer\UserData\S-1-5-18\Products\";
const INSTALL_PROPERTIES_SUFFIX: &str = r"\InstallProperties";

/// Open registry key, closed on drop so every exit path releases it.
struct ScopedKey(HKEY);

impl Drop for ScopedKey {
    fn drop(&mut self) {
        let _ = unsafe { RegCloseKey(self.0) };
    }
}

/// Fallback source: the system-wide (S-1-5-18) installer hive under HKLM.
/// Per-user installs have no key here, which reads as NotFound.
pub struct SystemConfigStore;

impl ConfigStore for SystemConfigStore {
    fn install_property(&self, product: &Guid, value_name: &str) -> QueryOutcome<String> {
        let path = format!(
            "{}{}{}",
            PRODUCTS_PREFIX,
            product.registry_path_segment(),
            INSTALL_PROPERTIES_SUFFIX
        );
        log::debug!("opening {}", path);

        let path_wide = U16CString::from_str(&path).unwrap();
        let mut raw_key = HKEY(0);
        let open = unsafe {
            RegOpenKeyExW(
                HKEY_LOCAL_MACHINE,
                PCWSTR::from_raw(path_wide.as_ptr()),
                0,
                KEY_READ,
                &mut raw_key as *mut HKEY,
            )
        };
        match open {
            code if code == ERROR_SUCCESS => {}
            code if code == ERROR_FILE_NOT_FOUND => return QueryOutcome::NotFound,
            code => return QueryOutcome::error(code.0, "RegOpenKeyExW"),
        }
        let key = ScopedKey(raw_key);

        let value_wide = U16CString::from_str(value_name).unwrap();
        let mut kind = REG_VALUE_TYPE(0);
        let mut data = vec![0u8; 256];
        let mut data_len = data.len() as u32;
        let mut result = unsafe {
            RegQueryValueExW(
                key.0,
                PCWSTR::from_raw(value_wide.as_ptr()),
                None,
                Some(&mut kind),
                Some(data.as_mut_ptr()),
                Some(&mut data_len),
            )
        };
        if result == ERROR_MORE_DATA {
            data = vec![0u8; data_len as usize];
            result = unsafe {
                RegQueryValueExW(
                    key.0,
                    PCWSTR::from_raw(value_wide.as_ptr()),
                    None,
                    Some(&mut kind),
                    Some(data.as_mut_ptr()),
                    Some(&mut data_len),
                )
            };
        }

        match result {
            code if code == ERROR_SUCCESS => {}
            code if code == ERROR_FILE_NOT_FOUND => return QueryOutcome::NotFound,
            code => return QueryOutcome::error(code.0, "RegQueryValueExW"),
        }
        if kind != REG_SZ && kind != REG_EXPAND_SZ {
            log::warn!("{}\\{} is not a string value", path, value_name);
            return QueryOutcome::NotFound;
        }

        let units: Vec<u16> = data[..data_len as usize]
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .take_while(|&c| c != 0)
            .collect();
        QueryOutcome::Found(String::from_utf16_lossy(&units))
    }
}
