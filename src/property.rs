/// Well-known product properties understood by MsiGetProductInfoW.
/// Closed set; each variant maps 1:1 onto a native token string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MsiProperty {
    HelpLink,
    HelpTelephone,
    InstallDate,
    InstalledLanguage,
    InstalledProductName,
    InstallLocation,
    InstallSource,
    LocalPackage,
    Publisher,
    UrlInfoAbout,
    UrlUpdateInfo,
    VersionMinor,
    VersionMajor,
    VersionString,
}

impl MsiProperty {
    pub fn token(&self) -> &'static str {
        match self {
            MsiProperty::HelpLink => "INSTALLPROPERTY_HELPLINK",
            MsiProperty::HelpTelephone => "INSTALLPROPERTY_HELPTELEPHONE",
            MsiProperty::InstallDate => "INSTALLPROPERTY_INSTALLDATE",
            MsiProperty::InstalledLanguage => "INSTALLPROPERTY_INSTALLEDLANGUAGE",
            MsiProperty::InstalledProductName => "INSTALLPROPERTY_INSTALLEDPRODUCTNAME",
            MsiProperty::InstallLocation => "INSTALLPROPERTY_INSTALLLOCATION",
            MsiProperty::InstallSource => "INSTALLPROPERTY_INSTALLSOURCE",
            MsiProperty::LocalPackage => "INSTALLPROPERTY_LOCALPACKAGE",
            MsiProperty::Publisher => "INSTALLPROPERTY_PUBLISHER",
            MsiProperty::UrlInfoAbout => "INSTALLPROPERTY_URLINFOABOUT",
            MsiProperty::UrlUpdateInfo => "INSTALLPROPERTY_URLUPDATEINFO",
            MsiProperty::VersionMinor => "INSTALLPROPERTY_VERSIONMINOR",
            MsiProperty::VersionMajor => "INSTALLPROPERTY_VERSIONMAJOR",
            MsiProperty::VersionString => "INSTALLPROPERTY_VERSIONSTRING",
        }
    }

    /// Registry value name under InstallProperties that mirrors this
    /// property. Only the version string has one today; anything else
    /// has no fallback path.
    pub fn fallback_value_name(&self) -> Option<&'static str> {
        match self {
            MsiProperty::VersionString => Some("DisplayVersion"),
            _ => None,
        }
    }
}
