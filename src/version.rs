use std::fmt;
use std::str::FromStr;

/// Dotted numeric product version: major.minor with optional build and
/// revision. Two components minimum, matching what the installer's
/// ProductVersion property carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ProductVersion {
    pub major: u32,
    pub minor: u32,
    pub build: Option<u32>,
    pub revision: Option<u32>,
}

impl fmt::Display for ProductVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if let Some(build) = self.build {
            write!(f, ".{}", build)?;
        }
        if let Some(revision) = self.revision {
            write!(f, ".{}", revision)?;
        }
        Ok(())
    }
}

impl FromStr for ProductVersion {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        if !(2..=4).contains(&parts.len()) {
            return Err(());
        }
        let mut numbers = [None::<u32>; 4];
        for (slot, part) in numbers.iter_mut().zip(parts.iter()) {
            *slot = Some(part.parse().map_err(|_| ())?);
        }
        Ok(ProductVersion {
            major: numbers[0].ok_or(())?,
            minor: numbers[1].ok_or(())?,
            build: numbers[2],
            revision: numbers[3],
        })
    }
}
