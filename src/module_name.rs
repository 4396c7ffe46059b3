use std::fmt;

use compact_str::CompactString;

use crate::file_key::FileKey;

/// A module's identity in the flat name-index, per spec.md §3.
///
/// `ByString` is a Haste/flat-namespace-style module name; `ByFile` is the
/// "eponymous" name every file provides regardless of module system
/// (spec.md I4).
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum ModuleName {
    ByString(CompactString),
    ByFile(FileKey),
}

impl ModuleName {
    pub fn by_string(name: impl AsRef<str>) -> Self {
        ModuleName::ByString(CompactString::from(name.as_ref()))
    }

    pub fn by_file(file: FileKey) -> Self {
        ModuleName::ByFile(file)
    }

    /// A stable string form for logging (spec.md §3: "A stable string form exists for logging").
    pub fn display_string(&self) -> String {
        match self {
            ModuleName::ByString(s) => s.to_string(),
            ModuleName::ByFile(f) => format!("<file:{f}>"),
        }
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_string())
    }
}
