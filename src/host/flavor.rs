//! Host/flavor model.

use target_lexicon::Triple;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    Default,
    Midipix,
    Mingw,
    Cygwin,
    Msys,
    Darwin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Elf,
    Pe,
    MachO,
}

/// A plain record of per-flavor conventions.
#[derive(Debug, Clone)]
pub struct FlavorSettings {
    pub imagefmt: ImageFormat,
    pub pic_switch: Option<&'static str>,
    pub ar_prefix: &'static str,
    pub ar_suffix: &'static str,
    pub dso_prefix: &'static str,
    pub dso_suffix: &'static str,
    pub dso_name_infix: &'static str,
    pub dso_fussix: &'static str,
    pub exe_prefix: &'static str,
    pub exe_suffix: &'static str,
    pub implib_prefix: &'static str,
    pub implib_suffix: &'static str,
    pub map_suffix: &'static str,
    pub ldrpath_env: &'static str,
}

impl Flavor {
    /// Consult the triplet's substrings for a recognized flavor, falling
    /// back to `default` with an "unverified" note when unrecognized.
    pub fn from_triplet(triplet: &Triple) -> Flavor {
        let s = triplet.to_string().to_ascii_lowercase();
        if s.contains("darwin") {
            Flavor::Darwin
        } else if s.contains("midipix") {
            Flavor::Midipix
        } else if s.contains("cygwin") {
            Flavor::Cygwin
        } else if s.contains("msys") {
            Flavor::Msys
        } else if s.contains("mingw32") || s.contains("mingw64") || s.contains("mingw") || s.contains("windows")
        {
            Flavor::Mingw
        } else {
            // Covers `linux`, `bsd`, and any other triplet: GNU/ELF
            // conventions, unverified when the triplet didn't actually
            // parse to something recognizable.
            Flavor::Default
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Flavor::Default => "default",
            Flavor::Midipix => "midipix",
            Flavor::Mingw => "mingw",
            Flavor::Cygwin => "cygwin",
            Flavor::Msys => "msys",
            Flavor::Darwin => "darwin",
        }
    }

    pub fn is_coff(self) -> bool {
        matches!(
            self,
            Flavor::Midipix | Flavor::Mingw | Flavor::Cygwin | Flavor::Msys
        )
    }

    pub fn is_macho(self) -> bool {
        matches!(self, Flavor::Darwin)
    }
}

impl FlavorSettings {
    pub fn for_flavor(flavor: Flavor) -> FlavorSettings {
        match flavor {
            Flavor::Default => FlavorSettings {
                imagefmt: ImageFormat::Elf,
                pic_switch: Some("-fPIC"),
                ar_prefix: "lib",
                ar_suffix: ".a",
                dso_prefix: "lib",
                dso_suffix: ".so",
                dso_name_infix: ".so",
                dso_fussix: "",
                exe_prefix: "",
                exe_suffix: "",
                implib_prefix: "",
                implib_suffix: "",
                map_suffix: ".ver",
                ldrpath_env: "LD_LIBRARY_PATH",
            },
            Flavor::Midipix => FlavorSettings {
                imagefmt: ImageFormat::Pe,
                pic_switch: Some("-fPIC"),
                ar_prefix: "lib",
                ar_suffix: ".a",
                dso_prefix: "lib",
                dso_suffix: ".so",
                dso_name_infix: ".so",
                dso_fussix: "",
                exe_prefix: "",
                exe_suffix: "",
                implib_prefix: "lib",
                implib_suffix: ".lib.a",
                map_suffix: ".expsyms.def",
                ldrpath_env: "LD_LIBRARY_PATH",
            },
            Flavor::Mingw => FlavorSettings {
                imagefmt: ImageFormat::Pe,
                pic_switch: None,
                ar_prefix: "lib",
                ar_suffix: ".a",
                dso_prefix: "lib",
                dso_suffix: ".dll",
                dso_name_infix: "",
                dso_fussix: ".dll",
                exe_prefix: "",
                exe_suffix: ".exe",
                implib_prefix: "lib",
                implib_suffix: ".dll.a",
                map_suffix: ".expsyms.def",
                ldrpath_env: "PATH",
            },
            Flavor::Cygwin => FlavorSettings {
                ldrpath_env: "PATH",
                ..FlavorSettings::for_flavor(Flavor::Mingw)
            },
            Flavor::Msys => FlavorSettings {
                ldrpath_env: "PATH",
                ..FlavorSettings::for_flavor(Flavor::Mingw)
            },
            Flavor::Darwin => FlavorSettings {
                imagefmt: ImageFormat::MachO,
                pic_switch: Some("-fPIC"),
                ar_prefix: "lib",
                ar_suffix: ".a",
                dso_prefix: "lib",
                dso_suffix: ".dylib",
                dso_name_infix: "",
                dso_fussix: ".dylib",
                exe_prefix: "",
                exe_suffix: "",
                implib_prefix: "",
                implib_suffix: "",
                map_suffix: ".exp",
                ldrpath_env: "DYLD_LIBRARY_PATH",
            },
        }
    }
}

const ELF_COMMON_RPATHS: &[&str] = &[
    "/lib",
    "/lib/64",
    "/usr/lib",
    "/usr/lib64",
    "/usr/local/lib",
    "/usr/local/lib64",
];

/// Whether an `-rpath` directory is one of the common ELF system
/// directories (or `/usr/{host}/lib[64]`) and therefore doesn't need a
/// loader-path environment variable injected at all.
pub fn is_common_elf_rpath(rpath: &str, host: &str) -> bool {
    if ELF_COMMON_RPATHS.contains(&rpath) {
        return true;
    }
    rpath == format!("/usr/{host}/lib") || rpath == format!("/usr/{host}/lib64")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mingw_triplet_detected() {
        let t: Triple = "x86_64-w64-mingw32".parse().unwrap();
        assert_eq!(Flavor::from_triplet(&t), Flavor::Mingw);
    }

    #[test]
    fn darwin_triplet_detected() {
        let t: Triple = "x86_64-apple-darwin".parse().unwrap();
        assert_eq!(Flavor::from_triplet(&t), Flavor::Darwin);
    }

    #[test]
    fn unrecognized_falls_back_to_default() {
        let t: Triple = "riscv64-unknown-elf".parse().unwrap();
        assert_eq!(Flavor::from_triplet(&t), Flavor::Default);
    }

    #[test]
    fn common_rpath_recognized() {
        assert!(is_common_elf_rpath("/usr/lib64", "x86_64-linux-gnu"));
        assert!(is_common_elf_rpath(
            "/usr/x86_64-linux-gnu/lib",
            "x86_64-linux-gnu"
        ));
        assert!(!is_common_elf_rpath("/opt/myapp/lib", "x86_64-linux-gnu"));
    }
}
