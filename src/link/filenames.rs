//! Output filename synthesis.
//!
//! Grounded in the worked example: libname `foo`, release `1.2`, version
//! `3:4:5`, suffix `.so` yields `libfoo.la`, `.libs/libfoo.a`,
//! `.libs/libfoo-1.2.so.3.4.5` (`.3.4.5.dylib` on Darwin), a
//! `.libs/libfoo-1.2.so.3` soname symlink, and a `.libs/libfoo.so` plain
//! symlink; `-avoid-version` collapses all of that to `.libs/libfoo.so`.

use crate::host::flavor::{Flavor, FlavorSettings};

/// `-version-info MAJOR:MINOR:REVISION`, already resolved to a concrete
/// triple (libtool's current:revision:age algebra is a link-policy
/// concern the planner applies before constructing this).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionInfo {
    pub major: u64,
    pub minor: u64,
    pub revision: u64,
}

impl VersionInfo {
    pub fn parse(spec: &str) -> Option<VersionInfo> {
        let mut parts = spec.split(':');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next().unwrap_or("0").parse().ok()?;
        let revision = parts.next().unwrap_or("0").parse().ok()?;
        Some(VersionInfo { major, minor, revision })
    }

    fn dotted(&self) -> String {
        format!("{}.{}.{}", self.major, self.minor, self.revision)
    }
}

/// Every path the link planner may need to emit for one `-o libNAME.la`
/// target, relative to the build directory.
#[derive(Debug, Clone)]
pub struct FilenamePlan {
    pub arfilename: String,
    pub lafilename: String,
    pub laifilename: String,
    /// The final, fully versioned (or unversioned) shared-object file that
    /// actually holds the code.
    pub dsofilename: String,
    /// `libNAME.so.MAJOR`-shaped soname symlink; `None` when unversioned.
    pub soname_symlink: Option<String>,
    /// `libNAME.so`-shaped plain symlink to the real file; always present
    /// for shared-library outputs.
    pub plain_symlink: String,
    pub mapfilename: String,
    pub deffilename: String,
    pub rpath_sidecar: String,
    pub implib_default: String,
    pub implib_release: Option<String>,
    pub implib_versioned: Option<String>,
}

pub struct FilenameInputs<'a> {
    pub libname: &'a str,
    pub flavor: Flavor,
    pub settings: &'a FlavorSettings,
    pub release: Option<&'a str>,
    pub version: Option<VersionInfo>,
    pub avoid_version: bool,
}

/// Build every derived name for one link target. `module` targets skip the `lib` prefix elsewhere
/// in the planner, not here — this function just formats whatever
/// `libname` it's handed.
pub fn synthesize(inputs: &FilenameInputs<'_>) -> FilenamePlan {
    let FilenameInputs {
        libname,
        flavor,
        settings,
        release,
        version,
        avoid_version,
    } = *inputs;

    let arfilename = format!("{}{libname}{}", settings.ar_prefix, settings.ar_suffix);
    let lafilename = format!("{}{libname}.la", settings.ar_prefix);
    let laifilename = format!("{}{libname}.lai", settings.ar_prefix);
    let base = format!("{}{libname}", settings.dso_prefix);
    let darwin = flavor.is_macho();

    let (dsofilename, soname_symlink, plain_symlink) = if avoid_version {
        let plain = format!("{base}{}", settings.dso_suffix);
        (plain.clone(), None, plain)
    } else {
        match version {
            None => {
                let plain = format!("{base}{}", settings.dso_suffix);
                (plain.clone(), None, plain)
            }
            Some(v) => {
                let release_infix = release.map(|r| format!("-{r}")).unwrap_or_default();
                let versioned = if darwin {
                    format!("{base}{release_infix}.{}{}", v.dotted(), settings.dso_suffix)
                } else {
                    format!("{base}{release_infix}{}.{}", settings.dso_suffix, v.dotted())
                };
                let soname = if darwin {
                    format!("{base}{release_infix}.{}{}", v.major, settings.dso_suffix)
                } else {
                    format!("{base}{release_infix}{}.{}", settings.dso_suffix, v.major)
                };
                let plain = format!("{base}{}", settings.dso_suffix);
                (versioned, Some(soname), plain)
            }
        }
    };

    let implib_versioned = version.map(|v| format!("{base}-{}{}", v.dotted(), settings.implib_suffix));
    let implib_release = release.map(|r| format!("{base}-{r}{}", settings.implib_suffix));

    FilenamePlan {
        arfilename,
        lafilename,
        laifilename,
        dsofilename,
        soname_symlink,
        plain_symlink,
        mapfilename: format!("{base}{}", settings.map_suffix),
        deffilename: format!("{base}.def"),
        rpath_sidecar: format!("{}{libname}.la.slibtool.rpath", settings.ar_prefix),
        implib_default: format!("{base}{}", settings.implib_suffix),
        implib_release,
        implib_versioned,
    }
}

/// Render the `libNAME.la` key/value text wrapper: `pic_object`,
/// `non_pic_object`, `library_names`, `dlname`, `old_library`,
/// `installed=no`. This is the file `modes::install`/`modes::uninstall`
/// parse back out via their `library_names`/`old_library` fields — it is
/// a plain text record, never the `#!/bin/sh` executable wrapper that
/// [`crate::link::wrapper`] renders for program targets.
pub fn render_la(plan: &FilenamePlan, has_dso: bool) -> String {
    let mut library_names = vec![plan.dsofilename.clone()];
    if let Some(soname) = &plan.soname_symlink {
        library_names.push(soname.clone());
    }
    if plan.plain_symlink != plan.dsofilename {
        library_names.push(plan.plain_symlink.clone());
    }

    let dlname = if has_dso {
        format!(".libs/{}", plan.dsofilename)
    } else {
        String::new()
    };

    format!(
        "# {la}: generated by a libtool-compatible build\n\
         pic_object=''\n\
         non_pic_object=''\n\
         dlname='{dlname}'\n\
         library_names='{names}'\n\
         old_library='{old}'\n\
         installed=no\n",
        la = plan.lafilename,
        names = library_names.join(" "),
        old = plan.arfilename,
    )
}

/// `-Wl,-soname,libNAME.so.MAJOR` on ELF, `-Wl,-install_name,libNAME.MAJOR.dylib` on Darwin.
pub fn soname_linker_flag(libname: &str, settings: &FlavorSettings, flavor: Flavor, version: VersionInfo) -> String {
    if flavor.is_macho() {
        format!(
            "-Wl,-install_name,{}{libname}.{}{}",
            settings.dso_prefix, version.major, settings.dso_suffix
        )
    } else {
        format!(
            "-Wl,-soname,{}{libname}{}.{}",
            settings.dso_prefix, settings.dso_suffix, version.major
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::flavor::FlavorSettings;

    #[test]
    fn worked_example_elf() {
        let settings = FlavorSettings::for_flavor(Flavor::Default);
        let plan = synthesize(&FilenameInputs {
            libname: "foo",
            flavor: Flavor::Default,
            settings: &settings,
            release: Some("1.2"),
            version: VersionInfo::parse("3:4:5"),
            avoid_version: false,
        });
        assert_eq!(plan.lafilename, "libfoo.la");
        assert_eq!(plan.arfilename, "libfoo.a");
        assert_eq!(plan.dsofilename, "libfoo-1.2.so.3.4.5");
        assert_eq!(plan.soname_symlink.as_deref(), Some("libfoo-1.2.so.3"));
        assert_eq!(plan.plain_symlink, "libfoo.so");
    }

    #[test]
    fn worked_example_darwin() {
        let settings = FlavorSettings::for_flavor(Flavor::Darwin);
        let plan = synthesize(&FilenameInputs {
            libname: "foo",
            flavor: Flavor::Darwin,
            settings: &settings,
            release: Some("1.2"),
            version: VersionInfo::parse("3:4:5"),
            avoid_version: false,
        });
        assert_eq!(plan.dsofilename, "libfoo-1.2.3.4.5.dylib");
    }

    #[test]
    fn render_la_emits_library_names_and_dlname() {
        let settings = FlavorSettings::for_flavor(Flavor::Default);
        let plan = synthesize(&FilenameInputs {
            libname: "foo",
            flavor: Flavor::Default,
            settings: &settings,
            release: None,
            version: VersionInfo::parse("3:4:5"),
            avoid_version: false,
        });
        let la = render_la(&plan, true);
        assert!(la.contains("dlname='.libs/libfoo.so.3.4.5'\n"));
        assert!(la.contains("library_names='libfoo.so.3.4.5 libfoo.so.3 libfoo.so'\n"));
        assert!(la.contains("old_library='libfoo.a'\n"));
        assert!(la.contains("installed=no\n"));
    }

    #[test]
    fn render_la_without_dso_leaves_dlname_empty() {
        let settings = FlavorSettings::for_flavor(Flavor::Default);
        let plan = synthesize(&FilenameInputs {
            libname: "foo",
            flavor: Flavor::Default,
            settings: &settings,
            release: None,
            version: None,
            avoid_version: false,
        });
        let la = render_la(&plan, false);
        assert!(la.contains("dlname=''\n"));
    }

    #[test]
    fn avoid_version_collapses_to_plain_name() {
        let settings = FlavorSettings::for_flavor(Flavor::Default);
        let plan = synthesize(&FilenameInputs {
            libname: "foo",
            flavor: Flavor::Default,
            settings: &settings,
            release: Some("1.2"),
            version: VersionInfo::parse("3:4:5"),
            avoid_version: true,
        });
        assert_eq!(plan.dsofilename, "libfoo.so");
        assert!(plan.soname_symlink.is_none());
    }
}
