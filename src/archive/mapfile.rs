//! Mapfile emitter: format a symbol list as a linker
//! version script, with ELF/GNU, PE `EXPORTS`, or Mach-O export-list
//! syntax depending on the target flavor.
//!
//! Grounded in `slbt_archive_mapfile.c`'s three-branch dispatch
//! (`fcoff`/`fmach`/else) and sort-by-munged-name comparator; the exact
//! output strings follow the worked examples.

use regex::Regex;

use crate::host::flavor::Flavor;

fn is_suppressed_coff_symbol(sym: &str) -> bool {
    sym.starts_with("__imp_") || sym.starts_with(".refptr.")
}

/// Split `.weak.PREFIX.TARGET` into `(PREFIX, TARGET)` on the first `.`
/// after the `.weak.` marker, if `sym` matches that shape.
fn split_weak_alias(sym: &str) -> Option<(&str, &str)> {
    let rest = sym.strip_prefix(".weak.")?;
    let dot = rest.find('.')?;
    Some((&rest[..dot], &rest[dot + 1..]))
}

/// Sort key used when `-Wregex`/default sorting is requested: strips a
/// leading `.weak.PREFIX.` before comparison on COFF targets so weak
/// aliases sort alongside their target name.
fn sort_key(sym: &str, coff: bool) -> String {
    if coff {
        if let Some((_, target)) = split_weak_alias(sym) {
            return target.to_string();
        }
    }
    sym.to_string()
}

/// Render a mapfile body for `symbols` targeting `flavor`.
pub fn render_mapfile(symbols: &[String], flavor: Flavor, sort: bool, regex: Option<&str>) -> Result<String, regex::Error> {
    let coff = flavor.is_coff();
    let darwin = flavor.is_macho();

    let mut ordered: Vec<&String> = symbols.iter().collect();
    if sort {
        ordered.sort_by_key(|s| sort_key(s, coff));
    }

    let matcher = regex.map(Regex::new).transpose()?;
    let keep = |s: &str| matcher.as_ref().map(|r| r.is_match(s)).unwrap_or(true);

    let mut out = String::new();
    if coff {
        out.push_str("EXPORTS\n");
        for sym in ordered {
            if is_suppressed_coff_symbol(sym) || !keep(sym) {
                continue;
            }
            if let Some((weak_name, target_name)) = split_weak_alias(sym) {
                out.push_str(&format!("    {weak_name} = {target_name}\n"));
            } else {
                out.push_str(sym);
                out.push('\n');
            }
        }
    } else if darwin {
        out.push_str("# export_list, underscores prepended\n");
        for sym in ordered {
            if !keep(sym) {
                continue;
            }
            out.push('_');
            out.push_str(sym);
            out.push('\n');
        }
    } else {
        out.push_str("{\n\tglobal:\n");
        for sym in ordered {
            if !keep(sym) {
                continue;
            }
            out.push_str("\t\t");
            out.push_str(sym);
            out.push_str(";\n");
        }
        out.push_str("\n\tlocal:\n\t\t*;\n};\n");
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<String> {
        vec!["a".into(), "b".into(), "__imp_a".into(), ".weak.foo.bar".into()]
    }

    #[test]
    fn mingw_mapfile_matches_worked_example() {
        let out = render_mapfile(&sample(), Flavor::Mingw, false, None).unwrap();
        assert_eq!(out, "EXPORTS\na\nb\n    foo = bar\n");
    }

    #[test]
    fn darwin_mapfile_matches_worked_example() {
        let out = render_mapfile(&sample(), Flavor::Darwin, false, None).unwrap();
        assert_eq!(out, "# export_list, underscores prepended\n_a\n_b\n_.weak.foo.bar\n");
    }

    #[test]
    fn linux_mapfile_matches_worked_example() {
        let out = render_mapfile(&sample(), Flavor::Default, false, None).unwrap();
        assert_eq!(
            out,
            "{\n\tglobal:\n\t\ta;\n\t\tb;\n\t\t__imp_a;\n\t\t.weak.foo.bar;\n\n\tlocal:\n\t\t*;\n};\n"
        );
    }

    #[test]
    fn regex_filters_symbols() {
        let out = render_mapfile(&sample(), Flavor::Default, false, Some("^a$")).unwrap();
        assert_eq!(out, "{\n\tglobal:\n\t\ta;\n\n\tlocal:\n\t\t*;\n};\n");
    }
}
