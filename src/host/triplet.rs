//! Host triplet derivation.

use target_lexicon::Triple;

/// Resolved host parameters: the triplet string plus the build-machine
/// baseline it was compared against.
#[derive(Debug, Clone)]
pub struct HostParams {
    pub host: String,
    pub target: Option<String>,
    pub triplet: Triple,
    /// True when none of the explicit sources applied and we fell back to
    /// the compile-time build-machine constant.
    pub fallback: bool,
}

/// The compile-time build-machine constant, substituting for
/// `config.guess`'s output: the triplet Rust itself was built for.
pub fn build_machine_triplet() -> String {
    std::env::var("HOST").unwrap_or_else(|_| {
        format!(
            "{}-unknown-{}",
            std::env::consts::ARCH,
            std::env::consts::OS
        )
    })
}

/// Derive the host triplet, trying in order: explicit `--host`, explicit
/// `--target`, the prefix of `argv[0]` before the final `-`, the
/// compiler's self-reported machine for a known cross driver
/// (`xgcc`/`xg++`), and finally the compile-time build-machine constant.
pub fn derive_host(
    explicit_host: Option<&str>,
    explicit_target: Option<&str>,
    argv0: &str,
    dumpmachine: Option<&str>,
) -> HostParams {
    let program = crate::driver::argv::program_basename(argv0);

    let (host, fallback) = if let Some(h) = explicit_host {
        (h.to_string(), false)
    } else if let Some(t) = explicit_target {
        (t.to_string(), false)
    } else if let Some(prefix) = program.rsplit_once('-').map(|(p, _)| p.to_string()) {
        if !prefix.is_empty() {
            (prefix, false)
        } else {
            (build_machine_triplet(), true)
        }
    } else if matches!(program, "xgcc" | "xg++") && dumpmachine.is_some() {
        (dumpmachine.unwrap().to_string(), false)
    } else {
        (build_machine_triplet(), true)
    };

    let triplet = host.parse::<Triple>().unwrap_or_else(|_| Triple::unknown());

    HostParams {
        host,
        target: explicit_target.map(str::to_string),
        triplet,
        fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_host_wins() {
        let h = derive_host(Some("x86_64-pc-linux-gnu"), None, "cc", None);
        assert_eq!(h.host, "x86_64-pc-linux-gnu");
        assert!(!h.fallback);
    }

    #[test]
    fn argv0_prefix_used_when_no_explicit_host() {
        let h = derive_host(None, None, "/usr/bin/x86_64-w64-mingw32-gcc", None);
        assert_eq!(h.host, "x86_64-w64-mingw32");
    }

    #[test]
    fn falls_back_to_build_machine() {
        let h = derive_host(None, None, "cc", None);
        assert!(h.fallback);
    }
}
