//! `--mode=config` / `--mode=info`: report the host
//! triplet, flavor, and resolved tool paths a driver invocation would use,
//! rather than act on anything.

use crate::host::flavor::Flavor;
use crate::host::tools::{resolve_tool, Tool};
use crate::host::triplet::HostParams;

#[derive(Debug, Clone)]
pub struct ConfigReport {
    pub host: String,
    pub flavor: &'static str,
    pub ar: Option<String>,
    pub nm: Option<String>,
    pub ranlib: Option<String>,
    pub dlltool: Option<String>,
    pub mdso: Option<String>,
    pub windres: Option<String>,
}

pub fn build_report(host_params: &HostParams, flavor: Flavor, build_machine: &str) -> ConfigReport {
    let triplet = &host_params.host;
    ConfigReport {
        host: triplet.clone(),
        flavor: flavor.name(),
        ar: resolve_tool(Tool::Ar, None, triplet, build_machine, flavor),
        nm: resolve_tool(Tool::Nm, None, triplet, build_machine, flavor),
        ranlib: resolve_tool(Tool::Ranlib, None, triplet, build_machine, flavor),
        dlltool: resolve_tool(Tool::Dlltool, None, triplet, build_machine, flavor),
        mdso: resolve_tool(Tool::Mdso, None, triplet, build_machine, flavor),
        windres: resolve_tool(Tool::Windres, None, triplet, build_machine, flavor),
    }
}

impl ConfigReport {
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("host: {}\n", self.host));
        out.push_str(&format!("flavor: {}\n", self.flavor));
        for (label, tool) in [
            ("ar", &self.ar),
            ("nm", &self.nm),
            ("ranlib", &self.ranlib),
            ("dlltool", &self.dlltool),
            ("mdso", &self.mdso),
            ("windres", &self.windres),
        ] {
            if let Some(t) = tool {
                out.push_str(&format!("{label}: {t}\n"));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::triplet::derive_host;

    #[test]
    fn report_includes_host_and_flavor() {
        let host = derive_host(Some("x86_64-pc-linux-gnu"), None, "cc", None);
        let flavor = Flavor::from_triplet(&host.triplet);
        let report = build_report(&host, flavor, "x86_64-pc-linux-gnu");
        assert_eq!(report.host, "x86_64-pc-linux-gnu");
        assert_eq!(report.flavor, "default");
        assert_eq!(report.ar.as_deref(), Some("ar"));
    }

    #[test]
    fn pe_only_tools_suppressed_off_coff_flavors() {
        let host = derive_host(Some("x86_64-pc-linux-gnu"), None, "cc", None);
        let flavor = Flavor::from_triplet(&host.triplet);
        let report = build_report(&host, flavor, "x86_64-pc-linux-gnu");
        assert!(report.dlltool.is_none());
        assert!(report.windres.is_none());
    }
}
