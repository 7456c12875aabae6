//! Configuration types passed explicitly to the resolver, storage and transfer engine

/// Root of the site configuration tree holding the storage descriptions.
pub const DEFAULT_SITECONF_ROOT: &str = "/cvmfs/cms.cern.ch/SITECONF";

/// Protocol used to resolve remote targets into access URLs.
pub const DEFAULT_PROTOCOL: &str = "srmv2";

/// Site description locations relative to `<root>/<site>`, in preference order.
pub const SITE_DESCRIPTION_FILES: [&str; 2] = ["PhEDEx/storage.xml", "storage.xml"];

/// Address resolution settings
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Directory containing one sub-directory per site
    pub siteconf_root: std::path::PathBuf,
    /// Protocol whose rules turn a logical path into an access URL
    pub protocol: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            siteconf_root: DEFAULT_SITECONF_ROOT.into(),
            protocol: DEFAULT_PROTOCOL.to_string(),
        }
    }
}

impl ResolverConfig {
    /// Candidate description files for `site`, in the order they are probed.
    pub fn description_candidates(&self, site: &str) -> Vec<std::path::PathBuf> {
        SITE_DESCRIPTION_FILES
            .iter()
            .map(|file| self.siteconf_root.join(site).join(file))
            .collect()
    }
}

/// Programs implementing the external listing, copy and delete primitives
#[derive(Debug, Clone)]
pub struct ToolConfig {
    pub ls: String,
    pub copy: String,
    pub rm: String,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            ls: "gfal-ls".to_string(),
            copy: "gfal-copy".to_string(),
            rm: "gfal-rm".to_string(),
        }
    }
}

/// Transfer engine settings
#[derive(Debug, Clone, Copy)]
pub struct SyncConfig {
    /// Attempts allowed per file before the run aborts
    pub max_tries: u32,
    /// Parallel streams requested from the copy primitive for each file
    pub streams: u32,
    /// Walk the control flow without copying or deleting anything
    pub dry_run: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_tries: 10,
            streams: 2,
            dry_run: false,
        }
    }
}

/// Output and logging configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    /// Suppress error output and status lines
    pub quiet: bool,
    /// Verbosity level: 0=ERROR, 1=INFO, 2=DEBUG, 3=TRACE
    pub verbose: u8,
    /// Print summary statistics at the end
    pub print_summary: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn description_candidates_follow_preference_order() {
        let config = ResolverConfig {
            siteconf_root: "/sites".into(),
            ..Default::default()
        };
        assert_eq!(
            config.description_candidates("T2_CH_CERN"),
            vec![
                std::path::PathBuf::from("/sites/T2_CH_CERN/PhEDEx/storage.xml"),
                std::path::PathBuf::from("/sites/T2_CH_CERN/storage.xml"),
            ]
        );
    }
}
