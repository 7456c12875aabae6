//! Logical to physical address resolution
//!
//! Each site publishes a storage description holding `lfn-to-pfn` rules:
//!
//! ```xml
//! <storage-mapping>
//!   <lfn-to-pfn protocol="direct" path-match="/+store/(.*)" result="/pnfs/site/store/$1"/>
//!   <lfn-to-pfn protocol="srmv2" chain="direct" path-match="(.*)"
//!               result="srm://se.site:8443/srm/managerv2?SFN=$1"/>
//! </storage-mapping>
//! ```
//!
//! Resolution walks the rules in declared order and uses the first rule of the requested
//! protocol whose `path-match` matches the start of the logical path. A `chain` attribute
//! first resolves the path through the named protocol; the chained result then has the
//! pattern substituted by its first capture group and is placed into `result` at `$1`.

use common::config::ResolverConfig;
use common::error::{Error, Result};
use tracing::instrument;

/// Longest chain of `chain` references followed before giving up.
const MAX_CHAIN_DEPTH: usize = 16;

/// One `lfn-to-pfn` rule as declared in a storage description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteRule {
    pub protocol: String,
    pub path_match: String,
    pub result: Option<String>,
    pub chain: Option<String>,
}

/// Ordered rule table of one site
#[derive(Debug, Clone)]
pub struct RuleTable {
    site: String,
    rules: Vec<SiteRule>,
}

impl RuleTable {
    /// Parses a storage description document.
    ///
    /// Rules without `protocol` or `path-match` can never match and are dropped.
    pub fn parse(site: &str, source: &std::path::Path, text: &str) -> Result<Self> {
        let document = roxmltree::Document::parse(text).map_err(|error| Error::SiteDescription {
            path: source.to_path_buf(),
            message: error.to_string(),
        })?;
        let rules = document
            .root_element()
            .children()
            .filter(|node| node.has_tag_name("lfn-to-pfn"))
            .filter_map(|node| {
                Some(SiteRule {
                    protocol: node.attribute("protocol")?.to_string(),
                    path_match: node.attribute("path-match")?.to_string(),
                    result: node.attribute("result").map(str::to_string),
                    chain: node.attribute("chain").map(str::to_string),
                })
            })
            .collect();
        Ok(Self {
            site: site.to_string(),
            rules,
        })
    }

    /// Loads the first existing storage description of `site`.
    #[instrument]
    pub async fn load(config: &ResolverConfig, site: &str) -> Result<Self> {
        let candidates = config.description_candidates(site);
        for candidate in &candidates {
            if !tokio::fs::try_exists(candidate).await.unwrap_or(false) {
                tracing::debug!("no storage description at {:?}", candidate);
                continue;
            }
            tracing::debug!("reading storage description {:?}", candidate);
            let text = tokio::fs::read_to_string(candidate)
                .await
                .map_err(|error| Error::SiteDescription {
                    path: candidate.clone(),
                    message: error.to_string(),
                })?;
            return Self::parse(site, candidate, &text);
        }
        Err(Error::SiteNotFound {
            site: site.to_string(),
            candidates,
        })
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    pub fn rules(&self) -> &[SiteRule] {
        &self.rules
    }

    /// Resolves `path` into the physical address for `protocol`.
    pub fn resolve(&self, path: &str, protocol: &str) -> Result<String> {
        self.resolve_chain(path, protocol, 0)
    }

    fn resolve_chain(&self, path: &str, protocol: &str, depth: usize) -> Result<String> {
        if depth > MAX_CHAIN_DEPTH {
            return Err(Error::InvalidRule {
                protocol: protocol.to_string(),
                message: format!("chain deeper than {MAX_CHAIN_DEPTH} rules"),
            });
        }
        let invalid = |message: String| Error::InvalidRule {
            protocol: protocol.to_string(),
            message,
        };
        for rule in self.rules.iter().filter(|rule| rule.protocol == protocol) {
            let pattern = regex::Regex::new(&rule.path_match)
                .map_err(|error| invalid(format!("path-match {:?}: {error}", rule.path_match)))?;
            if !pattern.find(path).is_some_and(|found| found.start() == 0) {
                continue;
            }
            if pattern.captures_len() < 2 {
                return Err(invalid(format!(
                    "path-match {:?} has no capture group",
                    rule.path_match
                )));
            }
            let result = rule
                .result
                .as_deref()
                .ok_or_else(|| invalid(format!("rule {:?} has no result", rule.path_match)))?;
            let source_path = match &rule.chain {
                Some(chained) => self.resolve_chain(path, chained, depth + 1)?,
                None => path.to_string(),
            };
            let fixed_path = pattern.replace_all(&source_path, "${1}");
            let resolved = result.replace("$1", &fixed_path);
            tracing::debug!(
                "{}: {:?} -> {:?} via {:?} ({})",
                self.site,
                path,
                resolved,
                rule.path_match,
                protocol
            );
            return Ok(resolved);
        }
        Err(Error::NoMatchingRule {
            protocol: protocol.to_string(),
            path: path.to_string(),
        })
    }
}

/// Resolves `SITE:path` targets using the configured site tree and protocol
#[derive(Debug, Clone)]
pub struct Resolver {
    config: ResolverConfig,
}

impl Resolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Access URL of `path` at `site`.
    pub async fn resolve(&self, site: &str, path: &str) -> Result<String> {
        let table = RuleTable::load(&self.config, site).await?;
        table.resolve(path, &self.config.protocol)
    }
}
