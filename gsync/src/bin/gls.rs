use anyhow::Result;
use clap::Parser;
use common::storage::Storage;
use tracing::instrument;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "gls",
    version,
    about = "List a local directory or a directory at a grid storage site",
    long_about = "`gls` resolves TARGET the same way `gsync` does and prints its entries.

EXAMPLE:
    # List a user directory at a site
    gls T2_IT_Pisa:/store/user/me

    # Show the access URL of that directory
    gls --url T2_IT_Pisa:/store/user/me"
)]
struct Args {
    /// Only print the resolved access URL
    #[arg(long)]
    url: bool,

    /// Verbose level (implies "summary"): -v INFO / -vv DEBUG / -vvv TRACE (default: ERROR)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode, don't report errors
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    /// Directory holding the site configurations
    #[arg(
        long,
        env = "GSYNC_SITECONF",
        default_value = common::config::DEFAULT_SITECONF_ROOT,
        value_name = "PATH"
    )]
    siteconf: std::path::PathBuf,

    /// Protocol used to translate remote targets into URLs
    #[arg(long, default_value = common::config::DEFAULT_PROTOCOL, value_name = "NAME")]
    protocol: String,

    /// Program used to list remote directories
    #[arg(long, default_value = "gfal-ls", value_name = "PROGRAM")]
    ls_tool: String,

    /// Local path or SITE:/logical/path
    #[arg()]
    target: String,
}

const NO_SIZE: &str = "-";

#[derive(Debug, Default)]
struct Summary {
    files: usize,
    directories: usize,
    bytes: u64,
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} file(s), {} directory(ies), {}",
            self.files,
            self.directories,
            bytesize::ByteSize(self.bytes)
        )
    }
}

#[instrument]
async fn async_main(args: Args) -> Result<Summary> {
    let resolver = remote::Resolver::new(common::ResolverConfig {
        siteconf_root: args.siteconf,
        protocol: args.protocol,
    });
    let storage = remote::GfalStorage::new(common::ToolConfig {
        ls: args.ls_tool,
        ..Default::default()
    });
    let target = gsync_tools_gsync::TargetDescriptor::new(&args.target, &resolver).await?;
    if args.url {
        println!("{}", target.full_path("", true));
        return Ok(Summary::default());
    }
    let mut entries = match storage.stat(target.base()).await? {
        Some(entry) if !entry.is_dir => vec![entry],
        _ => storage.list(target.base()).await?,
    };
    entries.sort_by(|lhs, rhs| common::catalog::natural_cmp(&lhs.name, &rhs.name));
    let mut summary = Summary::default();
    for entry in &entries {
        if entry.is_dir {
            summary.directories += 1;
            println!("d {:>14} {}/", NO_SIZE, entry.name);
        } else {
            summary.files += 1;
            summary.bytes += entry.size;
            println!("- {:>14} {}", entry.size, entry.name);
        }
    }
    Ok(summary)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let output = common::OutputConfig {
        quiet: args.quiet,
        verbose: args.verbose,
        print_summary: false,
    };
    let func = {
        let args = args.clone();
        || async_main(args)
    };
    if common::run(output, func).is_none() {
        std::process::exit(1);
    }
    Ok(())
}
