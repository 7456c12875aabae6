use anyhow::{Context, Result};
use clap::Parser;
use tracing::instrument;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "gsync",
    version,
    about = "Synchronize file trees between local paths and grid storage sites",
    long_about = "`gsync` mirrors a file or a directory tree from SOURCE to DESTINATION. Either side may be a
local path or a remote target written as SITE:/logical/path, which is translated into an access
URL using the site's storage description.

Files are compared by size only. Files that already have the right size are skipped, so an
interrupted run can simply be restarted. Files are transferred one at a time and every failed
transfer is retried from scratch; the run stops as soon as one file runs out of tries.

EXAMPLES:
    # Copy a dataset from a site into the current directory
    gsync T2_IT_Pisa:/store/user/me/ntuples .

    # Upload only the ROOT files of a local directory
    gsync --include '.*\\.root' ./ntuples T2_CH_CERN:/store/user/me"
)]
struct Args {
    // Transfer options
    /// Maximal number of tries per file before failing
    #[arg(
        long,
        default_value = "10",
        value_name = "N",
        value_parser = clap::value_parser!(u32).range(1..),
        help_heading = "Transfer options"
    )]
    max_tries: u32,

    /// Number of parallel streams used to transfer each file
    #[arg(
        short = 'n',
        long,
        visible_alias = "stream-count",
        default_value = "2",
        value_name = "N",
        value_parser = clap::value_parser!(u32).range(1..),
        help_heading = "Transfer options"
    )]
    streams: u32,

    /// Walk through the transfer without copying or deleting anything
    #[arg(long, help_heading = "Transfer options")]
    dry_run: bool,

    // Filtering
    /// Regular expression a file's path relative to the source must match to be transferred
    #[arg(long, value_name = "REGEX", help_heading = "Filtering")]
    include: Option<String>,

    /// Regular expression excluding matching files (relative to the source) from the transfer
    #[arg(long, value_name = "REGEX", help_heading = "Filtering")]
    exclude: Option<String>,

    // Progress & output
    /// Toggles the type of progress to show
    ///
    /// Options are: `ProgressBar` (animated progress bar), `TextUpdates` (appropriate for logging), Auto (default, will
    /// choose between `ProgressBar` or `TextUpdates` depending on the type of terminal attached to stderr)
    #[arg(long, value_name = "TYPE", default_value = "auto", help_heading = "Progress & output")]
    progress_type: common::ProgressType,

    /// Verbose level (implies "summary"): -v INFO / -vv DEBUG / -vvv TRACE (default: ERROR)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, help_heading = "Progress & output")]
    verbose: u8,

    /// Print summary at the end
    #[arg(long, help_heading = "Progress & output")]
    summary: bool,

    /// Quiet mode, don't report progress or errors
    #[arg(short = 'q', long = "quiet", help_heading = "Progress & output")]
    quiet: bool,

    // Sites & tools
    /// Directory holding the site configurations (<SITECONF>/<SITE>/PhEDEx/storage.xml)
    #[arg(
        long,
        env = "GSYNC_SITECONF",
        default_value = common::config::DEFAULT_SITECONF_ROOT,
        value_name = "PATH",
        help_heading = "Sites & tools"
    )]
    siteconf: std::path::PathBuf,

    /// Protocol used to translate remote targets into URLs
    #[arg(
        long,
        default_value = common::config::DEFAULT_PROTOCOL,
        value_name = "NAME",
        help_heading = "Sites & tools"
    )]
    protocol: String,

    /// Program used to list remote directories
    #[arg(long, default_value = "gfal-ls", value_name = "PROGRAM", help_heading = "Sites & tools")]
    ls_tool: String,

    /// Program used to transfer files
    #[arg(long, default_value = "gfal-copy", value_name = "PROGRAM", help_heading = "Sites & tools")]
    copy_tool: String,

    /// Program used to remove remote files
    #[arg(long, default_value = "gfal-rm", value_name = "PROGRAM", help_heading = "Sites & tools")]
    rm_tool: String,

    // ARGUMENTS
    /// Source: local path or SITE:/logical/path
    #[arg()]
    source: String,

    /// Destination: local path or SITE:/logical/path
    #[arg()]
    destination: String,
}

#[instrument]
async fn async_main(args: Args) -> Result<gsync_tools_gsync::Summary> {
    let filter =
        common::filter::FilterSettings::from_patterns(args.include.as_deref(), args.exclude.as_deref())
            .context("invalid filter pattern")?;
    let resolver = remote::Resolver::new(common::ResolverConfig {
        siteconf_root: args.siteconf,
        protocol: args.protocol,
    });
    let storage = remote::GfalStorage::new(common::ToolConfig {
        ls: args.ls_tool,
        copy: args.copy_tool,
        rm: args.rm_tool,
    });
    let settings = gsync_tools_gsync::Settings {
        sync: common::SyncConfig {
            max_tries: args.max_tries,
            streams: args.streams,
            dry_run: args.dry_run,
        },
        filter,
        progress_type: args.progress_type,
        quiet: args.quiet,
    };
    let summary = gsync_tools_gsync::sync(
        &storage,
        &resolver,
        &args.source,
        &args.destination,
        &settings,
    )
    .await?;
    Ok(summary)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let output = common::OutputConfig {
        quiet: args.quiet,
        verbose: args.verbose,
        print_summary: args.summary,
    };
    let func = {
        let args = args.clone();
        || async_main(args)
    };
    let res = common::run(output, func);
    if res.is_none() {
        std::process::exit(1);
    }
    Ok(())
}
