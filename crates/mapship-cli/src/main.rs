use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};

use mapship::react_native::{DEFAULT_BUNDLER_URL, DEFAULT_ENTRY_POINT};
use mapship::{
    BrowserUploadMultiple, BrowserUploadOne, CommonOptions, DEFAULT_UPLOAD_ORIGIN,
    NodeUploadMultiple, NodeUploadOne, ReactNativeUpload, SourceMapRetrieval, UploadError,
    Uploader, VersionInput,
};
use mapship_config::{CliOverrides, Config, resolve_config};
use mapship_types::Platform;

mod reporter;

use reporter::{CliReporter, Verbosity};

#[derive(Parser, Debug)]
#[command(name = "mapship", version)]
#[command(about = "Upload JavaScript source maps to a crash-reporting service")]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload source maps for code served to browsers.
    UploadBrowser(BrowserArgs),
    /// Upload source maps for Node.js services.
    UploadNode(NodeArgs),
    /// Upload a React Native source map and bundle.
    UploadReactNative(ReactNativeArgs),
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Your project's API key.
    #[arg(long)]
    api_key: String,

    /// Replace an existing source map matching the same criteria.
    #[arg(long, conflicts_with = "no_overwrite")]
    overwrite: bool,

    /// Never replace an existing source map.
    #[arg(long)]
    no_overwrite: bool,

    /// Root directory of the project; paths are resolved against it.
    #[arg(long, default_value = ".")]
    project_root: PathBuf,

    /// Origin (or full URL) of the upload service.
    #[arg(long)]
    endpoint: Option<String>,

    /// Only print the success summary, warnings and errors.
    #[arg(long)]
    quiet: bool,

    /// Print debug detail.
    #[arg(long)]
    verbose: bool,

    /// Version of the app the source maps belong to.
    #[arg(long)]
    app_version: Option<String>,

    /// Build identifier to use instead of an app version.
    #[arg(long)]
    code_bundle_id: Option<String>,

    /// Read the app version from the nearest package.json.
    #[arg(long)]
    detect_app_version: bool,

    /// Config file to use instead of <project-root>/.mapship.toml.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Upload attempts before giving up.
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Delay between attempts (e.g. 1s, 500ms).
    #[arg(long)]
    retry_interval: Option<String>,

    /// Per-request timeout (e.g. 30s).
    #[arg(long)]
    timeout: Option<String>,
}

#[derive(Args, Debug)]
struct BrowserArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Source map to upload.
    #[arg(long, conflicts_with_all = ["directory", "base_url"])]
    source_map: Option<PathBuf>,

    /// URL the minified file is served from.
    #[arg(long, conflicts_with_all = ["directory", "base_url"])]
    bundle_url: Option<String>,

    /// Minified file the source map describes.
    #[arg(long, conflicts_with_all = ["directory", "base_url"])]
    bundle: Option<PathBuf>,

    /// Directory to search for source maps.
    #[arg(long)]
    directory: Option<PathBuf>,

    /// URL the directory is served from.
    #[arg(long)]
    base_url: Option<String>,
}

#[derive(Args, Debug)]
struct NodeArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Source map to upload.
    #[arg(long, conflicts_with = "directory")]
    source_map: Option<PathBuf>,

    /// Bundle the source map describes.
    #[arg(long, conflicts_with = "directory")]
    bundle: Option<PathBuf>,

    /// Directory to search for source maps.
    #[arg(long)]
    directory: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ReactNativeArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Platform the bundle was built for (android or ios).
    #[arg(long)]
    platform: Platform,

    /// The bundle is a development build.
    #[arg(long)]
    dev: bool,

    /// Android versionCode.
    #[arg(long)]
    app_version_code: Option<String>,

    /// iOS CFBundleVersion.
    #[arg(long)]
    app_bundle_version: Option<String>,

    /// Source map produced by a release build.
    #[arg(long, requires = "bundle", conflicts_with = "fetch")]
    source_map: Option<PathBuf>,

    /// Bundle produced by a release build.
    #[arg(long, requires = "source_map", conflicts_with = "fetch")]
    bundle: Option<PathBuf>,

    /// Fetch the source map and bundle from a running bundler.
    #[arg(long)]
    fetch: bool,

    /// Address of the bundler.
    #[arg(long, default_value = DEFAULT_BUNDLER_URL)]
    bundler_url: String,

    /// Entry point passed to the bundler.
    #[arg(long, default_value = DEFAULT_ENTRY_POINT)]
    bundler_entry_point: String,
}

impl CommonArgs {
    fn overrides(&self) -> Result<CliOverrides> {
        let overwrite = match (self.overwrite, self.no_overwrite) {
            (true, _) => Some(true),
            (false, true) => Some(false),
            (false, false) => None,
        };
        Ok(CliOverrides {
            endpoint: self.endpoint.clone(),
            overwrite,
            max_attempts: self.max_attempts,
            retry_interval: self.retry_interval.as_deref().map(parse_duration).transpose()?,
            timeout: self.timeout.as_deref().map(parse_duration).transpose()?,
        })
    }

    fn config(&self) -> Result<Config> {
        resolve_config(&self.project_root, self.config.as_deref(), &self.overrides()?)
    }

    fn reporter(&self) -> CliReporter {
        CliReporter::new(Verbosity::from_flags(self.quiet, self.verbose))
    }

    /// Upload options after layering config; `overwrite_default` applies
    /// when neither flag nor config says otherwise.
    fn options(&self, config: &Config, overwrite_default: bool) -> CommonOptions {
        let endpoint = config.endpoint().unwrap_or(DEFAULT_UPLOAD_ORIGIN);
        CommonOptions::new(self.api_key.clone())
            .with_overwrite(config.overwrite().unwrap_or(overwrite_default))
            .with_project_root(&self.project_root)
            .with_endpoint(endpoint)
            .with_version(VersionInput {
                app_version: self.app_version.clone(),
                code_bundle_id: self.code_bundle_id.clone(),
                detect_app_version: self.detect_app_version,
                ..VersionInput::default()
            })
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Upload failures have already been explained by the reporter.
            if err.downcast_ref::<UploadError>().is_none() {
                eprintln!("[error] {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.cmd {
        Commands::UploadBrowser(args) => upload_browser(&args),
        Commands::UploadNode(args) => upload_node(&args),
        Commands::UploadReactNative(args) => upload_react_native(&args),
    }
}

fn upload_browser(args: &BrowserArgs) -> Result<()> {
    let config = args.common.config()?;
    let common = args.common.options(&config, false);
    let uploader = Uploader::new(config.transport_options());
    let mut reporter = args.common.reporter();

    match (&args.directory, &args.base_url) {
        (Some(directory), Some(base_url)) => {
            let opts = BrowserUploadMultiple::new(common, directory, base_url.clone());
            uploader.upload_browser_multiple(&opts, &mut reporter)?;
        }
        (Some(_), None) | (None, Some(_)) => {
            bail!("--directory and --base-url must be given together")
        }
        (None, None) => {
            let (Some(source_map), Some(bundle_url)) = (&args.source_map, &args.bundle_url) else {
                bail!(
                    "either --source-map and --bundle-url, or --directory and --base-url, must be given"
                );
            };
            let mut opts = BrowserUploadOne::new(common, source_map, bundle_url.clone());
            if let Some(bundle) = &args.bundle {
                opts = opts.with_bundle(bundle);
            }
            uploader.upload_browser_one(&opts, &mut reporter)?;
        }
    }
    Ok(())
}

fn upload_node(args: &NodeArgs) -> Result<()> {
    let config = args.common.config()?;
    let common = args.common.options(&config, false);
    let uploader = Uploader::new(config.transport_options());
    let mut reporter = args.common.reporter();

    match (&args.directory, &args.source_map, &args.bundle) {
        (Some(directory), _, _) => {
            let opts = NodeUploadMultiple::new(common, directory);
            uploader.upload_node_multiple(&opts, &mut reporter)?;
        }
        (None, Some(source_map), Some(bundle)) => {
            let opts = NodeUploadOne::new(common, source_map, bundle);
            uploader.upload_node_one(&opts, &mut reporter)?;
        }
        _ => bail!("either --source-map and --bundle, or --directory, must be given"),
    }
    Ok(())
}

fn upload_react_native(args: &ReactNativeArgs) -> Result<()> {
    let config = args.common.config()?;
    let mut common = args.common.options(&config, true);
    common.version.app_version_code = args.app_version_code.clone();
    common.version.app_bundle_version = args.app_bundle_version.clone();
    let uploader = Uploader::new(config.transport_options());
    let mut reporter = args.common.reporter();

    let retrieval = match (&args.source_map, &args.bundle) {
        (Some(source_map), Some(bundle)) => SourceMapRetrieval::provided(source_map, bundle),
        _ if args.fetch => SourceMapRetrieval::Fetch {
            bundler_url: args.bundler_url.clone(),
            entry_point: args.bundler_entry_point.clone(),
        },
        _ => bail!("either --source-map and --bundle, or --fetch, must be given"),
    };

    let overwrite = common.overwrite;
    let opts = ReactNativeUpload::new(common, args.platform, retrieval)
        .with_overwrite(overwrite)
        .with_dev(args.dev);
    uploader.upload_react_native(&opts, &mut reporter)?;
    Ok(())
}

fn parse_duration(s: &str) -> Result<Duration> {
    humantime::parse_duration(s).with_context(|| format!("invalid duration: {s}"))
}
