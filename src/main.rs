//! `sf4ai` command-line entrypoint: single-URL conversion and sitemap/batch
//! job submission, grounded in the teacher's binary-wiring idiom
//! (launch one browser, connect the cache, initialize tracing) generalized
//! away from its MCP/HTTP-server transport to a `clap` CLI.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use sf4ai::{
    Cache, ChromiumoxideBrowser, ConversionOptions, JobConfigBuilder, JobOrchestrator,
    JobStatus, PipelineDeps, Settings, Source,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sf4ai", about = "Convert web pages to cleaned Markdown")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Run the browser with a visible window instead of headless.
    #[arg(long, global = true)]
    headed: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a single URL and print the resulting Markdown to stdout.
    Convert {
        url: String,

        #[arg(long)]
        no_cache: bool,

        #[arg(long)]
        remove_images: bool,

        #[arg(long)]
        target_selector: Vec<String>,

        #[arg(long)]
        remove_selector: Vec<String>,

        /// Write the Markdown to this path instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Submit a batch job over an explicit URL list or a sitemap, then poll
    /// until it finishes.
    Job {
        /// URLs to process. Mutually exclusive with `--sitemap`.
        #[arg(long)]
        url: Vec<String>,

        /// A sitemap.xml (or sitemap index) URL to enumerate instead.
        #[arg(long)]
        sitemap: Option<String>,

        #[arg(long, default_value_t = 5)]
        max_concurrent: usize,

        #[arg(long, default_value_t = 10)]
        batch_size: usize,

        #[arg(long)]
        no_cache: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env();

    let profile_dir = tempfile::Builder::new().prefix("sf4ai-chrome-profile-").tempdir()?;
    let browser =
        std::sync::Arc::new(ChromiumoxideBrowser::launch(!cli.headed, profile_dir.path().to_path_buf()).await?);
    let cache = std::sync::Arc::new(Cache::connect(&settings).await);

    match cli.command {
        Command::Convert { url, no_cache, remove_images, target_selector, remove_selector, output } => {
            let mut options = ConversionOptions::from_settings(&settings);
            options.no_cache = no_cache;
            options.remove_images = remove_images || options.remove_images;
            options.target_selectors = target_selector;
            options.remove_selectors = remove_selector;

            let deps = PipelineDeps {
                browser,
                cache,
                page_timeout: settings.page_timeout,
                max_retries: settings.max_retries,
                retry_delay: settings.default_retry_delay,
            };

            let artifact = sf4ai::pipeline::convert(&url, &options, &deps).await?;

            match output {
                Some(path) => tokio::fs::write(&path, &artifact.markdown).await?,
                None => println!("{}", artifact.markdown),
            }
        }

        Command::Job { url, sitemap, max_concurrent, batch_size, no_cache } => {
            let source = match (url.is_empty(), sitemap) {
                (false, None) => {
                    let urls = url
                        .iter()
                        .map(|u| url::Url::parse(u))
                        .collect::<Result<Vec<_>, _>>()?;
                    Source::Urls(urls)
                }
                (true, Some(sitemap_url)) => Source::Sitemap(url::Url::parse(&sitemap_url)?),
                _ => anyhow::bail!("pass exactly one of --url (repeatable) or --sitemap"),
            };

            let mut options = ConversionOptions::from_settings(&settings);
            options.no_cache = no_cache;

            let config = JobConfigBuilder::new(&settings)
                .options(options)
                .max_concurrent(max_concurrent)
                .batch_size(batch_size)
                .source(source)
                .build();

            let orchestrator = JobOrchestrator::new(
                browser,
                cache,
                settings.page_timeout,
                settings.max_retries,
                settings.default_retry_delay,
            );

            let job_id = orchestrator.create_job(config);
            println!("submitted job {job_id}");

            loop {
                tokio::time::sleep(Duration::from_millis(500)).await;
                let Some(job) = orchestrator.status(job_id).await else { break };
                println!(
                    "{job_id}: {:?} — {}/{} processed ({} ok, {} failed)",
                    job.status, job.counts.processed, job.counts.total, job.counts.success, job.counts.failed
                );
                if matches!(job.status, JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled) {
                    if let Some(error) = &job.error {
                        eprintln!("job error: {error}");
                    }
                    break;
                }
            }
        }
    }

    Ok(())
}
