#![warn(clippy::all)]

use std::fs;
use std::process::ExitCode;

use anstream::{eprintln, println};
use camino::Utf8PathBuf;
use clap::Parser;
use clap_verbosity_flag::InfoLevel;
use jobsfile::config::Config;
use jobsfile::pipeline;
use jobsfile_model::repository::Repository;
use owo_colors::OwoColorize;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _, EnvFilter};

mod output;

/// Compiles a jobs-file into Jenkins job XML and, optionally, reconciles it
/// against a live Jenkins server.
#[derive(Parser)]
#[command(about, version)]
struct App {
    /// Path to the jobs-file YAML document to compile.
    jobs_file: Utf8PathBuf,

    /// The git URL of the repository this jobs-file belongs to.
    #[arg(long)]
    repo_url: String,

    /// The branch to compile jobs for.
    #[arg(long, default_value = "master")]
    branch: String,

    /// The Jenkins server's base URL. Falls back to `JENKINS_URL`.
    ///
    /// Only required with `--apply`.
    #[arg(long, env = "JENKINS_URL")]
    jenkins_url: Option<String>,

    /// The Jenkins username for token authentication. Falls back to
    /// `JENKINS_USER`.
    #[arg(long, env = "JENKINS_USER")]
    jenkins_user: Option<String>,

    /// The Jenkins API token. Falls back to `JENKINS_TOKEN`.
    #[arg(long, env = "JENKINS_TOKEN")]
    jenkins_token: Option<String>,

    /// Push the compiled jobs to the Jenkins server.
    ///
    /// Without this flag, jobsfile only prints the plan: which jobs would
    /// be created, updated, or deleted.
    #[arg(long)]
    apply: bool,

    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity<InfoLevel>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let app = App::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(app.verbose.tracing_level_filter().into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(app).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}: {err:#}", "error".red().bold());
            ExitCode::FAILURE
        }
    }
}

async fn run(app: App) -> anyhow::Result<()> {
    let yaml_contents = fs::read_to_string(&app.jobs_file)?;
    let repository = Repository::new(app.repo_url, app.branch);

    let compiled = pipeline::compile(repository, &yaml_contents)?;

    if !app.apply {
        println!("{}", output::plain::render_plan(&compiled));
        return Ok(());
    }

    let config = Config::from_env_and_flags(app.jenkins_url, app.jenkins_user, app.jenkins_token)?;
    let client = config.build_client();
    let report = pipeline::reconcile(&client, &compiled).await?;
    println!("{}", output::plain::render_report(&report));

    Ok(())
}
