//! This module provides the command line interface of the load tester.
//!
//! ```shell
//! $ brokerload --help
//! Usage: brokerload [OPTIONS] [CONFIG]
//!
//! Arguments:
//!   [CONFIG]
//!           Path of the YAML config file
//!
//!           [default: config_test_file.yml]
//!
//! Options:
//!       --parallel
//!           Run all sends, then all receives
//!
//!       --multithread
//!           Run the send and receive loops concurrently
//!
//!   -t, --receive-timeout <RECEIVE_TIMEOUT>
//!           Fail receives which take longer than this
//!
//!   -q, --quiet
//!           Only print the report
//!
//!   -o, --output <OUTPUT>
//!           Output format for the report
//!
//!           [default: text]
//!
//!   -O, --output-file <OUTPUT_FILE>
//!           Output file path for the report
//! ```
use std::{fs::File, io::stdout, path::PathBuf};

use clap::{
    Parser, ValueEnum,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};

use crate::{
    broker::ConnectionOptions,
    channel::memory::{self, MemoryBroker},
    config::{self, ConfigOptions},
    error::Error,
    report::LoadTestReport,
    reporter::{JsonReporter, LoadTestReporter, TextReporter},
    runner::Runner,
};

#[derive(Parser, Clone, Debug)]
#[clap(
    version,
    about,
    styles(Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Cyan.on_default())
    )
)]
#[allow(missing_docs)]
pub struct LoadTestCli {
    /// Path of the YAML config file
    #[clap(default_value = config::DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Run all sends, then all receives
    ///
    /// Overrides Parallel_Test from the config file when set.
    #[clap(long)]
    pub parallel: bool,

    /// Run the send and receive loops concurrently
    ///
    /// Overrides Multithread_Test from the config file when set. Takes
    /// precedence over --parallel.
    #[clap(long)]
    pub multithread: bool,

    /// Fail receives which take longer than this
    ///
    /// Without it a receive waits until a message arrives.
    ///
    /// Examples: -t 500ms, -t 5s
    #[clap(long, short = 't')]
    pub receive_timeout: Option<humantime::Duration>,

    /// Only print the report
    #[clap(long, short = 'q')]
    pub quiet: bool,

    /// Output format for the report
    #[clap(short, long, value_enum, default_value_t = ReportFormat::Text, ignore_case = true)]
    pub output: ReportFormat,

    /// Output file path for the report
    ///
    /// When set, the report will be written to the specified file instead of stdout.
    #[clap(long, short = 'O')]
    pub output_file: Option<PathBuf>,
}

impl LoadTestCli {
    /// Apply the command line overrides to the loaded config.
    pub fn apply(&self, cfg: &mut ConfigOptions) {
        cfg.test.parallel_test |= self.parallel;
        cfg.test.multithread_test |= self.multithread;
        if let Some(t) = self.receive_timeout {
            cfg.test.receive_timeout = Some(t.into());
        }
    }
}

/// Report format.
#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum ReportFormat {
    /// Report in plain text format. See [`TextReporter`].
    Text,

    /// Report in JSON format. See [`JsonReporter`].
    Json,
}

/// Load the config, run the load test against the configured broker and
/// print the report.
pub async fn run(cli: &LoadTestCli) -> anyhow::Result<()> {
    let mut cfg = config::load_file(&cli.config)?;
    cli.apply(&mut cfg);

    let plan = cfg.test_plan()?;
    let connection = cfg.connection_options()?;
    let producer_opts = cfg.producer_options()?;
    let consumer_opts = cfg.consumer_options()?;

    let broker = connect(&connection)?;
    let runner = Runner::new(plan);
    let results = runner.run(broker, &producer_opts, &consumer_opts).await?;
    let report = LoadTestReport::new(runner.plan(), results);

    let reporter: &dyn LoadTestReporter = match cli.output {
        ReportFormat::Text => &TextReporter,
        ReportFormat::Json => &JsonReporter,
    };

    match &cli.output_file {
        Some(path) => reporter.print(&mut File::create(path)?, &report)?,
        None => reporter.print(&mut stdout(), &report)?,
    }

    Ok(())
}

fn connect(opts: &ConnectionOptions) -> Result<MemoryBroker, Error> {
    match opts.scheme() {
        Some(memory::SCHEME) => MemoryBroker::connect(opts),
        _ => Err(Error::UnsupportedScheme { url: opts.url.clone() }),
    }
}
