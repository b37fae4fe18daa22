use std::{path::PathBuf, sync::Arc};

use clap::{
	Parser, Subcommand, ValueEnum,
	builder::{
		Styles,
		styling::{AnsiColor, Effects},
	},
};
use color_eyre::eyre;
use serde::Serialize;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use orgscope_config::Config;
use orgscope_domain::{
	AggregatedPage, DateRange, PageCursor, ResultId, SearchFilters, SessionId, is_conversational,
};
use orgscope_service::{
	Backends, ChannelWarning, ChatOptions, Dispatcher, DualFetcher, SessionReconciler,
	StaticToken, SummaryFormat, SummaryOptions, SummaryType,
};

/// Help colors: section headers and flags stand out, values stay plain.
const STYLES: Styles = Styles::styled()
	.header(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
	.usage(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
	.literal(AnsiColor::Yellow.on_default())
	.placeholder(AnsiColor::White.on_default().effects(Effects::DIMMED))
	.valid(AnsiColor::Green.on_default())
	.invalid(AnsiColor::Red.on_default().effects(Effects::BOLD))
	.error(AnsiColor::Red.on_default().effects(Effects::BOLD));

#[derive(Debug, Parser)]
#[command(
	version,
	about = "Search people and documents, summarize results and chat over them.",
	rename_all = "kebab",
	styles = STYLES,
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// Bearer token sent with every request.
	#[arg(long, env = "ORGSCOPE_TOKEN", hide_env_values = true, value_name = "TOKEN")]
	pub token: Option<String>,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Search employees and documents together.
	Search(SearchArgs),
	/// Summarize the top results of a search.
	Summarize {
		#[command(flatten)]
		search: SearchArgs,
		/// Result ids to summarize. Defaults to the first `--top` results.
		#[arg(long = "select", value_name = "ID")]
		select: Vec<String>,
		#[arg(long, default_value_t = 5)]
		top: usize,
		#[arg(long = "type", value_enum, default_value_t = SummaryTypeArg::Quick)]
		summary_type: SummaryTypeArg,
		#[arg(long, value_enum, default_value_t = SummaryFormatArg::Text)]
		format: SummaryFormatArg,
		#[arg(long)]
		no_metadata: bool,
		#[arg(long)]
		no_sources: bool,
	},
	/// Send one chat message. Starts a new session unless `--session` is given.
	Chat {
		message: String,
		#[arg(long, value_name = "ID")]
		session: Option<String>,
		#[arg(long)]
		knowledge_scope: Option<String>,
	},
	/// List chat sessions.
	Sessions,
	/// Show the message history of one session.
	History { session: String },
	/// Show an employee's managers and direct reports.
	Hierarchy { id: i64 },
	/// Show one employee record.
	Employee { id: i64 },
}

#[derive(Debug, Clone, clap::Args)]
pub struct SearchArgs {
	/// Query text. `*` browses everything.
	pub query: String,
	#[arg(long, default_value_t = 1)]
	pub page: u32,
	#[arg(long, value_name = "SOURCE")]
	pub source: Vec<String>,
	#[arg(long, value_name = "TYPE")]
	pub content_type: Vec<String>,
	#[arg(long, value_enum, default_value_t = DateRangeArg::All)]
	pub date_range: DateRangeArg,
	#[arg(long, value_name = "AUTHOR")]
	pub author: Vec<String>,
	#[arg(long, value_name = "TAG")]
	pub tag: Vec<String>,
}
impl SearchArgs {
	fn filters(&self) -> SearchFilters {
		SearchFilters {
			source: self.source.clone(),
			date_range: self.date_range.into(),
			content_type: self.content_type.clone(),
			author: (!self.author.is_empty()).then(|| self.author.clone()),
			tags: (!self.tag.is_empty()).then(|| self.tag.clone()),
		}
	}
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DateRangeArg {
	All,
	Today,
	Week,
	Month,
	Year,
}
impl From<DateRangeArg> for DateRange {
	fn from(value: DateRangeArg) -> Self {
		match value {
			DateRangeArg::All => Self::All,
			DateRangeArg::Today => Self::Today,
			DateRangeArg::Week => Self::Week,
			DateRangeArg::Month => Self::Month,
			DateRangeArg::Year => Self::Year,
		}
	}
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SummaryTypeArg {
	Quick,
	Detailed,
	Executive,
}
impl From<SummaryTypeArg> for SummaryType {
	fn from(value: SummaryTypeArg) -> Self {
		match value {
			SummaryTypeArg::Quick => Self::Quick,
			SummaryTypeArg::Detailed => Self::Detailed,
			SummaryTypeArg::Executive => Self::Executive,
		}
	}
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SummaryFormatArg {
	Text,
	Markdown,
	Pdf,
}
impl From<SummaryFormatArg> for SummaryFormat {
	fn from(value: SummaryFormatArg) -> Self {
		match value {
			SummaryFormatArg::Text => Self::Text,
			SummaryFormatArg::Markdown => Self::Markdown,
			SummaryFormatArg::Pdf => Self::Pdf,
		}
	}
}

#[derive(Debug, Serialize)]
struct SearchOutput {
	query: String,
	conversational: bool,
	page: AggregatedPage,
	warnings: Vec<ChannelWarning>,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = orgscope_config::load(&args.config)?;

	init_tracing(&config)?;

	let backends = Backends::http(&config, Arc::new(StaticToken(args.token.clone())))?;
	let fetcher = DualFetcher::new(backends.search.clone(), &config.search);
	let sessions = SessionReconciler::new(backends.chat.clone());
	let dispatcher = Dispatcher::new(
		backends.chat.clone(),
		backends.summary.clone(),
		sessions.clone(),
		config.chat.clone(),
	);
	let output = match args.command {
		Command::Search(search) => serde_json::to_value(search_once(&fetcher, &config, &search).await?)?,
		Command::Summarize { search, select, top, summary_type, format, no_metadata, no_sources } => {
			let found = search_once(&fetcher, &config, &search).await?;
			let selection = if select.is_empty() {
				found.page.combined_results.iter().take(top).cloned().collect::<Vec<_>>()
			} else {
				let wanted = select.into_iter().map(ResultId::new).collect::<Vec<_>>();

				found
					.page
					.combined_results
					.iter()
					.filter(|result| wanted.contains(&result.id))
					.cloned()
					.collect()
			};

			if selection.is_empty() {
				return Err(eyre::eyre!("No results matched the selection."));
			}

			let options = SummaryOptions {
				summary_type: summary_type.into(),
				format: format.into(),
				include_metadata: !no_metadata,
				include_sources: !no_sources,
			};
			let summary =
				dispatcher.generate_summary(&search.query, &selection, None, &options).await?;

			serde_json::json!({ "summary": summary, "documents": selection.len() })
		},
		Command::Chat { message, session, knowledge_scope } => {
			let options = ChatOptions { knowledge_scope, ..Default::default() };
			let turn = dispatcher.send_message(session.map(SessionId::new), &message, &options).await?;

			serde_json::to_value(turn)?
		},
		Command::Sessions => serde_json::to_value(sessions.load_sessions().await?)?,
		Command::History { session } => {
			sessions.load_sessions().await?;

			serde_json::to_value(sessions.select_session(&SessionId::new(session)).await?)?
		},
		Command::Hierarchy { id } => serde_json::to_value(backends.search.get_hierarchy(id).await?)?,
		Command::Employee { id } => serde_json::to_value(backends.search.get_employee(id).await?)?,
	};

	print_json(&output)
}

async fn search_once(
	fetcher: &DualFetcher,
	config: &Config,
	search: &SearchArgs,
) -> color_eyre::Result<SearchOutput> {
	let cursor = PageCursor::first(config.search.page_size).with_page(search.page);
	let outcome = fetcher.fetch(&search.query, &search.filters(), cursor).await?;

	for warning in &outcome.warnings {
		tracing::warn!(channel = %warning.channel, "{}", warning.message);
	}

	Ok(SearchOutput {
		query: search.query.clone(),
		conversational: is_conversational(&search.query),
		page: outcome.page,
		warnings: outcome.warnings,
	})
}

fn print_json(value: &Value) -> color_eyre::Result<()> {
	let json = serde_json::to_string_pretty(value)?;

	println!("{json}");

	Ok(())
}

/// Installs the stderr log subscriber. Malformed `service.log_level` directives are reported.
pub fn init_tracing(config: &Config) -> color_eyre::Result<()> {
	let filter = EnvFilter::try_new(&config.service.log_level)?;

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.try_init()
		.map_err(|err| eyre::eyre!("Failed to install the log subscriber: {err}"))?;

	Ok(())
}
