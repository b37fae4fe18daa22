use clap::{Parser, error::ErrorKind};

use orgscope::{Args, Command, DateRangeArg, SummaryFormatArg};

#[test]
fn parses_search_filters() {
	let args = Args::try_parse_from([
		"orgscope",
		"--config",
		"orgscope.toml",
		"--token",
		"t",
		"search",
		"engineering manager",
		"--page",
		"2",
		"--content-type",
		"policy",
		"--date-range",
		"month",
	])
	.expect("Failed to parse args.");
	let Command::Search(search) = args.command else {
		panic!("Expected the search command.");
	};

	assert_eq!(args.token.as_deref(), Some("t"));
	assert_eq!(search.query, "engineering manager");
	assert_eq!(search.page, 2);
	assert_eq!(search.content_type, ["policy"]);
	assert!(matches!(search.date_range, DateRangeArg::Month));
}

#[test]
fn parses_summary_options() {
	let args = Args::try_parse_from([
		"orgscope",
		"-c",
		"orgscope.toml",
		"summarize",
		"*",
		"--type",
		"executive",
		"--format",
		"markdown",
		"--no-sources",
	])
	.expect("Failed to parse args.");
	let Command::Summarize { format, no_sources, no_metadata, top, .. } = args.command else {
		panic!("Expected the summarize command.");
	};

	assert!(matches!(format, SummaryFormatArg::Markdown));
	assert!(no_sources);
	assert!(!no_metadata);
	assert_eq!(top, 5);
}

#[test]
fn version_flag_reports_the_package_version() {
	let err = Args::try_parse_from(["orgscope", "--version"]).expect_err("Expected version output.");

	assert_eq!(err.kind(), ErrorKind::DisplayVersion);
	assert!(err.to_string().contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn malformed_log_levels_are_rejected() {
	let mut config = orgscope_testkit::sample_config("http://127.0.0.1:9");

	config.service.log_level = "orgscope=loudest".to_string();

	assert!(orgscope::init_tracing(&config).is_err());
}
