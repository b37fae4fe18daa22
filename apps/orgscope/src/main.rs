use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = orgscope::Args::parse();
	orgscope::run(args).await
}
