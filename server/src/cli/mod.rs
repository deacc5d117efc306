pub mod run;

/// Options of the `run` command
#[derive(clap::Args, Debug, Default)]
pub struct RunArgs {
    /// Address to listen on
    #[clap(long)]
    pub bind: Option<String>,

    /// Port to listen on
    #[clap(long)]
    pub port: Option<u16>,
}
