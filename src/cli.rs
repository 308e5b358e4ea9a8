use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "claude-config",
    version,
    about = "Claude Code environment variable configuration switcher",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration name to switch to
    pub config: Option<String>,

    /// List all available configurations
    #[arg(short, long)]
    pub list: bool,

    /// Show current configuration
    #[arg(short, long)]
    pub current: bool,

    /// Interactive configuration selection
    #[arg(short, long)]
    pub interactive: bool,

    /// Edit configuration file
    #[arg(short, long)]
    pub edit: bool,

    /// Test connectivity for all configurations (or only the named one)
    #[arg(short, long)]
    pub test: bool,

    /// Skip connectivity test in interactive mode
    #[arg(long)]
    pub no_test: bool,

    /// Quick mode - skip connectivity test (alias for --no-test)
    #[arg(short, long)]
    pub quick: bool,

    /// Remove ANTHROPIC_BASE_URL and ANTHROPIC_AUTH_TOKEN
    #[arg(long)]
    pub clear_env: bool,

    /// Write to the Claude settings file instead of environment variables
    #[arg(short, long, global = true)]
    pub settings: bool,

    /// Probe timeout in milliseconds
    #[arg(long, value_name = "MS")]
    pub timeout: Option<u64>,
}

impl Cli {
    pub fn skip_probe(&self) -> bool {
        self.no_test || self.quick
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Remove the configuration environment variables
    #[command(alias = "clear-env")]
    Clear,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn positional_name_and_flags() {
        let cli = Cli::try_parse_from(["claude-config", "openai", "-s"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some("openai"));
        assert!(cli.settings);
        assert!(cli.command.is_none());
    }

    #[test]
    fn quick_and_no_test_both_skip() {
        let quick = Cli::try_parse_from(["claude-config", "-q"]).unwrap();
        let no_test = Cli::try_parse_from(["claude-config", "--no-test"]).unwrap();
        let plain = Cli::try_parse_from(["claude-config", "-i"]).unwrap();
        assert!(quick.skip_probe());
        assert!(no_test.skip_probe());
        assert!(!plain.skip_probe());
    }

    #[test]
    fn clear_subcommand_and_alias() {
        let cli = Cli::try_parse_from(["claude-config", "clear"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Clear)));
        let cli = Cli::try_parse_from(["claude-config", "clear-env", "--settings"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Clear)));
        assert!(cli.settings);
    }

    #[test]
    fn timeout_override() {
        let cli = Cli::try_parse_from(["claude-config", "-t", "--timeout", "750"]).unwrap();
        assert!(cli.test);
        assert_eq!(cli.timeout, Some(750));
    }
}
