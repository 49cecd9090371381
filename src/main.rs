use clap::{Parser, Subcommand};
use release_train::commands;
use release_train::core::context::RunContext;
use release_train::core::error::{TrainError, print_error};

/// Cut coordinated releases across an application and its packaging repos
#[derive(Parser)]
#[command(name = "release-train")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct TrainCli {
  /// Target the security mirrors instead of the canonical remotes
  #[arg(long, global = true)]
  security_release: bool,

  /// Log intended pushes and API writes without performing them
  #[arg(long, global = true)]
  dry_run: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Tag a release of one project from its stable branch
  Release {
    /// Project to release: gitlab, gitlab-ee, gitlab-ce, gitaly, omnibus
    project: String,
    /// Version to release, e.g. 12.1.0 or 12.1.0-rc2-ee
    version: String,
  },

  /// Sync component pins and tag an auto-deploy branch
  AutoDeploy {
    /// Auto-deploy branch name, e.g. 12-9-auto-deploy-20200226
    branch: String,
  },
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn main() {
  env_logger::init();

  let cli = TrainCli::parse();
  let ctx = RunContext::from_env(cli.security_release, cli.dry_run);

  let result = match cli.command {
    Commands::Release { project, version } => commands::run_release(project, version, ctx),
    Commands::AutoDeploy { branch } => commands::run_auto_deploy(branch, ctx),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: TrainError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
