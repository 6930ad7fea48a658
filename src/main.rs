use anyhow::{Context, Result};
use clap::Parser;
use colored::control as color_control;
use colored::Colorize;
use pgdrift::cli::commands::check::{CheckCommand, CheckCommandHandler};
use pgdrift::cli::commands::clean::{CleanCommand, CleanCommandHandler};
use pgdrift::cli::commands::diff::{DiffCommand, DiffCommandHandler};
use pgdrift::cli::{Cli, Commands};
use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    // CLIをパースして実行
    let cli = Cli::parse();

    // --no-color フラグの処理
    if cli.no_color {
        color_control::set_override(false);
    }

    init_tracing(cli.verbose);

    // 処理は常に逐次なのでシングルスレッドのランタイムで十分
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create Tokio runtime")
        .unwrap_or_else(|e| exit_with_error(&e));

    let result = runtime.block_on(run_command(cli));

    match result {
        Ok(output) => {
            if let Err(e) = write_output(&output) {
                exit_with_error(&e);
            }
        }
        Err(e) => exit_with_error(&e),
    }
}

/// ログ出力を初期化（標準エラー出力のみ）
///
/// RUST_LOG が設定されていればそちらを優先する。
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "pgdrift=info" } else { "pgdrift=warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// コマンドを実行する
async fn run_command(cli: Cli) -> Result<String> {
    // プロジェクトのルートパスを取得
    let project_path = env::current_dir()?;

    // --config フラグの処理（絶対パスに変換）
    let config_path: Option<PathBuf> = cli.config.map(|p| {
        if p.is_absolute() {
            p
        } else {
            project_path.join(p)
        }
    });

    match cli.command {
        Commands::Diff => {
            let handler = DiffCommandHandler::new();
            let command = DiffCommand {
                project_path,
                config_path,
            };
            handler.execute(&command).await
        }

        Commands::Check => {
            let handler = CheckCommandHandler::new();
            let command = CheckCommand {
                project_path,
                config_path,
            };
            let output = handler.execute(&command).await?;
            // エラー終了の前に未適用のDDLを出力する
            write_output(&output.script)?;
            output.into_result()?;
            Ok(String::new())
        }

        Commands::Clean => {
            let handler = CleanCommandHandler::new();
            let command = CleanCommand {
                project_path,
                config_path,
            };
            handler.execute(&command).await
        }
    }
}

/// スクリプトをそのまま標準出力に書き出す（末尾に改行を足さない）
fn write_output(output: &str) -> Result<()> {
    if output.is_empty() {
        return Ok(());
    }
    let mut stdout = io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

fn exit_with_error(error: &anyhow::Error) -> ! {
    eprintln!("{} {:#}", "Error:".red().bold(), error);
    process::exit(1);
}
