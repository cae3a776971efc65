//! `ampframe` binary: encode and decode AMP boxes on stdio.

mod cli;

use ampframe::{AmpBox, codec};
use clap::Parser;
use cli::{Cli, Command};
use tokio::io::{AsyncWriteExt, BufReader};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so they never mix with encoded output.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Encode { pairs } => {
            let ampbox: AmpBox = pairs.into_iter().collect();
            let wire = codec::serialize(&ampbox)?;
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&wire).await?;
            stdout.flush().await?;
        }
        Command::Decode => {
            let mut stdin = BufReader::new(tokio::io::stdin());
            let mut first = true;
            loop {
                let ampbox = match codec::decode(&mut stdin).await {
                    Ok(ampbox) => ampbox,
                    Err(err) if err.is_clean_close() => break,
                    Err(err) => return Err(err.into()),
                };
                if !first {
                    println!();
                }
                first = false;
                for (key, value) in ampbox.iter() {
                    println!("{key}={value}");
                }
            }
        }
    }
    Ok(())
}
