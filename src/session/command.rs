//! Line-oriented session commands.

use crate::error::{ForecastError, Result};
use std::path::PathBuf;
use std::str::FromStr;

/// One user action against a [`Session`](super::Session).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Load a CSV or XLSX file, replacing any current dataset.
    Load(PathBuf),
    DeleteColumn(String),
    RenameColumn { from: String, to: String },
    /// Set the forecasting API key.
    SetCredential(String),
    /// Preview the first rows; `None` uses the configured preview size.
    Show(Option<usize>),
    Columns,
    /// Write the current dataset to a CSV file.
    Export(PathBuf),
    Train { time: String, target: String },
    /// Render the last forecast comparison; `.svg` draws a chart, `.csv` writes a table.
    Report(PathBuf),
    Close,
}

impl Command {
    /// Verb used in logs; arguments may carry secrets.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Load(_) => "load",
            Command::DeleteColumn(_) => "delete",
            Command::RenameColumn { .. } => "rename",
            Command::SetCredential(_) => "key",
            Command::Show(_) => "show",
            Command::Columns => "columns",
            Command::Export(_) => "export",
            Command::Train { .. } => "train",
            Command::Report(_) => "report",
            Command::Close => "close",
        }
    }
}

/// Split a line into words; double quotes group words with spaces.
fn tokenize(line: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut pending = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                quoted = !quoted;
                pending = true;
            }
            c if c.is_whitespace() && !quoted => {
                if pending {
                    tokens.push(std::mem::take(&mut current));
                    pending = false;
                }
            }
            c => {
                current.push(c);
                pending = true;
            }
        }
    }
    if quoted {
        return Err(ForecastError::ParseError(format!(
            "unterminated quote in {:?}",
            line
        )));
    }
    if pending {
        tokens.push(current);
    }
    Ok(tokens)
}

fn expect_args(verb: &str, args: &[String], count: usize, usage: &str) -> Result<()> {
    if args.len() != count {
        return Err(ForecastError::ParseError(format!(
            "'{}' expects {} argument(s): {}",
            verb, count, usage
        )));
    }
    Ok(())
}

impl FromStr for Command {
    type Err = ForecastError;

    fn from_str(line: &str) -> Result<Self> {
        let tokens = tokenize(line.trim())?;
        let (verb, args) = match tokens.split_first() {
            Some((verb, args)) => (verb.to_ascii_lowercase(), args),
            None => return Err(ForecastError::ParseError("empty command".to_string())),
        };

        match verb.as_str() {
            "load" | "open" => {
                expect_args(&verb, args, 1, "load <file.csv|file.xlsx>")?;
                Ok(Command::Load(PathBuf::from(&args[0])))
            }
            "delete" | "drop" => {
                expect_args(&verb, args, 1, "delete <column>")?;
                Ok(Command::DeleteColumn(args[0].clone()))
            }
            "rename" => {
                expect_args(&verb, args, 2, "rename <column> <new name>")?;
                Ok(Command::RenameColumn {
                    from: args[0].clone(),
                    to: args[1].clone(),
                })
            }
            "key" | "apikey" => {
                expect_args(&verb, args, 1, "key <api key>")?;
                Ok(Command::SetCredential(args[0].clone()))
            }
            "show" | "head" => match args {
                [] => Ok(Command::Show(None)),
                [n] => n.parse().map(|n| Command::Show(Some(n))).map_err(|_| {
                    ForecastError::ParseError(format!("row count must be a number, got {:?}", n))
                }),
                _ => Err(ForecastError::ParseError(
                    "'show' expects at most one argument: show [rows]".to_string(),
                )),
            },
            "columns" | "cols" => {
                expect_args(&verb, args, 0, "columns")?;
                Ok(Command::Columns)
            }
            "export" | "save" => {
                expect_args(&verb, args, 1, "export <file.csv>")?;
                Ok(Command::Export(PathBuf::from(&args[0])))
            }
            "train" | "forecast" => {
                expect_args(&verb, args, 2, "train <time column> <target column>")?;
                Ok(Command::Train {
                    time: args[0].clone(),
                    target: args[1].clone(),
                })
            }
            "report" | "plot" => {
                expect_args(&verb, args, 1, "report <file.svg|file.csv>")?;
                Ok(Command::Report(PathBuf::from(&args[0])))
            }
            "close" | "quit" | "exit" => Ok(Command::Close),
            other => Err(ForecastError::ParseError(format!(
                "unknown command '{}'",
                other
            ))),
        }
    }
}
