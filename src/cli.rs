use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    version,
    about = "Generate SQL Server CREATE TABLE statements from CSV data",
    long_about = None
)]
pub struct Cli {
    /// Input CSV file(s); one CREATE TABLE statement is emitted per file
    #[arg(short = 'i', long = "input", required = true, action = clap::ArgAction::Append)]
    pub inputs: Vec<PathBuf>,
    /// Destination .sql file path
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
    /// Treat the first row of each input as column headers
    #[arg(long = "headers")]
    pub headers: bool,
    /// Inject an [Id] int IDENTITY(1,1) primary-key column into each table
    #[arg(long = "identity")]
    pub identity: bool,
    /// Schema qualifier for generated tables
    #[arg(long = "schema", default_value = "dbo")]
    pub schema: String,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
