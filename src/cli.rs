use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::{data, reorder::DropHalf};

#[derive(Debug, Parser)]
#[command(author, version, about = "Configure and fill data-entry forms over a table", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the columns of the bound table with their resolved input shapes
    Columns(HostArgs),
    /// Print the form configuration, creating or migrating it as needed
    Show(HostArgs),
    /// Append a field or a static element to the form
    Add(AddArgs),
    /// Remove the element at an index
    Remove(RemoveArgs),
    /// Change the label of a field
    Label(EditTextArgs),
    /// Change the content of a title or text element
    Content(EditTextArgs),
    /// Mark a field as required or optional
    Required(RequiredArgs),
    /// Set or clear the maximum length of a field
    MaxLength(MaxLengthArgs),
    /// Show a field only while another field holds a given value
    Conditional(ConditionalArgs),
    /// Move an element by dropping it on the top or bottom half of another
    Move(MoveArgs),
    /// Print the data-entry form for a set of input values
    Form(FormArgs),
    /// Validate the input values and append them as a new record
    Submit(SubmitArgs),
}

#[derive(Debug, Clone, Args)]
pub struct HostArgs {
    /// YAML description of the tables the form is bound to
    #[arg(short = 'd', long = "document")]
    pub document: PathBuf,
    /// JSON file holding the stored form configuration
    #[arg(short = 'o', long = "options")]
    pub options: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum ElementKindArg {
    Field,
    Separator,
    Title,
    Text,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    #[command(flatten)]
    pub host: HostArgs,
    /// Kind of element to add
    #[arg(value_enum)]
    pub kind: ElementKindArg,
    /// Column id for a field, content for a title or text
    pub value: Option<String>,
}

#[derive(Debug, Args)]
pub struct RemoveArgs {
    #[command(flatten)]
    pub host: HostArgs,
    /// Zero-based element index
    #[arg(short, long)]
    pub index: usize,
}

#[derive(Debug, Args)]
pub struct EditTextArgs {
    #[command(flatten)]
    pub host: HostArgs,
    /// Zero-based element index
    #[arg(short, long)]
    pub index: usize,
    /// New text
    pub text: String,
}

#[derive(Debug, Args)]
pub struct RequiredArgs {
    #[command(flatten)]
    pub host: HostArgs,
    /// Zero-based element index
    #[arg(short, long)]
    pub index: usize,
    /// Whether the field must be filled (true/false, yes/no, 1/0)
    #[arg(value_name = "REQUIRED", value_parser = parse_flag_arg, action = clap::ArgAction::Set)]
    pub state: bool,
}

#[derive(Debug, Args)]
pub struct MaxLengthArgs {
    #[command(flatten)]
    pub host: HostArgs,
    /// Zero-based element index
    #[arg(short, long)]
    pub index: usize,
    /// Maximum number of characters; omit or pass 0 to clear
    #[arg(long)]
    pub value: Option<u32>,
}

#[derive(Debug, Args)]
pub struct ConditionalArgs {
    #[command(flatten)]
    pub host: HostArgs,
    /// Zero-based element index
    #[arg(short, long)]
    pub index: usize,
    /// Column of the field the rule watches; omit to clear the rule
    #[arg(long, requires = "value")]
    pub field: Option<String>,
    /// Value the watched field must hold
    #[arg(long, requires = "field")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum HalfArg {
    #[default]
    Top,
    Bottom,
}

impl From<HalfArg> for DropHalf {
    fn from(value: HalfArg) -> Self {
        match value {
            HalfArg::Top => DropHalf::Top,
            HalfArg::Bottom => DropHalf::Bottom,
        }
    }
}

#[derive(Debug, Args)]
pub struct MoveArgs {
    #[command(flatten)]
    pub host: HostArgs,
    /// Index of the dragged element
    #[arg(long)]
    pub from: usize,
    /// Index of the element it is dropped on
    #[arg(long)]
    pub to: usize,
    /// Half of the target element receiving the drop
    #[arg(long, value_enum, default_value_t = HalfArg::Top)]
    pub half: HalfArg,
}

#[derive(Debug, Args)]
pub struct FormArgs {
    #[command(flatten)]
    pub host: HostArgs,
    /// Input value as COLUMN=VALUE; repeat to fill several fields or to
    /// select several values of a multi-valued column
    #[arg(long = "set", value_parser = parse_assignment, action = clap::ArgAction::Append)]
    pub set: Vec<(String, String)>,
}

#[derive(Debug, Args)]
pub struct SubmitArgs {
    #[command(flatten)]
    pub form: FormArgs,
    /// CSV file receiving the new record
    #[arg(short, long)]
    pub records: PathBuf,
}

pub fn parse_assignment(value: &str) -> Result<(String, String), String> {
    let (column, raw) = value
        .split_once('=')
        .ok_or_else(|| format!("Expected COLUMN=VALUE but got '{value}'"))?;
    let column = column.trim();
    if column.is_empty() {
        return Err("Column name cannot be empty".to_string());
    }
    Ok((column.to_string(), raw.to_string()))
}

fn parse_flag_arg(value: &str) -> Result<bool, String> {
    data::parse_flag(value).map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_splits_on_first_equals() {
        assert_eq!(
            parse_assignment("Note=a=b").unwrap(),
            ("Note".to_string(), "a=b".to_string())
        );
        assert_eq!(
            parse_assignment(" Tags =").unwrap(),
            ("Tags".to_string(), String::new())
        );
        assert!(parse_assignment("novalue").is_err());
        assert!(parse_assignment("=x").is_err());
    }

    #[test]
    fn conditional_field_and_value_come_together() {
        let parsed = Cli::try_parse_from([
            "tabform",
            "conditional",
            "-d",
            "doc.yaml",
            "-o",
            "options.json",
            "--index",
            "1",
            "--field",
            "Status",
        ]);
        assert!(parsed.is_err());
    }
}
