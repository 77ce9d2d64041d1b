//! Command-line surface: flags, interactive prompts and console output

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;

use crate::config::{ModelSettings, ModelTier, OutputCount};
use crate::core::{format_cost, PipelineEvent, Reporter, RunReport, Stage, TokenCounts};

/// Run the SmartGPT generate / critique / resolve / extract pipeline
#[derive(Parser, Debug, Clone)]
#[command(name = "smartgpt", version, about)]
pub struct Args {
    /// Question to answer (prompted for when omitted)
    #[arg(short, long)]
    pub question: Option<String>,

    /// Number of candidate answers to generate, 1 to 4 (prompted for when omitted)
    #[arg(short = 'n', long)]
    pub outputs: Option<OutputCount>,

    /// Use the premium model for every stage, not just resolution
    #[arg(short, long)]
    pub premium: bool,

    /// Settings file (TOML)
    #[arg(short, long, env = "SMARTGPT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print the run report as JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Ask for the output count until a valid one is entered; blank means 3
pub fn prompt_output_count(input: &mut impl BufRead, output: &mut impl Write) -> io::Result<OutputCount> {
    loop {
        let line = prompt(
            input,
            output,
            &format!(
                "Enter the # of outputs you want ({} to {}, default {}): ",
                OutputCount::MIN,
                OutputCount::MAX,
                OutputCount::DEFAULT
            ),
        )?;
        if let Some(count) = OutputCount::from_prompt_input(&line) {
            return Ok(count);
        }
    }
}

/// Ask for the question until a non-blank one is entered
pub fn prompt_question(input: &mut impl BufRead, output: &mut impl Write) -> io::Result<String> {
    loop {
        let line = prompt(input, output, "Question: ")?;
        let question = line.trim();
        if !question.is_empty() {
            return Ok(question.to_string());
        }
    }
}

fn prompt(input: &mut impl BufRead, output: &mut impl Write, text: &str) -> io::Result<String> {
    write!(output, "{}", text)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
    }
    Ok(line)
}

/// Prints pipeline progress to stderr, keeping stdout for the answer
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn report(&self, event: PipelineEvent) {
        match event {
            PipelineEvent::StageStarted(Stage::Generating) => eprintln!("\nProcess Starting\nGenerating answers"),
            PipelineEvent::StageStarted(stage) => eprintln!("{}: {}/4", stage, stage.number()),
            PipelineEvent::AnswerGenerated { completed, total } => {
                eprintln!("Generating answers: {}/{} complete", completed, total)
            }
            PipelineEvent::TranscriptSaved(path) => eprintln!("Transcript saved to {}", path.display()),
        }
    }
}

/// Human-readable summary of a finished run
pub fn render_report(report: &RunReport, models: &ModelSettings) -> String {
    format!(
        "\nSmartGPT Final Answer:\n{}\n{}",
        report.final_answer,
        render_usage(&report.tokens, report.cost, models)
    )
}

/// Per-model token totals followed by the estimated cost
fn render_usage(tokens: &TokenCounts, cost: f64, models: &ModelSettings) -> String {
    let mut out = String::new();
    for tier in ModelTier::ALL {
        out.push_str(&format!("\nYou used {} {} tokens", tokens.get(tier), models.id(tier)));
    }
    out.push_str(&format!("\nTotal Cost: {}\n", format_cost(cost)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_output_count_reprompts_until_valid() {
        let mut input = Cursor::new("0\nfive\n9\n2\n");
        let mut output = Vec::new();

        let count = prompt_output_count(&mut input, &mut output).unwrap();

        assert_eq!(count.get(), 2);
        let shown = String::from_utf8(output).unwrap();
        assert_eq!(shown.matches("Enter the # of outputs").count(), 4);
    }

    #[test]
    fn test_blank_output_count_defaults_to_three() {
        let mut input = Cursor::new("\n");
        let count = prompt_output_count(&mut input, &mut Vec::new()).unwrap();
        assert_eq!(count, OutputCount::DEFAULT);
    }

    #[test]
    fn test_closed_input_is_an_error() {
        let mut input = Cursor::new("");
        let err = prompt_output_count(&mut input, &mut Vec::new()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_question_skips_blank_lines() {
        let mut input = Cursor::new("\n   \nWhat is 2+2?\n");
        let question = prompt_question(&mut input, &mut Vec::new()).unwrap();
        assert_eq!(question, "What is 2+2?");
    }

    #[test]
    fn test_parse_args() {
        let args = Args::try_parse_from(["smartgpt", "-q", "What is 2+2?", "-n", "2", "--premium"]).unwrap();
        assert_eq!(args.question.as_deref(), Some("What is 2+2?"));
        assert_eq!(args.outputs.map(OutputCount::get), Some(2));
        assert!(args.premium);

        assert!(Args::try_parse_from(["smartgpt", "-n", "5"]).is_err());
    }

    #[test]
    fn test_render_report() {
        let report = RunReport {
            final_answer: "4".into(),
            resolved: "Improved: 4".into(),
            transcript: PathBuf::from("conversations/question_1.txt"),
            tokens: TokenCounts {
                cheap: 1000,
                premium: 100,
            },
            cost: 0.008,
        };

        let text = render_report(&report, &ModelSettings::default());
        assert!(text.contains("SmartGPT Final Answer:\n4\n"));
        assert!(text.contains("You used 1000 gpt-3.5-turbo tokens"));
        assert!(text.contains("You used 100 gpt-4 tokens"));
        assert!(text.ends_with("Total Cost: $0.01\n"));
    }

    #[test]
    fn test_render_usage_without_tokens() {
        let text = render_usage(&TokenCounts::default(), 0.0, &ModelSettings::default());
        assert_eq!(
            text,
            "\nYou used 0 gpt-3.5-turbo tokens\nYou used 0 gpt-4 tokens\nTotal Cost: $0.00\n"
        );
    }
}
