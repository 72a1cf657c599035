use clap::{Args, ValueEnum};
use std::path::Path;
use teidaishu_pipeline::params::{DEFAULT_QUERY_MAX_CHARS, DEFAULT_QUERY_TOP_K};
use teidaishu_pipeline::{QueryOutput, QueryParams, QueryResult};

const EXCERPT_CHARS: usize = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Jsonl,
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// The question (read from stdin when omitted)
    pub question: Option<String>,

    /// Matches requested from the index
    #[arg(long, default_value_t = DEFAULT_QUERY_TOP_K as u32, value_parser = clap::value_parser!(u32).range(1..=50))]
    pub topk: u32,

    /// Fetch each match's stored text
    #[arg(long)]
    pub with_text: bool,

    /// Per-match text cap when --with-text is set
    #[arg(long, default_value_t = DEFAULT_QUERY_MAX_CHARS as usize)]
    pub max_chars: usize,

    #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
    pub format: OutputFormat,

    /// Metadata filter as a JSON object
    #[arg(long)]
    pub filter_json: Option<String>,
}

pub async fn run(
    config_path: Option<&Path>,
    mut args: QueryArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;

    let query = super::read_question(args.question.take())?;
    let params = QueryParams {
        query,
        top_k: args.topk,
        with_text: args.with_text,
        max_chars: args.max_chars.clamp(1, 20_000),
        filter: super::parse_filter(args.filter_json.as_deref())?,
    };

    let pipeline = teidaishu_pipeline::build_from_config(&config)?;
    let output = pipeline.query(&params).await?;

    match args.format {
        OutputFormat::Pretty => print!("{}", render_pretty(&output)),
        OutputFormat::Jsonl => print!("{}", render_jsonl(&output)?),
    }
    Ok(())
}

pub fn render_pretty(output: &QueryOutput) -> String {
    let mut out = format!(
        "🔎 {} match(es) from {} (topk={})\n",
        output.matches, output.index, output.topk
    );
    for (i, result) in output.results.iter().enumerate() {
        out.push_str(&format!("{}. score={:.6} id={}\n", i + 1, result.score, result.id));
        if let Some(text) = &result.text {
            out.push_str(&format!("   {}\n", excerpt(text, EXCERPT_CHARS)));
        }
    }
    out
}

pub fn render_jsonl(output: &QueryOutput) -> Result<String, serde_json::Error> {
    let mut out = String::new();
    for result in &output.results {
        out.push_str(&serde_json::to_string::<QueryResult>(result)?);
        out.push('\n');
    }
    Ok(out)
}

/// Collapse whitespace runs and cut to `max` chars.
pub fn excerpt(text: &str, max: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max {
        collapsed
    } else {
        let cut: String = collapsed.chars().take(max).collect();
        format!("{cut}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teidaishu_core::matches::Metadata;

    fn output() -> QueryOutput {
        QueryOutput {
            index: "reddit".into(),
            topk: 2,
            matches: 2,
            results: vec![
                QueryResult {
                    id: "japan:thread:c:1".into(),
                    score: 0.87654321,
                    metadata: Metadata::new().with("h", "abc"),
                    text: Some("line one\n\n   line   two".into()),
                },
                QueryResult {
                    id: "japan:thread:c:2".into(),
                    score: 0.5,
                    metadata: Metadata::new(),
                    text: None,
                },
            ],
        }
    }

    #[test]
    fn excerpt_collapses_and_cuts() {
        assert_eq!(excerpt("  a \n\t b  ", 120), "a b");
        let long = "あ".repeat(130);
        let cut = excerpt(&long, 120);
        assert_eq!(cut.chars().count(), 121);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn pretty_numbers_matches() {
        let text = render_pretty(&output());
        assert!(text.contains("1. score=0.876543 id=japan:thread:c:1\n   line one line two\n"));
        assert!(text.contains("2. score=0.500000 id=japan:thread:c:2\n"));
    }

    #[test]
    fn jsonl_is_one_object_per_line() {
        let text = render_jsonl(&output()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["id"], "japan:thread:c:1");
        assert_eq!(first["metadata"]["h"], "abc");
        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert!(second.get("text").is_none());
    }
}
