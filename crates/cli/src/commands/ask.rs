use clap::Args;
use std::path::Path;
use teidaishu_core::matches::SourceRecord;
use teidaishu_pipeline::params::{
    DEFAULT_ASK_TOP_K, DEFAULT_CTX_MAX_CHARS, DEFAULT_MAX_DOCS, DEFAULT_MAX_OUTPUT_TOKENS,
    DEFAULT_TEMPERATURE,
};
use teidaishu_pipeline::{AnswerOutput, AskParams};
use tracing::debug;

#[derive(Args, Debug)]
pub struct AskArgs {
    /// The question (read from stdin when omitted)
    pub question: Option<String>,

    /// Candidates requested from the index
    #[arg(long, default_value_t = DEFAULT_ASK_TOP_K as u32, value_parser = clap::value_parser!(u32).range(1..=50))]
    pub topk: u32,

    /// Maximum distinct sources used as context
    #[arg(long, default_value_t = DEFAULT_MAX_DOCS as usize)]
    pub max_docs: usize,

    /// Context character budget
    #[arg(long, default_value_t = DEFAULT_CTX_MAX_CHARS as usize)]
    pub ctx_max_chars: usize,

    /// Sampling temperature
    #[arg(long, default_value_t = DEFAULT_TEMPERATURE)]
    pub temperature: f64,

    /// Output token cap
    #[arg(long, default_value_t = DEFAULT_MAX_OUTPUT_TOKENS as u32, value_parser = clap::value_parser!(u32).range(1..=8192))]
    pub max_output_tokens: u32,

    /// Keep several passages from the same thread
    #[arg(long)]
    pub no_dedup_sid: bool,

    /// Print the composed prompt instead of calling the generator
    #[arg(long)]
    pub dry_run: bool,

    /// Metadata filter as a JSON object
    #[arg(long)]
    pub filter_json: Option<String>,
}

impl AskArgs {
    fn into_params(self, query: String) -> Result<AskParams, Box<dyn std::error::Error>> {
        let filter = super::parse_filter(self.filter_json.as_deref())?;
        Ok(AskParams {
            query,
            top_k: self.topk,
            max_docs: self.max_docs.clamp(1, 50),
            ctx_max_chars: self.ctx_max_chars.clamp(1, 20_000),
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
            dedup_sid: !self.no_dedup_sid,
            filter,
        })
    }
}

pub async fn run(
    config_path: Option<&Path>,
    mut args: AskArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;

    let query = super::read_question(args.question.take())?;
    let dry_run = args.dry_run;
    let params = args.into_params(query)?;
    let pipeline = teidaishu_pipeline::build_from_config(&config)?;
    debug!(topk = params.top_k, max_docs = params.max_docs, dry_run, "Running ask");

    if dry_run {
        let prepared = pipeline.prepare(&params).await?;
        println!("{}", prepared.prompt());
        eprintln!(
            "-- {} block(s), {} chars of context{}",
            prepared.context.blocks.len(),
            prepared.context.used_chars,
            if prepared.context.stopped_early {
                ", budget reached"
            } else {
                ""
            }
        );
        return Ok(());
    }

    let output = pipeline.ask(&params).await?;
    print!("{}", render_answer(&output));
    Ok(())
}

/// Answer text followed by a numbered SOURCES list.
pub fn render_answer(output: &AnswerOutput) -> String {
    let mut out = String::new();
    out.push_str(output.answer.trim_end());
    out.push_str("\n\nSOURCES\n");
    if output.sources.is_empty() {
        out.push_str("  (none)\n");
    }
    for (i, source) in output.sources.iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", i + 1, source_line(source)));
    }
    out
}

fn source_line(source: &SourceRecord) -> String {
    let mut line = format!("score={:.6} id={}", source.score, source.id);
    for (label, value) in [("sub", &source.sub), ("t", &source.t), ("sid", &source.sid)] {
        if !value.is_empty() {
            line.push_str(&format!(" {label}={value}"));
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(id: &str, score: f64, sub: &str) -> SourceRecord {
        SourceRecord {
            id: id.into(),
            score,
            sub: sub.into(),
            t: "comment".into(),
            sid: "thread1".into(),
            pid: String::new(),
        }
    }

    #[test]
    fn renders_answer_and_sources() {
        let output = AnswerOutput {
            query: "q".into(),
            answer: "The answer.\n".into(),
            sources: vec![source("a:1", 0.91, "japan"), source("b:2", 0.5, "")],
        };
        let text = render_answer(&output);
        assert!(text.starts_with("The answer.\n\nSOURCES\n"));
        assert!(text.contains("  1. score=0.910000 id=a:1 sub=japan t=comment sid=thread1\n"));
        assert!(text.contains("  2. score=0.500000 id=b:2 t=comment sid=thread1\n"));
    }

    #[test]
    fn renders_empty_sources() {
        let output = AnswerOutput {
            query: "q".into(),
            answer: "I don't know.".into(),
            sources: vec![],
        };
        assert!(render_answer(&output).ends_with("SOURCES\n  (none)\n"));
    }

    #[test]
    fn args_map_to_params() {
        let args = AskArgs {
            question: None,
            topk: 5,
            max_docs: 500,
            ctx_max_chars: 0,
            temperature: 0.1,
            max_output_tokens: 100,
            no_dedup_sid: true,
            dry_run: false,
            filter_json: Some(r#"{"sub":"japan"}"#.into()),
        };
        let params = args.into_params("why?".into()).unwrap();
        assert_eq!(params.top_k, 5);
        assert_eq!(params.max_docs, 50);
        assert_eq!(params.ctx_max_chars, 1);
        assert!(!params.dedup_sid);
        assert_eq!(params.filter, Some(serde_json::json!({"sub": "japan"})));
    }
}
