use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use survey_ranking::builder::Builder;
use survey_ranking::similarity::normalize;
use survey_ranking::*;

use crate::args::Args;
use crate::survey::config_reader::*;

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_forms;
mod io_json;

#[derive(Debug, Snafu)]
pub enum SurveyError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The Excel file has no usable content"))]
    EmptyExcel {},
    #[snafu(display("Unexpected cell at line {lineno}: {content}"))]
    ExcelWrongCellType { lineno: u64, content: String },
    #[snafu(display("Cannot find the question {question_name:?} in the first row of the Excel file"))]
    ExcelCannotFindQuestionInHeader { question_name: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON content"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Expected a column number or a column letter"))]
    ParsingJsonNumber {},
    #[snafu(display("Question {index} is not a JSON object: {content}"))]
    JsonWrongType { index: usize, content: String },
    #[snafu(display("Error opening the CSV file"))]
    CsvOpen { source: csv::Error },
    #[snafu(display("Error reading a line of the CSV file"))]
    CsvLineParse { source: csv::Error },
    #[snafu(display("Line {lineno} is too short"))]
    CsvLineTooShort { lineno: usize },
    #[snafu(display("Cannot understand {content:?} at line {lineno}"))]
    CsvWrongValue { lineno: usize, content: String },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("No question source provided"))]
    MissingQuestionSources {},
    #[snafu(display("Provider not implemented: {provider:?}"))]
    UnknownProvider { provider: String },
    #[snafu(display("Error writing the output to {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type SurveyResult<T> = Result<T, SurveyError>;

/// An answer as read from a source.
/// This is before applying defaults for the missing fields.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ParsedAnswer {
    pub id: Option<String>,
    pub text: String,
    pub count: Option<u64>,
    pub is_correct: Option<bool>,
    pub rank: Option<u32>,
    pub score: Option<u32>,
}

/// A question as read from a source.
#[derive(PartialEq, Debug, Clone)]
pub struct ParsedQuestion {
    pub text: String,
    pub answers: Vec<ParsedAnswer>,
    /// Individual responses (to be aggregated) rather than stored answer records.
    pub raw_responses: bool,
    /// Everything else attached to the question. Passed through untouched.
    pub metadata: JSMap<String, JSValue>,
}

/// A question ready to be processed, with the metadata of its source.
#[derive(PartialEq, Debug, Clone)]
struct StoredQuestion {
    record: QuestionRecord,
    metadata: JSMap<String, JSValue>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
struct SurveySummary {
    total_questions: usize,
    processed_count: usize,
    skipped_count: usize,
    duplicates_merged: usize,
    answers_ranked: usize,
    answers_scored: usize,
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
struct ExportStats {
    exported_count: usize,
    skipped_wrong_type: usize,
    skipped_insufficient: usize,
}

#[derive(PartialEq, Debug, Clone)]
struct ProcessingRules {
    ranking: RankingRules,
    minimum_correct_answers: usize,
    final_export: bool,
}

const DEFAULT_MINIMUM_CORRECT_ANSWERS: usize = 3;

fn read_questions(root_path: &Path, cfs: &FileSource) -> SurveyResult<Vec<ParsedQuestion>> {
    let p: PathBuf = root_path.join(&cfs.file_path);
    let p2 = p.as_path().display().to_string();
    info!("Attempting to read answers file {:?}", p2);
    match cfs.provider.as_str() {
        "json" => io_json::read_json_questions(p2),
        "csv" => io_csv::read_csv_answers(p2, cfs),
        "forms" => io_forms::read_forms_answers(p2, cfs),
        x => UnknownProviderSnafu { provider: x }.fail(),
    }
}

// Applies the defaults to the parsed questions and marks the answers from the answer keys.
fn validate_questions(
    parsed: &[ParsedQuestion],
    answer_keys: &[AnswerKey],
) -> Vec<StoredQuestion> {
    let mut res: Vec<StoredQuestion> = Vec::new();
    for pq in parsed.iter() {
        let mut builder = Builder::new(&pq.text);
        for pa in pq.answers.iter() {
            if pq.raw_responses {
                builder.add_answer(
                    &pa.text,
                    pa.count.unwrap_or(1),
                    pa.is_correct.unwrap_or(false),
                );
            } else {
                builder.add_answer_record(&AnswerRecord {
                    text: pa.text.clone(),
                    is_correct: pa.is_correct.unwrap_or(false),
                    response_count: pa.count.unwrap_or(0),
                    rank: pa.rank.unwrap_or(0),
                    score: pa.score.unwrap_or(0),
                    identifier: pa.id.clone(),
                });
            }
        }

        let question_key = normalize(&pq.text);
        let keys: HashSet<String> = answer_keys
            .iter()
            .filter(|k| normalize(&k.question) == question_key)
            .flat_map(|k| k.answers.iter().map(|a| normalize(a)))
            .collect();
        if !keys.is_empty() {
            debug!("Answer keys for question {:?}: {:?}", pq.text, keys);
            builder.mark_correct(|text| keys.contains(&normalize(text)));
        }

        res.push(StoredQuestion {
            record: builder.build(),
            metadata: pq.metadata.clone(),
        });
    }
    res
}

fn validate_rules(config: &SurveyConfig) -> SurveyResult<ProcessingRules> {
    let rules = config.rules.clone().unwrap_or_default();
    let similarity_threshold = match rules.similarity_threshold {
        None => DEFAULT_SIMILARITY_THRESHOLD,
        Some(x) if !x.is_finite() => {
            whatever!("Invalid similarity threshold: {:?}", x)
        }
        Some(x) if !(0.0..=1.0).contains(&x) => {
            let clamped = x.clamp(0.0, 1.0);
            warn!(
                "Similarity threshold {} is outside of [0, 1], using {} instead",
                x, clamped
            );
            clamped
        }
        Some(x) => x,
    };
    let score_tiers = rules
        .score_tiers
        .unwrap_or_else(|| DEFAULT_SCORE_TIERS.to_vec());
    Ok(ProcessingRules {
        ranking: RankingRules::new(similarity_threshold, &score_tiers),
        minimum_correct_answers: rules
            .minimum_correct_answers
            .unwrap_or(DEFAULT_MINIMUM_CORRECT_ANSWERS),
        final_export: config.output_settings.final_export.unwrap_or(false),
    })
}

fn process_questions(
    questions: &[StoredQuestion],
    rules: &RankingRules,
) -> (Vec<StoredQuestion>, SurveySummary) {
    let mut summary = SurveySummary {
        total_questions: questions.len(),
        ..Default::default()
    };
    let mut res: Vec<StoredQuestion> = Vec::new();
    for q in questions.iter() {
        if q.record.answers.is_empty() {
            debug!("Skipping question without answers: {:?}", q.record.text);
            summary.skipped_count += 1;
            res.push(q.clone());
            continue;
        }
        let stats = process_question_stats(&q.record, rules);
        summary.processed_count += 1;
        summary.duplicates_merged += stats.duplicates_merged;
        summary.answers_ranked += stats.answers_ranked;
        summary.answers_scored += stats.answers_scored;
        res.push(StoredQuestion {
            record: stats.question,
            metadata: q.metadata.clone(),
        });
    }
    info!("Processing summary: {:?}", summary);
    (res, summary)
}

// Only the input questions with enough correct answers make it to the final leaderboard,
// with their correct answers only.
fn filter_final_export(
    questions: &[StoredQuestion],
    minimum_correct_answers: usize,
) -> (Vec<StoredQuestion>, ExportStats) {
    let mut stats = ExportStats::default();
    let mut res: Vec<StoredQuestion> = Vec::new();
    for q in questions.iter() {
        let question_type = q
            .metadata
            .get("questionType")
            .and_then(|v| v.as_str())
            .map(|s| s.to_lowercase());
        if let Some(qt) = question_type {
            if qt != "input" {
                debug!(
                    "Final export: skipping {:?} question {:?}",
                    qt, q.record.text
                );
                stats.skipped_wrong_type += 1;
                continue;
            }
        }
        let correct: Vec<AnswerRecord> = q
            .record
            .answers
            .iter()
            .filter(|a| a.is_correct)
            .cloned()
            .collect();
        if correct.len() < minimum_correct_answers {
            warn!(
                "Final export: question {:?} needs at least {} correct answers, found {}",
                q.record.text,
                minimum_correct_answers,
                correct.len()
            );
            stats.skipped_insufficient += 1;
            continue;
        }
        stats.exported_count += 1;
        res.push(StoredQuestion {
            record: QuestionRecord {
                text: q.record.text.clone(),
                answers: correct,
            },
            metadata: q.metadata.clone(),
        });
    }
    (res, stats)
}

fn answer_to_json(a: &AnswerRecord) -> JSValue {
    let mut js = json!({
        "answer": a.text,
        "isCorrect": a.is_correct,
        "responseCount": a.response_count,
        "rank": a.rank,
        "score": a.score,
    });
    if let Some(id) = &a.identifier {
        js["_id"] = json!(id);
    }
    js
}

fn question_to_json(q: &StoredQuestion) -> JSValue {
    let mut obj = q.metadata.clone();
    obj.insert("question".to_string(), json!(q.record.text));
    let answers: Vec<JSValue> = q.record.answers.iter().map(answer_to_json).collect();
    obj.insert("answers".to_string(), JSValue::Array(answers));
    JSValue::Object(obj)
}

fn build_summary_js(
    config: &SurveyConfig,
    rules: &ProcessingRules,
    summary: &SurveySummary,
    export: &Option<ExportStats>,
    results: &[StoredQuestion],
) -> JSValue {
    let c = OutputConfig {
        survey: config.output_settings.survey_name.clone(),
        date: config.output_settings.survey_date.clone(),
        similarity_threshold: rules.ranking.similarity_threshold,
        score_tiers: rules.ranking.score_tiers.clone(),
    };
    let mut js = json!({
        "config": c,
        "summary": {
            "totalQuestions": summary.total_questions,
            "processedCount": summary.processed_count,
            "skippedCount": summary.skipped_count,
            "duplicatesMerged": summary.duplicates_merged,
            "answersRanked": summary.answers_ranked,
            "answersScored": summary.answers_scored,
            "updatedCount": results.len(),
        },
        "results": results.iter().map(question_to_json).collect::<Vec<JSValue>>(),
    });
    if let Some(es) = export {
        js["finalExport"] = json!({
            "exportedCount": es.exported_count,
            "skippedWrongType": es.skipped_wrong_type,
            "skippedInsufficient": es.skipped_insufficient,
        });
    }
    js
}

/// Reads all the sources, processes every question and assembles the summary.
fn compute_summary(config: &SurveyConfig, root_path: &Path) -> SurveyResult<JSValue> {
    let rules = validate_rules(config)?;
    info!("rules: {:?}", rules);

    ensure!(
        !config.question_sources.is_empty(),
        MissingQuestionSourcesSnafu {}
    );

    let mut parsed: Vec<ParsedQuestion> = Vec::new();
    for cfs in config.question_sources.iter() {
        let mut source_data = read_questions(root_path, cfs)?;
        info!(
            "Read {} questions from {:?}",
            source_data.len(),
            cfs.file_path
        );
        parsed.append(&mut source_data);
    }

    let answer_keys = config.answer_keys.clone().unwrap_or_default();
    let questions = validate_questions(&parsed, &answer_keys);
    debug!("questions: {:?}", questions);

    let (processed, summary) = process_questions(&questions, &rules.ranking);

    let (results, export) = if rules.final_export {
        let (filtered, es) = filter_final_export(&processed, rules.minimum_correct_answers);
        info!("Final export: {:?}", es);
        (filtered, Some(es))
    } else {
        (processed, None)
    };

    Ok(build_summary_js(config, &rules, &summary, &export, &results))
}

fn check_reference(pretty_js_stats: &str, reference_path: String) -> SurveyResult<()> {
    let summary_ref = read_summary(reference_path)?;
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("Found differences with the reference string");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats, "\n");
        whatever!("Difference detected between calculated summary and reference summary")
    }
    Ok(())
}

// The output location: a file, or the standard output if None.
fn output_path(
    out: &Option<String>,
    settings: &OutputSettings,
    root_path: &Path,
) -> Option<PathBuf> {
    match out.as_deref() {
        Some("stdout") | Some("") => None,
        Some(p) => Some(PathBuf::from(p)),
        None => settings.output_directory.as_ref().map(|dir| {
            root_path
                .join(dir)
                .join(format!("{}_summary.json", settings.survey_name))
        }),
    }
}

fn write_output(path: &Option<PathBuf>, contents: &str) -> SurveyResult<()> {
    match path {
        None => {
            println!("{}", contents);
            Ok(())
        }
        Some(p) => {
            let path = p.display().to_string();
            info!("Writing the summary to {:?}", path);
            fs::write(p, contents).context(WritingOutputSnafu { path })
        }
    }
}

fn load_config(args: &Args) -> SurveyResult<(SurveyConfig, PathBuf)> {
    let (mut config, mut root_path) = match &args.config {
        Some(config_path) => {
            let config = read_config(config_path.clone())?;
            let root_p = Path::new(config_path.as_str())
                .parent()
                .context(MissingParentDirSnafu {})?
                .to_path_buf();
            (config, root_p)
        }
        None => {
            if args.input.is_none() {
                whatever!("No configuration or input file provided, use --config or --input")
            }
            (SurveyConfig::default(), PathBuf::new())
        }
    };

    if let Some(input) = &args.input {
        let provider = args.input_type.clone().unwrap_or_else(|| "json".to_string());
        let mut source = FileSource::new(provider.as_str(), input.as_str());
        source.questions = args.questions.clone();
        source.excel_worksheet_name = args.excel_worksheet_name.clone();
        config.question_sources = vec![source];
        // The input path is relative to the working directory.
        root_path = PathBuf::new();
    }

    let mut rules = config.rules.clone().unwrap_or_default();
    if let Some(t) = args.similarity_threshold {
        rules.similarity_threshold = Some(t);
    }
    if let Some(tiers) = &args.score_tiers {
        rules.score_tiers = Some(tiers.clone());
    }
    config.rules = Some(rules);

    if args.final_export {
        config.output_settings.final_export = Some(true);
    }
    Ok((config, root_path))
}

pub fn run(args: &Args) -> SurveyResult<()> {
    let (config, root_path) = load_config(args)?;
    info!("config: {:?}", config);

    let result_js = compute_summary(&config, &root_path)?;
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;

    let out = output_path(&args.out, &config.output_settings, &root_path);
    write_output(&out, &pretty_js_stats)?;

    // The reference summary, if provided for comparison
    if let Some(reference_path) = args.reference.clone() {
        check_reference(&pretty_js_stats, reference_path)?;
    }
    Ok(())
}
