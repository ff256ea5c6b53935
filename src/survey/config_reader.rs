use crate::survey::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputSettings {
    #[serde(rename = "surveyName", default)]
    pub survey_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "surveyDate")]
    pub survey_date: Option<String>,
    #[serde(rename = "finalExport")]
    pub final_export: Option<bool>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub survey: String,
    pub date: Option<String>,
    #[serde(rename = "similarityThreshold")]
    pub similarity_threshold: f64,
    #[serde(rename = "scoreTiers")]
    pub score_tiers: Vec<u32>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "questionColumnIndex")]
    _question_column_index: Option<JSValue>,
    #[serde(rename = "answerColumnIndex")]
    _answer_column_index: Option<JSValue>,
    #[serde(rename = "countColumnIndex")]
    pub count_column_index: Option<JSValue>,
    #[serde(rename = "correctColumnIndex")]
    pub correct_column_index: Option<JSValue>,
    #[serde(rename = "firstAnswerRowIndex")]
    _first_answer_row_index: Option<JSValue>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    #[serde(rename = "questions")]
    pub questions: Option<Vec<String>>,
}

// All the indexes are 1-based in the configuration and 0-based in the code.
impl FileSource {
    pub fn new(provider: &str, file_path: &str) -> FileSource {
        FileSource {
            provider: provider.to_string(),
            file_path: file_path.to_string(),
            _question_column_index: None,
            _answer_column_index: None,
            count_column_index: None,
            correct_column_index: None,
            _first_answer_row_index: None,
            excel_worksheet_name: None,
            questions: None,
        }
    }

    /// Defaults to the first column.
    pub fn question_column_index(&self) -> SurveyResult<usize> {
        read_js_index(&self._question_column_index).map(|x| x.unwrap_or(0))
    }

    /// Defaults to the second column.
    pub fn answer_column_index(&self) -> SurveyResult<usize> {
        read_js_index(&self._answer_column_index).map(|x| x.unwrap_or(1))
    }

    pub fn answer_column_index_opt(&self) -> SurveyResult<Option<usize>> {
        read_js_index(&self._answer_column_index)
    }

    pub fn count_column_index_int(&self) -> SurveyResult<Option<usize>> {
        read_js_index(&self.count_column_index)
    }

    pub fn correct_column_index_int(&self) -> SurveyResult<Option<usize>> {
        read_js_index(&self.correct_column_index)
    }

    /// Defaults to the second row: the first one is usually a header.
    pub fn first_answer_row_index(&self) -> SurveyResult<usize> {
        read_js_index(&self._first_answer_row_index).map(|x| x.unwrap_or(1))
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct AnswerKey {
    pub question: String,
    pub answers: Vec<String>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct SurveyRules {
    #[serde(rename = "similarityThreshold")]
    pub similarity_threshold: Option<f64>,
    #[serde(rename = "scoreTiers")]
    pub score_tiers: Option<Vec<u32>>,
    #[serde(rename = "minimumCorrectAnswers")]
    pub minimum_correct_answers: Option<usize>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct SurveyConfig {
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    #[serde(rename = "questionSources", default)]
    pub question_sources: Vec<FileSource>,
    #[serde(rename = "answerKeys")]
    pub answer_keys: Option<Vec<AnswerKey>>,
    pub rules: Option<SurveyRules>,
}

pub fn read_config(path: String) -> SurveyResult<SurveyConfig> {
    let contents = fs::read_to_string(path.clone()).context(OpeningJsonSnafu { path })?;
    serde_json::from_str(&contents).context(ParsingJsonSnafu {})
}

pub fn read_summary(path: String) -> SurveyResult<JSValue> {
    let contents = fs::read_to_string(path.clone()).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

// A 1-based column or row number, as a number, a string or an Excel column name.
// Returns the 0-based index.
fn read_js_index(x: &Option<JSValue>) -> SurveyResult<Option<usize>> {
    let idx = match x {
        None | Some(JSValue::Null) => return Ok(None),
        Some(JSValue::Number(n)) => n
            .as_u64()
            .map(|x| x as usize)
            .context(ParsingJsonNumberSnafu {})?,
        // Parsing the Excel-style columns: A, B, ..., Z, AA, AB, ...
        Some(JSValue::String(s)) if !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic()) => s
            .to_ascii_uppercase()
            .chars()
            .try_fold(0usize, |acc, c| {
                acc.checked_mul(26)?
                    .checked_add(c as usize - 'A' as usize + 1)
            })
            .context(ParsingJsonNumberSnafu {})?,
        Some(JSValue::String(s)) => s
            .trim()
            .parse::<usize>()
            .ok()
            .context(ParsingJsonNumberSnafu {})?,
        _ => return ParsingJsonNumberSnafu {}.fail(),
    };
    ensure!(idx >= 1, ParsingJsonNumberSnafu {});
    Ok(Some(idx - 1))
}
