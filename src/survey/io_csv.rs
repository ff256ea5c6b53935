// Primitives for reading CSV files.

use std::fs::File;

use crate::survey::{
    io_common::{group_by_question, parse_count, parse_flag},
    *,
};

pub fn read_csv_answers(path: String, cfs: &FileSource) -> SurveyResult<Vec<ParsedQuestion>> {
    let question_idx = cfs.question_column_index()?;
    let answer_idx = cfs.answer_column_index()?;
    let count_idx_o = cfs.count_column_index_int()?;
    let correct_idx_o = cfs.correct_column_index_int()?;

    let (records, row_offset) = get_records(&path, cfs)?;

    let mut rows: Vec<(String, ParsedAnswer)> = Vec::new();
    for (idx, line_r) in records.enumerate() {
        let lineno = idx + row_offset + 1;
        let line = line_r.context(CsvLineParseSnafu {})?;
        debug!("read_csv_answers: lineno: {:?} line: {:?}", lineno, line);

        let question = line
            .get(question_idx)
            .context(CsvLineTooShortSnafu { lineno })?
            .trim()
            .to_string();
        let answer = line
            .get(answer_idx)
            .context(CsvLineTooShortSnafu { lineno })?
            .to_string();

        if question.is_empty() {
            warn!("read_csv_answers: line {}: no question, skipping", lineno);
            continue;
        }
        if answer.trim().is_empty() {
            debug!("read_csv_answers: line {}: no answer, skipping", lineno);
            continue;
        }

        let count: Option<u64> = match count_idx_o {
            Some(count_idx) => {
                let s = line
                    .get(count_idx)
                    .context(CsvLineTooShortSnafu { lineno })?;
                let c = parse_count(s).context(CsvWrongValueSnafu {
                    lineno,
                    content: s.to_string(),
                })?;
                Some(c)
            }
            None => None,
        };

        let is_correct: Option<bool> = match correct_idx_o {
            // A missing cell at the end of the line is not a correct answer.
            Some(correct_idx) => {
                let s = line.get(correct_idx).unwrap_or("");
                let b = parse_flag(s).context(CsvWrongValueSnafu {
                    lineno,
                    content: s.to_string(),
                })?;
                Some(b)
            }
            None => None,
        };

        rows.push((
            question,
            ParsedAnswer {
                id: None,
                text: answer,
                count,
                is_correct,
                rank: None,
                score: None,
            },
        ));
    }
    Ok(group_by_question(rows))
}

fn get_records(
    path: &String,
    cfs: &FileSource,
) -> SurveyResult<(csv::StringRecordsIntoIter<File>, usize)> {
    let first_row = cfs.first_answer_row_index()?;
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu {})?;
    let mut records = rdr.into_records();
    for _ in 0..first_row {
        _ = records.next();
    }
    Ok((records, first_row))
}
