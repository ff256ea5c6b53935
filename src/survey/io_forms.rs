use calamine::{open_workbook, DataType, Reader, Xlsx};
use std::collections::HashMap;

use crate::survey::*;

/// Reads the Excel export of an online form (Microsoft Forms, Google Forms).
///
/// The first row holds the titles of the questions and every following row the
/// responses of one person, one question per column.
pub fn read_forms_answers(path: String, cfs: &FileSource) -> SurveyResult<Vec<ParsedQuestion>> {
    let wrange = get_range(&path, cfs)?;

    let header = wrange.rows().next().context(EmptyExcelSnafu {})?;
    debug!("read_forms_answers: header: {:?}", header);

    let columns = get_question_columns(header, cfs)?;
    debug!("read_forms_answers: columns: {:?}", columns);

    let mut questions: Vec<ParsedQuestion> = columns
        .iter()
        .map(|(_, title)| ParsedQuestion {
            text: title.clone(),
            answers: Vec::new(),
            raw_responses: true,
            metadata: JSMap::new(),
        })
        .collect();

    let mut iter = wrange.rows();
    iter.next();
    for (idx, row) in iter.enumerate() {
        // The header is the first line.
        let lineno = (idx + 2) as u64;
        for (q_idx, (col_idx, _)) in columns.iter().enumerate() {
            let cell = row.get(*col_idx).unwrap_or(&DataType::Empty);
            match cell_to_text(cell) {
                Some(text) if !text.trim().is_empty() => {
                    questions[q_idx].answers.push(ParsedAnswer {
                        text,
                        count: Some(1),
                        ..Default::default()
                    });
                }
                Some(_) => {
                    // No response for this question.
                }
                None => {
                    return ExcelWrongCellTypeSnafu {
                        lineno,
                        content: format!("{:?} IN {:?}", cell, row),
                    }
                    .fail();
                }
            }
        }
    }
    Ok(questions)
}

fn cell_to_text(cell: &DataType) -> Option<String> {
    match cell {
        DataType::String(s) => Some(s.clone()),
        DataType::Int(i) => Some(i.to_string()),
        DataType::Float(f) if f.fract() == 0.0 => Some(format!("{}", *f as i64)),
        DataType::Float(f) => Some(f.to_string()),
        DataType::Bool(b) => Some(b.to_string()),
        DataType::Empty => Some("".to_string()),
        _ => None,
    }
}

// The index and the title of the columns to read.
fn get_question_columns(
    header: &[DataType],
    cfs: &FileSource,
) -> SurveyResult<Vec<(usize, String)>> {
    let titles: Vec<(usize, String)> = header
        .iter()
        .enumerate()
        .filter_map(|(idx, cell)| match cell {
            DataType::String(s) if !s.trim().is_empty() => Some((idx, s.trim().to_string())),
            _ => None,
        })
        .collect();

    match &cfs.questions {
        Some(question_names) => {
            let col_names: HashMap<&str, usize> =
                titles.iter().map(|(idx, s)| (s.as_str(), *idx)).collect();
            let mut res: Vec<(usize, String)> = Vec::new();
            for qname in question_names.iter() {
                let col_idx = col_names.get(qname.trim()).context(
                    ExcelCannotFindQuestionInHeaderSnafu {
                        question_name: qname,
                    },
                )?;
                res.push((*col_idx, qname.trim().to_string()));
            }
            Ok(res)
        }
        None => {
            // Without a list of questions, the questions start at the answer column.
            let start = match cfs.answer_column_index_opt()? {
                Some(x) => x,
                None => 0,
            };
            Ok(titles.into_iter().filter(|(idx, _)| *idx >= start).collect())
        }
    }
}

fn get_range(path: &String, cfs: &FileSource) -> SurveyResult<calamine::Range<DataType>> {
    let worksheet_name_o = cfs.excel_worksheet_name.clone();
    debug!(
        "read_forms_answers: path: {:?} worksheet: {:?}",
        &path, &worksheet_name_o
    );
    let mut workbook: Xlsx<_> =
        open_workbook(path.clone()).context(OpeningExcelSnafu { path: path.clone() })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet_name) = worksheet_name_o {
        let wrange = workbook
            .worksheet_range(&worksheet_name)
            .context(EmptyExcelSnafu {})?
            .context(OpeningExcelSnafu { path: path.clone() })?;
        Ok(wrange)
    } else {
        let all_worksheets = workbook.worksheets();
        match all_worksheets.as_slice() {
            [] => EmptyExcelSnafu {}.fail(),
            [(worksheet_name, wrange)] => {
                debug!(
                    "read_forms_answers: path: {:?} worksheet: {:?}",
                    &path, &worksheet_name
                );
                Ok(wrange.clone())
            }
            _ => {
                whatever!(
                    "The file {} has several worksheets, the worksheet name must be provided",
                    path
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> Vec<DataType> {
        vec![
            DataType::String("Timestamp".to_string()),
            DataType::String("Name a color term in Sanskrit.".to_string()),
            DataType::Empty,
            DataType::String(" Name a Sanskrit word for a number. ".to_string()),
        ]
    }

    #[test]
    fn cells() {
        assert_eq!(cell_to_text(&DataType::String("nila".to_string())), Some("nila".to_string()));
        assert_eq!(cell_to_text(&DataType::Float(3.0)), Some("3".to_string()));
        assert_eq!(cell_to_text(&DataType::Float(2.5)), Some("2.5".to_string()));
        assert_eq!(cell_to_text(&DataType::Int(7)), Some("7".to_string()));
        assert_eq!(cell_to_text(&DataType::Empty), Some("".to_string()));
        assert_eq!(cell_to_text(&DataType::DateTime(44000.5)), None);
    }

    #[test]
    fn columns_by_name() {
        let mut cfs = FileSource::new("forms", "f.xlsx");
        cfs.questions = Some(vec!["Name a Sanskrit word for a number.".to_string()]);
        let res = get_question_columns(&header(), &cfs).unwrap();
        assert_eq!(res, vec![(3, "Name a Sanskrit word for a number.".to_string())]);

        cfs.questions = Some(vec!["Name an animal.".to_string()]);
        assert!(get_question_columns(&header(), &cfs).is_err());
    }

    #[test]
    fn columns_from_start() {
        let cfs = FileSource::new("forms", "f.xlsx");
        let res = get_question_columns(&header(), &cfs).unwrap();
        assert_eq!(res.len(), 3);

        let cfs: FileSource =
            serde_json::from_str(r#"{"provider": "forms", "filePath": "f.xlsx", "answerColumnIndex": 2}"#)
                .unwrap();
        let res = get_question_columns(&header(), &cfs).unwrap();
        assert_eq!(
            res,
            vec![
                (1, "Name a color term in Sanskrit.".to_string()),
                (3, "Name a Sanskrit word for a number.".to_string()),
            ]
        );
    }
}
