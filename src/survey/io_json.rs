// Reading the questions exported by the survey backend.

use crate::survey::*;

pub fn read_json_questions(path: String) -> SurveyResult<Vec<ParsedQuestion>> {
    let contents = fs::read_to_string(path.clone()).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    parse_questions(&js)
}

fn parse_questions(js: &JSValue) -> SurveyResult<Vec<ParsedQuestion>> {
    // Either a list of questions or a response object wrapping the list.
    let questions: &Vec<JSValue> = match js {
        JSValue::Array(l) => l,
        JSValue::Object(obj) => match obj.get("questions").or_else(|| obj.get("data")) {
            Some(JSValue::Array(l)) => l,
            _ => whatever!("Cannot find a list of questions in the JSON content"),
        },
        _ => whatever!("Cannot find a list of questions in the JSON content"),
    };

    let mut res: Vec<ParsedQuestion> = Vec::new();
    for (index, qjs) in questions.iter().enumerate() {
        let obj = qjs.as_object().context(JsonWrongTypeSnafu {
            index,
            content: qjs.to_string(),
        })?;
        let text = obj
            .get("question")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();
        let answers: Vec<ParsedAnswer> = match obj.get("answers") {
            Some(JSValue::Array(l)) => l.iter().filter_map(parse_answer).collect(),
            _ => vec![],
        };
        let metadata: JSMap<String, JSValue> = obj
            .iter()
            .filter(|(k, _)| k.as_str() != "question" && k.as_str() != "answers")
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        debug!(
            "parse_questions: {:?}: {} answers",
            text,
            answers.len()
        );
        res.push(ParsedQuestion {
            text,
            answers,
            raw_responses: false,
            metadata,
        });
    }
    Ok(res)
}

fn parse_answer(js: &JSValue) -> Option<ParsedAnswer> {
    match js {
        JSValue::Object(obj) => Some(ParsedAnswer {
            id: obj.get("_id").and_then(read_js_id),
            text: obj
                .get("answer")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string(),
            count: obj.get("responseCount").and_then(read_js_u64),
            is_correct: obj.get("isCorrect").and_then(|v| v.as_bool()),
            rank: obj
                .get("rank")
                .and_then(read_js_u64)
                .map(|x| x.min(u32::MAX as u64) as u32),
            score: obj
                .get("score")
                .and_then(read_js_u64)
                .map(|x| x.min(u32::MAX as u64) as u32),
        }),
        // A bare string is a single answer without any other information.
        JSValue::String(s) => Some(ParsedAnswer {
            text: s.clone(),
            ..Default::default()
        }),
        _ => {
            warn!("parse_answer: skipping answer {}", js);
            None
        }
    }
}

fn read_js_id(js: &JSValue) -> Option<String> {
    match js {
        JSValue::String(s) if !s.is_empty() => Some(s.clone()),
        JSValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// Negative or fractional values are not expected, they are read as the closest count.
fn read_js_u64(js: &JSValue) -> Option<u64> {
    match js {
        JSValue::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)),
        JSValue::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wrapped_questions() {
        let js = json!({"success": true, "data": [
            {"question": "q1", "questionLevel": "easy", "answers": [
                {"answer": "Agni", "isCorrect": true, "responseCount": 4, "rank": 1, "score": 100, "_id": "a1"},
                {"answer": null, "responseCount": "2"},
                "jal",
                42
            ]},
            {"_id": "q2"}
        ]});
        let res = parse_questions(&js).unwrap();
        assert_eq!(res.len(), 2);
        assert_eq!(res[0].text, "q1");
        assert_eq!(res[0].metadata.get("questionLevel"), Some(&json!("easy")));
        assert!(res[0].metadata.get("answers").is_none());
        assert_eq!(
            res[0].answers,
            vec![
                ParsedAnswer {
                    id: Some("a1".to_string()),
                    text: "Agni".to_string(),
                    count: Some(4),
                    is_correct: Some(true),
                    rank: Some(1),
                    score: Some(100),
                },
                ParsedAnswer {
                    count: Some(2),
                    ..Default::default()
                },
                ParsedAnswer {
                    text: "jal".to_string(),
                    ..Default::default()
                },
            ]
        );
        assert!(!res[0].raw_responses);
        assert_eq!(res[1].text, "");
        assert!(res[1].answers.is_empty());
        assert_eq!(res[1].metadata.get("_id"), Some(&json!("q2")));
    }

    #[test]
    fn wrong_content() {
        assert!(parse_questions(&json!("questions")).is_err());
        assert!(parse_questions(&json!({"items": []})).is_err());
        assert!(parse_questions(&json!([1, 2])).is_err());
        assert!(parse_questions(&json!([])).unwrap().is_empty());
    }
}
