use crate::survey::*;

/// Groups (question, answer) pairs into questions, in order of first appearance.
pub fn group_by_question(rows: Vec<(String, ParsedAnswer)>) -> Vec<ParsedQuestion> {
    let mut res: Vec<ParsedQuestion> = Vec::new();
    for (question, answer) in rows {
        if let Some(pq) = res.iter_mut().find(|pq| pq.text == question) {
            pq.answers.push(answer);
        } else {
            res.push(ParsedQuestion {
                text: question,
                answers: vec![answer],
                raw_responses: true,
                metadata: JSMap::new(),
            });
        }
    }
    res
}

/// Reads a correctness flag as typed in a spreadsheet.
pub fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" | "1" | "x" => Some(true),
        "false" | "no" | "n" | "0" | "" => Some(false),
        _ => None,
    }
}

/// Reads a number of responses. An empty cell counts as a single response.
pub fn parse_count(s: &str) -> Option<u64> {
    let t = s.trim();
    if t.is_empty() {
        Some(1)
    } else {
        t.parse::<u64>().ok()
    }
}
